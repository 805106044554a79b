use serde::{Deserialize, Serialize};
use std::fmt;

/// Source tag carried by every item drawn from the built-in pools.
pub const FALLBACK_SOURCE: &str = "Fallback";

/// The two delivery categories. Each has its own schedule and its own history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Quote,
    Question,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Quote => "quote",
            ContentType::Question => "question",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Trivia,
    Jeopardy,
    WouldYouRather,
    Discussion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    pub author: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub kind: QuestionKind,
    pub category: String,
    pub difficulty: String,
    pub correct_answer: Option<String>,
    /// Multiple-choice options, at most four.
    pub options: Option<Vec<String>>,
    pub source: String,
}

/// A normalized piece of daily content. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Quote(Quote),
    Question(Question),
}

impl ContentItem {
    pub fn content_type(&self) -> ContentType {
        match self {
            ContentItem::Quote(_) => ContentType::Quote,
            ContentItem::Question(_) => ContentType::Question,
        }
    }

    /// The text used for repeat detection: the quote itself or the question prompt.
    pub fn primary_text(&self) -> &str {
        match self {
            ContentItem::Quote(q) => &q.text,
            ContentItem::Question(q) => &q.text,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            ContentItem::Quote(q) => &q.source,
            ContentItem::Question(q) => &q.source,
        }
    }

    pub fn is_usable(&self) -> bool {
        !self.primary_text().trim().is_empty()
    }
}
