use crate::content::{ContentItem, ContentType, Question, QuestionKind};
use crate::providers::{get_json, ContentProvider};
use async_trait::async_trait;
use serde::Deserialize;

// --- Open Trivia DB ---

#[derive(Deserialize)]
struct OpenTriviaResponse {
    results: Vec<OpenTriviaQuestion>,
}

#[derive(Deserialize)]
struct OpenTriviaQuestion {
    category: String,
    difficulty: String,
    question: String,
    correct_answer: String,
    incorrect_answers: Vec<String>,
}

http_provider!(OpenTriviaDb, "https://opentdb.com");

#[async_trait]
impl ContentProvider for OpenTriviaDb {
    fn name(&self) -> &str {
        "Open Trivia DB"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Question
    }

    async fn fetch(&self) -> anyhow::Result<ContentItem> {
        let url = format!("{}/api.php?amount=1&type=multiple", self.base_url);
        let response: OpenTriviaResponse = get_json(&self.http, &url).await?;
        let q = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Open Trivia DB returned no results"))?;

        // Fields arrive entity-encoded; the chain decodes them.
        let mut options = q.incorrect_answers;
        options.push(q.correct_answer.clone());

        Ok(ContentItem::Question(Question {
            text: q.question,
            kind: QuestionKind::Trivia,
            category: q.category,
            difficulty: q.difficulty,
            correct_answer: Some(q.correct_answer),
            options: Some(options),
            source: self.name().to_string(),
        }))
    }
}

// --- The Trivia API ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TriviaApiQuestion {
    category: String,
    difficulty: String,
    question: TriviaApiText,
    correct_answer: String,
    incorrect_answers: Vec<String>,
}

#[derive(Deserialize)]
struct TriviaApiText {
    text: String,
}

http_provider!(TriviaApi, "https://the-trivia-api.com");

#[async_trait]
impl ContentProvider for TriviaApi {
    fn name(&self) -> &str {
        "The Trivia API"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Question
    }

    async fn fetch(&self) -> anyhow::Result<ContentItem> {
        let url = format!("{}/v2/questions?limit=1", self.base_url);
        let questions: Vec<TriviaApiQuestion> = get_json(&self.http, &url).await?;
        let q = questions
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("The Trivia API returned an empty list"))?;

        let mut options = q.incorrect_answers;
        options.push(q.correct_answer.clone());

        Ok(ContentItem::Question(Question {
            text: q.question.text,
            kind: QuestionKind::Trivia,
            category: q.category,
            difficulty: q.difficulty,
            correct_answer: Some(q.correct_answer),
            options: Some(options),
            source: self.name().to_string(),
        }))
    }
}

// --- Numbers API ---

http_provider!(NumbersApi, "http://numbersapi.com");

#[async_trait]
impl ContentProvider for NumbersApi {
    fn name(&self) -> &str {
        "Numbers API"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Question
    }

    async fn fetch(&self) -> anyhow::Result<ContentItem> {
        let url = format!("{}/random/trivia", self.base_url);
        let fact = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(ContentItem::Question(Question {
            text: fact.trim().to_string(),
            kind: QuestionKind::Trivia,
            category: "Numbers & Facts".to_string(),
            difficulty: "Medium".to_string(),
            correct_answer: None,
            options: None,
            source: self.name().to_string(),
        }))
    }
}

// --- Advice Slip ---

#[derive(Deserialize)]
struct AdviceSlipResponse {
    slip: AdviceSlipEntry,
}

#[derive(Deserialize)]
struct AdviceSlipEntry {
    advice: String,
}

http_provider!(AdviceSlip, "https://api.adviceslip.com");

#[async_trait]
impl ContentProvider for AdviceSlip {
    fn name(&self) -> &str {
        "Advice Slip API"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Question
    }

    async fn fetch(&self) -> anyhow::Result<ContentItem> {
        let url = format!("{}/advice", self.base_url);
        let response: AdviceSlipResponse = get_json(&self.http, &url).await?;
        let advice = response.slip.advice.trim().to_string();
        if advice.is_empty() {
            anyhow::bail!("Advice Slip returned empty advice");
        }

        Ok(ContentItem::Question(Question {
            text: format!("What do you think about this advice: \"{}\"", advice),
            kind: QuestionKind::Discussion,
            category: "Life Advice".to_string(),
            difficulty: "Easy".to_string(),
            correct_answer: None,
            options: None,
            source: self.name().to_string(),
        }))
    }
}
