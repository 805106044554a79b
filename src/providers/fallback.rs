//! Built-in content used when every upstream provider misses.

use crate::content::{ContentItem, ContentType, Question, QuestionKind, Quote, FALLBACK_SOURCE};
use rand::Rng;

const QUOTES: &[(&str, &str)] = &[
    ("The only way to do great work is to love what you do.", "Steve Jobs"),
    ("Innovation distinguishes between a leader and a follower.", "Steve Jobs"),
    ("Life is what happens to you while you're busy making other plans.", "John Lennon"),
    ("The future belongs to those who believe in the beauty of their dreams.", "Eleanor Roosevelt"),
    ("It is during our darkest moments that we must focus to see the light.", "Aristotle"),
    ("Success is not final, failure is not fatal: it is the courage to continue that counts.", "Winston Churchill"),
    ("The only impossible journey is the one you never begin.", "Tony Robbins"),
    ("In the middle of difficulty lies opportunity.", "Albert Einstein"),
    ("Believe you can and you're halfway there.", "Theodore Roosevelt"),
    ("The only limit to our realization of tomorrow will be our doubts of today.", "Franklin D. Roosevelt"),
];

struct PoolQuestion {
    text: &'static str,
    kind: QuestionKind,
    category: &'static str,
    difficulty: &'static str,
    answer: Option<&'static str>,
    options: &'static [&'static str],
}

const fn discussion(text: &'static str, category: &'static str, difficulty: &'static str) -> PoolQuestion {
    PoolQuestion {
        text,
        kind: QuestionKind::Discussion,
        category,
        difficulty,
        answer: None,
        options: &[],
    }
}

const fn trivia(
    text: &'static str,
    category: &'static str,
    difficulty: &'static str,
    answer: &'static str,
    options: &'static [&'static str],
) -> PoolQuestion {
    PoolQuestion {
        text,
        kind: QuestionKind::Trivia,
        category,
        difficulty,
        answer: Some(answer),
        options,
    }
}

const QUESTIONS: &[PoolQuestion] = &[
    discussion("If you could have dinner with anyone from history, who would it be and why?", "History", "Easy"),
    discussion("What's the most interesting place you've ever visited?", "Travel", "Easy"),
    discussion("If you could learn any skill instantly, what would it be?", "Personal", "Easy"),
    discussion("What's your favorite way to spend a weekend?", "Lifestyle", "Easy"),
    discussion("If you could time travel, would you go to the past or future? Why?", "Philosophy", "Medium"),
    discussion("What's the best advice you've ever received?", "Life", "Easy"),
    discussion("If you could have any superpower, what would it be?", "Fantasy", "Easy"),
    discussion("What's something you've learned recently that surprised you?", "Learning", "Easy"),
    discussion("If you could change one thing about the world, what would it be?", "Society", "Medium"),
    discussion("What's your biggest accomplishment that you're proud of?", "Personal", "Easy"),
    trivia(
        "Which planet in our solar system has the most moons?",
        "Science",
        "Medium",
        "Saturn",
        &["Jupiter", "Saturn", "Uranus", "Neptune"],
    ),
    trivia(
        "What is the capital of Australia?",
        "Geography",
        "Medium",
        "Canberra",
        &["Sydney", "Melbourne", "Canberra", "Perth"],
    ),
    trivia(
        "Who wrote the novel '1984'?",
        "Literature",
        "Easy",
        "George Orwell",
        &["George Orwell", "Aldous Huxley", "Ray Bradbury", "H.G. Wells"],
    ),
    trivia(
        "What is the smallest country in the world?",
        "Geography",
        "Easy",
        "Vatican City",
        &["Monaco", "Vatican City", "San Marino", "Liechtenstein"],
    ),
    trivia(
        "In what year did the Berlin Wall fall?",
        "History",
        "Medium",
        "1989",
        &["1987", "1988", "1989", "1990"],
    ),
];

/// Every quote in the pool.
pub fn quotes() -> Vec<ContentItem> {
    QUOTES
        .iter()
        .map(|(text, author)| {
            ContentItem::Quote(Quote {
                text: text.to_string(),
                author: author.to_string(),
                source: FALLBACK_SOURCE.to_string(),
            })
        })
        .collect()
}

/// Every question in the pool.
pub fn questions() -> Vec<ContentItem> {
    QUESTIONS
        .iter()
        .map(|q| {
            ContentItem::Question(Question {
                text: q.text.to_string(),
                kind: q.kind,
                category: q.category.to_string(),
                difficulty: q.difficulty.to_string(),
                correct_answer: q.answer.map(str::to_string),
                options: (!q.options.is_empty())
                    .then(|| q.options.iter().map(|o| o.to_string()).collect()),
                source: FALLBACK_SOURCE.to_string(),
            })
        })
        .collect()
}

const _: () = assert!(!QUOTES.is_empty() && !QUESTIONS.is_empty());

/// A uniformly random pool item of the requested type.
pub fn random_item(kind: ContentType) -> ContentItem {
    let mut pool = match kind {
        ContentType::Quote => quotes(),
        ContentType::Question => questions(),
    };
    let index = rand::thread_rng().gen_range(0..pool.len());
    pool.swap_remove(index)
}
