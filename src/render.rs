use crate::content::{ContentItem, Question, QuestionKind, Quote};
use chrono::Utc;
use poise::serenity_prelude::{CreateEmbed, CreateEmbedFooter, Timestamp};

const DAILY_QUOTE_COLOR: u32 = 0x00D4AA;
const ON_DEMAND_QUOTE_COLOR: u32 = 0x5865F2;
const DAILY_QUESTION_COLOR: u32 = 0xFF6B35;
const ON_DEMAND_QUESTION_COLOR: u32 = 0x9932CC;

const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

pub fn content_embed(item: &ContentItem, daily: bool) -> CreateEmbed {
    match item {
        ContentItem::Quote(quote) => quote_embed(quote, daily),
        ContentItem::Question(question) => question_embed(question, daily),
    }
}

fn footer(label: &str, daily: bool) -> CreateEmbedFooter {
    let date = Utc::now().format("%A, %B %-d, %Y");
    if daily {
        CreateEmbedFooter::new(format!("Daily {} • {}", label, date))
    } else {
        CreateEmbedFooter::new(date.to_string())
    }
}

pub fn quote_embed(quote: &Quote, daily: bool) -> CreateEmbed {
    CreateEmbed::new()
        .title("📅 Quote of the Day")
        .description(format!("*\"{}\"*", quote.text))
        .field("✍️ Author", &quote.author, true)
        .field("📚 Source", &quote.source, true)
        .color(if daily { DAILY_QUOTE_COLOR } else { ON_DEMAND_QUOTE_COLOR })
        .footer(footer("quote", daily))
        .timestamp(Timestamp::now())
}

pub fn question_embed(question: &Question, daily: bool) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title("❓ Question of the Day")
        .description(&question.text)
        .color(if daily { DAILY_QUESTION_COLOR } else { ON_DEMAND_QUESTION_COLOR })
        .footer(footer("question", daily))
        .timestamp(Timestamp::now());

    embed = match question.kind {
        QuestionKind::Trivia => {
            let mut embed = embed
                .field("📝 Category", &question.category, true)
                .field("🎯 Difficulty", &question.difficulty, true)
                .field("💡 Type", "Trivia Question", true);
            if let Some(options) = question.options.as_deref().filter(|o| !o.is_empty()) {
                embed = embed.field("📋 Options", format_options(options), false);
            }
            embed
        }
        QuestionKind::Jeopardy => embed
            .field("📝 Category", &question.category, true)
            .field("🎯 Value", &question.difficulty, true)
            .field("💡 Type", "Jeopardy Style", true)
            .field("💭 Note", "Answer in the form of a question!", false),
        QuestionKind::WouldYouRather => embed
            .field("🤔 Type", "Would You Rather", true)
            .field("🎯 Category", &question.category, true),
        QuestionKind::Discussion => embed
            .field("💭 Type", "Discussion Question", true)
            .field("📝 Category", &question.category, true),
    };

    embed.field("📚 Source", &question.source, true)
}

pub fn format_options(options: &[String]) -> String {
    options
        .iter()
        .zip(OPTION_LABELS)
        .map(|(option, label)| format!("{}. {}", label, option))
        .collect::<Vec<_>>()
        .join("\n")
}
