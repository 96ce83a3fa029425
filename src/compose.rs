// src/compose.rs
//! Script Composer: turns whatever the sources delivered into one generation prompt.
//!
//! Two variants only. When all three headline sources are empty the prompt is a
//! generic, date-stamped fallback that never mentions the outage; otherwise it is
//! the rich prompt that embeds the first few items of each headline source plus
//! the full business and weather payloads when present.

use chrono::NaiveDate;
use serde_json::Value;

use crate::ingest::types::{HeadlineItem, Snapshot};
use crate::ingest::SourceBundle;

/// Which variant a prompt was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Rich,
    Fallback,
}

/// Built once per request; never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationPrompt {
    kind: PromptKind,
    text: String,
}

impl GenerationPrompt {
    pub fn kind(&self) -> PromptKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

const FORMAT_RULES: &str = "\
Formatting rules:
- The script will be read aloud by a single narrator; target 7 to 12 minutes of speech.
- Conversational, engaging, well structured: a short greeting, the main stories, a brief outro.
- No stage directions, no sound-effect or music annotations, nothing in brackets or parentheses meant for production.
- No speaker names or labels such as \"Host:\" or \"Narrator:\".
- No markdown, bullet points, headings or emphasis markers.
- Several sources may cover the same story; merge overlapping stories and tell each one once.
- Output only the literal script text. No preface, no notes, no commentary about the script.";

fn format_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

fn render_items(items: &[HeadlineItem], limit: usize) -> String {
    let head: Vec<&Value> = items.iter().take(limit).collect();
    serde_json::to_string_pretty(&head).unwrap_or_else(|_| "[]".to_string())
}

fn render_snapshot(snap: &Snapshot) -> String {
    serde_json::to_string_pretty(snap).unwrap_or_else(|_| "{}".to_string())
}

/// Build the prompt for `bundle` as of `date`, keeping up to `items_per_source` items per list source.
pub fn compose(bundle: &SourceBundle, date: NaiveDate, items_per_source: usize) -> GenerationPrompt {
    if bundle.primary_news_empty() {
        return GenerationPrompt {
            kind: PromptKind::Fallback,
            text: fallback_prompt(date),
        };
    }
    GenerationPrompt {
        kind: PromptKind::Rich,
        text: rich_prompt(bundle, date, items_per_source),
    }
}

fn fallback_prompt(date: NaiveDate) -> String {
    format!(
        "Today is {date}. Write the script for a daily spoken news segment.\n\
         Pick one notable event, either something from the recent past or a historical \
         event connected to this date, and tell its story in an engaging, informative way: \
         the background, what happened, and why it still matters.\n\
         Do not mention missing data, unavailable news feeds, technical problems, or that \
         this topic was chosen as a substitute.\n\n{FORMAT_RULES}",
        date = format_date(date),
    )
}

fn rich_prompt(bundle: &SourceBundle, date: NaiveDate, limit: usize) -> String {
    let mut out = format!(
        "Today is {}. Write the script for today's spoken news briefing.\n\
         Below are current headlines gathered from several sources. Use them as the basis \
         for what is happening today; explain the context in your own words instead of \
         reading the material back. Focus mostly on the headline sources.\n",
        format_date(date)
    );

    let lists = [
        ("General headlines", &bundle.gnews),
        ("Aggregated headlines", &bundle.newsapi),
        ("Long-form top stories", &bundle.nytimes),
    ];
    for (label, items) in lists {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("\n## {label}\n{}\n", render_items(items, limit)));
    }

    if !bundle.business.is_empty() {
        out.push_str(&format!(
            "\n## Business and market news with sentiment (give this a little less time than the headlines)\n{}\n",
            render_snapshot(&bundle.business)
        ));
    }
    if !bundle.weather.is_empty() {
        out.push_str(&format!(
            "\n## Local weather (mention it once, briefly)\n{}\n",
            render_snapshot(&bundle.weather)
        ));
    }

    out.push('\n');
    out.push_str(FORMAT_RULES);
    out
}
