//! Detail fetcher: pull and trim conversation content for each target.

use crate::core::page::{PageError, PageSource};
use crate::pipeline::indexer::Target;
use serde::{Deserialize, Serialize};

pub const CONTENT_SELECTOR: &str = "div#root";

/// Lines at or under this length are treated as navigation chrome, not message
/// content.
pub const MIN_LINE_LEN: usize = 10;
/// How many trailing content lines make up the snippet.
pub const SNIPPET_LINES: usize = 10;
pub const SNIPPET_DELIMITER: &str = " || ";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Harvest {
    pub customer: String,
    pub raw_message: String,
    pub date: String,
}

/// Trim raw page text down to the tail of the conversation: drop short noise
/// lines, keep the last [`SNIPPET_LINES`] survivors.
pub fn trim_snippet(raw_text: &str) -> String {
    let lines: Vec<&str> = raw_text
        .lines()
        .filter(|l| l.len() > MIN_LINE_LEN)
        .collect();
    let start = lines.len().saturating_sub(SNIPPET_LINES);
    lines[start..].join(SNIPPET_DELIMITER)
}

/// Fetch conversation snippets for each target, in input order. A failing
/// target is skipped (the sequence shrinks); there is no retry.
pub fn fetch_details<P: PageSource>(
    page: &mut P,
    targets: &[Target],
) -> Vec<Harvest> {
    let mut data = Vec::with_capacity(targets.len());
    for t in targets {
        match fetch_one(page, t) {
            Ok(h) => data.push(h),
            Err(_) => continue,
        }
    }
    data
}

fn fetch_one<P: PageSource>(page: &mut P, target: &Target) -> Result<Harvest, PageError> {
    page.navigate(&target.url)?;
    let Some(&content) = page.query(CONTENT_SELECTOR)?.first() else {
        return Err(PageError::Query(format!(
            "no content container at {}",
            target.url
        )));
    };
    let raw_text = page.text_of(content)?;
    Ok(Harvest {
        customer: target.name.clone(),
        raw_message: trim_snippet(&raw_text),
        date: target.date.clone(),
    })
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "fetcher",
        "version": "0.1.0",
        "description": "Per-target conversation content extraction",
        "commands": [
            { "name": "fetch", "description": "Fetch details for a target list (library API; requires a page backend)" }
        ],
        "storage": []
    })
}
