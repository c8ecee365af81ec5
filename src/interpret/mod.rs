//! Turning free-text searches into structured interpretations
//!
//! A generative model is asked to answer with a small JSON object:
//!
//! ```json
//! { "category": "Electronics", "keywords": ["casio", "calculator"] }
//! ```
//!
//! [`parse_interpretation`] is forgiving about the envelope (markdown
//! fences, prose around the object) but strict about the shape. Unknown
//! category names are dropped rather than rejected.

#[cfg(feature = "ai")]
pub mod http;

#[cfg(feature = "ai")]
pub use http::GenerativeInterpreter;

use crate::core::filter::Interpretation;
use crate::core::listing::Category;
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
struct RawInterpretation {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

/// Build the prompt sent to the model for `query`
pub fn interpretation_prompt(query: &str) -> String {
    let categories = Category::ALL
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "A student is searching a campus marketplace for: \"{query}\"\n\
         Reply with only a JSON object of the form \
         {{\"category\": <one of {categories} or null>, \
         \"keywords\": [<short lowercase search terms>]}}.\n\
         Include spelling variants and the brand or model if one is implied."
    )
}

/// Parse a model reply into an [`Interpretation`]
///
/// The result is not normalized; the engine normalizes before use.
pub fn parse_interpretation(reply: &str) -> Result<Interpretation> {
    let body = strip_fences(reply);
    let start = body
        .find('{')
        .ok_or_else(|| anyhow!("no JSON object in interpreter reply"))?;
    let end = body
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| anyhow!("unterminated JSON object in interpreter reply"))?;

    let raw: RawInterpretation = serde_json::from_str(&body[start..=end])
        .context("Failed to parse interpreter reply")?;

    let category = raw
        .category
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .and_then(|name| match Category::from_str(name) {
            Ok(category) => Some(category),
            Err(err) => {
                tracing::debug!(error = %err, "ignoring interpreted category");
                None
            }
        });

    Ok(Interpretation {
        category,
        keywords: raw.keywords,
    })
}

fn strip_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string ("json") on the opening fence line
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
