//! Autocomplete suggestion derivation.
//!
//! Suggestions are derived from at most ten product rows in three passes
//! (names, then categories, then description words) with case-insensitive
//! de-duplication across all passes.

use std::collections::HashSet;

use marys_fashion_core::{ProductId, null_as_default};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

/// Maximum suggestions returned for one query.
pub const MAX_SUGGESTIONS: usize = 10;

/// Description words are only scanned while fewer suggestions than this
/// have been collected.
const DESCRIPTION_PASS_THRESHOLD: usize = 5;

/// Which field a suggestion was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Name,
    Category,
    Description,
}

/// A single autocomplete entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocompleteSuggestion {
    /// Product id for names, `cat_<category>` or `desc_<word>` otherwise.
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    /// `text` with every match of the query wrapped in `<strong>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
}

/// The product columns the suggestion lookup selects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

/// Columns to select for [`ProductSummary`].
pub const SUMMARY_COLUMNS: [&str; 4] = ["id", "name", "category", "description"];

/// Derive suggestions for `query` from `products`, in row order.
#[must_use]
pub fn derive_suggestions(query: &str, products: &[ProductSummary]) -> Vec<AutocompleteSuggestion> {
    let needle = query.to_lowercase();
    let mut seen = HashSet::new();
    let mut suggestions = Vec::new();

    for product in products {
        let lower = product.name.to_lowercase();
        if !product.name.is_empty() && lower.contains(&needle) && seen.insert(lower) {
            suggestions.push(AutocompleteSuggestion {
                id: product.id.to_string(),
                text: product.name.clone(),
                kind: SuggestionKind::Name,
                highlight: Some(highlight(&product.name, query)),
            });
        }
    }

    for product in products {
        let lower = product.category.to_lowercase();
        if !product.category.is_empty() && lower.contains(&needle) && seen.insert(lower) {
            suggestions.push(AutocompleteSuggestion {
                id: format!("cat_{}", product.category),
                text: product.category.clone(),
                kind: SuggestionKind::Category,
                highlight: Some(highlight(&product.category, query)),
            });
        }
    }

    if suggestions.len() < DESCRIPTION_PASS_THRESHOLD {
        let words = products
            .iter()
            .filter(|product| product.description.to_lowercase().contains(&needle))
            .flat_map(|product| product.description.split_whitespace())
            .filter(|word| word.chars().count() > 2 && word.to_lowercase().contains(&needle));

        for word in words {
            if suggestions.len() >= MAX_SUGGESTIONS {
                break;
            }
            if seen.insert(word.to_lowercase()) {
                suggestions.push(AutocompleteSuggestion {
                    id: format!("desc_{word}"),
                    text: word.to_string(),
                    kind: SuggestionKind::Description,
                    highlight: Some(highlight(word, query)),
                });
            }
        }
    }

    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

/// Wrap every case-insensitive occurrence of `query` in `<strong>` tags,
/// keeping the original casing of `text`. The query is matched literally.
#[must_use]
pub fn highlight(text: &str, query: &str) -> String {
    if query.is_empty() {
        return text.to_string();
    }

    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .map_or_else(
            |_| text.to_string(),
            |re| re.replace_all(text, "<strong>${0}</strong>").into_owned(),
        )
}
