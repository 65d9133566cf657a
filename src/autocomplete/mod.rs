//! Autocomplete suggestions for the search box
//!
//! Suggestions are drawn from the configured document fields through the
//! connector. They bypass the composer: a suggestion lookup never changes the
//! query state or the rendered results.

use crate::config::AutocompleteSettings;
use crate::error::SearchError;
use crate::search::Search;
use std::collections::HashSet;
use tracing::debug;

/// Fetch suggestions for a partial search term.
///
/// Returns no suggestions, without contacting the backend, when autocomplete
/// is disabled or the term is too short.
pub async fn fetch_suggestions(
    search: &Search,
    settings: &AutocompleteSettings,
    term: &str,
) -> Result<Vec<String>, SearchError> {
    let term = term.trim();
    if !settings.enabled || term.chars().count() < settings.min_chars.max(1) {
        return Ok(Vec::new());
    }

    let mut suggestions = search.suggest(term, &settings.fields, settings.size).await?;
    let mut seen = HashSet::new();
    suggestions.retain(|s| seen.insert(s.clone()));
    suggestions.truncate(settings.size as usize);

    debug!("{} suggestions for '{}'", suggestions.len(), term);
    Ok(suggestions)
}
