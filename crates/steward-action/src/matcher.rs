//! Trigger matching: find action candidates for a free-text prompt.

use crate::types::Action;

/// Find actions whose trigger phrase occurs in the prompt.
///
/// Matching is a case-insensitive substring test. Candidates come back
/// sorted by descending trigger-phrase length so the most specific phrase
/// wins; equal-length candidates keep their input order (stable sort).
/// Actions with an empty or absent trigger phrase never match. An empty
/// result means "no match", not an error.
pub fn match_actions<'a>(prompt: &str, actions: &'a [Action]) -> Vec<&'a Action> {
    let prompt_lower = prompt.to_lowercase();

    let mut matches: Vec<&Action> = actions
        .iter()
        .filter(|action| match action.trigger_phrase.as_deref() {
            Some(phrase) if !phrase.is_empty() => {
                prompt_lower.contains(&phrase.to_lowercase())
            }
            _ => false,
        })
        .collect();

    matches.sort_by(|a, b| phrase_len(b).cmp(&phrase_len(a)));
    matches
}

fn phrase_len(action: &Action) -> usize {
    action.trigger_phrase.as_deref().map_or(0, str::len)
}
