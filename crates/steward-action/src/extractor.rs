//! Parameter extraction: pull named values out of a prompt with the
//! action's configured regex patterns.

use std::collections::BTreeMap;

use regex::RegexBuilder;

use crate::error::ActionError;
use crate::types::Action;

/// Extract parameters from a prompt using the action's patterns.
///
/// Each pattern is applied case-insensitively; capture group 1 of the
/// first match becomes the parameter value. Patterns that do not match
/// are omitted from the result. A pattern that fails to compile, or that
/// has no capture group, is a configuration error and aborts extraction.
pub fn extract_parameters(
    prompt: &str,
    action: &Action,
) -> Result<BTreeMap<String, String>, ActionError> {
    let mut parameters = BTreeMap::new();

    for (name, pattern) in &action.spec.parameter_patterns {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| ActionError::InvalidPattern {
                name: name.clone(),
                message: e.to_string(),
            })?;

        if regex.captures_len() < 2 {
            return Err(ActionError::InvalidPattern {
                name: name.clone(),
                message: "pattern has no capture group".to_string(),
            });
        }

        if let Some(caps) = regex.captures(prompt) {
            if let Some(value) = caps.get(1) {
                parameters.insert(name.clone(), value.as_str().to_string());
            }
        }
    }

    Ok(parameters)
}
