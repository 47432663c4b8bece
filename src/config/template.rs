//! Placeholder substitution for configuration text.
//!
//! `${NAME}` is replaced by the value of `NAME` in the supplied environment;
//! `${NAME:-fallback}` uses `fallback` when `NAME` is absent. `$$` is a
//! literal dollar sign. Every unresolved placeholder is collected so startup
//! can report all of them at once.

use std::collections::HashMap;
use std::sync::LazyLock;
use regex::{Captures, Regex};

/// `$$`, or `${...}` with the placeholder body in group 1.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\$|\$\{([^}]+)\}").expect("placeholder pattern is valid"));

/// Resolve placeholders in `input`.
///
/// Returns the rendered text, or the sorted, de-duplicated list of names that
/// had neither a value nor a fallback.
pub fn render(input: &str, env: &HashMap<String, String>) -> Result<String, Vec<String>> {
    let mut missing: Vec<String> = Vec::new();

    let out = PLACEHOLDER.replace_all(input, |caps: &Captures| {
        let Some(body) = caps.get(1) else {
            return "$".to_string();
        };
        let (name, fallback) = match body.as_str().split_once(":-") {
            Some((name, fallback)) => (name.trim(), Some(fallback)),
            None => (body.as_str().trim(), None),
        };

        match (env.get(name), fallback) {
            (Some(value), _) => value.clone(),
            (None, Some(fallback)) => fallback.to_string(),
            (None, None) => {
                missing.push(name.to_string());
                String::new()
            }
        }
    });

    if missing.is_empty() {
        Ok(out.into_owned())
    } else {
        missing.sort();
        missing.dedup();
        Err(missing)
    }
}
