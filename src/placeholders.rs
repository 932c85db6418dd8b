/*!
 * Placeholder extraction and validation.
 *
 * Translatable strings embed variable tokens in the `{name}` or `{{name}}`
 * shape. These must survive translation byte-for-byte; this module extracts
 * the ordered set of placeholder names from a text and compares source
 * against translation. A mismatch is reported, never enforced.
 */

use once_cell::sync::Lazy;
use regex::Regex;

// Double braces first so `{{count}}` is not consumed as `{` + `{count}` + `}`.
static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{([A-Za-z0-9_.]+)\}\}|\{([A-Za-z0-9_.]+)\}")
        .expect("placeholder pattern is a valid regex")
});

/// Extract the ordered set of distinct placeholder names from a text
pub fn extract(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    for caps in PLACEHOLDER_RE.captures_iter(text) {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string());
        if let Some(name) = name {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// A non-fatal report that a translation altered the placeholder set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderWarning {
    /// Flattened key of the affected translation unit
    pub key: String,
    /// Placeholders present in the source but absent from the translation
    pub missing: Vec<String>,
    /// Placeholders the translation introduced that the source never had
    pub unexpected: Vec<String>,
}

impl std::fmt::Display for PlaceholderWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "placeholder mismatch for '{}': missing [{}], unexpected [{}]",
            self.key,
            self.missing.join(", "),
            self.unexpected.join(", ")
        )
    }
}

/// Compare the placeholder sets of a source text and its translation.
///
/// Returns `None` when the sets agree (order is not significant for
/// validation, only for extraction).
pub fn validate(key: &str, source: &str, translated: &str) -> Option<PlaceholderWarning> {
    let source_set = extract(source);
    let translated_set = extract(translated);

    let missing: Vec<String> = source_set
        .iter()
        .filter(|name| !translated_set.contains(name))
        .cloned()
        .collect();
    let unexpected: Vec<String> = translated_set
        .iter()
        .filter(|name| !source_set.contains(name))
        .cloned()
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        None
    } else {
        Some(PlaceholderWarning {
            key: key.to_string(),
            missing,
            unexpected,
        })
    }
}
