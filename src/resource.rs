/*!
 * Resource tree flattening and reconstruction.
 *
 * Translation resources arrive as nested JSON trees: maps of maps, arrays,
 * plural groups and plain strings. Providers only understand flat batches of
 * strings, so this module walks the tree depth-first into a list of
 * translation units keyed by dot path, and rebuilds an identically shaped
 * tree from a map of translated texts afterwards.
 *
 * Every string leaf becomes exactly one unit regardless of nesting depth.
 * Numbers, booleans and nulls never enter the batch and pass through
 * reconstruction untouched.
 */

use serde_json::{Map, Value};
use std::collections::HashMap;

/// CLDR plural category of a translation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PluralForm {
    /// Not a plural variant
    #[default]
    None,
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

/// Recognized plural key suffixes, in CLDR order
const PLURAL_SUFFIXES: [(&str, PluralForm); 6] = [
    ("_zero", PluralForm::Zero),
    ("_one", PluralForm::One),
    ("_two", PluralForm::Two),
    ("_few", PluralForm::Few),
    ("_many", PluralForm::Many),
    ("_other", PluralForm::Other),
];

impl PluralForm {
    /// Detect the plural form encoded in a key's suffix.
    ///
    /// The suffix stays part of the key so reconstruction finds the leaf
    /// again; only the classification is lifted out.
    pub fn from_key(key: &str) -> Self {
        for (suffix, form) in PLURAL_SUFFIXES {
            if key.ends_with(suffix) {
                return form;
            }
        }
        Self::None
    }

    /// CLDR category name, or "none" for a non-plural unit
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Zero => "zero",
            Self::One => "one",
            Self::Two => "two",
            Self::Few => "few",
            Self::Many => "many",
            Self::Other => "other",
        }
    }
}

/// One translatable string lifted out of the resource tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    /// Dot-separated path from the tree root, plural suffix retained
    pub key: String,

    /// The source-language text at that path
    pub source_text: String,

    /// Plural classification derived from the final key segment
    pub plural_form: PluralForm,
}

/// Flatten a nested resource tree into translation units.
///
/// Map keys concatenate with `.`, array elements use their index as a path
/// segment. Non-string leaves are skipped; they are restored verbatim by
/// [`reconstruct`].
pub fn flatten(tree: &Value) -> Vec<TranslationUnit> {
    let mut units = Vec::new();
    flatten_into("", tree, &mut units);
    units
}

fn flatten_into(prefix: &str, value: &Value, units: &mut Vec<TranslationUnit>) {
    match value {
        Value::String(text) => {
            let leaf_segment = prefix.rsplit('.').next().unwrap_or(prefix);
            units.push(TranslationUnit {
                key: prefix.to_string(),
                source_text: text.clone(),
                plural_form: PluralForm::from_key(leaf_segment),
            });
        }
        Value::Object(map) => {
            for (key, child) in map {
                let path = join_path(prefix, key);
                flatten_into(&path, child, units);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                let path = join_path(prefix, &index.to_string());
                flatten_into(&path, child, units);
            }
        }
        // Numbers, booleans and nulls are not translatable
        Value::Number(_) | Value::Bool(_) | Value::Null => {}
    }
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", prefix, segment)
    }
}

/// Rebuild a tree with the same shape as `tree`, substituting translated
/// texts by flattened key.
///
/// A string leaf with no entry in `translations` keeps its source text;
/// a leaf is never replaced by null or dropped. Non-string leaves are
/// carried over unchanged.
pub fn reconstruct(tree: &Value, translations: &HashMap<String, String>) -> Value {
    reconstruct_node("", tree, translations)
}

fn reconstruct_node(prefix: &str, value: &Value, translations: &HashMap<String, String>) -> Value {
    match value {
        Value::String(source) => {
            let text = translations
                .get(prefix)
                .cloned()
                .unwrap_or_else(|| source.clone());
            Value::String(text)
        }
        Value::Object(map) => {
            let mut rebuilt = Map::with_capacity(map.len());
            for (key, child) in map {
                let path = join_path(prefix, key);
                rebuilt.insert(key.clone(), reconstruct_node(&path, child, translations));
            }
            Value::Object(rebuilt)
        }
        Value::Array(items) => {
            let rebuilt = items
                .iter()
                .enumerate()
                .map(|(index, child)| {
                    let path = join_path(prefix, &index.to_string());
                    reconstruct_node(&path, child, translations)
                })
                .collect();
            Value::Array(rebuilt)
        }
        other => other.clone(),
    }
}
