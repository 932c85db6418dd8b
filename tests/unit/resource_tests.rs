/*!
 * Tests for resource tree flattening and reconstruction
 */

use serde_json::json;
use std::collections::HashMap;

use lingoflow::resource::{PluralForm, flatten, reconstruct};

#[test]
fn test_flatten_withNestedMapsAndArrays_shouldEmitOneUnitPerStringLeaf() {
    let tree = json!({
        "menu": {
            "file": {
                "open": "Open",
                "recent": ["Yesterday", "Last week"]
            }
        },
        "version": 7
    });

    let units = flatten(&tree);
    let keys: Vec<&str> = units.iter().map(|u| u.key.as_str()).collect();
    assert_eq!(
        keys,
        vec!["menu.file.open", "menu.file.recent.0", "menu.file.recent.1"]
    );
}

#[test]
fn test_flatten_withPluralGroup_shouldClassifyAndKeepSuffix() {
    let tree = json!({
        "inbox": {
            "count_one": "{{n}} message",
            "count_other": "{{n}} messages"
        }
    });

    let units = flatten(&tree);
    assert_eq!(units.len(), 2);
    assert_eq!(units[0].key, "inbox.count_one");
    assert_eq!(units[0].plural_form, PluralForm::One);
    assert_eq!(units[1].key, "inbox.count_other");
    assert_eq!(units[1].plural_form, PluralForm::Other);
}

#[test]
fn test_roundtrip_withIdentityTranslations_shouldReturnIdenticalTree() {
    let tree = json!({
        "app": {
            "title": "Hello {name}",
            "items_zero": "no items",
            "items_one": "one item",
            "items_two": "two items",
            "items_few": "a few items",
            "items_many": "many items",
            "items_other": "{{count}} items",
            "flags": [true, "yes", 3, null],
            "nested": {"deep": {"deeper": "value"}}
        },
        "threshold": 0.5
    });

    let units = flatten(&tree);
    let identity: HashMap<String, String> = units
        .iter()
        .map(|u| (u.key.clone(), u.source_text.clone()))
        .collect();

    let rebuilt = reconstruct(&tree, &identity);
    assert_eq!(rebuilt, tree);
}

#[test]
fn test_reconstruct_withTranslations_shouldSubstituteByKey() {
    let tree = json!({"app": {"greeting": "Hello", "farewell": "Bye"}});
    let mut translations = HashMap::new();
    translations.insert("app.greeting".to_string(), "Bonjour".to_string());
    translations.insert("app.farewell".to_string(), "Au revoir".to_string());

    let rebuilt = reconstruct(&tree, &translations);
    assert_eq!(
        rebuilt,
        json!({"app": {"greeting": "Bonjour", "farewell": "Au revoir"}})
    );
}

#[test]
fn test_reconstruct_withMissingTranslation_shouldKeepSourceNeverNull() {
    let tree = json!({"a": "left alone", "b": "translated"});
    let mut translations = HashMap::new();
    translations.insert("b".to_string(), "traduit".to_string());

    let rebuilt = reconstruct(&tree, &translations);
    assert_eq!(rebuilt, json!({"a": "left alone", "b": "traduit"}));
}

#[test]
fn test_reconstruct_shouldPassNonStringLeavesThrough() {
    let tree = json!({"enabled": true, "retries": 3, "label": "Send"});
    let mut translations = HashMap::new();
    translations.insert("label".to_string(), "Envoyer".to_string());

    let rebuilt = reconstruct(&tree, &translations);
    assert_eq!(rebuilt, json!({"enabled": true, "retries": 3, "label": "Envoyer"}));
}

#[test]
fn test_flatten_withEmptyTree_shouldProduceNoUnits() {
    assert!(flatten(&json!({})).is_empty());
}
