//! Merge strategies for combining source contributions.

use serde_json::Value;

use crate::aggregate::ConfigTree;
use crate::config::MergeStrategy;

/// Merge `overlay` into `base`, reporting every overridden top-level key
/// to `on_override`.
pub fn merge_into<F>(base: &mut ConfigTree, overlay: ConfigTree, strategy: MergeStrategy, mut on_override: F)
where
    F: FnMut(&str),
{
    for (key, value) in overlay {
        if base.contains_key(&key) {
            on_override(&key);
        }
        match strategy {
            MergeStrategy::Shallow => {
                base.insert(key, value);
            }
            MergeStrategy::Deep => match base.get_mut(&key) {
                Some(existing) => deep_merge(existing, value),
                None => {
                    base.insert(key, value);
                }
            },
        }
    }
}

fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
