//! JSON merge helpers for layered configuration.

use serde_json::{Map, Value};

/// Recursively overlay objects; any other value replaces the base.
pub(super) fn merge_json_values(base: &mut Value, overlay: &Value) {
    if let (Value::Object(base_map), Value::Object(overlay_map)) = (&mut *base, overlay) {
        for (key, value) in overlay_map {
            match base_map.get_mut(key) {
                Some(existing) => merge_json_values(existing, value),
                None => {
                    base_map.insert(key.clone(), value.clone());
                }
            }
        }
        return;
    }
    *base = overlay.clone();
}

/// Overlay like [`merge_json_values`], skipping leaves present in `constraints`.
pub(super) fn merge_json_with_constraints(
    base: &mut Value,
    overlay: &Value,
    constraints: Option<&Value>,
) {
    let Some(constraints) = constraints else {
        merge_json_values(base, overlay);
        return;
    };
    // A non-object constraint locks the whole subtree.
    let Value::Object(locked) = constraints else {
        return;
    };
    let Value::Object(overlay_map) = overlay else {
        return;
    };
    if !base.is_object() {
        *base = Value::Object(Map::new());
    }
    let Value::Object(base_map) = base else {
        return;
    };
    for (key, value) in overlay_map {
        let slot = base_map
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        match locked.get(key) {
            None => merge_json_values(slot, value),
            Some(nested) => merge_json_with_constraints(slot, value, Some(nested)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn locked_leaf_survives_overlay() {
        let constraints = json!({ "sampler": { "capacity": 10 } });
        let mut base = constraints.clone();
        merge_json_with_constraints(
            &mut base,
            &json!({ "sampler": { "capacity": 50, "interval_ms": 250 } }),
            Some(&constraints),
        );
        assert_eq!(base, json!({ "sampler": { "capacity": 10, "interval_ms": 250 } }));
    }
}
