use serde_json::{Value, json};

/// `searchset` bundle with each resource under an `entry[].resource` envelope.
pub fn searchset(resources: Vec<Value>) -> Value {
    let total = resources.len();
    let entry: Vec<Value> = resources
        .into_iter()
        .map(|resource| json!({ "resource": resource }))
        .collect();
    json!({
        "resourceType": "Bundle",
        "type": "searchset",
        "total": total,
        "entry": entry,
    })
}

/// Resources of a bundle, with or without the `resource` envelope.
pub fn entries(bundle: &Value) -> Vec<&Value> {
    bundle
        .get("entry")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter(|entry| entry.is_object())
                .map(|entry| entry.get("resource").unwrap_or(entry))
                .collect()
        })
        .unwrap_or_default()
}
