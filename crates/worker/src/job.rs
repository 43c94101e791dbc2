use catalogsearch_common::{CatalogSearchError, Result};
use catalogsearch_vector::codec::decode_text_array;
use catalogsearch_vector::EmbeddingJob;
use serde_json::{Map, Value};
use tracing::warn;

/// Decode a change-notification payload
///
/// Absent or null text fields become empty strings. Tag lists may arrive as a
/// JSON array, a Postgres array literal (`{a,"b c"}`) or a plain
/// comma-separated string, depending on how the trigger serialized them. A
/// list field that cannot be read is embedded as empty rather than dropping
/// the whole job.
pub fn decode_job(payload: &str) -> Result<EmbeddingJob> {
    let value: Value = serde_json::from_str(payload)?;
    let Value::Object(fields) = value else {
        return Err(CatalogSearchError::invalid_input(
            "notification payload is not a JSON object",
        ));
    };

    let id = text_field(&fields, "id");
    if id.trim().is_empty() {
        return Err(CatalogSearchError::invalid_input(
            "notification payload has no product id",
        ));
    }

    Ok(EmbeddingJob {
        id,
        name: text_field(&fields, "name"),
        description: text_field(&fields, "description"),
        categories: category_field(&fields),
        target_tags: list_field(&fields, "target_tags"),
        use_context: list_field(&fields, "use_context"),
    })
}

fn text_field(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Categories are embedded as one string; lists are flattened with ", "
fn category_field(fields: &Map<String, Value>) -> String {
    match fields.get("categories") {
        Some(Value::String(s)) if s.trim_start().starts_with('{') => match decode_text_array(s) {
            Ok(items) => items.join(", "),
            Err(e) => {
                warn!("Embedding categories as written: {}", e);
                s.clone()
            }
        },
        Some(Value::Array(_)) => list_field(fields, "categories").join(", "),
        _ => text_field(fields, "categories"),
    }
}

fn list_field(fields: &Map<String, Value>, key: &str) -> Vec<String> {
    let decoded = match fields.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => decode_text_array(s),
        Some(Value::Array(items)) => Ok(items
            .iter()
            .filter_map(|item| match item {
                Value::Null => None,
                Value::String(s) => Some(s.trim().to_string()),
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect()),
        Some(other) => Err(CatalogSearchError::invalid_input(format!(
            "expected a list or string, got {}",
            other
        ))),
    };

    decoded.unwrap_or_else(|e| {
        warn!("Ignoring unreadable {}: {}", key, e);
        Vec::new()
    })
}
