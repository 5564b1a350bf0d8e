//! Nested-value projection helpers.
//!
//! Problem documents are arbitrary JSON objects; the registry filters them
//! with key sequences (outermost key first) before returning them to
//! clients. These helpers implement the subset, exclusion, and path-lookup
//! operations on [`serde_json::Value`] objects.

use serde_json::{Map, Value};

/// Resolves a key sequence against a nested object.
///
/// Returns `None` if any step of the path is missing or a non-object value
/// is encountered before the final key.
///
/// # Example
///
/// ```
/// use foca_core::projection::get_by_path;
/// use serde_json::json;
///
/// let doc = json!({"details": {"code": 400}});
/// let code = get_by_path(&doc, &["details".into(), "code".into()]);
/// assert_eq!(code, Some(&json!(400)));
/// ```
#[must_use]
pub fn get_by_path<'a>(obj: &'a Value, key_sequence: &[String]) -> Option<&'a Value> {
    let mut current = obj;
    for key in key_sequence {
        current = current.as_object()?.get(key)?;
    }
    Some(current)
}

/// Creates a subset of a nested object.
///
/// The key sequence is applied from outside to inside and points at the key
/// (and descendants) to keep. An empty key sequence yields an empty object,
/// as does a path that does not resolve.
///
/// # Example
///
/// ```
/// use foca_core::projection::subset_nested;
/// use serde_json::json;
///
/// let doc = json!({
///     "title": "MyProblem",
///     "details": {"code": 400, "description": "some problem"},
///     "status": 400,
/// });
/// let subset = subset_nested(&doc, &["details".into(), "code".into()]);
/// assert_eq!(subset, json!({"details": {"code": 400}}));
/// ```
#[must_use]
pub fn subset_nested(obj: &Value, key_sequence: &[String]) -> Value {
    let mut filt = Map::new();
    if let Some((key, rest)) = key_sequence.split_first() {
        if let Some(value) = obj.as_object().and_then(|m| m.get(key)) {
            if rest.is_empty() {
                filt.insert(key.clone(), value.clone());
            } else {
                filt.insert(key.clone(), subset_nested(value, rest));
            }
        }
    }
    Value::Object(filt)
}

/// Removes the subtree named by a key sequence from a nested object.
///
/// All sibling keys survive. A path that does not resolve leaves the object
/// unchanged.
///
/// # Example
///
/// ```
/// use foca_core::projection::exclude_nested;
/// use serde_json::json;
///
/// let mut doc = json!({
///     "title": "MyProblem",
///     "details": {"code": 400, "description": "some problem"},
///     "status": 400,
/// });
/// exclude_nested(&mut doc, &["details".into(), "code".into()]);
/// assert_eq!(
///     doc,
///     json!({
///         "title": "MyProblem",
///         "details": {"description": "some problem"},
///         "status": 400,
///     })
/// );
/// ```
pub fn exclude_nested(obj: &mut Value, key_sequence: &[String]) {
    if let Some((key, rest)) = key_sequence.split_first() {
        if let Some(map) = obj.as_object_mut() {
            if rest.is_empty() {
                map.remove(key);
            } else if let Some(inner) = map.get_mut(key) {
                exclude_nested(inner, rest);
            }
        }
    }
}
