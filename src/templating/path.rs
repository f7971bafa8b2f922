//! Dotted-path access into JSON value trees.
//!
//! Both the generation context and the staged copy of a case record are plain
//! `serde_json::Value` trees, addressed with paths such as
//! `questionnaire.personal_data.surname`. Array elements are addressed with a
//! numeric segment (`assignees.0.name`).

use serde_json::{Map, Value};

/// Resolve `path` inside `root`.
///
/// Returns `None` as soon as a segment is missing or the value at an
/// intermediate position cannot be descended into. Never panics.
///
/// # Examples
///
/// ```
/// use casedoc::templating::path::get;
/// use serde_json::json;
///
/// let root = json!({ "client": { "name": "Jan" } });
/// assert_eq!(get(&root, "client.name"), Some(&json!("Jan")));
/// assert_eq!(get(&root, "client.email"), None);
/// assert_eq!(get(&root, "client.name.first"), None);
/// ```
pub fn get<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Assign `value` at `path` inside `root`, creating intermediate objects.
///
/// Any intermediate segment that is absent or holds a scalar is replaced by an
/// empty object, so a scalar found on the way is overwritten. Arrays are
/// descended into when the segment is an index; they are padded with `null`
/// if the index is past the end.
///
/// # Examples
///
/// ```
/// use casedoc::templating::path::{get, set};
/// use serde_json::json;
///
/// let mut root = json!({ "client": "legacy" });
/// set(&mut root, "client.contact.email", json!("jan@example.com"));
/// assert_eq!(get(&root, "client.contact.email"), Some(&json!("jan@example.com")));
/// ```
pub fn set(root: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = root;
    for segment in parents {
        current = child_mut(current, segment);
    }
    assign(current, last, value);
}

/// Descend one segment, materialising an object when needed.
fn child_mut<'a>(parent: &'a mut Value, segment: &str) -> &'a mut Value {
    if let (true, Ok(index)) = (parent.is_array(), segment.parse::<usize>()) {
        let Value::Array(items) = parent else {
            unreachable!("checked above");
        };
        if items.len() <= index {
            items.resize(index + 1, Value::Null);
        }
        if !items[index].is_object() && !items[index].is_array() {
            items[index] = Value::Object(Map::new());
        }
        return &mut items[index];
    }

    let map = ensure_object(parent);
    let entry = map.entry(segment.to_string()).or_insert(Value::Null);
    if !entry.is_object() && !entry.is_array() {
        *entry = Value::Object(Map::new());
    }
    entry
}

fn assign(target: &mut Value, segment: &str, value: Value) {
    if let Value::Array(items) = target {
        if let Ok(index) = segment.parse::<usize>() {
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            items[index] = value;
            return;
        }
    }
    ensure_object(target).insert(segment.to_string(), value);
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}

/// Whether a resolved value counts as "empty" for missing-field detection.
///
/// Absent, `null`, `false`, `0` and `""` are empty. Objects and arrays are
/// never empty, even when they have no members. A zero-valued numeric field is
/// indistinguishable from an unset one under this rule.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64().is_none_or(|f| f == 0.0 || f.is_nan()),
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => false,
    }
}
