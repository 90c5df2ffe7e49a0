use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use treediff::{value::Key, Delegate};

/// Longest string shown verbatim in a summary line. Media payloads are far longer.
const MAX_DISPLAY_CHARS: usize = 60;

/// A simplified view of one value involved in a change.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ValueRepr {
    String(String),
    Number(serde_json::Number),
    Boolean(bool),
    Null,
    /// Summary such as `[3 items]`.
    Array(String),
    /// Summary such as `{object}`.
    Object(String),
}

impl ValueRepr {
    fn from_json_value(val: &JsonValue) -> Self {
        match val {
            JsonValue::Null => ValueRepr::Null,
            JsonValue::Bool(b) => ValueRepr::Boolean(*b),
            JsonValue::Number(n) => ValueRepr::Number(n.clone()),
            JsonValue::String(s) => ValueRepr::String(s.clone()),
            JsonValue::Array(arr) => ValueRepr::Array(format!("[{} items]", arr.len())),
            JsonValue::Object(_) => ValueRepr::Object("{object}".to_string()),
        }
    }

    /// Quoted and escaped for a single summary line. Long strings are shortened.
    pub fn format_for_display(&self) -> String {
        match self {
            ValueRepr::String(s) => {
                let escaped = s
                    .replace('\\', "\\\\")
                    .replace('\n', "\\n")
                    .replace('\r', "\\r")
                    .replace('\t', "\\t")
                    .replace('\'', "\\'");
                match escaped.char_indices().nth(MAX_DISPLAY_CHARS) {
                    Some((cut, _)) => format!("'{}...'", &escaped[..cut]),
                    None => format!("'{escaped}'"),
                }
            }
            ValueRepr::Number(n) => n.to_string(),
            ValueRepr::Boolean(b) => b.to_string(),
            ValueRepr::Null => "null".to_string(),
            ValueRepr::Array(s) | ValueRepr::Object(s) => s.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

/// One difference between two revisions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Change {
    /// Dot-separated path with bracket indices, e.g. `slides[1].body.options[2]`.
    pub path: String,
    pub change_type: ChangeType,
    /// `None` for additions.
    pub old_value: Option<ValueRepr>,
    /// `None` for removals.
    pub new_value: Option<ValueRepr>,
}

/// treediff delegate that collects changes with their paths.
#[derive(Debug, Default)]
pub(crate) struct ChangeCollector {
    pub(crate) changes: Vec<Change>,
    current_path: Vec<String>,
}

impl ChangeCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Segments carry their own `.` or `[]` separators.
    fn format_path(&self) -> String {
        self.current_path.concat()
    }

    fn record(&mut self, change_type: ChangeType, old: Option<&JsonValue>, new: Option<&JsonValue>) {
        self.changes.push(Change {
            path: self.format_path(),
            change_type,
            old_value: old.map(ValueRepr::from_json_value),
            new_value: new.map(ValueRepr::from_json_value),
        });
    }
}

impl<'a> Delegate<'a, Key, JsonValue> for ChangeCollector {
    fn push(&mut self, segment: &Key) {
        let segment = match segment {
            Key::String(s) if self.current_path.is_empty() => s.clone(),
            Key::String(s) => format!(".{s}"),
            Key::Index(i) => format!("[{i}]"),
        };
        self.current_path.push(segment);
    }

    fn pop(&mut self) {
        self.current_path.pop();
    }

    // treediff reports additions and removals against the parent path.
    fn removed<'b>(&mut self, key: &'b Key, value: &'a JsonValue) {
        self.push(key);
        self.record(ChangeType::Removed, Some(value), None);
        self.pop();
    }

    fn added<'b>(&mut self, key: &'b Key, value: &'a JsonValue) {
        self.push(key);
        self.record(ChangeType::Added, None, Some(value));
        self.pop();
    }

    fn modified(&mut self, old: &'a JsonValue, new: &'a JsonValue) {
        self.record(ChangeType::Modified, Some(old), Some(new));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collects_paths_with_indices() {
        let old = json!({ "t": "A", "body": { "options": ["x", "y"] } });
        let new = json!({ "t": "B", "body": { "options": ["x", "z", "w"] } });
        let mut collector = ChangeCollector::new();
        treediff::diff(&old, &new, &mut collector);

        let paths: Vec<&str> = collector.changes.iter().map(|c| c.path.as_str()).collect();
        assert!(paths.contains(&"t"));
        assert!(paths.contains(&"body.options[1]"));
        assert!(paths.contains(&"body.options[2]"));
        let added = collector
            .changes
            .iter()
            .find(|c| c.path == "body.options[2]")
            .unwrap();
        assert_eq!(added.change_type, ChangeType::Added);
        assert_eq!(added.new_value, Some(ValueRepr::String("w".into())));
    }

    #[test]
    fn removed_object_keys_carry_their_own_path() {
        let old = json!({ "t": "A", "s": "Sub", "body": { "emoji": "x" } });
        let new = json!({ "t": "A", "body": {} });
        let mut collector = ChangeCollector::new();
        treediff::diff(&old, &new, &mut collector);

        let removed: Vec<&str> = collector
            .changes
            .iter()
            .filter(|c| c.change_type == ChangeType::Removed)
            .map(|c| c.path.as_str())
            .collect();
        assert_eq!(removed.len(), 2);
        assert!(removed.contains(&"s"));
        assert!(removed.contains(&"body.emoji"));
    }

    #[test]
    fn long_strings_are_shortened_for_display() {
        let repr = ValueRepr::String(format!("data:image/png;base64,{}", "A".repeat(200)));
        let shown = repr.format_for_display();
        assert!(shown.ends_with("...'"));
        assert!(shown.len() < 80);
        assert_eq!(
            ValueRepr::String("it's".into()).format_for_display(),
            r"'it\'s'"
        );
    }
}
