//! Preference documents (JSON or property lists) normalised into one value model.

use crate::error::{PurgeError, Result};
use serde_json::{Map, Number, Value};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// How far into a file to look for a `<plist` marker.
const PLIST_SNIFF_BYTES: usize = 512;

#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub root: Value,
}

impl Document {
    /// Parse a JSON document or a binary/XML property list.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let root = parse_bytes(path, &bytes)?;
        Ok(Self {
            path: path.to_path_buf(),
            root,
        })
    }

    /// Values reached by `field`, in document order.
    pub fn lookup<'a>(&'a self, field: &FieldPath) -> Vec<&'a Value> {
        let mut current = vec![&self.root];
        for segment in &field.segments {
            let mut next = Vec::new();
            for value in current {
                match (segment.as_str(), value) {
                    ("*", Value::Array(items)) => next.extend(items.iter()),
                    ("*", Value::Object(map)) => next.extend(map.values()),
                    (key, Value::Object(map)) => {
                        if let Some(v) = map.get(key) {
                            next.push(v);
                        }
                    }
                    (index, Value::Array(items)) => {
                        if let Some(v) = index.parse::<usize>().ok().and_then(|i| items.get(i)) {
                            next.push(v);
                        }
                    }
                    _ => {}
                }
            }
            current = next;
        }
        current
    }

    /// True when any string reached by `field` equals `needle` exactly.
    pub fn field_equals(&self, field: &FieldPath, needle: &str) -> bool {
        self.lookup(field)
            .into_iter()
            .any(|value| value.as_str() == Some(needle))
    }

    /// JSON pointers of every string leaf containing `needle`.
    pub fn leaves_containing(&self, needle: &str) -> Vec<String> {
        let mut hits = Vec::new();
        walk_strings(&self.root, &mut String::new(), &mut |pointer, s| {
            if s.contains(needle) {
                hits.push(pointer.to_string());
            }
        });
        hits
    }
}

/// A dotted field path; `*` matches every element of an array or map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    pub raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            segments: raw.split('.').map(|s| s.to_string()).collect(),
        }
    }
}

fn parse_bytes(path: &Path, bytes: &[u8]) -> Result<Value> {
    if looks_like_plist(bytes) {
        let value = plist::Value::from_reader(Cursor::new(bytes))?;
        return Ok(plist_to_json(value));
    }

    serde_json::from_slice(bytes).map_err(|e| PurgeError::parse(path, e))
}

fn looks_like_plist(bytes: &[u8]) -> bool {
    if bytes.starts_with(b"bplist") {
        return true;
    }
    let head = &bytes[..bytes.len().min(PLIST_SNIFF_BYTES)];
    head.windows(6).any(|w| w == b"<plist")
}

fn plist_to_json(value: plist::Value) -> Value {
    match value {
        plist::Value::Array(items) => Value::Array(items.into_iter().map(plist_to_json).collect()),
        plist::Value::Dictionary(dict) => {
            let map: Map<String, Value> = dict
                .into_iter()
                .map(|(k, v)| (k, plist_to_json(v)))
                .collect();
            Value::Object(map)
        }
        plist::Value::Boolean(b) => Value::Bool(b),
        plist::Value::String(s) => Value::String(s),
        plist::Value::Integer(i) => i
            .as_signed()
            .map(|n| Value::Number(n.into()))
            .or_else(|| i.as_unsigned().map(|n| Value::Number(n.into())))
            .unwrap_or(Value::Null),
        plist::Value::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        // Data, dates and UIDs never carry a searchable address.
        _ => Value::Null,
    }
}

fn walk_strings(value: &Value, pointer: &mut String, visit: &mut dyn FnMut(&str, &str)) {
    match value {
        Value::String(s) => visit(pointer, s),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&i.to_string());
                walk_strings(item, pointer, visit);
                pointer.truncate(len);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&key.replace('~', "~0").replace('/', "~1"));
                walk_strings(item, pointer, visit);
                pointer.truncate(len);
            }
        }
        _ => {}
    }
}
