//! JSON read/write primitives.
//!
//! Plain values go through [`StreamValue`]; engine objects go through the
//! read-method maps of [`Serializable`]. Read errors never propagate: the
//! offending field is skipped, a warning is logged with the current
//! [`location`], and every other field still loads.

mod location;
mod values;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::serializable::Serializable;
use crate::warning;

pub use location::{Location, location};
pub use values::StreamValue;

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("expected {expected}, found {found}")]
    UnexpectedKind { expected: &'static str, found: &'static str },

    #[error("{value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("could not read {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("could not parse {path}: {source}")]
    Parse { path: PathBuf, #[source] source: serde_json::Error },
}

/// Human-readable name of a JSON node's kind, for error messages.
pub fn kind_name(json: &Value) -> &'static str {
    match json {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Values ──────────────────────────────────────────────────────────────────

/// Reads `json` into `target`. On failure `target` is left untouched and a
/// warning is logged. Returns whether the read succeeded.
pub fn read<T: StreamValue>(target: &mut T, json: &Value) -> bool {
    match target.read_value(json) {
        Ok(()) => true,
        Err(err) => {
            warning!("JSON error: {err} at {}", location());
            false
        }
    }
}

pub fn write<T: StreamValue + ?Sized>(value: &T) -> Value {
    value.write_value()
}

/// Reads a JSON array of plain values. Elements that fail to read are
/// skipped with a warning.
pub fn read_array<T: StreamValue + Default>(target: &mut Vec<T>, json: &Value) -> bool {
    read(target, json)
}

pub fn write_array<T: StreamValue>(values: &[T]) -> Value {
    Value::Array(values.iter().map(StreamValue::write_value).collect())
}

// ── Objects ─────────────────────────────────────────────────────────────────

/// Dispatches each key of a JSON object to the matching read method of `T`,
/// then runs `after_load`.
pub fn read_object<T: Serializable + 'static>(target: &mut T, json: &Value) {
    let Some(object) = json.as_object() else {
        warning!("JSON error: expected object, found {} at {}", kind_name(json), location());
        return;
    };
    read_fields(target, object);
    target.after_load();
}

/// Like [`read_object`] but ignores the listed keys. Used where a wrapper
/// key (a component's `Type`) shares the object with the fields.
pub fn read_object_except<T: Serializable + 'static>(target: &mut T, json: &Value, skip: &[&str]) {
    let Some(object) = json.as_object() else {
        warning!("JSON error: expected object, found {} at {}", kind_name(json), location());
        return;
    };
    let filtered: Map<String, Value> = object
        .iter()
        .filter(|(key, _)| !skip.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    read_fields(target, &filtered);
    target.after_load();
}

fn read_fields<T: Serializable + 'static>(target: &mut T, object: &Map<String, Value>) {
    let methods = T::read_methods();
    for (key, value) in object {
        match methods.iter().find(|(name, _)| *name == key.as_str()) {
            Some((_, method)) => {
                let _at = Location::key(key);
                method(target, value);
            }
            None => warning!("JSON error: unrecognized key \"{key}\" at {}", location()),
        }
    }
}

pub fn write_object<T: Serializable>(value: &T) -> Value {
    value.write()
}

/// Reads a JSON array of objects, replacing the contents of `target`.
pub fn read_objects<T: Serializable + Default + 'static>(target: &mut Vec<T>, json: &Value) {
    let Some(items) = json.as_array() else {
        warning!("JSON error: expected array, found {} at {}", kind_name(json), location());
        return;
    };
    target.clear();
    for (i, item) in items.iter().enumerate() {
        let _at = Location::index(i);
        let mut value = T::default();
        read_object(&mut value, item);
        target.push(value);
    }
}

pub fn write_objects<T: Serializable>(values: &[T]) -> Value {
    Value::Array(values.iter().map(Serializable::write).collect())
}

// ── Files ───────────────────────────────────────────────────────────────────

pub fn parse_file(path: &Path) -> Result<Value, StreamError> {
    let text = fs::read_to_string(path)
        .map_err(|source| StreamError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_str(&text)
        .map_err(|source| StreamError::Parse { path: path.to_path_buf(), source })
}

/// Parses `path` and reads it into `target`, tagging warnings with the path.
pub fn read_file<T: Serializable + 'static>(target: &mut T, path: &Path) -> Result<(), StreamError> {
    let json = parse_file(path)?;
    let _at = Location::file(path);
    read_object(target, &json);
    Ok(())
}

pub fn write_file(path: &Path, json: &Value) -> Result<(), StreamError> {
    let io = |source: std::io::Error| StreamError::Io { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io)?;
    }
    let text = serde_json::to_string_pretty(json)
        .map_err(|source| StreamError::Parse { path: path.to_path_buf(), source })?;
    fs::write(path, text).map_err(io)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::diag;
    use crate::serializable::ReadMethodMap;

    #[derive(Debug, Default, PartialEq)]
    struct Gauge {
        speed: f32,
        name: String,
        loaded: bool,
    }

    impl Gauge {
        fn read_speed(&mut self, json: &Value) { read(&mut self.speed, json); }
        fn read_name(&mut self, json: &Value) { read(&mut self.name, json); }

        const READ_METHODS: &'static ReadMethodMap<Self> =
            &[("Speed", Self::read_speed), ("Name", Self::read_name)];
    }

    impl Serializable for Gauge {
        fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }
        fn after_load(&mut self) { self.loaded = true; }
        fn write(&self) -> Value {
            json!({ "Speed": self.speed, "Name": self.name })
        }
    }

    #[test]
    fn dispatches_known_keys_and_runs_after_load() {
        let mut gauge = Gauge::default();
        read_object(&mut gauge, &json!({ "Speed": 2.5, "Name": "drill" }));
        assert_eq!(gauge, Gauge { speed: 2.5, name: "drill".into(), loaded: true });
    }

    #[test]
    fn unknown_key_warns_and_keeps_other_fields() {
        diag::drain();
        let mut gauge = Gauge::default();
        read_object(&mut gauge, &json!({ "Sped": 9.0, "Name": "drill" }));
        assert_eq!(gauge.name, "drill");
        assert_eq!(gauge.speed, 0.0);
        let warnings = diag::drain();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("\"Sped\""));
    }

    #[test]
    fn wrong_kind_skips_field_with_path() {
        diag::drain();
        let mut gauge = Gauge { speed: 1.0, ..Gauge::default() };
        {
            let _file = Location::file(Path::new("gauge.json"));
            read_object(&mut gauge, &json!({ "Speed": "fast" }));
        }
        assert_eq!(gauge.speed, 1.0);
        let warnings = diag::drain();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("gauge.json::Speed"), "{}", warnings[0]);
    }

    #[test]
    fn except_ignores_wrapper_keys() {
        diag::drain();
        let mut gauge = Gauge::default();
        read_object_except(&mut gauge, &json!({ "Type": "Gauge", "Speed": 3.0 }), &["Type"]);
        assert_eq!(gauge.speed, 3.0);
        assert!(diag::drain().is_empty());
    }

    #[test]
    fn object_arrays_replace_contents() {
        let mut gauges: Vec<Gauge> = Vec::new();
        read_objects(&mut gauges, &json!([{ "Speed": 1.0 }, { "Speed": 2.0 }]));
        assert_eq!(gauges.len(), 2);
        assert_eq!(gauges[1].speed, 2.0);
        assert_eq!(write_objects(&gauges)[0]["Speed"], json!(1.0));
    }

    #[test]
    fn output_keeps_insertion_order() {
        let gauge = Gauge { speed: 1.0, name: "a".into(), loaded: false };
        let text = serde_json::to_string(&write_object(&gauge)).unwrap();
        assert!(text.find("Speed").unwrap() < text.find("Name").unwrap());
    }
}
