use glam::{IVec2, IVec3, IVec4, Vec2, Vec3, Vec4};
use serde_json::Value;

use super::{Location, StreamError, kind_name, location};
use crate::warning;

/// A plain value that reads from and writes to a single JSON node.
///
/// `read_value` must leave `self` unchanged when it returns an error.
pub trait StreamValue {
    fn read_value(&mut self, json: &Value) -> Result<(), StreamError>;
    fn write_value(&self) -> Value;
}

fn unexpected(expected: &'static str, json: &Value) -> StreamError {
    StreamError::UnexpectedKind { expected, found: kind_name(json) }
}

fn out_of_range(json: &Value, target: &'static str) -> StreamError {
    StreamError::OutOfRange { value: json.to_string(), target }
}

fn integer(json: &Value) -> Result<i128, StreamError> {
    if let Some(value) = json.as_i64() {
        Ok(value as i128)
    } else if let Some(value) = json.as_u64() {
        Ok(value as i128)
    } else {
        Err(unexpected("integer", json))
    }
}

macro_rules! integer_value {
    ($($ty:ty),*) => {$(
        impl StreamValue for $ty {
            fn read_value(&mut self, json: &Value) -> Result<(), StreamError> {
                *self = <$ty>::try_from(integer(json)?)
                    .map_err(|_| out_of_range(json, stringify!($ty)))?;
                Ok(())
            }

            fn write_value(&self) -> Value {
                Value::from(*self)
            }
        }
    )*};
}

integer_value!(i32, u32, i64, u64, usize);

impl StreamValue for f32 {
    fn read_value(&mut self, json: &Value) -> Result<(), StreamError> {
        let value = json.as_f64().ok_or_else(|| unexpected("number", json))?;
        if value.is_finite() && value.abs() > f32::MAX as f64 {
            return Err(out_of_range(json, "f32"));
        }
        *self = value as f32;
        Ok(())
    }

    fn write_value(&self) -> Value {
        Value::from(*self as f64)
    }
}

impl StreamValue for f64 {
    fn read_value(&mut self, json: &Value) -> Result<(), StreamError> {
        *self = json.as_f64().ok_or_else(|| unexpected("number", json))?;
        Ok(())
    }

    fn write_value(&self) -> Value {
        Value::from(*self)
    }
}

impl StreamValue for bool {
    fn read_value(&mut self, json: &Value) -> Result<(), StreamError> {
        *self = json.as_bool().ok_or_else(|| unexpected("bool", json))?;
        Ok(())
    }

    fn write_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl StreamValue for String {
    fn read_value(&mut self, json: &Value) -> Result<(), StreamError> {
        let value = json.as_str().ok_or_else(|| unexpected("string", json))?;
        self.clear();
        self.push_str(value);
        Ok(())
    }

    fn write_value(&self) -> Value {
        Value::String(self.clone())
    }
}

// ── Fixed-length vectors ────────────────────────────────────────────────────

/// Reads up to `N` elements into `slots`. A length mismatch warns and reads
/// the overlapping prefix; any bad element fails the whole read.
fn read_fixed<T: StreamValue + Copy, const N: usize>(
    slots: &mut [T; N],
    json: &Value,
) -> Result<(), StreamError> {
    let items = json.as_array().ok_or_else(|| unexpected("array", json))?;
    if items.len() != N {
        warning!(
            "JSON error: expected array of size {N}, found size {} at {}",
            items.len(),
            location()
        );
    }
    let mut staged = *slots;
    for (slot, item) in staged.iter_mut().zip(items) {
        slot.read_value(item)?;
    }
    *slots = staged;
    Ok(())
}

macro_rules! vector_value {
    ($($vec:ty),*) => {$(
        impl StreamValue for $vec {
            fn read_value(&mut self, json: &Value) -> Result<(), StreamError> {
                let mut components = self.to_array();
                read_fixed(&mut components, json)?;
                *self = <$vec>::from_array(components);
                Ok(())
            }

            fn write_value(&self) -> Value {
                Value::Array(self.to_array().iter().map(StreamValue::write_value).collect())
            }
        }
    )*};
}

vector_value!(Vec2, Vec3, Vec4, IVec2, IVec3, IVec4);

// ── Arrays ──────────────────────────────────────────────────────────────────

impl<T: StreamValue + Default> StreamValue for Vec<T> {
    fn read_value(&mut self, json: &Value) -> Result<(), StreamError> {
        let items = json.as_array().ok_or_else(|| unexpected("array", json))?;
        let mut values = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let _at = Location::index(i);
            let mut value = T::default();
            match value.read_value(item) {
                Ok(()) => values.push(value),
                Err(err) => warning!("JSON error: {err} at {}", location()),
            }
        }
        *self = values;
        Ok(())
    }

    fn write_value(&self) -> Value {
        Value::Array(self.iter().map(StreamValue::write_value).collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::diag;
    use crate::stream::read;

    #[test]
    fn integers_reject_floats_and_overflow() {
        let mut value = 7i32;
        assert!(value.read_value(&json!(1.5)).is_err());
        assert!(value.read_value(&json!(1u64 << 40)).is_err());
        assert!(value.read_value(&json!(-3)).is_ok());
        assert_eq!(value, -3);

        let mut unsigned = 1u32;
        assert!(unsigned.read_value(&json!(-1)).is_err());
        assert_eq!(unsigned, 1);
    }

    #[test]
    fn floats_accept_integers() {
        let mut value = 0.0f32;
        value.read_value(&json!(4)).unwrap();
        assert_eq!(value, 4.0);
    }

    #[test]
    fn short_vector_reads_prefix_with_warning() {
        diag::drain();
        let mut v = Vec3::new(9.0, 9.0, 9.0);
        assert!(read(&mut v, &json!([1, 2])));
        assert_eq!(v, Vec3::new(1.0, 2.0, 9.0));
        assert_eq!(diag::drain().len(), 1);
    }

    #[test]
    fn bad_vector_element_keeps_old_value() {
        let mut v = IVec2::new(3, 4);
        assert!(!read(&mut v, &json!([1, "x"])));
        assert_eq!(v, IVec2::new(3, 4));
    }

    #[test]
    fn arrays_skip_bad_elements() {
        diag::drain();
        let mut ids: Vec<i32> = Vec::new();
        assert!(read(&mut ids, &json!([1, "two", 3])));
        assert_eq!(ids, vec![1, 3]);
        let warnings = diag::drain();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("[1]"));
    }

    #[test]
    fn vectors_write_as_number_arrays() {
        assert_eq!(Vec2::new(1.0, 2.0).write_value(), json!([1.0, 2.0]));
        assert_eq!(IVec3::new(1, 2, 3).write_value(), json!([1, 2, 3]));
    }
}
