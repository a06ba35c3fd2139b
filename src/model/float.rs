//! JSON representation of `f32` fields.
//!
//! JSON has no NaN or infinity, and `serde_json` writes them as `null`. Finite values are
//! written as plain numbers, anything else as `{"bits": <u32>}` so the exact bit pattern
//! (NaN payload included) survives an export and import.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum FloatRepr {
    Number(f32),
    Bits { bits: u32 },
}

impl From<f32> for FloatRepr {
    fn from(value: f32) -> Self {
        if value.is_finite() {
            FloatRepr::Number(value)
        } else {
            FloatRepr::Bits {
                bits: value.to_bits(),
            }
        }
    }
}

impl From<FloatRepr> for f32 {
    fn from(repr: FloatRepr) -> Self {
        match repr {
            FloatRepr::Number(value) => value,
            FloatRepr::Bits { bits } => f32::from_bits(bits),
        }
    }
}

/// `#[serde(with = "...")]` helper for a single `f32`.
pub(crate) mod lossless_f32 {
    use super::*;

    pub fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        FloatRepr::from(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        FloatRepr::deserialize(deserializer).map(f32::from)
    }
}

/// `#[serde(with = "...")]` helper for fixed-size `f32` arrays.
pub(crate) mod lossless_f32_array {
    use super::*;
    use serde::de::Error as _;
    use serde::ser::SerializeTuple;

    pub fn serialize<S: Serializer, const N: usize>(
        values: &[f32; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(N)?;
        for value in values {
            tuple.serialize_element(&FloatRepr::from(*value))?;
        }
        tuple.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[f32; N], D::Error> {
        let values = Vec::<FloatRepr>::deserialize(deserializer)?;
        let len = values.len();

        let values: Vec<f32> = values.into_iter().map(f32::from).collect();
        let expected = format!("an array of {} floats", N);
        values
            .try_into()
            .map_err(|_| D::Error::invalid_length(len, &expected.as_str()))
    }
}
