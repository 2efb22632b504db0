// Copyright 2023 Datafuse Labs.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Typed conversion between [`Value`] and Rust types.
//!
//! A type takes part in [`Value::is`] and [`Value::as_type`] by
//! implementing [`JsonTypeTraits`]. Implementations keep `is` and
//! `as_type` in agreement: when `is` returns `false`, `as_type` fails.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::hash::BuildHasher;

use crate::byte_string::decode_bytes;
use crate::byte_string::ByteString;
use crate::error::Error;
use crate::error::Result;
use crate::number::parse_decimal_f64;
use crate::number::parse_integer_literal;
use crate::number::IntegerLiteral;
use crate::object::KeyOrder;
use crate::storage::Storage;
use crate::tag::SemanticTag;
use crate::value::Value;

pub trait JsonTypeTraits<'a>: Sized {
    /// Whether `value` converts into `Self`.
    fn is(value: &Value<'a>) -> bool;

    fn as_type(value: &Value<'a>) -> Result<Self>;

    fn to_value(self) -> Value<'a>;
}

fn invalid_cast(value: &Value<'_>, target: &str) -> Error {
    Error::InvalidCast(format!(
        "cannot convert {} to {}",
        value.resolve().storage_kind(),
        target
    ))
}

/// The integer held by a number or an integer literal string.
fn integer_literal(value: &Value<'_>) -> Option<IntegerLiteral> {
    if let Some(n) = value.as_number() {
        let v = n.as_i128()?;
        return Some(IntegerLiteral {
            negative: v < 0,
            magnitude: v.unsigned_abs(),
        });
    }
    let s = value.as_str()?;
    parse_integer_literal(s).ok()
}

macro_rules! impl_integer_traits {
    ($($t:ty),*) => {
        $(
            impl<'a> JsonTypeTraits<'a> for $t {
                fn is(value: &Value<'a>) -> bool {
                    integer_literal(value).and_then(|l| l.cast::<$t>()).is_some()
                }

                fn as_type(value: &Value<'a>) -> Result<Self> {
                    integer_literal(value)
                        .and_then(|l| l.cast::<$t>())
                        .ok_or_else(|| invalid_cast(value, stringify!($t)))
                }

                fn to_value(self) -> Value<'a> {
                    Value::from(self)
                }
            }
        )*
    };
}

impl_integer_traits!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<'a> JsonTypeTraits<'a> for i128 {
    fn is(value: &Value<'a>) -> bool {
        integer_literal(value).and_then(|l| l.to_i128()).is_some()
    }

    fn as_type(value: &Value<'a>) -> Result<Self> {
        integer_literal(value)
            .and_then(|l| l.to_i128())
            .ok_or_else(|| invalid_cast(value, "i128"))
    }

    /// Values outside the 64-bit range become bigint strings.
    fn to_value(self) -> Value<'a> {
        if let Ok(v) = i64::try_from(self) {
            Value::from(v)
        } else if let Ok(v) = u64::try_from(self) {
            Value::from(v)
        } else {
            Value::bigint(&self.to_string())
        }
    }
}

impl<'a> JsonTypeTraits<'a> for u128 {
    fn is(value: &Value<'a>) -> bool {
        integer_literal(value).and_then(|l| l.to_u128()).is_some()
    }

    fn as_type(value: &Value<'a>) -> Result<Self> {
        integer_literal(value)
            .and_then(|l| l.to_u128())
            .ok_or_else(|| invalid_cast(value, "u128"))
    }

    fn to_value(self) -> Value<'a> {
        match u64::try_from(self) {
            Ok(v) => Value::from(v),
            Err(_) => Value::bigint(&self.to_string()),
        }
    }
}

/// Float view of numbers and of numeric text tagged as a big number.
fn float_value(value: &Value<'_>) -> Option<f64> {
    if let Some(n) = value.as_number() {
        return Some(n.as_f64());
    }
    let s = value.as_str()?;
    match value.tag() {
        SemanticTag::Bigint | SemanticTag::Bigdec => parse_decimal_f64(s).ok(),
        _ => None,
    }
}

impl<'a> JsonTypeTraits<'a> for f64 {
    fn is(value: &Value<'a>) -> bool {
        float_value(value).is_some()
    }

    fn as_type(value: &Value<'a>) -> Result<Self> {
        float_value(value).ok_or_else(|| invalid_cast(value, "f64"))
    }

    fn to_value(self) -> Value<'a> {
        Value::from(self)
    }
}

impl<'a> JsonTypeTraits<'a> for f32 {
    fn is(value: &Value<'a>) -> bool {
        float_value(value).is_some()
    }

    fn as_type(value: &Value<'a>) -> Result<Self> {
        float_value(value)
            .map(|v| v as f32)
            .ok_or_else(|| invalid_cast(value, "f32"))
    }

    fn to_value(self) -> Value<'a> {
        Value::from(self as f64)
    }
}

impl<'a> JsonTypeTraits<'a> for bool {
    fn is(value: &Value<'a>) -> bool {
        value.is_bool()
    }

    fn as_type(value: &Value<'a>) -> Result<Self> {
        value.as_bool().ok_or_else(|| invalid_cast(value, "bool"))
    }

    fn to_value(self) -> Value<'a> {
        Value::from(self)
    }
}

impl<'a> JsonTypeTraits<'a> for String {
    fn is(value: &Value<'a>) -> bool {
        value.is_string()
    }

    fn as_type(value: &Value<'a>) -> Result<Self> {
        value
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| invalid_cast(value, "string"))
    }

    fn to_value(self) -> Value<'a> {
        Value::from(self)
    }
}

impl<'a> JsonTypeTraits<'a> for ByteString {
    /// Byte strings, and text strings in their encoded form.
    fn is(value: &Value<'a>) -> bool {
        match &value.resolve().0 {
            Storage::ByteString(..) => true,
            Storage::ShortString(s, tag) => decode_bytes(s.as_str(), *tag).is_ok(),
            Storage::LongString(s, tag) => decode_bytes(s, *tag).is_ok(),
            _ => false,
        }
    }

    /// Text is decoded as selected by its tag, base64url when untagged.
    fn as_type(value: &Value<'a>) -> Result<Self> {
        match &value.resolve().0 {
            Storage::ByteString(b, ..) => Ok(b.clone()),
            Storage::ShortString(s, tag) => ByteString::from_text(s.as_str(), *tag),
            Storage::LongString(s, tag) => ByteString::from_text(s, *tag),
            _ => Err(invalid_cast(value, "byte string")),
        }
    }

    fn to_value(self) -> Value<'a> {
        Value(Storage::ByteString(self, SemanticTag::None, 0))
    }
}

impl<'a> JsonTypeTraits<'a> for Value<'a> {
    fn is(_value: &Value<'a>) -> bool {
        true
    }

    fn as_type(value: &Value<'a>) -> Result<Self> {
        Ok(value.clone())
    }

    fn to_value(self) -> Value<'a> {
        self
    }
}

impl<'a, T: JsonTypeTraits<'a>> JsonTypeTraits<'a> for Option<T> {
    fn is(value: &Value<'a>) -> bool {
        value.is_null() || T::is(value)
    }

    fn as_type(value: &Value<'a>) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::as_type(value).map(Some)
        }
    }

    fn to_value(self) -> Value<'a> {
        match self {
            Some(v) => v.to_value(),
            None => Value::null(),
        }
    }
}

impl<'a, T: JsonTypeTraits<'a>> JsonTypeTraits<'a> for Vec<T> {
    fn is(value: &Value<'a>) -> bool {
        value
            .as_array()
            .is_some_and(|items| items.iter().all(|v| T::is(v)))
    }

    fn as_type(value: &Value<'a>) -> Result<Self> {
        let items = value.as_array().ok_or_else(|| invalid_cast(value, "array"))?;
        items.iter().map(|v| T::as_type(v)).collect()
    }

    fn to_value(self) -> Value<'a> {
        Value::from(self.into_iter().map(T::to_value).collect::<Vec<_>>())
    }
}

impl<'a, T: JsonTypeTraits<'a>> JsonTypeTraits<'a> for BTreeMap<String, T> {
    fn is(value: &Value<'a>) -> bool {
        value
            .as_object()
            .is_some_and(|obj| obj.values().all(|v| T::is(v)))
    }

    fn as_type(value: &Value<'a>) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| invalid_cast(value, "object"))?;
        obj.iter()
            .map(|kv| Ok((kv.key().to_string(), T::as_type(kv.value())?)))
            .collect()
    }

    fn to_value(self) -> Value<'a> {
        let mut obj = Value::object(KeyOrder::Sorted);
        for (k, v) in self {
            let _ = obj.insert_or_assign(&k, v.to_value());
        }
        obj
    }
}

impl<'a, T, S> JsonTypeTraits<'a> for HashMap<String, T, S>
where
    T: JsonTypeTraits<'a>,
    S: BuildHasher + Default,
{
    fn is(value: &Value<'a>) -> bool {
        value
            .as_object()
            .is_some_and(|obj| obj.values().all(|v| T::is(v)))
    }

    fn as_type(value: &Value<'a>) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| invalid_cast(value, "object"))?;
        obj.iter()
            .map(|kv| Ok((kv.key().to_string(), T::as_type(kv.value())?)))
            .collect()
    }

    fn to_value(self) -> Value<'a> {
        let mut obj = Value::object(KeyOrder::Sorted);
        for (k, v) in self {
            let _ = obj.insert_or_assign(&k, v.to_value());
        }
        obj
    }
}
