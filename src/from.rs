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

use core::iter::FromIterator;
use std::borrow::Cow;

use ordered_float::OrderedFloat;
use serde::ser::SerializeMap;
use serde::ser::SerializeSeq;
use serde::Serialize;
use serde::Serializer;
use serde_json::Map as JsonMap;
use serde_json::Number as JsonNumber;
use serde_json::Value as JsonValue;

use crate::byte_string::encode_bytes;
use crate::byte_string::ByteString;
use crate::number::half_to_f64;
use crate::object::KeyOrder;
use crate::object::KeyValue;
use crate::object::Object;
use crate::storage::Storage;
use crate::tag::SemanticTag;
use crate::value::Value;

macro_rules! from_signed_integer {
    ($($ty:ident)*) => {
        $(
            impl<'a> From<$ty> for Value<'a> {
                fn from(n: $ty) -> Self {
                    Value(Storage::Int64(n as i64, SemanticTag::None))
                }
            }
        )*
    };
}

macro_rules! from_unsigned_integer {
    ($($ty:ident)*) => {
        $(
            impl<'a> From<$ty> for Value<'a> {
                fn from(n: $ty) -> Self {
                    Value(Storage::UInt64(n as u64, SemanticTag::None))
                }
            }
        )*
    };
}

macro_rules! from_float {
    ($($ty:ident)*) => {
        $(
            impl<'a> From<$ty> for Value<'a> {
                fn from(n: $ty) -> Self {
                    Value(Storage::Double(n as f64, SemanticTag::None))
                }
            }
        )*
    };
}

from_signed_integer! {
    i8 i16 i32 i64 isize
}

from_unsigned_integer! {
    u8 u16 u32 u64 usize
}

from_float! {
    f32 f64
}

impl From<OrderedFloat<f32>> for Value<'_> {
    fn from(f: OrderedFloat<f32>) -> Self {
        Value::from(f.0)
    }
}

impl From<OrderedFloat<f64>> for Value<'_> {
    fn from(f: OrderedFloat<f64>) -> Self {
        Value::from(f.0)
    }
}

impl From<bool> for Value<'_> {
    fn from(f: bool) -> Self {
        Value(Storage::Bool(f, SemanticTag::None))
    }
}

impl From<String> for Value<'_> {
    fn from(f: String) -> Self {
        Value(Storage::from_string(f, SemanticTag::None))
    }
}

impl From<&str> for Value<'_> {
    fn from(f: &str) -> Self {
        Value(Storage::from_str(f, SemanticTag::None))
    }
}

impl From<Cow<'_, str>> for Value<'_> {
    fn from(f: Cow<'_, str>) -> Self {
        match f {
            Cow::Borrowed(s) => Value::from(s),
            Cow::Owned(s) => Value::from(s),
        }
    }
}

impl From<ByteString> for Value<'_> {
    fn from(f: ByteString) -> Self {
        Value(Storage::ByteString(f, SemanticTag::None, 0))
    }
}

impl<'a> From<Object<'a>> for Value<'a> {
    fn from(o: Object<'a>) -> Self {
        Value(Storage::Object(o, SemanticTag::None))
    }
}

impl<'a, T: Into<Value<'a>>> From<Vec<T>> for Value<'a> {
    fn from(f: Vec<T>) -> Self {
        Value(Storage::Array(
            f.into_iter().map(Into::into).collect(),
            SemanticTag::None,
        ))
    }
}

impl<'a, T: Clone + Into<Value<'a>>> From<&[T]> for Value<'a> {
    fn from(f: &[T]) -> Self {
        Value(Storage::Array(
            f.iter().cloned().map(Into::into).collect(),
            SemanticTag::None,
        ))
    }
}

impl<'a, T: Into<Value<'a>>> From<Option<T>> for Value<'a> {
    fn from(f: Option<T>) -> Self {
        match f {
            Some(v) => v.into(),
            None => Value::null(),
        }
    }
}

impl<'a, T: Into<Value<'a>>> FromIterator<T> for Value<'a> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value(Storage::Array(
            iter.into_iter().map(Into::into).collect(),
            SemanticTag::None,
        ))
    }
}

/// Collects members into a sorted object, the first of repeated keys wins.
impl<'a, K: Into<String>, V: Into<Value<'a>>> FromIterator<(K, V)> for Value<'a> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let members = iter
            .into_iter()
            .map(|(k, v)| KeyValue::new(k, v.into()))
            .collect();
        Value::from(Object::from_entries(KeyOrder::Sorted, members))
    }
}

impl From<()> for Value<'_> {
    fn from((): ()) -> Self {
        Value::null()
    }
}

/// The policy matching the iteration order of `serde_json::Map`.
fn json_map_order() -> KeyOrder {
    if cfg!(feature = "preserve_order") {
        KeyOrder::Preserved
    } else {
        KeyOrder::Sorted
    }
}

impl From<&JsonValue> for Value<'_> {
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::null(),
            JsonValue::Bool(v) => Value::from(*v),
            JsonValue::Number(v) => {
                if let Some(n) = v.as_u64() {
                    Value::from(n)
                } else if let Some(n) = v.as_i64() {
                    Value::from(n)
                } else if let Some(n) = v.as_f64() {
                    Value::from(n)
                } else {
                    Value::null()
                }
            }
            JsonValue::String(v) => Value::from(v.as_str()),
            JsonValue::Array(arr) => {
                let mut vals: Vec<Value> = Vec::with_capacity(arr.len());
                for val in arr {
                    vals.push(val.into());
                }
                Value::from(vals)
            }
            JsonValue::Object(obj) => {
                let mut map = Object::with_capacity(json_map_order(), obj.len());
                for (k, v) in obj.iter() {
                    map.insert_or_assign(k, v.into());
                }
                Value::from(map)
            }
        }
    }
}

impl From<JsonValue> for Value<'_> {
    fn from(value: JsonValue) -> Self {
        (&value).into()
    }
}

fn float_to_json(v: f64) -> JsonValue {
    match JsonNumber::from_f64(v) {
        Some(n) => JsonValue::Number(n),
        // NaN and Infinity have no JSON number
        None => JsonValue::Null,
    }
}

impl<'a> From<&Value<'a>> for JsonValue {
    fn from(value: &Value<'a>) -> Self {
        match &value.resolve().0 {
            Storage::Null(_) => JsonValue::Null,
            Storage::Bool(v, _) => JsonValue::Bool(*v),
            Storage::Int64(n, _) => JsonValue::Number((*n).into()),
            Storage::UInt64(n, _) => JsonValue::Number((*n).into()),
            Storage::Half(n, _) => float_to_json(half_to_f64(*n)),
            Storage::Double(n, _) => float_to_json(*n),
            Storage::ShortString(..) | Storage::LongString(..) => {
                let s = value.as_str().unwrap_or_default();
                if value.tag().is_number_tag() {
                    if let Ok(n) = s.parse::<JsonNumber>() {
                        return JsonValue::Number(n);
                    }
                }
                JsonValue::String(s.to_string())
            }
            Storage::ByteString(b, tag, _) => JsonValue::String(encode_bytes(b, *tag)),
            Storage::EmptyObject(..) => JsonValue::Object(JsonMap::new()),
            Storage::Array(arr, _) => JsonValue::Array(arr.iter().map(JsonValue::from).collect()),
            Storage::Object(obj, _) => {
                let mut map = JsonMap::new();
                for kv in obj.iter() {
                    map.insert(kv.key().to_string(), kv.value().into());
                }
                JsonValue::Object(map)
            }
            Storage::ConstRef(_) | Storage::Ref(_) => unreachable!(),
        }
    }
}

impl<'a> From<Value<'a>> for JsonValue {
    fn from(value: Value<'a>) -> Self {
        (&value).into()
    }
}

impl Serialize for Value<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match &self.resolve().0 {
            Storage::Null(_) => serializer.serialize_unit(),
            Storage::Bool(v, _) => serializer.serialize_bool(*v),
            Storage::Int64(v, _) => serializer.serialize_i64(*v),
            Storage::UInt64(v, _) => serializer.serialize_u64(*v),
            Storage::Half(v, _) => serializer.serialize_f64(half_to_f64(*v)),
            Storage::Double(v, _) => serializer.serialize_f64(*v),
            Storage::ShortString(v, _) => serializer.serialize_str(v.as_str()),
            Storage::LongString(v, _) => serializer.serialize_str(v),
            Storage::ByteString(v, ..) => serializer.serialize_bytes(v),
            Storage::EmptyObject(..) => serializer.serialize_map(Some(0))?.end(),
            Storage::Array(items, _) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Storage::Object(obj, _) => {
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for kv in obj.iter() {
                    map.serialize_entry(kv.key(), kv.value())?;
                }
                map.end()
            }
            Storage::ConstRef(_) | Storage::Ref(_) => unreachable!(),
        }
    }
}
