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

use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::ops::Bound;
use std::ops::Index;
use std::ops::IndexMut;
use std::ops::RangeBounds;

use rand::distr::Alphanumeric;
use rand::distr::SampleString;
use rand::rng;
use rand::Rng;

use crate::byte_string::ByteString;
use crate::convert::JsonTypeTraits;
use crate::error::Error;
use crate::error::Result;
use crate::number::half_to_f64;
use crate::number::Number;
use crate::object::KeyOrder;
use crate::object::KeyValue;
use crate::object::Object;
use crate::storage::Storage;
use crate::tag::SemanticTag;
use crate::tag::StorageKind;

static NULL: Value<'static> = Value(Storage::Null(SemanticTag::None));
static EMPTY_OBJECT: Object<'static> = Object::new(KeyOrder::Sorted);

/// A JSON-model document value.
///
/// A value is null, a boolean, a number, a string, a byte string, an array
/// or an object, refined by a [`SemanticTag`]. It owns its whole subtree
/// unless it was built with [`Value::const_ref`] or [`Value::mut_ref`],
/// which borrow another value instead of copying it. Reads through such a
/// reference see the referent; writes through a `const_ref` fail with
/// [`Error::NotMutable`].
#[derive(Clone, Default)]
pub struct Value<'a>(pub(crate) Storage<'a>);

impl Default for Storage<'_> {
    fn default() -> Self {
        Storage::Null(SemanticTag::None)
    }
}

impl<'a> Value<'a> {
    pub fn null() -> Value<'a> {
        Value(Storage::Null(SemanticTag::None))
    }

    /// An object without members, it allocates on first insertion.
    pub fn empty_object() -> Value<'a> {
        Value(Storage::EmptyObject(KeyOrder::Sorted, SemanticTag::None))
    }

    pub fn object(order: KeyOrder) -> Value<'a> {
        Value(Storage::EmptyObject(order, SemanticTag::None))
    }

    pub fn array() -> Value<'a> {
        Value(Storage::Array(Vec::new(), SemanticTag::None))
    }

    pub fn array_with_capacity(capacity: usize) -> Value<'a> {
        Value(Storage::Array(
            Vec::with_capacity(capacity),
            SemanticTag::None,
        ))
    }

    pub fn string(s: &str, tag: SemanticTag) -> Value<'a> {
        Value(Storage::from_str(s, tag))
    }

    pub fn byte_string(bytes: impl Into<Vec<u8>>, tag: SemanticTag) -> Value<'a> {
        Value(Storage::ByteString(ByteString::new(bytes.into()), tag, 0))
    }

    /// A byte string carrying a format specific tag.
    pub fn byte_string_ext(bytes: impl Into<Vec<u8>>, ext_tag: u64) -> Value<'a> {
        Value(Storage::ByteString(
            ByteString::new(bytes.into()),
            SemanticTag::Ext,
            ext_tag,
        ))
    }

    /// A half precision float given by its raw bits.
    pub fn half(bits: u16) -> Value<'a> {
        Value(Storage::Half(bits, SemanticTag::None))
    }

    /// An integer beyond the primitive range, kept as decimal text.
    pub fn bigint(text: &str) -> Value<'a> {
        Value(Storage::from_str(text, SemanticTag::Bigint))
    }

    /// A decimal number kept as text to avoid rounding.
    pub fn bigdec(text: &str) -> Value<'a> {
        Value(Storage::from_str(text, SemanticTag::Bigdec))
    }

    /// Borrows `value` read-only instead of copying it.
    pub fn const_ref(value: &'a Value<'a>) -> Value<'a> {
        Value(Storage::ConstRef(value))
    }

    /// Borrows `value` mutably instead of copying it.
    pub fn mut_ref(value: &'a mut Value<'static>) -> Value<'a> {
        Value(Storage::Ref(value))
    }

    pub fn with_tag(mut self, tag: SemanticTag) -> Value<'a> {
        self.0.set_tag(tag);
        self
    }

    pub fn storage_kind(&self) -> StorageKind {
        self.0.kind()
    }

    pub fn tag(&self) -> SemanticTag {
        self.0.tag()
    }

    /// Sets the tag, a no-op through a read-only reference.
    pub fn set_tag(&mut self, tag: SemanticTag) {
        self.0.set_tag(tag);
    }

    /// The raw format tag of a byte string tagged [`SemanticTag::Ext`].
    pub fn ext_tag(&self) -> u64 {
        match &self.resolve().0 {
            Storage::ByteString(_, _, ext) => *ext,
            _ => 0,
        }
    }

    /// Follows back references to the value they point at.
    pub fn resolve(&self) -> &Value<'a> {
        match &self.0 {
            Storage::ConstRef(v) => v.resolve(),
            Storage::Ref(v) => v.resolve(),
            _ => self,
        }
    }

    /// The referent of a mutable back reference.
    pub fn referent_mut(&mut self) -> Option<&mut Value<'static>> {
        match &mut self.0 {
            Storage::Ref(v) => Some(&mut **v),
            _ => None,
        }
    }

    pub fn is_ref(&self) -> bool {
        matches!(self.0, Storage::ConstRef(_) | Storage::Ref(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self.resolve().0, Storage::Null(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.resolve().0, Storage::Bool(..))
    }

    pub fn is_number(&self) -> bool {
        self.resolve().storage_kind().is_number()
    }

    pub fn is_string(&self) -> bool {
        self.resolve().storage_kind().is_string()
    }

    pub fn is_byte_string(&self) -> bool {
        matches!(self.resolve().0, Storage::ByteString(..))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.resolve().0, Storage::Array(..))
    }

    pub fn is_object(&self) -> bool {
        self.resolve().storage_kind().is_object()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.resolve().0 {
            Storage::Bool(v, _) => Some(v),
            _ => None,
        }
    }

    /// The numeric payload of number storage.
    pub fn as_number(&self) -> Option<Number> {
        match self.resolve().0 {
            Storage::Int64(v, _) => Some(Number::Int64(v)),
            Storage::UInt64(v, _) => Some(Number::UInt64(v)),
            Storage::Half(v, _) => Some(Number::Float64(half_to_f64(v))),
            Storage::Double(v, _) => Some(Number::Float64(v)),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(|n| n.as_i64())
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_number().and_then(|n| n.as_u64())
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(|n| n.as_f64())
    }

    pub fn as_str(&self) -> Option<&str> {
        self.resolve().0.str()
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.resolve().0 {
            Storage::ByteString(b, ..) => Some(b.as_slice()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value<'a>]> {
        match &self.resolve().0 {
            Storage::Array(items, _) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value<'a>>> {
        match &mut self.0 {
            Storage::Array(items, _) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object<'a>> {
        match &self.resolve().0 {
            Storage::Object(obj, _) => Some(obj),
            Storage::EmptyObject(..) => Some(&EMPTY_OBJECT),
            _ => None,
        }
    }

    /// Mutable access to the members, an empty object is given storage.
    pub fn as_object_mut(&mut self) -> Option<&mut Object<'a>> {
        self.object_mut().ok()
    }

    pub fn is<T: JsonTypeTraits<'a>>(&self) -> bool {
        T::is(self)
    }

    /// Converts into `T`, failing with [`Error::InvalidCast`] when the
    /// stored value has no representation as `T`.
    pub fn as_type<T: JsonTypeTraits<'a>>(&self) -> Result<T> {
        T::as_type(self)
    }

    /// Number of elements or members, `0` for scalars.
    pub fn len(&self) -> usize {
        match &self.resolve().0 {
            Storage::Array(items, _) => items.len(),
            Storage::Object(obj, _) => obj.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.resolve().0 {
            Storage::ShortString(s, _) => s.is_empty(),
            Storage::LongString(s, _) => s.is_empty(),
            Storage::ByteString(b, ..) => b.is_empty(),
            Storage::Array(items, _) => items.is_empty(),
            Storage::Object(obj, _) => obj.is_empty(),
            Storage::EmptyObject(..) => true,
            _ => false,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.as_object().is_some_and(|obj| obj.contains_key(key))
    }

    pub fn get(&self, key: &str) -> Option<&Value<'a>> {
        self.as_object()?.get(key)
    }

    pub fn get_index(&self, index: usize) -> Option<&Value<'a>> {
        self.as_array()?.get(index)
    }

    /// Looks up a member, never inserting.
    pub fn at(&self, key: &str) -> Result<&Value<'a>> {
        match &self.resolve().0 {
            Storage::Object(obj, _) => obj
                .get(key)
                .ok_or_else(|| Error::KeyNotFound(key.to_string())),
            Storage::EmptyObject(..) => Err(Error::KeyNotFound(key.to_string())),
            _ => Err(Error::NotAnObject),
        }
    }

    pub fn at_index(&self, index: usize) -> Result<&Value<'a>> {
        match &self.resolve().0 {
            Storage::Array(items, _) => items.get(index).ok_or(Error::IndexOutOfRange {
                index,
                len: items.len(),
            }),
            _ => Err(Error::NotAnArray),
        }
    }

    /// Looks up a member for mutation, never inserting.
    ///
    /// A mutable back reference is reached through [`Value::referent_mut`].
    pub fn at_mut(&mut self, key: &str) -> Result<&mut Value<'a>> {
        match &mut self.0 {
            Storage::ConstRef(_) | Storage::Ref(_) => Err(Error::NotMutable),
            Storage::Object(obj, _) => obj
                .get_mut(key)
                .ok_or_else(|| Error::KeyNotFound(key.to_string())),
            Storage::EmptyObject(..) => Err(Error::KeyNotFound(key.to_string())),
            _ => Err(Error::NotAnObject),
        }
    }

    /// Like [`Value::at_mut`], a back reference fails with `NotMutable`.
    pub fn at_index_mut(&mut self, index: usize) -> Result<&mut Value<'a>> {
        match &mut self.0 {
            Storage::ConstRef(_) | Storage::Ref(_) => Err(Error::NotMutable),
            Storage::Array(items, _) => {
                let len = items.len();
                items
                    .get_mut(index)
                    .ok_or(Error::IndexOutOfRange { index, len })
            }
            _ => Err(Error::NotAnArray),
        }
    }

    /// Returns the member for `key`, inserting `null` when it is missing.
    ///
    /// Back references fail with `NotMutable`, a `Ref` is reached through
    /// [`Value::referent_mut`].
    pub fn at_or_insert(&mut self, key: &str) -> Result<&mut Value<'a>> {
        if self.is_ref() {
            return Err(Error::NotMutable);
        }
        Ok(self.object_mut()?.get_or_insert_null(key))
    }

    fn object_mut(&mut self) -> Result<&mut Object<'a>> {
        if let Storage::EmptyObject(order, tag) = self.0 {
            self.0 = Storage::Object(Object::new(order), tag);
        }
        match &mut self.0 {
            Storage::Object(obj, _) => Ok(obj),
            Storage::ConstRef(_) | Storage::Ref(_) => Err(Error::NotMutable),
            _ => Err(Error::NotAnObject),
        }
    }

    fn array_mut(&mut self) -> Result<&mut Vec<Value<'a>>> {
        match &mut self.0 {
            Storage::Array(items, _) => Ok(items),
            Storage::ConstRef(_) | Storage::Ref(_) => Err(Error::NotMutable),
            _ => Err(Error::NotAnArray),
        }
    }

    /// Inserts only when `key` is absent, returns `false` otherwise and
    /// leaves the existing member untouched.
    pub fn try_emplace(&mut self, key: &str, value: impl Into<Value<'a>>) -> Result<bool> {
        match &mut self.0 {
            Storage::ConstRef(_) => Err(Error::NotMutable),
            Storage::Ref(target) => target.try_emplace(key, value.into().into_owned()),
            _ => Ok(self.object_mut()?.try_emplace(key, value.into())),
        }
    }

    /// Inserts or overwrites, returns `true` when the key was inserted.
    pub fn insert_or_assign(&mut self, key: &str, value: impl Into<Value<'a>>) -> Result<bool> {
        match &mut self.0 {
            Storage::ConstRef(_) => Err(Error::NotMutable),
            Storage::Ref(target) => target.insert_or_assign(key, value.into().into_owned()),
            _ => Ok(self.object_mut()?.insert_or_assign(key, value.into())),
        }
    }

    pub fn push_back(&mut self, value: impl Into<Value<'a>>) -> Result<()> {
        match &mut self.0 {
            Storage::ConstRef(_) => Err(Error::NotMutable),
            Storage::Ref(target) => target.push_back(value.into().into_owned()),
            _ => {
                self.array_mut()?.push(value.into());
                Ok(())
            }
        }
    }

    /// Inserts `value` before position `pos`, `pos == len` appends.
    pub fn insert(&mut self, pos: usize, value: impl Into<Value<'a>>) -> Result<()> {
        match &mut self.0 {
            Storage::ConstRef(_) => Err(Error::NotMutable),
            Storage::Ref(target) => target.insert(pos, value.into().into_owned()),
            _ => {
                let items = self.array_mut()?;
                if pos > items.len() {
                    return Err(Error::IndexOutOfRange {
                        index: pos,
                        len: items.len(),
                    });
                }
                items.insert(pos, value.into());
                Ok(())
            }
        }
    }

    pub fn extend<I, V>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value<'a>>,
    {
        match &mut self.0 {
            Storage::ConstRef(_) => Err(Error::NotMutable),
            Storage::Ref(target) => {
                let items: Vec<Value<'static>> =
                    iter.into_iter().map(|v| v.into().into_owned()).collect();
                target.extend(items)
            }
            _ => {
                self.array_mut()?.extend(iter.into_iter().map(Into::into));
                Ok(())
            }
        }
    }

    /// Removes a member, returns `None` when the key is absent.
    pub fn erase(&mut self, key: &str) -> Result<Option<Value<'a>>> {
        match &mut self.0 {
            Storage::ConstRef(_) => Err(Error::NotMutable),
            Storage::Ref(target) => target.erase(key),
            Storage::Object(obj, _) => Ok(obj.erase(key)),
            Storage::EmptyObject(..) => Ok(None),
            _ => Err(Error::NotAnObject),
        }
    }

    pub fn erase_index(&mut self, index: usize) -> Result<Value<'a>> {
        match &mut self.0 {
            Storage::ConstRef(_) => Err(Error::NotMutable),
            Storage::Ref(target) => target.erase_index(index),
            Storage::Array(items, _) => {
                if index >= items.len() {
                    return Err(Error::IndexOutOfRange {
                        index,
                        len: items.len(),
                    });
                }
                Ok(items.remove(index))
            }
            _ => Err(Error::NotAnArray),
        }
    }

    pub fn erase_range<R: RangeBounds<usize>>(&mut self, range: R) -> Result<()> {
        match &mut self.0 {
            Storage::ConstRef(_) => Err(Error::NotMutable),
            Storage::Ref(target) => {
                target.erase_range((range.start_bound().cloned(), range.end_bound().cloned()))
            }
            Storage::Array(items, _) => {
                let len = items.len();
                let out_of_range = |index: usize| Error::IndexOutOfRange { index, len };
                let start = match range.start_bound() {
                    Bound::Included(s) => *s,
                    Bound::Excluded(s) => s.checked_add(1).ok_or_else(|| out_of_range(*s))?,
                    Bound::Unbounded => 0,
                };
                let end = match range.end_bound() {
                    Bound::Included(e) => e.checked_add(1).ok_or_else(|| out_of_range(*e))?,
                    Bound::Excluded(e) => *e,
                    Bound::Unbounded => len,
                };
                if start > end || end > len {
                    return Err(Error::IndexOutOfRange {
                        index: end.max(start),
                        len,
                    });
                }
                items.drain(start..end);
                Ok(())
            }
            _ => Err(Error::NotAnArray),
        }
    }

    /// Removes all elements or members.
    pub fn clear(&mut self) -> Result<()> {
        match &mut self.0 {
            Storage::ConstRef(_) => Err(Error::NotMutable),
            Storage::Ref(target) => target.clear(),
            Storage::Array(items, _) => {
                items.clear();
                Ok(())
            }
            Storage::Object(obj, _) => {
                obj.clear();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        match &mut self.0 {
            Storage::ConstRef(_) => Err(Error::NotMutable),
            Storage::Ref(target) => target.reserve(additional),
            Storage::Array(items, _) => {
                items.reserve(additional);
                Ok(())
            }
            Storage::EmptyObject(order, tag) => {
                let (order, tag) = (*order, *tag);
                self.0 = Storage::Object(Object::with_capacity(order, additional), tag);
                Ok(())
            }
            Storage::Object(obj, _) => {
                obj.reserve(additional);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn array_iter(&self) -> Result<std::slice::Iter<'_, Value<'a>>> {
        self.as_array()
            .map(|items| items.iter())
            .ok_or(Error::NotAnArray)
    }

    pub fn object_iter(&self) -> Result<std::slice::Iter<'_, KeyValue<'a>>> {
        self.as_object()
            .map(|obj| obj.iter())
            .ok_or(Error::NotAnObject)
    }

    pub fn keys(&self) -> Result<impl Iterator<Item = &str> + '_> {
        Ok(self.object_iter()?.map(|kv| kv.key()))
    }

    /// Moves the value out, leaving `null` behind.
    pub fn take(&mut self) -> Value<'a> {
        std::mem::take(self)
    }

    /// Detaches the value from every borrow, copying referents.
    pub fn into_owned(self) -> Value<'static> {
        let storage = match self.0 {
            Storage::Null(tag) => Storage::Null(tag),
            Storage::Bool(v, tag) => Storage::Bool(v, tag),
            Storage::Int64(v, tag) => Storage::Int64(v, tag),
            Storage::UInt64(v, tag) => Storage::UInt64(v, tag),
            Storage::Half(v, tag) => Storage::Half(v, tag),
            Storage::Double(v, tag) => Storage::Double(v, tag),
            Storage::ShortString(v, tag) => Storage::ShortString(v, tag),
            Storage::LongString(v, tag) => Storage::LongString(v, tag),
            Storage::ByteString(v, tag, ext) => Storage::ByteString(v, tag, ext),
            Storage::EmptyObject(order, tag) => Storage::EmptyObject(order, tag),
            Storage::Array(items, tag) => {
                Storage::Array(items.into_iter().map(Value::into_owned).collect(), tag)
            }
            Storage::Object(obj, tag) => Storage::Object(obj.into_owned(), tag),
            Storage::ConstRef(v) => return v.clone().into_owned(),
            Storage::Ref(v) => return v.clone(),
        };
        Value(storage)
    }

    /// Generates a random value, nested at most two levels deep.
    pub fn rand_value() -> Value<'static> {
        let mut rng = rng();
        match rng.random_range(0..=2) {
            0 => {
                let len = rng.random_range(0..=5);
                let mut values = Vec::with_capacity(len);
                for _ in 0..len {
                    values.push(Self::rand_scalar_value());
                }
                Value::from(values)
            }
            1 => {
                let len = rng.random_range(0..=5);
                let order = if rng.random_bool(0.5) {
                    KeyOrder::Sorted
                } else {
                    KeyOrder::Preserved
                };
                let mut obj = Value::object(order);
                for _ in 0..len {
                    let k = Alphanumeric.sample_string(&mut rng, 5);
                    let _ = obj.insert_or_assign(&k, Self::rand_scalar_value());
                }
                obj
            }
            _ => Self::rand_scalar_value(),
        }
    }

    fn rand_scalar_value() -> Value<'static> {
        let mut rng = rng();
        match rng.random_range(0..=5) {
            0 => Value::from(rng.random_bool(0.5)),
            1 => {
                let len = if rng.random_bool(0.8) { 5 } else { 40 };
                Value::from(Alphanumeric.sample_string(&mut rng, len))
            }
            2 => match rng.random_range(0..=15) {
                0..=5 => Value::from(rng.random_range(0..=100000u64)),
                6..=10 => Value::from(rng.random_range(-100000..=100000i64)),
                _ => Value::from(rng.random_range(-4000.0..1.3e5f64)),
            },
            3 => {
                let len = rng.random_range(0..=8);
                let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
                Value::byte_string(bytes, SemanticTag::None)
            }
            4 => Value::from(rng.random_range(0..=i64::MAX)).with_tag(SemanticTag::EpochSecond),
            _ => Value::null(),
        }
    }
}

impl<'a> Index<&str> for Value<'a> {
    type Output = Value<'a>;

    /// Lookup only, a missing key yields `null`.
    fn index(&self, key: &str) -> &Value<'a> {
        self.get(key).unwrap_or(&NULL)
    }
}

impl<'a> IndexMut<&str> for Value<'a> {
    /// Inserts `null` for a missing key.
    ///
    /// # Panics
    ///
    /// Panics when the value is not an object or is a back reference. Index
    /// the referent of a `Ref` through [`Value::referent_mut`] instead.
    fn index_mut(&mut self, key: &str) -> &mut Value<'a> {
        match self.at_or_insert(key) {
            Ok(v) => v,
            Err(e) => panic!("cannot index value with {key:?}: {e}"),
        }
    }
}

impl<'a> Index<usize> for Value<'a> {
    type Output = Value<'a>;

    fn index(&self, index: usize) -> &Value<'a> {
        self.get_index(index).unwrap_or(&NULL)
    }
}

impl<'a> IndexMut<usize> for Value<'a> {
    /// # Panics
    ///
    /// Panics when the value is not an array or the index is out of range.
    /// Back references panic as well.
    fn index_mut(&mut self, index: usize) -> &mut Value<'a> {
        match self.at_index_mut(index) {
            Ok(v) => v,
            Err(e) => panic!("cannot index value with {index}: {e}"),
        }
    }
}

/// Only the numeric tags take part in comparing strings, a bigint is never
/// equal to the plain string with the same digits.
fn string_class(tag: SemanticTag) -> SemanticTag {
    if tag.is_number_tag() {
        tag
    } else {
        SemanticTag::None
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value<'_> {}

impl PartialOrd for Value<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value<'_> {
    /// Orders values by kind first: null, bool, number, string, byte
    /// string, array, object. Values of the same kind compare by content,
    /// numbers across their storage kinds.
    fn cmp(&self, other: &Self) -> Ordering {
        let (left, right) = (self.resolve(), other.resolve());
        let left_rank = left.storage_kind().rank();
        let right_rank = right.storage_kind().rank();
        if left_rank != right_rank {
            return left_rank.cmp(&right_rank);
        }
        match (&left.0, &right.0) {
            (Storage::Null(_), Storage::Null(_)) => Ordering::Equal,
            (Storage::Bool(l, _), Storage::Bool(r, _)) => l.cmp(r),
            (Storage::ByteString(l, ..), Storage::ByteString(r, ..)) => l.cmp(r),
            (Storage::Array(l, _), Storage::Array(r, _)) => {
                for (v1, v2) in l.iter().zip(r.iter()) {
                    let ord = v1.cmp(v2);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                l.len().cmp(&r.len())
            }
            _ => {
                if let (Some(l), Some(r)) = (left.as_number(), right.as_number()) {
                    return l.cmp(&r);
                }
                if let (Some(l), Some(r)) = (left.as_str(), right.as_str()) {
                    return l
                        .cmp(r)
                        .then(string_class(left.tag()).cmp(&string_class(right.tag())));
                }
                match (left.as_object(), right.as_object()) {
                    (Some(l), Some(r)) => l.cmp(r),
                    _ => Ordering::Equal,
                }
            }
        }
    }
}

impl Debug for Value<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match &self.0 {
            Storage::Null(_) => f.debug_tuple("Null").finish(),
            Storage::Bool(v, _) => f.debug_tuple("Bool").field(v).finish(),
            Storage::Int64(v, _) => f.debug_tuple("Int64").field(v).finish(),
            Storage::UInt64(v, _) => f.debug_tuple("UInt64").field(v).finish(),
            Storage::Half(v, _) => f.debug_tuple("Half").field(&half_to_f64(*v)).finish(),
            Storage::Double(v, _) => f.debug_tuple("Double").field(v).finish(),
            Storage::ShortString(v, _) => f.debug_tuple("String").field(&v.as_str()).finish(),
            Storage::LongString(v, _) => f.debug_tuple("String").field(v).finish(),
            Storage::ByteString(v, ..) => f.debug_tuple("ByteString").field(v).finish(),
            Storage::EmptyObject(..) => f.write_str("Object({})"),
            Storage::Array(v, _) => {
                f.write_str("Array(")?;
                Debug::fmt(v, f)?;
                f.write_str(")")
            }
            Storage::Object(v, _) => {
                f.write_str("Object(")?;
                Debug::fmt(v, f)?;
                f.write_str(")")
            }
            Storage::ConstRef(v) => f.debug_tuple("ConstRef").field(v).finish(),
            Storage::Ref(v) => f.debug_tuple("Ref").field(v).finish(),
        }?;
        match self.0 {
            Storage::ConstRef(_) | Storage::Ref(_) => Ok(()),
            _ if self.tag() == SemanticTag::None => Ok(()),
            _ => write!(f, "<{}>", self.tag()),
        }
    }
}

impl Display for Value<'_> {
    /// Writes compact JSON text.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = crate::json::to_string(self).map_err(|_| std::fmt::Error)?;
        f.write_str(&text)
    }
}

impl Value<'_> {
    /// Indented JSON text.
    pub fn to_pretty_string(&self) -> String {
        crate::json::to_pretty_string(self).unwrap_or_else(|_| "null".to_string())
    }
}
