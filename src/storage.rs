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

use std::fmt::Debug;
use std::fmt::Formatter;

use crate::byte_string::ByteString;
use crate::object::KeyOrder;
use crate::object::Object;
use crate::tag::SemanticTag;
use crate::tag::StorageKind;
use crate::value::Value;

/// Strings up to this many bytes are stored inline.
pub const SHORT_STRING_CAPACITY: usize = 22;

/// An inline string that never allocates.
///
/// `buf[..len]` always holds valid UTF-8 because it can only be built
/// from a `&str`.
#[derive(Clone, Copy)]
pub struct ShortString {
    len: u8,
    buf: [u8; SHORT_STRING_CAPACITY],
}

impl ShortString {
    /// Returns `None` when `s` does not fit inline.
    pub fn new(s: &str) -> Option<ShortString> {
        let len = s.len();
        if len > SHORT_STRING_CAPACITY {
            return None;
        }
        let mut buf = [0u8; SHORT_STRING_CAPACITY];
        buf[..len].copy_from_slice(s.as_bytes());
        Some(ShortString {
            len: len as u8,
            buf,
        })
    }

    pub fn as_str(&self) -> &str {
        let data = &self.buf[..self.len as usize];
        unsafe { std::str::from_utf8_unchecked(data) }
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Debug for ShortString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self.as_str(), f)
    }
}

/// The tagged union behind every [`Value`].
///
/// Exactly one arm is active. Scalar arms and short strings are stored
/// inline, strings longer than [`SHORT_STRING_CAPACITY`], byte strings,
/// arrays and objects own heap memory that is released when the arm is
/// replaced or dropped.
pub(crate) enum Storage<'a> {
    Null(SemanticTag),
    Bool(bool, SemanticTag),
    Int64(i64, SemanticTag),
    UInt64(u64, SemanticTag),
    Half(u16, SemanticTag),
    Double(f64, SemanticTag),
    ShortString(ShortString, SemanticTag),
    LongString(Box<str>, SemanticTag),
    ByteString(ByteString, SemanticTag, u64),
    EmptyObject(KeyOrder, SemanticTag),
    Array(Vec<Value<'a>>, SemanticTag),
    Object(Object<'a>, SemanticTag),
    ConstRef(&'a Value<'a>),
    Ref(&'a mut Value<'static>),
}

impl<'a> Storage<'a> {
    pub(crate) fn from_str(s: &str, tag: SemanticTag) -> Storage<'a> {
        match ShortString::new(s) {
            Some(short) => Storage::ShortString(short, tag),
            None => Storage::LongString(Box::from(s), tag),
        }
    }

    pub(crate) fn from_string(s: String, tag: SemanticTag) -> Storage<'a> {
        match ShortString::new(&s) {
            Some(short) => Storage::ShortString(short, tag),
            None => Storage::LongString(s.into_boxed_str(), tag),
        }
    }

    pub(crate) fn kind(&self) -> StorageKind {
        match self {
            Storage::Null(_) => StorageKind::Null,
            Storage::Bool(..) => StorageKind::Boolean,
            Storage::Int64(..) => StorageKind::Int64,
            Storage::UInt64(..) => StorageKind::UInt64,
            Storage::Half(..) => StorageKind::HalfFloat,
            Storage::Double(..) => StorageKind::Double,
            Storage::ShortString(..) => StorageKind::ShortString,
            Storage::LongString(..) => StorageKind::LongString,
            Storage::ByteString(..) => StorageKind::ByteString,
            Storage::EmptyObject(..) => StorageKind::EmptyObject,
            Storage::Array(..) => StorageKind::Array,
            Storage::Object(..) => StorageKind::Object,
            Storage::ConstRef(_) => StorageKind::ConstRef,
            Storage::Ref(_) => StorageKind::Ref,
        }
    }

    pub(crate) fn tag(&self) -> SemanticTag {
        match self {
            Storage::Null(tag)
            | Storage::Bool(_, tag)
            | Storage::Int64(_, tag)
            | Storage::UInt64(_, tag)
            | Storage::Half(_, tag)
            | Storage::Double(_, tag)
            | Storage::ShortString(_, tag)
            | Storage::LongString(_, tag)
            | Storage::ByteString(_, tag, _)
            | Storage::EmptyObject(_, tag)
            | Storage::Array(_, tag)
            | Storage::Object(_, tag) => *tag,
            Storage::ConstRef(v) => v.tag(),
            Storage::Ref(v) => v.tag(),
        }
    }

    pub(crate) fn set_tag(&mut self, new_tag: SemanticTag) {
        match self {
            Storage::Null(tag)
            | Storage::Bool(_, tag)
            | Storage::Int64(_, tag)
            | Storage::UInt64(_, tag)
            | Storage::Half(_, tag)
            | Storage::Double(_, tag)
            | Storage::ShortString(_, tag)
            | Storage::LongString(_, tag)
            | Storage::ByteString(_, tag, _)
            | Storage::EmptyObject(_, tag)
            | Storage::Array(_, tag)
            | Storage::Object(_, tag) => *tag = new_tag,
            Storage::ConstRef(_) => {}
            Storage::Ref(v) => v.set_tag(new_tag),
        }
    }

    pub(crate) fn str(&self) -> Option<&str> {
        match self {
            Storage::ShortString(s, _) => Some(s.as_str()),
            Storage::LongString(s, _) => Some(s),
            _ => None,
        }
    }
}

impl Clone for Storage<'_> {
    fn clone(&self) -> Self {
        match self {
            Storage::Null(tag) => Storage::Null(*tag),
            Storage::Bool(v, tag) => Storage::Bool(*v, *tag),
            Storage::Int64(v, tag) => Storage::Int64(*v, *tag),
            Storage::UInt64(v, tag) => Storage::UInt64(*v, *tag),
            Storage::Half(v, tag) => Storage::Half(*v, *tag),
            Storage::Double(v, tag) => Storage::Double(*v, *tag),
            Storage::ShortString(v, tag) => Storage::ShortString(*v, *tag),
            Storage::LongString(v, tag) => Storage::LongString(v.clone(), *tag),
            Storage::ByteString(v, tag, ext) => Storage::ByteString(v.clone(), *tag, *ext),
            Storage::EmptyObject(order, tag) => Storage::EmptyObject(*order, *tag),
            Storage::Array(v, tag) => Storage::Array(v.clone(), *tag),
            Storage::Object(v, tag) => Storage::Object(v.clone(), *tag),
            Storage::ConstRef(v) => Storage::ConstRef(*v),
            // a unique borrow cannot be duplicated, the copy owns its data
            Storage::Ref(v) => (**v).clone().0,
        }
    }
}
