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

use std::borrow::Cow;
use std::fmt;

use super::parser::additional_info;
use super::parser::major_type;
use super::parser::skip_item;
use super::parser::Parser;
use super::CborReadOptions;
use crate::byte_string::ByteString;
use crate::constants::*;
use crate::decoder::ValueDecoder;
use crate::error::Error;
use crate::error::Result;
use crate::number::half_to_f64;
use crate::number::IntegerLiteral;
use crate::number::Number;
use crate::storage::SHORT_STRING_CAPACITY;
use crate::tag::SemanticTag;
use crate::tag::StorageKind;
use crate::value::Value;
use crate::visitor::SerContext;
use crate::visitor::VisitFlow;
use crate::visitor::Visitor;

// Sub-items were validated when the view was created.
const RESCAN_DEPTH: usize = usize::MAX;

/// A read-only value over one CBOR data item in an external buffer.
///
/// It does not own the underlying bytes and navigation never allocates:
/// every lookup scans the encoded item again. Strings and byte strings are
/// materialized with a single allocation, definite text strings can be
/// borrowed with [`CborView::as_str`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CborView<'a> {
    data: &'a [u8],
}

/// What the first event of an item says about it.
#[derive(Default)]
struct Head {
    kind: Option<StorageKind>,
    tag: SemanticTag,
    ext_tag: u64,
    number: Option<Number>,
    boolean: Option<bool>,
}

impl Head {
    fn record(&mut self, kind: StorageKind, tag: SemanticTag) -> Result<VisitFlow> {
        self.kind = Some(kind);
        self.tag = tag;
        Ok(VisitFlow::Stop)
    }
}

impl Visitor for Head {
    fn visit_begin_object(
        &mut self,
        _size_hint: Option<usize>,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.record(StorageKind::Object, tag)
    }

    fn visit_end_object(&mut self, _ctx: &SerContext) -> Result<VisitFlow> {
        Ok(VisitFlow::Stop)
    }

    fn visit_begin_array(
        &mut self,
        _size_hint: Option<usize>,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.record(StorageKind::Array, tag)
    }

    fn visit_end_array(&mut self, _ctx: &SerContext) -> Result<VisitFlow> {
        Ok(VisitFlow::Stop)
    }

    fn visit_key(&mut self, _key: &str, _ctx: &SerContext) -> Result<VisitFlow> {
        Ok(VisitFlow::Stop)
    }

    fn visit_null(&mut self, tag: SemanticTag, _ctx: &SerContext) -> Result<VisitFlow> {
        self.record(StorageKind::Null, tag)
    }

    fn visit_bool(&mut self, value: bool, tag: SemanticTag, _ctx: &SerContext) -> Result<VisitFlow> {
        self.boolean = Some(value);
        self.record(StorageKind::Boolean, tag)
    }

    fn visit_string(
        &mut self,
        value: &str,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        let kind = if value.len() <= SHORT_STRING_CAPACITY {
            StorageKind::ShortString
        } else {
            StorageKind::LongString
        };
        self.record(kind, tag)
    }

    fn visit_byte_string(
        &mut self,
        _value: &[u8],
        tag: SemanticTag,
        ext_tag: u64,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.ext_tag = ext_tag;
        self.record(StorageKind::ByteString, tag)
    }

    fn visit_int64(&mut self, value: i64, tag: SemanticTag, _ctx: &SerContext) -> Result<VisitFlow> {
        self.number = Some(Number::Int64(value));
        self.record(StorageKind::Int64, tag)
    }

    fn visit_uint64(
        &mut self,
        value: u64,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.number = Some(Number::UInt64(value));
        self.record(StorageKind::UInt64, tag)
    }

    fn visit_half(&mut self, value: u16, tag: SemanticTag, _ctx: &SerContext) -> Result<VisitFlow> {
        self.number = Some(Number::Float64(half_to_f64(value)));
        self.record(StorageKind::HalfFloat, tag)
    }

    fn visit_double(
        &mut self,
        value: f64,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.number = Some(Number::Float64(value));
        self.record(StorageKind::Double, tag)
    }
}

impl<'a> CborView<'a> {
    /// Binds to the first data item of `data`.
    ///
    /// The item is validated and the view trimmed to its extent, bytes
    /// after it are ignored.
    pub fn new(data: &'a [u8]) -> Result<CborView<'a>> {
        Self::with_options(data, &CborReadOptions::default())
    }

    pub fn with_options(data: &'a [u8], options: &CborReadOptions) -> Result<CborView<'a>> {
        if options.get_max_nesting_depth() == 0 {
            return Err(Error::InvalidOptions("max_nesting_depth must be positive"));
        }
        let mut parser = Parser::new(data, options.get_max_nesting_depth());
        skip_item(&mut parser)?;
        Ok(Self {
            data: parser.consumed_since(0),
        })
    }

    /// The encoded item.
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }

    fn head(&self) -> Head {
        let mut head = Head::default();
        // a failure leaves the head empty, it cannot happen on validated bytes
        let _ = Parser::new(self.data, RESCAN_DEPTH).parse(&mut head);
        head
    }

    /// The initial byte after any tags, with the innermost tag number and a
    /// parser positioned after the initial byte.
    fn content(&self) -> Result<(u8, Option<u64>, Parser<'a>)> {
        let mut parser = Parser::new(self.data, RESCAN_DEPTH);
        let mut tag = None;
        loop {
            let initial = parser.read_u8()?;
            if major_type(initial) != MAJOR_TAG {
                return Ok((initial, tag, parser));
            }
            tag = Some(parser.read_argument(initial)?);
        }
    }

    pub fn storage_kind(&self) -> StorageKind {
        match self.head().kind {
            Some(StorageKind::Object) if self.container_len(MAJOR_MAP) == Some(0) => {
                StorageKind::EmptyObject
            }
            Some(kind) => kind,
            None => StorageKind::Null,
        }
    }

    pub fn tag(&self) -> SemanticTag {
        self.head().tag
    }

    pub fn ext_tag(&self) -> u64 {
        self.head().ext_tag
    }

    pub fn is_null(&self) -> bool {
        self.storage_kind() == StorageKind::Null
    }

    pub fn is_bool(&self) -> bool {
        self.storage_kind() == StorageKind::Boolean
    }

    pub fn is_number(&self) -> bool {
        self.head().number.is_some()
    }

    pub fn is_string(&self) -> bool {
        matches!(
            self.storage_kind(),
            StorageKind::ShortString | StorageKind::LongString
        )
    }

    pub fn is_byte_string(&self) -> bool {
        self.storage_kind() == StorageKind::ByteString
    }

    pub fn is_array(&self) -> bool {
        self.storage_kind() == StorageKind::Array
    }

    pub fn is_object(&self) -> bool {
        self.storage_kind().is_object()
    }

    /// Number of items of a map or array encoded as such, `None` for other
    /// items or on a mismatch.
    fn container_len(&self, major: u8) -> Option<usize> {
        let (initial, _, mut parser) = self.content().ok()?;
        if major_type(initial) != major {
            return None;
        }
        if let Some(len) = parser.read_length(initial).ok()? {
            return usize::try_from(len).ok();
        }
        let per_entry = if major == MAJOR_MAP { 2 } else { 1 };
        let mut count = 0;
        while !parser.at_break().ok()? {
            for _ in 0..per_entry {
                skip_item(&mut parser).ok()?;
            }
            count += 1;
        }
        Some(count)
    }

    /// Number of elements or members, `0` for scalars.
    pub fn len(&self) -> usize {
        match self.storage_kind() {
            StorageKind::Object => self.container_len(MAJOR_MAP).unwrap_or_default(),
            StorageKind::Array => match self.container_len(MAJOR_ARRAY) {
                Some(len) => len,
                // typed arrays decode to arrays
                None => self.to_value().map(|v| v.len()).unwrap_or_default(),
            },
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self.storage_kind() {
            StorageKind::EmptyObject => true,
            StorageKind::Array | StorageKind::Object => self.len() == 0,
            StorageKind::ShortString | StorageKind::LongString | StorageKind::ByteString => self
                .to_value()
                .map(|v| v.is_empty())
                .unwrap_or_default(),
            _ => false,
        }
    }

    /// The elements of an encoded array. Typed arrays have no element
    /// items to point at and fail with `NotAnArray`.
    pub fn array_range(&self) -> Result<ArrayRange<'a>> {
        let (initial, _, _) = self.content()?;
        if major_type(initial) != MAJOR_ARRAY || self.head().kind != Some(StorageKind::Array) {
            return Err(Error::NotAnArray);
        }
        Ok(ArrayRange { view: *self })
    }

    pub fn object_range(&self) -> Result<ObjectRange<'a>> {
        let (initial, _, _) = self.content()?;
        if major_type(initial) != MAJOR_MAP {
            return Err(Error::NotAnObject);
        }
        Ok(ObjectRange { view: *self })
    }

    pub fn at(&self, key: &str) -> Result<CborView<'a>> {
        self.object_range()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    pub fn at_index(&self, index: usize) -> Result<CborView<'a>> {
        let range = self.array_range()?;
        range.iter().nth(index).ok_or_else(|| Error::IndexOutOfRange {
            index,
            len: range.iter().count(),
        })
    }

    pub fn get(&self, key: &str) -> Option<CborView<'a>> {
        self.at(key).ok()
    }

    pub fn get_index(&self, index: usize) -> Option<CborView<'a>> {
        self.at_index(index).ok()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.head().boolean
    }

    pub fn as_number(&self) -> Option<Number> {
        self.head().number
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

    /// Borrows a definite length text string.
    pub fn as_str(&self) -> Option<&'a str> {
        let (initial, _, mut parser) = self.content().ok()?;
        if major_type(initial) != MAJOR_TEXT || additional_info(initial) == INFO_INDEFINITE {
            return None;
        }
        let len = parser.read_argument(initial).ok()?;
        std::str::from_utf8(parser.read_slice(len).ok()?).ok()
    }

    /// Borrows a definite length byte string that decodes as bytes.
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        let (initial, _, mut parser) = self.content().ok()?;
        if major_type(initial) != MAJOR_BYTES
            || additional_info(initial) == INFO_INDEFINITE
            || self.head().kind != Some(StorageKind::ByteString)
        {
            return None;
        }
        let len = parser.read_argument(initial).ok()?;
        parser.read_slice(len).ok()
    }

    /// Calls `f` with every chunk of a text or byte string of the given
    /// major type, `false` when the item is something else.
    fn for_each_chunk<F: FnMut(&'a [u8])>(&self, major: u8, mut f: F) -> bool {
        let Ok((initial, tag, mut parser)) = self.content() else {
            return false;
        };
        let special = matches!(
            tag,
            Some(TAG_POSITIVE_BIGNUM | TAG_NEGATIVE_BIGNUM | TAG_TYPED_ARRAY_FIRST..=TAG_TYPED_ARRAY_LAST)
        );
        if major_type(initial) != major || special {
            return false;
        }
        if additional_info(initial) != INFO_INDEFINITE {
            match parser
                .read_argument(initial)
                .and_then(|len| parser.read_slice(len))
            {
                Ok(chunk) => f(chunk),
                Err(_) => return false,
            }
            return true;
        }
        loop {
            let chunk = match parser.read_u8() {
                Ok(CBOR_BREAK) => return true,
                Ok(chunk) => chunk,
                Err(_) => return false,
            };
            match parser
                .read_argument(chunk)
                .and_then(|len| parser.read_slice(len))
            {
                Ok(chunk) => f(chunk),
                Err(_) => return false,
            }
        }
    }

    pub fn as_type<T: FromView<'a>>(&self) -> Result<T> {
        T::from_view(self)
    }

    /// Drives `visitor` with the events of the item and flushes it, also
    /// when it stopped early.
    pub fn dump<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<()> {
        self.dump_partial(visitor)?;
        visitor.flush()
    }

    pub fn dump_partial<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<VisitFlow> {
        Parser::new(self.data, RESCAN_DEPTH).parse(visitor)
    }

    /// Materializes the item.
    pub fn to_value(&self) -> Result<Value<'static>> {
        let mut decoder = ValueDecoder::new();
        self.dump(&mut decoder)?;
        decoder.get_result()
    }
}

impl fmt::Debug for CborView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_value() {
            Ok(value) => write!(f, "CborView({})", value),
            Err(_) => write!(f, "CborView({:02x?})", self.data),
        }
    }
}

/// The elements of an array view, scanned again by every [`ArrayRange::iter`].
#[derive(Debug, Clone, Copy)]
pub struct ArrayRange<'a> {
    view: CborView<'a>,
}

impl<'a> ArrayRange<'a> {
    pub fn iter(&self) -> ArrayIter<'a> {
        let mut iter = ArrayIter {
            parser: Parser::new(self.view.data, RESCAN_DEPTH),
            remaining: Some(0),
        };
        if let Ok((initial, _, mut parser)) = self.view.content() {
            if let Ok(len) = parser.read_length(initial) {
                iter.parser = parser;
                iter.remaining = len;
            }
        }
        iter
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl<'a> IntoIterator for ArrayRange<'a> {
    type Item = CborView<'a>;
    type IntoIter = ArrayIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &ArrayRange<'a> {
    type Item = CborView<'a>;
    type IntoIter = ArrayIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct ArrayIter<'a> {
    parser: Parser<'a>,
    // `None` for an indefinite length array
    remaining: Option<u64>,
}

impl<'a> Iterator for ArrayIter<'a> {
    type Item = CborView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if !next_entry(&mut self.parser, &mut self.remaining) {
            return None;
        }
        next_view(&mut self.parser, &mut self.remaining)
    }
}

/// The members of a map view, scanned again by every [`ObjectRange::iter`].
#[derive(Debug, Clone, Copy)]
pub struct ObjectRange<'a> {
    view: CborView<'a>,
}

impl<'a> ObjectRange<'a> {
    pub fn iter(&self) -> ObjectIter<'a> {
        let mut iter = ObjectIter {
            parser: Parser::new(self.view.data, RESCAN_DEPTH),
            remaining: Some(0),
        };
        if let Ok((initial, _, mut parser)) = self.view.content() {
            if let Ok(len) = parser.read_length(initial) {
                iter.parser = parser;
                iter.remaining = len;
            }
        }
        iter
    }

    pub fn keys(&self) -> impl Iterator<Item = Cow<'a, str>> {
        self.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl<'a> IntoIterator for ObjectRange<'a> {
    type Item = (Cow<'a, str>, CborView<'a>);
    type IntoIter = ObjectIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &ObjectRange<'a> {
    type Item = (Cow<'a, str>, CborView<'a>);
    type IntoIter = ObjectIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct ObjectIter<'a> {
    parser: Parser<'a>,
    remaining: Option<u64>,
}

impl<'a> Iterator for ObjectIter<'a> {
    type Item = (Cow<'a, str>, CborView<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        if !next_entry(&mut self.parser, &mut self.remaining) {
            return None;
        }
        let key = match self.parser.read_key() {
            Ok(key) => key,
            Err(_) => {
                self.remaining = Some(0);
                return None;
            }
        };
        let value = next_view(&mut self.parser, &mut self.remaining)?;
        Some((key, value))
    }
}

/// Whether another entry follows, consuming the break of an indefinite
/// container.
fn next_entry(parser: &mut Parser<'_>, remaining: &mut Option<u64>) -> bool {
    match remaining {
        Some(0) => false,
        Some(n) => {
            *n -= 1;
            true
        }
        None => match parser.at_break() {
            Ok(false) => true,
            _ => {
                *remaining = Some(0);
                false
            }
        },
    }
}

fn next_view<'a>(parser: &mut Parser<'a>, remaining: &mut Option<u64>) -> Option<CborView<'a>> {
    let start = parser.position();
    if skip_item(parser).is_err() {
        // ends the iteration
        *remaining = Some(0);
        return None;
    }
    Some(CborView {
        data: parser.consumed_since(start),
    })
}

/// Conversion of a [`CborView`] into a Rust type.
pub trait FromView<'a>: Sized {
    fn from_view(view: &CborView<'a>) -> Result<Self>;
}

fn invalid_cast(view: &CborView<'_>, target: &str) -> Error {
    Error::InvalidCast(format!(
        "cannot convert {} to {}",
        view.storage_kind(),
        target
    ))
}

impl<'a> FromView<'a> for bool {
    fn from_view(view: &CborView<'a>) -> Result<Self> {
        view.as_bool().ok_or_else(|| invalid_cast(view, "bool"))
    }
}

macro_rules! impl_integer_from_view {
    ($($t:ty),*) => {
        $(
            impl<'a> FromView<'a> for $t {
                /// Numbers decode directly, anything else goes through the
                /// materialized value.
                fn from_view(view: &CborView<'a>) -> Result<Self> {
                    match view.as_number() {
                        Some(n) => n
                            .as_i128()
                            .and_then(|v| {
                                IntegerLiteral {
                                    negative: v < 0,
                                    magnitude: v.unsigned_abs(),
                                }
                                .cast::<$t>()
                            })
                            .ok_or_else(|| invalid_cast(view, stringify!($t))),
                        None => view.to_value()?.as_type::<$t>(),
                    }
                }
            }
        )*
    };
}

impl_integer_from_view!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl<'a> FromView<'a> for f64 {
    fn from_view(view: &CborView<'a>) -> Result<Self> {
        match view.as_f64() {
            Some(v) => Ok(v),
            None => view.to_value()?.as_type::<f64>(),
        }
    }
}

impl<'a> FromView<'a> for &'a str {
    fn from_view(view: &CborView<'a>) -> Result<Self> {
        view.as_str().ok_or_else(|| invalid_cast(view, "borrowed string"))
    }
}

impl<'a> FromView<'a> for String {
    /// Text is copied with one allocation sized from its chunks.
    fn from_view(view: &CborView<'a>) -> Result<Self> {
        let mut len = 0;
        if !view.for_each_chunk(MAJOR_TEXT, |chunk| len += chunk.len()) {
            return view.to_value()?.as_type::<String>();
        }
        let mut s = String::with_capacity(len);
        let mut valid = true;
        view.for_each_chunk(MAJOR_TEXT, |chunk| match std::str::from_utf8(chunk) {
            Ok(text) => s.push_str(text),
            Err(_) => valid = false,
        });
        if !valid {
            return Err(Error::InvalidUtf8);
        }
        Ok(s)
    }
}

impl<'a> FromView<'a> for ByteString {
    fn from_view(view: &CborView<'a>) -> Result<Self> {
        let mut len = 0;
        if view.head().kind == Some(StorageKind::ByteString)
            && view.for_each_chunk(MAJOR_BYTES, |chunk| len += chunk.len())
        {
            let mut data = Vec::with_capacity(len);
            view.for_each_chunk(MAJOR_BYTES, |chunk| data.extend_from_slice(chunk));
            return Ok(ByteString::from(data));
        }
        view.to_value()?.as_type::<ByteString>()
    }
}

impl<'a> FromView<'a> for Value<'static> {
    fn from_view(view: &CborView<'a>) -> Result<Self> {
        view.to_value()
    }
}
