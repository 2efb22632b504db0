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

use byteorder::BigEndian;
use byteorder::ByteOrder;
use byteorder::LittleEndian;

use crate::constants::*;
use crate::error::Error;
use crate::error::ParseErrorCode;
use crate::error::Result;
use crate::number::bignum_to_decimal;
use crate::number::format_decimal;
use crate::tag::SemanticTag;
use crate::visitor::try_visit;
use crate::visitor::SerContext;
use crate::visitor::TypedArray;
use crate::visitor::VisitFlow;
use crate::visitor::Visitor;

#[inline]
pub(crate) fn major_type(initial: u8) -> u8 {
    initial >> 5
}

#[inline]
pub(crate) fn additional_info(initial: u8) -> u8 {
    initial & 0x1f
}

/// Reads one RFC 8949 data item and drives a [`Visitor`] with its events.
///
/// Every structural error is reported as [`Error::InvalidCbor`] with the
/// byte offset where it was detected.
pub(crate) struct Parser<'a> {
    buf: &'a [u8],
    idx: usize,
    depth: usize,
    max_nesting_depth: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(buf: &'a [u8], max_nesting_depth: usize) -> Parser<'a> {
        Self {
            buf,
            idx: 0,
            depth: 0,
            max_nesting_depth,
        }
    }

    pub(crate) fn at(buf: &'a [u8], idx: usize, max_nesting_depth: usize) -> Parser<'a> {
        Self {
            buf,
            idx,
            depth: 0,
            max_nesting_depth,
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.idx
    }

    /// The bytes consumed since `start`.
    pub(crate) fn consumed_since(&self, start: usize) -> &'a [u8] {
        self.buf.get(start..self.idx).unwrap_or_default()
    }

    pub(crate) fn is_end(&self) -> bool {
        self.idx >= self.buf.len()
    }

    pub(crate) fn error(&self, code: ParseErrorCode) -> Error {
        Error::InvalidCbor(code, self.idx)
    }

    #[inline]
    pub(crate) fn peek(&self) -> Result<u8> {
        self.buf
            .get(self.idx)
            .copied()
            .ok_or_else(|| self.error(ParseErrorCode::InvalidEOF))
    }

    #[inline]
    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        let b = self.peek()?;
        self.idx += 1;
        Ok(b)
    }

    pub(crate) fn read_slice(&mut self, len: u64) -> Result<&'a [u8]> {
        let end = usize::try_from(len)
            .ok()
            .and_then(|len| self.idx.checked_add(len))
            .ok_or_else(|| self.error(ParseErrorCode::InvalidEOF))?;
        let data = self
            .buf
            .get(self.idx..end)
            .ok_or_else(|| self.error(ParseErrorCode::InvalidEOF))?;
        self.idx = end;
        Ok(data)
    }

    /// The argument that follows the initial byte.
    pub(crate) fn read_argument(&mut self, initial: u8) -> Result<u64> {
        match additional_info(initial) {
            info @ 0..=23 => Ok(info as u64),
            INFO_U8 => Ok(self.read_u8()? as u64),
            INFO_U16 => Ok(BigEndian::read_u16(self.read_slice(2)?) as u64),
            INFO_U32 => Ok(BigEndian::read_u32(self.read_slice(4)?) as u64),
            INFO_U64 => Ok(BigEndian::read_u64(self.read_slice(8)?)),
            _ => Err(Error::InvalidCbor(
                ParseErrorCode::UnknownType(initial),
                self.idx - 1,
            )),
        }
    }

    /// `None` for an indefinite length.
    pub(crate) fn read_length(&mut self, initial: u8) -> Result<Option<u64>> {
        if additional_info(initial) == INFO_INDEFINITE {
            Ok(None)
        } else {
            self.read_argument(initial).map(Some)
        }
    }

    /// Consumes a break byte if it is next.
    pub(crate) fn at_break(&mut self) -> Result<bool> {
        if self.peek()? == CBOR_BREAK {
            self.idx += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Reads the content of a byte or text string whose initial byte was
    /// consumed. Only indefinite strings are copied.
    pub(crate) fn read_string_bytes(&mut self, initial: u8) -> Result<Cow<'a, [u8]>> {
        let major = major_type(initial);
        match self.read_length(initial)? {
            Some(len) => self.read_slice(len).map(Cow::Borrowed),
            None => {
                let mut data = Vec::new();
                loop {
                    let chunk = self.read_u8()?;
                    if chunk == CBOR_BREAK {
                        break;
                    }
                    if major_type(chunk) != major || additional_info(chunk) == INFO_INDEFINITE {
                        return Err(Error::InvalidCbor(
                            ParseErrorCode::IllegalChunkedString,
                            self.idx - 1,
                        ));
                    }
                    let len = self.read_argument(chunk)?;
                    data.extend_from_slice(self.read_slice(len)?);
                }
                Ok(Cow::Owned(data))
            }
        }
    }

    pub(crate) fn read_text(&mut self, initial: u8) -> Result<Cow<'a, str>> {
        let start = self.idx;
        let invalid = |offset: usize| Error::InvalidCbor(ParseErrorCode::InvalidStringValue, offset);
        match self.read_string_bytes(initial)? {
            Cow::Borrowed(data) => std::str::from_utf8(data)
                .map(Cow::Borrowed)
                .map_err(|_| invalid(start)),
            Cow::Owned(data) => String::from_utf8(data)
                .map(Cow::Owned)
                .map_err(|_| invalid(start)),
        }
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_nesting_depth {
            tracing::debug!(
                depth = self.depth,
                position = self.idx,
                "cbor nesting depth limit reached"
            );
            return Err(self.error(ParseErrorCode::MaxNestingDepthExceeded));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Parses one data item.
    pub(crate) fn parse<V: Visitor + ?Sized>(&mut self, visitor: &mut V) -> Result<VisitFlow> {
        let ctx = SerContext::at_position(self.idx);
        let initial = self.read_u8()?;
        self.parse_initial(initial, SemanticTag::None, 0, visitor, &ctx)
    }

    fn parse_initial<V: Visitor + ?Sized>(
        &mut self,
        initial: u8,
        tag: SemanticTag,
        ext_tag: u64,
        visitor: &mut V,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        match major_type(initial) {
            MAJOR_UNSIGNED => {
                let v = self.read_argument(initial)?;
                visitor.visit_uint64(v, tag, ctx)
            }
            MAJOR_NEGATIVE => {
                let n = self.read_argument(initial)?;
                match i64::try_from(n) {
                    Ok(n) => visitor.visit_int64(-1 - n, tag, ctx),
                    Err(_) => {
                        let text = (-1i128 - n as i128).to_string();
                        visitor.visit_string(&text, SemanticTag::Bigint, ctx)
                    }
                }
            }
            MAJOR_BYTES => {
                let data = self.read_string_bytes(initial)?;
                visitor.visit_byte_string(&data, tag, ext_tag, ctx)
            }
            MAJOR_TEXT => {
                let text = self.read_text(initial)?;
                visitor.visit_string(&text, tag, ctx)
            }
            MAJOR_ARRAY => self.parse_array(initial, tag, visitor, ctx),
            MAJOR_MAP => self.parse_map(initial, tag, visitor, ctx),
            MAJOR_TAG => {
                let number = self.read_argument(initial)?;
                self.parse_tagged(number, visitor, ctx)
            }
            _ => self.parse_simple(initial, tag, visitor, ctx),
        }
    }

    fn parse_simple<V: Visitor + ?Sized>(
        &mut self,
        initial: u8,
        tag: SemanticTag,
        visitor: &mut V,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        match initial {
            CBOR_FALSE => visitor.visit_bool(false, tag, ctx),
            CBOR_TRUE => visitor.visit_bool(true, tag, ctx),
            CBOR_NULL => visitor.visit_null(tag, ctx),
            CBOR_UNDEFINED => visitor.visit_null(SemanticTag::Undefined, ctx),
            CBOR_HALF => {
                let bits = BigEndian::read_u16(self.read_slice(2)?);
                visitor.visit_half(bits, tag, ctx)
            }
            CBOR_SINGLE => {
                let v = BigEndian::read_f32(self.read_slice(4)?);
                visitor.visit_double(v as f64, tag, ctx)
            }
            CBOR_DOUBLE => {
                let v = BigEndian::read_f64(self.read_slice(8)?);
                visitor.visit_double(v, tag, ctx)
            }
            CBOR_BREAK => Err(Error::InvalidCbor(
                ParseErrorCode::UnexpectedBreak,
                self.idx - 1,
            )),
            _ => Err(Error::InvalidCbor(
                ParseErrorCode::UnknownType(initial),
                self.idx - 1,
            )),
        }
    }

    fn parse_array<V: Visitor + ?Sized>(
        &mut self,
        initial: u8,
        tag: SemanticTag,
        visitor: &mut V,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.enter()?;
        let len = self.read_length(initial)?;
        let size_hint = len.and_then(|len| usize::try_from(len).ok());
        try_visit!(visitor.visit_begin_array(size_hint, tag, ctx));
        match len {
            Some(len) => {
                for _ in 0..len {
                    try_visit!(self.parse(visitor));
                }
            }
            None => {
                while !self.at_break()? {
                    try_visit!(self.parse(visitor));
                }
            }
        }
        self.leave();
        visitor.visit_end_array(&SerContext::at_position(self.idx))
    }

    fn parse_map<V: Visitor + ?Sized>(
        &mut self,
        initial: u8,
        tag: SemanticTag,
        visitor: &mut V,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.enter()?;
        let len = self.read_length(initial)?;
        let size_hint = len.and_then(|len| usize::try_from(len).ok());
        try_visit!(visitor.visit_begin_object(size_hint, tag, ctx));
        let mut remaining = len;
        loop {
            match remaining.as_mut() {
                Some(0) => break,
                Some(n) => *n -= 1,
                None => {
                    if self.at_break()? {
                        break;
                    }
                }
            }
            let key_ctx = SerContext::at_position(self.idx);
            let key = self.read_key()?;
            try_visit!(visitor.visit_key(&key, &key_ctx));
            try_visit!(self.parse(visitor));
        }
        self.leave();
        visitor.visit_end_object(&SerContext::at_position(self.idx))
    }

    /// Map keys must be text; integer keys are accepted as their decimal
    /// text. Tags on keys are ignored.
    pub(crate) fn read_key(&mut self) -> Result<Cow<'a, str>> {
        let start = self.idx;
        let mut initial = self.read_u8()?;
        while major_type(initial) == MAJOR_TAG {
            self.read_argument(initial)?;
            initial = self.read_u8()?;
        }
        match major_type(initial) {
            MAJOR_TEXT => self.read_text(initial),
            MAJOR_UNSIGNED => Ok(Cow::Owned(self.read_argument(initial)?.to_string())),
            MAJOR_NEGATIVE => {
                let n = self.read_argument(initial)?;
                Ok(Cow::Owned((-1i128 - n as i128).to_string()))
            }
            _ => Err(Error::InvalidCbor(ParseErrorCode::KeyMustBeAString, start)),
        }
    }

    fn parse_tagged<V: Visitor + ?Sized>(
        &mut self,
        number: u64,
        visitor: &mut V,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        let mut number = number;
        let mut initial = self.read_u8()?;
        // only the innermost of consecutive tags applies
        while major_type(initial) == MAJOR_TAG {
            tracing::trace!(tag = number, position = ctx.position(), "ignoring outer cbor tag");
            number = self.read_argument(initial)?;
            initial = self.read_u8()?;
        }
        match number {
            TAG_DATETIME => self.parse_initial(initial, SemanticTag::Datetime, 0, visitor, ctx),
            TAG_EPOCH => self.parse_initial(initial, SemanticTag::EpochSecond, 0, visitor, ctx),
            TAG_POSITIVE_BIGNUM | TAG_NEGATIVE_BIGNUM if major_type(initial) == MAJOR_BYTES => {
                let magnitude = self.read_string_bytes(initial)?;
                let text = bignum_to_decimal(&magnitude, number == TAG_NEGATIVE_BIGNUM);
                visitor.visit_string(&text, SemanticTag::Bigint, ctx)
            }
            TAG_DECIMAL_FRACTION => {
                let start = self.idx;
                match self.read_decimal_fraction(initial)? {
                    Some(text) => visitor.visit_string(&text, SemanticTag::Bigdec, ctx),
                    None => {
                        self.idx = start;
                        self.parse_initial(initial, SemanticTag::None, 0, visitor, ctx)
                    }
                }
            }
            TAG_BIGFLOAT => self.parse_initial(initial, SemanticTag::Bigfloat, 0, visitor, ctx),
            TAG_EXPECT_BASE64URL => {
                self.parse_initial(initial, SemanticTag::Base64Url, 0, visitor, ctx)
            }
            TAG_EXPECT_BASE64 => self.parse_initial(initial, SemanticTag::Base64, 0, visitor, ctx),
            TAG_EXPECT_BASE16 => self.parse_initial(initial, SemanticTag::Base16, 0, visitor, ctx),
            TAG_URI => self.parse_initial(initial, SemanticTag::Uri, 0, visitor, ctx),
            TAG_BASE64URL => self.parse_initial(initial, SemanticTag::Base64Url, 0, visitor, ctx),
            TAG_BASE64 => self.parse_initial(initial, SemanticTag::Base64, 0, visitor, ctx),
            TAG_MULTI_DIM_ROW_MAJOR | TAG_MULTI_DIM_COLUMN_MAJOR => {
                let tag = if number == TAG_MULTI_DIM_ROW_MAJOR {
                    SemanticTag::MultiDimRowMajor
                } else {
                    SemanticTag::MultiDimColumnMajor
                };
                self.parse_multi_dim(initial, tag, visitor, ctx)
            }
            TAG_TYPED_ARRAY_FIRST..=TAG_TYPED_ARRAY_LAST if major_type(initial) == MAJOR_BYTES => {
                self.parse_typed_array(number as u8, initial, visitor, ctx)
            }
            TAG_SELF_DESCRIBE => self.parse_initial(initial, SemanticTag::None, 0, visitor, ctx),
            _ if major_type(initial) == MAJOR_BYTES => {
                self.parse_initial(initial, SemanticTag::Ext, number, visitor, ctx)
            }
            _ => {
                tracing::trace!(tag = number, position = ctx.position(), "ignoring cbor tag");
                self.parse_initial(initial, SemanticTag::None, 0, visitor, ctx)
            }
        }
    }

    /// Decimal text of an integer or bignum item, `None` for anything else.
    fn read_integer_text(&mut self) -> Result<Option<String>> {
        let initial = self.read_u8()?;
        match major_type(initial) {
            MAJOR_UNSIGNED => Ok(Some(self.read_argument(initial)?.to_string())),
            MAJOR_NEGATIVE => {
                let n = self.read_argument(initial)?;
                Ok(Some((-1i128 - n as i128).to_string()))
            }
            MAJOR_TAG => {
                let number = self.read_argument(initial)?;
                let inner = self.read_u8()?;
                if !matches!(number, TAG_POSITIVE_BIGNUM | TAG_NEGATIVE_BIGNUM)
                    || major_type(inner) != MAJOR_BYTES
                {
                    return Ok(None);
                }
                let magnitude = self.read_string_bytes(inner)?;
                Ok(Some(bignum_to_decimal(
                    &magnitude,
                    number == TAG_NEGATIVE_BIGNUM,
                )))
            }
            _ => Ok(None),
        }
    }

    /// `[exponent, mantissa]` meaning `mantissa * 10^exponent`.
    fn read_decimal_fraction(&mut self, initial: u8) -> Result<Option<String>> {
        if initial != (MAJOR_ARRAY << 5) | 2 {
            return Ok(None);
        }
        let Some(exponent) = self.read_integer_text()? else {
            return Ok(None);
        };
        let Ok(exponent) = exponent.parse::<i64>() else {
            return Ok(None);
        };
        let Some(mantissa) = self.read_integer_text()? else {
            return Ok(None);
        };
        Ok(Some(format_decimal(&mantissa, exponent)))
    }

    /// `[shape, data]` where `shape` is an array of dimensions.
    fn parse_multi_dim<V: Visitor + ?Sized>(
        &mut self,
        initial: u8,
        tag: SemanticTag,
        visitor: &mut V,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        let start = self.idx;
        let shape = if initial == (MAJOR_ARRAY << 5) | 2 {
            self.read_shape()?
        } else {
            None
        };
        let Some(shape) = shape else {
            self.idx = start;
            return self.parse_initial(initial, SemanticTag::None, 0, visitor, ctx);
        };
        self.enter()?;
        try_visit!(visitor.visit_begin_multi_dim(&shape, tag, ctx));
        try_visit!(self.parse(visitor));
        self.leave();
        visitor.visit_end_multi_dim(&SerContext::at_position(self.idx))
    }

    fn read_shape(&mut self) -> Result<Option<Vec<usize>>> {
        let initial = self.read_u8()?;
        if major_type(initial) != MAJOR_ARRAY {
            return Ok(None);
        }
        let Some(len) = self.read_length(initial)? else {
            return Ok(None);
        };
        let mut shape = Vec::new();
        for _ in 0..len {
            let dim = self.read_u8()?;
            if major_type(dim) != MAJOR_UNSIGNED {
                return Ok(None);
            }
            match usize::try_from(self.read_argument(dim)?) {
                Ok(dim) => shape.push(dim),
                Err(_) => return Ok(None),
            }
        }
        Ok(Some(shape))
    }

    /// RFC 8746 tags lay out as `0b010_f_s_e_ll`.
    fn parse_typed_array<V: Visitor + ?Sized>(
        &mut self,
        tag: u8,
        initial: u8,
        visitor: &mut V,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        let start = self.idx;
        let float = tag & 0x10 != 0;
        let signed = tag & 0x08 != 0;
        let little_endian = tag & 0x04 != 0;
        let ll = tag & 0x03;

        let data = self.read_string_bytes(initial)?;
        let invalid = || Error::InvalidCbor(ParseErrorCode::InvalidTypedArray, start);
        let width = if float { 2usize << ll } else { 1usize << ll };
        if (float && ll == 3) || data.len() % width != 0 {
            return Err(invalid());
        }
        self.enter()?;
        let flow = if float || ll > 0 {
            if little_endian {
                typed_elements::<LittleEndian, V>(&data, float, signed, ll, visitor, ctx)?
            } else {
                typed_elements::<BigEndian, V>(&data, float, signed, ll, visitor, ctx)?
            }
        } else if signed {
            let elements: Vec<i8> = data.iter().map(|b| *b as i8).collect();
            visitor.visit_typed_array(TypedArray::I8(&elements), SemanticTag::None, ctx)?
        } else {
            // the endianness bit marks clamped arithmetic for single bytes
            let tag = if little_endian {
                SemanticTag::Clamped
            } else {
                SemanticTag::None
            };
            visitor.visit_typed_array(TypedArray::U8(&data), tag, ctx)?
        };
        self.leave();
        Ok(flow)
    }
}

macro_rules! read_elements {
    ($order:ty, $data:expr, $t:ty, $read:ident) => {{
        let mut elements = vec![<$t>::default(); $data.len() / std::mem::size_of::<$t>()];
        <$order>::$read($data, &mut elements);
        elements
    }};
}

fn typed_elements<E: ByteOrder, V: Visitor + ?Sized>(
    data: &[u8],
    float: bool,
    signed: bool,
    ll: u8,
    visitor: &mut V,
    ctx: &SerContext,
) -> Result<VisitFlow> {
    let none = SemanticTag::None;
    match (float, signed, ll) {
        (false, false, 1) => {
            let v = read_elements!(E, data, u16, read_u16_into);
            visitor.visit_typed_array(TypedArray::U16(&v), none, ctx)
        }
        (false, false, 2) => {
            let v = read_elements!(E, data, u32, read_u32_into);
            visitor.visit_typed_array(TypedArray::U32(&v), none, ctx)
        }
        (false, false, _) => {
            let v = read_elements!(E, data, u64, read_u64_into);
            visitor.visit_typed_array(TypedArray::U64(&v), none, ctx)
        }
        (false, true, 1) => {
            let v = read_elements!(E, data, i16, read_i16_into);
            visitor.visit_typed_array(TypedArray::I16(&v), none, ctx)
        }
        (false, true, 2) => {
            let v = read_elements!(E, data, i32, read_i32_into);
            visitor.visit_typed_array(TypedArray::I32(&v), none, ctx)
        }
        (false, true, _) => {
            let v = read_elements!(E, data, i64, read_i64_into);
            visitor.visit_typed_array(TypedArray::I64(&v), none, ctx)
        }
        (true, _, 0) => {
            let v = read_elements!(E, data, u16, read_u16_into);
            visitor.visit_typed_array(TypedArray::Half(&v), none, ctx)
        }
        (true, _, 1) => {
            let v = read_elements!(E, data, f32, read_f32_into);
            visitor.visit_typed_array(TypedArray::F32(&v), none, ctx)
        }
        (true, _, _) => {
            let v = read_elements!(E, data, f64, read_f64_into);
            visitor.visit_typed_array(TypedArray::F64(&v), none, ctx)
        }
    }
}

/// Validates one data item without producing events and returns where it
/// ends. Definite strings are checked in place so nothing is allocated.
pub(crate) fn skip_item(parser: &mut Parser<'_>) -> Result<()> {
    let initial = parser.read_u8()?;
    match major_type(initial) {
        MAJOR_UNSIGNED | MAJOR_NEGATIVE => {
            parser.read_argument(initial)?;
        }
        MAJOR_BYTES | MAJOR_TEXT => skip_string(parser, initial)?,
        MAJOR_ARRAY | MAJOR_MAP => {
            parser.enter()?;
            let per_entry = if major_type(initial) == MAJOR_MAP { 2 } else { 1 };
            match parser.read_length(initial)? {
                Some(len) => {
                    for _ in 0..len {
                        for _ in 0..per_entry {
                            skip_item(parser)?;
                        }
                    }
                }
                None => {
                    while !parser.at_break()? {
                        for _ in 0..per_entry {
                            skip_item(parser)?;
                        }
                    }
                }
            }
            parser.leave();
        }
        MAJOR_TAG => {
            parser.read_argument(initial)?;
            while major_type(parser.peek()?) == MAJOR_TAG {
                let tag = parser.read_u8()?;
                parser.read_argument(tag)?;
            }
            skip_item(parser)?;
        }
        _ => match initial {
            CBOR_FALSE | CBOR_TRUE | CBOR_NULL | CBOR_UNDEFINED => {}
            CBOR_HALF => {
                parser.read_slice(2)?;
            }
            CBOR_SINGLE => {
                parser.read_slice(4)?;
            }
            CBOR_DOUBLE => {
                parser.read_slice(8)?;
            }
            CBOR_BREAK => {
                return Err(Error::InvalidCbor(
                    ParseErrorCode::UnexpectedBreak,
                    parser.idx - 1,
                ))
            }
            _ => {
                return Err(Error::InvalidCbor(
                    ParseErrorCode::UnknownType(initial),
                    parser.idx - 1,
                ))
            }
        },
    }
    Ok(())
}

fn skip_string(parser: &mut Parser<'_>, initial: u8) -> Result<()> {
    let major = major_type(initial);
    let check = |data: &[u8], start: usize| -> Result<()> {
        if major == MAJOR_TEXT && std::str::from_utf8(data).is_err() {
            return Err(Error::InvalidCbor(ParseErrorCode::InvalidStringValue, start));
        }
        Ok(())
    };
    match parser.read_length(initial)? {
        Some(len) => {
            let start = parser.idx;
            let data = parser.read_slice(len)?;
            check(data, start)
        }
        None => loop {
            let chunk = parser.read_u8()?;
            if chunk == CBOR_BREAK {
                return Ok(());
            }
            if major_type(chunk) != major || additional_info(chunk) == INFO_INDEFINITE {
                return Err(Error::InvalidCbor(
                    ParseErrorCode::IllegalChunkedString,
                    parser.idx - 1,
                ));
            }
            let len = parser.read_argument(chunk)?;
            let start = parser.idx;
            let data = parser.read_slice(len)?;
            // text chunks must each be valid UTF-8
            check(data, start)?;
        },
    }
}
