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

use std::io;

use byteorder::BigEndian;
use byteorder::WriteBytesExt;

use crate::constants::*;
use crate::error::Error;
use crate::error::Result;
use crate::number::decimal_to_bignum;
use crate::number::split_decimal;
use crate::tag::SemanticTag;
use crate::visitor::SerContext;
use crate::visitor::TypedArray;
use crate::visitor::VisitFlow;
use crate::visitor::Visitor;

#[derive(Debug, Clone, Copy)]
struct Frame {
    is_object: bool,
    // `None` for indefinite length containers.
    expected: Option<usize>,
    count: usize,
}

/// A [`Visitor`] writing CBOR to an [`io::Write`].
///
/// Containers with a size hint are written with a definite length and the
/// hint must then match the number of items; containers without one are
/// written with indefinite length and closed by a break byte.
pub struct CborEncoder<W: io::Write> {
    writer: W,
    frames: Vec<Frame>,
}

impl<W: io::Write> CborEncoder<W> {
    pub fn new(writer: W) -> CborEncoder<W> {
        Self {
            writer,
            frames: Vec::new(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes an initial byte with the shortest argument encoding.
    fn write_head(&mut self, major: u8, value: u64) -> Result<()> {
        let major = major << 5;
        if value < INFO_U8 as u64 {
            self.writer.write_u8(major | value as u8)?;
        } else if value <= u8::MAX as u64 {
            self.writer.write_u8(major | INFO_U8)?;
            self.writer.write_u8(value as u8)?;
        } else if value <= u16::MAX as u64 {
            self.writer.write_u8(major | INFO_U16)?;
            self.writer.write_u16::<BigEndian>(value as u16)?;
        } else if value <= u32::MAX as u64 {
            self.writer.write_u8(major | INFO_U32)?;
            self.writer.write_u32::<BigEndian>(value as u32)?;
        } else {
            self.writer.write_u8(major | INFO_U64)?;
            self.writer.write_u64::<BigEndian>(value)?;
        }
        Ok(())
    }

    fn write_tag(&mut self, tag: u64) -> Result<()> {
        self.write_head(MAJOR_TAG, tag)
    }

    fn write_bytes(&mut self, major: u8, data: &[u8]) -> Result<()> {
        self.write_head(major, data.len() as u64)?;
        self.writer.write_all(data)?;
        Ok(())
    }

    fn write_int(&mut self, value: i64) -> Result<()> {
        if value < 0 {
            self.write_head(MAJOR_NEGATIVE, !value as u64)
        } else {
            self.write_head(MAJOR_UNSIGNED, value as u64)
        }
    }

    fn write_double(&mut self, value: f64) -> Result<()> {
        let single = value as f32;
        if value.is_nan() || single as f64 == value {
            self.writer.write_u8(CBOR_SINGLE)?;
            self.writer.write_f32::<BigEndian>(single)?;
        } else {
            self.writer.write_u8(CBOR_DOUBLE)?;
            self.writer.write_f64::<BigEndian>(value)?;
        }
        Ok(())
    }

    /// Counts an array element; object members are counted by their key.
    fn begin_value(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            if !frame.is_object {
                frame.count += 1;
            }
        }
    }

    fn begin_container(
        &mut self,
        is_object: bool,
        size_hint: Option<usize>,
    ) -> Result<VisitFlow> {
        let major = if is_object { MAJOR_MAP } else { MAJOR_ARRAY };
        match size_hint {
            Some(len) => self.write_head(major, len as u64)?,
            None => self.writer.write_u8((major << 5) | INFO_INDEFINITE)?,
        }
        self.frames.push(Frame {
            is_object,
            expected: size_hint,
            count: 0,
        });
        Ok(VisitFlow::Continue)
    }

    fn end_container(&mut self, is_object: bool) -> Result<VisitFlow> {
        let frame = self
            .frames
            .pop()
            .filter(|frame| frame.is_object == is_object)
            .ok_or(Error::UnexpectedEvent("unbalanced end of container"))?;
        match frame.expected {
            None => self.writer.write_u8(CBOR_BREAK)?,
            Some(expected) if expected != frame.count => {
                return Err(Error::UnexpectedEvent(
                    "item count does not match the size hint",
                ))
            }
            Some(_) => {}
        }
        Ok(VisitFlow::Continue)
    }

    /// `[exponent, mantissa]` under tag 4. Writes nothing and returns
    /// `false` when `text` is not a decimal number.
    fn write_decimal_fraction(&mut self, text: &str) -> Result<bool> {
        let Some((mantissa, exponent)) = split_decimal(text) else {
            return Ok(false);
        };
        self.write_tag(TAG_DECIMAL_FRACTION)?;
        self.write_head(MAJOR_ARRAY, 2)?;
        self.write_int(exponent)?;
        match mantissa.parse::<i64>() {
            Ok(mantissa) => self.write_int(mantissa)?,
            Err(_) => {
                self.write_bignum(&mantissa)?;
            }
        }
        Ok(true)
    }

    fn write_bignum(&mut self, text: &str) -> Result<bool> {
        let Some((negative, magnitude)) = decimal_to_bignum(text) else {
            return Ok(false);
        };
        let tag = if negative {
            TAG_NEGATIVE_BIGNUM
        } else {
            TAG_POSITIVE_BIGNUM
        };
        self.write_tag(tag)?;
        self.write_bytes(MAJOR_BYTES, &magnitude)?;
        Ok(true)
    }

    fn write_epoch(&mut self, seconds: f64) -> Result<VisitFlow> {
        self.write_tag(TAG_EPOCH)?;
        self.write_double(seconds)?;
        Ok(VisitFlow::Continue)
    }
}

fn epoch_scale(tag: SemanticTag) -> Option<f64> {
    match tag {
        SemanticTag::EpochMilli => Some(1e3),
        SemanticTag::EpochNano => Some(1e9),
        _ => None,
    }
}

impl<W: io::Write> Visitor for CborEncoder<W> {
    fn visit_begin_object(
        &mut self,
        size_hint: Option<usize>,
        _tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.begin_value();
        self.begin_container(true, size_hint)
    }

    fn visit_end_object(&mut self, _ctx: &SerContext) -> Result<VisitFlow> {
        self.end_container(true)
    }

    fn visit_begin_array(
        &mut self,
        size_hint: Option<usize>,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.begin_value();
        match tag {
            SemanticTag::Bigfloat => self.write_tag(TAG_BIGFLOAT)?,
            SemanticTag::MultiDimRowMajor => self.write_tag(TAG_MULTI_DIM_ROW_MAJOR)?,
            SemanticTag::MultiDimColumnMajor => self.write_tag(TAG_MULTI_DIM_COLUMN_MAJOR)?,
            _ => {}
        }
        self.begin_container(false, size_hint)
    }

    fn visit_end_array(&mut self, _ctx: &SerContext) -> Result<VisitFlow> {
        self.end_container(false)
    }

    fn visit_key(&mut self, key: &str, _ctx: &SerContext) -> Result<VisitFlow> {
        if let Some(frame) = self.frames.last_mut() {
            frame.count += 1;
        }
        self.write_bytes(MAJOR_TEXT, key.as_bytes())?;
        Ok(VisitFlow::Continue)
    }

    fn visit_null(&mut self, tag: SemanticTag, _ctx: &SerContext) -> Result<VisitFlow> {
        self.begin_value();
        let byte = if tag == SemanticTag::Undefined {
            CBOR_UNDEFINED
        } else {
            CBOR_NULL
        };
        self.writer.write_u8(byte)?;
        Ok(VisitFlow::Continue)
    }

    fn visit_bool(&mut self, value: bool, _tag: SemanticTag, _ctx: &SerContext) -> Result<VisitFlow> {
        self.begin_value();
        self.writer
            .write_u8(if value { CBOR_TRUE } else { CBOR_FALSE })?;
        Ok(VisitFlow::Continue)
    }

    fn visit_string(
        &mut self,
        value: &str,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.begin_value();
        match tag {
            SemanticTag::Bigint => {
                if self.write_bignum(value)? {
                    return Ok(VisitFlow::Continue);
                }
            }
            SemanticTag::Bigdec => {
                if self.write_decimal_fraction(value)? {
                    return Ok(VisitFlow::Continue);
                }
            }
            SemanticTag::Datetime => self.write_tag(TAG_DATETIME)?,
            SemanticTag::Uri => self.write_tag(TAG_URI)?,
            SemanticTag::Base64Url => self.write_tag(TAG_BASE64URL)?,
            SemanticTag::Base64 => self.write_tag(TAG_BASE64)?,
            _ => {}
        }
        self.write_bytes(MAJOR_TEXT, value.as_bytes())?;
        Ok(VisitFlow::Continue)
    }

    fn visit_byte_string(
        &mut self,
        value: &[u8],
        tag: SemanticTag,
        ext_tag: u64,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.begin_value();
        match tag {
            SemanticTag::Base64Url => self.write_tag(TAG_EXPECT_BASE64URL)?,
            SemanticTag::Base64 => self.write_tag(TAG_EXPECT_BASE64)?,
            SemanticTag::Base16 => self.write_tag(TAG_EXPECT_BASE16)?,
            SemanticTag::Ext => self.write_tag(ext_tag)?,
            _ => {}
        }
        self.write_bytes(MAJOR_BYTES, value)?;
        Ok(VisitFlow::Continue)
    }

    fn visit_int64(&mut self, value: i64, tag: SemanticTag, _ctx: &SerContext) -> Result<VisitFlow> {
        self.begin_value();
        if let Some(scale) = epoch_scale(tag) {
            return self.write_epoch(value as f64 / scale);
        }
        if tag == SemanticTag::EpochSecond {
            self.write_tag(TAG_EPOCH)?;
        }
        self.write_int(value)?;
        Ok(VisitFlow::Continue)
    }

    fn visit_uint64(
        &mut self,
        value: u64,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.begin_value();
        if let Some(scale) = epoch_scale(tag) {
            return self.write_epoch(value as f64 / scale);
        }
        if tag == SemanticTag::EpochSecond {
            self.write_tag(TAG_EPOCH)?;
        }
        self.write_head(MAJOR_UNSIGNED, value)?;
        Ok(VisitFlow::Continue)
    }

    fn visit_half(&mut self, value: u16, _tag: SemanticTag, _ctx: &SerContext) -> Result<VisitFlow> {
        self.begin_value();
        self.writer.write_u8(CBOR_HALF)?;
        self.writer.write_u16::<BigEndian>(value)?;
        Ok(VisitFlow::Continue)
    }

    fn visit_double(
        &mut self,
        value: f64,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.begin_value();
        if let Some(scale) = epoch_scale(tag) {
            return self.write_epoch(value / scale);
        }
        if tag == SemanticTag::EpochSecond {
            self.write_tag(TAG_EPOCH)?;
        }
        self.write_double(value)?;
        Ok(VisitFlow::Continue)
    }

    fn visit_typed_array(
        &mut self,
        data: TypedArray<'_>,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.begin_value();
        let mut bytes = Vec::new();
        let array_tag = match data {
            TypedArray::U8(s) => {
                bytes.extend_from_slice(s);
                if tag == SemanticTag::Clamped {
                    TAG_UINT8_CLAMPED_ARRAY
                } else {
                    TAG_UINT8_ARRAY
                }
            }
            TypedArray::I8(s) => {
                bytes.extend(s.iter().map(|v| *v as u8));
                TAG_SINT8_ARRAY
            }
            TypedArray::U16(s) => {
                for v in s {
                    bytes.write_u16::<BigEndian>(*v)?;
                }
                TAG_UINT16_BE_ARRAY
            }
            TypedArray::U32(s) => {
                for v in s {
                    bytes.write_u32::<BigEndian>(*v)?;
                }
                TAG_UINT32_BE_ARRAY
            }
            TypedArray::U64(s) => {
                for v in s {
                    bytes.write_u64::<BigEndian>(*v)?;
                }
                TAG_UINT64_BE_ARRAY
            }
            TypedArray::I16(s) => {
                for v in s {
                    bytes.write_i16::<BigEndian>(*v)?;
                }
                TAG_SINT16_BE_ARRAY
            }
            TypedArray::I32(s) => {
                for v in s {
                    bytes.write_i32::<BigEndian>(*v)?;
                }
                TAG_SINT32_BE_ARRAY
            }
            TypedArray::I64(s) => {
                for v in s {
                    bytes.write_i64::<BigEndian>(*v)?;
                }
                TAG_SINT64_BE_ARRAY
            }
            TypedArray::Half(s) => {
                for v in s {
                    bytes.write_u16::<BigEndian>(*v)?;
                }
                TAG_FLOAT16_BE_ARRAY
            }
            TypedArray::F32(s) => {
                for v in s {
                    bytes.write_f32::<BigEndian>(*v)?;
                }
                TAG_FLOAT32_BE_ARRAY
            }
            TypedArray::F64(s) => {
                for v in s {
                    bytes.write_f64::<BigEndian>(*v)?;
                }
                TAG_FLOAT64_BE_ARRAY
            }
        };
        self.write_tag(array_tag)?;
        self.write_bytes(MAJOR_BYTES, &bytes)?;
        Ok(VisitFlow::Continue)
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
