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

use super::ByteStringFormat;
use super::JsonWriteOptions;
use crate::byte_string::encode_base16;
use crate::byte_string::encode_base64;
use crate::byte_string::encode_base64url;
use crate::error::Result;
use crate::tag::SemanticTag;
use crate::visitor::SerContext;
use crate::visitor::VisitFlow;
use crate::visitor::Visitor;

#[derive(Debug, Clone, Copy)]
struct Frame {
    is_object: bool,
    count: usize,
}

/// A [`Visitor`] writing JSON text to an [`io::Write`].
///
/// Output is compact unless [`JsonWriteOptions::indent`] is set.
pub struct JsonEncoder<W: io::Write> {
    writer: W,
    options: JsonWriteOptions,
    frames: Vec<Frame>,
    scratch: String,
}

impl<W: io::Write> JsonEncoder<W> {
    pub fn new(writer: W) -> JsonEncoder<W> {
        Self::with_options(writer, JsonWriteOptions::default())
    }

    pub fn with_options(writer: W, options: JsonWriteOptions) -> JsonEncoder<W> {
        Self {
            writer,
            options,
            frames: Vec::new(),
            scratch: String::new(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_indent(&mut self, level: usize) -> Result<()> {
        if let Some(indent) = self.options.get_indent() {
            self.writer.write_all(b"\n")?;
            for _ in 0..level * indent {
                self.writer.write_all(b" ")?;
            }
        }
        Ok(())
    }

    /// Writes the separator in front of an array element or object member.
    fn begin_element(&mut self) -> Result<()> {
        let level = self.frames.len();
        let Some(frame) = self.frames.last_mut() else {
            return Ok(());
        };
        let first = frame.count == 0;
        frame.count += 1;
        if !first {
            self.writer.write_all(b",")?;
        }
        self.write_indent(level)
    }

    /// Object members already got their separator with the key.
    fn begin_value(&mut self) -> Result<()> {
        match self.frames.last() {
            Some(frame) if !frame.is_object => self.begin_element(),
            _ => Ok(()),
        }
    }

    fn begin_container(&mut self, is_object: bool) -> Result<VisitFlow> {
        self.begin_value()?;
        self.writer.write_all(if is_object { b"{" } else { b"[" })?;
        self.frames.push(Frame {
            is_object,
            count: 0,
        });
        Ok(VisitFlow::Continue)
    }

    fn end_container(&mut self, is_object: bool) -> Result<VisitFlow> {
        if let Some(frame) = self.frames.pop() {
            if frame.count > 0 {
                self.write_indent(self.frames.len())?;
            }
        }
        self.writer.write_all(if is_object { b"}" } else { b"]" })?;
        Ok(VisitFlow::Continue)
    }

    fn write_raw(&mut self, text: &str) -> Result<VisitFlow> {
        self.begin_value()?;
        self.writer.write_all(text.as_bytes())?;
        Ok(VisitFlow::Continue)
    }

    fn write_quoted(&mut self, value: &str) -> Result<()> {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        escape_string(value, self.options.get_escape_all_non_ascii(), &mut scratch);
        let result = self.writer.write_all(scratch.as_bytes());
        self.scratch = scratch;
        Ok(result?)
    }
}

/// Appends `value` as a quoted JSON string literal.
pub(crate) fn escape_string(value: &str, escape_all_non_ascii: bool, json: &mut String) {
    json.push('"');
    for c in value.chars() {
        match c {
            '\\' => json.push_str("\\\\"),
            '"' => json.push_str("\\\""),
            '\u{8}' => json.push_str("\\b"),
            '\u{c}' => json.push_str("\\f"),
            '\n' => json.push_str("\\n"),
            '\r' => json.push_str("\\r"),
            '\t' => json.push_str("\\t"),
            c if (c as u32) < 0x20 => push_unicode_escape(c as u16, json),
            c if escape_all_non_ascii && !c.is_ascii() => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    push_unicode_escape(*unit, json);
                }
            }
            c => json.push(c),
        }
    }
    json.push('"');
}

fn push_unicode_escape(unit: u16, json: &mut String) {
    const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";
    json.push_str("\\u");
    for shift in [12, 8, 4, 0] {
        json.push(HEX_DIGITS[((unit >> shift) & 0xf) as usize] as char);
    }
}

/// Whether `text` matches the JSON number grammar, so that a big number
/// string can be written without quotes.
fn is_number_text(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut idx = 0;
    let digits = |idx: &mut usize| {
        let start = *idx;
        while *idx < bytes.len() && bytes[*idx].is_ascii_digit() {
            *idx += 1;
        }
        *idx - start
    };
    if bytes.first() == Some(&b'-') {
        idx += 1;
    }
    if digits(&mut idx) == 0 {
        return false;
    }
    if bytes.get(idx) == Some(&b'.') {
        idx += 1;
        if digits(&mut idx) == 0 {
            return false;
        }
    }
    if matches!(bytes.get(idx), Some(b'e' | b'E')) {
        idx += 1;
        if matches!(bytes.get(idx), Some(b'+' | b'-')) {
            idx += 1;
        }
        if digits(&mut idx) == 0 {
            return false;
        }
    }
    idx == bytes.len()
}

impl<W: io::Write> Visitor for JsonEncoder<W> {
    fn visit_begin_object(
        &mut self,
        _size_hint: Option<usize>,
        _tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.begin_container(true)
    }

    fn visit_end_object(&mut self, _ctx: &SerContext) -> Result<VisitFlow> {
        self.end_container(true)
    }

    fn visit_begin_array(
        &mut self,
        _size_hint: Option<usize>,
        _tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.begin_container(false)
    }

    fn visit_end_array(&mut self, _ctx: &SerContext) -> Result<VisitFlow> {
        self.end_container(false)
    }

    fn visit_key(&mut self, key: &str, _ctx: &SerContext) -> Result<VisitFlow> {
        self.begin_element()?;
        self.write_quoted(key)?;
        if self.options.get_indent().is_some() {
            self.writer.write_all(b": ")?;
        } else {
            self.writer.write_all(b":")?;
        }
        Ok(VisitFlow::Continue)
    }

    fn visit_null(&mut self, _tag: SemanticTag, _ctx: &SerContext) -> Result<VisitFlow> {
        self.write_raw("null")
    }

    fn visit_bool(&mut self, value: bool, _tag: SemanticTag, _ctx: &SerContext) -> Result<VisitFlow> {
        self.write_raw(if value { "true" } else { "false" })
    }

    fn visit_string(
        &mut self,
        value: &str,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        if matches!(tag, SemanticTag::Bigint | SemanticTag::Bigdec) && is_number_text(value) {
            return self.write_raw(value);
        }
        self.begin_value()?;
        self.write_quoted(value)?;
        Ok(VisitFlow::Continue)
    }

    fn visit_byte_string(
        &mut self,
        value: &[u8],
        tag: SemanticTag,
        _ext_tag: u64,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        let text = match tag {
            SemanticTag::Base16 => encode_base16(value),
            SemanticTag::Base64 => encode_base64(value),
            SemanticTag::Base64Url => encode_base64url(value),
            _ => match self.options.get_byte_string_format() {
                ByteStringFormat::Base16 => encode_base16(value),
                ByteStringFormat::Base64 => encode_base64(value),
                ByteStringFormat::Base64Url => encode_base64url(value),
            },
        };
        self.begin_value()?;
        self.write_quoted(&text)?;
        Ok(VisitFlow::Continue)
    }

    fn visit_int64(&mut self, value: i64, _tag: SemanticTag, _ctx: &SerContext) -> Result<VisitFlow> {
        let mut buffer = itoa::Buffer::new();
        self.write_raw(buffer.format(value))
    }

    fn visit_uint64(
        &mut self,
        value: u64,
        _tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        let mut buffer = itoa::Buffer::new();
        self.write_raw(buffer.format(value))
    }

    fn visit_double(
        &mut self,
        value: f64,
        _tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        if value.is_finite() {
            let mut buffer = ryu::Buffer::new();
            return self.write_raw(buffer.format_finite(value));
        }
        if self.options.get_nan_to_null() {
            return self.write_raw("null");
        }
        let text = if value.is_nan() {
            "\"NaN\""
        } else if value > 0.0 {
            "\"Infinity\""
        } else {
            "\"-Infinity\""
        };
        self.write_raw(text)
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
