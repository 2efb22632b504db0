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

//! JSON text: a parser driving any [`Visitor`], an incremental stream
//! parser and a text encoder.

mod encoder;
mod parser;
mod stream;
mod unescape;

use std::io;

pub use encoder::JsonEncoder;
pub use stream::Feed;
pub use stream::JsonStreamParser;

use crate::constants::DEFAULT_MAX_NESTING_DEPTH;
use crate::decoder::DecodeOptions;
use crate::decoder::ValueDecoder;
use crate::error::Error;
use crate::error::Result;
use crate::object::KeyOrder;
use crate::value::Value;
use crate::visitor::VisitFlow;
use crate::visitor::Visitor;
use parser::Parser;

const PRETTY_INDENT: usize = 4;

/// Settings of the JSON readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonReadOptions {
    max_nesting_depth: usize,
    lossless_number: bool,
    allow_trailing_comma: bool,
    key_order: KeyOrder,
}

impl Default for JsonReadOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            lossless_number: false,
            allow_trailing_comma: false,
            key_order: KeyOrder::Sorted,
        }
    }
}

impl JsonReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Keep numbers with a fraction or exponent as `Bigdec` text instead
    /// of rounding them to doubles.
    pub fn lossless_number(mut self, lossless: bool) -> Self {
        self.lossless_number = lossless;
        self
    }

    /// Accept a comma before a closing bracket or brace.
    pub fn allow_trailing_comma(mut self, allow: bool) -> Self {
        self.allow_trailing_comma = allow;
        self
    }

    pub fn key_order(mut self, order: KeyOrder) -> Self {
        self.key_order = order;
        self
    }

    pub fn get_max_nesting_depth(&self) -> usize {
        self.max_nesting_depth
    }

    pub fn get_lossless_number(&self) -> bool {
        self.lossless_number
    }

    pub fn get_allow_trailing_comma(&self) -> bool {
        self.allow_trailing_comma
    }

    pub fn get_key_order(&self) -> KeyOrder {
        self.key_order
    }
}

/// Text form of untagged byte strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ByteStringFormat {
    Base16,
    Base64,
    #[default]
    Base64Url,
}

/// Settings of [`JsonEncoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonWriteOptions {
    indent: Option<usize>,
    byte_string_format: ByteStringFormat,
    escape_all_non_ascii: bool,
    nan_to_null: bool,
}

impl Default for JsonWriteOptions {
    fn default() -> Self {
        Self {
            indent: None,
            byte_string_format: ByteStringFormat::default(),
            escape_all_non_ascii: false,
            nan_to_null: true,
        }
    }
}

impl JsonWriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty print with `indent` spaces per level.
    pub fn indent(mut self, indent: usize) -> Self {
        self.indent = Some(indent);
        self
    }

    pub fn byte_string_format(mut self, format: ByteStringFormat) -> Self {
        self.byte_string_format = format;
        self
    }

    pub fn escape_all_non_ascii(mut self, escape: bool) -> Self {
        self.escape_all_non_ascii = escape;
        self
    }

    /// Write NaN and infinities as `null`, otherwise as the strings
    /// `"NaN"`, `"Infinity"` and `"-Infinity"`.
    pub fn nan_to_null(mut self, nan_to_null: bool) -> Self {
        self.nan_to_null = nan_to_null;
        self
    }

    pub fn get_indent(&self) -> Option<usize> {
        self.indent
    }

    pub fn get_byte_string_format(&self) -> ByteStringFormat {
        self.byte_string_format
    }

    pub fn get_escape_all_non_ascii(&self) -> bool {
        self.escape_all_non_ascii
    }

    pub fn get_nan_to_null(&self) -> bool {
        self.nan_to_null
    }
}

/// Parses JSON text into a [`Value`].
pub fn parse_value(buf: &[u8]) -> Result<Value<'static>> {
    parse_value_with_options(buf, &JsonReadOptions::default())
}

pub fn parse_value_with_options(buf: &[u8], options: &JsonReadOptions) -> Result<Value<'static>> {
    let mut decoder = ValueDecoder::with_options(
        DecodeOptions::new()
            .max_nesting_depth(options.max_nesting_depth)
            .key_order(options.key_order),
    )?;
    parse_to_visitor(buf, options, &mut decoder)?;
    decoder.get_result()
}

/// Drives `visitor` with the events of one JSON value.
///
/// The visitor is flushed after the value unless it stopped the parse.
pub fn parse_to_visitor<V: Visitor + ?Sized>(
    buf: &[u8],
    options: &JsonReadOptions,
    visitor: &mut V,
) -> Result<()> {
    if options.max_nesting_depth == 0 {
        return Err(Error::InvalidOptions("max_nesting_depth must be positive"));
    }
    let mut parser = Parser::new(buf, *options);
    if parser.parse(visitor)? == VisitFlow::Continue {
        visitor.flush()?;
    }
    Ok(())
}

/// Writes `value` as JSON text to `writer`.
pub fn to_writer<W: io::Write>(value: &Value<'_>, writer: W, options: &JsonWriteOptions) -> Result<()> {
    let mut encoder = JsonEncoder::with_options(writer, *options);
    value.dump(&mut encoder)
}

pub fn to_vec_with_options(value: &Value<'_>, options: &JsonWriteOptions) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    to_writer(value, &mut buf, options)?;
    Ok(buf)
}

/// Compact JSON text.
pub fn to_vec(value: &Value<'_>) -> Result<Vec<u8>> {
    to_vec_with_options(value, &JsonWriteOptions::default())
}

pub fn to_string_with_options(value: &Value<'_>, options: &JsonWriteOptions) -> Result<String> {
    let buf = to_vec_with_options(value, options)?;
    String::from_utf8(buf).map_err(|_| Error::InvalidUtf8)
}

/// Compact JSON text.
pub fn to_string(value: &Value<'_>) -> Result<String> {
    to_string_with_options(value, &JsonWriteOptions::default())
}

/// JSON text indented by four spaces per level.
pub fn to_pretty_string(value: &Value<'_>) -> Result<String> {
    to_string_with_options(value, &JsonWriteOptions::default().indent(PRETTY_INDENT))
}
