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

//! CBOR (RFC 8949): a parser driving any [`Visitor`], an encoder and a
//! zero-copy [`CborView`].

mod encoder;
mod parser;
mod view;

use std::io;

pub use encoder::CborEncoder;
pub use view::ArrayIter;
pub use view::ArrayRange;
pub use view::CborView;
pub use view::FromView;
pub use view::ObjectIter;
pub use view::ObjectRange;

use crate::constants::DEFAULT_MAX_NESTING_DEPTH;
use crate::decoder::DecodeOptions;
use crate::decoder::ValueDecoder;
use crate::error::Error;
use crate::error::ParseErrorCode;
use crate::error::Result;
use crate::value::Value;
use crate::visitor::VisitFlow;
use crate::visitor::Visitor;
use parser::Parser;

/// Settings of the CBOR readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CborReadOptions {
    max_nesting_depth: usize,
}

impl Default for CborReadOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl CborReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn get_max_nesting_depth(&self) -> usize {
        self.max_nesting_depth
    }
}

/// Drives `visitor` with the events of the single data item in `buf`.
///
/// Bytes after the item are an error. The visitor is flushed after the
/// item unless it stopped the parse.
pub fn parse_to_visitor<V: Visitor + ?Sized>(
    buf: &[u8],
    options: &CborReadOptions,
    visitor: &mut V,
) -> Result<()> {
    if options.max_nesting_depth == 0 {
        return Err(Error::InvalidOptions("max_nesting_depth must be positive"));
    }
    let mut parser = Parser::new(buf, options.max_nesting_depth);
    if parser.parse(visitor)? == VisitFlow::Stop {
        return Ok(());
    }
    if !parser.is_end() {
        return Err(parser.error(ParseErrorCode::UnexpectedTrailingCharacters));
    }
    visitor.flush()
}

/// Decodes one CBOR data item into a [`Value`].
pub fn decode(buf: &[u8]) -> Result<Value<'static>> {
    decode_with_options(buf, &CborReadOptions::default())
}

pub fn decode_with_options(buf: &[u8], options: &CborReadOptions) -> Result<Value<'static>> {
    let mut decoder = ValueDecoder::with_options(
        DecodeOptions::new().max_nesting_depth(options.max_nesting_depth),
    )?;
    parse_to_visitor(buf, options, &mut decoder)?;
    decoder.get_result()
}

/// Writes `value` as CBOR to `writer`.
pub fn encode_to_writer<W: io::Write>(value: &Value<'_>, writer: W) -> Result<()> {
    let mut encoder = CborEncoder::new(writer);
    value.dump(&mut encoder)
}

pub fn encode(value: &Value<'_>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_to_writer(value, &mut buf)?;
    Ok(buf)
}
