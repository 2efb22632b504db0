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

use super::parse_value_with_options;
use super::JsonReadOptions;
use crate::error::Error;
use crate::error::ParseErrorCode;
use crate::error::Result;
use crate::value::Value;
use crate::visitor::SerContext;

/// Outcome of [`JsonStreamParser::feed`].
#[derive(Debug, Clone, PartialEq)]
pub enum Feed {
    /// The buffered input does not hold a complete value yet.
    NeedMore,
    Done(Value<'static>),
}

/// Parses a sequence of JSON values delivered in arbitrary chunks.
///
/// The scanner keeps its depth, in-string and escape state between calls,
/// so no byte is looked at twice while a value is incomplete. Once a value
/// is complete it is parsed and dropped from the buffer; input after it
/// stays buffered and `feed(&[])` returns the next value.
///
/// A top-level number or literal has no closing delimiter. It completes at
/// the next whitespace or value start, or through [`JsonStreamParser::finish`].
/// Syntax error positions are relative to the start of the value.
#[derive(Debug, Default)]
pub struct JsonStreamParser {
    options: JsonReadOptions,
    buffer: Vec<u8>,
    scanned: usize,
    depth: usize,
    in_string: bool,
    escape: bool,
    value_start: Option<usize>,
    scalar: bool,
}

impl JsonStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: JsonReadOptions) -> Result<Self> {
        if options.get_max_nesting_depth() == 0 {
            return Err(Error::InvalidOptions("max_nesting_depth must be positive"));
        }
        Ok(Self {
            options,
            ..Self::default()
        })
    }

    /// Number of bytes held back for the next value.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Appends `data` and returns the first value it completes.
    pub fn feed(&mut self, data: &[u8]) -> Result<Feed> {
        self.buffer.extend_from_slice(data);
        tracing::trace!(
            received = data.len(),
            buffered = self.buffer.len(),
            depth = self.depth,
            "json stream input"
        );

        let mut idx = self.scanned;
        while idx < self.buffer.len() {
            let c = self.buffer[idx];
            if self.in_string {
                if self.escape {
                    self.escape = false;
                } else if c == b'\\' {
                    self.escape = true;
                } else if c == b'"' {
                    self.in_string = false;
                    if self.depth == 0 {
                        return self.complete(idx + 1);
                    }
                }
                idx += 1;
                continue;
            }
            match c {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    if self.scalar {
                        return self.complete(idx);
                    }
                }
                b'"' | b'[' | b'{' if self.scalar => return self.complete(idx),
                b'"' => {
                    self.value_start.get_or_insert(idx);
                    self.in_string = true;
                }
                b'[' | b'{' => {
                    self.value_start.get_or_insert(idx);
                    self.depth += 1;
                }
                b']' | b'}' if self.scalar => return self.complete(idx),
                b']' | b'}' => {
                    if self.depth == 0 {
                        let err = Error::Syntax(
                            ParseErrorCode::ExpectedSomeValue,
                            SerContext::new(1, idx + 1, idx),
                        );
                        // input after the stray byte is kept
                        self.reset_scanner();
                        self.buffer.drain(..=idx);
                        return Err(err);
                    }
                    self.depth -= 1;
                    if self.depth == 0 {
                        return self.complete(idx + 1);
                    }
                }
                _ => {
                    if self.value_start.is_none() {
                        self.value_start = Some(idx);
                        self.scalar = true;
                    }
                }
            }
            idx += 1;
        }
        self.scanned = idx;
        Ok(Feed::NeedMore)
    }

    /// Completes a trailing top-level scalar at the end of input.
    ///
    /// Returns `None` when only whitespace is buffered and fails when a
    /// container or string is still open.
    pub fn finish(&mut self) -> Result<Option<Value<'static>>> {
        let Some(start) = self.value_start else {
            self.buffer.clear();
            self.reset_scanner();
            return Ok(None);
        };
        let result = parse_value_with_options(&self.buffer[start..], &self.options);
        self.buffer.clear();
        self.reset_scanner();
        result.map(Some)
    }

    fn complete(&mut self, end: usize) -> Result<Feed> {
        let start = self.value_start.unwrap_or(0);
        let result = parse_value_with_options(&self.buffer[start..end], &self.options);
        self.buffer.drain(..end);
        self.reset_scanner();
        tracing::trace!(remaining = self.buffer.len(), "json stream value complete");
        result.map(Feed::Done)
    }

    fn reset_scanner(&mut self) {
        self.scanned = 0;
        self.depth = 0;
        self.in_string = false;
        self.escape = false;
        self.value_start = None;
        self.scalar = false;
    }
}
