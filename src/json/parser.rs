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

use super::unescape::unescape;
use super::JsonReadOptions;
use crate::error::Error;
use crate::error::ParseErrorCode;
use crate::error::Result;
use crate::tag::SemanticTag;
use crate::visitor::try_visit;
use crate::visitor::SerContext;
use crate::visitor::VisitFlow;
use crate::visitor::Visitor;

/// Reads RFC 8259 JSON text and drives a [`Visitor`] with its events.
pub(crate) struct Parser<'a> {
    buf: &'a [u8],
    idx: usize,
    line: usize,
    line_start: usize,
    depth: usize,
    options: JsonReadOptions,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(buf: &'a [u8], options: JsonReadOptions) -> Parser<'a> {
        Self {
            buf,
            idx: 0,
            line: 1,
            line_start: 0,
            depth: 0,
            options,
        }
    }

    /// Parses exactly one value followed by optional whitespace.
    pub(crate) fn parse<V: Visitor + ?Sized>(&mut self, visitor: &mut V) -> Result<VisitFlow> {
        try_visit!(self.parse_json_value(visitor));
        self.skip_whitespace();
        if self.idx < self.buf.len() {
            return Err(self.error(ParseErrorCode::UnexpectedTrailingCharacters));
        }
        Ok(VisitFlow::Continue)
    }

    fn parse_json_value<V: Visitor + ?Sized>(&mut self, visitor: &mut V) -> Result<VisitFlow> {
        self.skip_whitespace();
        let ctx = self.ctx();
        match *self.next()? {
            b'n' => {
                self.parse_literal(b"null")?;
                visitor.visit_null(SemanticTag::None, &ctx)
            }
            b't' => {
                self.parse_literal(b"true")?;
                visitor.visit_bool(true, SemanticTag::None, &ctx)
            }
            b'f' => {
                self.parse_literal(b"false")?;
                visitor.visit_bool(false, SemanticTag::None, &ctx)
            }
            b'0'..=b'9' | b'-' => self.parse_json_number(visitor, &ctx),
            b'"' => {
                let s = self.parse_json_string()?;
                visitor.visit_string(&s, SemanticTag::None, &ctx)
            }
            b'[' => self.parse_json_array(visitor, &ctx),
            b'{' => self.parse_json_object(visitor, &ctx),
            _ => Err(self.error(ParseErrorCode::ExpectedSomeValue)),
        }
    }

    #[inline]
    fn next(&self) -> Result<&u8> {
        match self.buf.get(self.idx) {
            Some(c) => Ok(c),
            None => Err(self.error(ParseErrorCode::InvalidEOF)),
        }
    }

    #[inline]
    fn must_is(&mut self, c: u8) -> Result<()> {
        match self.buf.get(self.idx) {
            Some(v) if *v == c => {
                self.step();
                Ok(())
            }
            Some(_) => Err(self.error(ParseErrorCode::ExpectedSomeIdent)),
            None => Err(self.error(ParseErrorCode::InvalidEOF)),
        }
    }

    #[inline]
    fn check_next(&self, c: u8) -> bool {
        self.buf.get(self.idx) == Some(&c)
    }

    #[inline]
    fn check_next_either(&self, c1: u8, c2: u8) -> bool {
        matches!(self.buf.get(self.idx), Some(v) if *v == c1 || *v == c2)
    }

    #[inline]
    fn step_digits(&mut self) -> usize {
        let mut len = 0;
        while let Some(c) = self.buf.get(self.idx) {
            if !c.is_ascii_digit() {
                break;
            }
            len += 1;
            self.step();
        }
        len
    }

    #[inline]
    fn step(&mut self) {
        self.idx += 1;
    }

    fn ctx(&self) -> SerContext {
        self.ctx_at(self.idx)
    }

    fn ctx_at(&self, pos: usize) -> SerContext {
        SerContext::new(self.line, pos - self.line_start + 1, pos)
    }

    fn error(&self, code: ParseErrorCode) -> Error {
        Error::Syntax(code, self.ctx())
    }

    #[inline]
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.buf.get(self.idx) {
            match c {
                b' ' | b'\t' | b'\r' => {}
                b'\n' => {
                    self.line += 1;
                    self.line_start = self.idx + 1;
                }
                _ => break,
            }
            self.step();
        }
    }

    fn parse_literal(&mut self, literal: &[u8]) -> Result<()> {
        for c in literal {
            self.must_is(*c)?;
        }
        Ok(())
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.options.get_max_nesting_depth() {
            tracing::debug!(
                depth = self.depth,
                position = self.idx,
                "json nesting depth limit reached"
            );
            return Err(self.error(ParseErrorCode::MaxNestingDepthExceeded));
        }
        self.depth += 1;
        Ok(())
    }

    /// Integers go to `Int64`/`UInt64` and overflow into `Bigint` text.
    /// Numbers with a fraction or exponent become doubles, or `Bigdec` text
    /// when the reader is lossless.
    fn parse_json_number<V: Visitor + ?Sized>(
        &mut self,
        visitor: &mut V,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        let start_idx = self.idx;
        let negative = self.check_next(b'-');
        if negative {
            self.step();
        }

        if self.check_next(b'0') {
            self.step();
            if matches!(self.buf.get(self.idx), Some(c) if c.is_ascii_digit()) {
                return Err(self.error(ParseErrorCode::InvalidNumberValue));
            }
        } else if self.step_digits() == 0 {
            return Err(self.error(ParseErrorCode::InvalidNumberValue));
        }

        let mut is_integer = true;
        if self.check_next(b'.') {
            self.step();
            if self.step_digits() == 0 {
                return Err(self.error(ParseErrorCode::InvalidNumberValue));
            }
            is_integer = false;
        }
        if self.check_next_either(b'e', b'E') {
            self.step();
            if self.check_next_either(b'+', b'-') {
                self.step();
            }
            if self.step_digits() == 0 {
                return Err(self.error(ParseErrorCode::InvalidNumberValue));
            }
            is_integer = false;
        }

        let text = std::str::from_utf8(&self.buf[start_idx..self.idx])
            .map_err(|_| self.error(ParseErrorCode::InvalidNumberValue))?;
        if is_integer {
            if negative {
                if let Ok(v) = text.parse::<i64>() {
                    return visitor.visit_int64(v, SemanticTag::None, ctx);
                }
            } else if let Ok(v) = text.parse::<u64>() {
                return visitor.visit_uint64(v, SemanticTag::None, ctx);
            }
            return visitor.visit_string(text, SemanticTag::Bigint, ctx);
        }
        if self.options.get_lossless_number() {
            return visitor.visit_string(text, SemanticTag::Bigdec, ctx);
        }
        match fast_float2::parse::<f64, _>(text) {
            Ok(v) => visitor.visit_double(v, SemanticTag::None, ctx),
            Err(_) => Err(self.error(ParseErrorCode::InvalidNumberValue)),
        }
    }

    /// Borrows the literal when it has no escapes.
    fn parse_json_string(&mut self) -> Result<Cow<'a, str>> {
        self.must_is(b'"')?;

        let start_idx = self.idx;
        let mut escapes = false;
        loop {
            match *self.next()? {
                b'\\' => {
                    escapes = true;
                    self.step();
                    self.next()?;
                }
                b'"' => {
                    self.step();
                    break;
                }
                c if c < 0x20 => {
                    return Err(self.error(ParseErrorCode::ControlCharacterWhileParsingString));
                }
                _ => {}
            }
            self.step();
        }

        let data = &self.buf[start_idx..self.idx - 1];
        if escapes {
            unescape(data)
                .map(Cow::Owned)
                .map_err(|(code, offset)| Error::Syntax(code, self.ctx_at(start_idx + offset)))
        } else {
            std::str::from_utf8(data).map(Cow::Borrowed).map_err(|e| {
                Error::Syntax(
                    ParseErrorCode::InvalidStringValue,
                    self.ctx_at(start_idx + e.valid_up_to()),
                )
            })
        }
    }

    fn parse_json_array<V: Visitor + ?Sized>(
        &mut self,
        visitor: &mut V,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.enter()?;
        self.must_is(b'[')?;
        try_visit!(visitor.visit_begin_array(None, SemanticTag::None, ctx));

        let mut first = true;
        loop {
            self.skip_whitespace();
            let c = *self.next()?;
            if c == b']' {
                break;
            }
            if !first {
                if c != b',' {
                    return Err(self.error(ParseErrorCode::ExpectedArrayCommaOrEnd));
                }
                self.step();
                self.skip_whitespace();
                if self.options.get_allow_trailing_comma() && self.check_next(b']') {
                    break;
                }
            }
            first = false;
            try_visit!(self.parse_json_value(visitor));
        }
        let end_ctx = self.ctx();
        self.step();
        self.depth -= 1;
        visitor.visit_end_array(&end_ctx)
    }

    fn parse_json_object<V: Visitor + ?Sized>(
        &mut self,
        visitor: &mut V,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.enter()?;
        self.must_is(b'{')?;
        try_visit!(visitor.visit_begin_object(None, SemanticTag::None, ctx));

        let mut first = true;
        loop {
            self.skip_whitespace();
            let c = *self.next()?;
            if c == b'}' {
                break;
            }
            if !first {
                if c != b',' {
                    return Err(self.error(ParseErrorCode::ExpectedObjectCommaOrEnd));
                }
                self.step();
                self.skip_whitespace();
                if self.options.get_allow_trailing_comma() && self.check_next(b'}') {
                    break;
                }
            }
            first = false;

            if !self.check_next(b'"') {
                return Err(match self.buf.get(self.idx) {
                    Some(_) => self.error(ParseErrorCode::KeyMustBeAString),
                    None => self.error(ParseErrorCode::InvalidEOF),
                });
            }
            let key_ctx = self.ctx();
            let key = self.parse_json_string()?;
            try_visit!(visitor.visit_key(&key, &key_ctx));

            self.skip_whitespace();
            if *self.next()? != b':' {
                return Err(self.error(ParseErrorCode::ExpectedColon));
            }
            self.step();
            try_visit!(self.parse_json_value(visitor));
        }
        let end_ctx = self.ctx();
        self.step();
        self.depth -= 1;
        visitor.visit_end_object(&end_ctx)
    }
}
