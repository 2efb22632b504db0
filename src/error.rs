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

use core::fmt::Display;

use crate::visitor::SerContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorCode {
    InvalidEOF,
    InvalidNumberValue,
    InvalidStringValue,
    ExpectedSomeIdent,
    ExpectedSomeValue,
    ExpectedColon,
    ExpectedArrayCommaOrEnd,
    ExpectedObjectCommaOrEnd,
    UnexpectedTrailingCharacters,
    KeyMustBeAString,
    ControlCharacterWhileParsingString,
    InvalidEscaped(u8),
    InvalidHex(u8),
    UnexpectedEndOfHexEscape,
    MaxNestingDepthExceeded,
    UnknownType(u8),
    UnexpectedBreak,
    IllegalChunkedString,
    InvalidTypedArray,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Display for ParseErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            ParseErrorCode::InvalidEOF => f.write_str("EOF while parsing a value"),
            ParseErrorCode::InvalidNumberValue => f.write_str("invalid number"),
            ParseErrorCode::InvalidStringValue => f.write_str("invalid string"),
            ParseErrorCode::ExpectedSomeIdent => f.write_str("expected ident"),
            ParseErrorCode::ExpectedSomeValue => f.write_str("expected value"),
            ParseErrorCode::ExpectedColon => f.write_str("expected `:`"),
            ParseErrorCode::ExpectedArrayCommaOrEnd => f.write_str("expected `,` or `]`"),
            ParseErrorCode::ExpectedObjectCommaOrEnd => f.write_str("expected `,` or `}`"),
            ParseErrorCode::UnexpectedTrailingCharacters => f.write_str("trailing characters"),
            ParseErrorCode::KeyMustBeAString => f.write_str("key must be a string"),
            ParseErrorCode::ControlCharacterWhileParsingString => {
                f.write_str("control character (\\u0000-\\u001F) found while parsing a string")
            }
            ParseErrorCode::InvalidEscaped(n) => write!(f, "invalid escaped '{:X}'", n),
            ParseErrorCode::InvalidHex(n) => write!(f, "invalid hex '{:X}'", n),
            ParseErrorCode::UnexpectedEndOfHexEscape => f.write_str("unexpected end of hex escape"),
            ParseErrorCode::MaxNestingDepthExceeded => f.write_str("maximum nesting depth exceeded"),
            ParseErrorCode::UnknownType(b) => write!(f, "unknown initial byte '{:02X}'", b),
            ParseErrorCode::UnexpectedBreak => f.write_str("unexpected break"),
            ParseErrorCode::IllegalChunkedString => f.write_str("illegal chunked string"),
            ParseErrorCode::InvalidTypedArray => f.write_str("invalid typed array"),
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// An object has no member with the given key.
    KeyNotFound(String),
    /// An object operation was applied to a value of another kind.
    NotAnObject,
    /// An array operation was applied to a value of another kind.
    NotAnArray,
    IndexOutOfRange {
        index: usize,
        len: usize,
    },
    /// Mutation through a read-only back reference.
    NotMutable,
    /// The stored value cannot be represented as the requested type.
    InvalidCast(String),
    MaxNestingDepthExceeded(usize),
    /// The visitor protocol was violated, e.g. a value without a key inside an object.
    UnexpectedEvent(&'static str),
    /// No complete value is available yet.
    Incomplete,
    InvalidOptions(&'static str),
    InvalidUtf8,
    InvalidBase64,
    InvalidBase16,

    Syntax(ParseErrorCode, SerContext),
    InvalidCbor(ParseErrorCode, usize),

    Io(std::io::Error),
    Message(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::KeyNotFound(key) => write!(f, "key not found: {}", key),
            Error::NotAnObject => f.write_str("not an object"),
            Error::NotAnArray => f.write_str("not an array"),
            Error::IndexOutOfRange { index, len } => {
                write!(f, "index {} out of range for length {}", index, len)
            }
            Error::NotMutable => f.write_str("value is a read-only reference"),
            Error::InvalidCast(s) => write!(f, "invalid cast: {}", s),
            Error::MaxNestingDepthExceeded(depth) => {
                write!(f, "maximum nesting depth {} exceeded", depth)
            }
            Error::UnexpectedEvent(s) => write!(f, "unexpected event: {}", s),
            Error::Incomplete => f.write_str("incomplete value"),
            Error::InvalidOptions(s) => write!(f, "invalid options: {}", s),
            Error::InvalidUtf8 => f.write_str("invalid utf-8"),
            Error::InvalidBase64 => f.write_str("invalid base64"),
            Error::InvalidBase16 => f.write_str("invalid base16"),
            Error::Syntax(code, ctx) => {
                write!(f, "{}, line {} column {}", code, ctx.line(), ctx.column())
            }
            Error::InvalidCbor(code, pos) => write!(f, "{}, pos {}", code, pos),
            Error::Io(err) => write!(f, "{}", err),
            Error::Message(s) => f.write_str(s),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io(error)
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(_error: std::str::Utf8Error) -> Self {
        Error::InvalidUtf8
    }
}

impl From<base64::DecodeError> for Error {
    fn from(_error: base64::DecodeError) -> Self {
        Error::InvalidBase64
    }
}

impl From<nom::Err<nom::error::Error<&str>>> for Error {
    fn from(error: nom::Err<nom::error::Error<&str>>) -> Self {
        Error::InvalidCast(error.to_string())
    }
}

impl Error {
    /// Returns the position attached to a syntax error.
    pub fn context(&self) -> Option<&SerContext> {
        match self {
            Error::Syntax(_, ctx) => Some(ctx),
            _ => None,
        }
    }

    /// Whether a parser or decoder gave up because of the nesting limit.
    pub fn is_nesting_depth_exceeded(&self) -> bool {
        matches!(
            self,
            Error::MaxNestingDepthExceeded(_)
                | Error::Syntax(ParseErrorCode::MaxNestingDepthExceeded, _)
                | Error::InvalidCbor(ParseErrorCode::MaxNestingDepthExceeded, _)
        )
    }
}
