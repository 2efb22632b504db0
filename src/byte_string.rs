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
use std::fmt::Display;
use std::fmt::Formatter;
use std::ops::Deref;

use base64::engine::general_purpose::STANDARD;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::Error;
use crate::error::Result;
use crate::tag::SemanticTag;

/// An owned sequence of bytes, the payload of a byte string value.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteString {
    data: Vec<u8>,
}

impl ByteString {
    pub fn new(data: Vec<u8>) -> ByteString {
        Self { data }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Decodes text produced by [`encode_bytes`] for the given tag.
    ///
    /// Untagged text is read as base64url, the default text form of a
    /// byte string.
    pub fn from_text(s: &str, tag: SemanticTag) -> Result<ByteString> {
        decode_bytes(s, tag).map(ByteString::new)
    }
}

impl Deref for ByteString {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl From<&[u8]> for ByteString {
    fn from(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }
}

impl Debug for ByteString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "b\"")?;
        for b in &self.data {
            write!(f, "\\x{b:02x}")?;
        }
        write!(f, "\"")
    }
}

impl Display for ByteString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&encode_base64url(&self.data))
    }
}

pub fn encode_base16(data: &[u8]) -> String {
    let mut s = String::with_capacity(data.len() * 2);
    for c in data {
        s.push_str(&format!("{c:02X}"));
    }
    s
}

pub fn decode_base16(s: &str) -> Result<Vec<u8>> {
    let bytes = s.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(Error::InvalidBase16);
    }
    let mut buf = Vec::with_capacity(bytes.len() / 2);
    for pair in bytes.chunks(2) {
        let hi = hex_value(pair[0]).ok_or(Error::InvalidBase16)?;
        let lo = hex_value(pair[1]).ok_or(Error::InvalidBase16)?;
        buf.push((hi << 4) | lo);
    }
    Ok(buf)
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn encode_base64url(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

pub fn decode_base64(s: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(s)?)
}

pub fn decode_base64url(s: &str) -> Result<Vec<u8>> {
    // padding is optional in base64url text
    Ok(URL_SAFE_NO_PAD.decode(s.trim_end_matches('='))?)
}

/// Encodes bytes into the text form selected by `tag`.
pub fn encode_bytes(data: &[u8], tag: SemanticTag) -> String {
    match tag {
        SemanticTag::Base16 => encode_base16(data),
        SemanticTag::Base64 => encode_base64(data),
        _ => encode_base64url(data),
    }
}

pub fn decode_bytes(s: &str, tag: SemanticTag) -> Result<Vec<u8>> {
    match tag {
        SemanticTag::Base16 => decode_base16(s),
        SemanticTag::Base64 => decode_base64(s),
        _ => decode_base64url(s),
    }
}
