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

//! Decoding of escape sequences inside JSON string literals.

use crate::constants::*;
use crate::error::ParseErrorCode;

#[allow(clippy::zero_prefixed_literal)]
static HEX: [u8; 256] = {
    const __: u8 = 255; // not a hex digit
    [
        //   1   2   3   4   5   6   7   8   9   A   B   C   D   E   F
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 0
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 1
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 2
        00, 01, 02, 03, 04, 05, 06, 07, 08, 09, __, __, __, __, __, __, // 3
        __, 10, 11, 12, 13, 14, 15, __, __, __, __, __, __, __, __, __, // 4
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 5
        __, 10, 11, 12, 13, 14, 15, __, __, __, __, __, __, __, __, __, // 6
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 7
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 8
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 9
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // A
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // B
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // C
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // D
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // E
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // F
    ]
};

/// A syntax error inside a string literal and its offset from the start
/// of the literal's content.
pub(crate) type UnescapeError = (ParseErrorCode, usize);

/// Reads the content of a string literal, between its quotes.
struct Unescaper<'a> {
    data: &'a [u8],
    idx: usize,
    out: String,
}

/// Decodes the escape sequences in `data`, the bytes between the quotes of
/// a JSON string literal.
///
/// Unpaired surrogates are kept as their literal `\uXXXX` text.
pub(crate) fn unescape(data: &[u8]) -> Result<String, UnescapeError> {
    let mut unescaper = Unescaper {
        data,
        idx: 0,
        out: String::with_capacity(data.len()),
    };
    unescaper.run()?;
    Ok(unescaper.out)
}

impl Unescaper<'_> {
    fn run(&mut self) -> Result<(), UnescapeError> {
        let mut run_start = 0;
        while self.idx < self.data.len() {
            if self.data[self.idx] != b'\\' {
                self.idx += 1;
                continue;
            }
            self.push_run(run_start, self.idx)?;
            self.idx += 1;
            self.escape()?;
            run_start = self.idx;
        }
        self.push_run(run_start, self.idx)
    }

    fn push_run(&mut self, start: usize, end: usize) -> Result<(), UnescapeError> {
        if start < end {
            let run = std::str::from_utf8(&self.data[start..end])
                .map_err(|e| (ParseErrorCode::InvalidStringValue, start + e.valid_up_to()))?;
            self.out.push_str(run);
        }
        Ok(())
    }

    fn escape(&mut self) -> Result<(), UnescapeError> {
        let Some(byte) = self.data.get(self.idx).copied() else {
            return Err((ParseErrorCode::UnexpectedEndOfHexEscape, self.idx));
        };
        self.idx += 1;
        let c = match byte {
            b'\\' => BS,
            b'"' => QU,
            b'/' => SD,
            b'b' => BB,
            b'f' => FF,
            b'n' => NN,
            b'r' => RR,
            b't' => TT,
            b'u' => return self.unicode_escape(),
            other => return Err((ParseErrorCode::InvalidEscaped(other), self.idx - 1)),
        };
        self.out.push(c);
        Ok(())
    }

    fn unicode_escape(&mut self) -> Result<(), UnescapeError> {
        let digits = self.hex_digits()?;
        let n1 = self.decode_hex(&digits)?;
        match n1 {
            // low surrogate without a preceding high surrogate
            0xDC00..=0xDFFF => self.push_literal(&digits),
            0xD800..=0xDBFF => {
                if !self.data[self.idx..].starts_with(b"\\u") {
                    self.push_literal(&digits);
                    return Ok(());
                }
                let next = self.idx;
                self.idx += 2;
                let low_digits = self.hex_digits()?;
                let n2 = self.decode_hex(&low_digits)?;
                if !(0xDC00..=0xDFFF).contains(&n2) {
                    // the next escape stands on its own
                    self.push_literal(&digits);
                    self.idx = next;
                    return Ok(());
                }
                let n = ((((n1 - 0xD800) as u32) << 10) | (n2 - 0xDC00) as u32) + 0x1_0000;
                match char::from_u32(n) {
                    Some(c) => self.out.push(c),
                    None => {
                        self.push_literal(&digits);
                        self.push_literal(&low_digits);
                    }
                }
            }
            n => match char::from_u32(n as u32) {
                Some(c) => self.out.push(c),
                None => self.push_literal(&digits),
            },
        }
        Ok(())
    }

    /// Reads the four digits of `\uXXXX` or `\u{XXXX}`.
    fn hex_digits(&mut self) -> Result<[u8; UNICODE_LEN], UnescapeError> {
        let rest = &self.data[self.idx..];
        let mut digits = [0u8; UNICODE_LEN];
        if rest.first() == Some(&b'{') {
            if rest.len() < UNICODE_LEN + 2 || rest[UNICODE_LEN + 1] != b'}' {
                return Err((ParseErrorCode::UnexpectedEndOfHexEscape, self.idx));
            }
            digits.copy_from_slice(&rest[1..UNICODE_LEN + 1]);
            self.idx += UNICODE_LEN + 2;
        } else {
            if rest.len() < UNICODE_LEN {
                return Err((ParseErrorCode::UnexpectedEndOfHexEscape, self.idx));
            }
            digits.copy_from_slice(&rest[..UNICODE_LEN]);
            self.idx += UNICODE_LEN;
        }
        Ok(digits)
    }

    fn decode_hex(&self, digits: &[u8]) -> Result<u16, UnescapeError> {
        let mut n = 0u16;
        for digit in digits {
            match HEX[*digit as usize] {
                255 => return Err((ParseErrorCode::InvalidHex(*digit), self.idx)),
                hex => n = (n << 4) + hex as u16,
            }
        }
        Ok(n)
    }

    // RFC 8259 section 8.2 lets strings carry unpaired surrogates
    fn push_literal(&mut self, digits: &[u8]) {
        self.out.push_str("\\u");
        for d in digits {
            self.out.push(*d as char);
        }
    }
}
