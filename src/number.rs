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

use core::fmt;
use std::cmp::Ordering;
use std::fmt::Display;
use std::fmt::Formatter;

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::bytes::complete::take_while1;
use nom::character::complete::char;
use nom::character::complete::digit1;
use nom::character::complete::hex_digit1;
use nom::character::complete::oct_digit1;
use nom::combinator::all_consuming;
use nom::combinator::map;
use nom::combinator::opt;
use nom::sequence::preceded;
use nom::IResult;
use nom::Parser;
use ordered_float::OrderedFloat;

use crate::error::Error;
use crate::error::Result;

/// A primitive number read out of a value, used to compare and convert
/// across the numeric storage kinds.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int64(i64),
    UInt64(u64),
    Float64(f64),
}

impl Number {
    /// Returns the i64 representation of the number, if possible.
    ///
    /// Floats convert only when they are integral and in range.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Int64(v) => Some(*v),
            Number::UInt64(v) => i64::try_from(*v).ok(),
            Number::Float64(v) => integral_f64(*v).and_then(num_traits::cast),
        }
    }

    /// Returns the u64 representation of the number, if possible.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Number::Int64(v) => u64::try_from(*v).ok(),
            Number::UInt64(v) => Some(*v),
            Number::Float64(v) => integral_f64(*v).and_then(num_traits::cast),
        }
    }

    /// Returns the f64 representation of the number.
    ///
    /// This method always returns a value, but may lose precision for very large numbers.
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int64(v) => *v as f64,
            Number::UInt64(v) => *v as f64,
            Number::Float64(v) => *v,
        }
    }

    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Number::Int64(v) => Some(*v as i128),
            Number::UInt64(v) => Some(*v as i128),
            Number::Float64(v) => integral_f64(*v).and_then(num_traits::cast),
        }
    }
}

fn integral_f64(v: f64) -> Option<f64> {
    if v.is_finite() && v.fract() == 0.0 {
        Some(v)
    } else {
        None
    }
}

/// Compares an integer with a float without losing precision.
///
/// NaN sorts above every integer, as `OrderedFloat` does.
fn cmp_int_float(l: i128, r: f64) -> Ordering {
    if r.is_nan() {
        return Ordering::Less;
    }
    match OrderedFloat(l as f64).cmp(&OrderedFloat(r)) {
        // rounding is monotonic, only an exact tie needs a closer look
        Ordering::Equal if r.abs() < 1.0e38 => l.cmp(&(r as i128)),
        ord => ord,
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Number::Int64(l), Number::Int64(r)) => l.cmp(r),
            (Number::UInt64(l), Number::UInt64(r)) => l.cmp(r),
            (Number::Float64(l), Number::Float64(r)) => OrderedFloat(*l).cmp(&OrderedFloat(*r)),
            (Number::Int64(l), Number::UInt64(r)) => {
                if *l < 0 {
                    Ordering::Less
                } else {
                    (*l as u64).cmp(r)
                }
            }
            (Number::UInt64(l), Number::Int64(r)) => {
                if *r < 0 {
                    Ordering::Greater
                } else {
                    l.cmp(&(*r as u64))
                }
            }
            (Number::Int64(l), Number::Float64(r)) => cmp_int_float(*l as i128, *r),
            (Number::UInt64(l), Number::Float64(r)) => cmp_int_float(*l as i128, *r),
            (Number::Float64(l), Number::Int64(r)) => cmp_int_float(*r as i128, *l).reverse(),
            (Number::Float64(l), Number::UInt64(r)) => cmp_int_float(*r as i128, *l).reverse(),
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Number::Int64(v) => {
                let mut buffer = itoa::Buffer::new();
                f.write_str(buffer.format(*v))
            }
            Number::UInt64(v) => {
                let mut buffer = itoa::Buffer::new();
                f.write_str(buffer.format(*v))
            }
            Number::Float64(v) => {
                let mut buffer = ryu::Buffer::new();
                f.write_str(buffer.format(*v))
            }
        }
    }
}

/// Decodes an IEEE 754 binary16 value.
pub fn half_to_f64(half: u16) -> f64 {
    let exp = ((half >> 10) & 0x1f) as i32;
    let mant = (half & 0x3ff) as f64;
    let val = if exp == 0 {
        mant * 2f64.powi(-24)
    } else if exp != 31 {
        (mant + 1024.0) * 2f64.powi(exp - 25)
    } else if mant == 0.0 {
        f64::INFINITY
    } else {
        f64::NAN
    };
    if half & 0x8000 != 0 {
        -val
    } else {
        val
    }
}

/// An integer literal in decimal, hexadecimal (`0x`), binary (`0b`) or
/// octal (leading `0`) notation with an optional minus sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerLiteral {
    pub negative: bool,
    pub magnitude: u128,
}

impl IntegerLiteral {
    pub fn to_i128(self) -> Option<i128> {
        if self.negative {
            if self.magnitude == i128::MIN.unsigned_abs() {
                Some(i128::MIN)
            } else {
                i128::try_from(self.magnitude).ok().map(|v| -v)
            }
        } else {
            i128::try_from(self.magnitude).ok()
        }
    }

    pub fn to_u128(self) -> Option<u128> {
        if self.negative && self.magnitude != 0 {
            None
        } else {
            Some(self.magnitude)
        }
    }

    /// Casts into any primitive integer, failing when out of range.
    pub fn cast<T: num_traits::NumCast>(self) -> Option<T> {
        if self.negative {
            self.to_i128().and_then(num_traits::cast)
        } else {
            num_traits::cast(self.magnitude)
        }
    }
}

fn radix_digits(input: &str) -> IResult<&str, (u32, &str)> {
    alt((
        map(preceded(alt((tag("0x"), tag("0X"))), hex_digit1), |d| (16, d)),
        map(
            preceded(
                alt((tag("0b"), tag("0B"))),
                take_while1(|c: char| c == '0' || c == '1'),
            ),
            |d| (2, d),
        ),
        map(preceded(char('0'), oct_digit1), |d| (8, d)),
        map(digit1, |d| (10, d)),
    ))
    .parse(input)
}

fn integer_literal(input: &str) -> IResult<&str, (bool, (u32, &str))> {
    (map(opt(char('-')), |s| s.is_some()), radix_digits).parse(input)
}

/// Parses a whole string as an integer literal.
pub fn parse_integer_literal(input: &str) -> Result<IntegerLiteral> {
    let (_, (negative, (radix, digits))) = all_consuming(integer_literal).parse(input)?;
    let magnitude = u128::from_str_radix(digits, radix)
        .map_err(|_| Error::InvalidCast(format!("integer literal overflow: {input}")))?;
    Ok(IntegerLiteral {
        negative,
        magnitude,
    })
}

/// Parses decimal number text, as carried by `Bigint` and `Bigdec` strings.
pub fn parse_decimal_f64(input: &str) -> Result<f64> {
    fast_float2::parse(input)
        .map_err(|_| Error::InvalidCast(format!("not a decimal number: {input}")))
}

/// Returns `true` for decimal integer text without any prefix, the form
/// of a `Bigint` string.
pub fn is_decimal_integer(input: &str) -> bool {
    let digits = input.strip_prefix('-').unwrap_or(input);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Decimal text of a big-endian bignum magnitude `n`, `-1 - n` when
/// `negative` as in CBOR tag 3.
pub fn bignum_to_decimal(magnitude: &[u8], negative: bool) -> String {
    let mut bytes: Vec<u8> = magnitude.iter().copied().skip_while(|b| *b == 0).collect();
    if negative {
        increment_be(&mut bytes);
    }
    let mut digits = Vec::new();
    while !bytes.is_empty() {
        let mut rem = 0u32;
        let mut quotient = Vec::with_capacity(bytes.len());
        for b in &bytes {
            let acc = (rem << 8) | *b as u32;
            let q = acc / 10;
            rem = acc % 10;
            if !quotient.is_empty() || q != 0 {
                quotient.push(q as u8);
            }
        }
        digits.push(b'0' + rem as u8);
        bytes = quotient;
    }
    if digits.is_empty() {
        digits.push(b'0');
    }
    if negative {
        digits.push(b'-');
    }
    digits.iter().rev().map(|d| *d as char).collect()
}

/// Splits decimal integer text into the sign and the big-endian bignum
/// magnitude CBOR stores, which is `-1 - n` for negative numbers.
pub fn decimal_to_bignum(text: &str) -> Option<(bool, Vec<u8>)> {
    if !is_decimal_integer(text) {
        return None;
    }
    let (negative, digits) = match text.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, text),
    };
    let mut bytes: Vec<u8> = Vec::new();
    for d in digits.bytes() {
        let mut carry = (d - b'0') as u32;
        for b in bytes.iter_mut().rev() {
            let acc = *b as u32 * 10 + carry;
            *b = (acc & 0xff) as u8;
            carry = acc >> 8;
        }
        while carry > 0 {
            bytes.insert(0, (carry & 0xff) as u8);
            carry >>= 8;
        }
    }
    let zero = bytes.iter().all(|b| *b == 0);
    let negative = negative && !zero;
    if negative {
        decrement_be(&mut bytes);
    }
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    Some((negative, bytes.split_off(start)))
}

fn increment_be(bytes: &mut Vec<u8>) {
    for b in bytes.iter_mut().rev() {
        if *b == 0xff {
            *b = 0;
        } else {
            *b += 1;
            return;
        }
    }
    bytes.insert(0, 1);
}

fn decrement_be(bytes: &mut [u8]) {
    for b in bytes.iter_mut().rev() {
        if *b == 0 {
            *b = 0xff;
        } else {
            *b -= 1;
            return;
        }
    }
}

/// Splits decimal number text into an integer mantissa and a base 10
/// exponent, `"123.45e1"` becomes `("12345", -1)`.
pub fn split_decimal(text: &str) -> Option<(String, i64)> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (number, exponent) = match rest.find(['e', 'E']) {
        Some(pos) => (&rest[..pos], rest[pos + 1..].parse::<i64>().ok()?),
        None => (rest, 0),
    };
    let (int_part, frac_part) = match number.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (number, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits = format!("{int_part}{frac_part}");
    let digits = digits.trim_start_matches('0');
    let mut mantissa = String::with_capacity(digits.len() + 1);
    if digits.is_empty() {
        mantissa.push('0');
    } else {
        if negative {
            mantissa.push('-');
        }
        mantissa.push_str(digits);
    }
    Some((mantissa, exponent.checked_sub(frac_part.len() as i64)?))
}

/// Longest run of zeros written between the point and the digits before
/// switching to exponent notation.
const MAX_FRACTION_ZEROS: usize = 32;

/// Formats a decimal fraction `mantissa * 10^exponent` as decimal text.
pub fn format_decimal(mantissa: &str, exponent: i64) -> String {
    let (sign, digits) = match mantissa.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", mantissa),
    };
    if exponent > 0 {
        return format!("{sign}{digits}e{exponent}");
    }
    let scale = exponent.unsigned_abs();
    if scale == 0 {
        format!("{sign}{digits}")
    } else if (digits.len() as u64) > scale {
        let (int_part, frac_part) = digits.split_at(digits.len() - scale as usize);
        format!("{sign}{int_part}.{frac_part}")
    } else if scale - (digits.len() as u64) <= MAX_FRACTION_ZEROS as u64 {
        let zeros = scale as usize - digits.len();
        format!("{sign}0.{}{digits}", "0".repeat(zeros))
    } else {
        format!("{sign}{digits}e{exponent}")
    }
}
