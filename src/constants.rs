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

/// Open containers allowed by default while parsing or decoding.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 1024;

// JSON text constants
pub(crate) const UNICODE_LEN: usize = 4;

// JSON text escape characters constants
pub(crate) const BS: char = '\x5C'; // \\ Backslash
pub(crate) const QU: char = '\x22'; // \" Double quotation mark
pub(crate) const SD: char = '\x2F'; // \/ Slash or divide
pub(crate) const BB: char = '\x08'; // \b Backspace
pub(crate) const FF: char = '\x0C'; // \f Formfeed Page Break
pub(crate) const NN: char = '\x0A'; // \n Newline
pub(crate) const RR: char = '\x0D'; // \r Carriage Return
pub(crate) const TT: char = '\x09'; // \t Horizontal Tab

// CBOR major types
pub(crate) const MAJOR_UNSIGNED: u8 = 0;
pub(crate) const MAJOR_NEGATIVE: u8 = 1;
pub(crate) const MAJOR_BYTES: u8 = 2;
pub(crate) const MAJOR_TEXT: u8 = 3;
pub(crate) const MAJOR_ARRAY: u8 = 4;
pub(crate) const MAJOR_MAP: u8 = 5;
pub(crate) const MAJOR_TAG: u8 = 6;

// CBOR additional information
pub(crate) const INFO_U8: u8 = 24;
pub(crate) const INFO_U16: u8 = 25;
pub(crate) const INFO_U32: u8 = 26;
pub(crate) const INFO_U64: u8 = 27;
pub(crate) const INFO_INDEFINITE: u8 = 31;

// CBOR simple values and floats
pub(crate) const CBOR_FALSE: u8 = 0xf4;
pub(crate) const CBOR_TRUE: u8 = 0xf5;
pub(crate) const CBOR_NULL: u8 = 0xf6;
pub(crate) const CBOR_UNDEFINED: u8 = 0xf7;
pub(crate) const CBOR_HALF: u8 = 0xf9;
pub(crate) const CBOR_SINGLE: u8 = 0xfa;
pub(crate) const CBOR_DOUBLE: u8 = 0xfb;
pub(crate) const CBOR_BREAK: u8 = 0xff;

// CBOR tags
pub(crate) const TAG_DATETIME: u64 = 0;
pub(crate) const TAG_EPOCH: u64 = 1;
pub(crate) const TAG_POSITIVE_BIGNUM: u64 = 2;
pub(crate) const TAG_NEGATIVE_BIGNUM: u64 = 3;
pub(crate) const TAG_DECIMAL_FRACTION: u64 = 4;
pub(crate) const TAG_BIGFLOAT: u64 = 5;
pub(crate) const TAG_EXPECT_BASE64URL: u64 = 21;
pub(crate) const TAG_EXPECT_BASE64: u64 = 22;
pub(crate) const TAG_EXPECT_BASE16: u64 = 23;
pub(crate) const TAG_URI: u64 = 32;
pub(crate) const TAG_BASE64URL: u64 = 33;
pub(crate) const TAG_BASE64: u64 = 34;
pub(crate) const TAG_MULTI_DIM_ROW_MAJOR: u64 = 40;
pub(crate) const TAG_MULTI_DIM_COLUMN_MAJOR: u64 = 1040;
pub(crate) const TAG_SELF_DESCRIBE: u64 = 55799;

// RFC 8746 typed arrays, tag layout 0b010_f_s_e_ll
pub(crate) const TAG_TYPED_ARRAY_FIRST: u64 = 64;
pub(crate) const TAG_TYPED_ARRAY_LAST: u64 = 87;
pub(crate) const TAG_UINT8_ARRAY: u64 = 64;
pub(crate) const TAG_UINT16_BE_ARRAY: u64 = 65;
pub(crate) const TAG_UINT32_BE_ARRAY: u64 = 66;
pub(crate) const TAG_UINT64_BE_ARRAY: u64 = 67;
pub(crate) const TAG_UINT8_CLAMPED_ARRAY: u64 = 68;
pub(crate) const TAG_SINT8_ARRAY: u64 = 72;
pub(crate) const TAG_SINT16_BE_ARRAY: u64 = 73;
pub(crate) const TAG_SINT32_BE_ARRAY: u64 = 74;
pub(crate) const TAG_SINT64_BE_ARRAY: u64 = 75;
pub(crate) const TAG_FLOAT16_BE_ARRAY: u64 = 80;
pub(crate) const TAG_FLOAT32_BE_ARRAY: u64 = 81;
pub(crate) const TAG_FLOAT64_BE_ARRAY: u64 = 82;
