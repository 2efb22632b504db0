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

use std::fmt::Display;
use std::fmt::Formatter;

/// Refines how the underlying storage of a value should be interpreted.
///
/// A tag is orthogonal to the [`StorageKind`]: a long string tagged
/// `Base64` carries binary data as base64 text, an `Int64` tagged
/// `EpochSecond` carries a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum SemanticTag {
    #[default]
    None,
    /// The string is known to need no escaping.
    NoEsc,
    Undefined,
    Datetime,
    EpochSecond,
    EpochMilli,
    EpochNano,
    Bigint,
    Bigdec,
    Bigfloat,
    Float128,
    Base16,
    Base64,
    Base64Url,
    Uri,
    Clamped,
    MultiDimRowMajor,
    MultiDimColumnMajor,
    /// A format specific tag, the raw value travels next to it as `ext_tag`.
    Ext,
    Id,
    Regex,
    Code,
}

impl SemanticTag {
    /// Tags for strings holding numbers too large for the primitive kinds.
    pub fn is_number_tag(self) -> bool {
        matches!(
            self,
            SemanticTag::Bigint | SemanticTag::Bigdec | SemanticTag::Bigfloat | SemanticTag::Float128
        )
    }

    pub fn is_epoch_tag(self) -> bool {
        matches!(
            self,
            SemanticTag::EpochSecond | SemanticTag::EpochMilli | SemanticTag::EpochNano
        )
    }

    pub fn is_binary_text_tag(self) -> bool {
        matches!(
            self,
            SemanticTag::Base16 | SemanticTag::Base64 | SemanticTag::Base64Url
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            SemanticTag::None => "n/a",
            SemanticTag::NoEsc => "unescaped",
            SemanticTag::Undefined => "undefined",
            SemanticTag::Datetime => "datetime",
            SemanticTag::EpochSecond => "epoch-second",
            SemanticTag::EpochMilli => "epoch-milli",
            SemanticTag::EpochNano => "epoch-nano",
            SemanticTag::Bigint => "bigint",
            SemanticTag::Bigdec => "bigdec",
            SemanticTag::Bigfloat => "bigfloat",
            SemanticTag::Float128 => "float128",
            SemanticTag::Base16 => "base16",
            SemanticTag::Base64 => "base64",
            SemanticTag::Base64Url => "base64url",
            SemanticTag::Uri => "uri",
            SemanticTag::Clamped => "clamped",
            SemanticTag::MultiDimRowMajor => "multi-dim-row-major",
            SemanticTag::MultiDimColumnMajor => "multi-dim-column-major",
            SemanticTag::Ext => "ext",
            SemanticTag::Id => "id",
            SemanticTag::Regex => "regex",
            SemanticTag::Code => "code",
        }
    }
}

impl Display for SemanticTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The physical representation of a value.
///
/// Determines which arm of the storage union is active and whether the
/// value owns heap memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    Null,
    Boolean,
    Int64,
    UInt64,
    HalfFloat,
    Double,
    ShortString,
    LongString,
    ByteString,
    EmptyObject,
    Array,
    Object,
    ConstRef,
    Ref,
}

impl StorageKind {
    /// Returns `true` for kinds that own no heap memory.
    pub fn is_trivial(self) -> bool {
        !matches!(
            self,
            StorageKind::LongString
                | StorageKind::ByteString
                | StorageKind::Array
                | StorageKind::Object
        )
    }

    pub fn is_string(self) -> bool {
        matches!(self, StorageKind::ShortString | StorageKind::LongString)
    }

    pub fn is_number(self) -> bool {
        matches!(
            self,
            StorageKind::Int64 | StorageKind::UInt64 | StorageKind::HalfFloat | StorageKind::Double
        )
    }

    pub fn is_object(self) -> bool {
        matches!(self, StorageKind::EmptyObject | StorageKind::Object)
    }

    /// Rank of the kind in the total order over values.
    ///
    /// Numbers share one rank and so do strings and objects, their
    /// members are compared by value.
    pub(crate) fn rank(self) -> u8 {
        match self {
            StorageKind::Null => 0,
            StorageKind::Boolean => 1,
            StorageKind::Int64
            | StorageKind::UInt64
            | StorageKind::HalfFloat
            | StorageKind::Double => 2,
            StorageKind::ShortString | StorageKind::LongString => 3,
            StorageKind::ByteString => 4,
            StorageKind::Array => 5,
            StorageKind::EmptyObject | StorageKind::Object => 6,
            StorageKind::ConstRef | StorageKind::Ref => 7,
        }
    }
}

impl Display for StorageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StorageKind::Null => "null",
            StorageKind::Boolean => "bool",
            StorageKind::Int64 => "int64",
            StorageKind::UInt64 => "uint64",
            StorageKind::HalfFloat => "half",
            StorageKind::Double => "double",
            StorageKind::ShortString => "short_string",
            StorageKind::LongString => "long_string",
            StorageKind::ByteString => "byte_string",
            StorageKind::EmptyObject => "empty_object",
            StorageKind::Array => "array",
            StorageKind::Object => "object",
            StorageKind::ConstRef => "const_ref",
            StorageKind::Ref => "ref",
        };
        f.write_str(name)
    }
}
