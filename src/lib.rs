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

//! `jsonmodel` is a tagged JSON document model with a streaming event protocol, shared by a `JSON` text codec and a `CBOR` binary codec.
//!
//! ## Features
//!
//! - Tagged values: every [`Value`] carries a [`SemanticTag`] (date-time, epoch time, big integer, big decimal, base64 bytes, ...) that survives a round trip through formats which can express it.
//! - Compact storage: short strings are stored inline without a heap allocation, empty objects need no object storage, and values can hold non-owning references to other values.
//! - Streaming: parsers and encoders meet at the [`Visitor`] trait. A parser drives any visitor, a value is dumped into any visitor, and filters such as [`RenameKeyFilter`] sit in between.
//! - Zero-copy reads: [`CborView`] navigates an encoded `CBOR` buffer without building a tree.
//!
//! ## Event protocol
//!
//! Every event takes a [`SerContext`] with the position in the input and returns a [`VisitFlow`]. Returning `Stop` ends the traversal at once, open containers are not closed. Object members are a `visit_key` followed by exactly one value.
//!
//! #### An example
//!
//! ```text
//! // JSON text
//! {"id": 1, "tags": ["a"]}
//!
//! // events
//! begin_object(Some(2), None)
//! key("id")        uint64(1, None)
//! key("tags")      begin_array(Some(1), None)
//!                  string("a", None)
//!                  end_array
//! end_object
//! flush
//! ```

#![allow(clippy::uninlined_format_args)]

mod byte_string;
mod constants;
mod convert;
mod decoder;
mod dump;
mod error;
mod filter;
mod from;
mod number;
mod object;
mod storage;
mod tag;
mod value;
mod visitor;

pub mod cbor;
pub mod json;

pub use byte_string::ByteString;
pub use cbor::CborView;
pub use constants::DEFAULT_MAX_NESTING_DEPTH;
pub use convert::JsonTypeTraits;
pub use decoder::DecodeOptions;
pub use decoder::ValueDecoder;
pub use error::Error;
pub use error::ParseErrorCode;
pub use error::Result;
pub use filter::FragmentFilter;
pub use filter::RenameKeyFilter;
pub use number::Number;
pub use object::KeyOrder;
pub use object::KeyValue;
pub use object::Object;
pub use storage::SHORT_STRING_CAPACITY;
pub use tag::SemanticTag;
pub use tag::StorageKind;
pub use value::Value;
pub use visitor::Event;
pub use visitor::EventCollector;
pub use visitor::SerContext;
pub use visitor::TypedArray;
pub use visitor::VisitFlow;
pub use visitor::Visitor;
