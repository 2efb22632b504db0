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

//! The streaming event protocol shared by every parser, encoder, decoder
//! and filter.
//!
//! A parser drives a [`Visitor`] with one call per event. Container events
//! always come in nested begin/end pairs, and inside an object every value
//! event is preceded by exactly one `visit_key`. Every call returns a
//! [`VisitFlow`]: a sink returns [`VisitFlow::Stop`] to make the driver
//! cease delivery at once, without closing containers that are still open.

use crate::error::Result;
use crate::number::half_to_f64;
use crate::tag::SemanticTag;

/// Returns early with `Stop` when a visitor call asks to stop.
macro_rules! try_visit {
    ($e:expr) => {
        if $e? == $crate::visitor::VisitFlow::Stop {
            return Ok($crate::visitor::VisitFlow::Stop);
        }
    };
}

pub(crate) use try_visit;

/// Position of the event being delivered.
///
/// Text formats report a 1-based line and column, binary formats report
/// `0` for both. `position` is the byte offset in the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerContext {
    line: usize,
    column: usize,
    position: usize,
}

impl SerContext {
    pub fn new(line: usize, column: usize, position: usize) -> SerContext {
        Self {
            line,
            column,
            position,
        }
    }

    pub fn at_position(position: usize) -> SerContext {
        Self {
            line: 0,
            column: 0,
            position,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

/// Whether the driver should keep delivering events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitFlow {
    Continue,
    Stop,
}

/// A homogeneous numeric array delivered in one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypedArray<'b> {
    U8(&'b [u8]),
    U16(&'b [u16]),
    U32(&'b [u32]),
    U64(&'b [u64]),
    I8(&'b [i8]),
    I16(&'b [i16]),
    I32(&'b [i32]),
    I64(&'b [i64]),
    /// IEEE 754 binary16 values as raw bits.
    Half(&'b [u16]),
    F32(&'b [f32]),
    F64(&'b [f64]),
}

impl TypedArray<'_> {
    pub fn len(&self) -> usize {
        match self {
            TypedArray::U8(s) => s.len(),
            TypedArray::U16(s) | TypedArray::Half(s) => s.len(),
            TypedArray::U32(s) => s.len(),
            TypedArray::U64(s) => s.len(),
            TypedArray::I8(s) => s.len(),
            TypedArray::I16(s) => s.len(),
            TypedArray::I32(s) => s.len(),
            TypedArray::I64(s) => s.len(),
            TypedArray::F32(s) => s.len(),
            TypedArray::F64(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The sink side of the event protocol.
///
/// Parsers call into it and encoders, the value decoder and filters
/// implement it. The defaults of `visit_half`, `visit_typed_array` and the
/// multi-dimensional events lower the event into the basic vocabulary.
pub trait Visitor {
    fn visit_begin_object(
        &mut self,
        size_hint: Option<usize>,
        tag: SemanticTag,
        ctx: &SerContext,
    ) -> Result<VisitFlow>;

    fn visit_end_object(&mut self, ctx: &SerContext) -> Result<VisitFlow>;

    fn visit_begin_array(
        &mut self,
        size_hint: Option<usize>,
        tag: SemanticTag,
        ctx: &SerContext,
    ) -> Result<VisitFlow>;

    fn visit_end_array(&mut self, ctx: &SerContext) -> Result<VisitFlow>;

    fn visit_key(&mut self, key: &str, ctx: &SerContext) -> Result<VisitFlow>;

    fn visit_null(&mut self, tag: SemanticTag, ctx: &SerContext) -> Result<VisitFlow>;

    fn visit_bool(&mut self, value: bool, tag: SemanticTag, ctx: &SerContext) -> Result<VisitFlow>;

    fn visit_string(&mut self, value: &str, tag: SemanticTag, ctx: &SerContext)
        -> Result<VisitFlow>;

    /// `ext_tag` carries the raw format tag when `tag` is [`SemanticTag::Ext`].
    fn visit_byte_string(
        &mut self,
        value: &[u8],
        tag: SemanticTag,
        ext_tag: u64,
        ctx: &SerContext,
    ) -> Result<VisitFlow>;

    fn visit_int64(&mut self, value: i64, tag: SemanticTag, ctx: &SerContext) -> Result<VisitFlow>;

    fn visit_uint64(&mut self, value: u64, tag: SemanticTag, ctx: &SerContext)
        -> Result<VisitFlow>;

    fn visit_half(&mut self, value: u16, tag: SemanticTag, ctx: &SerContext) -> Result<VisitFlow> {
        self.visit_double(half_to_f64(value), tag, ctx)
    }

    fn visit_double(&mut self, value: f64, tag: SemanticTag, ctx: &SerContext)
        -> Result<VisitFlow>;

    fn visit_typed_array(
        &mut self,
        data: TypedArray<'_>,
        tag: SemanticTag,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        let none = SemanticTag::None;
        try_visit!(self.visit_begin_array(Some(data.len()), tag, ctx));
        match data {
            TypedArray::U8(s) => {
                for v in s {
                    try_visit!(self.visit_uint64(*v as u64, none, ctx));
                }
            }
            TypedArray::U16(s) => {
                for v in s {
                    try_visit!(self.visit_uint64(*v as u64, none, ctx));
                }
            }
            TypedArray::U32(s) => {
                for v in s {
                    try_visit!(self.visit_uint64(*v as u64, none, ctx));
                }
            }
            TypedArray::U64(s) => {
                for v in s {
                    try_visit!(self.visit_uint64(*v, none, ctx));
                }
            }
            TypedArray::I8(s) => {
                for v in s {
                    try_visit!(self.visit_int64(*v as i64, none, ctx));
                }
            }
            TypedArray::I16(s) => {
                for v in s {
                    try_visit!(self.visit_int64(*v as i64, none, ctx));
                }
            }
            TypedArray::I32(s) => {
                for v in s {
                    try_visit!(self.visit_int64(*v as i64, none, ctx));
                }
            }
            TypedArray::I64(s) => {
                for v in s {
                    try_visit!(self.visit_int64(*v, none, ctx));
                }
            }
            TypedArray::Half(s) => {
                for v in s {
                    try_visit!(self.visit_half(*v, none, ctx));
                }
            }
            TypedArray::F32(s) => {
                for v in s {
                    try_visit!(self.visit_double(*v as f64, none, ctx));
                }
            }
            TypedArray::F64(s) => {
                for v in s {
                    try_visit!(self.visit_double(*v, none, ctx));
                }
            }
        }
        self.visit_end_array(ctx)
    }

    /// Opens a multi-dimensional array: `[shape, data]` where `data` follows
    /// as the next event.
    fn visit_begin_multi_dim(
        &mut self,
        shape: &[usize],
        tag: SemanticTag,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        try_visit!(self.visit_begin_array(Some(2), tag, ctx));
        try_visit!(self.visit_begin_array(Some(shape.len()), SemanticTag::None, ctx));
        for dim in shape {
            try_visit!(self.visit_uint64(*dim as u64, SemanticTag::None, ctx));
        }
        self.visit_end_array(ctx)
    }

    fn visit_end_multi_dim(&mut self, ctx: &SerContext) -> Result<VisitFlow> {
        self.visit_end_array(ctx)
    }

    /// Called once a complete top-level value has been delivered.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<V: Visitor + ?Sized> Visitor for &mut V {
    fn visit_begin_object(
        &mut self,
        size_hint: Option<usize>,
        tag: SemanticTag,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        (**self).visit_begin_object(size_hint, tag, ctx)
    }

    fn visit_end_object(&mut self, ctx: &SerContext) -> Result<VisitFlow> {
        (**self).visit_end_object(ctx)
    }

    fn visit_begin_array(
        &mut self,
        size_hint: Option<usize>,
        tag: SemanticTag,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        (**self).visit_begin_array(size_hint, tag, ctx)
    }

    fn visit_end_array(&mut self, ctx: &SerContext) -> Result<VisitFlow> {
        (**self).visit_end_array(ctx)
    }

    fn visit_key(&mut self, key: &str, ctx: &SerContext) -> Result<VisitFlow> {
        (**self).visit_key(key, ctx)
    }

    fn visit_null(&mut self, tag: SemanticTag, ctx: &SerContext) -> Result<VisitFlow> {
        (**self).visit_null(tag, ctx)
    }

    fn visit_bool(&mut self, value: bool, tag: SemanticTag, ctx: &SerContext) -> Result<VisitFlow> {
        (**self).visit_bool(value, tag, ctx)
    }

    fn visit_string(
        &mut self,
        value: &str,
        tag: SemanticTag,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        (**self).visit_string(value, tag, ctx)
    }

    fn visit_byte_string(
        &mut self,
        value: &[u8],
        tag: SemanticTag,
        ext_tag: u64,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        (**self).visit_byte_string(value, tag, ext_tag, ctx)
    }

    fn visit_int64(&mut self, value: i64, tag: SemanticTag, ctx: &SerContext) -> Result<VisitFlow> {
        (**self).visit_int64(value, tag, ctx)
    }

    fn visit_uint64(
        &mut self,
        value: u64,
        tag: SemanticTag,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        (**self).visit_uint64(value, tag, ctx)
    }

    fn visit_half(&mut self, value: u16, tag: SemanticTag, ctx: &SerContext) -> Result<VisitFlow> {
        (**self).visit_half(value, tag, ctx)
    }

    fn visit_double(
        &mut self,
        value: f64,
        tag: SemanticTag,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        (**self).visit_double(value, tag, ctx)
    }

    fn visit_typed_array(
        &mut self,
        data: TypedArray<'_>,
        tag: SemanticTag,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        (**self).visit_typed_array(data, tag, ctx)
    }

    fn visit_begin_multi_dim(
        &mut self,
        shape: &[usize],
        tag: SemanticTag,
        ctx: &SerContext,
    ) -> Result<VisitFlow> {
        (**self).visit_begin_multi_dim(shape, tag, ctx)
    }

    fn visit_end_multi_dim(&mut self, ctx: &SerContext) -> Result<VisitFlow> {
        (**self).visit_end_multi_dim(ctx)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// An owned copy of a single event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    BeginObject(Option<usize>, SemanticTag),
    EndObject,
    BeginArray(Option<usize>, SemanticTag),
    EndArray,
    Key(String),
    Null(SemanticTag),
    Bool(bool, SemanticTag),
    String(String, SemanticTag),
    ByteString(Vec<u8>, SemanticTag, u64),
    Int64(i64, SemanticTag),
    UInt64(u64, SemanticTag),
    Half(u16, SemanticTag),
    Double(f64, SemanticTag),
}

impl Event {
    /// Delivers this event to `visitor`.
    pub fn send<V: Visitor + ?Sized>(&self, visitor: &mut V, ctx: &SerContext) -> Result<VisitFlow> {
        match self {
            Event::BeginObject(hint, tag) => visitor.visit_begin_object(*hint, *tag, ctx),
            Event::EndObject => visitor.visit_end_object(ctx),
            Event::BeginArray(hint, tag) => visitor.visit_begin_array(*hint, *tag, ctx),
            Event::EndArray => visitor.visit_end_array(ctx),
            Event::Key(key) => visitor.visit_key(key, ctx),
            Event::Null(tag) => visitor.visit_null(*tag, ctx),
            Event::Bool(v, tag) => visitor.visit_bool(*v, *tag, ctx),
            Event::String(v, tag) => visitor.visit_string(v, *tag, ctx),
            Event::ByteString(v, tag, ext) => visitor.visit_byte_string(v, *tag, *ext, ctx),
            Event::Int64(v, tag) => visitor.visit_int64(*v, *tag, ctx),
            Event::UInt64(v, tag) => visitor.visit_uint64(*v, *tag, ctx),
            Event::Half(v, tag) => visitor.visit_half(*v, *tag, ctx),
            Event::Double(v, tag) => visitor.visit_double(*v, *tag, ctx),
        }
    }
}

/// A visitor that records every event it receives.
///
/// With a limit it answers `Stop` once that many events were recorded,
/// which makes it useful to observe early termination.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<Event>,
    limit: Option<usize>,
    flushed: bool,
}

impl EventCollector {
    pub fn new() -> EventCollector {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> EventCollector {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn is_flushed(&self) -> bool {
        self.flushed
    }

    /// Sends the recorded events to another visitor.
    pub fn replay<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<VisitFlow> {
        let ctx = SerContext::default();
        for event in &self.events {
            try_visit!(event.send(visitor, &ctx));
        }
        Ok(VisitFlow::Continue)
    }

    fn push(&mut self, event: Event) -> Result<VisitFlow> {
        self.events.push(event);
        match self.limit {
            Some(limit) if self.events.len() >= limit => Ok(VisitFlow::Stop),
            _ => Ok(VisitFlow::Continue),
        }
    }
}

impl Visitor for EventCollector {
    fn visit_begin_object(
        &mut self,
        size_hint: Option<usize>,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.push(Event::BeginObject(size_hint, tag))
    }

    fn visit_end_object(&mut self, _ctx: &SerContext) -> Result<VisitFlow> {
        self.push(Event::EndObject)
    }

    fn visit_begin_array(
        &mut self,
        size_hint: Option<usize>,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.push(Event::BeginArray(size_hint, tag))
    }

    fn visit_end_array(&mut self, _ctx: &SerContext) -> Result<VisitFlow> {
        self.push(Event::EndArray)
    }

    fn visit_key(&mut self, key: &str, _ctx: &SerContext) -> Result<VisitFlow> {
        self.push(Event::Key(key.to_string()))
    }

    fn visit_null(&mut self, tag: SemanticTag, _ctx: &SerContext) -> Result<VisitFlow> {
        self.push(Event::Null(tag))
    }

    fn visit_bool(&mut self, value: bool, tag: SemanticTag, _ctx: &SerContext) -> Result<VisitFlow> {
        self.push(Event::Bool(value, tag))
    }

    fn visit_string(
        &mut self,
        value: &str,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.push(Event::String(value.to_string(), tag))
    }

    fn visit_byte_string(
        &mut self,
        value: &[u8],
        tag: SemanticTag,
        ext_tag: u64,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.push(Event::ByteString(value.to_vec(), tag, ext_tag))
    }

    fn visit_int64(&mut self, value: i64, tag: SemanticTag, _ctx: &SerContext) -> Result<VisitFlow> {
        self.push(Event::Int64(value, tag))
    }

    fn visit_uint64(
        &mut self,
        value: u64,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.push(Event::UInt64(value, tag))
    }

    fn visit_half(&mut self, value: u16, tag: SemanticTag, _ctx: &SerContext) -> Result<VisitFlow> {
        self.push(Event::Half(value, tag))
    }

    fn visit_double(
        &mut self,
        value: f64,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.push(Event::Double(value, tag))
    }

    fn flush(&mut self) -> Result<()> {
        self.flushed = true;
        Ok(())
    }
}
