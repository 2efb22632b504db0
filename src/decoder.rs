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

use crate::constants::DEFAULT_MAX_NESTING_DEPTH;
use crate::error::Error;
use crate::error::Result;
use crate::object::KeyOrder;
use crate::object::KeyValue;
use crate::object::Object;
use crate::storage::Storage;
use crate::tag::SemanticTag;
use crate::value::Value;
use crate::visitor::SerContext;
use crate::visitor::VisitFlow;
use crate::visitor::Visitor;

/// Settings of a [`ValueDecoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    max_nesting_depth: usize,
    key_order: KeyOrder,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            key_order: KeyOrder::Sorted,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of containers open at the same time.
    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Key order policy of every decoded object.
    pub fn key_order(mut self, order: KeyOrder) -> Self {
        self.key_order = order;
        self
    }

    pub fn get_max_nesting_depth(&self) -> usize {
        self.max_nesting_depth
    }

    pub fn get_key_order(&self) -> KeyOrder {
        self.key_order
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StructureKind {
    Array,
    Object,
}

/// An open container: where its items start on the item stack.
#[derive(Debug)]
struct Structure {
    kind: StructureKind,
    offset: usize,
    tag: SemanticTag,
}

#[derive(Debug)]
struct Item {
    key: Option<String>,
    value: Value<'static>,
}

/// A visitor that builds a [`Value`] from the events it receives.
///
/// Children of every open container live on one flat item stack; a
/// container is assembled from its slice of the stack when its end event
/// arrives. The number of open containers is bounded by
/// [`DecodeOptions::max_nesting_depth`].
#[derive(Debug)]
pub struct ValueDecoder {
    options: DecodeOptions,
    items: Vec<Item>,
    structures: Vec<Structure>,
    pending_key: Option<String>,
    result: Option<Value<'static>>,
}

impl Default for ValueDecoder {
    fn default() -> Self {
        Self::build(DecodeOptions::default())
    }
}

impl ValueDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with [`Error::InvalidOptions`] when the nesting depth is zero.
    pub fn with_options(options: DecodeOptions) -> Result<Self> {
        if options.max_nesting_depth == 0 {
            return Err(Error::InvalidOptions("max_nesting_depth must be positive"));
        }
        Ok(Self::build(options))
    }

    fn build(options: DecodeOptions) -> Self {
        Self {
            options,
            items: Vec::new(),
            structures: Vec::new(),
            pending_key: None,
            result: None,
        }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Whether a complete top-level value is available.
    pub fn is_valid(&self) -> bool {
        self.result.is_some()
    }

    /// Moves the decoded value out.
    ///
    /// Fails with [`Error::Incomplete`] unless a complete value was
    /// received since the last call.
    pub fn get_result(&mut self) -> Result<Value<'static>> {
        self.result.take().ok_or(Error::Incomplete)
    }

    /// Drops any partial state so the decoder can be reused.
    pub fn reset(&mut self) {
        tracing::trace!(
            open = self.structures.len(),
            items = self.items.len(),
            "reset value decoder"
        );
        self.items.clear();
        self.structures.clear();
        self.pending_key = None;
        self.result = None;
    }

    fn begin_structure(&mut self, kind: StructureKind, tag: SemanticTag) -> Result<VisitFlow> {
        if self.structures.len() >= self.options.max_nesting_depth {
            tracing::debug!(
                max_nesting_depth = self.options.max_nesting_depth,
                "nesting depth exceeded while decoding"
            );
            return Err(Error::MaxNestingDepthExceeded(
                self.options.max_nesting_depth,
            ));
        }
        let key = self.take_key()?;
        if self.structures.is_empty() {
            self.result = None;
        }
        self.structures.push(Structure {
            kind,
            offset: self.items.len(),
            tag,
        });
        // the key is kept on the stack until the container is complete
        self.items.push(Item {
            key,
            value: Value::null(),
        });
        Ok(VisitFlow::Continue)
    }

    fn end_structure(&mut self, kind: StructureKind) -> Result<Structure> {
        match self.structures.last() {
            Some(structure) if structure.kind == kind => {}
            Some(_) => {
                return Err(Error::UnexpectedEvent(match kind {
                    StructureKind::Array => "end of array inside an object",
                    StructureKind::Object => "end of object inside an array",
                }))
            }
            None => return Err(Error::UnexpectedEvent("end without a matching begin")),
        }
        if self.pending_key.is_some() {
            return Err(Error::UnexpectedEvent("key without a value"));
        }
        self.structures
            .pop()
            .ok_or(Error::UnexpectedEvent("end without a matching begin"))
    }

    /// Takes the key a value must carry at the current position.
    fn take_key(&mut self) -> Result<Option<String>> {
        match self.structures.last() {
            Some(Structure {
                kind: StructureKind::Object,
                ..
            }) => match self.pending_key.take() {
                Some(key) => Ok(Some(key)),
                None => Err(Error::UnexpectedEvent("value without a key inside an object")),
            },
            _ => Ok(None),
        }
    }

    fn push_value(&mut self, value: Value<'static>) -> Result<VisitFlow> {
        let key = self.take_key()?;
        if self.structures.is_empty() {
            self.result = Some(value);
        } else {
            self.items.push(Item { key, value });
        }
        Ok(VisitFlow::Continue)
    }

    /// Replaces the placeholder of a finished container by its value.
    fn complete(&mut self, offset: usize, value: Value<'static>) {
        if self.structures.is_empty() {
            self.items.truncate(offset);
            self.result = Some(value);
        } else {
            self.items.truncate(offset + 1);
            self.items[offset].value = value;
        }
    }
}

impl Visitor for ValueDecoder {
    fn visit_begin_object(
        &mut self,
        _size_hint: Option<usize>,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.begin_structure(StructureKind::Object, tag)
    }

    fn visit_end_object(&mut self, _ctx: &SerContext) -> Result<VisitFlow> {
        let structure = self.end_structure(StructureKind::Object)?;
        let start = structure.offset + 1;
        let value = if self.items.len() == start {
            Value(Storage::EmptyObject(self.options.key_order, structure.tag))
        } else {
            let members: Vec<KeyValue<'static>> = self
                .items
                .drain(start..)
                .map(|item| KeyValue::new(item.key.unwrap_or_default(), item.value))
                .collect();
            Value(Storage::Object(
                Object::from_entries(self.options.key_order, members),
                structure.tag,
            ))
        };
        self.complete(structure.offset, value);
        Ok(VisitFlow::Continue)
    }

    fn visit_begin_array(
        &mut self,
        size_hint: Option<usize>,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        let flow = self.begin_structure(StructureKind::Array, tag)?;
        if let Some(hint) = size_hint {
            // size hints are advisory, cap what we trust up front
            self.items.reserve(hint.min(4096));
        }
        Ok(flow)
    }

    fn visit_end_array(&mut self, _ctx: &SerContext) -> Result<VisitFlow> {
        let structure = self.end_structure(StructureKind::Array)?;
        let elements: Vec<Value<'static>> = self
            .items
            .drain(structure.offset + 1..)
            .map(|item| item.value)
            .collect();
        self.complete(
            structure.offset,
            Value(Storage::Array(elements, structure.tag)),
        );
        Ok(VisitFlow::Continue)
    }

    fn visit_key(&mut self, key: &str, _ctx: &SerContext) -> Result<VisitFlow> {
        match self.structures.last() {
            Some(Structure {
                kind: StructureKind::Object,
                ..
            }) => {}
            _ => return Err(Error::UnexpectedEvent("key outside of an object")),
        }
        if self.pending_key.is_some() {
            return Err(Error::UnexpectedEvent("two keys without a value"));
        }
        self.pending_key = Some(key.to_string());
        Ok(VisitFlow::Continue)
    }

    fn visit_null(&mut self, tag: SemanticTag, _ctx: &SerContext) -> Result<VisitFlow> {
        self.push_value(Value(Storage::Null(tag)))
    }

    fn visit_bool(&mut self, value: bool, tag: SemanticTag, _ctx: &SerContext) -> Result<VisitFlow> {
        self.push_value(Value(Storage::Bool(value, tag)))
    }

    fn visit_string(
        &mut self,
        value: &str,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.push_value(Value::string(value, tag))
    }

    fn visit_byte_string(
        &mut self,
        value: &[u8],
        tag: SemanticTag,
        ext_tag: u64,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        let value = if tag == SemanticTag::Ext {
            Value::byte_string_ext(value, ext_tag)
        } else {
            Value::byte_string(value, tag)
        };
        self.push_value(value)
    }

    fn visit_int64(&mut self, value: i64, tag: SemanticTag, _ctx: &SerContext) -> Result<VisitFlow> {
        self.push_value(Value(Storage::Int64(value, tag)))
    }

    fn visit_uint64(
        &mut self,
        value: u64,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.push_value(Value(Storage::UInt64(value, tag)))
    }

    fn visit_half(&mut self, value: u16, tag: SemanticTag, _ctx: &SerContext) -> Result<VisitFlow> {
        self.push_value(Value(Storage::Half(value, tag)))
    }

    fn visit_double(
        &mut self,
        value: f64,
        tag: SemanticTag,
        _ctx: &SerContext,
    ) -> Result<VisitFlow> {
        self.push_value(Value(Storage::Double(value, tag)))
    }
}
