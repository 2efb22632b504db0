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

use crate::error::Result;
use crate::storage::Storage;
use crate::value::Value;
use crate::visitor::try_visit;
use crate::visitor::SerContext;
use crate::visitor::VisitFlow;
use crate::visitor::Visitor;

impl Value<'_> {
    /// Emits the events of this value to `visitor` and flushes it.
    ///
    /// The visitor is flushed even when it stopped the traversal early.
    pub fn dump<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<()> {
        self.dump_partial(visitor)?;
        visitor.flush()
    }

    /// Emits the events of this value without flushing, so that it can be
    /// written into a container the caller has opened on `visitor`.
    pub fn dump_partial<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<VisitFlow> {
        let ctx = SerContext::default();
        dump_value(self, visitor, &ctx)
    }
}

fn dump_value<V: Visitor + ?Sized>(
    value: &Value<'_>,
    visitor: &mut V,
    ctx: &SerContext,
) -> Result<VisitFlow> {
    match &value.resolve().0 {
        Storage::Null(tag) => visitor.visit_null(*tag, ctx),
        Storage::Bool(v, tag) => visitor.visit_bool(*v, *tag, ctx),
        Storage::Int64(v, tag) => visitor.visit_int64(*v, *tag, ctx),
        Storage::UInt64(v, tag) => visitor.visit_uint64(*v, *tag, ctx),
        Storage::Half(v, tag) => visitor.visit_half(*v, *tag, ctx),
        Storage::Double(v, tag) => visitor.visit_double(*v, *tag, ctx),
        Storage::ShortString(v, tag) => visitor.visit_string(v.as_str(), *tag, ctx),
        Storage::LongString(v, tag) => visitor.visit_string(v, *tag, ctx),
        Storage::ByteString(v, tag, ext_tag) => visitor.visit_byte_string(v, *tag, *ext_tag, ctx),
        Storage::EmptyObject(_, tag) => {
            try_visit!(visitor.visit_begin_object(Some(0), *tag, ctx));
            visitor.visit_end_object(ctx)
        }
        Storage::Array(items, tag) => {
            try_visit!(visitor.visit_begin_array(Some(items.len()), *tag, ctx));
            for item in items {
                try_visit!(dump_value(item, visitor, ctx));
            }
            visitor.visit_end_array(ctx)
        }
        Storage::Object(obj, tag) => {
            try_visit!(visitor.visit_begin_object(Some(obj.len()), *tag, ctx));
            for kv in obj.iter() {
                try_visit!(visitor.visit_key(kv.key(), ctx));
                try_visit!(dump_value(kv.value(), visitor, ctx));
            }
            visitor.visit_end_object(ctx)
        }
        // `resolve` never returns a reference
        Storage::ConstRef(v) => dump_value(v, visitor, ctx),
        Storage::Ref(v) => dump_value(v, visitor, ctx),
    }
}
