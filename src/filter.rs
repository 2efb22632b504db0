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

//! Visitors that sit between a producer and another visitor.

use crate::error::Result;
use crate::tag::SemanticTag;
use crate::visitor::SerContext;
use crate::visitor::TypedArray;
use crate::visitor::VisitFlow;
use crate::visitor::Visitor;

/// Forwards every event to the wrapped visitor except the ones it
/// overrides.
macro_rules! forward_scalars {
    () => {
        fn visit_begin_object(
            &mut self,
            size_hint: Option<usize>,
            tag: SemanticTag,
            ctx: &SerContext,
        ) -> Result<VisitFlow> {
            self.destination.visit_begin_object(size_hint, tag, ctx)
        }

        fn visit_end_object(&mut self, ctx: &SerContext) -> Result<VisitFlow> {
            self.destination.visit_end_object(ctx)
        }

        fn visit_begin_array(
            &mut self,
            size_hint: Option<usize>,
            tag: SemanticTag,
            ctx: &SerContext,
        ) -> Result<VisitFlow> {
            self.destination.visit_begin_array(size_hint, tag, ctx)
        }

        fn visit_end_array(&mut self, ctx: &SerContext) -> Result<VisitFlow> {
            self.destination.visit_end_array(ctx)
        }

        fn visit_null(&mut self, tag: SemanticTag, ctx: &SerContext) -> Result<VisitFlow> {
            self.destination.visit_null(tag, ctx)
        }

        fn visit_bool(&mut self, value: bool, tag: SemanticTag, ctx: &SerContext) -> Result<VisitFlow> {
            self.destination.visit_bool(value, tag, ctx)
        }

        fn visit_string(
            &mut self,
            value: &str,
            tag: SemanticTag,
            ctx: &SerContext,
        ) -> Result<VisitFlow> {
            self.destination.visit_string(value, tag, ctx)
        }

        fn visit_byte_string(
            &mut self,
            value: &[u8],
            tag: SemanticTag,
            ext_tag: u64,
            ctx: &SerContext,
        ) -> Result<VisitFlow> {
            self.destination.visit_byte_string(value, tag, ext_tag, ctx)
        }

        fn visit_int64(&mut self, value: i64, tag: SemanticTag, ctx: &SerContext) -> Result<VisitFlow> {
            self.destination.visit_int64(value, tag, ctx)
        }

        fn visit_uint64(
            &mut self,
            value: u64,
            tag: SemanticTag,
            ctx: &SerContext,
        ) -> Result<VisitFlow> {
            self.destination.visit_uint64(value, tag, ctx)
        }

        fn visit_half(&mut self, value: u16, tag: SemanticTag, ctx: &SerContext) -> Result<VisitFlow> {
            self.destination.visit_half(value, tag, ctx)
        }

        fn visit_double(
            &mut self,
            value: f64,
            tag: SemanticTag,
            ctx: &SerContext,
        ) -> Result<VisitFlow> {
            self.destination.visit_double(value, tag, ctx)
        }

        fn visit_typed_array(
            &mut self,
            data: TypedArray<'_>,
            tag: SemanticTag,
            ctx: &SerContext,
        ) -> Result<VisitFlow> {
            self.destination.visit_typed_array(data, tag, ctx)
        }

        fn visit_begin_multi_dim(
            &mut self,
            shape: &[usize],
            tag: SemanticTag,
            ctx: &SerContext,
        ) -> Result<VisitFlow> {
            self.destination.visit_begin_multi_dim(shape, tag, ctx)
        }

        fn visit_end_multi_dim(&mut self, ctx: &SerContext) -> Result<VisitFlow> {
            self.destination.visit_end_multi_dim(ctx)
        }
    };
}

/// Replaces one object key by another and forwards everything else.
///
/// Keys are renamed at every nesting level.
pub struct RenameKeyFilter<'d, V: Visitor + ?Sized> {
    from: String,
    to: String,
    destination: &'d mut V,
}

impl<'d, V: Visitor + ?Sized> RenameKeyFilter<'d, V> {
    pub fn new(from: impl Into<String>, to: impl Into<String>, destination: &'d mut V) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            destination,
        }
    }
}

impl<V: Visitor + ?Sized> Visitor for RenameKeyFilter<'_, V> {
    forward_scalars!();

    fn visit_key(&mut self, key: &str, ctx: &SerContext) -> Result<VisitFlow> {
        if key == self.from {
            self.destination.visit_key(&self.to, ctx)
        } else {
            self.destination.visit_key(key, ctx)
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.destination.flush()
    }
}

/// Forwards every event but swallows `flush`.
///
/// Lets a complete document be emitted as a fragment of an outer stream
/// whose owner decides when the destination is flushed.
pub struct FragmentFilter<'d, V: Visitor + ?Sized> {
    destination: &'d mut V,
}

impl<'d, V: Visitor + ?Sized> FragmentFilter<'d, V> {
    pub fn new(destination: &'d mut V) -> Self {
        Self { destination }
    }
}

impl<V: Visitor + ?Sized> Visitor for FragmentFilter<'_, V> {
    forward_scalars!();

    fn visit_key(&mut self, key: &str, ctx: &SerContext) -> Result<VisitFlow> {
        self.destination.visit_key(key, ctx)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
