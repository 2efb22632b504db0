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

use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Formatter;

use crate::value::Value;

/// How an object keeps its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyOrder {
    /// Members are kept sorted by key and found by binary search.
    #[default]
    Sorted,
    /// Members are kept in first-insertion order and found by linear scan.
    Preserved,
}

/// One member of an object.
#[derive(Clone, PartialEq)]
pub struct KeyValue<'a> {
    key: String,
    value: Value<'a>,
}

impl<'a> KeyValue<'a> {
    pub fn new(key: impl Into<String>, value: Value<'a>) -> KeyValue<'a> {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value<'a> {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value<'a> {
        &mut self.value
    }

    pub fn into_parts(self) -> (String, Value<'a>) {
        (self.key, self.value)
    }
}

impl Debug for KeyValue<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {:?}", self.key, self.value)
    }
}

/// A map from string keys to values with unique keys.
///
/// Mutations through [`Object::try_emplace`] and
/// [`Object::insert_or_assign`] keep keys unique. Bulk construction through
/// [`Object::from_entries`] appends everything first and removes duplicate
/// keys in a single pass, the first occurrence of a key wins.
#[derive(Clone, Default)]
pub struct Object<'a> {
    order: KeyOrder,
    members: Vec<KeyValue<'a>>,
}

impl<'a> Object<'a> {
    pub const fn new(order: KeyOrder) -> Object<'a> {
        Self {
            order,
            members: Vec::new(),
        }
    }

    pub fn with_capacity(order: KeyOrder, capacity: usize) -> Object<'a> {
        Self {
            order,
            members: Vec::with_capacity(capacity),
        }
    }

    /// Builds an object from members that may contain repeated keys.
    pub fn from_entries(order: KeyOrder, mut members: Vec<KeyValue<'a>>) -> Object<'a> {
        match order {
            KeyOrder::Sorted => {
                // stable sort keeps the first occurrence of each key in front
                members.sort_by(|a, b| a.key.cmp(&b.key));
                members.dedup_by(|later, first| later.key == first.key);
            }
            KeyOrder::Preserved => {
                let mut index: Vec<usize> = (0..members.len()).collect();
                index.sort_by(|a, b| members[*a].key.cmp(&members[*b].key));
                let mut keep = vec![true; members.len()];
                for pair in index.windows(2) {
                    if members[pair[0]].key == members[pair[1]].key {
                        keep[pair[1]] = false;
                    }
                }
                let mut i = 0;
                members.retain(|_| {
                    i += 1;
                    keep[i - 1]
                });
            }
        }
        Self { order, members }
    }

    pub fn order(&self) -> KeyOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Locates `key`, `Err` carries the insertion point.
    fn search(&self, key: &str) -> Result<usize, usize> {
        match self.order {
            KeyOrder::Sorted => self
                .members
                .binary_search_by(|kv| kv.key.as_str().cmp(key)),
            KeyOrder::Preserved => self
                .members
                .iter()
                .position(|kv| kv.key == key)
                .ok_or(self.members.len()),
        }
    }

    pub fn find(&self, key: &str) -> Option<usize> {
        self.search(key).ok()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.search(key).is_ok()
    }

    pub fn get(&self, key: &str) -> Option<&Value<'a>> {
        self.find(key).map(|i| &self.members[i].value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value<'a>> {
        self.find(key).map(|i| &mut self.members[i].value)
    }

    /// Inserts only when `key` is absent, returns `false` otherwise.
    pub fn try_emplace(&mut self, key: &str, value: Value<'a>) -> bool {
        match self.search(key) {
            Ok(_) => false,
            Err(pos) => {
                self.members.insert(pos, KeyValue::new(key, value));
                true
            }
        }
    }

    /// Inserts or overwrites, returns `true` when the key was inserted.
    ///
    /// An overwritten member keeps its position.
    pub fn insert_or_assign(&mut self, key: &str, value: Value<'a>) -> bool {
        match self.search(key) {
            Ok(pos) => {
                self.members[pos].value = value;
                false
            }
            Err(pos) => {
                self.members.insert(pos, KeyValue::new(key, value));
                true
            }
        }
    }

    /// Returns the member for `key`, inserting a null member when absent.
    pub fn get_or_insert_null(&mut self, key: &str) -> &mut Value<'a> {
        let pos = match self.search(key) {
            Ok(pos) => pos,
            Err(pos) => {
                self.members.insert(pos, KeyValue::new(key, Value::null()));
                pos
            }
        };
        &mut self.members[pos].value
    }

    pub fn erase(&mut self, key: &str) -> Option<Value<'a>> {
        let pos = self.find(key)?;
        Some(self.members.remove(pos).value)
    }

    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&str, &Value<'a>) -> bool,
    {
        self.members.retain(|kv| f(&kv.key, &kv.value));
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn reserve(&mut self, additional: usize) {
        self.members.reserve(additional);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, KeyValue<'a>> {
        self.members.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, KeyValue<'a>> {
        self.members.iter_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.members.iter().map(|kv| kv.key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value<'a>> + '_ {
        self.members.iter().map(|kv| &kv.value)
    }

    pub fn into_members(self) -> Vec<KeyValue<'a>> {
        self.members
    }

    /// Members in key order, independent of the policy.
    fn sorted_members(&self) -> Vec<&KeyValue<'a>> {
        let mut members: Vec<&KeyValue<'a>> = self.members.iter().collect();
        if self.order == KeyOrder::Preserved {
            members.sort_by(|a, b| a.key.cmp(&b.key));
        }
        members
    }

    pub(crate) fn into_owned(self) -> Object<'static> {
        Object {
            order: self.order,
            members: self
                .members
                .into_iter()
                .map(|kv| KeyValue {
                    key: kv.key,
                    value: kv.value.into_owned(),
                })
                .collect(),
        }
    }
}

impl<'a> IntoIterator for Object<'a> {
    type Item = KeyValue<'a>;
    type IntoIter = std::vec::IntoIter<KeyValue<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

impl<'o, 'a> IntoIterator for &'o Object<'a> {
    type Item = &'o KeyValue<'a>;
    type IntoIter = std::slice::Iter<'o, KeyValue<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

impl<'a, K: Into<String>> FromIterator<(K, Value<'a>)> for Object<'a> {
    fn from_iter<T: IntoIterator<Item = (K, Value<'a>)>>(iter: T) -> Self {
        let members = iter
            .into_iter()
            .map(|(k, v)| KeyValue::new(k, v))
            .collect();
        Object::from_entries(KeyOrder::default(), members)
    }
}

impl Debug for Object<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.members.iter().map(|kv| (&kv.key, &kv.value)))
            .finish()
    }
}

/// Objects are equal when they hold the same keys with equal values,
/// whatever their policies and member order.
impl PartialEq for Object<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .members
                .iter()
                .all(|kv| other.get(&kv.key).is_some_and(|v| *v == kv.value))
    }
}

impl Eq for Object<'_> {}

impl PartialOrd for Object<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Object<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        let left = self.sorted_members();
        let right = other.sorted_members();
        for (l, r) in left.iter().zip(right.iter()) {
            match l.key.cmp(&r.key) {
                Ordering::Equal => {}
                ord => return ord,
            }
            match l.value.cmp(&r.value) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        left.len().cmp(&right.len())
    }
}
