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

use std::collections::BTreeMap;
use std::ops::Bound;

use jsonmodel::json::parse_value;
use jsonmodel::Error;
use jsonmodel::KeyOrder;
use jsonmodel::SemanticTag;
use jsonmodel::StorageKind;
use jsonmodel::Value;
use proptest::prelude::*;

fn keys(value: &Value<'_>) -> Vec<String> {
    value.keys().unwrap().map(|k| k.to_string()).collect()
}

#[test]
fn test_sorted_insert_or_assign() {
    let mut obj = Value::object(KeyOrder::Sorted);
    obj.insert_or_assign("b", 2).unwrap();
    obj.insert_or_assign("a", 1).unwrap();
    assert!(!obj.insert_or_assign("a", 3).unwrap());

    assert_eq!(obj.to_string(), r#"{"a":3,"b":2}"#);
    assert_eq!(keys(&obj), vec!["a", "b"]);
}

#[test]
fn test_preserved_insert_or_assign() {
    let mut obj = Value::object(KeyOrder::Preserved);
    for (k, v) in [("b", 1), ("a", 2), ("c", 3), ("a", 4)] {
        obj.insert_or_assign(k, v).unwrap();
    }
    assert_eq!(obj.len(), 3);
    assert_eq!(keys(&obj), vec!["b", "a", "c"]);
    assert_eq!(obj["a"], Value::from(4));
}

#[test]
fn test_try_emplace_keeps_first() {
    let mut obj = Value::object(KeyOrder::Preserved);
    assert!(obj.try_emplace("k", 1).unwrap());
    assert!(!obj.try_emplace("k", 2).unwrap());
    assert_eq!(obj.at("k").unwrap(), &Value::from(1));
}

#[test]
fn test_at_never_inserts() {
    let mut obj = Value::object(KeyOrder::Sorted);
    assert!(matches!(obj.at("missing"), Err(Error::KeyNotFound(k)) if k == "missing"));
    assert!(matches!(obj.at_mut("missing"), Err(Error::KeyNotFound(_))));
    assert_eq!(obj.len(), 0);

    obj["missing"] = Value::from("x");
    assert_eq!(obj.len(), 1);
    assert_eq!(obj.at("missing").unwrap().as_str(), Some("x"));

    // lookup through a shared reference yields null and never inserts
    let shared = &obj;
    assert!(shared["other"].is_null());
    assert_eq!(obj.len(), 1);
}

#[test]
fn test_wrong_kind_access() {
    let mut arr = Value::from(vec![1, 2]);
    assert!(matches!(arr.at("a"), Err(Error::NotAnObject)));
    assert!(matches!(
        arr.at_index(2),
        Err(Error::IndexOutOfRange { index: 2, len: 2 })
    ));
    assert!(matches!(arr.at_or_insert("a"), Err(Error::NotAnObject)));

    let mut obj = Value::empty_object();
    assert!(matches!(obj.push_back(1), Err(Error::NotAnArray)));
    assert!(matches!(obj.at_index(0), Err(Error::NotAnArray)));
    assert!(matches!(obj.insert(0, 1), Err(Error::NotAnArray)));
    assert_eq!(obj.erase("x").unwrap(), None);
}

#[test]
fn test_array_mutation() {
    let mut arr = Value::array();
    arr.push_back(1).unwrap();
    arr.push_back("two").unwrap();
    arr.insert(0, true).unwrap();
    arr.extend([Value::null(), Value::from(5.5)]).unwrap();
    assert_eq!(arr.to_string(), r#"[true,1,"two",null,5.5]"#);

    assert_eq!(arr.erase_index(1).unwrap(), Value::from(1));
    arr.erase_range(1..3).unwrap();
    assert_eq!(arr.to_string(), "[true,5.5]");
    assert!(matches!(
        arr.insert(5, 0),
        Err(Error::IndexOutOfRange { index: 5, len: 2 })
    ));
    assert!(matches!(
        arr.erase_range((Bound::Excluded(usize::MAX), Bound::Unbounded)),
        Err(Error::IndexOutOfRange { index: usize::MAX, len: 2 })
    ));
    assert!(matches!(
        arr.erase_range(0..=usize::MAX),
        Err(Error::IndexOutOfRange { index: usize::MAX, len: 2 })
    ));
    arr.erase_range(1..=1).unwrap();
    assert_eq!(arr.to_string(), "[true]");
    arr.clear().unwrap();
    assert!(arr.is_empty());
}

#[test]
fn test_numeric_string_conversion() {
    assert_eq!(Value::from("0x1F").as_type::<i32>().unwrap(), 31);
    assert_eq!(Value::from("0777").as_type::<i32>().unwrap(), 511);
    assert_eq!(Value::from("0b101").as_type::<u8>().unwrap(), 5);
    assert_eq!(Value::from("-12").as_type::<i64>().unwrap(), -12);
    assert!(!Value::from("twelve").is::<i32>());
    assert!(Value::from("twelve").as_type::<i32>().is_err());
}

#[test]
fn test_integer_boundaries() {
    let max = Value::from(i64::MAX as u64);
    assert!(max.is::<i64>());
    assert_eq!(max.as_type::<i64>().unwrap(), i64::MAX);

    let above = Value::from(i64::MAX as u64 + 1);
    assert!(!above.is::<i64>());
    assert!(matches!(above.as_type::<i64>(), Err(Error::InvalidCast(_))));
    assert_eq!(above.as_type::<f64>().unwrap(), 9223372036854775808.0);

    assert_eq!(Value::from(3.0).as_type::<u8>().unwrap(), 3);
    assert!(Value::from(3.5).as_type::<u8>().is_err());
}

#[test]
fn test_big_numbers() {
    let big = Value::bigint("170141183460469231731687303715884105727");
    assert_eq!(big.tag(), SemanticTag::Bigint);
    assert_eq!(big.as_type::<i128>().unwrap(), i128::MAX);
    assert!(big.as_type::<i64>().is_err());
    assert_eq!(Value::bigdec("1.25").as_type::<f64>().unwrap(), 1.25);
}

#[test]
fn test_collections() {
    let value = parse_value(br#"{"a":[1,2],"b":[]}"#).unwrap();
    let map = value.as_type::<BTreeMap<String, Vec<u32>>>().unwrap();
    assert_eq!(map["a"], vec![1, 2]);
    assert!(map["b"].is_empty());
    assert!(value.as_type::<Vec<u32>>().is_err());
    assert_eq!(Value::null().as_type::<Option<u32>>().unwrap(), None);
}

#[test]
fn test_cross_kind_equality() {
    assert_eq!(Value::from(1u64), Value::from(1i64));
    assert_eq!(Value::from(1u64), Value::from(1.0));
    assert_eq!(Value::half(0x3c00), Value::from(1));
    assert!(Value::from(1) < Value::from(2.5));
    assert_eq!(Value::empty_object(), Value::object(KeyOrder::Preserved));

    // a bigint never equals plain text with the same digits
    assert_ne!(Value::bigint("123"), Value::from("123"));
    assert_eq!(
        Value::from("123").with_tag(SemanticTag::Uri),
        Value::from("123")
    );
}

#[test]
fn test_short_strings_are_inline() {
    let short = "a".repeat(jsonmodel::SHORT_STRING_CAPACITY);
    assert_eq!(Value::from(short.as_str()).storage_kind(), StorageKind::ShortString);
    let long = "a".repeat(jsonmodel::SHORT_STRING_CAPACITY + 1);
    assert_eq!(Value::from(long.as_str()).storage_kind(), StorageKind::LongString);

    let info = mockalloc::record_allocs(|| {
        let value = Value::from("inline");
        assert_eq!(value.as_str(), Some("inline"));
    });
    assert_eq!(info.num_allocs(), 0);
}

#[test]
fn test_const_ref() {
    let original = parse_value(br#"{"a":1}"#).unwrap();
    let mut doc = Value::array();
    doc.push_back(Value::const_ref(&original)).unwrap();

    assert_eq!(doc[0].storage_kind(), StorageKind::ConstRef);
    assert!(doc[0].is_object());
    assert_eq!(doc[0]["a"], Value::from(1));
    assert_eq!(doc.to_string(), r#"[{"a":1}]"#);
    assert!(matches!(
        doc.at_index_mut(0).unwrap().insert_or_assign("b", 2),
        Err(Error::NotMutable)
    ));

    let copy = doc.clone().into_owned();
    assert_eq!(copy[0].storage_kind(), StorageKind::Object);
    assert_eq!(copy, doc);
}

#[test]
fn test_mut_ref() {
    let mut target = Value::object(KeyOrder::Sorted);
    {
        let mut holder = Value::array();
        holder.push_back(Value::mut_ref(&mut target)).unwrap();
        let slot = holder.at_index_mut(0).unwrap();
        assert!(slot.insert_or_assign("k", 1).unwrap());
        slot.referent_mut()
            .unwrap()
            .insert_or_assign("j", 2)
            .unwrap();

        // element access goes through the referent
        assert!(matches!(slot.at_mut("k"), Err(Error::NotMutable)));
        assert!(matches!(slot.at_or_insert("k"), Err(Error::NotMutable)));
        let referent = slot.referent_mut().unwrap();
        *referent.at_mut("k").unwrap() = Value::from(10);
        referent["n"] = Value::null();
        assert_eq!(holder.to_string(), r#"[{"j":2,"k":10,"n":null}]"#);
    }
    assert_eq!(target.to_string(), r#"{"j":2,"k":10,"n":null}"#);
}

#[test]
#[should_panic(expected = "cannot index value")]
fn test_index_mut_on_ref_panics() {
    let mut target = Value::object(KeyOrder::Sorted);
    let mut slot = Value::mut_ref(&mut target);
    slot["k"] = Value::from(1);
}

#[test]
fn test_tags() {
    let value = Value::from(1700000000).with_tag(SemanticTag::EpochSecond);
    assert_eq!(value.tag(), SemanticTag::EpochSecond);
    assert_eq!(value.storage_kind(), StorageKind::Int64);

    let bytes = Value::byte_string_ext(vec![1, 2], 300);
    assert_eq!(bytes.tag(), SemanticTag::Ext);
    assert_eq!(bytes.ext_tag(), 300);
}

proptest! {
    #[test]
    fn proptest_key_uniqueness(ops in prop::collection::vec(("[a-e]", any::<i32>(), any::<bool>()), 0..40)) {
        let mut sorted = Value::object(KeyOrder::Sorted);
        let mut preserved = Value::object(KeyOrder::Preserved);
        let mut expected: BTreeMap<String, i32> = BTreeMap::new();
        let mut first_seen: Vec<String> = Vec::new();
        for (key, v, assign) in &ops {
            if *assign {
                sorted.insert_or_assign(key, *v).unwrap();
                preserved.insert_or_assign(key, *v).unwrap();
                expected.insert(key.clone(), *v);
            } else {
                sorted.try_emplace(key, *v).unwrap();
                preserved.try_emplace(key, *v).unwrap();
                expected.entry(key.clone()).or_insert(*v);
            }
            if !first_seen.contains(key) {
                first_seen.push(key.clone());
            }
        }
        prop_assert_eq!(sorted.len(), expected.len());
        prop_assert_eq!(keys(&sorted), expected.keys().cloned().collect::<Vec<_>>());
        prop_assert_eq!(keys(&preserved), first_seen);
        for (k, v) in &expected {
            prop_assert_eq!(sorted.at(k).unwrap(), &Value::from(*v));
            prop_assert_eq!(preserved.at(k).unwrap(), &Value::from(*v));
        }
        prop_assert_eq!(&sorted, &preserved);
    }

    #[test]
    fn proptest_is_agrees_with_as(v in any::<i64>(), u in any::<u64>(), s in "[0-9a-zA-Z-]{0,6}") {
        for value in [Value::from(v), Value::from(u), Value::from(s.as_str())] {
            prop_assert_eq!(value.is::<i32>(), value.as_type::<i32>().is_ok());
            prop_assert_eq!(value.is::<u64>(), value.as_type::<u64>().is_ok());
            prop_assert_eq!(value.is::<i64>(), value.as_type::<i64>().is_ok());
        }
    }
}
