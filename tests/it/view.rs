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

use jsonmodel::cbor::decode;
use jsonmodel::cbor::encode;
use jsonmodel::cbor::CborReadOptions;
use jsonmodel::json::parse_value;
use jsonmodel::json::JsonEncoder;
use jsonmodel::ByteString;
use jsonmodel::CborView;
use jsonmodel::Error;
use jsonmodel::SemanticTag;
use jsonmodel::Value;
use proptest::prelude::*;

use crate::cbor::cbor_strategy;

const DOC: &str = r#"{"name":"widget","tags":["a","b",{"deep":[1,-2,3.5]}],"price":12.5,"stock":null,"ok":true}"#;

fn doc_bytes() -> Vec<u8> {
    encode(&parse_value(DOC.as_bytes()).unwrap()).unwrap()
}

/// Walks the view and the decoded value side by side.
fn assert_same(view: &CborView<'_>, value: &Value<'_>) {
    assert_eq!(view.is_array(), value.is_array(), "{view:?}");
    assert_eq!(view.is_object(), value.is_object(), "{view:?}");
    assert_eq!(view.is_string(), value.is_string(), "{view:?}");
    assert_eq!(view.is_byte_string(), value.is_byte_string(), "{view:?}");
    assert_eq!(view.tag(), value.tag(), "{view:?}");
    if value.is_array() {
        assert_eq!(view.len(), value.len());
        for (i, item) in value.array_iter().unwrap().enumerate() {
            assert_same(&view.at_index(i).unwrap(), item);
        }
        assert!(view.get_index(value.len()).is_none());
    } else if value.is_object() {
        assert_eq!(view.len(), value.len());
        for key in value.keys().unwrap() {
            assert!(view.contains_key(key));
            assert_same(&view.at(key).unwrap(), value.at(key).unwrap());
        }
    } else {
        assert_eq!(&view.to_value().unwrap(), value);
    }
}

#[test]
fn test_view_navigation() {
    let data = doc_bytes();
    let view = CborView::new(&data).unwrap();
    assert!(view.is_object());
    assert_eq!(view.len(), 5);

    let tags = view.at("tags").unwrap();
    assert_eq!(tags.len(), 3);
    assert_eq!(tags.at_index(1).unwrap().as_str(), Some("b"));
    let deep = tags.at_index(2).unwrap().at("deep").unwrap();
    assert_eq!(deep.at_index(1).unwrap().as_i64(), Some(-2));
    assert_eq!(deep.at_index(2).unwrap().as_f64(), Some(3.5));

    assert!(view.at("stock").unwrap().is_null());
    assert_eq!(view.at("ok").unwrap().as_bool(), Some(true));
    assert_eq!(view.at("price").unwrap().as_type::<f64>().unwrap(), 12.5);

    assert!(matches!(view.at("missing"), Err(Error::KeyNotFound(k)) if k == "missing"));
    assert!(matches!(
        tags.at_index(3),
        Err(Error::IndexOutOfRange { index: 3, len: 3 })
    ));
    assert!(matches!(view.at_index(0), Err(Error::NotAnArray)));
    assert!(matches!(tags.at("a"), Err(Error::NotAnObject)));

    assert_same(&view, &decode(&data).unwrap());
}

#[test]
fn test_view_ranges() {
    let data = doc_bytes();
    let view = CborView::new(&data).unwrap();

    let members = view.object_range().unwrap();
    assert_eq!(members.len(), 5);
    let keys: Vec<_> = members.keys().collect();
    assert_eq!(keys, vec!["name", "ok", "price", "stock", "tags"]);
    // a range restarts from the beginning on every iteration
    assert_eq!(members.iter().count(), members.iter().count());

    let elements = view.at("tags").unwrap().array_range().unwrap();
    let texts: Vec<_> = elements
        .into_iter()
        .filter_map(|item| item.as_str())
        .collect();
    assert_eq!(texts, vec!["a", "b"]);
    assert!(view.array_range().is_err());
}

#[test]
fn test_view_dump() {
    let data = doc_bytes();
    let view = CborView::new(&data).unwrap();

    let mut encoder = JsonEncoder::new(Vec::new());
    view.dump(&mut encoder).unwrap();
    let text = String::from_utf8(encoder.into_inner()).unwrap();
    assert_eq!(text, view.to_value().unwrap().to_string());

    let mut encoder = JsonEncoder::new(Vec::new());
    view.at("tags").unwrap().dump(&mut encoder).unwrap();
    let text = String::from_utf8(encoder.into_inner()).unwrap();
    assert_eq!(text, r#"["a","b",{"deep":[1,-2,3.5]}]"#);
}

#[test]
fn test_view_trailing_bytes() {
    let mut data = encode(&Value::from(vec![1, 2])).unwrap();
    let len = data.len();
    data.extend_from_slice(&[0xf5, 0xf4]);
    let view = CborView::new(&data).unwrap();
    assert_eq!(view.as_slice().len(), len);
    assert_eq!(view.to_value().unwrap(), Value::from(vec![1, 2]));

    assert!(CborView::new(&[0x82, 0x01]).is_err());
    assert!(matches!(
        CborView::with_options(&data, &CborReadOptions::new().max_nesting_depth(0)),
        Err(Error::InvalidOptions(_))
    ));
}

#[test]
fn test_view_tags() {
    // 2(h'010000000000000000')
    let data = [0xc2, 0x49, 0x01, 0, 0, 0, 0, 0, 0, 0, 0];
    let view = CborView::new(&data).unwrap();
    assert_eq!(view.tag(), SemanticTag::Bigint);
    assert!(view.is_string());
    // the text form is produced on demand, it cannot be borrowed
    assert_eq!(view.as_str(), None);
    assert_eq!(view.as_type::<String>().unwrap(), "18446744073709551616");
    assert_eq!(view.as_type::<u128>().unwrap(), 18446744073709551616);

    // 1(1700000000)
    let data = [0xc1, 0x1a, 0x65, 0x53, 0xf1, 0x00];
    let view = CborView::new(&data).unwrap();
    assert_eq!(view.tag(), SemanticTag::EpochSecond);
    assert_eq!(view.as_u64(), Some(1700000000));

    // 300(h'0102')
    let data = [0xd9, 0x01, 0x2c, 0x42, 0x01, 0x02];
    let view = CborView::new(&data).unwrap();
    assert_eq!(view.tag(), SemanticTag::Ext);
    assert_eq!(view.ext_tag(), 300);
    assert_eq!(view.as_bytes(), Some(&[1u8, 2][..]));
}

#[test]
fn test_view_borrows_without_allocating() {
    let data = doc_bytes();
    let view = CborView::new(&data).unwrap();

    let info = mockalloc::record_allocs(|| {
        let name = view.at("name").unwrap();
        assert_eq!(name.as_type::<&str>().unwrap(), "widget");
        let deep = view
            .at("tags")
            .unwrap()
            .at_index(2)
            .unwrap()
            .at("deep")
            .unwrap();
        assert_eq!(deep.at_index(0).unwrap().as_type::<i32>().unwrap(), 1);
    });
    assert_eq!(info.num_allocs(), 0);
}

#[test]
fn test_view_copies_with_one_allocation() {
    let definite = encode(&Value::from("hello world")).unwrap();
    let view = CborView::new(&definite).unwrap();
    let info = mockalloc::record_allocs(|| {
        assert_eq!(view.as_type::<String>().unwrap(), "hello world");
    });
    assert_eq!(info.num_allocs(), 1);

    // (_ "hello", " world")
    let chunked = [
        0x7f, 0x65, b'h', b'e', b'l', b'l', b'o', 0x66, b' ', b'w', b'o', b'r', b'l', b'd', 0xff,
    ];
    let view = CborView::new(&chunked).unwrap();
    assert_eq!(view.as_str(), None);
    let info = mockalloc::record_allocs(|| {
        assert_eq!(view.as_type::<String>().unwrap(), "hello world");
    });
    assert_eq!(info.num_allocs(), 1);

    let bytes = [0x45, b'h', b'e', b'l', b'l', b'o'];
    let view = CborView::new(&bytes).unwrap();
    let info = mockalloc::record_allocs(|| {
        let value = view.as_type::<ByteString>().unwrap();
        assert_eq!(value.as_slice(), b"hello");
    });
    assert_eq!(info.num_allocs(), 1);
}

#[test]
fn test_view_conversion_errors() {
    let data = doc_bytes();
    let view = CborView::new(&data).unwrap();
    assert!(matches!(
        view.at("name").unwrap().as_type::<bool>(),
        Err(Error::InvalidCast(_))
    ));
    assert!(view.at("price").unwrap().as_type::<u8>().is_err());
    assert!(view.at("tags").unwrap().as_type::<&str>().is_err());
}

proptest! {
    #[test]
    fn proptest_view_matches_decoded(value in cbor_strategy()) {
        let data = encode(&value).unwrap();
        let view = CborView::new(&data).unwrap();
        assert_same(&view, &decode(&data).unwrap());
        prop_assert_eq!(view.to_value().unwrap(), value);
    }
}
