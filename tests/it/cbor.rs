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
use jsonmodel::cbor::decode_with_options;
use jsonmodel::cbor::encode;
use jsonmodel::cbor::parse_to_visitor;
use jsonmodel::cbor::CborEncoder;
use jsonmodel::cbor::CborReadOptions;
use jsonmodel::json::parse_value;
use jsonmodel::ByteString;
use jsonmodel::CborView;
use jsonmodel::Error;
use jsonmodel::ParseErrorCode;
use jsonmodel::SemanticTag;
use jsonmodel::SerContext;
use jsonmodel::StorageKind;
use jsonmodel::Value;
use jsonmodel::ValueDecoder;
use jsonmodel::Visitor;
use proptest::prelude::*;

fn test_decode_ok(tests: &[(&[u8], &str)]) {
    for &(data, json) in tests {
        let value = decode(data).unwrap();
        assert_eq!(value.to_string(), json, "{data:02x?}");
    }
}

fn test_round_trip(tests: &[&[u8]]) {
    for data in tests {
        let value = decode(data).unwrap();
        assert_eq!(&encode(&value).unwrap(), data, "{value:?}");
    }
}

#[test]
fn test_byte_string() {
    let data = b"\x45hello";
    let value = decode(data).unwrap();
    assert_eq!(value.storage_kind(), StorageKind::ByteString);
    assert_eq!(value.as_bytes(), Some(&b"hello"[..]));
    assert_eq!(value.as_type::<ByteString>().unwrap().as_slice(), b"hello");
    assert_eq!(encode(&value).unwrap(), data);
    assert_eq!(value.to_string(), r#""aGVsbG8""#);
}

#[test]
fn test_scalars() {
    test_decode_ok(&[
        (&[0x00], "0"),
        (&[0x17], "23"),
        (&[0x18, 0x18], "24"),
        (&[0x20], "-1"),
        (&[0x38, 0x63], "-100"),
        (&[0x1b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff], "18446744073709551615"),
        (&[0x3b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff], "-18446744073709551616"),
        (&[0xf4], "false"),
        (&[0xf5], "true"),
        (&[0xf6], "null"),
        (&[0xf9, 0x3c, 0x00], "1.0"),
        (&[0xfa, 0x3f, 0xc0, 0x00, 0x00], "1.5"),
        (&[0xfb, 0x3f, 0xf1, 0x99, 0x99, 0x99, 0x99, 0x99, 0x9a], "1.1"),
        (&[0x62, 0xc3, 0xa9], r#""é""#),
    ]);

    let undefined = decode(&[0xf7]).unwrap();
    assert!(undefined.is_null());
    assert_eq!(undefined.tag(), SemanticTag::Undefined);

    let half = decode(&[0xf9, 0x3c, 0x00]).unwrap();
    assert_eq!(half.storage_kind(), StorageKind::HalfFloat);

    test_round_trip(&[
        &[0x18, 0x64],
        &[0x39, 0x03, 0xe7],
        &[0xf7],
        &[0xf9, 0x3c, 0x00],
        &[0xfa, 0x3f, 0xc0, 0x00, 0x00],
        &[0xfb, 0x3f, 0xf1, 0x99, 0x99, 0x99, 0x99, 0x99, 0x9a],
    ]);
}

#[test]
fn test_containers() {
    test_decode_ok(&[
        (&[0x80], "[]"),
        (&[0xa0], "{}"),
        (&[0x83, 0x01, 0x02, 0x03], "[1,2,3]"),
        (&[0x9f, 0x01, 0x82, 0x02, 0x03, 0xff], "[1,[2,3]]"),
        (&[0xbf, 0x61, 0x62, 0x01, 0x61, 0x61, 0x02, 0xff], r#"{"a":2,"b":1}"#),
        // integer keys become their decimal text
        (&[0xa2, 0x01, 0x61, 0x78, 0x20, 0xf6], r#"{"-1":null,"1":"x"}"#),
        // chunked text
        (&[0x7f, 0x62, 0x61, 0x62, 0x61, 0x63, 0xff], r#""abc""#),
    ]);

    test_round_trip(&[
        &[0x80],
        &[0xa0],
        &[0x82, 0x01, 0x82, 0x02, 0x03],
        &[0xa2, 0x61, 0x61, 0x01, 0x61, 0x62, 0x80],
    ]);
}

#[test]
fn test_tags() {
    // 1(1700000000)
    let data = [0xc1, 0x1a, 0x65, 0x53, 0xf1, 0x00];
    let value = decode(&data).unwrap();
    assert_eq!(value.tag(), SemanticTag::EpochSecond);
    assert_eq!(value.as_type::<i64>().unwrap(), 1_700_000_000);

    // 0("2013-03-21T20:04:00Z")
    let mut datetime = vec![0xc0, 0x74];
    datetime.extend_from_slice(b"2013-03-21T20:04:00Z");
    let value = decode(&datetime).unwrap();
    assert_eq!(value.tag(), SemanticTag::Datetime);
    assert_eq!(value.to_string(), r#""2013-03-21T20:04:00Z""#);

    // 2(h'010000000000000000')
    let bignum = [0xc2, 0x49, 0x01, 0, 0, 0, 0, 0, 0, 0, 0];
    let value = decode(&bignum).unwrap();
    assert_eq!(value.tag(), SemanticTag::Bigint);
    assert_eq!(value.to_string(), "18446744073709551616");

    // 4([-2, 27315])
    let fraction = [0xc4, 0x82, 0x21, 0x19, 0x6a, 0xb3];
    let value = decode(&fraction).unwrap();
    assert_eq!(value.tag(), SemanticTag::Bigdec);
    assert_eq!(value.as_type::<f64>().unwrap(), 273.15);

    // 32("a"), a tag the model does not know is kept on byte strings only
    let value = decode(&[0xd8, 0x20, 0x61, 0x61]).unwrap();
    assert_eq!(value.tag(), SemanticTag::Uri);
    let value = decode(&[0xd9, 0x01, 0x2c, 0x61, 0x61]).unwrap();
    assert_eq!(value.tag(), SemanticTag::None);
    let value = decode(&[0xd9, 0x01, 0x2c, 0x41, 0x61]).unwrap();
    assert_eq!(value.tag(), SemanticTag::Ext);
    assert_eq!(value.ext_tag(), 300);

    test_round_trip(&[
        &data[..],
        &datetime[..],
        &bignum[..],
        &fraction[..],
        &[0xd9, 0x01, 0x2c, 0x41, 0x61][..],
    ]);
}

#[test]
fn test_typed_arrays() {
    // 64(h'010203'), uint8
    let value = decode(&[0xd8, 0x40, 0x43, 0x01, 0x02, 0x03]).unwrap();
    assert_eq!(value.to_string(), "[1,2,3]");
    assert_eq!(encode(&value).unwrap(), vec![0x83, 0x01, 0x02, 0x03]);

    // 70(h'0100000002000000'), uint32 little endian
    let value = decode(&[0xd8, 0x46, 0x48, 1, 0, 0, 0, 2, 0, 0, 0]).unwrap();
    assert_eq!(value.to_string(), "[1,2]");

    // 72(h'ff'), sint8
    let value = decode(&[0xd8, 0x48, 0x41, 0xff]).unwrap();
    assert_eq!(value.to_string(), "[-1]");

    // a length that is not a multiple of the element size
    assert!(matches!(
        decode(&[0xd8, 0x46, 0x43, 1, 0, 0]),
        Err(Error::InvalidCbor(ParseErrorCode::InvalidTypedArray, _))
    ));
}

#[test]
fn test_json_cbor_json() {
    let text = r#"{"a":[1,-1,1.5,"x",true,null],"b":{"c":"d"},"e":18446744073709551616}"#;
    let value = parse_value(text.as_bytes()).unwrap();
    let data = encode(&value).unwrap();
    let decoded = decode(&data).unwrap();
    assert_eq!(decoded, value);
    assert_eq!(decoded.to_string(), text);
}

#[test]
fn test_decode_errors() {
    let cases: [(&[u8], ParseErrorCode); 9] = [
        (&[], ParseErrorCode::InvalidEOF),
        (&[0x82, 0x01], ParseErrorCode::InvalidEOF),
        (&[0x62, 0x61], ParseErrorCode::InvalidEOF),
        (&[0x61, 0xff], ParseErrorCode::InvalidStringValue),
        (&[0xff], ParseErrorCode::UnexpectedBreak),
        (&[0x1c], ParseErrorCode::UnknownType(0x1c)),
        (&[0x7f, 0x41, 0x61, 0xff], ParseErrorCode::IllegalChunkedString),
        (&[0xa1, 0x80, 0x01], ParseErrorCode::KeyMustBeAString),
        (&[0x01, 0x01], ParseErrorCode::UnexpectedTrailingCharacters),
    ];
    for (data, code) in cases {
        match decode(data) {
            Err(Error::InvalidCbor(actual, _)) => assert_eq!(actual, code, "{data:02x?}"),
            other => panic!("{data:02x?}: unexpected {other:?}"),
        }
    }
}

#[test]
fn test_depth_limit() {
    let mut data = vec![0x81; 10];
    data.push(0x00);
    let options = CborReadOptions::new().max_nesting_depth(10);
    let mut decoder = ValueDecoder::new();
    parse_to_visitor(&data, &options, &mut decoder).unwrap();
    assert_eq!(decoder.get_result().unwrap().to_string(), "[[[[[[[[[[0]]]]]]]]]]");

    let options = CborReadOptions::new().max_nesting_depth(9);
    let mut decoder = ValueDecoder::new();
    let err = parse_to_visitor(&data, &options, &mut decoder).unwrap_err();
    assert!(err.is_nesting_depth_exceeded());
}

#[test]
fn test_indefinite_depth_limit() {
    let mut data = vec![0x9f; 10];
    data.push(0x00);
    data.extend_from_slice(&[0xff; 10]);
    let options = CborReadOptions::new().max_nesting_depth(10);
    assert_eq!(
        decode_with_options(&data, &options).unwrap().to_string(),
        "[[[[[[[[[[0]]]]]]]]]]"
    );
    assert!(CborView::with_options(&data, &options).is_ok());

    let options = CborReadOptions::new().max_nesting_depth(9);
    assert!(decode_with_options(&data, &options)
        .unwrap_err()
        .is_nesting_depth_exceeded());
    assert!(CborView::with_options(&data, &options)
        .unwrap_err()
        .is_nesting_depth_exceeded());

    // {_ "k": [_ {_ }]}
    let data = [0xbf, 0x61, 0x6b, 0x9f, 0xbf, 0xff, 0xff, 0xff];
    let options = CborReadOptions::new().max_nesting_depth(2);
    assert!(decode_with_options(&data, &options)
        .unwrap_err()
        .is_nesting_depth_exceeded());
    let options = CborReadOptions::new().max_nesting_depth(3);
    assert_eq!(
        decode_with_options(&data, &options).unwrap().to_string(),
        r#"{"k":[{}]}"#
    );
}

#[test]
fn test_long_tag_chain() {
    let mut data = vec![0xc6; 1_000_000];
    data.push(0x01);
    let options = CborReadOptions::new().max_nesting_depth(1);
    let value = decode_with_options(&data, &options).unwrap();
    assert_eq!(value, Value::from(1));
    assert_eq!(value.tag(), SemanticTag::None);

    let view = CborView::with_options(&data, &options).unwrap();
    assert_eq!(view.as_slice().len(), data.len());
    assert_eq!(view.as_i64(), Some(1));

    // the innermost tag applies
    let mut data = vec![0xc6; 1000];
    data.extend_from_slice(&[0xc1, 0x1a, 0x65, 0x53, 0xf1, 0x00]);
    let value = decode(&data).unwrap();
    assert_eq!(value.tag(), SemanticTag::EpochSecond);
    assert_eq!(CborView::new(&data).unwrap().tag(), SemanticTag::EpochSecond);

    // a tag chain without content
    assert!(matches!(
        decode(&[0xc6; 64]),
        Err(Error::InvalidCbor(ParseErrorCode::InvalidEOF, _))
    ));
}

#[test]
fn test_decimal_fraction_exponents() {
    // 4([-9223372036854775808, 1])
    let smallest = [0xc4, 0x82, 0x3b, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
    let value = decode(&smallest).unwrap();
    assert_eq!(value.tag(), SemanticTag::Bigdec);
    assert_eq!(value.as_str(), Some("1e-9223372036854775808"));
    assert_eq!(value.to_string(), "1e-9223372036854775808");

    // 4([9223372036854775807, 1])
    let largest = [0xc4, 0x82, 0x1b, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
    let value = decode(&largest).unwrap();
    assert_eq!(value.as_str(), Some("1e9223372036854775807"));

    // 4([-40, 25]) has too many leading zeros for plain notation
    let value = decode(&[0xc4, 0x82, 0x38, 0x27, 0x18, 0x19]).unwrap();
    assert_eq!(value.as_str(), Some("25e-40"));
    // 4([-5, 25])
    let value = decode(&[0xc4, 0x82, 0x24, 0x18, 0x19]).unwrap();
    assert_eq!(value.as_str(), Some("0.00025"));

    test_round_trip(&[&smallest[..], &largest[..]]);
}

#[test]
fn test_encoder_size_hint() {
    let ctx = SerContext::default();
    let mut encoder = CborEncoder::new(Vec::new());
    encoder.visit_begin_array(Some(2), SemanticTag::None, &ctx).unwrap();
    encoder.visit_int64(1, SemanticTag::None, &ctx).unwrap();
    assert!(matches!(
        encoder.visit_end_array(&ctx),
        Err(Error::UnexpectedEvent(_))
    ));

    let mut encoder = CborEncoder::new(Vec::new());
    encoder.visit_begin_object(None, SemanticTag::None, &ctx).unwrap();
    encoder.visit_key("k", &ctx).unwrap();
    encoder.visit_bool(true, SemanticTag::None, &ctx).unwrap();
    encoder.visit_end_object(&ctx).unwrap();
    encoder.flush().unwrap();
    assert_eq!(encoder.into_inner(), vec![0xbf, 0x61, 0x6b, 0xf5, 0xff]);
}

fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z\u{4E00}-\u{4E0F}]{0,8}"
}

pub(crate) fn cbor_strategy() -> impl Strategy<Value = Value<'static>> {
    let leaf = prop_oneof![
        Just(Value::null()),
        any::<bool>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("not NaN", |x| !x.is_nan())
            .prop_map(Value::from),
        any::<String>().prop_map(Value::from),
        prop::collection::vec(any::<u8>(), 0..16)
            .prop_map(|b| Value::byte_string(b, SemanticTag::None)),
        "-?[1-9][0-9]{19,40}".prop_map(|s| Value::bigint(&s)),
        (0u64..u32::MAX as u64).prop_map(|v| Value::from(v).with_tag(SemanticTag::EpochSecond)),
    ];

    leaf.prop_recursive(6, 128, 10, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::from),
            prop::collection::btree_map(key_strategy(), inner, 0..8)
                .prop_map(|map| map.into_iter().collect::<Value>()),
        ]
    })
}

proptest! {
    #[test]
    fn proptest_cbor_round_trip(value in cbor_strategy()) {
        let data = encode(&value).unwrap();
        let decoded = decode(&data).unwrap();
        prop_assert_eq!(&decoded, &value);
        prop_assert_eq!(encode(&decoded).unwrap(), data);
    }
}
