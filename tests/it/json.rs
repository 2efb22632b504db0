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

use jsonmodel::json::parse_value;
use jsonmodel::json::parse_value_with_options;
use jsonmodel::json::to_string;
use jsonmodel::json::to_string_with_options;
use jsonmodel::json::JsonReadOptions;
use jsonmodel::json::JsonWriteOptions;
use jsonmodel::ByteString;
use jsonmodel::KeyOrder;
use jsonmodel::Object;
use jsonmodel::SemanticTag;
use jsonmodel::Value;
use proptest::prelude::*;

fn test_parse_err(errors: &[(&str, &'static str)]) {
    for &(s, err) in errors {
        let res = parse_value(s.as_bytes());
        assert!(res.is_err(), "{s} parsed");
        assert_eq!(res.err().unwrap().to_string(), err, "{s}");
    }
}

fn test_parse_ok(tests: Vec<(&str, Value<'_>)>) {
    for (s, val) in tests {
        assert_eq!(parse_value(s.as_bytes()).unwrap(), val, "{s}");
    }
}

#[test]
fn test_parse_literals() {
    test_parse_err(&[
        ("", "EOF while parsing a value, line 1 column 1"),
        ("n", "EOF while parsing a value, line 1 column 2"),
        ("nul", "EOF while parsing a value, line 1 column 4"),
        ("nulx", "expected ident, line 1 column 4"),
        ("nulla", "trailing characters, line 1 column 5"),
        ("truz", "expected ident, line 1 column 4"),
        ("NULL", "expected value, line 1 column 1"),
    ]);

    test_parse_ok(vec![
        ("null", Value::null()),
        (" true ", Value::from(true)),
        ("\tfalse\n", Value::from(false)),
    ]);
}

#[test]
fn test_parse_numbers() {
    test_parse_err(&[
        ("01", "invalid number, line 1 column 2"),
        ("-", "invalid number, line 1 column 2"),
        ("1.", "invalid number, line 1 column 3"),
        ("+1", "expected value, line 1 column 1"),
    ]);

    test_parse_ok(vec![
        ("0", Value::from(0u64)),
        ("-0", Value::from(0i64)),
        ("-9223372036854775808", Value::from(i64::MIN)),
        ("18446744073709551615", Value::from(u64::MAX)),
        ("1.5", Value::from(1.5)),
        ("-2.5E-3", Value::from(-0.0025)),
        ("1e2", Value::from(100.0)),
    ]);

    let big = parse_value(b"-18446744073709551617").unwrap();
    assert_eq!(big.tag(), SemanticTag::Bigint);
    assert_eq!(big.as_str(), Some("-18446744073709551617"));
    assert_eq!(to_string(&big).unwrap(), "-18446744073709551617");
}

#[test]
fn test_parse_strings() {
    test_parse_err(&[
        ("\"ab", "EOF while parsing a value, line 1 column 4"),
        ("\"a\nb\"", "control character (\\u0000-\\u001F) found while parsing a string, line 1 column 3"),
    ]);

    test_parse_ok(vec![
        (r#""""#, Value::from("")),
        (r#""é\n""#, Value::from("é\n")),
        (r#""𝄞""#, Value::from("𝄞")),
        (r#""lone \udd1e""#, Value::from(r"lone \udd1e")),
        (r#""\ud800\u0041""#, Value::from(r"\ud800A")),
    ]);
    assert!(parse_value(br#""\q""#).is_err());
}

#[test]
fn test_parse_containers() {
    test_parse_err(&[
        ("[1 2]", "expected `,` or `]`, line 1 column 4"),
        ("[1,]", "expected value, line 1 column 4"),
        (r#"{"a" 1}"#, "expected `:`, line 1 column 6"),
        (r#"{"a":1,}"#, "key must be a string, line 1 column 8"),
        (r#"{"a":1 "b":2}"#, "expected `,` or `}`, line 1 column 8"),
        ("[1] x", "trailing characters, line 1 column 5"),
        ("[\n1,\n?]", "expected value, line 3 column 1"),
    ]);

    let mut obj = Object::new(KeyOrder::Sorted);
    obj.insert_or_assign("a", Value::from(vec![Value::null(), Value::from(1u64)]));
    obj.insert_or_assign("b", Value::empty_object());
    test_parse_ok(vec![
        ("[]", Value::array()),
        ("{}", Value::empty_object()),
        (r#" { "b" : {} , "a" : [ null , 1 ] } "#, Value::from(obj)),
    ]);
}

#[test]
fn test_trailing_comma_option() {
    let options = JsonReadOptions::new().allow_trailing_comma(true);
    let value = parse_value_with_options(br#"{"a":[1,2,],}"#, &options).unwrap();
    assert_eq!(value.to_string(), r#"{"a":[1,2]}"#);
    assert!(parse_value_with_options(b"[,]", &options).is_err());
}

#[test]
fn test_lossless_number() {
    let options = JsonReadOptions::new().lossless_number(true);
    let value = parse_value_with_options(b"[0.1, 1e400]", &options).unwrap();
    assert_eq!(value[0].tag(), SemanticTag::Bigdec);
    assert_eq!(value[0].as_type::<f64>().unwrap(), 0.1);
    assert_eq!(value.to_string(), "[0.1,1e400]");
}

#[test]
fn test_byte_string_text_round_trip() {
    let value = parse_value(br#""aGVsbG8""#).unwrap();
    let bytes = value.as_type::<ByteString>().unwrap();
    assert_eq!(bytes.as_slice(), b"hello");

    let back = Value::from(bytes);
    assert_eq!(back.storage_kind(), jsonmodel::StorageKind::ByteString);
    assert_eq!(back.to_string(), r#""aGVsbG8""#);

    let tagged = Value::byte_string(b"hello".to_vec(), SemanticTag::Base64);
    assert_eq!(tagged.to_string(), r#""aGVsbG8=""#);
    let tagged = Value::byte_string(b"hello".to_vec(), SemanticTag::Base16);
    assert_eq!(tagged.to_string(), r#""68656C6C6F""#);
}

#[test]
fn test_write_options() {
    let value = parse_value(r#"{"k":["é",null]}"#.as_bytes()).unwrap();
    assert_eq!(
        value.to_pretty_string(),
        "{\n    \"k\": [\n        \"é\",\n        null\n    ]\n}"
    );
    let options = JsonWriteOptions::new().escape_all_non_ascii(true);
    assert_eq!(
        to_string_with_options(&value, &options).unwrap(),
        r#"{"k":["\u00e9",null]}"#
    );
    let options = JsonWriteOptions::new().indent(2);
    assert_eq!(
        to_string_with_options(&Value::array(), &options).unwrap(),
        "[]"
    );

    let nan = Value::from(vec![f64::NAN, f64::INFINITY]);
    assert_eq!(nan.to_string(), "[null,null]");
    let options = JsonWriteOptions::new().nan_to_null(false);
    assert_eq!(
        to_string_with_options(&nan, &options).unwrap(),
        r#"["NaN","Infinity"]"#
    );
}

#[test]
fn test_serde_json_interop() {
    let text = r#"{"a":[1,-2,3.5,"x",true,null],"b":{}}"#;
    let json: serde_json::Value = serde_json::from_str(text).unwrap();
    let value = Value::from(&json);
    assert_eq!(value, parse_value(text.as_bytes()).unwrap());
    let back = serde_json::Value::from(&value);
    assert_eq!(back, json);
    assert_eq!(serde_json::to_string(&value).unwrap(), value.to_string());
}

fn string_strategy() -> impl Strategy<Value = String> {
    let ascii = ' '..='~';
    // CJK Unified Ideographs
    let cjk = '\u{4E00}'..='\u{9FFF}';

    let chars: Vec<char> = ascii.chain(cjk).chain(['\n', '\t', '\u{1}']).collect();
    prop::collection::vec(prop::sample::select(chars), 0..30).prop_map(|v| v.into_iter().collect())
}

fn json_strategy() -> impl Strategy<Value = Value<'static>> {
    let leaf = prop_oneof![
        Just(Value::null()),
        any::<bool>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("finite", |x| x.is_finite() && *x != -0.0)
            .prop_map(Value::from),
        string_strategy().prop_map(Value::from),
    ];

    leaf.prop_recursive(8, 256, 20, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..10).prop_map(Value::from),
            prop::collection::btree_map(string_strategy(), inner, 0..10)
                .prop_map(|map| map.into_iter().collect::<Value>()),
        ]
    })
}

proptest! {
    #[test]
    fn proptest_json_round_trip(json in json_strategy()) {
        let source = json.to_string();

        let res1 = serde_json::from_slice::<serde_json::Value>(source.as_bytes());
        let res2 = parse_value(source.as_bytes());
        prop_assert_eq!(res1.is_ok(), res2.is_ok());
        let parsed = res2.unwrap();
        prop_assert_eq!(&parsed, &json);
        prop_assert_eq!(parsed.to_string(), source);
    }
}
