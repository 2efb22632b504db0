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

use jsonmodel::json::parse_to_visitor;
use jsonmodel::json::parse_value;
use jsonmodel::json::JsonEncoder;
use jsonmodel::json::JsonReadOptions;
use jsonmodel::DecodeOptions;
use jsonmodel::Error;
use jsonmodel::Event;
use jsonmodel::EventCollector;
use jsonmodel::FragmentFilter;
use jsonmodel::KeyOrder;
use jsonmodel::RenameKeyFilter;
use jsonmodel::SemanticTag;
use jsonmodel::SerContext;
use jsonmodel::Value;
use jsonmodel::ValueDecoder;
use jsonmodel::VisitFlow;
use jsonmodel::Visitor;

fn nested_arrays(depth: usize) -> String {
    format!("{}{}", "[".repeat(depth), "]".repeat(depth))
}

#[test]
fn test_decoder_depth_limit() {
    let options = DecodeOptions::new().max_nesting_depth(4);
    let read_options = JsonReadOptions::new().max_nesting_depth(64);

    let mut decoder = ValueDecoder::with_options(options).unwrap();
    parse_to_visitor(nested_arrays(4).as_bytes(), &read_options, &mut decoder).unwrap();
    assert!(decoder.is_valid());
    assert_eq!(decoder.get_result().unwrap().to_string(), "[[[[]]]]");

    let mut decoder = ValueDecoder::with_options(options).unwrap();
    let err = parse_to_visitor(nested_arrays(5).as_bytes(), &read_options, &mut decoder)
        .unwrap_err();
    assert!(err.is_nesting_depth_exceeded());
    assert!(matches!(err, Error::MaxNestingDepthExceeded(4)));
    assert!(!decoder.is_valid());
}

#[test]
fn test_parser_depth_limit() {
    let options = JsonReadOptions::new().max_nesting_depth(3);
    let text = r#"{"a":{"b":{"c":{}}}}"#;
    let err = jsonmodel::json::parse_value_with_options(text.as_bytes(), &options).unwrap_err();
    assert!(err.is_nesting_depth_exceeded());
    let options = JsonReadOptions::new().max_nesting_depth(4);
    assert!(jsonmodel::json::parse_value_with_options(text.as_bytes(), &options).is_ok());
}

#[test]
fn test_decoder_reuse() {
    let mut decoder = ValueDecoder::new();
    let options = JsonReadOptions::default();
    parse_to_visitor(b"[1,2]", &options, &mut decoder).unwrap();
    assert_eq!(decoder.get_result().unwrap(), Value::from(vec![1, 2]));
    assert!(matches!(decoder.get_result(), Err(Error::Incomplete)));

    // a failed parse leaves partial state behind until reset
    assert!(parse_to_visitor(b"[1,", &options, &mut decoder).is_err());
    decoder.reset();
    parse_to_visitor(br#"{"k":null}"#, &options, &mut decoder).unwrap();
    assert_eq!(decoder.get_result().unwrap().to_string(), r#"{"k":null}"#);
}

#[test]
fn test_decoder_key_order() {
    let ctx = SerContext::default();
    let mut decoder =
        ValueDecoder::with_options(DecodeOptions::new().key_order(KeyOrder::Preserved)).unwrap();
    decoder.visit_begin_object(None, SemanticTag::None, &ctx).unwrap();
    for (k, v) in [("z", 1), ("a", 2), ("z", 3)] {
        decoder.visit_key(k, &ctx).unwrap();
        decoder.visit_int64(v, SemanticTag::None, &ctx).unwrap();
    }
    decoder.visit_end_object(&ctx).unwrap();
    decoder.flush().unwrap();

    // duplicate keys in one batch keep the first occurrence
    let value = decoder.get_result().unwrap();
    assert_eq!(value.to_string(), r#"{"z":1,"a":2}"#);
}

#[test]
fn test_rename_key() {
    let mut decoder = ValueDecoder::new();
    {
        let mut filter = RenameKeyFilter::new("x", "y", &mut decoder);
        parse_to_visitor(br#"{"x":1}"#, &JsonReadOptions::default(), &mut filter).unwrap();
    }
    assert_eq!(decoder.get_result().unwrap().to_string(), r#"{"y":1}"#);
}

#[test]
fn test_rename_key_chain() {
    let value = parse_value(br#"{"x":1}"#).unwrap();
    let mut decoder = ValueDecoder::new();
    {
        let mut second = RenameKeyFilter::new("y", "z", &mut decoder);
        let mut first = RenameKeyFilter::new("x", "y", &mut second);
        value.dump(&mut first).unwrap();
    }
    assert_eq!(decoder.get_result().unwrap().to_string(), r#"{"z":1}"#);
}

#[test]
fn test_fragments_in_outer_stream() {
    let ctx = SerContext::default();
    let first = parse_value(br#"{"a":1}"#).unwrap();
    let second = parse_value(b"[2,true]").unwrap();

    let mut encoder = JsonEncoder::new(Vec::new());
    encoder.visit_begin_array(None, SemanticTag::None, &ctx).unwrap();
    for value in [&first, &second] {
        let mut fragment = FragmentFilter::new(&mut encoder);
        value.dump(&mut fragment).unwrap();
    }
    encoder.visit_end_array(&ctx).unwrap();
    encoder.flush().unwrap();

    let text = String::from_utf8(encoder.into_inner()).unwrap();
    assert_eq!(text, r#"[{"a":1},[2,true]]"#);
}

#[test]
fn test_dump_partial_into_open_object() {
    let ctx = SerContext::default();
    let inner = parse_value(b"[1,2]").unwrap();

    let mut decoder = ValueDecoder::new();
    decoder.visit_begin_object(None, SemanticTag::None, &ctx).unwrap();
    decoder.visit_key("items", &ctx).unwrap();
    assert_eq!(inner.dump_partial(&mut decoder).unwrap(), VisitFlow::Continue);
    assert!(!decoder.is_valid());
    decoder.visit_end_object(&ctx).unwrap();
    assert_eq!(decoder.get_result().unwrap().to_string(), r#"{"items":[1,2]}"#);
}

#[test]
fn test_stop_halts_dump() {
    let value = parse_value(br#"{"a":[1,2,3],"b":4}"#).unwrap();
    let mut collector = EventCollector::with_limit(4);
    value.dump(&mut collector).unwrap();
    assert_eq!(
        collector.events(),
        &[
            Event::BeginObject(Some(2), SemanticTag::None),
            Event::Key("a".to_string()),
            Event::BeginArray(Some(3), SemanticTag::None),
            Event::UInt64(1, SemanticTag::None),
        ]
    );
    // dump flushes even after an early stop
    assert!(collector.is_flushed());
}

#[test]
fn test_replay() {
    let mut collector = EventCollector::new();
    parse_to_visitor(
        br#"{"k":["v",null,1.5]}"#,
        &JsonReadOptions::default(),
        &mut collector,
    )
    .unwrap();
    assert!(collector.is_flushed());

    let mut decoder = ValueDecoder::new();
    collector.replay(&mut decoder).unwrap();
    assert_eq!(decoder.get_result().unwrap().to_string(), r#"{"k":["v",null,1.5]}"#);
}

#[test]
fn test_protocol_violations() {
    let ctx = SerContext::default();
    let mut decoder = ValueDecoder::new();
    decoder.visit_begin_object(None, SemanticTag::None, &ctx).unwrap();
    assert!(matches!(
        decoder.visit_int64(1, SemanticTag::None, &ctx),
        Err(Error::UnexpectedEvent(_))
    ));

    let mut decoder = ValueDecoder::new();
    decoder.visit_begin_array(None, SemanticTag::None, &ctx).unwrap();
    assert!(matches!(
        decoder.visit_end_object(&ctx),
        Err(Error::UnexpectedEvent(_))
    ));
}
