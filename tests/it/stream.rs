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
use jsonmodel::json::Feed;
use jsonmodel::json::JsonReadOptions;
use jsonmodel::json::JsonStreamParser;
use jsonmodel::Error;
use jsonmodel::Result;
use jsonmodel::Value;

const INPUT: &str = r#"{"a":[1,2,{"b":"x\"y"}]} 12 "str" [true,null] -3.5e2 {}"#;

fn drain(parser: &mut JsonStreamParser, chunk: &[u8], values: &mut Vec<Value<'static>>) -> Result<()> {
    let mut feed = parser.feed(chunk)?;
    while let Feed::Done(value) = feed {
        values.push(value);
        feed = parser.feed(&[])?;
    }
    Ok(())
}

fn parse_chunks(chunks: &[&[u8]]) -> Result<Vec<Value<'static>>> {
    let mut parser = JsonStreamParser::new();
    let mut values = Vec::new();
    for chunk in chunks {
        drain(&mut parser, chunk, &mut values)?;
    }
    if let Some(value) = parser.finish()? {
        values.push(value);
    }
    Ok(values)
}

fn expected() -> Vec<Value<'static>> {
    [
        r#"{"a":[1,2,{"b":"x\"y"}]}"#,
        "12",
        r#""str""#,
        "[true,null]",
        "-3.5e2",
        "{}",
    ]
    .iter()
    .map(|s| parse_value(s.as_bytes()).unwrap())
    .collect()
}

#[test]
fn test_whole_input() {
    assert_eq!(parse_chunks(&[INPUT.as_bytes()]).unwrap(), expected());
}

#[test]
fn test_every_split_point() {
    let input = INPUT.as_bytes();
    for mid in 0..=input.len() {
        let (head, tail) = input.split_at(mid);
        assert_eq!(parse_chunks(&[head, tail]).unwrap(), expected(), "split at {mid}");
    }
}

#[test]
fn test_byte_by_byte() {
    let chunks: Vec<&[u8]> = INPUT.as_bytes().chunks(1).collect();
    assert_eq!(parse_chunks(&chunks).unwrap(), expected());
}

#[test]
fn test_trailing_scalar_needs_finish() {
    let mut parser = JsonStreamParser::new();
    assert_eq!(parser.feed(b"[1] 42").unwrap(), Feed::Done(Value::from(vec![1])));
    assert_eq!(parser.feed(&[]).unwrap(), Feed::NeedMore);
    assert_eq!(parser.finish().unwrap(), Some(Value::from(42)));
    assert_eq!(parser.buffered(), 0);
}

#[test]
fn test_open_value_at_finish() {
    let mut parser = JsonStreamParser::new();
    assert_eq!(parser.feed(br#"{"a":[1,"#).unwrap(), Feed::NeedMore);
    assert!(parser.finish().is_err());
    // the parser starts over after a failed finish
    assert_eq!(parser.feed(b"true ").unwrap(), Feed::Done(Value::from(true)));
}

#[test]
fn test_syntax_error_in_value() {
    let mut parser = JsonStreamParser::new();
    let err = parser.feed(b"[1 2] [3]").unwrap_err();
    assert!(matches!(err, Error::Syntax(..)));
    assert_eq!(err.to_string(), "expected `,` or `]`, line 1 column 4");
    // the broken value is dropped, the rest of the input is kept
    assert_eq!(parser.feed(&[]).unwrap(), Feed::Done(Value::from(vec![3])));
}

#[test]
fn test_stream_options() {
    assert!(matches!(
        JsonStreamParser::with_options(JsonReadOptions::new().max_nesting_depth(0)),
        Err(Error::InvalidOptions(_))
    ));
    let options = JsonReadOptions::new().max_nesting_depth(1);
    let mut parser = JsonStreamParser::with_options(options).unwrap();
    assert!(parser.feed(b"[[1]]").unwrap_err().is_nesting_depth_exceeded());
    assert_eq!(parser.feed(b"[1]").unwrap(), Feed::Done(Value::from(vec![1])));
}

#[test]
fn test_stray_close_keeps_pending_values() {
    let mut parser = JsonStreamParser::new();
    assert_eq!(parser.feed(b"7] [1]").unwrap(), Feed::Done(Value::from(7)));
    let err = parser.feed(&[]).unwrap_err();
    assert_eq!(err.to_string(), "expected value, line 1 column 1");
    assert_eq!(parser.feed(&[]).unwrap(), Feed::Done(Value::from(vec![1])));

    let mut values = Vec::new();
    assert!(drain(&mut parser, b"12 } \"x\" 3", &mut values).is_err());
    assert_eq!(values, vec![Value::from(12)]);
    drain(&mut parser, b" ", &mut values).unwrap();
    assert_eq!(values, vec![Value::from(12), Value::from("x"), Value::from(3)]);
}
