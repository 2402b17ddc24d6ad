#![allow(clippy::bool_assert_comparison)]
use indoc::indoc;
use jsonbind::{from_str, Engine, EngineConfig, ErrorKind, Found, Value};
use quickcheck_macros::quickcheck;
use std::collections::{BTreeMap, HashMap, VecDeque};

#[test]
fn test_bool() {
    assert_eq!(from_str::<bool>("true").unwrap(), true);
    assert_eq!(from_str::<bool>(" false ").unwrap(), false);
    assert_eq!(from_str::<bool>("\"true\"").unwrap(), true);
    let err = from_str::<bool>("null").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnexpectedNull("bool")));
    assert!(from_str::<bool>("tru").is_err());
}

#[test]
fn test_str() {
    assert_eq!(
        from_str::<String>("\"Hello world!\"").unwrap(),
        "Hello world!"
    );
    assert_eq!(from_str::<String>("\"\\t\\n\\/\"").unwrap(), "\t\n/");
    assert_eq!(from_str::<String>(r#""\u00e9\ud83d\ude00""#).unwrap(), "\u{e9}\u{1F600}");
    let err = from_str::<String>("42").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::ExpectedString(_)));
}

#[test]
fn test_char() {
    assert_eq!(from_str::<char>("\"x\"").unwrap(), 'x');
    assert_eq!(from_str::<char>("\"\\u0041\"").unwrap(), 'A');
    let err = from_str::<char>("\"xy\"").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::BadChar));
    assert!(from_str::<char>("\"\"").is_err());
}

#[test]
fn test_integer() {
    assert_eq!(from_str::<u32>("1234").unwrap(), 1234);
    assert_eq!(from_str::<u32>("-0").unwrap(), 0);
    assert!(from_str::<u32>("-20").is_err());
    assert_eq!(from_str::<u8>("255").unwrap(), 255);
    assert_eq!(from_str::<i8>("127").unwrap(), 127);
    assert_eq!(from_str::<i8>("-128").unwrap(), -128);
    assert_eq!(from_str::<u32>("12E3").unwrap(), 12000);
    assert_eq!(from_str::<u32>("1000E-3").unwrap(), 1);
    assert_eq!(from_str::<i64>("\"-42\"").unwrap(), -42);
    assert_eq!(
        from_str::<u128>("340282366920938463463374607431768211455").unwrap(),
        u128::MAX
    );
    assert_eq!(from_str::<i32>("1.00000000000").unwrap(), 1);
    assert_eq!(from_str::<u8>("2.50e1").unwrap(), 25);
    assert!(from_str::<i32>("15.7").is_err());
    assert!(from_str::<u32>("01234").is_err());
    assert!(from_str::<u32>("-01234").is_err());
    assert!(from_str::<u32>("1.").is_err());
}

#[test]
fn test_integer_overflow() {
    let err = from_str::<i8>("128").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::NumberOverflow("i8")));
    let err = from_str::<u8>("256").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::NumberOverflow("u8")));
    let err = from_str::<u64>("18446744073709551616").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::NumberOverflow("u64")));
    assert_eq!(from_str::<i32>("-2147483648").unwrap(), i32::MIN);
    assert!(from_str::<i32>("-2147483649").is_err());
}

#[test]
fn test_float() {
    assert_eq!(from_str::<f32>("3.125").unwrap(), 3.125);
    assert_eq!(from_str::<f32>("1.0e7").unwrap(), 1.0e7);
    assert_eq!(from_str::<f32>("1.625e+3").unwrap(), 1.625e3);
    assert_eq!(from_str::<f64>("-1.0e-4").unwrap(), -1.0e-4);
    assert_eq!(from_str::<f64>("-0.125").unwrap(), -0.125);
    assert_eq!(from_str::<f64>("\"2.5\"").unwrap(), 2.5);
    assert!(from_str::<f64>("-0e5").unwrap().is_sign_negative());
    assert!(from_str::<f64>("1e").is_err());
    assert!(from_str::<f64>(".5").is_err());
}

#[test]
fn test_option() {
    assert_eq!(from_str::<Option<u32>>("null").unwrap(), None);
    assert_eq!(from_str::<Option<u32>>(" 7 ").unwrap(), Some(7));
    assert!(from_str::<Option<u32>>("nul").is_err());
    assert_eq!(from_str::<Box<u32>>("3").unwrap(), Box::new(3));
}

#[test]
fn test_list() {
    assert_eq!(
        from_str::<Vec<u32>>("[1, 1, 2, 3, 5, 7]").unwrap(),
        vec![1, 1, 2, 3, 5, 7]
    );
    assert_eq!(from_str::<Vec<u32>>("[]").unwrap(), Vec::<u32>::new());
    assert_eq!(
        from_str::<Box<[bool]>>("[true, false]").unwrap(),
        vec![true, false].into_boxed_slice()
    );
    assert_eq!(
        from_str::<VecDeque<i8>>("[-1, 2]").unwrap(),
        VecDeque::from(vec![-1, 2])
    );
    assert_eq!(
        from_str::<Vec<Option<u32>>>("[1, null, 3]").unwrap(),
        vec![Some(1), None, Some(3)]
    );
    assert!(from_str::<Vec<u32>>("[1, null]").is_err());
    assert!(from_str::<Vec<u32>>("[1, 2,]").is_err());
    assert!(from_str::<Vec<u32>>("[1 2]").is_err());
    let err = from_str::<Vec<u32>>("{}").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::ExpectedArray(_)));
}

#[test]
fn test_map() {
    let map = from_str::<HashMap<String, u32>>(r#"{"a": 1, "b": 2}"#).unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map["a"], 1);
    assert_eq!(map["b"], 2);

    let map = from_str::<BTreeMap<u32, String>>(r#"{"3": "three", "1": "one"}"#).unwrap();
    assert_eq!(
        map.into_iter().collect::<Vec<_>>(),
        vec![(1, "one".to_owned()), (3, "three".to_owned())]
    );

    let map = from_str::<BTreeMap<u32, bool>>(indoc! {r#"
        [
            {"Key": 5, "Value": true},
            {"k": 6, "v": false}
        ]
    "#})
    .unwrap();
    assert_eq!(map.get(&5), Some(&true));
    assert_eq!(map.get(&6), Some(&false));

    assert!(from_str::<HashMap<String, u32>>("{}").unwrap().is_empty());
    assert!(from_str::<HashMap<String, u32>>("[]").unwrap().is_empty());
    let err = from_str::<HashMap<String, u32>>("null").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnexpectedNull(_)));
}

#[test]
fn test_untyped() {
    let value = from_str::<Value>(indoc! {r#"
        {
            "name": "Finland",
            "pop": 5.5e6,
            "langs": ["fi", "sv"],
            "eu": true,
            "capital": null,
            "regions": {}
        }
    "#})
    .unwrap();
    assert!(value.is_object());
    assert_eq!(value.get("name").and_then(Value::as_str), Some("Finland"));
    let pop = value.get("pop").and_then(Value::as_number).unwrap();
    assert_eq!(pop.as_str(), "5.5e6");
    assert_eq!(pop.as_f64(), Some(5.5e6));
    let langs = value.get("langs").and_then(Value::as_array).unwrap();
    assert_eq!(langs, &[Value::from("fi"), Value::from("sv")]);
    assert_eq!(value.get("eu").and_then(Value::as_bool), Some(true));
    assert!(value.get("capital").unwrap().is_null());
    assert!(value.get("regions").and_then(Value::as_object).unwrap().is_empty());
    assert_eq!(value.members().count(), 6);
}

#[test]
fn test_untyped_duplicate_key() {
    let value = from_str::<Value>(r#"{"a": 1, "a": 2}"#).unwrap();
    assert_eq!(value.get("a").and_then(Value::as_number).unwrap().as_str(), "2");
}

#[test]
fn test_comments() {
    let source = indoc! {r#"
        {
            /* The population of the country */
            "pop": 5500000,
            // The official languages of the country
            "langs": ["fi", "sv"]
        }
    "#};
    assert!(from_str::<Value>(source).is_err());
    let mut engine = Engine::with_config(EngineConfig::permissive()).unwrap();
    let value: Value = engine.parse(source).unwrap();
    assert_eq!(value.get("pop").and_then(Value::as_number).unwrap().as_u64(), Some(5500000));
}

#[test]
fn test_trailing_characters() {
    let err = from_str::<u32>("12 x").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::TrailingCharacters));
    assert_eq!(err.position(), Some(3));
    assert_eq!(err.found(), Some(Found::Char('x')));
    assert_eq!(from_str::<u32>(" 12 \n").unwrap(), 12);
}

#[test]
fn test_error_position() {
    let err = from_str::<Vec<u32>>("[1, 2, x]").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnexpectedNull(_) | ErrorKind::BadNumber(_)));
    assert_eq!(err.position(), Some(7));
    assert_eq!(err.found(), Some(Found::Char('x')));

    let err = from_str::<String>("\"open").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnexpectedEof));
    assert_eq!(err.position(), Some(5));
    assert_eq!(err.found(), Some(Found::Eof));
    assert_eq!(err.to_string(), "unexpected EOF at 5 (found EOF)");
}

#[test]
fn test_depth_limit() {
    let config = EngineConfig {
        max_depth: 4,
        ..EngineConfig::strict()
    };
    let mut engine = Engine::with_config(config).unwrap();
    assert!(engine.parse::<Value>("[[[[1]]]]").is_ok());
    let err = engine.parse::<Value>("[[[[[1]]]]]").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::DepthLimit(4)));
}

#[test]
fn test_long_strings() {
    let mut engine = Engine::new();
    for len in [0, 1, 255, 256, 257, 1000] {
        let text: String = (0..len).map(|i| (b'a' + (i % 26) as u8) as char).collect();
        let source = format!("[\"{}\", \"\\u0041{}\"]", text, text);
        let parsed: Vec<String> = engine.parse(&source).unwrap();
        assert_eq!(parsed[0], text);
        assert_eq!(parsed[1], format!("A{}", text));
    }
}

#[test]
fn test_engine_reuse() {
    let mut engine = Engine::new();
    assert!(engine.parse::<u32>("x").is_err());
    assert_eq!(engine.parse::<Vec<String>>(r#"["a", "b"]"#).unwrap(), ["a", "b"]);
    assert_eq!(engine.parse::<u32>("5").unwrap(), 5);
}

#[quickcheck]
fn test_integer_text(value: i64) -> bool {
    from_str::<i64>(&value.to_string()).ok() == Some(value)
        && from_str::<i64>(&format!("\"{}\"", value)).ok() == Some(value)
}

#[quickcheck]
fn test_float_text(value: f64) -> bool {
    if !value.is_finite() {
        return true;
    }
    let text = format!("{:e}", value);
    from_str::<f64>(&text).ok() == Some(value) && from_str::<Value>(&text).is_ok()
}

#[cfg(feature = "uuid")]
#[test]
fn test_uuid() {
    let id = from_str::<uuid::Uuid>(r#""67e55044-10b1-426f-9247-bb680e5fe0c8""#).unwrap();
    assert_eq!(id.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    let err = from_str::<uuid::Uuid>(r#""not-a-uuid""#).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::BadText("uuid")));
    assert!(from_str::<Option<uuid::Uuid>>("null").unwrap().is_none());
}

#[cfg(feature = "rust_decimal")]
#[test]
fn test_decimal() {
    use rust_decimal::Decimal;
    let value = from_str::<Decimal>("-12.3450").unwrap();
    assert_eq!(value.to_string(), "-12.3450");
    assert_eq!(from_str::<Decimal>("\"0.1\"").unwrap(), Decimal::new(1, 1));
    assert_eq!(
        from_str::<Vec<Decimal>>("[1, 2.5]").unwrap(),
        [Decimal::new(1, 0), Decimal::new(25, 1)]
    );
    let err = from_str::<Decimal>("1.5e3").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::BadNumber("decimal")));
    assert_eq!(err.position(), Some(3));
    assert!(from_str::<Decimal>(".5").is_err());
    assert!(from_str::<Decimal>("\"1.5").is_err());
    let err = from_str::<Decimal>("null").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnexpectedNull("decimal")));
}

#[cfg(feature = "chrono")]
#[test]
fn test_datetime() {
    use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike, Utc};
    let time = from_str::<DateTime<FixedOffset>>(r#""2024-03-01T12:30:00+02:00""#).unwrap();
    assert_eq!(time.offset().local_minus_utc(), 7200);
    let time = from_str::<DateTime<Utc>>(r#""2024-03-01T12:30:00+02:00""#).unwrap();
    assert_eq!(time.hour(), 10);
    let date = from_str::<NaiveDate>(r#""2024-03-01""#).unwrap();
    assert_eq!(date.month(), 3);
    let err = from_str::<NaiveDate>(r#""yesterday""#).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::BadText("date")));
}
