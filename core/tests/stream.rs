use indoc::indoc;
use jsonbind::{from_reader, Bind, Encoding, Engine, ErrorKind, Found, Mappers, Selection, Value};

#[derive(Bind, Default, Debug, PartialEq)]
struct Entry {
    key: String,
    weight: f32,
    tags: Vec<String>,
}

const SOURCE: &str = indoc! {r#"
    [
        { "key": "café", "weight": 0.5, "tags": ["π", "😀"] },
        { "key": "plain", "weight": -2, "tags": [] }
    ]
"#};

fn expected() -> Vec<Entry> {
    vec![
        Entry {
            key: "café".to_owned(),
            weight: 0.5,
            tags: vec!["π".to_owned(), "😀".to_owned()],
        },
        Entry {
            key: "plain".to_owned(),
            weight: -2.0,
            tags: Vec::new(),
        },
    ]
}

fn utf16(text: &str, big_endian: bool) -> Vec<u8> {
    text.encode_utf16()
        .flat_map(|unit| match big_endian {
            true => unit.to_be_bytes(),
            false => unit.to_le_bytes(),
        })
        .collect()
}

#[test]
fn test_utf8() {
    assert_eq!(from_reader::<Vec<Entry>>(SOURCE.as_bytes()).unwrap(), expected());
    let mut engine = Engine::new();
    let entries: Vec<Entry> = engine
        .parse_reader(SOURCE.as_bytes(), Encoding::Utf8)
        .unwrap();
    assert_eq!(entries, expected());
}

#[test]
fn test_utf16() {
    let mut engine = Engine::new();
    let entries: Vec<Entry> = engine
        .parse_reader(utf16(SOURCE, false).as_slice(), Encoding::Utf16Le)
        .unwrap();
    assert_eq!(entries, expected());
    let entries: Vec<Entry> = engine
        .parse_reader(utf16(SOURCE, true).as_slice(), Encoding::Utf16Be)
        .unwrap();
    assert_eq!(entries, expected());
}

#[test]
fn test_matches_text() {
    let mut engine = Engine::new();
    let source = r#"{"a": [1, 2.5, "x", null, true], "b": {"c": {}}}"#;
    let from_text: Value = engine.parse(source).unwrap();
    let from_stream: Value = engine
        .parse_reader(source.as_bytes(), Encoding::Utf8)
        .unwrap();
    assert_eq!(from_text, from_stream);
}

#[test]
fn test_error_position() {
    let source = "[\"\u{e9}\u{e9}\", x]";
    let from_text = jsonbind::from_str::<Vec<String>>(source).unwrap_err();
    let from_stream = from_reader::<Vec<String>>(source.as_bytes()).unwrap_err();
    assert_eq!(from_text.position(), Some(7));
    assert_eq!(from_stream.position(), Some(7));
    assert_eq!(from_stream.found(), Some(Found::Char('x')));
}

#[test]
fn test_invalid_data() {
    let err = from_reader::<String>(&b"\"ab\xff\""[..]).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Io(_)));
    assert!(std::error::Error::source(&err).is_some());

    let err = from_reader::<u32>(&b"\xc3"[..]).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Io(_)));

    // Overlong encodings are rejected, as they are for text
    let err = from_reader::<String>(&b"\"a\xc0\x80\""[..]).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Io(_)));

    // A lone surrogate
    let mut engine = Engine::new();
    let bytes = [0x22, 0x00, 0x00, 0xD8, 0x22, 0x00];
    let err = engine
        .parse_reader::<String>(&bytes[..], Encoding::Utf16Le)
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Io(_)));
}

#[test]
fn test_long_string() {
    let text = "0123456789abcdef".repeat(100);
    let source = format!("{{\"key\": \"{}\", \"tags\": [\"{}\"]}}", text, text);
    let entry = from_reader::<Entry>(source.as_bytes()).unwrap();
    assert_eq!(entry.key, text);
    assert_eq!(entry.tags, [text]);
}

#[test]
fn test_mappers() {
    let mut engine = Engine::new();
    let mappers = Mappers::new().on::<Entry>(|ctx| match ctx.member.name() {
        Some("tags") => Selection::Skip,
        _ => Selection::Keep,
    });
    let entries: Vec<Entry> = engine
        .parse_reader_with(SOURCE.as_bytes(), Encoding::Utf8, &mappers)
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|entry| entry.tags.is_empty()));
}

#[test]
fn test_trailing() {
    let err = from_reader::<u32>(&b"1 2"[..]).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::TrailingCharacters));
    assert_eq!(from_reader::<u32>(&b"  1\n"[..]).unwrap(), 1);
}
