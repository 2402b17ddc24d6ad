use jsonbind::{Bind, Engine, Map, Mappers, Selection, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

#[derive(Bind, Default, Debug, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Bind, Default, Debug, PartialEq)]
struct Line {
    from: Point,
    to: Point,
}

#[derive(Bind, Debug, PartialEq)]
#[json(constructor)]
struct Span {
    start: u32,
    end: u32,
}

fn skip_member(name: &'static str) -> impl Fn(&jsonbind::MemberContext<'_>) -> Selection {
    move |ctx| match ctx.member.name() {
        Some(member) if member == name => Selection::Skip,
        _ => Selection::Keep,
    }
}

#[test]
fn test_skip() {
    let mut engine = Engine::new();
    let mappers = Mappers::new().on::<Point>(skip_member("y"));
    let point: Point = engine
        .parse_with(r#"{"x": 1, "y": [{"ignored": true}]}"#, &mappers)
        .unwrap();
    assert_eq!(point, Point { x: 1, y: 0 });

    // Skipped values must still be well-formed
    assert!(engine
        .parse_with::<Point>(r#"{"x": 1, "y": [}"#, &mappers)
        .is_err());
}

#[test]
fn test_nested() {
    let mut engine = Engine::new();
    let mappers = Mappers::new().on::<Point>(skip_member("x"));
    let line: Line = engine
        .parse_with(
            r#"{"from": {"x": 1, "y": 2}, "to": {"x": 3, "y": 4}}"#,
            &mappers,
        )
        .unwrap();
    assert_eq!(
        line,
        Line {
            from: Point { x: 0, y: 2 },
            to: Point { x: 0, y: 4 }
        }
    );
}

#[test]
fn test_transform() {
    let mut engine = Engine::new();
    let mappers = Mappers::new().on::<Point>(|ctx| match ctx.member.name() {
        Some("x") => Selection::transform(|point: &mut Point| point.y = 100),
        Some("y") => Selection::transform(|point: &mut Point| point.y = 200),
        _ => Selection::Keep,
    });

    // The transform runs after all members are read, and only the first one applies
    let point: Point = engine.parse_with(r#"{"x": 1, "y": 2}"#, &mappers).unwrap();
    assert_eq!(point, Point { x: 1, y: 100 });
    let point: Point = engine.parse_with(r#"{"y": 2, "x": 1}"#, &mappers).unwrap();
    assert_eq!(point, Point { x: 1, y: 200 });
    let point: Point = engine.parse_with("{}", &mappers).unwrap();
    assert_eq!(point, Point::default());
}

#[test]
fn test_container() {
    let mut engine = Engine::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mappers = Mappers::new().on::<Point>({
        let seen = seen.clone();
        move |ctx| {
            assert_eq!(ctx.declaring, "Point");
            let point = ctx.container::<Point>().unwrap();
            seen.lock().unwrap().push((point.x, point.y));
            Selection::Keep
        }
    });
    let _: Point = engine.parse_with(r#"{"x": 5, "y": 6}"#, &mappers).unwrap();
    assert_eq!(*seen.lock().unwrap(), [(0, 0), (5, 0)]);
}

#[test]
fn test_stale_mappers() {
    let mut engine = Engine::new();
    let mappers = Mappers::new().on::<Point>(skip_member("x"));
    let point: Point = engine.parse_with(r#"{"x": 1, "y": 2}"#, &mappers).unwrap();
    assert_eq!(point, Point { x: 0, y: 2 });
    let point: Point = engine.parse(r#"{"x": 1, "y": 2}"#).unwrap();
    assert_eq!(point, Point { x: 1, y: 2 });
    let mappers = Mappers::new().on::<Point>(skip_member("y"));
    let point: Point = engine.parse_with(r#"{"x": 1, "y": 2}"#, &mappers).unwrap();
    assert_eq!(point, Point { x: 1, y: 0 });
}

#[test]
fn test_constructor_record() {
    let mut engine = Engine::new();
    let mappers = Mappers::new().on::<Span>(|_| Selection::Skip);
    let span: Span = engine
        .parse_with(r#"{"start": 1, "end": 2}"#, &mappers)
        .unwrap();
    assert_eq!(span, Span { start: 1, end: 2 });
}

#[test]
fn test_sequence() {
    let mut engine = Engine::new();
    let mappers = Mappers::new().on::<Vec<u32>>(|ctx| match ctx.member.index() {
        Some(index) if index % 2 == 1 => Selection::Skip,
        _ => Selection::Keep,
    });
    let items: Vec<u32> = engine
        .parse_with("[10, 11, 12, 13, 14]", &mappers)
        .unwrap();
    assert_eq!(items, [10, 12, 14]);

    let mappers = Mappers::new().on::<Vec<u32>>(|ctx| match ctx.member.index() {
        Some(0) => Selection::transform(|items: &mut Vec<u32>| items.sort()),
        _ => Selection::Keep,
    });
    let items: Vec<u32> = engine.parse_with("[3, 1, 2]", &mappers).unwrap();
    assert_eq!(items, [1, 2, 3]);
}

#[test]
fn test_sequence_nulls() {
    let mut engine = Engine::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mappers = Mappers::new().on::<Vec<Option<u32>>>({
        let seen = seen.clone();
        move |ctx| {
            seen.lock().unwrap().extend(ctx.member.index());
            Selection::Keep
        }
    });
    let items: Vec<Option<u32>> = engine
        .parse_with("[1, null, 3]", &mappers)
        .unwrap();
    assert_eq!(items, [Some(1), None, Some(3)]);
    assert_eq!(*seen.lock().unwrap(), [0, 2]);
}

#[test]
fn test_map() {
    let mut engine = Engine::new();
    let mappers = Mappers::new().on::<HashMap<String, u32>>(|ctx| match ctx.member.name() {
        Some(name) if name.starts_with('_') => Selection::Skip,
        _ => Selection::Keep,
    });
    let map: HashMap<String, u32> = engine
        .parse_with(r#"{"a": 1, "_hidden": 2, "b": 3}"#, &mappers)
        .unwrap();
    assert_eq!(map.len(), 2);
    assert!(!map.contains_key("_hidden"));

    let mappers = Mappers::new().on::<BTreeMap<u32, String>>(|ctx| match ctx.member.key::<u32>() {
        Some(&key) if key > 10 => Selection::Skip,
        _ => Selection::Keep,
    });
    let map: BTreeMap<u32, String> = engine
        .parse_with(r#"{"1": "a", "20": "b", "3": "c"}"#, &mappers)
        .unwrap();
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), [1, 3]);

    // Pairs in array form are not seen by the hook
    let map: BTreeMap<u32, String> = engine
        .parse_with(r#"[{"Key": 20, "Value": "b"}]"#, &mappers)
        .unwrap();
    assert_eq!(map.len(), 1);
}

#[test]
fn test_untyped() {
    let mut engine = Engine::new();
    let mappers = Mappers::new().on::<Value>(|ctx| {
        assert_eq!(ctx.declaring, "object");
        assert!(ctx.container::<Map>().is_some());
        match ctx.member.name() {
            Some("secret") => Selection::Skip,
            _ => Selection::Keep,
        }
    });
    let value: Value = engine
        .parse_with(
            r#"{"user": {"name": "ann", "secret": "x"}, "secret": 1}"#,
            &mappers,
        )
        .unwrap();
    assert!(value.get("secret").is_none());
    let user = value.get("user").unwrap();
    assert_eq!(user.get("name").and_then(Value::as_str), Some("ann"));
    assert!(user.get("secret").is_none());
}
