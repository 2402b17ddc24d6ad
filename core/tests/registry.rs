use jsonbind::{from_str, Bind, Engine, ErrorKind, ScalarKind, Shape, TypeHandle, Value};
use std::collections::BTreeMap;

#[derive(Bind, Default, Debug, PartialEq)]
struct Node {
    value: i32,
    next: Option<Box<Node>>,
}

#[derive(Bind, Default, Debug, PartialEq)]
#[json(name = "bad name")]
struct BadName {
    x: u32,
}

#[derive(Bind, Default, Debug, PartialEq)]
struct Holder {
    count: u64,
    inner: BadName,
}

#[derive(Bind, Default, Debug, PartialEq)]
#[json(name = "com.example.Thing")]
struct Thing {
    tags: Vec<String>,
    scores: BTreeMap<String, f64>,
}

#[derive(Bind, Debug, PartialEq)]
enum Mode {
    Off,
    On = 3,
}

#[derive(Bind, Default, Debug, PartialEq)]
struct Tree {
    children: Vec<Tree>,
    mode: Option<Mode>,
}

#[test]
fn test_recursive() {
    let node = from_str::<Node>(r#"{"value": 1, "next": {"value": 2, "next": {"value": 3}}}"#)
        .unwrap();
    assert_eq!(
        node,
        Node {
            value: 1,
            next: Some(Box::new(Node {
                value: 2,
                next: Some(Box::new(Node {
                    value: 3,
                    next: None
                }))
            }))
        }
    );

    let tree = from_str::<Tree>(r#"{"children": [{"children": [{}]}, {"mode": "On"}]}"#).unwrap();
    assert_eq!(tree.children.len(), 2);
    assert_eq!(tree.children[0].children.len(), 1);
    assert_eq!(tree.children[1].mode, Some(Mode::On));
}

#[test]
fn test_register_recursive() {
    let mut engine = Engine::new();
    let base = engine.type_count();
    let node = engine.register::<Node>().unwrap();
    assert_eq!(engine.type_count(), base + 4);
    assert_eq!(engine.register::<Node>().unwrap(), node);
    assert_eq!(engine.type_count(), base + 4);

    let desc = engine.descriptor(node).unwrap();
    assert_eq!(desc.type_name(), "Node");
    assert_eq!(desc.shape(), Shape::Record);
    assert!(desc.is_closed());
    assert!(!desc.is_nullable());
    assert!(!desc.is_anonymous());
    let fields = desc.fields();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].name(), "value");
    assert_eq!(fields[1].position(), 1);
    assert_eq!(fields[0].handle(), engine.handle_of::<i32>());

    let next = fields[1].handle().unwrap();
    assert_eq!(Some(next), engine.handle_of::<Option<Box<Node>>>());
    let next = engine.descriptor(next).unwrap();
    assert!(next.is_nullable());
    let boxed = engine.descriptor(next.inner().unwrap()).unwrap();
    assert_eq!(boxed.shape(), Shape::Boxed);
    assert_eq!(boxed.inner(), Some(node));

    // Parsing reuses the registered descriptors
    let _: Node = engine.parse(r#"{"value": 1, "next": null}"#).unwrap();
    assert_eq!(engine.type_count(), base + 4);
}

#[test]
fn test_descriptors() {
    let mut engine = Engine::new();
    let thing = engine.register::<Thing>().unwrap();
    let desc = engine.descriptor(thing).unwrap();
    assert_eq!(desc.type_name(), "com.example.Thing");
    let tags = engine.descriptor(desc.fields()[0].handle().unwrap()).unwrap();
    assert_eq!(tags.shape(), Shape::Sequence);
    assert_eq!(tags.element(), engine.handle_of::<String>());
    assert_eq!(tags.key(), None);
    let scores = engine.descriptor(desc.fields()[1].handle().unwrap()).unwrap();
    assert_eq!(scores.shape(), Shape::Map);
    assert_eq!(scores.element(), None);
    assert_eq!(scores.key(), engine.handle_of::<String>());
    assert_eq!(scores.value(), engine.handle_of::<f64>());
    let float = engine.descriptor(scores.value().unwrap()).unwrap();
    assert_eq!(float.shape(), Shape::Scalar(ScalarKind::Float));
    assert!(float.is_value_kind());

    let mode = engine.register::<Mode>().unwrap();
    let desc = engine.descriptor(mode).unwrap();
    assert_eq!(desc.shape(), Shape::Enum);
    assert!(desc.is_value_kind());
    let mut members: Vec<_> = desc.enum_members().collect();
    members.sort();
    assert_eq!(members, [("Off", 0), ("On", 3)]);
}

#[test]
fn test_builtin() {
    let engine = Engine::new();
    assert_eq!(engine.handle_of::<Value>(), Some(TypeHandle::UNTYPED));
    let desc = engine.descriptor(TypeHandle::UNTYPED).unwrap();
    assert_eq!(desc.shape(), Shape::Untyped);
    assert!(desc.is_nullable());
    let list = engine.descriptor(TypeHandle::UNTYPED_LIST).unwrap();
    assert_eq!(list.element(), Some(TypeHandle::UNTYPED));
    assert_eq!(format!("{:?}", TypeHandle::CHAR), "#2");
    assert!(engine.descriptor(TypeHandle::CHAR).unwrap().is_value_kind());
}

#[test]
fn test_invalid_type_name() {
    let mut engine = Engine::new();
    let err = engine.register::<BadName>().unwrap_err();
    match err.kind() {
        ErrorKind::InvalidTypeName(name) => assert_eq!(name, "bad name"),
        kind => panic!("unexpected error {:?}", kind),
    }
    assert_eq!(err.position(), None);
}

#[test]
fn test_rollback() {
    let mut engine = Engine::new();
    let base = engine.type_count();
    assert!(engine.register::<Holder>().is_err());
    assert_eq!(engine.type_count(), base);
    assert_eq!(engine.handle_of::<Holder>(), None);
    assert_eq!(engine.handle_of::<u64>(), None);
    let err = engine.parse::<Holder>("{}").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidTypeName(_)));

    // The engine remains usable
    assert_eq!(engine.parse::<u64>("7").unwrap(), 7);
    assert_eq!(engine.type_count(), base + 1);
}

#[test]
fn test_engine_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<Engine>();
}
