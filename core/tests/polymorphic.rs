use indoc::indoc;
use jsonbind::{from_str, Bind, Engine, ErrorKind, Value};

#[derive(Bind, Default, Debug, PartialEq)]
struct Dog {
    name: String,
    good: bool,
}

#[derive(Bind, Default, Debug, PartialEq)]
#[json(name = "Kitty")]
struct Cat {
    name: String,
    lives: u8,
}

#[derive(Bind, Debug, PartialEq)]
enum Animal {
    Dog(Dog),
    #[json(rename = "cat")]
    Cat(Cat),
}

#[derive(Bind, Default, Debug, PartialEq)]
struct Circle {
    radius: f64,
}

#[derive(Bind, Default, Debug, PartialEq)]
struct Square {
    side: f64,
}

#[derive(Bind, Debug, PartialEq)]
enum Figure {
    #[json(default)]
    Circle(Circle),
    Square(Square),
}

#[test]
fn test_tagged() {
    assert_eq!(
        from_str::<Animal>(r#"{"$type": "Dog", "name": "Rex"}"#).unwrap(),
        Animal::Dog(Dog {
            name: "Rex".to_owned(),
            good: false
        })
    );
    assert_eq!(
        from_str::<Animal>(r#"{"__type": "cat", "lives": 9}"#).unwrap(),
        Animal::Cat(Cat {
            name: String::new(),
            lives: 9
        })
    );

    // The record's own name also selects the variant
    assert_eq!(
        from_str::<Animal>(r#"{"__type": "Kitty"}"#).unwrap(),
        Animal::Cat(Cat::default())
    );
}

#[test]
fn test_tagged_list() {
    let animals = from_str::<Vec<Animal>>(indoc! {r#"
        [
            { "$type": "Dog", "name": "Rex", "good": true },
            { "$type": "cat", "name": "Tom", "lives": 7 },
            { "$type": "Dog", "name": "Fido", "unknown": [1, 2, 3] }
        ]
    "#})
    .unwrap();
    assert_eq!(
        animals,
        [
            Animal::Dog(Dog {
                name: "Rex".to_owned(),
                good: true
            }),
            Animal::Cat(Cat {
                name: "Tom".to_owned(),
                lives: 7
            }),
            Animal::Dog(Dog {
                name: "Fido".to_owned(),
                good: false
            }),
        ]
    );
}

#[test]
fn test_missing_tag() {
    let err = from_str::<Animal>(r#"{"name": "Rex"}"#).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MissingTypeTag("Animal")));
    let err = from_str::<Animal>("{}").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MissingTypeTag("Animal")));

    // The tag must be the first member
    let err = from_str::<Animal>(r#"{"name": "Rex", "$type": "Dog"}"#).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MissingTypeTag("Animal")));
}

#[test]
fn test_bad_tag() {
    let err = from_str::<Animal>(r#"{"$type": "Cow", "name": "Bess"}"#).unwrap_err();
    match err.kind() {
        ErrorKind::BadTypeTag { declaring, tag } => {
            assert_eq!(*declaring, "Animal");
            assert_eq!(tag, "Cow");
        }
        kind => panic!("unexpected error {:?}", kind),
    }
    assert!(from_str::<Animal>(r#"{"$type": 1}"#).is_err());
    assert!(from_str::<Animal>(r#"{"$type": "Dog", "good": 1}"#).is_err());
    let err = from_str::<Animal>("[]").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::ExpectedObject("Animal")));
}

#[test]
fn test_default_variant() {
    assert_eq!(
        from_str::<Figure>(r#"{"radius": 2.5}"#).unwrap(),
        Figure::Circle(Circle { radius: 2.5 })
    );
    assert_eq!(
        from_str::<Figure>("{}").unwrap(),
        Figure::Circle(Circle::default())
    );
    assert_eq!(
        from_str::<Figure>(r#"{"$type": "Square", "side": 1.5}"#).unwrap(),
        Figure::Square(Square { side: 1.5 })
    );
    assert_eq!(
        from_str::<Figure>(r#"{"$type": "Circle", "radius": 1}"#).unwrap(),
        Figure::Circle(Circle { radius: 1.0 })
    );

    // Untagged objects are read as the default variant, even with other variants' members
    assert_eq!(
        from_str::<Figure>(r#"{"side": 3, "radius": 4}"#).unwrap(),
        Figure::Circle(Circle { radius: 4.0 })
    );
}

#[test]
fn test_untyped_tag() {
    let mut engine = Engine::new();
    let source = r#"{"$type": "Dog", "name": "Rex"}"#;

    // Unregistered names are rejected
    let err = engine.parse::<Value>(source).unwrap_err();
    match err.kind() {
        ErrorKind::BadTypeTag { declaring, tag } => {
            assert_eq!(*declaring, "object");
            assert_eq!(tag, "Dog");
        }
        kind => panic!("unexpected error {:?}", kind),
    }

    engine.register::<Dog>().unwrap();
    let value: Value = engine.parse(source).unwrap();
    let typed = value.as_typed().unwrap();
    assert_eq!(typed.type_name(), "Dog");
    assert!(typed.is::<Dog>());
    assert_eq!(
        typed.downcast_ref::<Dog>(),
        Some(&Dog {
            name: "Rex".to_owned(),
            good: false
        })
    );
}

#[test]
fn test_untyped_tag_nested() {
    let mut engine = Engine::new();
    engine.register::<Animal>().unwrap();
    let value: Value = engine
        .parse(indoc! {r#"
            {
                "pets": [
                    { "__type": "Kitty", "lives": 3 },
                    { "kind": "rock" }
                ],
                "other": { "name": "x", "$type": "Dog" },
                "tagged": { "$type": 5 }
            }
        "#})
        .unwrap();
    let pets = value.get("pets").and_then(Value::as_array).unwrap();
    let cat = pets[0].as_typed().unwrap();
    assert_eq!(cat.type_name(), "Kitty");
    assert_eq!(cat.downcast_ref::<Cat>().map(|cat| cat.lives), Some(3));
    assert!(pets[1].is_object());

    // A tag which is not the first member, or is not a string, is an ordinary member
    let other = value.get("other").unwrap();
    assert_eq!(other.get("$type").and_then(Value::as_str), Some("Dog"));
    let tagged = value.get("tagged").unwrap();
    assert_eq!(
        tagged.get("$type").and_then(Value::as_number).and_then(|n| n.as_u64()),
        Some(5)
    );
}

#[test]
fn test_untyped_tag_polymorphic_name() {
    let mut engine = Engine::new();
    engine.register::<Animal>().unwrap();
    let err = engine.parse::<Value>(r#"{"$type": "Animal"}"#).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::BadTypeTag { .. }));
}
