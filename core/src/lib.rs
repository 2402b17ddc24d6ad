//! Typed JSON deserialization. JSON text is bound directly onto Rust types through cached,
//! per-type binding plans, without building an intermediate document tree.
//!
//! ```
//! use jsonbind::{Bind, Engine};
//!
//! #[derive(Bind, Default, Debug, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let mut engine = Engine::new();
//! let point: Point = engine.parse(r#"{"x": 1, "y": -2}"#).unwrap();
//! assert_eq!(point, Point { x: 1, y: -2 });
//! ```
extern crate self as jsonbind;

mod bind;
mod capture;
mod cursor;
mod deserialize;
mod engine;
mod error;
mod mapper;
mod name_map;
mod registry;
mod tables;
mod text_reader;
mod value;

pub use bind::{Bind, Enumeration, Field, Polymorphic, Record, Variant};
pub use deserialize::{Num, NumBuilder, Parser, Resume};
pub use engine::{Engine, EngineConfig};
pub use error::{Error, ErrorKind, Found};
pub use jsonbind_derive::Bind;
pub use mapper::{Mappers, Member, MemberContext, Selection, Transform};
pub use name_map::{NameMap, NameMapLookup};
pub use registry::{
    Describe, FieldBinding, Link, Registry, ScalarKind, Shape, Slot, TypeDescriptor, TypeHandle,
    VariantBinding, TYPE_TAGS,
};
pub use text_reader::{Encoding, TextReader, Utf16Reader, Utf8Reader};
pub use value::{Map, Number, TypedValue, Value};

/// Parses a `T` from a string, using a fresh [`Engine`] with the default configuration.
pub fn from_str<T: Bind>(text: &str) -> Result<T, Error> {
    Engine::new().parse(text)
}

/// Parses a `T` from a UTF-8 byte stream, using a fresh [`Engine`] with the default
/// configuration.
pub fn from_reader<T: Bind>(reader: impl std::io::Read) -> Result<T, Error> {
    Engine::new().parse_reader(reader, Encoding::Utf8)
}
