//! Traits which describe how a Rust type binds to JSON, and their implementations for standard
//! types.
use crate::deserialize::{Parser, Resume};
use crate::error::Error;
use crate::registry::{Describe, Link, ScalarKind, TypeHandle};
use crate::value::Value;
use std::any::Any;
use std::collections::{BTreeMap, VecDeque};
use std::hash::{BuildHasher, Hash};

/// A type which can be deserialized from JSON by an [`Engine`](crate::Engine).
pub trait Bind: Any + Sized {
    /// Describes the structure of this type, for building its descriptor.
    fn describe() -> Describe;

    /// Parses a value of this type. `handle` is the handle of this type's descriptor.
    fn parse(p: &mut Parser<'_>, handle: TypeHandle) -> Result<Self, Error>;
}

/// A type which is deserialized from a JSON object with named fields.
pub trait Record: Bind {
    /// The name of this record, as used in type tags.
    const NAME: &'static str;

    /// Indicates whether this record is built from constructor arguments rather than through
    /// settable fields. Member mappers are not consulted for such records.
    const CONSTRUCTOR: bool = false;

    /// The fields of this record, in declaration order.
    const FIELDS: &'static [Field<Self>];

    /// The intermediate state of this record while its fields are being read.
    type Builder: Any;

    /// Creates an empty builder.
    fn builder() -> Self::Builder;

    /// Finishes building the record.
    fn finish(builder: Self::Builder) -> Self;
}

/// A field of a [`Record`].
pub struct Field<R: Record> {
    /// The JSON member name of the field.
    pub name: &'static str,

    /// Resolves the field's type.
    pub link: Link,

    /// Parses the field's value into the builder.
    pub set: fn(&mut R::Builder, &mut Parser<'_>, TypeHandle) -> Result<(), Error>,
}

/// A type which is deserialized from a number or a member name.
pub trait Enumeration: Bind {
    /// The name of this enumeration, as used in error messages.
    const NAME: &'static str;

    /// The named members of this enumeration.
    const MEMBERS: &'static [(&'static str, i64)];

    /// Gets the member with the given underlying value.
    fn from_value(value: i64) -> Option<Self>;
}

/// A type whose concrete record type is chosen by a type tag in the JSON object.
pub trait Polymorphic: Bind {
    /// The name of this type, as used in error messages.
    const NAME: &'static str;

    /// The possible record types.
    const VARIANTS: &'static [Variant<Self>];

    /// The index of the variant used when an object has no type tag.
    const DEFAULT: Option<usize> = None;
}

/// A variant of a [`Polymorphic`] type.
pub struct Variant<P> {
    /// The type tag which selects this variant.
    pub name: &'static str,

    /// Resolves the variant's record type.
    pub link: Link,

    /// Reads the rest of the variant's record body.
    pub resume: fn(&mut Parser<'_>, TypeHandle, Resume) -> Result<P, Error>,
}

impl Bind for bool {
    fn describe() -> Describe {
        Describe::scalar("bool", ScalarKind::Bool)
    }

    fn parse(p: &mut Parser<'_>, _: TypeHandle) -> Result<Self, Error> {
        p.parse_bool()
    }
}

macro_rules! impl_integer {
    ($($ty:ty),*) => {$(
        impl Bind for $ty {
            fn describe() -> Describe {
                Describe::scalar(stringify!($ty), ScalarKind::Integer)
            }

            fn parse(p: &mut Parser<'_>, _: TypeHandle) -> Result<Self, Error> {
                p.parse_integer()
            }
        }
    )*};
}

impl_integer!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128);

macro_rules! impl_float {
    ($($ty:ty),*) => {$(
        impl Bind for $ty {
            fn describe() -> Describe {
                Describe::scalar(stringify!($ty), ScalarKind::Float)
            }

            fn parse(p: &mut Parser<'_>, _: TypeHandle) -> Result<Self, Error> {
                p.parse_float(stringify!($ty))
            }
        }
    )*};
}

impl_float!(f32, f64);

impl Bind for char {
    fn describe() -> Describe {
        Describe::scalar("char", ScalarKind::Char)
    }

    fn parse(p: &mut Parser<'_>, _: TypeHandle) -> Result<Self, Error> {
        p.parse_char()
    }
}

impl Bind for String {
    fn describe() -> Describe {
        Describe::scalar("string", ScalarKind::String)
    }

    fn parse(p: &mut Parser<'_>, _: TypeHandle) -> Result<Self, Error> {
        p.parse_string()
    }
}

impl Bind for Value {
    fn describe() -> Describe {
        Describe::untyped()
    }

    fn parse(p: &mut Parser<'_>, _: TypeHandle) -> Result<Self, Error> {
        p.parse_untyped()
    }
}

impl<T: Bind> Bind for Option<T> {
    fn describe() -> Describe {
        Describe::nullable::<T>(std::any::type_name::<Self>())
    }

    fn parse(p: &mut Parser<'_>, handle: TypeHandle) -> Result<Self, Error> {
        p.parse_option(handle)
    }
}

impl<T: Bind> Bind for Box<T> {
    fn describe() -> Describe {
        Describe::boxed::<T>(std::any::type_name::<Self>())
    }

    fn parse(p: &mut Parser<'_>, handle: TypeHandle) -> Result<Self, Error> {
        let inner = p.descriptor(handle).inner().unwrap_or(TypeHandle::UNTYPED);
        Ok(Box::new(T::parse(p, inner)?))
    }
}

impl<T: Bind> Bind for Vec<T> {
    fn describe() -> Describe {
        Describe::sequence::<T>(std::any::type_name::<Self>())
    }

    fn parse(p: &mut Parser<'_>, handle: TypeHandle) -> Result<Self, Error> {
        p.parse_sequence(handle, |items: Vec<T>| items)
    }
}

impl<T: Bind> Bind for VecDeque<T> {
    fn describe() -> Describe {
        Describe::sequence::<T>(std::any::type_name::<Self>())
    }

    fn parse(p: &mut Parser<'_>, handle: TypeHandle) -> Result<Self, Error> {
        p.parse_sequence(handle, |items: Vec<T>| items.into())
    }
}

impl<T: Bind> Bind for Box<[T]> {
    fn describe() -> Describe {
        Describe::array::<T>(std::any::type_name::<Self>())
    }

    fn parse(p: &mut Parser<'_>, handle: TypeHandle) -> Result<Self, Error> {
        p.parse_sequence(handle, |items: Vec<T>| items.into_boxed_slice())
    }
}

impl<K, V, S> Bind for std::collections::HashMap<K, V, S>
where
    K: Bind + Eq + Hash,
    V: Bind,
    S: BuildHasher + Default + 'static,
{
    fn describe() -> Describe {
        Describe::map::<K, V>(std::any::type_name::<Self>())
    }

    fn parse(p: &mut Parser<'_>, handle: TypeHandle) -> Result<Self, Error> {
        p.parse_map(handle, Self::default(), |map, k, v| {
            map.insert(k, v);
        })
    }
}

impl<K, V, S> Bind for hashbrown::HashMap<K, V, S>
where
    K: Bind + Eq + Hash,
    V: Bind,
    S: BuildHasher + Default + 'static,
{
    fn describe() -> Describe {
        Describe::map::<K, V>(std::any::type_name::<Self>())
    }

    fn parse(p: &mut Parser<'_>, handle: TypeHandle) -> Result<Self, Error> {
        p.parse_map(handle, Self::default(), |map, k, v| {
            map.insert(k, v);
        })
    }
}

impl<K: Bind + Ord, V: Bind> Bind for BTreeMap<K, V> {
    fn describe() -> Describe {
        Describe::map::<K, V>(std::any::type_name::<Self>())
    }

    fn parse(p: &mut Parser<'_>, handle: TypeHandle) -> Result<Self, Error> {
        p.parse_map(handle, Self::new(), |map, k, v| {
            map.insert(k, v);
        })
    }
}

#[cfg(feature = "uuid")]
impl Bind for uuid::Uuid {
    fn describe() -> Describe {
        Describe::scalar("uuid", ScalarKind::Uuid)
    }

    fn parse(p: &mut Parser<'_>, _: TypeHandle) -> Result<Self, Error> {
        p.parse_text("uuid", |text| uuid::Uuid::parse_str(text).ok())
    }
}

#[cfg(feature = "rust_decimal")]
impl Bind for rust_decimal::Decimal {
    fn describe() -> Describe {
        Describe::scalar("decimal", ScalarKind::Decimal)
    }

    fn parse(p: &mut Parser<'_>, _: TypeHandle) -> Result<Self, Error> {
        p.parse_decimal()
    }
}

#[cfg(feature = "chrono")]
impl Bind for chrono::DateTime<chrono::FixedOffset> {
    fn describe() -> Describe {
        Describe::scalar("datetime", ScalarKind::DateTime)
    }

    fn parse(p: &mut Parser<'_>, _: TypeHandle) -> Result<Self, Error> {
        p.parse_text("datetime", |text| {
            chrono::DateTime::parse_from_rfc3339(text).ok()
        })
    }
}

#[cfg(feature = "chrono")]
impl Bind for chrono::DateTime<chrono::Utc> {
    fn describe() -> Describe {
        Describe::scalar("datetime", ScalarKind::DateTime)
    }

    fn parse(p: &mut Parser<'_>, _: TypeHandle) -> Result<Self, Error> {
        p.parse_text("datetime", |text| {
            chrono::DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|time| time.with_timezone(&chrono::Utc))
        })
    }
}

#[cfg(feature = "chrono")]
impl Bind for chrono::NaiveDate {
    fn describe() -> Describe {
        Describe::scalar("date", ScalarKind::DateTime)
    }

    fn parse(p: &mut Parser<'_>, _: TypeHandle) -> Result<Self, Error> {
        p.parse_text("date", |text| text.parse().ok())
    }
}

#[cfg(feature = "chrono")]
impl Bind for chrono::NaiveDateTime {
    fn describe() -> Describe {
        Describe::scalar("datetime", ScalarKind::DateTime)
    }

    fn parse(p: &mut Parser<'_>, _: TypeHandle) -> Result<Self, Error> {
        p.parse_text("datetime", |text| text.parse().ok())
    }
}
