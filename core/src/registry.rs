//! The type descriptor registry: a handle-indexed cache of binding plans, one per Rust type.
use crate::bind::{Bind, Enumeration, Polymorphic, Record};
use crate::deserialize::{Parser, Resume};
use crate::error::{Error, ErrorKind};
use crate::mapper::{Mapper, Mappers};
use crate::name_map::NameMap;
use crate::tables;
use crate::value::Value;
use hashbrown::HashMap;
use log::debug;
use std::any::{Any, TypeId};
use std::fmt;

/// The member names which carry a type tag in a polymorphic object.
pub const TYPE_TAGS: [&str; 2] = ["__type", "$type"];

/// Resolves the handle of a type, registering it if needed. This is the capability by which a
/// descriptor refers to the types it is built from.
pub type Link = fn(&mut Registry) -> Result<TypeHandle, Error>;

/// Parses a record and boxes it, resuming after its type tag member.
pub(crate) type ErasedParse = fn(&mut Parser<'_>, TypeHandle) -> Result<Box<dyn Any>, Error>;

/// A stable identifier for a [`TypeDescriptor`] within a [`Registry`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHandle(u32);

impl TypeHandle {
    /// The handle of [`Value`], registered when the registry is created.
    pub const UNTYPED: Self = Self(0);

    /// The handle of `Vec<Value>`, registered when the registry is created.
    pub const UNTYPED_LIST: Self = Self(1);

    /// The handle of [`char`], registered when the registry is created.
    pub const CHAR: Self = Self(2);

    /// Gets the index of this handle.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The structural category of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Untyped,
    Scalar(ScalarKind),
    Enum,
    Nullable,
    Boxed,
    Sequence,
    Array,
    Map,
    Record,
    Polymorphic,
}

/// The kinds of scalar (non-collection, non-record) type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Integer,
    Float,
    Decimal,
    Char,
    String,
    Uuid,
    DateTime,
}

/// A member table entry of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The field at the given position.
    Field(usize),

    /// A type tag member.
    TypeTag,
}

/// A description of a type, from which the registry builds its [`TypeDescriptor`].
pub struct Describe {
    name: &'static str,
    shape: Shape,
    edges: Edges,
    erase: Option<ErasedParse>,
}

/// The types a [`Describe`] refers to, resolved after its descriptor is inserted.
enum Edges {
    None,
    Inner(Link),
    Element(Link),
    Map(Link, Link),
    Fields {
        fields: Vec<(&'static str, Link)>,
        anonymous: bool,
    },
    Variants {
        variants: Vec<(&'static str, Link)>,
        default: Option<usize>,
    },
    Enum(&'static [(&'static str, i64)]),
}

impl Describe {
    fn new(name: &'static str, shape: Shape, edges: Edges) -> Self {
        Self {
            name,
            shape,
            edges,
            erase: None,
        }
    }

    /// Describes a scalar type.
    pub fn scalar(name: &'static str, kind: ScalarKind) -> Self {
        Self::new(name, Shape::Scalar(kind), Edges::None)
    }

    /// Describes [`Value`].
    pub fn untyped() -> Self {
        Self::new("object", Shape::Untyped, Edges::None)
    }

    /// Describes a type which is either `null` or a `T`.
    pub fn nullable<T: Bind>(name: &'static str) -> Self {
        Self::new(name, Shape::Nullable, Edges::Inner(Registry::resolve::<T>))
    }

    /// Describes a type which holds a `T` behind a pointer.
    pub fn boxed<T: Bind>(name: &'static str) -> Self {
        Self::new(name, Shape::Boxed, Edges::Inner(Registry::resolve::<T>))
    }

    /// Describes a variable-length sequence of `T`.
    pub fn sequence<T: Bind>(name: &'static str) -> Self {
        Self::new(name, Shape::Sequence, Edges::Element(Registry::resolve::<T>))
    }

    /// Describes a fixed-length array of `T`.
    pub fn array<T: Bind>(name: &'static str) -> Self {
        Self::new(name, Shape::Array, Edges::Element(Registry::resolve::<T>))
    }

    /// Describes a map from `K` to `V`.
    pub fn map<K: Bind, V: Bind>(name: &'static str) -> Self {
        Self::new(
            name,
            Shape::Map,
            Edges::Map(Registry::resolve::<K>, Registry::resolve::<V>),
        )
    }

    /// Describes a record.
    pub fn record<R: Record>() -> Self {
        let fields = R::FIELDS.iter().map(|f| (f.name, f.link)).collect();
        Self {
            name: R::NAME,
            shape: Shape::Record,
            edges: Edges::Fields {
                fields,
                anonymous: R::CONSTRUCTOR,
            },
            erase: Some(erase_record::<R>),
        }
    }

    /// Describes an enumeration.
    pub fn enumeration<E: Enumeration>() -> Self {
        Self::new(E::NAME, Shape::Enum, Edges::Enum(E::MEMBERS))
    }

    /// Describes a polymorphic type.
    pub fn polymorphic<P: Polymorphic>() -> Self {
        let variants = P::VARIANTS.iter().map(|v| (v.name, v.link)).collect();
        Self::new(
            P::NAME,
            Shape::Polymorphic,
            Edges::Variants {
                variants,
                default: P::DEFAULT,
            },
        )
    }
}

fn erase_record<R: Record>(p: &mut Parser<'_>, handle: TypeHandle) -> Result<Box<dyn Any>, Error> {
    Ok(Box::new(p.resume_record::<R>(handle, Resume::AfterMember)?))
}

/// A field of a record, along with the descriptor of its declared type.
pub struct FieldBinding {
    name: &'static str,
    position: usize,
    link: Link,
    handle: Option<TypeHandle>,
}

impl FieldBinding {
    /// Gets the JSON member name of this field.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Gets the declaration position of this field.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Gets the handle of the field's type, or [`None`] if the record is not closed yet.
    pub fn handle(&self) -> Option<TypeHandle> {
        self.handle
    }
}

/// A variant of a polymorphic type.
pub struct VariantBinding {
    name: &'static str,
    link: Link,
    handle: Option<TypeHandle>,
}

impl VariantBinding {
    /// Gets the type tag of this variant.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Gets the handle of the record this variant holds, or [`None`] if the polymorphic type is
    /// not closed yet.
    pub fn handle(&self) -> Option<TypeHandle> {
        self.handle
    }
}

/// The cached binding plan for one type.
pub struct TypeDescriptor {
    type_id: TypeId,
    name: &'static str,
    shape: Shape,
    anonymous: bool,
    closed: bool,
    inner: Option<TypeHandle>,
    element: Option<TypeHandle>,
    key_value: Option<(TypeHandle, TypeHandle)>,
    pub(crate) slots: NameMap<Slot>,
    fields: Vec<FieldBinding>,
    variants: Vec<VariantBinding>,
    pub(crate) variant_names: NameMap<usize>,
    default_variant: Option<usize>,
    pub(crate) enum_names: NameMap<i64>,
    pub(crate) mapper: Option<Mapper>,
    pub(crate) erase: Option<ErasedParse>,
}

impl TypeDescriptor {
    /// Gets the display name of the type. For records and polymorphic types, this is the name
    /// used in type tags.
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// Gets the structural category of the type.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Indicates whether the type is a scalar or enumeration.
    pub fn is_value_kind(&self) -> bool {
        matches!(self.shape, Shape::Scalar(_) | Shape::Enum)
    }

    /// Indicates whether `null` is an acceptable JSON value for the type.
    pub fn is_nullable(&self) -> bool {
        matches!(self.shape, Shape::Nullable | Shape::Untyped)
    }

    /// Indicates whether the type is a record whose fields are supplied through its constructor.
    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// Indicates whether all types this descriptor refers to have been resolved.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Gets the handle of the wrapped type, for nullable and boxed types.
    pub fn inner(&self) -> Option<TypeHandle> {
        self.inner
    }

    /// Gets the handle of the element type, for sequences and arrays.
    pub fn element(&self) -> Option<TypeHandle> {
        self.element
    }

    /// Gets the handle of the key type, for maps.
    pub fn key(&self) -> Option<TypeHandle> {
        self.key_value.map(|(k, _)| k)
    }

    /// Gets the handle of the value type, for maps.
    pub fn value(&self) -> Option<TypeHandle> {
        self.key_value.map(|(_, v)| v)
    }

    /// Gets the fields of a record, in declaration order.
    pub fn fields(&self) -> &[FieldBinding] {
        &self.fields
    }

    /// Gets the variants of a polymorphic type.
    pub fn variants(&self) -> &[VariantBinding] {
        &self.variants
    }

    /// Gets the variant used for polymorphic objects without a type tag.
    pub fn default_variant(&self) -> Option<&VariantBinding> {
        self.variants.get(self.default_variant?)
    }

    /// Gets the named members of an enumeration.
    pub fn enum_members(&self) -> impl Iterator<Item = (&'static str, i64)> + '_ {
        self.enum_names.entries().map(|(name, value)| (name, *value))
    }

    /// Indicates whether a member mapper is attached for the current parse.
    pub fn has_mapper(&self) -> bool {
        self.mapper.is_some()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

/// A bounded, append-only cache of [`TypeDescriptor`]s, keyed by [`TypeId`].
pub struct Registry {
    types: Vec<TypeDescriptor>,
    index: HashMap<TypeId, TypeHandle>,
    names: HashMap<&'static str, TypeHandle>,
    capacity: usize,
    active: Mappers,
}

impl Registry {
    /// Constructs a [`Registry`] which holds at most `capacity` types, with the built-in types
    /// already registered.
    pub(crate) fn new(capacity: usize) -> Result<Self, Error> {
        let mut registry = Self {
            types: Vec::new(),
            index: HashMap::new(),
            names: HashMap::new(),
            capacity,
            active: Mappers::new(),
        };
        registry.resolve::<Value>()?;
        registry.resolve::<Vec<Value>>()?;
        registry.resolve::<char>()?;
        Ok(registry)
    }

    /// Gets the number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Indicates whether no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Gets the maximum number of types this registry can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Gets the descriptor for the given handle.
    pub fn descriptor(&self, handle: TypeHandle) -> Option<&TypeDescriptor> {
        self.types.get(handle.index())
    }

    pub(crate) fn get(&self, handle: TypeHandle) -> &TypeDescriptor {
        &self.types[handle.index()]
    }

    /// Gets the handle for `T`, if it has been registered.
    pub fn handle_of<T: Bind>(&self) -> Option<TypeHandle> {
        self.index.get(&TypeId::of::<T>()).copied()
    }

    /// Looks up a record by the name used in its type tags.
    pub fn lookup_name(&self, name: &str) -> Option<TypeHandle> {
        self.names.get(name).copied()
    }

    /// Gets the handle for `T`, registering it (and every type reachable from it) if needed.
    /// Registration is all-or-nothing: on failure, no new descriptors remain.
    pub fn resolve<T: Bind>(&mut self) -> Result<TypeHandle, Error> {
        if let Some(handle) = self.handle_of::<T>() {
            return Ok(handle);
        }
        let mark = self.types.len();
        let res = self.insert::<T>();
        if res.is_err() {
            self.rollback(mark);
        }
        res
    }

    /// Removes all descriptors registered at or after `mark`.
    fn rollback(&mut self, mark: usize) {
        for (i, desc) in self.types.drain(mark..).enumerate() {
            let handle = TypeHandle((mark + i) as u32);
            self.index.remove(&desc.type_id);
            if self.names.get(desc.name) == Some(&handle) {
                self.names.remove(desc.name);
            }
        }
    }

    fn insert<T: Bind>(&mut self) -> Result<TypeHandle, Error> {
        let describe = T::describe();
        if self.types.len() >= self.capacity {
            return Err(ErrorKind::TypeCacheCapacity {
                capacity: self.capacity,
                type_name: describe.name,
            }
            .into());
        }
        let named = matches!(describe.shape, Shape::Record | Shape::Polymorphic);
        if named && !tables::is_type_name(describe.name) {
            return Err(ErrorKind::InvalidTypeName(describe.name.to_owned()).into());
        }

        // The descriptor is visible before its edges are resolved, so that recursive types find
        // it instead of registering themselves again.
        let type_id = TypeId::of::<T>();
        let handle = TypeHandle(self.types.len() as u32);
        let mut desc = TypeDescriptor {
            type_id,
            name: describe.name,
            shape: describe.shape,
            anonymous: false,
            closed: false,
            inner: None,
            element: None,
            key_value: None,
            slots: NameMap::default(),
            fields: Vec::new(),
            variants: Vec::new(),
            variant_names: NameMap::default(),
            default_variant: None,
            enum_names: NameMap::default(),
            mapper: self.active.get(type_id),
            erase: describe.erase,
        };
        let mut pending = None;
        match describe.edges {
            Edges::Fields { fields, anonymous } => {
                let mut slots: Vec<_> = TYPE_TAGS.iter().map(|tag| (*tag, Slot::TypeTag)).collect();
                for (position, (name, link)) in fields.into_iter().enumerate() {
                    slots.push((name, Slot::Field(position)));
                    desc.fields.push(FieldBinding {
                        name,
                        position,
                        link,
                        handle: None,
                    });
                }
                desc.slots = NameMap::new(slots);
                desc.anonymous = anonymous;
            }
            Edges::Variants { variants, default } => {
                desc.slots = NameMap::new(TYPE_TAGS.iter().map(|tag| (*tag, Slot::TypeTag)).collect());
                desc.variants = variants
                    .into_iter()
                    .map(|(name, link)| VariantBinding {
                        name,
                        link,
                        handle: None,
                    })
                    .collect();
                desc.default_variant = default;
            }
            Edges::Enum(members) => {
                desc.enum_names = NameMap::new(members.to_vec());
                desc.closed = true;
            }
            Edges::None => desc.closed = true,
            edges => pending = Some(edges),
        }
        self.types.push(desc);
        self.index.insert(type_id, handle);
        if named {
            self.names.entry(describe.name).or_insert(handle);
        }
        debug!(
            "registered {} as {:?} ({:?})",
            describe.name, handle, describe.shape
        );

        match pending {
            Some(Edges::Inner(link)) => {
                let inner = link(self)?;
                self.types[handle.index()].inner = Some(inner);
            }
            Some(Edges::Element(link)) => {
                let element = link(self)?;
                self.types[handle.index()].element = Some(element);
            }
            Some(Edges::Map(key, value)) => {
                let key = key(self)?;
                let value = value(self)?;
                self.types[handle.index()].key_value = Some((key, value));
            }
            _ => {}
        }
        self.close(handle)?;
        Ok(handle)
    }

    /// Resolves the field and variant types of a record or polymorphic type, marking it closed.
    fn close(&mut self, handle: TypeHandle) -> Result<(), Error> {
        let desc = &mut self.types[handle.index()];
        if desc.closed {
            return Ok(());
        }
        desc.closed = true;
        for i in 0..self.types[handle.index()].fields.len() {
            let link = self.types[handle.index()].fields[i].link;
            let field = link(self)?;
            self.types[handle.index()].fields[i].handle = Some(field);
        }
        let mut variant_names = Vec::new();
        for i in 0..self.types[handle.index()].variants.len() {
            let binding = &self.types[handle.index()].variants[i];
            let (name, link) = (binding.name, binding.link);
            let variant = link(self)?;
            let record_name = self.types[variant.index()].name;
            variant_names.push((name, i));
            if record_name != name {
                variant_names.push((record_name, i));
            }
            self.types[handle.index()].variants[i].handle = Some(variant);
        }
        if !variant_names.is_empty() {
            self.types[handle.index()].variant_names = NameMap::new(variant_names);
        }
        Ok(())
    }

    /// Makes `mappers` the active mapper set, attaching each mapper to the descriptor of its
    /// type. Descriptors registered later pick up the active set when they are created.
    pub(crate) fn apply_mappers(&mut self, mappers: Option<&Mappers>) {
        let had_mappers = !self.active.is_empty();
        self.active = mappers.cloned().unwrap_or_default();
        if had_mappers || !self.active.is_empty() {
            debug!("applying {} member mapper(s)", self.active.len());
            let active = &self.active;
            for desc in self.types.iter_mut() {
                desc.mapper = active.get(desc.type_id);
            }
        }
    }
}

#[test]
fn test_capacity() {
    let mut registry = Registry::new(5).unwrap();
    assert_eq!(registry.len(), 3);
    let err = registry.resolve::<Vec<Vec<u8>>>().unwrap_err();
    match err.kind() {
        ErrorKind::TypeCacheCapacity {
            capacity,
            type_name,
        } => {
            assert_eq!(*capacity, 5);
            assert_eq!(*type_name, "u8");
        }
        kind => panic!("unexpected error {:?}", kind),
    }
    assert_eq!(registry.len(), 3);
    assert_eq!(registry.handle_of::<Vec<u8>>(), None);
    let handle = registry.resolve::<Vec<u8>>().unwrap();
    assert_eq!(handle, TypeHandle(3));
    assert_eq!(registry.get(handle).element(), Some(TypeHandle(4)));
    assert!(Registry::new(2).is_err());
}
