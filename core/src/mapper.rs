//! Per-call hooks which observe the members of records and collections as they are parsed, and
//! can skip them or post-process the finished container.
use crate::bind::Bind;
use hashbrown::HashMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A member hook, attached to the descriptor of its container type.
pub(crate) type Mapper = Arc<dyn Fn(&MemberContext<'_>) -> Selection + Send + Sync>;

/// A set of member hooks, keyed by container type, which is supplied with a parse call.
#[derive(Clone, Default)]
pub struct Mappers {
    entries: HashMap<TypeId, Mapper>,
}

impl Mappers {
    /// Constructs an empty [`Mappers`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a hook to the container type `T`, replacing any existing hook for it. `T` may be
    /// a record, a sequence type such as `Vec<E>`, a map type, or [`Value`](crate::Value) for
    /// untyped objects.
    pub fn on<T: Bind>(
        mut self,
        hook: impl Fn(&MemberContext<'_>) -> Selection + Send + Sync + 'static,
    ) -> Self {
        self.entries.insert(TypeId::of::<T>(), Arc::new(hook));
        self
    }

    /// Gets the number of hooks in this set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Indicates whether this set has no hooks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn get(&self, type_id: TypeId) -> Option<Mapper> {
        self.entries.get(&type_id).cloned()
    }
}

impl fmt::Debug for Mappers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mappers")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// Identifies the member about to be parsed.
#[derive(Debug, Clone, Copy)]
pub enum Member<'a> {
    /// A named field of a record, or a string key of a map or untyped object.
    Name(&'a str),

    /// A non-string map key.
    Key(&'a dyn Any),

    /// The position of a sequence element.
    Index(usize),
}

impl<'a> Member<'a> {
    /// Gets the name of this member, if it has one.
    pub fn name(&self) -> Option<&'a str> {
        match self {
            Member::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Gets the key of this member, if it is a non-string map key of type `K`.
    pub fn key<K: Any>(&self) -> Option<&'a K> {
        match self {
            Member::Key(key) => key.downcast_ref(),
            _ => None,
        }
    }

    /// Gets the index of this member, if it is a sequence element.
    pub fn index(&self) -> Option<usize> {
        match self {
            Member::Index(index) => Some(*index),
            _ => None,
        }
    }
}

/// The information passed to a member hook.
pub struct MemberContext<'a> {
    /// The name of the container type.
    pub declaring: &'static str,

    /// The container being built. Records expose themselves, sequences expose the `Vec` of
    /// elements read so far, and maps and untyped objects expose the map being built.
    pub container: &'a dyn Any,

    /// The member about to be parsed.
    pub member: Member<'a>,
}

impl MemberContext<'_> {
    /// Gets the container being built, if it has type `T`.
    pub fn container<T: Any>(&self) -> Option<&T> {
        self.container.downcast_ref()
    }
}

/// The decision of a member hook.
pub enum Selection {
    /// Parse the member normally.
    Keep,

    /// Consume the member's value without storing it.
    Skip,

    /// Parse the member normally, and apply the transform to the finished container. Only the
    /// first transform selected for a container is applied.
    Transform(Transform),
}

impl Selection {
    /// Creates a [`Selection::Transform`] which applies `f` to the finished container, if it has
    /// type `T`.
    pub fn transform<T: Any>(f: impl FnOnce(&mut T) + 'static) -> Self {
        Selection::Transform(Transform(Box::new(move |container: &mut dyn Any| {
            if let Some(container) = container.downcast_mut::<T>() {
                f(container)
            }
        })))
    }
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Keep => f.write_str("Keep"),
            Selection::Skip => f.write_str("Skip"),
            Selection::Transform(_) => f.write_str("Transform"),
        }
    }
}

/// A deferred post-processing step for a container.
pub struct Transform(Box<dyn FnOnce(&mut dyn Any)>);

impl Transform {
    pub(crate) fn apply<T: Any>(self, container: &mut T) {
        (self.0)(container)
    }
}

/// Tracks hook decisions for one container.
#[derive(Default)]
pub(crate) struct Pending(Option<Transform>);

impl Pending {
    /// Records a hook decision, returning whether the member should be skipped.
    pub fn select(&mut self, selection: Selection) -> bool {
        match selection {
            Selection::Keep => false,
            Selection::Skip => true,
            Selection::Transform(transform) => {
                self.0.get_or_insert(transform);
                false
            }
        }
    }

    /// Applies the recorded transform, if any.
    pub fn finish<T: Any>(self, mut container: T) -> T {
        if let Some(transform) = self.0 {
            transform.apply(&mut container);
        }
        container
    }
}

#[test]
fn test_first_transform_wins() {
    let mut pending = Pending::default();
    assert!(!pending.select(Selection::Keep));
    assert!(!pending.select(Selection::transform(|v: &mut Vec<u32>| v.push(1))));
    assert!(pending.select(Selection::Skip));
    assert!(!pending.select(Selection::transform(|v: &mut Vec<u32>| v.push(2))));
    assert_eq!(pending.finish(vec![0u32]), vec![0, 1]);
}
