use super::Parser;
use crate::bind::Bind;
use crate::error::{Error, ErrorKind};
use crate::mapper::{Member, MemberContext, Pending};
use crate::registry::TypeHandle;
use std::any::Any;
use ErrorKind::*;

impl Parser<'_> {
    /// Parses a JSON array into the sequence type `handle`, collecting its elements into a `Vec`
    /// which `finish` turns into the final container.
    pub fn parse_sequence<T: Bind, C: Any>(
        &mut self,
        handle: TypeHandle,
        finish: impl FnOnce(Vec<T>) -> C,
    ) -> Result<C, Error> {
        let desc = self.registry.get(handle);
        let name = desc.type_name();
        if self.cursor.skip_whitespace()? != Some('[') {
            return Err(match self.cursor.current() {
                Some(_) => self.cursor.error(ExpectedArray(name)),
                None => self.cursor.error(UnexpectedEof),
            });
        }
        let mapper = desc.mapper.clone();
        let element = desc.element().unwrap_or(TypeHandle::UNTYPED);
        let nullable = self.registry.get(element).is_nullable();
        self.nested(|p| {
            p.cursor.advance()?;
            let mut items = Vec::new();
            let mut pending = Pending::default();
            let mut first = true;
            let mut index = 0;
            while p.next_item(&mut first)? {
                index += 1;
                if let Some(mapper) = &mapper {
                    let is_null = nullable && p.cursor.current() == Some('n');
                    if !is_null {
                        let selection = mapper(&MemberContext {
                            declaring: name,
                            container: &items,
                            member: Member::Index(index - 1),
                        });
                        if pending.select(selection) {
                            p.skip_value()?;
                            continue;
                        }
                    }
                }
                items.push(T::parse(p, element)?);
            }
            Ok(pending.finish(finish(items)))
        })
    }

    /// Parses a JSON object, or an array of key/value pair objects, into the map type `handle`.
    /// Each entry is added to `map` with `insert`.
    pub fn parse_map<K: Bind, V: Bind, M: Any>(
        &mut self,
        handle: TypeHandle,
        mut map: M,
        mut insert: impl FnMut(&mut M, K, V),
    ) -> Result<M, Error> {
        let desc = self.registry.get(handle);
        let name = desc.type_name();
        let mapper = desc.mapper.clone();
        let (key, value) = (
            desc.key().unwrap_or(TypeHandle::UNTYPED),
            desc.value().unwrap_or(TypeHandle::UNTYPED),
        );
        match self.cursor.skip_whitespace()? {
            Some('{') => self.nested(|p| {
                p.cursor.advance()?;
                let mut pending = Pending::default();
                let mut first = true;
                while p.next_member(&mut first)? {
                    let k = K::parse(p, key)?;
                    p.colon()?;
                    if let Some(mapper) = &mapper {
                        let member = match (&k as &dyn Any).downcast_ref::<String>() {
                            Some(k) => Member::Name(k),
                            None => Member::Key(&k),
                        };
                        let selection = mapper(&MemberContext {
                            declaring: name,
                            container: &map,
                            member,
                        });
                        if pending.select(selection) {
                            p.skip_value()?;
                            continue;
                        }
                    }
                    let v = V::parse(p, value)?;
                    insert(&mut map, k, v);
                }
                Ok(pending.finish(map))
            }),
            Some('[') => self.nested(|p| {
                p.cursor.advance()?;
                let mut first = true;
                while p.next_item(&mut first)? {
                    let (k, v) = p.parse_pair(key, value, name)?;
                    insert(&mut map, k, v);
                }
                Ok(map)
            }),
            Some(_) => Err(self.unexpected_object(name)),
            None => Err(self.cursor.error(UnexpectedEof)),
        }
    }

    /// Parses a key/value pair encoded as the first and second members of an object. The member
    /// names are not checked.
    fn parse_pair<K: Bind, V: Bind>(
        &mut self,
        key: TypeHandle,
        value: TypeHandle,
        name: &'static str,
    ) -> Result<(K, V), Error> {
        if self.cursor.current() != Some('{') {
            return Err(self.unexpected_object(name));
        }
        self.nested(|p| {
            p.cursor.advance()?;
            let mut first = true;
            if !p.next_member(&mut first)? {
                return Err(p.cursor.error(UnexpectedChar));
            }
            p.cursor.skip_str()?;
            p.colon()?;
            let k = K::parse(p, key)?;
            if !p.next_member(&mut first)? {
                return Err(p.cursor.error(UnexpectedChar));
            }
            p.cursor.skip_str()?;
            p.colon()?;
            let v = V::parse(p, value)?;
            p.cursor.skip_whitespace()?;
            p.cursor.expect('}')?;
            Ok((k, v))
        })
    }

    /// Constructs the error for a value that should have been an object.
    pub(super) fn unexpected_object(&self, name: &'static str) -> crate::error::Error {
        match self.cursor.current() {
            Some('n') => self.cursor.error(UnexpectedNull(name)),
            Some(_) => self.cursor.error(ExpectedObject(name)),
            None => self.cursor.error(UnexpectedEof),
        }
    }
}
