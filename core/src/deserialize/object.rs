use super::Parser;
use crate::bind::{Polymorphic, Record};
use crate::error::{Error, ErrorKind};
use crate::mapper::{Member, MemberContext, Pending};
use crate::registry::{Slot, TypeHandle, TYPE_TAGS};
use crate::value::{Map, TypedValue, Value};
use log::trace;
use ErrorKind::*;

/// Where a record body is picked up when its members are read by [`Parser::resume_record`].
#[doc(hidden)]
#[derive(Debug, Clone, Copy)]
pub enum Resume {
    /// The name of a member has been read and matched; its `:` and value are next.
    Key(Option<Slot>),

    /// A complete member has been read; a `,` or the closing brace is next.
    AfterMember,

    /// The closing brace has been read.
    End,
}

impl Parser<'_> {
    /// Parses a JSON object into the record type `handle`.
    pub fn parse_record<R: Record>(&mut self, handle: TypeHandle) -> Result<R, Error> {
        if self.cursor.skip_whitespace()? != Some('{') {
            return Err(self.unexpected_object(R::NAME));
        }
        self.nested(|p| {
            p.cursor.advance()?;
            let mut first = true;
            if !p.next_member(&mut first)? {
                return p.resume_record(handle, Resume::End);
            }
            let slot = p.cursor.match_name(&p.registry.get(handle).slots)?;
            if slot == Some(Slot::TypeTag) {
                p.colon()?;
                p.check_record_tag(handle)?;
                return p.resume_record(handle, Resume::AfterMember);
            }
            p.resume_record(handle, Resume::Key(slot))
        })
    }

    /// Reads the type tag of an object being parsed as a record, which must name that record.
    fn check_record_tag(&mut self, handle: TypeHandle) -> Result<(), Error> {
        let declaring = self.registry.get(handle).type_name();
        if self.cursor.skip_whitespace()? != Some('"') {
            return Err(self.cursor.error(UnexpectedChar));
        }
        self.cursor.read_str()?;
        if self.cursor.buffer().as_str() == declaring {
            return Ok(());
        }
        let tag = self.cursor.buffer().take();
        Err(self.cursor.error(BadTypeTag { declaring, tag }))
    }

    /// Reads the remaining members of an object into the record type `handle`.
    #[doc(hidden)]
    pub fn resume_record<R: Record>(
        &mut self,
        handle: TypeHandle,
        resume: Resume,
    ) -> Result<R, Error> {
        let mut builder = R::builder();
        let mut pending = Pending::default();
        let mapper = match R::CONSTRUCTOR {
            true => None,
            false => self.registry.get(handle).mapper.clone(),
        };
        let mut next = match resume {
            Resume::Key(slot) => Some(slot),
            Resume::AfterMember => None,
            Resume::End => return Ok(R::finish(builder)),
        };
        let mut first = false;
        loop {
            let slot = match next.take() {
                Some(slot) => slot,
                None => {
                    if !self.next_member(&mut first)? {
                        break;
                    }
                    self.cursor.match_name(&self.registry.get(handle).slots)?
                }
            };
            self.colon()?;
            let Some(Slot::Field(position)) = slot else {
                self.skip_value()?;
                continue;
            };
            let field = &self.registry.get(handle).fields()[position];
            let (name, field_handle) = (field.name(), field.handle());
            if let Some(mapper) = &mapper {
                let selection = mapper(&MemberContext {
                    declaring: R::NAME,
                    container: &builder,
                    member: Member::Name(name),
                });
                if pending.select(selection) {
                    self.skip_value()?;
                    continue;
                }
            }
            let field_handle = field_handle.unwrap_or(TypeHandle::UNTYPED);
            (R::FIELDS[position].set)(&mut builder, self, field_handle)?;
        }
        Ok(pending.finish(R::finish(builder)))
    }

    /// Parses a JSON object into the polymorphic type `handle`, choosing the variant from the
    /// type tag in its first member.
    pub fn parse_polymorphic<P: Polymorphic>(&mut self, handle: TypeHandle) -> Result<P, Error> {
        if self.cursor.skip_whitespace()? != Some('{') {
            return Err(self.unexpected_object(P::NAME));
        }
        let desc = self.registry.get(handle);
        let default = P::DEFAULT.zip(desc.default_variant().and_then(|v| v.handle()));
        self.nested(|p| {
            p.cursor.advance()?;
            let mut first = true;
            if !p.next_member(&mut first)? {
                return match default {
                    Some((index, variant)) => (P::VARIANTS[index].resume)(p, variant, Resume::End),
                    None => Err(p.cursor.error(MissingTypeTag(P::NAME))),
                };
            }

            // Without a tag, the first member belongs to the default variant's record.
            let table = default.map_or(handle, |(_, variant)| variant);
            let slot = p.cursor.match_name(&p.registry.get(table).slots)?;
            if slot == Some(Slot::TypeTag) {
                p.colon()?;
                let index = p.read_variant_tag(handle)?;
                let desc = p.registry.get(handle);
                let variant = desc.variants()[index].handle();
                trace!(
                    "type tag selected {} for {}",
                    desc.variants()[index].name(),
                    P::NAME
                );
                let variant = variant.unwrap_or(TypeHandle::UNTYPED);
                return (P::VARIANTS[index].resume)(p, variant, Resume::AfterMember);
            }
            match default {
                Some((index, variant)) => (P::VARIANTS[index].resume)(p, variant, Resume::Key(slot)),
                None => Err(p.cursor.error(MissingTypeTag(P::NAME))),
            }
        })
    }

    /// Reads a type tag value and finds the variant of the polymorphic type `handle` it names.
    fn read_variant_tag(&mut self, handle: TypeHandle) -> Result<usize, Error> {
        let desc = self.registry.get(handle);
        if self.cursor.skip_whitespace()? != Some('"') {
            return Err(self.cursor.error(UnexpectedChar));
        }
        self.cursor.read_str()?;
        if let Some(index) = desc.variant_names.get(self.cursor.buffer().as_str()) {
            return Ok(*index);
        }
        let tag = self.cursor.buffer().take();
        Err(self.cursor.error(BadTypeTag {
            declaring: desc.type_name(),
            tag,
        }))
    }

    /// Parses a JSON object into a [`Value`]. A leading type tag naming a registered record
    /// produces a [`Value::Typed`].
    pub(super) fn parse_untyped_object(&mut self) -> Result<Value, Error> {
        let mapper = self.registry.get(TypeHandle::UNTYPED).mapper.clone();
        self.nested(|p| {
            p.cursor.advance()?;
            let mut map = Map::new();
            let mut pending = Pending::default();
            let mut first = true;
            loop {
                let leading = first;
                if !p.next_member(&mut first)? {
                    break;
                }
                p.cursor.read_str()?;
                let key = p.cursor.buffer().take();
                p.colon()?;
                let tagged = leading && TYPE_TAGS.contains(&key.as_str());
                if tagged && p.cursor.skip_whitespace()? == Some('"') {
                    return p.parse_typed_rest();
                }
                if let Some(mapper) = &mapper {
                    let selection = mapper(&MemberContext {
                        declaring: "object",
                        container: &map,
                        member: Member::Name(&key),
                    });
                    if pending.select(selection) {
                        p.skip_value()?;
                        continue;
                    }
                }
                let value = p.parse_untyped()?;
                map.insert(key, value);
            }
            Ok(Value::Object(pending.finish(map)))
        })
    }

    /// Reads a type tag naming a registered record, then the rest of the object as that record.
    fn parse_typed_rest(&mut self) -> Result<Value, Error> {
        self.cursor.read_str()?;
        let found = self.registry.lookup_name(self.cursor.buffer().as_str());
        let target = found.and_then(|handle| {
            let desc = self.registry.get(handle);
            desc.erase.map(|erase| (handle, desc.type_name(), erase))
        });
        let Some((handle, name, erase)) = target else {
            let tag = self.cursor.buffer().take();
            return Err(self.cursor.error(BadTypeTag {
                declaring: "object",
                tag,
            }));
        };
        trace!("type tag selected {} for untyped object", name);
        let value = erase(self, handle)?;
        Ok(Value::Typed(TypedValue::new(name, value)))
    }
}
