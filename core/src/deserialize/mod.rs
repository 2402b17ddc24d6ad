//! The recursive-descent value dispatcher.
mod collection;
mod number;
mod object;

pub use number::{Num, NumBuilder};
pub use object::Resume;

use crate::bind::{Bind, Enumeration};
use crate::cursor::Cursor;
use crate::error::{Error, ErrorKind};
use crate::registry::{Registry, TypeDescriptor, TypeHandle};
use crate::value::{Number, Value};
use number::{capture_number, read_number_into_builder, skip_number};
use ErrorKind::*;

/// The state of a single parse call: the cursor over the input, and the registry whose
/// descriptors guide it.
pub struct Parser<'a> {
    registry: &'a mut Registry,
    cursor: Cursor<'a>,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(registry: &'a mut Registry, cursor: Cursor<'a>, max_depth: usize) -> Self {
        Self {
            registry,
            cursor,
            depth: 0,
            max_depth,
        }
    }

    /// Gets the descriptor for the given handle.
    pub fn descriptor(&self, handle: TypeHandle) -> &TypeDescriptor {
        self.registry.get(handle)
    }

    /// Gets the absolute character offset of the next unread character.
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    /// Checks that nothing but whitespace remains in the input.
    pub(crate) fn finish(&mut self) -> Result<(), Error> {
        self.cursor.finish()
    }

    /// Runs `f` one nesting level deeper, failing if that exceeds the depth limit.
    fn nested<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R, Error>) -> Result<R, Error> {
        if self.depth >= self.max_depth {
            return Err(self.cursor.error(DepthLimit(self.max_depth)));
        }
        self.depth += 1;
        let res = f(self);
        self.depth -= 1;
        res
    }

    /// Constructs the error for a value which doesn't start with any of the expected characters.
    fn unexpected(&self, name: &'static str) -> Error {
        match self.cursor.current() {
            Some('n') => self.cursor.error(UnexpectedNull(name)),
            Some(_) => self.cursor.error(UnexpectedChar),
            None => self.cursor.error(UnexpectedEof),
        }
    }

    /// Consumes the `:` between a member name and its value.
    fn colon(&mut self) -> Result<(), Error> {
        self.cursor.skip_whitespace()?;
        self.cursor.expect(':')
    }

    /// Parses a boolean, given either as a literal or as a quoted literal.
    pub fn parse_bool(&mut self) -> Result<bool, Error> {
        let quoted = self.cursor.skip_whitespace()? == Some('"');
        if quoted {
            self.cursor.advance()?;
        }
        let value = match self.cursor.current() {
            Some('t') => {
                self.cursor.read_literal("rue")?;
                true
            }
            Some('f') => {
                self.cursor.read_literal("alse")?;
                false
            }
            _ => return Err(self.unexpected("bool")),
        };
        if quoted {
            self.cursor.expect('"')?;
        }
        Ok(value)
    }

    /// Parses a quoted string.
    pub fn parse_string(&mut self) -> Result<String, Error> {
        if self.cursor.skip_whitespace()? != Some('"') {
            return Err(match self.cursor.current() {
                Some('n') => self.cursor.error(UnexpectedNull("string")),
                Some(_) => self.cursor.error(ExpectedString("string")),
                None => self.cursor.error(UnexpectedEof),
            });
        }
        self.cursor.read_str()?;
        Ok(self.cursor.buffer().take())
    }

    /// Parses a quoted string which must hold exactly one character.
    pub fn parse_char(&mut self) -> Result<char, Error> {
        if self.cursor.skip_whitespace()? != Some('"') {
            return Err(self.unexpected("char"));
        }
        self.cursor.read_str()?;
        let mut chars = self.cursor.buffer().as_str().chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(ch),
            _ => Err(self.cursor.error(BadChar)),
        }
    }

    /// Parses a quoted string and converts it with `convert`, which returns [`None`] for text
    /// that is not valid for the type named `name`.
    pub fn parse_text<T>(
        &mut self,
        name: &'static str,
        convert: impl FnOnce(&str) -> Option<T>,
    ) -> Result<T, Error> {
        if self.cursor.skip_whitespace()? != Some('"') {
            return Err(self.unexpected(name));
        }
        self.cursor.read_str()?;
        match convert(self.cursor.buffer().as_str()) {
            Some(value) => Ok(value),
            None => Err(self.cursor.error(BadText(name))),
        }
    }

    /// Parses `null` or a value of the type wrapped by the nullable type `handle`.
    pub fn parse_option<T: Bind>(&mut self, handle: TypeHandle) -> Result<Option<T>, Error> {
        if self.cursor.skip_whitespace()? == Some('n') {
            self.cursor.read_literal("ull")?;
            return Ok(None);
        }
        let inner = self.descriptor(handle).inner().unwrap_or(TypeHandle::UNTYPED);
        Ok(Some(T::parse(self, inner)?))
    }

    /// Parses a member of an enumeration, given either by its underlying value or by its name.
    pub fn parse_enum<E: Enumeration>(&mut self, handle: TypeHandle) -> Result<E, Error> {
        let quoted = match self.cursor.skip_whitespace()? {
            Some('"') => {
                self.cursor.advance()?;
                true
            }
            Some('-' | '0'..='9') => false,
            _ => return Err(self.unexpected(E::NAME)),
        };
        let value = if quoted && !matches!(self.cursor.current(), Some('-' | '0'..='9')) {
            let names = &self.registry.get(handle).enum_names;
            self.cursor.match_name_rest(names)?
        } else {
            let mut builder = 0u64;
            let (negate, exp) = read_number_into_builder(&mut self.cursor, &mut builder, E::NAME)?;
            if quoted {
                self.cursor.expect('"')?;
            }
            <i64 as Num>::from_builder(builder, negate, exp)
        };
        match value.and_then(E::from_value) {
            Some(member) => Ok(member),
            None => Err(self.cursor.error(BadEnumValue(E::NAME))),
        }
    }

    /// Parses any JSON value into a [`Value`].
    pub fn parse_untyped(&mut self) -> Result<Value, Error> {
        match self.cursor.skip_whitespace()? {
            Some('n') => {
                self.cursor.read_literal("ull")?;
                Ok(Value::Null)
            }
            Some('t') => {
                self.cursor.read_literal("rue")?;
                Ok(Value::Bool(true))
            }
            Some('f') => {
                self.cursor.read_literal("alse")?;
                Ok(Value::Bool(false))
            }
            Some('"') => {
                self.cursor.read_str()?;
                Ok(Value::String(self.cursor.buffer().take()))
            }
            Some('-' | '0'..='9') => {
                capture_number(&mut self.cursor, "number")?;
                Ok(Value::Number(Number::new(self.cursor.buffer().take())))
            }
            Some('[') => Ok(Value::Array(
                self.parse_sequence(TypeHandle::UNTYPED_LIST, |items: Vec<Value>| items)?,
            )),
            Some('{') => self.parse_untyped_object(),
            Some(_) => Err(self.cursor.error(UnexpectedChar)),
            None => Err(self.cursor.error(UnexpectedEof)),
        }
    }

    /// Consumes a JSON value without storing it. The syntax of the value is still validated.
    pub fn skip_value(&mut self) -> Result<(), Error> {
        match self.cursor.skip_whitespace()? {
            Some('n') => self.cursor.read_literal("ull"),
            Some('t') => self.cursor.read_literal("rue"),
            Some('f') => self.cursor.read_literal("alse"),
            Some('"') => self.cursor.skip_str(),
            Some('-' | '0'..='9') => {
                skip_number(&mut self.cursor)
            }
            Some('[') => self.nested(|p| {
                p.cursor.advance()?;
                let mut first = true;
                while p.next_item(&mut first)? {
                    p.skip_value()?;
                }
                Ok(())
            }),
            Some('{') => self.nested(|p| {
                p.cursor.advance()?;
                let mut first = true;
                while p.next_member(&mut first)? {
                    p.cursor.skip_str()?;
                    p.colon()?;
                    p.skip_value()?;
                }
                Ok(())
            }),
            Some(_) => Err(self.cursor.error(UnexpectedChar)),
            None => Err(self.cursor.error(UnexpectedEof)),
        }
    }

    /// Moves to the next item of an array whose opening bracket has been consumed, returning
    /// `false` (and consuming the closing bracket) if there are none left.
    fn next_item(&mut self, first: &mut bool) -> Result<bool, Error> {
        let ch = self.cursor.skip_whitespace()?;
        if ch == Some(']') {
            self.cursor.advance()?;
            return Ok(false);
        }
        if std::mem::take(first) {
            return Ok(true);
        }
        self.cursor.expect(',')?;
        self.cursor.skip_whitespace()?;
        Ok(true)
    }

    /// Moves to the name of the next member of an object whose opening brace has been consumed,
    /// returning `false` (and consuming the closing brace) if there are none left. On `true`,
    /// the lookahead character is the opening quote of the name.
    fn next_member(&mut self, first: &mut bool) -> Result<bool, Error> {
        let ch = self.cursor.skip_whitespace()?;
        if ch == Some('}') {
            self.cursor.advance()?;
            return Ok(false);
        }
        if !std::mem::take(first) {
            self.cursor.expect(',')?;
            self.cursor.skip_whitespace()?;
        }
        match self.cursor.current() {
            Some('"') => Ok(true),
            Some(_) => Err(self.cursor.error(UnexpectedChar)),
            None => Err(self.cursor.error(UnexpectedEof)),
        }
    }
}
