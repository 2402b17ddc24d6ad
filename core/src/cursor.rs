use crate::capture::CaptureBuffer;
use crate::error::{Error, ErrorKind, Found};
use crate::name_map::NameMap;
use crate::tables;
use crate::text_reader::TextReader;
use ErrorKind::*;

/// Tracks the current position within a JSON source, along with one character of lookahead.
pub struct Cursor<'a> {
    source: Source<'a>,
    buffer: &'a mut CaptureBuffer,
    ch: Option<char>,
    pos: usize,
    allow_comments: bool,
}

/// The source of characters for a [`Cursor`].
enum Source<'a> {
    /// An in-memory string. `offset` is the byte offset just past the lookahead character.
    Text { text: &'a str, offset: usize },

    /// A sequential character stream.
    Stream(Box<dyn TextReader + 'a>),
}

impl<'a> Cursor<'a> {
    /// Constructs a [`Cursor`] over an in-memory string.
    pub fn from_text(text: &'a str, buffer: &'a mut CaptureBuffer, allow_comments: bool) -> Self {
        let mut offset = 0;
        let ch = next_text_char(text, &mut offset);
        buffer.clear();
        Self {
            source: Source::Text { text, offset },
            buffer,
            ch,
            pos: 0,
            allow_comments,
        }
    }

    /// Constructs a [`Cursor`] over a [`TextReader`].
    pub fn from_reader(
        mut reader: Box<dyn TextReader + 'a>,
        buffer: &'a mut CaptureBuffer,
        allow_comments: bool,
    ) -> Result<Self, Error> {
        buffer.clear();
        let ch = reader
            .read_char()
            .map_err(|err| Error::new(Io(err), 0, Found::Eof))?;
        Ok(Self {
            source: Source::Stream(reader),
            buffer,
            ch,
            pos: 0,
            allow_comments,
        })
    }

    /// Gets the lookahead character, or [`None`] at the end of input.
    #[inline]
    pub fn current(&self) -> Option<char> {
        self.ch
    }

    /// Gets the absolute character offset of the lookahead character.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Gets the capture buffer.
    pub fn buffer(&mut self) -> &mut CaptureBuffer {
        self.buffer
    }

    /// Constructs an error of the given kind at the current position.
    pub fn error(&self, kind: ErrorKind) -> Error {
        Error::new(kind, self.pos, self.ch.map_or(Found::Eof, Found::Char))
    }

    /// Consumes the lookahead character, returning the new one.
    #[inline]
    pub fn advance(&mut self) -> Result<Option<char>, Error> {
        if self.ch.is_some() {
            self.pos += 1;
        }
        self.ch = match &mut self.source {
            Source::Text { text, offset } => next_text_char(text, offset),
            Source::Stream(reader) => match reader.read_char() {
                Ok(ch) => ch,
                Err(err) => return Err(Error::new(Io(err), self.pos, Found::Eof)),
            },
        };
        Ok(self.ch)
    }

    /// Consumes the lookahead character if it is `ch`, failing otherwise.
    #[inline]
    pub fn expect(&mut self, ch: char) -> Result<(), Error> {
        match self.ch {
            Some(act) if act == ch => {
                self.advance()?;
                Ok(())
            }
            Some(_) => Err(self.error(UnexpectedChar)),
            None => Err(self.error(UnexpectedEof)),
        }
    }

    /// Appends `ch` to the capture buffer and advances.
    #[inline]
    pub fn capture(&mut self, ch: char) -> Result<Option<char>, Error> {
        self.buffer.push(ch);
        self.advance()
    }

    /// Advances past any whitespace (and comments, if enabled), returning the first character
    /// that is not part of it.
    pub fn skip_whitespace(&mut self) -> Result<Option<char>, Error> {
        loop {
            match self.ch {
                Some(ch) if ch <= ' ' => {
                    self.advance()?;
                }
                Some('/') if self.allow_comments => self.skip_comment()?,
                ch => return Ok(ch),
            }
        }
    }

    /// Advances past a comment, given that the lookahead character is the initial slash.
    fn skip_comment(&mut self) -> Result<(), Error> {
        match self.advance()? {
            Some('/') => loop {
                match self.advance()? {
                    Some('\n') => {
                        self.advance()?;
                        return Ok(());
                    }
                    Some(_) => (),
                    None => return Ok(()),
                }
            },
            Some('*') => {
                self.advance()?;
                loop {
                    match self.ch {
                        Some('*') => {
                            if self.advance()? == Some('/') {
                                self.advance()?;
                                return Ok(());
                            }
                        }
                        Some(_) => {
                            self.advance()?;
                        }
                        None => return Err(self.error(UnexpectedEof)),
                    }
                }
            }
            Some(_) => Err(self.error(UnexpectedChar)),
            None => Err(self.error(UnexpectedEof)),
        }
    }

    /// Consumes the remainder of a literal, given that its first character is the lookahead
    /// character.
    pub fn read_literal(&mut self, rest: &str) -> Result<(), Error> {
        self.advance()?;
        for ch in rest.chars() {
            if self.ch != Some(ch) {
                return Err(self.error(InvalidLiteral));
            }
            self.advance()?;
        }
        Ok(())
    }

    /// Checks that nothing but whitespace remains in the input.
    pub fn finish(&mut self) -> Result<(), Error> {
        match self.skip_whitespace()? {
            None => Ok(()),
            Some(_) => Err(self.error(TrailingCharacters)),
        }
    }

    /// Reads an escape sequence in a quoted string, given that the lookahead character is the
    /// backslash. The cursor is left just past the sequence.
    pub fn read_escape(&mut self) -> Result<char, Error> {
        match self.advance()? {
            Some('u') => {
                self.advance()?;
                let unit = self.read_hex_unit()?;
                let ch = if (0xD800..0xDC00).contains(&unit) {
                    if self.ch != Some('\\') || self.advance()? != Some('u') {
                        return Err(self.error(InvalidUnicodeEscape));
                    }
                    self.advance()?;
                    let low = self.read_hex_unit()?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(self.error(InvalidUnicodeEscape));
                    }
                    char::from_u32(0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00))
                } else {
                    char::from_u32(unit)
                };
                ch.ok_or_else(|| self.error(InvalidUnicodeEscape))
            }
            Some(ch) => {
                let Some(res) = tables::unescape(ch) else {
                    return Err(self.error(InvalidEscape));
                };
                self.advance()?;
                Ok(res)
            }
            None => Err(self.error(UnexpectedEof)),
        }
    }

    /// Reads the four hex digits of a `\u` escape sequence.
    fn read_hex_unit(&mut self) -> Result<u32, Error> {
        let mut unit = 0;
        for _ in 0..4 {
            let Some(digit) = self.ch.and_then(tables::hex_value) else {
                return Err(self.error(InvalidUnicodeEscape));
            };
            unit = (unit << 4) | digit as u32;
            self.advance()?;
        }
        Ok(unit)
    }

    /// For an in-memory source, consumes the run of characters starting at the lookahead
    /// character which contains no quote or backslash, returning it.
    fn take_plain_run(&mut self) -> Result<Option<&'a str>, Error> {
        let (Source::Text { text, offset }, Some(ch)) = (&mut self.source, self.ch) else {
            return Ok(None);
        };
        if ch == '"' || ch == '\\' {
            return Ok(None);
        }
        let text: &'a str = *text;
        let start = *offset - ch.len_utf8();
        let rest = &text[start..];
        let len = rest
            .bytes()
            .position(|b| b == b'"' || b == b'\\')
            .unwrap_or(rest.len());
        let run = &rest[..len];
        *offset = start + len;
        self.pos += run.chars().count();
        self.ch = next_text_char(text, offset);
        Ok(Some(run))
    }

    /// Reads a quoted string into the capture buffer, given that the lookahead character is the
    /// opening quote. The buffer is cleared first and the cursor is left past the closing quote.
    pub fn read_str(&mut self) -> Result<(), Error> {
        self.buffer.clear();
        self.advance()?;
        loop {
            if let Some(run) = self.take_plain_run()? {
                self.buffer.push_str(run);
            }
            match self.ch {
                Some('"') => {
                    self.advance()?;
                    return Ok(());
                }
                Some('\\') => {
                    let ch = self.read_escape()?;
                    self.buffer.push(ch);
                }
                Some(ch) => {
                    self.capture(ch)?;
                }
                None => return Err(self.error(UnexpectedEof)),
            }
        }
    }

    /// Advances past a quoted string, given that the lookahead character is the opening quote.
    pub fn skip_str(&mut self) -> Result<(), Error> {
        self.advance()?;
        loop {
            self.take_plain_run()?;
            match self.ch {
                Some('"') => {
                    self.advance()?;
                    return Ok(());
                }
                Some('\\') => {
                    self.read_escape()?;
                }
                Some(_) => {
                    self.advance()?;
                }
                None => return Err(self.error(UnexpectedEof)),
            }
        }
    }

    /// Reads a quoted string, given that the lookahead character is the opening quote, and looks
    /// it up in `names` without storing it. The cursor is left past the closing quote.
    pub fn match_name<T: Copy>(&mut self, names: &NameMap<T>) -> Result<Option<T>, Error> {
        self.advance()?;
        self.match_name_rest(names)
    }

    /// Like [`Cursor::match_name`], but for when the opening quote has already been consumed.
    pub fn match_name_rest<T: Copy>(&mut self, names: &NameMap<T>) -> Result<Option<T>, Error> {
        let mut lookup = names.lookup();
        loop {
            if let Some(run) = self.take_plain_run()? {
                lookup.write_str(run);
            }
            match self.ch {
                Some('"') => {
                    self.advance()?;
                    return Ok(lookup.result().copied());
                }
                Some('\\') => {
                    let ch = self.read_escape()?;
                    lookup.write_char(ch);
                }
                Some(ch) => {
                    lookup.write_char(ch);
                    self.advance()?;
                }
                None => return Err(self.error(UnexpectedEof)),
            }
        }
    }
}

/// Decodes the character at `offset` in `text`, advancing `offset` past it.
#[inline]
fn next_text_char(text: &str, offset: &mut usize) -> Option<char> {
    let rest = text.get(*offset..)?;
    match rest.as_bytes().first() {
        None => None,
        Some(&b) if b < 0x80 => {
            *offset += 1;
            Some(b as char)
        }
        Some(_) => {
            let ch = rest.chars().next();
            if let Some(ch) = ch {
                *offset += ch.len_utf8();
            }
            ch
        }
    }
}

#[cfg(test)]
fn with_cursor<R>(text: &str, f: impl FnOnce(&mut Cursor) -> R) -> R {
    let mut buffer = CaptureBuffer::new(256);
    let mut cursor = Cursor::from_text(text, &mut buffer, true);
    f(&mut cursor)
}

#[test]
fn test_advance_position() {
    with_cursor("a\u{E9}b", |c| {
        assert_eq!(c.current(), Some('a'));
        assert_eq!(c.advance().unwrap(), Some('\u{E9}'));
        assert_eq!(c.position(), 1);
        assert_eq!(c.advance().unwrap(), Some('b'));
        assert_eq!(c.position(), 2);
        assert_eq!(c.advance().unwrap(), None);
        assert_eq!(c.position(), 3);
        assert_eq!(c.advance().unwrap(), None);
        assert_eq!(c.position(), 3);
    });
}

#[test]
fn test_whitespace_and_comments() {
    with_cursor(" \t\n// line\n /* block * */ x", |c| {
        assert_eq!(c.skip_whitespace().unwrap(), Some('x'));
    });
    with_cursor("/* open", |c| {
        assert!(c.skip_whitespace().is_err());
    });
}

#[test]
fn test_read_str() {
    with_cursor(r#""plain \"esc\" é😀 end" rest"#, |c| {
        c.read_str().unwrap();
        assert_eq!(c.buffer().as_str(), "plain \"esc\" \u{e9}\u{1F600} end");
        assert_eq!(c.skip_whitespace().unwrap(), Some('r'));
    });
    with_cursor(r#""bad \q""#, |c| {
        let err = c.read_str().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidEscape));
    });
    with_cursor(r#""lone \ud83d""#, |c| {
        let err = c.read_str().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidUnicodeEscape));
    });
    with_cursor(r#""unterminated"#, |c| {
        let err = c.read_str().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedEof));
        assert_eq!(err.found(), Some(Found::Eof));
    });
}

#[test]
fn test_match_name() {
    let names = NameMap::new(vec![("alpha", 0), ("alp", 1), ("beta", 2)]);
    with_cursor(r#""alp" "alpha" "alph\u0061" "gamma" """#, |c| {
        assert_eq!(c.match_name(&names).unwrap(), Some(1));
        c.skip_whitespace().unwrap();
        assert_eq!(c.match_name(&names).unwrap(), Some(0));
        c.skip_whitespace().unwrap();
        assert_eq!(c.match_name(&names).unwrap(), Some(0));
        c.skip_whitespace().unwrap();
        assert_eq!(c.match_name(&names).unwrap(), None);
        c.skip_whitespace().unwrap();
        assert_eq!(c.match_name(&names).unwrap(), None);
        assert_eq!(c.current(), None);
    });
}

#[test]
fn test_error_position() {
    with_cursor("nul!", |c| {
        let err = c.read_literal("ull").unwrap_err();
        assert_eq!(err.position(), Some(3));
        assert_eq!(err.found(), Some(Found::Char('!')));
    });
}
