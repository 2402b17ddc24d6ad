use std::io;

/// An interface for pulling characters from a stream, one at a time.
pub trait TextReader {
    /// Returns the next character in the stream and advances by one character, or [`None`] if the
    /// end of the stream has been reached. Data which is invalid for the reader's encoding
    /// produces an [`io::ErrorKind::InvalidData`] error.
    fn read_char(&mut self) -> io::Result<Option<char>>;
}

impl<T: TextReader + ?Sized> TextReader for Box<T> {
    fn read_char(&mut self) -> io::Result<Option<char>> {
        (**self).read_char()
    }
}

/// A character encoding for a byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl Encoding {
    /// Wraps the given byte stream in a [`TextReader`] which decodes it with this encoding.
    pub fn reader<'a, R: io::Read + 'a>(self, source: R) -> Box<dyn TextReader + 'a> {
        match self {
            Encoding::Utf8 => Box::new(Utf8Reader::new(source)),
            Encoding::Utf16Le => Box::new(Utf16Reader::new(source, false)),
            Encoding::Utf16Be => Box::new(Utf16Reader::new(source, true)),
        }
    }
}

/// A [`TextReader`] which reads from a [`std::io::Read`] with UTF-8 encoding. This reader has no
/// internal buffering, so it is recommended to use a [`std::io::BufReader`] for data that is not
/// already in memory.
pub struct Utf8Reader<R: io::Read> {
    source: R,
}

impl<R: io::Read> Utf8Reader<R> {
    /// Constructs a new [`Utf8Reader`] which reads from the given source.
    pub fn new(source: R) -> Self {
        Self { source }
    }
}

impl<R: io::Read> TextReader for Utf8Reader<R> {
    fn read_char(&mut self) -> io::Result<Option<char>> {
        read_utf8(&mut self.source)
    }
}

/// A [`TextReader`] which reads from a [`std::io::Read`] with UTF-16 encoding, in either byte
/// order. Like [`Utf8Reader`], this has no internal buffering.
pub struct Utf16Reader<R: io::Read> {
    source: R,
    big_endian: bool,
}

impl<R: io::Read> Utf16Reader<R> {
    /// Constructs a new [`Utf16Reader`] which reads from the given source.
    pub fn new(source: R, big_endian: bool) -> Self {
        Self { source, big_endian }
    }

    /// Reads a single code unit, returning [`None`] at a clean end of stream.
    fn read_unit(&mut self) -> io::Result<Option<u16>> {
        let mut buf = [0u8; 2];
        if read_some(&mut self.source, &mut buf[..1])? == 0 {
            return Ok(None);
        }
        self.source.read_exact(&mut buf[1..])?;
        Ok(Some(if self.big_endian {
            u16::from_be_bytes(buf)
        } else {
            u16::from_le_bytes(buf)
        }))
    }
}

impl<R: io::Read> TextReader for Utf16Reader<R> {
    fn read_char(&mut self) -> io::Result<Option<char>> {
        let Some(high) = self.read_unit()? else {
            return Ok(None);
        };
        let units = if (0xD800..0xDC00).contains(&high) {
            let Some(low) = self.read_unit()? else {
                return Err(invalid_data("truncated UTF-16 surrogate pair"));
            };
            [high, low]
        } else {
            [high, 0]
        };
        let len = if units[1] == 0 { 1 } else { 2 };
        match char::decode_utf16(units[..len].iter().copied()).next() {
            Some(Ok(ch)) => Ok(Some(ch)),
            _ => Err(invalid_data("invalid UTF-16 data")),
        }
    }
}

/// Reads into `buf`, retrying on interruption.
fn read_some(r: &mut (impl io::Read + ?Sized), buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match r.read(buf) {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            res => return res,
        }
    }
}

fn invalid_data(message: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

/// Reads a single [`char`] from a stream, assuming UTF-8 encoding. Returns [`None`] if the stream
/// has no data remaining and returns an error if an invalid or partial character is encountered.
pub fn read_utf8(r: &mut (impl io::Read + ?Sized)) -> io::Result<Option<char>> {
    let mut x = 0;
    if read_some(r, std::slice::from_mut(&mut x))? == 0 {
        return Ok(None);
    }
    if x < 0b10000000 {
        return Ok(Some(x.into()));
    }
    let (len, init, min) = if x & 0b11100000 == 0b11000000 {
        (1, (x & 0b00011111) as u32, 0x80)
    } else if x & 0b11110000 == 0b11100000 {
        (2, (x & 0b00001111) as u32, 0x800)
    } else if x & 0b11111000 == 0b11110000 {
        (3, (x & 0b00000111) as u32, 0x10000)
    } else {
        return Err(invalid_data("invalid UTF-8 leading byte"));
    };
    let mut buf = [0u8; 3];
    r.read_exact(&mut buf[..len])?;
    let mut ch = init;
    for byte in &buf[..len] {
        if byte & 0b11000000 != 0b10000000 {
            return Err(invalid_data("invalid UTF-8 continuation byte"));
        }
        ch = (ch << 6) | (byte & 0b00111111) as u32;
    }
    if ch < min {
        return Err(invalid_data("overlong UTF-8 encoding"));
    }
    char::from_u32(ch)
        .map(Some)
        .ok_or_else(|| invalid_data("invalid UTF-8 code point"))
}

#[test]
fn test_read_utf8() {
    let str = "ab\u{0014}\u{0162}\u{0651}\u{1485}\u{0482}\u{95832}";
    let mut bytes = str.as_bytes();
    for ch in str.chars() {
        assert_eq!(read_utf8(&mut bytes).unwrap(), Some(ch));
    }
    assert_eq!(read_utf8(&mut bytes).unwrap(), None);
}

#[test]
fn test_read_utf8_invalid() {
    let mut bytes: &[u8] = &[0xFF];
    assert!(read_utf8(&mut bytes).is_err());
    let mut bytes: &[u8] = &[0xC5, 0x41];
    assert!(read_utf8(&mut bytes).is_err());
    let mut bytes: &[u8] = &[0xE2, 0x82];
    assert!(read_utf8(&mut bytes).is_err());

    // Sequences that `str::from_utf8` also rejects
    for bytes in [
        &[0xC0, 0x80][..],
        &[0xC1, 0xBF],
        &[0xE0, 0x80, 0x80],
        &[0xE0, 0x9F, 0xBF],
        &[0xF0, 0x80, 0x80, 0x80],
        &[0xED, 0xA0, 0x80],
        &[0xF4, 0x90, 0x80, 0x80],
    ] {
        assert!(std::str::from_utf8(bytes).is_err());
        let mut reader = bytes;
        assert!(read_utf8(&mut reader).is_err(), "{:x?}", bytes);
    }
    let mut bytes: &[u8] = &[0xC2, 0x80, 0xE0, 0xA0, 0x80, 0xF0, 0x90, 0x80, 0x80];
    assert_eq!(read_utf8(&mut bytes).unwrap(), Some('\u{80}'));
    assert_eq!(read_utf8(&mut bytes).unwrap(), Some('\u{800}'));
    assert_eq!(read_utf8(&mut bytes).unwrap(), Some('\u{10000}'));
}

#[test]
fn test_read_utf16() {
    let str = "a\u{0162}\u{1F600}z";
    for big_endian in [false, true] {
        let bytes: Vec<u8> = str
            .encode_utf16()
            .flat_map(|unit| {
                if big_endian {
                    unit.to_be_bytes()
                } else {
                    unit.to_le_bytes()
                }
            })
            .collect();
        let mut reader = Utf16Reader::new(bytes.as_slice(), big_endian);
        for ch in str.chars() {
            assert_eq!(reader.read_char().unwrap(), Some(ch));
        }
        assert_eq!(reader.read_char().unwrap(), None);
    }
    let mut reader = Utf16Reader::new(&[0x3D, 0xD8][..], false);
    assert!(reader.read_char().is_err());
}
