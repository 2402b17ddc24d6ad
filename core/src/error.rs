use std::fmt;

/// Describes an error that can occur when constructing an [`Engine`](crate::Engine) or
/// deserializing JSON with it.
pub struct Error(Box<ErrorInner>);

/// The inner data for an [`Error`].
struct ErrorInner {
    kind: ErrorKind,

    /// The absolute character offset in the input where this error occurred.
    pos: Option<usize>,

    /// The character at `pos`.
    found: Option<Found>,
}

/// The character found at the location of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Found {
    Char(char),
    Eof,
}

/// The possible kinds of [`Error`].
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    #[error("unexpected character")]
    UnexpectedChar,
    #[error("unexpected EOF")]
    UnexpectedEof,
    #[error("invalid literal")]
    InvalidLiteral,
    #[error("unrecognized escape sequence")]
    InvalidEscape,
    #[error("invalid unicode escape sequence")]
    InvalidUnicodeEscape,
    #[error("bad number ({0})")]
    BadNumber(&'static str),
    #[error("numeric overflow ({0})")]
    NumberOverflow(&'static str),
    #[error("bad character")]
    BadChar,
    #[error("expected string for {0}")]
    ExpectedString(&'static str),
    #[error("bad {0} text")]
    BadText(&'static str),
    #[error("unexpected null for {0}")]
    UnexpectedNull(&'static str),
    #[error("expected object for {0}")]
    ExpectedObject(&'static str),
    #[error("expected array for {0}")]
    ExpectedArray(&'static str),
    #[error("bad enum value ({0})")]
    BadEnumValue(&'static str),
    #[error("bad type tag {tag:?} for {declaring}")]
    BadTypeTag { declaring: &'static str, tag: String },
    #[error("missing type tag for {0}")]
    MissingTypeTag(&'static str),
    #[error("type cache capacity of {capacity} exceeded while registering {type_name}")]
    TypeCacheCapacity {
        capacity: usize,
        type_name: &'static str,
    },
    #[error("invalid type name {0:?}")]
    InvalidTypeName(String),
    #[error("nesting depth limit of {0} exceeded")]
    DepthLimit(usize),
    #[error("trailing characters after value")]
    TrailingCharacters,
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Constructs a new error located at the given position.
    pub fn new(kind: ErrorKind, pos: usize, found: Found) -> Self {
        Self(Box::new(ErrorInner {
            kind,
            pos: Some(pos),
            found: Some(found),
        }))
    }

    /// Constructs a new error which isn't associated with a position in the input.
    pub fn unlocated(kind: ErrorKind) -> Self {
        Self(Box::new(ErrorInner {
            kind,
            pos: None,
            found: None,
        }))
    }

    /// Gets the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.0.kind
    }

    /// Gets the absolute character offset in the input where this error occurred, or [`None`]
    /// for errors which aren't tied to the input (configuration and registration errors).
    pub fn position(&self) -> Option<usize> {
        self.0.pos
    }

    /// Gets the character found at [`Error::position`].
    pub fn found(&self) -> Option<Found> {
        self.0.found
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::unlocated(kind)
    }
}

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Found::Char(ch) => write!(f, "{:?}", ch),
            Found::Eof => f.write_str("EOF"),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("jsonbind::Error")
            .field("kind", self.kind())
            .field("pos", &self.0.pos)
            .field("found", &self.0.found)
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.0.pos, self.0.found) {
            (Some(pos), Some(found)) => write!(f, "{} at {} (found {})", self.kind(), pos, found),
            _ => fmt::Display::fmt(self.kind(), f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let ErrorKind::Io(source) = self.kind() {
            Some(source)
        } else {
            None
        }
    }
}

#[test]
fn test_display() {
    let err = Error::new(ErrorKind::UnexpectedChar, 12, Found::Char('x'));
    assert_eq!(err.to_string(), "unexpected character at 12 (found 'x')");
    let err = Error::new(ErrorKind::UnexpectedEof, 3, Found::Eof);
    assert_eq!(err.to_string(), "unexpected EOF at 3 (found EOF)");
    let err = Error::unlocated(ErrorKind::InvalidConfig("capture buffer too small"));
    assert_eq!(err.to_string(), "invalid configuration: capture buffer too small");
    assert_eq!(err.position(), None);
}
