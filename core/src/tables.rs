//! Character classification tables. These are built at compile time and only cover the ASCII
//! range; every character outside of it is "not a member" of any table.

/// Marks a byte with no entry in [`HEX`] or [`ESCAPE`].
const NONE: u8 = 0xFF;

/// Maps an ASCII hex digit to its value, or [`NONE`].
static HEX: [u8; 128] = build_hex();

/// Maps the character following a backslash to the character it stands for, or [`NONE`].
/// `u` is absent since it introduces a multi-character escape.
static ESCAPE: [u8; 128] = build_escape();

/// Flags for identifier characters.
static IDENT: [u8; 128] = build_ident();

const IDENT_START: u8 = 1;
const IDENT_CONTINUE: u8 = 2;

const fn build_hex() -> [u8; 128] {
    let mut table = [NONE; 128];
    let mut i = 0;
    while i < 10 {
        table[b'0' as usize + i] = i as u8;
        i += 1;
    }
    i = 0;
    while i < 6 {
        table[b'a' as usize + i] = 10 + i as u8;
        table[b'A' as usize + i] = 10 + i as u8;
        i += 1;
    }
    table
}

const fn build_escape() -> [u8; 128] {
    let mut table = [NONE; 128];
    table[b'"' as usize] = b'"';
    table[b'\\' as usize] = b'\\';
    table[b'/' as usize] = b'/';
    table[b'b' as usize] = 0x08;
    table[b'f' as usize] = 0x0C;
    table[b'n' as usize] = b'\n';
    table[b'r' as usize] = b'\r';
    table[b't' as usize] = b'\t';
    table
}

const fn build_ident() -> [u8; 128] {
    let mut table = [0; 128];
    let mut i = 0;
    while i < 128 {
        let ch = i as u8;
        if ch.is_ascii_alphabetic() || ch == b'_' || ch == b'$' {
            table[i] = IDENT_START | IDENT_CONTINUE;
        } else if ch.is_ascii_digit() {
            table[i] = IDENT_CONTINUE;
        }
        i += 1;
    }
    table
}

/// Gets the value of the given hex digit, or [`None`] if it is not one.
#[inline]
pub fn hex_value(ch: char) -> Option<u8> {
    match HEX.get(ch as usize) {
        Some(&NONE) | None => None,
        Some(&value) => Some(value),
    }
}

/// Translates the character following a backslash in a JSON string. Returns [`None`] for `u`
/// and for characters that don't form a valid escape.
#[inline]
pub fn unescape(ch: char) -> Option<char> {
    match ESCAPE.get(ch as usize) {
        Some(&NONE) | None => None,
        Some(&value) => Some(value as char),
    }
}

/// Determines whether the given character can start an identifier.
#[inline]
pub fn is_ident_start(ch: char) -> bool {
    IDENT.get(ch as usize).map_or(false, |flags| flags & IDENT_START != 0)
}

/// Determines whether the given character can appear after the first character of an
/// identifier.
#[inline]
pub fn is_ident_continue(ch: char) -> bool {
    IDENT.get(ch as usize).map_or(false, |flags| flags & IDENT_CONTINUE != 0)
}

/// Determines whether `name` is a dot-separated sequence of identifiers, as used for the type
/// names that may appear in a type tag.
pub fn is_type_name(name: &str) -> bool {
    name.split('.').all(|segment| {
        let mut chars = segment.chars();
        chars.next().map_or(false, is_ident_start) && chars.all(is_ident_continue)
    })
}

#[test]
fn test_hex() {
    assert_eq!(hex_value('0'), Some(0));
    assert_eq!(hex_value('9'), Some(9));
    assert_eq!(hex_value('a'), Some(10));
    assert_eq!(hex_value('F'), Some(15));
    assert_eq!(hex_value('g'), None);
    assert_eq!(hex_value('\u{663}'), None);
}

#[test]
fn test_unescape() {
    assert_eq!(unescape('n'), Some('\n'));
    assert_eq!(unescape('/'), Some('/'));
    assert_eq!(unescape('"'), Some('"'));
    assert_eq!(unescape('u'), None);
    assert_eq!(unescape('q'), None);
}

#[test]
fn test_type_name() {
    assert!(is_type_name("Dog"));
    assert!(is_type_name("Zoo.Animals.Dog"));
    assert!(is_type_name("_Private$1"));
    assert!(!is_type_name(""));
    assert!(!is_type_name("Zoo..Dog"));
    assert!(!is_type_name("1Dog"));
    assert!(!is_type_name("Dog "));
}
