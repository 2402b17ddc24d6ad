/// A scratch buffer for the text of an in-progress string or number. Text is stored in a fixed
/// buffer allocated once up front; when that fills up, its contents are copied once into a
/// growable overflow buffer which receives all further text.
pub struct CaptureBuffer {
    fixed: Box<[u8]>,
    limit: usize,
    len: usize,
    chars: usize,
    overflow: Vec<u8>,
    spilled: bool,
}

impl CaptureBuffer {
    /// Constructs a new [`CaptureBuffer`] whose fixed buffer holds `capacity` characters.
    pub fn new(capacity: usize) -> Self {
        Self {
            fixed: vec![0; capacity * 4].into_boxed_slice(),
            limit: capacity,
            len: 0,
            chars: 0,
            overflow: Vec::new(),
            spilled: false,
        }
    }

    /// Gets the capacity of the fixed buffer, in characters.
    pub fn capacity(&self) -> usize {
        self.limit
    }

    /// Indicates whether the current text has outgrown the fixed buffer.
    pub fn is_spilled(&self) -> bool {
        self.spilled
    }

    /// Appends a character to the buffer.
    #[inline]
    pub fn push(&mut self, ch: char) {
        if ch.is_ascii() && !self.spilled && self.chars < self.limit {
            self.fixed[self.len] = ch as u8;
            self.len += 1;
            self.chars += 1;
        } else {
            self.push_str(ch.encode_utf8(&mut [0; 4]))
        }
    }

    /// Appends a string to the buffer.
    pub fn push_str(&mut self, s: &str) {
        if self.spilled {
            self.overflow.extend_from_slice(s.as_bytes());
            return;
        }
        let chars = s.chars().count();
        if self.chars + chars <= self.limit {
            // At most four bytes per character, so this always fits
            self.fixed[self.len..(self.len + s.len())].copy_from_slice(s.as_bytes());
            self.len += s.len();
            self.chars += chars;
        } else {
            self.overflow.clear();
            self.overflow.reserve(self.len + s.len());
            self.overflow.extend_from_slice(&self.fixed[..self.len]);
            self.overflow.extend_from_slice(s.as_bytes());
            self.spilled = true;
        }
    }

    /// Gets the text in the buffer.
    pub fn as_str(&self) -> &str {
        let buf = if self.spilled {
            &self.overflow[..]
        } else {
            &self.fixed[..self.len]
        };
        // SAFETY: Only whole `str`s are ever written into the buffers.
        unsafe { std::str::from_utf8_unchecked(buf) }
    }

    /// Gets the text in the buffer as a [`String`] and clears the buffer.
    pub fn take(&mut self) -> String {
        let res = if self.spilled {
            let res = std::mem::take(&mut self.overflow);
            // SAFETY: Only whole `str`s are ever written into the buffers.
            unsafe { String::from_utf8_unchecked(res) }
        } else {
            self.as_str().to_owned()
        };
        self.clear();
        res
    }

    /// Clears the buffer.
    pub fn clear(&mut self) {
        self.len = 0;
        self.chars = 0;
        self.spilled = false;
        self.overflow.clear();
    }
}

#[test]
fn test_fixed() {
    let mut buf = CaptureBuffer::new(8);
    buf.push_str("abc");
    buf.push('d');
    assert!(!buf.is_spilled());
    assert_eq!(buf.as_str(), "abcd");
    assert_eq!(buf.take(), "abcd");
    assert_eq!(buf.as_str(), "");
}

#[test]
fn test_boundary() {
    let mut buf = CaptureBuffer::new(4);
    for ch in "wxyz".chars() {
        buf.push(ch);
    }
    assert!(!buf.is_spilled());
    assert_eq!(buf.as_str(), "wxyz");
    buf.push('!');
    assert!(buf.is_spilled());
    assert_eq!(buf.take(), "wxyz!");
    assert!(!buf.is_spilled());
}

#[test]
fn test_multibyte_spill() {
    let mut buf = CaptureBuffer::new(4);
    buf.push('a');
    buf.push('b');
    buf.push('\u{1F600}');
    buf.push('\u{00E9}');
    assert!(!buf.is_spilled());
    assert_eq!(buf.as_str(), "ab\u{1F600}\u{00E9}");
    buf.push('c');
    assert!(buf.is_spilled());
    assert_eq!(buf.take(), "ab\u{1F600}\u{00E9}c");

    // The limit counts characters, not bytes
    buf.push_str("\u{00E9}\u{00E9}\u{00E9}\u{00E9}");
    assert!(!buf.is_spilled());
    buf.push_str("\u{00E9}");
    assert!(buf.is_spilled());
    assert_eq!(buf.take(), "\u{00E9}".repeat(5));
}
