use std::cmp::Ordering;

/// An immutable lookup table which associates `&'static str`'s to values of type `T`. Entries are
/// kept sorted by name so that a [`NameMapLookup`] can narrow down candidates as the name is
/// written into it.
#[derive(Debug, Clone)]
pub struct NameMap<T> {
    entries: Box<[(&'static str, T)]>,
}

impl<T> NameMap<T> {
    /// Constructs a new [`NameMap`] with the given entries.
    pub fn new(mut entries: Vec<(&'static str, T)>) -> Self {
        entries.sort_unstable_by(|(a, _), (b, _)| cmp_bytes(a.as_bytes(), b.as_bytes()));
        Self {
            entries: entries.into_boxed_slice(),
        }
    }

    /// Begins a lookup into this [`NameMap`].
    pub fn lookup(&self) -> NameMapLookup<T> {
        NameMapLookup {
            cands: &self.entries,
            input_len: 0,
        }
    }

    /// Gets the value corresponding to the given name in this [`NameMap`], or returns [`None`]
    /// if no such entry exists.
    pub fn get(&self, name: &str) -> Option<&T> {
        let mut lookup = self.lookup();
        lookup.write_str(name);
        lookup.result()
    }

    /// Gets the number of entries in this [`NameMap`].
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Gets an iterator over the entries in this [`NameMap`], in sorted order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &T)> {
        self.entries.iter().map(|(name, value)| (*name, value))
    }
}

impl<T> Default for NameMap<T> {
    fn default() -> Self {
        Self {
            entries: Box::new([]),
        }
    }
}

/// An interface for looking up a name in a [`NameMap`] from a string that is incrementally
/// written into it. This is done without actually storing the string, avoiding unnecessary
/// allocations.
#[derive(Debug)]
pub struct NameMapLookup<'a, T> {
    cands: &'a [(&'static str, T)],
    input_len: usize,
}

impl<'a, T> NameMapLookup<'a, T> {
    /// Adds an additional charater to the lookup string.
    pub fn write_char(&mut self, ch: char) {
        self.write_str(ch.encode_utf8(&mut [0; 4]))
    }

    /// Extends the lookup string.
    pub fn write_str(&mut self, str: &str) {
        self.write_bytes(str.as_bytes())
    }

    /// Extends the lookup string with the given UTF-8 encoded byte data. If the data is not
    /// valid UTF-8, the lookup will return an indeterminate result.
    pub fn write_bytes(&mut self, data: &[u8]) {
        if self.cands.is_empty() {
            self.input_len += data.len();
            return;
        }

        // Binary search to find some candidate that can still match the lookup string.
        let mut lo = 0;
        let mut hi = self.cands.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let mid_data = truncate_slice(self.cands[mid].0.as_bytes(), self.input_len, data.len());
            match cmp_bytes(mid_data, data) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => {
                    let mut lo_hi = mid;
                    let mut hi_lo = mid + 1;

                    // Binary search to extend the lower bound to include all matching candidates
                    while lo < lo_hi {
                        let mid = lo + (lo_hi - lo) / 2;
                        let mid_data = truncate_slice(
                            self.cands[mid].0.as_bytes(),
                            self.input_len,
                            data.len(),
                        );
                        match cmp_bytes(mid_data, data) {
                            Ordering::Less => lo = mid + 1,
                            Ordering::Greater => unreachable!(),
                            Ordering::Equal => lo_hi = mid,
                        }
                    }

                    // Binary search to extend the upper bound to include all matching candidates
                    while hi_lo < hi {
                        let mid = hi_lo + (hi - hi_lo) / 2;
                        let mid_data = truncate_slice(
                            self.cands[mid].0.as_bytes(),
                            self.input_len,
                            data.len(),
                        );
                        match cmp_bytes(mid_data, data) {
                            Ordering::Less => unreachable!(),
                            Ordering::Greater => hi = mid,
                            Ordering::Equal => hi_lo = mid + 1,
                        }
                    }
                    break;
                }
            }
        }
        self.cands = &self.cands[lo..hi];
        self.input_len += data.len();
    }

    /// Gets the value corresponding to the lookup string written to this [`NameMapLookup`], or
    /// [`None`] if no such entry exists. An empty lookup string never matches.
    pub fn result(&self) -> Option<&'a T> {
        if self.input_len == 0 {
            return None;
        }
        let (key, value) = self.cands.first()?;
        if key.len() != self.input_len {
            return None;
        }
        Some(value)
    }
}

/// Gets a slice of the given array, starting at the given index and having up to the given
/// length.
fn truncate_slice<T>(data: &[T], start: usize, len: usize) -> &[T] {
    let data = data.get(start..).unwrap_or(&[]);
    if data.len() > len {
        &data[..len]
    } else {
        data
    }
}

/// Compares two byte arrays.
fn cmp_bytes(left: &[u8], right: &[u8]) -> Ordering {
    left.cmp(right)
}

#[cfg(test)]
fn test_map() -> NameMap<u32> {
    NameMap::new(vec![
        ("pot", 0),
        ("boy", 1),
        ("rice", 2),
        ("film", 3),
        ("taxi", 4),
        ("debt", 5),
        ("fat", 6),
        ("firm", 7),
        ("run", 8),
        ("bat", 9),
        ("fi", 10),
    ])
}

#[test]
fn test_sorted() {
    let map = test_map();
    let entries = &map.entries;
    for i in 1..entries.len() {
        assert!(entries[i - 1] < entries[i]);
    }
}

#[test]
fn test_lookup() {
    let map = test_map();
    for (name, value) in map.entries() {
        assert_eq!(map.get(name).unwrap(), value);
    }
    assert_eq!(map.get("dolphin"), None);
    assert_eq!(map.get(""), None);
    assert_eq!(map.get("fir"), None);
    assert_eq!(map.get("firms"), None);
    assert_eq!(map.get("d"), None);
}

#[test]
fn test_lookup_incremental() {
    let map = test_map();
    let mut lookup = map.lookup();
    for ch in "film".chars() {
        lookup.write_char(ch);
    }
    assert_eq!(lookup.result(), Some(&3));
    lookup.write_char('s');
    assert_eq!(lookup.result(), None);
}

#[test]
fn test_empty_name_never_matches() {
    let map = NameMap::new(vec![("", 0), ("a", 1)]);
    assert_eq!(map.get(""), None);
    assert_eq!(map.get("a"), Some(&1));
}
