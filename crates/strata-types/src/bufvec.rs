use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A vector of byte buffers.
///
/// The unit of payload for object data, object attributes, and KV keys and
/// values. Buffers are reference-counted (`Bytes`), so cloning a `BufVec`
/// never copies payload bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BufVec(Vec<Bytes>);

impl BufVec {
    /// Create an empty buffer vector.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Create a buffer vector with `count` empty slots.
    ///
    /// Used for read and get operations, where the backend fills the
    /// buffers in.
    pub fn with_slots(count: usize) -> Self {
        Self(vec![Bytes::new(); count])
    }

    pub fn push(&mut self, buf: impl Into<Bytes>) {
        self.0.push(buf.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Bytes> {
        self.0.get(i)
    }

    /// Replace the buffer at `i`. Panics if out of range.
    pub fn set(&mut self, i: usize, buf: impl Into<Bytes>) {
        self.0[i] = buf.into();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bytes> {
        self.0.iter()
    }

    /// Total bytes across all buffers.
    pub fn total_bytes(&self) -> usize {
        self.0.iter().map(|b| b.len()).sum()
    }
}

impl FromIterator<Bytes> for BufVec {
    fn from_iter<T: IntoIterator<Item = Bytes>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a BufVec {
    type Item = &'a Bytes;
    type IntoIter = std::slice::Iter<'a, Bytes>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<Vec<u8>>> for BufVec {
    fn from(bufs: Vec<Vec<u8>>) -> Self {
        Self(bufs.into_iter().map(Bytes::from).collect())
    }
}

/// A single extent: a contiguous byte range within an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extent {
    pub offset: u64,
    pub len: u64,
}

impl Extent {
    pub const fn new(offset: u64, len: u64) -> Self {
        Self { offset, len }
    }

    /// One-past-the-end offset of this extent.
    pub fn end(&self) -> u64 {
        self.offset + self.len
    }
}

/// A vector of extents describing where object I/O lands.
///
/// The `i`-th extent pairs with the `i`-th buffer of the operation's data
/// `BufVec`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtentVec(Vec<Extent>);

impl ExtentVec {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, offset: u64, len: u64) {
        self.0.push(Extent::new(offset, len));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Extent> {
        self.0.get(i)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Extent> {
        self.0.iter()
    }

    /// Offset of the first extent, or zero if empty.
    ///
    /// Backends use this to tell the first unit of a streamed transfer
    /// from continuations.
    pub fn first_offset(&self) -> u64 {
        self.0.first().map(|e| e.offset).unwrap_or(0)
    }

    /// Total byte length across all extents.
    pub fn total_len(&self) -> u64 {
        self.0.iter().map(|e| e.len).sum()
    }
}

impl FromIterator<Extent> for ExtentVec {
    fn from_iter<T: IntoIterator<Item = Extent>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ExtentVec {
    type Item = &'a Extent;
    type IntoIter = std::slice::Iter<'a, Extent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bufvec_push_and_total() {
        let mut bufs = BufVec::new();
        bufs.push(Bytes::from_static(b"hello"));
        bufs.push(Bytes::from_static(b"world!"));
        assert_eq!(bufs.len(), 2);
        assert_eq!(bufs.total_bytes(), 11);
    }

    #[test]
    fn bufvec_slots_start_empty() {
        let bufs = BufVec::with_slots(3);
        assert_eq!(bufs.len(), 3);
        assert_eq!(bufs.total_bytes(), 0);
        assert!(bufs.get(0).unwrap().is_empty());
    }

    #[test]
    fn bufvec_set_replaces() {
        let mut bufs = BufVec::with_slots(1);
        bufs.set(0, Bytes::from_static(b"data"));
        assert_eq!(bufs.get(0).unwrap().as_ref(), b"data");
    }

    #[test]
    fn bufvec_from_vecs() {
        let bufs = BufVec::from(vec![b"a".to_vec(), b"bc".to_vec()]);
        assert_eq!(bufs.len(), 2);
        assert_eq!(bufs.total_bytes(), 3);
    }

    #[test]
    fn extent_end() {
        let e = Extent::new(4096, 1024);
        assert_eq!(e.end(), 5120);
    }

    #[test]
    fn extentvec_first_offset_and_total() {
        let mut exts = ExtentVec::new();
        assert_eq!(exts.first_offset(), 0);
        exts.push(8192, 4096);
        exts.push(12288, 4096);
        assert_eq!(exts.first_offset(), 8192);
        assert_eq!(exts.total_len(), 8192);
        assert_eq!(exts.len(), 2);
    }
}
