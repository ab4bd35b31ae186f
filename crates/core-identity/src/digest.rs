//! Digests behind derived identifiers
//!
//! Role ids are the digest of the role name and parameter sets are
//! addressed by the digest of their big-endian word encoding. Both use
//! blake3 over the raw bytes with no framing, so a set hashed word by word
//! gets the same address as its concatenated encoding.

/// Incremental digest over a sequence of byte chunks
///
/// ```
/// use core_identity::digest::{digest, Digester};
///
/// let mut digester = Digester::new();
/// digester.absorb(b"TRANSFER").absorb(b"_ROLE");
/// assert_eq!(digester.finish(), digest(b"TRANSFER_ROLE"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Digester {
    inner: blake3::Hasher,
    absorbed: u64,
}

impl Digester {
    /// Empty digester
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk
    pub fn absorb(&mut self, chunk: &[u8]) -> &mut Self {
        self.inner.update(chunk);
        self.absorbed += chunk.len() as u64;
        self
    }

    /// Bytes absorbed so far
    #[must_use]
    pub fn absorbed(&self) -> u64 {
        self.absorbed
    }

    /// 32-byte digest of everything absorbed
    #[must_use]
    pub fn finish(&self) -> [u8; 32] {
        self.inner.finalize().into()
    }
}

/// Digest of a single byte string
#[must_use]
pub fn digest(data: &[u8]) -> [u8; 32] {
    blake3::hash(data).into()
}

/// Digest of `chunks` laid end to end
#[must_use]
pub fn digest_chunks(chunks: &[&[u8]]) -> [u8; 32] {
    let mut digester = Digester::new();
    for chunk in chunks {
        digester.absorb(chunk);
    }
    digester.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunking_does_not_change_digest() {
        let whole = digest(b"abcdef");
        assert_eq!(digest_chunks(&[b"abc", b"def"]), whole);
        assert_eq!(digest_chunks(&[b"a", b"", b"bcdef"]), whole);
        assert_ne!(digest_chunks(&[b"abcdeg"]), whole);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(digest_chunks(&[]), digest(b""));
        assert_ne!(digest(b""), [0u8; 32]);
    }

    #[test]
    fn test_absorbed_counts_bytes() {
        let mut digester = Digester::new();
        digester.absorb(&[0u8; 32]).absorb(&[1u8; 32]);
        assert_eq!(digester.absorbed(), 64);
    }
}
