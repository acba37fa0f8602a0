use bk_types::ContentDigest;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so a digest computed for one purpose can never be confused
/// with a digest computed for another.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for asset content (reference uploads and stored blobs).
    pub const ASSET: Self = Self {
        domain: "bk-asset-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ContentDigest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ContentDigest::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected digest.
    pub fn verify(&self, data: &[u8], expected: &ContentDigest) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Digest of asset content under the [`ContentHasher::ASSET`] domain.
pub fn digest(data: &[u8]) -> ContentDigest {
    ContentHasher::ASSET.hash(data)
}
