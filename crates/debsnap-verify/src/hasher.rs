#[cfg(feature = "sha256")]
use sha2::Digest;

/// Incremental digest over a byte stream.
pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Vec<u8>;

    fn finalize_hex(self) -> String
    where
        Self: Sized,
    {
        hex::encode(self.finalize())
    }
}

#[cfg(feature = "md5")]
#[derive(Clone)]
pub struct Md5Hasher(md5::Context);

#[cfg(feature = "md5")]
impl Hasher for Md5Hasher {
    fn update(&mut self, data: &[u8]) { self.0.consume(data); }
    fn finalize(self) -> Vec<u8> { self.0.compute().0.to_vec() }
}

#[cfg(feature = "md5")]
impl Default for Md5Hasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "md5")]
impl Md5Hasher {
    pub fn new() -> Self { Self(md5::Context::new()) }

    pub fn digest(data: &[u8]) -> Vec<u8> { md5::compute(data).0.to_vec() }
}

#[cfg(feature = "sha256")]
#[derive(Clone)]
pub struct Sha256Hasher(sha2::Sha256);

#[cfg(feature = "sha256")]
impl Hasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Vec<u8> { self.0.finalize().to_vec() }
}

#[cfg(feature = "sha256")]
impl Default for Sha256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "sha256")]
impl Sha256Hasher {
    pub fn new() -> Self { Self(sha2::Sha256::new()) }

    pub fn digest(data: &[u8]) -> Vec<u8> { sha2::Sha256::digest(data).to_vec() }
}

/// Runtime-selected hasher, built by [`crate::HashAlgorithm::hasher`].
#[derive(Clone)]
pub enum AnyHasher {
    #[cfg(feature = "md5")]
    Md5(Md5Hasher),
    #[cfg(feature = "sha256")]
    Sha256(Sha256Hasher),
}

impl Hasher for AnyHasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            #[cfg(feature = "md5")]
            AnyHasher::Md5(h) => h.update(data),
            #[cfg(feature = "sha256")]
            AnyHasher::Sha256(h) => h.update(data),
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            #[cfg(feature = "md5")]
            AnyHasher::Md5(h) => h.finalize(),
            #[cfg(feature = "sha256")]
            AnyHasher::Sha256(h) => h.finalize(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "md5")]
    #[test]
    fn md5_matches_known_digest() {
        let mut hasher = Md5Hasher::new();
        hasher.update(b"hello world");
        assert_eq!(hasher.finalize_hex(), "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[cfg(feature = "md5")]
    #[test]
    fn md5_incremental_equals_one_shot() {
        let data = vec![7u8; 20_000];
        let mut hasher = Md5Hasher::new();
        for chunk in data.chunks(8192) {
            hasher.update(chunk);
        }
        assert_eq!(hasher.finalize(), Md5Hasher::digest(&data));
    }

    #[cfg(feature = "sha256")]
    #[test]
    fn sha256_matches_known_digest() {
        let mut hasher = Sha256Hasher::new();
        hasher.update(b"hello world");
        assert_eq!(
            hasher.finalize_hex(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn empty_input_still_produces_digest() {
        #[cfg(feature = "md5")]
        assert_eq!(Md5Hasher::new().finalize_hex(), "d41d8cd98f00b204e9800998ecf8427e");
        #[cfg(feature = "sha256")]
        assert_eq!(Sha256Hasher::new().finalize().len(), 32);
    }
}
