//! Message digests over stored content.
//!
//! Digests are computed client-side by streaming the whole object through
//! the hash, so the cost is proportional to the object size.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use digest::DynDigest;
use futures::TryStreamExt;

use crate::error::{BinaryStoreError, Result};
use crate::stream::BinaryStream;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Md2,
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    pub const ALL: [DigestAlgorithm; 6] = [
        DigestAlgorithm::Md2,
        DigestAlgorithm::Md5,
        DigestAlgorithm::Sha1,
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Sha384,
        DigestAlgorithm::Sha512,
    ];

    /// Canonical name, as accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Md2 => "MD2",
            DigestAlgorithm::Md5 => "MD5",
            DigestAlgorithm::Sha1 => "SHA-1",
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha384 => "SHA-384",
            DigestAlgorithm::Sha512 => "SHA-512",
        }
    }

    /// Every accepted name, aliases included.
    pub fn supported() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Self::ALL.iter().map(|alg| alg.name()).collect();
        names.push("SHA");
        names
    }

    fn hasher(&self) -> Box<dyn DynDigest + Send> {
        match self {
            DigestAlgorithm::Md2 => Box::new(md2::Md2::default()),
            DigestAlgorithm::Md5 => Box::new(md5::Md5::default()),
            DigestAlgorithm::Sha1 => Box::new(sha1::Sha1::default()),
            DigestAlgorithm::Sha256 => Box::new(sha2::Sha256::default()),
            DigestAlgorithm::Sha384 => Box::new(sha2::Sha384::default()),
            DigestAlgorithm::Sha512 => Box::new(sha2::Sha512::default()),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = BinaryStoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MD2" => Ok(DigestAlgorithm::Md2),
            "MD5" => Ok(DigestAlgorithm::Md5),
            "SHA" | "SHA-1" => Ok(DigestAlgorithm::Sha1),
            "SHA-256" => Ok(DigestAlgorithm::Sha256),
            "SHA-384" => Ok(DigestAlgorithm::Sha384),
            "SHA-512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(BinaryStoreError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hash a stream and return the raw digest.
pub async fn digest_bytes(algorithm: DigestAlgorithm, mut stream: BinaryStream) -> Result<Vec<u8>> {
    let mut hasher = algorithm.hasher();
    while let Some(chunk) = stream.try_next().await? {
        hasher.update(&chunk);
    }
    Ok(hasher.finalize().into_vec())
}

/// Hash a stream and return the digest as standard Base64.
pub async fn digest_stream(algorithm: DigestAlgorithm, stream: BinaryStream) -> Result<String> {
    let digest = digest_bytes(algorithm, stream).await?;
    Ok(STANDARD.encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::from_chunks;

    async fn hex_digest(name: &str, chunks: &[&'static [u8]]) -> String {
        let algorithm: DigestAlgorithm = name.parse().unwrap();
        hex::encode(digest_bytes(algorithm, from_chunks(chunks)).await.unwrap())
    }

    #[tokio::test]
    async fn test_known_vectors() {
        assert_eq!(
            hex_digest("MD5", &[b"abc"]).await,
            "900150983cd24fb0d6963f7d28e17f72"
        );
        assert_eq!(
            hex_digest("md5", &[]).await,
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            hex_digest("MD2", &[b"abc"]).await,
            "da853b0d3f88d99b30283a69e6ded6bb"
        );
        assert_eq!(
            hex_digest("SHA", &[b"abc"]).await,
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            hex_digest("sha-256", &[b"abc"]).await,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_chunking_does_not_change_digest() {
        let whole = hex_digest("SHA-512", &[b"hello world"]).await;
        let split = hex_digest("SHA-512", &[b"hel", b"", b"lo wor", b"ld"]).await;
        assert_eq!(whole, split);
    }

    #[tokio::test]
    async fn test_base64_output() {
        let encoded = digest_stream(DigestAlgorithm::Md5, from_chunks(&[b"abc"]))
            .await
            .unwrap();
        assert_eq!(encoded, "kAFQmDzST7DWlj99KOF/cg==");
    }

    #[test]
    fn test_unsupported_algorithm() {
        let err = "CRC32".parse::<DigestAlgorithm>().unwrap_err();
        assert!(matches!(err, BinaryStoreError::UnsupportedAlgorithm(name) if name == "CRC32"));
    }

    #[test]
    fn test_supported_names_parse() {
        for name in DigestAlgorithm::supported() {
            assert!(name.parse::<DigestAlgorithm>().is_ok(), "{name}");
        }
        assert_eq!(DigestAlgorithm::Sha1.to_string(), "SHA-1");
    }

    #[test]
    fn test_only_listed_names_parse() {
        let supported = DigestAlgorithm::supported();
        for name in [
            "MD2", "MD5", "SHA", "SHA-1", "SHA1", "SHA-256", "SHA256", "SHA-384", "SHA384",
            "SHA-512", "SHA512", "SHA-224",
        ] {
            assert_eq!(
                name.parse::<DigestAlgorithm>().is_ok(),
                supported.contains(&name),
                "{name}"
            );
        }
        assert!(matches!(
            "sha256".parse::<DigestAlgorithm>(),
            Err(BinaryStoreError::UnsupportedAlgorithm(name)) if name == "sha256"
        ));
    }
}
