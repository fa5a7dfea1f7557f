//! Content digests for written artifacts.
//!
//! A digest is the SHA-256 of both files' bytes, each prefixed with its
//! length so that moving bytes between the two files changes the result.

use sha2::{Digest, Sha256};

/// Hex-encoded digest of a date's region and facility file contents.
pub fn artifact_digest(regions: &[u8], facilities: &[u8]) -> String {
  let mut hasher = Sha256::new();
  for part in [regions, facilities] {
    hasher.update((part.len() as u64).to_le_bytes());
    hasher.update(part);
  }
  hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn same_bytes_same_digest() {
    assert_eq!(artifact_digest(b"a,b\n", b"c\n"), artifact_digest(b"a,b\n", b"c\n"));
    assert_eq!(artifact_digest(b"", b"").len(), 64);
  }

  #[test]
  fn boundary_between_files_matters() {
    assert_ne!(artifact_digest(b"ab", b"c"), artifact_digest(b"a", b"bc"));
  }
}
