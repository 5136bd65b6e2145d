mod checksum;
mod hash;

use std::path::{Path, PathBuf};

use tracing::debug;

pub use checksum::{checksum_to_hex, parse_checksum, ChecksumAlgorithm, ChecksumCalculator};
pub use hash::{Hash, HashAlgorithm, HashCalculator};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::resource::Checkable;

/// Result of a successful integrity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Every declared checksum and hash matched.
    Verified { checks: usize },
    /// Nothing was declared, so no integrity claim is made.
    Unverifiable,
}

/// Checks files against the checksums and hashes a resource declares.
///
/// Algorithms without a declared value are not checked. The first mismatch
/// aborts verification.
pub struct IntegrityVerifier;

impl IntegrityVerifier {
    pub fn verify_file<C>(path: &Path, resource: &C) -> LauncherResult<Verification>
    where
        C: Checkable + ?Sized,
    {
        let checksums = resource.checksums();
        let hashes = resource.hashes();
        if checksums.is_empty() && hashes.is_empty() {
            debug!("No integrity data declared for {:?}", path);
            return Ok(Verification::Unverifiable);
        }

        for (&algorithm, &expected) in checksums {
            let actual = ChecksumCalculator::new(algorithm).calculate_file(path)?;
            if actual != expected {
                return Err(LauncherError::ChecksumMismatch {
                    path: path.to_path_buf(),
                    algorithm: algorithm.to_string(),
                    expected: checksum_to_hex(expected),
                    actual: checksum_to_hex(actual),
                });
            }
        }

        for (&algorithm, expected) in hashes {
            let actual = HashCalculator::new(algorithm).calculate_file(path)?;
            if !actual.matches_hex(expected) {
                return Err(LauncherError::HashMismatch {
                    path: path.to_path_buf(),
                    algorithm: algorithm.to_string(),
                    expected: expected.to_ascii_lowercase(),
                    actual: actual.to_hex(),
                });
            }
        }

        Ok(Verification::Verified {
            checks: checksums.len() + hashes.len(),
        })
    }

    /// Runs [`IntegrityVerifier::verify_file`] on the blocking pool.
    pub async fn verify_file_async<C>(path: PathBuf, resource: C) -> LauncherResult<Verification>
    where
        C: Checkable + Send + 'static,
    {
        tokio::task::spawn_blocking(move || Self::verify_file(&path, &resource))
            .await
            .map_err(|e| LauncherError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other(format!("Task join error: {e}")),
            })?
    }
}
