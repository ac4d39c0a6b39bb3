//! Checksum utilities for written artifacts

use crate::error::Result;
use crate::types::{ArtifactFile, ChecksumAlgorithm};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Compute checksum for a file
pub fn compute_file_checksum(
    path: impl AsRef<Path>,
    algorithm: ChecksumAlgorithm,
) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    compute_checksum(&mut file, algorithm)
}

/// Compute checksum for any readable source
pub fn compute_checksum<R: Read>(reader: &mut R, algorithm: ChecksumAlgorithm) -> Result<String> {
    match algorithm {
        ChecksumAlgorithm::Sha256 => digest_reader::<Sha256, _>(reader),
    }
}

fn digest_reader<D: Digest, R: Read>(reader: &mut R) -> Result<String> {
    let mut hasher = D::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Fingerprint a written file: digest plus size
pub fn fingerprint_file(
    path: impl AsRef<Path>,
    algorithm: ChecksumAlgorithm,
) -> Result<ArtifactFile> {
    let path = path.as_ref();
    let size_bytes = std::fs::metadata(path)?.len();
    let checksum = compute_file_checksum(path, algorithm)?;

    Ok(ArtifactFile {
        path: path.to_path_buf(),
        checksum,
        algorithm,
        size_bytes,
        recorded_at: chrono::Utc::now(),
    })
}
