//! Streaming CRC32 file hashing (§4.3, §4.4.5).
//!
//! Same fixed-buffer, chunked-read shape the PBO/MD5 scanner in this crate used —
//! `hasher.update(&buf[..n])` per chunk — with `crc32fast` standing in for MD5 since
//! this core only ever needs one default algorithm (CRC32) plus room for others by name.

use camino::Utf8Path;
use crc32fast::Hasher;
use std::fs::File;
use std::io::Read;

const READ_BUF_SIZE: usize = 64 * 1024;

pub const CRC32_ALGORITHM: &str = "CRC32";

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Streams the whole file through a CRC32 hasher and returns the hex-encoded checksum.
pub fn hash_file_crc32(path: &Utf8Path) -> Result<String, HashError> {
    let file = File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    let mut hasher = Hasher::new();
    let mut buf = [0u8; READ_BUF_SIZE];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:08x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_a_small_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"hello world").unwrap();
        let utf8_path = Utf8Path::from_path(&path).unwrap();

        let digest = hash_file_crc32(utf8_path).unwrap();
        assert_eq!(digest.len(), 8);

        let again = hash_file_crc32(utf8_path).unwrap();
        assert_eq!(digest, again);
    }

    #[test]
    fn different_content_hashes_differ() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, b"alpha").unwrap();
        std::fs::write(&b, b"beta").unwrap();

        let ha = hash_file_crc32(Utf8Path::from_path(&a).unwrap()).unwrap();
        let hb = hash_file_crc32(Utf8Path::from_path(&b).unwrap()).unwrap();
        assert_ne!(ha, hb);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let missing = Utf8Path::new("/nonexistent/does-not-exist.bin");
        assert!(hash_file_crc32(missing).is_err());
    }
}
