// ─── Checksums ───
// Fast non-cryptographic integrity values (CRC32, CRC32C, Adler32).

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::error::{LauncherError, LauncherResult};

const BUFFER_SIZE: usize = 8 * 1024;

/// Supported checksum algorithms. Serialized as lower-case names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChecksumAlgorithm {
    Crc32,
    Crc32c,
    Adler32,
}

impl ChecksumAlgorithm {
    pub const ALL: [ChecksumAlgorithm; 3] = [Self::Crc32, Self::Crc32c, Self::Adler32];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Crc32 => "crc32",
            ChecksumAlgorithm::Crc32c => "crc32c",
            ChecksumAlgorithm::Adler32 => "adler32",
        }
    }

    /// Case-insensitive lookup. Blank or unknown names yield `None`.
    pub fn find_by_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.as_str().eq_ignore_ascii_case(name))
    }

    pub fn get_by_name(name: &str) -> LauncherResult<Self> {
        Self::find_by_name(name).ok_or_else(|| {
            LauncherError::UnknownAlgorithm(format!("No such checksum algorithm: {name}"))
        })
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ChecksumAlgorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChecksumAlgorithm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::get_by_name(&raw).map_err(serde::de::Error::custom)
    }
}

enum ChecksumState {
    Crc32(crc32fast::Hasher),
    Crc32c(u32),
    Adler32(adler2::Adler32),
}

impl ChecksumState {
    fn new(algorithm: ChecksumAlgorithm) -> Self {
        match algorithm {
            ChecksumAlgorithm::Crc32 => Self::Crc32(crc32fast::Hasher::new()),
            ChecksumAlgorithm::Crc32c => Self::Crc32c(0),
            ChecksumAlgorithm::Adler32 => Self::Adler32(adler2::Adler32::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Crc32(hasher) => hasher.update(data),
            Self::Crc32c(crc) => *crc = crc32c::crc32c_append(*crc, data),
            Self::Adler32(adler) => adler.write_slice(data),
        }
    }

    fn value(self) -> u64 {
        match self {
            Self::Crc32(hasher) => u64::from(hasher.finalize()),
            Self::Crc32c(crc) => u64::from(crc),
            Self::Adler32(adler) => u64::from(adler.checksum()),
        }
    }
}

/// Computes a checksum over bytes, readers or files.
///
/// Each call starts from a fresh state, so one calculator can be reused.
#[derive(Debug, Clone, Copy)]
pub struct ChecksumCalculator {
    algorithm: ChecksumAlgorithm,
}

impl ChecksumCalculator {
    pub fn new(algorithm: ChecksumAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    pub fn calculate(&self, data: &[u8]) -> u64 {
        let mut state = ChecksumState::new(self.algorithm);
        state.update(data);
        state.value()
    }

    pub fn calculate_reader<R: Read>(&self, mut reader: R) -> std::io::Result<u64> {
        let mut state = ChecksumState::new(self.algorithm);
        let mut buffer = [0u8; BUFFER_SIZE];
        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            state.update(&buffer[..read]);
        }
        Ok(state.value())
    }

    pub fn calculate_file(&self, path: &Path) -> LauncherResult<u64> {
        let file = File::open(path).map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.calculate_reader(file).map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Lower-case hex rendering used in external representations.
pub fn checksum_to_hex(value: u64) -> String {
    format!("{value:x}")
}

/// Decodes a textual checksum: decimal first, hexadecimal as fallback.
/// Blank input decodes to zero.
pub fn parse_checksum(raw: &str) -> LauncherResult<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    if let Ok(value) = trimmed.parse::<u64>() {
        return Ok(value);
    }
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u64::from_str_radix(digits, 16).map_err(|_| {
        LauncherError::config("checksum", format!("incorrect HEX number format: '{raw}'"))
    })
}
