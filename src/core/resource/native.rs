use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::codec;
use super::{Checkable, Conditional, Downloadable};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::integrity::{ChecksumAlgorithm, HashAlgorithm};

/// Native libraries an artifact may depend on, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NativeLibrary {
    Remote(RemoteNativeLibrary),
}

impl NativeLibrary {
    pub fn key(&self) -> &str {
        match self {
            NativeLibrary::Remote(library) => library.source_uri.as_str(),
        }
    }

    pub fn local_path(&self) -> PathBuf {
        match self {
            NativeLibrary::Remote(library) => library.local_path(),
        }
    }
}

impl From<RemoteNativeLibrary> for NativeLibrary {
    fn from(library: RemoteNativeLibrary) -> Self {
        NativeLibrary::Remote(library)
    }
}

impl Downloadable for NativeLibrary {
    fn source_uri(&self) -> LauncherResult<Url> {
        match self {
            NativeLibrary::Remote(library) => library.source_uri(),
        }
    }
}

impl Conditional for NativeLibrary {
    fn conditions(&self) -> &BTreeMap<String, String> {
        match self {
            NativeLibrary::Remote(library) => library.conditions(),
        }
    }
}

impl Checkable for NativeLibrary {
    fn checksums(&self) -> &BTreeMap<ChecksumAlgorithm, u64> {
        match self {
            NativeLibrary::Remote(library) => library.checksums(),
        }
    }

    fn hashes(&self) -> &BTreeMap<HashAlgorithm, String> {
        match self {
            NativeLibrary::Remote(library) => library.hashes(),
        }
    }
}

/// A native library fetched from an absolute URI.
///
/// Identity is the source URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RemoteNativeLibraryDecl")]
pub struct RemoteNativeLibrary {
    #[serde(with = "codec::url_str")]
    source_uri: Url,
    #[serde(with = "codec::hex_checksums")]
    checksums: BTreeMap<ChecksumAlgorithm, u64>,
    hashes: BTreeMap<HashAlgorithm, String>,
    conditions: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct RemoteNativeLibraryDecl {
    #[serde(default, deserialize_with = "codec::opt_url_str::deserialize")]
    source_uri: Option<Url>,
    #[serde(default, deserialize_with = "codec::hex_checksums::deserialize")]
    checksums: BTreeMap<ChecksumAlgorithm, u64>,
    #[serde(default)]
    hashes: Option<BTreeMap<HashAlgorithm, String>>,
    #[serde(default)]
    conditions: Option<BTreeMap<String, String>>,
}

impl TryFrom<RemoteNativeLibraryDecl> for RemoteNativeLibrary {
    type Error = LauncherError;

    fn try_from(decl: RemoteNativeLibraryDecl) -> LauncherResult<Self> {
        let source_uri = decl
            .source_uri
            .ok_or_else(|| LauncherError::config("source_uri", "must be set"))?;
        Ok(RemoteNativeLibrary::new(source_uri)
            .with_checksums(decl.checksums)
            .with_hashes(decl.hashes.unwrap_or_default())
            .with_conditions(decl.conditions.unwrap_or_default()))
    }
}

impl RemoteNativeLibrary {
    /// Only the source URI is required; `with_*` extends a complete value.
    pub fn new(source_uri: Url) -> Self {
        Self {
            source_uri,
            checksums: BTreeMap::new(),
            hashes: BTreeMap::new(),
            conditions: BTreeMap::new(),
        }
    }

    pub fn parse(source_uri: &str) -> LauncherResult<Self> {
        let url = Url::parse(source_uri.trim())
            .map_err(|e| LauncherError::config("source_uri", format!("{source_uri}: {e}")))?;
        Ok(Self::new(url))
    }

    pub fn with_checksums(mut self, checksums: BTreeMap<ChecksumAlgorithm, u64>) -> Self {
        self.checksums.extend(checksums);
        self
    }

    pub fn with_checksum(mut self, algorithm: ChecksumAlgorithm, value: u64) -> Self {
        self.checksums.insert(algorithm, value);
        self
    }

    pub fn with_hashes(mut self, hashes: BTreeMap<HashAlgorithm, String>) -> Self {
        self.hashes.extend(hashes);
        self
    }

    pub fn with_hash(mut self, algorithm: HashAlgorithm, value: impl Into<String>) -> Self {
        self.hashes.insert(algorithm, value.into());
        self
    }

    pub fn with_conditions(mut self, conditions: BTreeMap<String, String>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    pub fn with_condition(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.insert(key.into(), value.into());
        self
    }

    /// `natives/<host>/<uri path>`, with dot segments dropped.
    pub fn local_path(&self) -> PathBuf {
        let mut path = PathBuf::from("natives");
        path.push(self.source_uri.host_str().unwrap_or("local"));
        for segment in self.source_uri.path().split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                continue;
            }
            path.push(segment);
        }
        path
    }
}

impl Downloadable for RemoteNativeLibrary {
    fn source_uri(&self) -> LauncherResult<Url> {
        Ok(self.source_uri.clone())
    }
}

impl Conditional for RemoteNativeLibrary {
    fn conditions(&self) -> &BTreeMap<String, String> {
        &self.conditions
    }
}

impl Checkable for RemoteNativeLibrary {
    fn checksums(&self) -> &BTreeMap<ChecksumAlgorithm, u64> {
        &self.checksums
    }

    fn hashes(&self) -> &BTreeMap<HashAlgorithm, String> {
        &self.hashes
    }
}

impl PartialEq for RemoteNativeLibrary {
    fn eq(&self, other: &Self) -> bool {
        self.source_uri == other.source_uri
    }
}

impl Eq for RemoteNativeLibrary {}

impl Hash for RemoteNativeLibrary {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source_uri.hash(state);
    }
}

impl PartialOrd for RemoteNativeLibrary {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RemoteNativeLibrary {
    fn cmp(&self, other: &Self) -> Ordering {
        self.source_uri.cmp(&other.source_uri)
    }
}
