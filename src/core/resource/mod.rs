// ─── Resource Model ───
// Typed descriptions of fetchable resources and the capabilities they expose.
//
// Artifacts own a flat set of native libraries (one level deep). Every
// resource answers every capability query; absent data is an empty map.

mod artifact;
mod codec;
mod native;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use reqwest::Url;
use serde::{Deserialize, Serialize};

pub use artifact::{MavenArtifact, MAVEN_CENTRAL};
pub use native::{NativeLibrary, RemoteNativeLibrary};

use crate::core::error::LauncherResult;
use crate::core::integrity::{ChecksumAlgorithm, HashAlgorithm};

static NO_CONDITIONS: BTreeMap<String, String> = BTreeMap::new();
static NO_CHECKSUMS: BTreeMap<ChecksumAlgorithm, u64> = BTreeMap::new();
static NO_HASHES: BTreeMap<HashAlgorithm, String> = BTreeMap::new();

/// Exposes a location bytes can be fetched from.
pub trait Downloadable {
    fn source_uri(&self) -> LauncherResult<Url>;
}

/// Exposes `condition key -> expected value` pairs that must all hold.
pub trait Conditional {
    fn conditions(&self) -> &BTreeMap<String, String>;
}

/// Exposes expected checksums and hex digests.
pub trait Checkable {
    fn checksums(&self) -> &BTreeMap<ChecksumAlgorithm, u64>;
    fn hashes(&self) -> &BTreeMap<HashAlgorithm, String>;
}

/// Top-level installable packages, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Artifact {
    Maven(MavenArtifact),
}

impl Artifact {
    pub fn key(&self) -> String {
        match self {
            Artifact::Maven(artifact) => artifact.to_string(),
        }
    }

    pub fn dependencies(&self) -> impl Iterator<Item = &NativeLibrary> {
        match self {
            Artifact::Maven(artifact) => artifact.dependencies().iter(),
        }
    }

    pub fn local_path(&self) -> PathBuf {
        match self {
            Artifact::Maven(artifact) => artifact.local_path(),
        }
    }

    /// Source location under a specific repository base.
    pub fn source_uri_in(&self, repo_base: &str) -> LauncherResult<Url> {
        match self {
            Artifact::Maven(artifact) => artifact.source_uri_in(repo_base),
        }
    }
}

impl From<MavenArtifact> for Artifact {
    fn from(artifact: MavenArtifact) -> Self {
        Artifact::Maven(artifact)
    }
}

impl Downloadable for Artifact {
    fn source_uri(&self) -> LauncherResult<Url> {
        match self {
            Artifact::Maven(artifact) => artifact.source_uri(),
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Any resource in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    Artifact(Artifact),
    NativeLibrary(NativeLibrary),
}

impl Resource {
    /// Stable identity: coordinates for artifacts, source URI for natives.
    pub fn key(&self) -> String {
        match self {
            Resource::Artifact(artifact) => artifact.key(),
            Resource::NativeLibrary(library) => library.key().to_string(),
        }
    }

    /// Placement relative to the libraries directory.
    pub fn local_path(&self) -> PathBuf {
        match self {
            Resource::Artifact(artifact) => artifact.local_path(),
            Resource::NativeLibrary(library) => library.local_path(),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Resource::NativeLibrary(_))
    }
}

impl From<Artifact> for Resource {
    fn from(artifact: Artifact) -> Self {
        Resource::Artifact(artifact)
    }
}

impl From<NativeLibrary> for Resource {
    fn from(library: NativeLibrary) -> Self {
        Resource::NativeLibrary(library)
    }
}

impl Downloadable for Resource {
    fn source_uri(&self) -> LauncherResult<Url> {
        match self {
            Resource::Artifact(artifact) => artifact.source_uri(),
            Resource::NativeLibrary(library) => library.source_uri(),
        }
    }
}

impl Conditional for Resource {
    fn conditions(&self) -> &BTreeMap<String, String> {
        match self {
            Resource::Artifact(_) => &NO_CONDITIONS,
            Resource::NativeLibrary(library) => library.conditions(),
        }
    }
}

impl Checkable for Resource {
    fn checksums(&self) -> &BTreeMap<ChecksumAlgorithm, u64> {
        match self {
            Resource::Artifact(_) => &NO_CHECKSUMS,
            Resource::NativeLibrary(library) => library.checksums(),
        }
    }

    fn hashes(&self) -> &BTreeMap<HashAlgorithm, String> {
        match self {
            Resource::Artifact(_) => &NO_HASHES,
            Resource::NativeLibrary(library) => library.hashes(),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTIFACT: &str = r#"{
        "type": "maven",
        "group_id": "org.lwjgl",
        "artifact_id": "lwjgl",
        "version": "3.3.3",
        "dependencies": [
            {
                "type": "remote",
                "source_uri": "https://cdn.example.com/lwjgl/linux/liblwjgl.so",
                "conditions": { "os.name.contains": "Linux" }
            },
            {
                "type": "remote",
                "source_uri": "https://cdn.example.com/lwjgl/linux/liblwjgl.so"
            },
            {
                "type": "remote",
                "source_uri": "https://cdn.example.com/lwjgl/windows/lwjgl.dll",
                "conditions": { "os.name.contains": "Windows" }
            }
        ]
    }"#;

    #[test]
    fn artifact_declaration_deduplicates_natives() {
        let artifact: Artifact = serde_json::from_str(ARTIFACT).unwrap();
        assert_eq!(artifact.key(), "org.lwjgl:lwjgl:3.3.3");
        assert_eq!(artifact.dependencies().count(), 2);
    }

    #[test]
    fn unknown_discriminator_is_rejected() {
        let err = serde_json::from_str::<Artifact>(r#"{"type":"ivy"}"#).unwrap_err();
        assert!(err.to_string().contains("ivy"));
    }

    #[test]
    fn artifacts_answer_capability_queries_with_empty_maps() {
        let artifact: Artifact = serde_json::from_str(ARTIFACT).unwrap();
        let resource = Resource::from(artifact);
        assert!(resource.conditions().is_empty());
        assert!(resource.checksums().is_empty());
        assert!(resource.hashes().is_empty());
        assert!(!resource.is_native());
    }

    #[test]
    fn artifact_round_trips_through_json() {
        let artifact: Artifact = serde_json::from_str(ARTIFACT).unwrap();
        let json = serde_json::to_string(&artifact).unwrap();
        let back: Artifact = serde_json::from_str(&json).unwrap();
        assert_eq!(back, artifact);
        assert_eq!(back.dependencies().count(), 2);
    }
}
