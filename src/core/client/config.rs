use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::resource::{Artifact, NativeLibrary};

pub const DEFAULT_NAME: &str = "Unnamed Client Configuration";
pub const DEFAULT_VERSION: &str = "0.0.0";
pub const DEFAULT_AUTHOR: &str = "N/A";

/// A bundle manifest: descriptive metadata plus the artifacts to install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ClientConfigurationDecl")]
pub struct ClientConfiguration {
    name: String,
    version: String,
    author: String,
    artifacts: BTreeSet<Artifact>,
}

#[derive(Deserialize)]
struct ClientConfigurationDecl {
    name: Option<String>,
    version: Option<String>,
    author: Option<String>,
    artifacts: Option<Vec<Artifact>>,
}

impl TryFrom<ClientConfigurationDecl> for ClientConfiguration {
    type Error = LauncherError;

    fn try_from(decl: ClientConfigurationDecl) -> LauncherResult<Self> {
        let artifacts = decl
            .artifacts
            .ok_or_else(|| LauncherError::config("artifacts", "must be defined"))?;
        let mut config = Self::new(artifacts)?;
        if let Some(name) = decl.name {
            config.name = name;
        }
        if let Some(version) = decl.version {
            config.version = version;
        }
        if let Some(author) = decl.author {
            config.author = author;
        }
        Ok(config)
    }
}

impl ClientConfiguration {
    /// Fails when `artifacts` is empty. Duplicates collapse by coordinates.
    pub fn new(artifacts: impl IntoIterator<Item = Artifact>) -> LauncherResult<Self> {
        let artifacts: BTreeSet<Artifact> = artifacts.into_iter().collect();
        if artifacts.is_empty() {
            return Err(LauncherError::config(
                "artifacts",
                "must contain at least one artifact",
            ));
        }
        Ok(Self {
            name: DEFAULT_NAME.to_string(),
            version: DEFAULT_VERSION.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            artifacts,
        })
    }

    pub fn from_json(json: &str) -> LauncherResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn artifacts(&self) -> &BTreeSet<Artifact> {
        &self.artifacts
    }

    /// Every native library declared by any artifact, de-duplicated by URI.
    pub fn native_libraries(&self) -> BTreeSet<&NativeLibrary> {
        self.artifacts
            .iter()
            .flat_map(Artifact::dependencies)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "name": "Beta Client",
        "artifacts": [
            {
                "type": "maven",
                "group_id": "net.example",
                "artifact_id": "client",
                "version": "1.0.0",
                "dependencies": [
                    { "type": "remote", "source_uri": "https://cdn.example.com/natives/libgl.so" }
                ]
            },
            {
                "type": "maven",
                "group_id": "net.example",
                "artifact_id": "client",
                "version": "1.0.0"
            },
            {
                "type": "maven",
                "group_id": "net.example",
                "artifact_id": "render",
                "version": "2.0.0",
                "dependencies": [
                    { "type": "remote", "source_uri": "https://cdn.example.com/natives/libgl.so" }
                ]
            }
        ]
    }"#;

    #[test]
    fn defaults_fill_missing_metadata() {
        let config = ClientConfiguration::from_json(MANIFEST).unwrap();
        assert_eq!(config.name(), "Beta Client");
        assert_eq!(config.version(), DEFAULT_VERSION);
        assert_eq!(config.author(), DEFAULT_AUTHOR);
    }

    #[test]
    fn artifacts_and_natives_are_deduplicated() {
        let config = ClientConfiguration::from_json(MANIFEST).unwrap();
        assert_eq!(config.artifacts().len(), 2);
        assert_eq!(config.native_libraries().len(), 1);
    }

    #[test]
    fn artifacts_are_required_and_non_empty() {
        assert!(ClientConfiguration::from_json(r#"{ "name": "x" }"#).is_err());
        assert!(ClientConfiguration::from_json(r#"{ "artifacts": [] }"#).is_err());
        assert!(ClientConfiguration::new(Vec::new()).is_err());
    }
}
