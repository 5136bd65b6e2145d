use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::native::NativeLibrary;
use super::Downloadable;
use crate::core::error::{LauncherError, LauncherResult};

/// Repository that artifact source locations resolve against.
pub const MAVEN_CENTRAL: &str = "https://repo1.maven.org/maven2";

/// A Maven artifact identified by `groupId:artifactId:version`.
///
/// Identity (equality, ordering, hashing) is the coordinate triple only; the
/// native-library set does not take part in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "MavenArtifactDecl")]
pub struct MavenArtifact {
    group_id: String,
    artifact_id: String,
    version: String,
    dependencies: BTreeSet<NativeLibrary>,
}

#[derive(Deserialize)]
struct MavenArtifactDecl {
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
    #[serde(default)]
    dependencies: Option<Vec<NativeLibrary>>,
}

impl TryFrom<MavenArtifactDecl> for MavenArtifact {
    type Error = LauncherError;

    fn try_from(decl: MavenArtifactDecl) -> LauncherResult<Self> {
        MavenArtifact::new(
            required("group_id", decl.group_id)?,
            required("artifact_id", decl.artifact_id)?,
            required("version", decl.version)?,
            decl.dependencies.unwrap_or_default(),
        )
    }
}

fn required(field: &'static str, value: Option<String>) -> LauncherResult<String> {
    value.ok_or_else(|| LauncherError::config(field, "must be set"))
}

fn non_blank(field: &'static str, value: String) -> LauncherResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LauncherError::config(field, "must not be blank"));
    }
    Ok(trimmed.to_string())
}

impl MavenArtifact {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
        dependencies: impl IntoIterator<Item = NativeLibrary>,
    ) -> LauncherResult<Self> {
        Ok(Self {
            group_id: non_blank("group_id", group_id.into())?,
            artifact_id: non_blank("artifact_id", artifact_id.into())?,
            version: non_blank("version", version.into())?,
            dependencies: dependencies.into_iter().collect(),
        })
    }

    /// Parse a `groupId:artifactId:version` coordinate with no dependencies.
    pub fn parse(coord: &str) -> LauncherResult<Self> {
        let parts: Vec<&str> = coord.trim().split(':').collect();
        match parts.as_slice() {
            [group, artifact, version] => Self::new(*group, *artifact, *version, [])
                .map_err(|_| LauncherError::InvalidMavenCoordinate(coord.to_string())),
            _ => Err(LauncherError::InvalidMavenCoordinate(coord.to_string())),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn dependencies(&self) -> &BTreeSet<NativeLibrary> {
        &self.dependencies
    }

    /// Construct the group path portion (`net/sf/jopt-simple`).
    pub fn group_path(&self) -> String {
        self.group_id.replace('.', "/")
    }

    /// `artifactId-version.jar`
    pub fn filename(&self) -> String {
        format!("{}-{}.jar", self.artifact_id, self.version)
    }

    /// Construct the full URL for this artifact under the given repository base.
    ///
    /// Template:
    /// `<repo>/<group_path>/<artifact_id>/<version>/<filename>`
    pub fn url(&self, repo_base: &str) -> String {
        let base = repo_base.trim_end_matches('/');
        format!(
            "{}/{}/{}/{}/{}",
            base,
            self.group_path(),
            self.artifact_id,
            self.version,
            self.filename()
        )
    }

    /// Local path relative to the libraries directory.
    ///
    /// Mirrors Maven's local repo layout:
    /// `<group_path>/<artifact_id>/<version>/<filename>`
    pub fn local_path(&self) -> PathBuf {
        PathBuf::from(self.group_path())
            .join(&self.artifact_id)
            .join(&self.version)
            .join(self.filename())
    }

    /// [`url`](Self::url) parsed, for mirrors other than Maven Central.
    pub fn source_uri_in(&self, repo_base: &str) -> LauncherResult<Url> {
        let raw = self.url(repo_base);
        Url::parse(&raw).map_err(|e| LauncherError::config("source_uri", format!("{raw}: {e}")))
    }

    fn coordinates(&self) -> (&str, &str, &str) {
        (&self.group_id, &self.artifact_id, &self.version)
    }
}

impl Downloadable for MavenArtifact {
    fn source_uri(&self) -> LauncherResult<Url> {
        self.source_uri_in(MAVEN_CENTRAL)
    }
}

impl PartialEq for MavenArtifact {
    fn eq(&self, other: &Self) -> bool {
        self.coordinates() == other.coordinates()
    }
}

impl Eq for MavenArtifact {}

impl Hash for MavenArtifact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.coordinates().hash(state);
    }
}

impl PartialOrd for MavenArtifact {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MavenArtifact {
    fn cmp(&self, other: &Self) -> Ordering {
        self.coordinates().cmp(&other.coordinates())
    }
}

impl fmt::Display for MavenArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}
