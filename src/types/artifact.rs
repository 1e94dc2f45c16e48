// ABOUTME: Opaque artifact location parsing and validation.
// ABOUTME: Handles local paths and URI-style locations like file:///srv/app/v1.tar.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseArtifactError {
    #[error("artifact location cannot be empty")]
    Empty,

    #[error("artifact location contains interior whitespace")]
    Whitespace,

    #[error("unsupported artifact scheme: {0}")]
    UnsupportedScheme(String),
}

/// Where a deployable artifact lives. Opaque to the release engine; only the
/// artifact-transfer collaborator interprets it. Either a bare filesystem
/// path or a `file://` URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ArtifactLocation(String);

impl ArtifactLocation {
    pub fn parse(input: &str) -> Result<Self, ParseArtifactError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseArtifactError::Empty);
        }

        if input.chars().any(char::is_whitespace) {
            return Err(ParseArtifactError::Whitespace);
        }

        // Bare paths carry no scheme; anything else must be file://
        if let Some((scheme, _)) = input.split_once("://")
            && scheme != "file"
        {
            return Err(ParseArtifactError::UnsupportedScheme(scheme.to_string()));
        }

        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve to a local filesystem path, stripping a `file://` prefix
    /// when present.
    pub fn as_path(&self) -> PathBuf {
        match self.0.strip_prefix("file://") {
            Some(rest) => PathBuf::from(rest),
            None => PathBuf::from(&self.0),
        }
    }

    /// The final path component, used to derive release-addressable names.
    pub fn file_name(&self) -> Option<String> {
        self.as_path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }
}

impl From<&Path> for ArtifactLocation {
    fn from(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
