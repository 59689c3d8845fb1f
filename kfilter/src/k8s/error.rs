use std::{io, path::Path};

use thiserror::Error;

/// Errors that can occur while loading Kubernetes manifests
#[derive(Debug, Error)]
pub enum K8sError {
    /// Failed to read a manifest file
    #[error("failed to read manifest {path}: {source}")]
    ManifestRead {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A manifest document is not valid YAML or does not match its kind
    #[error("failed to parse document {document} of {path}: {source}")]
    ManifestParse {
        path: String,
        document: usize,
        #[source]
        source: serde_yaml::Error,
    },

    /// A manifest document lacks a required top-level field
    #[error("document {document} of {path} is missing '{field}'")]
    MissingField {
        path: String,
        document: usize,
        field: &'static str,
    },
}

impl K8sError {
    /// Create a manifest read error
    pub fn manifest_read(path: &Path, source: io::Error) -> Self {
        Self::ManifestRead {
            path: path.display().to_string(),
            source,
        }
    }

    /// Create a manifest parse error
    pub fn manifest_parse(
        path: impl Into<String>,
        document: usize,
        source: serde_yaml::Error,
    ) -> Self {
        Self::ManifestParse {
            path: path.into(),
            document,
            source,
        }
    }
}
