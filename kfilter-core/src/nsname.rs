// nsname.rs - Namespace/name identity of Kubernetes objects
//
// Rendered and parsed as `namespace/name`, or as a bare `name` for
// cluster-scoped objects.

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::k8s::Object;

/// Namespace and name pair addressing a single object.
///
/// Cluster-scoped objects carry an empty namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NsName {
    namespace: String,
    name: String,
}

impl NsName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Extracts the identity of an object.
    pub fn for_object<O>(obj: &O) -> Self
    where
        O: Object + ?Sized,
    {
        obj.ns_name()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for NsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

/// Errors returned when parsing `namespace/name` strings
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NsNameParseError {
    #[error("empty object identity")]
    Empty,

    #[error("missing name in '{0}'")]
    MissingName(String),

    #[error("too many '/' separators in '{0}'")]
    TooManySeparators(String),
}

impl FromStr for NsName {
    type Err = NsNameParseError;

    /// Parses `namespace/name`, or a bare `name` for cluster-scoped objects.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(NsNameParseError::Empty);
        }

        let mut parts = s.split('/');
        let (namespace, name) = match (parts.next(), parts.next(), parts.next()) {
            (Some(name), None, None) => ("", name),
            (Some(namespace), Some(name), None) => (namespace, name),
            _ => return Err(NsNameParseError::TooManySeparators(s.to_string())),
        };

        if name.is_empty() {
            return Err(NsNameParseError::MissingName(s.to_string()));
        }

        Ok(Self::new(namespace, name))
    }
}
