// manifest.rs - Load Kubernetes objects from YAML manifests
//
// Core v1 Services are decoded into the typed `Service` so that the
// service_for filter can read their selector. Every other kind is kept as a
// `DynamicObject`.

use std::{collections::BTreeMap, fs, path::Path};

use k8s_openapi::api::core::v1::Service;
use kfilter_core::{NsName, Object};
use kube::core::DynamicObject;
use serde::Deserialize;
use serde_yaml::Value;
use tracing::{debug, trace};

use crate::k8s::error::K8sError;

/// A single object read from a manifest.
#[derive(Debug, Clone)]
pub enum Manifest {
    Service(Box<Service>),
    Dynamic(DynamicObject),
}

impl Manifest {
    /// Kind of the object as written in the manifest.
    pub fn kind(&self) -> &str {
        match self {
            Manifest::Service(_) => "Service",
            Manifest::Dynamic(obj) => obj
                .types
                .as_ref()
                .map(|types| types.kind.as_str())
                .unwrap_or_default(),
        }
    }

    fn as_object(&self) -> &dyn Object {
        match self {
            Manifest::Service(svc) => &**svc,
            Manifest::Dynamic(obj) => obj,
        }
    }
}

impl Object for Manifest {
    fn labels(&self) -> &BTreeMap<String, String> {
        self.as_object().labels()
    }

    fn ns_name(&self) -> NsName {
        self.as_object().ns_name()
    }

    fn service_selector(&self) -> Option<&BTreeMap<String, String>> {
        self.as_object().service_selector()
    }
}

/// Reads every object from a manifest file.
pub fn load_file(path: &Path) -> Result<Vec<Manifest>, K8sError> {
    let content = fs::read_to_string(path).map_err(|e| K8sError::manifest_read(path, e))?;
    let manifests = parse_documents(&path.display().to_string(), &content)?;

    debug!(
        event.name = "manifest.loaded",
        manifest.path = %path.display(),
        manifest.objects = manifests.len(),
        "loaded manifest"
    );

    Ok(manifests)
}

/// Parses a multi-document YAML string. Empty documents are skipped.
///
/// `source` names the input in error messages.
pub fn parse_documents(source: &str, content: &str) -> Result<Vec<Manifest>, K8sError> {
    let mut manifests = Vec::new();

    for (document, de) in serde_yaml::Deserializer::from_str(content).enumerate() {
        let value =
            Value::deserialize(de).map_err(|e| K8sError::manifest_parse(source, document, e))?;

        if value.is_null() {
            trace!(
                event.name = "manifest.empty_document",
                manifest.path = source,
                manifest.document = document,
                "skipping empty document"
            );
            continue;
        }

        manifests.push(parse_object(source, document, value)?);
    }

    Ok(manifests)
}

fn parse_object(source: &str, document: usize, value: Value) -> Result<Manifest, K8sError> {
    let field = |name: &'static str| {
        value
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| K8sError::MissingField {
                path: source.to_string(),
                document,
                field: name,
            })
    };
    let api_version = field("apiVersion")?;
    let kind = field("kind")?;

    let manifest = if api_version == "v1" && kind == "Service" {
        serde_yaml::from_value::<Service>(value).map(|svc| Manifest::Service(Box::new(svc)))
    } else {
        serde_yaml::from_value::<DynamicObject>(value).map(Manifest::Dynamic)
    };

    manifest.map_err(|e| K8sError::manifest_parse(source, document, e))
}
