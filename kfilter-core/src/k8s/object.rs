// object.rs - Accessors filters read from Kubernetes objects
//
// Filters never look at concrete resource types directly. Every object they
// evaluate goes through the `Object` trait, which exposes labels, the
// namespace/name identity and, for Services only, the pod selector.

use std::{collections::BTreeMap, sync::Arc};

use k8s_openapi::api::{
    apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet},
    batch::v1::{CronJob, Job},
    core::v1::{ConfigMap, Namespace, Node, Pod, Secret, Service},
    discovery::v1::EndpointSlice,
    networking::v1::{Ingress, NetworkPolicy},
};
use kube::{Resource, core::DynamicObject};

use crate::nsname::NsName;

static EMPTY_MAP: BTreeMap<String, String> = BTreeMap::new();

/// An object a filter can be evaluated against.
pub trait Object {
    /// Labels attached to the object. Objects without labels return an empty map.
    fn labels(&self) -> &BTreeMap<String, String>;

    /// Namespace and name of the object.
    fn ns_name(&self) -> NsName;

    /// Selector of a Service.
    ///
    /// Returns `None` for every kind other than Service. A Service without a
    /// selector returns an empty map.
    fn service_selector(&self) -> Option<&BTreeMap<String, String>> {
        None
    }
}

fn resource_ns_name<K: Resource>(obj: &K) -> NsName {
    let meta = obj.meta();
    NsName::new(
        meta.namespace.as_deref().unwrap_or_default(),
        meta.name.as_deref().unwrap_or_default(),
    )
}

fn resource_labels<K: Resource>(obj: &K) -> &BTreeMap<String, String> {
    obj.meta().labels.as_ref().unwrap_or(&EMPTY_MAP)
}

macro_rules! impl_object {
    ($($resource:ty),+ $(,)?) => {
        $(
            impl Object for $resource {
                fn labels(&self) -> &BTreeMap<String, String> {
                    resource_labels(self)
                }

                fn ns_name(&self) -> NsName {
                    resource_ns_name(self)
                }
            }
        )+
    };
}

impl_object!(
    Pod,
    Node,
    Namespace,
    ConfigMap,
    Secret,
    Deployment,
    ReplicaSet,
    StatefulSet,
    DaemonSet,
    Job,
    CronJob,
    Ingress,
    NetworkPolicy,
    EndpointSlice,
    DynamicObject,
);

impl Object for Service {
    fn labels(&self) -> &BTreeMap<String, String> {
        resource_labels(self)
    }

    fn ns_name(&self) -> NsName {
        resource_ns_name(self)
    }

    fn service_selector(&self) -> Option<&BTreeMap<String, String>> {
        Some(
            self.spec
                .as_ref()
                .and_then(|spec| spec.selector.as_ref())
                .unwrap_or(&EMPTY_MAP),
        )
    }
}

impl<T: Object + ?Sized> Object for &T {
    fn labels(&self) -> &BTreeMap<String, String> {
        (**self).labels()
    }

    fn ns_name(&self) -> NsName {
        (**self).ns_name()
    }

    fn service_selector(&self) -> Option<&BTreeMap<String, String>> {
        (**self).service_selector()
    }
}

// Reflector stores hand out `Arc<K>`.
impl<T: Object + ?Sized> Object for Arc<T> {
    fn labels(&self) -> &BTreeMap<String, String> {
        (**self).labels()
    }

    fn ns_name(&self) -> NsName {
        (**self).ns_name()
    }

    fn service_selector(&self) -> Option<&BTreeMap<String, String>> {
        (**self).service_selector()
    }
}
