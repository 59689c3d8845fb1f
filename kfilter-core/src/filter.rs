// filter.rs - Comparable accept/reject filters for Kubernetes objects
//
// A watch layer uses a filter to decide which objects it tracks. The comparable
// variants form a closed set so that two filter configurations can be compared
// structurally and a watch is only restarted when its filter actually changed.

use std::{
    collections::{BTreeMap, HashSet},
    fmt,
};

use tracing::trace;

use crate::{k8s::Object, nsname::NsName};

/// Decides whether an object should be accepted.
///
/// Implementations must be pure: `accept` never fails and has no side effects.
/// Closures taking `&dyn Object` are filters too, but cannot be compared.
pub trait Filter: Send + Sync {
    /// Returns true if the object passes the filter.
    fn accept(&self, obj: &dyn Object) -> bool;

    /// Returns the comparable form of this filter, if it has one.
    fn as_comparable(&self) -> Option<&ComparableFilter> {
        None
    }
}

impl<F> Filter for F
where
    F: Fn(&dyn Object) -> bool + Send + Sync,
{
    fn accept(&self, obj: &dyn Object) -> bool {
        self(obj)
    }
}

/// A filter that supports structural equality.
///
/// Each variant owns a copy of its configuration taken at construction time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ComparableFilter {
    /// Accepts every object.
    #[default]
    Null,
    /// Rejects every object.
    All,
    /// Accepts objects whose labels contain every key/value pair of the target.
    Labels(BTreeMap<String, String>),
    /// Accepts Services whose selector is a non-empty subset of the target.
    ServiceFor(BTreeMap<String, String>),
    /// Accepts objects whose namespace/name is in the set.
    NsName(HashSet<NsName>),
}

/// Returns a filter that accepts every object.
pub fn null() -> ComparableFilter {
    ComparableFilter::Null
}

/// Returns a filter that rejects every object.
pub fn all() -> ComparableFilter {
    ComparableFilter::All
}

/// Returns a filter that accepts objects carrying all of the given labels.
///
/// An empty target accepts every object. Extra labels on the object are ignored.
pub fn labels<I, K, V>(target: I) -> ComparableFilter
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    ComparableFilter::Labels(collect_map(target))
}

/// Returns a filter that accepts Services whose selector matches the target.
///
/// Every selector entry must be present in `target` with the same value.
/// Non-Service objects, Services without a selector and an empty target are
/// all rejected.
pub fn service_for<I, K, V>(target: I) -> ComparableFilter
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    ComparableFilter::ServiceFor(collect_map(target))
}

/// Returns a filter that accepts objects whose namespace/name is one of `ids`.
///
/// Duplicate identities collapse. An empty list accepts nothing.
pub fn ns_name<I>(ids: I) -> ComparableFilter
where
    I: IntoIterator<Item = NsName>,
{
    ComparableFilter::NsName(ids.into_iter().collect())
}

fn collect_map<I, K, V>(entries: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Returns true if every pair in `required` is present in `available` with the same value.
fn is_subset(required: &BTreeMap<String, String>, available: &BTreeMap<String, String>) -> bool {
    required
        .iter()
        .all(|(k, v)| available.get(k).is_some_and(|val| val == v))
}

impl ComparableFilter {
    /// Short name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::All => "all",
            Self::Labels(_) => "labels",
            Self::ServiceFor(_) => "service_for",
            Self::NsName(_) => "ns_name",
        }
    }

    /// Returns true if `other` is a comparable filter of the same variant with
    /// the same configuration.
    ///
    /// Filters without a comparable form are never equal to this one.
    pub fn equals(&self, other: &dyn Filter) -> bool {
        other.as_comparable().is_some_and(|other| self == other)
    }

    fn accept_service(target: &BTreeMap<String, String>, obj: &dyn Object) -> bool {
        let Some(selector) = obj.service_selector() else {
            trace!(
                event.name = "filter.service_for.not_a_service",
                k8s.object = %obj.ns_name(),
                "object is not a service"
            );
            return false;
        };

        if selector.is_empty() || target.is_empty() {
            trace!(
                event.name = "filter.service_for.empty",
                k8s.object = %obj.ns_name(),
                selector_empty = selector.is_empty(),
                target_empty = target.is_empty(),
                "service selector or target is empty"
            );
            return false;
        }

        is_subset(selector, target)
    }
}

impl Filter for ComparableFilter {
    fn accept(&self, obj: &dyn Object) -> bool {
        match self {
            Self::Null => true,
            Self::All => false,
            Self::Labels(target) => target.is_empty() || is_subset(target, obj.labels()),
            Self::ServiceFor(target) => Self::accept_service(target, obj),
            Self::NsName(set) => set.contains(&obj.ns_name()),
        }
    }

    fn as_comparable(&self) -> Option<&ComparableFilter> {
        Some(self)
    }
}

fn fmt_map(f: &mut fmt::Formatter<'_>, map: &BTreeMap<String, String>) -> fmt::Result {
    let pairs: Vec<String> = map.iter().map(|(k, v)| format!("{k}={v}")).collect();
    write!(f, "{}", pairs.join(","))
}

impl fmt::Display for ComparableFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null | Self::All => write!(f, "{}", self.kind()),
            Self::Labels(target) | Self::ServiceFor(target) => {
                write!(f, "{}(", self.kind())?;
                fmt_map(f, target)?;
                write!(f, ")")
            }
            Self::NsName(set) => {
                let mut ids: Vec<String> = set.iter().map(ToString::to_string).collect();
                ids.sort();
                write!(f, "{}({})", self.kind(), ids.join(","))
            }
        }
    }
}
