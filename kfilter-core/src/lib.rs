//! Comparable accept/reject filters for Kubernetes objects.
//!
//! A watch or cache layer holds a [`ComparableFilter`] to decide which objects
//! it tracks, and compares filters with [`ComparableFilter::equals`] to detect
//! configuration changes.

pub mod filter;
pub mod k8s;
pub mod nsname;

pub use filter::{ComparableFilter, Filter};
pub use k8s::Object;
pub use nsname::{NsName, NsNameParseError};
