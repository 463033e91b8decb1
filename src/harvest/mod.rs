//! Harvest module - lazy resource resolution and batch tallying.
//!
//! - **Resource**: one remote object and its derived metadata views, via [`Resource`]
//! - **Items**: size-aware, build-on-demand collection members via [`Items`]
//! - **Metrics**: success/error accounting for units of work via [`Metrics`]
//! - **XML**: the owned document tree every view is expressed in, via [`XmlDocument`]

pub mod metrics;
pub mod resource;
pub mod xml;

// Re-export commonly used types
pub use metrics::{Metrics, MetricsSnapshot};
pub use resource::{Items, ItemsIter, ManifestOrDruid, Resource};
pub use xml::{XmlDocument, XmlElement, XmlNode};
