//! Site Registry
//!
//! Maps site identifiers to their registered zero point and boundary
//! polygon. Tracelet offsets are resolved against the zero point of the site
//! they reference.
//!
//! # Example
//!
//! ```ignore
//! use trainpos::coord::Coordinate;
//! use trainpos::site::{SiteInfo, SiteRegistry};
//!
//! let registry = SiteRegistry::open("/var/lib/trainpos/sites.json")?;
//! registry.register(SiteInfo::new("depot", Coordinate::new(49.44, 11.08)))?;
//!
//! let zero = registry.zero_point("depot")?;
//! ```

mod error;
mod registry;
mod types;

pub use error::{RegistryError, RegistryResult};
pub use registry::{SiteMap, SiteRegistry};
pub use types::SiteInfo;
