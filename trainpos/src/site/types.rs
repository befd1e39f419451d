//! Site record definitions.

use serde::{Deserialize, Deserializer, Serialize};

use crate::coord::{CoordError, Coordinate};

/// A registered site: its zero point and boundary polygon.
///
/// The zero point is the origin tracelet offsets are measured from. The
/// area is informational and may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteInfo {
    /// Unique site identifier.
    #[serde(rename = "id")]
    pub site_id: String,

    /// Reference point for tracelet offsets.
    pub zero: Coordinate,

    /// Boundary polygon, in order. `null` and a missing key both read as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub area: Vec<Coordinate>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Coordinate>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<Coordinate>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl SiteInfo {
    /// Create a site with an empty boundary.
    pub fn new(site_id: impl Into<String>, zero: Coordinate) -> Self {
        Self {
            site_id: site_id.into(),
            zero,
            area: Vec::new(),
        }
    }

    /// Set the boundary polygon.
    pub fn with_area(mut self, area: Vec<Coordinate>) -> Self {
        self.area = area;
        self
    }

    /// Validate the zero point and every boundary vertex.
    pub fn validate(&self) -> Result<(), CoordError> {
        self.zero.validate()?;
        self.area.iter().try_for_each(Coordinate::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_area_reads_as_empty() {
        let site: SiteInfo =
            serde_json::from_str(r#"{"id":"s","zero":{"lat":49.4,"lng":11.0},"area":null}"#)
                .unwrap();
        assert!(site.area.is_empty());
        assert_eq!(
            serde_json::to_string(&site).unwrap(),
            r#"{"id":"s","zero":{"lat":49.4,"lng":11.0},"area":[]}"#
        );
    }

    #[test]
    fn test_missing_area_reads_as_empty() {
        let site: SiteInfo =
            serde_json::from_str(r#"{"id":"s","zero":{"lat":49.4,"lng":11.0}}"#).unwrap();
        assert!(site.area.is_empty());
    }
}
