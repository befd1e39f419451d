//! Site entry/exit detection.

use crate::position::{SiteEvent, TrainPosition};

/// Remembers the last site a train was published in.
#[derive(Debug, Default)]
pub struct SiteTransitionDetector {
    last_site: Option<String>,
}

impl SiteTransitionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare a flushed position with the last one.
    ///
    /// Returns `left` for the previous site (if any) followed by `entered`
    /// for the new site (if any). Returns nothing when the site is unchanged.
    pub fn observe(&mut self, position: &TrainPosition) -> Vec<SiteEvent> {
        let current = position.site();
        if self.last_site.as_deref() == current {
            return Vec::new();
        }

        let mut events = Vec::with_capacity(2);
        if let Some(previous) = self.last_site.take() {
            events.push(SiteEvent::left(&position.train_id, previous));
        }
        if let Some(site) = current {
            events.push(SiteEvent::entered(&position.train_id, site));
            self.last_site = Some(site.to_string());
        }
        events
    }

    /// The site the train was last seen in.
    pub fn current_site(&self) -> Option<&str> {
        self.last_site.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    fn at(site: &str) -> TrainPosition {
        TrainPosition {
            train_id: "t1".to_string(),
            site_id: site.to_string(),
            position: Position {
                lat: 49.0,
                lon: 11.0,
                high_res: !site.is_empty(),
            },
        }
    }

    #[test]
    fn test_outside_to_outside_is_silent() {
        let mut detector = SiteTransitionDetector::new();
        assert!(detector.observe(&at("")).is_empty());
        assert_eq!(detector.current_site(), None);
    }

    #[test]
    fn test_entering_first_site() {
        let mut detector = SiteTransitionDetector::new();
        assert_eq!(detector.observe(&at("A")), vec![SiteEvent::entered("t1", "A")]);
        assert_eq!(detector.current_site(), Some("A"));
    }

    #[test]
    fn test_staying_in_site_is_silent() {
        let mut detector = SiteTransitionDetector::new();
        detector.observe(&at("A"));
        assert!(detector.observe(&at("A")).is_empty());
    }

    #[test]
    fn test_moving_between_sites() {
        let mut detector = SiteTransitionDetector::new();
        detector.observe(&at("A"));

        assert_eq!(
            detector.observe(&at("B")),
            vec![SiteEvent::left("t1", "A"), SiteEvent::entered("t1", "B")]
        );
        assert_eq!(detector.current_site(), Some("B"));
    }

    #[test]
    fn test_leaving_site() {
        let mut detector = SiteTransitionDetector::new();
        detector.observe(&at("A"));

        assert_eq!(detector.observe(&at("")), vec![SiteEvent::left("t1", "A")]);
        assert_eq!(detector.current_site(), None);
        assert!(detector.observe(&at("")).is_empty());
    }

    #[test]
    fn test_reentering_site() {
        let mut detector = SiteTransitionDetector::new();
        detector.observe(&at("A"));
        detector.observe(&at(""));

        assert_eq!(detector.observe(&at("A")), vec![SiteEvent::entered("t1", "A")]);
    }
}
