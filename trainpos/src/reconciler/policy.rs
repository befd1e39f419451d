//! Coalescing-with-priority state machine.

use tracing::debug;

use crate::position::TrainPosition;

/// Holds at most one pending position and decides what to flush.
///
/// The reconciler is purely synchronous; timing is driven by the caller,
/// which invokes [`on_idle`](Self::on_idle) when the idle window elapses.
#[derive(Debug, Default)]
pub struct Reconciler {
    pending: Option<TrainPosition>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a new position and return the one to flush, if any.
    ///
    /// - Nothing pending: `position` becomes pending.
    /// - Same resolution as pending: pending is flushed, `position` replaces it.
    /// - Different resolution: the high-resolution value is flushed, the
    ///   other is dropped and nothing stays pending.
    pub fn offer(&mut self, position: TrainPosition) -> Option<TrainPosition> {
        let Some(pending) = self.pending.take() else {
            self.pending = Some(position);
            return None;
        };

        if pending.is_high_res() == position.is_high_res() {
            self.pending = Some(position);
            return Some(pending);
        }

        let (winner, dropped) = if pending.is_high_res() {
            (pending, position)
        } else {
            (position, pending)
        };
        debug!(
            train_id = %winner.train_id,
            dropped_lat = dropped.position.lat,
            dropped_lon = dropped.position.lon,
            "Tracelet position preferred over GPS"
        );
        Some(winner)
    }

    /// The idle window elapsed: flush whatever is pending.
    pub fn on_idle(&mut self) -> Option<TrainPosition> {
        self.pending.take()
    }

    /// The position currently held back, if any.
    pub fn pending(&self) -> Option<&TrainPosition> {
        self.pending.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    fn gps(lat: f64) -> TrainPosition {
        TrainPosition {
            train_id: "t1".to_string(),
            site_id: String::new(),
            position: Position {
                lat,
                lon: 11.0,
                high_res: false,
            },
        }
    }

    fn tracelet(lat: f64) -> TrainPosition {
        TrainPosition {
            train_id: "t1".to_string(),
            site_id: "site1".to_string(),
            position: Position {
                lat,
                lon: 11.0,
                high_res: true,
            },
        }
    }

    #[test]
    fn test_first_value_is_held() {
        let mut reconciler = Reconciler::new();
        assert_eq!(reconciler.offer(gps(49.0)), None);
        assert_eq!(reconciler.pending(), Some(&gps(49.0)));
    }

    #[test]
    fn test_same_resolution_flushes_previous() {
        let mut reconciler = Reconciler::new();
        reconciler.offer(gps(49.0));

        assert_eq!(reconciler.offer(gps(49.1)), Some(gps(49.0)));
        assert_eq!(reconciler.pending(), Some(&gps(49.1)));
    }

    #[test]
    fn test_same_resolution_tracelets_coalesce() {
        let mut reconciler = Reconciler::new();
        reconciler.offer(tracelet(49.0));

        assert_eq!(reconciler.offer(tracelet(49.2)), Some(tracelet(49.0)));
        assert_eq!(reconciler.pending(), Some(&tracelet(49.2)));
    }

    #[test]
    fn test_tracelet_beats_pending_gps() {
        let mut reconciler = Reconciler::new();
        reconciler.offer(gps(49.0));

        assert_eq!(reconciler.offer(tracelet(49.5)), Some(tracelet(49.5)));
        assert_eq!(reconciler.pending(), None);
    }

    #[test]
    fn test_pending_tracelet_beats_gps() {
        let mut reconciler = Reconciler::new();
        reconciler.offer(tracelet(49.5));

        assert_eq!(reconciler.offer(gps(49.0)), Some(tracelet(49.5)));
        assert_eq!(reconciler.pending(), None);
    }

    #[test]
    fn test_value_after_collision_is_held_again() {
        let mut reconciler = Reconciler::new();
        reconciler.offer(gps(49.0));
        reconciler.offer(tracelet(49.5));

        assert_eq!(reconciler.offer(gps(49.7)), None);
        assert_eq!(reconciler.pending(), Some(&gps(49.7)));
    }

    #[test]
    fn test_idle_flushes_once() {
        let mut reconciler = Reconciler::new();
        reconciler.offer(gps(49.0));

        assert_eq!(reconciler.on_idle(), Some(gps(49.0)));
        assert_eq!(reconciler.on_idle(), None);
    }

    #[test]
    fn test_idle_without_pending() {
        let mut reconciler = Reconciler::new();
        assert_eq!(reconciler.on_idle(), None);
    }

    #[test]
    fn test_zeroed_position_is_a_real_value() {
        let mut reconciler = Reconciler::new();
        let zeroed = TrainPosition {
            train_id: String::new(),
            site_id: String::new(),
            position: Position {
                lat: 0.0,
                lon: 0.0,
                high_res: false,
            },
        };

        assert_eq!(reconciler.offer(zeroed.clone()), None);
        assert_eq!(reconciler.on_idle(), Some(zeroed));
    }
}
