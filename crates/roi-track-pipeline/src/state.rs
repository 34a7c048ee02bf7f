//! Marker interaction state machine.
//!
//! Converts the debounced occlusion signal into discrete interaction
//! events: a covered marker is a tap, a held cover an engagement, and the
//! uncover a release. The cycle is fixed:
//! `Default -> Tap -> Engaged -> Release -> Default`.

use std::collections::HashMap;
use std::fmt;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::params::MarkerParams;

/// Interaction state of one marker.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerState {
    Default,
    Tap,
    Engaged,
    Release,
}

impl MarkerState {
    /// Compact letter code for UI display.
    pub fn letter(self) -> char {
        match self {
            MarkerState::Default => 'D',
            MarkerState::Tap => 'T',
            MarkerState::Engaged => 'E',
            MarkerState::Release => 'R',
        }
    }
}

impl fmt::Display for MarkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MarkerState::Default => "default",
            MarkerState::Tap => "tap",
            MarkerState::Engaged => "engaged",
            MarkerState::Release => "release",
        })
    }
}

/// One emitted transition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarkerTransition {
    pub marker_id: String,
    pub prev: MarkerState,
    pub next: MarkerState,
    /// Latest known marker position (source-frame pixels).
    pub position: Point2<f32>,
    /// Letter code of `next`, for compact display.
    pub code: char,
}

/// Mutable per-marker record; only the state machine writes to it.
#[derive(Clone, Debug)]
pub struct MarkerStateRecord {
    pub id: String,
    pub state: MarkerState,
    pub position: Point2<f32>,
    pub last_position: Point2<f32>,
    pub state_entered_at_ms: f64,
    pub occluded_at_ms: Option<f64>,
}

/// State machine over a registry of marker records, keyed by ROI id.
#[derive(Clone, Debug, Default)]
pub struct MarkerStateMachine {
    params: MarkerParams,
    records: HashMap<String, MarkerStateRecord>,
}

impl MarkerStateMachine {
    pub fn new(params: MarkerParams) -> Self {
        Self {
            params,
            records: HashMap::new(),
        }
    }

    /// Snapshot of a marker's record, if it exists.
    pub fn record(&self, id: &str) -> Option<&MarkerStateRecord> {
        self.records.get(id)
    }

    /// Remove one marker's record (its ROI was cleared).
    pub fn remove(&mut self, id: &str) {
        self.records.remove(id);
    }

    /// Remove every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Advance one marker by one frame.
    ///
    /// `position` is the latest known centroid and is recorded regardless
    /// of state. At most one transition fires per update, so the
    /// `Default -> Tap -> Engaged` path always passes through `Tap`.
    pub fn update(
        &mut self,
        id: &str,
        is_occluded: bool,
        position: Point2<f32>,
        now_ms: f64,
    ) -> Option<MarkerTransition> {
        let record = self
            .records
            .entry(id.to_string())
            .or_insert_with(|| MarkerStateRecord {
                id: id.to_string(),
                state: MarkerState::Default,
                position,
                last_position: position,
                state_entered_at_ms: now_ms,
                occluded_at_ms: None,
            });

        record.last_position = record.position;
        record.position = position;

        let elapsed = now_ms - record.state_entered_at_ms;
        let next = match record.state {
            MarkerState::Default if is_occluded => Some(MarkerState::Tap),
            MarkerState::Tap if !is_occluded => Some(MarkerState::Default),
            MarkerState::Tap if elapsed >= self.params.engagement_duration_ms => {
                Some(MarkerState::Engaged)
            }
            MarkerState::Engaged if !is_occluded => Some(MarkerState::Release),
            MarkerState::Release if elapsed >= self.params.release_timeout_ms => {
                Some(MarkerState::Default)
            }
            _ => None,
        };

        let next = next?;
        let prev = record.state;
        record.state = next;
        record.state_entered_at_ms = now_ms;
        record.occluded_at_ms = match next {
            MarkerState::Tap => Some(now_ms),
            MarkerState::Default => None,
            _ => record.occluded_at_ms,
        };

        log::debug!("marker {id}: {} -> {} at {now_ms} ms", prev.letter(), next.letter());

        Some(MarkerTransition {
            marker_id: id.to_string(),
            prev,
            next,
            position,
            code: next.letter(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> MarkerStateMachine {
        MarkerStateMachine::new(MarkerParams::default())
    }

    fn pos() -> Point2<f32> {
        Point2::new(10.0, 20.0)
    }

    fn drive(
        m: &mut MarkerStateMachine,
        schedule: &[(bool, f64)],
    ) -> Vec<(MarkerState, MarkerState, f64)> {
        let mut out = Vec::new();
        for &(occluded, t) in schedule {
            if let Some(tr) = m.update("m0", occluded, pos(), t) {
                out.push((tr.prev, tr.next, t));
            }
        }
        out
    }

    #[test]
    fn occlusion_taps_then_engages_without_skipping() {
        let mut m = machine();
        let transitions = drive(
            &mut m,
            &[
                (false, 0.0),
                (true, 100.0),  // Default -> Tap
                (true, 400.0),  // 300 ms held: below engagement duration
                (true, 601.0),  // 501 ms held: Tap -> Engaged
                (true, 900.0),  // still engaged
            ],
        );
        assert_eq!(
            transitions,
            vec![
                (MarkerState::Default, MarkerState::Tap, 100.0),
                (MarkerState::Tap, MarkerState::Engaged, 601.0),
            ]
        );
        assert_eq!(m.record("m0").unwrap().state, MarkerState::Engaged);
    }

    #[test]
    fn short_tap_returns_to_default() {
        let mut m = machine();
        let transitions = drive(&mut m, &[(true, 0.0), (false, 200.0)]);
        assert_eq!(
            transitions,
            vec![
                (MarkerState::Default, MarkerState::Tap, 0.0),
                (MarkerState::Tap, MarkerState::Default, 200.0),
            ]
        );
        assert_eq!(m.record("m0").unwrap().occluded_at_ms, None);
    }

    #[test]
    fn full_cycle_returns_to_default_after_release_timeout() {
        let mut m = machine();
        let transitions = drive(
            &mut m,
            &[
                (true, 0.0),     // -> Tap
                (true, 501.0),   // -> Engaged
                (false, 700.0),  // -> Release
                (false, 900.0),  // 200 ms in release: stays
                (false, 1001.0), // 301 ms: -> Default
            ],
        );
        let states: Vec<MarkerState> = transitions.iter().map(|t| t.1).collect();
        assert_eq!(
            states,
            vec![
                MarkerState::Tap,
                MarkerState::Engaged,
                MarkerState::Release,
                MarkerState::Default,
            ]
        );
    }

    #[test]
    fn engaged_persists_while_occluded() {
        let mut m = machine();
        drive(&mut m, &[(true, 0.0), (true, 501.0)]);
        assert_eq!(m.record("m0").unwrap().state, MarkerState::Engaged);
        let transitions = drive(&mut m, &[(true, 5000.0), (true, 10000.0)]);
        assert!(transitions.is_empty());
    }

    #[test]
    fn at_most_one_transition_per_update() {
        let mut m = machine();
        // A single very late update while occluded cannot jump Default -> Engaged.
        let tr = m.update("m0", true, pos(), 0.0).expect("transition");
        assert_eq!(tr.next, MarkerState::Tap);
        let tr = m.update("m0", true, pos(), 10_000.0).expect("transition");
        assert_eq!(tr.prev, MarkerState::Tap);
        assert_eq!(tr.next, MarkerState::Engaged);
    }

    #[test]
    fn position_updates_independently_of_state() {
        let mut m = machine();
        m.update("m0", false, Point2::new(1.0, 1.0), 0.0);
        m.update("m0", false, Point2::new(2.0, 3.0), 33.0);
        let r = m.record("m0").unwrap();
        assert_eq!(r.position, Point2::new(2.0, 3.0));
        assert_eq!(r.last_position, Point2::new(1.0, 1.0));
        assert_eq!(r.state, MarkerState::Default);
    }

    #[test]
    fn transition_carries_letter_code() {
        let mut m = machine();
        let tr = m.update("m0", true, pos(), 0.0).unwrap();
        assert_eq!(tr.code, 'T');
        assert_eq!(MarkerState::Default.letter(), 'D');
        assert_eq!(MarkerState::Engaged.letter(), 'E');
        assert_eq!(MarkerState::Release.letter(), 'R');
    }

    #[test]
    fn records_are_per_marker_and_removable() {
        let mut m = machine();
        m.update("a", true, pos(), 0.0);
        m.update("b", false, pos(), 0.0);
        assert_eq!(m.record("a").unwrap().state, MarkerState::Tap);
        assert_eq!(m.record("b").unwrap().state, MarkerState::Default);

        m.remove("a");
        assert!(m.record("a").is_none());
        assert!(m.record("b").is_some());

        m.clear();
        assert!(m.record("b").is_none());
    }

    #[test]
    fn occluded_at_recorded_on_tap() {
        let mut m = machine();
        m.update("m0", true, pos(), 123.0);
        assert_eq!(m.record("m0").unwrap().occluded_at_ms, Some(123.0));
    }
}
