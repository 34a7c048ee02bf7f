//! Debounced visibility tracking.
//!
//! The raw per-frame visibility ratio flickers when fingers graze the ROI;
//! state only flips after the condition has persisted for a configured
//! delay, and each flip emits exactly one event.

use serde::{Deserialize, Serialize};

use crate::params::OcclusionParams;

/// Edge emitted by the debouncer, at most one per update.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum VisibilityEvent {
    Occluded,
    Reappeared,
}

/// Debounced visibility snapshot returned from each update.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct VisibilityUpdate {
    pub is_visible: bool,
    /// Time the current occlusion was confirmed, if occluded.
    pub occluded_at_ms: Option<f64>,
    pub event: Option<VisibilityEvent>,
}

/// Per-ROI debouncer state.
#[derive(Clone, Debug)]
pub struct OcclusionDebouncer {
    params: OcclusionParams,
    is_visible: bool,
    /// First frame at which the opposite condition was observed.
    pending_since_ms: Option<f64>,
    occluded_at_ms: Option<f64>,
}

impl OcclusionDebouncer {
    pub fn new(params: OcclusionParams) -> Self {
        Self {
            params,
            is_visible: true,
            pending_since_ms: None,
            occluded_at_ms: None,
        }
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    /// Feed one frame's visibility ratio.
    ///
    /// A ratio below the threshold pushes towards occluded, at or above it
    /// towards visible; either transition happens only after its delay has
    /// elapsed without interruption. An interrupted dip (or blip) clears
    /// the pending timestamp and emits nothing.
    pub fn update(&mut self, visibility_ratio: f32, now_ms: f64) -> VisibilityUpdate {
        let below = visibility_ratio < self.params.visibility_threshold;
        let mut event = None;

        if self.is_visible {
            if below {
                match self.pending_since_ms {
                    None => self.pending_since_ms = Some(now_ms),
                    Some(since) => {
                        if now_ms - since >= self.params.occlusion_delay_ms {
                            self.is_visible = false;
                            self.pending_since_ms = None;
                            self.occluded_at_ms = Some(now_ms);
                            event = Some(VisibilityEvent::Occluded);
                            log::debug!("occlusion confirmed at {now_ms} ms");
                        }
                    }
                }
            } else {
                self.pending_since_ms = None;
            }
        } else if !below {
            match self.pending_since_ms {
                None => self.pending_since_ms = Some(now_ms),
                Some(since) => {
                    if now_ms - since >= self.params.reappearance_delay_ms {
                        self.is_visible = true;
                        self.pending_since_ms = None;
                        self.occluded_at_ms = None;
                        event = Some(VisibilityEvent::Reappeared);
                        log::debug!("reappearance confirmed at {now_ms} ms");
                    }
                }
            }
        } else {
            self.pending_since_ms = None;
        }

        VisibilityUpdate {
            is_visible: self.is_visible,
            occluded_at_ms: self.occluded_at_ms,
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debouncer() -> OcclusionDebouncer {
        OcclusionDebouncer::new(OcclusionParams::default())
    }

    /// Run a (ratio, time) schedule, collecting emitted events.
    fn run(
        d: &mut OcclusionDebouncer,
        schedule: &[(f32, f64)],
    ) -> Vec<(VisibilityEvent, f64)> {
        let mut events = Vec::new();
        for &(ratio, t) in schedule {
            if let Some(e) = d.update(ratio, t).event {
                events.push((e, t));
            }
        }
        events
    }

    #[test]
    fn short_dip_never_emits() {
        let mut d = debouncer();
        // 200 ms dip, below the 300 ms delay, then recovery.
        let events = run(
            &mut d,
            &[
                (1.0, 0.0),
                (0.2, 100.0),
                (0.2, 300.0),
                (1.0, 350.0),
                (1.0, 1000.0),
            ],
        );
        assert!(events.is_empty());
        assert!(d.is_visible());
    }

    #[test]
    fn sustained_dip_emits_once_when_delay_elapses() {
        let mut d = debouncer();
        let events = run(
            &mut d,
            &[
                (1.0, 0.0),
                (0.2, 100.0), // pending from here
                (0.2, 250.0), // 150 ms: not yet
                (0.2, 399.0), // 299 ms: not yet
                (0.2, 400.0), // 300 ms: flip
                (0.2, 500.0), // still occluded: no second event
            ],
        );
        assert_eq!(events, vec![(VisibilityEvent::Occluded, 400.0)]);
        assert!(!d.is_visible());
    }

    #[test]
    fn flicker_resets_the_pending_window() {
        let mut d = debouncer();
        let events = run(
            &mut d,
            &[
                (0.2, 0.0),
                (1.0, 200.0), // dip interrupted
                (0.2, 250.0), // new window starts here
                (0.2, 500.0), // only 250 ms into the new window
                (0.2, 560.0), // 310 ms: flip
            ],
        );
        assert_eq!(events, vec![(VisibilityEvent::Occluded, 560.0)]);
    }

    #[test]
    fn reappearance_is_debounced_symmetrically() {
        let mut d = debouncer();
        run(&mut d, &[(0.1, 0.0), (0.1, 400.0)]);
        assert!(!d.is_visible());

        let events = run(
            &mut d,
            &[
                (0.9, 500.0),  // pending reappearance
                (0.1, 600.0),  // blip: reset
                (0.9, 700.0),  // pending again
                (0.9, 950.0),  // 250 ms: not yet
                (0.9, 1000.0), // 300 ms: flip
            ],
        );
        assert_eq!(events, vec![(VisibilityEvent::Reappeared, 1000.0)]);
        assert!(d.is_visible());
    }

    #[test]
    fn occluded_at_reported_while_occluded() {
        let mut d = debouncer();
        run(&mut d, &[(0.1, 0.0), (0.1, 350.0)]);
        let u = d.update(0.1, 500.0);
        assert_eq!(u.occluded_at_ms, Some(350.0));

        run(&mut d, &[(1.0, 600.0), (1.0, 950.0)]);
        let u = d.update(1.0, 1000.0);
        assert_eq!(u.occluded_at_ms, None);
    }

    #[test]
    fn asymmetric_delays_are_honoured() {
        let params = OcclusionParams {
            occlusion_delay_ms: 100.0,
            reappearance_delay_ms: 500.0,
            ..OcclusionParams::default()
        };
        let mut d = OcclusionDebouncer::new(params);
        let events = run(&mut d, &[(0.1, 0.0), (0.1, 100.0)]);
        assert_eq!(events, vec![(VisibilityEvent::Occluded, 100.0)]);

        let events = run(&mut d, &[(1.0, 200.0), (1.0, 600.0), (1.0, 700.0)]);
        assert_eq!(events, vec![(VisibilityEvent::Reappeared, 700.0)]);
    }
}
