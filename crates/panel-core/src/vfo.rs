//! VFO/split state reconciliation
//!
//! Several command families describe overlapping parts of the same model:
//! `IF` carries the authoritative periodic status, `FA`/`FB` carry per-VFO
//! frequencies, `FR`/`FT` carry the VFO functions, `TX`/`RX` the transmit
//! state and `TS` the TF-Set preview. [`VfoReconciler`] folds them into one
//! consistent picture and derives the "active VFO for display" from it.
//!
//! Split precedence: the `IF` P12 split field is authoritative whenever it
//! has been observed. Comparing the `FR`/`FT` roles only *infers* split
//! before that first observation (hardware buttons change VFO roles without
//! a prompt `IF` during boot). The two sources never both mutate split in
//! the same decode pass.

use std::time::{Duration, Instant};

use cat_ts590::{encode, IfStatus, VfoRole};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::sink::{BlobValue, StatusSink, Topic};
use crate::transverter::Transverter;

/// Frequencies below this are treated as framing glitches, not telemetry
pub const MIN_PLAUSIBLE_HZ: u64 = 30_000;
/// Frequencies above this are treated as framing glitches, not telemetry
pub const MAX_PLAUSIBLE_HZ: u64 = 300_000_000;

/// Minimum spacing between consolidated display publications (~60 Hz)
pub const PUBLISH_MIN_INTERVAL: Duration = Duration::from_millis(16);

/// The consolidated display tuple published on [`Topic::VfoDisplay`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VfoDisplay {
    /// Display-side frequency of the active role
    pub active_hz: u64,
    /// Display-side frequency of the other role, 0 when unknown
    pub inactive_hz: u64,
    /// Which role is active
    pub active_role: VfoRole,
}

/// Reconciles VFO roles, split, TF-Set and transmit state
#[derive(Debug)]
pub struct VfoReconciler {
    rx_role: VfoRole,
    tx_role: VfoRole,
    tx_role_known: bool,
    split: bool,
    split_authoritative: bool,
    tf_set: bool,
    transmitting: bool,
    raw_hz: [Option<u64>; 3],
    requested_memory: Option<u16>,
    last_published: Option<VfoDisplay>,
    last_publish_at: Option<Instant>,
}

impl VfoReconciler {
    /// Start at VFO A, simplex, not transmitting
    pub fn new() -> Self {
        Self {
            rx_role: VfoRole::A,
            tx_role: VfoRole::A,
            tx_role_known: false,
            split: false,
            split_authoritative: false,
            tf_set: false,
            transmitting: false,
            raw_hz: [None; 3],
            requested_memory: None,
            last_published: None,
            last_publish_at: None,
        }
    }

    /// Current receive role
    pub fn rx_role(&self) -> VfoRole {
        self.rx_role
    }

    /// Current transmit role
    pub fn tx_role(&self) -> VfoRole {
        self.tx_role
    }

    /// Split engaged
    pub fn split(&self) -> bool {
        self.split
    }

    /// Transmitting
    pub fn transmitting(&self) -> bool {
        self.transmitting
    }

    /// Cached raw (pre-transverter) frequency for a role
    pub fn raw_frequency(&self, role: VfoRole) -> Option<u64> {
        self.raw_hz[role.index()]
    }

    /// Last published display tuple, if any
    pub fn last_display(&self) -> Option<VfoDisplay> {
        self.last_published
    }

    /// The role shown as active on the main display
    ///
    /// Simplex shows the RX role. In split, the TX role takes over while
    /// transmitting or while TF-Set previews the transmit frequency.
    pub fn active_role(&self) -> VfoRole {
        if self.split && (self.transmitting || self.tf_set) {
            self.tx_role
        } else {
            self.rx_role
        }
    }

    /// Fold in one `IF` status frame
    ///
    /// Returns a follow-up command when the memory channel changed and
    /// fresh channel data should be requested - the only decoder-triggered
    /// outbound side effect outside the scheduler.
    pub fn apply_status(
        &mut self,
        status: &IfStatus,
        xvtr: &Transverter,
        sink: &dyn StatusSink,
        now: Instant,
    ) -> Option<String> {
        if self.transmitting != status.transmitting {
            self.transmitting = status.transmitting;
            sink.publish_scalar(Topic::TxStatus, i64::from(status.transmitting));
        }

        // IF split is authoritative from the first observation onward
        self.split_authoritative = true;
        if self.split != status.split {
            self.split = status.split;
            sink.publish_scalar(Topic::SplitStatus, i64::from(status.split));
        }

        if let Some(function) = status.function {
            self.apply_status_function(function, status.transmitting);

            if (MIN_PLAUSIBLE_HZ..=MAX_PLAUSIBLE_HZ).contains(&status.frequency_hz) {
                self.raw_hz[function.index()] = Some(status.frequency_hz);
            } else {
                warn!(
                    hz = status.frequency_hz,
                    "implausible IF frequency, keeping cached value"
                );
            }
        }

        let mut follow_up = None;
        if status.function == Some(VfoRole::Memory)
            && self.requested_memory != Some(status.memory_channel)
        {
            debug!(channel = status.memory_channel, "memory channel changed, requesting record");
            self.requested_memory = Some(status.memory_channel);
            follow_up = Some(encode::memory_read(false, status.memory_channel));
        }

        sink.publish_blob(Topic::IfSnapshot, &BlobValue::Status(status.clone()));
        self.publish_display(xvtr, sink, now);
        follow_up
    }

    /// Role update rule for the `IF` function field, keyed on the
    /// transmitting flag in the same message
    fn apply_status_function(&mut self, function: VfoRole, transmitting: bool) {
        if transmitting {
            if self.split {
                self.tx_role = function;
                self.tx_role_known = true;
            } else {
                self.rx_role = function;
                self.tx_role = function;
                self.tx_role_known = true;
            }
        } else {
            self.rx_role = function;
            if !self.split {
                self.tx_role = function;
                self.tx_role_known = true;
            } else if !self.tx_role_known {
                self.tx_role = function.other();
                self.tx_role_known = true;
            }
        }
    }

    /// Fold in an `FR` receive-function report
    pub fn apply_rx_function(
        &mut self,
        role: VfoRole,
        xvtr: &Transverter,
        sink: &dyn StatusSink,
        now: Instant,
    ) {
        self.rx_role = role;
        self.infer_split(sink);
        if !self.split {
            self.tx_role = role;
            self.tx_role_known = true;
        }
        self.publish_display(xvtr, sink, now);
    }

    /// Fold in an `FT` transmit-function report
    pub fn apply_tx_function(
        &mut self,
        role: VfoRole,
        xvtr: &Transverter,
        sink: &dyn StatusSink,
        now: Instant,
    ) {
        self.tx_role = role;
        self.tx_role_known = true;
        self.infer_split(sink);
        self.publish_display(xvtr, sink, now);
    }

    /// Secondary split inference from role comparison
    ///
    /// Only runs until the first authoritative `IF` observation, and only
    /// when both roles are free-running VFOs.
    fn infer_split(&mut self, sink: &dyn StatusSink) {
        if self.split_authoritative || !self.tx_role_known {
            return;
        }
        if self.rx_role == VfoRole::Memory || self.tx_role == VfoRole::Memory {
            return;
        }
        let inferred = self.rx_role != self.tx_role;
        if self.split != inferred {
            self.split = inferred;
            sink.publish_scalar(Topic::SplitStatus, i64::from(inferred));
        }
    }

    /// Fold in a `TX`/`RX` transmit-state report
    pub fn apply_transmit(
        &mut self,
        transmitting: bool,
        xvtr: &Transverter,
        sink: &dyn StatusSink,
        now: Instant,
    ) {
        if self.transmitting != transmitting {
            self.transmitting = transmitting;
            sink.publish_scalar(Topic::TxStatus, i64::from(transmitting));
        }
        self.publish_display(xvtr, sink, now);
    }

    /// Fold in a `TS` TF-Set report
    pub fn apply_tf_set(
        &mut self,
        engaged: bool,
        xvtr: &Transverter,
        sink: &dyn StatusSink,
        now: Instant,
    ) {
        if self.tf_set != engaged {
            self.tf_set = engaged;
            sink.publish_scalar(Topic::TfSet, i64::from(engaged));
        }
        self.publish_display(xvtr, sink, now);
    }

    /// Fold in an `FA`/`FB` frequency report
    pub fn apply_frequency(
        &mut self,
        role: VfoRole,
        hz: u64,
        xvtr: &Transverter,
        sink: &dyn StatusSink,
        now: Instant,
    ) {
        self.raw_hz[role.index()] = Some(hz);
        self.publish_display(xvtr, sink, now);
    }

    /// Recompute the display tuple and publish it through the dedup and
    /// rate-limit gates
    ///
    /// The two gates are independent: an unchanged tuple never publishes,
    /// and a changed tuple inside the ~16 ms window is suppressed too.
    /// Call this again after any transverter change so the new translation
    /// becomes a publication candidate.
    pub fn publish_display(&mut self, xvtr: &Transverter, sink: &dyn StatusSink, now: Instant) {
        let active = self.active_role();
        let inactive = if active == self.rx_role { self.tx_role } else { self.rx_role };

        let Some(raw_active) = self.raw_hz[active.index()] else {
            return;
        };

        let display = VfoDisplay {
            active_hz: xvtr.display_from_radio(raw_active),
            inactive_hz: self.raw_hz[inactive.index()]
                .map(|hz| xvtr.display_from_radio(hz))
                .unwrap_or(0),
            active_role: active,
        };

        if self.last_published == Some(display) {
            return;
        }
        if let Some(at) = self.last_publish_at {
            if now.duration_since(at) < PUBLISH_MIN_INTERVAL {
                return;
            }
        }

        self.last_published = Some(display);
        self.last_publish_at = Some(now);
        sink.publish_blob(Topic::VfoDisplay, &BlobValue::VfoDisplay(display));
    }
}

impl Default for VfoReconciler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;

    fn later(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    fn status(hz: u64, function: VfoRole, split: bool, transmitting: bool) -> IfStatus {
        IfStatus {
            frequency_hz: hz,
            function: Some(function),
            split,
            transmitting,
            ..IfStatus::default()
        }
    }

    #[test]
    fn test_simplex_active_is_rx() {
        let sink = RecordingSink::new();
        let xvtr = Transverter::new();
        let mut vfo = VfoReconciler::new();
        let t0 = Instant::now();

        vfo.apply_status(&status(14_070_000, VfoRole::A, false, false), &xvtr, &sink, t0);
        assert_eq!(vfo.active_role(), VfoRole::A);
        assert_eq!(
            vfo.last_display(),
            Some(VfoDisplay { active_hz: 14_070_000, inactive_hz: 14_070_000, active_role: VfoRole::A })
        );
    }

    #[test]
    fn test_display_dedup_gate() {
        let sink = RecordingSink::new();
        let xvtr = Transverter::new();
        let mut vfo = VfoReconciler::new();
        let t0 = Instant::now();

        let st = status(14_070_000, VfoRole::A, false, false);
        vfo.apply_status(&st, &xvtr, &sink, t0);
        assert_eq!(sink.count(Topic::VfoDisplay), 1);

        // Same payload again, outside the rate window: dedup suppresses
        vfo.apply_status(&st, &xvtr, &sink, later(t0, 20));
        assert_eq!(sink.count(Topic::VfoDisplay), 1);
    }

    #[test]
    fn test_display_rate_limit_gate() {
        let sink = RecordingSink::new();
        let xvtr = Transverter::new();
        let mut vfo = VfoReconciler::new();
        let t0 = Instant::now();

        vfo.apply_frequency(VfoRole::A, 14_070_000, &xvtr, &sink, t0);
        // Changed value inside the 16 ms window: rate gate suppresses
        vfo.apply_frequency(VfoRole::A, 14_070_010, &xvtr, &sink, later(t0, 5));
        assert_eq!(sink.count(Topic::VfoDisplay), 1);

        // Outside the window the new value goes out
        vfo.apply_frequency(VfoRole::A, 14_070_020, &xvtr, &sink, later(t0, 20));
        assert_eq!(sink.count(Topic::VfoDisplay), 2);
    }

    #[test]
    fn test_split_precedence_if_wins() {
        let sink = RecordingSink::new();
        let xvtr = Transverter::new();
        let mut vfo = VfoReconciler::new();
        let t0 = Instant::now();

        // IF asserts split on
        vfo.apply_status(&status(14_070_000, VfoRole::A, true, false), &xvtr, &sink, t0);
        assert!(vfo.split());

        // FR/FT pair that would infer split off from role comparison
        vfo.apply_rx_function(VfoRole::A, &xvtr, &sink, later(t0, 20));
        vfo.apply_tx_function(VfoRole::A, &xvtr, &sink, later(t0, 40));
        assert!(vfo.split(), "inferred signal must not override authoritative IF");

        // Only the next IF may change it
        vfo.apply_status(&status(14_070_000, VfoRole::A, false, false), &xvtr, &sink, later(t0, 60));
        assert!(!vfo.split());
    }

    #[test]
    fn test_split_inferred_before_first_if() {
        let sink = RecordingSink::new();
        let xvtr = Transverter::new();
        let mut vfo = VfoReconciler::new();
        let t0 = Instant::now();

        vfo.apply_rx_function(VfoRole::A, &xvtr, &sink, t0);
        vfo.apply_tx_function(VfoRole::B, &xvtr, &sink, later(t0, 20));
        assert!(vfo.split(), "differing A/B roles infer split before any IF");

        vfo.apply_tx_function(VfoRole::A, &xvtr, &sink, later(t0, 40));
        assert!(!vfo.split(), "equal roles infer split off");
    }

    #[test]
    fn test_memory_role_does_not_infer_split() {
        let sink = RecordingSink::new();
        let xvtr = Transverter::new();
        let mut vfo = VfoReconciler::new();
        let t0 = Instant::now();

        vfo.apply_tx_function(VfoRole::B, &xvtr, &sink, t0);
        vfo.apply_rx_function(VfoRole::Memory, &xvtr, &sink, later(t0, 20));
        assert!(vfo.split(), "memory role leaves the inferred state alone");
    }

    #[test]
    fn test_active_role_in_split() {
        let sink = RecordingSink::new();
        let xvtr = Transverter::new();
        let mut vfo = VfoReconciler::new();
        let t0 = Instant::now();

        vfo.apply_status(&status(14_070_000, VfoRole::A, true, false), &xvtr, &sink, t0);
        vfo.apply_frequency(VfoRole::B, 14_075_000, &xvtr, &sink, later(t0, 20));

        // Receiving, no TF-Set: RX role shows
        assert_eq!(vfo.active_role(), VfoRole::A);

        // TF-Set engaged: TX role previews
        vfo.apply_tf_set(true, &xvtr, &sink, later(t0, 40));
        assert_eq!(vfo.active_role(), VfoRole::B);
        vfo.apply_tf_set(false, &xvtr, &sink, later(t0, 60));

        // Transmitting: TX role shows
        vfo.apply_transmit(true, &xvtr, &sink, later(t0, 80));
        assert_eq!(vfo.active_role(), VfoRole::B);
    }

    #[test]
    fn test_if_role_rule_receiving_split_defaults_tx_to_other() {
        let sink = RecordingSink::new();
        let xvtr = Transverter::new();
        let mut vfo = VfoReconciler::new();
        let t0 = Instant::now();

        // First observation: split on, receiving on B, TX role never reported
        vfo.apply_status(&status(7_074_000, VfoRole::B, true, false), &xvtr, &sink, t0);
        assert_eq!(vfo.rx_role(), VfoRole::B);
        assert_eq!(vfo.tx_role(), VfoRole::A, "unset TX role defaults to the other VFO");
    }

    #[test]
    fn test_if_role_rule_transmitting_updates_tx_only() {
        let sink = RecordingSink::new();
        let xvtr = Transverter::new();
        let mut vfo = VfoReconciler::new();
        let t0 = Instant::now();

        vfo.apply_status(&status(14_070_000, VfoRole::A, true, false), &xvtr, &sink, t0);
        vfo.apply_tx_function(VfoRole::B, &xvtr, &sink, later(t0, 20));

        // While transmitting in split, the function field moves the TX role
        vfo.apply_status(&status(14_080_000, VfoRole::B, true, true), &xvtr, &sink, later(t0, 40));
        assert_eq!(vfo.rx_role(), VfoRole::A, "RX role untouched while transmitting in split");
        assert_eq!(vfo.tx_role(), VfoRole::B);
    }

    #[test]
    fn test_implausible_if_frequency_not_cached() {
        let sink = RecordingSink::new();
        let xvtr = Transverter::new();
        let mut vfo = VfoReconciler::new();
        let t0 = Instant::now();

        vfo.apply_status(&status(14_070_000, VfoRole::A, false, false), &xvtr, &sink, t0);
        vfo.apply_status(&status(12_000, VfoRole::A, false, false), &xvtr, &sink, later(t0, 20));
        assert_eq!(vfo.raw_frequency(VfoRole::A), Some(14_070_000));

        vfo.apply_status(&status(301_000_000, VfoRole::A, false, false), &xvtr, &sink, later(t0, 40));
        assert_eq!(vfo.raw_frequency(VfoRole::A), Some(14_070_000));
    }

    #[test]
    fn test_memory_channel_change_triggers_request() {
        let sink = RecordingSink::new();
        let xvtr = Transverter::new();
        let mut vfo = VfoReconciler::new();
        let t0 = Instant::now();

        let mut st = status(14_070_000, VfoRole::Memory, false, false);
        st.memory_channel = 12;
        let follow = vfo.apply_status(&st, &xvtr, &sink, t0);
        assert_eq!(follow.as_deref(), Some("MR0012"));

        // Same channel again: no request
        let follow = vfo.apply_status(&st, &xvtr, &sink, later(t0, 20));
        assert_eq!(follow, None);

        st.memory_channel = 13;
        let follow = vfo.apply_status(&st, &xvtr, &sink, later(t0, 40));
        assert_eq!(follow.as_deref(), Some("MR0013"));
    }

    #[test]
    fn test_transverter_applied_to_display() {
        let sink = RecordingSink::new();
        let mut xvtr = Transverter::new();
        xvtr.set_mix_enabled(true);
        xvtr.record_offset(116_000_000, false);

        let mut vfo = VfoReconciler::new();
        vfo.apply_frequency(VfoRole::A, 28_000_000, &xvtr, &sink, Instant::now());
        assert_eq!(vfo.last_display().unwrap().active_hz, 144_000_000);
    }
}
