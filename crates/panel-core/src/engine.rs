//! The panel engine: decode-worker state and event routing
//!
//! [`Engine`] is the single writer of all reconciled radio state. The actor
//! feeds it framed commands and timer ticks; it mutates state, publishes
//! through the sink, and returns any follow-up commands for the outbound
//! queue. It performs no I/O itself and never blocks.

use std::sync::Arc;
use std::time::Instant;

use cat_ts590::{decode_command, encode, AiMode, CatEvent, MenuItem, ParseError, VfoRole};
use tracing::debug;

use crate::antenna::{AntennaEvent, AntennaRequest, AntennaSystem};
use crate::error::EngineError;
use crate::scheduler::PollScheduler;
use crate::sink::{BlobValue, StatusSink, Topic};
use crate::storage::NameStore;
use crate::transverter::Transverter;
use crate::vfo::VfoReconciler;

/// Decode-worker state: reconciler, transverter, antenna cache, scheduler
pub struct Engine {
    sink: Arc<dyn StatusSink>,
    vfo: VfoReconciler,
    xvtr: Transverter,
    antenna: AntennaSystem,
    sched: PollScheduler,
}

impl Engine {
    /// Create an engine publishing through the given sink
    pub fn new(sink: Arc<dyn StatusSink>) -> Self {
        Self {
            sink,
            vfo: VfoReconciler::new(),
            xvtr: Transverter::new(),
            antenna: AntennaSystem::new(),
            sched: PollScheduler::new(),
        }
    }

    /// The VFO reconciler, read-only
    pub fn vfo(&self) -> &VfoReconciler {
        &self.vfo
    }

    /// The transverter state, read-only
    pub fn transverter(&self) -> &Transverter {
        &self.xvtr
    }

    /// The antenna cache, read-only
    pub fn antenna(&self) -> &AntennaSystem {
        &self.antenna
    }

    /// The scheduler session, read-only
    pub fn scheduler(&self) -> &PollScheduler {
        &self.sched
    }

    // -----------------------------------------------------------------------
    // Decode path
    // -----------------------------------------------------------------------

    /// Decode and fold in one framed command
    ///
    /// Returns follow-up commands to enqueue. Malformed input logs and
    /// yields nothing; it never corrupts already-validated state.
    pub fn handle_command(&mut self, cmd: &str, now: Instant) -> Vec<String> {
        self.sched.note_inbound(now);

        match decode_command(cmd) {
            Ok(event) => self.handle_event(event, now),
            Err(ParseError::UnknownCommand(prefix)) => {
                debug!(%prefix, "unmapped command ignored");
                Vec::new()
            }
            Err(e) => {
                debug!(cmd, error = %e, "decode failed");
                Vec::new()
            }
        }
    }

    /// Fold in one decoded event
    pub fn handle_event(&mut self, event: CatEvent, now: Instant) -> Vec<String> {
        let sink = Arc::clone(&self.sink);
        let sink = sink.as_ref();
        let mut follow_ups = Vec::new();

        match event {
            CatEvent::Status(status) => {
                if let Some(cmd) = self.vfo.apply_status(&status, &self.xvtr, sink, now) {
                    follow_ups.push(cmd);
                }
            }
            CatEvent::VfoAFrequency(hz) => {
                self.vfo.apply_frequency(VfoRole::A, hz, &self.xvtr, sink, now);
            }
            CatEvent::VfoBFrequency(hz) => {
                self.vfo.apply_frequency(VfoRole::B, hz, &self.xvtr, sink, now);
            }
            CatEvent::RxFunction(role) => {
                self.vfo.apply_rx_function(role, &self.xvtr, sink, now);
            }
            CatEvent::TxFunction(role) => {
                self.vfo.apply_tx_function(role, &self.xvtr, sink, now);
            }
            CatEvent::Transmit(on) => {
                self.vfo.apply_transmit(on, &self.xvtr, sink, now);
                self.antenna.set_transmitting(on);
            }
            CatEvent::TfSet(on) => {
                self.vfo.apply_tf_set(on, &self.xvtr, sink, now);
            }

            CatEvent::Power(on) => {
                self.sched.on_power_status(on);
                sink.publish_scalar(Topic::PowerStatus, i64::from(on));
            }
            CatEvent::AutoInfo(mode) => {
                if let Some(recovery) = self.sched.on_ai_report(mode) {
                    follow_ups.push(recovery.to_string());
                }
                sink.publish_scalar(Topic::AiMode, mode as i64);
            }
            CatEvent::Agc(value) => {
                self.sched.on_agc_report();
                sink.publish_scalar(Topic::Agc, i64::from(value));
            }

            CatEvent::Mode(code) => sink.publish_scalar(Topic::Mode, i64::from(code)),
            CatEvent::DataMode(on) => sink.publish_scalar(Topic::DataMode, i64::from(on)),
            CatEvent::SMeter(v) => sink.publish_scalar(Topic::SMeter, i64::from(v)),
            CatEvent::Swr { segments, calibrated } => {
                sink.publish_scalar(Topic::SwrRaw, i64::from(segments));
                sink.publish_scalar(Topic::Swr, (calibrated * 100.0).round() as i64);
            }
            CatEvent::Comp(v) => sink.publish_scalar(Topic::Comp, i64::from(v)),
            CatEvent::Alc(v) => sink.publish_scalar(Topic::Alc, i64::from(v)),
            CatEvent::Attenuator(v) => sink.publish_scalar(Topic::Attenuator, i64::from(v)),
            CatEvent::AfGain(v) => sink.publish_scalar(Topic::AfGain, i64::from(v)),
            CatEvent::RfGain(v) => sink.publish_scalar(Topic::RfGain, i64::from(v)),
            CatEvent::Squelch(v) => sink.publish_scalar(Topic::Squelch, i64::from(v)),
            CatEvent::PowerControl(v) => sink.publish_scalar(Topic::PowerControl, i64::from(v)),
            CatEvent::MicGain(v) => sink.publish_scalar(Topic::MicGain, i64::from(v)),
            CatEvent::KeySpeed(v) => sink.publish_scalar(Topic::KeySpeed, i64::from(v)),
            CatEvent::Rit(on) => sink.publish_scalar(Topic::Rit, i64::from(on)),
            CatEvent::Xit(on) => sink.publish_scalar(Topic::Xit, i64::from(on)),
            CatEvent::NoiseBlanker(v) => sink.publish_scalar(Topic::NoiseBlanker, i64::from(v)),
            CatEvent::NoiseReduction(v) => {
                sink.publish_scalar(Topic::NoiseReduction, i64::from(v))
            }
            CatEvent::BeatCancel(v) => sink.publish_scalar(Topic::BeatCancel, i64::from(v)),
            CatEvent::Notch(on) => sink.publish_scalar(Topic::Notch, i64::from(on)),
            CatEvent::Preamp(on) => sink.publish_scalar(Topic::Preamp, i64::from(on)),
            CatEvent::Vox(on) => sink.publish_scalar(Topic::Vox, i64::from(on)),
            CatEvent::Processor(on) => sink.publish_scalar(Topic::Processor, i64::from(on)),
            CatEvent::FilterHigh(v) => sink.publish_scalar(Topic::FilterHigh, i64::from(v)),
            CatEvent::FilterLow(v) => sink.publish_scalar(Topic::FilterLow, i64::from(v)),
            CatEvent::RoofingFilter(v) => sink.publish_scalar(Topic::RoofingFilter, i64::from(v)),
            CatEvent::ToneNumber(v) => sink.publish_scalar(Topic::ToneNumber, i64::from(v)),
            CatEvent::ToneOn(on) => sink.publish_scalar(Topic::ToneOn, i64::from(on)),

            CatEvent::Identity(id) => {
                sink.publish_blob(Topic::Identity, &BlobValue::Text(id));
            }
            CatEvent::FirmwareVersion(v) => {
                sink.publish_blob(Topic::FirmwareVersion, &BlobValue::Text(v));
            }
            CatEvent::Microcode(v) => {
                sink.publish_blob(Topic::Microcode, &BlobValue::Text(v));
            }

            CatEvent::Memory(record) => {
                sink.publish_blob(Topic::MemoryChannel, &BlobValue::Memory(record));
            }
            CatEvent::AntennaSelect { antenna, rx_antenna, drive_out } => {
                sink.publish_scalar(Topic::AntennaConnector, i64::from(antenna));
                sink.publish_scalar(Topic::RxAntenna, i64::from(rx_antenna));
                sink.publish_scalar(Topic::DriveOut, i64::from(drive_out));
            }
            CatEvent::TxInfo { frequency_hz, .. } => {
                let display = self.xvtr.display_from_radio(frequency_hz);
                sink.publish_scalar(Topic::TxFrequency, display as i64);
            }

            CatEvent::TransverterOffset { offset_hz, negative } => {
                self.xvtr.record_offset(offset_hz, negative);
                sink.publish_blob(
                    Topic::TransverterOffset,
                    &BlobValue::TransverterOffset(self.xvtr.offset()),
                );
                // Translation changed: displayed frequencies are candidates
                // for re-publication through the usual gates
                self.vfo.publish_display(&self.xvtr, sink, now);
            }
            CatEvent::Menu(MenuItem::TransverterTranslation { enabled, power_down }) => {
                self.xvtr.record_enable(enabled, power_down);
                sink.publish_blob(
                    Topic::TransverterEnable,
                    &BlobValue::TransverterEnable(self.xvtr.enable()),
                );
                self.vfo.publish_display(&self.xvtr, sink, now);
            }
            CatEvent::Menu(item) => self.publish_menu_item(sink, item),

            CatEvent::Macro(n) => sink.publish_scalar(Topic::Macro, i64::from(n)),
            CatEvent::Backlight(v) => sink.publish_scalar(Topic::Backlight, i64::from(v)),
            CatEvent::Page(v) => sink.publish_scalar(Topic::Page, i64::from(v)),
            CatEvent::VersionQuery => sink.notify(Topic::PanelVersion),
        }

        follow_ups
    }

    fn publish_menu_item(&self, sink: &dyn StatusSink, item: MenuItem) {
        match item {
            MenuItem::PowerOnMessage(text) => {
                sink.publish_blob(Topic::MenuItem, &BlobValue::Text(text))
            }
            MenuItem::BeepLevel(v)
            | MenuItem::SidetoneLevel(v)
            | MenuItem::QuickMemories(v)
            | MenuItem::BacklightColor(v)
            | MenuItem::TxTimeout(v)
            | MenuItem::CatBaudRate(v) => sink.publish_scalar(Topic::MenuItem, i64::from(v)),
            MenuItem::AutoMode(on) | MenuItem::MeterPeakHold(on) => {
                sink.publish_scalar(Topic::MenuItem, i64::from(on))
            }
            // Handled before dispatching here
            MenuItem::TransverterTranslation { .. } => {}
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle and user actions
    // -----------------------------------------------------------------------

    /// Start a session: learn power state, assert auto-info reporting
    pub fn start(&mut self) -> Vec<String> {
        let mut cmds = vec!["PS".to_string()];
        if let Some(ai) = self.assert_auto_info(AiMode::On) {
            cmds.push(ai);
        }
        cmds
    }

    /// Stop the session and reset scheduler state
    pub fn stop(&mut self) {
        self.sched.stop();
    }

    /// Set the user polling override
    pub fn set_polling_enabled(&mut self, on: bool) {
        self.sched.set_polling_override(on);
    }

    /// Assert an auto-info mode on the radio, recording the expectation for
    /// the mismatch-recovery loop
    pub fn assert_auto_info(&mut self, mode: AiMode) -> Option<String> {
        let cmd = encode::set_auto_info(mode)?;
        self.sched.set_ai_expected(mode);
        Some(cmd.to_string())
    }

    /// Flip the local transverter mix toggle
    pub fn set_mix_offset(&mut self, on: bool, now: Instant) {
        self.xvtr.set_mix_enabled(on);
        self.vfo.publish_display(&self.xvtr, self.sink.as_ref(), now);
    }

    // -----------------------------------------------------------------------
    // Scheduler ticks (called from the actor's timers)
    // -----------------------------------------------------------------------

    /// Status poll tick
    pub fn status_tick(&mut self) -> Option<&'static str> {
        self.sched.status_tick()
    }

    /// S-meter poll tick
    pub fn smeter_tick(&mut self) -> Option<&'static str> {
        self.sched.smeter_tick()
    }

    /// Cycling meter tick
    pub fn meter_tick(&mut self) -> Option<&'static str> {
        self.sched.meter_tick()
    }

    /// RX-VFO poll tick
    pub fn rx_vfo_tick(&mut self) -> Option<&'static str> {
        self.sched.rx_vfo_tick()
    }

    /// VFO A poll tick
    pub fn vfo_a_tick(&mut self) -> Option<&'static str> {
        self.sched.vfo_a_tick()
    }

    /// VFO B poll tick
    pub fn vfo_b_tick(&mut self) -> Option<&'static str> {
        self.sched.vfo_b_tick()
    }

    /// TX-VFO poll tick
    pub fn tx_vfo_tick(&mut self) -> Option<&'static str> {
        self.sched.tx_vfo_tick()
    }

    /// AGC retry tick
    pub fn agc_tick(&mut self) -> Option<&'static str> {
        self.sched.agc_tick()
    }

    /// Boot/re-poll pacing tick
    pub fn pace_tick(&mut self) -> Option<String> {
        self.sched.pace_tick()
    }

    /// 5-minute re-poll timer fired
    pub fn repoll_due(&mut self) {
        self.sched.start_repoll();
    }

    /// Link inactivity check
    pub fn check_connection(&mut self, now: Instant) {
        self.sched.check_connection(now);
    }

    // -----------------------------------------------------------------------
    // Antenna system
    // -----------------------------------------------------------------------

    /// Fold in a server-pushed antenna event and republish the snapshot
    pub fn apply_antenna_event(&mut self, event: &AntennaEvent) {
        if self.antenna.apply_event(event) {
            self.publish_antenna();
        }
    }

    /// Aggregate antenna select
    pub fn select_antenna(&mut self, id: u8) -> Result<AntennaRequest, EngineError> {
        self.antenna.select(id)
    }

    /// Aggregate select failed: fall back to individual relay toggles
    pub fn antenna_select_failed(&mut self, id: u8) -> Result<Vec<AntennaRequest>, EngineError> {
        self.antenna.begin_fallback(id)
    }

    /// All individual fallback commands have completed or failed
    pub fn antenna_fallback_complete(&mut self) {
        if self.antenna.finish_fallback() {
            self.publish_antenna();
        }
    }

    /// Load persisted antenna names, if any
    pub fn load_antenna_names(&mut self, store: &dyn NameStore) -> Result<(), EngineError> {
        if let Some(blob) = store.load()? {
            self.antenna_names_from_blob(&blob)?;
        }
        Ok(())
    }

    /// Restore antenna names from an already-loaded blob
    pub fn antenna_names_from_blob(&mut self, blob: &[u8]) -> Result<(), EngineError> {
        self.antenna.load_names_blob(blob)?;
        self.publish_antenna();
        Ok(())
    }

    /// Persist the current antenna names
    pub fn save_antenna_names(&self, store: &dyn NameStore) -> Result<(), EngineError> {
        store.save(&self.antenna.names_blob()?)?;
        Ok(())
    }

    fn publish_antenna(&self) {
        self.sink
            .publish_blob(Topic::AntennaState, &BlobValue::Antenna(self.antenna.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{Publication, RecordingSink};
    use std::time::Duration;

    fn engine_with_sink() -> (Engine, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let dyn_sink: Arc<dyn StatusSink> = sink.clone();
        (Engine::new(dyn_sink), sink)
    }

    fn scalar_values(sink: &RecordingSink, topic: Topic) -> Vec<i64> {
        sink.for_topic(topic)
            .into_iter()
            .filter_map(|p| match p {
                Publication::Scalar { value, .. } => Some(value),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_meter_events_touch_only_their_topic() {
        let (mut engine, sink) = engine_with_sink();
        let t0 = Instant::now();

        engine.handle_command("RM10015", t0);
        assert_eq!(scalar_values(&sink, Topic::SwrRaw), vec![15]);
        assert_eq!(scalar_values(&sink, Topic::Swr), vec![170]);
        assert_eq!(sink.count(Topic::Comp), 0);
        assert_eq!(sink.count(Topic::Alc), 0);

        engine.handle_command("RM20025", t0);
        assert_eq!(scalar_values(&sink, Topic::Comp), vec![25]);
        assert_eq!(sink.count(Topic::Alc), 0);

        engine.handle_command("RM30010", t0);
        assert_eq!(scalar_values(&sink, Topic::Alc), vec![10]);
    }

    #[test]
    fn test_meter_clamped_before_publication() {
        let (mut engine, sink) = engine_with_sink();
        engine.handle_command("RM20099", Instant::now());
        assert_eq!(scalar_values(&sink, Topic::Comp), vec![30]);
    }

    #[test]
    fn test_malformed_input_publishes_nothing() {
        let (mut engine, sink) = engine_with_sink();
        let t0 = Instant::now();

        assert!(engine.handle_command("FA0001407400", t0).is_empty());
        assert!(engine.handle_command("ZZ99", t0).is_empty());
        assert!(engine.handle_command("F", t0).is_empty());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_inbound_traffic_revives_link() {
        let (mut engine, _sink) = engine_with_sink();
        assert!(!engine.scheduler().connection_active());
        engine.handle_command("PS1", Instant::now());
        assert!(engine.scheduler().connection_active());
    }

    #[test]
    fn test_power_on_starts_boot() {
        let (mut engine, _sink) = engine_with_sink();
        engine.handle_command("PS1", Instant::now());
        assert!(engine.pace_tick().is_some());
    }

    #[test]
    fn test_ai_mismatch_reasserts() {
        let (mut engine, _sink) = engine_with_sink();
        let t0 = Instant::now();
        assert_eq!(engine.assert_auto_info(AiMode::On).as_deref(), Some("AI2"));

        // Radio confirms: nothing to do
        assert!(engine.handle_command("AI2", t0).is_empty());

        // Radio reports off: re-assert the expected mode
        let follow = engine.handle_command("AI0", t0);
        assert_eq!(follow, vec!["AI2".to_string()]);
    }

    #[test]
    fn test_transverter_offset_republishes_display() {
        let (mut engine, sink) = engine_with_sink();
        let t0 = Instant::now();
        engine.set_mix_offset(true, t0);

        engine.handle_command("FA00028000000", t0);
        let displays = sink.count(Topic::VfoDisplay);

        // New offset record arrives: display recomputed and republished
        engine.handle_command("XO000116000000", t0 + Duration::from_millis(20));
        assert_eq!(sink.count(Topic::VfoDisplay), displays + 1);

        let last = sink.for_topic(Topic::VfoDisplay).pop().unwrap();
        let Publication::Blob { value: BlobValue::VfoDisplay(d), .. } = last else {
            panic!("expected display blob")
        };
        assert_eq!(d.active_hz, 144_000_000);
    }

    #[test]
    fn test_radio_side_translation_disables_mix() {
        let (mut engine, sink) = engine_with_sink();
        let t0 = Instant::now();
        engine.set_mix_offset(true, t0);
        engine.handle_command("XO000116000000", t0);
        engine.handle_command("FA00028000000", t0 + Duration::from_millis(20));

        // Radio-side translation on: the local offset must stop applying
        engine.handle_command("EX05600001", t0 + Duration::from_millis(40));
        let last = sink.for_topic(Topic::VfoDisplay).pop().unwrap();
        let Publication::Blob { value: BlobValue::VfoDisplay(d), .. } = last else {
            panic!("expected display blob")
        };
        assert_eq!(d.active_hz, 28_000_000, "offset must not double-count");
    }

    #[test]
    fn test_antenna_event_publishes_snapshot() {
        let (mut engine, sink) = engine_with_sink();
        engine.apply_antenna_event(&AntennaEvent::Status { active: 3, available: vec![3] });
        assert_eq!(sink.count(Topic::AntennaState), 1);
        assert_eq!(engine.antenna().active, 3);

        // No change, no publication
        engine.apply_antenna_event(&AntennaEvent::Status { active: 3, available: vec![3] });
        assert_eq!(sink.count(Topic::AntennaState), 1);
    }

    #[test]
    fn test_start_asserts_auto_info() {
        let (mut engine, _sink) = engine_with_sink();
        assert_eq!(engine.start(), vec!["PS".to_string(), "AI2".to_string()]);
    }
}
