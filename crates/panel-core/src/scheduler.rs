//! Polling and boot-sequence scheduling
//!
//! Decides, independently of decoding, what gets transmitted to the radio
//! and when. The actor owns the timers; this module owns the state machines
//! they advance, so the "exactly one outstanding sequence at a time"
//! invariant is checkable in plain unit tests.
//!
//! Gating: every steady-state tick re-checks two independent booleans right
//! before producing a command - "polling enabled" (a pure function of the
//! user override, nothing else) and "connection active" (rolling inactivity
//! timeout). A closed gate never cancels a timer; the tick is simply a
//! no-op.

use std::time::{Duration, Instant};

use cat_ts590::AiMode;
use tracing::{debug, info};

/// Inbound silence after which the link is considered down
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Pacing gap between boot/re-poll commands (~25 commands/second)
pub const PACE_INTERVAL: Duration = Duration::from_millis(40);

/// Steady-state poll cadences
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(150);
/// S-meter poll cadence
pub const SMETER_POLL_INTERVAL: Duration = Duration::from_millis(300);
/// Per-step cadence of the 3-way cycling meter query
pub const METER_CYCLE_INTERVAL: Duration = Duration::from_millis(100);
/// RX-VFO function poll cadence
pub const RX_VFO_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Per-VFO frequency poll cadence
pub const VFO_POLL_INTERVAL: Duration = Duration::from_millis(250);
/// TX-VFO function poll cadence
pub const TX_VFO_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// AGC query retry cadence
pub const AGC_RETRY_INTERVAL: Duration = Duration::from_secs(1);
/// Full re-poll cadence
pub const REPOLL_INTERVAL: Duration = Duration::from_secs(300);

/// The ordered query list sent once per power-on, and re-issued by the
/// periodic full re-poll to correct drift from missed events
pub const BOOT_SEQUENCE: [&str; 38] = [
    "PS", "ID", "AI", "FA", "FB", "FR", "FT", "IF", "MD", "DA", "TS", "RT", "XT", "AG0", "RG",
    "SQ0", "PC", "MG", "KS", "VX", "PR", "NB", "NR", "BC", "NT", "PA", "RA", "AN", "GT", "SH",
    "SL", "FL", "TN", "TO", "XO", "EX0560000", "FV", "SM0",
];

/// Boot sequence lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootPhase {
    /// Waiting for a power-on observation
    Idle,
    /// Emitting the query list; the index is the next command to send
    Running(usize),
    /// Sequence exhausted; stays here until a power-off observation
    Done,
}

/// Scheduler session state
#[derive(Debug)]
pub struct PollScheduler {
    boot: BootPhase,
    repoll: Option<usize>,
    meter_step: u8,
    polling_override: bool,
    power_on: bool,
    connection_active: bool,
    last_inbound: Option<Instant>,
    ai_expected: AiMode,
    ai_reported: AiMode,
    agc_seen: bool,
}

impl PollScheduler {
    /// Fresh session: everything idle, gates closed
    pub fn new() -> Self {
        Self {
            boot: BootPhase::Idle,
            repoll: None,
            meter_step: 0,
            polling_override: false,
            power_on: false,
            connection_active: false,
            last_inbound: None,
            ai_expected: AiMode::Unknown,
            ai_reported: AiMode::Unknown,
            agc_seen: false,
        }
    }

    /// Effective polling enable
    ///
    /// Deliberately a pure function of the user override alone; the
    /// auto-info mode does not gate polling.
    pub fn polling_enabled(&self) -> bool {
        self.polling_override
    }

    /// Set the user polling override
    pub fn set_polling_override(&mut self, enabled: bool) {
        self.polling_override = enabled;
    }

    /// Link considered alive
    pub fn connection_active(&self) -> bool {
        self.connection_active
    }

    /// Current boot phase
    pub fn boot_phase(&self) -> BootPhase {
        self.boot
    }

    /// Last reported auto-info mode
    pub fn ai_reported(&self) -> AiMode {
        self.ai_reported
    }

    /// Record inbound traffic; any valid traffic revives the link
    pub fn note_inbound(&mut self, now: Instant) {
        self.last_inbound = Some(now);
        if !self.connection_active {
            info!("radio link active");
            self.connection_active = true;
        }
    }

    /// Periodic link check against the inactivity timeout
    pub fn check_connection(&mut self, now: Instant) {
        if !self.connection_active {
            return;
        }
        let silent = match self.last_inbound {
            Some(at) => now.duration_since(at) > CONNECTION_TIMEOUT,
            None => true,
        };
        if silent {
            info!("radio link lost: no traffic within timeout");
            self.connection_active = false;
        }
    }

    /// Fold in a `PS` power-status observation
    ///
    /// Power-on while idle starts the boot sequence; power-off always
    /// resets to idle, so a cancelled run is re-run in full later. Power-on
    /// after a completed run does nothing until an intervening power-off.
    pub fn on_power_status(&mut self, on: bool) {
        self.power_on = on;
        if on {
            if self.boot == BootPhase::Idle {
                info!("power on: starting boot sequence");
                self.boot = BootPhase::Running(0);
            }
        } else {
            if matches!(self.boot, BootPhase::Running(_)) {
                info!("power off mid-boot: cancelling sequence");
            }
            self.boot = BootPhase::Idle;
        }
    }

    /// Fold in an `AI` mode report
    ///
    /// When the radio reports something other than the expected "on"
    /// variant, the expected mode is re-asserted; the locally recorded mode
    /// is not overwritten until the radio confirms it, so a single stale
    /// report cannot oscillate the state.
    pub fn on_ai_report(&mut self, reported: AiMode) -> Option<&'static str> {
        if reported == self.ai_expected || !self.ai_expected.is_on() {
            self.ai_reported = reported;
            return None;
        }
        debug!(?reported, expected = ?self.ai_expected, "AI mode mismatch, re-asserting");
        self.ai_expected.set_command()
    }

    /// Record the AI mode the panel just asserted
    pub fn set_ai_expected(&mut self, mode: AiMode) {
        self.ai_expected = mode;
    }

    /// Fold in any AGC report: stops the retry loop
    pub fn on_agc_report(&mut self) {
        self.agc_seen = true;
    }

    /// Pacing tick: next boot or re-poll command, if a sequence is running
    ///
    /// Boot takes precedence; a re-poll never interleaves with it. Both
    /// require the link; boot is not gated on the polling override, and the
    /// re-poll deliberately ignores it too.
    pub fn pace_tick(&mut self) -> Option<String> {
        if !self.connection_active {
            return None;
        }
        if let BootPhase::Running(index) = self.boot {
            let cmd = BOOT_SEQUENCE[index];
            self.boot = if index + 1 >= BOOT_SEQUENCE.len() {
                info!("boot sequence complete");
                BootPhase::Done
            } else {
                BootPhase::Running(index + 1)
            };
            return Some(cmd.to_string());
        }
        if let Some(index) = self.repoll {
            let cmd = BOOT_SEQUENCE[index];
            self.repoll = if index + 1 >= BOOT_SEQUENCE.len() {
                debug!("periodic re-poll complete");
                None
            } else {
                Some(index + 1)
            };
            return Some(cmd.to_string());
        }
        None
    }

    /// 5-minute timer fired: queue a full re-poll if the link is up and no
    /// sequence is already in flight
    pub fn start_repoll(&mut self) {
        if self.connection_active && self.repoll.is_none() && !matches!(self.boot, BootPhase::Running(_)) {
            debug!("starting periodic re-poll");
            self.repoll = Some(0);
        }
    }

    fn gated(&self) -> Option<()> {
        (self.polling_enabled() && self.connection_active).then_some(())
    }

    /// Status poll tick (`IF`)
    pub fn status_tick(&mut self) -> Option<&'static str> {
        self.gated().map(|_| "IF")
    }

    /// S-meter poll tick
    pub fn smeter_tick(&mut self) -> Option<&'static str> {
        self.gated().map(|_| "SM0")
    }

    /// 3-way cycling meter tick: SWR, COMP, ALC in turn
    pub fn meter_tick(&mut self) -> Option<&'static str> {
        self.gated()?;
        let cmd = match self.meter_step {
            0 => "RM1",
            1 => "RM2",
            _ => "RM3",
        };
        self.meter_step = (self.meter_step + 1) % 3;
        Some(cmd)
    }

    /// RX-VFO function poll tick
    pub fn rx_vfo_tick(&mut self) -> Option<&'static str> {
        self.gated().map(|_| "FR")
    }

    /// VFO A frequency poll tick
    pub fn vfo_a_tick(&mut self) -> Option<&'static str> {
        self.gated().map(|_| "FA")
    }

    /// VFO B frequency poll tick
    pub fn vfo_b_tick(&mut self) -> Option<&'static str> {
        self.gated().map(|_| "FB")
    }

    /// TX-VFO function poll tick
    pub fn tx_vfo_tick(&mut self) -> Option<&'static str> {
        self.gated().map(|_| "FT")
    }

    /// AGC retry tick: re-query until any AGC response is observed
    pub fn agc_tick(&mut self) -> Option<&'static str> {
        self.gated()?;
        if self.agc_seen {
            None
        } else {
            Some("GT")
        }
    }

    /// Explicit stop: reset the whole session
    pub fn stop(&mut self) {
        self.boot = BootPhase::Idle;
        self.repoll = None;
        self.meter_step = 0;
        self.polling_override = false;
        self.power_on = false;
        self.connection_active = false;
        self.last_inbound = None;
        self.ai_expected = AiMode::Unknown;
        self.ai_reported = AiMode::Unknown;
        self.agc_seen = false;
    }
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new()
    }
}
