//! The simulated radio state machine

use std::collections::VecDeque;

use cat_ts590::{mode_char, mode_code, VfoRole};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for a simulated radio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Powered on at creation
    pub power_on: bool,
    /// Initial VFO A frequency in Hz
    pub vfo_a_hz: u64,
    /// Initial VFO B frequency in Hz
    pub vfo_b_hz: u64,
    /// Initial mode code
    pub mode: u8,
    /// Transverter offset reported on `XO`, as (negative, Hz)
    pub transverter_offset: (bool, u64),
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            power_on: true,
            vfo_a_hz: 14_250_000,
            vfo_b_hz: 7_074_000,
            mode: 2,
            transverter_offset: (false, 0),
        }
    }
}

/// A simulated TS-590SG answering CAT commands from its state
#[derive(Debug)]
pub struct SimRadio {
    power_on: bool,
    vfo_a_hz: u64,
    vfo_b_hz: u64,
    rx_function: VfoRole,
    tx_function: VfoRole,
    transmitting: bool,
    tf_set: bool,
    mode: u8,
    data_mode: bool,
    ai_mode: u8,
    agc: u8,
    s_meter: u8,
    swr: u8,
    comp: u8,
    alc: u8,
    transverter_offset: (bool, u64),
    pending: VecDeque<String>,
}

impl SimRadio {
    /// Create with default state
    pub fn new() -> Self {
        Self::from_config(SimConfig::default())
    }

    /// Create from a configuration
    pub fn from_config(config: SimConfig) -> Self {
        Self {
            power_on: config.power_on,
            vfo_a_hz: config.vfo_a_hz,
            vfo_b_hz: config.vfo_b_hz,
            rx_function: VfoRole::A,
            tx_function: VfoRole::A,
            transmitting: false,
            tf_set: false,
            mode: config.mode,
            data_mode: false,
            ai_mode: 0,
            agc: 5,
            s_meter: 9,
            swr: 3,
            comp: 0,
            alc: 4,
            transverter_offset: config.transverter_offset,
            pending: VecDeque::new(),
        }
    }

    /// Current VFO A frequency
    pub fn vfo_a_hz(&self) -> u64 {
        self.vfo_a_hz
    }

    /// Current VFO B frequency
    pub fn vfo_b_hz(&self) -> u64 {
        self.vfo_b_hz
    }

    /// Currently keyed
    pub fn transmitting(&self) -> bool {
        self.transmitting
    }

    /// Reported auto-info parameter
    pub fn ai_mode(&self) -> u8 {
        self.ai_mode
    }

    /// Set the S-meter reading the radio will report
    pub fn set_s_meter(&mut self, segments: u8) {
        self.s_meter = segments.min(30);
    }

    /// Key or unkey the radio from the "front panel", pushing an
    /// auto-info report when enabled
    pub fn set_transmitting(&mut self, on: bool) {
        if self.transmitting != on {
            self.transmitting = on;
            self.report(if on { "TX0".to_string() } else { "RX".to_string() });
        }
    }

    /// Tune VFO A from the "front panel"
    pub fn tune_vfo_a(&mut self, hz: u64) {
        if self.vfo_a_hz != hz {
            self.vfo_a_hz = hz;
            self.report(format!("FA{:011}", hz));
        }
    }

    /// Take one pending unsolicited/response line, without terminator
    pub fn take_output(&mut self) -> Option<String> {
        self.pending.pop_front()
    }

    /// Whether output is pending
    pub fn has_output(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Handle one terminator-stripped command; responses are queued on the
    /// pending output
    pub fn handle_command(&mut self, cmd: &str) {
        if cmd.len() < 2 {
            return;
        }
        let (prefix, params) = cmd.split_at(2);

        // A powered-down radio only answers the power query
        if !self.power_on && prefix != "PS" {
            return;
        }

        match prefix {
            "PS" => {
                if params.is_empty() {
                    self.answer(format!("PS{}", u8::from(self.power_on)));
                } else {
                    self.power_on = params == "1";
                }
            }
            "ID" => self.answer("ID023".to_string()),
            "AI" => {
                if params.is_empty() {
                    self.answer(format!("AI{}", self.ai_mode));
                } else {
                    self.ai_mode = params.as_bytes()[0].saturating_sub(b'0');
                }
            }
            "FA" => {
                if params.is_empty() {
                    self.answer(format!("FA{:011}", self.vfo_a_hz));
                } else if let Ok(hz) = params.parse::<u64>() {
                    self.vfo_a_hz = hz;
                    self.report(format!("FA{:011}", hz));
                }
            }
            "FB" => {
                if params.is_empty() {
                    self.answer(format!("FB{:011}", self.vfo_b_hz));
                } else if let Ok(hz) = params.parse::<u64>() {
                    self.vfo_b_hz = hz;
                    self.report(format!("FB{:011}", hz));
                }
            }
            "FR" => {
                if params.is_empty() {
                    self.answer(format!("FR{}", self.rx_function.as_digit()));
                } else if let Some(role) = VfoRole::from_ascii(params.as_bytes()[0]) {
                    self.rx_function = role;
                }
            }
            "FT" => {
                if params.is_empty() {
                    self.answer(format!("FT{}", self.tx_function.as_digit()));
                } else if let Some(role) = VfoRole::from_ascii(params.as_bytes()[0]) {
                    self.tx_function = role;
                }
            }
            "IF" => self.answer(self.status_frame()),
            "MD" => {
                if params.is_empty() {
                    if let Some(c) = mode_char(self.mode) {
                        self.answer(format!("MD{}", c));
                    }
                } else if let Some(code) = mode_code(params.as_bytes()[0]) {
                    self.mode = code;
                }
            }
            "DA" => {
                if params.is_empty() {
                    self.answer(format!("DA{}", u8::from(self.data_mode)));
                } else {
                    self.data_mode = params == "1";
                }
            }
            "TS" => {
                if params.is_empty() {
                    self.answer(format!("TS{}", u8::from(self.tf_set)));
                } else {
                    self.tf_set = params == "1";
                }
            }
            "TX" => {
                self.transmitting = true;
                self.report("TX0".to_string());
            }
            "RX" => {
                self.transmitting = false;
                self.report("RX".to_string());
            }
            "GT" => self.answer(format!("GT{:03}", self.agc)),
            "SM" => self.answer(format!("SM0{:04}", self.s_meter)),
            "RM" => match params.chars().next() {
                Some('1') => self.answer(format!("RM1{:04}", self.swr)),
                Some('2') => self.answer(format!("RM2{:04}", self.comp)),
                Some('3') => self.answer(format!("RM3{:04}", self.alc)),
                _ => {}
            },
            "XO" => {
                let (negative, hz) = self.transverter_offset;
                self.answer(format!("XO{}{:011}", u8::from(negative), hz));
            }
            "EX" => {
                if params.starts_with("056") {
                    self.answer("EX05600000".to_string());
                }
            }
            "FV" => self.answer("FV1.04".to_string()),
            "RT" | "XT" | "NB" | "NR" | "BC" | "NT" | "PA" | "VX" | "PR" | "TO" => {
                if params.is_empty() {
                    self.answer(format!("{}0", prefix));
                }
            }
            "AG" | "SQ" => {
                if params == "0" {
                    self.answer(format!("{}0100", prefix));
                }
            }
            "RG" | "PC" | "MG" | "KS" => {
                if params.is_empty() {
                    let value = match prefix {
                        "RG" => 128,
                        "PC" => 100,
                        "MG" => 50,
                        _ => 20,
                    };
                    self.answer(format!("{}{:03}", prefix, value));
                }
            }
            "SH" | "SL" | "TN" => {
                if params.is_empty() {
                    self.answer(format!("{}00", prefix));
                }
            }
            "FL" => {
                if params.is_empty() {
                    self.answer("FL0".to_string());
                }
            }
            "RA" => self.answer("RA00".to_string()),
            "AN" => self.answer("AN100".to_string()),
            _ => debug!(cmd, "sim ignoring command"),
        }
    }

    /// Build the 35-character IF status payload from current state
    fn status_frame(&self) -> String {
        let frequency = match self.rx_function {
            VfoRole::A => self.vfo_a_hz,
            VfoRole::B => self.vfo_b_hz,
            VfoRole::Memory => self.vfo_a_hz,
        };
        let split = self.rx_function != self.tx_function
            && self.rx_function != VfoRole::Memory
            && self.tx_function != VfoRole::Memory;
        format!(
            "IF{:011}{:5}{}{:04}{}{}{:03}{}{}{}{}{}{}{:02}{}",
            frequency,
            "",
            ' ', // positive RIT/XIT offset sign
            0,
            0, // RIT off
            0, // XIT off
            0, // memory channel
            u8::from(self.transmitting),
            mode_char(self.mode).unwrap_or('0'),
            self.rx_function.as_digit(),
            0, // not scanning
            u8::from(split),
            0, // tone off
            0, // tone number
            0, // reserved
        )
    }

    fn answer(&mut self, response: String) {
        self.pending.push_back(response);
    }

    /// Push an unsolicited report when auto-info is enabled
    fn report(&mut self, response: String) {
        if self.ai_mode >= 2 {
            self.pending.push_back(response);
        }
    }
}

impl Default for SimRadio {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_query() {
        let mut radio = SimRadio::new();
        radio.handle_command("FA");
        assert_eq!(radio.take_output().as_deref(), Some("FA00014250000"));
    }

    #[test]
    fn test_frequency_set_reports_with_ai() {
        let mut radio = SimRadio::new();
        radio.handle_command("FA00007074000");
        assert!(!radio.has_output(), "no report with AI off");
        assert_eq!(radio.vfo_a_hz(), 7_074_000);

        radio.handle_command("AI2");
        radio.handle_command("FA00014074000");
        assert_eq!(radio.take_output().as_deref(), Some("FA00014074000"));
    }

    #[test]
    fn test_status_frame_is_parseable() {
        let mut radio = SimRadio::new();
        radio.handle_command("IF");
        let frame = radio.take_output().unwrap();
        assert_eq!(frame.len(), 37, "IF + 35 payload chars");

        let event = cat_ts590::decode_command(&frame).unwrap();
        let cat_ts590::CatEvent::Status(status) = event else {
            panic!("not a status frame: {:?}", event)
        };
        assert_eq!(status.frequency_hz, 14_250_000);
        assert!(!status.transmitting);
        assert_eq!(status.function, Some(VfoRole::A));
    }

    #[test]
    fn test_split_reported_in_status() {
        let mut radio = SimRadio::new();
        radio.handle_command("FT1");
        radio.handle_command("IF");
        let frame = radio.take_output().unwrap();
        let cat_ts590::CatEvent::Status(status) = cat_ts590::decode_command(&frame).unwrap()
        else {
            panic!()
        };
        assert!(status.split);
    }

    #[test]
    fn test_powered_down_only_answers_ps() {
        let mut radio = SimRadio::from_config(SimConfig { power_on: false, ..Default::default() });
        radio.handle_command("FA");
        assert!(!radio.has_output());

        radio.handle_command("PS");
        assert_eq!(radio.take_output().as_deref(), Some("PS0"));

        radio.handle_command("PS1");
        radio.handle_command("FA");
        assert!(radio.has_output());
    }

    #[test]
    fn test_id_and_meters() {
        let mut radio = SimRadio::new();
        radio.handle_command("ID");
        assert_eq!(radio.take_output().as_deref(), Some("ID023"));

        radio.set_s_meter(21);
        radio.handle_command("SM0");
        assert_eq!(radio.take_output().as_deref(), Some("SM00021"));

        radio.handle_command("RM2");
        assert_eq!(radio.take_output().as_deref(), Some("RM20000"));
    }

    #[test]
    fn test_front_panel_key_reports() {
        let mut radio = SimRadio::new();
        radio.handle_command("AI2");
        radio.set_transmitting(true);
        assert_eq!(radio.take_output().as_deref(), Some("TX0"));
        radio.set_transmitting(false);
        assert_eq!(radio.take_output().as_deref(), Some("RX"));
    }
}
