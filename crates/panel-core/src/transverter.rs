//! Transverter frequency translation
//!
//! A transverter up/down-converts the radio's tunable range to another
//! band, so the frequency the radio's PLL is tuned to and the frequency a
//! human expects to see differ by a fixed offset. The offset is applied
//! only when all three conditions hold:
//!
//! 1. the local "mix offset" toggle is enabled,
//! 2. the most recent `XO` offset record is valid,
//! 3. the radio-side translation feature (menu 056) is NOT enabled.
//!
//! Condition 3 is a hard invariant: if the radio already translates,
//! applying the offset here again would double-count it.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Last observed `XO` transverter offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OffsetRecord {
    /// Offset magnitude in Hz
    pub offset_hz: u64,
    /// Subtract instead of add when going radio -> display
    pub negative: bool,
    /// An `XO` frame has been decoded since startup
    pub valid: bool,
}

/// Last observed radio-side translation state (menu 056)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnableRecord {
    /// Radio applies the translation itself
    pub enabled: bool,
    /// Translation with exciter power-down
    pub power_down: bool,
    /// A menu-056 frame has been decoded since startup
    pub valid: bool,
}

/// Transverter state and the radio<->display frequency transforms
#[derive(Debug, Clone, Copy, Default)]
pub struct Transverter {
    offset: OffsetRecord,
    enable: EnableRecord,
    mix_enabled: bool,
}

impl Transverter {
    /// Create with no valid records and the mix toggle off
    pub fn new() -> Self {
        Self::default()
    }

    /// The current offset record
    pub fn offset(&self) -> OffsetRecord {
        self.offset
    }

    /// The current enable record
    pub fn enable(&self) -> EnableRecord {
        self.enable
    }

    /// Whether the local mix toggle is on
    pub fn mix_enabled(&self) -> bool {
        self.mix_enabled
    }

    /// Flip the local mix toggle
    pub fn set_mix_enabled(&mut self, on: bool) {
        self.mix_enabled = on;
    }

    /// Record a decoded `XO` offset; marks the record valid
    pub fn record_offset(&mut self, offset_hz: u64, negative: bool) {
        self.offset = OffsetRecord { offset_hz, negative, valid: true };
    }

    /// Record a decoded menu-056 state; marks the record valid
    pub fn record_enable(&mut self, enabled: bool, power_down: bool) {
        self.enable = EnableRecord { enabled, power_down, valid: true };
    }

    /// Whether the offset arithmetic is currently applied
    pub fn applies(&self) -> bool {
        self.mix_enabled && self.offset.valid && !(self.enable.valid && self.enable.enabled)
    }

    /// Forward transform: radio-side frequency to display-side
    ///
    /// Underflow floors at zero rather than wrapping.
    pub fn display_from_radio(&self, hz: u64) -> u64 {
        if !self.applies() {
            return hz;
        }
        if self.negative_direction() {
            hz.checked_sub(self.offset.offset_hz).unwrap_or_else(|| {
                warn!(hz, offset = self.offset.offset_hz, "transverter underflow, floored to 0");
                0
            })
        } else {
            hz + self.offset.offset_hz
        }
    }

    /// Inverse transform: display-side frequency back to radio-side
    ///
    /// Exact algebraic inverse of the forward transform, with the same
    /// underflow floor.
    pub fn radio_from_display(&self, hz: u64) -> u64 {
        if !self.applies() {
            return hz;
        }
        if self.negative_direction() {
            hz + self.offset.offset_hz
        } else {
            hz.checked_sub(self.offset.offset_hz).unwrap_or_else(|| {
                warn!(hz, offset = self.offset.offset_hz, "transverter underflow, floored to 0");
                0
            })
        }
    }

    fn negative_direction(&self) -> bool {
        self.offset.negative
    }
}
