//! Outbound command formatting
//!
//! Commands are built here without their terminator; the writer appends the
//! `;` when framing for the wire. All numeric fields are fixed-width
//! zero-padded ASCII decimal, matching the radio's documented layouts
//! bit-for-bit.

use crate::error::ParseError;
use crate::types::{mode_char, AiMode, VfoRole};

/// Maximum outbound command length on the wire, terminator included
pub const MAX_COMMAND_LEN: usize = 48;

/// Frame a command for the wire: append the terminator, enforce the length
/// limit. Oversized commands are rejected, never truncated - a truncated
/// command could still look valid and do something else entirely.
pub fn wire_frame(cmd: &str) -> Result<Vec<u8>, ParseError> {
    if cmd.len() + 1 > MAX_COMMAND_LEN {
        return Err(ParseError::CommandTooLong(cmd.len() + 1));
    }
    let mut bytes = Vec::with_capacity(cmd.len() + 1);
    bytes.extend_from_slice(cmd.as_bytes());
    bytes.push(b';');
    Ok(bytes)
}

/// Set a VFO frequency; the memory role has no settable frequency register
pub fn set_frequency(role: VfoRole, hz: u64) -> Option<String> {
    match role {
        VfoRole::A => Some(format!("FA{:011}", hz)),
        VfoRole::B => Some(format!("FB{:011}", hz)),
        VfoRole::Memory => None,
    }
}

/// Select the receive VFO function
pub fn set_rx_function(role: VfoRole) -> String {
    format!("FR{}", role.as_digit())
}

/// Select the transmit VFO function
pub fn set_tx_function(role: VfoRole) -> String {
    format!("FT{}", role.as_digit())
}

/// Key or unkey the transmitter
pub fn set_transmit(on: bool) -> &'static str {
    if on {
        "TX0"
    } else {
        "RX"
    }
}

/// Set the operating mode; data sub-modes 10-12 encode as A/B/C
pub fn set_mode(code: u8) -> Option<String> {
    mode_char(code).map(|c| format!("MD{}", c))
}

/// Assert an auto-information mode
pub fn set_auto_info(mode: AiMode) -> Option<&'static str> {
    mode.set_command()
}

/// Request a memory channel record; `tx_view` selects the TX half of a
/// split channel
pub fn memory_read(tx_view: bool, channel: u16) -> String {
    format!("MR{}{:03}", if tx_view { '1' } else { '0' }, channel.min(999))
}

/// Engage or release TF-Set
pub fn set_tf_set(on: bool) -> &'static str {
    if on {
        "TS1"
    } else {
        "TS0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_frame_appends_terminator() {
        assert_eq!(wire_frame("FA00014250000").unwrap(), b"FA00014250000;");
        assert_eq!(wire_frame("PS").unwrap(), b"PS;");
    }

    #[test]
    fn test_wire_frame_rejects_oversize() {
        let long = "EX".repeat(30);
        assert!(matches!(
            wire_frame(&long),
            Err(ParseError::CommandTooLong(_))
        ));
    }

    #[test]
    fn test_set_frequency_padding() {
        assert_eq!(
            set_frequency(VfoRole::A, 14_250_000).as_deref(),
            Some("FA00014250000")
        );
        assert_eq!(
            set_frequency(VfoRole::B, 7_074_000).as_deref(),
            Some("FB00007074000")
        );
        assert_eq!(set_frequency(VfoRole::Memory, 1), None);
    }

    #[test]
    fn test_functions_and_transmit() {
        assert_eq!(set_rx_function(VfoRole::B), "FR1");
        assert_eq!(set_tx_function(VfoRole::Memory), "FT2");
        assert_eq!(set_transmit(true), "TX0");
        assert_eq!(set_transmit(false), "RX");
    }

    #[test]
    fn test_set_mode_data_submodes() {
        assert_eq!(set_mode(2).as_deref(), Some("MD2"));
        assert_eq!(set_mode(11).as_deref(), Some("MDB"));
        assert_eq!(set_mode(99), None);
    }

    #[test]
    fn test_memory_read_request() {
        assert_eq!(memory_read(false, 42), "MR0042");
        assert_eq!(memory_read(true, 7), "MR1007");
        assert_eq!(memory_read(false, 5000), "MR0999");
    }
}
