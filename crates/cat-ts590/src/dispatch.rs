//! Command dispatch: prefix key to family decoder
//!
//! Each command routes to exactly one decoder through a 16-bit key built
//! from its first two characters: `(c0 << 8) | c1`. The match below compiles
//! to a jump table; there is no allocation and no string-keyed lookup on
//! this path.
//!
//! One irregularity is handled before prefix dispatch: some firmware
//! revisions prepend stray bytes to a true `IF` status frame, so the whole
//! command is scanned for an embedded `IF` token and, when found, the
//! remainder from that position is decoded as a status frame. Commands are
//! short, so the scan cost is bounded. This applies to `IF` only; no other
//! family gets the treatment.

use crate::decode;
use crate::error::ParseError;
use crate::types::CatEvent;

/// Dispatch key for a 2-character command prefix
const fn key(prefix: &[u8; 2]) -> u16 {
    ((prefix[0] as u16) << 8) | prefix[1] as u16
}

const FA: u16 = key(b"FA");
const FB: u16 = key(b"FB");
const FR: u16 = key(b"FR");
const FT: u16 = key(b"FT");
const TX: u16 = key(b"TX");
const RX: u16 = key(b"RX");
const TS: u16 = key(b"TS");
const MD: u16 = key(b"MD");
const DA: u16 = key(b"DA");
const PS: u16 = key(b"PS");
const AI: u16 = key(b"AI");
const ID: u16 = key(b"ID");
const GT: u16 = key(b"GT");
const FV: u16 = key(b"FV");
const TY: u16 = key(b"TY");
const SM: u16 = key(b"SM");
const RM: u16 = key(b"RM");
const RA: u16 = key(b"RA");
const AG: u16 = key(b"AG");
const RG: u16 = key(b"RG");
const SQ: u16 = key(b"SQ");
const PC: u16 = key(b"PC");
const MG: u16 = key(b"MG");
const KS: u16 = key(b"KS");
const RT: u16 = key(b"RT");
const XT: u16 = key(b"XT");
const NB: u16 = key(b"NB");
const NR: u16 = key(b"NR");
const BC: u16 = key(b"BC");
const NT: u16 = key(b"NT");
const PA: u16 = key(b"PA");
const VX: u16 = key(b"VX");
const PR: u16 = key(b"PR");
const SH: u16 = key(b"SH");
const SL: u16 = key(b"SL");
const FL: u16 = key(b"FL");
const TN: u16 = key(b"TN");
const TO: u16 = key(b"TO");
const MR: u16 = key(b"MR");
const AN: u16 = key(b"AN");
const XI: u16 = key(b"XI");
const XO: u16 = key(b"XO");
const EX: u16 = key(b"EX");
const MX: u16 = key(b"MX");
const UI: u16 = key(b"UI");

/// Find an embedded `IF` token anywhere in the command
fn embedded_if(cmd: &str) -> Option<usize> {
    cmd.as_bytes().windows(2).position(|w| w == b"IF")
}

/// Decode one terminator-stripped command string
///
/// Commands shorter than two characters and unmapped prefixes decode to an
/// error the caller is expected to ignore; decoding never panics and never
/// partially applies anything.
pub fn decode_command(cmd: &str) -> Result<CatEvent, ParseError> {
    if cmd.len() < 2 {
        return Err(ParseError::TooShort { got: cmd.len(), need: 2 });
    }

    if let Some(pos) = embedded_if(cmd) {
        return decode::status(&cmd[pos..]);
    }

    let bytes = cmd.as_bytes();
    match key(&[bytes[0], bytes[1]]) {
        FA => decode::frequency_a(cmd),
        FB => decode::frequency_b(cmd),
        FR => decode::rx_function(cmd),
        FT => decode::tx_function(cmd),
        TX => decode::transmit(cmd),
        RX => decode::receive(cmd),
        TS => decode::tf_set(cmd),
        MD => decode::mode(cmd),
        DA => decode::data_mode(cmd),
        PS => decode::power(cmd),
        AI => decode::auto_info(cmd),
        ID => decode::identity(cmd),
        GT => decode::agc(cmd),
        FV => decode::firmware_version(cmd),
        TY => decode::microcode(cmd),
        SM => decode::s_meter(cmd),
        RM => decode::meter(cmd),
        RA => decode::attenuator(cmd),
        AG => decode::af_gain(cmd),
        RG => decode::rf_gain(cmd),
        SQ => decode::squelch(cmd),
        PC => decode::power_control(cmd),
        MG => decode::mic_gain(cmd),
        KS => decode::key_speed(cmd),
        RT => decode::rit(cmd),
        XT => decode::xit(cmd),
        NB => decode::noise_blanker(cmd),
        NR => decode::noise_reduction(cmd),
        BC => decode::beat_cancel(cmd),
        NT => decode::notch(cmd),
        PA => decode::preamp(cmd),
        VX => decode::vox(cmd),
        PR => decode::processor(cmd),
        SH => decode::filter_high(cmd),
        SL => decode::filter_low(cmd),
        FL => decode::roofing_filter(cmd),
        TN => decode::tone_number(cmd),
        TO => decode::tone_on(cmd),
        MR => decode::memory_read(cmd),
        AN => decode::antenna_select(cmd),
        XI => decode::tx_info(cmd),
        XO => decode::transverter_offset(cmd),
        EX => decode::menu(cmd),
        MX => decode::macro_select(cmd),
        UI => decode::panel_meta(cmd),
        _ => Err(ParseError::UnknownCommand(cmd.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VfoRole;

    #[test]
    fn test_dispatch_by_prefix() {
        assert_eq!(
            decode_command("FA00014250000"),
            Ok(CatEvent::VfoAFrequency(14_250_000))
        );
        assert_eq!(decode_command("FR1"), Ok(CatEvent::RxFunction(VfoRole::B)));
        assert_eq!(decode_command("PS1"), Ok(CatEvent::Power(true)));
    }

    #[test]
    fn test_too_short_ignored() {
        assert!(matches!(
            decode_command("F"),
            Err(ParseError::TooShort { .. })
        ));
        assert!(matches!(
            decode_command(""),
            Err(ParseError::TooShort { .. })
        ));
    }

    #[test]
    fn test_unknown_prefix_is_noop() {
        assert!(matches!(
            decode_command("ZZ123"),
            Err(ParseError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_embedded_if_token_at_start() {
        let ev = decode_command("IF00014070000     +000000000000000").unwrap();
        assert!(matches!(ev, CatEvent::Status(_)));
    }

    #[test]
    fn test_embedded_if_token_mid_buffer() {
        // Stray prefix bytes before a real status frame
        let ev = decode_command("\u{1}\u{2}XIF00014070000     +000000000000000").unwrap();
        let CatEvent::Status(st) = ev else { panic!("not a status event") };
        assert_eq!(st.frequency_hz, 14_070_000);
    }

    #[test]
    fn test_embedded_if_beats_prefix_table() {
        // Even a command with a valid prefix yields a status decode when an
        // IF token appears later in the buffer; only IF gets this treatment.
        let ev = decode_command("FAIF00014070000     +000000000000000").unwrap();
        assert!(matches!(ev, CatEvent::Status(_)));
    }

    #[test]
    fn test_if_scan_does_not_apply_to_other_families() {
        // No IF token anywhere: normal dispatch path
        assert_eq!(decode_command("TX0"), Ok(CatEvent::Transmit(true)));
    }
}
