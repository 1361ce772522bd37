//! Per-family CAT command decoders
//!
//! One decoder per command family. Every decoder validates length before
//! indexing its fixed offsets, clamps numeric fields to their documented
//! ranges, and returns an error instead of publishing anything for input it
//! cannot make sense of. The field layouts here reproduce the TS-590SG wire
//! protocol and must not be "fixed" for tidiness.

use crate::error::ParseError;
use crate::types::{mode_code, AiMode, CatEvent, IfStatus, MemoryChannel, MenuItem, VfoRole};

/// SWR meter calibration: (segments, SWR) breakpoints, linearly interpolated
///
/// 30 segments is full scale on the bar meter; values between breakpoints
/// interpolate, values past the last breakpoint saturate.
const SWR_CALIBRATION: [(u8, f32); 5] = [
    (0, 1.0),
    (7, 1.3),
    (15, 1.7),
    (22, 2.5),
    (30, 5.0),
];

/// Convert a raw SWR segment count into a calibrated SWR value
pub fn swr_from_segments(segments: u8) -> f32 {
    let seg = segments.min(30);
    for pair in SWR_CALIBRATION.windows(2) {
        let (s0, v0) = pair[0];
        let (s1, v1) = pair[1];
        if seg <= s1 {
            let span = (s1 - s0) as f32;
            let t = (seg - s0) as f32 / span;
            return v0 + (v1 - v0) * t;
        }
    }
    SWR_CALIBRATION[SWR_CALIBRATION.len() - 1].1
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Parse a fixed-width run of ASCII digits
fn num(bytes: &[u8]) -> Result<u64, ParseError> {
    if bytes.is_empty() || !bytes.iter().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::BadDigits(
            String::from_utf8_lossy(bytes).into_owned(),
        ));
    }
    let mut value: u64 = 0;
    for &b in bytes {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(b - b'0')))
            .ok_or_else(|| ParseError::BadDigits(String::from_utf8_lossy(bytes).into_owned()))?;
    }
    Ok(value)
}

/// Tolerant variant of [`num`] for `IF` sub-fields: invalid decodes to `None`
fn num_opt(bytes: Option<&[u8]>) -> Option<u64> {
    bytes.and_then(|b| num(b).ok())
}

/// Require an exact command length for a single-layout family
fn exact_len(cmd: &str, len: usize, family: &'static str) -> Result<(), ParseError> {
    if cmd.len() != len {
        return Err(ParseError::BadLength(cmd.len(), family));
    }
    Ok(())
}

/// Single digit at a fixed offset, as its numeric value
fn digit_at(cmd: &str, index: usize, field: &'static str) -> Result<u8, ParseError> {
    let b = *cmd
        .as_bytes()
        .get(index)
        .ok_or(ParseError::TooShort { got: cmd.len(), need: index + 1 })?;
    if !b.is_ascii_digit() {
        return Err(ParseError::OutOfRange { field, value: b as char });
    }
    Ok(b - b'0')
}

/// Boolean toggle: a `0`/`1` digit at offset 2
fn toggle(cmd: &str, family: &'static str) -> Result<bool, ParseError> {
    exact_len(cmd, 3, family)?;
    match digit_at(cmd, 2, family)? {
        0 => Ok(false),
        1 => Ok(true),
        d => Err(ParseError::OutOfRange { field: family, value: (b'0' + d) as char }),
    }
}

/// Small enumerated level: a digit at offset 2 clamped to `max`
fn level(cmd: &str, max: u8, family: &'static str) -> Result<u8, ParseError> {
    exact_len(cmd, 3, family)?;
    Ok(digit_at(cmd, 2, family)?.min(max))
}

// ---------------------------------------------------------------------------
// Frequency family
// ---------------------------------------------------------------------------

/// `FA`/`FB`: exactly 11 digits starting at offset 2
///
/// A digit run that is anything other than exactly 11 characters rejects the
/// whole command; a glitched frequency must never be published.
fn vfo_frequency(cmd: &str) -> Result<u64, ParseError> {
    let bytes = cmd.as_bytes();
    if bytes.len() < 13 {
        return Err(ParseError::TooShort { got: bytes.len(), need: 13 });
    }
    let run = bytes[2..].iter().take_while(|b| b.is_ascii_digit()).count();
    if run != 11 {
        return Err(ParseError::InvalidFrequency(cmd[2..].to_string()));
    }
    num(&bytes[2..13])
}

pub(crate) fn frequency_a(cmd: &str) -> Result<CatEvent, ParseError> {
    vfo_frequency(cmd).map(CatEvent::VfoAFrequency)
}

pub(crate) fn frequency_b(cmd: &str) -> Result<CatEvent, ParseError> {
    vfo_frequency(cmd).map(CatEvent::VfoBFrequency)
}

// ---------------------------------------------------------------------------
// Status family
// ---------------------------------------------------------------------------

/// `IF`: 35-character positional status payload
///
/// Layout (offsets within the payload):
/// ```text
///  0..11  frequency, 11 digits
/// 11..16  tuning step, ignored
/// 16..21  RIT/XIT offset: sign (space/+ positive, - negative) + 4 digits
/// 21      RIT on      22  XIT on
/// 23..26  memory channel, 3 digits
/// 26      TX/RX       27  mode        28  VFO function
/// 29      scan        30  split       31  tone mode
/// 32..34  tone number, 2 digits
/// 34      reserved, always 0
/// ```
///
/// The snapshot is replaced wholesale per frame; any sub-field that is
/// absent or malformed decodes to zero/false rather than failing the frame.
pub(crate) fn status(cmd: &str) -> Result<CatEvent, ParseError> {
    let p = cmd.as_bytes();
    if p.len() < 13 {
        return Err(ParseError::TooShort { got: p.len(), need: 13 });
    }
    let p = &p[2..];

    let frequency_hz = num_opt(p.get(0..11)).unwrap_or(0);

    let rit_offset = match (p.get(16).copied(), num_opt(p.get(17..21))) {
        (Some(sign), Some(mag)) => {
            let mag = (mag as i16).min(9990);
            match sign {
                b'-' => -mag,
                b' ' | b'+' => mag,
                _ => 0,
            }
        }
        _ => 0,
    };

    let flag = |i: usize| p.get(i) == Some(&b'1');

    let status = IfStatus {
        frequency_hz,
        rit_offset,
        rit_on: flag(21),
        xit_on: flag(22),
        memory_channel: num_opt(p.get(23..26)).map(|v| (v as u16).min(999)).unwrap_or(0),
        transmitting: flag(26),
        mode: p.get(27).copied().and_then(mode_code).unwrap_or(0),
        function: p.get(28).copied().and_then(VfoRole::from_ascii),
        scanning: flag(29),
        split: flag(30),
        tone_mode: p.get(31).map(|b| b.saturating_sub(b'0').min(2)).unwrap_or(0),
        tone_number: num_opt(p.get(32..34)).map(|v| (v as u8).min(42)).unwrap_or(0),
        reserved: p.get(34).map(|b| b.saturating_sub(b'0')).unwrap_or(0),
    };

    Ok(CatEvent::Status(status))
}

// ---------------------------------------------------------------------------
// VFO / TX family
// ---------------------------------------------------------------------------

fn function(cmd: &str, family: &'static str) -> Result<VfoRole, ParseError> {
    exact_len(cmd, 3, family)?;
    VfoRole::from_ascii(cmd.as_bytes()[2]).ok_or(ParseError::OutOfRange {
        field: family,
        value: cmd.as_bytes()[2] as char,
    })
}

pub(crate) fn rx_function(cmd: &str) -> Result<CatEvent, ParseError> {
    function(cmd, "FR").map(CatEvent::RxFunction)
}

pub(crate) fn tx_function(cmd: &str) -> Result<CatEvent, ParseError> {
    function(cmd, "FT").map(CatEvent::TxFunction)
}

/// `TX`: bare or with a transmit-path digit, either way the rig is keyed
pub(crate) fn transmit(cmd: &str) -> Result<CatEvent, ParseError> {
    if cmd.len() > 3 {
        return Err(ParseError::BadLength(cmd.len(), "TX"));
    }
    Ok(CatEvent::Transmit(true))
}

pub(crate) fn receive(cmd: &str) -> Result<CatEvent, ParseError> {
    exact_len(cmd, 2, "RX")?;
    Ok(CatEvent::Transmit(false))
}

pub(crate) fn tf_set(cmd: &str) -> Result<CatEvent, ParseError> {
    toggle(cmd, "TS").map(CatEvent::TfSet)
}

// ---------------------------------------------------------------------------
// Mode / power / link family
// ---------------------------------------------------------------------------

pub(crate) fn mode(cmd: &str) -> Result<CatEvent, ParseError> {
    exact_len(cmd, 3, "MD")?;
    let b = cmd.as_bytes()[2];
    mode_code(b)
        .map(CatEvent::Mode)
        .ok_or(ParseError::OutOfRange { field: "MD", value: b as char })
}

pub(crate) fn data_mode(cmd: &str) -> Result<CatEvent, ParseError> {
    toggle(cmd, "DA").map(CatEvent::DataMode)
}

pub(crate) fn power(cmd: &str) -> Result<CatEvent, ParseError> {
    toggle(cmd, "PS").map(CatEvent::Power)
}

pub(crate) fn auto_info(cmd: &str) -> Result<CatEvent, ParseError> {
    exact_len(cmd, 3, "AI")?;
    Ok(CatEvent::AutoInfo(AiMode::from_ascii(cmd.as_bytes()[2])))
}

pub(crate) fn identity(cmd: &str) -> Result<CatEvent, ParseError> {
    if cmd.len() < 3 {
        return Err(ParseError::TooShort { got: cmd.len(), need: 3 });
    }
    Ok(CatEvent::Identity(cmd[2..].to_string()))
}

/// `GT`: AGC time constant, 3 digits clamped to 0-20
pub(crate) fn agc(cmd: &str) -> Result<CatEvent, ParseError> {
    exact_len(cmd, 5, "GT")?;
    Ok(CatEvent::Agc(num(&cmd.as_bytes()[2..5])?.min(20) as u8))
}

pub(crate) fn firmware_version(cmd: &str) -> Result<CatEvent, ParseError> {
    if cmd.len() < 3 {
        return Err(ParseError::TooShort { got: cmd.len(), need: 3 });
    }
    Ok(CatEvent::FirmwareVersion(cmd[2..].to_string()))
}

pub(crate) fn microcode(cmd: &str) -> Result<CatEvent, ParseError> {
    if cmd.len() < 3 {
        return Err(ParseError::TooShort { got: cmd.len(), need: 3 });
    }
    Ok(CatEvent::Microcode(cmd[2..].to_string()))
}

// ---------------------------------------------------------------------------
// Meter family
// ---------------------------------------------------------------------------

/// `SM`: receiver digit + 4 meter digits, clamped to 0-30
pub(crate) fn s_meter(cmd: &str) -> Result<CatEvent, ParseError> {
    exact_len(cmd, 7, "SM")?;
    digit_at(cmd, 2, "SM")?;
    Ok(CatEvent::SMeter(num(&cmd.as_bytes()[3..7])?.min(30) as u8))
}

/// `RM`: selector digit multiplexes SWR (1), COMP (2) and ALC (3)
///
/// Only the selected meter's topic is touched. SWR carries the calibrated
/// value alongside the raw segment count.
pub(crate) fn meter(cmd: &str) -> Result<CatEvent, ParseError> {
    exact_len(cmd, 7, "RM")?;
    let value = num(&cmd.as_bytes()[3..7])?.min(30) as u8;
    match cmd.as_bytes()[2] {
        b'1' => Ok(CatEvent::Swr { segments: value, calibrated: swr_from_segments(value) }),
        b'2' => Ok(CatEvent::Comp(value)),
        b'3' => Ok(CatEvent::Alc(value)),
        other => Err(ParseError::OutOfRange { field: "RM", value: other as char }),
    }
}

/// `RA`: attenuator level; two valid layouts (2 digits, or 2+2 with the
/// second receiver's level appended). Anything else, including off-by-one
/// lengths, is rejected.
pub(crate) fn attenuator(cmd: &str) -> Result<CatEvent, ParseError> {
    if cmd.len() != 4 && cmd.len() != 6 {
        return Err(ParseError::BadLength(cmd.len(), "RA"));
    }
    num(&cmd.as_bytes()[2..])?;
    Ok(CatEvent::Attenuator(num(&cmd.as_bytes()[2..4])? as u8))
}

// ---------------------------------------------------------------------------
// Level family
// ---------------------------------------------------------------------------

/// `AG`/`SQ`: receiver digit + 3 digits, 0-255
fn rx_level(cmd: &str, family: &'static str) -> Result<u8, ParseError> {
    exact_len(cmd, 6, family)?;
    digit_at(cmd, 2, family)?;
    Ok(num(&cmd.as_bytes()[3..6])?.min(255) as u8)
}

/// 3-digit level directly after the prefix
fn plain_level(cmd: &str, family: &'static str) -> Result<u64, ParseError> {
    exact_len(cmd, 5, family)?;
    num(&cmd.as_bytes()[2..5])
}

pub(crate) fn af_gain(cmd: &str) -> Result<CatEvent, ParseError> {
    rx_level(cmd, "AG").map(CatEvent::AfGain)
}

pub(crate) fn squelch(cmd: &str) -> Result<CatEvent, ParseError> {
    rx_level(cmd, "SQ").map(CatEvent::Squelch)
}

pub(crate) fn rf_gain(cmd: &str) -> Result<CatEvent, ParseError> {
    Ok(CatEvent::RfGain(plain_level(cmd, "RG")?.min(255) as u8))
}

pub(crate) fn power_control(cmd: &str) -> Result<CatEvent, ParseError> {
    Ok(CatEvent::PowerControl(plain_level(cmd, "PC")?.clamp(5, 100) as u8))
}

pub(crate) fn mic_gain(cmd: &str) -> Result<CatEvent, ParseError> {
    Ok(CatEvent::MicGain(plain_level(cmd, "MG")?.min(100) as u8))
}

pub(crate) fn key_speed(cmd: &str) -> Result<CatEvent, ParseError> {
    Ok(CatEvent::KeySpeed(plain_level(cmd, "KS")?.clamp(4, 60) as u8))
}

// ---------------------------------------------------------------------------
// Toggle family
// ---------------------------------------------------------------------------

pub(crate) fn rit(cmd: &str) -> Result<CatEvent, ParseError> {
    toggle(cmd, "RT").map(CatEvent::Rit)
}

pub(crate) fn xit(cmd: &str) -> Result<CatEvent, ParseError> {
    toggle(cmd, "XT").map(CatEvent::Xit)
}

pub(crate) fn noise_blanker(cmd: &str) -> Result<CatEvent, ParseError> {
    level(cmd, 2, "NB").map(CatEvent::NoiseBlanker)
}

pub(crate) fn noise_reduction(cmd: &str) -> Result<CatEvent, ParseError> {
    level(cmd, 2, "NR").map(CatEvent::NoiseReduction)
}

pub(crate) fn beat_cancel(cmd: &str) -> Result<CatEvent, ParseError> {
    level(cmd, 2, "BC").map(CatEvent::BeatCancel)
}

pub(crate) fn notch(cmd: &str) -> Result<CatEvent, ParseError> {
    toggle(cmd, "NT").map(CatEvent::Notch)
}

pub(crate) fn preamp(cmd: &str) -> Result<CatEvent, ParseError> {
    toggle(cmd, "PA").map(CatEvent::Preamp)
}

pub(crate) fn vox(cmd: &str) -> Result<CatEvent, ParseError> {
    toggle(cmd, "VX").map(CatEvent::Vox)
}

pub(crate) fn processor(cmd: &str) -> Result<CatEvent, ParseError> {
    toggle(cmd, "PR").map(CatEvent::Processor)
}

// ---------------------------------------------------------------------------
// Filter / tone family
// ---------------------------------------------------------------------------

/// `SH`/`SL`: 2-digit cutoff index, clamped to 0-13
fn cutoff(cmd: &str, family: &'static str) -> Result<u8, ParseError> {
    exact_len(cmd, 4, family)?;
    Ok(num(&cmd.as_bytes()[2..4])?.min(13) as u8)
}

pub(crate) fn filter_high(cmd: &str) -> Result<CatEvent, ParseError> {
    cutoff(cmd, "SH").map(CatEvent::FilterHigh)
}

pub(crate) fn filter_low(cmd: &str) -> Result<CatEvent, ParseError> {
    cutoff(cmd, "SL").map(CatEvent::FilterLow)
}

pub(crate) fn roofing_filter(cmd: &str) -> Result<CatEvent, ParseError> {
    level(cmd, 2, "FL").map(CatEvent::RoofingFilter)
}

pub(crate) fn tone_number(cmd: &str) -> Result<CatEvent, ParseError> {
    exact_len(cmd, 4, "TN")?;
    Ok(CatEvent::ToneNumber(num(&cmd.as_bytes()[2..4])?.min(42) as u8))
}

pub(crate) fn tone_on(cmd: &str) -> Result<CatEvent, ParseError> {
    toggle(cmd, "TO").map(CatEvent::ToneOn)
}

// ---------------------------------------------------------------------------
// Composite families
// ---------------------------------------------------------------------------

/// `MR`: memory channel record
///
/// Layout (offsets within the full command):
/// ```text
///  2      RX (0) / TX (1) view
///  3..6   channel, 3 digits
///  6..17  frequency, 11 digits
/// 17      mode       18  data       19  lockout
/// 20      tone mode
/// 21..23  tone number     23..25  CTCSS number
/// 25      filter     26  narrow FM  27  split
/// 28..36  name, 8 chars space-padded (optional block)
/// ```
///
/// Two valid lengths: 28 (no name block) or 36 (name block present).
pub(crate) fn memory_read(cmd: &str) -> Result<CatEvent, ParseError> {
    if cmd.len() != 28 && cmd.len() != 36 {
        return Err(ParseError::BadLength(cmd.len(), "MR"));
    }
    let b = cmd.as_bytes();

    let tx_view = match b[2] {
        b'0' => false,
        b'1' => true,
        other => return Err(ParseError::OutOfRange { field: "MR", value: other as char }),
    };

    let record = MemoryChannel {
        channel: num(&b[3..6])?.min(999) as u16,
        tx_view,
        frequency_hz: num(&b[6..17])?,
        mode: mode_code(b[17]).unwrap_or(0),
        data: b[18] == b'1',
        lockout: b[19] == b'1',
        tone_mode: b[20].saturating_sub(b'0').min(2),
        tone_number: num(&b[21..23])?.min(42) as u8,
        ctcss_number: num(&b[23..25])?.min(42) as u8,
        filter: b[25].saturating_sub(b'0'),
        narrow_fm: b[26] == b'1',
        split: b[27] == b'1',
        name: cmd.get(28..36).map(|s| s.trim_end().to_string()).unwrap_or_default(),
        valid: true,
    };

    Ok(CatEvent::Memory(record))
}

/// `AN`: antenna connector (1-2) + RX antenna flag + drive-out flag
pub(crate) fn antenna_select(cmd: &str) -> Result<CatEvent, ParseError> {
    exact_len(cmd, 5, "AN")?;
    let antenna = digit_at(cmd, 2, "AN")?;
    if !(1..=2).contains(&antenna) {
        return Err(ParseError::OutOfRange { field: "AN", value: (b'0' + antenna) as char });
    }
    Ok(CatEvent::AntennaSelect {
        antenna,
        rx_antenna: cmd.as_bytes()[3] == b'1',
        drive_out: cmd.as_bytes()[4] == b'1',
    })
}

/// `XI`: transmit frequency (11 digits) + mode + data sub-mode digit
pub(crate) fn tx_info(cmd: &str) -> Result<CatEvent, ParseError> {
    exact_len(cmd, 15, "XI")?;
    let b = cmd.as_bytes();
    let frequency_hz = num(&b[2..13])?;
    let base = mode_code(b[13]).ok_or(ParseError::OutOfRange { field: "XI", value: b[13] as char })?;
    let data_digit = digit_at(cmd, 14, "XI")?;
    // Data sub-modes A/B/C ride on digits 1-3 and fold into codes 10-12
    let (mode, data) = match data_digit {
        0 => (base, false),
        1..=3 => (9 + data_digit, true),
        d => return Err(ParseError::OutOfRange { field: "XI", value: (b'0' + d) as char }),
    };
    Ok(CatEvent::TxInfo { frequency_hz, mode, data })
}

/// `XO`: transverter offset, direction digit (0 plus / 1 minus) + 11 digits
pub(crate) fn transverter_offset(cmd: &str) -> Result<CatEvent, ParseError> {
    exact_len(cmd, 14, "XO")?;
    let b = cmd.as_bytes();
    let negative = match b[2] {
        b'0' => false,
        b'1' => true,
        other => return Err(ParseError::OutOfRange { field: "XO", value: other as char }),
    };
    Ok(CatEvent::TransverterOffset { offset_hz: num(&b[3..14])?, negative })
}

/// `EX`: menu item, demultiplexed on the 3-digit menu number
///
/// Layout: `EX` + menu (3 digits) + sub-code (4 chars, unused here) + value.
pub(crate) fn menu(cmd: &str) -> Result<CatEvent, ParseError> {
    if cmd.len() < 9 {
        return Err(ParseError::TooShort { got: cmd.len(), need: 9 });
    }
    let number = num(&cmd.as_bytes()[2..5])?;
    let value = &cmd[9..];

    let item = match number {
        0 => MenuItem::PowerOnMessage(value.chars().take(8).collect::<String>().trim_end().to_string()),
        3 => MenuItem::BeepLevel(menu_level(value)?.min(20)),
        5 => MenuItem::SidetoneLevel(menu_level(value)?.min(20)),
        18 => MenuItem::AutoMode(menu_level(value)? != 0),
        24 => MenuItem::QuickMemories(menu_level(value)?.min(10)),
        36 => MenuItem::MeterPeakHold(menu_level(value)? != 0),
        41 => MenuItem::BacklightColor(menu_level(value)?.min(2)),
        56 => {
            let v = menu_level(value)?.min(2);
            MenuItem::TransverterTranslation { enabled: v > 0, power_down: v == 2 }
        }
        71 => MenuItem::TxTimeout(menu_level(value)?.min(30)),
        87 => MenuItem::CatBaudRate(menu_level(value)?.min(4)),
        other => {
            return Err(ParseError::UnknownCommand(format!("EX{:03}", other)));
        }
    };

    Ok(CatEvent::Menu(item))
}

fn menu_level(value: &str) -> Result<u8, ParseError> {
    Ok(num(value.as_bytes())?.min(255) as u8)
}

// ---------------------------------------------------------------------------
// Panel meta family
// ---------------------------------------------------------------------------

pub(crate) fn macro_select(cmd: &str) -> Result<CatEvent, ParseError> {
    exact_len(cmd, 4, "MX")?;
    Ok(CatEvent::Macro(num(&cmd.as_bytes()[2..4])? as u8))
}

/// `UI*`: panel meta-commands, demultiplexed on the third character
pub(crate) fn panel_meta(cmd: &str) -> Result<CatEvent, ParseError> {
    let b = cmd.as_bytes();
    match b.get(2) {
        Some(b'B') => {
            exact_len(cmd, 6, "UIB")?;
            Ok(CatEvent::Backlight(num(&b[3..6])?.min(255) as u8))
        }
        Some(b'P') => {
            exact_len(cmd, 4, "UIP")?;
            Ok(CatEvent::Page(digit_at(cmd, 3, "UIP")?))
        }
        Some(b'V') => {
            exact_len(cmd, 3, "UIV")?;
            Ok(CatEvent::VersionQuery)
        }
        _ => Err(ParseError::UnknownCommand(cmd.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_valid() {
        assert_eq!(
            frequency_a("FA00014074000"),
            Ok(CatEvent::VfoAFrequency(14_074_000))
        );
        assert_eq!(
            frequency_b("FB00007074000"),
            Ok(CatEvent::VfoBFrequency(7_074_000))
        );
    }

    #[test]
    fn test_frequency_rejects_short() {
        assert!(frequency_a("FA0001407400").is_err());
        assert!(frequency_a("FA").is_err());
    }

    #[test]
    fn test_frequency_rejects_non_digit() {
        assert!(frequency_a("FA000140x4000").is_err());
    }

    #[test]
    fn test_frequency_rejects_overlong_digit_run() {
        assert!(frequency_a("FA000140740001").is_err());
    }

    #[test]
    fn test_status_full_payload() {
        //            frequency  step  offset rx mem  t m f s s t tn r
        let cmd = "IF00014250000     -012311002012101200";
        // offsets:   0..11      11..16 16..21 ...
        let ev = status(cmd).unwrap();
        let CatEvent::Status(st) = ev else { panic!("not a status event") };
        assert_eq!(st.frequency_hz, 14_250_000);
        assert_eq!(st.rit_offset, -123);
        assert!(st.rit_on);
        assert!(st.xit_on);
        assert_eq!(st.memory_channel, 2); // "002"
        assert!(!st.transmitting); // '0'
        assert_eq!(st.mode, 1);
        assert_eq!(st.function, Some(VfoRole::Memory));
        assert!(st.scanning);
        assert!(!st.split);
        assert_eq!(st.tone_mode, 1);
        assert_eq!(st.tone_number, 20);
        assert_eq!(st.reserved, 0);
    }

    #[test]
    fn test_status_short_payload_defaults() {
        // The literal from the protocol log: shorter than the nominal 35
        // chars; trailing fields default to zero/false.
        let ev = status("IF00014070000     +000000000000000").unwrap();
        let CatEvent::Status(st) = ev else { panic!("not a status event") };
        assert_eq!(st.frequency_hz, 14_070_000);
        assert_eq!(st.rit_offset, 0);
        assert!(!st.split);
        assert!(!st.transmitting);
        assert_eq!(st.function, Some(VfoRole::A));
        assert_eq!(st.tone_number, 0);
    }

    #[test]
    fn test_status_data_submode_in_mode_field() {
        let mut payload = String::from("IF00014070000     ");
        payload.push_str("+0000"); // offset
        payload.push_str("00"); // rit/xit
        payload.push_str("000"); // memory
        payload.push('0'); // rx
        payload.push('A'); // data sub-mode A
        payload.push('0'); // function
        let CatEvent::Status(st) = status(&payload).unwrap() else { panic!() };
        assert_eq!(st.mode, 10);
    }

    #[test]
    fn test_status_offset_clamped() {
        let cmd = "IF00014250000      9999";
        let CatEvent::Status(st) = status(cmd).unwrap() else { panic!() };
        assert_eq!(st.rit_offset, 9990);
    }

    #[test]
    fn test_functions() {
        assert_eq!(rx_function("FR0"), Ok(CatEvent::RxFunction(VfoRole::A)));
        assert_eq!(tx_function("FT1"), Ok(CatEvent::TxFunction(VfoRole::B)));
        assert_eq!(rx_function("FR2"), Ok(CatEvent::RxFunction(VfoRole::Memory)));
        assert!(rx_function("FR9").is_err());
    }

    #[test]
    fn test_transmit_receive() {
        assert_eq!(transmit("TX"), Ok(CatEvent::Transmit(true)));
        assert_eq!(transmit("TX0"), Ok(CatEvent::Transmit(true)));
        assert_eq!(transmit("TX1"), Ok(CatEvent::Transmit(true)));
        assert_eq!(receive("RX"), Ok(CatEvent::Transmit(false)));
        assert!(transmit("TX00").is_err());
    }

    #[test]
    fn test_s_meter_clamped() {
        assert_eq!(s_meter("SM00015"), Ok(CatEvent::SMeter(15)));
        assert_eq!(s_meter("SM00099"), Ok(CatEvent::SMeter(30)));
        assert!(s_meter("SM0015").is_err()); // off by one
    }

    #[test]
    fn test_meter_multiplexing() {
        let CatEvent::Swr { segments, calibrated } = meter("RM10015").unwrap() else {
            panic!("expected SWR")
        };
        assert_eq!(segments, 15);
        assert!((calibrated - 1.7).abs() < 1e-6);

        assert_eq!(meter("RM20025"), Ok(CatEvent::Comp(25)));
        assert_eq!(meter("RM30010"), Ok(CatEvent::Alc(10)));
        assert!(meter("RM40010").is_err());
    }

    #[test]
    fn test_meter_clamped_to_30() {
        assert_eq!(meter("RM20099"), Ok(CatEvent::Comp(30)));
        let CatEvent::Swr { segments, .. } = meter("RM19999").unwrap() else { panic!() };
        assert_eq!(segments, 30);
    }

    #[test]
    fn test_swr_calibration_endpoints() {
        assert!((swr_from_segments(0) - 1.0).abs() < 1e-6);
        assert!((swr_from_segments(30) - 5.0).abs() < 1e-6);
        assert!((swr_from_segments(40) - 5.0).abs() < 1e-6);
        // Monotonic across the table
        let mut last = 0.0f32;
        for seg in 0..=30 {
            let v = swr_from_segments(seg);
            assert!(v >= last);
            last = v;
        }
    }

    #[test]
    fn test_attenuator_two_lengths() {
        assert_eq!(attenuator("RA00"), Ok(CatEvent::Attenuator(0)));
        assert_eq!(attenuator("RA1200"), Ok(CatEvent::Attenuator(12)));
        assert!(attenuator("RA120").is_err());
        assert!(attenuator("RA1").is_err());
    }

    #[test]
    fn test_levels() {
        assert_eq!(af_gain("AG0128"), Ok(CatEvent::AfGain(128)));
        assert_eq!(rf_gain("RG255"), Ok(CatEvent::RfGain(255)));
        assert_eq!(squelch("SQ0000"), Ok(CatEvent::Squelch(0)));
        assert_eq!(power_control("PC100"), Ok(CatEvent::PowerControl(100)));
        assert_eq!(power_control("PC000"), Ok(CatEvent::PowerControl(5)));
        assert_eq!(key_speed("KS020"), Ok(CatEvent::KeySpeed(20)));
        assert_eq!(key_speed("KS099"), Ok(CatEvent::KeySpeed(60)));
    }

    #[test]
    fn test_toggles() {
        assert_eq!(rit("RT1"), Ok(CatEvent::Rit(true)));
        assert_eq!(xit("XT0"), Ok(CatEvent::Xit(false)));
        assert_eq!(noise_blanker("NB2"), Ok(CatEvent::NoiseBlanker(2)));
        assert!(rit("RT2").is_err());
        assert!(rit("RT").is_err());
    }

    #[test]
    fn test_memory_read_with_name() {
        let cmd = "MR00420001425000020010200010FT8     ";
        assert_eq!(cmd.len(), 36);
        let CatEvent::Memory(rec) = memory_read(cmd).unwrap() else { panic!() };
        assert_eq!(rec.channel, 42);
        assert!(!rec.tx_view);
        assert_eq!(rec.frequency_hz, 14_250_000);
        assert_eq!(rec.mode, 2);
        assert!(!rec.data);
        assert!(!rec.lockout);
        assert_eq!(rec.tone_mode, 1);
        assert_eq!(rec.tone_number, 2);
        assert_eq!(rec.ctcss_number, 0);
        assert_eq!(rec.filter, 0);
        assert!(rec.narrow_fm);
        assert!(!rec.split);
        assert_eq!(rec.name, "FT8");
        assert!(rec.valid);
    }

    #[test]
    fn test_memory_read_without_name() {
        let cmd = "MR10010000707400091000000000";
        assert_eq!(cmd.len(), 28);
        let CatEvent::Memory(rec) = memory_read(cmd).unwrap() else { panic!() };
        assert_eq!(rec.channel, 1);
        assert!(rec.tx_view);
        assert_eq!(rec.frequency_hz, 7_074_000);
        assert_eq!(rec.mode, 9);
        assert!(rec.data);
        assert_eq!(rec.name, "");
    }

    #[test]
    fn test_memory_read_rejects_off_by_one() {
        // One short of and one past each of the two valid lengths
        for cmd in [
            "MR1001000070740009100000000",    // 27
            "MR100100007074000910000000000",  // 29
            "MR0042000142500002001020001FT8     ",  // 35
            "MR00420001425000020010200010FT88     ", // 37
        ] {
            assert!(memory_read(cmd).is_err(), "accepted {:?}", cmd);
        }
    }

    #[test]
    fn test_antenna_select() {
        assert_eq!(
            antenna_select("AN210"),
            Ok(CatEvent::AntennaSelect { antenna: 2, rx_antenna: true, drive_out: false })
        );
        assert!(antenna_select("AN010").is_err());
        assert!(antenna_select("AN2").is_err());
    }

    #[test]
    fn test_tx_info() {
        let CatEvent::TxInfo { frequency_hz, mode, data } = tx_info("XI0001407400020").unwrap()
        else {
            panic!()
        };
        assert_eq!(frequency_hz, 14_074_000);
        assert_eq!(mode, 2);
        assert!(!data);

        // Data sub-mode digit folds into mode codes 10-12
        let CatEvent::TxInfo { mode, data, .. } = tx_info("XI0001407400021").unwrap() else {
            panic!()
        };
        assert_eq!(mode, 10);
        assert!(data);

        assert!(tx_info("XI000140740002").is_err());
        assert!(tx_info("XI0001407400029").is_err());
    }

    #[test]
    fn test_transverter_offset() {
        assert_eq!(
            transverter_offset("XO000116000000"),
            Ok(CatEvent::TransverterOffset { offset_hz: 116_000_000, negative: false })
        );
        assert_eq!(
            transverter_offset("XO100116000000"),
            Ok(CatEvent::TransverterOffset { offset_hz: 116_000_000, negative: true })
        );
        assert!(transverter_offset("XO20011600000").is_err());
    }

    #[test]
    fn test_menu_demux() {
        assert_eq!(
            menu("EX05600002"),
            Ok(CatEvent::Menu(MenuItem::TransverterTranslation { enabled: true, power_down: true }))
        );
        assert_eq!(
            menu("EX05600000"),
            Ok(CatEvent::Menu(MenuItem::TransverterTranslation { enabled: false, power_down: false }))
        );
        assert_eq!(menu("EX003000015"), Ok(CatEvent::Menu(MenuItem::BeepLevel(15))));
        assert_eq!(menu("EX003000099"), Ok(CatEvent::Menu(MenuItem::BeepLevel(20))));
        assert_eq!(menu("EX01800001"), Ok(CatEvent::Menu(MenuItem::AutoMode(true))));
        assert!(menu("EX9990000").is_err());
        assert!(menu("EX056").is_err());
    }

    #[test]
    fn test_panel_meta() {
        assert_eq!(panel_meta("UIB200"), Ok(CatEvent::Backlight(200)));
        assert_eq!(panel_meta("UIP3"), Ok(CatEvent::Page(3)));
        assert_eq!(panel_meta("UIV"), Ok(CatEvent::VersionQuery));
        assert!(panel_meta("UIX1").is_err());
    }

    #[test]
    fn test_macro_select() {
        assert_eq!(macro_select("MX07"), Ok(CatEvent::Macro(7)));
        assert!(macro_select("MX7").is_err());
    }

    #[test]
    fn test_agc() {
        assert_eq!(agc("GT005"), Ok(CatEvent::Agc(5)));
        assert_eq!(agc("GT099"), Ok(CatEvent::Agc(20)));
        assert!(agc("GT05").is_err());
    }
}
