//! Typed representations of decoded CAT traffic
//!
//! Every command family the panel understands decodes into one [`CatEvent`]
//! variant. The engine crate folds these events into its reconciled state;
//! nothing here performs I/O or holds long-lived state.

/// VFO role as reported in the `IF` P10 / `FR` / `FT` function fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VfoRole {
    /// VFO A (function digit 0)
    A,
    /// VFO B (function digit 1)
    B,
    /// Memory channel (function digit 2)
    Memory,
}

impl VfoRole {
    /// Decode a function digit, `None` for anything outside 0..=2
    pub fn from_ascii(digit: u8) -> Option<Self> {
        match digit {
            b'0' => Some(VfoRole::A),
            b'1' => Some(VfoRole::B),
            b'2' => Some(VfoRole::Memory),
            _ => None,
        }
    }

    /// Function digit for encoding
    pub fn as_digit(self) -> char {
        match self {
            VfoRole::A => '0',
            VfoRole::B => '1',
            VfoRole::Memory => '2',
        }
    }

    /// The opposite free-running VFO; memory maps to A
    pub fn other(self) -> Self {
        match self {
            VfoRole::A => VfoRole::B,
            VfoRole::B => VfoRole::A,
            VfoRole::Memory => VfoRole::A,
        }
    }

    /// Index into per-role storage
    pub fn index(self) -> usize {
        match self {
            VfoRole::A => 0,
            VfoRole::B => 1,
            VfoRole::Memory => 2,
        }
    }
}

/// Auto-information reporting mode (`AI` command)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AiMode {
    /// Not yet reported by the radio
    #[default]
    Unknown,
    /// AI0 - radio only answers queries
    Off,
    /// AI2 - radio pushes status changes
    On,
    /// AI3 - AI2 plus periodic backup reports
    OnBackup,
}

impl AiMode {
    /// Decode the AI parameter digit
    pub fn from_ascii(digit: u8) -> Self {
        match digit {
            b'0' => AiMode::Off,
            b'2' => AiMode::On,
            b'3' => AiMode::OnBackup,
            _ => AiMode::Unknown,
        }
    }

    /// The set-command that asserts this mode, if it is a concrete mode
    pub fn set_command(self) -> Option<&'static str> {
        match self {
            AiMode::Off => Some("AI0"),
            AiMode::On => Some("AI2"),
            AiMode::OnBackup => Some("AI3"),
            AiMode::Unknown => None,
        }
    }

    /// Whether this is one of the reporting-enabled variants
    pub fn is_on(self) -> bool {
        matches!(self, AiMode::On | AiMode::OnBackup)
    }
}

/// One decoded `IF` status frame
///
/// Replaced wholesale on every successful `IF` parse. Sub-fields that are
/// missing or invalid decode to zero/false instead of failing the frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IfStatus {
    /// VFO frequency in Hz (11 digits on the wire)
    pub frequency_hz: u64,
    /// RIT/XIT offset, clamped to +-9990 Hz
    pub rit_offset: i16,
    /// RIT engaged
    pub rit_on: bool,
    /// XIT engaged
    pub xit_on: bool,
    /// Memory channel 0-999
    pub memory_channel: u16,
    /// Radio is transmitting
    pub transmitting: bool,
    /// Operating mode code (data sub-modes A/B/C as 10/11/12)
    pub mode: u8,
    /// VFO function: which role the frequency field describes
    pub function: Option<VfoRole>,
    /// Scan in progress
    pub scanning: bool,
    /// Split operation engaged
    pub split: bool,
    /// Tone mode: 0=off, 1=tone, 2=CTCSS
    pub tone_mode: u8,
    /// Tone/CTCSS index 0-42
    pub tone_number: u8,
    /// Trailing reserved digit, always zero on this firmware
    pub reserved: u8,
}

/// One decoded memory-channel record (`MR` response)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryChannel {
    /// Channel number 0-999
    pub channel: u16,
    /// This record describes the TX side of a split channel
    pub tx_view: bool,
    /// Stored frequency in Hz
    pub frequency_hz: u64,
    /// Operating mode code
    pub mode: u8,
    /// Data sub-mode engaged
    pub data: bool,
    /// Channel excluded from scan
    pub lockout: bool,
    /// Tone mode: 0=off, 1=tone, 2=CTCSS
    pub tone_mode: u8,
    /// Tone index 0-42
    pub tone_number: u8,
    /// CTCSS index 0-42
    pub ctcss_number: u8,
    /// IF filter selector
    pub filter: u8,
    /// Narrow FM deviation
    pub narrow_fm: bool,
    /// Channel stores a split pair
    pub split: bool,
    /// Channel name, up to 8 chars, trailing spaces trimmed
    pub name: String,
    /// Record decoded successfully
    pub valid: bool,
}

/// A decoded `EX` menu item, demultiplexed on the 3-digit menu number
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MenuItem {
    /// Menu 000: power-on message, up to 8 chars
    PowerOnMessage(String),
    /// Menu 003: beep output level 0-20
    BeepLevel(u8),
    /// Menu 005: CW sidetone level 0-20
    SidetoneLevel(u8),
    /// Menu 018: automatic mode selection by frequency
    AutoMode(bool),
    /// Menu 024: number of quick memories, 0-10
    QuickMemories(u8),
    /// Menu 036: meter peak hold
    MeterPeakHold(bool),
    /// Menu 041: display backlight color 0-2
    BacklightColor(u8),
    /// Menu 056: radio-side transverter frequency translation
    TransverterTranslation {
        /// Translation applied by the radio itself
        enabled: bool,
        /// Translation with exciter power-down
        power_down: bool,
    },
    /// Menu 071: TX timeout timer in minutes, 0-30
    TxTimeout(u8),
    /// Menu 087: CAT baud rate selector 0-4
    CatBaudRate(u8),
}

/// One decoded inbound CAT command
///
/// Exactly one variant per command family; the dispatcher produces these and
/// the engine consumes them.
#[derive(Debug, Clone, PartialEq)]
pub enum CatEvent {
    /// `FA` - VFO A frequency in Hz
    VfoAFrequency(u64),
    /// `FB` - VFO B frequency in Hz
    VfoBFrequency(u64),
    /// `IF` - full status frame
    Status(IfStatus),
    /// `FR` - receive VFO function
    RxFunction(VfoRole),
    /// `FT` - transmit VFO function
    TxFunction(VfoRole),
    /// `TX`/`RX` - transmit state
    Transmit(bool),
    /// `TS` - TF-Set (transmit frequency preview) engaged
    TfSet(bool),
    /// `MD` - operating mode code
    Mode(u8),
    /// `DA` - data sub-mode engaged
    DataMode(bool),
    /// `PS` - power status
    Power(bool),
    /// `AI` - auto-information mode
    AutoInfo(AiMode),
    /// `ID` - radio identification string
    Identity(String),
    /// `GT` - AGC time constant 0-20
    Agc(u8),
    /// `FV` - firmware version string
    FirmwareVersion(String),
    /// `TY` - microcode type string
    Microcode(String),
    /// `SM` - S-meter segments 0-30
    SMeter(u8),
    /// `RM1` - SWR segments plus calibrated SWR value
    Swr {
        /// Raw meter segments 0-30
        segments: u8,
        /// Piecewise-linear calibrated SWR
        calibrated: f32,
    },
    /// `RM2` - compression meter segments 0-30
    Comp(u8),
    /// `RM3` - ALC meter segments 0-30
    Alc(u8),
    /// `RA` - RF attenuator level
    Attenuator(u8),
    /// `AG` - AF gain 0-255
    AfGain(u8),
    /// `RG` - RF gain 0-255
    RfGain(u8),
    /// `SQ` - squelch level 0-255
    Squelch(u8),
    /// `PC` - output power 5-100 W
    PowerControl(u8),
    /// `MG` - microphone gain 0-100
    MicGain(u8),
    /// `KS` - keyer speed 4-60 WPM
    KeySpeed(u8),
    /// `RT` - RIT engaged
    Rit(bool),
    /// `XT` - XIT engaged
    Xit(bool),
    /// `NB` - noise blanker 0-2
    NoiseBlanker(u8),
    /// `NR` - noise reduction 0-2
    NoiseReduction(u8),
    /// `BC` - beat cancel 0-2
    BeatCancel(u8),
    /// `NT` - notch filter engaged
    Notch(bool),
    /// `PA` - preamp engaged
    Preamp(bool),
    /// `VX` - VOX engaged
    Vox(bool),
    /// `PR` - speech processor engaged
    Processor(bool),
    /// `SH` - high cutoff index
    FilterHigh(u8),
    /// `SL` - low cutoff index
    FilterLow(u8),
    /// `FL` - roofing filter selector 0-2
    RoofingFilter(u8),
    /// `TN` - tone index 0-42
    ToneNumber(u8),
    /// `TO` - tone engaged
    ToneOn(bool),
    /// `MR` - memory channel record
    Memory(MemoryChannel),
    /// `AN` - antenna selection
    AntennaSelect {
        /// Antenna connector 1-2
        antenna: u8,
        /// RX antenna input engaged
        rx_antenna: bool,
        /// Drive output engaged
        drive_out: bool,
    },
    /// `XI` - transmit frequency and mode
    TxInfo {
        /// Transmit frequency in Hz
        frequency_hz: u64,
        /// Mode code, data sub-modes folded in
        mode: u8,
        /// Data sub-mode engaged
        data: bool,
    },
    /// `XO` - transverter offset record
    TransverterOffset {
        /// Offset magnitude in Hz
        offset_hz: u64,
        /// Offset direction: subtract instead of add
        negative: bool,
    },
    /// `EX` - menu item value
    Menu(MenuItem),
    /// `MX` - panel macro number 0-99
    Macro(u8),
    /// `UIB` - panel backlight level 0-255
    Backlight(u8),
    /// `UIP` - panel page selector
    Page(u8),
    /// `UIV` - panel version handshake
    VersionQuery,
}

/// Map a mode character to its numeric code
///
/// `0`-`9` map directly; the data sub-modes `A`/`B`/`C` map to 10/11/12.
pub fn mode_code(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A' => Some(10),
        b'B' => Some(11),
        b'C' => Some(12),
        _ => None,
    }
}

/// Mode character for a numeric mode code
pub fn mode_char(code: u8) -> Option<char> {
    match code {
        0..=9 => Some((b'0' + code) as char),
        10 => Some('A'),
        11 => Some('B'),
        12 => Some('C'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [VfoRole::A, VfoRole::B, VfoRole::Memory] {
            assert_eq!(VfoRole::from_ascii(role.as_digit() as u8), Some(role));
        }
        assert_eq!(VfoRole::from_ascii(b'3'), None);
        assert_eq!(VfoRole::from_ascii(b'x'), None);
    }

    #[test]
    fn test_role_other() {
        assert_eq!(VfoRole::A.other(), VfoRole::B);
        assert_eq!(VfoRole::B.other(), VfoRole::A);
        assert_eq!(VfoRole::Memory.other(), VfoRole::A);
    }

    #[test]
    fn test_ai_mode_mapping() {
        assert_eq!(AiMode::from_ascii(b'0'), AiMode::Off);
        assert_eq!(AiMode::from_ascii(b'2'), AiMode::On);
        assert_eq!(AiMode::from_ascii(b'3'), AiMode::OnBackup);
        assert_eq!(AiMode::from_ascii(b'7'), AiMode::Unknown);
        assert!(AiMode::On.is_on());
        assert!(AiMode::OnBackup.is_on());
        assert!(!AiMode::Off.is_on());
        assert_eq!(AiMode::On.set_command(), Some("AI2"));
        assert_eq!(AiMode::Unknown.set_command(), None);
    }

    #[test]
    fn test_mode_code_data_submodes() {
        assert_eq!(mode_code(b'1'), Some(1));
        assert_eq!(mode_code(b'9'), Some(9));
        assert_eq!(mode_code(b'A'), Some(10));
        assert_eq!(mode_code(b'C'), Some(12));
        assert_eq!(mode_code(b'D'), None);
        assert_eq!(mode_char(10), Some('A'));
        assert_eq!(mode_char(13), None);
    }
}
