//! Publication sink: the single crossing point from the engine to the GUI
//!
//! Decoders and the reconciler never call into display code. Everything
//! user-visible leaves the engine through [`StatusSink`]: a scalar, a typed
//! blob, or a bare notification per topic. Implementations must not block -
//! the engine fires and forgets, and has no idea how many observers sit
//! downstream.

use std::sync::Mutex;

use cat_ts590::{IfStatus, MemoryChannel};
use tokio::sync::mpsc;
use tracing::debug;

use crate::antenna::AntennaSystem;
use crate::transverter::{EnableRecord, OffsetRecord};
use crate::vfo::VfoDisplay;

/// Publication topics, 1:1 with the semantic fields of the radio model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Topic {
    /// S-meter segments
    SMeter,
    /// Raw SWR segments
    SwrRaw,
    /// Calibrated SWR, in hundredths
    Swr,
    /// Compression meter segments
    Comp,
    /// ALC meter segments
    Alc,
    /// Transmitting flag
    TxStatus,
    /// Split flag
    SplitStatus,
    /// TF-Set flag
    TfSet,
    /// Consolidated VFO display update
    VfoDisplay,
    /// Full IF status snapshot
    IfSnapshot,
    /// Memory channel record
    MemoryChannel,
    /// Antenna system snapshot
    AntennaState,
    /// Antenna connector selection
    AntennaConnector,
    /// RX antenna input flag
    RxAntenna,
    /// Drive output flag
    DriveOut,
    /// Transverter offset record
    TransverterOffset,
    /// Transverter enable record
    TransverterEnable,
    /// Transmit frequency (display-side)
    TxFrequency,
    /// Operating mode code
    Mode,
    /// Data sub-mode flag
    DataMode,
    /// Radio power status
    PowerStatus,
    /// AGC time constant
    Agc,
    /// Auto-information mode
    AiMode,
    /// Radio identification
    Identity,
    /// Firmware version string
    FirmwareVersion,
    /// Microcode type string
    Microcode,
    /// RIT flag
    Rit,
    /// XIT flag
    Xit,
    /// AF gain
    AfGain,
    /// RF gain
    RfGain,
    /// Squelch level
    Squelch,
    /// Output power setting
    PowerControl,
    /// Microphone gain
    MicGain,
    /// Keyer speed
    KeySpeed,
    /// Noise blanker level
    NoiseBlanker,
    /// Noise reduction level
    NoiseReduction,
    /// Beat cancel level
    BeatCancel,
    /// Notch flag
    Notch,
    /// Preamp flag
    Preamp,
    /// VOX flag
    Vox,
    /// Speech processor flag
    Processor,
    /// Attenuator level
    Attenuator,
    /// High cutoff index
    FilterHigh,
    /// Low cutoff index
    FilterLow,
    /// Roofing filter selector
    RoofingFilter,
    /// Tone index
    ToneNumber,
    /// Tone flag
    ToneOn,
    /// Menu item value
    MenuItem,
    /// Panel macro selection
    Macro,
    /// Panel backlight level
    Backlight,
    /// Panel page selection
    Page,
    /// Panel version handshake
    PanelVersion,
}

/// Typed blob payloads for [`StatusSink::publish_blob`]
#[derive(Debug, Clone, PartialEq)]
pub enum BlobValue {
    /// IF status snapshot
    Status(IfStatus),
    /// Consolidated VFO display tuple
    VfoDisplay(VfoDisplay),
    /// Memory channel record
    Memory(MemoryChannel),
    /// Antenna system snapshot
    Antenna(AntennaSystem),
    /// Transverter offset record
    TransverterOffset(OffsetRecord),
    /// Transverter enable record
    TransverterEnable(EnableRecord),
    /// Free-text payload (version strings, power-on message)
    Text(String),
}

/// One publication, as carried by [`ChannelSink`]
#[derive(Debug, Clone, PartialEq)]
pub enum Publication {
    /// Scalar update
    Scalar {
        /// Topic the value belongs to
        topic: Topic,
        /// The value
        value: i64,
    },
    /// Blob update
    Blob {
        /// Topic the blob belongs to
        topic: Topic,
        /// The payload
        value: BlobValue,
    },
    /// Data is already in a shared buffer; just signal
    Notify {
        /// Topic to signal
        topic: Topic,
    },
}

/// The observer bridge the engine publishes through
///
/// All three calls are fire-and-forget and must not block.
pub trait StatusSink: Send + Sync {
    /// Publish an integer value for a topic
    fn publish_scalar(&self, topic: Topic, value: i64);

    /// Publish a typed blob for a topic
    fn publish_blob(&self, topic: Topic, value: &BlobValue);

    /// Signal a topic whose data is already shared out-of-band
    fn notify(&self, topic: Topic);
}

/// Sink that forwards publications over a bounded channel
///
/// Uses `try_send`: when the consumer falls behind, publications are dropped
/// rather than blocking the decode worker.
pub struct ChannelSink {
    tx: mpsc::Sender<Publication>,
}

impl ChannelSink {
    /// Create a sink and the receiving end for the consumer
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Publication>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    fn forward(&self, publication: Publication) {
        if self.tx.try_send(publication).is_err() {
            debug!("publication dropped: consumer behind");
        }
    }
}

impl StatusSink for ChannelSink {
    fn publish_scalar(&self, topic: Topic, value: i64) {
        self.forward(Publication::Scalar { topic, value });
    }

    fn publish_blob(&self, topic: Topic, value: &BlobValue) {
        self.forward(Publication::Blob { topic, value: value.clone() });
    }

    fn notify(&self, topic: Topic) {
        self.forward(Publication::Notify { topic });
    }
}

/// Sink that discards everything
pub struct NullSink;

impl StatusSink for NullSink {
    fn publish_scalar(&self, _topic: Topic, _value: i64) {}
    fn publish_blob(&self, _topic: Topic, _value: &BlobValue) {}
    fn notify(&self, _topic: Topic) {}
}

/// Sink that records every publication, for tests and diagnostics
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Publication>>,
}

impl RecordingSink {
    /// Create an empty recording sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far
    pub fn events(&self) -> Vec<Publication> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Publications for one topic
    pub fn for_topic(&self, topic: Topic) -> Vec<Publication> {
        self.events()
            .into_iter()
            .filter(|p| match p {
                Publication::Scalar { topic: t, .. }
                | Publication::Blob { topic: t, .. }
                | Publication::Notify { topic: t } => *t == topic,
            })
            .collect()
    }

    /// Count of publications for one topic
    pub fn count(&self, topic: Topic) -> usize {
        self.for_topic(topic).len()
    }

    /// Drop everything recorded so far
    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl StatusSink for RecordingSink {
    fn publish_scalar(&self, topic: Topic, value: i64) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Publication::Scalar { topic, value });
    }

    fn publish_blob(&self, topic: Topic, value: &BlobValue) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Publication::Blob { topic, value: value.clone() });
    }

    fn notify(&self, topic: Topic) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Publication::Notify { topic });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_forwards() {
        let (sink, mut rx) = ChannelSink::new(8);
        sink.publish_scalar(Topic::SMeter, 12);
        sink.notify(Topic::PanelVersion);

        assert_eq!(
            rx.try_recv().unwrap(),
            Publication::Scalar { topic: Topic::SMeter, value: 12 }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            Publication::Notify { topic: Topic::PanelVersion }
        );
    }

    #[test]
    fn test_channel_sink_drops_when_full() {
        let (sink, mut rx) = ChannelSink::new(1);
        sink.publish_scalar(Topic::SMeter, 1);
        sink.publish_scalar(Topic::SMeter, 2); // dropped, consumer behind

        assert_eq!(
            rx.try_recv().unwrap(),
            Publication::Scalar { topic: Topic::SMeter, value: 1 }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_recording_sink_filters_by_topic() {
        let sink = RecordingSink::new();
        sink.publish_scalar(Topic::SMeter, 3);
        sink.publish_scalar(Topic::Alc, 4);
        sink.publish_scalar(Topic::SMeter, 5);

        assert_eq!(sink.count(Topic::SMeter), 2);
        assert_eq!(sink.count(Topic::Alc), 1);
        assert_eq!(sink.count(Topic::Comp), 0);
    }
}
