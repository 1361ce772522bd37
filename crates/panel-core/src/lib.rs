//! Panel Engine
//!
//! This crate is the CAT engine behind the TS-590SG touch panel: it folds
//! decoded radio traffic into one consistent VFO/split/transverter model,
//! schedules all polling and boot traffic, and owns the bounded queues
//! between the serial link and the decode worker.
//!
//! # Architecture
//!
//! A small number of cooperatively scheduled workers communicate only
//! through bounded queues and the publication sink:
//!
//! - the serial task ([`serial::SerialLink`]) frames inbound bytes into the
//!   [`queue::InboundQueue`] and drains the outbound writer channel
//! - the actor ([`actor::run_panel_actor`]) is the single decode worker: it
//!   owns the [`engine::Engine`] and every scheduler timer
//! - consumers (the GUI) receive copies of state through the
//!   [`sink::StatusSink`] crossing point and never touch live structures
//!
//! Within one command's decode, all state mutation completes before its
//! publication; across commands, publish order matches decode order. No
//! operation here blocks indefinitely.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Instant;
//! use panel_core::{Engine, RecordingSink, StatusSink};
//!
//! let sink = Arc::new(RecordingSink::new());
//! let dyn_sink: Arc<dyn StatusSink> = sink.clone();
//! let mut engine = Engine::new(dyn_sink);
//!
//! engine.handle_command("FA00014250000", Instant::now());
//! assert_eq!(engine.vfo().last_display().unwrap().active_hz, 14_250_000);
//! ```

pub mod actor;
pub mod antenna;
pub mod engine;
pub mod error;
pub mod queue;
pub mod scheduler;
pub mod serial;
pub mod sink;
pub mod storage;
pub mod transverter;
pub mod vfo;

pub use actor::{run_panel_actor, PanelCommand};
pub use antenna::{AntennaEvent, AntennaRequest, AntennaSystem, RelayEntry};
pub use engine::Engine;
pub use error::EngineError;
pub use queue::{InboundQueue, OutboundQueue};
pub use scheduler::{BootPhase, PollScheduler, BOOT_SEQUENCE};
pub use serial::SerialLink;
pub use sink::{BlobValue, ChannelSink, NullSink, Publication, RecordingSink, StatusSink, Topic};
pub use storage::{FileNameStore, NameStore};
pub use transverter::{EnableRecord, OffsetRecord, Transverter};
pub use vfo::{VfoDisplay, VfoReconciler};
