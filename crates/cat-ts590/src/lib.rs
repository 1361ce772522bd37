//! CAT protocol library for the Kenwood TS-590SG family
//!
//! This crate turns the radio's line-oriented ASCII CAT traffic into typed
//! events and back:
//!
//! - [`framer::LineFramer`]: splits the raw serial byte stream into discrete
//!   command strings, tolerant of `;`, CR and LF framing
//! - [`dispatch::decode_command`]: O(1) prefix dispatch into one decoder per
//!   command family, including the embedded-`IF` recovery scan
//! - [`decode`]: the per-family fixed-width positional decoders
//! - [`encode`]: outbound command formatting and wire framing
//!
//! The crate is deliberately free of I/O and long-lived state: callers feed
//! bytes in and get [`CatEvent`] values out. Folding those events into a
//! consistent radio model is the engine crate's job.
//!
//! # Example
//!
//! ```rust
//! use cat_ts590::{decode_command, CatEvent, LineFramer};
//!
//! let mut framer = LineFramer::new();
//! for cmd in framer.push(b"FA00014250000;") {
//!     let event = decode_command(&cmd).unwrap();
//!     assert_eq!(event, CatEvent::VfoAFrequency(14_250_000));
//! }
//! ```

pub mod decode;
pub mod dispatch;
pub mod encode;
pub mod error;
pub mod framer;
pub mod types;

pub use decode::swr_from_segments;
pub use dispatch::decode_command;
pub use encode::{wire_frame, MAX_COMMAND_LEN};
pub use error::ParseError;
pub use framer::LineFramer;
pub use types::{
    mode_char, mode_code, AiMode, CatEvent, IfStatus, MemoryChannel, MenuItem, VfoRole,
};

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use crate::{decode_command, CatEvent};

    proptest! {
        /// Decoding "FA" + any 11-digit string yields that integer value
        #[test]
        fn frequency_round_trip(hz in 0u64..=99_999_999_999) {
            let cmd = format!("FA{:011}", hz);
            prop_assert_eq!(decode_command(&cmd), Ok(CatEvent::VfoAFrequency(hz)));
        }

        /// Any non-digit anywhere in the 11-char field rejects the command
        #[test]
        fn frequency_rejects_corruption(hz in 0u64..=99_999_999_999, pos in 0usize..11) {
            let mut cmd = format!("FA{:011}", hz).into_bytes();
            cmd[2 + pos] = b'x';
            let cmd = String::from_utf8(cmd).unwrap();
            prop_assert!(decode_command(&cmd).is_err());
        }
    }
}
