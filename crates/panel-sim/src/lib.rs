//! Simulated TS-590SG
//!
//! A protocol-accurate stand-in for the radio: answers CAT queries from its
//! state, applies sets, and (with auto-info on) pushes unsolicited reports,
//! so the engine can be exercised end-to-end without hardware.

pub mod radio;
pub mod task;

pub use radio::{SimConfig, SimRadio};
pub use task::run_sim_task;
