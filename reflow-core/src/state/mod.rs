//! Station state vocabulary
//!
//! Modes, menu items, decoded input and audible feedback shared between
//! the controller and its collaborators.

pub mod events;
pub mod mode;

pub use events::{Feedback, InputEvents, Tone};
pub use mode::{MenuItem, ModeKind, SetupField};
