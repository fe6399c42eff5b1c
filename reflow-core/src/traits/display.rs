//! Display and buzzer collaborator trait

use crate::render::RenderState;
use crate::state::Feedback;

/// Trait for the user-facing frontend (OLED screen and buzzer)
///
/// The frontend is purely a consumer: it receives a snapshot per tick
/// and one-shot notifications, and never gets mutable access to the
/// station state.
pub trait Frontend {
    /// Draw the current station snapshot
    fn render(&mut self, state: &RenderState);

    /// Play the audible cue for a transition event
    ///
    /// Use [`Feedback::tone`] for the stock tone table.
    fn notify(&mut self, feedback: Feedback);
}
