//! Visit conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::{Event, PhotoVariant};
pub use state::{VisitContext, VisitDetails, VisitState};
pub use transition::transition;
