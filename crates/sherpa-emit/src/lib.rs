pub mod emitter;
pub mod instrument;

pub use emitter::{EmitError, Emitter, TrackPayload};
pub use instrument::ScrollMilestones;
