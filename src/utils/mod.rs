mod fixpoint;
mod frame;

pub use fixpoint::{run_to_fixpoint, Progress};
pub use frame::Frame;
