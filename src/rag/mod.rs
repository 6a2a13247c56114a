pub mod pipeline;
pub mod prompt;

pub use pipeline::{RagAnswer, RagPipeline};
