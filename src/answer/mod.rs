/// Streamed answers: chunk model and the aggregator that consumes them.
pub mod aggregate;
pub mod chunk;

pub use aggregate::StreamingAnswerAggregator;
pub use chunk::{AnswerChunk, Citation};
