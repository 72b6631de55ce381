//! PII data model and processing pipeline.

mod pipeline;
mod span;

pub use pipeline::PiiPipeline;
pub use span::PiiSpan;
