pub mod admin;
pub mod pipeline;

pub use admin::AdminGate;
pub use pipeline::{run_pipeline, Pipeline, RequestView, Stage};
