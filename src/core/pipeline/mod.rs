// The four pipeline stages and the orchestrator that runs them in order.
// - `file_collector.rs` is get_file.
// - `creative_remover.rs` and `performance_conditions.rs` handle Time Managed rows.
// - `creative_uploader.rs` handles Upload rows.
// - `mapping_refresher.rs` rebuilds the Mapping sheet.

pub mod creative_remover;
pub mod creative_uploader;
pub mod file_collector;
pub mod mapping_refresher;
pub mod orchestrator;
pub mod performance_conditions;

pub use creative_uploader::UploaderOptions;
pub use orchestrator::{Pipeline, PipelineSettings, Stage};
