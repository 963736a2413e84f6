//! Resolving, publishing and reporting uploads.
//!
//! Every pipeline (screenshot, explicit source, clipboard) produces a
//! [`ResolvedArtifact`] and hands it to [`Uploader`]; failures go through
//! [`fallback::handle`] exactly once.

pub mod clipboard_content;
pub mod dependencies;
pub mod extension;
pub mod fallback;
pub mod fetch;
pub mod history;
pub mod naming;
pub mod orchestrator;
pub mod pipeline;
pub mod source;
pub mod storage;
pub mod temp;
pub mod tools;
pub mod types;

#[cfg(test)]
mod tests;

pub use dependencies::UploadDependencies;
pub use orchestrator::Uploader;
pub use pipeline::{Mode, Pipeline, PipelineOutcome};
pub use types::{
    ClipboardDecision, PathLookup, ResolvedArtifact, UploadError, UploadResult, UploadSource,
};
