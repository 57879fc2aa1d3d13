//! Best-effort video labels from a third-party speech-to-text service.

pub mod client;
mod poller;

pub use client::{AssemblyAi, JobStatus, TranscriptError, TranscriptJob, TranscriptService};
pub use poller::{label_from_transcript, TranscriptionPoller, FALLBACK_LABEL};
