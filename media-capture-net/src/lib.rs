//! # media-capture-net
//!
//! HTTP backend for `media-capture-core`.
//!
//! Implements the core's `NoteBackend` and `Transcriber` collaborator
//! traits over blocking `reqwest`: multipart note upload with byte-level
//! progress, detail updates, and audio transcription, with responses
//! classified into the core's typed error taxonomy.

pub mod client;
pub mod progress;
mod response;

pub use client::NoteApiClient;
pub use progress::ProgressReader;
