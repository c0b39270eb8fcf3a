//! # vox-cli
//!
//! Command-line front end for [`vox_rag`].
//!
//! ## Commands
//!
//! - `vox ingest <FILE>...` - parse, chunk, embed and store documents
//! - `vox ask <QUESTION>` - answer from the stored documents and write an MP3
//! - `vox voices` - list the supported voices
//! - `vox console` - interactive session with history
//!
//! `OPENAI_API_KEY` is required. `QDRANT_URL` and `QDRANT_API_KEY` select a
//! Qdrant collection; without them an in-memory store lives for the duration
//! of the process. Variables are also read from a `.env` file.

pub mod cli;
pub mod commands;
pub mod console;
pub mod session;

pub use cli::{Cli, Commands, PipelineOptions};
pub use session::{ConsoleCommand, ConsoleSession};
