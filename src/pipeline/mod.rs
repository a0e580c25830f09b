//! Workflow stages for a single PDF conversion.
//!
//! Each submodule implements exactly one step and talks to the service only
//! through [`crate::transport::Transport`].
//!
//! ## Data Flow
//!
//! ```text
//! source.pdf ──▶ upload ──▶ poll ──▶ download ──▶ destination
//!               (pdf-file)  (pdf/id)  (pdf/id.fmt)
//! ```
//!
//! 1. [`pipe`]     — bounded producer/consumer that streams the source file
//!    into the request body from a spawned task
//! 2. [`upload`]   — multipart POST, yields the job id
//! 3. [`poll`]     — fixed-interval status checks until 100 %
//! 4. [`download`] — streams the result into an atomically renamed file

pub mod download;
pub mod pipe;
pub mod poll;
pub mod upload;
