//! Pipeline stages for turning a local file into OCR output on disk.
//!
//! Each submodule implements exactly one step, so each can be tested without
//! a network connection.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ backend::submit ──▶ decode ──▶ rewrite ──▶ materialize
//! (path)     (remote OCR)       (base64)   (links)     (files)
//! ```
//!
//! 1. [`input`]   — validate the path and classify it by extension; nothing
//!    else runs if this fails
//! 2. [`decode`]  — strip the data-URI header from an image payload and
//!    base64-decode it
//! 3. [`rewrite`] — point `![id](id)` references at the written image files
//! 4. [`materialize`] — lay out the results directory and write everything

pub mod decode;
pub mod input;
pub mod materialize;
pub mod rewrite;
