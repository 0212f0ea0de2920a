//! IDF: Idea Factory
//!
//! Keeps a shared portfolio of scored ideas, buffers edits locally until
//! they are saved, and derives rankings, classifications and exports.

pub mod cli;
pub mod core;
pub mod entities;
