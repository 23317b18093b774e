//! Core domain types
//!
//! This module contains the vocabulary shared by the client, the tracker
//! and the CLI: what an operation is, which states it can be in, and what a
//! batch submission hands back for each requested resource.

pub mod operation;
pub mod request;
pub mod submission;
