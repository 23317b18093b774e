//! vmsched Core
//!
//! Core types and abstractions for tracking batch virtual machine operations.
//!
//! This crate contains:
//! - Domain types: operation states, handles and submission results
//! - DTOs: request and response bodies exchanged with the remote scheduler

pub mod domain;
pub mod dto;
