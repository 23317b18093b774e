//! Data Transfer Objects for the remote scheduler API
//!
//! These are the JSON bodies sent to and received from the
//! ComputeSchedule resource provider. Field names follow the remote
//! service (camelCase); conversions into domain types live next to them.

pub mod operation;
