//! Repository layer
//!
//! Repositories abstract the remote calls the tracker depends on. The
//! polling session only sees the traits, so tests can script responses
//! without a network.

mod operations;

// Re-export traits
pub use operations::{ErrorQuery, StatusQuery};

// Re-export implementations
pub use operations::HttpOperationRepository;
