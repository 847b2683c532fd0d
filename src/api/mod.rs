//! REST API module.
//!
//! Contains all API routes and handlers following the frontend contract.

mod hackathons;
mod registration;
mod teams;

pub use hackathons::*;
pub use registration::*;
pub use teams::*;

use serde::Serialize;

/// Response carrying only a human-readable message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
