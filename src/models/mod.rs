//! Data models for the HackMate backend.
//!
//! Wire names are camelCase to match the frontend contract.

mod hackathon;
mod registration;
mod team;

pub use hackathon::*;
pub use registration::*;
pub use team::*;
