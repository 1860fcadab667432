//! HTTP handlers for the profile resource.

pub mod profile;
pub use profile::*;
