//! Infrastructure layer
//!
//! Handles filesystem access and external processes.

pub mod cmake;
pub mod detect;
pub mod dirs;
pub mod export;
pub mod filesystem;
pub mod stamp;
