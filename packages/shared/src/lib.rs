//! Shared utilities for the typing race workspace.

pub mod logger;
pub mod time;
