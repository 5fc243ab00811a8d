//! Route handlers.

pub mod admin;
pub mod sharing;
