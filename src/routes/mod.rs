//! Router Module Index
//!
//! Routes are grouped by the access policy their layer enforces, so a handler's
//! protection follows from the file it is registered in.

/// Routes open to anyone.
pub mod public;

/// Routes behind `AccessPolicy::Authenticated`.
pub mod authenticated;

/// Routes behind `AccessPolicy::Role("admin")`.
pub mod admin;
