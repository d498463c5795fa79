//! Small helpers shared across the review pipeline workspace.

pub mod env;
