//! Query helpers shared by handlers and reconcilers.

pub mod activity;
pub mod venue;
