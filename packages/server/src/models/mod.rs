pub mod activity;
pub mod auth;
pub mod shared;
pub mod venue;
