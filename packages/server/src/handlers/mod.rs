pub mod activity;
pub mod auth;
pub mod user;
pub mod venue;
