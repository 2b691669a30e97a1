pub mod activity;
pub mod user;
pub mod venue;
