mod activity;
mod common;
mod venue;
