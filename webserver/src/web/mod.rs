//! Web layer: routing lives in `WebServer`, request handling here

pub mod handlers;
