//! Terminal c-test instrument: passages with half-hidden words, three
//! presentation styles, scored sessions and flat-file result storage.

pub mod app;
pub mod client;
pub mod config;
pub mod event;
pub mod exercise;
pub mod server;
pub mod session;
pub mod store;
pub mod text;
pub mod ui;
