// Crate root library declaration and module exports.
pub mod bot;
pub mod calendar;
pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod feed;
pub mod memory;
pub mod model;
pub mod notify;
pub mod observer;
