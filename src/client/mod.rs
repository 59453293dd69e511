// File: ./src/client/mod.rs
pub mod google;
pub mod http;
pub mod reddit;

pub use crate::client::google::GoogleCalendar;
pub use crate::client::http::HttpClient;
pub use crate::client::reddit::RedditFeed;
