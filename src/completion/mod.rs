mod client;
pub mod dto;
mod transport;

pub use client::CompletionClient;
pub use transport::{ChatTransport, HttpTransport};
