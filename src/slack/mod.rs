pub mod interface;
pub mod client;
pub mod commands;
pub mod events;

pub use interface::ChatPlatform;
pub use client::SlackClient;
