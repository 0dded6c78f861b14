//! HTTP clients

mod feed_client;

pub use feed_client::IcsFeedClient;
