pub mod client;

pub use client::CoinbaseClient;
