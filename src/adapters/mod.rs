pub mod browse;
pub mod http;
pub mod persistence;
pub mod ws;
