// Adapters layer: concrete implementations for external systems (upstream http client, http server).

pub mod http;
pub mod server;
