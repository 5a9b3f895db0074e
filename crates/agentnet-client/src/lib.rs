pub mod connection;
pub mod http;
pub mod protocol;

pub use connection::ConnectionClient;
pub use http::HttpBackend;
