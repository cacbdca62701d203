pub mod http;
pub mod traits;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use http::HttpBackend;
pub use traits::Backend;
