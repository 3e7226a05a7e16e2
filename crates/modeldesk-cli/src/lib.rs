//! Building blocks of the `mdk` command-line client.

pub mod args;
pub mod http;
pub mod render;
pub mod store;

pub use http::ReqwestTransport;
pub use store::FileTokenStore;
