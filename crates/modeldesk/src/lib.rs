//! modeldesk: the console's shared logic together with its host server.
//!
//! Most users want the `mdk` binary from `modeldesk-cli`; this crate is for
//! embedding the same client and host in another program.

pub use modeldesk_core::*;
pub use modeldesk_server as server;
