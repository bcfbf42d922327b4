//! Caller-owned shared stores: the deduplicating AS-path store and the peer
//! signature map.

mod path_store;
mod peer_map;

pub use path_store::*;
pub use peer_map::*;
