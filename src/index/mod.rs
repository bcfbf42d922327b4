//! Prefix indexing structures: the Patricia trie and the unique-address
//! coverage counter.

mod ip_counter;
mod patricia;

pub use ip_counter::*;
pub use patricia::*;
