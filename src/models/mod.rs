//! Data structures shared across the crate: network values, AS paths,
//! communities, MRT records, BGP messages, and elements.

mod aspath;
mod bgp;
mod community;
mod elem;
mod mrt;
mod network;

pub use aspath::*;
pub use bgp::*;
pub use community::*;
pub use elem::*;
pub use mrt::*;
pub use network::*;
