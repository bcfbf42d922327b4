pub mod attributes;
pub mod messages;

pub use attributes::parse_attributes;
pub use messages::parse_bgp_message;
