pub mod messages;
pub mod mrt_record;

pub use messages::*;
pub use mrt_record::{parse_mrt_body, try_parse_mrt_record};
