mod bgp4mp;
mod table_dump;
mod table_dump_v2;

pub use bgp4mp::parse_bgp4mp;
pub use table_dump::parse_table_dump_message;
pub use table_dump_v2::{parse_peer_index_table, parse_rib_afi_entries};
