//! MRT TABLE_DUMP_V2 structs, RFC 6396 section 4.3.
use crate::models::*;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::net::{IpAddr, Ipv4Addr};

/// TABLE_DUMP_V2 subtypes.
///
/// RIB_IPV4_MULTICAST and RIB_IPV6_MULTICAST are accepted but not
/// interpreted; RIB_GENERIC is reserved.
#[derive(Debug, TryFromPrimitive, IntoPrimitive, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum TableDumpV2Type {
    PeerIndexTable = 1,
    RibIpv4Unicast = 2,
    RibIpv4Multicast = 3,
    RibIpv6Unicast = 4,
    RibIpv6Multicast = 5,
    RibGeneric = 6,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableDumpV2Message {
    PeerIndexTable(PeerIndexTable),
    RibAfiEntries(RibAfiEntries),
}

/// One peer descriptor from the PEER_INDEX_TABLE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Peer {
    pub afi: Afi,
    pub peer_bgp_id: Ipv4Addr,
    pub peer_address: IpAddr,
    pub peer_asn: Asn,
}

/// The per-stream table of peer descriptors referenced by index from RIB
/// records. A new PEER_INDEX_TABLE record replaces the previous table
/// wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeerIndexTable {
    pub collector_bgp_id: Ipv4Addr,
    /// Cleared (not truncated) when the wire value exceeds 255 bytes.
    pub view_name: String,
    pub peers: Vec<Peer>,
}

impl Default for PeerIndexTable {
    fn default() -> Self {
        PeerIndexTable {
            collector_bgp_id: Ipv4Addr::UNSPECIFIED,
            view_name: String::new(),
            peers: vec![],
        }
    }
}

impl Default for Peer {
    fn default() -> Self {
        Peer {
            afi: Afi::Ipv4,
            peer_bgp_id: Ipv4Addr::UNSPECIFIED,
            peer_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            peer_asn: Asn::RESERVED,
        }
    }
}

impl PeerIndexTable {
    pub fn get_peer(&self, index: u16) -> Option<&Peer> {
        self.peers.get(index as usize)
    }
}

/// A RIB_IPV4_UNICAST or RIB_IPV6_UNICAST record: one prefix and its route
/// entries.
#[derive(Debug, Clone, PartialEq)]
pub struct RibAfiEntries {
    pub rib_type: TableDumpV2Type,
    pub sequence_number: u32,
    pub prefix: Prefix,
    pub rib_entries: Vec<RibEntry>,
}

/// One route entry of a RIB record. The peer is resolved against the
/// stream's peer index table at decode time and copied in, so the entry
/// stays valid after the table is replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct RibEntry {
    pub peer_index: u16,
    pub peer: Peer,
    pub originated_time: u32,
    pub attributes: Attributes,
}
