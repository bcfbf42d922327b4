//! MRT TABLE_DUMP (v1) structs
use crate::models::*;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::net::IpAddr;

/// TABLE_DUMP subtypes: the prefix family and the peer ASN width are both
/// keyed off the subtype value, never off a presumed AFI equality.
#[derive(Debug, TryFromPrimitive, IntoPrimitive, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum TableDumpType {
    Ipv4 = 1,
    Ipv6 = 2,
    Ipv4As4 = 3,
    Ipv6As4 = 4,
}

impl TableDumpType {
    pub const fn afi(&self) -> Afi {
        match self {
            TableDumpType::Ipv4 | TableDumpType::Ipv4As4 => Afi::Ipv4,
            TableDumpType::Ipv6 | TableDumpType::Ipv6As4 => Afi::Ipv6,
        }
    }

    pub const fn asn_length(&self) -> AsnLength {
        match self {
            TableDumpType::Ipv4 | TableDumpType::Ipv6 => AsnLength::Bits16,
            TableDumpType::Ipv4As4 | TableDumpType::Ipv6As4 => AsnLength::Bits32,
        }
    }
}

/// TABLE_DUMP message, RFC 6396 section 4.2.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDumpMessage {
    pub view_number: u16,
    pub sequence_number: u16,
    pub prefix: Prefix,
    pub status: u8,
    pub originated_time: u32,
    pub peer_address: IpAddr,
    pub peer_asn: Asn,
    pub attributes: Attributes,
}
