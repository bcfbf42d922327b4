//! BGP attribute structs
use crate::models::*;
use bitflags::bitflags;
use bytes::Bytes;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt::{Display, Formatter};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

bitflags! {
    /// Attribute flags octet, RFC 4271 section 4.3.
    ///
    /// Bit 0 is the Optional bit, bit 1 the Transitive bit, bit 2 the
    /// Partial bit, and bit 3 the Extended Length bit.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct AttrFlags: u8 {
        const OPTIONAL   = 0b10000000;
        const TRANSITIVE = 0b01000000;
        const PARTIAL    = 0b00100000;
        const EXTENDED   = 0b00010000;
    }
}

/// Attribute type codes accepted by the decoder.
///
/// <https://www.iana.org/assignments/bgp-parameters/bgp-parameters.xhtml#bgp-parameters-2>
#[allow(non_camel_case_types)]
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttrType {
    ORIGIN,
    AS_PATH,
    NEXT_HOP,
    MULTI_EXIT_DISCRIMINATOR,
    LOCAL_PREFERENCE,
    ATOMIC_AGGREGATE,
    AGGREGATOR,
    COMMUNITIES,
    ORIGINATOR_ID,
    CLUSTER_LIST,
    MP_REACHABLE_NLRI,
    MP_UNREACHABLE_NLRI,
    AS4_PATH,
    AS4_AGGREGATOR,
    /// Catch all for any unknown attribute types
    Unknown(u8),
}

impl From<u8> for AttrType {
    fn from(value: u8) -> Self {
        match value {
            1 => AttrType::ORIGIN,
            2 => AttrType::AS_PATH,
            3 => AttrType::NEXT_HOP,
            4 => AttrType::MULTI_EXIT_DISCRIMINATOR,
            5 => AttrType::LOCAL_PREFERENCE,
            6 => AttrType::ATOMIC_AGGREGATE,
            7 => AttrType::AGGREGATOR,
            8 => AttrType::COMMUNITIES,
            9 => AttrType::ORIGINATOR_ID,
            10 => AttrType::CLUSTER_LIST,
            14 => AttrType::MP_REACHABLE_NLRI,
            15 => AttrType::MP_UNREACHABLE_NLRI,
            17 => AttrType::AS4_PATH,
            18 => AttrType::AS4_AGGREGATOR,
            v => AttrType::Unknown(v),
        }
    }
}

impl From<AttrType> for u8 {
    fn from(value: AttrType) -> Self {
        match value {
            AttrType::ORIGIN => 1,
            AttrType::AS_PATH => 2,
            AttrType::NEXT_HOP => 3,
            AttrType::MULTI_EXIT_DISCRIMINATOR => 4,
            AttrType::LOCAL_PREFERENCE => 5,
            AttrType::ATOMIC_AGGREGATE => 6,
            AttrType::AGGREGATOR => 7,
            AttrType::COMMUNITIES => 8,
            AttrType::ORIGINATOR_ID => 9,
            AttrType::CLUSTER_LIST => 10,
            AttrType::MP_REACHABLE_NLRI => 14,
            AttrType::MP_UNREACHABLE_NLRI => 15,
            AttrType::AS4_PATH => 17,
            AttrType::AS4_AGGREGATOR => 18,
            AttrType::Unknown(v) => v,
        }
    }
}

/// BGP origin attribute, RFC 4271.
#[derive(Debug, TryFromPrimitive, IntoPrimitive, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Origin {
    IGP = 0,
    EGP = 1,
    INCOMPLETE = 2,
}

impl Display for Origin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::IGP => write!(f, "IGP"),
            Origin::EGP => write!(f, "EGP"),
            Origin::INCOMPLETE => write!(f, "INCOMPLETE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aggregator {
    pub asn: Asn,
    pub addr: Ipv4Addr,
}

/// MP_REACH_NLRI next hop, RFC 4760 / RFC 2545.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NextHopAddress {
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    Ipv6LinkLocal(Ipv6Addr, Ipv6Addr),
}

impl NextHopAddress {
    /// The global address, dropping any link-local companion.
    pub const fn addr(&self) -> IpAddr {
        match self {
            NextHopAddress::Ipv4(a) => IpAddr::V4(*a),
            NextHopAddress::Ipv6(a) => IpAddr::V6(*a),
            NextHopAddress::Ipv6LinkLocal(a, _) => IpAddr::V6(*a),
        }
    }
}

/// One MP_REACH_NLRI or MP_UNREACH_NLRI payload. At most one per
/// (AFI, SAFI) pair may appear in a message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MpNlri {
    pub afi: Afi,
    pub safi: Safi,
    /// Present for reachable NLRI only.
    pub next_hop: Option<NextHopAddress>,
    pub prefixes: Vec<Prefix>,
}

/// A truncated trailing NLRI: the declared prefix length with however many
/// address bytes were actually present.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IncompleteNlri {
    pub afi: Afi,
    pub orig_len: u8,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub partial_bytes: Vec<u8>,
}

/// An attribute the decoder does not interpret, kept as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrRaw {
    pub flags: AttrFlags,
    pub attr_type: AttrType,
    pub bytes: Bytes,
}

/// Decoded path attributes of one BGP message or RIB entry.
///
/// Unknown-but-valid attributes are retained in `unknown`; an attribute-level
/// error stops the block and leaves whatever was decoded before it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    pub origin: Option<Origin>,
    pub as_path: Option<AsPath>,
    pub next_hop: Option<Ipv4Addr>,
    pub med: Option<u32>,
    pub local_pref: Option<u32>,
    pub atomic_aggregate: bool,
    pub aggregator: Option<Aggregator>,
    pub communities: Option<CommunitySet>,
    pub originator_id: Option<Ipv4Addr>,
    pub cluster_list: Option<Vec<Ipv4Addr>>,
    pub as4_path: Option<AsPath>,
    pub as4_aggregator: Option<Aggregator>,
    pub mp_reach: Vec<MpNlri>,
    pub mp_unreach: Vec<MpNlri>,
    pub unknown: Vec<AttrRaw>,
}

impl Attributes {
    /// The canonical AS path after any ASN32 transition merge performed by
    /// the decoder: `as_path` holds the merged result, `as4_path` the raw
    /// AS4_PATH attribute.
    pub fn path(&self) -> Option<&AsPath> {
        self.as_path.as_ref()
    }

    /// The v6-unicast MP_REACH next hop, when one was announced.
    pub fn mp_next_hop(&self) -> Option<NextHopAddress> {
        self.mp_reach
            .iter()
            .find(|nlri| nlri.afi == Afi::Ipv6 && nlri.safi == Safi::Unicast)
            .and_then(|nlri| nlri.next_hop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_type_round_trip() {
        for code in [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 14, 15, 17, 18] {
            assert_eq!(u8::from(AttrType::from(code)), code);
        }
        assert_eq!(AttrType::from(99), AttrType::Unknown(99));
    }

    #[test]
    fn test_next_hop_addr() {
        let ll = NextHopAddress::Ipv6LinkLocal(
            "2001:db8::1".parse().unwrap(),
            "fe80::1".parse().unwrap(),
        );
        assert_eq!(ll.addr(), "2001:db8::1".parse::<IpAddr>().unwrap());
    }
}
