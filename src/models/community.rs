//! BGP standard community values and sets.
use crate::error::ParserError;
use bytes::{Buf, Bytes};
use itertools::Itertools;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// A standard 32-bit community, split into (asn:16, value:16) halves.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Community(pub u32);

/// Well-known community constants, RFC 1997. Recognized for display purposes
/// but otherwise unprivileged.
pub const COMMUNITY_NO_EXPORT: Community = Community(0xFFFFFF01);
pub const COMMUNITY_NO_ADVERTISE: Community = Community(0xFFFFFF02);
pub const COMMUNITY_NO_EXPORT_SUBCONFED: Community = Community(0xFFFFFF03);

bitflags::bitflags! {
    /// Which halves of a community a wildcard match should compare.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CommunityFilter: u8 {
        const VALUE = 0b01;
        const ASN   = 0b10;
        const EXACT = 0b11;
    }
}

impl Community {
    pub const fn new(asn: u16, value: u16) -> Community {
        Community(((asn as u32) << 16) | value as u32)
    }

    #[inline]
    pub const fn asn(&self) -> u16 {
        (self.0 >> 16) as u16
    }

    #[inline]
    pub const fn value(&self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }
}

impl Display for Community {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            COMMUNITY_NO_EXPORT => write!(f, "no-export"),
            COMMUNITY_NO_ADVERTISE => write!(f, "no-advertise"),
            COMMUNITY_NO_EXPORT_SUBCONFED => write!(f, "local-AS"),
            _ => write!(f, "{}:{}", self.asn(), self.value()),
        }
    }
}

impl Debug for Community {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.asn(), self.value())
    }
}

/// Parse `ASN:VALUE` where either side may be `*`. Returns the community with
/// wildcard halves zeroed, plus the filter mask describing which halves were
/// given.
pub fn parse_community_filter(s: &str) -> Result<(Community, CommunityFilter), ParserError> {
    let (asn_str, value_str) = s
        .split_once(':')
        .ok_or_else(|| ParserError::ParseError(format!("invalid community string: {s}")))?;

    let mut mask = CommunityFilter::empty();
    let mut asn = 0u16;
    let mut value = 0u16;

    if asn_str != "*" {
        asn = u16::from_str(asn_str)
            .map_err(|_| ParserError::ParseError(format!("invalid community ASN: {asn_str}")))?;
        mask |= CommunityFilter::ASN;
    }
    if value_str != "*" {
        value = u16::from_str(value_str).map_err(|_| {
            ParserError::ParseError(format!("invalid community value: {value_str}"))
        })?;
        mask |= CommunityFilter::VALUE;
    }

    Ok((Community::new(asn, value), mask))
}

impl FromStr for Community {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (community, mask) = parse_community_filter(s)?;
        if mask != CommunityFilter::EXACT {
            return Err(ParserError::ParseError(format!(
                "wildcard not allowed in exact community: {s}"
            )));
        }
        Ok(community)
    }
}

/// An ordered multiset of communities with a cached OR-fold over all member
/// words, used as a Bloom-style prefilter for membership tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommunitySet {
    communities: Vec<Community>,
    or_mask: u32,
}

impl CommunitySet {
    pub fn new() -> CommunitySet {
        CommunitySet::default()
    }

    /// Populate from a raw COMMUNITIES attribute body: 4 bytes per community,
    /// big endian.
    pub fn from_wire(mut data: Bytes) -> Result<CommunitySet, ParserError> {
        if data.len() % 4 != 0 {
            return Err(ParserError::MalformedAttribute(format!(
                "communities attribute length {} not a multiple of 4",
                data.len()
            )));
        }
        let mut set = CommunitySet::new();
        while data.remaining() >= 4 {
            set.insert(Community(data.get_u32()));
        }
        Ok(set)
    }

    pub fn insert(&mut self, community: Community) {
        self.or_mask |= community.0;
        self.communities.push(community);
    }

    pub fn len(&self) -> usize {
        self.communities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Community> {
        self.communities.iter()
    }

    pub fn get(&self, i: usize) -> Option<Community> {
        self.communities.get(i).copied()
    }

    /// OR-fold of all community words in the set.
    pub fn or_mask(&self) -> u32 {
        self.or_mask
    }

    /// Exact membership: both halves must match.
    pub fn contains(&self, community: Community) -> bool {
        self.matches(community, CommunityFilter::EXACT)
    }

    /// Wildcard membership on the halves selected by `filter`. The OR-fold
    /// prefilter rejects without scanning when a requested half cannot be
    /// present anywhere in the set.
    pub fn matches(&self, community: Community, filter: CommunityFilter) -> bool {
        let hash = Community(self.or_mask);
        if filter.contains(CommunityFilter::ASN) && hash.asn() & community.asn() != community.asn()
        {
            return false;
        }
        if filter.contains(CommunityFilter::VALUE)
            && hash.value() & community.value() != community.value()
        {
            return false;
        }

        self.communities.iter().any(|c| {
            (!filter.contains(CommunityFilter::ASN) || c.asn() == community.asn())
                && (!filter.contains(CommunityFilter::VALUE) || c.value() == community.value())
        })
    }

    pub fn clear(&mut self) {
        self.communities.clear();
        self.or_mask = 0;
    }
}

impl FromIterator<Community> for CommunitySet {
    fn from_iter<T: IntoIterator<Item = Community>>(iter: T) -> Self {
        let mut set = CommunitySet::new();
        for c in iter {
            set.insert(c);
        }
        set
    }
}

impl Display for CommunitySet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.communities.iter().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};

    #[test]
    fn test_halves() {
        let c = Community::new(64500, 120);
        assert_eq!(c.asn(), 64500);
        assert_eq!(c.value(), 120);
        assert_eq!(c.to_string(), "64500:120");
    }

    #[test]
    fn test_well_known_display() {
        assert_eq!(COMMUNITY_NO_EXPORT.to_string(), "no-export");
        assert_eq!(COMMUNITY_NO_ADVERTISE.to_string(), "no-advertise");
        assert_eq!(COMMUNITY_NO_EXPORT_SUBCONFED.to_string(), "local-AS");
    }

    #[test]
    fn test_parse() {
        assert_eq!(Community::from_str("64500:120").unwrap(), Community::new(64500, 120));
        assert!(Community::from_str("64500").is_err());
        assert!(Community::from_str("*:120").is_err());

        let (c, mask) = parse_community_filter("*:120").unwrap();
        assert_eq!(c.value(), 120);
        assert_eq!(mask, CommunityFilter::VALUE);

        let (c, mask) = parse_community_filter("64500:*").unwrap();
        assert_eq!(c.asn(), 64500);
        assert_eq!(mask, CommunityFilter::ASN);
    }

    #[test]
    fn test_from_wire() {
        let mut buf = BytesMut::new();
        buf.put_u32(Community::new(64500, 1).0);
        buf.put_u32(Community::new(64500, 2).0);
        let set = CommunitySet::from_wire(buf.freeze()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "64500:1 64500:2");

        assert!(CommunitySet::from_wire(Bytes::from_static(&[0, 1, 2])).is_err());
    }

    #[test]
    fn test_match_with_wildcards() {
        let set: CommunitySet = [Community::new(64500, 1), Community::new(64501, 2)]
            .into_iter()
            .collect();

        assert!(set.contains(Community::new(64500, 1)));
        assert!(!set.contains(Community::new(64500, 2)));

        assert!(set.matches(Community::new(64501, 0), CommunityFilter::ASN));
        assert!(set.matches(Community::new(0, 2), CommunityFilter::VALUE));
        assert!(!set.matches(Community::new(64502, 0), CommunityFilter::ASN));
    }

    #[test]
    fn test_or_fold_prefilter() {
        // property: if or_fold(S) & c != c then c is not in S
        let set: CommunitySet = [Community::new(0x00F0, 0x000F)].into_iter().collect();
        let c = Community::new(0x0F00, 0x00F0);
        assert!(set.or_mask() & c.0 != c.0);
        assert!(!set.contains(c));
    }

    #[test]
    fn test_order_sensitive_equality() {
        let a: CommunitySet = [Community::new(1, 1), Community::new(2, 2)].into_iter().collect();
        let b: CommunitySet = [Community::new(2, 2), Community::new(1, 1)].into_iter().collect();
        assert_ne!(a, b);
    }
}
