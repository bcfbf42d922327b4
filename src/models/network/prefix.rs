use crate::error::ParserError;
use crate::models::Afi;
use ipnet::IpNet;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::net::IpAddr;
use std::str::FromStr;

/// Filter hint describing which overlap relations a prefix is allowed to
/// match. Opaque metadata for the core: it never participates in equality or
/// hashing.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MatchType {
    #[default]
    Any,
    Exact,
    MoreSpecific,
    LessSpecific,
}

/// A network prefix with an optional match-type filter hint.
///
/// Equality and hashing consider the address and the mask length; two
/// prefixes with the same address but different mask lengths are distinct.
#[derive(Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Prefix {
    pub prefix: IpNet,
    pub match_type: MatchType,
}

impl PartialEq for Prefix {
    fn eq(&self, other: &Self) -> bool {
        self.prefix == other.prefix
    }
}

impl Eq for Prefix {}

impl Hash for Prefix {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.prefix.hash(state);
    }
}

impl Prefix {
    /// Create a prefix from an address and a mask length, validating the mask
    /// length against the address family width.
    pub fn new(addr: IpAddr, mask_len: u8) -> Result<Prefix, ParserError> {
        match IpNet::new(addr, mask_len) {
            Ok(prefix) => Ok(Prefix {
                prefix,
                match_type: MatchType::Any,
            }),
            Err(_) => Err(ParserError::InvalidPrefix(format!(
                "invalid mask length {mask_len} for address {addr}"
            ))),
        }
    }

    pub fn with_match_type(mut self, match_type: MatchType) -> Prefix {
        self.match_type = match_type;
        self
    }

    #[inline]
    pub fn addr(&self) -> IpAddr {
        self.prefix.addr()
    }

    #[inline]
    pub fn mask_len(&self) -> u8 {
        self.prefix.prefix_len()
    }

    #[inline]
    pub const fn afi(&self) -> Afi {
        match self.prefix {
            IpNet::V4(_) => Afi::Ipv4,
            IpNet::V6(_) => Afi::Ipv6,
        }
    }

    /// Address family width in bits (32 or 128).
    #[inline]
    pub const fn max_bits(&self) -> u8 {
        match self.prefix {
            IpNet::V4(_) => 32,
            IpNet::V6(_) => 128,
        }
    }

    /// Zero host bits beyond the mask length.
    pub fn masked(&self) -> Prefix {
        Prefix {
            prefix: self.prefix.trunc(),
            match_type: self.match_type,
        }
    }

    /// Raw address bytes, zero padded to 16 bytes, for bit-level indexing.
    pub fn octets(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        match self.prefix.addr() {
            IpAddr::V4(a) => bytes[..4].copy_from_slice(&a.octets()),
            IpAddr::V6(a) => bytes.copy_from_slice(&a.octets()),
        }
        bytes
    }
}

impl From<IpNet> for Prefix {
    fn from(prefix: IpNet) -> Self {
        Prefix {
            prefix,
            match_type: MatchType::Any,
        }
    }
}

/// Parse `ADDRESS/MASKLEN` with exactly one slash; the address part accepts
/// the same forms as a bare address.
impl FromStr for Prefix {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        let (addr_str, len_str) = match (parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(l), None) => (a, l),
            _ => {
                return Err(ParserError::InvalidPrefix(format!(
                    "expected exactly one '/' in prefix string: {s}"
                )))
            }
        };

        let addr = IpAddr::from_str(addr_str)
            .map_err(|_| ParserError::InvalidPrefix(format!("invalid address: {addr_str}")))?;
        let mask_len = u8::from_str(len_str)
            .map_err(|_| ParserError::InvalidPrefix(format!("invalid mask length: {len_str}")))?;

        Prefix::new(addr, mask_len)
    }
}

impl Display for Prefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix)
    }
}

impl Debug for Prefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix)
    }
}
