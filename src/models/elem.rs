//! Per-prefix BGP element.
//!
//! Each MRT record may carry reachability information for multiple prefixes.
//! A [BgpElem] is one self-contained piece of that information: one prefix
//! (or one peer state transition) with the peer identity and the relevant
//! attributes copied in, independent of the originating record format.
use crate::models::*;
use std::fmt::{Display, Formatter};
use std::net::IpAddr;

/// Element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElemType {
    Rib,
    Announcement,
    Withdrawal,
    PeerState,
}

impl ElemType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ElemType::Rib => "R",
            ElemType::Announcement => "A",
            ElemType::Withdrawal => "W",
            ElemType::PeerState => "S",
        }
    }
}

/// BgpElem represents a per-prefix BGP element.
///
/// Peer identity is copied into the element at generation time; elements
/// never reference the decoder or its peer index table.
#[derive(Debug, Clone, PartialEq)]
pub struct BgpElem {
    pub timestamp: u32,
    pub elem_type: ElemType,
    pub peer_ip: IpAddr,
    pub peer_asn: Asn,
    /// Absent only for peer state elements.
    pub prefix: Option<Prefix>,
    pub next_hop: Option<IpAddr>,
    pub as_path: Option<AsPath>,
    pub communities: Option<CommunitySet>,
    pub old_state: Option<BgpState>,
    pub new_state: Option<BgpState>,
}

impl Default for BgpElem {
    fn default() -> Self {
        BgpElem {
            timestamp: 0,
            elem_type: ElemType::Announcement,
            peer_ip: IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
            peer_asn: Asn::RESERVED,
            prefix: None,
            next_hop: None,
            as_path: None,
            communities: None,
            old_state: None,
            new_state: None,
        }
    }
}

impl BgpElem {
    /// Origin ASN of the path, when the path ends in a simple ASN segment.
    pub fn origin_asn(&self) -> Option<u32> {
        self.as_path.as_ref().and_then(|p| p.origin_asn())
    }
}

#[inline(always)]
pub(crate) fn option_to_string<T>(o: &Option<T>) -> String
where
    T: Display,
{
    if let Some(v) = o {
        v.to_string()
    } else {
        String::new()
    }
}

impl Display for BgpElem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.elem_type {
            ElemType::PeerState => {
                write!(
                    f,
                    "|{}|{}|{}|{}|{:?}|{:?}|",
                    self.elem_type.as_str(),
                    &self.timestamp,
                    &self.peer_ip,
                    &self.peer_asn,
                    self.old_state,
                    self.new_state,
                )
            }
            _ => {
                write!(
                    f,
                    "|{}|{}|{}|{}|{}|{}|{}|{}|",
                    self.elem_type.as_str(),
                    &self.timestamp,
                    &self.peer_ip,
                    &self.peer_asn,
                    option_to_string(&self.prefix),
                    option_to_string(&self.as_path),
                    option_to_string(&self.next_hop),
                    option_to_string(&self.communities),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_display() {
        let elem = BgpElem {
            timestamp: 1_600_000_000,
            elem_type: ElemType::Announcement,
            peer_ip: IpAddr::from_str("192.0.2.1").unwrap(),
            peer_asn: Asn::new_32bit(64500),
            prefix: Some(Prefix::from_str("198.51.100.0/24").unwrap()),
            next_hop: Some(IpAddr::from_str("192.0.2.1").unwrap()),
            as_path: Some(AsPath::from_sequence([64500, 64501, 64502])),
            ..Default::default()
        };
        assert_eq!(
            elem.to_string(),
            "|A|1600000000|192.0.2.1|64500|198.51.100.0/24|64500 64501 64502|192.0.2.1||"
        );
        assert_eq!(elem.origin_asn(), Some(64502));
    }
}
