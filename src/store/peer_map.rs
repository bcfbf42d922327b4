//! Peer signature map: bidirectional mapping between (collector, peer IP,
//! peer ASN) signatures and compact peer IDs.
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;

/// Compact peer identifier.
pub type PeerId = u16;

/// First ID handed out to IPv4 peers.
const V4_ID_OFFSET: PeerId = 1;
/// First ID handed out to IPv6 peers. Once the v4 counter reaches this
/// value, v4 peers are allocated from the v6 range as well.
const V6_ID_OFFSET: PeerId = 1;

const COLLECTOR_NAME_MAX_LEN: usize = 128;

/// Identity of a peer: the collector it was observed at plus its IP address.
///
/// The peer ASN is carried along for convenience but deliberately ignored by
/// equality and hashing: a peer that changes its ASN on the same
/// (collector, IP) must map to the same ID.
#[derive(Debug, Clone, Eq)]
pub struct PeerSignature {
    pub collector: String,
    pub peer_ip: IpAddr,
    pub peer_asn: u32,
}

impl PartialEq for PeerSignature {
    fn eq(&self, other: &Self) -> bool {
        self.peer_ip == other.peer_ip && self.collector == other.collector
    }
}

impl Hash for PeerSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.peer_ip.hash(state);
        self.collector.hash(state);
    }
}

impl PeerSignature {
    pub fn new(collector: &str, peer_ip: IpAddr, peer_asn: u32) -> PeerSignature {
        let mut collector = collector.to_string();
        collector.truncate(COLLECTOR_NAME_MAX_LEN);
        PeerSignature {
            collector,
            peer_ip,
            peer_asn,
        }
    }
}

/// Bidirectional map between peer signatures and compact IDs.
///
/// IDs are never reused for the lifetime of a map: clearing the entries does
/// not reset the allocation counters.
#[derive(Debug, Default)]
pub struct PeerSigMap {
    sig_id: HashMap<PeerSignature, PeerId>,
    id_sig: HashMap<PeerId, PeerSignature>,
    v4_next_id: PeerId,
    v6_next_id: PeerId,
}

impl PeerSigMap {
    pub fn new() -> PeerSigMap {
        PeerSigMap {
            sig_id: HashMap::new(),
            id_sig: HashMap::new(),
            v4_next_id: V4_ID_OFFSET,
            v6_next_id: V6_ID_OFFSET,
        }
    }

    /// Look up the ID for the given peer, allocating the next ID from the
    /// address-family-appropriate range on first sight.
    pub fn get_or_insert(&mut self, collector: &str, peer_ip: IpAddr, peer_asn: u32) -> PeerId {
        let sig = PeerSignature::new(collector, peer_ip, peer_asn);

        if let Some(id) = self.sig_id.get(&sig) {
            return *id;
        }

        let new_id = if self.v4_next_id >= V6_ID_OFFSET {
            // v4 peers have spilled into the v6 range: allocate from there
            // regardless of family
            let id = self.v6_next_id;
            self.v6_next_id += 1;
            id
        } else if peer_ip.is_ipv6() {
            let id = self.v6_next_id;
            self.v6_next_id += 1;
            id
        } else {
            let id = self.v4_next_id;
            self.v4_next_id += 1;
            id
        };

        self.sig_id.insert(sig.clone(), new_id);
        self.id_sig.insert(new_id, sig);

        new_id
    }

    /// Signature of the given ID.
    pub fn get_signature(&self, id: PeerId) -> Option<&PeerSignature> {
        self.id_sig.get(&id)
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.sig_id.len(), self.id_sig.len());
        self.id_sig.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_sig.is_empty()
    }

    /// Drop all entries; ID counters keep running so IDs are never reused.
    pub fn clear(&mut self) {
        self.sig_id.clear();
        self.id_sig.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn v4(s: &str) -> IpAddr {
        IpAddr::from_str(s).unwrap()
    }

    #[test]
    fn test_get_or_insert() {
        let mut map = PeerSigMap::new();
        let id1 = map.get_or_insert("route-views2", v4("192.0.2.1"), 64500);
        let id2 = map.get_or_insert("route-views2", v4("192.0.2.2"), 64500);
        assert_ne!(id1, id2);
        assert_eq!(map.len(), 2);

        // same peer again
        assert_eq!(map.get_or_insert("route-views2", v4("192.0.2.1"), 64500), id1);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_asn_ignored_by_identity() {
        let mut map = PeerSigMap::new();
        let id1 = map.get_or_insert("rrc00", v4("192.0.2.1"), 64500);
        // ASN changed, same (collector, IP): same ID
        let id2 = map.get_or_insert("rrc00", v4("192.0.2.1"), 64999);
        assert_eq!(id1, id2);
        assert_eq!(map.len(), 1);

        // the first signature wins
        assert_eq!(map.get_signature(id1).unwrap().peer_asn, 64500);
    }

    #[test]
    fn test_collector_distinguishes() {
        let mut map = PeerSigMap::new();
        let id1 = map.get_or_insert("rrc00", v4("192.0.2.1"), 64500);
        let id2 = map.get_or_insert("rrc01", v4("192.0.2.1"), 64500);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_ids_never_reused_after_clear() {
        let mut map = PeerSigMap::new();
        let id1 = map.get_or_insert("rrc00", v4("192.0.2.1"), 64500);
        map.clear();
        assert!(map.is_empty());
        assert!(map.get_signature(id1).is_none());

        let id2 = map.get_or_insert("rrc00", v4("192.0.2.1"), 64500);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_mixed_families() {
        let mut map = PeerSigMap::new();
        let id1 = map.get_or_insert("rrc00", v4("192.0.2.1"), 64500);
        let id2 = map.get_or_insert("rrc00", IpAddr::from_str("2001:db8::1").unwrap(), 64500);
        assert_ne!(id1, id2);
        assert_eq!(map.len(), 2);
    }
}
