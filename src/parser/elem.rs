//! This module handles converting MRT records into individual per-prefix BGP
//! elements.
//!
//! Each MRT record may contain reachability information for multiple
//! prefixes. This module breaks down MRT records into corresponding BGP
//! elements, allowing users to process BGP information on a per-prefix basis.
use crate::models::*;
use std::net::IpAddr;

/// Expands decoded MRT records into [BgpElem]s.
///
/// The generator owns a reusable elements buffer: populating with a new
/// record clears the previous batch. Peer identity is copied into every
/// element, so elements stay valid after the decoder moves on or rebinds its
/// peer index table.
#[derive(Debug, Default)]
pub struct Elementor {
    elems: Vec<BgpElem>,
    cursor: usize,
}

/// Element ordering within one record follows the source order of the NLRI
/// lists: legacy withdrawals, MP withdrawals (v4 before v6), legacy
/// announcements, MP announcements (v4 before v6); wire order within each
/// list.
impl Elementor {
    pub fn new() -> Elementor {
        Elementor::default()
    }

    /// Expand `record` into elements, replacing any previous batch.
    pub fn populate(&mut self, record: &MrtRecord) {
        self.elems.clear();
        self.cursor = 0;

        let timestamp = record.common_header.timestamp;

        match &record.message {
            MrtMessage::TableDumpMessage(msg) => {
                self.elems.push(BgpElem {
                    timestamp,
                    elem_type: ElemType::Rib,
                    peer_ip: msg.peer_address,
                    peer_asn: msg.peer_asn,
                    prefix: Some(msg.prefix),
                    next_hop: table_next_hop(&msg.attributes),
                    as_path: msg.attributes.as_path.clone(),
                    communities: msg.attributes.communities.clone(),
                    old_state: None,
                    new_state: None,
                });
            }

            MrtMessage::TableDumpV2Message(msg) => match msg {
                TableDumpV2Message::PeerIndexTable(_) => {}
                TableDumpV2Message::RibAfiEntries(rib) => {
                    for entry in &rib.rib_entries {
                        self.elems.push(BgpElem {
                            timestamp,
                            elem_type: ElemType::Rib,
                            peer_ip: entry.peer.peer_address,
                            peer_asn: entry.peer.peer_asn,
                            prefix: Some(rib.prefix),
                            next_hop: table_next_hop(&entry.attributes),
                            as_path: entry.attributes.as_path.clone(),
                            communities: entry.attributes.communities.clone(),
                            old_state: None,
                            new_state: None,
                        });
                    }
                }
            },

            MrtMessage::Bgp4Mp(msg) => match msg {
                Bgp4MpEnum::StateChange(sc) => {
                    self.elems.push(BgpElem {
                        timestamp,
                        elem_type: ElemType::PeerState,
                        peer_ip: sc.peer_addr,
                        peer_asn: sc.peer_asn,
                        prefix: None,
                        next_hop: None,
                        as_path: None,
                        communities: None,
                        old_state: Some(sc.old_state),
                        new_state: Some(sc.new_state),
                    });
                }
                Bgp4MpEnum::Message(m) => {
                    if let BgpMessage::Update(update) = &m.bgp_message {
                        self.populate_update(timestamp, m.peer_ip, m.peer_asn, update);
                    }
                }
            },

            MrtMessage::Unsupported { .. } => {}
        }
    }

    fn populate_update(
        &mut self,
        timestamp: u32,
        peer_ip: IpAddr,
        peer_asn: Asn,
        update: &BgpUpdateMessage,
    ) {
        let attributes = &update.attributes;

        let withdrawal = |prefix: Prefix| BgpElem {
            timestamp,
            elem_type: ElemType::Withdrawal,
            peer_ip,
            peer_asn,
            prefix: Some(prefix),
            next_hop: None,
            as_path: None,
            communities: None,
            old_state: None,
            new_state: None,
        };

        // legacy withdrawals, then MP withdrawals v4 before v6
        self.elems
            .extend(update.withdrawn_prefixes.iter().map(|p| withdrawal(*p)));
        for afi in [Afi::Ipv4, Afi::Ipv6] {
            for nlri in attributes.mp_unreach.iter().filter(|n| n.afi == afi) {
                self.elems.extend(nlri.prefixes.iter().map(|p| withdrawal(*p)));
            }
        }

        let announcement = |prefix: Prefix, next_hop: Option<IpAddr>| BgpElem {
            timestamp,
            elem_type: ElemType::Announcement,
            peer_ip,
            peer_asn,
            prefix: Some(prefix),
            next_hop,
            as_path: attributes.as_path.clone(),
            communities: attributes.communities.clone(),
            old_state: None,
            new_state: None,
        };

        // legacy IPv4 announcements use the NEXT_HOP attribute
        let legacy_next_hop = attributes.next_hop.map(IpAddr::V4);
        self.elems.extend(
            update
                .announced_prefixes
                .iter()
                .map(|p| announcement(*p, legacy_next_hop)),
        );

        // MP announcements: v4 NLRIs still carry the legacy next hop, v6
        // NLRIs use the MP_REACH next hop
        for afi in [Afi::Ipv4, Afi::Ipv6] {
            for nlri in attributes.mp_reach.iter().filter(|n| n.afi == afi) {
                let next_hop = match afi {
                    Afi::Ipv4 => legacy_next_hop,
                    Afi::Ipv6 => nlri.next_hop.map(|nh| nh.addr()),
                };
                self.elems
                    .extend(nlri.prefixes.iter().map(|p| announcement(*p, next_hop)));
            }
        }
    }

    /// The next element of the current batch.
    pub fn next_elem(&mut self) -> Option<&BgpElem> {
        let elem = self.elems.get(self.cursor)?;
        self.cursor += 1;
        Some(elem)
    }

    /// Number of elements produced from the current record.
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Convenience: expand a record into an owned vector of elements.
    pub fn record_to_elems(&mut self, record: &MrtRecord) -> Vec<BgpElem> {
        self.populate(record);
        self.elems.clone()
    }
}

/// Next hop for RIB elements: prefer the v6-unicast MP_REACH next hop when
/// one was announced, fall back to the NEXT_HOP attribute.
fn table_next_hop(attributes: &Attributes) -> Option<IpAddr> {
    match attributes.mp_next_hop() {
        Some(nh) => Some(nh.addr()),
        None => attributes.next_hop.map(IpAddr::V4),
    }
}
