//! MRT TABLE_DUMP_V2 message parsing.
//!
//! <https://www.rfc-editor.org/rfc/rfc6396#section-4.3>
use crate::error::*;
use crate::models::*;
use crate::parser::bgp::attributes::parse_attributes;
use crate::parser::ReadUtils;
use bytes::Bytes;
use log::warn;

/// Peer type byte flags in the PEER_INDEX_TABLE entries.
const PEER_TYPE_AFI_IPV6: u8 = 0x1;
const PEER_TYPE_AS4: u8 = 0x2;

/// View names longer than this are skipped and cleared, never truncated.
const MAX_VIEW_NAME_LEN: usize = 255;

/// Parse a PEER_INDEX_TABLE message: the collector BGP ID, the optional view
/// name, and the peer descriptors referenced by index from RIB records.
pub fn parse_peer_index_table(mut data: Bytes) -> Result<PeerIndexTable, ParserError> {
    let collector_bgp_id = data.read_ipv4_address()?;

    let view_name_len = data.read_u16()? as usize;
    let view_name = match view_name_len > MAX_VIEW_NAME_LEN {
        true => {
            warn!(
                "view name length {view_name_len} over maximum {MAX_VIEW_NAME_LEN}, ignoring view name"
            );
            let _ = data.split_n(view_name_len)?;
            String::new()
        }
        false => data.read_n_bytes_to_string(view_name_len)?,
    };

    let peer_count = data.read_u16()?;
    let mut peers = Vec::with_capacity(peer_count as usize);
    for _ in 0..peer_count {
        let peer_type = data.read_u8()?;
        let afi = match peer_type & PEER_TYPE_AFI_IPV6 != 0 {
            true => Afi::Ipv6,
            false => Afi::Ipv4,
        };
        let asn_len = match peer_type & PEER_TYPE_AS4 != 0 {
            true => AsnLength::Bits32,
            false => AsnLength::Bits16,
        };

        let peer_bgp_id = data.read_ipv4_address()?;
        let peer_address = data.read_address(&afi)?;
        let peer_asn = data.read_asn(&asn_len)?;

        peers.push(Peer {
            afi,
            peer_bgp_id,
            peer_address,
            peer_asn,
        });
    }

    Ok(PeerIndexTable {
        collector_bgp_id,
        view_name,
        peers,
    })
}

/// Parse a RIB_IPV4_UNICAST or RIB_IPV6_UNICAST message. The caller provides
/// the stream's current peer index table; each route entry's peer descriptor
/// is resolved and copied in here.
pub fn parse_rib_afi_entries(
    rib_type: TableDumpV2Type,
    peer_table: &PeerIndexTable,
    mut data: Bytes,
) -> Result<RibAfiEntries, ParserError> {
    let afi = match rib_type {
        TableDumpV2Type::RibIpv4Unicast => Afi::Ipv4,
        TableDumpV2Type::RibIpv6Unicast => Afi::Ipv6,
        _ => {
            return Err(ParserError::ParseError(format!(
                "wrong TABLE_DUMP_V2 subtype for RIB entries: {rib_type:?}"
            )))
        }
    };

    let sequence_number = data.read_u32()?;
    let prefix = data.read_nlri_prefix(&afi)?;

    let entry_count = data.read_u16()?;
    let mut rib_entries = Vec::with_capacity(entry_count as usize);

    for _ in 0..entry_count {
        let peer_index = data.read_u16()?;
        let peer = *peer_table.get_peer(peer_index).ok_or_else(|| {
            ParserError::ParseError(format!(
                "peer index {peer_index} out of range ({} table entries)",
                peer_table.peers.len()
            ))
        })?;
        let originated_time = data.read_u32()?;

        let attribute_length = data.read_u16()? as usize;
        let attr_data = data.split_n(attribute_length)?;
        // TABLE_DUMP_V2 attributes always use 4-byte ASNs
        let attributes = parse_attributes(attr_data, &AsnLength::Bits32, &mut None)?;

        rib_entries.push(RibEntry {
            peer_index,
            peer,
            originated_time,
            attributes,
        });
    }

    Ok(RibAfiEntries {
        rib_type,
        sequence_number,
        prefix,
        rib_entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};
    use std::net::Ipv4Addr;

    fn index_table_bytes(view_name: &[u8]) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_u32(u32::from(Ipv4Addr::new(10, 0, 0, 1)));
        buf.put_u16(view_name.len() as u16);
        buf.put_slice(view_name);
        buf.put_u16(2);
        // v4 peer, 16-bit ASN
        buf.put_u8(0);
        buf.put_u32(u32::from(Ipv4Addr::new(192, 0, 2, 10)));
        buf.put_u32(u32::from(Ipv4Addr::new(192, 0, 2, 10)));
        buf.put_u16(64500);
        // v6 peer, 32-bit ASN
        buf.put_u8(PEER_TYPE_AFI_IPV6 | PEER_TYPE_AS4);
        buf.put_u32(u32::from(Ipv4Addr::new(192, 0, 2, 11)));
        buf.put_u128(u128::from("2001:db8::1".parse::<std::net::Ipv6Addr>().unwrap()));
        buf.put_u32(401332);
        buf.freeze()
    }

    #[test]
    fn test_parse_peer_index_table() {
        let table = parse_peer_index_table(index_table_bytes(b"route-views2")).unwrap();
        assert_eq!(table.view_name, "route-views2");
        assert_eq!(table.peers.len(), 2);
        assert_eq!(table.peers[0].afi, Afi::Ipv4);
        assert_eq!(table.peers[0].peer_asn.to_u32(), 64500);
        assert_eq!(table.peers[1].afi, Afi::Ipv6);
        assert_eq!(table.peers[1].peer_asn.to_u32(), 401332);
    }

    #[test]
    fn test_oversized_view_name_cleared() {
        let long_name = vec![b'x'; 300];
        let table = parse_peer_index_table(index_table_bytes(&long_name)).unwrap();
        assert_eq!(table.view_name, "");
        // peers still parse correctly after the skip
        assert_eq!(table.peers.len(), 2);
    }

    #[test]
    fn test_parse_rib_entries() {
        let table = parse_peer_index_table(index_table_bytes(b"")).unwrap();

        let mut buf = BytesMut::new();
        buf.put_u32(42); // sequence
        buf.put_u8(24);
        buf.put_slice(&[198, 51, 100]);
        buf.put_u16(1); // entry count
        buf.put_u16(0); // peer index
        buf.put_u32(1_600_000_000);
        buf.put_u16(0); // no attributes

        let rib =
            parse_rib_afi_entries(TableDumpV2Type::RibIpv4Unicast, &table, buf.freeze()).unwrap();
        assert_eq!(rib.sequence_number, 42);
        assert_eq!(rib.prefix.to_string(), "198.51.100.0/24");
        assert_eq!(rib.rib_entries.len(), 1);
        assert_eq!(rib.rib_entries[0].peer.peer_asn.to_u32(), 64500);
    }

    #[test]
    fn test_peer_index_out_of_range() {
        let table = PeerIndexTable::default();
        let mut buf = BytesMut::new();
        buf.put_u32(1);
        buf.put_u8(0);
        buf.put_u16(1);
        buf.put_u16(5); // no such peer
        buf.put_u32(0);
        buf.put_u16(0);
        assert!(
            parse_rib_afi_entries(TableDumpV2Type::RibIpv4Unicast, &table, buf.freeze()).is_err()
        );
    }
}
