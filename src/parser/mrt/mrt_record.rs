use crate::error::ParserError;
use crate::models::*;
use crate::parser::mrt::messages::{
    parse_bgp4mp, parse_peer_index_table, parse_rib_afi_entries, parse_table_dump_message,
};
use bytes::{Bytes, BytesMut};
use log::warn;
use std::io::Read;

/// MRT common header as read off the wire, before the type is interpreted.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           Timestamp                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |             Type              |            Subtype            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                             Length                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Copy, Clone)]
pub struct RawHeader {
    pub timestamp: u32,
    pub entry_type: u16,
    pub entry_subtype: u16,
    pub length: u32,
}

/// Read the 12-byte MRT common header.
///
/// A read of zero bytes is a clean end of stream (`Ok(None)`); a short read
/// of one to eleven bytes is a truncated record.
pub fn try_parse_raw_header<T: Read>(input: &mut T) -> Result<Option<RawHeader>, ParserError> {
    let mut raw_bytes = [0u8; 12];
    let mut read_total = 0usize;
    while read_total < 12 {
        let n = input.read(&mut raw_bytes[read_total..]).map_err(ParserError::IoError)?;
        if n == 0 {
            break;
        }
        read_total += n;
    }

    match read_total {
        0 => Ok(None),
        12 => Ok(Some(RawHeader {
            timestamp: u32::from_be_bytes([raw_bytes[0], raw_bytes[1], raw_bytes[2], raw_bytes[3]]),
            entry_type: u16::from_be_bytes([raw_bytes[4], raw_bytes[5]]),
            entry_subtype: u16::from_be_bytes([raw_bytes[6], raw_bytes[7]]),
            length: u32::from_be_bytes([raw_bytes[8], raw_bytes[9], raw_bytes[10], raw_bytes[11]]),
        })),
        n => Err(ParserError::TruncatedMsg(format!(
            "incomplete MRT header: {n} bytes read, expecting 12"
        ))),
    }
}

/// Read the record body declared by the header.
pub fn read_record_body<T: Read>(input: &mut T, length: u32) -> Result<Bytes, ParserError> {
    let mut buffer = BytesMut::zeroed(length as usize);
    let mut read_total = 0usize;
    while read_total < buffer.len() {
        let n = input.read(&mut buffer[read_total..]).map_err(ParserError::IoError)?;
        if n == 0 {
            return Err(ParserError::TruncatedMsg(format!(
                "incomplete MRT record body: {read_total} bytes read, expecting {length}"
            )));
        }
        read_total += n;
    }
    Ok(buffer.freeze())
}

/// Parse an MRT message body with the given entry type and subtype.
///
/// `peer_table` is the decoding stream's current peer index table: a
/// PEER_INDEX_TABLE record replaces it, a TABLE_DUMP_V2 RIB record requires
/// it. Missing the table is the only fatal error here; everything else is
/// surfaced to the caller to decide.
pub fn parse_mrt_body(
    entry_type: EntryType,
    entry_subtype: u16,
    data: Bytes,
    peer_table: &mut Option<PeerIndexTable>,
) -> Result<MrtMessage, ParserError> {
    match entry_type {
        EntryType::TABLE_DUMP => {
            let msg = parse_table_dump_message(entry_subtype, data)?;
            Ok(MrtMessage::TableDumpMessage(msg))
        }
        EntryType::TABLE_DUMP_V2 => {
            let subtype = TableDumpV2Type::try_from(entry_subtype)?;
            match subtype {
                TableDumpV2Type::PeerIndexTable => {
                    let table = parse_peer_index_table(data)?;
                    // replace any previous table on this stream wholesale
                    *peer_table = Some(table.clone());
                    Ok(MrtMessage::TableDumpV2Message(
                        TableDumpV2Message::PeerIndexTable(table),
                    ))
                }
                TableDumpV2Type::RibIpv4Unicast | TableDumpV2Type::RibIpv6Unicast => {
                    let table = peer_table
                        .as_ref()
                        .ok_or(ParserError::MissingPeerIndexTable)?;
                    let msg = parse_rib_afi_entries(subtype, table, data)?;
                    Ok(MrtMessage::TableDumpV2Message(
                        TableDumpV2Message::RibAfiEntries(msg),
                    ))
                }
                TableDumpV2Type::RibIpv4Multicast
                | TableDumpV2Type::RibIpv6Multicast
                | TableDumpV2Type::RibGeneric => Err(ParserError::Unsupported(format!(
                    "unsupported TABLE_DUMP_V2 subtype: {subtype:?}"
                ))),
            }
        }
        EntryType::BGP4MP => {
            let msg = parse_bgp4mp(entry_subtype, data)?;
            Ok(MrtMessage::Bgp4Mp(msg))
        }
        mrt_type => Err(ParserError::Unsupported(format!(
            "unsupported MRT record type: {mrt_type:?}, subtype: {entry_subtype}"
        ))),
    }
}

/// Parse one full record from a reader. See [parse_mrt_body] for the peer
/// table contract. `Ok(None)` is a clean end of stream.
pub fn try_parse_mrt_record<T: Read>(
    input: &mut T,
    peer_table: &mut Option<PeerIndexTable>,
) -> Result<Option<MrtRecord>, ParserError> {
    let header = match try_parse_raw_header(input)? {
        Some(h) => h,
        None => return Ok(None),
    };

    let body = read_record_body(input, header.length)?;

    let entry_type = match EntryType::try_from(header.entry_type) {
        Ok(t) => t,
        Err(_) => {
            warn!("unrecognized MRT record type {}, skipping", header.entry_type);
            return Ok(Some(MrtRecord {
                common_header: CommonHeader {
                    timestamp: header.timestamp,
                    entry_type: EntryType::NULL,
                    entry_subtype: header.entry_subtype,
                    length: header.length,
                },
                message: MrtMessage::Unsupported {
                    reason: format!("unknown MRT record type: {}", header.entry_type),
                },
            }));
        }
    };

    let common_header = CommonHeader {
        timestamp: header.timestamp,
        entry_type,
        entry_subtype: header.entry_subtype,
        length: header.length,
    };

    let message = match parse_mrt_body(entry_type, header.entry_subtype, body, peer_table) {
        Ok(msg) => msg,
        Err(ParserError::MissingPeerIndexTable) => return Err(ParserError::MissingPeerIndexTable),
        Err(e) => {
            // record-local problem: surface the record without a message body
            warn!(
                "unparseable MRT record (type {}, subtype {}): {e}",
                header.entry_type, header.entry_subtype
            );
            MrtMessage::Unsupported {
                reason: e.to_string(),
            }
        }
    };

    Ok(Some(MrtRecord {
        common_header,
        message,
    }))
}
