use crate::error::*;
use crate::models::*;
use crate::parser::bgp::attributes::parse_attributes;
use crate::parser::ReadUtils;
use bytes::Bytes;

/// Parse MRT TABLE_DUMP type message.
///
/// <https://www.rfc-editor.org/rfc/rfc6396#section-4.2>
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |         View Number           |       Sequence Number         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                        Prefix (variable)                      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// | Prefix Length |    Status     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         Originated Time                       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                    Peer IP Address (variable)                 |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           Peer AS             |       Attribute Length        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                   BGP Attribute... (variable)
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// The prefix family and the peer ASN width both derive from the subtype
/// value (1 = v4, 2 = v6, 3 = v4/AS4, 4 = v6/AS4).
pub fn parse_table_dump_message(
    sub_type: u16,
    mut data: Bytes,
) -> Result<TableDumpMessage, ParserError> {
    let dump_type = TableDumpType::try_from(sub_type).map_err(|_| {
        ParserError::ParseError(format!(
            "invalid subtype found for TABLE_DUMP message: {sub_type}"
        ))
    })?;
    let afi = dump_type.afi();
    let asn_len = dump_type.asn_length();

    let view_number = data.read_u16()?;
    let sequence_number = data.read_u16()?;
    let prefix_addr = data.read_address(&afi)?;
    let mask_len = data.read_u8()?;
    let prefix = Prefix::new(prefix_addr, mask_len)?;

    let status = data.read_u8()?;
    let originated_time = data.read_u32()?;

    let peer_address = data.read_address(&afi)?;
    let peer_asn = data.read_asn(&asn_len)?;

    let attribute_length = data.read_u16()? as usize;
    let attr_data = data.split_n(attribute_length)?;
    let attributes = parse_attributes(attr_data, &asn_len, &mut None)?;

    Ok(TableDumpMessage {
        view_number,
        sequence_number,
        prefix,
        status,
        originated_time,
        peer_address,
        peer_asn,
        attributes,
    })
}
