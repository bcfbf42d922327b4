//! BGP message body parsing.
use crate::error::ParserError;
use crate::models::*;
use crate::parser::bgp::attributes::parse_attributes;
use crate::parser::ReadUtils;
use bytes::{Buf, Bytes};
use log::warn;

/// BGP message header length: 16-byte marker, 2-byte length, 1-byte type.
const BGP_HEADER_LEN: usize = 19;

/// Parse one framed BGP message: marker, length, type, body.
///
/// A marker that is not all ones is reported as `Unsupported` so the caller
/// can surface the record without elements instead of killing the stream.
pub fn parse_bgp_message(data: &mut Bytes, asn_len: &AsnLength) -> Result<BgpMessage, ParserError> {
    let mut marker = [0u8; 16];
    data.has_n_remaining(16)?;
    data.copy_to_slice(&mut marker);
    if marker != [0xFF; 16] {
        warn!("bad marker: {marker:02x?}");
        return Err(ParserError::Unsupported("bad BGP message marker".to_string()));
    }

    let total_length = data.read_u16()? as usize;
    let msg_type_raw = data.read_u8()?;
    let msg_type = BgpMessageType::try_from(msg_type_raw).map_err(|_| {
        ParserError::Unsupported(format!("unknown BGP message type: {msg_type_raw}"))
    })?;

    let body_length = total_length.saturating_sub(BGP_HEADER_LEN);
    let mut body = match data.remaining() < body_length {
        true => {
            warn!(
                "BGP message truncated: header says {} body bytes, {} available",
                body_length,
                data.remaining()
            );
            data.split_to(data.remaining())
        }
        false => data.split_to(body_length),
    };

    match msg_type {
        BgpMessageType::OPEN => Ok(BgpMessage::Open(parse_bgp_open_message(&mut body, asn_len)?)),
        BgpMessageType::UPDATE => Ok(BgpMessage::Update(parse_bgp_update_message(
            body, asn_len,
        )?)),
        BgpMessageType::NOTIFICATION => Ok(BgpMessage::Notification(
            parse_bgp_notification_message(&mut body)?,
        )),
        BgpMessageType::KEEPALIVE => Ok(BgpMessage::KeepAlive),
    }
}

pub fn parse_bgp_open_message(
    data: &mut Bytes,
    asn_len: &AsnLength,
) -> Result<BgpOpenMessage, ParserError> {
    let version = data.read_u8()?;
    let asn = data.read_asn(asn_len)?;
    let hold_time = data.read_u16()?;
    let sender_ip = data.read_ipv4_address()?;
    let opt_params_len = data.read_u8()? as usize;
    let opt_params = data.read_n_bytes(opt_params_len.min(data.remaining()))?;

    Ok(BgpOpenMessage {
        version,
        asn,
        hold_time,
        sender_ip,
        opt_params,
    })
}

pub fn parse_bgp_notification_message(
    data: &mut Bytes,
) -> Result<BgpNotificationMessage, ParserError> {
    let error_code = data.read_u8()?;
    let sub_error_code = data.read_u8()?;
    let data = data.read_n_bytes(data.remaining())?;

    Ok(BgpNotificationMessage {
        error_code,
        sub_error_code,
        data,
    })
}

/// Parse a BGP UPDATE body: withdrawn routes, the attribute block, announced
/// routes, RFC 4271 section 4.3.
pub fn parse_bgp_update_message(
    mut data: Bytes,
    asn_len: &AsnLength,
) -> Result<BgpUpdateMessage, ParserError> {
    let mut incomplete = None;

    let withdrawn_length = data.read_u16()? as usize;
    let mut withdrawn_data = data.split_n(withdrawn_length)?;
    let withdrawn_prefixes = parse_nlri_list(&mut withdrawn_data, &Afi::Ipv4, &mut incomplete)?;

    let attribute_length = data.read_u16()? as usize;
    let attr_data = data.split_n(attribute_length)?;
    let attributes = parse_attributes(attr_data, asn_len, &mut incomplete)?;

    // the announced NLRI list runs to the end of the message
    let announced_prefixes = parse_nlri_list(&mut data, &Afi::Ipv4, &mut incomplete)?;

    Ok(BgpUpdateMessage {
        withdrawn_prefixes,
        attributes,
        announced_prefixes,
        incomplete,
    })
}

/// Read `(len, ceil(len/8) address bytes)` NLRI entries until the buffer is
/// exhausted. A trailing entry whose address bytes run past the end of the
/// buffer is recorded once in `incomplete` and terminates the list.
pub fn parse_nlri_list(
    data: &mut Bytes,
    afi: &Afi,
    incomplete: &mut Option<IncompleteNlri>,
) -> Result<Vec<Prefix>, ParserError> {
    let mut prefixes = vec![];

    while data.remaining() > 0 {
        let bit_len = data[0];
        let byte_len = (bit_len as usize).div_ceil(8);

        if data.remaining() - 1 < byte_len {
            let _ = data.read_u8()?;
            *incomplete = Some(IncompleteNlri {
                afi: *afi,
                orig_len: bit_len,
                partial_bytes: data.read_n_bytes(data.remaining())?,
            });
            break;
        }

        prefixes.push(data.read_nlri_prefix(afi)?);
    }

    Ok(prefixes)
}
