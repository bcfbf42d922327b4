use crate::error::ParserError;
use crate::models::*;
use crate::parser::bgp::messages::parse_bgp_message;
use crate::parser::ReadUtils;
use bytes::Bytes;
use log::warn;
use std::net::{IpAddr, Ipv4Addr};

/// Parse MRT BGP4MP type
///
/// RFC: <https://www.rfc-editor.org/rfc/rfc6396#section-4.4>
pub fn parse_bgp4mp(sub_type: u16, input: Bytes) -> Result<Bgp4MpEnum, ParserError> {
    let bgp4mp_type: Bgp4MpType = Bgp4MpType::try_from(sub_type)?;
    let msg: Bgp4MpEnum = match bgp4mp_type {
        Bgp4MpType::StateChange => Bgp4MpEnum::StateChange(parse_bgp4mp_state_change(
            input,
            AsnLength::Bits16,
            bgp4mp_type,
        )?),
        Bgp4MpType::StateChangeAs4 => Bgp4MpEnum::StateChange(parse_bgp4mp_state_change(
            input,
            AsnLength::Bits32,
            bgp4mp_type,
        )?),
        Bgp4MpType::Message => {
            Bgp4MpEnum::Message(parse_bgp4mp_message(input, AsnLength::Bits16, bgp4mp_type)?)
        }
        Bgp4MpType::MessageAs4 => {
            Bgp4MpEnum::Message(parse_bgp4mp_message(input, AsnLength::Bits32, bgp4mp_type)?)
        }
    };

    Ok(msg)
}

/*
   0                   1                   2                   3
   0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
  |         Peer AS Number        |        Local AS Number        |
  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
  |        Interface Index        |        Address Family         |
  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
  |                      Peer IP Address (variable)               |
  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
  |                      Local IP Address (variable)              |
  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
  |                    BGP Message... (variable)
  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
*/
pub fn parse_bgp4mp_message(
    mut data: Bytes,
    asn_len: AsnLength,
    msg_type: Bgp4MpType,
) -> Result<Bgp4MpMessage, ParserError> {
    let peer_asn = data.read_asn(&asn_len)?;
    let local_asn = data.read_asn(&asn_len)?;
    let interface_index = data.read_u16()?;
    let afi = data.read_afi().map_err(|e| {
        // not a fatal condition for the stream: surface the record unparsed
        ParserError::Unsupported(format!("unsupported BGP4MP address family: {e}"))
    })?;
    let peer_ip = data.read_address(&afi)?;
    let local_ip = data.read_address(&afi)?;

    let bgp_message = parse_bgp_message(&mut data, &asn_len)?;

    Ok(Bgp4MpMessage {
        msg_type,
        peer_asn,
        local_asn,
        interface_index,
        peer_ip,
        local_ip,
        bgp_message,
    })
}

/*
   0                   1                   2                   3
   0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
  |         Peer AS Number        |        Local AS Number        |
  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
  |        Interface Index        |        Address Family         |
  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
  |                      Peer IP Address (variable)               |
  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
  |                      Local IP Address (variable)              |
  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
  |            Old State          |          New State            |
  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
*/
pub fn parse_bgp4mp_state_change(
    mut input: Bytes,
    asn_len: AsnLength,
    msg_type: Bgp4MpType,
) -> Result<Bgp4MpStateChange, ParserError> {
    let total_len = input.len();

    let peer_asn = input.read_asn(&asn_len)?;
    let local_asn = input.read_asn(&asn_len)?;

    // Zebra dump corruption workaround: some collectors emit 8-byte state
    // change records carrying only the two state words after the ASNs.
    if total_len == 8 {
        warn!("8-byte BGP4MP state change record (zebra bug?)");
        let old_state = BgpState::try_from(input.read_u16()?)?;
        let new_state = BgpState::try_from(input.read_u16()?)?;
        return Ok(Bgp4MpStateChange {
            msg_type,
            peer_asn,
            local_asn,
            interface_index: 0,
            peer_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            local_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            old_state,
            new_state,
        });
    }

    let interface_index = input.read_u16()?;
    let address_family = input.read_afi()?;
    let peer_addr = input.read_address(&address_family)?;
    let local_addr = input.read_address(&address_family)?;
    let old_state = BgpState::try_from(input.read_u16()?)?;
    let new_state = BgpState::try_from(input.read_u16()?)?;
    Ok(Bgp4MpStateChange {
        msg_type,
        peer_asn,
        local_asn,
        interface_index,
        peer_addr,
        local_addr,
        old_state,
        new_state,
    })
}
