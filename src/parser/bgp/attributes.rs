//! BGP path attribute parsing.
use crate::error::ParserError;
use crate::models::*;
use crate::parser::bgp::messages::parse_nlri_list;
use crate::parser::ReadUtils;
use bytes::{Buf, Bytes};
use log::{debug, warn};

/// Parse a BGP attribute block.
///
/// `data` contains the entirety of the attributes bytes; the block length
/// prefix has already been consumed by the caller. Attribute-level errors are
/// local: the offending attribute is skipped (or the block stopped, for
/// duplicates and truncation) and whatever was decoded before it is returned.
pub fn parse_attributes(
    mut data: Bytes,
    asn_len: &AsnLength,
    incomplete: &mut Option<IncompleteNlri>,
) -> Result<Attributes, ParserError> {
    let mut attributes = Attributes::default();
    // boolean flags for seen attributes - small dataset in hot loop.
    let mut seen_attributes: [bool; 256] = [false; 256];

    while data.remaining() >= 3 {
        // each attribute is at least 3 bytes: flag(1) + type(1) + length(1)
        let flags = AttrFlags::from_bits_retain(data.get_u8());
        let attr_type_code = data.get_u8();
        let attr_length = match flags.contains(AttrFlags::EXTENDED) {
            false => data.get_u8() as usize,
            true => {
                if data.remaining() < 2 {
                    warn!("attribute block ends inside an extended length field");
                    break;
                }
                data.get_u16() as usize
            }
        };

        let attr_type = AttrType::from(attr_type_code);
        debug!("reading attribute: type -- {attr_type:?}, length -- {attr_length}");

        // MP_REACH/MP_UNREACH may legitimately repeat with different
        // (AFI, SAFI) pairs; the per-pair check happens below. Any other
        // repeated attribute type aborts the block.
        if !matches!(
            attr_type,
            AttrType::MP_REACHABLE_NLRI | AttrType::MP_UNREACHABLE_NLRI
        ) {
            if seen_attributes[attr_type_code as usize] {
                warn!("duplicate attribute type {attr_type:?}, stopping attribute processing");
                break;
            }
            seen_attributes[attr_type_code as usize] = true;
        }

        if data.remaining() < attr_length {
            warn!(
                "not enough bytes: input bytes left - {}, want to read - {}; skipping",
                data.remaining(),
                attr_length
            );
            // break and return already parsed attributes
            break;
        }
        let mut attr_data = data.split_to(attr_length);

        let res: Result<(), ParserError> = match attr_type {
            AttrType::ORIGIN => attr_data.read_u8().and_then(|v| {
                attributes.origin = Some(Origin::try_from(v).map_err(|_| {
                    ParserError::MalformedAttribute(format!("invalid origin value: {v}"))
                })?);
                Ok(())
            }),
            AttrType::AS_PATH => AsPath::from_wire(attr_data, *asn_len).map(|path| {
                attributes.as_path = Some(path);
            }),
            AttrType::NEXT_HOP => attr_data.read_ipv4_address().map(|addr| {
                attributes.next_hop = Some(addr);
            }),
            AttrType::MULTI_EXIT_DISCRIMINATOR => attr_data.read_u32().map(|v| {
                attributes.med = Some(v);
            }),
            AttrType::LOCAL_PREFERENCE => attr_data.read_u32().map(|v| {
                attributes.local_pref = Some(v);
            }),
            AttrType::ATOMIC_AGGREGATE => {
                attributes.atomic_aggregate = true;
                Ok(())
            }
            AttrType::AGGREGATOR => parse_aggregator(attr_data, asn_len).map(|aggr| {
                attributes.aggregator = Some(aggr);
            }),
            AttrType::COMMUNITIES => CommunitySet::from_wire(attr_data).map(|set| {
                attributes.communities = Some(set);
            }),
            AttrType::ORIGINATOR_ID => attr_data.read_ipv4_address().map(|addr| {
                attributes.originator_id = Some(addr);
            }),
            AttrType::CLUSTER_LIST => parse_clusters(attr_data).map(|clusters| {
                attributes.cluster_list = Some(clusters);
            }),
            AttrType::MP_REACHABLE_NLRI => {
                parse_mp_reach(attr_data, incomplete).map(|nlri| {
                    match attributes
                        .mp_reach
                        .iter()
                        .any(|existing| existing.afi == nlri.afi && existing.safi == nlri.safi)
                    {
                        true => warn!(
                            "two MP_REACH_NLRI for the same protocol ({:?}, {:?})",
                            nlri.afi, nlri.safi
                        ),
                        false => attributes.mp_reach.push(nlri),
                    }
                })
            }
            AttrType::MP_UNREACHABLE_NLRI => {
                parse_mp_unreach(attr_data, incomplete).map(|nlri| {
                    match attributes
                        .mp_unreach
                        .iter()
                        .any(|existing| existing.afi == nlri.afi && existing.safi == nlri.safi)
                    {
                        true => warn!(
                            "two MP_UNREACH_NLRI for the same protocol ({:?}, {:?})",
                            nlri.afi, nlri.safi
                        ),
                        false => attributes.mp_unreach.push(nlri),
                    }
                })
            }
            AttrType::AS4_PATH => {
                AsPath::from_wire(attr_data, AsnLength::Bits32).and_then(|path| {
                    if path.has_confed_segment() {
                        return Err(ParserError::MalformedAttribute(
                            "confederation segment in AS4_PATH".to_string(),
                        ));
                    }
                    attributes.as4_path = Some(path);
                    Ok(())
                })
            }
            AttrType::AS4_AGGREGATOR => {
                parse_aggregator(attr_data, &AsnLength::Bits32).map(|aggr| {
                    attributes.as4_aggregator = Some(aggr);
                })
            }
            AttrType::Unknown(code) => {
                debug!("unknown attribute type: {code}");
                attributes.unknown.push(AttrRaw {
                    flags,
                    attr_type,
                    bytes: attr_data,
                });
                Ok(())
            }
        };

        if let Err(e) = res {
            // the attribute is dropped, the rest of the block still parses
            warn!("attribute error for {attr_type:?}: {e}");
        }
    }

    process_asn32_transition(&mut attributes, asn_len);

    Ok(attributes)
}

fn parse_aggregator(mut data: Bytes, asn_len: &AsnLength) -> Result<Aggregator, ParserError> {
    let asn = data.read_asn(asn_len)?;
    let addr = data.read_ipv4_address()?;
    Ok(Aggregator { asn, addr })
}

fn parse_clusters(mut data: Bytes) -> Result<Vec<std::net::Ipv4Addr>, ParserError> {
    let mut clusters = Vec::with_capacity(data.remaining() / 4);
    while data.remaining() >= 4 {
        clusters.push(data.read_ipv4_address()?);
    }
    Ok(clusters)
}

/// Parse the MP_REACH_NLRI next hop: length octet, address bytes, and an
/// optional trailing link-local address when the length is 32.
fn parse_mp_next_hop(data: &mut Bytes, afi: &Afi) -> Result<NextHopAddress, ParserError> {
    let next_hop_length = data.read_u8()?;
    match afi {
        Afi::Ipv4 => {
            if next_hop_length != 4 {
                return Err(ParserError::MalformedAttribute(format!(
                    "invalid IPv4 MP next hop length: {next_hop_length}"
                )));
            }
            Ok(NextHopAddress::Ipv4(data.read_ipv4_address()?))
        }
        Afi::Ipv6 => {
            let global = data.read_ipv6_address()?;
            if next_hop_length == 32 {
                let link_local = data.read_ipv6_address()?;
                return Ok(NextHopAddress::Ipv6LinkLocal(global, link_local));
            }
            if next_hop_length != 16 {
                warn!("unknown MP next hop length {next_hop_length}");
            }
            Ok(NextHopAddress::Ipv6(global))
        }
    }
}

/// Parse MP_REACH_NLRI, RFC 4760 section 3.
///
/// Some MRT dumps carry an abbreviated form that starts directly with the
/// next hop length octet. The full form always begins with the zero high
/// byte of the AFI, so a non-zero first byte identifies the abbreviated
/// form: a bare IPv6 unicast next hop with no NLRI.
fn parse_mp_reach(
    mut data: Bytes,
    incomplete: &mut Option<IncompleteNlri>,
) -> Result<MpNlri, ParserError> {
    match data.first() {
        None => {
            return Err(ParserError::MalformedAttribute(
                "empty MP_REACH_NLRI attribute".to_string(),
            ))
        }
        Some(first) if *first != 0 => {
            let next_hop = parse_mp_next_hop(&mut data, &Afi::Ipv6)?;
            return Ok(MpNlri {
                afi: Afi::Ipv6,
                safi: Safi::Unicast,
                next_hop: Some(next_hop),
                prefixes: vec![],
            });
        }
        Some(_) => {}
    }

    let afi = data.read_afi()?;
    let safi = data.read_safi()?;
    let next_hop = parse_mp_next_hop(&mut data, &afi)?;

    // SNPA is defunct and the count should always be 0
    let snpa_count = data.read_u8()?;
    if snpa_count > 0 {
        warn!("MP_REACH_NLRI contains {snpa_count} SNPAs, skipping");
        for _ in 0..snpa_count {
            let snpa_len = data.read_u8()? as usize;
            let _ = data.split_n(snpa_len)?;
        }
    }

    let prefixes = parse_nlri_list(&mut data, &afi, incomplete)?;

    Ok(MpNlri {
        afi,
        safi,
        next_hop: Some(next_hop),
        prefixes,
    })
}

/// Parse MP_UNREACH_NLRI, RFC 4760 section 4.
fn parse_mp_unreach(
    mut data: Bytes,
    incomplete: &mut Option<IncompleteNlri>,
) -> Result<MpNlri, ParserError> {
    let afi = data.read_afi()?;
    let safi = data.read_safi()?;
    let prefixes = parse_nlri_list(&mut data, &afi, incomplete)?;
    Ok(MpNlri {
        afi,
        safi,
        next_hop: None,
        prefixes,
    })
}

/// ASN32 transition handling, RFC 6793 section 4.2.3.
///
/// Only applies to messages encoded with 16-bit ASNs. An AGGREGATOR carrying
/// AS_TRANS is replaced by the AS4_AGGREGATOR; the AS_PATH is merged with the
/// AS4_PATH when the AS_PATH is at least as long.
fn process_asn32_transition(attributes: &mut Attributes, asn_len: &AsnLength) {
    if asn_len.is_four_byte() {
        // these attributes "SHOULD NOT" be used with ASN32
        if attributes.as4_path.is_some() {
            warn!("ASN32 message contains AS4_PATH attribute");
        }
        if attributes.as4_aggregator.is_some() {
            warn!("ASN32 message contains AS4_AGGREGATOR attribute");
        }
        return;
    }

    if let (Some(aggregator), Some(as4_aggregator)) =
        (attributes.aggregator, attributes.as4_aggregator)
    {
        if aggregator.asn == Asn::TRANSITION {
            attributes.aggregator = Some(as4_aggregator);
        }
    }

    if let (Some(as_path), Some(as4_path)) = (&attributes.as_path, &attributes.as4_path) {
        match AsPath::merge_as4_path(as_path, as4_path) {
            Some(merged) => attributes.as_path = Some(merged),
            None => warn!("invalid confederation segment in AS4_PATH, ignoring it"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};
    use std::net::Ipv4Addr;

    fn attr_header(buf: &mut BytesMut, attr_type: u8, len: u8) {
        buf.put_u8(0x40);
        buf.put_u8(attr_type);
        buf.put_u8(len);
    }

    fn parse(data: Bytes, asn_len: AsnLength) -> Attributes {
        let mut incomplete = None;
        parse_attributes(data, &asn_len, &mut incomplete).unwrap()
    }

    #[test]
    fn test_basic_attributes() {
        let mut buf = BytesMut::new();
        attr_header(&mut buf, 1, 1);
        buf.put_u8(0); // IGP
        attr_header(&mut buf, 3, 4);
        buf.put_u32(u32::from(Ipv4Addr::new(192, 0, 2, 1)));
        attr_header(&mut buf, 4, 4);
        buf.put_u32(100); // MED
        attr_header(&mut buf, 5, 4);
        buf.put_u32(200); // LOCAL_PREF
        attr_header(&mut buf, 6, 0); // ATOMIC_AGGREGATE

        let attrs = parse(buf.freeze(), AsnLength::Bits32);
        assert_eq!(attrs.origin, Some(Origin::IGP));
        assert_eq!(attrs.next_hop, Some(Ipv4Addr::new(192, 0, 2, 1)));
        assert_eq!(attrs.med, Some(100));
        assert_eq!(attrs.local_pref, Some(200));
        assert!(attrs.atomic_aggregate);
    }

    #[test]
    fn test_unknown_attribute_kept_raw() {
        let mut buf = BytesMut::new();
        attr_header(&mut buf, 254, 2);
        buf.put_u16(0xBEEF);
        let attrs = parse(buf.freeze(), AsnLength::Bits32);
        assert_eq!(attrs.unknown.len(), 1);
        assert_eq!(attrs.unknown[0].attr_type, AttrType::Unknown(254));
    }

    #[test]
    fn test_duplicate_attribute_stops_block() {
        let mut buf = BytesMut::new();
        attr_header(&mut buf, 1, 1);
        buf.put_u8(0);
        attr_header(&mut buf, 1, 1);
        buf.put_u8(1);
        // a MED after the duplicate never gets parsed
        attr_header(&mut buf, 4, 4);
        buf.put_u32(42);

        let attrs = parse(buf.freeze(), AsnLength::Bits32);
        assert_eq!(attrs.origin, Some(Origin::IGP));
        assert_eq!(attrs.med, None);
    }

    #[test]
    fn test_truncated_attribute_keeps_partial() {
        let mut buf = BytesMut::new();
        attr_header(&mut buf, 1, 1);
        buf.put_u8(0);
        // claims 8 bytes but only 2 remain
        attr_header(&mut buf, 4, 8);
        buf.put_u16(0);

        let attrs = parse(buf.freeze(), AsnLength::Bits32);
        assert_eq!(attrs.origin, Some(Origin::IGP));
        assert_eq!(attrs.med, None);
    }

    #[test]
    fn test_mp_reach_full_form() {
        let mut inner = BytesMut::new();
        inner.put_u16(2); // AFI v6
        inner.put_u8(1); // SAFI unicast
        inner.put_u8(16); // next hop length
        inner.put_u128(u128::from("2001:db8::1".parse::<std::net::Ipv6Addr>().unwrap()));
        inner.put_u8(0); // SNPA count
        inner.put_u8(48); // NLRI: 2001:db8:1::/48
        inner.put_slice(&[0x20, 0x01, 0x0d, 0xb8, 0x00, 0x01]);

        let mut buf = BytesMut::new();
        buf.put_u8(0x80);
        buf.put_u8(14);
        buf.put_u8(inner.len() as u8);
        buf.put_slice(&inner);

        let attrs = parse(buf.freeze(), AsnLength::Bits32);
        assert_eq!(attrs.mp_reach.len(), 1);
        let nlri = &attrs.mp_reach[0];
        assert_eq!(nlri.afi, Afi::Ipv6);
        assert_eq!(
            nlri.next_hop,
            Some(NextHopAddress::Ipv6("2001:db8::1".parse().unwrap()))
        );
        assert_eq!(nlri.prefixes[0].to_string(), "2001:db8:1::/48");
    }

    #[test]
    fn test_mp_reach_abbreviated_form() {
        let mut inner = BytesMut::new();
        inner.put_u8(16); // non-zero first byte: abbreviated form
        inner.put_u128(u128::from("2001:db8::2".parse::<std::net::Ipv6Addr>().unwrap()));

        let mut buf = BytesMut::new();
        buf.put_u8(0x80);
        buf.put_u8(14);
        buf.put_u8(inner.len() as u8);
        buf.put_slice(&inner);

        let attrs = parse(buf.freeze(), AsnLength::Bits32);
        assert_eq!(attrs.mp_reach.len(), 1);
        assert_eq!(
            attrs.mp_reach[0].next_hop,
            Some(NextHopAddress::Ipv6("2001:db8::2".parse().unwrap()))
        );
        assert!(attrs.mp_reach[0].prefixes.is_empty());
    }

    #[test]
    fn test_asn32_transition_merge() {
        // scenario: ASN16 message with AS_PATH `1 2 3 23456 23456`,
        // AS4_PATH `70000 80000`, AGGREGATOR AS_TRANS
        let mut buf = BytesMut::new();

        let mut path = BytesMut::new();
        path.put_u8(2); // AS_SEQUENCE
        path.put_u8(5);
        for asn in [1u16, 2, 3, 23456, 23456] {
            path.put_u16(asn);
        }
        attr_header(&mut buf, 2, path.len() as u8);
        buf.put_slice(&path);

        let mut as4_path = BytesMut::new();
        as4_path.put_u8(2);
        as4_path.put_u8(2);
        as4_path.put_u32(70000);
        as4_path.put_u32(80000);
        attr_header(&mut buf, 17, as4_path.len() as u8);
        buf.put_slice(&as4_path);

        attr_header(&mut buf, 7, 6); // AGGREGATOR, asn16
        buf.put_u16(23456);
        buf.put_u32(u32::from(Ipv4Addr::new(192, 0, 2, 1)));

        attr_header(&mut buf, 18, 8); // AS4_AGGREGATOR
        buf.put_u32(70000);
        buf.put_u32(u32::from(Ipv4Addr::new(192, 0, 2, 2)));

        let attrs = parse(buf.freeze(), AsnLength::Bits16);
        let path = attrs.path().unwrap();
        assert_eq!(path.to_string(), "1 2 3 70000 80000");
        assert_eq!(path.origin_asn(), Some(80000));
        let aggr = attrs.aggregator.unwrap();
        assert_eq!(aggr.asn.to_u32(), 70000);
        assert_eq!(aggr.addr, Ipv4Addr::new(192, 0, 2, 2));
    }
}
