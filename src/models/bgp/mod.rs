//! BGP messages and relevant structs.

pub mod attributes;

pub use attributes::*;

use crate::models::network::*;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::net::Ipv4Addr;

pub type BgpIdentifier = Ipv4Addr;

#[derive(Debug, TryFromPrimitive, IntoPrimitive, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum BgpMessageType {
    OPEN = 1,
    UPDATE = 2,
    NOTIFICATION = 3,
    KEEPALIVE = 4,
}

// https://tools.ietf.org/html/rfc4271#section-4
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BgpMessage {
    Open(BgpOpenMessage),
    Update(BgpUpdateMessage),
    Notification(BgpNotificationMessage),
    KeepAlive,
}

impl BgpMessage {
    pub const fn msg_type(&self) -> BgpMessageType {
        match self {
            BgpMessage::Open(_) => BgpMessageType::OPEN,
            BgpMessage::Update(_) => BgpMessageType::UPDATE,
            BgpMessage::Notification(_) => BgpMessageType::NOTIFICATION,
            BgpMessage::KeepAlive => BgpMessageType::KEEPALIVE,
        }
    }
}

/// BGP Open Message, RFC 4271 section 4.2. Optional parameters are carried
/// through as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BgpOpenMessage {
    pub version: u8,
    pub asn: Asn,
    pub hold_time: u16,
    pub sender_ip: BgpIdentifier,
    pub opt_params: Vec<u8>,
}

/// BGP Update Message, RFC 4271 section 4.3.
///
/// The `withdrawn_prefixes`/`announced_prefixes` fields only carry the legacy
/// IPv4 NLRI lists; multiprotocol prefixes live in the MP_REACH/MP_UNREACH
/// attributes. Use the element generator to reliably extract every prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BgpUpdateMessage {
    pub withdrawn_prefixes: Vec<Prefix>,
    pub attributes: Attributes,
    pub announced_prefixes: Vec<Prefix>,
    /// At most one truncated trailing NLRI observed while reading any of the
    /// prefix lists of this message.
    pub incomplete: Option<IncompleteNlri>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BgpNotificationMessage {
    pub error_code: u8,
    pub sub_error_code: u8,
    pub data: Vec<u8>,
}
