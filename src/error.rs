/*!
error module defines the error types used in routestream.
*/
use crate::models::{Afi, Bgp4MpType, BgpState, EntryType, Safi, TableDumpV2Type};
use num_enum::TryFromPrimitiveError;
use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::{error::Error, fmt, io};

#[derive(Debug)]
pub enum ParserError {
    IoError(io::Error),
    EofError(io::Error),
    /// Short read inside a record header or body. The decoder that produced
    /// this error will return `EofExpected` on every subsequent read.
    TruncatedMsg(String),
    /// Clean end of the byte source.
    EofExpected,
    ParseError(String),
    /// Attribute-level problem: duplicate attribute, length overflowing the
    /// enclosing block, reserved AFI/SAFI, confed segment in AS4_PATH.
    MalformedAttribute(String),
    /// Invalid AS path segment type or segment length overflow.
    MalformedPath(String),
    /// A TABLE_DUMP_V2 RIB record arrived before any PEER_INDEX_TABLE.
    MissingPeerIndexTable,
    /// Prefix mask length exceeds the address family width.
    InvalidPrefix(String),
    /// Record surfaced with `MrtMessage::Unsupported`; not fatal.
    Unsupported(String),
    UnrecognizedMrtType(u16),
}

impl Error for ParserError {}

impl Display for ParserError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParserError::IoError(e) => write!(f, "Error: {e}"),
            ParserError::EofError(e) => write!(f, "Error: {e}"),
            ParserError::TruncatedMsg(s) => write!(f, "Error: {s}"),
            ParserError::EofExpected => write!(f, "Error: reach end of file"),
            ParserError::ParseError(s) => write!(f, "Error: {s}"),
            ParserError::MalformedAttribute(s) => write!(f, "Error: malformed attribute: {s}"),
            ParserError::MalformedPath(s) => write!(f, "Error: malformed AS path: {s}"),
            ParserError::MissingPeerIndexTable => {
                write!(f, "Error: missing peer index table for RIB record")
            }
            ParserError::InvalidPrefix(s) => write!(f, "Error: invalid prefix: {s}"),
            ParserError::Unsupported(s) => write!(f, "Error: {s}"),
            ParserError::UnrecognizedMrtType(t) => {
                write!(f, "Error: unrecognized MRT record type: {t}")
            }
        }
    }
}

impl From<io::Error> for ParserError {
    fn from(io_error: io::Error) -> Self {
        match io_error.kind() {
            ErrorKind::UnexpectedEof => ParserError::EofError(io_error),
            _ => ParserError::IoError(io_error),
        }
    }
}

impl From<TryFromPrimitiveError<Bgp4MpType>> for ParserError {
    fn from(value: TryFromPrimitiveError<Bgp4MpType>) -> Self {
        ParserError::ParseError(format!("cannot parse bgp4mp subtype: {}", value.number))
    }
}

impl From<TryFromPrimitiveError<BgpState>> for ParserError {
    fn from(value: TryFromPrimitiveError<BgpState>) -> Self {
        ParserError::ParseError(format!("cannot parse bgp4mp state: {}", value.number))
    }
}

impl From<TryFromPrimitiveError<TableDumpV2Type>> for ParserError {
    fn from(value: TryFromPrimitiveError<TableDumpV2Type>) -> Self {
        ParserError::ParseError(format!("cannot parse table dump v2 type: {}", value.number))
    }
}

impl From<TryFromPrimitiveError<EntryType>> for ParserError {
    fn from(value: TryFromPrimitiveError<EntryType>) -> Self {
        ParserError::ParseError(format!("cannot parse entry type: {}", value.number))
    }
}

impl From<TryFromPrimitiveError<Afi>> for ParserError {
    fn from(value: TryFromPrimitiveError<Afi>) -> Self {
        ParserError::ParseError(format!("Unknown AFI type: {}", value.number))
    }
}

impl From<TryFromPrimitiveError<Safi>> for ParserError {
    fn from(value: TryFromPrimitiveError<Safi>) -> Self {
        ParserError::ParseError(format!("Unknown SAFI type: {}", value.number))
    }
}
