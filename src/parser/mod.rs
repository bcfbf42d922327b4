//! MRT decoding: record framing, message parsing, and element generation.
pub mod bgp;
pub mod elem;
pub mod mrt;
pub mod utils;

pub use crate::error::ParserError;
pub use elem::Elementor;
pub(crate) use mrt::try_parse_mrt_record;
pub use utils::ReadUtils;

use crate::models::*;
use log::warn;
use std::io::Read;

/// Streaming MRT decoder over any byte source.
///
/// The decoder owns the per-stream state: the current TABLE_DUMP_V2 peer
/// index table and the sticky corruption flag. A truncated read (or a RIB
/// record with no peer index table) marks the stream corrupted; every read
/// after that reports a clean end of stream.
pub struct MrtDecoder<R: Read> {
    reader: R,
    peer_table: Option<PeerIndexTable>,
    corrupted: bool,
    /// Records read off the stream, including unsupported ones.
    pub records_parsed: u64,
    /// Records that decoded into a supported message.
    pub records_ok: u64,
}

impl<R: Read> MrtDecoder<R> {
    pub fn new(reader: R) -> MrtDecoder<R> {
        MrtDecoder {
            reader,
            peer_table: None,
            corrupted: false,
            records_parsed: 0,
            records_ok: 0,
        }
    }

    /// Decode the next record. `Ok(None)` signals a clean end of stream.
    ///
    /// Errors are sticky: after a truncated header/body or a missing peer
    /// index table, the error is returned once and all subsequent calls
    /// return `Ok(None)`.
    pub fn next_record(&mut self) -> Result<Option<MrtRecord>, ParserError> {
        if self.corrupted {
            return Ok(None);
        }

        match try_parse_mrt_record(&mut self.reader, &mut self.peer_table) {
            Ok(Some(record)) => {
                self.records_parsed += 1;
                if !matches!(record.message, MrtMessage::Unsupported { .. }) {
                    self.records_ok += 1;
                }
                Ok(Some(record))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.records_parsed += 1;
                self.corrupted = true;
                Err(e)
            }
        }
    }

    /// Whether the stream hit a fatal corruption and stopped.
    pub fn is_corrupted(&self) -> bool {
        self.corrupted
    }

    /// The stream's current peer index table, if one has been seen.
    pub fn peer_index_table(&self) -> Option<&PeerIndexTable> {
        self.peer_table.as_ref()
    }

    pub fn into_record_iter(self) -> RecordIter<R> {
        RecordIter { decoder: self }
    }

    pub fn into_elem_iter(self) -> ElemIter<R> {
        ElemIter {
            decoder: self,
            elementor: Elementor::new(),
            pending: vec![],
            next_index: 0,
        }
    }
}

/// Iterate over decoded records. Decoding errors are logged and terminate
/// the iteration.
pub struct RecordIter<R: Read> {
    pub decoder: MrtDecoder<R>,
}

impl<R: Read> Iterator for RecordIter<R> {
    type Item = MrtRecord;

    fn next(&mut self) -> Option<MrtRecord> {
        match self.decoder.next_record() {
            Ok(record) => record,
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    }
}

/// Iterate over the elements of every record in the stream.
pub struct ElemIter<R: Read> {
    decoder: MrtDecoder<R>,
    elementor: Elementor,
    pending: Vec<BgpElem>,
    next_index: usize,
}

impl<R: Read> Iterator for ElemIter<R> {
    type Item = BgpElem;

    fn next(&mut self) -> Option<BgpElem> {
        loop {
            if self.next_index < self.pending.len() {
                let elem = self.pending[self.next_index].clone();
                self.next_index += 1;
                return Some(elem);
            }

            let record = match self.decoder.next_record() {
                Ok(Some(record)) => record,
                Ok(None) => return None,
                Err(e) => {
                    warn!("{e}");
                    return None;
                }
            };
            self.pending = self.elementor.record_to_elems(&record);
            self.next_index = 0;
        }
    }
}

/// This is used in for loop `for elem in decoder {}`
impl<R: Read> IntoIterator for MrtDecoder<R> {
    type Item = BgpElem;
    type IntoIter = ElemIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_elem_iter()
    }
}
