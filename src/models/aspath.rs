//! AS path representation.
//!
//! A path is stored as a densely packed byte buffer of segment records with
//! cached segment count and origin offset. AS_SEQUENCE segments from the wire
//! are expanded into one [PathSegment::Asn] record per ASN, so the external
//! path length equals the number of ASNs across all sequences plus one per
//! set-like segment. The buffer lives in a [Bytes] handle, which makes a path
//! either a cheap view into the enclosing record's buffer or an owned copy,
//! with identical semantics.
use crate::error::ParserError;
use crate::models::AsnLength;
use bytes::{BufMut, Bytes, BytesMut};
use itertools::Itertools;
use smallvec::SmallVec;
use std::fmt::{Display, Formatter, Write};
use std::hash::{Hash, Hasher};

// internal segment record tags
const SEG_ASN: u8 = 1;
const SEG_SET: u8 = 2;
const SEG_CONFED_SET: u8 = 3;
const SEG_CONFED_SEQ: u8 = 4;

// wire segment types, RFC 4271 / RFC 5065
const AS_SET: u8 = 1;
const AS_SEQUENCE: u8 = 2;
const AS_CONFED_SEQUENCE: u8 = 3;
const AS_CONFED_SET: u8 = 4;

const EMPTY_OFFSET: u16 = u16::MAX;

/// One segment of an AS path.
///
/// `Asn` is the only form produced from AS_SEQUENCE wire segments (one per
/// ASN); the set variants carry up to 255 member ASNs each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Asn(u32),
    Set(SmallVec<[u32; 8]>),
    ConfedSet(SmallVec<[u32; 8]>),
    ConfedSeq(SmallVec<[u32; 8]>),
}

impl PathSegment {
    /// Hash of a single segment: the ASN itself, or the first member of a
    /// set-like segment.
    pub fn seg_hash(&self) -> u32 {
        match self {
            PathSegment::Asn(asn) => *asn,
            PathSegment::Set(v) | PathSegment::ConfedSet(v) | PathSegment::ConfedSeq(v) => {
                v.first().copied().unwrap_or(0)
            }
        }
    }

    pub const fn is_confed(&self) -> bool {
        matches!(self, PathSegment::ConfedSet(_) | PathSegment::ConfedSeq(_))
    }

    fn tag(&self) -> u8 {
        match self {
            PathSegment::Asn(_) => SEG_ASN,
            PathSegment::Set(_) => SEG_SET,
            PathSegment::ConfedSet(_) => SEG_CONFED_SET,
            PathSegment::ConfedSeq(_) => SEG_CONFED_SEQ,
        }
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Asn(asn) => write!(f, "{asn}"),
            PathSegment::Set(v) => write!(f, "{{{}}}", v.iter().join(",")),
            PathSegment::ConfedSet(v) => write!(f, "[{}]", v.iter().join(",")),
            PathSegment::ConfedSeq(v) => write!(f, "({})", v.iter().join(" ")),
        }
    }
}

/// An AS path as a packed sequence of segment records.
#[derive(Clone, Default)]
pub struct AsPath {
    data: Bytes,
    seg_count: u16,
    origin_offset: u16,
}

/// Byte-identical data means equal paths.
impl PartialEq for AsPath {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for AsPath {}

impl Hash for AsPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

impl AsPath {
    pub fn new() -> AsPath {
        AsPath {
            data: Bytes::new(),
            seg_count: 0,
            origin_offset: EMPTY_OFFSET,
        }
    }

    /// Build a path from segments. Sequences should already be expanded into
    /// individual `Asn` segments.
    pub fn from_segments<I: IntoIterator<Item = PathSegment>>(segments: I) -> AsPath {
        let mut buf = BytesMut::new();
        for seg in segments {
            encode_segment(&mut buf, &seg);
        }
        AsPath::from_packed(buf.freeze())
    }

    /// Shorthand for a path made of a single expanded AS_SEQUENCE.
    pub fn from_sequence<S: AsRef<[u32]>>(seq: S) -> AsPath {
        AsPath::from_segments(seq.as_ref().iter().copied().map(PathSegment::Asn))
    }

    /// Wrap an already-packed buffer, recomputing the cached fields. The
    /// buffer may be a view into a larger allocation; no copy happens.
    pub(crate) fn from_packed(data: Bytes) -> AsPath {
        let mut path = AsPath {
            data,
            seg_count: 0,
            origin_offset: EMPTY_OFFSET,
        };
        path.update_fields();
        path
    }

    /// Parse an AS_PATH attribute body with the given ASN width. AS_SEQUENCE
    /// segments are expanded one record per ASN; set-like segments become one
    /// record each.
    pub fn from_wire(mut wire: Bytes, asn_len: AsnLength) -> Result<AsPath, ParserError> {
        let width = match asn_len {
            AsnLength::Bits16 => 2usize,
            AsnLength::Bits32 => 4usize,
        };

        let mut buf = BytesMut::with_capacity(wire.len() * 2);
        let mut last_tag = SEG_ASN;

        while !wire.is_empty() {
            if wire.len() < 2 {
                return Err(ParserError::MalformedPath(
                    "truncated segment header".to_string(),
                ));
            }
            let seg_type = wire[0];
            let asn_count = wire[1] as usize;

            if !(AS_SET..=AS_CONFED_SET).contains(&seg_type) {
                return Err(ParserError::MalformedPath(format!(
                    "invalid AS path segment type: {seg_type}"
                )));
            }
            if wire.len() < 2 + asn_count * width {
                return Err(ParserError::MalformedPath(format!(
                    "segment length overflows attribute: {} ASNs of width {} in {} bytes",
                    asn_count,
                    width,
                    wire.len() - 2
                )));
            }

            let tag = match seg_type {
                AS_SET => SEG_SET,
                AS_SEQUENCE => SEG_ASN,
                AS_CONFED_SET => SEG_CONFED_SET,
                AS_CONFED_SEQUENCE => SEG_CONFED_SEQ,
                _ => unreachable!(),
            };

            // two back-to-back non-sequence segments of identical kind are
            // malformed input
            if tag != SEG_ASN && tag == last_tag {
                return Err(ParserError::MalformedPath(format!(
                    "consecutive segments of identical set type: {seg_type}"
                )));
            }
            last_tag = tag;

            let read_asn = |bytes: &[u8], i: usize| -> u32 {
                let at = 2 + i * width;
                match width {
                    2 => u16::from_be_bytes([bytes[at], bytes[at + 1]]) as u32,
                    _ => u32::from_be_bytes([
                        bytes[at],
                        bytes[at + 1],
                        bytes[at + 2],
                        bytes[at + 3],
                    ]),
                }
            };

            if tag == SEG_ASN {
                for i in 0..asn_count {
                    buf.put_u8(SEG_ASN);
                    buf.put_u32(read_asn(&wire, i));
                }
            } else {
                buf.put_u8(tag);
                buf.put_u8(asn_count as u8);
                for i in 0..asn_count {
                    buf.put_u32(read_asn(&wire, i));
                }
            }

            let _ = wire.split_to(2 + asn_count * width);
        }

        Ok(AsPath::from_packed(buf.freeze()))
    }

    /// Recompute `seg_count` and `origin_offset` by walking the buffer. Must
    /// be called after any mutation of the underlying data.
    fn update_fields(&mut self) {
        debug_assert!(self.data.len() < u16::MAX as usize);
        self.seg_count = 0;
        self.origin_offset = EMPTY_OFFSET;

        let mut offset = 0usize;
        while offset < self.data.len() {
            self.origin_offset = offset as u16;
            self.seg_count += 1;
            offset += segment_size(&self.data, offset);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of segments after sequence expansion: the sum of ASNs across
    /// all sequences plus one per set-like segment.
    pub fn len(&self) -> usize {
        self.seg_count as usize
    }

    /// The packed segment data backing this path.
    pub fn raw_data(&self) -> &Bytes {
        &self.data
    }

    pub fn segments(&self) -> SegmentIter<'_> {
        SegmentIter {
            data: &self.data,
            offset: 0,
        }
    }

    /// The last segment of the path.
    pub fn origin_segment(&self) -> Option<PathSegment> {
        if self.data.is_empty() {
            return None;
        }
        Some(decode_segment(&self.data, self.origin_offset as usize).1)
    }

    /// The origin ASN; `None` when the path is empty or the origin segment is
    /// not a simple ASN.
    pub fn origin_asn(&self) -> Option<u32> {
        match self.origin_segment()? {
            PathSegment::Asn(asn) => Some(asn),
            _ => None,
        }
    }

    /// Path hash: first-segment hash in the high 16 bits, origin-segment hash
    /// in the low 16 bits, pushed through an avalanche mix. The empty path
    /// hashes to zero.
    pub fn path_hash(&self) -> u32 {
        if self.data.is_empty() {
            return 0;
        }
        let first = decode_segment(&self.data, 0).1.seg_hash();
        let origin = decode_segment(&self.data, self.origin_offset as usize)
            .1
            .seg_hash();
        mix_bits(((first & 0xFFFF) << 16) | (origin & 0xFFFF))
    }

    pub fn has_confed_segment(&self) -> bool {
        self.segments().any(|seg| seg.is_confed())
    }

    /// A zero-copy view of this path with the leading segment dropped.
    /// Callers must ensure the path has at least one segment.
    pub(crate) fn slice_after_first(&self) -> AsPath {
        let first_size = segment_size(&self.data, 0);
        AsPath {
            data: self.data.slice(first_size..),
            seg_count: self.seg_count - 1,
            origin_offset: self.origin_offset - first_size as u16,
        }
    }

    /// A new path with a simple ASN segment prepended.
    pub(crate) fn prepend_asn(&self, asn: u32) -> AsPath {
        let mut buf = BytesMut::with_capacity(5 + self.data.len());
        buf.put_u8(SEG_ASN);
        buf.put_u32(asn);
        buf.extend_from_slice(&self.data);
        let origin_offset = match self.data.is_empty() {
            true => 0,
            false => self.origin_offset + 5,
        };
        AsPath {
            data: buf.freeze(),
            seg_count: self.seg_count + 1,
            origin_offset,
        }
    }

    /// Deep copy into a freshly owned buffer, detaching from any shared
    /// record allocation.
    pub fn to_owned_path(&self) -> AsPath {
        AsPath {
            data: Bytes::from(self.data.to_vec()),
            seg_count: self.seg_count,
            origin_offset: self.origin_offset,
        }
    }

    /// Merge AS_PATH with AS4_PATH for the ASN32 transition, RFC 6793
    /// section 4.2.3: when AS_PATH is at least as long as AS4_PATH, prepend
    /// the excess leading segments of AS_PATH (already expanded to 32-bit
    /// storage) to AS4_PATH; otherwise AS4_PATH is ignored.
    pub fn merge_as4_path(as_path: &AsPath, as4_path: &AsPath) -> Option<AsPath> {
        if as4_path.has_confed_segment() {
            return None;
        }
        if as_path.len() < as4_path.len() {
            return Some(as_path.clone());
        }

        let keep = as_path.len() - as4_path.len();
        let mut offset = 0usize;
        for _ in 0..keep {
            offset += segment_size(&as_path.data, offset);
        }

        let mut buf = BytesMut::with_capacity(offset + as4_path.data.len());
        buf.extend_from_slice(&as_path.data[..offset]);
        buf.extend_from_slice(&as4_path.data);
        Some(AsPath::from_packed(buf.freeze()))
    }

    /// The documented filterable form: `_` between segments instead of space.
    pub fn to_filterable_string(&self) -> String {
        let mut out = String::new();
        for (i, seg) in self.segments().enumerate() {
            if i != 0 {
                out.push('_');
            }
            let _ = write!(out, "{seg}");
        }
        out
    }
}

impl Display for AsPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, seg) in self.segments().enumerate() {
            if i != 0 {
                write!(f, " ")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for AsPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "AsPath({self})")
    }
}

pub struct SegmentIter<'a> {
    data: &'a Bytes,
    offset: usize,
}

impl Iterator for SegmentIter<'_> {
    type Item = PathSegment;

    fn next(&mut self) -> Option<PathSegment> {
        if self.offset >= self.data.len() {
            return None;
        }
        let (size, seg) = decode_segment(self.data, self.offset);
        self.offset += size;
        Some(seg)
    }
}

fn encode_segment(buf: &mut BytesMut, seg: &PathSegment) {
    match seg {
        PathSegment::Asn(asn) => {
            buf.put_u8(SEG_ASN);
            buf.put_u32(*asn);
        }
        PathSegment::Set(v) | PathSegment::ConfedSet(v) | PathSegment::ConfedSeq(v) => {
            debug_assert!(v.len() <= u8::MAX as usize);
            buf.put_u8(seg.tag());
            buf.put_u8(v.len() as u8);
            for asn in v {
                buf.put_u32(*asn);
            }
        }
    }
}

/// Byte size of the segment record starting at `offset`.
fn segment_size(data: &Bytes, offset: usize) -> usize {
    match data[offset] {
        SEG_ASN => 5,
        _ => 2 + data[offset + 1] as usize * 4,
    }
}

fn decode_segment(data: &Bytes, offset: usize) -> (usize, PathSegment) {
    let tag = data[offset];
    if tag == SEG_ASN {
        let asn = u32::from_be_bytes([
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
            data[offset + 4],
        ]);
        return (5, PathSegment::Asn(asn));
    }

    let count = data[offset + 1] as usize;
    let mut asns: SmallVec<[u32; 8]> = SmallVec::with_capacity(count);
    for i in 0..count {
        let at = offset + 2 + i * 4;
        asns.push(u32::from_be_bytes([
            data[at],
            data[at + 1],
            data[at + 2],
            data[at + 3],
        ]));
    }
    let seg = match tag {
        SEG_SET => PathSegment::Set(asns),
        SEG_CONFED_SET => PathSegment::ConfedSet(asns),
        _ => PathSegment::ConfedSeq(asns),
    };
    (2 + count * 4, seg)
}

/// <http://burtleburtle.net/bob/hash/integer.html>
fn mix_bits(mut a: u32) -> u32 {
    a ^= a >> 4;
    a = (a ^ 0xdeadbeef).wrapping_add(a << 5);
    a ^ (a >> 11)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn wire_sequence_16(asns: &[u16]) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_u8(AS_SEQUENCE);
        buf.put_u8(asns.len() as u8);
        for asn in asns {
            buf.put_u16(*asn);
        }
        buf.freeze()
    }

    fn wire_sequence_32(asns: &[u32]) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_u8(AS_SEQUENCE);
        buf.put_u8(asns.len() as u8);
        for asn in asns {
            buf.put_u32(*asn);
        }
        buf.freeze()
    }

    #[test]
    fn test_sequence_expansion() {
        let path = AsPath::from_wire(wire_sequence_32(&[64500, 64501, 64502]), AsnLength::Bits32)
            .unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.to_string(), "64500 64501 64502");
        assert_eq!(path.origin_asn(), Some(64502));
    }

    #[test]
    fn test_16bit_wire() {
        let path = AsPath::from_wire(wire_sequence_16(&[1, 2, 3]), AsnLength::Bits16).unwrap();
        assert_eq!(path.to_string(), "1 2 3");
        assert_eq!(path, AsPath::from_sequence([1, 2, 3]));
    }

    #[test]
    fn test_set_display() {
        let path = AsPath::from_segments([
            PathSegment::Asn(64500),
            PathSegment::Set(smallvec![1, 2, 3]),
        ]);
        assert_eq!(path.to_string(), "64500 {1,2,3}");
        assert_eq!(path.to_filterable_string(), "64500_{1,2,3}");

        let path = AsPath::from_segments([
            PathSegment::ConfedSeq(smallvec![65001, 65002]),
            PathSegment::Asn(3356),
            PathSegment::ConfedSet(smallvec![65010, 65011]),
        ]);
        assert_eq!(path.to_string(), "(65001 65002) 3356 [65010,65011]");
    }

    #[test]
    fn test_origin_accessors() {
        let path = AsPath::from_segments([
            PathSegment::Asn(64500),
            PathSegment::Set(smallvec![1, 2]),
        ]);
        assert_eq!(path.origin_segment(), Some(PathSegment::Set(smallvec![1, 2])));
        assert_eq!(path.origin_asn(), None);

        assert_eq!(AsPath::new().origin_segment(), None);
    }

    #[test]
    fn test_invalid_segment_type() {
        let data = Bytes::from_static(&[5, 1, 0, 0, 0, 1]);
        assert!(matches!(
            AsPath::from_wire(data, AsnLength::Bits32),
            Err(ParserError::MalformedPath(_))
        ));
    }

    #[test]
    fn test_segment_length_overflow() {
        // claims 3 ASNs but carries only 1
        let data = Bytes::from_static(&[AS_SEQUENCE, 3, 0, 0, 0, 1]);
        assert!(AsPath::from_wire(data, AsnLength::Bits32).is_err());
    }

    #[test]
    fn test_consecutive_sets_rejected() {
        let mut buf = BytesMut::new();
        for _ in 0..2 {
            buf.put_u8(AS_SET);
            buf.put_u8(1);
            buf.put_u32(64500);
        }
        assert!(AsPath::from_wire(buf.freeze(), AsnLength::Bits32).is_err());

        // sequence in between resets the state
        let mut buf = BytesMut::new();
        buf.put_u8(AS_SET);
        buf.put_u8(1);
        buf.put_u32(1);
        buf.put_u8(AS_SEQUENCE);
        buf.put_u8(1);
        buf.put_u32(2);
        buf.put_u8(AS_SET);
        buf.put_u8(1);
        buf.put_u32(3);
        assert!(AsPath::from_wire(buf.freeze(), AsnLength::Bits32).is_ok());
    }

    #[test]
    fn test_hash_stability() {
        let a = AsPath::from_sequence([64500, 64501, 64502]);
        let b = AsPath::from_wire(wire_sequence_32(&[64500, 64501, 64502]), AsnLength::Bits32)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.path_hash(), b.path_hash());
        assert_eq!(AsPath::new().path_hash(), 0);

        let c = AsPath::from_sequence([64502, 64501, 64500]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_as4_merge() {
        // AS_PATH `1 2 3 23456 23456`, AS4_PATH `70000 80000`
        let as_path = AsPath::from_sequence([1, 2, 3, 23456, 23456]);
        let as4_path = AsPath::from_sequence([70000, 80000]);
        let merged = AsPath::merge_as4_path(&as_path, &as4_path).unwrap();
        assert_eq!(merged.to_string(), "1 2 3 70000 80000");
        assert_eq!(merged.len(), as_path.len());
        assert_eq!(merged.origin_asn(), Some(80000));
    }

    #[test]
    fn test_as4_merge_shorter_as_path() {
        let as_path = AsPath::from_sequence([1, 2]);
        let as4_path = AsPath::from_sequence([70000, 80000, 90000]);
        let merged = AsPath::merge_as4_path(&as_path, &as4_path).unwrap();
        assert_eq!(merged, as_path);
    }

    #[test]
    fn test_as4_merge_rejects_confed() {
        let as_path = AsPath::from_sequence([1, 2, 3]);
        let as4_path = AsPath::from_segments([
            PathSegment::ConfedSeq(smallvec![70000]),
            PathSegment::Asn(80000),
        ]);
        assert!(AsPath::merge_as4_path(&as_path, &as4_path).is_none());
    }

    #[test]
    fn test_prepend_and_slice() {
        let core = AsPath::from_sequence([2, 3]);
        let full = core.prepend_asn(1);
        assert_eq!(full.to_string(), "1 2 3");
        assert_eq!(full.slice_after_first(), core);
        assert_eq!(full.origin_asn(), Some(3));
    }
}
