//! Global deduplicating store of canonical AS paths.
//!
//! Paths are canonicalised by stripping the leading peer segment before
//! storage (the "core path"): most paths from one peer differ only in that
//! prepended peer ASN, so a RIB's worth of paths collapses dramatically.
//! Identity from the outside is the `(path_hash, path_index)` pair, which is
//! stable for the lifetime of the store.
use crate::models::{AsPath, PathSegment, SegmentIter};
use std::collections::HashMap;

/// Composite identifier of a stored path: the path hash selects the bucket,
/// the index selects the entry within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathId {
    pub path_hash: u32,
    pub path_index: u16,
}

impl PathId {
    /// Denotes the null (absent) path.
    pub const NULL: PathId = PathId {
        path_hash: u32::MAX,
        path_index: u16::MAX,
    };

    pub const fn is_null(&self) -> bool {
        self.path_hash == u32::MAX && self.path_index == u16::MAX
    }
}

/// A canonicalised path held by the store.
#[derive(Debug, Clone)]
pub struct StorePath {
    is_core: bool,
    idx: u32,
    path: AsPath,
}

impl StorePath {
    /// Whether the stored path had its leading peer segment stripped.
    pub const fn is_core(&self) -> bool {
        self.is_core
    }

    /// Global serial index: the number of paths that were in the store when
    /// this one was added.
    pub const fn idx(&self) -> u32 {
        self.idx
    }

    /// The stored (possibly peer-stripped) path.
    pub const fn stored_path(&self) -> &AsPath {
        &self.path
    }

    /// Reconstruct the full path as observed from `peer_asn`: core paths get
    /// a synthesized peer segment prepended, others are copied as is.
    pub fn to_full_path(&self, peer_asn: u32) -> AsPath {
        match self.is_core {
            true => self.path.prepend_asn(peer_asn),
            false => self.path.clone(),
        }
    }

    /// Origin segment of the stored path.
    pub fn origin_segment(&self) -> Option<PathSegment> {
        self.path.origin_segment()
    }

    /// Iterate the full path's segments without materialising it: a core
    /// path yields a synthetic peer segment first.
    pub fn segments(&self, peer_asn: u32) -> StorePathSegmentIter<'_> {
        StorePathSegmentIter {
            peer_segment: self.is_core.then_some(peer_asn),
            inner: self.path.segments(),
        }
    }
}

pub struct StorePathSegmentIter<'a> {
    peer_segment: Option<u32>,
    inner: SegmentIter<'a>,
}

impl Iterator for StorePathSegmentIter<'_> {
    type Item = PathSegment;

    fn next(&mut self) -> Option<PathSegment> {
        if let Some(asn) = self.peer_segment.take() {
            return Some(PathSegment::Asn(asn));
        }
        self.inner.next()
    }
}

/// The deduplicating path store: hash buckets of distinct paths.
#[derive(Debug, Default)]
pub struct PathStore {
    buckets: HashMap<u32, Vec<StorePath>>,
    paths_count: u32,
}

impl PathStore {
    pub fn new() -> PathStore {
        PathStore::default()
    }

    /// Total number of distinct paths in the store.
    pub fn len(&self) -> u32 {
        self.paths_count
    }

    pub fn is_empty(&self) -> bool {
        self.paths_count == 0
    }

    /// Get the stable ID for `(path, peer_asn)`, inserting a new entry on
    /// first sight.
    ///
    /// When the path has at least two segments and leads with a simple ASN
    /// equal to the peer's, the leading segment is stripped (zero copy) and
    /// the entry is flagged `is_core`. Two identical byte sequences with
    /// different `is_core` flags are distinct entries.
    pub fn get_path_id(&mut self, path: &AsPath, peer_asn: u32) -> PathId {
        let (candidate, is_core) = match path.len() > 1
            && matches!(path.segments().next(), Some(PathSegment::Asn(asn)) if asn == peer_asn)
        {
            true => (path.slice_after_first(), true),
            false => (path.clone(), false),
        };

        let path_hash = candidate.path_hash();
        let bucket = self.buckets.entry(path_hash).or_default();

        if let Some(existing) = bucket
            .iter()
            .position(|sp| sp.is_core == is_core && sp.path == candidate)
        {
            return PathId {
                path_hash,
                path_index: existing as u16,
            };
        }

        let path_index = bucket.len() as u16;
        bucket.push(StorePath {
            is_core,
            idx: self.paths_count,
            // the store always owns its bytes
            path: candidate.to_owned_path(),
        });
        self.paths_count += 1;

        PathId {
            path_hash,
            path_index,
        }
    }

    pub fn get_store_path(&self, id: PathId) -> Option<&StorePath> {
        if id.is_null() {
            return None;
        }
        self.buckets
            .get(&id.path_hash)?
            .get(id.path_index as usize)
    }

    /// Reconstruct the full path behind `id` as observed from `peer_asn`.
    pub fn get_full_path(&self, id: PathId, peer_asn: u32) -> Option<AsPath> {
        Some(self.get_store_path(id)?.to_full_path(peer_asn))
    }

    /// Visit every stored path exactly once. The order is unspecified but
    /// stable while the store is not mutated.
    pub fn iter(&self) -> impl Iterator<Item = (PathId, &StorePath)> {
        self.buckets.iter().flat_map(|(hash, bucket)| {
            bucket.iter().enumerate().map(|(i, sp)| {
                (
                    PathId {
                        path_hash: *hash,
                        path_index: i as u16,
                    },
                    sp,
                )
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_path_dedup() {
        let mut store = PathStore::new();

        // paths from three peers sharing the same core
        let id1 = store.get_path_id(&AsPath::from_sequence([1, 5, 6]), 1);
        let id2 = store.get_path_id(&AsPath::from_sequence([2, 5, 6]), 2);
        let id3 = store.get_path_id(&AsPath::from_sequence([3, 5, 6]), 3);

        assert_eq!(id1, id2);
        assert_eq!(id2, id3);
        assert_eq!(store.len(), 1);
        assert!(store.get_store_path(id1).unwrap().is_core());
    }

    #[test]
    fn test_core_flag_distinguishes_entries() {
        let mut store = PathStore::new();

        // `1 2 3` from peer 1 stores core path `2 3`; `2 3` from peer 99
        // stores the same bytes with is_core unset
        let core_id = store.get_path_id(&AsPath::from_sequence([1, 2, 3]), 1);
        let flat_id = store.get_path_id(&AsPath::from_sequence([2, 3]), 99);

        assert_ne!(core_id, flat_id);
        assert_eq!(core_id.path_hash, flat_id.path_hash);
        assert_ne!(core_id.path_index, flat_id.path_index);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_no_strip_without_peer_prefix() {
        let mut store = PathStore::new();
        let id = store.get_path_id(&AsPath::from_sequence([7, 8, 9]), 1);
        let sp = store.get_store_path(id).unwrap();
        assert!(!sp.is_core());
        assert_eq!(sp.stored_path().to_string(), "7 8 9");
    }

    #[test]
    fn test_single_segment_never_stripped() {
        let mut store = PathStore::new();
        let id = store.get_path_id(&AsPath::from_sequence([1]), 1);
        assert!(!store.get_store_path(id).unwrap().is_core());
    }

    #[test]
    fn test_reconstruction() {
        let mut store = PathStore::new();
        let id = store.get_path_id(&AsPath::from_sequence([1, 5, 6]), 1);

        let rebuilt = store.get_full_path(id, 1).unwrap();
        assert_eq!(rebuilt.to_string(), "1 5 6");

        // same core viewed from a different peer
        let rebuilt = store.get_full_path(id, 42).unwrap();
        assert_eq!(rebuilt.to_string(), "42 5 6");
    }

    #[test]
    fn test_segment_iter_with_synthetic_peer() {
        let mut store = PathStore::new();
        let id = store.get_path_id(&AsPath::from_sequence([1, 5, 6]), 1);
        let sp = store.get_store_path(id).unwrap();

        let segments: Vec<PathSegment> = sp.segments(1).collect();
        assert_eq!(
            segments,
            vec![
                PathSegment::Asn(1),
                PathSegment::Asn(5),
                PathSegment::Asn(6)
            ]
        );
    }

    #[test]
    fn test_determinism() {
        let inputs: Vec<(AsPath, u32)> = vec![
            (AsPath::from_sequence([1, 5, 6]), 1),
            (AsPath::from_sequence([2, 5, 6]), 2),
            (AsPath::from_sequence([5, 6]), 5),
            (AsPath::from_sequence([9, 9, 9]), 9),
            (AsPath::from_sequence([1, 5, 6]), 1),
        ];

        let run = |inputs: &[(AsPath, u32)]| {
            let mut store = PathStore::new();
            inputs
                .iter()
                .map(|(p, asn)| store.get_path_id(p, *asn))
                .collect::<Vec<PathId>>()
        };

        assert_eq!(run(&inputs), run(&inputs));
    }

    #[test]
    fn test_null_id() {
        let store = PathStore::new();
        assert!(PathId::NULL.is_null());
        assert!(store.get_store_path(PathId::NULL).is_none());
    }

    #[test]
    fn test_iteration_visits_all() {
        let mut store = PathStore::new();
        let mut ids = vec![
            store.get_path_id(&AsPath::from_sequence([1, 2]), 9),
            store.get_path_id(&AsPath::from_sequence([3, 4]), 9),
            store.get_path_id(&AsPath::from_sequence([5, 6]), 9),
        ];

        let mut seen: Vec<PathId> = store.iter().map(|(id, _)| id).collect();
        ids.sort_by_key(|id| (id.path_hash, id.path_index));
        seen.sort_by_key(|id| (id.path_hash, id.path_index));
        assert_eq!(ids, seen);
    }
}
