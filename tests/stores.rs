//! Scenario tests for the shared value stores and the prefix indexes.
use routestream::*;
use std::str::FromStr;

fn pfx(s: &str) -> Prefix {
    Prefix::from_str(s).unwrap()
}

/// Path store deduplication across peers, scenario S5.
#[test]
fn test_path_store_core_dedup() {
    let mut store = PathStore::new();

    // `1 2 3` from peer 1 yields core path `2 3`
    let core_id = store.get_path_id(&AsPath::from_sequence([1, 2, 3]), 1);
    let sp = store.get_store_path(core_id).unwrap();
    assert!(sp.is_core());
    assert_eq!(sp.stored_path().to_string(), "2 3");

    // `2 3` from peer 99 stores identical bytes without the core flag
    let flat_id = store.get_path_id(&AsPath::from_sequence([2, 3]), 99);
    let sp = store.get_store_path(flat_id).unwrap();
    assert!(!sp.is_core());

    assert_ne!(core_id, flat_id);
    assert_eq!(core_id.path_hash, flat_id.path_hash);
    assert_ne!(core_id.path_index, flat_id.path_index);
    assert_eq!(store.len(), 2);

    // reconstruction puts the peer segment back
    assert_eq!(store.get_full_path(core_id, 1).unwrap().to_string(), "1 2 3");
    assert_eq!(store.get_full_path(flat_id, 99).unwrap().to_string(), "2 3");
}

/// Patricia overlap queries, scenario S6.
#[test]
fn test_patricia_overlap_scenario() {
    let mut tree: PatriciaTree<()> = PatriciaTree::new();
    for p in ["10.0.0.0/8", "10.1.0.0/16", "10.1.1.0/24", "11.0.0.0/8"] {
        tree.insert(pfx(p));
    }

    let mut results = ResultSet::new();

    // more-specifics of 10.0.0.0/8 exclude the node itself
    let node = tree.search_exact(&pfx("10.0.0.0/8")).unwrap();
    tree.more_specifics(node, &mut results);
    let mut found: Vec<String> = results
        .handles()
        .iter()
        .map(|h| tree.prefix(*h).unwrap().to_string())
        .collect();
    found.sort();
    assert_eq!(found, vec!["10.1.0.0/16", "10.1.1.0/24"]);

    // less-specifics of 10.1.1.0/24, nearest first
    let node = tree.search_exact(&pfx("10.1.1.0/24")).unwrap();
    tree.less_specifics(node, &mut results);
    let found: Vec<String> = results
        .handles()
        .iter()
        .map(|h| tree.prefix(*h).unwrap().to_string())
        .collect();
    assert_eq!(found, vec!["10.1.0.0/16", "10.0.0.0/8"]);

    assert_eq!(
        tree.prefix_overlap_info(&pfx("10.1.1.0/24")),
        OverlapInfo::EXACT | OverlapInfo::LESS_SPECIFIC
    );
    assert_eq!(
        tree.prefix_overlap_info(&pfx("10.1.0.0/16")),
        OverlapInfo::EXACT | OverlapInfo::LESS_SPECIFIC | OverlapInfo::MORE_SPECIFIC
    );
}

/// Exact search over a generated prefix population.
#[test]
fn test_patricia_exact_search_population() {
    let mut tree: PatriciaTree<u32> = PatriciaTree::new();
    let mut inserted = vec![];

    for a in 0..8u8 {
        for len in [12u8, 16, 20, 24] {
            let prefix = pfx(&format!("10.{}.0.0/{len}", a * 16));
            let node = tree.insert(prefix);
            tree.set_user(node, u32::from(a) * 100 + u32::from(len));
            inserted.push(prefix);
        }
    }
    assert_eq!(tree.prefix_count(Afi::Ipv4), inserted.len() as u64);

    for prefix in &inserted {
        assert!(tree.search_exact(prefix).is_some(), "{prefix} not found");
    }
    // never-inserted prefixes miss
    assert!(tree.search_exact(&pfx("10.8.0.0/13")).is_none());
    assert!(tree.search_exact(&pfx("172.16.0.0/12")).is_none());

    // removal restores the count and loses only the removed prefix
    let victim = inserted[5];
    tree.remove_prefix(&victim);
    assert_eq!(tree.prefix_count(Afi::Ipv4), inserted.len() as u64 - 1);
    assert!(tree.search_exact(&victim).is_none());
    for prefix in inserted.iter().filter(|p| **p != victim) {
        assert!(tree.search_exact(prefix).is_some());
    }
}

/// IP counter totals equal the size of the union of the inserted prefixes.
#[test]
fn test_ip_counter_union_semantics() {
    let mut counter = IpCounter::new();

    counter.add(&pfx("10.0.0.0/8"));
    counter.add(&pfx("10.250.0.0/16")); // inside the /8
    counter.add(&pfx("11.0.0.0/16"));
    assert_eq!(counter.total(Afi::Ipv4), (1 << 24) + (1 << 16));

    let (covered, full) = counter.overlap(&pfx("10.250.0.0/16"));
    assert_eq!(covered, 1 << 16);
    assert!(full);

    let (covered, full) = counter.overlap(&pfx("11.0.0.0/8"));
    assert_eq!(covered, 1 << 16);
    assert!(!full);
}

/// Peer signature map assigns stable IDs and ignores the ASN.
#[test]
fn test_peer_sig_map_flow() {
    let mut map = PeerSigMap::new();

    let id_a = map.get_or_insert("route-views2", "192.0.2.1".parse().unwrap(), 64500);
    let id_b = map.get_or_insert("route-views2", "2001:db8::1".parse().unwrap(), 64501);
    // ASN churn on the same (collector, IP)
    let id_c = map.get_or_insert("route-views2", "192.0.2.1".parse().unwrap(), 65000);

    assert_eq!(id_a, id_c);
    assert_ne!(id_a, id_b);
    assert_eq!(map.len(), 2);

    let sig = map.get_signature(id_a).unwrap();
    assert_eq!(sig.collector, "route-views2");
    assert_eq!(sig.peer_ip, "192.0.2.1".parse::<std::net::IpAddr>().unwrap());
}

/// Path hashes and store IDs are deterministic across runs.
#[test]
fn test_path_store_determinism() {
    let inputs: Vec<(AsPath, u32)> = (0..50)
        .map(|i| {
            let peer = 64500 + (i % 5);
            (AsPath::from_sequence([peer, 3356, 1299, 64500 + i]), peer)
        })
        .collect();

    let run = |inputs: &[(AsPath, u32)]| -> Vec<PathId> {
        let mut store = PathStore::new();
        inputs
            .iter()
            .map(|(path, peer)| store.get_path_id(path, *peer))
            .collect()
    };

    assert_eq!(run(&inputs), run(&inputs));
}
