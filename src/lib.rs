/*!
routestream decodes BGP routing data recorded in the MRT binary format (as
published by the RouteViews and RIPE RIS collectors) and presents it as a
uniform, filterable stream of high-level routing elements: RIB entries,
announcements, withdrawals, and peer state changes, each annotated with the
peer identity, prefix, next hop, AS path, and communities.

The crate has three layers:

- the **decoder** ([MrtDecoder]) turns raw MRT bytes into typed records,
  covering TABLE_DUMP, TABLE_DUMP_V2 (with per-stream peer index table
  tracking), and BGP4MP, including the ASN16/ASN32 transition and
  multiprotocol reachability attributes;
- the **element generator** ([Elementor]) expands each record into zero or
  more [BgpElem]s with all peer information copied in;
- the **value library**: canonical [AsPath] and [CommunitySet] values, the
  deduplicating [PathStore], the [PeerSigMap], the [PatriciaTree] prefix
  index, and the [IpCounter] coverage counter.

# Examples

Iterate the elements of an MRT file:

```no_run
use routestream::MrtDecoder;

let file = std::fs::File::open("updates.20211001.0000").unwrap();
for elem in MrtDecoder::new(file) {
    println!("{elem}");
}
```

Deduplicate AS paths across a stream with a shared path store:

```no_run
use routestream::{MrtDecoder, PathStore};

let file = std::fs::File::open("rib.20211001.0000").unwrap();
let mut store = PathStore::new();
for elem in MrtDecoder::new(file) {
    if let Some(path) = &elem.as_path {
        let id = store.get_path_id(path, elem.peer_asn.to_u32());
        println!("{} -> {:?}", path, id);
    }
}
```

Longest-prefix queries over announced prefixes:

```
use routestream::{PatriciaTree, Prefix, ResultSet};
use std::str::FromStr;

let mut tree: PatriciaTree<()> = PatriciaTree::new();
tree.insert(Prefix::from_str("10.0.0.0/8").unwrap());
tree.insert(Prefix::from_str("10.1.0.0/16").unwrap());

let node = tree.search_exact(&Prefix::from_str("10.0.0.0/8").unwrap()).unwrap();
let mut results = ResultSet::new();
tree.more_specifics(node, &mut results);
assert_eq!(results.len(), 1);
```
*/

pub mod error;
pub mod index;
pub mod models;
pub mod parser;
pub mod store;

pub use error::ParserError;
pub use index::{IpCounter, NodeHandle, OverlapInfo, PatriciaTree, ResultSet};
pub use models::*;
pub use parser::{Elementor, MrtDecoder};
pub use store::{PathId, PathStore, PeerId, PeerSigMap, PeerSignature, StorePath};
