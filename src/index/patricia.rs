//! Patricia trie over IPv4 and IPv6 prefixes.
//!
//! Two independent per-family trees share one arena of nodes addressed by
//! integer handles, which replaces the parent/child raw pointers of the
//! classic implementation. A node either carries a prefix (a value node) or
//! exists only as a branch point (a glue node); glue nodes never remain as
//! leaves, removal collapses them.
//!
//! Each node can carry a user payload of type `T`, dropped when the node is
//! removed or the tree is cleared.
use crate::models::{Afi, Prefix};
use bitflags::bitflags;

const MAXBITS: u8 = 128;

bitflags! {
    /// How a prefix overlaps with the prefixes already in the tree.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OverlapInfo: u8 {
        const EXACT          = 0b001;
        const LESS_SPECIFIC  = 0b010;
        const MORE_SPECIFIC  = 0b100;
    }
}

/// Handle of a node in the tree's arena. Stable until the node is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(u32);

#[derive(Debug)]
struct Node<T> {
    bit: u8,
    /// Address bytes, zero padded; kept for glue nodes too so branch
    /// decisions never need the prefix.
    octets: [u8; 16],
    /// `None` marks a glue node.
    prefix: Option<Prefix>,
    left: Option<NodeHandle>,
    right: Option<NodeHandle>,
    parent: Option<NodeHandle>,
    user: Option<T>,
}

impl<T> Node<T> {
    fn is_glue(&self) -> bool {
        self.prefix.is_none()
    }

    fn child(&self, right: bool) -> Option<NodeHandle> {
        match right {
            true => self.right,
            false => self.left,
        }
    }
}

#[inline]
fn bit_test(octets: &[u8; 16], bit: u8) -> bool {
    octets[(bit >> 3) as usize] & (0x80 >> (bit & 0x07)) != 0
}

/// Reusable container for query results. Querying clears previous content;
/// the cursor supports repeated iteration over one result batch.
#[derive(Debug, Default)]
pub struct ResultSet {
    nodes: Vec<NodeHandle>,
    cursor: usize,
}

impl ResultSet {
    pub fn new() -> ResultSet {
        ResultSet::default()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.cursor = 0;
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn next(&mut self) -> Option<NodeHandle> {
        let handle = self.nodes.get(self.cursor)?;
        self.cursor += 1;
        Some(*handle)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn handles(&self) -> &[NodeHandle] {
        &self.nodes
    }

    fn push(&mut self, handle: NodeHandle) {
        self.nodes.push(handle);
    }
}

/// IPv4 + IPv6 Patricia tries with per-node user payloads.
#[derive(Debug, Default)]
pub struct PatriciaTree<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<u32>,
    head4: Option<NodeHandle>,
    head6: Option<NodeHandle>,
    ipv4_active_nodes: u64,
    ipv6_active_nodes: u64,
}

impl<T> PatriciaTree<T> {
    pub fn new() -> PatriciaTree<T> {
        PatriciaTree {
            slots: vec![],
            free: vec![],
            head4: None,
            head6: None,
            ipv4_active_nodes: 0,
            ipv6_active_nodes: 0,
        }
    }

    fn node(&self, handle: NodeHandle) -> &Node<T> {
        self.slots[handle.0 as usize]
            .as_ref()
            .expect("stale node handle")
    }

    fn node_mut(&mut self, handle: NodeHandle) -> &mut Node<T> {
        self.slots[handle.0 as usize]
            .as_mut()
            .expect("stale node handle")
    }

    fn alloc(&mut self, node: Node<T>) -> NodeHandle {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(node);
                NodeHandle(slot)
            }
            None => {
                self.slots.push(Some(node));
                NodeHandle((self.slots.len() - 1) as u32)
            }
        }
    }

    fn release(&mut self, handle: NodeHandle) {
        self.slots[handle.0 as usize] = None;
        self.free.push(handle.0);
    }

    fn head(&self, afi: Afi) -> Option<NodeHandle> {
        match afi {
            Afi::Ipv4 => self.head4,
            Afi::Ipv6 => self.head6,
        }
    }

    fn set_head(&mut self, afi: Afi, head: Option<NodeHandle>) {
        match afi {
            Afi::Ipv4 => self.head4 = head,
            Afi::Ipv6 => self.head6 = head,
        }
    }

    fn bump_count(&mut self, afi: Afi, delta: i64) {
        let counter = match afi {
            Afi::Ipv4 => &mut self.ipv4_active_nodes,
            Afi::Ipv6 => &mut self.ipv6_active_nodes,
        };
        *counter = counter.wrapping_add_signed(delta);
    }

    /// Number of value nodes per family.
    pub fn prefix_count(&self, afi: Afi) -> u64 {
        match afi {
            Afi::Ipv4 => self.ipv4_active_nodes,
            Afi::Ipv6 => self.ipv6_active_nodes,
        }
    }

    /// The prefix of a value node; `None` for glue nodes.
    pub fn prefix(&self, handle: NodeHandle) -> Option<&Prefix> {
        self.node(handle).prefix.as_ref()
    }

    pub fn user(&self, handle: NodeHandle) -> Option<&T> {
        self.node(handle).user.as_ref()
    }

    /// Attach a user payload, returning the previous one.
    pub fn set_user(&mut self, handle: NodeHandle, user: T) -> Option<T> {
        self.node_mut(handle).user.replace(user)
    }

    pub fn take_user(&mut self, handle: NodeHandle) -> Option<T> {
        self.node_mut(handle).user.take()
    }

    /// Insert a prefix and return its node. Inserting an existing prefix
    /// returns the existing node unchanged.
    pub fn insert(&mut self, prefix: Prefix) -> NodeHandle {
        let prefix = prefix.masked();
        let afi = prefix.afi();
        let octets = prefix.octets();
        let bitlen = prefix.mask_len();

        let head = match self.head(afi) {
            Some(head) => head,
            None => {
                let handle = self.alloc(Node {
                    bit: bitlen,
                    octets,
                    prefix: Some(prefix),
                    left: None,
                    right: None,
                    parent: None,
                    user: None,
                });
                self.bump_count(afi, 1);
                self.set_head(afi, Some(handle));
                return handle;
            }
        };

        // walk down until we run off the tree or reach a value node at or
        // below the target depth
        let mut node_it = head;
        loop {
            let node = self.node(node_it);
            if node.bit >= bitlen && !node.is_glue() {
                break;
            }
            let right = node.bit < MAXBITS && bit_test(&octets, node.bit);
            match node.child(right) {
                Some(child) => node_it = child,
                None => break,
            }
        }

        // first differing bit between the query address and the stop node's
        // address, bounded by both depths
        let test_octets = self.node(node_it).octets;
        let check_bit = self.node(node_it).bit.min(bitlen);
        let mut differ_bit = check_bit;
        'outer: for i in 0..((check_bit as usize + 7) / 8) {
            let r = octets[i] ^ test_octets[i];
            if r == 0 {
                continue;
            }
            for j in 0..8u8 {
                if r & (0x80 >> j) != 0 {
                    differ_bit = (i as u8) * 8 + j;
                    break 'outer;
                }
            }
        }
        if differ_bit > check_bit {
            differ_bit = check_bit;
        }

        // back up past any ancestor at or below the differing bit
        while let Some(parent) = self.node(node_it).parent {
            if self.node(parent).bit < differ_bit {
                break;
            }
            node_it = parent;
        }

        if differ_bit == bitlen && self.node(node_it).bit == bitlen {
            if !self.node(node_it).is_glue() {
                // exact node already in the tree
                return node_it;
            }
            // upgrade the glue node in place
            let node = self.node_mut(node_it);
            node.prefix = Some(prefix);
            node.octets = octets;
            self.bump_count(afi, 1);
            return node_it;
        }

        let new_node = self.alloc(Node {
            bit: bitlen,
            octets,
            prefix: Some(prefix),
            left: None,
            right: None,
            parent: None,
            user: None,
        });
        self.bump_count(afi, 1);

        let node_bit = self.node(node_it).bit;

        if node_bit == differ_bit {
            // the new node becomes a child of node_it
            self.node_mut(new_node).parent = Some(node_it);
            let right = node_bit < MAXBITS && bit_test(&octets, node_bit);
            match right {
                true => self.node_mut(node_it).right = Some(new_node),
                false => self.node_mut(node_it).left = Some(new_node),
            }
            return new_node;
        }

        if bitlen == differ_bit {
            // the new node becomes node_it's parent
            let right = bitlen < MAXBITS && bit_test(&test_octets, bitlen);
            match right {
                true => self.node_mut(new_node).right = Some(node_it),
                false => self.node_mut(new_node).left = Some(node_it),
            }
            let old_parent = self.node(node_it).parent;
            self.node_mut(new_node).parent = old_parent;
            self.rewire_parent(afi, old_parent, node_it, new_node);
            self.node_mut(node_it).parent = Some(new_node);
            return new_node;
        }

        // split with a glue node holding both node_it and the new node
        let glue = self.alloc(Node {
            bit: differ_bit,
            octets: [0u8; 16],
            prefix: None,
            left: None,
            right: None,
            parent: self.node(node_it).parent,
            user: None,
        });
        match differ_bit < MAXBITS && bit_test(&octets, differ_bit) {
            true => {
                self.node_mut(glue).right = Some(new_node);
                self.node_mut(glue).left = Some(node_it);
            }
            false => {
                self.node_mut(glue).right = Some(node_it);
                self.node_mut(glue).left = Some(new_node);
            }
        }
        self.node_mut(new_node).parent = Some(glue);
        let old_parent = self.node(glue).parent;
        self.rewire_parent(afi, old_parent, node_it, glue);
        self.node_mut(node_it).parent = Some(glue);

        new_node
    }

    /// Point `parent`'s child slot (or the family head) at `new_child`
    /// instead of `old_child`.
    fn rewire_parent(
        &mut self,
        afi: Afi,
        parent: Option<NodeHandle>,
        old_child: NodeHandle,
        new_child: NodeHandle,
    ) {
        match parent {
            None => self.set_head(afi, Some(new_child)),
            Some(parent) => {
                let p = self.node_mut(parent);
                if p.right == Some(old_child) {
                    p.right = Some(new_child);
                } else {
                    p.left = Some(new_child);
                }
            }
        }
    }

    /// Find the value node holding exactly `prefix`.
    pub fn search_exact(&self, prefix: &Prefix) -> Option<NodeHandle> {
        let prefix = prefix.masked();
        let octets = prefix.octets();
        let bitlen = prefix.mask_len();

        let mut node_it = self.head(prefix.afi())?;
        while self.node(node_it).bit < bitlen {
            let right = bit_test(&octets, self.node(node_it).bit);
            node_it = self.node(node_it).child(right)?;
        }

        let node = self.node(node_it);
        if node.bit > bitlen || node.is_glue() {
            return None;
        }

        // compare the address bits up to the mask length
        let full_bytes = (bitlen / 8) as usize;
        if node.octets[..full_bytes] != octets[..full_bytes] {
            return None;
        }
        if bitlen % 8 != 0 {
            let mask = 0xFFu8 << (8 - bitlen % 8);
            if (node.octets[full_bytes] ^ octets[full_bytes]) & mask != 0 {
                return None;
            }
        }
        Some(node_it)
    }

    /// Remove a value node, collapsing any glue node left with a single
    /// child. The node's user payload is dropped.
    pub fn remove(&mut self, handle: NodeHandle) {
        let afi = match self.node(handle).prefix {
            // glue nodes cannot be removed explicitly
            None => return,
            Some(prefix) => prefix.afi(),
        };

        self.node_mut(handle).user = None;
        self.bump_count(afi, -1);

        let (left, right) = {
            let node = self.node(handle);
            (node.left, node.right)
        };

        // both children: the node degrades to a glue node
        if left.is_some() && right.is_some() {
            self.node_mut(handle).prefix = None;
            return;
        }

        // no children: detach, then collapse a glue parent if one remains
        if left.is_none() && right.is_none() {
            let parent = self.node(handle).parent;
            self.release(handle);

            let parent = match parent {
                None => {
                    self.set_head(afi, None);
                    return;
                }
                Some(parent) => parent,
            };

            let sibling = {
                let p = self.node_mut(parent);
                if p.right == Some(handle) {
                    p.right = None;
                    p.left
                } else {
                    p.left = None;
                    p.right
                }
            };

            if !self.node(parent).is_glue() {
                return;
            }

            // a glue node never keeps a single child
            let grandparent = self.node(parent).parent;
            let sibling = sibling.expect("glue node with a single child");
            self.rewire_parent(afi, grandparent, parent, sibling);
            self.node_mut(sibling).parent = grandparent;
            self.release(parent);
            return;
        }

        // one child: splice the node out
        let child = left.or(right).expect("checked above");
        let parent = self.node(handle).parent;
        self.node_mut(child).parent = parent;
        self.release(handle);
        self.rewire_parent(afi, parent, handle, child);
    }

    /// Remove by prefix, when present.
    pub fn remove_prefix(&mut self, prefix: &Prefix) {
        if let Some(handle) = self.search_exact(prefix) {
            self.remove(handle);
        }
    }

    /// How an existing node overlaps the rest of the tree. The exact bit is
    /// always set.
    pub fn node_overlap_info(&self, handle: NodeHandle) -> OverlapInfo {
        let mut mask = OverlapInfo::EXACT;

        let mut ancestor = self.node(handle).parent;
        while let Some(up) = ancestor {
            if !self.node(up).is_glue() {
                mask |= OverlapInfo::LESS_SPECIFIC;
                break;
            }
            ancestor = self.node(up).parent;
        }

        let node = self.node(handle);
        if self.subtree_has_value(node.left) || self.subtree_has_value(node.right) {
            mask |= OverlapInfo::MORE_SPECIFIC;
        }
        mask
    }

    /// Overlap info for a prefix that may or may not be in the tree. An
    /// absent prefix is probed with a transient insert that is removed again
    /// before returning.
    pub fn prefix_overlap_info(&mut self, prefix: &Prefix) -> OverlapInfo {
        if let Some(handle) = self.search_exact(prefix) {
            return self.node_overlap_info(handle) | OverlapInfo::EXACT;
        }
        let probe = self.insert(*prefix);
        let mask = self.node_overlap_info(probe);
        self.remove(probe);
        mask - OverlapInfo::EXACT
    }

    fn subtree_has_value(&self, handle: Option<NodeHandle>) -> bool {
        let handle = match handle {
            Some(h) => h,
            None => return false,
        };
        let node = self.node(handle);
        if !node.is_glue() {
            return true;
        }
        self.subtree_has_value(node.left) || self.subtree_has_value(node.right)
    }

    /// Collect all value nodes strictly under `handle` (the node itself is
    /// not returned), pre-order.
    pub fn more_specifics(&self, handle: NodeHandle, results: &mut ResultSet) {
        results.clear();
        let node = self.node(handle);
        self.collect_more_specifics(node.left, u8::MAX, results);
        self.collect_more_specifics(node.right, u8::MAX, results);
    }

    /// Collect all value ancestors of `handle`, nearest first.
    pub fn less_specifics(&self, handle: NodeHandle, results: &mut ResultSet) {
        results.clear();
        self.collect_less_specifics(self.node(handle).parent, u8::MAX, results);
    }

    /// The nearest value ancestor of `handle`, i.e. its minimal covering
    /// prefix.
    pub fn min_covering_prefix(&self, handle: NodeHandle, results: &mut ResultSet) {
        results.clear();
        self.collect_less_specifics(self.node(handle).parent, 1, results);
    }

    /// The shallowest value node on every path from the root: the minimal
    /// set of prefixes covering everything in the family's tree.
    pub fn minimum_coverage(&self, afi: Afi, results: &mut ResultSet) {
        results.clear();
        self.collect_more_specifics(self.head(afi), 1, results);
    }

    fn collect_more_specifics(
        &self,
        handle: Option<NodeHandle>,
        depth: u8,
        results: &mut ResultSet,
    ) {
        let handle = match handle {
            Some(h) => h,
            None => return,
        };
        if depth == 0 {
            return;
        }
        let node = self.node(handle);
        let mut d = depth;
        if !node.is_glue() {
            results.push(handle);
            d -= 1;
        }
        self.collect_more_specifics(node.left, d, results);
        self.collect_more_specifics(node.right, d, results);
    }

    fn collect_less_specifics(
        &self,
        mut handle: Option<NodeHandle>,
        depth: u8,
        results: &mut ResultSet,
    ) {
        let mut d = depth;
        while let Some(h) = handle {
            if d == 0 {
                break;
            }
            let node = self.node(h);
            if !node.is_glue() {
                results.push(h);
                d -= 1;
            }
            handle = node.parent;
        }
    }

    /// Count how many distinct /`subnet_size` blocks the family's tree
    /// covers.
    pub fn count_subnets(&self, afi: Afi, subnet_size: u8) -> u64 {
        self.count_subnets_rec(self.head(afi), subnet_size)
    }

    /// Covered /24 blocks in the IPv4 tree.
    pub fn count_24_subnets(&self) -> u64 {
        self.count_subnets(Afi::Ipv4, 24)
    }

    /// Covered /64 blocks in the IPv6 tree.
    pub fn count_64_subnets(&self) -> u64 {
        self.count_subnets(Afi::Ipv6, 64)
    }

    fn count_subnets_rec(&self, handle: Option<NodeHandle>, subnet_size: u8) -> u64 {
        let handle = match handle {
            Some(h) => h,
            None => return 0,
        };
        let node = self.node(handle);

        if node.is_glue() {
            // a glue at or below the target size covers one (possibly
            // incomplete) block; shallower glue splits into both subtrees
            return match node.bit >= subnet_size {
                true => 1,
                false => {
                    self.count_subnets_rec(node.left, subnet_size)
                        + self.count_subnets_rec(node.right, subnet_size)
                }
            };
        }

        // everything below a value node is covered by it
        let mask_len = node.prefix.as_ref().map(|p| p.mask_len()).unwrap_or(0);
        match mask_len >= subnet_size {
            true => 1,
            false => {
                let diff = subnet_size - mask_len;
                match diff >= 64 {
                    true => u64::MAX,
                    false => 1u64 << diff,
                }
            }
        }
    }

    /// In-order walk over all value nodes of both families.
    pub fn walk<F: FnMut(&Prefix, Option<&T>)>(&self, mut f: F) {
        self.walk_rec(self.head4, &mut f);
        self.walk_rec(self.head6, &mut f);
    }

    fn walk_rec<F: FnMut(&Prefix, Option<&T>)>(&self, handle: Option<NodeHandle>, f: &mut F) {
        let handle = match handle {
            Some(h) => h,
            None => return,
        };
        let node = self.node(handle);
        self.walk_rec(node.left, f);
        if let Some(prefix) = &node.prefix {
            f(prefix, node.user.as_ref());
        }
        self.walk_rec(node.right, f);
    }

    /// Insert every value node of `src` into this tree. User payloads are
    /// not copied.
    pub fn merge<U>(&mut self, src: &PatriciaTree<U>) {
        src.walk(|prefix, _| {
            self.insert(*prefix);
        });
    }

    /// Drop every node (and user payload) of both families.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head4 = None;
        self.head6 = None;
        self.ipv4_active_nodes = 0;
        self.ipv6_active_nodes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn pfx(s: &str) -> Prefix {
        Prefix::from_str(s).unwrap()
    }

    fn tree_with(prefixes: &[&str]) -> PatriciaTree<()> {
        let mut tree = PatriciaTree::new();
        for p in prefixes {
            tree.insert(pfx(p));
        }
        tree
    }

    #[test]
    fn test_insert_and_search_exact() {
        let mut tree = tree_with(&["10.0.0.0/8", "10.1.0.0/16", "10.1.1.0/24", "11.0.0.0/8"]);
        assert_eq!(tree.prefix_count(Afi::Ipv4), 4);

        for p in ["10.0.0.0/8", "10.1.0.0/16", "10.1.1.0/24", "11.0.0.0/8"] {
            let node = tree.search_exact(&pfx(p)).unwrap();
            assert_eq!(tree.prefix(node).unwrap().to_string(), p);
        }
        assert!(tree.search_exact(&pfx("10.1.0.0/24")).is_none());
        assert!(tree.search_exact(&pfx("10.0.0.0/9")).is_none());

        // re-inserting an existing prefix returns the same node
        let a = tree.insert(pfx("10.1.0.0/16"));
        let b = tree.search_exact(&pfx("10.1.0.0/16")).unwrap();
        assert_eq!(a, b);
        assert_eq!(tree.prefix_count(Afi::Ipv4), 4);
    }

    #[test]
    fn test_ipv6_tree_independent() {
        let mut tree = tree_with(&["10.0.0.0/8"]);
        tree.insert(pfx("2001:db8::/32"));
        tree.insert(pfx("2001:db8:1::/48"));

        assert_eq!(tree.prefix_count(Afi::Ipv4), 1);
        assert_eq!(tree.prefix_count(Afi::Ipv6), 2);
        assert!(tree.search_exact(&pfx("2001:db8::/32")).is_some());
    }

    #[test]
    fn test_more_specifics() {
        let tree = tree_with(&["10.0.0.0/8", "10.1.0.0/16", "10.1.1.0/24", "11.0.0.0/8"]);
        let node = tree.search_exact(&pfx("10.0.0.0/8")).unwrap();

        let mut results = ResultSet::new();
        tree.more_specifics(node, &mut results);

        let mut found: Vec<String> = results
            .handles()
            .iter()
            .map(|h| tree.prefix(*h).unwrap().to_string())
            .collect();
        found.sort();
        assert_eq!(found, vec!["10.1.0.0/16", "10.1.1.0/24"]);
    }

    #[test]
    fn test_less_specifics() {
        let tree = tree_with(&["10.0.0.0/8", "10.1.0.0/16", "10.1.1.0/24", "11.0.0.0/8"]);
        let node = tree.search_exact(&pfx("10.1.1.0/24")).unwrap();

        let mut results = ResultSet::new();
        tree.less_specifics(node, &mut results);

        let found: Vec<String> = results
            .handles()
            .iter()
            .map(|h| tree.prefix(*h).unwrap().to_string())
            .collect();
        // nearest ancestor first
        assert_eq!(found, vec!["10.1.0.0/16", "10.0.0.0/8"]);
    }

    #[test]
    fn test_overlap_info() {
        let mut tree = tree_with(&["10.0.0.0/8", "10.1.0.0/16", "10.1.1.0/24", "11.0.0.0/8"]);

        let node = tree.search_exact(&pfx("10.1.1.0/24")).unwrap();
        assert_eq!(
            tree.node_overlap_info(node),
            OverlapInfo::EXACT | OverlapInfo::LESS_SPECIFIC
        );

        let node = tree.search_exact(&pfx("10.1.0.0/16")).unwrap();
        assert_eq!(
            tree.node_overlap_info(node),
            OverlapInfo::EXACT | OverlapInfo::LESS_SPECIFIC | OverlapInfo::MORE_SPECIFIC
        );

        // absent prefix: probed without leaving a trace
        let count_before = tree.prefix_count(Afi::Ipv4);
        let info = tree.prefix_overlap_info(&pfx("10.1.0.0/20"));
        assert_eq!(info, OverlapInfo::LESS_SPECIFIC | OverlapInfo::MORE_SPECIFIC);
        assert_eq!(tree.prefix_count(Afi::Ipv4), count_before);
        assert!(tree.search_exact(&pfx("10.1.0.0/20")).is_none());
    }

    #[test]
    fn test_remove_restores_structure() {
        let mut tree = tree_with(&["10.0.0.0/8", "10.1.0.0/16", "10.1.1.0/24", "11.0.0.0/8"]);
        let count = tree.prefix_count(Afi::Ipv4);

        let probe = tree.insert(pfx("10.2.0.0/16"));
        assert_eq!(tree.prefix_count(Afi::Ipv4), count + 1);
        tree.remove(probe);
        assert_eq!(tree.prefix_count(Afi::Ipv4), count);

        // all original prefixes still reachable
        for p in ["10.0.0.0/8", "10.1.0.0/16", "10.1.1.0/24", "11.0.0.0/8"] {
            assert!(tree.search_exact(&pfx(p)).is_some(), "{p} lost");
        }
    }

    #[test]
    fn test_remove_with_two_children_leaves_glue() {
        let mut tree = tree_with(&["10.0.0.0/8", "10.0.0.0/9", "10.128.0.0/9"]);
        let node = tree.search_exact(&pfx("10.0.0.0/8")).unwrap();
        tree.remove(node);

        assert_eq!(tree.prefix_count(Afi::Ipv4), 2);
        assert!(tree.search_exact(&pfx("10.0.0.0/8")).is_none());
        assert!(tree.search_exact(&pfx("10.0.0.0/9")).is_some());
        assert!(tree.search_exact(&pfx("10.128.0.0/9")).is_some());

        // the glue upgrades back into a value node on re-insert
        tree.insert(pfx("10.0.0.0/8"));
        assert_eq!(tree.prefix_count(Afi::Ipv4), 3);
        assert!(tree.search_exact(&pfx("10.0.0.0/8")).is_some());
    }

    #[test]
    fn test_user_payload_dropped_on_remove() {
        use std::rc::Rc;

        let mut tree: PatriciaTree<Rc<()>> = PatriciaTree::new();
        let payload = Rc::new(());

        let node = tree.insert(pfx("192.0.2.0/24"));
        tree.set_user(node, Rc::clone(&payload));
        assert_eq!(Rc::strong_count(&payload), 2);

        tree.remove(node);
        assert_eq!(Rc::strong_count(&payload), 1);
    }

    #[test]
    fn test_count_subnets() {
        let tree = tree_with(&["10.0.0.0/23", "192.0.2.0/24", "198.51.100.0/25"]);
        // /23 covers 2 blocks, /24 covers 1, /25 still counts as 1
        assert_eq!(tree.count_24_subnets(), 4);

        let mut tree: PatriciaTree<()> = PatriciaTree::new();
        tree.insert(pfx("2001:db8::/63"));
        assert_eq!(tree.count_64_subnets(), 2);
    }

    #[test]
    fn test_minimum_coverage() {
        let tree = tree_with(&["10.0.0.0/8", "10.1.0.0/16", "10.1.1.0/24", "11.0.0.0/8"]);
        let mut results = ResultSet::new();
        tree.minimum_coverage(Afi::Ipv4, &mut results);

        let mut found: Vec<String> = results
            .handles()
            .iter()
            .map(|h| tree.prefix(*h).unwrap().to_string())
            .collect();
        found.sort();
        assert_eq!(found, vec!["10.0.0.0/8", "11.0.0.0/8"]);
    }

    #[test]
    fn test_walk_and_merge() {
        let src = tree_with(&["10.0.0.0/8", "192.0.2.0/24"]);
        let mut dst = tree_with(&["11.0.0.0/8"]);
        dst.merge(&src);
        assert_eq!(dst.prefix_count(Afi::Ipv4), 3);

        let mut walked = vec![];
        dst.walk(|prefix, _| walked.push(prefix.to_string()));
        assert_eq!(walked.len(), 3);
    }

    #[test]
    fn test_result_set_reuse() {
        let tree = tree_with(&["10.0.0.0/8", "10.1.0.0/16"]);
        let node = tree.search_exact(&pfx("10.0.0.0/8")).unwrap();

        let mut results = ResultSet::new();
        tree.more_specifics(node, &mut results);
        assert_eq!(results.len(), 1);
        assert!(results.next().is_some());
        assert!(results.next().is_none());
        results.rewind();
        assert!(results.next().is_some());

        // reused set is cleared by the next query
        let node = tree.search_exact(&pfx("10.1.0.0/16")).unwrap();
        tree.more_specifics(node, &mut results);
        assert_eq!(results.len(), 0);
    }
}
