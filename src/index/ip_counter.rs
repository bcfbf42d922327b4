//! Unique address coverage counter.
//!
//! Keeps one sorted list of disjoint inclusive address intervals per family
//! and merges every added prefix into it. IPv4 coverage is counted in single
//! addresses, IPv6 coverage in /64 blocks.
use crate::models::{Afi, Prefix};
use ipnet::IpNet;

/// An inclusive interval of address space. IPv4 endpoints fit the lower 32
/// bits; IPv6 uses the full width and all counting happens on the upper 64
/// bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interval {
    start: u128,
    end: u128,
}

impl Interval {
    fn from_prefix(prefix: &Prefix) -> Interval {
        match prefix.prefix {
            IpNet::V4(p) => {
                let mask = u32::from(p.netmask());
                let start = u32::from(p.addr()) & mask;
                Interval {
                    start: start as u128,
                    end: (start | !mask) as u128,
                }
            }
            IpNet::V6(p) => {
                let mask = u128::from(p.netmask());
                let start = u128::from(p.addr()) & mask;
                Interval {
                    start,
                    end: start | !mask,
                }
            }
        }
    }

    /// Interval width in counting units: addresses for v4, /64 blocks for v6.
    fn units(&self, afi: Afi) -> u64 {
        match afi {
            Afi::Ipv4 => (self.end - self.start + 1) as u64,
            Afi::Ipv6 => {
                let blocks = (self.end >> 64) - (self.start >> 64);
                match blocks >= u64::MAX as u128 {
                    true => u64::MAX,
                    false => blocks as u64 + 1,
                }
            }
        }
    }
}

/// Counts the number of unique addresses covered by a growing set of
/// prefixes.
#[derive(Debug, Default)]
pub struct IpCounter {
    v4_intervals: Vec<Interval>,
    v6_intervals: Vec<Interval>,
}

impl IpCounter {
    pub fn new() -> IpCounter {
        IpCounter::default()
    }

    /// Merge the address range of `prefix` into the counter.
    pub fn add(&mut self, prefix: &Prefix) {
        let new = Interval::from_prefix(prefix);
        let list = match prefix.afi() {
            Afi::Ipv4 => &mut self.v4_intervals,
            Afi::Ipv6 => &mut self.v6_intervals,
        };

        // first interval whose end reaches the new start
        let pos = list.partition_point(|iv| iv.end < new.start);
        if pos == list.len() || list[pos].start > new.end {
            // disjoint from everything: plain insert keeps the list sorted
            list.insert(pos, new);
            return;
        }

        // overlap: widen the interval at `pos`, then absorb any successors
        // the widened interval now reaches
        list[pos].start = list[pos].start.min(new.start);
        list[pos].end = list[pos].end.max(new.end);

        let mut last = pos + 1;
        while last < list.len() && list[last].start <= list[pos].end {
            list[pos].end = list[pos].end.max(list[last].end);
            last += 1;
        }
        list.drain(pos + 1..last);
    }

    /// How much of `prefix` is covered by the counter, in counting units
    /// (addresses for v4, /64 blocks for v6), and whether the prefix is
    /// fully contained.
    pub fn overlap(&self, prefix: &Prefix) -> (u64, bool) {
        let afi = prefix.afi();
        let query = Interval::from_prefix(prefix);
        let prefix_size = query.units(afi);
        let list = match afi {
            Afi::Ipv4 => &self.v4_intervals,
            Afi::Ipv6 => &self.v6_intervals,
        };

        let mut covered = 0u64;
        let mut full = false;
        for iv in list {
            if iv.start > query.end {
                break;
            }
            if iv.end < query.start {
                continue;
            }
            let int = Interval {
                start: iv.start.max(query.start),
                end: iv.end.min(query.end),
            };
            let units = int.units(afi);
            if units == prefix_size {
                full = true;
            }
            covered += units;
        }
        (covered, full)
    }

    /// Total covered units per family.
    pub fn total(&self, afi: Afi) -> u64 {
        let list = match afi {
            Afi::Ipv4 => &self.v4_intervals,
            Afi::Ipv6 => &self.v6_intervals,
        };
        list.iter().map(|iv| iv.units(afi)).sum()
    }

    pub fn clear(&mut self) {
        self.v4_intervals.clear();
        self.v6_intervals.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn pfx(s: &str) -> Prefix {
        Prefix::from_str(s).unwrap()
    }

    #[test]
    fn test_disjoint_prefixes() {
        let mut counter = IpCounter::new();
        counter.add(&pfx("10.0.0.0/24"));
        counter.add(&pfx("192.0.2.0/24"));
        assert_eq!(counter.total(Afi::Ipv4), 512);
    }

    #[test]
    fn test_overlapping_prefixes_count_once() {
        let mut counter = IpCounter::new();
        counter.add(&pfx("10.0.0.0/24"));
        counter.add(&pfx("10.0.0.0/25"));
        assert_eq!(counter.total(Afi::Ipv4), 256);

        counter.add(&pfx("10.0.0.0/8"));
        assert_eq!(counter.total(Afi::Ipv4), 1 << 24);
    }

    #[test]
    fn test_adjacent_merge() {
        let mut counter = IpCounter::new();
        counter.add(&pfx("10.0.0.0/25"));
        counter.add(&pfx("10.0.0.128/25"));
        assert_eq!(counter.total(Afi::Ipv4), 256);
    }

    #[test]
    fn test_monotonic_growth() {
        let mut counter = IpCounter::new();
        let mut last = 0;
        for p in [
            "203.0.113.0/26",
            "203.0.113.64/26",
            "10.0.0.0/16",
            "10.0.128.0/17",
            "203.0.113.0/24",
        ] {
            counter.add(&pfx(p));
            let total = counter.total(Afi::Ipv4);
            assert!(total >= last);
            last = total;
        }
        assert_eq!(last, (1 << 16) + 256);
    }

    #[test]
    fn test_overlap_query() {
        let mut counter = IpCounter::new();
        counter.add(&pfx("10.0.0.0/25"));

        let (covered, full) = counter.overlap(&pfx("10.0.0.0/24"));
        assert_eq!(covered, 128);
        assert!(!full);

        let (covered, full) = counter.overlap(&pfx("10.0.0.0/26"));
        assert_eq!(covered, 64);
        assert!(full);

        let (covered, full) = counter.overlap(&pfx("192.0.2.0/24"));
        assert_eq!(covered, 0);
        assert!(!full);
    }

    #[test]
    fn test_v6_counts_in_64_blocks() {
        let mut counter = IpCounter::new();
        counter.add(&pfx("2001:db8::/32"));
        assert_eq!(counter.total(Afi::Ipv6), 1 << 32);

        // more-specific within an existing /64 adds nothing
        counter.add(&pfx("2001:db8::/96"));
        assert_eq!(counter.total(Afi::Ipv6), 1 << 32);

        counter.add(&pfx("2001:db9::/64"));
        assert_eq!(counter.total(Afi::Ipv6), (1u64 << 32) + 1);
    }

    #[test]
    fn test_clear() {
        let mut counter = IpCounter::new();
        counter.add(&pfx("10.0.0.0/8"));
        counter.clear();
        assert_eq!(counter.total(Afi::Ipv4), 0);
    }
}
