//! Per-device bandwidth reasoning for preemption planning.
//!
//! Network bandwidth does not combine additively across devices: freeing
//! 300 MBits on `eth0` and 300 MBits on `eth1` cannot serve a 500 MBit ask.
//! The satisfier therefore confines its search to a single device at a
//! time, and only considers devices whose declared capacity could serve
//! the ask at all.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::grouping::GroupedAllocations;
use crate::types::{Allocation, Node};

/// A short-lived view over a node's network devices: device name mapped to
/// bandwidth capacity in MBits.
///
/// Built once per planning call and dropped when the call returns; going
/// out of scope is the release, on every exit path. The capacity recorded
/// here is the device's declared total, not a live residual: the question
/// the planner asks is whether the device *could* serve the request once
/// some of its allocations are evicted.
#[derive(Debug, Clone)]
pub struct NetworkIndex {
    bandwidth: HashMap<String, u32>,
}

impl NetworkIndex {
    /// Builds the index from a node's device declarations.
    ///
    /// A node redeclaring a device name keeps the last declaration.
    #[must_use]
    pub fn new(node: &Node) -> Self {
        let bandwidth = node
            .devices
            .iter()
            .map(|d| (d.name.clone(), d.mbits))
            .collect();
        Self { bandwidth }
    }

    /// Capacity of the named device in MBits, or 0 for an unknown device.
    #[must_use]
    pub fn available_bandwidth(&self, device: &str) -> u32 {
        self.bandwidth.get(device).copied().unwrap_or(0)
    }

    /// Number of devices in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bandwidth.len()
    }

    /// Returns true if the node declared no devices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bandwidth.is_empty()
    }
}

/// Greedily selects allocations whose evictions free `mbits_needed` on a
/// single network device.
///
/// Candidates are bucketed by the device of their first network
/// reservation, preserving the groups' priority-ascending order so the
/// cheapest victims are taken first. Buckets are visited in sorted
/// device-name order, making the selection deterministic. Within a bucket
/// the walk stops the moment the summed bandwidth meets the ask; the
/// candidate list is reset between devices because evictions do not
/// transfer across them.
///
/// Returns `Some(victims)` when a device can be satisfied (empty when no
/// candidate has a network reservation, meaning there is nothing to free
/// on the network axis), and `None` when no single device can ever serve
/// the ask.
#[must_use]
pub fn select_network_victims(
    groups: &GroupedAllocations,
    mbits_needed: u32,
    node: &Node,
) -> Option<Vec<Allocation>> {
    if mbits_needed == 0 {
        return Some(Vec::new());
    }

    let mut buckets: BTreeMap<&str, Vec<&Allocation>> = BTreeMap::new();
    for alloc in groups.allocs() {
        let Some(reservation) = alloc.resources.networks.first() else {
            continue;
        };
        if reservation.device.is_empty() {
            continue;
        }
        buckets
            .entry(reservation.device.as_str())
            .or_default()
            .push(alloc);
    }

    if buckets.is_empty() {
        return Some(Vec::new());
    }

    let index = NetworkIndex::new(node);
    for (&device, allocs) in &buckets {
        let capacity = index.available_bandwidth(device);
        if capacity < mbits_needed {
            debug!(
                device,
                capacity, mbits_needed, "device capacity below ask, skipping"
            );
            continue;
        }

        let mut used: u32 = 0;
        let mut victims: Vec<Allocation> = Vec::new();
        for alloc in allocs {
            used = used.saturating_add(alloc.resources.requested_mbits());
            victims.push((*alloc).clone());
            if used >= mbits_needed {
                debug!(
                    device,
                    used,
                    mbits_needed,
                    victims = victims.len(),
                    "network ask satisfiable on device"
                );
                return Some(victims);
            }
        }
    }

    debug!(mbits_needed, "no single device can satisfy the network ask");
    None
}
