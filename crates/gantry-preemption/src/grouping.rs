//! Priority grouping and eligibility filtering for preemption candidates.
//!
//! Candidates are partitioned by job priority so the planner can exhaust
//! low-priority victims before touching higher-priority ones. The gap rule
//! keeps workloads of comparable importance from preempting each other.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::types::Allocation;

/// A bag of allocations sharing one job priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityGroup {
    /// Job priority shared by every allocation in the group.
    pub priority: u32,
    /// Allocations at this priority, in insertion order until the planner
    /// starts extracting from the group.
    pub allocs: Vec<Allocation>,
}

/// Preemption candidates grouped by job priority, ascending.
///
/// Lowest priority first, so the cheapest victims are considered first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedAllocations {
    groups: Vec<PriorityGroup>,
}

impl GroupedAllocations {
    /// Groups `current` by job priority, keeping only allocations eligible
    /// for preemption by a job at `job_priority`.
    ///
    /// An allocation is eligible iff
    /// `job_priority - alloc.job.priority >= priority_gap`; allocations
    /// with no job descriptor are silently skipped.
    #[must_use]
    pub fn build(job_priority: u32, priority_gap: u32, current: Vec<Allocation>) -> Self {
        let mut by_priority: BTreeMap<u32, Vec<Allocation>> = BTreeMap::new();
        for alloc in current {
            let Some(priority) = alloc.job_priority() else {
                continue;
            };
            if job_priority.saturating_sub(priority) < priority_gap {
                continue;
            }
            by_priority.entry(priority).or_default().push(alloc);
        }

        let groups: Vec<PriorityGroup> = by_priority
            .into_iter()
            .map(|(priority, allocs)| PriorityGroup { priority, allocs })
            .collect();
        debug!(
            job_priority,
            groups = groups.len(),
            candidates = groups.iter().map(|g| g.allocs.len()).sum::<usize>(),
            "grouped preemption candidates"
        );
        Self { groups }
    }

    /// Removes every allocation whose ID appears in `chosen`, dropping
    /// groups that become empty. Order of the remaining groups and
    /// allocations is preserved.
    pub fn remove_chosen(&mut self, chosen: &[Allocation]) {
        if chosen.is_empty() {
            return;
        }
        let ids: HashSet<&str> = chosen.iter().map(|a| a.id.as_str()).collect();
        for group in &mut self.groups {
            group.allocs.retain(|a| !ids.contains(a.id.as_str()));
        }
        self.groups.retain(|g| !g.allocs.is_empty());
    }

    /// Removes every allocation whose first network reservation names a
    /// device other than `device`, dropping groups that become empty.
    ///
    /// Allocations with no network reservation (or one with an empty
    /// device name) are kept: evicting them cannot free bandwidth on the
    /// wrong device. Used once the network satisfier has committed to a
    /// device, so a plan never mixes devices.
    pub fn confine_to_device(&mut self, device: &str) {
        for group in &mut self.groups {
            group.allocs.retain(|a| {
                a.resources
                    .networks
                    .first()
                    .is_none_or(|n| n.device.is_empty() || n.device == device)
            });
        }
        self.groups.retain(|g| !g.allocs.is_empty());
    }

    /// Returns the groups, priority ascending.
    #[must_use]
    pub fn groups(&self) -> &[PriorityGroup] {
        &self.groups
    }

    /// Mutable access to the groups, priority ascending.
    pub fn groups_mut(&mut self) -> &mut [PriorityGroup] {
        &mut self.groups
    }

    /// Iterates all allocations, lowest priority group first.
    pub fn allocs(&self) -> impl Iterator<Item = &Allocation> {
        self.groups.iter().flat_map(|g| g.allocs.iter())
    }

    /// Returns true if no eligible allocations remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of allocations across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.allocs.len()).sum()
    }
}
