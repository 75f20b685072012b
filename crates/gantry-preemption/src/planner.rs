//! Distance heuristic and the top-level preemption planner.
//!
//! The planner answers one question per call: which lower-priority
//! allocations on this node should be evicted so the pending request
//! fits? It composes the network satisfier with a distance-driven greedy
//! loop over the priority groups, then prunes redundant choices.

use std::cmp::Ordering;

use tracing::debug;

use crate::error::{PreemptionError, Result};
use crate::grouping::GroupedAllocations;
use crate::network::select_network_victims;
use crate::types::{Allocation, Node, PlannerConfig, Resources};

/// Measures how close `resources` is to the shape of `ask`.
///
/// Each of the four axes (memory, CPU, IOPS, disk) contributes the
/// normalized coordinate `(ask - have) / ask` (zero when the ask on that
/// axis is zero); the distance is the Euclidean norm over them. Lower is
/// closer. The sign is preserved before squaring, so a candidate that
/// exceeds the ask on an axis is as far from it as one that falls short
/// by the same fraction, biasing selection toward tight fits.
///
/// Bandwidth is not an axis: the network dimension is handled entirely
/// by the per-device satisfier.
#[must_use]
pub fn resource_distance(resources: &Resources, ask: &Resources) -> f64 {
    let coord = |have: u32, want: u32| -> f64 {
        if want == 0 {
            0.0
        } else {
            (f64::from(want) - f64::from(have)) / f64::from(want)
        }
    };

    let memory_coord = coord(resources.memory_mb, ask.memory_mb);
    let cpu_coord = coord(resources.cpu, ask.cpu);
    let iops_coord = coord(resources.iops, ask.iops);
    let disk_coord = coord(resources.disk_mb, ask.disk_mb);

    (memory_coord.powi(2) + cpu_coord.powi(2) + iops_coord.powi(2) + disk_coord.powi(2)).sqrt()
}

/// Selects allocations to preempt so a pending resource request fits on a
/// node.
///
/// Stateless across calls; one call is one decision. A scheduler may run
/// many planners (or one planner over many nodes) concurrently, since each
/// call works exclusively on its own inputs.
#[derive(Debug, Clone, Default)]
pub struct PreemptionPlanner {
    config: PlannerConfig,
}

impl PreemptionPlanner {
    /// Creates a planner with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the configured priority gap is zero; a zero gap
    /// would let a job preempt its own priority tier.
    pub fn new(config: PlannerConfig) -> Result<Self> {
        if config.priority_gap == 0 {
            return Err(PreemptionError::InvalidConfig {
                reason: "priority gap must be at least 1".into(),
            });
        }
        Ok(Self { config })
    }

    /// Creates a planner with the default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Returns the planner configuration.
    #[must_use]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Computes the allocations to evict from `node` so `resource_ask`
    /// fits, or `None` when no eligible subset suffices.
    ///
    /// The candidate vector is consumed and reordered internally; callers
    /// that still need it should pass a clone. A `Some` result is never
    /// empty, its combined resources meet the ask, and every victim with a
    /// named network reservation sits on the single device the network
    /// satisfier committed to.
    #[must_use]
    pub fn plan(
        &self,
        job_priority: u32,
        current: Vec<Allocation>,
        resource_ask: &Resources,
        node: &Node,
    ) -> Option<Vec<Allocation>> {
        let mut groups =
            GroupedAllocations::build(job_priority, self.config.priority_gap, current);

        let mbits_needed = resource_ask.requested_mbits();
        let net_chosen = if mbits_needed == 0 {
            Vec::new()
        } else {
            match select_network_victims(&groups, mbits_needed, node) {
                Some(victims) => victims,
                None => {
                    debug!(node = %node.id, mbits_needed, "infeasible: network ask unsatisfiable");
                    return None;
                }
            }
        };
        groups.remove_chosen(&net_chosen);
        // Once the satisfier commits to a device, candidates reserving a
        // different device are off the table: the loop below selects by
        // distance alone and would otherwise mix devices into the plan
        if let Some(reservation) = net_chosen
            .first()
            .and_then(|alloc| alloc.resources.networks.first())
        {
            debug!(
                device = %reservation.device,
                "confining remaining candidates to committed device"
            );
            groups.confine_to_device(&reservation.device);
        }

        let mut chosen: Vec<Allocation> = Vec::new();
        let mut accumulated: Option<Resources> = None;
        let mut met = false;
        for alloc in net_chosen {
            accumulate(&mut accumulated, &alloc.resources);
            chosen.push(alloc);
            met = ask_met(accumulated.as_ref(), resource_ask);
        }

        if !met {
            met = run_distance_loop(&mut groups, resource_ask, &mut chosen, &mut accumulated);
        }

        if !met {
            debug!(node = %node.id, "infeasible: eligible allocations cannot cover the ask");
            return None;
        }

        let filtered = minimality_pass(chosen, resource_ask);
        debug!(node = %node.id, victims = filtered.len(), "preemption plan complete");
        Some(filtered)
    }

}

/// Walks the groups lowest priority first, repeatedly extracting the
/// allocation closest to the ask until the accumulated resources meet it.
/// Returns whether the ask was met.
fn run_distance_loop(
    groups: &mut GroupedAllocations,
    resource_ask: &Resources,
    chosen: &mut Vec<Allocation>,
    accumulated: &mut Option<Resources>,
) -> bool {
    for group in groups.groups_mut() {
        while !group.allocs.is_empty() {
            let mut closest = 0;
            let mut best_distance = f64::MAX;
            for (index, alloc) in group.allocs.iter().enumerate() {
                let distance = resource_distance(&alloc.resources, resource_ask);
                // Strict comparison keeps the first occurrence on ties
                if distance < best_distance {
                    best_distance = distance;
                    closest = index;
                }
            }

            // Order inside the group no longer matters once we start
            // extracting from it
            let alloc = group.allocs.swap_remove(closest);
            debug!(
                alloc = %alloc.id,
                priority = group.priority,
                distance = best_distance,
                "selected closest preemption candidate"
            );
            accumulate(accumulated, &alloc.resources);
            chosen.push(alloc);
            if ask_met(accumulated.as_ref(), resource_ask) {
                return true;
            }
        }
    }
    false
}

/// Folds `resources` into the accumulator, initializing it with an
/// independent copy on first use.
fn accumulate(accumulated: &mut Option<Resources>, resources: &Resources) {
    match accumulated.as_mut() {
        Some(acc) => acc.add(resources),
        None => *accumulated = Some(resources.clone()),
    }
}

fn ask_met(accumulated: Option<&Resources>, resource_ask: &Resources) -> bool {
    accumulated.is_some_and(|acc| acc.meets(resource_ask))
}

/// Prunes evictions made redundant by later choices.
///
/// The greedy loop can over-evict by committing to a near-match before
/// seeing a later superset. Re-scanning with the largest-covering (most
/// distant) allocations first lets one big eviction subsume several small
/// ones; the walk stops the moment the ask is covered. Still a heuristic,
/// not provably optimal.
fn minimality_pass(mut chosen: Vec<Allocation>, resource_ask: &Resources) -> Vec<Allocation> {
    chosen.sort_by(|a, b| {
        let distance_a = resource_distance(&a.resources, resource_ask);
        let distance_b = resource_distance(&b.resources, resource_ask);
        distance_b
            .partial_cmp(&distance_a)
            .unwrap_or(Ordering::Equal)
    });

    let mut accumulated: Option<Resources> = None;
    let mut filtered: Vec<Allocation> = Vec::new();
    for alloc in chosen {
        accumulate(&mut accumulated, &alloc.resources);
        filtered.push(alloc);
        if ask_met(accumulated.as_ref(), resource_ask) {
            break;
        }
    }
    filtered
}
