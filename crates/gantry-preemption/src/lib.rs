//! Preemption planning for the Gantry workload scheduler.
//!
//! `gantry-preemption` decides which lower-priority allocations to evict
//! from a node so a pending, higher-priority resource request fits. It is
//! invoked by the scheduler only after a candidate node has failed the
//! normal feasibility pass; the planner's answer is either a victim list
//! whose combined resources cover the request, or "this node cannot
//! accommodate the request".
//!
//! # Features
//!
//! - **Priority-gap eligibility**: a victim must sit at least a configured
//!   priority gap (default 10) below the incoming job
//! - **Distance heuristic**: candidates are ranked by a normalized
//!   four-axis distance to the request, biasing toward tight fits
//! - **Per-device bandwidth**: network asks are satisfied on a single
//!   device; bandwidth never aggregates across devices
//! - **Minimality pass**: evictions subsumed by a later, larger choice are
//!   pruned before the plan is returned
//!
//! # Example
//!
//! ```rust
//! use gantry_preemption::{
//!     Allocation, AllocationId, Job, Node, PreemptionPlanner, Resources,
//! };
//!
//! let node = Node::new("node-1").with_device("eth0", 1000);
//! let current = vec![
//!     Allocation::new(AllocationId::new("batch-1"))
//!         .with_job(Job::new("nightly-batch", 30))
//!         .with_resources(Resources::new().with_cpu(2048).with_memory_mb(1024)),
//! ];
//!
//! let ask = Resources::new().with_cpu(1024).with_memory_mb(512);
//! let planner = PreemptionPlanner::with_defaults();
//!
//! match planner.plan(100, current, &ask, &node) {
//!     Some(victims) => println!("evict {} allocations", victims.len()),
//!     None => println!("node cannot accommodate the request"),
//! }
//! ```
//!
//! # Planning pipeline
//!
//! ```text
//! current allocations
//!        │
//!        ▼
//! ┌─────────────────┐   priority gap, null-job skip
//! │ group & filter  │──────────────────────────────┐
//! └─────────────────┘                              │
//!        ▼                                         │
//! ┌─────────────────┐   single-device greedy walk  │
//! │ network         │   over a per-node bandwidth  │
//! │ satisfier       │   index                      │
//! └─────────────────┘                              │
//!        ▼                                         ▼
//! ┌─────────────────┐   smallest resource distance first,
//! │ distance loop   │   lowest priority group first
//! └─────────────────┘
//!        ▼
//! ┌─────────────────┐   distance descending, truncate
//! │ minimality pass │   once the ask is covered
//! └─────────────────┘
//! ```
//!
//! The planner holds no state across calls and performs no I/O; concurrent
//! calls over different nodes are independent.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod error;
pub mod grouping;
pub mod network;
pub mod planner;
pub mod types;


// Re-export main types
pub use error::{PreemptionError, Result};
pub use grouping::{GroupedAllocations, PriorityGroup};
pub use network::{select_network_victims, NetworkIndex};
pub use planner::{resource_distance, PreemptionPlanner};
pub use types::{
    Allocation, AllocationId, Job, NetworkDevice, NetworkReservation, Node, PlannerConfig,
    Resources, DEFAULT_PRIORITY_GAP,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{PreemptionError, Result};
    pub use crate::grouping::{GroupedAllocations, PriorityGroup};
    pub use crate::network::{select_network_victims, NetworkIndex};
    pub use crate::planner::{resource_distance, PreemptionPlanner};
    pub use crate::types::{
        Allocation, AllocationId, Job, NetworkDevice, NetworkReservation, Node, PlannerConfig,
        Resources,
    };
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn alloc(id: &str, priority: u32, resources: Resources) -> Allocation {
        Allocation::new(AllocationId::new(id))
            .with_job(Job::new(format!("job-{id}"), priority))
            .with_resources(resources)
    }

    #[test]
    fn single_low_priority_victim_sufficient() {
        let planner = PreemptionPlanner::with_defaults();
        let node = Node::new("node-1").with_device("eth0", 1000);
        let ask = Resources::new()
            .with_cpu(1024)
            .with_memory_mb(512)
            .with_disk_mb(2048)
            .with_iops(100)
            .with_network("eth0", 300);
        let current = vec![alloc(
            "victim",
            50,
            Resources::new()
                .with_cpu(2048)
                .with_memory_mb(1024)
                .with_disk_mb(4096)
                .with_iops(200)
                .with_network("eth0", 600),
        )];

        let plan = planner.plan(100, current, &ask, &node).unwrap_or_default();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].id.as_str(), "victim");
    }

    #[test]
    fn comparable_priority_workloads_are_protected() {
        let planner = PreemptionPlanner::with_defaults();
        let node = Node::new("node-1").with_device("eth0", 1000);
        let ask = Resources::new().with_cpu(512);
        // Resources would suffice many times over, but every candidate is
        // within 10 priority points of the incoming job
        let current = vec![
            alloc("a", 91, Resources::new().with_cpu(8192)),
            alloc("b", 94, Resources::new().with_cpu(8192)),
            alloc("c", 99, Resources::new().with_cpu(8192)),
        ];

        assert!(planner.plan(100, current, &ask, &node).is_none());
    }

    #[test]
    fn bandwidth_split_across_devices_is_infeasible() {
        let planner = PreemptionPlanner::with_defaults();
        let node = Node::new("node-1")
            .with_device("eth0", 1000)
            .with_device("eth1", 1000);
        let ask = Resources::new().with_network("eth0", 500);
        // 600 MBits reclaimable in total, but no single device frees 500
        let current = vec![
            alloc("on-eth0", 10, Resources::new().with_network("eth0", 300)),
            alloc("on-eth1", 10, Resources::new().with_network("eth1", 300)),
        ];

        assert!(planner.plan(100, current, &ask, &node).is_none());
    }

    #[test]
    fn minimality_pass_keeps_only_the_superset() {
        let planner = PreemptionPlanner::with_defaults();
        let node = Node::new("node-1").with_device("eth0", 1000);
        let ask = Resources::new().with_cpu(2048).with_memory_mb(2048);
        let current = vec![
            alloc(
                "small-1",
                10,
                Resources::new().with_cpu(600).with_memory_mb(600),
            ),
            alloc(
                "small-2",
                10,
                Resources::new().with_cpu(600).with_memory_mb(600),
            ),
            alloc(
                "superset",
                10,
                Resources::new().with_cpu(8192).with_memory_mb(8192),
            ),
        ];

        let plan = planner.plan(100, current, &ask, &node).unwrap_or_default();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].id.as_str(), "superset");
    }

    #[test]
    fn plan_resources_always_cover_the_ask() {
        let planner = PreemptionPlanner::with_defaults();
        let node = Node::new("node-1").with_device("eth0", 1000);
        let ask = Resources::new()
            .with_cpu(3000)
            .with_memory_mb(1500)
            .with_network("eth0", 400);
        let current = vec![
            alloc(
                "n1",
                10,
                Resources::new()
                    .with_cpu(1024)
                    .with_memory_mb(512)
                    .with_network("eth0", 250),
            ),
            alloc(
                "n2",
                20,
                Resources::new()
                    .with_cpu(1024)
                    .with_memory_mb(512)
                    .with_network("eth0", 250),
            ),
            alloc(
                "cpu-heavy",
                30,
                Resources::new().with_cpu(4096).with_memory_mb(2048),
            ),
        ];

        let plan = planner.plan(100, current, &ask, &node).unwrap_or_default();
        assert!(!plan.is_empty());

        let mut total = Resources::new();
        for victim in &plan {
            total.add(&victim.resources);
        }
        assert!(total.meets(&ask));
    }

    #[test]
    fn repeated_calls_return_identical_plans() {
        let planner = PreemptionPlanner::with_defaults();
        let node = Node::new("node-1")
            .with_device("eth0", 1000)
            .with_device("eth1", 1000);
        let ask = Resources::new()
            .with_cpu(2000)
            .with_memory_mb(1000)
            .with_network("eth0", 300);
        let current = vec![
            alloc(
                "a",
                10,
                Resources::new()
                    .with_cpu(900)
                    .with_memory_mb(400)
                    .with_network("eth0", 200),
            ),
            alloc(
                "b",
                10,
                Resources::new()
                    .with_cpu(900)
                    .with_memory_mb(400)
                    .with_network("eth1", 200),
            ),
            alloc(
                "c",
                25,
                Resources::new()
                    .with_cpu(900)
                    .with_memory_mb(400)
                    .with_network("eth0", 200),
            ),
            alloc("d", 40, Resources::new().with_cpu(2000).with_memory_mb(900)),
        ];

        let first: Vec<String> = planner
            .plan(100, current.clone(), &ask, &node)
            .unwrap_or_default()
            .iter()
            .map(|a| a.id.to_string())
            .collect();
        let second: Vec<String> = planner
            .plan(100, current, &ask, &node)
            .unwrap_or_default()
            .iter()
            .map(|a| a.id.to_string())
            .collect();

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn caller_keeps_its_copy_of_the_candidates() {
        let planner = PreemptionPlanner::with_defaults();
        let node = Node::new("node-1");
        let ask = Resources::new().with_cpu(500);
        let current = vec![
            alloc("a", 10, Resources::new().with_cpu(1000)),
            alloc("b", 20, Resources::new().with_cpu(1000)),
        ];

        // The planner consumes its copy; ours is untouched
        let plan = planner
            .plan(100, current.clone(), &ask, &node)
            .unwrap_or_default();
        assert_eq!(plan.len(), 1);
        assert_eq!(current.len(), 2);
        assert_eq!(current[0].id.as_str(), "a");
    }
}
