//! Core types for preemption planning.
//!
//! This module provides the fundamental types used throughout
//! `gantry-preemption`:
//! - [`Resources`]: the resource bundle reserved by an allocation or
//!   requested by a pending job
//! - [`NetworkReservation`]: a per-device bandwidth reservation
//! - [`Allocation`]: a workload placement that may be selected for eviction
//! - [`Node`]: the target node and its physical network devices
//! - [`PlannerConfig`]: tuning knobs for the planner

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PreemptionError, Result};

/// Default priority gap required between the incoming job and a victim.
pub const DEFAULT_PRIORITY_GAP: u32 = 10;

/// A bandwidth reservation on a named network device.
///
/// Only the first reservation of a resource bundle participates in
/// preemption decisions; additional entries are carried but not inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkReservation {
    /// Name of the network device (e.g. `eth0`).
    pub device: String,
    /// Reserved bandwidth in MBits.
    pub mbits: u32,
}

impl NetworkReservation {
    /// Creates a new network reservation.
    ///
    /// # Errors
    ///
    /// Returns error if the device name is empty.
    pub fn new(device: impl Into<String>, mbits: u32) -> Result<Self> {
        let device = device.into();
        if device.is_empty() {
            return Err(PreemptionError::InvalidReservation {
                reason: "device name is empty".into(),
            });
        }
        Ok(Self { device, mbits })
    }
}

/// A resource bundle: what an allocation holds or a pending job asks for.
///
/// Scalar fields are non-negative integers (CPU in MHz equivalents, memory
/// and disk in MB). Cloning yields an independent value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Resources {
    /// CPU in MHz.
    pub cpu: u32,
    /// Memory in MB.
    pub memory_mb: u32,
    /// Disk in MB.
    pub disk_mb: u32,
    /// Disk operations per second.
    pub iops: u32,
    /// Per-device network reservations, in declaration order.
    pub networks: Vec<NetworkReservation>,
}

impl Resources {
    /// Creates an empty resource bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the CPU requirement in MHz.
    #[must_use]
    pub const fn with_cpu(mut self, cpu: u32) -> Self {
        self.cpu = cpu;
        self
    }

    /// Sets the memory requirement in MB.
    #[must_use]
    pub const fn with_memory_mb(mut self, memory_mb: u32) -> Self {
        self.memory_mb = memory_mb;
        self
    }

    /// Sets the disk requirement in MB.
    #[must_use]
    pub const fn with_disk_mb(mut self, disk_mb: u32) -> Self {
        self.disk_mb = disk_mb;
        self
    }

    /// Sets the IOPS requirement.
    #[must_use]
    pub const fn with_iops(mut self, iops: u32) -> Self {
        self.iops = iops;
        self
    }

    /// Appends a network reservation.
    #[must_use]
    pub fn with_network(mut self, device: impl Into<String>, mbits: u32) -> Self {
        self.networks.push(NetworkReservation {
            device: device.into(),
            mbits,
        });
        self
    }

    /// Adds another bundle into this one.
    ///
    /// Scalar fields are summed (saturating, so no field ever decreases).
    /// When both bundles have a first network entry their `mbits` are
    /// summed into this bundle's first entry; when this bundle has none,
    /// the other side's entries are appended.
    pub fn add(&mut self, other: &Self) {
        self.cpu = self.cpu.saturating_add(other.cpu);
        self.memory_mb = self.memory_mb.saturating_add(other.memory_mb);
        self.disk_mb = self.disk_mb.saturating_add(other.disk_mb);
        self.iops = self.iops.saturating_add(other.iops);

        match (self.networks.first_mut(), other.networks.first()) {
            (Some(mine), Some(theirs)) => {
                mine.mbits = mine.mbits.saturating_add(theirs.mbits);
            }
            (None, Some(_)) => {
                self.networks.extend(other.networks.iter().cloned());
            }
            _ => {}
        }
    }

    /// Checks whether this bundle meets or exceeds `need` on every axis.
    ///
    /// The network axis is compared on the first entry's `mbits` only, and
    /// only when both sides have a first entry; an empty network list on
    /// either side skips the check.
    #[must_use]
    pub fn meets(&self, need: &Self) -> bool {
        if self.cpu < need.cpu {
            return false;
        }
        if self.memory_mb < need.memory_mb {
            return false;
        }
        if self.disk_mb < need.disk_mb {
            return false;
        }
        if self.iops < need.iops {
            return false;
        }
        if let (Some(have), Some(want)) = (self.networks.first(), need.networks.first()) {
            if have.mbits < want.mbits {
                return false;
            }
        }
        true
    }

    /// Bandwidth of the first network reservation, or 0 when there is none.
    #[must_use]
    pub fn requested_mbits(&self) -> u32 {
        self.networks.first().map_or(0, |n| n.mbits)
    }

    /// Returns true if all scalar fields are zero and no networks are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cpu == 0
            && self.memory_mb == 0
            && self.disk_mb == 0
            && self.iops == 0
            && self.networks.is_empty()
    }
}

/// Unique identifier for an allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllocationId(String);

impl AllocationId {
    /// Creates a new allocation ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a new random allocation ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AllocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job descriptor carried by an allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Job name.
    pub name: String,
    /// Job priority; higher means more important.
    pub priority: u32,
}

impl Job {
    /// Creates a new job descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, priority: u32) -> Self {
        Self {
            name: name.into(),
            priority,
        }
    }
}

/// A placement of a workload on a node, holding a reserved resource bundle
/// until it terminates or is preempted.
///
/// Allocations missing their job descriptor can occur in practice; the
/// planner skips them everywhere rather than failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Unique allocation ID.
    pub id: AllocationId,
    /// Resources held by this allocation.
    pub resources: Resources,
    /// The job this allocation belongs to, when known.
    pub job: Option<Job>,
}

impl Allocation {
    /// Creates a new allocation with empty resources and no job.
    #[must_use]
    pub fn new(id: AllocationId) -> Self {
        Self {
            id,
            resources: Resources::new(),
            job: None,
        }
    }

    /// Sets the held resources.
    #[must_use]
    pub fn with_resources(mut self, resources: Resources) -> Self {
        self.resources = resources;
        self
    }

    /// Sets the owning job.
    #[must_use]
    pub fn with_job(mut self, job: Job) -> Self {
        self.job = Some(job);
        self
    }

    /// Priority of the owning job, when the allocation has one.
    #[must_use]
    pub fn job_priority(&self) -> Option<u32> {
        self.job.as_ref().map(|j| j.priority)
    }
}

/// A physical network device on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDevice {
    /// Device name (e.g. `eth0`).
    pub name: String,
    /// Declared total bandwidth in MBits.
    pub mbits: u32,
}

impl NetworkDevice {
    /// Creates a new device declaration.
    ///
    /// # Errors
    ///
    /// Returns error if the device name is empty.
    pub fn new(name: impl Into<String>, mbits: u32) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(PreemptionError::InvalidDevice {
                reason: "device name is empty".into(),
            });
        }
        Ok(Self { name, mbits })
    }
}

/// A node candidate for placement: identity plus its network devices.
///
/// The planner only consults the device list, through the network index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Node ID.
    pub id: String,
    /// Physical network devices on this node.
    pub devices: Vec<NetworkDevice>,
}

impl Node {
    /// Creates a new node with no devices.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            devices: Vec::new(),
        }
    }

    /// Declares a network device on this node.
    #[must_use]
    pub fn with_device(mut self, name: impl Into<String>, mbits: u32) -> Self {
        self.devices.push(NetworkDevice {
            name: name.into(),
            mbits,
        });
        self
    }
}

/// Configuration for the preemption planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Minimum priority difference between the incoming job and a victim
    /// for the victim to be eligible.
    pub priority_gap: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            priority_gap: DEFAULT_PRIORITY_GAP,
        }
    }
}

impl PlannerConfig {
    /// Creates a new config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the priority gap.
    #[must_use]
    pub const fn with_priority_gap(mut self, gap: u32) -> Self {
        self.priority_gap = gap;
        self
    }
}
