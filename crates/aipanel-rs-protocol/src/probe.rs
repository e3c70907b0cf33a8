use serde::{Deserialize, Serialize};

/// Tracked resource for rolling samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Cpu,
    Memory,
    Gpu,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Cpu, ResourceKind::Memory, ResourceKind::Gpu];

    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Cpu => "CPU",
            ResourceKind::Memory => "RAM",
            ResourceKind::Gpu => "GPU",
        }
    }
}

/// One utilization reading in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub kind: ResourceKind,
    /// Utilization in `0.0..=100.0`.
    pub value: f64,
    /// Set when the value is a placeholder rather than measured telemetry.
    pub simulated: bool,
}

impl Sample {
    /// Measured reading, clamped to `0..=100`.
    pub fn measured(kind: ResourceKind, value: f64) -> Self {
        Self {
            kind,
            value: value.clamp(0.0, 100.0),
            simulated: false,
        }
    }

    /// Placeholder reading, clamped to `0..=100`.
    pub fn simulated(kind: ResourceKind, value: f64) -> Self {
        Self {
            kind,
            value: value.clamp(0.0, 100.0),
            simulated: true,
        }
    }
}

/// Host resource readings used by `/status` and the sampler.
///
/// Implementations are expected to be cheap enough to call from the thread
/// that owns the interactive surface.
pub trait ResourceProbe: Send + Sync {
    fn cpu_percent(&self) -> f64;
    fn memory_percent(&self) -> f64;
    fn disk_percent(&self) -> f64;
    /// Operating system name and version, e.g. `"Linux 6.8"`.
    fn os_name_and_version(&self) -> String;
}
