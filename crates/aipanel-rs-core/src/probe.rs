//! `sysinfo`-backed resource probe.

use aipanel_rs_protocol::ResourceProbe;
use parking_lot::Mutex;
use std::path::Path;
use sysinfo::{Disks, System};

/// Reads host usage through `sysinfo`.
///
/// CPU usage is a delta between refreshes, so the first reading after
/// construction reflects the interval since `new`.
pub struct SysinfoProbe {
    system: Mutex<System>,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceProbe for SysinfoProbe {
    fn cpu_percent(&self) -> f64 {
        let mut system = self.system.lock();
        system.refresh_cpu_usage();
        let cpus = system.cpus();
        if cpus.is_empty() {
            return 0.0;
        }
        let total: f32 = cpus.iter().map(|cpu| cpu.cpu_usage()).sum();
        f64::from(total / cpus.len() as f32)
    }

    fn memory_percent(&self) -> f64 {
        let mut system = self.system.lock();
        system.refresh_memory();
        percent(system.used_memory(), system.total_memory())
    }

    fn disk_percent(&self) -> f64 {
        let disks = Disks::new_with_refreshed_list();
        let root = disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == Path::new("/"))
            .or_else(|| disks.list().first());
        match root {
            Some(disk) => percent(
                disk.total_space().saturating_sub(disk.available_space()),
                disk.total_space(),
            ),
            None => 0.0,
        }
    }

    fn os_name_and_version(&self) -> String {
        let name = System::name().unwrap_or_else(|| std::env::consts::OS.to_string());
        match System::kernel_version() {
            Some(release) => format!("{name} {release}"),
            None => name,
        }
    }
}

fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (used as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_handles_empty_totals() {
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(percent(50, 200), 25.0);
    }

    #[test]
    fn readings_stay_in_range() {
        let probe = SysinfoProbe::new();
        for value in [probe.cpu_percent(), probe.memory_percent(), probe.disk_percent()] {
            assert!((0.0..=100.0).contains(&value), "{value}");
        }
        assert!(!probe.os_name_and_version().is_empty());
    }
}
