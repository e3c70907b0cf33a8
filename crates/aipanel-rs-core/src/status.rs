//! One-shot system status report.

use aipanel_rs_protocol::ResourceProbe;

/// Multi-line report logged by `/status` and printed by `aipanel status`.
pub fn status_report(probe: &dyn ResourceProbe) -> String {
    format!(
        "System Status:\nCPU Usage: {:.1}%\nRAM Usage: {:.1}%\nDisk Usage: {:.1}%\nOS: {}",
        probe.cpu_percent(),
        probe.memory_percent(),
        probe.disk_percent(),
        probe.os_name_and_version()
    )
}
