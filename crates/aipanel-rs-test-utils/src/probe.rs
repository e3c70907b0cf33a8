use aipanel_rs_protocol::ResourceProbe;

/// Probe returning fixed readings.
#[derive(Debug, Clone)]
pub struct StaticProbe {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    pub os: String,
}

impl StaticProbe {
    pub fn new(cpu: f64, memory: f64, disk: f64) -> Self {
        Self {
            cpu,
            memory,
            disk,
            os: "TestOS 1.0".to_string(),
        }
    }
}

impl Default for StaticProbe {
    fn default() -> Self {
        Self::new(12.5, 40.0, 73.0)
    }
}

impl ResourceProbe for StaticProbe {
    fn cpu_percent(&self) -> f64 {
        self.cpu
    }

    fn memory_percent(&self) -> f64 {
        self.memory
    }

    fn disk_percent(&self) -> f64 {
        self.disk
    }

    fn os_name_and_version(&self) -> String {
        self.os.clone()
    }
}
