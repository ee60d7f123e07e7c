/// File names that mark ignore lists. They are always shared, so they start
/// out checked whenever they are revealed.
pub const DEFAULT_SENTINELS: &[&str] = &[".p4ignore", "p4ignore.txt"];

/// How many entries the build worker processes between progress reports.
pub const DEFAULT_PROGRESS_EVERY: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub sentinel_names: Vec<String>,
    pub progress_every: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sentinel_names: DEFAULT_SENTINELS.iter().map(|s| s.to_string()).collect(),
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

impl EngineConfig {
    pub fn is_sentinel(&self, name: &str) -> bool {
        self.sentinel_names.iter().any(|s| s == name)
    }
}
