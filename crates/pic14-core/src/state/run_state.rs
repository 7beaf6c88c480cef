/// Whether the core fetches instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Fetching and executing.
    #[default]
    Running,
    /// Parked by `SLEEP`. No wake source is simulated, so only a reset resumes.
    Sleeping,
}

impl RunState {
    /// Whether `step` will execute an instruction.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}
