/// Instruction cycle cost as declared by an instruction template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CycleCost {
    /// Cost does not depend on the data.
    Fixed(u8),
    /// Skip instructions: one extra cycle when the following fetch is discarded.
    Conditional {
        /// Cost when execution falls through.
        base: u8,
        /// Cost when the skip is taken.
        taken: u8,
    },
}

impl CycleCost {
    /// Cycles charged before any data-dependent penalty.
    #[must_use]
    pub const fn base(self) -> u8 {
        match self {
            Self::Fixed(cycles) | Self::Conditional { base: cycles, .. } => cycles,
        }
    }

    /// Cycles declared for the taken path, equal to [`Self::base`] for fixed costs.
    #[must_use]
    pub const fn taken(self) -> u8 {
        match self {
            Self::Fixed(cycles) | Self::Conditional { taken: cycles, .. } => cycles,
        }
    }

    /// Cycles charged for one retirement.
    ///
    /// `redirected` is set when the routine skipped the next fetch or wrote
    /// `PCL`; either costs exactly one additional cycle.
    #[must_use]
    pub const fn charge(self, redirected: bool) -> u8 {
        if redirected {
            self.base() + 1
        } else {
            self.base()
        }
    }
}
