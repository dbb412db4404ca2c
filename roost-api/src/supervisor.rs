use std::time::Duration;

/// Supervision decision for handling actor failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisionDecision {
    /// Resume the actor, keeping its state
    Resume,
    /// Restart the actor, resetting its state
    Restart,
    /// Stop the actor
    Stop,
    /// Escalate the failure to parent
    Escalate,
}

/// Strategy a parent applies to failing children.
///
/// Carried by `Props` and recorded on the cell at start-up. A cell without an
/// explicit strategy reports its nearest ancestor's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorStrategy {
    /// The decision applies to the failing child only.
    OneForOne {
        max_retries: u32,
        within: Duration,
        decision: SupervisionDecision,
    },
    /// The decision applies to every sibling of the failing child.
    AllForOne {
        max_retries: u32,
        within: Duration,
        decision: SupervisionDecision,
    },
}

impl SupervisorStrategy {
    pub fn one_for_one(decision: SupervisionDecision) -> Self {
        SupervisorStrategy::OneForOne {
            max_retries: 3,
            within: Duration::from_secs(10),
            decision,
        }
    }

    pub fn all_for_one(decision: SupervisionDecision) -> Self {
        SupervisorStrategy::AllForOne {
            max_retries: 3,
            within: Duration::from_secs(10),
            decision,
        }
    }

    /// Same strategy with a different retry window.
    pub fn with_retries(self, max_retries: u32, within: Duration) -> Self {
        match self {
            SupervisorStrategy::OneForOne { decision, .. } => SupervisorStrategy::OneForOne {
                max_retries,
                within,
                decision,
            },
            SupervisorStrategy::AllForOne { decision, .. } => SupervisorStrategy::AllForOne {
                max_retries,
                within,
                decision,
            },
        }
    }

    pub fn decision(&self) -> SupervisionDecision {
        match self {
            SupervisorStrategy::OneForOne { decision, .. }
            | SupervisorStrategy::AllForOne { decision, .. } => *decision,
        }
    }

    pub fn max_retries(&self) -> u32 {
        match self {
            SupervisorStrategy::OneForOne { max_retries, .. }
            | SupervisorStrategy::AllForOne { max_retries, .. } => *max_retries,
        }
    }

    pub fn within(&self) -> Duration {
        match self {
            SupervisorStrategy::OneForOne { within, .. }
            | SupervisorStrategy::AllForOne { within, .. } => *within,
        }
    }
}

impl Default for SupervisorStrategy {
    fn default() -> Self {
        SupervisorStrategy::one_for_one(SupervisionDecision::Restart)
    }
}
