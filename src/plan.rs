//! Plan generation: a pure, ordered description of reconciliation actions.
//!
//! The planner is a deterministic per-entry mapping from inspected state to
//! a typed action; it never touches the filesystem or the network. Calling
//! it twice on the same inputs yields an identical [`Plan`] value, so logs
//! and dry-run output are reproducible.

use crate::audit::Verb;
use crate::catalog::CatalogEntry;
use crate::state::{FileState, Status};

/// One typed, side-effect-free action in a [`Plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanAction {
    /// The catalog entry this action targets.
    pub target: CatalogEntry,
    /// What the executor should do for it.
    pub verb: Verb,
}

impl PlanAction {
    /// One-line human-readable description of this action.
    ///
    /// Shared by the real executor and the dry-run preview so a dry run is
    /// a byte-identical preview of what would be done.
    #[must_use]
    pub fn description(&self) -> String {
        match self.verb {
            Verb::Fetch | Verb::Restore | Verb::Upgrade => format!(
                "{} {} -> {}",
                self.verb.as_str(),
                self.target.remote_location,
                self.target.local_path.display()
            ),
            Verb::SkipPinned | Verb::SkipCurrent => format!(
                "{} {}",
                self.verb.as_str(),
                self.target.local_path.display()
            ),
        }
    }
}

/// An ordered sequence of actions reconciling actual state with desired
/// state. The plan is a value; producing it mutates nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Plan {
    /// Actions in catalog resolution order (core, plugins as declared,
    /// theme).
    pub actions: Vec<PlanAction>,
}

impl Plan {
    /// Number of actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the plan is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of actions that would write (fetch or restore).
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a.verb, Verb::Fetch | Verb::Restore))
            .count()
    }
}

/// Build the full reconciliation plan from inspected states.
///
/// Per-entry mapping, independent of the other entries:
///
/// | status       | verb          |
/// |--------------|---------------|
/// | `Absent`     | `Fetch`       |
/// | `Outdated`   | `Fetch`       |
/// | `Corrupted`  | `Fetch`       |
/// | `PinnedSkip` | `SkipPinned`  |
/// | `Current`    | `SkipCurrent` |
#[must_use]
pub fn build(states: &[FileState]) -> Plan {
    Plan {
        actions: states
            .iter()
            .map(|state| PlanAction {
                target: state.entry.clone(),
                verb: match state.status {
                    Status::Absent | Status::Outdated | Status::Corrupted => Verb::Fetch,
                    Status::PinnedSkip => Verb::SkipPinned,
                    Status::Current => Verb::SkipCurrent,
                },
            })
            .collect(),
    }
}

/// Build a restore-mode plan: only entries whose status was `Absent`, with
/// the `Restore` verb. Outdated or corrupted entries never appear here.
#[must_use]
pub fn build_restore(states: &[FileState]) -> Plan {
    Plan {
        actions: states
            .iter()
            .filter(|state| state.status == Status::Absent)
            .map(|state| PlanAction {
                target: state.entry.clone(),
                verb: Verb::Restore,
            })
            .collect(),
    }
}
