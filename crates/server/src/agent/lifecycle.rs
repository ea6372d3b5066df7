//! Worker lifecycle state.
//!
//! Install precedes activate, and only an activated worker controls pages.
//! Any other order is rejected with `INVALID_STATE`.

use offline_core::Error;
use schemars::JsonSchema;
use serde::Serialize;

/// State of this agent version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    #[default]
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

fn is_valid_transition(from: WorkerState, to: WorkerState) -> bool {
    use WorkerState::*;

    matches!(
        (from, to),
        (Parsed, Installing)
            | (Installing, Installed)
            | (Installing, Redundant)
            | (Installed, Activating)
            | (Activating, Activated)
            | (Activating, Redundant)
    )
}

/// Snapshot of the lifecycle reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, JsonSchema)]
pub struct Lifecycle {
    pub state: WorkerState,
    /// Set by install: activate without waiting for old pages to close.
    pub skip_waiting: bool,
    /// Set by activate: open pages are controlled without a reload.
    pub clients_claimed: bool,
}

impl Lifecycle {
    pub fn transition(&mut self, to: WorkerState) -> Result<(), Error> {
        if !is_valid_transition(self.state, to) {
            return Err(Error::InvalidState(format!("cannot move from {:?} to {:?}", self.state, to)));
        }
        tracing::debug!(from = ?self.state, to = ?to, "worker state change");
        self.state = to;
        Ok(())
    }

    pub fn skip_waiting(&mut self) {
        self.skip_waiting = true;
    }

    /// Take control of open pages. Only an activated worker can claim.
    pub fn claim_clients(&mut self) -> Result<(), Error> {
        if self.state != WorkerState::Activated {
            return Err(Error::InvalidState(format!("cannot claim clients while {:?}", self.state)));
        }
        self.clients_claimed = true;
        Ok(())
    }

    pub fn controls_clients(&self) -> bool {
        self.state == WorkerState::Activated
    }
}
