//! States of a single registration call.
//!
//! ```text
//! Idle ──► Validating ──► MutatingDefinition ──► Regenerating ──► Succeeded
//!              │                  │                    │
//!              └──────────────────┴────────────────────┴────────► Failed
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationState {
    Idle,
    Validating,
    /// Holding the manager lock; registry and shared file are being updated.
    MutatingDefinition,
    /// Holding the manager lock; code generation is running.
    Regenerating,
    Succeeded,
    Failed,
}

impl RegistrationState {
    /// True for `Succeeded` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RegistrationState::Succeeded | RegistrationState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationState::Idle => "idle",
            RegistrationState::Validating => "validating",
            RegistrationState::MutatingDefinition => "mutating-definition",
            RegistrationState::Regenerating => "regenerating",
            RegistrationState::Succeeded => "succeeded",
            RegistrationState::Failed => "failed",
        }
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
