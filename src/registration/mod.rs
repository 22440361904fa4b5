//! # Registration workflow.
//!
//! - [`state`]: [`RegistrationState`] the states one registration call moves through;
//! - [`store`]: [`DefinitionStore`] the shared definition file registrations append to;
//! - [`workflow`]: [`Registrar`] sequences validation, mutation and regeneration under a lock.

mod state;
mod store;
mod workflow;

pub use state::RegistrationState;
pub use store::DefinitionStore;
pub use workflow::{Registrar, RegistrarBuilder, Registration, RegistrationRequest};
