//! # Listener trait
//!
//! A [`Subscribe`] implementation receives every [`Event`] emitted on an
//! [`EventBus`](crate::EventBus) after it was registered, one at a time, in emission order.
//!
//! The bus owns a queue and a worker per listener, so a listener that awaits I/O only
//! delays its own backlog; nothing is dropped. A panic inside [`Subscribe::on_event`] is
//! caught by the worker; the listener keeps receiving later events.

use crate::events::Event;
use async_trait::async_trait;

#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Called once per delivered event.
    async fn on_event(&self, event: &Event);

    /// Name used in bus logs; defaults to the type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
