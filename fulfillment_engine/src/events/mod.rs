//! Order lifecycle events.
//!
//! The orchestrator publishes an [`OrderPaidEvent`] once a payment has been claimed and fulfilled, and an
//! [`OrderAnnulledEvent`] when a failure or cancellation ends an order. Register callbacks on [`EventHooks`], build
//! [`EventHandlers`] from them and hand the resulting [`EventProducers`] to the [`crate::FulfillmentApi`].
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::{OrderAnnulledEvent, OrderPaidEvent};
pub use hooks::{EventHandlers, EventHooks, EventProducers};
