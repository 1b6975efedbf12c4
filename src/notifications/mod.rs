//! Notifications module
//!
//! In-process pub/sub for dashboard views.
//!
//! # Usage
//! ```ignore
//! use energyflow::notifications::{create_event_bus, Event, AssistantEvent};
//! use chrono::Utc;
//!
//! let event_bus = create_event_bus();
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus.publish(Event::AssistantReplied(AssistantEvent {
//!     dashboard_id: "dash-1".to_string(),
//!     text: "hello".to_string(),
//!     timestamp: Utc::now(),
//! }));
//! ```

pub mod event_bus;
pub mod events;

pub use event_bus::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use events::*;
