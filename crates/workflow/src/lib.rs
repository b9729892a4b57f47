//! Order placement workflow.
//!
//! Turns a `PlaceOrder` request into a committed order in a single storage
//! transaction:
//! 1. Validate every referenced product
//! 2. Price each line once
//! 3. Reserve stock for every line
//! 4. Persist the order and its items
//!
//! Any failure rolls the whole transaction back. Once committed, a
//! confirmation is handed to the notification queue for best-effort delivery.

pub mod error;
pub mod notification;
pub mod state;
pub mod workflow;

pub use error::{Result, WorkflowError};
pub use notification::{Deliverer, LogDeliverer, NotificationQueue, RecordingDeliverer};
pub use state::WorkflowState;
pub use workflow::{OrderWorkflow, PlacedOrder};
