//! Order placement command and persisted order records.

mod commands;
mod records;
mod state;

pub use commands::{MAX_LINE_QUANTITY, OrderLine, PlaceOrder};
pub use records::{NewOrder, Order, OrderItem};
pub use state::OrderStatus;
