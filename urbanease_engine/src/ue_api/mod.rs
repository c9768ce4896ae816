pub mod errors;
mod fanout;
pub mod notification_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod order_query_api;
pub mod payment_api;

pub use fanout::{notify_owner, OwnerNotice};
