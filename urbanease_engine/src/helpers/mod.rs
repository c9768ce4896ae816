mod order_number;
mod upi;

pub use order_number::new_order_number;
pub use upi::{upi_pay_uri, UpiPayee, DEFAULT_UPI_NAME, DEFAULT_UPI_VPA, MAX_UPI_NOTE_LENGTH};
