use chrono::Utc;
use rand::Rng;

use crate::db_types::UserId;

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const RANDOM_PART_LENGTH: usize = 10;

/// Generates a customer-facing order number of the form `ORD-<unix millis>-<10 random base36 chars>-<owner tail>`.
///
/// With 36^10 random suffixes per millisecond, collisions are not expected in practice. The storage layer still
/// enforces uniqueness and retries on the off chance.
pub fn new_order_number(owner: &UserId) -> String {
    let millis = Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let random: String =
        (0..RANDOM_PART_LENGTH).map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char).collect();
    format!("ORD-{millis}-{random}-{}", owner.last4())
}
