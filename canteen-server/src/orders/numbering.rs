//! Order and pickup-token numbers

use chrono::{Local, Timelike};
use rand::Rng;

/// Crockford base32: no I, L, O or U
const CROCKFORD: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const ORDER_SUFFIX_LEN: usize = 6;

/// Source of order and token numbers
pub trait TicketGenerator: Send + Sync {
    /// `ORD` + yyMMdd + random suffix; uniqueness is enforced by the database
    fn order_number(&self) -> String;

    /// Short pickup token shown on the counter display
    fn token_number(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTicketGenerator;

impl TicketGenerator for DefaultTicketGenerator {
    fn order_number(&self) -> String {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..ORDER_SUFFIX_LEN)
            .map(|_| CROCKFORD[rng.gen_range(0..CROCKFORD.len())] as char)
            .collect();
        format!("ORD{}{suffix}", Local::now().format("%y%m%d"))
    }

    fn token_number(&self) -> String {
        let now = Local::now();
        let nn: u32 = rand::thread_rng().gen_range(0..100);
        format!("T{:02}{:02}{nn:02}", now.hour(), now.minute())
    }
}
