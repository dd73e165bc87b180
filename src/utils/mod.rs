pub mod time;

pub use time::{current_time, format_time_diff, format_timestamp, time_since};

use crate::blockchain::{Amount, UNIT};

/// Renders a nano-unit amount as decimal units, e.g. `1.5`.
pub fn format_units(amount: Amount) -> String {
    let whole = amount / UNIT;
    let frac = amount % UNIT;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{:09}", frac);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
