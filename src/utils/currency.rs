use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Normalize a monetary amount to 2 decimal places.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

/// Convert a decimal weight to integer weight units (hundredths), the
/// granularity the sampler works in. 1.00 -> 100. Values that cannot be
/// represented collapse to 0 and drop out of the draw.
pub fn weight_units(weight: Decimal) -> i64 {
    (weight * Decimal::ONE_HUNDRED).round().to_i64().unwrap_or(0)
}
