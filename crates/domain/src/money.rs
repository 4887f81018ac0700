//! Monetary rounding.
//!
//! All amounts are [`Decimal`]; nothing on a money path goes through
//! floating point. Amounts persisted as an authorization are quantized to
//! cents with banker's rounding (ties go to the even digit), which is what
//! makes the 110% tolerance boundary deterministic.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Number of fractional digits kept for stored amounts.
pub const MONEY_SCALE: u32 = 2;

/// Real costs may exceed the authorized amount by this factor before the
/// customer has to approve again.
pub const REAUTH_TOLERANCE: Decimal = dec!(1.10);

/// Largest magnitude that can still be held with two fractional digits.
pub const MAX_AMOUNT: Decimal =
    Decimal::from_parts(u32::MAX, u32::MAX, u32::MAX, false, MONEY_SCALE);

/// Rounds `value` to cents, ties to even.
///
/// The result carries exactly two fractional digits, so `1160` becomes
/// `1160.00`. Values beyond [`MAX_AMOUNT`] cannot be rescaled and come back
/// rounded but with fewer digits; use [`checked_round_half_even`] where that
/// matters.
pub fn round_half_even(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Like [`round_half_even`], but `None` when the result would not fit in
/// two fractional digits.
pub fn checked_round_half_even(value: Decimal) -> Option<Decimal> {
    let rounded =
        value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven);
    if rounded.abs() > MAX_AMOUNT {
        return None;
    }
    Some(round_half_even(rounded))
}

/// Highest total real cost an authorization covers without reapproval.
///
/// `None` when `authorized` is too large for the tolerance to be applied.
pub fn reauthorization_limit(authorized: Decimal) -> Option<Decimal> {
    authorized
        .checked_mul(REAUTH_TOLERANCE)
        .and_then(checked_round_half_even)
}

/// Sums `amounts`, or `None` on overflow.
pub fn checked_sum(amounts: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
}
