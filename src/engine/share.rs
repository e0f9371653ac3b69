//! Pool-share ratio shared by the transfer and liquidity handlers.

use crate::domain::Decimal;

/// Result of a share computation, flagging the zero-supply case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareOfPool {
    pub value: Decimal,
    /// Total supply was exactly zero; `value` is forced to zero.
    pub degenerate: bool,
}

/// `lp_balance / total_supply`, or a flagged zero when the supply is zero.
///
/// Any non-zero supply divides normally, a negative one included.
pub fn share_of_pool(lp_balance: &Decimal, total_supply: &Decimal) -> ShareOfPool {
    match lp_balance.checked_div(total_supply) {
        Some(value) => ShareOfPool {
            value,
            degenerate: false,
        },
        None => ShareOfPool {
            value: Decimal::zero(),
            degenerate: true,
        },
    }
}
