use serde::{Deserialize, Serialize};

/// Promotional modifiers attached to a bet
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PayoutModifiers {
    pub is_bonus_bet: bool,
    pub boost_percentage: Option<u8>,
    /// Informational only, a no-sweat refund is not modelled numerically
    pub is_no_sweat: bool,
}

/// Calculate the payout of a bet
/// A bonus bet returns only the profit since the stake was a free credit;
/// a profit boost scales the whole return. Bonus bet wins if both are set.
pub fn calculate_payout(wager: f64, odds: f64, modifiers: &PayoutModifiers) -> f64 {
    let base = wager * odds;

    if modifiers.is_bonus_bet {
        return base - wager;
    }

    match modifiers.boost_percentage {
        Some(boost) if boost > 0 => base * (1.0 + f64::from(boost) / 100.0),
        _ => base,
    }
}
