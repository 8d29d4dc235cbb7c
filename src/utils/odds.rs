use crate::error::OddsError;
use crate::models::{BetResult, Leg, LegGroup, OddsFormat};

/// Derive a bet's overall result from its leg results
/// Void legs are excluded; a single loss sinks the bet even if other legs
/// are still pending, and every remaining leg must win for the bet to win
pub fn calculate_bet_result<I>(results: I) -> BetResult
where
    I: IntoIterator<Item = BetResult>,
{
    let mut any_leg = false;
    let mut all_won = true;

    for result in results.into_iter().filter(|r| *r != BetResult::Void) {
        any_leg = true;
        match result {
            BetResult::Loss => return BetResult::Loss,
            BetResult::Win => {}
            _ => all_won = false,
        }
    }

    if !any_leg {
        BetResult::Void
    } else if all_won {
        BetResult::Win
    } else {
        BetResult::Pending
    }
}

/// Multiply the decimal odds of every non-void leg that carries odds
/// Returns 1.0 when no leg qualifies
pub fn calculate_bet_odds<'a, I>(legs: I) -> f64
where
    I: IntoIterator<Item = &'a Leg>,
{
    legs.into_iter()
        .filter(|leg| leg.result != BetResult::Void)
        .filter_map(|leg| leg.odds)
        .filter(|odds| *odds > 0.0)
        .product()
}

/// Multiply the combined odds of each leg group
/// Group odds are entered directly and are not re-derived from their legs
pub fn calculate_bet_odds_from_groups(groups: &[LegGroup]) -> f64 {
    groups.iter().map(|group| group.odds).product()
}

/// Convert decimal odds to an American odds figure
/// 2.50 -> 150, 1.50 -> -200
pub fn decimal_to_american_value(decimal: f64) -> Result<i32, OddsError> {
    if !decimal.is_finite() || decimal <= 1.0 {
        return Err(OddsError::NoAmericanEquivalent(decimal));
    }

    let american = if decimal >= 2.0 {
        ((decimal - 1.0) * 100.0).round()
    } else {
        (-100.0 / (decimal - 1.0)).round()
    };

    if american < f64::from(i32::MIN) || american > f64::from(i32::MAX) {
        return Err(OddsError::NoAmericanEquivalent(decimal));
    }
    Ok(american as i32)
}

/// Convert decimal odds to the American display string, e.g. "+150" or "-200"
pub fn decimal_to_american(decimal: f64) -> Result<String, OddsError> {
    decimal_to_american_value(decimal).map(format_american)
}

pub fn format_american(american: i32) -> String {
    if american > 0 {
        format!("+{}", american)
    } else {
        american.to_string()
    }
}

/// Parse American odds ("+150", "-110", "150") into decimal odds
pub fn american_to_decimal(input: &str) -> Result<f64, OddsError> {
    let trimmed = input.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let american: f64 = unsigned
        .parse()
        .ok()
        .filter(|value: &f64| value.is_finite())
        .ok_or_else(|| OddsError::InvalidAmerican(input.to_string()))?;

    if american > 0.0 {
        Ok(american / 100.0 + 1.0)
    } else if american < 0.0 {
        Ok(100.0 / american.abs() + 1.0)
    } else {
        Err(OddsError::ZeroAmerican)
    }
}

/// Parse odds typed in the given format into decimal odds
pub fn parse_odds(input: &str, format: OddsFormat) -> Result<f64, OddsError> {
    match format {
        OddsFormat::American => american_to_decimal(input),
        OddsFormat::Decimal => input
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|odds| odds.is_finite() && *odds > 1.0)
            .ok_or_else(|| OddsError::InvalidDecimal(input.to_string())),
    }
}

/// Render odds for display; void bets and legs always read "Void"
pub fn format_odds(decimal: f64, result: BetResult, format: OddsFormat) -> Result<String, OddsError> {
    if result == BetResult::Void {
        return Ok("Void".to_string());
    }

    match format {
        OddsFormat::Decimal => Ok(format!("{:.2}", decimal)),
        OddsFormat::American => decimal_to_american(decimal),
    }
}
