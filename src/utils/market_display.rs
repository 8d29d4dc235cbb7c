use crate::models::{Market, MarketQualifier};

/// Build the human-readable description of a leg
/// "Austin Reaves Over 9.5 Rebounds", "Lakers -5.5 Spread",
/// "Lakers Moneyline", "Over 220.5 Total Points"
pub fn format_market_display(
    market: Market,
    player_name: Option<&str>,
    team_name: Option<&str>,
    qualifier: Option<MarketQualifier>,
    threshold: Option<f64>,
) -> String {
    let label = market.label();

    if market.is_spread_market() {
        if let (Some(team), Some(line)) = (team_name, threshold) {
            let sign = if line >= 0.0 { "+" } else { "" };
            return format!("{} {}{} {}", team, sign, line, label);
        }
    }

    match (player_name, team_name, qualifier, threshold) {
        (Some(player), _, Some(qualifier), Some(line)) => {
            format!("{} {} {} {}", player, qualifier.label(), line, label)
        }
        (Some(player), _, None, _) => format!("{} {}", player, label),
        (_, Some(team), Some(qualifier), Some(line)) => {
            format!("{} {} {} {}", team, qualifier.label(), line, label)
        }
        (_, Some(team), None, _) => format!("{} {}", team, label),
        (_, _, Some(qualifier), Some(line)) => format!("{} {} {}", qualifier.label(), line, label),
        _ => label.to_string(),
    }
}
