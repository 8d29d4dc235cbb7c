use askama_axum::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use bet_tracker::analytics::{
    BookPerformance, Highlights, MarketPerformance, ProfitByDate, SportBetTypeBreakdown,
    SummaryStats,
};
use bet_tracker::bet_form::{BetDraft, LegGroupDraft};
use bet_tracker::coach::Insight;
use bet_tracker::date_range::DateRange;
use bet_tracker::odds::format_odds;
use bet_tracker::{
    AppConfig, Bet, BetResult, BetStore, DashboardFilters, JsonFileStore, League, OddsError,
    OddsFormat, Sportsbook, StoreError, UserProfile, ValidationError,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::{error, info};

// Custom filters for formatting
mod filters {
    pub fn format_percent(value: &f64) -> ::askama::Result<String> {
        Ok(format!("{:.1}%", value))
    }

    pub fn format_money(value: &f64) -> ::askama::Result<String> {
        Ok(format!("${:.2}", value))
    }

    pub fn format_signed(value: &f64) -> ::askama::Result<String> {
        if *value < 0.0 {
            Ok(format!("-${:.2}", value.abs()))
        } else {
            Ok(format!("+${:.2}", value))
        }
    }

    pub fn format_decimal(value: &f64) -> ::askama::Result<String> {
        Ok(format!("{:.2}", value))
    }
}

/// One entry of a filter dropdown
struct SelectOption {
    value: String,
    label: String,
    selected: bool,
}

impl SelectOption {
    fn new(value: &str, label: &str, selected: bool) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            selected,
        }
    }
}

struct LegRow {
    description: String,
    event_name: String,
    result: String,
}

/// A bet prepared for display in the user's odds format
struct BetRow {
    id: String,
    title: String,
    bet_type: String,
    date: String,
    sportsbook: String,
    wager: f64,
    payout: f64,
    odds: String,
    result: String,
    legs: Vec<LegRow>,
}

impl BetRow {
    fn new(bet: &Bet, odds_format: OddsFormat) -> Self {
        Self {
            id: bet.id.clone(),
            title: bet.title(),
            bet_type: bet.bet_type.label().to_string(),
            date: bet.date.format("%Y-%m-%d").to_string(),
            sportsbook: bet
                .sportsbook
                .map(|b| b.label().to_string())
                .unwrap_or_default(),
            wager: bet.wager,
            payout: bet.payout,
            odds: format_odds(bet.odds, bet.result, odds_format)
                .unwrap_or_else(|_| format!("{:.2}", bet.odds)),
            result: bet.result.to_string(),
            legs: bet
                .legs()
                .map(|leg| LegRow {
                    description: leg.description.clone(),
                    event_name: leg.event_name.clone(),
                    result: leg.result.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    active_page: String,
    nickname: String,
    range_options: Vec<SelectOption>,
    league_options: Vec<SelectOption>,
    book_options: Vec<SelectOption>,
    summary: SummaryStats,
    best_book: String,
    highlight_market: String,
    highlight_weak_market: String,
    highlight_book: String,
    profit_by_date: Vec<ProfitByDate>,
    by_sport_bet_type: Vec<SportBetTypeBreakdown>,
    best_markets: Vec<MarketPerformance>,
    worst_markets: Vec<MarketPerformance>,
    by_book: Vec<BookPerformance>,
    insights: Vec<Insight>,
    recent_bets: Vec<BetRow>,
}

#[derive(Template)]
#[template(path = "bets.html")]
struct BetsTemplate {
    active_page: String,
    nickname: String,
    bets: Vec<BetRow>,
}

#[derive(Clone)]
struct AppState {
    store: Arc<dyn BetStore>,
    profile: UserProfile,
}

type ApiResult<T> = Result<T, (StatusCode, String)>;

/// Map an orchestration error to a status code
fn error_response(err: anyhow::Error) -> (StatusCode, String) {
    if err.downcast_ref::<ValidationError>().is_some() || err.downcast_ref::<OddsError>().is_some()
    {
        return (StatusCode::BAD_REQUEST, err.to_string());
    }
    if err.downcast_ref::<StoreError>().is_some() {
        return (StatusCode::NOT_FOUND, err.to_string());
    }

    error!("Request failed: {:#}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// Filter parameters as they arrive from the dashboard form
/// Empty values mean "any"
#[derive(Debug, Default, Deserialize)]
struct FilterParams {
    range: Option<String>,
    league: Option<String>,
    book: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl FilterParams {
    fn into_filters(self, default_range: DateRange) -> ApiResult<DashboardFilters> {
        let bad_request = |e: String| (StatusCode::BAD_REQUEST, e);

        Ok(DashboardFilters {
            date_range: present(&self.range)
                .map(str::parse::<DateRange>)
                .transpose()
                .map_err(bad_request)?
                .unwrap_or(default_range),
            league: present(&self.league)
                .map(str::parse::<League>)
                .transpose()
                .map_err(bad_request)?,
            sportsbook: present(&self.book)
                .map(str::parse::<Sportsbook>)
                .transpose()
                .map_err(bad_request)?,
        })
    }
}

fn range_options(selected: DateRange) -> Vec<SelectOption> {
    [
        DateRange::Last7Days,
        DateRange::Last30Days,
        DateRange::Season,
        DateRange::All,
    ]
    .into_iter()
    .map(|range| SelectOption::new(range.code(), range.label(), range == selected))
    .collect()
}

fn league_options(selected: Option<League>) -> Vec<SelectOption> {
    std::iter::once(SelectOption::new("", "All leagues", selected.is_none()))
        .chain(League::ALL.into_iter().map(|league| {
            SelectOption::new(league.label(), league.label(), selected == Some(league))
        }))
        .collect()
}

fn book_options(selected: Option<Sportsbook>) -> Vec<SelectOption> {
    std::iter::once(SelectOption::new("", "All books", selected.is_none()))
        .chain(Sportsbook::ALL.into_iter().map(|book| {
            SelectOption::new(book.code(), book.label(), selected == Some(book))
        }))
        .collect()
}

fn nickname(profile: &UserProfile) -> String {
    profile.nickname.clone().unwrap_or_else(|| profile.id.clone())
}

fn highlight_text(highlights: &Highlights) -> (String, String, String) {
    let market = |m: &MarketPerformance| {
        format!("{} {} ({:.1}% ROI, {})", m.league, m.market.label(), m.roi, m.record())
    };
    (
        highlights.best_market.as_ref().map(market).unwrap_or_default(),
        highlights.worst_market.as_ref().map(market).unwrap_or_default(),
        highlights
            .best_book
            .as_ref()
            .map(|b| format!("{} ({:.1}% ROI over {} bets)", b.sportsbook.label(), b.roi, b.bet_count))
            .unwrap_or_default(),
    )
}

async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<DashboardTemplate> {
    let filters = params.into_filters(DateRange::default())?;

    let dashboard = bet_tracker::load_dashboard(
        state.store.as_ref(),
        &state.profile.id,
        filters,
        Utc::now(),
        state.profile.timezone(),
    )
    .await
    .map_err(error_response)?;

    let analytics = dashboard.analytics;
    let (highlight_market, highlight_weak_market, highlight_book) =
        highlight_text(&analytics.highlights());
    let odds_format = state.profile.odds_format;

    let template = DashboardTemplate {
        active_page: "dashboard".to_string(),
        nickname: nickname(&state.profile),
        range_options: range_options(dashboard.filters.date_range),
        league_options: league_options(dashboard.filters.league),
        book_options: book_options(dashboard.filters.sportsbook),
        best_book: analytics
            .summary
            .best_book
            .as_ref()
            .map(|b| format!("{} ({:+.2})", b.sportsbook.label(), b.profit))
            .unwrap_or_else(|| "n/a".to_string()),
        summary: analytics.summary,
        highlight_market,
        highlight_weak_market,
        highlight_book,
        profit_by_date: analytics.profit_by_date,
        by_sport_bet_type: analytics.by_sport_bet_type,
        best_markets: analytics.best_markets,
        worst_markets: analytics.worst_markets,
        by_book: analytics.by_book,
        insights: dashboard.insights,
        recent_bets: analytics
            .recent_bets
            .iter()
            .map(|bet| BetRow::new(bet, odds_format))
            .collect(),
    };

    Ok(template)
}

async fn bets_page(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<BetsTemplate> {
    let filters = params.into_filters(DateRange::All)?;
    let query = filters.to_query(Utc::now(), state.profile.timezone());

    let bets = state
        .store
        .find_bets_for_user(&state.profile.id, &query)
        .await
        .map_err(error_response)?;

    let template = BetsTemplate {
        active_page: "bets".to_string(),
        nickname: nickname(&state.profile),
        bets: bets
            .iter()
            .map(|bet| BetRow::new(bet, state.profile.odds_format))
            .collect(),
    };

    Ok(template)
}

async fn api_analytics(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<bet_tracker::analytics::AnalyticsSnapshot>> {
    let filters = params.into_filters(DateRange::default())?;
    let dashboard = bet_tracker::load_dashboard(
        state.store.as_ref(),
        &state.profile.id,
        filters,
        Utc::now(),
        state.profile.timezone(),
    )
    .await
    .map_err(error_response)?;
    Ok(Json(dashboard.analytics))
}

async fn api_insights(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Json<Vec<Insight>>> {
    let filters = params.into_filters(DateRange::default())?;
    let dashboard = bet_tracker::load_dashboard(
        state.store.as_ref(),
        &state.profile.id,
        filters,
        Utc::now(),
        state.profile.timezone(),
    )
    .await
    .map_err(error_response)?;
    Ok(Json(dashboard.insights))
}

async fn create_bet(
    State(state): State<AppState>,
    Json(draft): Json<BetDraft>,
) -> ApiResult<(StatusCode, Json<Bet>)> {
    let bet = bet_tracker::create_bet(
        state.store.as_ref(),
        &state.profile.id,
        &draft,
        Utc::now(),
    )
    .await
    .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(bet)))
}

#[derive(Debug, Deserialize)]
struct ReplaceGroupsRequest {
    #[serde(default)]
    odds_format: Option<OddsFormat>,
    groups: Vec<LegGroupDraft>,
}

async fn replace_groups(
    State(state): State<AppState>,
    Path(bet_id): Path<String>,
    Json(request): Json<ReplaceGroupsRequest>,
) -> ApiResult<Json<Bet>> {
    let odds_format = request.odds_format.unwrap_or(state.profile.odds_format);
    let bet = bet_tracker::replace_leg_groups(
        state.store.as_ref(),
        &state.profile.id,
        &bet_id,
        &request.groups,
        odds_format,
    )
    .await
    .map_err(error_response)?;
    Ok(Json(bet))
}

#[derive(Debug, Deserialize)]
struct ResultRequest {
    result: BetResult,
}

async fn override_result(
    State(state): State<AppState>,
    Path(bet_id): Path<String>,
    Json(request): Json<ResultRequest>,
) -> ApiResult<Json<Bet>> {
    let bet = bet_tracker::override_bet_result(
        state.store.as_ref(),
        &state.profile.id,
        &bet_id,
        request.result,
    )
    .await
    .map_err(error_response)?;
    Ok(Json(bet))
}

async fn settle_leg(
    State(state): State<AppState>,
    Path((bet_id, group, leg)): Path<(String, usize, usize)>,
    Json(request): Json<ResultRequest>,
) -> ApiResult<Json<Bet>> {
    let bet = bet_tracker::settle_leg(
        state.store.as_ref(),
        &state.profile.id,
        &bet_id,
        group,
        leg,
        request.result,
    )
    .await
    .map_err(error_response)?;
    Ok(Json(bet))
}

async fn delete_bet(
    State(state): State<AppState>,
    Path(bet_id): Path<String>,
) -> ApiResult<StatusCode> {
    bet_tracker::delete_bet(state.store.as_ref(), &state.profile.id, &bet_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

fn app(state: AppState) -> Router {
    Router::new()
        // This will serve files from the "static" directory at the "/static" URL path
        .nest_service("/static", ServeDir::new("static"))
        .route("/", get(dashboard))
        .route("/bets", get(bets_page))
        .route("/api/analytics", get(api_analytics))
        .route("/api/insights", get(api_insights))
        .route("/api/bets", post(create_bet))
        .route("/api/bets/:id", delete(delete_bet))
        .route("/api/bets/:id/groups", put(replace_groups))
        .route("/api/bets/:id/result", patch(override_result))
        .route("/api/bets/:id/groups/:group/legs/:leg", patch(settle_leg))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env()?;
    let store = JsonFileStore::open(&config.bets_file)?;

    let state = AppState {
        store: Arc::new(store),
        profile: config.profile(),
    };

    info!(addr = %config.bind_addr, user = %config.user_id, "Starting web server");
    println!("\nStarting web server at http://{}", config.bind_addr);
    println!("Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::response::Response;
    use bet_tracker::data::Dataset;
    use bet_tracker::{Game, Team};
    use chrono::{TimeZone, Utc};
    use tower::ServiceExt;

    fn state() -> AppState {
        let team = |id: &str, name: &str| Team {
            id: id.to_string(),
            name: name.to_string(),
            abbreviation: None,
            league: League::Nhl,
        };
        let dataset = Dataset {
            games: vec![Game {
                id: "g1".to_string(),
                league: League::Nhl,
                home_team_id: "edm".to_string(),
                away_team_id: "cgy".to_string(),
                start_time: Utc.with_ymd_and_hms(2024, 1, 20, 2, 0, 0).unwrap(),
                external_event_id: None,
            }],
            teams: vec![team("edm", "Oilers"), team("cgy", "Flames")],
            ..Default::default()
        };

        AppState {
            store: Arc::new(JsonFileStore::in_memory(dataset)),
            profile: UserProfile {
                id: "local".to_string(),
                nickname: None,
                odds_format: OddsFormat::American,
                utc_offset_minutes: 0,
            },
        }
    }

    fn draft_json(wager: f64) -> String {
        serde_json::json!({
            "wager": wager,
            "odds_format": "american",
            "sportsbook": "draftkings",
            "groups": [{
                "game_id": "g1",
                "odds": "+150",
                "legs": [{
                    "market": "PUCK_LINE",
                    "team_id": "edm",
                    "threshold": -1.5,
                    "result": "win"
                }]
            }]
        })
        .to_string()
    }

    fn json_request(method: &str, uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_bet_and_read_analytics() {
        let state = state();

        let response = app(state.clone())
            .oneshot(json_request("POST", "/api/bets", draft_json(20.0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let bet = body_json(response).await;
        assert_eq!(bet["bet_type"], "straight");
        assert_eq!(bet["result"], "win");
        assert_eq!(bet["leg_groups"][0]["legs"][0]["description"], "Oilers -1.5 Puck Line");

        let response = app(state)
            .oneshot(
                Request::builder()
                    .uri("/api/analytics?range=all&league=NHL&book=")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let analytics = body_json(response).await;
        assert_eq!(analytics["summary"]["wins"], 1);
        assert_eq!(analytics["summary"]["total_wagered"], 20.0);
        assert_eq!(analytics["summary"]["best_book"]["sportsbook"], "draftkings");
    }

    #[tokio::test]
    async fn test_invalid_draft_is_bad_request() {
        let response = app(state())
            .oneshot(json_request("POST", "/api/bets", draft_json(-5.0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_filter_is_bad_request() {
        let response = app(state())
            .oneshot(
                Request::builder()
                    .uri("/api/insights?range=90d")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_bet_is_not_found() {
        let response = app(state())
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/bets/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app(state())
            .oneshot(json_request(
                "PATCH",
                "/api/bets/nope/result",
                r#"{"result":"loss"}"#.to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_insights_always_returned() {
        let response = app(state())
            .oneshot(
                Request::builder()
                    .uri("/api/insights")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let insights = body_json(response).await;
        assert_eq!(insights[0]["kind"], "keep_tracking");
        assert_eq!(insights.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_dashboard_page_renders() {
        let response = app(state())
            .oneshot(Request::builder().uri("/?range=all").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(is_html(&response));
        let html = body_text(response).await;
        assert!(html.contains("Keep tracking your bets"));
    }

    fn is_html(response: &Response) -> bool {
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("text/html"))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_bets_page_defaults_to_all_time() {
        let state = state();
        let response = app(state.clone())
            .oneshot(json_request("POST", "/api/bets", draft_json(20.0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app(state.clone())
            .oneshot(Request::builder().uri("/bets").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(is_html(&response));
        assert!(body_text(response).await.contains("Oilers -1.5 Puck Line"));

        // The January game is long outside a trailing 30 day window
        let response = app(state)
            .oneshot(Request::builder().uri("/bets?range=30d").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(!body_text(response).await.contains("Oilers -1.5 Puck Line"));
    }
}
