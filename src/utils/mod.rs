pub mod analytics;
pub mod bet_form;
pub mod coach;
pub mod data;
pub mod date_range;
pub mod market_display;
pub mod odds;
pub mod payout;
