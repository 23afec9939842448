pub mod backlink;
pub mod classify;
pub mod error;
pub mod gap;
pub mod model;
pub mod opportunity;
pub mod pressure;

pub use backlink::{backlink_opportunity_score, is_link_opportunity};
pub use classify::{FallingStarConfig, QuickWinConfig, falling_stars, quick_wins};
pub use error::ParseError;
pub use gap::analyze_backlink_gaps;
pub use model::{
    Backlink, CompetitorBacklink, CompetitorPosition, Intent, KeywordSnapshot, LinkType,
};
pub use opportunity::{opportunity_score, position_delta};
pub use pressure::{competitor_pressure, fallback_pressure_index};
