use crate::error::ParseError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Informational,
    Commercial,
    Transactional,
    Navigational,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Informational => "informational",
            Intent::Commercial => "commercial",
            Intent::Transactional => "transactional",
            Intent::Navigational => "navigational",
        }
    }
}

impl FromStr for Intent {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "informational" => Ok(Intent::Informational),
            "commercial" => Ok(Intent::Commercial),
            "transactional" => Ok(Intent::Transactional),
            "navigational" => Ok(Intent::Navigational),
            other => Err(ParseError::UnknownIntent(other.to_string())),
        }
    }
}

// Variant order matches the canonical name order so the derived Ord gives a
// stable alphabetical iteration when used as a BTreeMap key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Dofollow,
    Nofollow,
    Sponsored,
    Ugc,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Dofollow => "dofollow",
            LinkType::Nofollow => "nofollow",
            LinkType::Sponsored => "sponsored",
            LinkType::Ugc => "ugc",
        }
    }
}

impl FromStr for LinkType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dofollow" => Ok(LinkType::Dofollow),
            "nofollow" => Ok(LinkType::Nofollow),
            "sponsored" => Ok(LinkType::Sponsored),
            "ugc" => Ok(LinkType::Ugc),
            other => Err(ParseError::UnknownLinkType(other.to_string())),
        }
    }
}

/// One keyword's ranking state on a given day. `position` is a 1-based rank;
/// None means the keyword did not rank in tracked results that day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordSnapshot {
    pub keyword_id: i64,
    pub keyword: String,
    pub cluster: Option<String>,
    pub target_url: Option<String>,
    pub date: NaiveDate,
    pub position: Option<u32>,
    pub previous_position: Option<u32>,
    pub search_volume: Option<u32>,
    pub difficulty: Option<f64>,
    pub intent: Intent,
    pub is_active: bool,
    pub is_core_page: bool,
}

/// A competitor's rank for one keyword, joined with the keyword's volume.
/// Unique per (keyword_id, competitor_domain).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorPosition {
    pub keyword_id: i64,
    pub competitor_domain: String,
    pub competitor_position: u32,
    pub our_position: Option<u32>,
    pub search_volume: u32,
}

/// One of our own backlinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backlink {
    pub source_domain: String,
    pub source_url: String,
    pub target_url: String,
    pub link_type: LinkType,
    pub is_live: bool,
    pub domain_authority: Option<f64>,
    pub spam_score: Option<u32>,
}

/// A backlink pointing at a tracked competitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorBacklink {
    pub competitor_domain: String,
    pub source_domain: String,
    pub source_url: String,
    pub target_url: String,
    pub link_type: LinkType,
    pub is_live: bool,
    pub domain_authority: Option<f64>,
    pub spam_score: Option<u32>,
}

/// A keyword worth pursuing right now: mid-page position, decent volume,
/// beatable difficulty, buying intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickWin {
    pub keyword_id: i64,
    pub keyword: String,
    pub position: u32,
    pub search_volume: u32,
    pub difficulty: f64,
    pub intent: Intent,
    pub opportunity_score: u32,
}

/// A previously well-ranking keyword that dropped hard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallingStar {
    pub keyword_id: i64,
    pub keyword: String,
    pub previous_position: u32,
    pub current_position: u32,
    pub position_delta: i64,
    pub search_volume: u32,
}

/// Per-competitor aggregate over every keyword we both rank for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorPressure {
    pub competitor_domain: String,
    pub shared_keywords: u64,
    pub keywords_above_us: u64,
    pub avg_competitor_position: f64,
    pub avg_our_position: Option<f64>,
    pub avg_gap: Option<f64>,
    pub total_volume: u64,
    pub pressure_index: u32,
}

/// A domain linking to one or more competitors but not to us. Derived fresh
/// on every query, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gap {
    pub source_domain: String,
    pub competitor_count: usize,
    pub competitors: Vec<String>,
    pub avg_domain_authority: u32,
    pub avg_spam_score: Option<u32>,
    pub best_opportunity_score: i32,
    pub dominant_link_type: LinkType,
    pub is_high_priority: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapSummary {
    pub total_gaps: usize,
    pub high_priority_gaps: usize,
    pub avg_gap_domain_authority: u32,
    pub our_backlink_domains: usize,
    pub competitor_backlink_domains: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapAnalysis {
    pub gaps: Vec<Gap>,
    pub summary: GapSummary,
}
