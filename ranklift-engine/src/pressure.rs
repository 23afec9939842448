// Competitor pressure aggregation: per-keyword competitor positions folded
// into a per-domain threat index

use crate::model::{CompetitorPosition, CompetitorPressure};
use std::collections::HashMap;

#[derive(Default)]
struct PressureAccumulator {
    shared_keywords: u64,
    keywords_above_us: u64,
    total_competitor_position: u64,
    total_our_position: u64,
    our_position_count: u64,
    total_gap: i64,
    total_volume: u64,
    threat_score: f64,
}

/// Aggregate competitor-position rows into one pressure row per competitor
/// domain, ordered by shared keyword count descending.
///
/// The threat score rewards competitors sitting high on high-volume
/// keywords; the gap factor dampens keywords where we already rank close
/// behind. A raw "keywords above us" count would ignore both.
pub fn competitor_pressure(rows: &[CompetitorPosition]) -> Vec<CompetitorPressure> {
    let mut by_domain: HashMap<String, PressureAccumulator> = HashMap::new();

    for row in rows {
        let acc = by_domain.entry(row.competitor_domain.clone()).or_default();

        acc.shared_keywords += 1;
        acc.total_competitor_position += row.competitor_position as u64;
        acc.total_volume += row.search_volume as u64;

        match row.our_position {
            Some(ours) => {
                acc.total_our_position += ours as u64;
                acc.our_position_count += 1;
                acc.total_gap += ours as i64 - row.competitor_position as i64;
                if row.competitor_position < ours {
                    acc.keywords_above_us += 1;
                }
            }
            // Not ranking at all counts as being outranked.
            None => acc.keywords_above_us += 1,
        }

        if row.competitor_position <= 20 {
            let position_score = (21 - row.competitor_position) as f64 / 20.0;
            let gap_factor = match row.our_position {
                Some(ours) => {
                    ((ours as f64 - row.competitor_position as f64) / 20.0).max(0.0)
                }
                None => 1.0,
            };
            acc.threat_score += row.search_volume as f64 * position_score * gap_factor;
        }
    }

    let mut pressures: Vec<CompetitorPressure> = by_domain
        .into_iter()
        .map(|(domain, acc)| {
            let pressure_index = if acc.total_volume == 0 {
                0
            } else {
                let index = (acc.threat_score / acc.total_volume as f64) * 100.0;
                index.round().clamp(0.0, 100.0) as u32
            };

            CompetitorPressure {
                competitor_domain: domain,
                shared_keywords: acc.shared_keywords,
                keywords_above_us: acc.keywords_above_us,
                avg_competitor_position: acc.total_competitor_position as f64
                    / acc.shared_keywords.max(1) as f64,
                avg_our_position: (acc.our_position_count > 0)
                    .then(|| acc.total_our_position as f64 / acc.our_position_count as f64),
                avg_gap: (acc.our_position_count > 0)
                    .then(|| acc.total_gap as f64 / acc.our_position_count as f64),
                total_volume: acc.total_volume,
                pressure_index,
            }
        })
        .collect();

    pressures.sort_by(|a, b| {
        b.shared_keywords
            .cmp(&a.shared_keywords)
            .then_with(|| a.competitor_domain.cmp(&b.competitor_domain))
    });
    pressures
}

/// Degraded pressure index used before the volume-weighted metric has been
/// computed at least once: plain share of keywords where the competitor
/// outranks us. Zero shared keywords yields 0, never a division by zero.
pub fn fallback_pressure_index(shared_keywords: u64, keywords_above_us: u64) -> u32 {
    if shared_keywords == 0 {
        return 0;
    }
    ((keywords_above_us as f64 / shared_keywords as f64) * 100.0)
        .round()
        .clamp(0.0, 100.0) as u32
}
