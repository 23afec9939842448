// Position delta tracking and keyword opportunity scoring

/// Day-over-day position change. Positive means we climbed, negative means
/// we dropped (delta = previous - current, positions count down toward 1).
/// None when either side is unranked.
pub fn position_delta(previous: Option<u32>, current: Option<u32>) -> Option<i64> {
    match (previous, current) {
        (Some(prev), Some(cur)) => Some(prev as i64 - cur as i64),
        _ => None,
    }
}

/// Composite 0-100 "worth pursuing" signal for a keyword.
///
/// Average of three sub-scores: volume (capped at 50), inverse difficulty,
/// and a position score that rewards the 6-20 "quick win" zone. A keyword
/// with no volume or difficulty data scores 0 - no opportunity signal
/// without underlying data.
pub fn opportunity_score(
    search_volume: Option<u32>,
    difficulty: Option<f64>,
    position: Option<u32>,
) -> u32 {
    let (Some(volume), Some(difficulty)) = (search_volume, difficulty) else {
        return 0;
    };

    let volume_score = (volume as f64 / 100.0).min(50.0);
    let difficulty_score = (50.0 - difficulty).max(0.0);
    let position_score = match position {
        Some(p) if (1..=20).contains(&p) => ((21 - p) * 2) as f64,
        _ => 10.0,
    };

    ((volume_score + difficulty_score + position_score) / 3.0).round() as u32
}
