// Link-building value scoring for a single competitor backlink

use crate::model::{CompetitorBacklink, LinkType};

/// A competitor backlink is an outreach opportunity when the source domain
/// does not already link to us, the link is live, and the domain carries
/// enough authority to matter. Missing authority data disqualifies.
pub fn is_link_opportunity(link: &CompetitorBacklink, already_linking: bool) -> bool {
    !already_linking && link.is_live && link.domain_authority.unwrap_or(0.0) >= 30.0
}

/// Score a competitor backlink's outreach value.
///
/// Base score by domain-authority tier, then stacked adjustments for link
/// type and spam score. Adjustments are deliberately not re-clamped, so
/// values above 100 (or below 0) are possible. Non-opportunities score 0.
pub fn backlink_opportunity_score(link: &CompetitorBacklink, already_linking: bool) -> i32 {
    if !is_link_opportunity(link, already_linking) {
        return 0;
    }

    let da = link.domain_authority.unwrap_or(0.0);
    let mut score: i32 = if da >= 80.0 {
        100
    } else if da >= 60.0 {
        80
    } else if da >= 40.0 {
        60
    } else if da >= 30.0 {
        40
    } else {
        20
    };

    if link.link_type == LinkType::Dofollow {
        score += 10;
    }

    // An absent spam score counts as safe, matching the gap analyzer's
    // null-or-low high-priority rule.
    match link.spam_score {
        None => score += 10,
        Some(spam) if spam <= 30 => score += 10,
        Some(spam) if spam > 60 => score -= 20,
        Some(_) => {}
    }

    score
}
