// Backlink gap analysis: domains linking to competitors but not to us,
// merged across competitors and ranked by outreach priority

use crate::backlink::backlink_opportunity_score;
use crate::model::{Backlink, CompetitorBacklink, Gap, GapAnalysis, GapSummary, LinkType};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

struct GapAccumulator {
    competitors: BTreeSet<String>,
    da_sum: f64,
    da_count: u32,
    spam_sum: u64,
    spam_count: u32,
    best_opportunity_score: i32,
    link_type_counts: BTreeMap<LinkType, u32>,
}

impl GapAccumulator {
    fn new() -> Self {
        Self {
            competitors: BTreeSet::new(),
            da_sum: 0.0,
            da_count: 0,
            spam_sum: 0,
            spam_count: 0,
            best_opportunity_score: i32::MIN,
            link_type_counts: BTreeMap::new(),
        }
    }

    fn absorb(&mut self, link: &CompetitorBacklink) {
        self.competitors.insert(link.competitor_domain.to_lowercase());

        if let Some(da) = link.domain_authority {
            self.da_sum += da;
            self.da_count += 1;
        }
        if let Some(spam) = link.spam_score {
            self.spam_sum += spam as u64;
            self.spam_count += 1;
        }

        // The domain is by construction absent from our live set.
        let score = backlink_opportunity_score(link, false);
        self.best_opportunity_score = self.best_opportunity_score.max(score);

        *self.link_type_counts.entry(link.link_type).or_insert(0) += 1;
    }

    // Ties break alphabetically: BTreeMap iterates link types in name
    // order and only a strictly greater count displaces the current pick.
    fn dominant_link_type(&self) -> LinkType {
        let mut dominant = LinkType::Dofollow;
        let mut best_count = 0;
        for (&link_type, &count) in &self.link_type_counts {
            if count > best_count {
                dominant = link_type;
                best_count = count;
            }
        }
        dominant
    }
}

/// Set-difference our live backlink domains against all live competitor
/// backlinks, merge multi-competitor overlap per source domain, and rank
/// the resulting gaps by outreach priority.
///
/// Overlap count dominates raw authority in the ordering: a domain linking
/// to three rivals is a stronger topical-relevance signal than one isolated
/// high-authority link.
pub fn analyze_backlink_gaps(
    our_backlinks: &[Backlink],
    competitor_backlinks: &[CompetitorBacklink],
) -> GapAnalysis {
    let our_domains: HashSet<String> = our_backlinks
        .iter()
        .filter(|b| b.is_live)
        .map(|b| b.source_domain.to_lowercase())
        .collect();

    let mut competitor_domains: HashSet<String> = HashSet::new();
    let mut by_domain: HashMap<String, GapAccumulator> = HashMap::new();

    for link in competitor_backlinks.iter().filter(|l| l.is_live) {
        let source_domain = link.source_domain.to_lowercase();
        competitor_domains.insert(source_domain.clone());

        if our_domains.contains(&source_domain) {
            continue;
        }

        by_domain
            .entry(source_domain)
            .or_insert_with(GapAccumulator::new)
            .absorb(link);
    }

    let mut gaps: Vec<Gap> = by_domain
        .into_iter()
        .map(|(source_domain, acc)| {
            let avg_domain_authority = if acc.da_count > 0 {
                (acc.da_sum / acc.da_count as f64).round() as u32
            } else {
                0
            };
            let avg_spam_score = (acc.spam_count > 0)
                .then(|| ((acc.spam_sum as f64 / acc.spam_count as f64).round()) as u32);

            let is_high_priority = avg_domain_authority >= 40
                && acc.competitors.len() >= 2
                && avg_spam_score.is_none_or(|s| s <= 30);

            Gap {
                source_domain,
                competitor_count: acc.competitors.len(),
                competitors: acc.competitors.iter().cloned().collect(),
                avg_domain_authority,
                avg_spam_score,
                best_opportunity_score: acc.best_opportunity_score,
                dominant_link_type: acc.dominant_link_type(),
                is_high_priority,
            }
        })
        .collect();

    gaps.sort_by(|a, b| {
        b.is_high_priority
            .cmp(&a.is_high_priority)
            .then_with(|| b.competitor_count.cmp(&a.competitor_count))
            .then_with(|| b.avg_domain_authority.cmp(&a.avg_domain_authority))
            .then_with(|| a.source_domain.cmp(&b.source_domain))
    });

    let high_priority_gaps = gaps.iter().filter(|g| g.is_high_priority).count();
    let da_bearing: Vec<u32> = gaps
        .iter()
        .map(|g| g.avg_domain_authority)
        .filter(|&da| da > 0)
        .collect();
    let avg_gap_domain_authority = if da_bearing.is_empty() {
        0
    } else {
        (da_bearing.iter().map(|&da| da as f64).sum::<f64>() / da_bearing.len() as f64).round()
            as u32
    };

    let summary = GapSummary {
        total_gaps: gaps.len(),
        high_priority_gaps,
        avg_gap_domain_authority,
        our_backlink_domains: our_domains.len(),
        competitor_backlink_domains: competitor_domains.len(),
    };

    GapAnalysis { gaps, summary }
}
