use chrono::{DateTime, Utc};
use tracing::info;

use rootsignal_common::{SourceNode, SourceRole};

/// Determines which sources to scrape this run based on weight, cadence, and exploration policy.
pub struct SourceScheduler {
    /// Fraction of scrape slots reserved for exploring low-weight sources (default 0.1).
    exploration_ratio: f64,
    /// Sources below this weight are considered "low weight" for exploration.
    exploration_weight_threshold: f64,
    /// Minimum days since last scrape before a low-weight source is eligible for exploration.
    exploration_min_stale_days: i64,
}

/// Result of scheduling: which sources to scrape and why.
pub struct ScheduleResult {
    /// Sources selected for normal scraping (above cadence threshold).
    pub scheduled: Vec<ScheduledSource>,
    /// Sources selected for exploration (random sampling of low-weight stale sources).
    pub exploration: Vec<ScheduledSource>,
    /// Sources skipped (not yet due based on cadence).
    pub skipped: usize,
    /// Convenience partition: canonical keys of sources with role=Tension or Mixed (Phase A).
    pub tension_phase: Vec<String>,
    /// Convenience partition: canonical keys of sources with role=Response (Phase B).
    pub response_phase: Vec<String>,
}

pub struct ScheduledSource {
    pub canonical_key: String,
    pub reason: ScheduleReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleReason {
    /// Due based on weight-derived cadence.
    Cadence,
    /// Never been scraped.
    NeverScraped,
    /// Selected for exploration (random sampling of low-weight sources).
    Exploration,
}

impl SourceScheduler {
    pub fn new() -> Self {
        Self {
            exploration_ratio: 0.10,
            exploration_weight_threshold: 0.3,
            exploration_min_stale_days: 14,
        }
    }

    /// Schedule sources for this run. Returns which to scrape and which to skip.
    pub fn schedule(&self, sources: &[SourceNode], now: DateTime<Utc>) -> ScheduleResult {
        let mut scheduled = Vec::new();
        let mut exploration_candidates = Vec::new();
        let mut skipped = 0usize;

        for source in sources {
            if self.should_scrape(source, now) {
                scheduled.push(ScheduledSource {
                    canonical_key: source.canonical_key.clone(),
                    reason: if source.last_scraped.is_none() {
                        ScheduleReason::NeverScraped
                    } else {
                        ScheduleReason::Cadence
                    },
                });
            } else if self.is_exploration_candidate(source, now) {
                exploration_candidates.push(source);
            } else {
                skipped += 1;
            }
        }

        // Reserve exploration slots: 10% of total scheduled, minimum 1 if candidates exist
        let total_slots = scheduled.len() + exploration_candidates.len();
        let exploration_slots = if exploration_candidates.is_empty() {
            0
        } else {
            ((total_slots as f64 * self.exploration_ratio).ceil() as usize).max(1)
        };

        // Pick exploration sources — deterministic: sort by staleness (most stale first)
        let mut exploration_candidates: Vec<_> = exploration_candidates.into_iter().collect();
        exploration_candidates.sort_by(|a, b| {
            let a_stale = a.last_scraped.map(|t| (now - t).num_days()).unwrap_or(i64::MAX);
            let b_stale = b.last_scraped.map(|t| (now - t).num_days()).unwrap_or(i64::MAX);
            b_stale.cmp(&a_stale) // most stale first
        });

        let exploration: Vec<ScheduledSource> = exploration_candidates
            .into_iter()
            .take(exploration_slots)
            .map(|s| ScheduledSource {
                canonical_key: s.canonical_key.clone(),
                reason: ScheduleReason::Exploration,
            })
            .collect();

        let exploration_picked = exploration.len();
        if exploration_picked > 0 {
            info!(
                scheduled = scheduled.len(),
                exploration = exploration_picked,
                skipped,
                "Source scheduling complete"
            );
        }

        // Build role lookup for partition
        let role_map: std::collections::HashMap<&str, SourceRole> = sources
            .iter()
            .map(|s| (s.canonical_key.as_str(), s.source_role))
            .collect();

        // Partition all scheduled+exploration keys by source role
        let all_keys: Vec<&str> = scheduled
            .iter()
            .chain(exploration.iter())
            .map(|s| s.canonical_key.as_str())
            .collect();

        let mut tension_phase = Vec::new();
        let mut response_phase = Vec::new();
        for key in all_keys {
            match role_map.get(key).copied().unwrap_or(SourceRole::Mixed) {
                SourceRole::Response => response_phase.push(key.to_string()),
                // Tension and Mixed both go in Phase A
                SourceRole::Tension | SourceRole::Mixed => tension_phase.push(key.to_string()),
            }
        }

        ScheduleResult {
            scheduled,
            exploration,
            skipped,
            tension_phase,
            response_phase,
        }
    }

    /// Check if a source is due for scraping based on its weight-derived cadence.
    fn should_scrape(&self, source: &SourceNode, now: DateTime<Utc>) -> bool {
        let last = match source.last_scraped {
            Some(t) => t,
            None => return true, // Never scraped — always due
        };

        let cadence_hours = source.cadence_hours
            .unwrap_or_else(|| cadence_hours_for_weight(source.weight));
        let hours_since = (now - last).num_hours();

        hours_since >= cadence_hours as i64
    }

    /// Check if a source is eligible for exploration sampling.
    fn is_exploration_candidate(&self, source: &SourceNode, now: DateTime<Utc>) -> bool {
        if source.weight >= self.exploration_weight_threshold {
            return false;
        }
        match source.last_scraped {
            Some(t) => (now - t).num_days() >= self.exploration_min_stale_days,
            None => true,
        }
    }
}

/// Map weight to scrape cadence in hours.
pub fn cadence_hours_for_weight(weight: f64) -> u32 {
    if weight > 0.8 {
        6
    } else if weight > 0.5 {
        24
    } else if weight > 0.2 {
        72
    } else {
        168 // 7 days
    }
}

/// Compute source weight from observable metrics.
///
/// Formula: `base_yield * tension_bonus * recency_factor * diversity_factor`
///
/// - `base_yield`: rolling signals/scrapes ratio with Bayesian smoothing for n < 5
/// - `tension_bonus`: 1.0 + (tension_signals / total_signals), capped at 2.0
/// - `recency_factor`: decays to 0.5 if no signal in 30+ days
/// - `diversity_factor`: 1.5x if signals get corroborated by other sources
pub fn compute_weight(
    signals_produced: u32,
    signals_corroborated: u32,
    scrape_count: u32,
    tension_count: u32,
    last_produced_signal: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    // Base yield with Bayesian smoothing
    let prior_yield = 0.3;
    let k = 3.0; // smoothing strength
    let n = scrape_count as f64;
    let actual_yield = if scrape_count > 0 {
        (signals_produced as f64 / scrape_count as f64).min(1.0)
    } else {
        0.0
    };
    let base_yield = if n < 5.0 {
        (actual_yield * n + prior_yield * k) / (n + k)
    } else {
        actual_yield
    };

    // Tension bonus: sources producing tension signals get boosted
    let tension_bonus = if signals_produced > 0 {
        (1.0 + tension_count as f64 / signals_produced as f64).min(2.0)
    } else {
        1.0
    };

    // Recency factor: decay if no signal in 30+ days
    let recency_factor = match last_produced_signal {
        Some(t) => {
            let days = (now - t).num_days();
            if days < 30 {
                1.0
            } else {
                0.5_f64.max(1.0 - (days - 30) as f64 / 60.0)
            }
        }
        None => 0.7, // Never produced — slight penalty but not harsh
    };

    // Diversity factor: corroboration means this source provides independent evidence
    let diversity_factor = if signals_produced > 0 && signals_corroborated > 0 {
        let corroboration_ratio = signals_corroborated as f64 / signals_produced as f64;
        1.0 + (corroboration_ratio * 0.5).min(0.5) // up to 1.5x
    } else {
        1.0
    };

    let raw = base_yield * tension_bonus * recency_factor * diversity_factor;

    // Clamp to [0.1, 1.0]
    raw.clamp(0.1, 1.0)
}
