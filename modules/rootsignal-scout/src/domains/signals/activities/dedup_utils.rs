//! Dedup utility functions for signal processing.
//!
//! Pure functions for title normalization, batch dedup, source ownership
//! checks, signal quality scoring, and multi-layer dedup verdicts.

use std::collections::HashSet;

use rootsignal_common::types::NodeType;
use rootsignal_common::{ActorContext, Node, ScrapingStrategy};
use uuid::Uuid;

use crate::enrichment::quality;

/// Normalize a title for dedup comparison: lowercase and trim.
pub(crate) fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Within-batch dedup by (normalized_title, node_type).
/// Keeps the first occurrence of each (title, type) pair, drops duplicates.
pub(crate) fn batch_title_dedup(nodes: Vec<Node>) -> Vec<Node> {
    let mut seen = HashSet::new();
    nodes
        .into_iter()
        .filter(|n| seen.insert((normalize_title(n.title()), n.node_type())))
        .collect()
}

/// Returns true if this scraping strategy represents an "owned" source — one
/// where the author of the content is the account holder, not an aggregator.
/// Social accounts and dedicated web pages are owned; RSS feeds and web
/// queries aggregate content from many authors.
pub(crate) fn is_owned_source(strategy: &ScrapingStrategy) -> bool {
    matches!(strategy, ScrapingStrategy::Social(_))
}

/// Scores quality, populates from/about locations, and removes Evidence nodes.
///
/// Pure pipeline step: given raw extracted nodes, returns signal nodes with
/// quality scores, source URLs, and location provenance.
pub(crate) fn score_and_filter(
    mut nodes: Vec<Node>,
    url: &str,
    actor_ctx: Option<&ActorContext>,
) -> Vec<Node> {
    // 1. Score quality and stamp source URL
    for node in &mut nodes {
        let q = quality::score(node);
        if let Some(meta) = node.meta_mut() {
            meta.confidence = q.confidence;
            meta.source_url = url.to_string();
        }
    }

    // 2. Filter to signal nodes only (skip Evidence)
    nodes
        .into_iter()
        .filter(|n| !matches!(n.node_type(), NodeType::Citation))
        .collect()
}

// ---------------------------------------------------------------------------
// DedupVerdict — pure decision function for multi-layer deduplication
// ---------------------------------------------------------------------------

/// Threshold for cross-source corroboration via vector similarity.
/// Same-source matches always refresh regardless of similarity (as long as
/// they passed the 0.85 entry threshold from the caller).
const CROSS_SOURCE_SIM_THRESHOLD: f64 = 0.92;

/// The outcome of the multi-layer deduplication check for a single signal node.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DedupVerdict {
    /// No existing match — create a new signal node.
    Create,
    /// Cross-source match — corroborate the existing signal.
    Corroborate {
        existing_id: Uuid,
        existing_type: NodeType,
        similarity: f64,
    },
    /// Same-source match — refresh (re-confirm) the existing signal.
    Refresh {
        existing_id: Uuid,
        existing_type: NodeType,
        similarity: f64,
    },
}

impl DedupVerdict {
    /// Returns the existing signal ID if the verdict is not Create.
    #[cfg(test)]
    fn existing_id(&self) -> Option<Uuid> {
        match self {
            DedupVerdict::Create => None,
            DedupVerdict::Corroborate { existing_id, .. } => Some(*existing_id),
            DedupVerdict::Refresh { existing_id, .. } => Some(*existing_id),
        }
    }
}

/// Pure decision function for the multi-layer dedup pipeline.
///
/// Layers are checked in priority order:
/// 1. Global exact title+type match (similarity = 1.0)
/// 2. In-memory embed cache match (≥0.85 entry, ≥0.92 cross-source)
/// 3. Graph vector index match (≥0.85 entry, ≥0.92 cross-source)
/// 4. No match → Create
///
/// Within each layer, same-source → Refresh, cross-source above threshold → Corroborate.
/// All URLs should be pre-sanitized before calling.
pub(crate) fn dedup_verdict(
    current_url: &str,
    node_type: NodeType,
    global_match: Option<(Uuid, &str)>,
    cache_match: Option<(Uuid, NodeType, &str, f64)>,
    graph_match: Option<(Uuid, NodeType, &str, f64)>,
) -> DedupVerdict {
    // Layer 2.5: Global exact title+type match — always acts (no threshold)
    if let Some((existing_id, existing_url)) = global_match {
        return if existing_url != current_url {
            DedupVerdict::Corroborate {
                existing_id,
                existing_type: node_type,
                similarity: 1.0,
            }
        } else {
            DedupVerdict::Refresh {
                existing_id,
                existing_type: node_type,
                similarity: 1.0,
            }
        };
    }

    // Layer 3a: In-memory embed cache
    if let Some((cached_id, cached_type, cached_url, sim)) = cache_match {
        if cached_url == current_url {
            return DedupVerdict::Refresh {
                existing_id: cached_id,
                existing_type: cached_type,
                similarity: sim,
            };
        } else if sim >= CROSS_SOURCE_SIM_THRESHOLD {
            return DedupVerdict::Corroborate {
                existing_id: cached_id,
                existing_type: cached_type,
                similarity: sim,
            };
        }
    }

    // Layer 3b: Graph vector index
    if let Some((dup_id, dup_type, dup_url, sim)) = graph_match {
        if dup_url == current_url {
            return DedupVerdict::Refresh {
                existing_id: dup_id,
                existing_type: dup_type,
                similarity: sim,
            };
        } else if sim >= CROSS_SOURCE_SIM_THRESHOLD {
            return DedupVerdict::Corroborate {
                existing_id: dup_id,
                existing_type: dup_type,
                similarity: sim,
            };
        }
    }

    // Layer 4: No match
    DedupVerdict::Create
}
