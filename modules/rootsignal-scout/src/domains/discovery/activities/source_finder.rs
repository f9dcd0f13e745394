use std::collections::HashSet;

use ai_client::claude::Claude;
use rootsignal_common::{canonical_value, is_web_query, DiscoveryMethod, SourceNode, SourceRole};
use rootsignal_graph::{
    ExtractionYield, GapTypeStats, GraphStore, SignalTypeCounts, SituationBrief, SourceBrief,
    TensionResponseShape, UnmetTension,
};
use schemars::JsonSchema;
use serde::{de, Deserialize};
use tracing::{info, warn};
use crate::domains::scheduling::activities::budget::{BudgetTracker, OperationCost};
use crate::infra::embedder::TextEmbedder;


const HAIKU_MODEL: &str = "claude-haiku-4-5-20251001";
const MAX_CURIOSITY_QUERIES: usize = 12;
const MAX_DISCOVERY_DEPTH: u32 = 2;

/// Stats from a discovery run.
///
/// Counts reflect discovery intent (sources added to the output vec),
/// not persistence outcome. The reducer's `sources_discovered` stat
/// is the authoritative count of sources that reached the event store.
#[derive(Debug, Default)]
pub struct SourceFinderStats {
    pub actor_sources: u32,
    pub link_sources: u32,
    pub gap_sources: u32,
    pub duplicates_skipped: u32,
}

impl std::fmt::Display for SourceFinderStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Discovery: actors={}, links={}, gaps={}, skipped={}",
            self.actor_sources, self.link_sources, self.gap_sources, self.duplicates_skipped
        )
    }
}

// --- Discovery Briefing ---

/// Assembled from graph queries — everything the LLM needs to decide where to look next.
#[derive(Debug, Clone)]
pub struct DiscoveryBriefing {
    pub tensions: Vec<UnmetTension>,
    pub situations: Vec<SituationBrief>,
    pub signal_counts: SignalTypeCounts,
    pub successes: Vec<SourceBrief>,
    pub failures: Vec<SourceBrief>,
    pub existing_queries: Vec<String>,
    pub region_name: String,
    pub gap_type_stats: Vec<GapTypeStats>,
    pub extraction_yield: Vec<ExtractionYield>,
    pub response_shapes: Vec<TensionResponseShape>,
}

impl DiscoveryBriefing {
    /// True when the graph is too sparse for LLM discovery to be useful.
    pub fn is_cold_start(&self) -> bool {
        self.tensions.len() < 3 && self.situations.is_empty()
    }

    /// Render the briefing as structured natural language for the LLM.
    pub fn format_prompt(&self) -> String {
        let mut out = String::with_capacity(4096);

        // Tensions
        let unmet: Vec<_> = self.tensions.iter().filter(|t| t.unmet).collect();
        let met: Vec<_> = self.tensions.iter().filter(|t| !t.unmet).collect();

        if !unmet.is_empty() {
            out.push_str("## UNMET TENSIONS (no response found)\n");
            for (i, t) in unmet.iter().enumerate() {
                let help = t.what_would_help.as_deref().unwrap_or("unknown");
                out.push_str(&format!(
                    "{}. [{}] \"{}\" — What would help: {}\n",
                    i + 1,
                    t.severity.to_uppercase(),
                    t.title,
                    help,
                ));
                out.push_str(&format!(
                    "   community attention: {} sources, {} corroborations, heat={:.1}\n",
                    t.source_diversity, t.corroboration_count, t.cause_heat,
                ));
            }
            out.push('\n');
        }

        if !met.is_empty() {
            out.push_str("## TENSIONS WITH RESPONSES (lower priority)\n");
            for (i, t) in met.iter().enumerate() {
                let help = t.what_would_help.as_deref().unwrap_or("unknown");
                out.push_str(&format!(
                    "{}. [{}] \"{}\" — What would help: {}\n",
                    i + 1,
                    t.severity.to_uppercase(),
                    t.title,
                    help,
                ));
                out.push_str(&format!(
                    "   community attention: {} sources, {} corroborations, heat={:.1}\n",
                    t.source_diversity, t.corroboration_count, t.cause_heat,
                ));
            }
            out.push('\n');
        }

        // Response shapes
        if !self.response_shapes.is_empty() {
            out.push_str("## RESPONSE SHAPE (what's missing from each tension's response)\n\n");
            out.push_str(
                "These tensions HAVE responses, but coverage may be uneven. Look for what's\n",
            );
            out.push_str(
                "MISSING — if a tension has legal aid but no housing help, search for housing.\n",
            );
            out.push_str("If it has events but no donation channels, search for giving.\n\n");
            for rs in &self.response_shapes {
                let help = rs.what_would_help.as_deref().unwrap_or("unknown");
                out.push_str(&format!(
                    "- \"{}\" (heat: {:.1})\n",
                    rs.title, rs.cause_heat,
                ));
                out.push_str(&format!("  What would help: {}\n", help));
                out.push_str(&format!(
                    "  Aids: {}, Gatherings: {}, Needs: {}\n",
                    rs.aid_count, rs.gathering_count, rs.need_count,
                ));
                if !rs.sample_titles.is_empty() {
                    let titles = rs
                        .sample_titles
                        .iter()
                        .map(|t| format!("\"{}\"", t))
                        .collect::<Vec<_>>()
                        .join(", ");
                    out.push_str(&format!("  Known: {}\n", titles));
                }
            }
            out.push('\n');
        }

        // Situation Landscape
        if !self.situations.is_empty() {
            out.push_str("## SITUATION LANDSCAPE\n");
            out.push_str("Living situations — causal groupings of signals around a root cause.\n");
            out.push_str("Fuzzy situations need more evidence. Hot situations may need response discovery.\n\n");
            for (i, s) in self.situations.iter().enumerate() {
                let loc = s.location_name.as_deref().unwrap_or("unknown location");
                out.push_str(&format!(
                    "{}. \"{}\" [{loc}]\n   arc={}, temp={:.2}, clarity={}, signals={}, tensions={}\n",
                    i + 1,
                    s.headline,
                    s.arc,
                    s.temperature,
                    s.clarity,
                    s.signal_count,
                    s.tension_count,
                ));
                if s.sensitivity == "SENSITIVE" || s.sensitivity == "RESTRICTED" {
                    out.push_str("   ⚠ SENSITIVE — handle with care in discovery\n");
                }
            }
            out.push('\n');
        }

        // Signal balance
        let sc = &self.signal_counts;
        out.push_str("## SIGNAL BALANCE\n");
        out.push_str(&format!(
            "Gatherings: {} | Aids: {} | Needs: {} | Notices: {} | Tensions: {}\n",
            sc.gatherings, sc.aids, sc.needs, sc.notices, sc.tensions,
        ));
        // Annotate significant imbalances
        let total = sc.gatherings + sc.aids + sc.needs + sc.notices + sc.tensions;
        if total > 5 {
            if sc.tensions > 0 && sc.aids < sc.tensions / 3 {
                out.push_str(
                    "→ Aid signals significantly underrepresented relative to tensions.\n",
                );
            }
            if sc.needs > 0 && sc.aids < sc.needs / 2 {
                out.push_str("→ Few Aid signals to match the Need signals.\n");
            }
        }
        out.push('\n');

        // Past discovery results
        if !self.successes.is_empty() || !self.failures.is_empty() {
            out.push_str("## PAST DISCOVERY RESULTS\n");
            if !self.successes.is_empty() {
                out.push_str("Worked well:\n");
                for s in &self.successes {
                    let reason = s.gap_context.as_deref().unwrap_or("unknown");
                    out.push_str(&format!(
                        "- \"{}\" → {} signals, weight {:.1} (reason: {})\n",
                        s.canonical_value, s.signals_produced, s.weight, reason,
                    ));
                }
            }
            if !self.failures.is_empty() {
                out.push_str("Didn't work:\n");
                for f in &self.failures {
                    let reason = f.gap_context.as_deref().unwrap_or("unknown");
                    out.push_str(&format!(
                        "- \"{}\" → {} signals, {} empty runs (reason: {})\n",
                        f.canonical_value, f.signals_produced, f.consecutive_empty_runs, reason,
                    ));
                }
            }
            out.push('\n');
        }

        // Strategy performance
        if !self.gap_type_stats.is_empty() {
            out.push_str("## STRATEGY PERFORMANCE\n");
            for g in &self.gap_type_stats {
                let pct = if g.total_sources > 0 {
                    (g.successful_sources as f64 / g.total_sources as f64 * 100.0) as u32
                } else {
                    0
                };
                out.push_str(&format!(
                    "- {}: {}/{} sources successful ({}%), avg weight {:.2}\n",
                    g.gap_type, g.successful_sources, g.total_sources, pct, g.avg_weight,
                ));
                if g.total_sources >= 5 && g.successful_sources == 0 {
                    out.push_str(&format!(
                        "→ WARNING: \"{}\" strategy has 0% success rate across {} attempts. Consider avoiding.\n",
                        g.gap_type, g.total_sources,
                    ));
                }
            }
            out.push('\n');
        }

        // Extraction yield
        if !self.extraction_yield.is_empty() {
            out.push_str("## EXTRACTION YIELD\n");
            for y in &self.extraction_yield {
                let survival_pct = if y.extracted > 0 {
                    (y.survived as f64 / y.extracted as f64 * 100.0) as u32
                } else {
                    0
                };
                out.push_str(&format!(
                    "- {}: {} extracted, {} survived ({}%), {} corroborated, {} contradicted\n",
                    y.source_label,
                    y.extracted,
                    y.survived,
                    survival_pct,
                    y.corroborated,
                    y.contradicted,
                ));
                if y.extracted >= 10 && survival_pct < 50 {
                    out.push_str(&format!(
                        "→ {} survival rate below 50% — signals from this source type are frequently reaped.\n",
                        y.source_label,
                    ));
                }
                let contradiction_pct = if y.extracted > 0 {
                    (y.contradicted as f64 / y.extracted as f64 * 100.0) as u32
                } else {
                    0
                };
                if y.extracted >= 10 && contradiction_pct >= 20 {
                    out.push_str(&format!(
                        "→ {} has high contradiction rate ({}%) — evidence frequently disputes these signals.\n",
                        y.source_label, contradiction_pct,
                    ));
                }
            }
            out.push('\n');
        }

        // Existing queries
        if !self.existing_queries.is_empty() {
            out.push_str("## EXISTING QUERIES (do not duplicate)\n");
            for q in &self.existing_queries {
                out.push_str(&format!("- {}\n", q));
            }
            out.push('\n');
        }

        out
    }
}

// --- LLM Structured Output Types ---

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DiscoveryPlan {
    #[serde(default, deserialize_with = "deserialize_queries")]
    pub queries: Vec<DiscoveryQuery>,
    /// Social media discovery topics (hashtags + search terms).
    /// Searched across Instagram, X/Twitter, TikTok, and GoFundMe.
    #[serde(default)]
    pub social_topics: Vec<SocialTopic>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SocialTopic {
    /// A hashtag or search term (plain text, no # prefix)
    pub topic: String,
    /// Why this topic — what gap it fills on social media
    pub reasoning: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DiscoveryQuery {
    /// The web search query
    pub query: String,
    /// Why this query — what gap it fills
    pub reasoning: String,
    /// Gap type: "unmet_tension", "low_type_diversity", "emerging_thread",
    /// "signal_imbalance", "novel_angle"
    pub gap_type: String,
    /// Related tension title, if applicable
    pub related_tension: Option<String>,
}

/// Handle LLM returning queries as either a proper JSON array, a stringified JSON array, or null.
fn deserialize_queries<'de, D>(deserializer: D) -> Result<Vec<DiscoveryQuery>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Array(_) => serde_json::from_value(value).map_err(de::Error::custom),
        serde_json::Value::String(ref s) => serde_json::from_str(s).map_err(de::Error::custom),
        serde_json::Value::Null => Ok(Vec::new()),
        _ => Err(de::Error::custom(
            "queries must be an array, JSON string, or null",
        )),
    }
}

// --- Initial weight by discovery method ---

/// Assign an initial weight to a new WebQuery source based on how it was created.
/// Higher weights mean more frequent scraping. Queries from methods with
/// historically higher yield get more budget.
pub fn initial_weight_for_method(method: DiscoveryMethod, gap_type: Option<&str>) -> f64 {
    match method {
        // Cold start: no signal data to guide us — moderate exploration weight
        DiscoveryMethod::Curated | DiscoveryMethod::HumanSubmission => 0.5,
        // Gap analysis targeting an unmet tension: high-value, community-driven
        DiscoveryMethod::GapAnalysis => match gap_type {
            Some(gt) if gt == "unmet_tension" => 0.4,
            _ => 0.3,
        },
        // Signal expansion: derived from existing signals, lower novelty
        DiscoveryMethod::SignalExpansion => 0.2,
        // Social graph follow: promoted from mentions, unproven
        DiscoveryMethod::SocialGraphFollow => 0.2,
        // Linked from a scraped page: speculative, unproven
        DiscoveryMethod::LinkedFrom => 0.25,
        // Everything else (HashtagDiscovery, SignalReference, etc.)
        _ => 0.3,
    }
}

// --- LLM Prompts ---

pub fn discovery_system_prompt(city_name: &str) -> String {
    format!(
        "You are the curiosity engine for an intelligence scout monitoring {city_name}.\n\
         \n\
         Your job: decide WHERE TO LOOK NEXT to fill gaps in what the scout knows.\n\
         \n\
         You receive a briefing about what the scout has learned — tensions without responses,\n\
         emerging situations, signal imbalances, and the track record of your past suggestions.\n\
         \n\
         Generate 3-7 targeted web search queries. Prioritize:\n\
         1. RESPONSE RESOURCES for unmet tensions (highest priority)\n\
         2. DEMAND SIGNALS — if tensions have few associated Needs, search for \
people expressing needs related to those tensions (GoFundMe campaigns, \
mutual aid requests, community forum posts, volunteer calls)\n\
         3. MISSING SIGNAL TYPES for situations with low type diversity\n\
         4. EMERGING THREADS that deserve deeper investigation\n\
         5. NOVEL ANGLES that existing sources aren't covering\n\
         \n\
         Query quality guidelines:\n\
         - Include \"{city_name}\" or neighborhood names — local results only\n\
         - Target organizations, programs, resources — not news articles about problems\n\
         - Avoid queries similar to ones that previously failed\n\
         - Be specific: \"affordable housing waitlist programs {city_name}\" not \"housing crisis\"\n\
         \n\
         ENGAGEMENT SIGNAL: Tensions with higher corroboration, source diversity, and\n\
         cause_heat are ones the community is actively discussing — prioritize these\n\
         for response-seeking queries. But ALWAYS reserve at least 2 queries for\n\
         low-engagement or novel tensions — early signals matter.\n\
         \n\
         For each query, explain your reasoning — why this search, what gap it fills.\n\
         \n\
         ## SOCIAL MEDIA DISCOVERY TOPICS\n\
         \n\
         Additionally, generate 2-5 social media discovery topics — hashtags and\n\
         search terms for finding INDIVIDUALS posting publicly about community\n\
         tensions on Instagram, X/Twitter, TikTok, and GoFundMe.\n\
         \n\
         Social topics should target:\n\
         - Individuals publicly advocating, volunteering, or organizing\n\
         - GoFundMe campaigns for community causes\n\
         - Hashtags used by local advocacy communities\n\
         - Search terms for mutual aid, donations, volunteer coordination\n\
         \n\
         Include \"{city_name}\" or state abbreviation. Examples:\n\
         - \"MNimmigration\" (Instagram hashtag)\n\
         - \"sanctuary city {city_name} volunteer\" (X/Twitter keyword)\n\
         - \"immigration legal aid Minnesota\" (GoFundMe search)\n\
         \n\
         Focus on PEOPLE, not organizations — individuals who chose to be\n\
         publicly visible. Organizations may be deliberately hidden.\n\
         \n\
         For each topic, explain your reasoning."
    )
}

fn discovery_user_prompt(city_name: &str, briefing: &str) -> String {
    format!(
        "Here is the current state of the {city_name} signal graph. Analyze the gaps \
         and generate discovery queries.\n\n{briefing}"
    )
}

// --- SourceFinder ---

/// Discovers new sources from existing graph data.
pub struct SourceFinder<'a> {
    graph: &'a GraphStore,
    region_slug: String,
    region_name: String,
    claude: Option<Claude>,
    budget: &'a BudgetTracker,
    embedder: Option<&'a dyn TextEmbedder>,
}

/// Cosine similarity threshold for embedding-based query dedup.
/// 0.90 catches near-identical reformulations while preserving
/// queries that target different aspects of the same tension.
const QUERY_DEDUP_SIMILARITY_THRESHOLD: f64 = 0.90;

impl<'a> SourceFinder<'a> {
    pub fn new(
        graph: &'a GraphStore,
        region_slug: &str,
        region_name: &str,
        anthropic_api_key: Option<&str>,
        budget: &'a BudgetTracker,
    ) -> Self {
        let claude = anthropic_api_key
            .filter(|k| !k.is_empty())
            .map(|k| Claude::new(k, HAIKU_MODEL));
        Self {
            graph,
            region_slug: region_slug.to_string(),
            region_name: region_name.to_string(),
            claude,
            budget,
            embedder: None,
        }
    }

    /// Set an embedder for semantic query deduplication.
    /// When set, new queries are embedded and checked against existing query
    /// embeddings before creation. Without an embedder, falls back to
    /// substring-based dedup only.
    pub fn with_embedder(mut self, embedder: &'a dyn TextEmbedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Run all discovery triggers. Returns stats, social topics, and discovered sources.
    pub async fn run(&self) -> (SourceFinderStats, Vec<String>, Vec<SourceNode>) {
        let mut stats = SourceFinderStats::default();
        let mut social_topics = Vec::new();
        let mut sources = Vec::new();

        // 1. Actor-mentioned sources — actors with domains/URLs that aren't tracked
        self.discover_from_actors(&mut stats, &mut sources).await;

        // 2. LLM-driven curiosity engine (with mechanical fallback)
        self.discover_from_curiosity(&mut stats, &mut social_topics, &mut sources)
            .await;

        if stats.actor_sources + stats.link_sources + stats.gap_sources > 0 {
            info!("{stats}");
        }

        if !social_topics.is_empty() {
            info!(
                count = social_topics.len(),
                "Social discovery topics generated"
            );
        }

        (stats, social_topics, sources)
    }

    /// Find actors with domains/URLs that aren't already tracked as sources.
    async fn discover_from_actors(
        &self,
        stats: &mut SourceFinderStats,
        sources: &mut Vec<SourceNode>,
    ) {
        let actors = match self
            .graph
            .get_actors_with_domains(Some(MAX_DISCOVERY_DEPTH))
            .await
        {
            Ok(a) => a,
            Err(e) => {
                warn!(error = %e, "Failed to get actors for discovery");
                return;
            }
        };

        let existing = match self.graph.get_active_sources().await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Failed to get existing sources for dedup");
                return;
            }
        };
        let existing_urls: HashSet<String> = existing
            .iter()
            .filter_map(|s| s.url.as_ref().cloned())
            .collect();
        let existing_keys: HashSet<String> =
            existing.iter().map(|s| s.canonical_key.clone()).collect();

        for (actor_name, domains, social_urls, dominant_role) in &actors {
            let source_role = SourceRole::from_str_loose(dominant_role);

            // Check each domain as a potential web source
            for domain in domains {
                let url = if domain.starts_with("http") {
                    domain.clone()
                } else {
                    format!("https://{domain}")
                };

                if existing_urls.contains(&url) {
                    stats.duplicates_skipped += 1;
                    continue;
                }

                let ck = canonical_value(&url);
                let cv = rootsignal_common::canonical_value(&url);
                if existing_keys.contains(&ck) {
                    stats.duplicates_skipped += 1;
                    continue;
                }

                let source = SourceNode::new(
                    ck,
                    cv,
                    Some(url.clone()),
                    DiscoveryMethod::SignalReference,
                    0.3,
                    source_role,
                    Some(format!("Actor: {actor_name}")),
                );
                stats.actor_sources += 1;
                info!(
                    actor = actor_name.as_str(),
                    url, "Discovered source from actor domain"
                );
                sources.push(source);
            }

            // Check social URLs as potential sources
            for social_url in social_urls {
                if existing_urls.contains(social_url) {
                    stats.duplicates_skipped += 1;
                    continue;
                }

                let ck = canonical_value(social_url);
                let cv = rootsignal_common::canonical_value(social_url);
                if existing_keys.contains(&ck) {
                    stats.duplicates_skipped += 1;
                    continue;
                }

                let source = SourceNode::new(
                    ck,
                    cv,
                    Some(social_url.clone()),
                    DiscoveryMethod::SignalReference,
                    0.3,
                    source_role,
                    Some(format!("Actor: {actor_name}")),
                );
                stats.actor_sources += 1;
                info!(
                    actor = actor_name.as_str(),
                    url = social_url.as_str(),
                    "Discovered source from actor social"
                );
                sources.push(source);
            }
        }
    }

    /// LLM-driven curiosity engine with mechanical fallback.
    async fn discover_from_curiosity(
        &self,
        stats: &mut SourceFinderStats,
        social_topics: &mut Vec<String>,
        sources: &mut Vec<SourceNode>,
    ) {
        // Guard: no Claude client → mechanical fallback
        let claude = match &self.claude {
            Some(c) => c,
            None => {
                self.discover_from_gaps_mechanical(stats, social_topics, sources)
                    .await;
                return;
            }
        };

        // Guard: no budget → mechanical fallback
        if self.budget.is_active()
            && !self
                .budget
                .has_budget(OperationCost::CLAUDE_HAIKU_DISCOVERY)
        {
            info!("Skipping LLM discovery (budget exhausted), falling back to mechanical");
            self.discover_from_gaps_mechanical(stats, social_topics, sources)
                .await;
            return;
        }

        // Build briefing from graph queries
        let briefing = match self.build_briefing().await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "Failed to build discovery briefing, falling back to mechanical");
                self.discover_from_gaps_mechanical(stats, social_topics, sources)
                    .await;
                return;
            }
        };

        // Cold-start check
        if briefing.is_cold_start() {
            info!("Cold start detected (< 3 tensions, 0 situations), using mechanical discovery");
            self.discover_from_gaps_mechanical(stats, social_topics, sources)
                .await;
            return;
        }

        // LLM call
        let formatted = briefing.format_prompt();
        let system = discovery_system_prompt(&self.region_name);
        let user = discovery_user_prompt(&self.region_name, &formatted);

        let plan: DiscoveryPlan = match claude.extract(&system, &user).await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "LLM discovery failed, falling back to mechanical");
                self.discover_from_gaps_mechanical(stats, social_topics, sources)
                    .await;
                return;
            }
        };

        // Record budget spend after successful response
        self.budget.spend(OperationCost::CLAUDE_HAIKU_DISCOVERY);

        // Extract social topics from plan (for topic discovery pipeline)
        const MAX_SOCIAL_TOPICS: usize = 8;
        for st in plan.social_topics.iter().take(MAX_SOCIAL_TOPICS) {
            info!(
                topic = st.topic.as_str(),
                reasoning = st.reasoning.as_str(),
                "LLM discovery: social topic"
            );
            social_topics.push(st.topic.clone());
        }

        // Create sources from plan
        let existing_queries: HashSet<String> = briefing
            .existing_queries
            .iter()
            .map(|q| q.to_lowercase())
            .collect();

        for dq in plan.queries.into_iter().take(MAX_CURIOSITY_QUERIES) {
            let query_lower = dq.query.to_lowercase();

            // Dedup layer 1: substring overlap with existing queries
            let is_dup = existing_queries
                .iter()
                .any(|q| q.contains(&query_lower) || query_lower.contains(q.as_str()));
            if is_dup {
                stats.duplicates_skipped += 1;
                continue;
            }

            // Dedup layer 2: embedding similarity against indexed query embeddings
            if let Some(embedder) = self.embedder {
                match embedder.embed(&dq.query).await {
                    Ok(embedding) => {
                        match self
                            .graph
                            .find_similar_query(&embedding, QUERY_DEDUP_SIMILARITY_THRESHOLD)
                            .await
                        {
                            Ok(Some((existing_ck, sim))) => {
                                info!(
                                    query = dq.query.as_str(),
                                    existing_key = existing_ck.as_str(),
                                    similarity = format!("{sim:.3}").as_str(),
                                    "Skipping semantically duplicate query"
                                );
                                stats.duplicates_skipped += 1;
                                continue;
                            }
                            Ok(None) => {
                                // Not a duplicate — we'll store the embedding after creation
                            }
                            Err(e) => {
                                warn!(error = %e, "Query embedding dedup check failed, proceeding");
                            }
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Query embedding failed, skipping dedup check");
                    }
                }
            }

            let cv = dq.query.clone();
            let ck = canonical_value(&cv);

            let gap_context = format!(
                "Curiosity: {} | Gap: {} | Related: {}",
                dq.reasoning,
                dq.gap_type,
                dq.related_tension.as_deref().unwrap_or("none"),
            );

            // Assign source role based on gap type:
            // - unmet_tension: seeking responses TO a tension → Response
            // - signal_imbalance: depends on what's underrepresented, default Mixed
            // - everything else: Mixed
            let source_role = match dq.gap_type.as_str() {
                "unmet_tension" => SourceRole::Response,
                _ => SourceRole::Mixed,
            };

            let weight =
                initial_weight_for_method(DiscoveryMethod::GapAnalysis, Some(dq.gap_type.as_str()));

            let source = SourceNode::new(
                ck.clone(),
                cv,
                None,
                DiscoveryMethod::GapAnalysis,
                weight,
                source_role,
                Some(gap_context),
            );
            stats.gap_sources += 1;
            info!(
                query = dq.query.as_str(),
                reasoning = dq.reasoning.as_str(),
                gap_type = dq.gap_type.as_str(),
                weight,
                "LLM discovery: created query source"
            );
            sources.push(source);
            // Store query embedding so future runs can dedup against it
            if let Some(embedder) = self.embedder {
                if let Ok(embedding) = embedder.embed(&dq.query).await {
                    if let Err(e) = self.graph.set_query_embedding(&ck, &embedding).await {
                        warn!(error = %e, "Failed to store query embedding (non-fatal)");
                    }
                }
            }
        }
    }

    /// Build a DiscoveryBriefing from graph queries.
    async fn build_briefing(&self) -> anyhow::Result<DiscoveryBriefing> {
        let tensions = self
            .graph
            .get_unmet_tensions(10)
            .await
            .map_err(|e| anyhow::anyhow!("get_unmet_tensions: {e}"))?;

        let situations = self
            .graph
            .get_situation_landscape(10)
            .await
            .map_err(|e| anyhow::anyhow!("get_situation_landscape: {e}"))?;

        let signal_counts = self
            .graph
            .get_signal_type_counts()
            .await
            .map_err(|e| anyhow::anyhow!("get_signal_type_counts: {e}"))?;

        let (successes, failures) = self
            .graph
            .get_discovery_performance()
            .await
            .map_err(|e| anyhow::anyhow!("get_discovery_performance: {e}"))?;

        let gap_type_stats = self
            .graph
            .get_gap_type_stats()
            .await
            .map_err(|e| anyhow::anyhow!("get_gap_type_stats: {e}"))?;

        let extraction_yield = self
            .graph
            .get_extraction_yield()
            .await
            .map_err(|e| anyhow::anyhow!("get_extraction_yield: {e}"))?;

        let response_shapes = self
            .graph
            .get_tension_response_shape(10)
            .await
            .map_err(|e| anyhow::anyhow!("get_tension_response_shape: {e}"))?;

        // Get existing WebQuery sources for dedup
        let existing = self
            .graph
            .get_active_sources()
            .await
            .map_err(|e| anyhow::anyhow!("get_active_sources: {e}"))?;
        let existing_queries: Vec<String> = existing
            .iter()
            .filter(|s| is_web_query(&s.canonical_value))
            .map(|s| s.canonical_value.clone())
            .collect();

        Ok(DiscoveryBriefing {
            tensions,
            situations,
            signal_counts,
            successes,
            failures,
            existing_queries,
            region_name: self.region_name.clone(),
            gap_type_stats,
            extraction_yield,
            response_shapes,
        })
    }

    /// Mechanical template-based gap analysis — the original discovery method.
    /// Used as fallback when LLM is unavailable, budget is exhausted, or on cold start.
    ///
    /// Sorts tensions by engagement score (corroboration + source_diversity + cause_heat)
    /// so high-engagement tensions fill early query slots — but all tensions are eligible.
    async fn discover_from_gaps_mechanical(
        &self,
        stats: &mut SourceFinderStats,
        social_topics: &mut Vec<String>,
        sources: &mut Vec<SourceNode>,
    ) {
        // Get tensions with engagement data, sorted by engagement within unmet-first grouping
        let mut tensions = match self.graph.get_unmet_tensions(20).await {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "Failed to get tensions for gap analysis");
                return;
            }
        };

        if tensions.is_empty() {
            return;
        }

        // Stable-sort by engagement score descending (preserves unmet-first from query)
        tensions.sort_by(|a, b| {
            let score_a =
                a.corroboration_count as f64 + a.source_diversity as f64 + a.cause_heat * 10.0;
            let score_b =
                b.corroboration_count as f64 + b.source_diversity as f64 + b.cause_heat * 10.0;
            score_b
                .partial_cmp(&score_a)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let existing = match self.graph.get_active_sources().await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Failed to get sources for gap analysis");
                return;
            }
        };

        let existing_queries: HashSet<String> = existing
            .iter()
            .filter(|s| is_web_query(&s.canonical_value))
            .map(|s| s.canonical_value.to_lowercase())
            .collect();

        let mut gap_count = 0u32;
        const MAX_GAP_QUERIES: u32 = 5;

        for t in &tensions {
            if gap_count >= MAX_GAP_QUERIES {
                break;
            }

            let help_text = t.what_would_help.as_deref().unwrap_or(&t.title);
            let query = format!("{} resources services {}", help_text, self.region_slug);
            let query_lower = query.to_lowercase();

            // Skip if we already have a similar query
            if existing_queries
                .iter()
                .any(|q| q.contains(&query_lower) || query_lower.contains(q.as_str()))
            {
                stats.duplicates_skipped += 1;
                continue;
            }

            let cv = query.clone();
            let ck = canonical_value(&cv);

            let weight =
                initial_weight_for_method(DiscoveryMethod::GapAnalysis, Some("unmet_tension"));

            let source = SourceNode::new(
                ck,
                cv,
                None,
                DiscoveryMethod::GapAnalysis,
                weight,
                // Mechanical gap queries seek responses to tensions
                SourceRole::Response,
                Some(format!("Tension: {}", t.title)),
            );
            gap_count += 1;
            stats.gap_sources += 1;
            info!(
                tension = t.title.as_str(),
                query = source.canonical_value.as_str(),
                "Created gap analysis query"
            );
            sources.push(source);
        }

        // Generate social topics from the same tensions — mechanical fallback parity
        const MAX_MECHANICAL_SOCIAL_TOPICS: usize = 3;
        for t in tensions.iter().take(MAX_MECHANICAL_SOCIAL_TOPICS) {
            let help_text = t.what_would_help.as_deref().unwrap_or(&t.title);
            social_topics.push(format!("{} {}", help_text, self.region_name));
        }
    }
}
