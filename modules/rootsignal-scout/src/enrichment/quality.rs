use rootsignal_common::{ExtractionQuality, GeoAccuracy, Node};

/// Compute extraction quality for a signal node.
pub fn score(node: &Node) -> ExtractionQuality {
    let meta = match node.meta() {
        Some(m) => m,
        None => {
            return ExtractionQuality {
                actionable: false,
                has_location: false,
                has_action_url: false,
                has_timing: false,

                geo_accuracy: GeoAccuracy::Low,
                completeness: 0.0,
                confidence: 0.0,
            };
        }
    };

    let has_location = meta.location.is_some();
    let geo_accuracy = match meta.location {
        Some(ref loc) => match loc.precision {
            rootsignal_common::GeoPrecision::Exact => GeoAccuracy::High,
            rootsignal_common::GeoPrecision::Neighborhood => GeoAccuracy::Medium,
            _ => GeoAccuracy::Low,
        },
        None => GeoAccuracy::Low,
    };

    let (has_action_url, has_timing) = match node {
        Node::Gathering(e) => {
            let has_real_url = !e.action_url.is_empty() && e.action_url != meta.source_url;
            let has_real_timing = e.starts_at.is_some();
            (has_real_url, has_real_timing)
        }
        Node::Aid(g) => (!g.action_url.is_empty(), g.is_ongoing),
        Node::Need(a) => (a.action_url.is_some(), false),
        Node::Notice(_) => (false, false),
        Node::Tension(_) => (false, false),
        Node::Evidence(_) => (false, false),
    };

    let actionable = matches!(node, Node::Notice(_))
        || (has_action_url
            && (has_timing
                || matches!(node, Node::Aid(g) if g.is_ongoing)
                || matches!(node, Node::Need(_))));

    // Completeness: fraction of *applicable* optional fields populated.
    // Always-present fields (title, summary, signal_type) are prerequisites, not differentiators.
    // Denominator varies by node type so Notice/Tension aren't penalized for fields they can't have.
    let (optional_filled, optional_total) = match node {
        Node::Gathering(_) => {
            // location, action_url, timing
            let filled = has_location as u8 + has_action_url as u8 + has_timing as u8;
            (filled, 3u8)
        }
        Node::Aid(_) => {
            // location, action_url, is_ongoing
            let filled = has_location as u8 + has_action_url as u8 + has_timing as u8;
            (filled, 3)
        }
        Node::Need(_) => {
            // location, action_url
            let filled = has_location as u8 + has_action_url as u8;
            (filled, 2)
        }
        Node::Notice(_) | Node::Tension(_) => {
            // location only
            (has_location as u8, 1)
        }
        Node::Evidence(_) => (0, 0),
    };
    let completeness = if optional_total > 0 {
        optional_filled as f32 / optional_total as f32
    } else {
        0.0
    };

    // Confidence: completeness and geo quality, equally weighted.
    // Freshness is always 1.0 at extraction time (no discrimination), so it's excluded here.
    // Apply freshness as a time-based decay multiplier separately if needed.
    let geo_score = match geo_accuracy {
        GeoAccuracy::High => 1.0_f32,
        GeoAccuracy::Medium => 0.7,
        GeoAccuracy::Low => 0.3,
    };
    let confidence = completeness * 0.5 + geo_score * 0.5;

    ExtractionQuality {
        actionable,
        has_location,
        has_action_url,
        has_timing,
        geo_accuracy,
        completeness,
        confidence: confidence.clamp(0.0, 1.0),
    }
}
