//! Score fusion.
//!
//! Combines the Tier A verdict, the optional Tier B score, and the lexical
//! heuristic bonus into one fused score in [0, 1].

use crate::classifier::ModerationVerdict;

/// Fused score plus the classifier detail payload that accompanies it into
/// escalation reports and the audit log.
#[derive(Debug, Clone)]
pub struct FusedScore {
    pub score: f64,
    pub details: serde_json::Value,
}

/// Fuse the classifier tiers and heuristic bonuses.
///
/// Tiers fuse by max — two independent detectors, believe the more alarmed
/// one. The two heuristic bonuses also fuse by max: they are the same
/// message in two spellings, so matches must not double-count.
pub fn fuse(
    tier_a: ModerationVerdict,
    tier_b: Option<f64>,
    bonus_translit: f64,
    bonus_norm: f64,
) -> FusedScore {
    let mut categories = tier_a.categories;
    let mut score = tier_a.violence_score;

    if let Some(b) = tier_b {
        score = score.max(b);
        if let Some(map) = categories.as_object_mut() {
            map.insert("tier_b_used".into(), serde_json::Value::Bool(true));
        }
    }

    score += bonus_translit.max(bonus_norm);

    FusedScore {
        score: score.clamp(0.0, 1.0),
        details: serde_json::json!({
            "violence_score": tier_a.violence_score,
            "categories": categories,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(score: f64) -> ModerationVerdict {
        ModerationVerdict {
            violence_score: score,
            categories: serde_json::json!({ "violence": score > 0.5 }),
        }
    }

    #[test]
    fn tier_b_absent_leaves_tier_a_plus_bonus() {
        let fused = fuse(verdict(0.5), None, 0.07, 0.0);
        assert!((fused.score - 0.57).abs() < 1e-9);
        assert!(fused.details["categories"].get("tier_b_used").is_none());
    }

    #[test]
    fn tier_b_fuses_by_max_and_marks_categories() {
        let fused = fuse(verdict(0.3), Some(0.8), 0.0, 0.0);
        assert_eq!(fused.score, 0.8);
        assert_eq!(fused.details["categories"]["tier_b_used"], true);

        // Tier A wins when larger; the marker is still set.
        let fused = fuse(verdict(0.9), Some(0.2), 0.0, 0.0);
        assert_eq!(fused.score, 0.9);
        assert_eq!(fused.details["categories"]["tier_b_used"], true);
    }

    #[test]
    fn heuristic_bonuses_fuse_by_max_not_sum() {
        // Transliterated form matches 2 patterns, normalized form 1.
        let fused = fuse(verdict(0.0), None, 0.14, 0.07);
        assert!((fused.score - 0.14).abs() < 1e-9);
    }

    #[test]
    fn fused_score_is_clamped_to_one() {
        let fused = fuse(verdict(0.95), Some(0.99), 0.2, 0.14);
        assert_eq!(fused.score, 1.0);
    }

    #[test]
    fn fused_score_stays_in_unit_interval() {
        for a in [0.0, 0.3, 0.97, 1.0] {
            for b in [None, Some(0.0), Some(1.0)] {
                for bonus in [0.0, 0.07, 0.2] {
                    let fused = fuse(verdict(a), b, bonus, 0.0);
                    assert!((0.0..=1.0).contains(&fused.score));
                }
            }
        }
    }

    #[test]
    fn details_keep_raw_tier_a_score() {
        let fused = fuse(verdict(0.4), Some(0.9), 0.0, 0.0);
        assert_eq!(fused.details["violence_score"], 0.4);
        assert_eq!(fused.score, 0.9);
    }
}
