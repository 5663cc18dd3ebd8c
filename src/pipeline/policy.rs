//! Threshold action policy.

use crate::config::Config;
use crate::pipeline::types::PolicyAction;

/// Map a fused score to an intended action.
///
/// Thresholds are checked in descending order, so a score sitting exactly
/// on the auto-ban threshold never falls through to escalation. Auto-ban
/// requires its feature flag; with the flag off, ban-worthy scores take the
/// escalate branch instead.
pub fn decide(score: f64, config: &Config) -> Option<PolicyAction> {
    if score >= config.thresh_auto_ban && config.auto_ban {
        Some(PolicyAction::AutoBan)
    } else if score >= config.thresh_escalate {
        Some(PolicyAction::Escalate)
    } else if score >= config.thresh_temp_mute {
        Some(PolicyAction::WarnAndTimeout)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_auto_ban(auto_ban: bool) -> Config {
        Config {
            auto_ban,
            ..Config::default()
        }
    }

    #[test]
    fn below_all_thresholds_is_no_action() {
        let config = config_with_auto_ban(true);
        assert_eq!(decide(0.0, &config), None);
        assert_eq!(decide(0.64, &config), None);
    }

    #[test]
    fn mute_band_yields_warn_and_timeout() {
        let config = config_with_auto_ban(false);
        assert_eq!(decide(0.65, &config), Some(PolicyAction::WarnAndTimeout));
        assert_eq!(decide(0.70, &config), Some(PolicyAction::WarnAndTimeout));
        assert_eq!(decide(0.84, &config), Some(PolicyAction::WarnAndTimeout));
    }

    #[test]
    fn escalate_band() {
        let config = config_with_auto_ban(false);
        assert_eq!(decide(0.85, &config), Some(PolicyAction::Escalate));
        assert_eq!(decide(0.90, &config), Some(PolicyAction::Escalate));
    }

    #[test]
    fn exact_auto_ban_threshold_does_not_fall_through() {
        let config = config_with_auto_ban(true);
        assert_eq!(decide(0.95, &config), Some(PolicyAction::AutoBan));
        assert_eq!(decide(1.0, &config), Some(PolicyAction::AutoBan));
    }

    #[test]
    fn auto_ban_disabled_degrades_to_escalate() {
        let config = config_with_auto_ban(false);
        assert_eq!(decide(0.95, &config), Some(PolicyAction::Escalate));
        assert_eq!(decide(1.0, &config), Some(PolicyAction::Escalate));
    }

    #[test]
    fn custom_thresholds_are_respected() {
        let config = Config {
            thresh_temp_mute: 0.3,
            thresh_escalate: 0.5,
            thresh_auto_ban: 0.7,
            auto_ban: true,
            ..Config::default()
        };
        assert_eq!(decide(0.29, &config), None);
        assert_eq!(decide(0.3, &config), Some(PolicyAction::WarnAndTimeout));
        assert_eq!(decide(0.5, &config), Some(PolicyAction::Escalate));
        assert_eq!(decide(0.7, &config), Some(PolicyAction::AutoBan));
    }
}
