//! Subscription gating for scheduled automation.

use shomer_core::SubscriptionGate;
use shomer_domain::{SubscriptionTier, UserAccount};

/// Gate that restricts automation to premium subscribers who have opted in.
#[derive(Debug, Default, Clone, Copy)]
pub struct TierGate;

impl SubscriptionGate for TierGate {
    fn is_eligible(&self, user: &UserAccount) -> bool {
        user.automation_enabled && user.tier == SubscriptionTier::Premium
    }
}

#[cfg(test)]
mod tests {
    use shomer_domain::{HideOffset, RestoreOffset, ScheduleMode};

    use super::*;

    fn user(tier: SubscriptionTier, automation_enabled: bool) -> UserAccount {
        UserAccount {
            id: "u1".into(),
            email: "u1@example.com".into(),
            tier,
            schedule_mode: ScheduleMode::Location("jerusalem".into()),
            hide_offset: HideOffset::AtEntry,
            restore_offset: RestoreOffset::AtExit,
            automation_enabled,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn premium_opted_in_is_eligible() {
        assert!(TierGate.is_eligible(&user(SubscriptionTier::Premium, true)));
    }

    #[test]
    fn free_tier_is_never_eligible() {
        assert!(!TierGate.is_eligible(&user(SubscriptionTier::Free, true)));
    }

    #[test]
    fn opt_out_disables_automation() {
        assert!(!TierGate.is_eligible(&user(SubscriptionTier::Premium, false)));
    }
}
