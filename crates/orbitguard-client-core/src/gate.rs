use std::fmt;

use orbitguard_api_client::SubscriptionTier;

use crate::error::ClientError;
use crate::session::Session;

pub const PRO_FEATURE_HINT: &str = "Upgrade to Pro to use this feature.";
pub const CURRENT_PLAN_LABEL: &str = "Your Current Version";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatedFeature {
    Predict,
    Plan,
    ManageApiKey,
}

impl GatedFeature {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Predict => "collision prediction",
            Self::Plan => "safe path planning",
            Self::ManageApiKey => "API key management",
        }
    }
}

impl fmt::Display for GatedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations the current tier may use. Always derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureGate {
    pub can_predict: bool,
    pub can_plan: bool,
    pub can_manage_api_key: bool,
}

#[must_use]
pub fn gate(tier: SubscriptionTier) -> FeatureGate {
    let pro = tier == SubscriptionTier::Pro;
    FeatureGate {
        can_predict: pro,
        can_plan: pro,
        can_manage_api_key: pro,
    }
}

impl FeatureGate {
    /// No session means nothing gated is available.
    #[must_use]
    pub fn for_session(session: Option<&Session>) -> Self {
        session.map_or_else(Self::default, |session| gate(session.tier()))
    }

    #[must_use]
    pub fn permits(self, feature: GatedFeature) -> bool {
        match feature {
            GatedFeature::Predict => self.can_predict,
            GatedFeature::Plan => self.can_plan,
            GatedFeature::ManageApiKey => self.can_manage_api_key,
        }
    }

    pub fn check(self, feature: GatedFeature) -> Result<(), ClientError> {
        if self.permits(feature) {
            Ok(())
        } else {
            Err(ClientError::Refused { feature })
        }
    }

    /// Control state for every gated affordance, in display order.
    #[must_use]
    pub fn affordances(self) -> [Affordance; 3] {
        [
            Affordance::for_feature(GatedFeature::Predict, self.can_predict),
            Affordance::for_feature(GatedFeature::Plan, self.can_plan),
            Affordance::for_feature(GatedFeature::ManageApiKey, self.can_manage_api_key),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordance {
    pub feature: GatedFeature,
    pub enabled: bool,
    pub hint: &'static str,
}

impl Affordance {
    fn for_feature(feature: GatedFeature, enabled: bool) -> Self {
        let hint = match (feature, enabled) {
            (GatedFeature::ManageApiKey, true) => "API Key",
            (GatedFeature::ManageApiKey, false) => "API Key (Pro Only)",
            (_, true) => "",
            (_, false) => PRO_FEATURE_HINT,
        };
        Self {
            feature,
            enabled,
            hint,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanOption {
    pub label: &'static str,
    pub enabled: bool,
}

/// Text for the plan comparison view. Display only; gating is done by
/// [`FeatureGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeView {
    pub current: SubscriptionTier,
    pub free_option: PlanOption,
    pub pro_option: PlanOption,
}

impl UpgradeView {
    #[must_use]
    pub fn for_tier(tier: SubscriptionTier) -> Self {
        let current = PlanOption {
            label: CURRENT_PLAN_LABEL,
            enabled: false,
        };
        match tier {
            SubscriptionTier::Pro => Self {
                current: tier,
                free_option: PlanOption {
                    label: "Switch to Free",
                    enabled: true,
                },
                pro_option: current,
            },
            SubscriptionTier::Free => Self {
                current: tier,
                free_option: current,
                pro_option: PlanOption {
                    label: "Get Pro",
                    enabled: true,
                },
            },
        }
    }
}
