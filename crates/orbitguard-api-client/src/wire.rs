//! Request and response bodies exchanged with the analysis service.
//!
//! Every operation is a JSON `POST`. Replies are either the operation's
//! payload or an `{"error": "..."}` envelope, sometimes with a 2xx status.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,
    Signup,
    List,
    Filter,
    RiskCheck,
    Predict,
    Plan,
    Details,
    Upgrade,
    GenerateKey,
}

impl Endpoint {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Signup => "/signup",
            Self::List => "/list",
            Self::Filter => "/filter",
            Self::RiskCheck => "/risk",
            Self::Predict => "/predict",
            Self::Plan => "/plan",
            Self::Details => "/details",
            Self::Upgrade => "/upgrade",
            Self::GenerateKey => "/generate-key",
        }
    }

    /// Whether the body must carry `email` and `token`.
    #[must_use]
    pub fn requires_auth(self) -> bool {
        !matches!(self, Self::Login | Self::Signup)
    }
}

/// Subscription level. Anything the service reports other than `pro` is
/// treated as `free`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Pro,
}

impl SubscriptionTier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
        }
    }
}

impl From<String> for SubscriptionTier {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("pro") {
            Self::Pro
        } else {
            Self::Free
        }
    }
}

impl From<SubscriptionTier> for String {
    fn from(value: SubscriptionTier) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub plan: SubscriptionTier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthReply {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpgradeReply {
    pub user: UserProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiKeyReply {
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TrackedSatellite {
    pub name: String,
    pub altitude: f64,
    pub norad_id: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct SatelliteList {
    #[serde(default)]
    pub satellites: Vec<TrackedSatellite>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct RiskReport {
    #[serde(default)]
    pub risk_found: bool,
    #[serde(default)]
    pub risks: Vec<TrackedSatellite>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CloseApproach {
    pub object1_name: String,
    pub object2_name: String,
    pub min_distance_km: f64,
    pub time_from_now_hr: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct PredictionReport {
    #[serde(default)]
    pub events: Vec<CloseApproach>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DensityBin {
    pub alt_start_km: f64,
    pub alt_end_km: f64,
    pub object_count: u64,
    #[serde(default)]
    pub is_target_bin: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SafeBand {
    pub safe_alt_start_km: f64,
    pub safe_alt_end_km: f64,
    pub object_count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DensityPlan {
    pub analysis: Vec<DensityBin>,
    pub recommendation: SafeBand,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SatelliteDetail {
    pub official_name: String,
    pub launch_date: String,
    pub country: String,
    pub purpose: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}
