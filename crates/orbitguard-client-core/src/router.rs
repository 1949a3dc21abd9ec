//! Dispatch of settled results to the rendering surface.

use std::fmt;

use orbitguard_api_client::{DensityPlan, PredictionReport, RiskReport, SatelliteList};

use crate::account::ApiKeyGrant;
use crate::error::ClientError;
use crate::gate::{FeatureGate, GatedFeature, UpgradeView};
use crate::query::{DetailResult, QueryResult, Reply, ResultArea};

pub const SESSION_EXPIRED_NOTICE: &str = "Your session has expired. Please log in again.";
pub const UPGRADE_SUCCEEDED_NOTICE: &str =
    "Upgrade successful! All Pro features are now unlocked.";
pub const DOWNGRADE_UNAVAILABLE_NOTICE: &str =
    "Functionality to downgrade to the free plan is not yet implemented in the backend.";

/// One-off messages that do not belong to a result area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    SessionExpired,
    UpgradeSucceeded,
    UpgradeFailed { message: String },
    DowngradeUnavailable,
    ApiKeyFailed { message: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionExpired => f.write_str(SESSION_EXPIRED_NOTICE),
            Self::UpgradeSucceeded => f.write_str(UPGRADE_SUCCEEDED_NOTICE),
            Self::UpgradeFailed { message } => write!(f, "Upgrade failed: {message}"),
            Self::DowngradeUnavailable => f.write_str(DOWNGRADE_UNAVAILABLE_NOTICE),
            Self::ApiKeyFailed { message } => write!(f, "Error generating key: {message}"),
        }
    }
}

/// The presentation surface. Every method is a side effect on the UI; the
/// core never inspects what a renderer does with it.
pub trait DashboardRenderer: Send + Sync {
    /// Resets `area` and shows it as waiting on `label`.
    fn show_pending(&self, area: ResultArea, label: &str);
    fn render_satellites(&self, title: &str, reply: &Reply<SatelliteList>);
    fn render_risks(&self, target_alt_km: f64, tolerance_km: f64, reply: &Reply<RiskReport>);
    fn render_predictions(&self, reply: &Reply<PredictionReport>);
    fn render_density_plan(&self, target_alt_km: f64, reply: &Reply<DensityPlan>);
    fn render_detail(&self, detail: &DetailResult);
    fn render_failure(&self, area: ResultArea, error: &ClientError);
    fn render_refusal(&self, feature: GatedFeature);
    fn apply_feature_gate(&self, gate: &FeatureGate, upgrade: &UpgradeView);
    fn notify(&self, notice: &Notice);
    /// Control has moved to the login flow; nothing else on the dashboard
    /// is usable until a session exists again.
    fn require_authentication(&self);
    fn render_api_key(&self, grant: &ApiKeyGrant);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseRouter;

impl ResponseRouter {
    /// Invokes exactly one renderer for `result` and reports the area it
    /// landed in.
    pub fn route(&self, result: &QueryResult, renderer: &dyn DashboardRenderer) -> ResultArea {
        match result {
            QueryResult::List { title, reply } | QueryResult::Filter { title, reply } => {
                renderer.render_satellites(title, reply);
            }
            QueryResult::RiskCheck {
                target_alt_km,
                tolerance_km,
                reply,
            } => renderer.render_risks(*target_alt_km, *tolerance_km, reply),
            QueryResult::Predict { reply } => renderer.render_predictions(reply),
            QueryResult::Plan {
                target_alt_km,
                reply,
            } => renderer.render_density_plan(*target_alt_km, reply),
            QueryResult::Detail(detail) => renderer.render_detail(detail),
        }
        result.kind().area()
    }
}
