//! Analysis queries and their decoded results.

use std::fmt;

use orbitguard_api_client::{
    DensityPlan, Endpoint, PredictionReport, RiskReport, SatelliteDetail, SatelliteList,
    TransportError, TransportReply,
};
use serde_json::{Map, Value, json};

use crate::error::ApplicationError;
use crate::gate::GatedFeature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    List,
    Filter,
    RiskCheck,
    Predict,
    Plan,
    Detail,
}

impl QueryKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Filter => "filter",
            Self::RiskCheck => "risk_check",
            Self::Predict => "predict",
            Self::Plan => "plan",
            Self::Detail => "detail",
        }
    }

    #[must_use]
    pub fn endpoint(self) -> Endpoint {
        match self {
            Self::List => Endpoint::List,
            Self::Filter => Endpoint::Filter,
            Self::RiskCheck => Endpoint::RiskCheck,
            Self::Predict => Endpoint::Predict,
            Self::Plan => Endpoint::Plan,
            Self::Detail => Endpoint::Details,
        }
    }

    #[must_use]
    pub fn channel(self) -> Channel {
        match self {
            Self::Detail => Channel::Detail,
            _ => Channel::Primary,
        }
    }

    /// Region of the dashboard that owns this kind's results and errors.
    #[must_use]
    pub fn area(self) -> ResultArea {
        match self {
            Self::Plan => ResultArea::Visualization,
            Self::Detail => ResultArea::Detail,
            Self::List | Self::Filter | Self::RiskCheck | Self::Predict => ResultArea::Data,
        }
    }

    #[must_use]
    pub fn gated_feature(self) -> Option<GatedFeature> {
        match self {
            Self::Predict => Some(GatedFeature::Predict),
            Self::Plan => Some(GatedFeature::Plan),
            _ => None,
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Primary,
    Detail,
}

impl Channel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Detail => "detail",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultArea {
    Data,
    Visualization,
    Detail,
}

impl ResultArea {
    #[must_use]
    pub fn pending_text(self) -> &'static str {
        match self {
            Self::Data => "Fetching from Server...",
            Self::Visualization => "Analyzing Data...",
            Self::Detail => "Fetching mission data...",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryParams {
    List,
    Filter {
        min_alt_km: f64,
        max_alt_km: f64,
    },
    RiskCheck {
        target_alt_km: f64,
        tolerance_km: f64,
    },
    Predict {
        duration_days: u32,
        step_minutes: u32,
        threshold_km: f64,
    },
    Plan {
        target_alt_km: f64,
    },
    Detail {
        norad_id: u64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub params: QueryParams,
    pub origin_label: String,
}

impl QueryRequest {
    pub fn new(params: QueryParams, origin_label: impl Into<String>) -> Self {
        Self {
            params,
            origin_label: origin_label.into(),
        }
    }

    #[must_use]
    pub fn list() -> Self {
        Self::new(QueryParams::List, "List All Satellites")
    }

    #[must_use]
    pub fn filter(min_alt_km: f64, max_alt_km: f64) -> Self {
        Self::new(
            QueryParams::Filter {
                min_alt_km,
                max_alt_km,
            },
            format!("Filter: {min_alt_km}-{max_alt_km}km"),
        )
    }

    #[must_use]
    pub fn risk_check(target_alt_km: f64, tolerance_km: f64) -> Self {
        Self::new(
            QueryParams::RiskCheck {
                target_alt_km,
                tolerance_km,
            },
            "Collision Risk Check",
        )
    }

    #[must_use]
    pub fn predict(duration_days: u32, step_minutes: u32, threshold_km: f64) -> Self {
        Self::new(
            QueryParams::Predict {
                duration_days,
                step_minutes,
                threshold_km,
            },
            "Collision Prediction",
        )
    }

    #[must_use]
    pub fn plan(target_alt_km: f64) -> Self {
        Self::new(QueryParams::Plan { target_alt_km }, "Safe Path Planner")
    }

    /// `name` is the display name the lookup was opened from.
    pub fn detail(norad_id: u64, name: impl Into<String>) -> Self {
        Self::new(QueryParams::Detail { norad_id }, name)
    }

    #[must_use]
    pub fn kind(&self) -> QueryKind {
        match self.params {
            QueryParams::List => QueryKind::List,
            QueryParams::Filter { .. } => QueryKind::Filter,
            QueryParams::RiskCheck { .. } => QueryKind::RiskCheck,
            QueryParams::Predict { .. } => QueryKind::Predict,
            QueryParams::Plan { .. } => QueryKind::Plan,
            QueryParams::Detail { .. } => QueryKind::Detail,
        }
    }

    /// Kind-specific body fields, before credentials are merged in.
    #[must_use]
    pub fn parameters(&self) -> Map<String, Value> {
        let value = match self.params {
            QueryParams::List => json!({}),
            QueryParams::Filter {
                min_alt_km,
                max_alt_km,
            } => json!({ "min_alt": min_alt_km, "max_alt": max_alt_km }),
            QueryParams::RiskCheck {
                target_alt_km,
                tolerance_km,
            } => json!({ "target_alt": target_alt_km, "tolerance": tolerance_km }),
            QueryParams::Predict {
                duration_days,
                step_minutes,
                threshold_km,
            } => json!({
                "duration": duration_days,
                "step": step_minutes,
                "threshold": threshold_km,
            }),
            QueryParams::Plan { target_alt_km } => json!({ "target_alt": target_alt_km }),
            QueryParams::Detail { norad_id } => json!({ "norad_id": norad_id }),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// Payload of a completed query, or the service's in-band error for it.
pub type Reply<T> = Result<T, ApplicationError>;

#[derive(Debug, Clone, PartialEq)]
pub struct DetailResult {
    pub norad_id: u64,
    pub name: String,
    pub reply: Reply<SatelliteDetail>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    List {
        title: String,
        reply: Reply<SatelliteList>,
    },
    Filter {
        title: String,
        reply: Reply<SatelliteList>,
    },
    RiskCheck {
        target_alt_km: f64,
        tolerance_km: f64,
        reply: Reply<RiskReport>,
    },
    Predict {
        reply: Reply<PredictionReport>,
    },
    Plan {
        target_alt_km: f64,
        reply: Reply<DensityPlan>,
    },
    Detail(DetailResult),
}

impl QueryResult {
    #[must_use]
    pub fn kind(&self) -> QueryKind {
        match self {
            Self::List { .. } => QueryKind::List,
            Self::Filter { .. } => QueryKind::Filter,
            Self::RiskCheck { .. } => QueryKind::RiskCheck,
            Self::Predict { .. } => QueryKind::Predict,
            Self::Plan { .. } => QueryKind::Plan,
            Self::Detail(_) => QueryKind::Detail,
        }
    }

    #[must_use]
    pub fn is_application_error(&self) -> bool {
        match self {
            Self::List { reply, .. } | Self::Filter { reply, .. } => reply.is_err(),
            Self::RiskCheck { reply, .. } => reply.is_err(),
            Self::Predict { reply } => reply.is_err(),
            Self::Plan { reply, .. } => reply.is_err(),
            Self::Detail(detail) => detail.reply.is_err(),
        }
    }

    /// Decodes a successful reply into the variant for `request`. The
    /// request's own parameters travel along for labelling.
    pub fn decode(request: &QueryRequest, reply: &TransportReply) -> Result<Self, TransportError> {
        let title = request.origin_label.clone();
        Ok(match request.params {
            QueryParams::List => Self::List {
                title,
                reply: decode_reply(reply)?,
            },
            QueryParams::Filter { .. } => Self::Filter {
                title,
                reply: decode_reply(reply)?,
            },
            QueryParams::RiskCheck {
                target_alt_km,
                tolerance_km,
            } => Self::RiskCheck {
                target_alt_km,
                tolerance_km,
                reply: decode_reply(reply)?,
            },
            QueryParams::Predict { .. } => Self::Predict {
                reply: decode_reply(reply)?,
            },
            QueryParams::Plan { target_alt_km } => Self::Plan {
                target_alt_km,
                reply: decode_reply(reply)?,
            },
            QueryParams::Detail { norad_id } => Self::Detail(DetailResult {
                norad_id,
                name: title,
                reply: decode_reply(reply)?,
            }),
        })
    }
}

fn decode_reply<T>(reply: &TransportReply) -> Result<Reply<T>, TransportError>
where
    T: serde::de::DeserializeOwned,
{
    if let Some(message) = reply.error_message() {
        return Ok(Err(ApplicationError::new(message)));
    }
    reply.decode::<T>().map(Ok)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandRole {
    Target,
    Recommended,
    Normal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DensityBar {
    pub label: String,
    pub object_count: u64,
    pub role: BandRole,
}

/// One bar per altitude band; the requested band wins over the recommended
/// one when they coincide.
#[must_use]
pub fn density_bars(plan: &DensityPlan) -> Vec<DensityBar> {
    plan.analysis
        .iter()
        .map(|bin| {
            let role = if bin.is_target_bin {
                BandRole::Target
            } else if (bin.alt_start_km - plan.recommendation.safe_alt_start_km).abs()
                < f64::EPSILON
            {
                BandRole::Recommended
            } else {
                BandRole::Normal
            };
            DensityBar {
                label: format!("{}-{}", bin.alt_start_km, bin.alt_end_km),
                object_count: bin.object_count,
                role,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use orbitguard_api_client::{DensityBin, SafeBand};

    use super::*;

    #[test]
    fn kinds_map_to_channels_areas_and_gates() {
        assert_eq!(QueryKind::Plan.area(), ResultArea::Visualization);
        assert_eq!(QueryKind::RiskCheck.area(), ResultArea::Data);
        assert_eq!(QueryKind::Detail.channel(), Channel::Detail);
        assert_eq!(QueryKind::Predict.channel(), Channel::Primary);
        assert_eq!(
            QueryKind::Predict.gated_feature(),
            Some(GatedFeature::Predict)
        );
        assert_eq!(QueryKind::Filter.gated_feature(), None);
        assert_eq!(QueryKind::Detail.endpoint(), Endpoint::Details);
    }

    #[test]
    fn parameters_use_service_field_names() {
        let risk = QueryRequest::risk_check(550.0, 10.0);
        assert_eq!(
            Value::Object(risk.parameters()),
            json!({"target_alt": 550.0, "tolerance": 10.0})
        );

        let predict = QueryRequest::predict(3, 10, 5.0);
        assert_eq!(
            Value::Object(predict.parameters()),
            json!({"duration": 3, "step": 10, "threshold": 5.0})
        );

        assert!(QueryRequest::list().parameters().is_empty());
        assert_eq!(
            QueryRequest::filter(400.0, 600.0).origin_label,
            "Filter: 400-600km"
        );
    }

    #[test]
    fn error_field_decodes_as_application_error() {
        let request = QueryRequest::plan(550.0);
        let reply = TransportReply::json(
            200,
            &json!({"error": "This is a Pro feature. Please upgrade your plan."}),
        );
        let result = QueryResult::decode(&request, &reply).expect("decoded");
        assert!(result.is_application_error());
        assert_eq!(
            result,
            QueryResult::Plan {
                target_alt_km: 550.0,
                reply: Err(ApplicationError::new(
                    "This is a Pro feature. Please upgrade your plan."
                )),
            }
        );
    }

    #[test]
    fn malformed_payload_is_a_decode_failure() {
        let request = QueryRequest::predict(1, 5, 2.0);
        let reply = TransportReply::json(200, &json!({"events": "soon"}));
        assert!(matches!(
            QueryResult::decode(&request, &reply),
            Err(TransportError::Decode { .. })
        ));
    }

    #[test]
    fn density_bars_mark_target_and_recommendation() {
        let plan = DensityPlan {
            analysis: vec![
                DensityBin {
                    alt_start_km: 540.0,
                    alt_end_km: 560.0,
                    object_count: 812,
                    is_target_bin: true,
                },
                DensityBin {
                    alt_start_km: 560.0,
                    alt_end_km: 580.0,
                    object_count: 40,
                    is_target_bin: false,
                },
                DensityBin {
                    alt_start_km: 580.0,
                    alt_end_km: 600.0,
                    object_count: 3,
                    is_target_bin: false,
                },
            ],
            recommendation: SafeBand {
                safe_alt_start_km: 580.0,
                safe_alt_end_km: 600.0,
                object_count: 3,
            },
        };
        let roles = density_bars(&plan)
            .into_iter()
            .map(|bar| (bar.label, bar.role))
            .collect::<Vec<_>>();
        assert_eq!(
            roles,
            vec![
                ("540-560".to_string(), BandRole::Target),
                ("560-580".to_string(), BandRole::Normal),
                ("580-600".to_string(), BandRole::Recommended),
            ]
        );
    }
}
