#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use orbitguard_api_client::{
    AnalysisTransport, DensityPlan, Endpoint, PredictionReport, RiskReport, SatelliteList,
    SubscriptionTier, TransportError, TransportReply, UserProfile,
};
use orbitguard_client_core::{
    ApiKeyGrant, ClientError, Dashboard, DashboardRenderer, DetailResult, FeatureGate,
    GatedFeature, MemorySessionStore, Notice, Reply, ResultArea, Session, UpgradeView,
};
use serde_json::Value;
use tokio::sync::oneshot;

type Responder = oneshot::Sender<Result<TransportReply, TransportError>>;

struct PendingCall {
    endpoint: Endpoint,
    body: Value,
    responder: Option<Responder>,
}

/// Transport whose replies are handed out by the test. Endpoints with a
/// canned reply settle immediately; everything else waits for `respond`.
#[derive(Default)]
pub struct ScriptedTransport {
    calls: Mutex<Vec<PendingCall>>,
    canned: Mutex<HashMap<Endpoint, Result<TransportReply, TransportError>>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn can(&self, endpoint: Endpoint, reply: Result<TransportReply, TransportError>) {
        self.canned
            .lock()
            .expect("canned lock")
            .insert(endpoint, reply);
    }

    pub fn can_json(&self, endpoint: Endpoint, status: u16, body: Value) {
        self.can(endpoint, Ok(TransportReply::json(status, &body)));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    pub fn calls(&self) -> Vec<(Endpoint, Value)> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|call| (call.endpoint, call.body.clone()))
            .collect()
    }

    pub async fn wait_for_calls(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.call_count() < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("transport call never arrived");
    }

    /// Settles call `index`. Returns false if its caller already went away.
    pub fn respond(&self, index: usize, status: u16, body: Value) -> bool {
        let responder = self.calls.lock().expect("calls lock")[index]
            .responder
            .take()
            .expect("call already answered");
        responder
            .send(Ok(TransportReply::json(status, &body)))
            .is_ok()
    }
}

#[async_trait]
impl AnalysisTransport for ScriptedTransport {
    async fn post(
        &self,
        endpoint: Endpoint,
        body: &Value,
    ) -> Result<TransportReply, TransportError> {
        let canned = self
            .canned
            .lock()
            .expect("canned lock")
            .get(&endpoint)
            .cloned();
        if let Some(reply) = canned {
            self.calls.lock().expect("calls lock").push(PendingCall {
                endpoint,
                body: body.clone(),
                responder: None,
            });
            return reply;
        }

        let (tx, rx) = oneshot::channel();
        self.calls.lock().expect("calls lock").push(PendingCall {
            endpoint,
            body: body.clone(),
            responder: Some(tx),
        });
        rx.await.unwrap_or_else(|_| {
            Err(TransportError::Request {
                message: "responder dropped".to_string(),
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Pending(ResultArea, String),
    Satellites {
        title: String,
        reply: Reply<SatelliteList>,
    },
    Risks {
        target_alt_km: f64,
        tolerance_km: f64,
        reply: Reply<RiskReport>,
    },
    Predictions(Reply<PredictionReport>),
    DensityPlan {
        target_alt_km: f64,
        reply: Reply<DensityPlan>,
    },
    Detail(DetailResult),
    Failure(ResultArea, String),
    Refusal(GatedFeature),
    Gate(FeatureGate, UpgradeView),
    Notice(Notice),
    AuthRequired,
    ApiKey(ApiKeyGrant),
}

impl Event {
    /// Whether this event drew query data into a result area.
    pub fn is_render(&self) -> bool {
        matches!(
            self,
            Self::Satellites { .. }
                | Self::Risks { .. }
                | Self::Predictions(_)
                | Self::DensityPlan { .. }
                | Self::Detail(_)
        )
    }
}

#[derive(Default)]
pub struct RecordingRenderer {
    events: Mutex<Vec<Event>>,
}

impl RecordingRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("events lock").clone()
    }

    pub fn renders(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(Event::is_render)
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|event| predicate(event)).count()
    }

    pub fn last_gate(&self) -> Option<FeatureGate> {
        self.events().into_iter().rev().find_map(|event| match event {
            Event::Gate(gate, _) => Some(gate),
            _ => None,
        })
    }

    fn push(&self, event: Event) {
        self.events.lock().expect("events lock").push(event);
    }
}

impl DashboardRenderer for RecordingRenderer {
    fn show_pending(&self, area: ResultArea, label: &str) {
        self.push(Event::Pending(area, label.to_string()));
    }

    fn render_satellites(&self, title: &str, reply: &Reply<SatelliteList>) {
        self.push(Event::Satellites {
            title: title.to_string(),
            reply: reply.clone(),
        });
    }

    fn render_risks(&self, target_alt_km: f64, tolerance_km: f64, reply: &Reply<RiskReport>) {
        self.push(Event::Risks {
            target_alt_km,
            tolerance_km,
            reply: reply.clone(),
        });
    }

    fn render_predictions(&self, reply: &Reply<PredictionReport>) {
        self.push(Event::Predictions(reply.clone()));
    }

    fn render_density_plan(&self, target_alt_km: f64, reply: &Reply<DensityPlan>) {
        self.push(Event::DensityPlan {
            target_alt_km,
            reply: reply.clone(),
        });
    }

    fn render_detail(&self, detail: &DetailResult) {
        self.push(Event::Detail(detail.clone()));
    }

    fn render_failure(&self, area: ResultArea, error: &ClientError) {
        self.push(Event::Failure(area, error.to_string()));
    }

    fn render_refusal(&self, feature: GatedFeature) {
        self.push(Event::Refusal(feature));
    }

    fn apply_feature_gate(&self, gate: &FeatureGate, upgrade: &UpgradeView) {
        self.push(Event::Gate(*gate, *upgrade));
    }

    fn notify(&self, notice: &Notice) {
        self.push(Event::Notice(notice.clone()));
    }

    fn require_authentication(&self) {
        self.push(Event::AuthRequired);
    }

    fn render_api_key(&self, grant: &ApiKeyGrant) {
        self.push(Event::ApiKey(grant.clone()));
    }
}

pub fn session(tier: SubscriptionTier, credential: &str) -> Session {
    Session::new(
        credential,
        UserProfile {
            email: "ops@orbit.test".to_string(),
            plan: tier,
        },
    )
}

pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub sessions: Arc<MemorySessionStore>,
    pub renderer: Arc<RecordingRenderer>,
    pub dashboard: Dashboard,
}

impl Harness {
    pub fn new(session: Option<Session>) -> Self {
        let transport = ScriptedTransport::new();
        let sessions = Arc::new(session.map_or_else(
            MemorySessionStore::new,
            MemorySessionStore::with_session,
        ));
        let renderer = RecordingRenderer::new();
        let dashboard = Dashboard::new(transport.clone(), sessions.clone(), renderer.clone());
        Self {
            transport,
            sessions,
            renderer,
            dashboard,
        }
    }

    pub fn pro() -> Self {
        Self::new(Some(session(SubscriptionTier::Pro, "tok_pro")))
    }

    pub fn free() -> Self {
        Self::new(Some(session(SubscriptionTier::Free, "tok_free")))
    }
}
