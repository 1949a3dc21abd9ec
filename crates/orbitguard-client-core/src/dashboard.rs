//! The per-client context object.
//!
//! One `Dashboard` owns the session store, both single-flight channels and the
//! renderer. Everything the UI does goes through it, so gating, pending state
//! and failure reporting happen in one place.

use std::sync::Arc;

use orbitguard_api_client::AnalysisTransport;

use crate::account::{AccountService, ApiKeyGrant};
use crate::detail::DetailLookup;
use crate::dispatcher::RequestDispatcher;
use crate::error::ClientError;
use crate::exchange::Exchange;
use crate::gate::{FeatureGate, GatedFeature, UpgradeView};
use crate::query::{QueryKind, QueryParams, QueryRequest, ResultArea};
use crate::router::{DashboardRenderer, Notice, ResponseRouter};
use crate::session::{Session, SessionStore};

/// How a user action ended, as far as the UI is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    /// A renderer drew the result into this area.
    Rendered(ResultArea),
    /// The gate refused the query; nothing was sent.
    Refused(GatedFeature),
    /// Superseded; nothing was drawn.
    Discarded,
    /// The failure was drawn into this area.
    Failed(ResultArea),
    /// The session is gone and the login flow has taken over.
    SessionEnded,
}

pub struct Dashboard {
    sessions: Arc<dyn SessionStore>,
    dispatcher: RequestDispatcher,
    detail: DetailLookup,
    accounts: AccountService,
    router: ResponseRouter,
    renderer: Arc<dyn DashboardRenderer>,
}

impl Dashboard {
    pub fn new(
        transport: Arc<dyn AnalysisTransport>,
        sessions: Arc<dyn SessionStore>,
        renderer: Arc<dyn DashboardRenderer>,
    ) -> Self {
        let exchange = Arc::new(Exchange::new(transport, sessions.clone()));
        Self {
            sessions,
            dispatcher: RequestDispatcher::new(exchange.clone()),
            detail: DetailLookup::new(exchange.clone()),
            accounts: AccountService::new(exchange),
            router: ResponseRouter,
            renderer,
        }
    }

    /// Startup check. Without a session the dashboard is unusable and the
    /// login flow takes over.
    pub fn open(&self) -> Result<Session, ClientError> {
        let session = self.sessions.load()?;
        self.refresh_gate_for(session.as_ref());
        match session {
            Some(session) => Ok(session),
            None => {
                self.renderer.require_authentication();
                Err(ClientError::Unauthenticated)
            }
        }
    }

    pub fn feature_gate(&self) -> Result<FeatureGate, ClientError> {
        Ok(FeatureGate::for_session(self.sessions.load()?.as_ref()))
    }

    /// Re-derives the gate from the stored session and pushes it to the UI.
    pub fn refresh_gate(&self) -> Result<FeatureGate, ClientError> {
        let session = self.sessions.load()?;
        Ok(self.refresh_gate_for(session.as_ref()))
    }

    fn refresh_gate_for(&self, session: Option<&Session>) -> FeatureGate {
        let gate = FeatureGate::for_session(session);
        let upgrade = UpgradeView::for_tier(session.map(Session::tier).unwrap_or_default());
        self.renderer.apply_feature_gate(&gate, &upgrade);
        gate
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let session = self.accounts.login(email, password).await?;
        self.refresh_gate_for(Some(&session));
        Ok(session)
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let session = self.accounts.signup(email, password).await?;
        self.refresh_gate_for(Some(&session));
        Ok(session)
    }

    pub fn logout(&self) -> Result<(), ClientError> {
        self.dispatcher.cancel_in_flight();
        self.detail.cancel_in_flight();
        self.accounts.logout()?;
        self.refresh_gate_for(None);
        self.renderer.require_authentication();
        Ok(())
    }

    /// Runs one user query end to end: gate, pending state, dispatch and
    /// rendering. Only the latest primary query ever reaches the renderer.
    pub async fn run_query(&self, request: QueryRequest) -> Result<QueryOutcome, ClientError> {
        if let QueryParams::Detail { norad_id } = request.params {
            return self.show_detail(norad_id, request.origin_label).await;
        }

        let kind = request.kind();
        if let Some(feature) = kind.gated_feature() {
            if !self.feature_gate()?.permits(feature) {
                tracing::debug!(kind = kind.as_str(), "gated query refused");
                self.renderer.render_refusal(feature);
                return Ok(QueryOutcome::Refused(feature));
            }
        }

        let area = kind.area();
        self.renderer.show_pending(area, area.pending_text());
        match self.dispatcher.issue(request).await {
            Ok(result) => Ok(QueryOutcome::Rendered(
                self.router.route(&result, self.renderer.as_ref()),
            )),
            Err(error) => self.report_failure(kind, error),
        }
    }

    /// Opens the detail view for one object. Runs on its own channel, so it
    /// neither cancels nor waits for a primary query.
    pub async fn show_detail(
        &self,
        norad_id: u64,
        name: impl Into<String>,
    ) -> Result<QueryOutcome, ClientError> {
        let area = ResultArea::Detail;
        self.renderer.show_pending(area, area.pending_text());
        match self.detail.issue(norad_id, name).await {
            Ok(detail) => {
                self.renderer.render_detail(&detail);
                Ok(QueryOutcome::Rendered(area))
            }
            Err(error) => self.report_failure(QueryKind::Detail, error),
        }
    }

    /// Reports a failure exactly once, to the area that owns `kind`. Errors
    /// from the session store itself are returned to the caller.
    fn report_failure(
        &self,
        kind: QueryKind,
        error: ClientError,
    ) -> Result<QueryOutcome, ClientError> {
        if error.is_silent() {
            return Ok(QueryOutcome::Discarded);
        }
        if error.forces_reauthentication() {
            self.end_session(&error)?;
            return Ok(QueryOutcome::SessionEnded);
        }
        if let ClientError::Store(_) = error {
            return Err(error);
        }
        let area = kind.area();
        self.renderer.render_failure(area, &error);
        Ok(QueryOutcome::Failed(area))
    }

    /// Hands the UI over to the login flow. Whatever is still in flight on
    /// either channel is dropped first, so nothing renders behind the prompt.
    fn end_session(&self, error: &ClientError) -> Result<(), ClientError> {
        self.dispatcher.cancel_in_flight();
        self.detail.cancel_in_flight();
        if let ClientError::SessionInvalid { cleared: true, .. } = error {
            self.renderer.notify(&Notice::SessionExpired);
        }
        self.refresh_gate()?;
        self.renderer.require_authentication();
        Ok(())
    }

    /// Upgrades to Pro and re-derives the gate immediately.
    pub async fn upgrade(&self) -> Result<Session, ClientError> {
        match self.accounts.upgrade().await {
            Ok(session) => {
                self.refresh_gate_for(Some(&session));
                self.renderer.notify(&Notice::UpgradeSucceeded);
                Ok(session)
            }
            Err(error) => Err(self.account_failure(error, |message| Notice::UpgradeFailed {
                message,
            })?),
        }
    }

    pub fn downgrade(&self) -> Result<Session, ClientError> {
        let result = self.accounts.downgrade();
        if let Err(ClientError::NotImplemented { .. }) = &result {
            self.renderer.notify(&Notice::DowngradeUnavailable);
        }
        result
    }

    pub async fn generate_api_key(&self) -> Result<ApiKeyGrant, ClientError> {
        if let Err(error) = self.feature_gate()?.check(GatedFeature::ManageApiKey) {
            self.renderer.render_refusal(GatedFeature::ManageApiKey);
            return Err(error);
        }
        match self.accounts.generate_api_key().await {
            Ok(grant) => {
                self.renderer.render_api_key(&grant);
                Ok(grant)
            }
            Err(error) => Err(self.account_failure(error, |message| Notice::ApiKeyFailed {
                message,
            })?),
        }
    }

    /// Session failures end the session; anything else becomes a notice.
    /// Returns the error for the caller to propagate.
    fn account_failure(
        &self,
        error: ClientError,
        notice: impl FnOnce(String) -> Notice,
    ) -> Result<ClientError, ClientError> {
        if error.forces_reauthentication() {
            self.end_session(&error)?;
        } else if !matches!(error, ClientError::Store(_)) {
            self.renderer.notify(&notice(error.to_string()));
        }
        Ok(error)
    }

    pub fn cancel_queries(&self) -> bool {
        self.dispatcher.cancel_in_flight()
    }
}
