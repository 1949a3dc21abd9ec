//! Orchestration core of the OrbitGuard dashboard client.
//!
//! The [`Dashboard`] ties a [`SessionStore`], two single-flight channels and
//! a [`DashboardRenderer`] together. Primary queries (list, filter, risk
//! check, predict, plan) share one channel and supersede each other; detail
//! lookups run on a second, independent channel.

pub mod account;
pub mod config;
pub mod dashboard;
pub mod detail;
pub mod dispatcher;
pub mod error;
pub mod exchange;
pub mod flight;
pub mod gate;
pub mod query;
pub mod router;
pub mod session;

pub use account::{API_KEY_NOTICE, API_KEY_VALIDITY_HOURS, AccountService, ApiKeyGrant};
pub use config::{ClientConfig, ConfigError, ConfigOverrides};
pub use dashboard::{Dashboard, QueryOutcome};
pub use detail::DetailLookup;
pub use dispatcher::RequestDispatcher;
pub use error::{ApplicationError, AuthInputError, ClientError};
pub use exchange::Exchange;
pub use flight::{FlightTicket, SingleFlightSlot};
pub use gate::{Affordance, FeatureGate, GatedFeature, PlanOption, UpgradeView, gate};
pub use query::{
    BandRole, Channel, DensityBar, DetailResult, QueryKind, QueryParams, QueryRequest,
    QueryResult, Reply, ResultArea, density_bars,
};
pub use router::{DashboardRenderer, Notice, ResponseRouter};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore, SessionStoreError};
