use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use orbitguard_api_client::HttpTransport;
use orbitguard_client_core::{
    ClientConfig, ClientError, ConfigOverrides, Dashboard, FeatureGate, FileSessionStore,
    QueryOutcome, QueryRequest, UpgradeView,
};
use tokio::io::{AsyncBufReadExt, BufReader};

mod render;
mod shell;

pub use render::TerminalRenderer;

#[derive(Parser, Debug)]
#[command(name = "orbitguard")]
#[command(about = "OrbitGuard mission control from the terminal")]
pub struct OrbitGuardCli {
    /// Analysis service base URL (overrides ORBITGUARD_SERVER_URL)
    #[arg(long, global = true)]
    pub server: Option<String>,
    /// Session document location (overrides ORBITGUARD_SESSION_PATH)
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Log in and store the session
    Login(CredentialArgs),
    /// Create an account and store the session
    Signup(CredentialArgs),
    /// Forget the stored session
    Logout,
    /// Show the stored identity, plan and unlocked features
    Whoami,
    #[command(flatten)]
    Query(QueryCommand),
    /// Move the account to the Pro plan
    Upgrade,
    /// Move the account back to the Free plan
    Downgrade,
    /// Generate a 24 hour API key (Pro)
    ApiKey,
    /// Read commands from stdin; each query supersedes the one still running
    Shell,
}

#[derive(Args, Debug, PartialEq)]
pub struct CredentialArgs {
    #[arg(long)]
    pub email: String,
    /// Read from stdin when omitted
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum QueryCommand {
    /// List every tracked satellite
    List,
    /// Satellites between two altitudes
    Filter {
        #[arg(long)]
        min: f64,
        #[arg(long)]
        max: f64,
    },
    /// Objects near a target altitude
    Risk {
        #[arg(long)]
        target: f64,
        #[arg(long, default_value_t = 10.0)]
        tolerance: f64,
    },
    /// Predict close approaches (Pro)
    Predict {
        #[arg(long, default_value_t = 1)]
        days: u32,
        #[arg(long, default_value_t = 10)]
        step: u32,
        #[arg(long, default_value_t = 5.0)]
        threshold: f64,
    },
    /// Find the least crowded band near a target altitude (Pro)
    Plan {
        #[arg(long)]
        target: f64,
    },
    /// Mission details for one object
    Detail {
        norad_id: u64,
        /// Display name for the detail header
        #[arg(long, num_args = 1..)]
        name: Vec<String>,
    },
}

impl QueryCommand {
    #[must_use]
    pub fn into_request(self) -> QueryRequest {
        match self {
            Self::List => QueryRequest::list(),
            Self::Filter { min, max } => QueryRequest::filter(min, max),
            Self::Risk { target, tolerance } => QueryRequest::risk_check(target, tolerance),
            Self::Predict {
                days,
                step,
                threshold,
            } => QueryRequest::predict(days, step, threshold),
            Self::Plan { target } => QueryRequest::plan(target),
            Self::Detail { norad_id, name } => {
                let name = if name.is_empty() {
                    format!("NORAD {norad_id}")
                } else {
                    name.join(" ")
                };
                QueryRequest::detail(norad_id, name)
            }
        }
    }
}

pub async fn run(cli: OrbitGuardCli) -> Result<ExitCode> {
    let config = ClientConfig::from_env(ConfigOverrides {
        server_url: cli.server,
        session_path: cli.session_file,
    })
    .context("invalid client configuration")?;
    tracing::debug!(
        server_url = %config.server_url,
        source = %config.server_url_source,
        session_path = %config.session_path.display(),
        "resolved client configuration"
    );

    let transport =
        HttpTransport::new(config.transport_config()).context("failed to build HTTP transport")?;
    let dashboard = Dashboard::new(
        Arc::new(transport),
        Arc::new(FileSessionStore::new(config.session_path.clone())),
        Arc::new(TerminalRenderer),
    );

    match cli.command {
        Commands::Login(args) => {
            let password = resolve_password(args.password).await?;
            let session = dashboard
                .login(&args.email, &password)
                .await
                .context("login failed")?;
            render::print_session(&session);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Signup(args) => {
            let password = resolve_password(args.password).await?;
            let session = dashboard
                .signup(&args.email, &password)
                .await
                .context("signup failed")?;
            render::print_session(&session);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Logout => {
            dashboard.logout().context("logout failed")?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Whoami => Ok(exit_code(whoami(&dashboard)?)),
        Commands::Query(query) => {
            let outcome = dashboard.run_query(query.into_request()).await?;
            Ok(exit_code(matches!(outcome, QueryOutcome::Rendered(_))))
        }
        Commands::Upgrade => Ok(exit_code(settle(dashboard.upgrade().await)?.is_some())),
        Commands::Downgrade => Ok(exit_code(settle(dashboard.downgrade())?.is_some())),
        Commands::ApiKey => Ok(exit_code(
            settle(dashboard.generate_api_key().await)?.is_some(),
        )),
        Commands::Shell => shell::run(&dashboard).await,
    }
}

/// Prints the stored session and what it unlocks. Returns false when there
/// is no session.
pub(crate) fn whoami(dashboard: &Dashboard) -> Result<bool> {
    let Some(session) = settle(dashboard.open())? else {
        return Ok(false);
    };
    render::print_session(&session);
    render::print_gate(
        &FeatureGate::for_session(Some(&session)),
        &UpgradeView::for_tier(session.tier()),
    );
    Ok(true)
}

/// The dashboard has already shown every failure except a broken session
/// store, so only that one is propagated.
pub(crate) fn settle<T>(result: Result<T, ClientError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ClientError::Store(error)) => Err(error).context("session store unavailable"),
        Err(error) => {
            tracing::debug!(error = %error, "operation ended without a result");
            Ok(None)
        }
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn resolve_password(flag: Option<String>) -> Result<String> {
    if let Some(password) = flag {
        return Ok(password);
    }
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn cli_requires_subcommand() {
        let err = match OrbitGuardCli::try_parse_from(["orbitguard"]) {
            Ok(_) => panic!("expected missing subcommand parse error"),
            Err(err) => err,
        };
        assert_eq!(
            err.kind(),
            ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
    }

    #[test]
    fn query_subcommands_sit_at_top_level() {
        let cli = OrbitGuardCli::try_parse_from([
            "orbitguard",
            "risk",
            "--target",
            "550",
            "--server",
            "http://10.0.0.5:8080",
        ])
        .expect("risk parses");
        assert_eq!(cli.server.as_deref(), Some("http://10.0.0.5:8080"));
        assert_eq!(
            cli.command,
            Commands::Query(QueryCommand::Risk {
                target: 550.0,
                tolerance: 10.0,
            })
        );
    }

    #[test]
    fn predict_defaults_and_detail_name() {
        let cli = OrbitGuardCli::try_parse_from(["orbitguard", "predict"]).expect("predict");
        let Commands::Query(query) = cli.command else {
            panic!("expected a query command");
        };
        assert_eq!(query.into_request(), QueryRequest::predict(1, 10, 5.0));

        let cli = OrbitGuardCli::try_parse_from([
            "orbitguard",
            "detail",
            "25544",
            "--name",
            "ISS",
            "(ZARYA)",
        ])
        .expect("detail");
        let Commands::Query(query) = cli.command else {
            panic!("expected a query command");
        };
        let request = query.into_request();
        assert_eq!(request, QueryRequest::detail(25544, "ISS (ZARYA)"));
    }

    #[test]
    fn filter_requires_both_bounds() {
        let err = OrbitGuardCli::try_parse_from(["orbitguard", "filter", "--min", "400"])
            .expect_err("missing --max");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn login_takes_optional_password() {
        let cli = OrbitGuardCli::try_parse_from([
            "orbitguard",
            "--session-file",
            "/tmp/og.json",
            "login",
            "--email",
            "ops@orbit.test",
        ])
        .expect("login");
        assert_eq!(cli.session_file, Some(PathBuf::from("/tmp/og.json")));
        assert_eq!(
            cli.command,
            Commands::Login(CredentialArgs {
                email: "ops@orbit.test".to_string(),
                password: None,
            })
        );
    }

    #[test]
    fn settle_propagates_only_store_failures() {
        assert!(matches!(
            settle::<()>(Err(ClientError::Unauthenticated)),
            Ok(None)
        ));
        assert!(
            settle::<()>(Err(ClientError::Store(
                orbitguard_client_core::SessionStoreError::Encode("bad".to_string())
            )))
            .is_err()
        );
        assert!(matches!(settle(Ok(7)), Ok(Some(7))));
    }
}
