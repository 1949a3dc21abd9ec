#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::fmt::Write as _;

use orbitguard_api_client::{DensityPlan, PredictionReport, RiskReport, SatelliteList};
use orbitguard_client_core::{
    API_KEY_NOTICE, ApiKeyGrant, BandRole, ClientError, DashboardRenderer, DetailResult,
    FeatureGate, GatedFeature, Notice, Reply, ResultArea, Session, UpgradeView, density_bars,
    gate::PRO_FEATURE_HINT,
};

const BAR_WIDTH: u64 = 40;

/// Results go to stdout; progress, notices and failures go to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalRenderer;

impl DashboardRenderer for TerminalRenderer {
    fn show_pending(&self, _area: ResultArea, label: &str) {
        eprintln!("{label}");
    }

    fn render_satellites(&self, title: &str, reply: &Reply<SatelliteList>) {
        print!("{}", format_satellites(title, reply));
    }

    fn render_risks(&self, target_alt_km: f64, tolerance_km: f64, reply: &Reply<RiskReport>) {
        print!("{}", format_risks(target_alt_km, tolerance_km, reply));
    }

    fn render_predictions(&self, reply: &Reply<PredictionReport>) {
        print!("{}", format_predictions(reply));
    }

    fn render_density_plan(&self, target_alt_km: f64, reply: &Reply<DensityPlan>) {
        print!("{}", format_density_plan(target_alt_km, reply));
    }

    fn render_detail(&self, detail: &DetailResult) {
        print!("{}", format_detail(detail));
    }

    fn render_failure(&self, area: ResultArea, error: &ClientError) {
        tracing::debug!(?area, "rendering failure");
        eprintln!("Error: {error}");
    }

    fn render_refusal(&self, feature: GatedFeature) {
        eprintln!("{} requires the Pro plan. {PRO_FEATURE_HINT}", capitalize(feature.as_str()));
    }

    fn apply_feature_gate(&self, gate: &FeatureGate, upgrade: &UpgradeView) {
        tracing::debug!(
            can_predict = gate.can_predict,
            can_plan = gate.can_plan,
            can_manage_api_key = gate.can_manage_api_key,
            tier = upgrade.current.as_str(),
            "feature gate updated"
        );
    }

    fn notify(&self, notice: &Notice) {
        eprintln!("{notice}");
    }

    fn require_authentication(&self) {
        eprintln!("Login required. Run `orbitguard login --email <address>` to continue.");
    }

    fn render_api_key(&self, grant: &ApiKeyGrant) {
        println!("{}", grant.api_key);
        eprintln!("{API_KEY_NOTICE}");
        eprintln!("Expires at {}", grant.expires_at.to_rfc3339());
    }
}

pub(crate) fn print_session(session: &Session) {
    println!(
        "Logged in as {} ({} plan)",
        session.identity(),
        session.tier().as_str()
    );
}

pub(crate) fn print_gate(gate: &FeatureGate, upgrade: &UpgradeView) {
    for affordance in gate.affordances() {
        let state = if affordance.enabled { "unlocked" } else { "locked" };
        let mut line = format!("  {:<22} {state}", affordance.feature.as_str());
        if !affordance.hint.is_empty() {
            let _ = write!(line, " ({})", affordance.hint);
        }
        println!("{line}");
    }
    println!(
        "  Free: {}{}",
        upgrade.free_option.label,
        if upgrade.free_option.enabled { "" } else { " *" }
    );
    println!(
        "  Pro:  {}{}",
        upgrade.pro_option.label,
        if upgrade.pro_option.enabled { "" } else { " *" }
    );
}

pub(crate) fn format_satellites(title: &str, reply: &Reply<SatelliteList>) -> String {
    let list = match reply {
        Ok(list) => list,
        Err(error) => return format!("Error: {error}\n"),
    };
    let mut out = format!(
        "Displaying {} objects for: {title}.\n",
        list.satellites.len()
    );
    if list.satellites.is_empty() {
        out.push_str("No satellites found for this query.\n");
        return out;
    }
    let _ = writeln!(out, "{:<28} {:>14} {:>10}", "Name", "Altitude (km)", "NORAD ID");
    for sat in &list.satellites {
        let _ = writeln!(
            out,
            "{:<28} {:>14.2} {:>10}",
            sat.name, sat.altitude, sat.norad_id
        );
    }
    out
}

pub(crate) fn format_risks(
    target_alt_km: f64,
    tolerance_km: f64,
    reply: &Reply<RiskReport>,
) -> String {
    let report = match reply {
        Ok(report) => report,
        Err(error) => return format!("Error: {error}\n"),
    };
    let mut out = format!("Risk check results for {target_alt_km}km ± {tolerance_km}km.\n");
    if !report.risk_found || report.risks.is_empty() {
        out.push_str("No immediate risks found in the specified range.\n");
        return out;
    }
    let _ = writeln!(out, "Found {} potential risk(s):", report.risks.len());
    for risk in &report.risks {
        let _ = writeln!(
            out,
            "  {} at {:.2} km (NORAD {})",
            risk.name, risk.altitude, risk.norad_id
        );
    }
    out
}

pub(crate) fn format_predictions(reply: &Reply<PredictionReport>) -> String {
    let report = match reply {
        Ok(report) => report,
        Err(error) => return format!("Error: {error}\n"),
    };
    let mut out = format!(
        "Found {} potential close approaches.\n",
        report.events.len()
    );
    if report.events.is_empty() {
        out.push_str("No high-risk collision events predicted.\n");
        return out;
    }
    for event in &report.events {
        let _ = writeln!(
            out,
            "  {} / {}: {:.2} km in {:.1} hours",
            event.object1_name, event.object2_name, event.min_distance_km, event.time_from_now_hr
        );
    }
    out
}

pub(crate) fn format_density_plan(target_alt_km: f64, reply: &Reply<DensityPlan>) -> String {
    let plan = match reply {
        Ok(plan) => plan,
        Err(error) => return format!("Error: {error}\n"),
    };
    let bars = density_bars(plan);
    let busiest = bars.iter().map(|bar| bar.object_count).max().unwrap_or(0).max(1);
    let mut out = format!("Orbital Density Analysis (target {target_alt_km} km)\n");
    for bar in &bars {
        let width = (bar.object_count * BAR_WIDTH).div_ceil(busiest);
        let marker = match bar.role {
            BandRole::Target => " <- target",
            BandRole::Recommended => " <- recommended",
            BandRole::Normal => "",
        };
        let _ = writeln!(
            out,
            "{:>11} km {:>6} {}{marker}",
            bar.label,
            bar.object_count,
            "#".repeat(usize::try_from(width).unwrap_or(usize::MAX))
        );
    }
    let band = &plan.recommendation;
    let _ = writeln!(
        out,
        "Safest band is {}-{} km, with only {} objects.",
        band.safe_alt_start_km, band.safe_alt_end_km, band.object_count
    );
    out
}

pub(crate) fn format_detail(detail: &DetailResult) -> String {
    let mut out = format!("Details for {}\n", detail.name);
    match &detail.reply {
        Ok(record) => {
            let _ = writeln!(out, "  NORAD ID:      {}", detail.norad_id);
            let _ = writeln!(out, "  Official Name: {}", record.official_name);
            let _ = writeln!(out, "  Launch Date:   {}", record.launch_date);
            let _ = writeln!(out, "  Country:       {}", record.country);
            let _ = writeln!(out, "  Mission:       {}", record.purpose);
            let _ = writeln!(out, "  Status:        {}", record.status);
        }
        Err(error) => {
            let _ = writeln!(out, "  Error: Could not fetch details. {error}");
        }
    }
    out
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
