use axum::{
    Router,
    extract::{Json, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    BlendWindow, CostBasis, EngineError, Family, LimitsSnapshot, ReferenceTables,
    ScenarioOptions, ScenarioRequest, ScenarioResult, compute_scenario,
};

const MIN_RETIREMENT_AGE: u32 = 60;
const MAX_CONTRIBUTED_WEEKS: u32 = 3000;
const MIN_CURRENT_AGE: u32 = 50;
const MAX_CURRENT_AGE: u32 = 70;
// Starts on or after this date fall under the individual-account regime.
const LAW_97_START: (i32, u32) = (1997, 7);
const ADVISORY_YEARS: u32 = 5;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliBlendWindow {
    Fixed260,
    EnrolledWeeks,
}

impl From<CliBlendWindow> for BlendWindow {
    fn from(value: CliBlendWindow) -> Self {
        match value {
            CliBlendWindow::Fixed260 => BlendWindow::Fixed260,
            CliBlendWindow::EnrolledWeeks => BlendWindow::EnrolledWeeks,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliCostBasis {
    Nominal,
    IndexLinked,
}

impl From<CliCostBasis> for CostBasis {
    fn from(value: CliCostBasis) -> Self {
        match value {
            CliCostBasis::Nominal => CostBasis::Nominal,
            CliCostBasis::IndexLinked => CostBasis::IndexLinked,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiBlendWindow {
    #[serde(alias = "fixed", alias = "fixed_260")]
    Fixed260,
    #[serde(alias = "enrolledWeeks", alias = "enrolled_weeks")]
    EnrolledWeeks,
}

impl From<ApiBlendWindow> for CliBlendWindow {
    fn from(value: ApiBlendWindow) -> Self {
        match value {
            ApiBlendWindow::Fixed260 => CliBlendWindow::Fixed260,
            ApiBlendWindow::EnrolledWeeks => CliBlendWindow::EnrolledWeeks,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiCostBasis {
    Nominal,
    #[serde(alias = "indexLinked", alias = "index_linked")]
    IndexLinked,
}

impl From<ApiCostBasis> for CliCostBasis {
    fn from(value: ApiCostBasis) -> Self {
        match value {
            ApiCostBasis::Nominal => CliCostBasis::Nominal,
            ApiCostBasis::IndexLinked => CliCostBasis::IndexLinked,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatePayload {
    contributed_weeks: Option<u32>,
    current_daily_wage: Option<f64>,
    desired_daily_wage: Option<f64>,
    current_age: Option<u32>,
    retirement_age: Option<u32>,

    has_spouse: Option<bool>,
    num_children: Option<u32>,
    has_dependent_parents: Option<bool>,

    start_year: Option<i32>,
    months_until_retirement: Option<u32>,
    contribution_start_month: Option<u32>,
    contribution_start_year: Option<i32>,

    blend_window: Option<ApiBlendWindow>,
    cost_basis: Option<ApiCostBasis>,
}

#[derive(Parser, Debug)]
#[command(
    name = "ley73",
    about = "Law 73 pension estimator: retiring as-is versus voluntary continuation (Program V)"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Serve the JSON API over HTTP")]
    Serve {
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: IpAddr,
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },
    #[command(about = "Compute one scenario and print it as JSON")]
    Calculate(CalculateArgs),
    #[command(about = "Print the reference constants as JSON")]
    Limits,
}

#[derive(Args, Debug, Clone)]
struct CalculateArgs {
    #[arg(long, help = "Weeks contributed so far")]
    contributed_weeks: u32,
    #[arg(long, help = "Current reference daily wage (average of the last 250 weeks)")]
    current_daily_wage: f64,
    #[arg(long, help = "Daily wage to contribute at during the program")]
    desired_daily_wage: f64,
    #[arg(long)]
    current_age: u32,
    #[arg(long)]
    retirement_age: u32,
    #[arg(long)]
    has_spouse: bool,
    #[arg(long, default_value_t = 0, help = "Dependent children (minors or students)")]
    num_children: u32,
    #[arg(long, help = "Dependent parents; only counted with no spouse and no children")]
    has_dependent_parents: bool,
    #[arg(long, default_value_t = 2025, help = "First program year")]
    start_year: i32,
    #[arg(long, help = "Months left before retirement; prorates the final program year")]
    months_until_retirement: Option<u32>,
    #[arg(long, help = "Month contributions first started (1-12)")]
    contribution_start_month: Option<u32>,
    #[arg(long, help = "Year contributions first started; must be before July 1997")]
    contribution_start_year: Option<i32>,
    #[arg(
        long,
        value_enum,
        default_value_t = CliBlendWindow::Fixed260,
        help = "Enrollment window used when blending a short wage history"
    )]
    blend_window: CliBlendWindow,
    #[arg(
        long,
        value_enum,
        default_value_t = CliCostBasis::Nominal,
        help = "Price the program wage nominally or keep its index multiple each year"
    )]
    cost_basis: CliCostBasis,
}

#[derive(Debug)]
struct ApiRequest {
    scenario: ScenarioRequest,
    current_age: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AgeInfo {
    current_age: u32,
    retirement_age: u32,
    years_available: u32,
    age_factor: f64,
    early_retirement_penalty_pct: f64,
    old_age_bonus_applies: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Advisory {
    years_available: u32,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateResponse {
    success: bool,
    advisory: Option<Advisory>,
    age_info: AgeInfo,
    cap_daily: f64,
    index_daily: f64,
    scenario: ScenarioResult,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub async fn run(cli: Cli) -> Result<(), String> {
    let tables = ReferenceTables::regime_2025();
    tables.validate()?;
    let tables = Arc::new(tables);

    match cli.command {
        Command::Serve { host, port } => run_http_server(SocketAddr::new(host, port), tables)
            .await
            .map_err(|e| format!("Server error: {e}")),
        Command::Calculate(args) => {
            let request = build_request(args, &tables)?;
            let response = calculate(&tables, &request).map_err(|e| e.to_string())?;
            print_json(&response)
        }
        Command::Limits => print_json(&tables.limits()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json =
        serde_json::to_string_pretty(value).map_err(|e| format!("Serialization error: {e}"))?;
    println!("{json}");
    Ok(())
}

fn build_request(args: CalculateArgs, tables: &ReferenceTables) -> Result<ApiRequest, String> {
    if args.contributed_weeks < tables.min_contribution_weeks {
        return Err(format!(
            "--contributed-weeks must be >= {}",
            tables.min_contribution_weeks
        ));
    }

    if args.contributed_weeks > MAX_CONTRIBUTED_WEEKS {
        return Err(format!("--contributed-weeks must be <= {MAX_CONTRIBUTED_WEEKS}"));
    }

    if !args.current_daily_wage.is_finite() || args.current_daily_wage <= 0.0 {
        return Err("--current-daily-wage must be > 0".to_string());
    }

    if !args.desired_daily_wage.is_finite() || args.desired_daily_wage <= 0.0 {
        return Err("--desired-daily-wage must be > 0".to_string());
    }

    if !(MIN_CURRENT_AGE..=MAX_CURRENT_AGE).contains(&args.current_age) {
        return Err(format!(
            "--current-age must be between {MIN_CURRENT_AGE} and {MAX_CURRENT_AGE}"
        ));
    }

    if args.retirement_age < MIN_RETIREMENT_AGE {
        return Err(format!("--retirement-age must be >= {MIN_RETIREMENT_AGE}"));
    }

    if args.retirement_age <= args.current_age {
        return Err("--retirement-age must be > --current-age".to_string());
    }

    match (args.contribution_start_month, args.contribution_start_year) {
        (None, None) => {}
        (Some(month), Some(year)) => {
            if !(1..=12).contains(&month) {
                return Err("--contribution-start-month must be between 1 and 12".to_string());
            }
            if (year, month) >= LAW_97_START {
                return Err(format!(
                    "contributions started {month}/{year}, on or after 7/1997; \
                     the Law 73 program does not apply"
                ));
            }
        }
        _ => {
            return Err(
                "--contribution-start-month and --contribution-start-year must be given together"
                    .to_string(),
            );
        }
    }

    if let Some(months) = args.months_until_retirement {
        let years_available = args.retirement_age - args.current_age;
        let first = (years_available - 1) * 12 + 1;
        let last = years_available * 12;
        if !(first..=last).contains(&months) {
            return Err(format!(
                "--months-until-retirement must be between {first} and {last} \
                 for retirement {years_available} year(s) away"
            ));
        }
    }

    let scenario = ScenarioRequest {
        current_weeks: args.contributed_weeks,
        current_daily_wage: args.current_daily_wage,
        desired_daily_wage: args.desired_daily_wage,
        retirement_age: args.retirement_age,
        family: Family {
            has_spouse: args.has_spouse,
            num_children: args.num_children,
            has_dependent_parents: args.has_dependent_parents,
        },
        start_year: args.start_year,
        current_age: Some(args.current_age),
        months_until_retirement: args.months_until_retirement,
        options: ScenarioOptions {
            blend_window: args.blend_window.into(),
            cost_basis: args.cost_basis.into(),
        },
    };

    Ok(ApiRequest {
        scenario,
        current_age: args.current_age,
    })
}

fn calculate(
    tables: &ReferenceTables,
    request: &ApiRequest,
) -> Result<CalculateResponse, EngineError> {
    let scenario = compute_scenario(tables, &request.scenario)?;
    let retirement_age = request.scenario.retirement_age;
    let years_available = retirement_age.saturating_sub(request.current_age);
    let age_factor = scenario.baseline.age_factor;

    let advisory = (years_available < ADVISORY_YEARS).then(|| Advisory {
        years_available,
        message: format!(
            "{years_available} year(s) available before retirement; the program has no minimum \
             duration and {} additional weeks are counted",
            scenario.enrolled_weeks - request.scenario.current_weeks
        ),
    });

    Ok(CalculateResponse {
        success: true,
        advisory,
        age_info: AgeInfo {
            current_age: request.current_age,
            retirement_age,
            years_available,
            age_factor,
            early_retirement_penalty_pct: ((1.0 - age_factor) * 100.0).round(),
            old_age_bonus_applies: retirement_age >= tables.normal_retirement_age,
        },
        cap_daily: tables.cap_daily(),
        index_daily: tables.index_daily_baseline,
        scenario,
    })
}

pub async fn run_http_server(
    addr: SocketAddr,
    tables: Arc<ReferenceTables>,
) -> std::io::Result<()> {
    let app = Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/limits", get(limits_handler))
        .route(
            "/api/calculate",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .fallback(not_found_handler)
        .with_state(tables);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "pension API listening");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn limits_handler(State(tables): State<Arc<ReferenceTables>>) -> Response {
    let limits: LimitsSnapshot = tables.limits();
    json_response(StatusCode::OK, limits)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found", None)
}

async fn calculate_get_handler(
    State(tables): State<Arc<ReferenceTables>>,
    Query(payload): Query<CalculatePayload>,
) -> Response {
    calculate_handler_impl(&tables, payload)
}

async fn calculate_post_handler(
    State(tables): State<Arc<ReferenceTables>>,
    Json(payload): Json<CalculatePayload>,
) -> Response {
    calculate_handler_impl(&tables, payload)
}

fn calculate_handler_impl(tables: &ReferenceTables, payload: CalculatePayload) -> Response {
    let request = match api_request_from_payload(payload, tables) {
        Ok(request) => request,
        Err(msg) => {
            debug!(%msg, "rejected calculate payload");
            return error_response(StatusCode::BAD_REQUEST, &msg, None);
        }
    };

    match calculate(tables, &request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => engine_error_response(&err),
    }
}

fn engine_error_response(err: &EngineError) -> Response {
    warn!(kind = err.kind(), %err, "scenario rejected by engine");
    error_response(StatusCode::BAD_REQUEST, &err.to_string(), Some(err.kind()))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str, kind: Option<&'static str>) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
            kind,
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<CalculatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload, &ReferenceTables::regime_2025())
}

fn api_request_from_payload(
    payload: CalculatePayload,
    tables: &ReferenceTables,
) -> Result<ApiRequest, String> {
    let Some(contributed_weeks) = payload.contributed_weeks else {
        return Err("Missing required field: contributedWeeks".to_string());
    };
    let Some(current_daily_wage) = payload.current_daily_wage else {
        return Err("Missing required field: currentDailyWage".to_string());
    };
    let Some(desired_daily_wage) = payload.desired_daily_wage else {
        return Err("Missing required field: desiredDailyWage".to_string());
    };
    let Some(current_age) = payload.current_age else {
        return Err("Missing required field: currentAge".to_string());
    };
    let Some(retirement_age) = payload.retirement_age else {
        return Err("Missing required field: retirementAge".to_string());
    };

    let mut args = default_args_for_api();
    args.contributed_weeks = contributed_weeks;
    args.current_daily_wage = current_daily_wage;
    args.desired_daily_wage = desired_daily_wage;
    args.current_age = current_age;
    args.retirement_age = retirement_age;

    if let Some(v) = payload.has_spouse {
        args.has_spouse = v;
    }
    if let Some(v) = payload.num_children {
        args.num_children = v;
    }
    if let Some(v) = payload.has_dependent_parents {
        args.has_dependent_parents = v;
    }
    if let Some(v) = payload.start_year {
        args.start_year = v;
    }
    args.months_until_retirement = payload.months_until_retirement;
    args.contribution_start_month = payload.contribution_start_month;
    args.contribution_start_year = payload.contribution_start_year;
    if let Some(v) = payload.blend_window {
        args.blend_window = v.into();
    }
    if let Some(v) = payload.cost_basis {
        args.cost_basis = v.into();
    }

    build_request(args, tables).map_err(|msg| msg.replace("--", ""))
}

fn default_args_for_api() -> CalculateArgs {
    CalculateArgs {
        contributed_weeks: 0,
        current_daily_wage: 0.0,
        desired_daily_wage: 0.0,
        current_age: 0,
        retirement_age: 0,
        has_spouse: false,
        num_children: 0,
        has_dependent_parents: false,
        start_year: 2025,
        months_until_retirement: None,
        contribution_start_month: None,
        contribution_start_year: None,
        blend_window: CliBlendWindow::Fixed260,
        cost_basis: CliCostBasis::Nominal,
    }
}
