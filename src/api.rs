use alloy::primitives::I256;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::accounting::{split_stream_into_periods, AccountingPeriod};
use crate::calculator;
use crate::config::Config;
use crate::error::FlowError;
use crate::models::{FlowRate, RealtimeBalance, Stream};
use crate::units::{format_token_amount, parse_token_amount, SUPER_TOKEN_DECIMALS};

// ---------- wire types (wei travels as decimal strings) ----------

#[derive(Debug, Deserialize)]
pub struct BalanceBody {
    pub balance_wei: String,
    pub net_flow_rate_wei: String,
    pub balance_timestamp: u64,
}

#[derive(Deserialize)]
pub struct ProjectRequest {
    pub balance: BalanceBody,
    pub at: u64,
}

#[derive(Deserialize)]
pub struct CriticalRequest {
    pub balance: BalanceBody,
    pub minimum_balance_wei: Option<String>, // defaults to the configured minimum
}

#[derive(Deserialize)]
pub struct FlowRateRequest {
    pub amount_wei: Option<String>,
    pub amount: Option<String>, // token units, e.g. "1.5"; exclusive with amount_wei
    pub unit_of_time: u64,      // seconds, must be a known unit
}

#[derive(Deserialize)]
pub struct BufferRequest {
    pub flow_rate_per_second_wei: String,
}

#[derive(Deserialize)]
pub struct BufferDeltaRequest {
    pub old_flow_rate_wei: String,
    pub new_flow_rate_wei: String,
}

#[derive(Deserialize)]
pub struct PreviewRequest {
    pub balance: BalanceBody,
    pub old_flow_rate_wei: String,
    pub new_flow_rate_wei: String,
    pub at: Option<u64>, // defaults to the snapshot time
    pub minimum_balance_wei: Option<String>, // defaults to the configured minimum
}

#[derive(Deserialize)]
pub struct StreamedRequest {
    pub flow_rate_wei: String,
    pub streamed_until_updated_at_wei: String,
    pub updated_at_timestamp: u64,
    pub at: u64,
}

#[derive(Deserialize)]
pub struct PeriodsRequest {
    pub flow_rate_wei: String,
    pub start: u64,
    pub end: u64,
    pub period: String,
}

#[derive(Serialize)]
pub struct PreviewResponse {
    pub buffer_delta_wei: String,
    pub new_net_flow_rate_wei: String,
    pub balance_after_buffer_wei: String,
    pub critical_timestamp: Option<u64>,
}

#[derive(Serialize)]
pub struct PeriodResponse {
    pub period_start: i64,
    pub period_end: i64,
    pub amount_wei: String,
    pub amount: Option<Decimal>, // token units, absent when out of Decimal range
}

// ---------- errors ----------

pub struct ApiError(FlowError);

impl From<FlowError> for ApiError {
    fn from(e: FlowError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        debug!("Rejected request: {}", self.0);
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn parse_wei(field: &str, raw: &str) -> Result<I256, FlowError> {
    I256::from_dec_str(raw.trim())
        .map_err(|e| FlowError::InvalidAmount(format!("{}={:?}: {}", field, raw, e)))
}

fn minimum_or_default(cfg: &Config, raw: Option<&str>) -> Result<I256, FlowError> {
    match raw {
        Some(raw) => parse_wei("minimum_balance_wei", raw),
        None => Ok(cfg.minimum_balance_wei),
    }
}

impl BalanceBody {
    fn to_balance(&self) -> Result<RealtimeBalance, FlowError> {
        Ok(RealtimeBalance::new(
            parse_wei("balance_wei", &self.balance_wei)?,
            parse_wei("net_flow_rate_wei", &self.net_flow_rate_wei)?,
            self.balance_timestamp,
        ))
    }
}

// ---------- router ----------

pub fn router(cfg: Config) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { "Superfluid flow calculator running" }))
        .route("/network", get(network))
        .route("/balance/project", post(project))
        .route("/balance/critical", post(critical))
        .route("/flow-rate", post(flow_rate))
        .route("/buffer", post(buffer))
        .route("/buffer/delta", post(buffer_delta))
        .route("/stream/preview", post(preview))
        .route("/stream/streamed", post(streamed))
        .route("/accounting/periods", post(periods))
        .with_state(Arc::new(cfg))
        .layer(cors)
}

pub async fn serve(cfg: Config) -> eyre::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], cfg.port));
    let app = router(cfg);

    info!("API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

// ---------- handlers ----------

async fn network(State(cfg): State<Arc<Config>>) -> Json<serde_json::Value> {
    Json(json!({
        "chain_id": cfg.network.chain_id,
        "slug": cfg.network.slug,
        "name": cfg.network.name,
        "is_testnet": cfg.network.is_testnet,
        "buffer_time_seconds": cfg.buffer_time_seconds,
    }))
}

async fn project(Json(req): Json<ProjectRequest>) -> ApiResult<serde_json::Value> {
    let balance = req.balance.to_balance()?;
    let projected = calculator::project_balance(&balance, req.at);
    Ok(Json(json!({ "balance_wei": projected.to_string() })))
}

async fn critical(
    State(cfg): State<Arc<Config>>,
    Json(req): Json<CriticalRequest>,
) -> ApiResult<serde_json::Value> {
    let balance = req.balance.to_balance()?;
    let minimum = minimum_or_default(&cfg, req.minimum_balance_wei.as_deref())?;
    let critical_timestamp = calculator::compute_critical_timestamp(&balance, minimum);
    Ok(Json(json!({ "critical_timestamp": critical_timestamp })))
}

async fn flow_rate(Json(req): Json<FlowRateRequest>) -> ApiResult<serde_json::Value> {
    let amount = match (&req.amount_wei, &req.amount) {
        (Some(wei), None) => parse_wei("amount_wei", wei)?,
        (None, Some(tokens)) => parse_token_amount(tokens, SUPER_TOKEN_DECIMALS)?,
        _ => {
            return Err(FlowError::InvalidAmount(
                "exactly one of amount_wei or amount is required".to_string(),
            )
            .into())
        }
    };
    let rate = FlowRate::from_parts(amount, req.unit_of_time)?;
    let per_second = calculator::to_per_second_rate(&rate);
    // what the protocol actually streams per unit after truncation
    let per_unit = calculator::from_per_second_rate(per_second, rate.unit_of_time());
    Ok(Json(json!({
        "amount_wei": amount.to_string(),
        "per_second_wei": per_second.to_string(),
        "per_unit_wei": per_unit.to_string(),
        "remainder_wei": rate.truncation_remainder().to_string(),
        "exact": rate.is_exact(),
    })))
}

async fn buffer(
    State(cfg): State<Arc<Config>>,
    Json(req): Json<BufferRequest>,
) -> ApiResult<serde_json::Value> {
    let rate = parse_wei("flow_rate_per_second_wei", &req.flow_rate_per_second_wei)?;
    let buffer = calculator::compute_buffer_amount(rate, cfg.buffer_time_seconds);
    Ok(Json(json!({ "buffer_wei": buffer.to_string() })))
}

async fn buffer_delta(
    State(cfg): State<Arc<Config>>,
    Json(req): Json<BufferDeltaRequest>,
) -> ApiResult<serde_json::Value> {
    let old = parse_wei("old_flow_rate_wei", &req.old_flow_rate_wei)?;
    let new = parse_wei("new_flow_rate_wei", &req.new_flow_rate_wei)?;
    let delta = calculator::compute_buffer_delta(old, new, cfg.buffer_time_seconds);
    Ok(Json(json!({ "buffer_delta_wei": delta.to_string() })))
}

async fn preview(
    State(cfg): State<Arc<Config>>,
    Json(req): Json<PreviewRequest>,
) -> ApiResult<PreviewResponse> {
    let balance = req.balance.to_balance()?;
    let old = parse_wei("old_flow_rate_wei", &req.old_flow_rate_wei)?;
    let new = parse_wei("new_flow_rate_wei", &req.new_flow_rate_wei)?;

    let preview = calculator::preview_stream_change(
        &balance,
        old,
        new,
        cfg.buffer_time_seconds,
        req.at.unwrap_or(balance.balance_timestamp),
        minimum_or_default(&cfg, req.minimum_balance_wei.as_deref())?,
    );

    Ok(Json(PreviewResponse {
        buffer_delta_wei: preview.buffer_delta_wei.to_string(),
        new_net_flow_rate_wei: preview.new_net_flow_rate_wei.to_string(),
        balance_after_buffer_wei: preview.balance_after_buffer_wei.to_string(),
        critical_timestamp: preview.critical_timestamp,
    }))
}

async fn streamed(Json(req): Json<StreamedRequest>) -> ApiResult<serde_json::Value> {
    let stream = Stream {
        flow_rate_wei: parse_wei("flow_rate_wei", &req.flow_rate_wei)?,
        streamed_until_updated_at_wei: parse_wei(
            "streamed_until_updated_at_wei",
            &req.streamed_until_updated_at_wei,
        )?,
        updated_at_timestamp: req.updated_at_timestamp,
    };
    let total = stream.streamed_at(req.at);
    Ok(Json(json!({
        "streamed_wei": total.to_string(),
        "streamed": format_token_amount(total, SUPER_TOKEN_DECIMALS).ok(),
    })))
}

async fn periods(Json(req): Json<PeriodsRequest>) -> ApiResult<Vec<PeriodResponse>> {
    let rate = parse_wei("flow_rate_wei", &req.flow_rate_wei)?;
    let period: AccountingPeriod = req.period.parse()?;
    let periods = split_stream_into_periods(rate, req.start, req.end, period)?;

    Ok(Json(
        periods
            .into_iter()
            .map(|p| PeriodResponse {
                period_start: p.period_start,
                period_end: p.period_end,
                amount_wei: p.amount_wei.to_string(),
                amount: format_token_amount(p.amount_wei, SUPER_TOKEN_DECIMALS).ok(),
            })
            .collect(),
    ))
}
