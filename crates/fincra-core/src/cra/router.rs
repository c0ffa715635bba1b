use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::error;

use super::batch::BatchReport;
use super::domain::{CraInput, CraOutput};
use super::engine_config::{EngineConfig, PartialEngineConfig};
use super::service::CraService;
use super::store::ConfigStore;
use super::summary::RuleSetSummary;
use crate::error::AppError;

const MISSING_INPUT: &str = "Body must include { input: CraInput }";
const MISSING_RECORDS: &str = "Body must include { records: [CraInput] }";
const CALCULATION_FAILED: &str = "CRA calculation failed";

/// Router builder exposing the CRA endpoints.
pub fn cra_router<S>(service: Arc<CraService<S>>) -> Router
where
    S: ConfigStore + 'static,
{
    Router::new()
        .route("/cra/calculate", post(calculate_handler::<S>))
        .route("/cra/simulate", post(simulate_handler::<S>))
        .route(
            "/cra/config",
            get(config_handler::<S>).put(update_config_handler::<S>),
        )
        .route("/cra/ruleset", get(ruleset_handler::<S>))
        .with_state(service)
}

pub(crate) async fn calculate_handler<S>(
    State(service): State<Arc<CraService<S>>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CraOutput>, AppError>
where
    S: ConfigStore + 'static,
{
    let mut body = json_body(payload)?;
    let input = match body.get_mut("input").map(Value::take) {
        Some(input @ Value::Object(_)) => CraInput::from_value(input)?,
        _ => return Err(AppError::BadInput(MISSING_INPUT.to_string())),
    };
    let config = requested_config(&mut body)?;

    match panic::catch_unwind(AssertUnwindSafe(|| service.calculate(&input, config))) {
        Ok(result) => Ok(Json(result?)),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(%message, "cra calculation panicked");
            Err(AppError::Internal(message))
        }
    }
}

pub(crate) async fn simulate_handler<S>(
    State(service): State<Arc<CraService<S>>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BatchReport>, AppError>
where
    S: ConfigStore + 'static,
{
    let mut body = json_body(payload)?;
    let records = match body.get_mut("records").map(Value::take) {
        Some(Value::Array(records)) => records,
        _ => return Err(AppError::BadInput(MISSING_RECORDS.to_string())),
    };
    let config = requested_config(&mut body)?;

    let report = service.simulate(records, config)?;
    Ok(Json(report))
}

pub(crate) async fn config_handler<S>(
    State(service): State<Arc<CraService<S>>>,
) -> Result<Json<EngineConfig>, AppError>
where
    S: ConfigStore + 'static,
{
    Ok(Json(service.active_config()?))
}

pub(crate) async fn update_config_handler<S>(
    State(service): State<Arc<CraService<S>>>,
    payload: Result<Json<PartialEngineConfig>, JsonRejection>,
) -> Result<Json<EngineConfig>, AppError>
where
    S: ConfigStore + 'static,
{
    let Json(partial) = payload.map_err(|rejection| AppError::BadInput(rejection.body_text()))?;
    Ok(Json(service.update_config(partial)?))
}

pub(crate) async fn ruleset_handler<S>(
    State(service): State<Arc<CraService<S>>>,
) -> Result<Json<RuleSetSummary>, AppError>
where
    S: ConfigStore + 'static,
{
    Ok(Json(service.ruleset()?))
}

fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    let Json(body) = payload.map_err(|rejection| AppError::BadInput(rejection.body_text()))?;
    if body.is_object() {
        Ok(body)
    } else {
        Err(AppError::BadInput("request body must be a JSON object".to_string()))
    }
}

/// `config` is optional; `null` counts as absent.
fn requested_config(body: &mut Value) -> Result<Option<PartialEngineConfig>, AppError> {
    match body.get_mut("config").map(Value::take) {
        None | Some(Value::Null) => Ok(None),
        Some(raw) => serde_json::from_value(raw)
            .map(Some)
            .map_err(|err| AppError::BadInput(format!("invalid config: {err}"))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        CALCULATION_FAILED.to_string()
    }
}
