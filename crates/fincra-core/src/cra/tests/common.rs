use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::Value;
use tower::ServiceExt;

use crate::cra::engine_config::EngineConfig;
use crate::cra::scorecards::{Scorecard, ScorecardSet, ScorecardStore};
use crate::cra::store::{ConfigStore, ConfigStoreError};
use crate::cra::{cra_router, CraService, Pillar};

/// Tables scoring `harbour_trade_input` as geo 4, ind 2, ent 3, prod 5, deliv 1
/// (deliv only reaches 1 when the configured delivery default is 1).
pub(super) fn scorecards() -> ScorecardSet {
    ScorecardSet::default()
        .with(
            Pillar::Geography,
            Scorecard::from_entries([("GB", 4.0), ("AE", 3.0), ("IR", 5.0)]),
        )
        .with(
            Pillar::Industry,
            Scorecard::from_entries([("6419", 2.0), ("1190", 5.0), ("default", 3.0)]),
        )
        .with(
            Pillar::Entity,
            Scorecard::from_entries([("LLC", 3.0), ("PLC", 1.0)]),
        )
        .with(
            Pillar::Product,
            Scorecard::from_entries([("trade_finance", 5.0), ("current_account", 1.0)]),
        )
        .with(
            Pillar::Delivery,
            Scorecard::from_entries([("online", 1.0), ("intermediary", 4.0)]),
        )
}

pub(super) fn harbour_trade_input() -> Value {
    serde_json::json!({
        "record_id": "CRA-D",
        "entity_name": "Harbour Trade LLC",
        "country_code": "GB",
        "industry_code": "6419",
        "entity_type": "LLC",
        "product_type": "Trade Finance",
        "delivery_data": { "channels": ["Online"] },
        "pep_count": 0,
        "sanction_match": false,
    })
}

#[derive(Default)]
pub(super) struct MemoryConfigStore {
    saved: Mutex<Option<EngineConfig>>,
}

impl MemoryConfigStore {
    pub(super) fn saved(&self) -> Option<EngineConfig> {
        self.saved.lock().expect("store mutex poisoned").clone()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<EngineConfig, ConfigStoreError> {
        Ok(self.saved().unwrap_or_default())
    }

    fn save(&self, config: &EngineConfig) -> Result<(), ConfigStoreError> {
        *self.saved.lock().expect("store mutex poisoned") = Some(config.clone());
        Ok(())
    }
}

pub(super) struct UnavailableConfigStore;

impl ConfigStore for UnavailableConfigStore {
    fn load(&self) -> Result<EngineConfig, ConfigStoreError> {
        Err(ConfigStoreError::Unavailable("config volume offline".to_string()))
    }

    fn save(&self, _config: &EngineConfig) -> Result<(), ConfigStoreError> {
        Err(ConfigStoreError::Unavailable("config volume offline".to_string()))
    }
}

pub(super) struct PanickingConfigStore;

impl ConfigStore for PanickingConfigStore {
    fn load(&self) -> Result<EngineConfig, ConfigStoreError> {
        panic!("config snapshot corrupted");
    }

    fn save(&self, _config: &EngineConfig) -> Result<(), ConfigStoreError> {
        Ok(())
    }
}

pub(super) fn build_service() -> (CraService<MemoryConfigStore>, Arc<MemoryConfigStore>) {
    let store = Arc::new(MemoryConfigStore::default());
    let service = CraService::new(
        store.clone(),
        Arc::new(ScorecardStore::inline(scorecards())),
    );
    (service, store)
}

pub(super) fn router_with_store<S>(store: S) -> axum::Router
where
    S: ConfigStore + 'static,
{
    let service = CraService::new(
        Arc::new(store),
        Arc::new(ScorecardStore::inline(scorecards())),
    );
    cra_router(Arc::new(service))
}

pub(super) async fn send_json(
    router: axum::Router,
    method: &str,
    uri: &str,
    body: &Value,
) -> Response {
    router
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .expect("route executes")
}

pub(super) async fn get(router: axum::Router, uri: &str) -> Response {
    router
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .expect("route executes")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
