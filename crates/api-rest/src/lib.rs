//! # API REST
//!
//! REST API implementation for HEMO.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Uses `api-shared` for request/response types and `hemo-core` for everything else.

#![warn(rust_2018_idioms)]

pub mod handlers;

use api_shared::{
    AlertDto, AlternativeDto, AlternativesRes, BloodTypeStockDto, BloodTypeSupplyDto,
    CoordinateDto, DonationCompletedReq, DonationCompletedRes, DonorDto, ErrorRes,
    ExpiringGroupDto, ExpiryEntryDto, HealthRes, HospitalSummaryRes, InventoryRecordRes,
    LowStockAlertDto, MatchReq, MatchRes, MatchedDonorDto, MovementDto, RegionalInventoryRes,
    RegionalStockDto, SkippedHospitalDto, StockChangeReq, SupplyOverviewRes,
};
use axum::{
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use hemo_core::directory::{DonorDirectory, DonorRegistry, HospitalDirectory};
use hemo_core::inventory::{InventoryLedger, InventoryStore};
use hemo_core::{
    Clock, CoreConfig, CoreError, DonationCoordinator, ErrorKind, MatchingEngine, Notifier,
    SupplyAggregator,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub clock: Arc<dyn Clock>,
    pub matching: Arc<MatchingEngine>,
    pub ledger: Arc<InventoryLedger>,
    pub supply: Arc<SupplyAggregator>,
    pub donations: Arc<DonationCoordinator>,
    pub notifier: Arc<dyn Notifier>,
}

/// External systems the services are built on.
pub struct Collaborators {
    pub donors: Arc<dyn DonorDirectory>,
    pub registry: Arc<dyn DonorRegistry>,
    pub hospitals: Arc<dyn HospitalDirectory>,
    pub store: Arc<dyn InventoryStore>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Builds every service once. The ledger is shared by the supply aggregator and the
    /// donation coordinator so they see the same per-key locks.
    pub fn new(cfg: Arc<CoreConfig>, c: Collaborators) -> Self {
        let ledger = Arc::new(InventoryLedger::new(c.store, c.clock.clone(), &cfg));
        let matching = Arc::new(MatchingEngine::new(c.donors.clone(), c.clock.clone(), &cfg));
        let supply = Arc::new(SupplyAggregator::new(
            c.donors,
            c.hospitals,
            ledger.clone(),
            c.clock.clone(),
            &cfg,
        ));
        let donations = Arc::new(DonationCoordinator::new(ledger.clone(), c.registry, &cfg));
        Self {
            cfg,
            clock: c.clock,
            matching,
            ledger,
            supply,
            donations,
            notifier: c.notifier,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::find_matches,
        handlers::find_alternatives,
        handlers::supply_overview,
        handlers::regional_inventory,
        handlers::read_inventory,
        handlers::add_stock,
        handlers::reserve_stock,
        handlers::release_stock,
        handlers::hospital_summary,
        handlers::donation_completed,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        CoordinateDto,
        MatchReq,
        MatchRes,
        MatchedDonorDto,
        DonorDto,
        AlternativesRes,
        AlternativeDto,
        SupplyOverviewRes,
        BloodTypeSupplyDto,
        RegionalInventoryRes,
        RegionalStockDto,
        SkippedHospitalDto,
        StockChangeReq,
        InventoryRecordRes,
        ExpiryEntryDto,
        MovementDto,
        AlertDto,
        HospitalSummaryRes,
        BloodTypeStockDto,
        LowStockAlertDto,
        ExpiringGroupDto,
        DonationCompletedReq,
        DonationCompletedRes,
    ))
)]
pub struct ApiDoc;

pub(crate) type ApiError = (StatusCode, Json<ErrorRes>);
pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

/// Maps a core error onto a status code and logs it.
pub(crate) fn reject(action: &'static str, e: CoreError) -> ApiError {
    let status = match e.kind() {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::BusinessRule => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::CollaboratorFailure => StatusCode::SERVICE_UNAVAILABLE,
    };
    if status.is_server_error() {
        tracing::error!(action, error = %e, "request failed");
    } else {
        tracing::warn!(action, status = status.as_u16(), error = %e, "request rejected");
    }
    (status, Json(ErrorRes::from(&e)))
}

/// All HEMO routes plus Swagger UI, with permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/matches", post(handlers::find_matches))
        .route("/matches/alternatives", post(handlers::find_alternatives))
        .route("/supply", get(handlers::supply_overview))
        .route("/supply/inventory", get(handlers::regional_inventory))
        .route(
            "/inventory/:hospital_id/:blood_type",
            get(handlers::read_inventory),
        )
        .route(
            "/inventory/:hospital_id/:blood_type/add",
            post(handlers::add_stock),
        )
        .route(
            "/inventory/:hospital_id/:blood_type/reserve",
            post(handlers::reserve_stock),
        )
        .route(
            "/inventory/:hospital_id/:blood_type/release",
            post(handlers::release_stock),
        )
        .route(
            "/hospitals/:hospital_id/summary",
            get(handlers::hospital_summary),
        )
        .route("/donations/completed", post(handlers::donation_completed))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use hemo_core::directory::{DonorCandidate, HospitalSite, InMemoryDirectory};
    use hemo_core::inventory::MemoryInventoryStore;
    use hemo_core::{BloodType, Coordinate, CoreResult, FixedClock, Notice, RecordId};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tower::ServiceExt;

    const HOSPITAL: &str = "550e8400e29b41d4a716446655440000";
    const DONOR: &str = "0a1b2c3d4e5f60718293a4b5c6d7e8f9";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
    }

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<(Vec<RecordId>, Notice)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, recipients: &[RecordId], notice: &Notice) -> CoreResult<usize> {
            self.seen
                .lock()
                .unwrap()
                .push((recipients.to_vec(), notice.clone()));
            Ok(recipients.len())
        }
    }

    fn app() -> (Router, Arc<RecordingNotifier>) {
        let directory = Arc::new(InMemoryDirectory::new());
        directory
            .insert_donor(DonorCandidate {
                id: RecordId::parse(DONOR).unwrap(),
                name: "Ada Obi".into(),
                blood_type: BloodType::ONeg,
                location: Coordinate::new(6.52, 3.38).unwrap(),
                last_donation_date: Some(now() - Duration::days(100)),
                donation_count: 4,
                is_eligible: true,
                is_available: true,
            })
            .unwrap();
        directory
            .insert_hospital(HospitalSite {
                id: RecordId::parse(HOSPITAL).unwrap(),
                name: "Lagos General".into(),
                location: Coordinate::new(6.45, 3.4).unwrap(),
            })
            .unwrap();

        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState::new(
            Arc::new(CoreConfig::default()),
            Collaborators {
                donors: directory.clone(),
                registry: directory.clone(),
                hospitals: directory,
                store: Arc::new(MemoryInventoryStore::new()),
                notifier: notifier.clone(),
                clock: Arc::new(FixedClock(now())),
            },
        );
        (router(state), notifier)
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        let request = match body {
            Some(b) => request.body(Body::from(b.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn stock(quantity: u32) -> Value {
        json!({ "quantity": quantity })
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let (status, body) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_match_ranks_and_notifies() {
        let (app, notifier) = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/matches",
            Some(json!({
                "blood_type": "AB+",
                "units_needed": 2,
                "urgency": "critical",
                "location": { "latitude": 6.5244, "longitude": 3.3792 },
                "notify_donors": true
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["total_matches"], 1);
        assert_eq!(body["matches"][0]["donor"]["id"], DONOR);
        assert_eq!(body["notified"], 1);

        let seen = notifier.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1.blood_type, BloodType::AbPos);
    }

    #[tokio::test]
    async fn test_match_rejects_bad_units() {
        let (app, notifier) = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/matches",
            Some(json!({
                "blood_type": "O+",
                "units_needed": 0,
                "location": { "latitude": 6.5, "longitude": 3.4 },
                "notify_donors": true
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_input");
        assert!(notifier.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_alternatives_for_b_positive() {
        let (app, _) = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/matches/alternatives",
            Some(json!({
                "blood_type": "b-pos",
                "units_needed": 1,
                "location": { "latitude": 6.5, "longitude": 3.4 }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let types: Vec<&str> = body["alternatives"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["blood_type"].as_str().unwrap())
            .collect();
        assert_eq!(types, ["O-", "O+"]);
    }

    #[tokio::test]
    async fn test_reserve_release_round_and_conflict() {
        let (app, _) = app();
        let base = format!("/inventory/{HOSPITAL}/o-neg");

        let (status, _) = call(&app, Method::GET, &base, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) =
            call(&app, Method::POST, &format!("{base}/add"), Some(stock(10))).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["current_stock"], 10);

        let (status, body) =
            call(&app, Method::POST, &format!("{base}/reserve"), Some(stock(7))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["available_stock"], 3);
        assert_eq!(body["status"], "low");

        let (status, body) =
            call(&app, Method::POST, &format!("{base}/reserve"), Some(stock(4))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "business_rule");

        let (status, body) =
            call(&app, Method::POST, &format!("{base}/release"), Some(stock(2))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reserved_stock"], 5);
        let last = body["movements"].as_array().unwrap().last().unwrap().clone();
        assert_eq!(last["type"], "adjustment");
        assert_eq!(last["quantity"], -2);
    }

    #[tokio::test]
    async fn test_bad_path_is_bad_request() {
        let (app, _) = app();
        let (status, _) = call(&app, Method::GET, "/inventory/not-hex/A+", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = call(&app, Method::GET, &format!("/inventory/{HOSPITAL}/Q"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_summary_and_regional_inventory() {
        let (app, _) = app();
        let base = format!("/inventory/{HOSPITAL}/a-pos");
        call(&app, Method::POST, &format!("{base}/add"), Some(stock(2))).await;

        let (status, body) =
            call(&app, Method::GET, &format!("/hospitals/{HOSPITAL}/summary"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_stock"], 2);
        assert_eq!(body["low_stock_alerts"][0]["blood_type"], "A+");

        let (status, body) = call(
            &app,
            Method::GET,
            "/supply/inventory?latitude=6.5&longitude=3.4&radius_km=25",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hospitals_included"][0], HOSPITAL);
    }

    #[tokio::test]
    async fn test_supply_overview() {
        let (app, _) = app();
        let (status, body) =
            call(&app, Method::GET, "/supply?latitude=6.5&longitude=3.4", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_donors"], 1);
        assert_eq!(body["by_blood_type"].as_array().unwrap().len(), 8);

        let (status, _) =
            call(&app, Method::GET, "/supply?latitude=6.5&longitude=3.4&radius_km=-1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_donation_completed_adds_stock() {
        let (app, _) = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/donations/completed",
            Some(json!({
                "donation_id": "7f3e2d1c0b0a49388776655443322110",
                "donor_id": DONOR,
                "hospital_id": HOSPITAL,
                "blood_type": "O-",
                "units": 1,
                "donated_at": "2026-06-01T08:00:00Z"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["profile_updated"], true);
        assert_eq!(body["inventory"]["current_stock"], 1);
        assert_eq!(body["inventory"]["movements"][0]["reference_kind"], "donation");
    }

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/matches",
            "/matches/alternatives",
            "/supply",
            "/supply/inventory",
            "/inventory/{hospital_id}/{blood_type}",
            "/inventory/{hospital_id}/{blood_type}/add",
            "/inventory/{hospital_id}/{blood_type}/reserve",
            "/inventory/{hospital_id}/{blood_type}/release",
            "/hospitals/{hospital_id}/summary",
            "/donations/completed",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
