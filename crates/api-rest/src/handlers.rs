//! Request handlers. Each one parses wire types, calls a core service and maps the result.

use crate::{reject, ApiResult, AppState};
use api_shared::inventory::inventory_key;
use api_shared::{
    AlternativesRes, DonationCompletedReq, DonationCompletedRes, ErrorRes, HealthRes,
    HealthService, HospitalSummaryRes, InventoryRecordRes, MatchReq, MatchRes,
    RegionalInventoryRes, StockChangeReq, SupplyOverviewRes, SupplyQuery,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use hemo_core::{Notice, RecordId};

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/matches",
    request_body = MatchReq,
    responses(
        (status = 200, description = "Compatible donors, best first", body = MatchRes),
        (status = 400, description = "Invalid request", body = ErrorRes),
        (status = 503, description = "Donor directory unavailable", body = ErrorRes)
    )
)]
/// Ranks compatible donors near the request and optionally notifies them.
///
/// A notification failure does not fail the match; `notified` is then absent.
#[axum::debug_handler]
pub async fn find_matches(
    State(state): State<AppState>,
    Json(req): Json<MatchReq>,
) -> ApiResult<MatchRes> {
    let request = req
        .to_request(state.clock.now())
        .map_err(|e| reject("parse match request", e))?;
    let radius = req
        .search_radius_km
        .unwrap_or_else(|| state.cfg.search_radius_km());

    let result = state
        .matching
        .find_matches(&request, radius)
        .await
        .map_err(|e| reject("find matches", e))?;

    let notified = if req.notify_donors {
        let recipients: Vec<RecordId> = result.matches.iter().map(|m| m.donor.id.clone()).collect();
        match state
            .notifier
            .notify(&recipients, &Notice::for_request(&request))
            .await
        {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::error!(
                    request_id = %request.id(),
                    error = %e,
                    "donor notification failed"
                );
                None
            }
        }
    } else {
        None
    };

    Ok(Json(MatchRes::from_result(&result, notified)))
}

#[utoipa::path(
    post,
    path = "/matches/alternatives",
    request_body = MatchReq,
    responses(
        (status = 200, description = "Emergency alternate blood types", body = AlternativesRes),
        (status = 400, description = "Invalid request", body = ErrorRes),
        (status = 503, description = "Donor directory unavailable", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn find_alternatives(
    State(state): State<AppState>,
    Json(req): Json<MatchReq>,
) -> ApiResult<AlternativesRes> {
    let request = req
        .to_request(state.clock.now())
        .map_err(|e| reject("parse alternatives request", e))?;
    let report = state
        .matching
        .find_alternatives(&request)
        .await
        .map_err(|e| reject("find alternatives", e))?;
    Ok(Json((&report).into()))
}

#[utoipa::path(
    get,
    path = "/supply",
    params(SupplyQuery),
    responses(
        (status = 200, description = "Donor supply per blood type", body = SupplyOverviewRes),
        (status = 400, description = "Invalid location or radius", body = ErrorRes),
        (status = 503, description = "Donor directory unavailable", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn supply_overview(
    State(state): State<AppState>,
    Query(query): Query<SupplyQuery>,
) -> ApiResult<SupplyOverviewRes> {
    let location = query.location().map_err(|e| reject("parse supply query", e))?;
    let radius = query.radius_km.unwrap_or_else(|| state.cfg.search_radius_km());
    let overview = state
        .supply
        .blood_supply_overview(location, radius)
        .await
        .map_err(|e| reject("supply overview", e))?;
    Ok(Json((&overview).into()))
}

#[utoipa::path(
    get,
    path = "/supply/inventory",
    params(SupplyQuery),
    responses(
        (status = 200, description = "Hospital stock rolled up per blood type", body = RegionalInventoryRes),
        (status = 400, description = "Invalid location or radius", body = ErrorRes),
        (status = 503, description = "Hospital directory unavailable", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn regional_inventory(
    State(state): State<AppState>,
    Query(query): Query<SupplyQuery>,
) -> ApiResult<RegionalInventoryRes> {
    let location = query.location().map_err(|e| reject("parse supply query", e))?;
    let radius = query.radius_km.unwrap_or_else(|| state.cfg.search_radius_km());
    let inventory = state
        .supply
        .regional_inventory(location, radius)
        .await
        .map_err(|e| reject("regional inventory", e))?;
    Ok(Json((&inventory).into()))
}

#[utoipa::path(
    get,
    path = "/inventory/{hospital_id}/{blood_type}",
    params(
        ("hospital_id" = String, Path, description = "Hospital id, 32-char lowercase hex"),
        ("blood_type" = String, Path, description = "Blood type, e.g. `a-pos`")
    ),
    responses(
        (status = 200, description = "Inventory record", body = InventoryRecordRes),
        (status = 400, description = "Invalid path", body = ErrorRes),
        (status = 404, description = "No record for this hospital and blood type", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn read_inventory(
    State(state): State<AppState>,
    Path((hospital_id, blood_type)): Path<(String, String)>,
) -> ApiResult<InventoryRecordRes> {
    let key =
        inventory_key(&hospital_id, &blood_type).map_err(|e| reject("parse inventory key", e))?;
    let record = state
        .ledger
        .record(&key)
        .await
        .map_err(|e| reject("read inventory", e))?;
    Ok(Json((&record).into()))
}

#[utoipa::path(
    post,
    path = "/inventory/{hospital_id}/{blood_type}/add",
    params(
        ("hospital_id" = String, Path, description = "Hospital id, 32-char lowercase hex"),
        ("blood_type" = String, Path, description = "Blood type, e.g. `a-pos`")
    ),
    request_body = StockChangeReq,
    responses(
        (status = 200, description = "Updated inventory record", body = InventoryRecordRes),
        (status = 400, description = "Invalid quantity or options", body = ErrorRes),
        (status = 503, description = "Inventory store unavailable", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn add_stock(
    State(state): State<AppState>,
    Path((hospital_id, blood_type)): Path<(String, String)>,
    Json(req): Json<StockChangeReq>,
) -> ApiResult<InventoryRecordRes> {
    let key =
        inventory_key(&hospital_id, &blood_type).map_err(|e| reject("parse inventory key", e))?;
    let opts = req.to_options().map_err(|e| reject("parse stock options", e))?;
    let record = state
        .ledger
        .add_stock(key, req.quantity, opts)
        .await
        .map_err(|e| reject("add stock", e))?;
    Ok(Json((&record).into()))
}

#[utoipa::path(
    post,
    path = "/inventory/{hospital_id}/{blood_type}/reserve",
    params(
        ("hospital_id" = String, Path, description = "Hospital id, 32-char lowercase hex"),
        ("blood_type" = String, Path, description = "Blood type, e.g. `a-pos`")
    ),
    request_body = StockChangeReq,
    responses(
        (status = 200, description = "Updated inventory record", body = InventoryRecordRes),
        (status = 400, description = "Invalid quantity or options", body = ErrorRes),
        (status = 404, description = "No record for this hospital and blood type", body = ErrorRes),
        (status = 409, description = "Not enough available stock", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn reserve_stock(
    State(state): State<AppState>,
    Path((hospital_id, blood_type)): Path<(String, String)>,
    Json(req): Json<StockChangeReq>,
) -> ApiResult<InventoryRecordRes> {
    let key =
        inventory_key(&hospital_id, &blood_type).map_err(|e| reject("parse inventory key", e))?;
    let opts = req.to_options().map_err(|e| reject("parse stock options", e))?;
    let record = state
        .ledger
        .reserve_stock(key, req.quantity, opts)
        .await
        .map_err(|e| reject("reserve stock", e))?;
    Ok(Json((&record).into()))
}

#[utoipa::path(
    post,
    path = "/inventory/{hospital_id}/{blood_type}/release",
    params(
        ("hospital_id" = String, Path, description = "Hospital id, 32-char lowercase hex"),
        ("blood_type" = String, Path, description = "Blood type, e.g. `a-pos`")
    ),
    request_body = StockChangeReq,
    responses(
        (status = 200, description = "Updated inventory record", body = InventoryRecordRes),
        (status = 400, description = "Invalid quantity or options", body = ErrorRes),
        (status = 404, description = "No record for this hospital and blood type", body = ErrorRes),
        (status = 409, description = "Not enough reserved stock", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn release_stock(
    State(state): State<AppState>,
    Path((hospital_id, blood_type)): Path<(String, String)>,
    Json(req): Json<StockChangeReq>,
) -> ApiResult<InventoryRecordRes> {
    let key =
        inventory_key(&hospital_id, &blood_type).map_err(|e| reject("parse inventory key", e))?;
    let opts = req.to_options().map_err(|e| reject("parse stock options", e))?;
    let record = state
        .ledger
        .release_reserved_stock(key, req.quantity, opts)
        .await
        .map_err(|e| reject("release stock", e))?;
    Ok(Json((&record).into()))
}

#[utoipa::path(
    get,
    path = "/hospitals/{hospital_id}/summary",
    params(
        ("hospital_id" = String, Path, description = "Hospital id, 32-char lowercase hex")
    ),
    responses(
        (status = 200, description = "Stock totals, low stock and expiring units", body = HospitalSummaryRes),
        (status = 400, description = "Invalid hospital id", body = ErrorRes),
        (status = 503, description = "Inventory store unavailable", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn hospital_summary(
    State(state): State<AppState>,
    Path(hospital_id): Path<String>,
) -> ApiResult<HospitalSummaryRes> {
    let hospital_id = RecordId::parse(&hospital_id)
        .map_err(|e| reject("parse hospital id", e.into()))?;
    let summary = state
        .ledger
        .hospital_summary(&hospital_id)
        .await
        .map_err(|e| reject("hospital summary", e))?;
    Ok(Json((&summary).into()))
}

#[utoipa::path(
    post,
    path = "/donations/completed",
    request_body = DonationCompletedReq,
    responses(
        (status = 200, description = "Stock added; profile update status reported", body = DonationCompletedRes),
        (status = 400, description = "Invalid donation", body = ErrorRes),
        (status = 503, description = "Inventory store unavailable", body = ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn donation_completed(
    State(state): State<AppState>,
    Json(req): Json<DonationCompletedReq>,
) -> ApiResult<DonationCompletedRes> {
    let event = req.to_event().map_err(|e| reject("parse donation", e))?;
    let outcome = state
        .donations
        .handle(&event)
        .await
        .map_err(|e| reject("record donation", e))?;
    Ok(Json((&outcome).into()))
}
