//! DigitalNest Offers - Offer Management Service

use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::{get, put}, Json, Router};
use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use nest_offers::domain::events::OfferEvent;
use nest_offers::{
    IssueOfferRequest, Offer, OfferError, OfferPage, OfferService, OfferStatus, PageRequest,
    PgOfferStore,
};

#[derive(Clone)]
pub struct AppState {
    pub offers: Arc<OfferService<PgOfferStore>>,
    pub nats: Option<async_nats::Client>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let db = PgPoolOptions::new().max_connections(10).acquire_timeout(std::time::Duration::from_secs(5)).connect(&std::env::var("DATABASE_URL")?).await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    let nats = match std::env::var("NATS_URL") {
        Ok(url) => async_nats::connect(&url).await.ok(),
        Err(_) => None,
    };
    let state = AppState { offers: Arc::new(OfferService::new(PgOfferStore::new(db))), nats };

    let app = Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "nest-offers"})) }))
        .route("/api/v1/clients/:id/offers", get(list_client_offers).post(issue_client_offer))
        .route("/api/v1/vendors/:id/offers", get(list_vendor_offers).post(issue_vendor_offer))
        .route("/api/v1/offers/:id", get(get_offer))
        .route("/api/v1/offers/:id/status", put(update_offer_status))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "8084".to_string());
    tracing::info!("nest-offers listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}

fn error_response(e: OfferError) -> (StatusCode, String) {
    let status = match &e {
        OfferError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        OfferError::DuplicateCode(_) => StatusCode::CONFLICT,
        OfferError::NotFound => StatusCode::NOT_FOUND,
        OfferError::CodeGeneration { .. } | OfferError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

/// Fire-and-forget event publication; a broker outage never fails the request.
async fn publish(state: &AppState, event: OfferEvent) {
    let Some(nats) = &state.nats else { return };
    let payload = match serde_json::to_vec(&event) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize offer event");
            return;
        }
    };
    if let Err(e) = nats.publish(event.subject().to_string(), payload.into()).await {
        tracing::warn!(error = %e, subject = event.subject(), "failed to publish offer event");
    }
}

#[derive(Debug, Deserialize)] pub struct ListParams { pub page: Option<u32>, pub per_page: Option<u32> }

impl ListParams {
    fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(1).max(1), self.per_page.unwrap_or(20).clamp(1, 100))
    }
}

async fn issue_client_offer(State(s): State<AppState>, Path(id): Path<String>, Json(r): Json<IssueOfferRequest>) -> Result<(StatusCode, Json<Offer>), (StatusCode, String)> {
    let offer = s.offers.issue_client_offer(&id, r).await.map_err(error_response)?;
    publish(&s, OfferEvent::Issued { offer_id: offer.id, recipient_type: offer.recipient_type, recipient_id: offer.recipient_id.clone(), code: offer.code.clone() }).await;
    Ok((StatusCode::CREATED, Json(offer)))
}

async fn issue_vendor_offer(State(s): State<AppState>, Path(id): Path<String>, Json(r): Json<IssueOfferRequest>) -> Result<(StatusCode, Json<Offer>), (StatusCode, String)> {
    let offer = s.offers.issue_vendor_offer(&id, r).await.map_err(error_response)?;
    publish(&s, OfferEvent::Issued { offer_id: offer.id, recipient_type: offer.recipient_type, recipient_id: offer.recipient_id.clone(), code: offer.code.clone() }).await;
    Ok((StatusCode::CREATED, Json(offer)))
}

async fn list_client_offers(State(s): State<AppState>, Path(id): Path<String>, Query(p): Query<ListParams>) -> Result<Json<OfferPage>, (StatusCode, String)> {
    s.offers.client_offer_page(&id, p.page_request()).await.map(Json).map_err(error_response)
}

async fn list_vendor_offers(State(s): State<AppState>, Path(id): Path<String>, Query(p): Query<ListParams>) -> Result<Json<OfferPage>, (StatusCode, String)> {
    s.offers.vendor_offer_page(&id, p.page_request()).await.map(Json).map_err(error_response)
}

async fn get_offer(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Offer>, (StatusCode, String)> {
    s.offers.get_offer(id).await.map(Json).map_err(error_response)
}

#[derive(Debug, Deserialize)] pub struct UpdateStatusRequest { pub status: OfferStatus }

async fn update_offer_status(State(s): State<AppState>, Path(id): Path<Uuid>, Json(r): Json<UpdateStatusRequest>) -> Result<Json<Offer>, (StatusCode, String)> {
    let offer = s.offers.set_status(id, r.status).await.map_err(error_response)?;
    publish(&s, OfferEvent::StatusChanged { offer_id: offer.id, status: offer.status }).await;
    Ok(Json(offer))
}
