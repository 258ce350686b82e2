//! Gadget HTTP Routes
//!
//! Every route requires an authenticated principal.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Json, Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::gadgets::{Gadget, GadgetPatch, GadgetStatus};

use super::error::ApiError;
use super::extract::CurrentPrincipal;
use super::state::{run_blocking, AppState};

/// Gadget routes with shared state
pub fn gadget_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/",
            get(list_handler).post(create_handler).patch(update_handler),
        )
        .route("/:id", get(get_handler).delete(decommission_handler))
        .route("/:id/self-destruct", post(self_destruct_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateGadgetRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGadgetRequest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GadgetResponse {
    pub message: &'static str,
    pub gadget: Gadget,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestroyedGadgetResponse {
    pub message: &'static str,
    pub destroyed_gadget: Gadget,
}

fn parse_status(value: Option<String>) -> Result<Option<GadgetStatus>, ApiError> {
    value
        .map(|s| s.parse::<GadgetStatus>())
        .transpose()
        .map_err(ApiError::from)
}

fn parse_id(value: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value.trim()).map_err(|_| ApiError::validation("Invalid gadget id"))
}

/// Deserialize an optional JSON body; an empty body yields the default
fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::validation(format!("Invalid request body: {e}")))
}

async fn list_handler(
    State(state): State<Arc<AppState>>,
    _principal: CurrentPrincipal,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Gadget>>, ApiError> {
    let Query(query) = query?;
    // `?status=` with no value means no filter
    let status = parse_status(query.status.filter(|s| !s.is_empty()))?;

    let gadgets = state.gadgets.clone();
    let list = run_blocking(move || gadgets.list(status)).await?;
    Ok(Json(list))
}

async fn get_handler(
    State(state): State<Arc<AppState>>,
    _principal: CurrentPrincipal,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Gadget>, ApiError> {
    let Path(id) = id?;
    let gadgets = state.gadgets.clone();
    let gadget = run_blocking(move || gadgets.get(id)).await?;
    Ok(Json(gadget))
}

async fn create_handler(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    body: Bytes,
) -> Result<(StatusCode, Json<GadgetResponse>), ApiError> {
    let request: CreateGadgetRequest = optional_json(&body)?;
    let status = parse_status(request.status)?;

    let gadgets = state.gadgets.clone();
    let gadget = run_blocking(move || gadgets.create(status, principal.id)).await?;
    Ok((
        StatusCode::CREATED,
        Json(GadgetResponse {
            message: "Gadget created successfully!",
            gadget,
        }),
    ))
}

async fn update_handler(
    State(state): State<Arc<AppState>>,
    _principal: CurrentPrincipal,
    payload: Result<Json<UpdateGadgetRequest>, JsonRejection>,
) -> Result<Json<GadgetResponse>, ApiError> {
    let Json(request) = payload?;
    let id = match request.id.as_deref() {
        Some(id) if !id.trim().is_empty() => parse_id(id)?,
        _ => return Err(ApiError::validation("ID is required")),
    };
    let patch = GadgetPatch {
        name: request.name,
        status: parse_status(request.status)?,
    };

    let gadgets = state.gadgets.clone();
    let gadget = run_blocking(move || gadgets.update(id, patch)).await?;
    Ok(Json(GadgetResponse {
        message: "Gadget updated successfully",
        gadget,
    }))
}

async fn decommission_handler(
    State(state): State<Arc<AppState>>,
    _principal: CurrentPrincipal,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<GadgetResponse>, ApiError> {
    let Path(id) = id?;
    let gadgets = state.gadgets.clone();
    let gadget = run_blocking(move || gadgets.decommission(id)).await?;
    Ok(Json(GadgetResponse {
        message: "Gadget decommissioned successfully",
        gadget,
    }))
}

async fn self_destruct_handler(
    State(state): State<Arc<AppState>>,
    _principal: CurrentPrincipal,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DestroyedGadgetResponse>, ApiError> {
    let Path(id) = id?;
    let gadgets = state.gadgets.clone();
    let gadget = run_blocking(move || gadgets.self_destruct(id)).await?;
    Ok(Json(DestroyedGadgetResponse {
        message: "Gadget destroyed successfully",
        destroyed_gadget: gadget,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(None).unwrap(), None);
        assert_eq!(
            parse_status(Some("deployed".into())).unwrap(),
            Some(GadgetStatus::Deployed)
        );
        assert!(parse_status(Some("lost".into())).is_err());
    }

    #[test]
    fn test_optional_json_accepts_empty_body() {
        let request: CreateGadgetRequest = optional_json(&Bytes::new()).unwrap();
        assert!(request.status.is_none());

        let request: CreateGadgetRequest =
            optional_json(&Bytes::from_static(br#"{"status":"deployed"}"#)).unwrap();
        assert_eq!(request.status.as_deref(), Some("deployed"));

        assert!(optional_json::<CreateGadgetRequest>(&Bytes::from_static(b"{oops")).is_err());
    }

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
        assert!(parse_id("not-a-uuid").is_err());
    }
}
