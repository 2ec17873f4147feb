//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::ApiError;
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use comic_courier_core::domain::{InteractionEvent, PreferencesUpdate, UserPreferences};
use comic_courier_core::ports::PortError;
use comic_courier_core::selector::select_comic_number;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        random_comic_handler,
        explanation_handler,
        preferences_handler,
        update_preferences_handler,
        record_interaction_handler,
    ),
    components(
        schemas(
            RandomComicResponse,
            ExplanationResponse,
            PreferencesResponse,
            UpdatePreferencesRequest,
            UpdatePreferencesResponse,
            RecordInteractionRequest,
            RecordInteractionResponse,
        )
    ),
    tags(
        (name = "Comic Courier API", description = "API endpoints for random comic delivery, stored explanations, user preferences, and interaction analytics.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A randomly selected comic, served from the cache or freshly fetched.
#[derive(Debug, Serialize, ToSchema)]
pub struct RandomComicResponse {
    /// The decimal string form of `num`, the comic's externally visible id.
    pub id: String,
    pub num: i32,
    pub title: String,
    pub img: String,
    pub alt: String,
    #[serde(rename = "dateFetched")]
    pub date_fetched: DateTime<Utc>,
}

/// The stored explanation for one comic.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExplanationResponse {
    #[serde(rename = "comicId")]
    pub comic_id: String,
    pub title: String,
    pub explanation: String,
    pub source: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

/// A user's current settings and activity lists.
#[derive(Debug, Serialize, ToSchema)]
pub struct PreferencesResponse {
    pub favorites: Vec<i32>,
    pub recent_views: Vec<i32>,
    pub display_mode: String,
    pub random_range: i32,
}

impl From<UserPreferences> for PreferencesResponse {
    fn from(preferences: UserPreferences) -> Self {
        Self {
            favorites: preferences.favorites,
            recent_views: preferences.recent_views,
            display_mode: preferences.display_mode,
            random_range: preferences.random_range,
        }
    }
}

/// A partial preferences update; omitted fields are left unchanged.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePreferencesRequest {
    pub display_mode: Option<String>,
    pub random_range: Option<i32>,
    pub favorites: Option<Vec<i32>>,
}

/// Confirms a preferences update and echoes the resulting state.
#[derive(Debug, Serialize, ToSchema)]
pub struct UpdatePreferencesResponse {
    pub success: bool,
    pub updated_preferences: PreferencesResponse,
}

/// One analytics event to record.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordInteractionRequest {
    /// The kind of interaction, e.g. `comic_view` or `favorite_added`.
    #[serde(rename = "eventType")]
    pub event_type: String,
    /// Free-form metadata about the event.
    pub data: serde_json::Value,
    #[serde(rename = "userId")]
    pub user_id: Option<Uuid>,
}

/// The outcome of an attempt to record an interaction.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordInteractionResponse {
    pub success: bool,
    pub message: String,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Rejects anonymous requests on endpoints that need an identified caller.
fn require_user(current_user: CurrentUser) -> Result<Uuid, ApiError> {
    current_user.0.ok_or_else(|| {
        ApiError::Unauthorized("this endpoint requires an x-user-id header".to_string())
    })
}

/// Fetch a random comic drawn from the most recent comics.
///
/// The selection range comes from the caller's stored preferences; anonymous
/// requests use the configured default. The chosen comic is served from the
/// cache when possible and fetched from the upstream source (then cached)
/// otherwise.
#[utoipa::path(
    get,
    path = "/comic/random",
    responses(
        (status = 200, description = "A randomly selected comic", body = RandomComicResponse),
        (status = 404, description = "The x-user-id header names an unknown user"),
        (status = 500, description = "The upstream comic source failed")
    ),
    params(
        ("x-user-id" = Option<Uuid>, Header, description = "Optional caller identity; anonymous requests use the default selection range.")
    )
)]
pub async fn random_comic_handler(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<RandomComicResponse>, ApiError> {
    // 1. Determine the selection range for this caller.
    let range = match current_user.0 {
        Some(user_id) => state.preferences.preferences(user_id).await?.random_range,
        None => state.config.default_random_range,
    };

    // 2. Draw a comic number from the most recent `range` comics.
    let latest = state.source.latest_comic_number().await?;
    let num = select_comic_number(&mut rand::thread_rng(), latest, range)?;

    // 3. Serve it from the cache, fetching and persisting on a miss.
    let comic = state.comics.get_or_fetch(num).await?;

    // 4. Record the view for identified users. Both writes are best-effort:
    //    a lost view or analytics row must never fail comic delivery.
    if let Some(user_id) = current_user.0 {
        if let Err(e) = state.preferences.record_view(user_id, comic.num).await {
            warn!(%user_id, num = comic.num, "failed to record view history: {e}");
        }
        let event = InteractionEvent::new(
            "comic_view".to_string(),
            json!({ "comicId": comic.num.to_string() }),
            Some(user_id),
        );
        if let Err(e) = state.interactions.insert_event(&event).await {
            warn!(%user_id, num = comic.num, "failed to record comic_view event: {e}");
        }
    }

    Ok(Json(RandomComicResponse {
        id: comic.num.to_string(),
        num: comic.num,
        title: comic.title,
        img: comic.img,
        alt: comic.alt,
        date_fetched: comic.date_fetched,
    }))
}

/// Fetch the stored explanation for a comic.
#[utoipa::path(
    get,
    path = "/explanation/{comicId}",
    responses(
        (status = 200, description = "The stored explanation", body = ExplanationResponse),
        (status = 400, description = "comicId is not a number"),
        (status = 404, description = "No explanation is stored for this comic"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("comicId" = String, Path, description = "The comic's numeric id.")
    )
)]
pub async fn explanation_handler(
    State(state): State<Arc<AppState>>,
    Path(comic_id): Path<String>,
) -> Result<Json<ExplanationResponse>, ApiError> {
    let num = comic_id.parse::<i32>().map_err(|_| {
        ApiError::BadRequest(format!("comicId must be a number, got '{comic_id}'"))
    })?;

    let explanation = state.store.explanation(num).await?.ok_or_else(|| {
        PortError::NotFound(format!("No explanation found for comicId: {comic_id}"))
    })?;

    // An explanation whose parent comic is missing is a data-integrity gap;
    // it gets its own log line but the same not-found answer.
    let comic = match state.store.comic(num).await? {
        Some(comic) => comic,
        None => {
            warn!(num, "explanation exists but its parent comic record is missing");
            return Err(PortError::NotFound(format!("No comic found with ID: {comic_id}")).into());
        }
    };

    Ok(Json(ExplanationResponse {
        comic_id: comic.num.to_string(),
        title: comic.title,
        explanation: explanation.content,
        source: "User Generated Content".to_string(),
        updated_at: explanation.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    }))
}

/// Fetch the calling user's preferences.
#[utoipa::path(
    get,
    path = "/preferences",
    responses(
        (status = 200, description = "The user's current preferences", body = PreferencesResponse),
        (status = 401, description = "No x-user-id header supplied"),
        (status = 404, description = "The user does not exist")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The calling user.")
    )
)]
pub async fn preferences_handler(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<PreferencesResponse>, ApiError> {
    let user_id = require_user(current_user)?;
    let preferences = state.preferences.preferences(user_id).await?;
    Ok(Json(preferences.into()))
}

/// Update the calling user's preferences.
///
/// Only the supplied fields change. The update never creates a user: an
/// unknown `x-user-id` is answered with 404 and leaves nothing behind.
#[utoipa::path(
    put,
    path = "/preferences/update",
    request_body = UpdatePreferencesRequest,
    responses(
        (status = 200, description = "Preferences updated", body = UpdatePreferencesResponse),
        (status = 400, description = "Invalid field value"),
        (status = 401, description = "No x-user-id header supplied"),
        (status = 404, description = "The user does not exist")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The calling user.")
    )
)]
pub async fn update_preferences_handler(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    Json(body): Json<UpdatePreferencesRequest>,
) -> Result<Json<UpdatePreferencesResponse>, ApiError> {
    let user_id = require_user(current_user)?;

    // Field validation happens before any storage call so a rejected update
    // cannot leave a partial write behind.
    if let Some(mode) = &body.display_mode {
        if mode.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "display_mode must not be empty".to_string(),
            ));
        }
    }
    if let Some(range) = body.random_range {
        if range < 1 {
            return Err(ApiError::BadRequest(format!(
                "random_range must be at least 1, got {range}"
            )));
        }
    }

    let update = PreferencesUpdate {
        display_mode: body.display_mode,
        random_range: body.random_range,
        favorites: body.favorites,
    };
    let updated = state.preferences.update_preferences(user_id, update).await?;

    Ok(Json(UpdatePreferencesResponse {
        success: true,
        updated_preferences: updated.into(),
    }))
}

/// Record one analytics event.
///
/// Analytics are best-effort by policy: a storage failure is reported in the
/// response body as `success: false` and logged, never surfaced as an error
/// status. Losing an event is acceptable; blocking the caller is not.
#[utoipa::path(
    post,
    path = "/analytics/interaction",
    request_body = RecordInteractionRequest,
    responses(
        (status = 200, description = "The recording attempt's outcome", body = RecordInteractionResponse)
    )
)]
pub async fn record_interaction_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RecordInteractionRequest>,
) -> Json<RecordInteractionResponse> {
    if body.event_type.trim().is_empty() {
        return Json(RecordInteractionResponse {
            success: false,
            message: "eventType must not be empty".to_string(),
        });
    }

    let event = InteractionEvent::new(body.event_type, body.data, body.user_id);
    match state.interactions.insert_event(&event).await {
        Ok(()) => Json(RecordInteractionResponse {
            success: true,
            message: "Interaction recorded successfully.".to_string(),
        }),
        Err(e) => {
            warn!(event_type = %event.event_type, "failed to record interaction: {e}");
            Json(RecordInteractionResponse {
                success: false,
                message: format!("Failed to record interaction: {e}"),
            })
        }
    }
}

//=========================================================================================
// Tests
//=========================================================================================
