//! API request handlers

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use header_hub_core::{
    ActivityLogSearchCriteria, HeaderInput, HeaderSearchCriteria, LdapConfigurationInput,
    LdapConfigurationSearchCriteria, ModuleInput, ModuleSearchCriteria, PageParams, PolicyInput,
    PolicySearchCriteria, SystemInput, SystemSearchCriteria, UserInput, UserSearchCriteria,
};

use crate::{
    auth::Actor,
    extract::{AppJson, AppQuery},
    ApiError, AppState,
};

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "header-hub"
    }))
}

// ==================== System Handlers ====================

pub async fn create_system(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    AppJson(input): AppJson<SystemInput>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.systems.create(input, &actor.0).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn search_systems(
    State(state): State<Arc<AppState>>,
    AppQuery(criteria): AppQuery<SystemSearchCriteria>,
    AppQuery(page): AppQuery<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.systems.search(&criteria, page.into_page()).await?;
    Ok(Json(result))
}

pub async fn get_system(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.systems.get(&id).await?))
}

pub async fn update_system(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(actor): Extension<Actor>,
    AppJson(input): AppJson<SystemInput>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.systems.update(&id, input, &actor.0).await?))
}

pub async fn delete_system(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    state.systems.delete(&id, &actor.0).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Module Handlers ====================

pub async fn create_module(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    AppJson(input): AppJson<ModuleInput>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.modules.create(input, &actor.0).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn search_modules(
    State(state): State<Arc<AppState>>,
    AppQuery(criteria): AppQuery<ModuleSearchCriteria>,
    AppQuery(page): AppQuery<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.modules.search(&criteria, page.into_page()).await?;
    Ok(Json(result))
}

pub async fn get_module(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.modules.get(&id).await?))
}

pub async fn update_module(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(actor): Extension<Actor>,
    AppJson(input): AppJson<ModuleInput>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.modules.update(&id, input, &actor.0).await?))
}

pub async fn delete_module(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    state.modules.delete(&id, &actor.0).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Policy Handlers ====================

pub async fn create_policy(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    AppJson(input): AppJson<PolicyInput>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.policies.create(input, &actor.0).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn search_policies(
    State(state): State<Arc<AppState>>,
    AppQuery(criteria): AppQuery<PolicySearchCriteria>,
    AppQuery(page): AppQuery<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.policies.search(&criteria, page.into_page()).await?;
    Ok(Json(result))
}

pub async fn get_policy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.policies.get(&id).await?))
}

pub async fn update_policy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(actor): Extension<Actor>,
    AppJson(input): AppJson<PolicyInput>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.policies.update(&id, input, &actor.0).await?))
}

pub async fn delete_policy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    state.policies.delete(&id, &actor.0).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct DeleteIdsParams {
    /// Comma-separated policy ids.
    ids: String,
}

/// Bulk delete with single-delete semantics per id; the first failure
/// aborts the remainder.
pub async fn delete_policies(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    AppQuery(params): AppQuery<DeleteIdsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let ids: Vec<String> = params
        .ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .collect();
    state.policies.delete_by_ids(&ids, &actor.0).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Header Handlers ====================

pub async fn create_header(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    AppJson(input): AppJson<HeaderInput>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.headers.create(input, &actor.0).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn search_headers(
    State(state): State<Arc<AppState>>,
    AppQuery(criteria): AppQuery<HeaderSearchCriteria>,
    AppQuery(page): AppQuery<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.headers.search(&criteria, page.into_page()).await?;
    Ok(Json(result))
}

pub async fn get_header(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.headers.get(&id).await?))
}

pub async fn update_header(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(actor): Extension<Actor>,
    AppJson(input): AppJson<HeaderInput>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.headers.update(&id, input, &actor.0).await?))
}

pub async fn delete_header(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    state.headers.delete(&id, &actor.0).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct EvaluateParams {
    #[serde(alias = "moduleId")]
    module_id: Option<String>,
}

/// Compute the response headers the gateway should attach for a user.
pub async fn evaluate_headers(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    AppQuery(params): AppQuery<EvaluateParams>,
) -> Result<impl IntoResponse, ApiError> {
    let directory = state.open_directory().await?;
    let results = state
        .evaluator
        .evaluate(directory.as_ref(), &username, params.module_id.as_deref())
        .await?;
    Ok(Json(results))
}

// ==================== User Handlers ====================

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    AppJson(input): AppJson<UserInput>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.users.create(input, &actor.0).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn search_users(
    State(state): State<Arc<AppState>>,
    AppQuery(criteria): AppQuery<UserSearchCriteria>,
    AppQuery(page): AppQuery<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.users.search(&criteria, page.into_page()).await?;
    Ok(Json(result))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.users.get(&id).await?))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(actor): Extension<Actor>,
    AppJson(input): AppJson<UserInput>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.users.update(&id, input, &actor.0).await?))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    state.users.delete(&id, &actor.0).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== LDAP Configuration Handlers ====================

pub async fn create_ldap_configuration(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    AppJson(input): AppJson<LdapConfigurationInput>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.ldap_configurations.create(input, &actor.0).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn search_ldap_configurations(
    State(state): State<Arc<AppState>>,
    AppQuery(criteria): AppQuery<LdapConfigurationSearchCriteria>,
    AppQuery(page): AppQuery<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .ldap_configurations
        .search(&criteria, page.into_page())
        .await?;
    Ok(Json(result))
}

pub async fn get_ldap_configuration(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.ldap_configurations.get(&id).await?))
}

pub async fn update_ldap_configuration(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(actor): Extension<Actor>,
    AppJson(input): AppJson<LdapConfigurationInput>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state
            .ldap_configurations
            .update(&id, input, &actor.0)
            .await?,
    ))
}

pub async fn delete_ldap_configuration(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    state.ldap_configurations.delete(&id, &actor.0).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== LDAP Attribute Handlers ====================

/// Names of the enabled directory attributes.
pub async fn list_ldap_attributes(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.ldap_attributes.enabled_names().await?))
}

// ==================== Activity Log Handlers ====================

pub async fn search_activity_logs(
    State(state): State<Arc<AppState>>,
    AppQuery(criteria): AppQuery<ActivityLogSearchCriteria>,
    AppQuery(page): AppQuery<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .activity_logs
        .search(&criteria, page.into_page())
        .await?;
    Ok(Json(result))
}
