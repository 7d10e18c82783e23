use axum::{
	Json, Router,
	extract::{FromRequest, FromRequestParts, Path, Query, Request, State},
	http::{StatusCode, request::Parts},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::state::AppState;
use quill_service::{
	AnalyzeEntryRequest, CoachRequest, CoachResponse, CreateEntryRequest, DeleteEntryRequest,
	DeleteEntryResponse, EntryAnalysis, EntryView, Error, FindRelatedRequest, FindRelatedResponse,
	GetEntryRequest, ListEntriesRequest, ListEntriesResponse, RecapPeriod, RecapRequest,
	RecapResponse, ReflectRequest, ReflectResponse, ReindexReport, SearchRequest, SearchResponse,
	UpdateEntryRequest,
};

pub const HEADER_USER_ID: &str = "X-Quill-User-Id";

/// The journal owner, taken from the `X-Quill-User-Id` header.
#[derive(Debug, Clone)]
pub struct UserId(pub String);
impl<S> FromRequestParts<S> for UserId
where
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let value = parts
			.headers
			.get(HEADER_USER_ID)
			.and_then(|value| value.to_str().ok())
			.map(str::trim)
			.unwrap_or_default();

		if value.is_empty() {
			return Err(invalid_request(format!("{HEADER_USER_ID} header is required.")));
		}

		Ok(Self(value.to_string()))
	}
}

/// `Json` whose rejections use the API error body.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);
impl<T, S> FromRequest<S> for ApiJson<T>
where
	T: DeserializeOwned,
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let Json(value) = Json::<T>::from_request(req, state)
			.await
			.map_err(|rejection| invalid_request(rejection.body_text()))?;

		Ok(Self(value))
	}
}

/// `Path` whose rejections use the API error body.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
	T: DeserializeOwned + Send,
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let Path(value) = Path::<T>::from_request_parts(parts, state)
			.await
			.map_err(|rejection| invalid_request(rejection.body_text()))?;

		Ok(Self(value))
	}
}

/// `Query` whose rejections use the API error body.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
	T: DeserializeOwned,
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let Query(value) = Query::<T>::from_request_parts(parts, state)
			.await
			.map_err(|rejection| invalid_request(rejection.body_text()))?;

		Ok(Self(value))
	}
}

#[derive(Debug, Deserialize)]
pub struct CreateEntryBody {
	#[serde(default)]
	pub title: Option<String>,
	pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEntryBody {
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
	#[serde(default)]
	pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchBody {
	pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct ReflectBody {
	pub entry_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CoachBody {
	pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RecapBody {
	pub period: RecapPeriod,
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub end: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } => invalid_request(message),
			Error::NotFound { message } => json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message),
			Error::AnalysisFailed { message } =>
				json_error(StatusCode::UNPROCESSABLE_ENTITY, "ANALYSIS_FAILED", message),
			Error::Provider { message } => {
				tracing::error!(error = %message, "Completion provider failed.");

				json_error(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", "Completion provider failed.")
			},
			Error::Storage { message } => {
				tracing::error!(error = %message, "Storage failed.");

				json_error(
					StatusCode::SERVICE_UNAVAILABLE,
					"STORAGE_ERROR",
					"Storage is unavailable.",
				)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/entries", post(create_entry).get(list_entries))
		.route("/v1/entries/{entry_id}", get(get_entry).patch(update_entry).delete(delete_entry))
		.route("/v1/entries/{entry_id}/analysis", post(analyze_entry))
		.route("/v1/entries/{entry_id}/related", get(related_entries))
		.route("/v1/search", post(search))
		.route("/v1/reflect", post(reflect))
		.route("/v1/coach", post(coach))
		.route("/v1/recaps", post(recap))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new().route("/v1/admin/reindex", post(reindex)).with_state(state)
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}

fn invalid_request(message: impl Into<String>) -> ApiError {
	json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn create_entry(
	State(state): State<AppState>,
	UserId(user_id): UserId,
	ApiJson(body): ApiJson<CreateEntryBody>,
) -> Result<(StatusCode, Json<EntryView>), ApiError> {
	let req = CreateEntryRequest { user_id, title: body.title, content: body.content };
	let response = state.service.create_entry(req).await?;

	Ok((StatusCode::CREATED, Json(response)))
}

async fn list_entries(
	State(state): State<AppState>,
	UserId(user_id): UserId,
	ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<Json<ListEntriesResponse>, ApiError> {
	let response =
		state.service.list_entries(ListEntriesRequest { user_id, limit: query.limit }).await?;

	Ok(Json(response))
}

async fn get_entry(
	State(state): State<AppState>,
	UserId(user_id): UserId,
	ApiPath(entry_id): ApiPath<Uuid>,
) -> Result<Json<EntryView>, ApiError> {
	let response = state.service.get_entry(GetEntryRequest { user_id, entry_id }).await?;

	Ok(Json(response))
}

async fn update_entry(
	State(state): State<AppState>,
	UserId(user_id): UserId,
	ApiPath(entry_id): ApiPath<Uuid>,
	ApiJson(body): ApiJson<UpdateEntryBody>,
) -> Result<Json<EntryView>, ApiError> {
	let req = UpdateEntryRequest { user_id, entry_id, title: body.title, content: body.content };
	let response = state.service.update_entry(req).await?;

	Ok(Json(response))
}

async fn delete_entry(
	State(state): State<AppState>,
	UserId(user_id): UserId,
	ApiPath(entry_id): ApiPath<Uuid>,
) -> Result<Json<DeleteEntryResponse>, ApiError> {
	let response = state.service.delete_entry(DeleteEntryRequest { user_id, entry_id }).await?;

	Ok(Json(response))
}

async fn analyze_entry(
	State(state): State<AppState>,
	UserId(user_id): UserId,
	ApiPath(entry_id): ApiPath<Uuid>,
) -> Result<Json<EntryAnalysis>, ApiError> {
	let response = state.service.analyze_entry(AnalyzeEntryRequest { user_id, entry_id }).await?;

	Ok(Json(response))
}

async fn related_entries(
	State(state): State<AppState>,
	UserId(user_id): UserId,
	ApiPath(entry_id): ApiPath<Uuid>,
	ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<Json<FindRelatedResponse>, ApiError> {
	let req =
		FindRelatedRequest { user_id, entry_id: Some(entry_id), query: None, limit: query.limit };
	let response = state.service.find_related(req).await?;

	Ok(Json(response))
}

async fn search(
	State(state): State<AppState>,
	UserId(user_id): UserId,
	ApiJson(body): ApiJson<SearchBody>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(SearchRequest { user_id, query: body.query }).await?;

	Ok(Json(response))
}

async fn reflect(
	State(state): State<AppState>,
	UserId(user_id): UserId,
	ApiJson(body): ApiJson<ReflectBody>,
) -> Result<Json<ReflectResponse>, ApiError> {
	let response =
		state.service.reflect(ReflectRequest { user_id, entry_id: body.entry_id }).await?;

	Ok(Json(response))
}

async fn coach(
	State(state): State<AppState>,
	UserId(user_id): UserId,
	ApiJson(body): ApiJson<CoachBody>,
) -> Result<Json<CoachResponse>, ApiError> {
	let response = state.service.coach(CoachRequest { user_id, message: body.message }).await?;

	Ok(Json(response))
}

async fn recap(
	State(state): State<AppState>,
	UserId(user_id): UserId,
	ApiJson(body): ApiJson<RecapBody>,
) -> Result<Json<RecapResponse>, ApiError> {
	let req = RecapRequest { user_id, period: body.period, end: body.end };
	let response = state.service.recap(req).await?;

	Ok(Json(response))
}

async fn reindex(State(state): State<AppState>) -> Result<Json<ReindexReport>, ApiError> {
	let response = state.service.reindex().await?;

	Ok(Json(response))
}
