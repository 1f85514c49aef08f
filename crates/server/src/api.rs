//! Public booking surface: `/book`, `/search` and `/chat`.
//!
//! Every response carries a fresh correlation id, both in the `x-correlation-id`
//! header and, for errors, in the body. The same id tags every log event the
//! request produces.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use teetime_agent::BookingAssistant;
use teetime_core::domain::booking::BookingRequest;
use teetime_core::domain::course::{Course, CourseQuery};
use teetime_core::errors::{ApplicationError, DomainError, InterfaceError};
use teetime_core::pipeline::BookingPipeline;
use teetime_db::repositories::CourseRepository;
use tracing::{info, warn};
use uuid::Uuid;

const CORRELATION_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<BookingPipeline>,
    pub courses: Arc<dyn CourseRepository>,
    pub assistant: Arc<BookingAssistant>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/book", post(book))
        .route("/search", post(search))
        .route("/chat", post(chat))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BookBody {
    pub course_id: String,
    pub date: String,
    pub time: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookReply {
    pub booking_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchBody {
    pub zip: Option<String>,
    pub date: Option<String>,
    pub criteria: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    pub course_id: String,
    pub name: String,
    pub zip: String,
    pub rating: Option<f32>,
    pub tags: Vec<String>,
    pub available_times: Vec<String>,
}

impl From<Course> for CourseView {
    fn from(course: Course) -> Self {
        Self {
            course_id: course.id.0,
            name: course.name,
            zip: course.zip,
            rating: course.rating,
            tags: course.tags,
            available_times: course.available_times,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchReply {
    pub courses: Vec<CourseView>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatBody {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    error: &'a str,
    correlation_id: &'a str,
}

pub struct ApiError(InterfaceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        };
        // Validation detail is safe to echo; backend detail stays in the logs.
        let error = match &self.0 {
            InterfaceError::BadRequest { message, .. } => message.as_str(),
            other => other.user_message(),
        };
        let correlation_id = self.0.correlation_id();
        let body = Json(ErrorBody { error, correlation_id });
        with_correlation(correlation_id, (status, body).into_response())
    }
}

fn with_correlation(correlation_id: &str, mut response: Response) -> Response {
    if let Ok(value) = HeaderValue::from_str(correlation_id) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

fn ok<T: Serialize>(correlation_id: &str, body: T) -> Response {
    with_correlation(correlation_id, (StatusCode::OK, Json(body)).into_response())
}

fn fail(correlation_id: &str, error: impl Into<ApplicationError>) -> ApiError {
    ApiError(error.into().into_interface(correlation_id))
}

fn unreadable_body(correlation_id: &str, rejection: JsonRejection) -> ApiError {
    warn!(
        event_name = "http.request.unreadable",
        correlation_id = %correlation_id,
        error = %rejection.body_text(),
        "request body could not be decoded"
    );
    fail(
        correlation_id,
        DomainError::InvalidRequest { field: "body".to_string(), reason: rejection.body_text() },
    )
}

pub async fn book(
    State(state): State<AppState>,
    body: Result<Json<BookBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let Json(body) = body.map_err(|rejection| unreadable_body(&correlation_id, rejection))?;

    let request = BookingRequest {
        course_id: body.course_id,
        date: body.date,
        time: body.time,
        contact_address: body.email,
    };

    let confirmation = state
        .pipeline
        .book(request, &correlation_id)
        .await
        .map_err(|error| fail(&correlation_id, error))?;

    Ok(ok(&correlation_id, BookReply { booking_id: confirmation.booking_id.0 }))
}

pub async fn search(
    State(state): State<AppState>,
    body: Result<Json<SearchBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let Json(body) = body.map_err(|rejection| unreadable_body(&correlation_id, rejection))?;

    let zip = body.zip.as_deref().map(str::trim).unwrap_or_default();
    if zip.is_empty() {
        return Err(fail(
            &correlation_id,
            DomainError::InvalidRequest {
                field: "zip".to_string(),
                reason: "must not be empty".to_string(),
            },
        ));
    }

    let query = CourseQuery { zip: zip.to_string(), date: body.date, criteria: body.criteria };
    let candidates = state.courses.find_by_zip(&query.zip).await.map_err(|error| {
        warn!(
            event_name = "search.lookup.failed",
            correlation_id = %correlation_id,
            error = %error,
            "course lookup failed"
        );
        fail(&correlation_id, ApplicationError::Persistence(error.to_string()))
    })?;

    let courses: Vec<CourseView> =
        query.filter(candidates).into_iter().map(CourseView::from).collect();
    info!(
        event_name = "search.completed",
        correlation_id = %correlation_id,
        zip = %query.zip,
        result_count = courses.len(),
        "course search completed"
    );

    Ok(ok(&correlation_id, SearchReply { courses }))
}

pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let Json(body) = body.map_err(|rejection| unreadable_body(&correlation_id, rejection))?;

    let reply = state
        .assistant
        .chat(&body.message, &correlation_id)
        .await
        .map_err(|error| fail(&correlation_id, error))?;

    Ok(ok(&correlation_id, ChatReply { reply }))
}
