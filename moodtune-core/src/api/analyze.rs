//! Analysis endpoint
//!
//! POST /analyze accepts either
//! - `multipart/form-data` with an `image` file part and an optional `language` text part
//! - JSON `{ "image": "<data URL>", "language": "te" }`
//!
//! and runs one full analysis, answering with the session snapshot.

use axum::{
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    error::{ApiError, ApiResult},
    models::{Language, SessionSnapshot},
    services::{ImageSource, MappingError},
    AppState,
};

/// Uploaded images can be larger than axum's 2 MB default
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// POST /analyze JSON body
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Base64 data URL of a still frame
    pub image: Option<String>,
    pub language: Option<String>,
}

/// Image and language pulled out of either request shape
struct AnalyzeInput {
    file: Option<(Vec<u8>, Option<String>, Option<String>)>,
    data_url: Option<String>,
    language: Option<String>,
}

fn parse_language(raw: Option<&str>) -> ApiResult<Language> {
    match raw.map(str::trim).filter(|l| !l.is_empty()) {
        None => Ok(Language::default()),
        Some(raw) => Language::parse(raw)
            .ok_or_else(|| ApiError::Mapping(MappingError::UnknownLanguage(raw.to_string()))),
    }
}

async fn read_multipart(mut multipart: Multipart) -> ApiResult<AnalyzeInput> {
    let mut input = AnalyzeInput {
        file: None,
        data_url: None,
        language: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("image") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read image: {}", e)))?;
                input.file = Some((data.to_vec(), file_name, content_type));
            }
            Some("language") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read language: {}", e)))?;
                input.language = Some(text);
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unexpected multipart field");
            }
        }
    }

    Ok(input)
}

fn image_source(input: AnalyzeInput) -> ApiResult<ImageSource> {
    let (bytes, file_meta) = match input.file {
        Some((data, file_name, content_type)) => (Some(data), Some((file_name, content_type))),
        None => (None, None),
    };

    let source = ImageSource::from_parts(bytes, input.data_url)?;
    Ok(match (source, file_meta) {
        (ImageSource::Bytes { data, .. }, Some((file_name, content_type))) => ImageSource::Bytes {
            data,
            file_name,
            content_type,
        },
        (source, _) => source,
    })
}

/// POST /analyze
///
/// 409 while another analysis is in flight; the pending one is not affected.
pub async fn analyze(State(state): State<AppState>, request: Request) -> ApiResult<Json<SessionSnapshot>> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let input = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        read_multipart(multipart).await?
    } else {
        let Json(body) = Json::<AnalyzeRequest>::from_request(request, &state).await?;
        AnalyzeInput {
            file: None,
            data_url: body.image,
            language: body.language,
        }
    };

    let language = parse_language(input.language.as_deref())?;
    let source = image_source(input)?;

    match state.orchestrator.analyze(source, language).await {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(e) => {
            state.record_error(e.to_string()).await;
            Err(e.into())
        }
    }
}

pub fn analyze_routes() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(analyze))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES))
}
