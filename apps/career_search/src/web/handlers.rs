use std::path::{Path, PathBuf};

use axum::{
    extract::{Multipart, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::job::{decode_jobs, Job};
use crate::resume::process_file;
use crate::search::SearchJobs;
use crate::state::AppState;
use crate::web::pages;

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ResultParams {
    pub text: String,
    pub jobs: String,
    pub keywords: String,
    pub location: String,
}

#[derive(Deserialize)]
pub struct ApiSearchRequest {
    pub keywords: String,
    pub location: String,
    pub resume_text: String,
}

#[derive(Serialize)]
pub struct ApiSearchResponse {
    pub result: String,
    pub jobs: Vec<Job>,
}

#[derive(Default)]
struct SearchForm {
    file: Option<(Option<String>, Bytes)>,
    keywords: String,
    location: String,
}

/// GET /
pub async fn index_page() -> Html<String> {
    pages::index(None)
}

/// POST /
/// Redirects to the result page, or re-renders the form with the failure message.
pub async fn submit_search(State(state): State<AppState>, multipart: Multipart) -> Response {
    match handle_submission(&state, multipart).await {
        Ok(location) => Redirect::to(&location).into_response(),
        Err(message) => pages::index(Some(message)).into_response(),
    }
}

/// GET /result
pub async fn result_page(Query(params): Query<ResultParams>) -> Html<String> {
    let jobs = decode_jobs(&params.jobs);
    pages::result(&params.keywords, &params.location, &params.text, &jobs)
}

/// POST /api/v1/search
pub async fn api_search(
    State(state): State<AppState>,
    Json(req): Json<ApiSearchRequest>,
) -> Result<Json<ApiSearchResponse>, AppError> {
    for (field, value) in [
        ("keywords", &req.keywords),
        ("location", &req.location),
        ("resume_text", &req.resume_text),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} is required")));
        }
    }

    // Dropped (and removed) once the crew has finished reading it.
    let resume = tempfile::NamedTempFile::new()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to create resume file: {e}")))?;
    tokio::fs::write(resume.path(), &req.resume_text)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to write resume file: {e}")))?;

    let result = SearchJobs::new(req.keywords.trim(), req.location.trim(), resume.path())
        .search(&state.config, state.llm.clone())
        .await?;
    let jobs = decode_jobs(&result);

    Ok(Json(ApiSearchResponse { result, jobs }))
}

async fn handle_submission(state: &AppState, multipart: Multipart) -> Result<String, &'static str> {
    let form = read_form(multipart).await?;

    let (filename, data) = form.file.ok_or("No file uploaded")?;
    let filename = filename
        .as_deref()
        .and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .ok_or("No file selected")?
        .to_string();
    let keywords = form.keywords.trim();
    if keywords.is_empty() {
        return Err("Keywords are required");
    }
    let location = form.location.trim();
    if location.is_empty() {
        return Err("Location is required");
    }

    let (resume_path, text) = cached_resume_text(state, &filename, data).await?;

    let jobs = match &state.config.sample_result_path {
        Some(sample) => tokio::fs::read_to_string(sample).await.map_err(|e| {
            error!("Failed to read sample result '{sample}': {e}");
            "Job search failed"
        })?,
        None => SearchJobs::new(keywords, location, &resume_path)
            .search(&state.config, state.llm.clone())
            .await
            .map_err(|_| "Job search failed")?,
    };

    Ok(format!(
        "/result?text={}&jobs={}&keywords={}&location={}",
        urlencoding::encode(&text),
        urlencoding::encode(&jobs),
        urlencoding::encode(keywords),
        urlencoding::encode(location),
    ))
}

async fn read_form(mut multipart: Multipart) -> Result<SearchForm, &'static str> {
    let mut form = SearchForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                error!("Malformed multipart submission: {e}");
                return Err("Error processing file");
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(|e| {
                    error!("Failed to read uploaded file: {e}");
                    "Error processing file"
                })?;
                form.file = Some((filename, data));
            }
            "keywords" | "location" => {
                let value = field.text().await.map_err(|e| {
                    error!("Failed to read form field '{name}': {e}");
                    "Error processing file"
                })?;
                if name == "keywords" {
                    form.keywords = value;
                } else {
                    form.location = value;
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Returns the cache path and text for an upload, extracting and caching it on first sight.
async fn cached_resume_text(
    state: &AppState,
    filename: &str,
    data: Bytes,
) -> Result<(PathBuf, String), &'static str> {
    let resume_dir = Path::new(&state.config.resume_dir);
    let cache_path = resume_dir.join(format!("{filename}.txt"));

    if let Ok(text) = tokio::fs::read_to_string(&cache_path).await {
        info!("Using cached resume text {}", cache_path.display());
        return Ok((cache_path, text));
    }

    let text = match process_file(filename, data).await {
        Ok(Some(text)) => text,
        Ok(None) => return Err("Unsupported file type"),
        Err(e) => {
            error!("Failed to extract resume '{filename}': {e}");
            return Err("Error processing file");
        }
    };

    let write = async {
        tokio::fs::create_dir_all(resume_dir).await?;
        tokio::fs::write(&cache_path, &text).await
    };
    if let Err(e) = write.await {
        error!("Failed to cache resume text at {}: {e}", cache_path.display());
        return Err("Error processing file");
    }
    info!("Cached resume text at {}", cache_path.display());

    Ok((cache_path, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::{test_config, Config};
    use crate::crew::testing::ScriptedModel;
    use crate::routes::build_router;

    const BOUNDARY: &str = "career-search-boundary";
    const SAMPLE_JOBS: &str = r#"{"jobs": [{"title": "Data Engineer", "company": "Initech"}]}"#;

    fn state_with(config: Config, replies: Vec<&str>) -> AppState {
        AppState {
            config,
            llm: ScriptedModel::arc(replies),
        }
    }

    fn multipart_body(file: Option<(&str, &str)>, fields: &[(&str, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        if let Some((filename, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn post_form(state: AppState, body: Vec<u8>) -> Response {
        build_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={BOUNDARY}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_form_validation_order() {
        let cases: Vec<(Option<(&str, &str)>, Vec<(&str, &str)>, &str)> = vec![
            (None, vec![("keywords", "Rust"), ("location", "US")], "No file uploaded"),
            (Some(("", "")), vec![("keywords", "Rust"), ("location", "US")], "No file selected"),
            (Some(("cv.pdf", "%PDF")), vec![("keywords", " "), ("location", "US")], "Keywords are required"),
            (Some(("cv.pdf", "%PDF")), vec![("keywords", "Rust")], "Location is required"),
        ];

        for (file, fields, expected) in cases {
            let response = post_form(state_with(test_config(), vec![]), multipart_body(file, &fields)).await;
            assert_eq!(response.status(), StatusCode::OK);
            let page = body_text(response).await;
            assert!(page.contains(expected), "expected '{expected}' in form");
        }
    }

    #[tokio::test]
    async fn test_unsupported_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            resume_dir: dir.path().display().to_string(),
            ..test_config()
        };

        let body = multipart_body(Some(("cv.txt", "plain")), &[("keywords", "Rust"), ("location", "US")]);
        let page = body_text(post_form(state_with(config, vec![]), body).await).await;
        assert!(page.contains("Unsupported file type"));
        assert!(!dir.path().join("cv.txt.txt").exists());
    }

    #[tokio::test]
    async fn test_upload_larger_than_two_megabytes_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            resume_dir: dir.path().display().to_string(),
            ..test_config()
        };

        let large = "x".repeat(3 * 1024 * 1024);
        let body = multipart_body(Some(("cv.txt", large.as_str())), &[("keywords", "Rust"), ("location", "US")]);
        let page = body_text(post_form(state_with(config, vec![]), body).await).await;
        assert!(page.contains("Unsupported file type"));
    }

    #[tokio::test]
    async fn test_cached_resume_with_sample_result_redirects() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cv.pdf.txt"), "Jane Doe & co").unwrap();
        let sample = dir.path().join("sample_result.json");
        std::fs::write(&sample, SAMPLE_JOBS).unwrap();
        let config = Config {
            resume_dir: dir.path().display().to_string(),
            sample_result_path: Some(sample.display().to_string()),
            ..test_config()
        };

        // Not a real PDF: the cached text must be used instead of re-parsing.
        let body = multipart_body(
            Some(("cv.pdf", "garbage")),
            &[("keywords", "Data Engineer"), ("location", "Remote US")],
        );
        let response = post_form(state_with(config, vec![]), body).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("/result?text=Jane%20Doe%20%26%20co&jobs=%7B"));
        assert!(location.ends_with("&keywords=Data%20Engineer&location=Remote%20US"));
    }

    #[tokio::test]
    async fn test_failed_search_rerenders_form() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cv.pdf.txt"), "Jane Doe").unwrap();
        let config = Config {
            resume_dir: dir.path().display().to_string(),
            agents_config: dir.path().join("missing.yml").display().to_string(),
            ..test_config()
        };

        let body = multipart_body(Some(("cv.pdf", "%PDF")), &[("keywords", "Rust"), ("location", "US")]);
        let page = body_text(post_form(state_with(config, vec![]), body).await).await;
        assert!(page.contains("Job search failed"));
    }

    #[tokio::test]
    async fn test_result_page_decodes_jobs_leniently() {
        let uri = format!(
            "/result?text=Jane&keywords=Rust&location=US&jobs={}",
            urlencoding::encode(&format!("```json\n{SAMPLE_JOBS}\n```"))
        );
        let response = build_router(state_with(test_config(), vec![]))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let page = body_text(response).await;
        assert!(page.contains("Jobs (1)"));
        assert!(page.contains("Initech"));

        let response = build_router(state_with(test_config(), vec![]))
            .oneshot(Request::builder().uri("/result?jobs=oops").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(body_text(response).await.contains("No jobs found."));
    }

    fn api_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/search")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_api_search_requires_fields() {
        let response = build_router(state_with(test_config(), vec![]))
            .oneshot(api_request(serde_json::json!({
                "keywords": "Rust", "location": "", "resume_text": "Jane"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_api_search_returns_result_and_jobs() {
        let root = concat!(env!("CARGO_MANIFEST_DIR"), "/../../configs");
        let config = Config {
            agents_config: format!("{root}/agents.yml"),
            tasks_config: format!("{root}/tasks.yml"),
            ..test_config()
        };
        let final_answer = format!("Final Answer: ```json\n{SAMPLE_JOBS}\n```");
        let state = state_with(
            config,
            vec![
                "Final Answer: Initech - Data Engineer",
                "Final Answer: Initech - rating 7",
                "Final Answer: Initech - company rating 3",
                final_answer.as_str(),
            ],
        );

        let response = build_router(state)
            .oneshot(api_request(serde_json::json!({
                "keywords": "Data Engineer", "location": "US", "resume_text": "Jane Doe"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(body["result"].as_str().unwrap().starts_with("```json"));
        assert_eq!(body["jobs"][0]["company"], "Initech");
    }
}
