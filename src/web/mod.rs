// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Web UI for Pulmo
//!
//! Serves one session: the upload surface while nothing has been analyzed,
//! the progress or results panel otherwise.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::analysis::Classifier;
use crate::config::AppConfig;
use crate::controller::{Controller, Snapshot};
use crate::preview::{PreviewId, PreviewStore};
use crate::render::{render_snapshot, Panel, RenderedEntry};
use crate::upload::{IncomingFile, UploadSurface};
use crate::{PulmoError, Result};

/// Shared application state
pub struct AppState {
    pub controller: Controller,
    pub previews: Arc<PreviewStore>,
    pub upload: UploadSurface,
    pub config: AppConfig,
    /// One-shot message shown above the upload surface
    notice: Mutex<Option<String>>,
}

impl AppState {
    pub fn new(config: AppConfig, classifier: Arc<dyn Classifier>) -> Self {
        let previews = Arc::new(PreviewStore::new(&config.preview));
        Self {
            controller: Controller::new(classifier, previews.clone()),
            previews,
            upload: UploadSurface::new(&config.upload),
            config,
            notice: Mutex::new(None),
        }
    }

    fn set_notice(&self, message: impl Into<String>) {
        *self.notice.lock() = Some(message.into());
    }

    fn take_notice(&self) -> Option<String> {
        self.notice.lock().take()
    }
}

/// Create the web application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // Leave headroom over the file limit for the multipart framing
    let body_limit = state.upload.max_bytes().saturating_add(64 * 1024);

    Router::new()
        // Pages
        .route("/", get(index_page))
        // Actions
        .route("/upload", post(upload))
        .route("/remove", post(remove))
        .route("/analyze", post(analyze))
        .route("/reset", post(reset))
        // Assets
        .route("/preview/:id", get(preview_image))
        // API endpoints
        .route("/api/state", get(api_state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(axum::extract::DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

// === Page Handlers ===

async fn index_page(State(state): State<Arc<AppState>>) -> Html<String> {
    let snapshot = state.controller.snapshot();
    let notice = state.take_notice();
    let percent = state.config.analysis.progress_percent;

    let content = match render_snapshot(&snapshot, percent) {
        Some(panel) => render_panel(&panel, &snapshot),
        None => render_upload(&snapshot, notice.as_deref(), state.upload.max_bytes()),
    };
    let refresh = snapshot.busy;

    Html(base_template(&content, refresh))
}

// === Action Handlers ===

/// Reply to script uploads, which must not follow a redirect
#[derive(Debug, Serialize)]
struct UploadReply {
    accepted: bool,
    error: Option<String>,
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let json = wants_json(&headers);
    let reply = |error: Option<String>| -> Response {
        if !json {
            return Redirect::to("/").into_response();
        }
        let status = if error.is_some() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::OK
        };
        let accepted = error.is_none();
        (status, Json(UploadReply { accepted, error })).into_response()
    };

    if state.controller.is_busy() {
        warn!("Upload while analyzing ignored");
        return reply(Some("Analysis in progress".to_string()));
    }

    let limit = state.upload.max_bytes();
    let outcome = match read_files(multipart, limit).await {
        Ok(files) => state.upload.accept(files),
        Err(e) => Err(e),
    };

    let selected = match outcome {
        Ok(Some(input)) => state.controller.select_input(Some(input)),
        Ok(None) => Ok(()),
        Err(e) => Err(e),
    };

    match selected {
        Ok(()) => reply(None),
        Err(e) => {
            if e.is_user_error() {
                warn!("Rejected upload: {}", e);
            } else {
                error!("Upload failed: {}", e);
            }
            // Kept for the next page load, also after a script upload
            state.set_notice(e.to_string());
            reply(Some(e.to_string()))
        }
    }
}

/// A body over the request limit is an oversized file, anything else is a
/// broken request.
fn multipart_error(e: MultipartError, name: &str, limit: usize) -> PulmoError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        PulmoError::InputTooLarge {
            name: name.to_string(),
            size: None,
            limit,
        }
    } else {
        PulmoError::Config(format!("Malformed upload: {}", e))
    }
}

/// Collect the file fields of a multipart body, in order
async fn read_files(mut multipart: Multipart, limit: usize) -> Result<Vec<IncomingFile>> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "upload", limit))?
    {
        let Some(name) = field.file_name().map(String::from) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let content_type = field.content_type().map(String::from);
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, &name, limit))?;
        files.push(IncomingFile {
            name,
            content_type,
            data: data.to_vec(),
        });
    }
    Ok(files)
}

async fn remove(State(state): State<Arc<AppState>>) -> Redirect {
    if let Err(e) = state.controller.select_input(None) {
        state.set_notice(e.to_string());
    }
    Redirect::to("/")
}

async fn analyze(State(state): State<Arc<AppState>>) -> Redirect {
    if state.controller.start_analysis().is_none() {
        info!("Analyze request ignored in view {:?}", state.controller.view());
    }
    Redirect::to("/")
}

async fn reset(State(state): State<Arc<AppState>>) -> Redirect {
    state.controller.reset();
    Redirect::to("/")
}

async fn preview_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let png = PreviewId::parse(&id).and_then(|id| state.previews.get(id));
    match png {
        Some(png) => (
            [
                (header::CONTENT_TYPE, "image/png"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            png.to_vec(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

// === API Handlers ===

async fn api_state(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    Json(state.controller.snapshot())
}

// === Template Rendering ===

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn base_template(content: &str, refresh: bool) -> String {
    let refresh_tag = if refresh {
        r#"<meta http-equiv="refresh" content="1">"#
    } else {
        ""
    };

    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    {}
    <title>Pulmo - Chest X-ray Screening</title>
    <style>
        :root {{
            --bg-primary: #f5f7ff;
            --bg-card: #ffffff;
            --text-primary: #1f2937;
            --text-secondary: #6b7280;
            --accent: #4f46e5;
            --border: #e5e7eb;
            --green: #10b981;
            --amber: #f59e0b;
            --orange: #f97316;
            --red: #ef4444;
        }}
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
        }}
        header {{ text-align: center; padding: 30px 20px; border-bottom: 1px solid var(--border); background: var(--bg-card); }}
        header h1 {{ color: var(--accent); }}
        header p {{ color: var(--text-secondary); }}
        .container {{ max-width: 1100px; margin: 0 auto; padding: 30px 20px; }}
        .card {{
            background: var(--bg-card);
            border-radius: 16px;
            padding: 24px;
            margin-bottom: 20px;
            box-shadow: 0 10px 25px rgba(0,0,0,0.05);
        }}
        .grid {{ display: grid; grid-template-columns: 1fr 1fr; gap: 24px; }}
        .dropzone {{
            border: 2px dashed var(--border);
            border-radius: 16px;
            padding: 48px;
            text-align: center;
        }}
        .dropzone.over {{ border-color: var(--accent); background: #eef2ff; }}
        button {{
            width: 100%;
            padding: 12px;
            margin-top: 12px;
            border-radius: 12px;
            border: 0;
            background: var(--accent);
            color: white;
            font-size: 1em;
            cursor: pointer;
        }}
        button.secondary {{ background: white; color: var(--text-primary); border: 2px solid var(--border); }}
        button:disabled {{ opacity: 0.5; cursor: not-allowed; }}
        .notice {{ background: #fef2f2; color: #991b1b; padding: 12px; border-radius: 12px; margin-bottom: 16px; }}
        .hint {{ background: #eff6ff; color: #1e40af; padding: 12px; border-radius: 12px; margin-top: 16px; font-size: 0.9em; }}
        .preview {{ width: 100%; max-height: 320px; object-fit: contain; border-radius: 12px; background: #f3f4f6; }}
        .bar {{ height: 10px; background: #e5e7eb; border-radius: 5px; overflow: hidden; }}
        .bar-fill {{ height: 100%; background: var(--accent); }}
        .finding {{ border: 1px solid var(--border); border-radius: 16px; padding: 16px; margin-bottom: 12px; }}
        .finding .head {{ display: flex; justify-content: space-between; align-items: center; }}
        .badge {{ color: white; border-radius: 999px; padding: 2px 10px; font-size: 0.8em; }}
        .sev-green {{ border-color: var(--green); }} .badge.sev-green, .bar-fill.sev-green {{ background: var(--green); }}
        .sev-amber {{ border-color: var(--amber); }} .badge.sev-amber, .bar-fill.sev-amber {{ background: var(--amber); }}
        .sev-orange {{ border-color: var(--orange); }} .badge.sev-orange, .bar-fill.sev-orange {{ background: var(--orange); }}
        .sev-red {{ border-color: var(--red); }} .badge.sev-red, .bar-fill.sev-red {{ background: var(--red); }}
        footer {{ text-align: center; color: var(--text-secondary); font-size: 0.85em; padding: 30px; }}
    </style>
</head>
<body>
    <header>
        <h1>Chest X-ray Screening</h1>
        <p>Upload an X-ray image for an automated screening pass.</p>
    </header>
    <main class="container">
        {}
    </main>
    <footer>For education and demonstration only. Not a medical device.</footer>
</body>
</html>"#, refresh_tag, content)
}

fn render_upload(snapshot: &Snapshot, notice: Option<&str>, max_bytes: usize) -> String {
    let notice_html = notice
        .map(|n| format!(r#"<div class="notice">{}</div>"#, escape(n)))
        .unwrap_or_default();
    let error_html = snapshot
        .last_error
        .as_deref()
        .map(|e| format!(r#"<div class="notice">Analysis failed: {}</div>"#, escape(e)))
        .unwrap_or_default();

    let selection_html = match &snapshot.input_name {
        Some(name) => format!(r#"
            <p><strong>File selected:</strong> {}</p>
            <form method="post" action="/remove"><button class="secondary" type="submit">Remove</button></form>
        "#, escape(name)),
        None => r#"
            <h3>Drag &amp; drop an X-ray image</h3>
            <p>or pick a file below</p>
        "#.to_string(),
    };

    let disabled = if snapshot.can_analyze { "" } else { "disabled" };
    let picker_disabled = if snapshot.busy { "disabled" } else { "" };

    format!(r#"
        <div class="card" style="max-width: 640px; margin: 0 auto;">
            <h2>Upload chest X-ray</h2>
            {}{}
            <div id="dropzone" class="dropzone">
                {}
            </div>
            <form id="upload-form" method="post" action="/upload" enctype="multipart/form-data">
                <input id="file-input" type="file" name="file" accept="image/*" hidden onchange="this.form.submit()">
                <button class="secondary" type="button" {} onclick="document.getElementById('file-input').click()">Choose file</button>
            </form>
            <form method="post" action="/analyze">
                <button type="submit" {}>Analyze</button>
            </form>
            <div class="hint">Supported formats: JPG, PNG, JPEG (max {} MB)</div>
        </div>
        <script>
            const zone = document.getElementById('dropzone');
            zone.addEventListener('dragover', e => {{ e.preventDefault(); zone.classList.add('over'); }});
            zone.addEventListener('dragleave', e => {{ e.preventDefault(); zone.classList.remove('over'); }});
            zone.addEventListener('drop', async e => {{
                e.preventDefault();
                zone.classList.remove('over');
                const files = e.dataTransfer.files;
                if (files.length === 0) return;
                const body = new FormData();
                body.append('file', files[0]);
                await fetch('/upload', {{
                    method: 'POST',
                    headers: {{ 'Accept': 'application/json' }},
                    body,
                }});
                window.location.reload();
            }});
        </script>
    "#,
        notice_html,
        error_html,
        selection_html,
        picker_disabled,
        disabled,
        max_bytes / (1024 * 1024),
    )
}

fn preview_html(preview: Option<PreviewId>) -> String {
    preview
        .map(|id| format!(r#"<img class="preview" src="/preview/{}" alt="X-ray preview">"#, id))
        .unwrap_or_default()
}

fn render_entry(entry: &RenderedEntry) -> String {
    let class = format!("sev-{}", entry.style.color);
    format!(r#"
        <div class="finding {class}">
            <div class="head">
                <span>{} <strong>{}</strong></span>
                <span class="badge {class}">{}</span>
            </div>
            <p>Confidence: {}%</p>
            <div class="bar"><div class="bar-fill {class}" style="width: {}%"></div></div>
            <p>{}</p>
        </div>
    "#,
        entry.style.icon.glyph(),
        escape(&entry.label),
        entry.severity.as_str().to_uppercase(),
        entry.confidence_score,
        entry.confidence_score,
        escape(&entry.note),
        class = class,
    )
}

fn render_panel(panel: &Panel, snapshot: &Snapshot) -> String {
    let name = snapshot.input_name.as_deref().map(escape).unwrap_or_default();

    match panel {
        Panel::Progress { percent, preview } => format!(r#"
            <div class="card grid">
                <div>
                    <h3>Image under analysis</h3>
                    {}
                    <p>{}</p>
                </div>
                <div>
                    <h2>Analyzing</h2>
                    <p>Processing the image...</p>
                    <p>Progress {}%</p>
                    <div class="bar"><div class="bar-fill" style="width: {}%"></div></div>
                </div>
            </div>
        "#, preview_html(*preview), name, percent, percent),
        Panel::Results { entries, classifier, preview } => {
            let entries_html: String = entries.iter().map(render_entry).collect();
            format!(r#"
                <div class="card" style="display: flex; justify-content: space-between; align-items: center;">
                    <div>
                        <h2>Analysis results</h2>
                        <p>{} &middot; classifier: {}</p>
                    </div>
                    <form method="post" action="/reset" style="width: 200px;">
                        <button class="secondary" type="submit">New analysis</button>
                    </form>
                </div>
                <div class="grid">
                    <div class="card">{}</div>
                    <div class="card">
                        <div class="hint">These results are simulated for demonstration. Consult a physician for an accurate diagnosis.</div>
                        <h3 style="margin-top: 16px;">Findings</h3>
                        {}
                    </div>
                </div>
            "#, name, escape(classifier), preview_html(*preview), entries_html)
        }
    }
}

/// Start the web server
pub async fn start_server(config: AppConfig, classifier: Arc<dyn Classifier>) -> crate::Result<()> {
    let addr = format!("{}:{}", config.web.host, config.web.port);
    let state = Arc::new(AppState::new(config, classifier));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Web UI available at http://{}", addr);

    let router = create_router(state);
    axum::serve(listener, router).await
        .map_err(|e| crate::PulmoError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::MockClassifier;
    use crate::controller::View;
    use crate::preview::tests::png_bytes;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    const BOUNDARY: &str = "pulmo-test-boundary";

    fn state(delay: Duration) -> Arc<AppState> {
        Arc::new(AppState::new(
            AppConfig::default(),
            Arc::new(MockClassifier::new(delay)),
        ))
    }

    fn multipart_body(name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        ).as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(multipart_body(name, content_type, data)))
            .unwrap()
    }

    fn post(uri: &str) -> Request<Body> {
        Request::builder().method("POST").uri(uri).body(Body::empty()).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_index_shows_upload_surface() {
        let app = create_router(state(Duration::ZERO));
        let response = app.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Upload chest X-ray"));
        assert!(html.contains(r#"<button type="submit" disabled>Analyze</button>"#));
    }

    #[tokio::test]
    async fn test_upload_image_then_preview() {
        let state = state(Duration::ZERO);
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(upload_request("chest.png", "image/png", &png_bytes(8, 8)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(state.controller.view(), View::Ready);

        let id = state.controller.preview_id().unwrap();
        let response = app.clone().oneshot(get(&format!("/preview/{}", id))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

        let html = body_text(app.clone().oneshot(get("/")).await.unwrap()).await;
        assert!(html.contains("chest.png"));

        app.clone().oneshot(post("/remove")).await.unwrap();
        assert_eq!(state.controller.view(), View::Idle);
        let response = app.oneshot(get(&format!("/preview/{}", id))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_non_image_shows_notice() {
        let state = state(Duration::ZERO);
        let app = create_router(state.clone());

        app.clone()
            .oneshot(upload_request("notes.txt", "text/plain", b"not an x-ray"))
            .await
            .unwrap();
        assert_eq!(state.controller.view(), View::Idle);

        let html = body_text(app.clone().oneshot(get("/")).await.unwrap()).await;
        assert!(html.contains("Not an image: notes.txt"));

        // the notice is shown once
        let html = body_text(app.oneshot(get("/")).await.unwrap()).await;
        assert!(!html.contains("Not an image"));
    }

    #[tokio::test]
    async fn test_script_upload_keeps_notice_for_reload() {
        let state = state(Duration::ZERO);
        let app = create_router(state.clone());

        let mut request = upload_request("notes.txt", "text/plain", b"not an x-ray");
        request
            .headers_mut()
            .insert(header::ACCEPT, "application/json".parse().unwrap());
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.headers().get(header::LOCATION).is_none());
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["accepted"], false);
        assert_eq!(json["error"], "Not an image: notes.txt (text/plain)");

        // the page reload after the script upload
        let html = body_text(app.clone().oneshot(get("/")).await.unwrap()).await;
        assert!(html.contains("Not an image: notes.txt"));

        let mut request = upload_request("chest.png", "image/png", &png_bytes(8, 8));
        request
            .headers_mut()
            .insert(header::ACCEPT, "application/json".parse().unwrap());
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["accepted"], true);
        assert_eq!(state.controller.view(), View::Ready);
    }

    #[tokio::test]
    async fn test_form_upload_notice_survives_redirect() {
        let state = state(Duration::ZERO);
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(upload_request("notes.txt", "text/plain", b"not an x-ray"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();

        let html = body_text(app.oneshot(get(&location)).await.unwrap()).await;
        assert!(html.contains("Not an image: notes.txt"));
    }

    #[tokio::test]
    async fn test_oversized_upload_shows_size_notice() {
        let state = state(Duration::ZERO);
        let app = create_router(state.clone());

        let data = vec![0u8; 11 * 1024 * 1024];
        app.clone()
            .oneshot(upload_request("chest.png", "image/png", &data))
            .await
            .unwrap();
        assert_eq!(state.controller.view(), View::Idle);

        let html = body_text(app.oneshot(get("/")).await.unwrap()).await;
        assert!(html.contains("File too large"), "{}", html);
        assert!(!html.contains("Malformed upload"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_and_reset() {
        let state = state(Duration::from_secs(3));
        let app = create_router(state.clone());
        app.clone()
            .oneshot(upload_request("chest.png", "image/png", &png_bytes(8, 8)))
            .await
            .unwrap();

        app.clone().oneshot(post("/analyze")).await.unwrap();
        assert_eq!(state.controller.view(), View::Analyzing);
        let html = body_text(app.clone().oneshot(get("/")).await.unwrap()).await;
        assert!(html.contains("Progress 78%"));
        assert!(html.contains(r#"http-equiv="refresh""#));

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(state.controller.view(), View::Done);

        let response = app.clone().oneshot(get("/api/state")).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["view"], "done");
        assert_eq!(json["results"]["entries"][0]["label"], "Normal");
        assert_eq!(json["results"]["entries"][0]["confidence_score"], 85);

        let html = body_text(app.clone().oneshot(get("/")).await.unwrap()).await;
        assert!(html.contains("Tuberculosis"));
        assert!(html.contains("sev-green"));

        app.oneshot(post("/reset")).await.unwrap();
        assert_eq!(state.controller.view(), View::Idle);
        assert_eq!(state.previews.stats().live(), 0);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<img src="x">&'"#), "&lt;img src=&quot;x&quot;&gt;&amp;&#39;");
    }
}
