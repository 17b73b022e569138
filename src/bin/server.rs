//! HTTP server for the RCM analytics assistant
//! Plain tokio socket handling with JSON bodies

use rcm_analytics::config::AppConfig;
use rcm_analytics::dataset::{DatasetSource, TabularSource};
use rcm_analytics::llm::{CompletionService, LlmClient};
use rcm_analytics::{AnalyticsAssistant, AnalyticsError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const QUERY_PATH: &str = "/genai/analytics/query";
const MAX_HEAD_BYTES: usize = 64 * 1024;
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    info!("🚀 Starting RCM Analytics API Server...");
    info!("📂 Dataset: {:?}", config.dataset_path);
    info!("🤖 Model: {}", config.llm.model);

    let llm = LlmClient::from_config(&config.llm)?;
    let assistant = Arc::new(AnalyticsAssistant::new(
        DatasetSource::open(&config.dataset_path),
        llm,
    ));

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("✅ Server listening on {}", config.bind_addr);

    loop {
        let (stream, addr) = listener.accept().await?;
        info!("📥 New connection from: {}", addr);
        let assistant = Arc::clone(&assistant);
        tokio::spawn(async move { handle_connection(stream, assistant).await });
    }
}

async fn handle_connection<S, C>(mut stream: TcpStream, assistant: Arc<AnalyticsAssistant<S, C>>)
where
    S: TabularSource,
    C: CompletionService,
{
    let response = match read_request(&mut stream).await {
        Ok(Some(request)) => handle_request(&assistant, &request).await,
        Ok(None) => return,
        Err(e) => {
            warn!("Failed to read request: {}", e);
            create_response(400, "Bad Request", &error_body("Malformed request"))
        }
    };

    if let Err(e) = stream.write_all(response.as_bytes()).await {
        error!("Failed to write response: {}", e);
    }
}

struct HttpRequest {
    method: String,
    path: String,
    body: String,
}

/// Reads the head, then exactly `Content-Length` body bytes.
async fn read_request(stream: &mut TcpStream) -> std::io::Result<Option<HttpRequest>> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let size = stream.read(&mut chunk).await?;
        if size == 0 {
            if buffer.is_empty() {
                return Ok(None);
            }
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed before end of headers",
            ));
        }
        buffer.extend_from_slice(&chunk[..size]);
        if let Some(pos) = find_head_end(&buffer) {
            break pos;
        }
        if buffer.len() > MAX_HEAD_BYTES {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "request head too large",
            ));
        }
    };

    let head = String::from_utf8_lossy(&buffer[..head_end]).to_string();
    let (method, path, headers) = parse_head(&head).ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, "invalid request line")
    })?;

    let content_length = headers
        .get("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0)
        .min(MAX_BODY_BYTES);

    let body_start = head_end + 4;
    while buffer.len() < body_start + content_length {
        let size = stream.read(&mut chunk).await?;
        if size == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..size]);
    }
    let body_end = (body_start + content_length).min(buffer.len());
    let body = String::from_utf8_lossy(&buffer[body_start..body_end]).to_string();

    Ok(Some(HttpRequest { method, path, body }))
}

fn find_head_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}

fn parse_head(head: &str) -> Option<(String, String, HashMap<String, String>)> {
    let mut lines = head.lines();
    let parts: Vec<&str> = lines.next()?.split_whitespace().collect();
    if parts.len() < 2 {
        return None;
    }

    let method = parts[0].to_string();
    let mut path = parts[1].split('?').next().unwrap_or("").to_string();

    // Normalize path (remove trailing slash except for root)
    path = path.trim_end_matches('/').to_string();
    if path.is_empty() {
        path = "/".to_string();
    }

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }

    Some((method, path, headers))
}

async fn handle_request<S, C>(assistant: &AnalyticsAssistant<S, C>, request: &HttpRequest) -> String
where
    S: TabularSource,
    C: CompletionService,
{
    info!("🔍 Request: {} {}", request.method, request.path);

    match (request.method.as_str(), request.path.as_str()) {
        ("OPTIONS", _) => create_response(204, "No Content", ""),
        ("GET", "/api/health") => {
            create_response(200, "OK", r#"{"status":"ok","service":"rcm-analytics"}"#)
        }
        ("POST", QUERY_PATH) => handle_query(assistant, &request.body).await,
        _ => create_response(404, "Not Found", &error_body("Not found")),
    }
}

async fn handle_query<S, C>(assistant: &AnalyticsAssistant<S, C>, body: &str) -> String
where
    S: TabularSource,
    C: CompletionService,
{
    let question = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json.get("question").and_then(|v| v.as_str()).map(str::to_string))
        .unwrap_or_default();

    if question.trim().is_empty() {
        return create_response(400, "Bad Request", &error_body("Question is required"));
    }

    match assistant.ask(&question).await {
        Ok(response) => match serde_json::to_string(&response) {
            Ok(json) => create_response(200, "OK", &json),
            Err(e) => {
                error!("❌ Failed to serialize response: {}", e);
                create_response(500, "Internal Server Error", &error_body(&e.to_string()))
            }
        },
        Err(e) => {
            match &e {
                AnalyticsError::DataUnavailable(_) => error!("❌ Dataset problem: {}", e),
                AnalyticsError::Completion(_) => error!("❌ Completion service failed: {}", e),
                _ => error!("❌ Query failed: {}", e),
            }
            create_response(500, "Internal Server Error", &error_body(&e.to_string()))
        }
    }
}

fn error_body(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

fn create_response(status: u16, status_text: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: application/json\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
         Access-Control-Allow-Headers: Content-Type\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        status,
        status_text,
        body.len(),
        body
    )
}
