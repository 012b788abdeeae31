//! The Gemini HTTP transport against a local stub server.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use common::AI_VERDICT;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use vidverdict::{AnalysisClient, AnalysisOptions, ApiCredential, Frame, VerdictError};

/// Serve one canned response and hand back the raw request.
async fn serve_once(status: &'static str, body: String) -> (SocketAddr, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buffer = [0u8; 8192];
        let header_end = loop {
            let read = socket.read(&mut buffer).await.unwrap();
            assert!(read > 0, "connection closed before the request head");
            request.extend_from_slice(&buffer[..read]);
            if let Some(position) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                break position + 4;
            }
        };

        let head = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
        let content_length: usize = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .map(|value| value.trim().parse().unwrap())
            .unwrap_or(0);
        while request.len() < header_end + content_length {
            let read = socket.read(&mut buffer).await.unwrap();
            if read == 0 {
                break;
            }
            request.extend_from_slice(&buffer[..read]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();

        String::from_utf8_lossy(&request).into_owned()
    });

    (address, handle)
}

fn client_for(address: SocketAddr) -> AnalysisClient<vidverdict::GeminiTransport> {
    let options = AnalysisOptions::new()
        .with_base_url(format!("http://{address}/v1beta"))
        .with_timeout(Duration::from_secs(10));
    AnalysisClient::gemini(ApiCredential::new("test-key"), options).unwrap()
}

fn frames() -> Vec<Frame> {
    vec![
        Frame::from_jpeg(&[0xFF, 0xD8, 0x01, 0xFF, 0xD9], Duration::from_secs(1)),
        Frame::from_jpeg(&[0xFF, 0xD8, 0x02, 0xFF, 0xD9], Duration::from_secs(2)),
    ]
}

fn candidate_body(parts: &[&str]) -> String {
    let parts: Vec<_> = parts
        .iter()
        .map(|text| serde_json::json!({ "text": text }))
        .collect();
    serde_json::json!({
        "candidates": [{ "content": { "role": "model", "parts": parts } }]
    })
    .to_string()
}

#[tokio::test]
async fn successful_reply_is_parsed() {
    let (first, second) = AI_VERDICT.split_at(AI_VERDICT.len() / 2);
    let (address, server) = serve_once("200 OK", candidate_body(&[first, second])).await;

    let result = client_for(address).analyze(&frames()).await.unwrap();

    assert!(result.is_ai_generated);
    assert_eq!(result.confidence_score, 0.92);
    assert_eq!(result.artifacts_detected, ["morphing hands"]);

    let request = server.await.unwrap();
    let lowered = request.to_lowercase();
    assert!(lowered.starts_with("post /v1beta/models/gemini-2.5-pro:generatecontent http/1.1"));
    assert!(lowered.contains("\r\nx-goog-api-key: test-key\r\n"));
    assert!(lowered.contains("content-type: application/json"));
    assert!(!request.contains("key=test-key"));

    let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
    let json: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(json["contents"][0]["parts"].as_array().unwrap().len(), 3);
    assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
}

#[tokio::test]
async fn service_unavailable_is_an_analysis_failure() {
    let (address, server) = serve_once(
        "503 Service Unavailable",
        r#"{"error": {"code": 503, "message": "overloaded"}}"#.to_string(),
    )
    .await;

    let error = client_for(address).analyze(&frames()).await.unwrap_err();

    assert!(matches!(error, VerdictError::AnalysisFailed));
    server.await.unwrap();
}

#[tokio::test]
async fn blank_reply_is_an_analysis_failure() {
    let (address, server) = serve_once("200 OK", candidate_body(&["   "])).await;

    let error = client_for(address).analyze(&frames()).await.unwrap_err();

    assert!(matches!(error, VerdictError::AnalysisFailed));
    server.await.unwrap();
}

#[tokio::test]
async fn non_json_reply_is_an_analysis_failure() {
    let (address, server) = serve_once("200 OK", "<html>gateway</html>".to_string()).await;

    let error = client_for(address).analyze(&frames()).await.unwrap_err();

    assert!(matches!(error, VerdictError::AnalysisFailed));
    server.await.unwrap();
}
