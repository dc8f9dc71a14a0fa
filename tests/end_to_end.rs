//! Full sessions over real HTTP against the development service.

use chrono::Utc;
use image::{Rgba, RgbaImage};
use std::net::SocketAddr;

use stego_orchestrator::client::{RemoteClient, ReqwestTransport};
use stego_orchestrator::common::config::ServiceConfig;
use stego_orchestrator::common::messages::Technique;
use stego_orchestrator::error::BACKEND_UNREACHABLE;
use stego_orchestrator::service;
use stego_orchestrator::workflow::{Connectivity, CoverImage, Mode, Orchestrator, Phase};

async fn spawn_service() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, service::router()).await.unwrap();
    });
    addr
}

fn orchestrator_for(addr: SocketAddr) -> Orchestrator<ReqwestTransport> {
    let config = ServiceConfig {
        base_url: format!("http://{}", addr),
        request_timeout_secs: 30,
        health_timeout_secs: 5,
    };
    Orchestrator::new(RemoteClient::new(config, ReqwestTransport::new().unwrap()))
}

fn cover_png() -> Vec<u8> {
    let img = RgbaImage::from_fn(64, 48, |x, y| {
        Rgba([(x * 3) as u8, (y * 5) as u8, ((x + y) * 2) as u8, 255])
    });
    let mut out = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

/// Hides `text`, saves the download, and extracts it again from the saved file.
async fn round_trip(
    technique: Technique,
    hide_key: &str,
    extract_key: &str,
    text: &str,
) -> (Phase, Option<String>) {
    let addr = spawn_service().await;
    let dir = tempfile::tempdir().unwrap();

    let hider = orchestrator_for(addr);
    assert_eq!(hider.start().await, Connectivity::Connected);
    hider.set_mode(Mode::Hide);
    hider.set_technique(technique);
    hider.select_image(CoverImage::new("beach.png", cover_png()));
    hider.set_secret_text(text);
    hider.set_encryption_key(hide_key);

    let phase = hider.run().await;
    assert_eq!(phase, Phase::Success, "{:?}", hider.session().error_message());
    let saved = hider.save_stego(dir.path(), Utc::now()).unwrap();
    let name = saved.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with(&format!("beach_{}_", technique.display_name())));
    assert!(name.ends_with("Z.png"));

    let extractor = orchestrator_for(addr);
    extractor.start().await;
    extractor.set_mode(Mode::Extract);
    extractor.set_technique(technique);
    extractor.select_image(CoverImage::open(&saved).unwrap());
    extractor.set_encryption_key(extract_key);

    let phase = extractor.run().await;
    let session = extractor.session();
    let text = session.extracted_text().or(session.error_message());
    (phase, text.map(str::to_string))
}

#[tokio::test]
async fn test_lsb_round_trip_without_key() {
    let (phase, text) = round_trip(Technique::Lsb, "", "", "HELLO").await;
    assert_eq!(phase, Phase::Success);
    assert_eq!(text.as_deref(), Some("HELLO"));
}

#[tokio::test]
async fn test_xor_round_trip() {
    let secret = "meet at the old mill, 06:00";
    let (phase, text) = round_trip(Technique::Xor, "right", "right", secret).await;
    assert_eq!(phase, Phase::Success);
    assert_eq!(text.as_deref(), Some(secret));
}

#[tokio::test]
async fn test_xor_wrong_key_fails() {
    let (phase, text) = round_trip(Technique::Xor, "right", "wrong", "HELLO").await;
    assert_eq!(phase, Phase::Error);
    assert!(text.unwrap().starts_with("Extraction failed"));
}

#[tokio::test]
async fn test_service_error_keeps_connection() {
    let addr = spawn_service().await;
    let orchestrator = orchestrator_for(addr);
    orchestrator.start().await;

    orchestrator.set_technique(Technique::Aes);
    orchestrator.select_image(CoverImage::new("beach.png", cover_png()));
    orchestrator.set_secret_text("HELLO");
    orchestrator.set_encryption_key("k");

    assert_eq!(orchestrator.run().await, Phase::Error);
    assert_eq!(
        orchestrator.session().error_message(),
        Some("AES technique is not available on this service")
    );
    assert_eq!(orchestrator.session().connectivity(), Connectivity::Connected);
}

#[tokio::test]
async fn test_unreachable_service_blocks_run() {
    // Reserve a port, then free it so nothing is listening there.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let orchestrator = orchestrator_for(addr);
    assert_eq!(orchestrator.start().await, Connectivity::Disconnected);

    orchestrator.select_image(CoverImage::new("beach.png", cover_png()));
    orchestrator.set_secret_text("HELLO");

    assert_eq!(orchestrator.run().await, Phase::Error);
    assert_eq!(orchestrator.session().error_message(), Some(BACKEND_UNREACHABLE));
}
