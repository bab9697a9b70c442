// Copyright (C) 2026 PortaPack Updater Contributors
// Licensed under GPL-3.0-or-later

// Fixtures shared by the unit tests: a local HTTP server standing in for the
// GitHub API and raw-file hosts, and zip archive builders.

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

#[derive(Clone)]
struct Fixture {
    status: StatusCode,
    body: Vec<u8>,
    /// JSON bodies get `{base}` replaced by the server URL
    templated: bool,
}

#[derive(Default)]
pub struct FakeServerBuilder {
    routes: HashMap<String, Fixture>,
}

impl FakeServerBuilder {
    pub fn file(mut self, path: &str, body: Vec<u8>) -> Self {
        self.routes.insert(
            path.to_string(),
            Fixture {
                status: StatusCode::OK,
                body,
                templated: false,
            },
        );
        self
    }

    pub fn json(mut self, path: &str, value: serde_json::Value) -> Self {
        self.routes.insert(
            path.to_string(),
            Fixture {
                status: StatusCode::OK,
                body: value.to_string().into_bytes(),
                templated: true,
            },
        );
        self
    }

    pub fn status(mut self, path: &str, status: StatusCode) -> Self {
        self.routes.insert(
            path.to_string(),
            Fixture {
                status,
                body: b"{\"message\": \"fixture failure\"}".to_vec(),
                templated: false,
            },
        );
        self
    }

    pub async fn start(self) -> FakeServer {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let routes: HashMap<String, Fixture> = self
            .routes
            .into_iter()
            .map(|(path, mut fixture)| {
                if fixture.templated {
                    let text = String::from_utf8_lossy(&fixture.body).replace("{base}", &base);
                    fixture.body = text.into_bytes();
                }
                (path, fixture)
            })
            .collect();

        let app = Router::new()
            .fallback(serve_fixture)
            .with_state(Arc::new(routes));

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        FakeServer { base }
    }
}

async fn serve_fixture(
    State(routes): State<Arc<HashMap<String, Fixture>>>,
    uri: Uri,
) -> Response {
    match routes.get(uri.path()) {
        Some(fixture) => (fixture.status, fixture.body.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub struct FakeServer {
    base: String,
}

impl FakeServer {
    pub fn builder() -> FakeServerBuilder {
        FakeServerBuilder::default()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

/// Build an in-memory zip archive. Names ending in `/` become directories.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();

    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
    }

    writer.finish().unwrap().into_inner()
}

pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    std::fs::write(path, zip_bytes(entries)).unwrap();
}

/// A deflated single-file archive whose compressed payload has one byte
/// flipped. The central directory still parses.
pub fn damaged_zip_bytes(name: &str) -> Vec<u8> {
    let payload: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 251) as u8).collect();

    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    writer.start_file(name, options).unwrap();
    writer.write_all(&payload).unwrap();
    let mut bytes = writer.finish().unwrap().into_inner();

    // Local header: sizes at 18..22, name/extra lengths at 26..30
    let le16 = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]) as usize;
    let compressed =
        u32::from_le_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]) as usize;
    let data_start = 30 + le16(26) + le16(28);
    let target = data_start + compressed.max(2) / 2;
    bytes[target] ^= 0xFF;
    bytes
}
