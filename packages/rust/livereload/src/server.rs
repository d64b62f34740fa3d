//! Preview HTTP server for the output directory.
//!
//! A deliberately small static-file server on `tokio::net`: the output tree
//! needs nothing more than GET, and reload notifications ride a single
//! server-sent-events endpoint. Served HTML gets the client script injected
//! before `</body>`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use sitebuild_shared::{Result, SitebuildError};

use crate::{ReloadEvent, ReloadHub};

/// SSE endpoint streamed by the injected client.
const EVENTS_PATH: &str = "/__livereload";

/// Path of the injected client script.
const CLIENT_PATH: &str = "/__livereload.js";

/// Script tag injected into served HTML.
const INJECT_TAG: &str = "<script src=\"/__livereload.js\"></script>";

/// The embedded live-reload client: hot-swaps stylesheets on `styles`
/// events, reloads the page on `reload` events.
const CLIENT_JS: &str = r#"(function () {
  'use strict';
  var source = new EventSource('/__livereload');
  source.addEventListener('styles', function () {
    var links = document.querySelectorAll('link[rel="stylesheet"]');
    for (var i = 0; i < links.length; i++) {
      var href = links[i].getAttribute('href').split('?')[0];
      links[i].setAttribute('href', href + '?reload=' + Date.now());
    }
  });
  source.addEventListener('reload', function () {
    location.reload();
  });
})();
"#;

/// Bind the preview listener on localhost.
pub async fn bind(port: u16) -> Result<TcpListener> {
    TcpListener::bind(("127.0.0.1", port))
        .await
        .map_err(|e| SitebuildError::Serve(format!("bind 127.0.0.1:{port}: {e}")))
}

/// Accept loop: serve `root` until the listener is dropped.
///
/// Each connection gets its own task; a connection error never takes the
/// server down.
pub async fn run(listener: TcpListener, root: PathBuf, hub: ReloadHub) -> Result<()> {
    let root = Arc::new(root);

    if let Ok(addr) = listener.local_addr() {
        info!(%addr, root = %root.display(), "preview server listening");
    }

    loop {
        let (stream, peer) = listener
            .accept()
            .await
            .map_err(|e| SitebuildError::Serve(format!("accept: {e}")))?;

        let root = Arc::clone(&root);
        let hub = hub.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, &root, &hub).await {
                debug!(%peer, error = %e, "connection closed with error");
            }
        });
    }
}

/// Serve one HTTP connection (one request; the server closes after
/// responding, except for the SSE stream).
async fn handle_connection(
    mut stream: TcpStream,
    root: &Path,
    hub: &ReloadHub,
) -> std::io::Result<()> {
    let (reader, mut writer) = stream.split();
    let mut lines = BufReader::new(reader).lines();

    let request_line = match lines.next_line().await? {
        Some(line) => line,
        None => return Ok(()),
    };

    // Drain headers; none of them influence this server.
    while let Some(line) = lines.next_line().await? {
        if line.is_empty() {
            break;
        }
    }

    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("/");

    if method != "GET" {
        return write_simple(&mut writer, "405 Method Not Allowed", "method not allowed").await;
    }

    // Ignore any query string (cache busting from the client script).
    let path = target.split('?').next().unwrap_or("/");

    match path {
        EVENTS_PATH => stream_events(&mut writer, hub).await,
        CLIENT_PATH => {
            write_response(&mut writer, "200 OK", "application/javascript", CLIENT_JS.as_bytes())
                .await
        }
        _ => serve_file(&mut writer, root, path).await,
    }
}

// ---------------------------------------------------------------------------
// Static files
// ---------------------------------------------------------------------------

/// Resolve and serve a file from the output root.
async fn serve_file(
    writer: &mut (impl AsyncWriteExt + Unpin),
    root: &Path,
    request_path: &str,
) -> std::io::Result<()> {
    let Some(rel) = sanitize_path(request_path) else {
        warn!(path = request_path, "rejected path traversal attempt");
        return write_simple(writer, "403 Forbidden", "forbidden").await;
    };

    let mut file_path = root.join(rel);
    if file_path.is_dir() {
        file_path = file_path.join("index.html");
    }

    let body = match tokio::fs::read(&file_path).await {
        Ok(body) => body,
        Err(_) => {
            debug!(path = %file_path.display(), "not found");
            return write_simple(writer, "404 Not Found", "not found").await;
        }
    };

    let content_type = content_type_for(&file_path);

    if content_type == "text/html" {
        let html = String::from_utf8_lossy(&body);
        let injected = inject_client(&html);
        write_response(writer, "200 OK", content_type, injected.as_bytes()).await
    } else {
        write_response(writer, "200 OK", content_type, &body).await
    }
}

/// Turn a request path into a safe path relative to the root, or `None`
/// when it tries to escape.
fn sanitize_path(request_path: &str) -> Option<PathBuf> {
    let trimmed = request_path.trim_start_matches('/');
    let mut rel = PathBuf::new();

    for component in trimmed.split('/') {
        match component {
            "" | "." => {}
            ".." => return None,
            c if c.contains('\\') || c.contains('\0') => return None,
            c => rel.push(c),
        }
    }

    if rel.as_os_str().is_empty() {
        rel.push("index.html");
    }
    Some(rel)
}

/// Inject the client script tag before `</body>`, or append when the page
/// has no closing body tag.
fn inject_client(html: &str) -> String {
    match html.rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + INJECT_TAG.len() + 1);
            out.push_str(&html[..idx]);
            out.push_str(INJECT_TAG);
            out.push('\n');
            out.push_str(&html[idx..]);
            out
        }
        None => format!("{html}\n{INJECT_TAG}\n"),
    }
}

/// Content type by file extension.
fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("eot") => "application/vnd.ms-fontobject",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Server-sent events
// ---------------------------------------------------------------------------

/// Stream reload events to one client until it disconnects.
async fn stream_events(
    writer: &mut (impl AsyncWriteExt + Unpin),
    hub: &ReloadHub,
) -> std::io::Result<()> {
    // Subscribe before acknowledging, so no event published after the
    // client sees the headers can be missed.
    let mut rx = hub.subscribe();

    writer
        .write_all(
            b"HTTP/1.1 200 OK\r\n\
              Content-Type: text/event-stream\r\n\
              Cache-Control: no-cache\r\n\
              Connection: keep-alive\r\n\r\n",
        )
        .await?;
    writer.write_all(b": connected\n\n").await?;
    writer.flush().await?;
    let mut keep_alive = tokio::time::interval(Duration::from_secs(15));
    keep_alive.tick().await; // first tick fires immediately

    loop {
        let frame = tokio::select! {
            event = rx.recv() => match event {
                Ok(ReloadEvent::Styles { name }) => {
                    format!("event: styles\ndata: {name}\n\n")
                }
                Ok(ReloadEvent::Full) => "event: reload\ndata: page\n\n".to_string(),
                // Lagged subscribers missed events; a full reload catches up.
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                    "event: reload\ndata: page\n\n".to_string()
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return Ok(()),
            },
            _ = keep_alive.tick() => ": keep-alive\n\n".to_string(),
        };

        writer.write_all(frame.as_bytes()).await?;
        writer.flush().await?;
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

async fn write_response(
    writer: &mut (impl AsyncWriteExt + Unpin),
    status: &str,
    content_type: &str,
    body: &[u8],
) -> std::io::Result<()> {
    let head = format!(
        "HTTP/1.1 {status}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n",
        body.len()
    );
    writer.write_all(head.as_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await
}

async fn write_simple(
    writer: &mut (impl AsyncWriteExt + Unpin),
    status: &str,
    message: &str,
) -> std::io::Result<()> {
    write_response(writer, status, "text/plain", message.as_bytes()).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
