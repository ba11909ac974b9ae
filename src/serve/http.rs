//! HTTP preview server.
//!
//! Serves the last successfully composed document from memory, so a failed
//! rebuild never tears down a working preview.

use std::sync::Arc;

use anyhow::Result;
use tiny_http::{Header, Response, Server};

use super::state::DevState;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Start the preview server on a background thread. Returns the actual
/// port bound (retries upward when the base port is taken).
pub fn start_preview_server(base_port: u16, state: Arc<DevState>) -> Result<u16> {
    let (server, actual_port) = try_bind_port(base_port, MAX_PORT_RETRIES)?;

    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let response = match state.last_success() {
                Some(result) => svg_response(result.document.clone()),
                None => Response::from_string("waiting for first successful build")
                    .with_status_code(503),
            };
            if let Err(e) = request.respond(response) {
                crate::debug!("serve"; "preview response failed: {e}");
            }
        }
    });

    Ok(actual_port)
}

fn svg_response(document: String) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut response = Response::from_data(document.into_bytes());
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"image/svg+xml"[..]) {
        response.add_header(header);
    }
    response
}

fn try_bind_port(base_port: u16, max_retries: u16) -> Result<(Server, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match Server::http(("127.0.0.1", port)) {
            Ok(server) => {
                // Report what the OS actually bound (port 0 picks one)
                let actual_port = server
                    .server_addr()
                    .to_ip()
                    .map_or(port, |addr| addr.port());
                return Ok((server, actual_port));
            }
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind preview server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
