//! Local fake backend shared by the integration tests.
//!
//! Starts a `tiny_http` server on an ephemeral port that answers a fixed
//! script of responses and reports the request URLs it saw.
use std::sync::mpsc;
use std::thread;

use tiny_http::{Header, Response, Server};

pub struct FakeBackend {
    pub base_url: String,
    pub seen: mpsc::Receiver<String>,
}

/// Serve `script` in order, one `(status, body)` per request.
pub fn fake_backend(script: Vec<(u16, &'static str)>) -> FakeBackend {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, body) in script {
            let Ok(request) = server.recv() else { return };
            let _ = tx.send(request.url().to_string());
            let resp = Response::from_string(body)
                .with_status_code(status)
                .with_header(
                    Header::from_bytes("Content-Type", "application/json").unwrap(),
                );
            let _ = request.respond(resp);
        }
    });

    FakeBackend {
        base_url: format!("http://{addr}"),
        seen: rx,
    }
}
