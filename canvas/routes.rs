use std::io::{Cursor, Read};

use log::{debug, warn};
use serde_json::json;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::state::{parse_points, SharedState};

const INDEX_HTML: &str = include_str!("assets/index.html");

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn respond_with(status: u16, content_type: &str, body: Vec<u8>) -> Response<Cursor<Vec<u8>>> {
    let len = body.len();
    let headers = Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes())
        .into_iter()
        .collect();
    Response::new(StatusCode(status), headers, Cursor::new(body), Some(len), None)
}

fn html_response(body: String) -> Response<Cursor<Vec<u8>>> {
    respond_with(200, "text/html; charset=utf-8", body.into_bytes())
}

fn json_response(status: u16, body: serde_json::Value) -> Response<Cursor<Vec<u8>>> {
    respond_with(status, "application/json", body.to_string().into_bytes())
}

fn not_found() -> Response<Cursor<Vec<u8>>> {
    respond_with(404, "text/plain", b"404 Not Found".to_vec())
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let path = request.url().split('?').next().unwrap_or("").to_owned();
    debug!("{} {}", method, path);

    let response = match (method, path.as_str()) {
        (Method::Get, "/") => handle_index(&state),
        (Method::Post, "/predict") => handle_predict(&mut request, &state),
        _ => not_found(),
    };

    let _ = request.respond(response);
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn handle_index(state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    let (name, rows, cols) = match state.lock() {
        Ok(p) => (p.name().to_owned(), p.canvas_rows(), p.canvas_cols()),
        Err(_) => return json_response(500, json!({ "error": "model state is poisoned" })),
    };
    let page = INDEX_HTML
        .replace("{{MODEL}}", &name)
        .replace("{{ROWS}}", &rows.to_string())
        .replace("{{COLS}}", &cols.to_string());
    html_response(page)
}

/// `POST /predict` with a body of `x,y;x,y;...` in canvas coordinates.
fn handle_predict(request: &mut Request, state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    let mut body = String::new();
    if let Err(e) = request.as_reader().read_to_string(&mut body) {
        return json_response(400, json!({ "error": e.to_string() }));
    }

    let points = match parse_points(&body) {
        Ok(points) => points,
        Err(msg) => return json_response(400, json!({ "error": msg })),
    };

    let mut predictor = match state.lock() {
        Ok(p) => p,
        Err(_) => return json_response(500, json!({ "error": "model state is poisoned" })),
    };
    match predictor.predict(&points) {
        Ok(prediction) => {
            debug!("{} points -> class {}", points.len(), prediction.class);
            json_response(200, json!(prediction))
        }
        Err(e) => {
            warn!("prediction failed: {}", e);
            json_response(500, json!({ "error": e.to_string() }))
        }
    }
}
