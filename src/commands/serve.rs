use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tower_http::services::ServeFile;

use crate::{config::BuildConfig, log};

const INDEX_FILE: &str = "index.html";
const NOT_FOUND_BODY: &str = "404, Page not found....";

#[derive(thiserror::Error, Debug)]
pub enum ServeError {
    #[error("port already in use, use another port with the --port flag instead")]
    PortInUse,

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serve the output directory until the process is stopped.
pub async fn run(config: &BuildConfig) -> Result<(), anyhow::Error> {
    let root = Arc::new(config.out.clone());
    let app = Router::new().fallback(serve_page).with_state(root);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| match source.kind() {
            std::io::ErrorKind::AddrInUse => ServeError::PortInUse,
            _ => ServeError::Bind { addr, source },
        })?;

    let url = format!("http://localhost:{}", config.port);
    log::info(&format!("Serving {} at {url}", config.out.display()));
    log::info("Press Ctrl+C to stop");

    if config.open
        && let Err(e) = open::that(&url)
    {
        log::warn(&format!("Failed to open browser: {e}"));
    }

    axum::serve(listener, app).await.map_err(ServeError::from)?;

    Ok(())
}

async fn serve_page(State(root): State<Arc<PathBuf>>, req: Request) -> Response {
    let Some(path) = resolve_request_path(&root, req.uri().path()) else {
        return not_found();
    };
    log::debug(&format!("{} -> {}", req.uri().path(), path.display()));
    let display_path = path.display().to_string();

    match ServeFile::new(path).try_call(req).await {
        Ok(response) => response.map(Body::new),
        Err(e) => {
            log::warn(&format!("failed to serve {display_path}: {e}"));
            not_found()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
}

/// Map a request path to a file under `root`.
///
/// Tried in order: `/` as `index.html`, the exact file, a directory's
/// `index.html`, then the path with `.html` appended. Paths that try to leave
/// `root` resolve to nothing.
pub fn resolve_request_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = request_path.trim_start_matches('/');
    if relative.split('/').any(|segment| segment == "..") {
        return None;
    }

    if relative.is_empty() {
        let index = root.join(INDEX_FILE);
        return index.is_file().then_some(index);
    }

    let candidate = root.join(relative);
    if candidate.is_file() {
        return Some(candidate);
    }
    if candidate.is_dir() {
        let index = candidate.join(INDEX_FILE);
        if index.is_file() {
            return Some(index);
        }
    }

    let with_extension = root.join(format!("{}.html", relative.trim_end_matches('/')));
    with_extension.is_file().then_some(with_extension)
}
