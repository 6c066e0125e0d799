use std::io::Result;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Json;
use handlebars::Handlebars;

use crate::exporters::d3js::Node;

pub const ADDRESS: &str = "127.0.0.1:3000";

/// Serves the treemap on localhost until the process is stopped.
pub fn serve(treemap_data: Node) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()?;

    rt.block_on(serve_impl(treemap_data))
}

#[derive(Clone)]
struct UiState {
    treemap_data: Arc<Node>,
    templates: Arc<Handlebars<'static>>,
}

fn templates() -> Result<Handlebars<'static>> {
    let mut handlebars = Handlebars::new();
    handlebars
        .register_template_string("index", include_str!("../static/index.hbs"))
        .map_err(std::io::Error::other)?;
    Ok(handlebars)
}

async fn serve_impl(treemap_data: Node) -> Result<()> {
    let app = axum::Router::new()
        .route("/__debug__", get(debug_treemap_data))
        .route("/__data__/", get(data_handler))
        .route("/__data__/*key", get(data_handler))
        .route("/", get(page_handler))
        .route("/*key", get(page_handler))
        .with_state(UiState {
            treemap_data: Arc::new(treemap_data),
            templates: Arc::new(templates()?),
        });

    let listener = tokio::net::TcpListener::bind(ADDRESS).await?;
    println!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}

#[derive(serde_derive::Serialize)]
struct HbsData {
    path: String,
    total: u64,
}

async fn page_handler(
    State(state): State<UiState>,
    path: Option<Path<String>>,
) -> std::result::Result<Html<String>, (StatusCode, String)> {
    let path = path.map(|p| p.0).unwrap_or_default();
    let total = state
        .treemap_data
        .find(&path)
        .map(Node::size)
        .ok_or((StatusCode::NOT_FOUND, format!("no symbol at {path:?}")))?;
    state
        .templates
        .render("index", &HbsData { path, total })
        .map(Html)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

async fn data_handler(
    State(state): State<UiState>,
    path: Option<Path<String>>,
) -> std::result::Result<Json<Node>, StatusCode> {
    let path = path.map(|p| p.0).unwrap_or_default();
    state
        .treemap_data
        .find(&path)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn debug_treemap_data(State(state): State<UiState>) -> Html<String> {
    Html(format!("<pre>{:#?}</pre>", state.treemap_data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporters::d3js;
    use crate::node::DataNode;

    fn state() -> UiState {
        let mut root = DataNode::default();
        root.add(&["app.js", "foo"], 16);
        root.add(&["app.js", "bar"], 4);
        UiState {
            treemap_data: Arc::new(d3js::export(&root, u64::MAX)),
            templates: Arc::new(templates().unwrap()),
        }
    }

    #[tokio::test]
    async fn page_shows_path_and_total() {
        let Html(page) = page_handler(State(state()), Some(Path("app.js".to_string())))
            .await
            .unwrap();
        assert!(page.contains("/app.js (20 bytes)"));

        let missing = page_handler(State(state()), Some(Path("nope".to_string()))).await;
        assert!(matches!(missing, Err((StatusCode::NOT_FOUND, _))));
    }

    #[tokio::test]
    async fn data_follows_the_path() {
        let Json(root) = data_handler(State(state()), None).await.unwrap();
        assert_eq!(root.size(), 20);

        let Json(file) = data_handler(State(state()), Some(Path("app.js".to_string())))
            .await
            .unwrap();
        assert_eq!(file.name(), "app.js");
        assert_eq!(file.children().len(), 2);
    }
}
