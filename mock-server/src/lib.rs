use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Token accepted when none is configured.
pub const DEFAULT_TOKEN: &str = "test-token";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Link {
    pub id: Uuid,
    pub url: String,
    pub title: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateLink {
    #[serde(default)]
    pub url: String,
    pub title: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateLink {
    pub url: Option<String>,
    pub title: Option<String>,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Link>>>;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    token: Arc<str>,
}

type Failure = (StatusCode, Json<Value>);
type ApiResult<T> = Result<T, Failure>;

pub fn app(token: &str) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(HashMap::new())),
        token: Arc::from(token),
    };
    Router::new()
        .route("/links", get(list_links).post(create_link))
        .route(
            "/links/{id}",
            get(get_link).patch(update_link).delete(delete_link),
        )
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .with_state(state)
}

pub async fn run(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(token)).await
}

fn failure(status: StatusCode, message: &str) -> Failure {
    (status, Json(json!({ "message": message })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    let expected = format!("Bearer {}", state.token);
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => {
            tracing::debug!("rejecting request without a valid bearer token");
            Err(failure(StatusCode::UNAUTHORIZED, "Unauthenticated."))
        }
    }
}

async fn list_links(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(filter): Query<HashMap<String, String>>,
) -> ApiResult<Json<Vec<Link>>> {
    authorize(&state, &headers)?;
    let links = state.db.read().await;
    let title = filter.get("title");
    Ok(Json(
        links
            .values()
            .filter(|link| title.is_none() || link.title.as_ref() == title)
            .cloned()
            .collect(),
    ))
}

async fn create_link(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateLink>,
) -> ApiResult<(StatusCode, Json<Link>)> {
    authorize(&state, &headers)?;
    if input.url.trim().is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "message": "The given data was invalid.",
                "errors": { "url": ["The url field is required."] }
            })),
        ));
    }
    let link = Link {
        id: Uuid::new_v4(),
        url: input.url,
        title: input.title,
    };
    state.db.write().await.insert(link.id, link.clone());
    Ok((StatusCode::CREATED, Json(link)))
}

async fn get_link(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Link>> {
    authorize(&state, &headers)?;
    let links = state.db.read().await;
    links
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "Link not found."))
}

async fn update_link(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateLink>,
) -> ApiResult<Json<Link>> {
    authorize(&state, &headers)?;
    let mut links = state.db.write().await;
    let link = links
        .get_mut(&id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "Link not found."))?;
    if let Some(url) = input.url {
        link.url = url;
    }
    if let Some(title) = input.title {
        link.title = Some(title);
    }
    Ok(Json(link.clone()))
}

async fn delete_link(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    authorize(&state, &headers)?;
    let mut links = state.db.write().await;
    links
        .remove(&id)
        .map(|_| Json(json!({ "deleted": true, "id": id })))
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "Link not found."))
}

/// Reflect what the client sent.
async fn echo(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    body: String,
) -> ApiResult<Json<Value>> {
    authorize(&state, &headers)?;
    let value_of = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let json_body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body)
            .map_err(|_| failure(StatusCode::BAD_REQUEST, "Body is not valid JSON."))?
    };
    Ok(Json(json!({
        "method": method.as_str(),
        "query": query,
        "headers": {
            "authorization": value_of(header::AUTHORIZATION),
            "user-agent": value_of(header::USER_AGENT),
            "accept": value_of(header::ACCEPT),
            "content-type": value_of(header::CONTENT_TYPE),
        },
        "json": json_body,
    })))
}

async fn status(Path(code): Path<u16>) -> Failure {
    match StatusCode::from_u16(code) {
        Ok(status) => failure(status, &format!("Responded with status {code}.")),
        Err(_) => failure(StatusCode::BAD_REQUEST, "Unknown status code."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_serializes_to_json() {
        let link = Link {
            id: Uuid::nil(),
            url: "https://example.com".to_string(),
            title: None,
        };
        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["url"], "https://example.com");
        assert!(json["title"].is_null());
    }

    #[test]
    fn create_link_defaults_missing_url_to_empty() {
        let input: CreateLink = serde_json::from_str(r#"{"title":"No url"}"#).unwrap();
        assert!(input.url.is_empty());
        assert_eq!(input.title.as_deref(), Some("No url"));
    }

    #[test]
    fn update_link_all_fields_optional() {
        let input: UpdateLink = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.url.is_none());
        assert!(input.title.is_none());
    }

    #[test]
    fn authorize_requires_exact_bearer() {
        let state = AppState {
            db: Db::default(),
            token: Arc::from("secret"),
        };
        let mut headers = HeaderMap::new();
        assert!(authorize(&state, &headers).is_err());

        headers.insert(header::AUTHORIZATION, "Bearer wrong".parse().unwrap());
        assert!(authorize(&state, &headers).is_err());

        headers.insert(header::AUTHORIZATION, "Bearer secret".parse().unwrap());
        assert!(authorize(&state, &headers).is_ok());
    }
}
