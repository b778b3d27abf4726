//! Mock OpenID provider pages for development.
//!
//! Routes:
//! - `GET /mock-provider/authorize` - approval page for a `checkid_setup` request
//! - `POST /mock-provider/authorize/submit` - redirect back with the chosen assertion

use std::collections::BTreeMap;

use axum::{
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use relyingparty_core::SregFields;
use serde::Deserialize;

use super::{assertion_url, templates};

/// Path of the mock provider's authorize page.
pub const MOCK_PROVIDER_PATH: &str = "/mock-provider/authorize";

const SUBMIT_PATH: &str = "/mock-provider/authorize/submit";

#[derive(Deserialize)]
struct ApproveForm {
    action: String,
    identity: String,
    return_to: String,
    nickname: Option<String>,
    email: Option<String>,
}

/// Routes of the mock provider. Merge into the application router.
pub fn mock_provider_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route(MOCK_PROVIDER_PATH, get(authorize))
        .route(SUBMIT_PATH, post(authorize_submit))
}

async fn authorize(Query(params): Query<BTreeMap<String, String>>) -> Response {
    let (Some(identity), Some(return_to)) =
        (params.get("openid.identity"), params.get("openid.return_to"))
    else {
        return (StatusCode::BAD_REQUEST, "Missing openid.identity or openid.return_to")
            .into_response();
    };
    let trust_root = params
        .get("openid.trust_root")
        .map(String::as_str)
        .unwrap_or(return_to);

    Html(templates::approve_page(SUBMIT_PATH, identity, trust_root, return_to)).into_response()
}

async fn authorize_submit(Form(form): Form<ApproveForm>) -> Response {
    let mode = match form.action.as_str() {
        "approve" => "id_res",
        "cancel" => "cancel",
        "setup_needed" => "setup_needed",
        _ => return (StatusCode::BAD_REQUEST, "Unknown action").into_response(),
    };

    let mut sreg = SregFields::new();
    if mode == "id_res" {
        for (field, value) in [("nickname", form.nickname), ("email", form.email)] {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                sreg.insert(field.to_string(), value);
            }
        }
    }

    match assertion_url(&form.return_to, mode, &form.identity, &sreg) {
        Ok(url) => Redirect::to(url.as_str()).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Mock provider got an invalid return_to");
            (StatusCode::BAD_REQUEST, "Invalid return_to").into_response()
        }
    }
}
