use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use relyingparty_auth::OpenIds;
use relyingparty_core::AccountStore;
use url::form_urlencoded;

use crate::{error::AppError, state::AppState};

struct IdentityRow {
    url: String,
    logout_href: String,
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    account: Option<String>,
    identities: Vec<IdentityRow>,
    login_href: String,
    logout_all_href: String,
}

/// Home page listing the OpenIDs on the request.
pub async fn home(
    State(state): State<AppState>,
    jar: CookieJar,
    openids: OpenIds,
) -> Result<Response, AppError> {
    let root = format!("{}/", state.endpoint.config().base_path());
    let logout = format!("{root}logout/");
    let selector = state.binding.logout_selector();

    let identities = openids
        .all
        .iter()
        .map(|record| {
            let url = record.identity_url.to_string();
            let logout_href = match selector {
                Some(name) => {
                    let value: String = form_urlencoded::byte_serialize(url.as_bytes()).collect();
                    format!("{logout}?{name}={value}")
                }
                None => logout.clone(),
            };
            IdentityRow { url, logout_href }
        })
        .collect();

    let account = match &state.sessions {
        Some(sessions) => match sessions.principal(&jar).await? {
            Some(principal) => Some(
                state
                    .accounts
                    .display_name(principal.account)
                    .await?
                    .unwrap_or_else(|| principal.account.to_string()),
            ),
            None => None,
        },
        None => None,
    };

    let template = HomeTemplate {
        account,
        identities,
        login_href: root,
        logout_all_href: logout,
    };

    match template.render() {
        Ok(html) => Ok(Html(html).into_response()),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render home page");
            Ok((StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response())
        }
    }
}
