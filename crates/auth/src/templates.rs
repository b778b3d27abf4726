//! Built-in pages of the OpenID endpoints.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

/// Template wrapper that converts Askama templates into HTML responses.
pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                tracing::error!("Failed to render template: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to render template: {err}"),
                )
                    .into_response()
            }
        }
    }
}

/// Login form. Posts `openid_url` (and `next`) back to `action`.
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub action: String,
    pub logo: String,
    pub message: Option<String>,
    pub next: Option<String>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub message: String,
}

#[derive(Template)]
#[template(path = "logged_in.html")]
pub struct LoggedInTemplate {
    pub identity_url: String,
}

/// Lists the OpenIDs on the session of a logged-in account, optionally
/// proposing one to link.
#[derive(Template)]
#[template(path = "associate.html")]
pub struct AssociateTemplate {
    pub account: String,
    pub specific_openid: Option<String>,
    pub openids: Vec<String>,
}

pub struct AccountChoice {
    pub id: i64,
    pub name: String,
}

#[derive(Template)]
#[template(path = "pick_account.html")]
pub struct PickAccountTemplate {
    pub identity_url: String,
    pub accounts: Vec<AccountChoice>,
}

/// Registration prompt, prefilled from simple-registration fields.
#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub identity_url: String,
    pub sreg: Vec<(String, String)>,
}

/// The 16x16 OpenID logo served by the `logo` sub-operation.
pub const OPENID_LOGO_BASE64: &str = concat!(
    "R0lGODlhEAAQAMQAAO3t7eHh4srKyvz8/P5pDP9rENLS0v/28P/17tXV1dHEvPDw8M3Nzfn5+d3d",
    "3f5jA97Syvnv6MfLzcfHx/1mCPx4Kc/S1Pf189C+tP+xgv/k1N3OxfHy9NLV1/39/f///yH5BAAA",
    "AAAALAAAAAAQABAAAAVq4CeOZGme6KhlSDoexdO6H0IUR+otwUYRkMDCUwIYJhLFTyGZJACAwQcg",
    "EAQ4kVuEE2AIGAOPQQAQwXCfS8KQGAwMjIYIUSi03B7iJ+AcnmclHg4TAh0QDzIpCw4WGBUZeikD",
    "Fzk0lpcjIQA7",
);

#[cfg(test)]
mod tests {
    use base64::Engine;

    use super::*;

    #[test]
    fn logo_decodes_to_gif() {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(OPENID_LOGO_BASE64)
            .unwrap();
        assert!(bytes.starts_with(b"GIF89a"));
    }

    #[test]
    fn login_template_escapes_message() {
        let html = LoginTemplate {
            action: "/openid/".to_string(),
            logo: "/openid/logo/".to_string(),
            message: Some("<script>".to_string()),
            next: None,
        }
        .render()
        .unwrap();

        assert!(html.contains("action=\"/openid/\""));
        assert!(html.contains("name=\"openid_url\""));
        assert!(!html.contains("<script>"));
        assert!(!html.contains("name=\"next\""));
    }

    #[test]
    fn login_template_carries_next() {
        let html = LoginTemplate {
            action: "/openid/".to_string(),
            logo: "/openid/logo/".to_string(),
            message: None,
            next: Some("/inbox".to_string()),
        }
        .render()
        .unwrap();

        assert!(html.contains("name=\"next\""));
    }

    #[test]
    fn logged_in_template_shows_identity() {
        let html = LoggedInTemplate {
            identity_url: "http://alice.example/".to_string(),
        }
        .render()
        .unwrap();

        assert!(html.contains("You logged in as"));
        assert!(html.contains("alice.example"));
    }

    #[test]
    fn register_template_lists_sreg_fields() {
        let html = RegisterTemplate {
            identity_url: "http://bob.example/".to_string(),
            sreg: vec![("nickname".to_string(), "bob".to_string())],
        }
        .render()
        .unwrap();

        assert!(html.contains("nickname"));
        assert!(html.contains("bob"));
    }
}
