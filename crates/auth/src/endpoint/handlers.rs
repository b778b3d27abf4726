use std::collections::BTreeMap;

use axum::{
    extract::{FromRequest, Query, Request, State},
    http::{header::CONTENT_TYPE, Method, Uri},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::CookieJar;
use base64::Engine;
use chrono::Utc;
use relyingparty_core::protocol::{begin_login, complete_login, validate_next, Operation};
use relyingparty_core::{AuthError as CoreError, IdentityUrl};
use serde::Deserialize;
use serde_json::json;

use super::{Endpoint, LoginContext};
use crate::error::AuthError;
use crate::templates::{HtmlTemplate, LoginTemplate, OPENID_LOGO_BASE64};

#[derive(Deserialize)]
struct LoginForm {
    openid_url: Option<String>,
    next: Option<String>,
}

/// Entry point for every request under the mount path.
pub(super) async fn dispatch(State(endpoint): State<Endpoint>, request: Request) -> Response {
    match route(&endpoint, request).await {
        Ok(response) => response,
        Err(e) => e.into_page(&endpoint.config().messages),
    }
}

async fn route(endpoint: &Endpoint, request: Request) -> Result<Response, AuthError> {
    let path = request.uri().path().to_string();
    if !path.ends_with('/') {
        let target = match request.uri().query() {
            Some(query) => format!("{path}/?{query}"),
            None => format!("{path}/"),
        };
        return Ok(Redirect::temporary(&target).into_response());
    }

    let rest = path
        .strip_prefix(endpoint.config().base_path())
        .unwrap_or_default()
        .trim_start_matches('/');
    let segment = rest.split('/').next().unwrap_or_default();

    let operation = Operation::from_segment(segment)
        .filter(|operation| endpoint.supports(*operation))
        .ok_or_else(|| CoreError::NotFound(format!("no '{segment}' operation")))?;
    tracing::debug!(?operation, method = %request.method(), "Dispatching OpenID request");

    match operation {
        Operation::Login => login(endpoint, request).await,
        Operation::Complete => complete(endpoint, request).await,
        Operation::Logout => logout(endpoint, request).await,
        Operation::Logo => logo(),
        Operation::Debug => debug(endpoint, request).await,
        Operation::Associate => {
            let ctx = context(endpoint, request.uri());
            let jar = CookieJar::from_headers(request.headers());
            endpoint.inner.outcome.associate(&ctx, &jar).await
        }
    }
}

fn query_params(uri: &Uri) -> BTreeMap<String, String> {
    Query::<BTreeMap<String, String>>::try_from_uri(uri)
        .map(|Query(params)| params)
        .unwrap_or_default()
}

fn context(endpoint: &Endpoint, uri: &Uri) -> LoginContext {
    let params = query_params(uri);
    let next = params
        .get("next")
        .and_then(|next| validate_next(next))
        .map(String::from);

    LoginContext {
        endpoint_path: endpoint.root_path(),
        next,
        params,
    }
}

fn show_login(endpoint: &Endpoint, ctx: &LoginContext, message: Option<String>) -> Response {
    let config = endpoint.config();
    HtmlTemplate(LoginTemplate {
        action: ctx.endpoint_path.clone(),
        logo: config
            .logo_path
            .clone()
            .unwrap_or_else(|| format!("{}logo/", ctx.endpoint_path)),
        message,
        next: ctx.next.clone(),
    })
    .into_response()
}

async fn login(endpoint: &Endpoint, request: Request) -> Result<Response, AuthError> {
    let mut ctx = context(endpoint, request.uri());
    if request.method() != Method::POST {
        return Ok(show_login(endpoint, &ctx, None));
    }

    let form = match Form::<LoginForm>::from_request(request, &()).await {
        Ok(Form(form)) => form,
        Err(rejection) => return Ok(rejection.into_response()),
    };
    if let Some(next) = form.next.as_deref().and_then(validate_next) {
        ctx.next = Some(next.to_string());
    }

    let config = endpoint.config();
    let trust_root = match &config.trust_root {
        Some(trust_root) => trust_root.clone(),
        None => config.absolute_url(&ctx.endpoint_path)?.to_string(),
    };
    let mut return_to = match &config.on_complete_url {
        Some(url) => config.absolute_url(url)?,
        None => config.absolute_url(&format!("{}complete/", ctx.endpoint_path))?,
    };
    if let Some(next) = &ctx.next {
        return_to.query_pairs_mut().append_pair("next", next);
    }

    let claimed = form.openid_url.unwrap_or_default();
    let result = begin_login(
        endpoint.inner.consumer.as_ref(),
        &claimed,
        &trust_root,
        return_to.as_str(),
        &endpoint.inner.extension_args,
        config.xri_enabled,
    )
    .await;

    match result {
        Ok(redirect) => Ok(Redirect::to(redirect.as_str()).into_response()),
        Err(CoreError::MissingIdentifier) => Ok(show_login(
            endpoint,
            &ctx,
            Some(config.messages.openid_required.clone()),
        )),
        Err(CoreError::UnsupportedIdentifierScheme(_)) => Ok(show_login(
            endpoint,
            &ctx,
            Some(config.messages.xri_disabled.clone()),
        )),
        Err(e) => Err(e.into()),
    }
}

async fn complete(endpoint: &Endpoint, request: Request) -> Result<Response, AuthError> {
    let uri = request.uri().clone();
    let jar = CookieJar::from_headers(request.headers());
    let mut params = query_params(&uri);

    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));
    if request.method() == Method::POST && is_form {
        if let Ok(Form(form)) = Form::<BTreeMap<String, String>>::from_request(request, &()).await {
            params.extend(form);
        }
    }

    let ctx = LoginContext {
        endpoint_path: endpoint.root_path(),
        next: params
            .get("next")
            .and_then(|next| validate_next(next))
            .map(String::from),
        params: params.clone(),
    };

    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let return_url = endpoint.config().absolute_url(path_and_query)?;

    let result =
        complete_login(endpoint.inner.consumer.as_ref(), &params, return_url.as_str()).await?;
    let record = result
        .into_identity(Utc::now())
        .inspect_err(|e| tracing::warn!(error = %e, "OpenID login did not succeed"))?;
    tracing::info!(identity = %record.identity_url, "OpenID login verified");

    let jar = match &endpoint.inner.binding {
        Some(binding) => binding.bind(jar, record.clone()).await?,
        None => jar,
    };

    let (jar, response) = endpoint
        .inner
        .outcome
        .on_logged_in(&ctx, jar, &record)
        .await?;
    Ok((jar, response).into_response())
}

async fn logout(endpoint: &Endpoint, request: Request) -> Result<Response, AuthError> {
    let Some(binding) = endpoint.binding() else {
        return Err(CoreError::NotFound("no 'logout' operation".to_string()).into());
    };

    let ctx = context(endpoint, request.uri());
    let jar = CookieJar::from_headers(request.headers());

    let selected = binding
        .logout_selector()
        .and_then(|name| ctx.params.get(name))
        .filter(|value| !value.is_empty())
        .map(|value| IdentityUrl::new(value.clone()));

    let jar = binding.unbind(jar, selected.as_ref()).await?;
    match &selected {
        Some(identity) => tracing::info!(%identity, "OpenID logout"),
        None => tracing::info!("OpenID logout of all identities"),
    }

    let response = endpoint.inner.outcome.on_logged_out(&ctx).await?;
    Ok((jar, response).into_response())
}

fn logo() -> Result<Response, AuthError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(OPENID_LOGO_BASE64)
        .map_err(|e| AuthError::Config(format!("embedded logo: {e}")))?;
    Ok(([(CONTENT_TYPE, "image/gif")], bytes).into_response())
}

async fn debug(endpoint: &Endpoint, request: Request) -> Result<Response, AuthError> {
    let config = endpoint.config();
    let jar = CookieJar::from_headers(request.headers());

    let binding = match endpoint.binding() {
        Some(binding) => binding.describe(&jar).await,
        None => serde_json::Value::Null,
    };
    let operations: Vec<&str> = Operation::ALL
        .into_iter()
        .filter(|operation| endpoint.supports(*operation))
        .map(|operation| operation.segment())
        .collect();

    Ok(Json(json!({
        "mount_path": config.base_path(),
        "base_url": config.base_url.as_str(),
        "trust_root": config.trust_root,
        "on_complete_url": config.on_complete_url,
        "xri_enabled": config.xri_enabled,
        "sreg": config.sreg,
        "extension_args": config.extension_args,
        "operations": operations,
        "binding": binding,
    }))
    .into_response())
}
