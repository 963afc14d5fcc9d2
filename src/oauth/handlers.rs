use actix_web::{HttpResponse, Responder, web};
use sqlx::MySqlPool;
use tracing::{error, info};

use crate::auth::handlers::issue_token_pair;
use crate::config::{Config, OAuthProviderConfig};
use crate::models::TokenPairResponse;
use crate::oauth::{account, provider};
use crate::policy::see_other;
use serde::Deserialize;

/// Provider failures land back on the entry route with a short error code;
/// no account state is committed on any failure path.
fn entry_with_error(code: &str) -> HttpResponse {
    see_other(&format!("/?error={}", code))
}

fn provider_config<'a>(
    config: &'a Config,
    provider: provider::Provider,
) -> Option<&'a OAuthProviderConfig> {
    match provider {
        provider::Provider::Google => config.google.as_ref(),
        provider::Provider::Github => config.github.as_ref(),
        provider::Provider::Facebook => config.facebook.as_ref(),
    }
}

/// Starts the authorization flow by bouncing the browser to the provider.
#[utoipa::path(
    get,
    path = "/auth/{provider}/login",
    params(("provider", Path, description = "google, github or facebook")),
    responses((status = 303, description = "Redirect to the provider's consent screen")),
    tag = "SocialLogin"
)]
pub async fn social_login(
    path: web::Path<String>,
    config: web::Data<Config>,
) -> impl Responder {
    let provider = match provider::Provider::from_path(&path) {
        Some(p) => p,
        None => return entry_with_error("unknown_provider"),
    };

    let Some(cfg) = provider_config(&config, provider) else {
        return entry_with_error("provider_not_configured");
    };

    match provider::authorize_url(provider, cfg) {
        Ok(url) => see_other(&url),
        Err(e) => {
            error!(error = %e, provider = provider.as_str(), "Failed to build authorize URL");
            entry_with_error("provider_not_configured")
        }
    }
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// Completes the flow: code exchange, userinfo fetch, lookup-or-create, then
/// the same token pair password login issues.
#[utoipa::path(
    get,
    path = "/auth/{provider}/callback",
    params(
        ("provider", Path, description = "google, github or facebook"),
        ("code", Query, description = "Authorization code"),
        ("error", Query, description = "Provider-reported error")
    ),
    responses(
        (status = 200, description = "Token pair", body = TokenPairResponse),
        (status = 303, description = "Redirect to entry route on failure")
    ),
    tag = "SocialLogin"
)]
pub async fn social_callback(
    path: web::Path<String>,
    query: web::Query<CallbackQuery>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let provider = match provider::Provider::from_path(&path) {
        Some(p) => p,
        None => return entry_with_error("unknown_provider"),
    };

    if let Some(err) = &query.error {
        info!(provider = provider.as_str(), error = %err, "Provider reported an error");
        return entry_with_error("provider_denied");
    }

    let Some(code) = query.code.clone() else {
        return entry_with_error("missing_code");
    };

    let Some(cfg) = provider_config(&config, provider) else {
        return entry_with_error("provider_not_configured");
    };

    let identity = match provider::exchange_and_fetch(provider, cfg, code).await {
        Ok(identity) => identity,
        Err(e) => {
            error!(error = %e, provider = provider.as_str(), "Social login exchange failed");
            return entry_with_error("exchange_failed");
        }
    };

    let user = match account::login_or_create(pool.get_ref(), &identity).await {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, provider = provider.as_str(), "Social account handling failed");
            return entry_with_error("account_failed");
        }
    };

    if !user.is_active {
        info!(user_id = user.id, "Social login refused: account inactive");
        return entry_with_error("account_inactive");
    }

    match issue_token_pair(
        user.id,
        &user.username,
        user.role_id,
        pool.get_ref(),
        config.get_ref(),
    )
    .await
    {
        Ok(tokens) => HttpResponse::Ok().json(tokens),
        Err(e) => {
            error!(error = %e, "Failed to issue tokens after social login");
            entry_with_error("account_failed")
        }
    }
}
