//! External identity providers: endpoint tables, code exchange, userinfo
//! retrieval.

use anyhow::{Result, anyhow};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl, basic::BasicClient,
};
use serde::Deserialize;

use crate::config::OAuthProviderConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Google,
    Github,
    Facebook,
}

impl Provider {
    pub fn from_path(s: &str) -> Option<Self> {
        match s {
            "google" => Some(Provider::Google),
            "github" => Some(Provider::Github),
            "facebook" => Some(Provider::Facebook),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Github => "github",
            Provider::Facebook => "facebook",
        }
    }

    fn auth_url(self) -> &'static str {
        match self {
            Provider::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            Provider::Github => "https://github.com/login/oauth/authorize",
            Provider::Facebook => "https://www.facebook.com/v19.0/dialog/oauth",
        }
    }

    fn token_url(self) -> &'static str {
        match self {
            Provider::Google => "https://oauth2.googleapis.com/token",
            Provider::Github => "https://github.com/login/oauth/access_token",
            Provider::Facebook => "https://graph.facebook.com/v19.0/oauth/access_token",
        }
    }

    fn scopes(self) -> &'static [&'static str] {
        match self {
            Provider::Google => &["profile", "email"],
            Provider::Github => &["user:email"],
            Provider::Facebook => &["email", "public_profile"],
        }
    }
}

/// What a provider told us about the logged-in person, plus the tokens the
/// exchange produced.
#[derive(Debug, Clone)]
pub struct SocialIdentity {
    pub provider: Provider,
    pub provider_id: String,
    pub email: String,
    pub username_hint: String,
    pub avatar_url: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
}

pub fn build_client(provider: Provider, cfg: &OAuthProviderConfig) -> Result<BasicClient> {
    Ok(BasicClient::new(
        ClientId::new(cfg.client_id.clone()),
        Some(ClientSecret::new(cfg.client_secret.clone())),
        AuthUrl::new(provider.auth_url().to_string())?,
        Some(TokenUrl::new(provider.token_url().to_string())?),
    )
    .set_redirect_uri(RedirectUrl::new(cfg.redirect_url.clone())?))
}

pub fn authorize_url(provider: Provider, cfg: &OAuthProviderConfig) -> Result<String> {
    let client = build_client(provider, cfg)?;
    let mut request = client.authorize_url(CsrfToken::new_random);
    for scope in provider.scopes() {
        request = request.add_scope(Scope::new((*scope).to_string()));
    }
    let (url, _csrf) = request.url();
    Ok(url.to_string())
}

/// Exchanges the callback code for tokens and resolves the identity behind
/// them. Fails without side effects; account handling happens afterwards.
pub async fn exchange_and_fetch(
    provider: Provider,
    cfg: &OAuthProviderConfig,
    code: String,
) -> Result<SocialIdentity> {
    let client = build_client(provider, cfg)?;

    let token = client
        .exchange_code(AuthorizationCode::new(code))
        .request_async(oauth2::reqwest::async_http_client)
        .await
        .map_err(|e| anyhow!("token exchange failed: {}", e))?;

    let access_token = token.access_token().secret().clone();
    let refresh_token = token.refresh_token().map(|t| t.secret().clone());

    let mut identity = fetch_identity(provider, &access_token).await?;
    identity.access_token = access_token;
    identity.refresh_token = refresh_token;
    Ok(identity)
}

async fn fetch_identity(provider: Provider, access_token: &str) -> Result<SocialIdentity> {
    match provider {
        Provider::Google => fetch_google(access_token).await,
        Provider::Github => fetch_github(access_token).await,
        Provider::Facebook => fetch_facebook(access_token).await,
    }
}

#[derive(Deserialize)]
struct GoogleUser {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

async fn fetch_google(access_token: &str) -> Result<SocialIdentity> {
    let user: GoogleUser = reqwest::Client::new()
        .get("https://www.googleapis.com/oauth2/v3/userinfo")
        .bearer_auth(access_token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let email = user.email.ok_or_else(|| anyhow!("no email from google"))?;
    Ok(SocialIdentity {
        provider: Provider::Google,
        provider_id: user.sub,
        username_hint: user.name.unwrap_or_else(|| email.clone()),
        email,
        avatar_url: user.picture,
        access_token: String::new(),
        refresh_token: None,
    })
}

#[derive(Deserialize)]
struct GithubUser {
    id: u64,
    login: String,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

async fn fetch_github(access_token: &str) -> Result<SocialIdentity> {
    let client = reqwest::Client::new();
    let user: GithubUser = client
        .get("https://api.github.com/user")
        .header("User-Agent", "oms")
        .bearer_auth(access_token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    // The profile email is often hidden; fall back to the primary verified
    // address from the emails endpoint.
    let email = match user.email {
        Some(e) => e,
        None => {
            let emails: Vec<GithubEmail> = client
                .get("https://api.github.com/user/emails")
                .header("User-Agent", "oms")
                .bearer_auth(access_token)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            emails
                .into_iter()
                .find(|e| e.primary && e.verified)
                .map(|e| e.email)
                .ok_or_else(|| anyhow!("no primary verified email from github"))?
        }
    };

    Ok(SocialIdentity {
        provider: Provider::Github,
        provider_id: user.id.to_string(),
        email,
        username_hint: user.login,
        avatar_url: user.avatar_url,
        access_token: String::new(),
        refresh_token: None,
    })
}

#[derive(Deserialize)]
struct FacebookUser {
    id: String,
    name: Option<String>,
    email: Option<String>,
}

async fn fetch_facebook(access_token: &str) -> Result<SocialIdentity> {
    let user: FacebookUser = reqwest::Client::new()
        .get("https://graph.facebook.com/v19.0/me")
        .query(&[("fields", "id,name,email"), ("access_token", access_token)])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let email = user
        .email
        .ok_or_else(|| anyhow!("no email from facebook"))?;
    Ok(SocialIdentity {
        provider: Provider::Facebook,
        provider_id: user.id,
        username_hint: user.name.unwrap_or_else(|| email.clone()),
        email,
        avatar_url: None,
        access_token: String::new(),
        refresh_token: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_path_names() {
        assert_eq!(Provider::from_path("google"), Some(Provider::Google));
        assert_eq!(Provider::from_path("github"), Some(Provider::Github));
        assert_eq!(Provider::from_path("facebook"), Some(Provider::Facebook));
        assert_eq!(Provider::from_path("twitter"), None);
        assert_eq!(Provider::Github.as_str(), "github");
    }

    #[test]
    fn authorize_url_carries_client_and_scopes() {
        let cfg = OAuthProviderConfig {
            client_id: "cid".into(),
            client_secret: "secret".into(),
            redirect_url: "https://example.com/auth/google/callback".into(),
        };
        let url = authorize_url(Provider::Google, &cfg).unwrap();
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth"));
        assert!(url.contains("client_id=cid"));
        assert!(url.contains("scope="));
        assert!(url.contains("response_type=code"));
    }
}
