//! Lookup-or-create for externally verified identities.

use anyhow::{Context, Result};
use sqlx::MySqlPool;
use tracing::info;

use crate::auth::handlers::is_username_available;
use crate::auth::password::unusable_password;
use crate::model::role::Role;
use crate::models::UserRow;
use crate::oauth::provider::SocialIdentity;
use crate::utils::{username_cache, username_filter};

/// Local-part of the email (or the provider's username hint), reduced to the
/// characters we allow in usernames.
pub fn username_base(hint: &str) -> String {
    let local = hint.split('@').next().unwrap_or(hint);
    let base: String = local
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    if base.is_empty() { "user".to_string() } else { base }
}

fn candidate(base: &str, counter: u32) -> String {
    if counter == 0 {
        base.to_string()
    } else {
        format!("{}{}", base, counter)
    }
}

/// base, base1, base2, ... until the availability chain clears one.
pub async fn allocate_username(pool: &MySqlPool, hint: &str) -> String {
    let base = username_base(hint);
    let mut counter = 0u32;
    loop {
        let name = candidate(&base, counter);
        if is_username_available(&name, pool).await {
            return name;
        }
        counter += 1;
    }
}

async fn upsert_social_profile(
    pool: &MySqlPool,
    user_id: u64,
    identity: &SocialIdentity,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO social_profiles
            (user_id, provider, provider_id, avatar_url, access_token, refresh_token, last_login_at)
        VALUES (?, ?, ?, ?, ?, ?, NOW())
        ON DUPLICATE KEY UPDATE
            provider = VALUES(provider),
            provider_id = VALUES(provider_id),
            avatar_url = VALUES(avatar_url),
            access_token = VALUES(access_token),
            refresh_token = VALUES(refresh_token),
            last_login_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(identity.provider.as_str())
    .bind(&identity.provider_id)
    .bind(&identity.avatar_url)
    .bind(&identity.access_token)
    .bind(&identity.refresh_token)
    .execute(pool)
    .await?;
    Ok(())
}

/// Authenticate an external identity against the local store: match by
/// email, otherwise create a fresh Employee account with an unusable
/// password. User and social profile are committed together or not at all.
pub async fn login_or_create(pool: &MySqlPool, identity: &SocialIdentity) -> Result<UserRow> {
    let existing = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, username, email, password, role_id, is_active
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(&identity.email)
    .fetch_optional(pool)
    .await
    .context("failed to look up user by email")?;

    if let Some(user) = existing {
        upsert_social_profile(pool, user.id, identity)
            .await
            .context("failed to update social profile")?;

        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
            .bind(user.id)
            .execute(pool)
            .await
            .context("failed to update last_login_at")?;

        info!(user_id = user.id, provider = identity.provider.as_str(), "Social login matched existing account");
        return Ok(user);
    }

    let username = allocate_username(pool, &identity.username_hint).await;
    let password = unusable_password();

    let mut tx = pool.begin().await.context("failed to open transaction")?;

    let result = sqlx::query(
        r#"INSERT INTO users (username, email, password, role_id) VALUES (?, ?, ?, ?)"#,
    )
    .bind(&username)
    .bind(&identity.email)
    .bind(&password)
    .bind(Role::Employee.id())
    .execute(&mut *tx)
    .await
    .context("failed to create user")?;

    let user_id = result.last_insert_id();

    sqlx::query(
        r#"
        INSERT INTO social_profiles
            (user_id, provider, provider_id, avatar_url, access_token, refresh_token, last_login_at)
        VALUES (?, ?, ?, ?, ?, ?, NOW())
        "#,
    )
    .bind(user_id)
    .bind(identity.provider.as_str())
    .bind(&identity.provider_id)
    .bind(&identity.avatar_url)
    .bind(&identity.access_token)
    .bind(&identity.refresh_token)
    .execute(&mut *tx)
    .await
    .context("failed to create social profile")?;

    tx.commit().await.context("failed to commit new account")?;

    username_filter::insert(&username);
    username_cache::mark_taken(&username).await;

    info!(user_id, provider = identity.provider.as_str(), %username, "Social login created account");

    Ok(UserRow {
        id: user_id,
        username,
        email: identity.email.clone(),
        password,
        role_id: Role::Employee.id(),
        is_active: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_comes_from_email_local_part() {
        assert_eq!(username_base("Jane.Doe@example.com"), "janedoe");
        assert_eq!(username_base("j_doe@example.com"), "j_doe");
        assert_eq!(username_base("plainname"), "plainname");
    }

    #[test]
    fn base_never_empty() {
        assert_eq!(username_base("!!!@example.com"), "user");
        assert_eq!(username_base(""), "user");
    }

    #[test]
    fn collision_suffixes_increment() {
        assert_eq!(candidate("jdoe", 0), "jdoe");
        assert_eq!(candidate("jdoe", 1), "jdoe1");
        assert_eq!(candidate("jdoe", 12), "jdoe12");
    }
}
