//! Staff identity operations: login, listing and superuser management

use shared::models::{Identity, IdentityResponse, IdentitySummary};
use shared::{AppError, AppResult, ErrorCode};

use crate::core::AppState;
use crate::db::repository::{RepoError, identity, ticket};
use crate::security_log;
use crate::utils::{hash_password, verify_password};

fn identity_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::IdentityNotFound, format!("User #{id} not found"))
        .with_detail("user_id", id)
}

/// Check credentials; the same error is returned for an unknown user and a bad password
pub async fn authenticate(state: &AppState, username: &str, password: &str) -> AppResult<Identity> {
    let found = identity::find_by_username(&state.pool, username).await?;

    match found {
        Some(identity) if verify_password(password, &identity.password_hash) => {
            security_log!(INFO, "login_succeeded", user_id = identity.id, username = %username);
            Ok(identity)
        }
        Some(_) => {
            security_log!(WARN, "login_failed", username = %username, reason = "invalid_password");
            Err(AppError::invalid_credentials())
        }
        None => {
            security_log!(WARN, "login_failed", username = %username, reason = "unknown_user");
            Err(AppError::invalid_credentials())
        }
    }
}

/// Identities offered as assignees
pub async fn list_staff(state: &AppState) -> AppResult<Vec<IdentityResponse>> {
    Ok(identity::find_all(&state.pool).await?)
}

/// Identities with their assigned-ticket counts
pub async fn list_with_counts(state: &AppState) -> AppResult<Vec<IdentitySummary>> {
    Ok(identity::find_all_with_counts(&state.pool).await?)
}

pub async fn create(
    state: &AppState,
    username: &str,
    password: &str,
    is_superuser: bool,
) -> AppResult<IdentityResponse> {
    let username = username.trim();
    let password = password.trim();
    if username.is_empty() {
        return Err(AppError::required("username"));
    }
    if password.is_empty() {
        return Err(AppError::required("password"));
    }

    let hash = hash_password(password)?;
    let created = match identity::create(&state.pool, username, &hash, is_superuser).await {
        Ok(created) => created,
        Err(RepoError::Duplicate(_)) => {
            return Err(AppError::new(ErrorCode::UsernameExists).with_detail("username", username));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = created.id, username = %created.username, is_superuser, "User created");
    Ok(created.into())
}

/// Delete an identity, unassigning its tickets and ending its sessions
pub async fn delete(state: &AppState, actor_id: i64, user_id: i64) -> AppResult<()> {
    if !identity::exists(&state.pool, user_id).await? {
        return Err(identity_not_found(user_id));
    }
    if user_id == actor_id {
        security_log!(WARN, "self_delete_denied", user_id = actor_id);
        return Err(AppError::new(ErrorCode::CannotDeleteSelf));
    }

    let mut tx = state
        .pool
        .begin()
        .await
        .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

    let detached = ticket::detach_identity(&mut *tx, user_id).await?;
    if !identity::delete(&mut *tx, user_id).await? {
        return Err(identity_not_found(user_id));
    }

    tx.commit()
        .await
        .map_err(|e| AppError::database(format!("Failed to commit user deletion: {e}")))?;

    let revoked = state.sessions.revoke_identity(user_id);
    tracing::info!(user_id, actor_id, detached, revoked, "User deleted");
    Ok(())
}

pub async fn reset_password(state: &AppState, user_id: i64, new_password: &str) -> AppResult<()> {
    let new_password = new_password.trim();
    if new_password.is_empty() {
        return Err(AppError::required("new_password"));
    }
    if !identity::exists(&state.pool, user_id).await? {
        return Err(identity_not_found(user_id));
    }

    let hash = hash_password(new_password)?;
    match identity::update_password(&state.pool, user_id, &hash).await {
        Ok(()) => {}
        Err(RepoError::NotFound(_)) => return Err(identity_not_found(user_id)),
        Err(e) => return Err(e.into()),
    }

    tracing::info!(user_id, "Password reset");
    Ok(())
}

/// Make sure at least one superuser exists
///
/// Promotes the configured bootstrap identity if it exists, creates it
/// otherwise. Returns the identity that was promoted or created.
pub async fn ensure_bootstrap_superuser(state: &AppState) -> AppResult<Option<Identity>> {
    let config = &state.config;
    if identity::count_superusers(&state.pool).await? > 0 {
        return Ok(None);
    }

    let username = config.bootstrap_admin_username.as_str();
    let bootstrapped = match identity::find_by_username(&state.pool, username).await? {
        Some(existing) => {
            identity::set_superuser(&state.pool, existing.id, true).await?;
            tracing::warn!(username = %username, "Promoted existing user to superuser");
            Identity {
                is_superuser: true,
                ..existing
            }
        }
        None => {
            let hash = hash_password(&config.bootstrap_admin_password)?;
            let created = identity::create(&state.pool, username, &hash, true).await?;
            tracing::warn!(
                username = %username,
                "Created bootstrap superuser; change its password after first login"
            );
            created
        }
    };

    Ok(Some(bootstrapped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;

    async fn state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path(), Config::default()).await;
        (dir, state)
    }

    #[tokio::test]
    async fn test_bootstrap_creates_superuser_once() {
        let (_dir, state) = state().await;

        let created = ensure_bootstrap_superuser(&state).await.unwrap().unwrap();
        assert_eq!(created.username, "admin");
        assert!(created.is_superuser);
        assert!(authenticate(&state, "admin", "admin123").await.is_ok());

        assert!(ensure_bootstrap_superuser(&state).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_promotes_existing_identity() {
        let (_dir, state) = state().await;
        create(&state, "admin", "custom", false).await.unwrap();

        let promoted = ensure_bootstrap_superuser(&state).await.unwrap().unwrap();
        assert!(promoted.is_superuser);
        // Existing password is kept
        assert!(authenticate(&state, "admin", "custom").await.is_ok());
    }

    #[tokio::test]
    async fn test_authenticate_failures_look_the_same() {
        let (_dir, state) = state().await;
        create(&state, "anna", "secret", false).await.unwrap();

        let wrong = authenticate(&state, "anna", "nope").await.unwrap_err();
        let unknown = authenticate(&state, "ghost", "secret").await.unwrap_err();
        assert_eq!(wrong.code, ErrorCode::InvalidCredentials);
        assert_eq!(unknown.code, wrong.code);
        assert_eq!(unknown.message, wrong.message);
    }

    #[tokio::test]
    async fn test_create_validation_and_duplicates() {
        let (_dir, state) = state().await;

        let err = create(&state, "  ", "pw", false).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);

        let created = create(&state, " luca ", "pw", false).await.unwrap();
        assert_eq!(created.username, "luca");

        let err = create(&state, "luca", "other", true).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UsernameExists);
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let (_dir, state) = state().await;
        let admin = create(&state, "admin", "pw", true).await.unwrap();
        let staff = create(&state, "staff", "pw", false).await.unwrap();

        let err = delete(&state, admin.id, admin.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CannotDeleteSelf);

        let err = delete(&state, admin.id, 9999).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::IdentityNotFound);

        let found = identity::find_by_id(&state.pool, staff.id).await.unwrap().unwrap();
        let token = state.sessions.create(&found);
        delete(&state, admin.id, staff.id).await.unwrap();
        assert!(state.sessions.get(&token).is_none());
        assert!(!identity::exists(&state.pool, staff.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_password() {
        let (_dir, state) = state().await;
        let staff = create(&state, "staff", "old", false).await.unwrap();

        let err = reset_password(&state, staff.id, " ").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);
        let err = reset_password(&state, 9999, "new").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::IdentityNotFound);

        reset_password(&state, staff.id, "new").await.unwrap();
        assert!(authenticate(&state, "staff", "new").await.is_ok());
        assert!(authenticate(&state, "staff", "old").await.is_err());
    }
}
