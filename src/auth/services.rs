use tracing::{info, warn};

use crate::{
    auth::{
        dto::AuthResponse,
        jwt::JwtKeys,
        password::{hash_password_blocking, verify_password_blocking},
        repo::UserRepo,
    },
    error::ServiceError,
    validation::{self, FieldErrors},
};

const MISSING_CREDENTIALS: &str = "Username and password are required";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

fn require_credentials(
    username: Option<String>,
    password: Option<String>,
) -> Result<(String, String), ServiceError> {
    match (username, password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Ok((u, p)),
        _ => Err(ServiceError::Validation(MISSING_CREDENTIALS.into())),
    }
}

/// Creates a user and issues its first token.
///
/// The existence check before insert is advisory; the store's unique
/// constraint is what actually rejects a concurrent duplicate.
pub async fn register(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    username: Option<String>,
    password: Option<String>,
) -> Result<AuthResponse, ServiceError> {
    let (username, password) = require_credentials(username, password)?;

    let mut errors = FieldErrors::new();
    let username = validation::username(&username, &mut errors);
    validation::password(&password, &mut errors);
    errors.finish()?;

    if users.find_by_username(&username).await?.is_some() {
        warn!(%username, "username already registered");
        return Err(ServiceError::Conflict("Username already exists".into()));
    }

    let hash = hash_password_blocking(password).await?;
    let user = users.create(&username, &hash).await?;
    let token = keys.issue(user.id)?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(AuthResponse {
        id: user.id,
        username: user.username,
        token,
    })
}

/// Verifies credentials and issues a fresh token. Unknown users and wrong
/// passwords produce the same error.
pub async fn login(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    username: Option<String>,
    password: Option<String>,
) -> Result<AuthResponse, ServiceError> {
    let (username, password) = require_credentials(username, password)?;
    let username = username.trim();

    let Some(user) = users.find_by_username(username).await? else {
        warn!(%username, "login unknown username");
        return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let token = keys.issue(user.id)?;
    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(AuthResponse {
        id: user.id,
        username: user.username,
        token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::repo::MemoryUserRepo, config::JwtConfig};

    fn keys() -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: "test-secret".into(),
            issuer: "test".into(),
            audience: "test".into(),
            ttl_days: 7,
        })
    }

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[tokio::test]
    async fn register_then_login_yields_verifiable_token() {
        let repo = MemoryUserRepo::new();
        let keys = keys();

        let reg = register(&repo, &keys, some("  alice "), some("secret1"))
            .await
            .expect("register");
        assert_eq!(reg.username, "alice");
        assert_eq!(keys.verify(&reg.token), Ok(reg.id));

        let login = login(&repo, &keys, some("alice"), some("secret1"))
            .await
            .expect("login");
        assert_eq!(login.id, reg.id);
        assert_eq!(keys.verify(&login.token), Ok(reg.id));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts_regardless_of_password() {
        let repo = MemoryUserRepo::new();
        let keys = keys();
        register(&repo, &keys, some("bob"), some("password1")).await.unwrap();

        let err = register(&repo, &keys, some("bob"), some("another-pass"))
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Conflict("Username already exists".into()));
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_look_identical() {
        let repo = MemoryUserRepo::new();
        let keys = keys();
        register(&repo, &keys, some("carol"), some("rightpass")).await.unwrap();

        let wrong_pass = login(&repo, &keys, some("carol"), some("wrongpass"))
            .await
            .unwrap_err();
        let no_user = login(&repo, &keys, some("nobody"), some("rightpass"))
            .await
            .unwrap_err();
        assert_eq!(wrong_pass, no_user);
        assert_eq!(wrong_pass, ServiceError::Unauthorized("Invalid credentials".into()));
    }

    #[tokio::test]
    async fn register_validates_before_touching_the_store() {
        let repo = MemoryUserRepo::new();
        let keys = keys();

        let err = register(&repo, &keys, some("al"), some("12345")).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::Validation(
                "Username must be at least 3 characters, Password must be at least 6 characters"
                    .into()
            )
        );
        assert!(repo.find_by_username("al").await.unwrap().is_none());

        let err = register(&repo, &keys, None, some("secret1")).await.unwrap_err();
        assert_eq!(err, ServiceError::Validation(MISSING_CREDENTIALS.into()));
    }

    #[tokio::test]
    async fn stored_hashes_are_salted_per_user() {
        let repo = MemoryUserRepo::new();
        let keys = keys();
        register(&repo, &keys, some("dave"), some("samepass")).await.unwrap();
        register(&repo, &keys, some("erin"), some("samepass")).await.unwrap();

        let dave = repo.find_by_username("dave").await.unwrap().unwrap();
        let erin = repo.find_by_username("erin").await.unwrap().unwrap();
        assert_ne!(dave.password_hash, erin.password_hash);
        assert_ne!(dave.password_hash, "samepass");
        assert!(crate::auth::password::verify_password("samepass", &dave.password_hash));
        assert!(crate::auth::password::verify_password("samepass", &erin.password_hash));
    }
}
