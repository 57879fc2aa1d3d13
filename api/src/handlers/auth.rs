use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};

use crate::{
    config::AuthConfig,
    error::AppError,
    models::user::{AuthResponse, ChangePassword, CreateUser, LoginPayload, User},
    password, store,
    token::{AuthUser, Identity},
    AppState,
};

const MIN_PASSWORD_LEN: usize = 8;

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_new_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn session_cookie(config: &AuthConfig, token: &str) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        config.cookie_name,
        token,
        config.token_ttl.num_seconds()
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn cleared_cookie(config: &AuthConfig) -> String {
    let mut cookie = format!(
        "{}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0",
        config.cookie_name
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let email = normalize_email(&payload.email);
    let name = payload.name.trim();
    if !email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".to_string()));
    }
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    check_new_password(&payload.password)?;

    let password_hash = password::hash_password(&payload.password)?;
    let user = store::create_user(&state.db, &email, name, &password_hash).await?;
    tracing::info!(user_id = user.id, "User signed up");

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn signin(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&payload.email);
    let Some((user, credential)) = store::find_login(&state.db, &email).await? else {
        password::verify_unknown(&payload.password);
        return Err(AppError::LoginFail);
    };

    if !password::verify(&credential, &payload.password) {
        return Err(AppError::LoginFail);
    }

    if credential.needs_rehash() {
        let upgraded = match password::hash_password(&payload.password) {
            Ok(hash) => store::set_password(&state.db, user.id, &hash)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match upgraded {
            Ok(()) => tracing::info!(user_id = user.id, "Upgraded legacy password to argon2"),
            Err(e) => tracing::warn!(user_id = user.id, "Legacy password upgrade failed: {}", e),
        }
    }

    let token = state.issuer.issue(&user.id.to_string(), &user.profile())?;
    let cookie = session_cookie(&state.auth, &token);

    let body = AuthResponse {
        token,
        user: Identity {
            id: user.id,
            email: user.email,
            name: user.name,
        },
    };

    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Json(body)))
}

pub async fn signout(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        AppendHeaders([(SET_COOKIE, cleared_cookie(&state.auth))]),
    )
}

pub async fn me(AuthUser(identity): AuthUser) -> Json<Identity> {
    Json(identity)
}

pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<ChangePassword>,
) -> Result<StatusCode, AppError> {
    let credential = store::find_credential(&state.db, identity.id)
        .await?
        .ok_or(AppError::LoginFail)?;

    if !password::verify(&credential, &payload.current_password) {
        return Err(AppError::LoginFail);
    }
    check_new_password(&payload.new_password)?;

    let password_hash = password::hash_password(&payload.new_password)?;
    store::set_password(&state.db, identity.id, &password_hash).await?;
    tracing::info!(user_id = identity.id, "Password changed");

    Ok(StatusCode::NO_CONTENT)
}
