use crate::{
    auth::{bearer_token, AuthenticatedUser, LoginRequest, LoginResponse, RegisterRequest},
    error::AppError,
    models::NewUser,
    state::AppState,
};
use actix_web::{post, web, HttpRequest, HttpResponse};
use serde_json::json;
use validator::Validate;

/// Register a new user
///
/// Rejects the request with `DuplicateUser` when the username or the email is
/// already taken. On success the stored record is returned without its password
/// hash.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    register_data.validate()?;
    let RegisterRequest {
        username,
        email,
        password,
    } = register_data.into_inner();

    if state
        .users
        .find_by_username_or_email(&username, &email)
        .await?
        .is_some()
    {
        log::info!("Registration refused: username or email already in use");
        return Err(AppError::DuplicateUser);
    }

    let hasher = state.hasher;
    let password_hash = web::block(move || hasher.hash(&password)).await??;

    let user = state
        .users
        .insert(NewUser {
            username,
            email,
            password_hash,
        })
        .await?;

    log::info!("Registered user {} ({})", user.username, user.id);
    Ok(HttpResponse::Ok().json(user))
}

/// Login user
///
/// Checks the password and returns a fresh token, which also becomes the user's
/// active session. A wrong password leaves the session cache untouched.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    login_data.validate()?;
    let LoginRequest { username, password } = login_data.into_inner();

    let user = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let hasher = state.hasher;
    let stored_hash = user.password_hash.clone();
    let matches = web::block(move || hasher.verify(&password, &stored_hash)).await?;
    if !matches {
        log::info!("Failed login for {}", user.username);
        return Err(AppError::InvalidCredentials);
    }

    let token = state.tokens.issue(user.id, &user.username)?;
    state
        .sessions
        .set_active(user.id, &token, state.tokens.ttl())
        .await?;

    log::info!("User {} logged in", user.username);
    Ok(HttpResponse::Ok().json(LoginResponse { token }))
}

/// Logout user
///
/// Revokes the presented token until it would have expired on its own and clears
/// the user's active session. The token does not have to be the active one.
#[post("/logout")]
pub async fn logout(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let token = bearer_token(req.headers())?;
    let claims = state.tokens.verify(token)?;

    state.sessions.delete_active(claims.sub).await?;
    state
        .sessions
        .set_blacklisted(token, state.tokens.remaining_lifetime(&claims))
        .await?;

    log::info!("User {} logged out", claims.username);
    Ok(HttpResponse::Ok().json(json!({
        "message": "Logged out successfully"
    })))
}

/// Echoes the identity the guard attached to the request.
pub async fn me(user: AuthenticatedUser) -> HttpResponse {
    let claims = user.0;
    HttpResponse::Ok().json(json!({
        "user_id": claims.sub,
        "username": claims.username,
        "issued_at": claims.iat,
        "expires_at": claims.exp,
    }))
}
