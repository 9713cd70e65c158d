use crate::client::session::{TOKEN_KEY, USER_KEY};
use crate::client::{ApiClient, ClientError, ClientResult};
use crate::models::UserWithRoles;
use crate::routes::auth::{
    AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, MessageResponse,
    ResetPasswordRequest,
};

/// Log in and keep the access token and user in the session.
pub async fn login(client: &ApiClient, email: &str, password: &str) -> ClientResult<UserWithRoles> {
    let body = LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    };
    let reply: AuthResponse = client.post("/auth/login", &body).await?;
    let user_json = serde_json::to_string(&reply.user)
        .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
    client.session().set(TOKEN_KEY, reply.access_token);
    client.session().set(USER_KEY, user_json);
    Ok(reply.user)
}

/// Ends the session locally even when the server call fails.
pub async fn logout(client: &ApiClient) -> ClientResult<()> {
    let result: ClientResult<MessageResponse> = client.post_empty("/auth/logout").await;
    client.session().clear();
    result.map(|_| ())
}

pub async fn me(client: &ApiClient) -> ClientResult<UserWithRoles> {
    client.get("/auth/me").await
}

/// The user cached at login, if any.
pub fn current_user(client: &ApiClient) -> Option<UserWithRoles> {
    client
        .session()
        .get(USER_KEY)
        .and_then(|raw| serde_json::from_str(&raw).ok())
}

pub fn is_authenticated(client: &ApiClient) -> bool {
    client.session().token().is_some()
}

/// Changing the password revokes other sessions; the fresh token replaces the stored one.
pub async fn change_password(
    client: &ApiClient,
    current_password: &str,
    new_password: &str,
) -> ClientResult<()> {
    let body = ChangePasswordRequest {
        current_password: current_password.to_string(),
        new_password: new_password.to_string(),
    };
    let reply: AuthResponse = client.post("/auth/change-password", &body).await?;
    client.session().set(TOKEN_KEY, reply.access_token);
    Ok(())
}

pub async fn forgot_password(client: &ApiClient, email: &str) -> ClientResult<MessageResponse> {
    let body = ForgotPasswordRequest {
        email: email.to_string(),
    };
    client.post("/auth/forgot-password", &body).await
}

pub async fn reset_password(
    client: &ApiClient,
    token: &str,
    password: &str,
) -> ClientResult<MessageResponse> {
    let body = ResetPasswordRequest {
        token: token.to_string(),
        password: password.to_string(),
    };
    client.post("/auth/reset-password", &body).await
}
