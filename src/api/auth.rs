//! Login, logout and profile endpoints.

use serde_json::{json, Value};

use super::BlogApi;
use crate::gateway::{GatewayError, RequestEnvelope};
use crate::session::Session;

/// Credentials for `POST /v1/user/emailLogin`.
#[derive(Debug, Clone)]
pub struct EmailLogin {
    pub email: String,
    pub password: String,
}

/// Sign-up form for `POST /v1/user/register`.
#[derive(Debug, Clone)]
pub struct EmailRegister {
    pub email: String,
    pub password: String,
    pub nickname: String,
    /// Verification code mailed by [`BlogApi::send_email_code`]
    pub code: String,
}

impl BlogApi {
    /// Log in with email and password, then persist and announce the
    /// returned session.
    pub async fn email_login(&self, credentials: &EmailLogin) -> Result<Session, GatewayError> {
        let session: Session = self
            .gateway
            .send_as(
                RequestEnvelope::post("/v1/user/emailLogin")
                    .data(json!({"email": credentials.email, "password": credentials.password})),
            )
            .await?;
        self.store().login(&session)?;
        Ok(session)
    }

    /// Log out on the backend. The local session is dropped whether or not
    /// the backend call succeeds.
    pub async fn logout(&self) -> Result<(), GatewayError> {
        let result = self.send(RequestEnvelope::get("/logout")).await;
        self.store().logout()?;
        result.map(|_| ())
    }

    pub async fn get_user_info(&self) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::get("/v1/user/info")).await
    }

    pub async fn update_user_info(&self, data: Value) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::put("/v1/user/").data(data)).await
    }

    pub async fn send_email_code(&self, email: &str) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::get("/v1/user/sendEmailCode").params(json!({"email": email})))
            .await
    }

    pub async fn email_register(&self, form: &EmailRegister) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::post("/v1/user/register").data(json!({
            "email": form.email,
            "password": form.password,
            "nickname": form.nickname,
            "code": form.code,
        })))
        .await
    }

    /// QR code for WeChat login.
    pub async fn wechat_login_qr(&self) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::get("/v1/user/wxQr")).await
    }

    /// Poll whether the WeChat login for `temp_user_id` has completed.
    pub async fn wechat_is_login(&self, temp_user_id: &str) -> Result<Value, GatewayError> {
        self.send(
            RequestEnvelope::get("/v1/user/wx/is_login").params(json!({"tempUserId": temp_user_id})),
        )
        .await
    }
}
