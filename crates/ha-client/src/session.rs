//! Session holder with refresh-on-401

use crate::error::ClientError;
use crate::transport::{ApiRequest, ApiResponse, ApiTransport, Method};
use ha_authentication::{HouseLogin, LoginOutcome, SessionTokens};
use ha_core::UserId;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const HOUSE_PATH: &str = "/api/auth/house";
pub const LOGIN_PATH: &str = "/api/auth/login";
pub const ACTIVATE_PATH: &str = "/api/auth/activate";
pub const REFRESH_PATH: &str = "/api/auth/refresh";
pub const LOGOUT_PATH: &str = "/api/auth/logout";

#[derive(Debug, Default)]
struct SessionState {
    tokens: Option<SessionTokens>,
    /// Bumped whenever `tokens` is replaced or cleared
    generation: u64,
}

/// A signed-in member's view of the API
///
/// Every request carries the current access token. A request answered with
/// 401 triggers one refresh, then is replayed once with the new token.
/// Concurrent requests failing with the same token share a single refresh.
#[derive(Debug)]
pub struct SessionClient<T> {
    transport: T,
    state: RwLock<SessionState>,
    refresh_lock: Mutex<()>,
}

impl<T: ApiTransport> SessionClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: RwLock::new(SessionState::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn tokens(&self) -> Option<SessionTokens> {
        self.state.read().tokens.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().tokens.is_some()
    }

    /// Store a freshly issued token pair
    pub fn set_tokens(&self, tokens: SessionTokens) {
        let mut state = self.state.write();
        state.tokens = Some(tokens);
        state.generation += 1;
    }

    /// Forget the session locally
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.tokens = None;
        state.generation += 1;
    }

    fn current(&self) -> Result<(String, u64), ClientError> {
        let state = self.state.read();
        state
            .tokens
            .as_ref()
            .map(|t| (t.access_token.clone(), state.generation))
            .ok_or(ClientError::NotAuthenticated)
    }

    /// Send an authenticated request
    ///
    /// Error statuses other than a recoverable 401 are returned as responses.
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, ClientError> {
        loop {
            let (access_token, generation) = self.current()?;
            request.access_token = Some(access_token);
            let response = self.transport.send(request.clone()).await?;
            if !response.is_unauthorized() || request.retried {
                return Ok(response);
            }
            debug!(method = %request.method, path = %request.path, "Access token rejected");
            self.refresh_after(generation).await?;
            request.retried = true;
        }
    }

    /// Send an authenticated request and decode the success body
    pub async fn request<R: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<R, ClientError> {
        self.send(request).await?.into_json()
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ClientError> {
        self.request(ApiRequest::get(path)).await
    }

    pub async fn post<R: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
    ) -> Result<R, ClientError> {
        self.request(ApiRequest::post(path, body)).await
    }

    /// Refresh unless someone already did since `seen`
    async fn refresh_after(&self, seen: u64) -> Result<(), ClientError> {
        let _guard = self.refresh_lock.lock().await;
        let refresh_token = {
            let state = self.state.read();
            match &state.tokens {
                Some(_) if state.generation != seen => return Ok(()),
                Some(tokens) => tokens.refresh_token.clone(),
                None => return Err(ClientError::SessionExpired),
            }
        };

        let response = self
            .transport
            .send(ApiRequest::post(
                REFRESH_PATH,
                json!({ "refreshToken": refresh_token }),
            ))
            .await?;
        if !response.is_success() {
            warn!(status = response.status, "Session refresh failed, signing out");
            self.clear();
            return Err(ClientError::SessionExpired);
        }
        let tokens: SessionTokens = response.into_json()?;
        debug!(session_id = %tokens.session_id, "Session refreshed");
        self.set_tokens(tokens);
        Ok(())
    }

    /// Explicitly rotate the token pair
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let (_, generation) = self.current()?;
        self.refresh_after(generation).await
    }

    /// Verify the house PIN; no session needed
    pub async fn house_login(&self, code: &str, pin: &str) -> Result<HouseLogin, ClientError> {
        self.transport
            .send(ApiRequest::post(HOUSE_PATH, json!({ "code": code, "pin": pin })))
            .await?
            .into_json()
    }

    /// Member login; stores the session when one is issued
    pub async fn login(
        &self,
        house_token: &str,
        user_id: UserId,
        pin: &str,
    ) -> Result<LoginOutcome, ClientError> {
        let outcome: LoginOutcome = self
            .transport
            .send(ApiRequest::post(
                LOGIN_PATH,
                json!({ "houseToken": house_token, "userId": user_id, "pin": pin }),
            ))
            .await?
            .into_json()?;
        if let LoginOutcome::Session(tokens) = &outcome {
            info!(user_id = %tokens.user.id, "Signed in");
            self.set_tokens(tokens.clone());
        }
        Ok(outcome)
    }

    /// Exchange an activation token and a new personal PIN for a session
    pub async fn activate(
        &self,
        activation_token: &str,
        pin: &str,
    ) -> Result<SessionTokens, ClientError> {
        let tokens: SessionTokens = self
            .transport
            .send(ApiRequest::post(
                ACTIVATE_PATH,
                json!({ "activationToken": activation_token, "pin": pin }),
            ))
            .await?
            .into_json()?;
        info!(user_id = %tokens.user.id, "Account activated");
        self.set_tokens(tokens.clone());
        Ok(tokens)
    }

    /// End the session on the server and locally
    ///
    /// The local session is cleared even when the server call fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = match self.current() {
            Ok((access_token, _)) => {
                let mut request = ApiRequest::new(Method::Post, LOGOUT_PATH);
                request.access_token = Some(access_token);
                self.transport.send(request).await.map(|_| ())
            }
            Err(_) => Ok(()),
        };
        self.clear();
        result
    }
}
