use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use url::Url;
use uuid::Uuid;

use super::endpoints;
use crate::config::Config;
use crate::error::ClientError;
use crate::metrics::TOKEN_REFRESH_TOTAL;
use crate::models::user::{TokenRefreshRequest, TokenRefreshResponse};
use crate::session::SharedSession;

pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// JSON transport to the game API.
///
/// Authenticated calls carry the session's bearer token. A 401 triggers one
/// token refresh and one re-send of the same request; when the refresh itself
/// fails the session is cleared and the call ends in
/// [`ClientError::SessionExpired`]. Nothing else is ever retried.
pub struct ApiClient {
    http: Client,
    base_url: Url,
    session: SharedSession,
    refresh_lock: Mutex<()>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Auth {
    Bearer,
    Anonymous,
}

impl ApiClient {
    pub fn new(config: &Config, session: SharedSession) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            session,
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let response = self
            .execute(Method::GET, path, query, None, Auth::Bearer)
            .await?;
        decode(response).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = to_json(body)?;
        let response = self
            .execute(Method::POST, path, &[], Some(body), Auth::Bearer)
            .await?;
        decode(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let response = self
            .execute(Method::DELETE, path, &[], None, Auth::Bearer)
            .await?;
        expect_success(response).await
    }

    /// POST without a bearer token (register, login, OTP verification).
    pub async fn post_anonymous<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = to_json(body)?;
        let response = self
            .execute(Method::POST, path, &[], Some(body), Auth::Anonymous)
            .await?;
        decode(response).await
    }

    /// Authenticated POST whose response body is ignored.
    pub async fn post_empty(&self, path: &str) -> Result<(), ClientError> {
        let response = self
            .execute(Method::POST, path, &[], None, Auth::Bearer)
            .await?;
        expect_success(response).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
        auth: Auth,
    ) -> Result<Response, ClientError> {
        let url = self.endpoint_url(path)?;
        let trace_id = Uuid::new_v4().to_string();

        let token = match auth {
            Auth::Bearer => Some(
                self.session
                    .access_token()
                    .ok_or(ClientError::NotAuthenticated)?,
            ),
            Auth::Anonymous => None,
        };

        let response = self
            .send_once(&method, &url, query, body.as_ref(), token.as_deref(), &trace_id)
            .await?;

        if auth == Auth::Anonymous || response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::info!(
            trace_id = %trace_id,
            "Access token rejected on {} {}, refreshing",
            method,
            path
        );
        let access = self.refresh_access_token(token.as_deref()).await?;

        self.send_once(&method, &url, query, body.as_ref(), Some(&access), &trace_id)
            .await
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &Url,
        query: &[(&str, &str)],
        body: Option<&Value>,
        token: Option<&str>,
        trace_id: &str,
    ) -> Result<Response, ClientError> {
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(TRACE_ID_HEADER, trace_id);

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(trace_id = %trace_id, "{} {} failed: {}", method, url.path(), e);
            ClientError::from(e)
        })?;

        tracing::debug!(
            trace_id = %trace_id,
            "{} {} -> {}",
            method,
            url.path(),
            response.status()
        );

        Ok(response)
    }

    /// Returns a usable access token after a 401 on `rejected`.
    ///
    /// Refreshes are serialized: a caller that waited behind another refresh
    /// reuses the token it obtained instead of refreshing again.
    async fn refresh_access_token(&self, rejected: Option<&str>) -> Result<String, ClientError> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.session.access_token() {
            if Some(current.as_str()) != rejected {
                return Ok(current);
            }
        }

        let Some(refresh) = self.session.refresh_token() else {
            self.session.clear();
            TOKEN_REFRESH_TOTAL.with_label_values(&["missing"]).inc();
            return Err(ClientError::SessionExpired);
        };

        match self.request_refresh(&refresh).await {
            Ok(access) => {
                self.session.set_access_token(access.clone());
                TOKEN_REFRESH_TOTAL.with_label_values(&["success"]).inc();
                tracing::info!("Access token refreshed");
                Ok(access)
            }
            Err(e) => {
                tracing::warn!("Token refresh failed, logging out: {}", e);
                self.session.clear();
                TOKEN_REFRESH_TOTAL.with_label_values(&["failure"]).inc();
                Err(ClientError::SessionExpired)
            }
        }
    }

    async fn request_refresh(&self, refresh: &str) -> Result<String, ClientError> {
        let url = self.endpoint_url(endpoints::TOKEN_REFRESH)?;
        let response = self
            .http
            .post(url)
            .header(TRACE_ID_HEADER, Uuid::new_v4().to_string())
            .json(&TokenRefreshRequest { refresh })
            .send()
            .await?;

        let body: TokenRefreshResponse = decode(response).await?;
        Ok(body.access)
    }

    fn endpoint_url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::validation(format!("Invalid endpoint {}: {}", path, e)))
    }
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> Result<Value, ClientError> {
    serde_json::to_value(body).map_err(|e| ClientError::validation(e.to_string()))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(rejection(response).await);
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}

async fn expect_success(response: Response) -> Result<(), ClientError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(rejection(response).await)
    }
}

async fn rejection(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ClientError::from_response_body(status, &body)
}
