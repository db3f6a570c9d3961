//! HTTP client for the Motorista backend.
//!
//! Single point of contact with the REST API: injects the bearer token on
//! every call, maps failure responses to [`ApiError`], and fires the
//! registered unauthorized handler when a non-login endpoint answers 401 so
//! the session store can tear everything down.

pub mod error;

pub use error::ApiError;

use arc_swap::ArcSwapOption;
use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::model::{CreateDriverRequest, Driver, DriverFilter, Page, SortSpec, UpdateDriverRequest, VehicleType};

/// Credentials payload for POST /autenticacao/autenticar.
#[derive(Debug, Serialize)]
pub struct AuthRequest {
    pub email: String,
    pub senha: String,
}

/// Response of the authenticate endpoint.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

/// Callback fired when a non-login endpoint rejects the session.
struct UnauthorizedHook(Box<dyn Fn() + Send + Sync>);

/// Client for the Motorista backend API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
    on_unauthorized: ArcSwapOption<UnauthorizedHook>,
}

impl ApiClient {
    /// Build a client from configuration. The base URL keeps no trailing
    /// slash so paths can be appended directly.
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
            on_unauthorized: ArcSwapOption::empty(),
        })
    }

    /// Install the teardown callback invoked on authorization failure. The
    /// handler must be idempotent; it is called once per failing response.
    pub fn set_unauthorized_handler(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.on_unauthorized
            .store(Some(Arc::new(UnauthorizedHook(Box::new(handler)))));
    }

    /// Set the bearer token attached to subsequent requests.
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    /// Drop the bearer token; subsequent requests go out unauthenticated.
    pub fn clear_token(&self) {
        *self.token.write() = None;
    }

    pub fn has_token(&self) -> bool {
        self.token.read().is_some()
    }

    /// Fire the teardown hook once. Called for every 401 on a non-login
    /// endpoint; the handler itself is idempotent.
    pub(crate) fn notify_unauthorized(&self) {
        if let Some(hook) = self.on_unauthorized.load_full() {
            (hook.0)();
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method, url);
        if let Some(token) = self.token.read().as_deref() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Drive a request to completion and map failures. `is_login` exempts
    /// the authenticate call from the teardown path.
    async fn dispatch(&self, builder: RequestBuilder, is_login: bool) -> Result<reqwest::Response, ApiError> {
        let response = builder.send().await.map_err(ApiError::from)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED && !is_login {
            tracing::warn!("backend rejected the session token, tearing down");
            self.notify_unauthorized();
        }
        Err(error::map_failure(status.as_u16(), &body, is_login))
    }

    async fn json_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        response.json().await.map_err(ApiError::from)
    }

    // -------------------------------------------------------------------------
    // Endpoints
    // -------------------------------------------------------------------------

    /// POST /autenticacao/autenticar. A 401 here surfaces as
    /// [`ApiError::InvalidCredentials`] and never tears the session down.
    pub async fn authenticate(&self, email: &str, senha: &str) -> Result<AuthResponse, ApiError> {
        tracing::debug!(email, "authenticating");
        let builder = self.request(Method::POST, "/autenticacao/autenticar").json(&AuthRequest {
            email: email.to_string(),
            senha: senha.to_string(),
        });
        let response = self.dispatch(builder, true).await?;
        Self::json_body(response).await
    }

    /// POST /usuarios/search with pagination and sort in the query string.
    pub async fn search_drivers(
        &self,
        filter: &DriverFilter,
        page: u32,
        size: u32,
        sort: &SortSpec,
    ) -> Result<Page<Driver>, ApiError> {
        tracing::debug!(page, size, sort = %sort.to_query(), "searching drivers");
        let builder = self
            .request(Method::POST, "/usuarios/search")
            .query(&[
                ("page", page.to_string()),
                ("size", size.to_string()),
                ("sort", sort.to_query()),
            ])
            .json(filter);
        let response = self.dispatch(builder, false).await?;
        Self::json_body(response).await
    }

    /// GET /usuarios/{id}.
    pub async fn get_driver(&self, id: &str) -> Result<Driver, ApiError> {
        let builder = self.request(Method::GET, &format!("/usuarios/{id}"));
        let response = self.dispatch(builder, false).await?;
        Self::json_body(response).await
    }

    /// POST /usuarios.
    pub async fn create_driver(&self, payload: &CreateDriverRequest) -> Result<Driver, ApiError> {
        let builder = self.request(Method::POST, "/usuarios").json(payload);
        let response = self.dispatch(builder, false).await?;
        Self::json_body(response).await
    }

    /// PUT /usuarios/{id}.
    pub async fn update_driver(
        &self,
        id: &str,
        payload: &UpdateDriverRequest,
    ) -> Result<Driver, ApiError> {
        let builder = self
            .request(Method::PUT, &format!("/usuarios/{id}"))
            .json(payload);
        let response = self.dispatch(builder, false).await?;
        Self::json_body(response).await
    }

    /// DELETE /usuarios/{id}. The backend answers with an empty body.
    pub async fn delete_driver(&self, id: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("/usuarios/{id}"));
        self.dispatch(builder, false).await?;
        Ok(())
    }

    /// GET /vehicle-types.
    pub async fn vehicle_types(&self) -> Result<Vec<VehicleType>, ApiError> {
        let builder = self.request(Method::GET, "/vehicle-types");
        let response = self.dispatch(builder, false).await?;
        Self::json_body(response).await
    }
}
