//! Typed client for the capsule HTTP API.

use std::sync::Arc;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::{AuthMode, CapsuleId, JoinAction},
    error::ApiErrorBody,
    protocol::{
        AccessCodeRequest, Capsule, CapsuleUpdate, ChatbotRequest, ChatbotResponse,
        ClusterDetail, ClusterKeyResponse, ClusterSummary, CreateCapsuleRequest,
        CreateClusterKeyRequest, Credentials, JoinClusterRequest, JoinRequest, MessageResponse,
        TokenResponse, UserRecord,
    },
};
use tracing::{debug, info};
use url::Url;

use crate::{error::ClientError, token_store::TokenStore};

const API_PREFIX: &str = "api";

#[derive(Clone)]
pub struct CapsuleApi {
    http: Client,
    api_base: Url,
    tokens: Arc<dyn TokenStore>,
}

impl CapsuleApi {
    pub fn new(server_url: &str, tokens: Arc<dyn TokenStore>) -> Result<Self, ClientError> {
        Self::with_http_client(Client::new(), server_url, tokens)
    }

    pub fn with_http_client(
        http: Client,
        server_url: &str,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, ClientError> {
        let invalid = |reason: &str| ClientError::InvalidBaseUrl {
            url: server_url.to_string(),
            reason: reason.to_string(),
        };
        let mut api_base = Url::parse(server_url.trim()).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(api_base.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        api_base
            .path_segments_mut()
            .map_err(|_| invalid("url cannot be a base"))?
            .pop_if_empty()
            .push(API_PREFIX);
        Ok(Self {
            http,
            api_base,
            tokens,
        })
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.tokens.get() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        op: &'static str,
    ) -> Result<T, ClientError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let detail = ApiErrorBody::from_bytes(&body).message().map(str::to_owned);
            debug!(op, status = status.as_u16(), ?detail, "api: request rejected");
            return Err(ClientError::Server { status, detail });
        }
        debug!(op, status = status.as_u16(), "api: request ok");
        Ok(response.json::<T>().await?)
    }

    pub async fn authenticate(
        &self,
        mode: AuthMode,
        credentials: &Credentials,
    ) -> Result<TokenResponse, ClientError> {
        let url = self.endpoint(&["auth", mode.path_segment()]);
        let token: TokenResponse = self
            .execute(self.http.post(url).json(credentials), "authenticate")
            .await?;
        info!(
            user_id = token.user.id.0,
            mode = mode.path_segment(),
            "api: authenticated"
        );
        Ok(token)
    }

    pub async fn current_user(&self) -> Result<UserRecord, ClientError> {
        let url = self.endpoint(&["user", "me"]);
        self.execute(self.http.get(url), "current_user").await
    }

    pub async fn list_capsules(&self) -> Result<Vec<Capsule>, ClientError> {
        let url = self.endpoint(&["capsule"]);
        self.execute(self.http.get(url), "list_capsules").await
    }

    pub async fn create_capsule(
        &self,
        request: &CreateCapsuleRequest,
    ) -> Result<Capsule, ClientError> {
        let url = self.endpoint(&["capsule"]);
        self.execute(self.http.post(url).json(request), "create_capsule")
            .await
    }

    pub async fn update_capsule(
        &self,
        capsule_id: CapsuleId,
        update: &CapsuleUpdate,
    ) -> Result<Capsule, ClientError> {
        let id = capsule_id.to_string();
        let url = self.endpoint(&["capsule", &id]);
        self.execute(self.http.put(url).json(update), "update_capsule")
            .await
    }

    pub async fn list_clusters(&self) -> Result<Vec<ClusterSummary>, ClientError> {
        let url = self.endpoint(&["cluster"]);
        self.execute(self.http.get(url), "list_clusters").await
    }

    pub async fn create_cluster_key(
        &self,
        capsule_id: CapsuleId,
        request: &CreateClusterKeyRequest,
    ) -> Result<ClusterKeyResponse, ClientError> {
        let id = capsule_id.to_string();
        let url = self.endpoint(&["capsule", &id, "cluster-key"]);
        self.execute(self.http.post(url).json(request), "create_cluster_key")
            .await
    }

    /// `Ok(None)` when the capsule belongs to no cluster, whether the server
    /// says so with a `null` body or a 404.
    pub async fn capsule_cluster(
        &self,
        capsule_id: CapsuleId,
    ) -> Result<Option<ClusterDetail>, ClientError> {
        let id = capsule_id.to_string();
        let url = self.endpoint(&["capsule", &id, "cluster"]);
        match self.execute(self.http.get(url), "capsule_cluster").await {
            Err(err) if err.is_not_found() => Ok(None),
            other => other,
        }
    }

    pub async fn join_cluster(
        &self,
        capsule_id: CapsuleId,
        request: &JoinClusterRequest,
    ) -> Result<MessageResponse, ClientError> {
        let id = capsule_id.to_string();
        let url = self.endpoint(&["capsule", &id, "cluster", "join"]);
        self.execute(self.http.post(url).json(request), "join_cluster")
            .await
    }

    pub async fn cluster_requests(
        &self,
        capsule_id: CapsuleId,
    ) -> Result<Vec<JoinRequest>, ClientError> {
        let id = capsule_id.to_string();
        let url = self.endpoint(&["capsule", &id, "cluster", "requests"]);
        self.execute(self.http.get(url), "cluster_requests").await
    }

    pub async fn resolve_cluster_request(
        &self,
        main_capsule: &str,
        action: JoinAction,
        guest_capsule: &str,
        request: &AccessCodeRequest,
    ) -> Result<MessageResponse, ClientError> {
        let url = self.endpoint(&[
            "cluster-requests",
            main_capsule,
            action.path_segment(),
            guest_capsule,
        ]);
        self.execute(self.http.post(url).json(request), "resolve_cluster_request")
            .await
    }

    pub async fn process_chat(&self, message: &str) -> Result<ChatbotResponse, ClientError> {
        let url = self.endpoint(&["chatbot", "process"]);
        let request = ChatbotRequest {
            message: message.to_string(),
        };
        self.execute(self.http.post(url).json(&request), "process_chat")
            .await
    }
}

impl std::fmt::Debug for CapsuleApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapsuleApi")
            .field("api_base", &self.api_base.as_str())
            .field("has_token", &self.tokens.get().is_some())
            .finish()
    }
}

pub(crate) fn http_status(err: &ClientError) -> Option<u16> {
    match err {
        ClientError::Server { status, .. } => Some(status.as_u16()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
