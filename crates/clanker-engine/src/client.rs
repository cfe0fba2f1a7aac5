//! Clients for the conversation service.
//!
//! [`ConversationService`] is the seam between the session and the
//! network. [`HttpConversationClient`] speaks the structured
//! create/continue API; [`LegacyMockClient`] speaks the historical
//! `/api/mock` echo API.

use crate::api::{
    is_uuid, ContinueConversationRequest, ContinueConversationResponse, ConversationReply,
    CreateConversationRequest, CreateConversationResponse, SendMessageRequest,
    SendMessageResponse, Validate, ValidationIssue,
};
use crate::config::{resolve_api_url, Config, Transport};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Conversation id the legacy API is always addressed with.
pub const LEGACY_CONVERSATION_ID: &str = "demo-convo";

/// A request ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationRequest {
    Create(CreateConversationRequest),
    Continue(ContinueConversationRequest),
}

impl ConversationRequest {
    /// Build the right request shape for the current session state.
    pub fn for_turn(conversation_id: Option<&str>, text: &str) -> Self {
        match conversation_id {
            None => Self::Create(CreateConversationRequest {
                user_request: text.to_string(),
            }),
            Some(id) => Self::Continue(ContinueConversationRequest {
                conversation_id: id.to_string(),
                user_request: text.to_string(),
            }),
        }
    }

    /// The user's text.
    pub fn user_request(&self) -> &str {
        match self {
            Self::Create(r) => &r.user_request,
            Self::Continue(r) => &r.user_request,
        }
    }

    fn issues(&self) -> Vec<ValidationIssue> {
        match self {
            Self::Create(r) => r.issues(),
            Self::Continue(r) => r.issues(),
        }
    }
}

/// Remote conversation service.
#[async_trait]
pub trait ConversationService: Send + Sync {
    /// Start a conversation.
    async fn create(
        &self,
        request: &CreateConversationRequest,
    ) -> Result<ConversationReply, ClientError>;

    /// Add a turn to an existing conversation.
    async fn continue_conversation(
        &self,
        request: &ContinueConversationRequest,
    ) -> Result<ConversationReply, ClientError>;
}

/// Validate and send a request.
#[tracing::instrument(skip_all, fields(kind = request_kind(request)))]
pub async fn dispatch<S>(
    service: &S,
    request: &ConversationRequest,
) -> Result<ConversationReply, ClientError>
where
    S: ConversationService + ?Sized,
{
    let issues = request.issues();
    if !issues.is_empty() {
        tracing::warn!(?issues, "Refusing to send invalid request");
        return Err(ClientError::Validation(issues));
    }

    let reply = match request {
        ConversationRequest::Create(r) => service.create(r).await?,
        ConversationRequest::Continue(r) => service.continue_conversation(r).await?,
    };

    if let Some(id) = &reply.conversation_id {
        if id.is_empty() {
            return Err(ClientError::Decode("empty conversation_id".into()));
        }
        if !is_uuid(id) {
            tracing::warn!(conversation_id = %id, "Conversation id is not a UUID");
        }
    }

    Ok(reply)
}

fn request_kind(request: &ConversationRequest) -> &'static str {
    match request {
        ConversationRequest::Create(_) => "create",
        ConversationRequest::Continue(_) => "continue",
    }
}

/// Build the service selected by `config.transport`.
pub fn build_service(config: &Config) -> Result<Arc<dyn ConversationService>, ClientError> {
    let http = http_client(config)?;
    Ok(match config.transport {
        Transport::Conversation => Arc::new(HttpConversationClient::with_http(http, config)),
        Transport::LegacyMock => Arc::new(LegacyMockClient::with_http(http, config)),
    })
}

fn http_client(config: &Config) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .user_agent(concat!("clanker/", env!("CARGO_PKG_VERSION")))
        .timeout(config.request_timeout())
        .build()
        .map_err(ClientError::Transport)
}

async fn post_json<Req, Resp>(
    http: &reqwest::Client,
    url: &str,
    body: &Req,
) -> Result<Resp, ClientError>
where
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    tracing::debug!(url, "POST");
    let response = http.post(url).json(body).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Client for `POST /v1/conversation` and `POST /v1/conversation/continue`.
#[derive(Debug, Clone)]
pub struct HttpConversationClient {
    http: reqwest::Client,
    create_url: String,
    continue_url: String,
}

impl HttpConversationClient {
    /// Create a client for the configured base URL.
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        Ok(Self::with_http(http_client(config)?, config))
    }

    fn with_http(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            create_url: resolve_api_url(&config.api_base_url, &config.create_path),
            continue_url: resolve_api_url(&config.api_base_url, &config.continue_path),
        }
    }
}

#[async_trait]
impl ConversationService for HttpConversationClient {
    async fn create(
        &self,
        request: &CreateConversationRequest,
    ) -> Result<ConversationReply, ClientError> {
        let response: CreateConversationResponse =
            post_json(&self.http, &self.create_url, request).await?;
        Ok(response.into())
    }

    async fn continue_conversation(
        &self,
        request: &ContinueConversationRequest,
    ) -> Result<ConversationReply, ClientError> {
        let response: ContinueConversationResponse =
            post_json(&self.http, &self.continue_url, request).await?;
        Ok(response.into())
    }
}

/// Client for the historical `POST /api/mock` echo endpoint.
///
/// The echo API has no notion of conversations, so every turn is sent
/// with [`LEGACY_CONVERSATION_ID`] and create replies report that id.
#[derive(Debug, Clone)]
pub struct LegacyMockClient {
    http: reqwest::Client,
    url: String,
}

impl LegacyMockClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        Ok(Self::with_http(http_client(config)?, config))
    }

    fn with_http(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            url: resolve_api_url(&config.api_base_url, &config.legacy_path),
        }
    }

    async fn send(&self, message: &str, conversation_id: &str) -> Result<ConversationReply, ClientError> {
        let request = SendMessageRequest {
            message: message.to_string(),
            conversation_id: Some(conversation_id.to_string()),
        };
        let response: SendMessageResponse = post_json(&self.http, &self.url, &request).await?;
        Ok(response.into())
    }
}

#[async_trait]
impl ConversationService for LegacyMockClient {
    async fn create(
        &self,
        request: &CreateConversationRequest,
    ) -> Result<ConversationReply, ClientError> {
        let mut reply = self.send(&request.user_request, LEGACY_CONVERSATION_ID).await?;
        reply.conversation_id = Some(LEGACY_CONVERSATION_ID.to_string());
        Ok(reply)
    }

    async fn continue_conversation(
        &self,
        request: &ContinueConversationRequest,
    ) -> Result<ConversationReply, ClientError> {
        self.send(&request.user_request, &request.conversation_id).await
    }
}

/// Errors from talking to the conversation service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request failed local validation and was not sent.
    #[error("invalid request: {}", format_issues(.0))]
    Validation(Vec<ValidationIssue>),

    /// Network or protocol failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The task running the request died before it produced a result.
    #[error("request interrupted: {0}")]
    Interrupted(String),
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoService;

    #[async_trait]
    impl ConversationService for EchoService {
        async fn create(
            &self,
            request: &CreateConversationRequest,
        ) -> Result<ConversationReply, ClientError> {
            Ok(ConversationReply {
                conversation_id: Some("not-a-uuid".into()),
                response_message: request.user_request.clone(),
                businesses: None,
            })
        }

        async fn continue_conversation(
            &self,
            request: &ContinueConversationRequest,
        ) -> Result<ConversationReply, ClientError> {
            Ok(ConversationReply {
                conversation_id: None,
                response_message: format!("{}:{}", request.conversation_id, request.user_request),
                businesses: None,
            })
        }
    }

    #[test]
    fn test_request_for_turn() {
        assert_eq!(
            ConversationRequest::for_turn(None, "hi"),
            ConversationRequest::Create(CreateConversationRequest {
                user_request: "hi".into()
            })
        );
        let req = ConversationRequest::for_turn(Some("abc"), "again");
        assert!(matches!(
            &req,
            ConversationRequest::Continue(r) if r.conversation_id == "abc"
        ));
        assert_eq!(req.user_request(), "again");
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_shape() {
        let reply = dispatch(&EchoService, &ConversationRequest::for_turn(None, "hi"))
            .await
            .unwrap();
        assert_eq!(reply.response_message, "hi");
        // Non-UUID ids are accepted.
        assert_eq!(reply.conversation_id.as_deref(), Some("not-a-uuid"));

        let reply = dispatch(&EchoService, &ConversationRequest::for_turn(Some("c1"), "more"))
            .await
            .unwrap();
        assert_eq!(reply.response_message, "c1:more");
    }

    #[tokio::test]
    async fn test_dispatch_rejects_invalid_request() {
        let err = dispatch(&EchoService, &ConversationRequest::for_turn(Some(""), ""))
            .await
            .unwrap_err();
        match err {
            ClientError::Validation(issues) => assert_eq!(issues.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = ClientError::Validation(vec![ValidationIssue {
            path: "user_request".into(),
            message: "user_request is required".into(),
        }]);
        assert_eq!(
            err.to_string(),
            "invalid request: user_request: user_request is required"
        );

        let err = ClientError::Status {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "service returned HTTP 500: boom");
    }

    #[test]
    fn test_build_service_for_each_transport() {
        let config = Config::default();
        assert!(build_service(&config).is_ok());

        let legacy = Config {
            transport: Transport::LegacyMock,
            ..Config::default()
        };
        assert!(build_service(&legacy).is_ok());
    }
}
