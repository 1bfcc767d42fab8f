//! HTTP client for the booking backend.
//!
//! Only two endpoints are used: `GET /events` for the listing and
//! `POST /login` for authentication. Every call is a single request with no
//! retries and no timeout beyond what the transport imposes.

mod model;

use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};

pub use model::{Credentials, EventRecord};
use model::{ErrorBody, LoginResponse};

const EVENTS_PATH: &str = "/events";
const LOGIN_PATH: &str = "/login";

/// Failure of a single API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("server responded with {status}: {message}")]
    Rejected { status: StatusCode, message: String },

    /// No response was received.
    #[error("request could not be completed: {0}")]
    Transport(#[source] reqwest::Error),

    /// A 2xx response whose body could not be understood.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the backend at `base_url` (e.g. `http://localhost:8080`).
    pub fn new(base_url: impl Into<String>) -> color_eyre::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("eventspark/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Fetch all events.
    ///
    /// An empty or `null` body is an empty listing.
    pub async fn list_events(&self) -> Result<Vec<EventRecord>, ApiError> {
        let url = self.endpoint(EVENTS_PATH);
        debug!(%url, "Fetching events");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(ApiError::Transport)?;
        let response = reject_unsuccessful(response).await?;

        let body = response.bytes().await.map_err(ApiError::Transport)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let events: Option<Vec<EventRecord>> =
            serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        let events = events.unwrap_or_default();
        debug!(count = events.len(), "Fetched events");
        Ok(events)
    }

    /// Exchange credentials for a session token.
    pub async fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let url = self.endpoint(LOGIN_PATH);
        debug!(%url, "Submitting login");

        let response = self
            .http
            .post(&url)
            .json(credentials)
            .send()
            .await
            .map_err(ApiError::Transport)?;
        let response = reject_unsuccessful(response).await?;

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        body.token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::Decode("response did not include a token".to_string()))
    }
}

/// Turn a non-2xx response into [`ApiError::Rejected`], reading its body for
/// the message.
async fn reject_unsuccessful(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = rejection_message(status, &body);
    warn!(%status, %message, "Request rejected");
    Err(ApiError::Rejected { status, message })
}

fn rejection_message(status: StatusCode, body: &str) -> String {
    if let Some(message) = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
    {
        return message;
    }

    let text = body.trim();
    if !text.is_empty() {
        return text.to_string();
    }

    status
        .canonical_reason()
        .map_or_else(|| status.as_str().to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(format!("{}/", server.uri())).unwrap()
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:8080///").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.endpoint(EVENTS_PATH), "http://localhost:8080/events");
    }

    #[test]
    fn rejection_message_sources() {
        assert_eq!(
            rejection_message(StatusCode::UNAUTHORIZED, r#"{"message":"invalid credentials"}"#),
            "invalid credentials"
        );
        assert_eq!(
            rejection_message(StatusCode::BAD_REQUEST, "  bad things\n"),
            "bad things"
        );
        assert_eq!(
            rejection_message(StatusCode::SERVICE_UNAVAILABLE, ""),
            "Service Unavailable"
        );
    }

    #[tokio::test]
    async fn lists_events() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "ID": "1",
                    "Name": "Jazz Night",
                    "DateTime": "2024-07-01T20:00:00Z",
                    "Location": "Blue Note"
                },
                { "ID": 2, "Name": "Poetry Slam", "Description": "Open mic" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let events = client_for(&server).await.list_events().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name.as_deref(), Some("Jazz Night"));
        assert_eq!(events[0].location.as_deref(), Some("Blue Note"));
        assert_eq!(events[1].id, "2");
        assert_eq!(events[1].description.as_deref(), Some("Open mic"));
    }

    #[tokio::test]
    async fn null_and_empty_bodies_are_empty_listings() {
        for body in ["null", "", "  \n"] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/events"))
                .respond_with(ResponseTemplate::new(200).set_body_string(body))
                .mount(&server)
                .await;

            let events = client_for(&server).await.list_events().await.unwrap();
            assert!(events.is_empty(), "body {body:?}");
        }
    }

    #[tokio::test]
    async fn listing_error_status_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(500).set_body_json(
                json!({ "message": "could not fetch the events, try again later" }),
            ))
            .mount(&server)
            .await;

        let error = client_for(&server).await.list_events().await.unwrap_err();
        match error {
            ApiError::Rejected { status, message } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(message, "could not fetch the events, try again later");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn listing_with_garbage_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let error = client_for(&server).await.list_events().await.unwrap_err();
        assert!(matches!(error, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let error = ApiClient::new(format!("http://127.0.0.1:{port}"))
            .unwrap()
            .list_events()
            .await
            .unwrap_err();
        assert!(matches!(error, ApiError::Transport(_)));
    }

    #[tokio::test]
    async fn login_posts_credentials_and_returns_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "email": "a@b.com", "password": "secret" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "message": "login successful", "token": "abc123" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let token = client_for(&server)
            .await
            .login(&Credentials::new("a@b.com", "secret"))
            .await
            .unwrap();
        assert_eq!(token, "abc123");
    }

    #[tokio::test]
    async fn login_rejection_carries_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "invalid credentials" })),
            )
            .mount(&server)
            .await;

        let error = client_for(&server)
            .await
            .login(&Credentials::new("a@b.com", "wrong"))
            .await
            .unwrap_err();
        match error {
            ApiError::Rejected { status, message } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(message, "invalid credentials");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_without_token_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
            .mount(&server)
            .await;

        let error = client_for(&server)
            .await
            .login(&Credentials::new("a@b.com", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(error, ApiError::Decode(_)));
    }
}
