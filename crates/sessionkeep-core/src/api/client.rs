//! API client for communicating with the remote authority's REST API.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{header, multipart, Client};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::{ApiError, Authority};
use crate::config::{Config, Endpoints};
use crate::models::{Credentials, LoginData, LoginEnvelope, RegisterResponse, Registration};

/// API client for the remote authority.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    endpoints: Endpoints,
}

impl ApiClient {
    /// Create a new API client from configuration
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            endpoints: config.endpoints.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Check if response is successful, returning a classified error if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse {}: {}", what, e)))
    }

    /// The current-user endpoint may wrap the profile in `data`.
    fn unwrap_data(value: Value) -> Value {
        match value {
            Value::Object(mut map) if map.contains_key("data") => {
                map.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        }
    }

    fn guess_mime(path: &Path) -> &'static str {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            Some("svg") => "image/svg+xml",
            _ => "application/octet-stream",
        }
    }

    async fn cover_image_part(path: &Path) -> Result<multipart::Part, ApiError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ApiError::MalformedRequest(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "coverImage".to_string());
        Ok(multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(Self::guess_mime(path))?)
    }
}

#[async_trait]
impl Authority for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<LoginData, ApiError> {
        let url = self.url(&self.endpoints.login);
        debug!(url = %url, email = %credentials.email, "Sending login request");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(credentials)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let envelope: LoginEnvelope = Self::parse_json(response, "login response").await?;
        Ok(envelope.data)
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        let url = self.url(&self.endpoints.logout);
        debug!(url = %url, "Sending logout request");

        let response = self.client.post(&url).bearer_auth(token).send().await?;
        Self::check_response(response).await?;
        Ok(())
    }

    async fn register(&self, registration: &Registration) -> Result<RegisterResponse, ApiError> {
        let url = self.url(&self.endpoints.register);
        debug!(url = %url, username = %registration.username, "Sending register request");

        let mut form = multipart::Form::new();
        for (name, value) in registration.text_fields() {
            form = form.text(name, value.to_string());
        }
        form = form.part("coverImage", Self::cover_image_part(&registration.cover_image).await?);

        let response = self.client.post(&url).multipart(form).send().await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response, "register response").await
    }

    async fn current_user(&self, token: &str) -> Result<Value, ApiError> {
        let url = self.url(&self.endpoints.current_user);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let value: Value = Self::parse_json(response, "current user").await?;
        Ok(Self::unwrap_data(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client_for(base: &str) -> ApiClient {
        let config = Config {
            api_base_url: base.to_string(),
            ..Config::default()
        };
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let client = client_for("https://auth.example.com/");
        assert_eq!(
            client.url("/api/v1/users/login"),
            "https://auth.example.com/api/v1/users/login"
        );
        assert_eq!(
            client.url("api/v1/users/logout"),
            "https://auth.example.com/api/v1/users/logout"
        );
    }

    #[test]
    fn test_unwrap_data() {
        let wrapped = json!({"data": {"username": "al"}, "success": true});
        assert_eq!(ApiClient::unwrap_data(wrapped), json!({"username": "al"}));

        let bare = json!({"username": "al"});
        assert_eq!(ApiClient::unwrap_data(bare.clone()), bare);
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(ApiClient::guess_mime(Path::new("me.PNG")), "image/png");
        assert_eq!(ApiClient::guess_mime(Path::new("me.jpeg")), "image/jpeg");
        assert_eq!(ApiClient::guess_mime(Path::new("me")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_missing_cover_image_is_malformed_request() {
        let err = ApiClient::cover_image_part(Path::new("/nonexistent/avatar.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MalformedRequest(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Port 9 (discard) on localhost is not expected to accept connections.
        let client = client_for("http://127.0.0.1:9");
        let err = client.logout("tok").await.unwrap_err();
        assert!(matches!(err, ApiError::NetworkError(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_silent_server_times_out_as_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept connections and hold them open without ever answering.
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = Config {
            api_base_url: format!("http://{}", addr),
            request_timeout_secs: 1,
            ..Config::default()
        };
        let client = ApiClient::new(&config).unwrap();

        let started = std::time::Instant::now();
        let err = client.logout("tok").await.unwrap_err();
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
        assert!(matches!(err, ApiError::NetworkError(_)), "got {err:?}");
        assert!(matches!(
            crate::auth::AuthError::from(err),
            crate::auth::AuthError::Network(_)
        ));
        server.abort();
    }
}
