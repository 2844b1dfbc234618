use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::credentials::{self, AuthorizedUser, CredentialSource, CredentialsFile, ServiceAccountKey};
use super::{AuthError, CLOUD_PLATFORM_SCOPE};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

pub trait TokenProvider {
    /// Returns a bearer token valid for the cloud-platform scope.
    async fn access_token(&self) -> Result<String, AuthError>;
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Resolves Application Default Credentials and exchanges them for a token on
/// every call. Nothing is cached between requests.
#[derive(Clone)]
pub struct AdcTokenProvider {
    http_client: HttpClient,
    metadata_token_url: String,
}

impl AdcTokenProvider {
    pub fn new(http_client: HttpClient) -> Self {
        Self {
            http_client,
            metadata_token_url: METADATA_TOKEN_URL.to_string(),
        }
    }

    async fn fetch_token(&self) -> Result<TokenResponse, AuthError> {
        match credentials::locate_from_env() {
            CredentialSource::File(path) => {
                log::debug!("Using credentials file {}", path.display());
                match CredentialsFile::read(&path)? {
                    CredentialsFile::ServiceAccount(key) => self.exchange_assertion(&key).await,
                    CredentialsFile::AuthorizedUser(user) => self.refresh(&user).await,
                }
            }
            CredentialSource::MetadataServer => self.metadata_token().await,
        }
    }

    async fn exchange_assertion(&self, key: &ServiceAccountKey) -> Result<TokenResponse, AuthError> {
        let assertion = sign_assertion(key, Utc::now())?;

        let mut params = HashMap::new();
        params.insert("grant_type", JWT_BEARER_GRANT);
        params.insert("assertion", &assertion);

        self.post_token_form(&key.token_uri, &params).await
    }

    async fn refresh(&self, user: &AuthorizedUser) -> Result<TokenResponse, AuthError> {
        let mut params = HashMap::new();
        params.insert("grant_type", "refresh_token");
        params.insert("client_id", &user.client_id);
        params.insert("client_secret", &user.client_secret);
        params.insert("refresh_token", &user.refresh_token);

        self.post_token_form(&user.token_uri, &params).await
    }

    async fn post_token_form(
        &self,
        token_uri: &str,
        params: &HashMap<&str, &str>,
    ) -> Result<TokenResponse, AuthError> {
        let response = self
            .http_client
            .post(token_uri)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::TokenEndpoint(format!(
                "Token exchange failed: {}",
                error_text
            )));
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(token_response)
    }

    async fn metadata_token(&self) -> Result<TokenResponse, AuthError> {
        let response = self
            .http_client
            .get(&self.metadata_token_url)
            .query(&[("scopes", CLOUD_PLATFORM_SCOPE)])
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| {
                log::debug!("Metadata server unreachable: {}", e);
                AuthError::NotFound
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AuthError::TokenEndpoint(format!(
                "Metadata server refused token request: {}",
                error_text
            )));
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(token_response)
    }
}

impl TokenProvider for AdcTokenProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        let token = self.fetch_token().await?;
        log::debug!(
            "Obtained {} access token (expires in {:?}s)",
            token.token_type.as_deref().unwrap_or("bearer"),
            token.expires_in
        );
        Ok(token.access_token)
    }
}

pub fn assertion_claims(key: &ServiceAccountKey, now: DateTime<Utc>) -> AssertionClaims {
    let expiration = now + Duration::hours(1);
    AssertionClaims {
        iss: key.client_email.clone(),
        scope: CLOUD_PLATFORM_SCOPE.to_string(),
        aud: key.token_uri.clone(),
        iat: now.timestamp(),
        exp: expiration.timestamp(),
    }
}

pub fn sign_assertion(key: &ServiceAccountKey, now: DateTime<Utc>) -> Result<String, AuthError> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
    let claims = assertion_claims(key, now);
    encode(&header, &claims, &encoding_key).map_err(AuthError::SigningError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const METADATA_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

    fn provider(metadata_token_url: String) -> AdcTokenProvider {
        AdcTokenProvider {
            http_client: HttpClient::new(),
            metadata_token_url,
        }
    }

    fn token_body(access_token: &str) -> serde_json::Value {
        json!({"access_token": access_token, "expires_in": 3599, "token_type": "Bearer"})
    }

    fn authorized_user() -> AuthorizedUser {
        match CredentialsFile::parse(include_str!("testdata/authorized_user.json")).unwrap() {
            CredentialsFile::AuthorizedUser(user) => user,
            other => panic!("unexpected credentials: {:?}", other),
        }
    }

    fn service_account() -> ServiceAccountKey {
        match CredentialsFile::parse(include_str!("testdata/service_account.json")).unwrap() {
            CredentialsFile::ServiceAccount(key) => key,
            other => panic!("unexpected credentials: {:?}", other),
        }
    }

    #[test]
    fn test_assertion_claims() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let claims = assertion_claims(&service_account(), now);
        assert_eq!(claims.iss, "classifier@neuroscan-test.iam.gserviceaccount.com");
        assert_eq!(claims.scope, CLOUD_PLATFORM_SCOPE);
        assert_eq!(claims.aud, "https://oauth2.googleapis.com/token");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_sign_assertion() {
        let now = Utc::now();
        let token = sign_assertion(&service_account(), now).unwrap();

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("test-key-id"));

        let payload = token.split('.').nth(1).unwrap();
        let claims: AssertionClaims =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
        assert_eq!(claims, assertion_claims(&service_account(), now));
    }

    #[test]
    fn test_sign_assertion_rejects_bad_key() {
        let mut key = service_account();
        key.private_key = "not a pem".to_string();
        assert!(matches!(
            sign_assertion(&key, Utc::now()),
            Err(AuthError::SigningError(_))
        ));
    }

    #[actix_web::test]
    async fn test_service_account_assertion_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains(
                "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("sa-token")))
            .expect(1)
            .mount(&server)
            .await;

        let mut key = service_account();
        key.token_uri = format!("{}/token", server.uri());
        let token = provider(String::new()).exchange_assertion(&key).await.unwrap();
        assert_eq!(token.access_token, "sa-token");
        assert_eq!(token.expires_in, Some(3599));

        let requests = server.received_requests().await.unwrap();
        let assertion = url::form_urlencoded::parse(&requests[0].body)
            .find(|(name, _)| name == "assertion")
            .map(|(_, value)| value.into_owned())
            .unwrap();
        let payload = assertion.split('.').nth(1).unwrap();
        let claims: AssertionClaims =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
        assert_eq!(claims.iss, "classifier@neuroscan-test.iam.gserviceaccount.com");
        assert_eq!(claims.aud, key.token_uri);
        assert_eq!(claims.scope, CLOUD_PLATFORM_SCOPE);
    }

    #[actix_web::test]
    async fn test_authorized_user_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-token"))
            .and(body_string_contains("client_secret=client-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("user-token")))
            .expect(1)
            .mount(&server)
            .await;

        let mut user = authorized_user();
        user.token_uri = format!("{}/token", server.uri());
        let token = provider(String::new()).refresh(&user).await.unwrap();
        assert_eq!(token.access_token, "user-token");
    }

    #[actix_web::test]
    async fn test_token_endpoint_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let mut user = authorized_user();
        user.token_uri = format!("{}/token", server.uri());
        match provider(String::new()).refresh(&user).await {
            Err(AuthError::TokenEndpoint(message)) => assert!(message.contains("invalid_grant")),
            other => panic!("unexpected result: {:?}", other.map(|t| t.access_token)),
        }
    }

    #[actix_web::test]
    async fn test_metadata_server_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(METADATA_PATH))
            .and(header("metadata-flavor", "Google"))
            .and(query_param("scopes", CLOUD_PLATFORM_SCOPE))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("vm-token")))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider(format!("{}{}", server.uri(), METADATA_PATH));
        let token = provider.metadata_token().await.unwrap();
        assert_eq!(token.access_token, "vm-token");
    }

    #[actix_web::test]
    async fn test_unreachable_metadata_server_means_no_credentials() {
        let provider = provider(format!("http://127.0.0.1:1{}", METADATA_PATH));
        assert!(matches!(
            provider.metadata_token().await,
            Err(AuthError::NotFound)
        ));
    }
}
