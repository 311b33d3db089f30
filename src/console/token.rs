use aws_config::SdkConfig;
use aws_sdk_sts::config::{Credentials, ProvideCredentials};
use aws_sdk_sts::types::PolicyDescriptorType;
use aws_sdk_sts::Client as StsClient;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{federation_url, Error, Result};

const FEDERATION_TOKEN_DURATION_SECONDS: i32 = 2520;
const SIGNIN_TOKEN_DURATION_SECONDS: &str = "3600";
const SIGNIN_TOKEN_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_SESSION_NAME: &str = "aws-console";
const ALLOW_ALL_POLICY: &str =
    r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Action":"*","Resource":"*"}]}"#;

/// Session credentials in the exact shape the federation endpoint expects.
#[derive(Debug, Serialize)]
struct SessionPayload {
    #[serde(rename = "sessionId")]
    session_id: String,
    #[serde(rename = "sessionKey")]
    session_key: String,
    #[serde(rename = "sessionToken")]
    session_token: String,
}

impl From<&Credentials> for SessionPayload {
    fn from(creds: &Credentials) -> Self {
        Self {
            session_id: creds.access_key_id().to_string(),
            session_key: creds.secret_access_key().to_string(),
            session_token: creds.session_token().unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SigninTokenResponse {
    // A missing field decodes to an empty token; emptiness is rejected
    // later at URL formatting time, not here.
    #[serde(rename = "SigninToken", default)]
    signin_token: String,
}

enum FederationScope<'a> {
    PolicyArn(&'a str),
    AllowAll,
}

fn federation_scope(policy_arn: Option<&str>) -> FederationScope<'_> {
    match policy_arn {
        Some(arn) if !arn.is_empty() => FederationScope::PolicyArn(arn),
        _ => FederationScope::AllowAll,
    }
}

/// Build the federation payload for the credentials carried by `config`.
///
/// Credentials that can expire are already a bounded session and federate
/// directly. Non-expiring credentials must first be exchanged for a
/// temporary federation token, scoped to `policy_arn` when given.
pub(crate) async fn build_payload(
    config: &SdkConfig,
    policy_arn: Option<&str>,
) -> Result<String> {
    let creds = config
        .credentials_provider()
        .ok_or(Error::CredentialResolution)?
        .provide_credentials()
        .await
        .map_err(Error::CredentialRetrieval)?;

    let payload = if creds.expiry().is_some() {
        debug!("credentials are a bounded session, federating directly");
        SessionPayload::from(&creds)
    } else {
        debug!("credentials cannot expire, exchanging for a federation token");
        let sts = StsClient::new(config);
        federation_payload(&sts, policy_arn).await?
    };

    serde_json::to_string(&payload).map_err(Error::PayloadEncoding)
}

async fn federation_payload(
    sts: &StsClient,
    policy_arn: Option<&str>,
) -> Result<SessionPayload> {
    let name = session_name(sts).await?;

    let mut request = sts
        .get_federation_token()
        .name(name)
        .duration_seconds(FEDERATION_TOKEN_DURATION_SECONDS);

    match federation_scope(policy_arn) {
        FederationScope::PolicyArn(arn) => {
            debug!(arn, "using user provided policy");
            request = request.policy_arns(PolicyDescriptorType::builder().arn(arn).build());
        }
        FederationScope::AllowAll => {
            debug!("using default assume anything policy");
            request = request.policy(ALLOW_ALL_POLICY);
        }
    }

    let output = request.send().await.map_err(Error::FederationEscalation)?;
    let creds = output
        .credentials()
        .ok_or(Error::MissingFederationCredentials)?;

    Ok(SessionPayload {
        session_id: creds.access_key_id().to_string(),
        session_key: creds.secret_access_key().to_string(),
        session_token: creds.session_token().to_string(),
    })
}

async fn session_name(sts: &StsClient) -> Result<String> {
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .map_err(Error::IdentityLookup)?;

    Ok(session_name_from_arn(identity.arn().unwrap_or_default()).to_string())
}

fn session_name_from_arn(arn: &str) -> &str {
    if arn.is_empty() {
        return DEFAULT_SESSION_NAME;
    }

    arn.split('/').nth(1).unwrap_or(DEFAULT_SESSION_NAME)
}

/// Exchange the federation payload for a console sign-in token.
pub(crate) async fn get_signin_token(payload: &str, region: &str) -> Result<String> {
    let mut token_url = Url::parse(federation_url(region))?;
    token_url
        .query_pairs_mut()
        .append_pair("Action", "getSigninToken")
        .append_pair("DurationSeconds", SIGNIN_TOKEN_DURATION_SECONDS)
        .append_pair("Session", payload)
        .append_pair("SessionType", "json");

    let client = reqwest::Client::builder()
        .timeout(SIGNIN_TOKEN_TIMEOUT)
        .build()
        .map_err(Error::TokenRequest)?;

    let response = client
        .get(token_url)
        .send()
        .await
        .map_err(Error::TokenRequest)?;

    let status = response.status();
    let body = response.text().await.map_err(Error::TokenRequest)?;

    decode_signin_token(status, &body)
}

fn decode_signin_token(status: StatusCode, body: &str) -> Result<String> {
    if status != StatusCode::OK {
        return Err(Error::InvalidCredentials(status));
    }

    let response: SigninTokenResponse =
        serde_json::from_str(body).map_err(Error::TokenDecode)?;

    Ok(response.signin_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_federation_field_names() {
        let creds = Credentials::new("AKID", "SECRET", Some("TOKEN".to_string()), None, "test");
        let payload = serde_json::to_string(&SessionPayload::from(&creds)).unwrap();
        assert_eq!(
            payload,
            r#"{"sessionId":"AKID","sessionKey":"SECRET","sessionToken":"TOKEN"}"#
        );
    }

    #[test]
    fn payload_defaults_missing_session_token_to_empty() {
        let creds = Credentials::new("AKID", "SECRET", None, None, "test");
        let payload = serde_json::to_string(&SessionPayload::from(&creds)).unwrap();
        assert_eq!(
            payload,
            r#"{"sessionId":"AKID","sessionKey":"SECRET","sessionToken":""}"#
        );
    }

    #[test]
    fn scope_prefers_user_provided_policy_arn() {
        let arn = "arn:aws:iam::aws:policy/AdministratorAccess";
        assert!(matches!(
            federation_scope(Some(arn)),
            FederationScope::PolicyArn(got) if got == arn
        ));
    }

    #[test]
    fn scope_defaults_to_allow_all() {
        assert!(matches!(federation_scope(None), FederationScope::AllowAll));
        assert!(matches!(
            federation_scope(Some("")),
            FederationScope::AllowAll
        ));
    }

    #[test]
    fn session_name_takes_second_arn_segment() {
        assert_eq!(
            session_name_from_arn("arn:aws:iam::123456789012:user/alice"),
            "alice"
        );
        assert_eq!(
            session_name_from_arn("arn:aws:sts::123456789012:assumed-role/admin/session"),
            "admin"
        );
    }

    #[test]
    fn session_name_falls_back_to_constant() {
        assert_eq!(session_name_from_arn(""), DEFAULT_SESSION_NAME);
        assert_eq!(
            session_name_from_arn("arn:aws:iam::123456789012:root"),
            DEFAULT_SESSION_NAME
        );
    }

    #[test]
    fn decode_rejects_non_200_status() {
        match decode_signin_token(StatusCode::FORBIDDEN, r#"{"SigninToken":"ignored"}"#) {
            Err(Error::InvalidCredentials(status)) => assert_eq!(status, StatusCode::FORBIDDEN),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_malformed_body() {
        assert!(matches!(
            decode_signin_token(StatusCode::OK, "<html>nope</html>"),
            Err(Error::TokenDecode(_))
        ));
    }

    #[test]
    fn decode_extracts_token() {
        let token = decode_signin_token(StatusCode::OK, r#"{"SigninToken":"abc123"}"#).unwrap();
        assert_eq!(token, "abc123");
    }

    #[test]
    fn decode_passes_empty_token_through() {
        assert_eq!(
            decode_signin_token(StatusCode::OK, r#"{"SigninToken":""}"#).unwrap(),
            ""
        );
        assert_eq!(decode_signin_token(StatusCode::OK, "{}").unwrap(), "");
    }
}
