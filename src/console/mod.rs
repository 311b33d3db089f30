mod config;
mod token;

pub use config::load_aws_config;

use aws_config::SdkConfig;
use aws_credential_types::provider::error::CredentialsError;
use aws_sdk_sts::operation::get_caller_identity::GetCallerIdentityError;
use aws_sdk_sts::operation::get_federation_token::GetFederationTokenError;
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_runtime_api::http::Response;
use tracing::debug;
use url::Url;

pub const DEFAULT_REGION: &str = "eu-west-1";

const FEDERATION_URL: &str = "https://signin.aws.amazon.com/federation";
const FEDERATION_CN_URL: &str = "https://signin.amazonaws.cn/federation";
const CONSOLE_DOMAIN: &str = "console.aws.amazon.com";
const CONSOLE_CN_DOMAIN: &str = "console.amazonaws.cn";
const ISSUER: &str = "aws-console";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no ambient aws credential source was found")]
    CredentialResolution,
    #[error("failed to retrieve aws credentials")]
    CredentialRetrieval(#[source] CredentialsError),
    #[error("failed to get caller identity")]
    IdentityLookup(#[source] SdkError<GetCallerIdentityError, Response>),
    #[error("failed to get federation token")]
    FederationEscalation(#[source] SdkError<GetFederationTokenError, Response>),
    #[error("federation token response contained no credentials")]
    MissingFederationCredentials,
    #[error("failed to marshal federation payload")]
    PayloadEncoding(#[source] serde_json::Error),
    #[error("failed to parse federation url")]
    UrlParse(#[from] url::ParseError),
    #[error("error getting signin token")]
    TokenRequest(#[source] reqwest::Error),
    #[error("invalid credentials (federation endpoint returned {0})")]
    InvalidCredentials(reqwest::StatusCode),
    #[error("error decoding signin token")]
    TokenDecode(#[source] serde_json::Error),
    #[error("missing auth token")]
    MissingToken,
}

pub(crate) type Result<T> = std::result::Result<T, Error>;

/// Exchange the credentials carried by `config` for a one-time browser
/// sign-in URL into the AWS web console.
///
/// Non-expiring credentials are first escalated into a federation token,
/// scoped either to `policy_arn` or to an inline allow-all policy.
pub async fn get_sign_in_url(
    config: &SdkConfig,
    region: &str,
    policy_arn: Option<&str>,
) -> Result<String> {
    let payload = token::build_payload(config, policy_arn).await?;
    let signin_token = token::get_signin_token(&payload, region).await?;
    fmt_url(&signin_token, region)
}

/// Sign-in session logout endpoint for the region's partition.
pub fn logout_url(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "https://signin.amazonaws.cn/oauth?Action=logout"
    } else {
        "https://signin.aws.amazon.com/oauth?Action=logout"
    }
}

/// Federation endpoint for the region's partition.
pub(crate) fn federation_url(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        FEDERATION_CN_URL
    } else {
        FEDERATION_URL
    }
}

fn fmt_url(token: &str, region: &str) -> Result<String> {
    if token.trim().is_empty() {
        return Err(Error::MissingToken);
    }

    let region = if region.is_empty() {
        DEFAULT_REGION
    } else {
        region
    };

    let console_domain = if region.starts_with("cn-") {
        CONSOLE_CN_DOMAIN
    } else {
        CONSOLE_DOMAIN
    };
    debug!(domain = console_domain, "using console domain");

    let mut url = Url::parse(federation_url(region))?;
    url.query_pairs_mut()
        .append_pair("Action", "login")
        .append_pair("Destination", &format!("https://{region}.{console_domain}/"))
        .append_pair("Issuer", ISSUER)
        .append_pair("SigninToken", token);

    Ok(url.to_string())
}
