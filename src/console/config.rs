use aws_config::{BehaviorVersion, SdkConfig};
use tracing::debug;

use super::{Error, Result, DEFAULT_REGION};

/// Resolve the ambient AWS configuration and the effective target region.
///
/// Region precedence: user supplied value, then the ambient default region,
/// then [`DEFAULT_REGION`].
pub async fn load_aws_config(region: Option<&str>) -> Result<(SdkConfig, String)> {
    let config = aws_config::defaults(BehaviorVersion::latest()).load().await;

    if config.credentials_provider().is_none() {
        return Err(Error::CredentialResolution);
    }

    let region = resolve_region(region, config.region().map(|r| r.as_ref()));

    Ok((config, region))
}

fn resolve_region(user: Option<&str>, ambient: Option<&str>) -> String {
    if let Some(region) = user.filter(|r| !r.is_empty()) {
        debug!(region, "using user supplied region");
        return region.to_string();
    }

    if let Some(region) = ambient.filter(|r| !r.is_empty()) {
        debug!(region, "using ambient default region");
        return region.to_string();
    }

    debug!(region = DEFAULT_REGION, "setting default aws region");
    DEFAULT_REGION.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_region_wins() {
        assert_eq!(
            resolve_region(Some("eu-west-2"), Some("us-east-1")),
            "eu-west-2"
        );
    }

    #[test]
    fn empty_user_region_falls_through_to_ambient() {
        assert_eq!(resolve_region(Some(""), Some("us-east-1")), "us-east-1");
        assert_eq!(resolve_region(None, Some("ap-southeast-2")), "ap-southeast-2");
    }

    #[test]
    fn falls_back_to_default_region() {
        assert_eq!(resolve_region(None, None), DEFAULT_REGION);
        assert_eq!(resolve_region(Some(""), Some("")), DEFAULT_REGION);
    }
}
