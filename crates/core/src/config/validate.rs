use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - API timeout is not 0 and the credential header name is set
/// - The resolved base URL is absolute http(s)
/// - Model identifiers are set and the foreground ratio is in (0, 1]
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.api.timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "api.timeout_ms cannot be 0".to_string(),
        ));
    }

    if config.api.api_key_header.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "api.api_key_header cannot be empty".to_string(),
        ));
    }

    let base = config.api.resolved_base_url();
    match reqwest::Url::parse(&base) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        _ => {
            return Err(ConfigError::ValidationError(format!(
                "api base address is not a valid http(s) URL: {}",
                base
            )))
        }
    }

    if config.session.api_key_key.is_empty() {
        return Err(ConfigError::ValidationError(
            "session.api_key_key cannot be empty".to_string(),
        ));
    }

    if config.models.text_model_id.is_empty() || config.models.image_model_id.is_empty() {
        return Err(ConfigError::ValidationError(
            "model identifiers cannot be empty".to_string(),
        ));
    }

    let ratio = config.models.foreground_ratio;
    if !(ratio > 0.0 && ratio <= 1.0) {
        return Err(ConfigError::ValidationError(format!(
            "models.foreground_ratio must be in (0, 1], got {}",
            ratio
        )));
    }

    Ok(())
}
