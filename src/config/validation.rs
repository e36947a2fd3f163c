use super::models::Settings;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("dispatcher.queue_capacity must be at least 1")]
    ZeroQueueCapacity,

    #[error("tabular.delimiter {0:?} must be a single ASCII character other than a quote or line break")]
    InvalidDelimiter(char),

    #[error("{field} must not be blank")]
    BlankValue { field: &'static str },

    #[error("http.base_url {url:?} is not an absolute http(s) URL")]
    InvalidBaseUrl { url: String },

    #[error("http.default_headers contains an invalid header {name:?}")]
    InvalidDefaultHeader { name: String },
}

/// Validate the entire settings tree
pub fn validate(settings: &Settings) -> Result<(), ValidationError> {
    validate_http(settings)?;
    validate_dispatcher(settings)?;
    validate_tabular(settings)?;
    Ok(())
}

fn validate_http(settings: &Settings) -> Result<(), ValidationError> {
    let http = &settings.http;

    if http.timeout.is_zero() {
        return Err(ValidationError::ZeroDuration {
            field: "http.timeout",
        });
    }
    if http.connect_timeout.is_zero() {
        return Err(ValidationError::ZeroDuration {
            field: "http.connect_timeout",
        });
    }

    if let Some(base) = &http.base_url {
        let parsed = reqwest::Url::parse(base).map_err(|_| ValidationError::InvalidBaseUrl {
            url: base.clone(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ValidationError::InvalidBaseUrl { url: base.clone() });
        }
    }

    for (name, value) in &http.default_headers {
        let name_ok = reqwest::header::HeaderName::from_bytes(name.as_bytes()).is_ok();
        let value_ok = reqwest::header::HeaderValue::from_str(value).is_ok();
        if !name_ok || !value_ok {
            return Err(ValidationError::InvalidDefaultHeader { name: name.clone() });
        }
    }

    Ok(())
}

fn validate_dispatcher(settings: &Settings) -> Result<(), ValidationError> {
    if settings.dispatcher.queue_capacity == 0 {
        return Err(ValidationError::ZeroQueueCapacity);
    }

    if let Some(limit) = settings.dispatcher.handler_timeout {
        if limit.is_zero() {
            return Err(ValidationError::ZeroDuration {
                field: "dispatcher.handler_timeout",
            });
        }
    }

    Ok(())
}

fn validate_tabular(settings: &Settings) -> Result<(), ValidationError> {
    let delimiter = settings.tabular.delimiter;
    if !delimiter.is_ascii() || matches!(delimiter, '"' | '\n' | '\r') {
        return Err(ValidationError::InvalidDelimiter(delimiter));
    }

    if settings.tabular.sheet_name.trim().is_empty() {
        return Err(ValidationError::BlankValue {
            field: "tabular.sheet_name",
        });
    }
    if let Some(sheet) = &settings.tabular.sheet {
        if sheet.trim().is_empty() {
            return Err(ValidationError::BlankValue {
                field: "tabular.sheet",
            });
        }
    }

    Ok(())
}
