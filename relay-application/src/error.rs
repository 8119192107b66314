use crate::config::ConfigError;
use relay_domain::DispatchError;

pub const UNKNOWN_ERROR: &str = "unknown.error";
pub const INVALID_DATA: &str = "invalid.data";

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("dispatch: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("validation: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("infra: {0}")]
    Infra(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// 稳定的错误码，供日志与接口响应使用
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Dispatch(err) => match err {
                DispatchError::TransportNotFound { .. } => "transport.not_found",
                DispatchError::FunctionNotFound { .. } => "function.not_found",
                DispatchError::ConsumerFailed { .. } => "consumer.failed",
                DispatchError::Engine { .. } => "engine.unavailable",
                DispatchError::InvalidDelay { .. } | DispatchError::Serde { .. } => INVALID_DATA,
                _ => UNKNOWN_ERROR,
            },
            AppError::Config(_) => "config.invalid",
            AppError::Validation(_) => INVALID_DATA,
            AppError::NotFound(_) => "not.found",
            AppError::Infra(_) => UNKNOWN_ERROR,
        }
    }

    /// HTTP 风格的状态码
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Dispatch(err) => match err {
                DispatchError::TransportNotFound { .. } | DispatchError::FunctionNotFound { .. } => {
                    404
                }
                DispatchError::InvalidDelay { .. } | DispatchError::Serde { .. } => 400,
                DispatchError::Engine { .. } => 503,
                _ => 500,
            },
            AppError::Validation(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::Config(_) | AppError::Infra(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_errors_map_to_stable_codes() {
        let err = AppError::from(DispatchError::FunctionNotFound {
            function_id: "x-function".into(),
        });
        assert_eq!((err.code(), err.status_code()), ("function.not_found", 404));

        let err = AppError::from(DispatchError::engine("connection refused"));
        assert_eq!((err.code(), err.status_code()), ("engine.unavailable", 503));

        let err = AppError::from(DispatchError::ConsumerFailed {
            event_name: "upload-pdf".into(),
            failed: 1,
            total: 1,
            reason: "boom".into(),
        });
        assert_eq!((err.code(), err.status_code()), ("consumer.failed", 500));
    }

    #[test]
    fn application_errors_map_to_stable_codes() {
        let err = AppError::Validation("uri is required".into());
        assert_eq!((err.code(), err.status_code()), (INVALID_DATA, 400));
        assert_eq!(err.to_string(), "validation: uri is required");

        let err = AppError::from(ConfigError::MissingKeys {
            keys: vec!["ENGINE_EVENT_KEY".into()],
        });
        assert_eq!((err.code(), err.status_code()), ("config.invalid", 500));
    }
}
