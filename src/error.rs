/// 自定义错误类型
///
/// 使用 thiserror 定义精确的错误类型，替代泛型的 anyhow::Error
/// 每连接错误（拒绝、拨号失败）只影响该连接；持久化错误在启动时是致命的
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// HTTP Tunnel 的主要错误类型
#[derive(Error, Debug)]
pub enum TunnelError {
    /// 非 CONNECT 方法
    #[error("Method '{method}' is not supported, only CONNECT is allowed")]
    MethodNotSupported { method: String },

    /// 目标不在 ACL 中
    #[error("Connection to [{destination}] is not allowed")]
    AdmissionDenied { destination: String },

    /// 拨号目标失败
    #[error("Failed to connect to {destination}: {source}")]
    DialFailed {
        destination: String,
        #[source]
        source: io::Error,
    },

    /// 拨号超时
    #[error("Connect to {destination} timed out after {duration:?}")]
    DialTimeout {
        destination: String,
        duration: Duration,
    },

    /// 删除不存在的 ACL 规则
    #[error("No such rule [{name}]")]
    RuleNotFound { name: String },

    /// 请求格式错误
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 配置文件读写失败
    #[error("Failed to access {path:?}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 配置错误
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O 错误
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 其他错误（保留与 anyhow 的兼容性）
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, TunnelError>;

impl TunnelError {
    /// 创建方法不支持错误
    pub fn method_not_supported(method: impl Into<String>) -> Self {
        Self::MethodNotSupported {
            method: method.into(),
        }
    }

    /// 创建准入拒绝错误
    pub fn denied(destination: impl Into<String>) -> Self {
        Self::AdmissionDenied {
            destination: destination.into(),
        }
    }

    /// 创建拨号失败错误
    pub fn dial_failed(destination: impl Into<String>, source: io::Error) -> Self {
        Self::DialFailed {
            destination: destination.into(),
            source,
        }
    }

    /// 创建拨号超时错误
    pub fn dial_timeout(destination: impl Into<String>, duration: Duration) -> Self {
        Self::DialTimeout {
            destination: destination.into(),
            duration,
        }
    }

    /// 创建规则未找到错误
    pub fn rule_not_found(name: impl Into<String>) -> Self {
        Self::RuleNotFound { name: name.into() }
    }

    /// 创建无效请求错误
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// 创建持久化错误
    pub fn persistence(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    /// 创建配置错误
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// 检查是否为准入拒绝
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::AdmissionDenied { .. })
    }

    /// 检查是否为拨号超时
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::DialTimeout { .. })
    }

    /// 检查是否为规则未找到
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RuleNotFound { .. })
    }

    /// 检查是否为配置错误
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError(_))
    }

    /// 检查错误是否被限制在单个连接内（不影响其他连接或进程）
    pub fn is_per_connection(&self) -> bool {
        matches!(
            self,
            Self::MethodNotSupported { .. }
                | Self::AdmissionDenied { .. }
                | Self::DialFailed { .. }
                | Self::DialTimeout { .. }
                | Self::InvalidRequest(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denied_error() {
        let err = TunnelError::denied("example.com:443");
        assert!(err.is_denied());
        assert!(err.is_per_connection());
        assert_eq!(
            err.to_string(),
            "Connection to [example.com:443] is not allowed"
        );
    }

    #[test]
    fn test_dial_timeout() {
        let err = TunnelError::dial_timeout("10.0.0.1:80", Duration::from_secs(5));
        assert!(err.is_timeout());
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_rule_not_found() {
        let err = TunnelError::rule_not_found("example.com:443");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "No such rule [example.com:443]");
    }

    #[test]
    fn test_dial_failed() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let err = TunnelError::dial_failed("127.0.0.1:8080", io_err);
        assert!(err.is_per_connection());
        assert!(err.to_string().contains("Failed to connect"));
        assert!(err.to_string().contains("127.0.0.1:8080"));
    }

    #[test]
    fn test_error_is_checks() {
        let denied = TunnelError::denied("a:1");
        let config = TunnelError::config_error("bad bind address");
        let timeout = TunnelError::dial_timeout("a:1", Duration::from_secs(1));

        assert!(denied.is_denied());
        assert!(!denied.is_timeout());
        assert!(!denied.is_config_error());

        assert!(config.is_config_error());
        assert!(!config.is_per_connection());

        assert!(timeout.is_timeout());
        assert!(timeout.is_per_connection());
    }

    #[test]
    fn test_method_not_supported_message() {
        let err = TunnelError::method_not_supported("GET");
        assert_eq!(
            err.to_string(),
            "Method 'GET' is not supported, only CONNECT is allowed"
        );
    }
}
