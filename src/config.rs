/// 服务器配置模块
///
/// 配置在启动时根据命令行参数构建一次，之后按引用传给需要它的
/// 组件，进程内没有全局可变配置
use crate::error::{Result, TunnelError};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// 默认拨号超时（秒）
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// 示例 ACL 配置文件（`template` 子命令输出）
pub const ACL_TEMPLATE: &str = r#"{
  "acl": {
    "example.com:443": {
      "name": "example.com:443",
      "date": "2024-01-01",
      "description": "example upstream service"
    }
  }
}
"#;

/// 服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 监听地址（`host:port`）
    pub bind_addr: String,
    /// ACL 配置文件路径
    pub acl_path: PathBuf,
    /// 是否在同一监听端口上开放管理接口
    pub with_api: bool,
    /// 拨号目标的超时
    pub connect_timeout: Duration,
}

impl ServerConfig {
    /// 构建并校验配置
    pub fn new(
        bind_addr: impl Into<String>,
        acl_path: impl Into<PathBuf>,
        with_api: bool,
        connect_timeout_secs: u64,
    ) -> Result<Self> {
        let config = Self {
            bind_addr: bind_addr.into(),
            acl_path: acl_path.into(),
            with_api,
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }

    /// 校验配置字段
    pub fn validate(&self) -> Result<()> {
        if self.bind_addr.parse::<SocketAddr>().is_err() {
            return Err(TunnelError::config_error(format!(
                "Invalid bind address '{}', expected host:port",
                self.bind_addr
            )));
        }
        if self.connect_timeout.is_zero() {
            return Err(TunnelError::config_error(
                "connect timeout must be greater than zero",
            ));
        }
        if self.acl_path.as_os_str().is_empty() {
            return Err(TunnelError::config_error("ACL config path must not be empty"));
        }
        Ok(())
    }
}
