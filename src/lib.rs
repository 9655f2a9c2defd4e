/// HTTP Tunnel 库入口
///
/// 将核心模块导出为库，方便测试和复用
pub mod acl;
pub mod admission;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod relay;
pub mod server;

// 重新导出常用类型
pub use acl::{AclStore, ServiceRecord};
pub use admission::{AdmissionGate, Decision};
pub use config::ServerConfig;
pub use error::{Result, TunnelError};
