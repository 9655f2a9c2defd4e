use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "http-tunnel")]
#[command(version, about = "HTTP CONNECT tunnel proxy with a runtime-mutable ACL", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 运行隧道服务器
    Serve {
        /// 监听地址
        #[arg(short, long, default_value = "127.0.0.1:8081")]
        bind: String,

        /// ACL 配置文件路径
        #[arg(short, long, default_value = "./conf/services.json")]
        config: String,

        /// 关闭同端口上的管理接口
        #[arg(long)]
        no_api: bool,

        /// 拨号目标的超时（秒）
        #[arg(long, default_value_t = crate::config::DEFAULT_CONNECT_TIMEOUT_SECS)]
        connect_timeout: u64,
    },
    /// 检查 ACL 配置文件格式是否正确
    Check {
        /// ACL 配置文件路径
        #[arg(short, long)]
        config: String,
    },
    /// 生成示例 ACL 配置文件
    Template {
        /// 输出文件路径（缺省打印到标准输出）
        #[arg(short, long)]
        output: Option<String>,
    },
}
