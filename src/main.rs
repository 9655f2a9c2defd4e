use anyhow::{Context, Result};
use clap::Parser;
use http_tunnel::cli::{Cli, Commands};
use http_tunnel::config::{ServerConfig, ACL_TEMPLATE};
use http_tunnel::{acl, server};
use std::path::Path;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli.log_level.as_str())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    info!("HTTP Tunnel v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Serve {
            bind,
            config,
            no_api,
            connect_timeout,
        } => {
            let server_config =
                ServerConfig::new(bind.as_str(), config.as_str(), !*no_api, *connect_timeout)?;

            info!("Loading ACL config file [{}]", config);
            // 启动阶段的加载失败是致命的
            let store = acl::load_store(Path::new(config))?;

            server::run_server(server_config, store).await?;
        }
        Commands::Check { config } => {
            check_config(config)?;
        }
        Commands::Template { output } => {
            generate_template(output.as_deref())?;
        }
    }

    Ok(())
}

/// 检查 ACL 配置文件格式
fn check_config(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if !path.exists() {
        anyhow::bail!("ACL config file not found: {}", config_path);
    }

    println!("Checking ACL config file: {}\n", config_path);

    match acl::load_store(path) {
        Ok(store) => {
            println!("✓ Number of rules: {}", store.len());
            let mut names: Vec<String> = store.snapshot().into_keys().collect();
            names.sort();
            for (idx, name) in names.iter().enumerate() {
                println!("  Rule #{}: '{}'", idx + 1, name);
            }
            println!("\n✓ ACL configuration is valid!");
            Ok(())
        }
        Err(e) => {
            println!("✗ Configuration validation failed!");
            println!("\nError details:");
            println!("{:#}", e);

            println!("\nCommon issues:");
            println!("  1. Check JSON syntax (braces, quotes, commas)");
            println!("  2. The top-level object must contain an \"acl\" field");
            println!("  3. Each entry maps \"host:port\" to name/date/description");

            Err(e.into())
        }
    }
}

/// 生成示例 ACL 配置文件
fn generate_template(output: Option<&str>) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, ACL_TEMPLATE)
            .with_context(|| format!("Failed to write ACL template to {}", path))?;
        println!("Generated ACL config template: {}", path);
    } else {
        println!("{}", ACL_TEMPLATE);
    }

    Ok(())
}
