/// 服务器模块
///
/// 单一监听端口：CONNECT 请求走隧道生命周期，其他方法在开启管理
/// 接口时分派给 CRUD 处理，否则统一回复 405
pub mod api;
pub mod connect;

use crate::acl::AclStore;
use crate::admission::AdmissionGate;
use crate::config::ServerConfig;
use crate::error::{Result, TunnelError};
use crate::http;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

/// 运行隧道服务器直到收到 Ctrl+C
pub async fn run_server(config: ServerConfig, store: AclStore) -> Result<()> {
    let listener = TcpListener::bind(&config.bind_addr).await.map_err(|e| {
        TunnelError::config_error(format!("Failed to bind {}: {}", config.bind_addr, e))
    })?;

    info!(
        "HTTP tunnel listening on {} (management API {})",
        config.bind_addr,
        if config.with_api { "enabled" } else { "disabled" }
    );
    info!("Waiting for connections... (Press Ctrl+C to stop)");

    let config = Arc::new(config);
    let gate = AdmissionGate::new(store.clone());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        let config = Arc::clone(&config);
                        let store = store.clone();
                        let gate = gate.clone();

                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, peer, config, store, gate).await {
                                // 每连接错误已在发生处记录细节，这里只分类
                                if e.is_per_connection() {
                                    debug!("Connection from {} finished: {}", peer, e);
                                } else {
                                    warn!("Connection from {} failed: {}", peer, e);
                                }
                            }
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Received shutdown signal, stopping server...");
                break;
            }
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// 处理单个入站连接：读取请求头并按方法分派
async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    config: Arc<ServerConfig>,
    store: AclStore,
    gate: AdmissionGate,
) -> Result<()> {
    let head = http::read_request_head(&mut stream).await?;
    debug!("{} {} from {}", head.method, head.target, peer);

    if head.method == "CONNECT" {
        return connect::handle_connect(stream, head, peer, &gate, config.connect_timeout).await;
    }

    if config.with_api && head.target.starts_with("/api") {
        return api::handle_api(stream, head, store, &config.acl_path).await;
    }

    let method = head.method.clone();
    http::write_response(
        &mut stream,
        405,
        "Method Not Allowed",
        "text/plain",
        b"This is a http tunnel proxy, only CONNECT method is allowed.",
    )
    .await?;

    Err(TunnelError::method_not_supported(method))
}
