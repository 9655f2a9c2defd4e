/// CONNECT 请求生命周期
///
/// 方法检查 → 准入判定 → 脱离 HTTP 框架 → 带超时拨号 → 写入
/// Established → 双向中继 → 关闭。准入拒绝与拨号失败都只影响
/// 当前连接
use crate::admission::{AdmissionGate, Decision};
use crate::error::{Result, TunnelError};
use crate::http::RequestHead;
use crate::relay;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, warn};

/// 隧道建立成功后写给客户端的握手响应，此后连接上不再有任何
/// HTTP 帧，通道是端到端的原始字节流
const ESTABLISHED: &[u8] = b"HTTP/1.0 200 Connection Established\r\n\r\n";

/// 处理一个已通过方法检查的 CONNECT 请求
pub async fn handle_connect(
    mut client: TcpStream,
    mut head: RequestHead,
    peer: SocketAddr,
    gate: &AdmissionGate,
    connect_timeout: Duration,
) -> Result<()> {
    // 目标按请求原文查询，不做任何归一化
    let destination = head.target.clone();

    if gate.decide(&destination) == Decision::Deny {
        warn!(
            "Connection from [{}] to [{}] is not allowed",
            peer, destination
        );
        // 原样保留的行为：只写明文说明，不带状态行，然后关闭连接
        let body = format!("Your connection to [{}] is not allowed.", destination);
        let _ = client.write_all(body.as_bytes()).await;
        let _ = client.shutdown().await;
        return Err(TunnelError::denied(destination));
    }

    // 脱离 HTTP 框架：此后客户端流只承载原始字节，
    // 越过请求头多读到的字节在隧道建立后转发给目标
    let early_bytes = head.take_remainder();

    info!("Connecting to host [{}]", destination);
    let mut upstream =
        match tokio::time::timeout(connect_timeout, TcpStream::connect(&destination)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                // 客户端已脱离 HTTP 框架，不再写任何字节，直接关闭
                warn!("Connect to host [{}] failed: {}", destination, e);
                let _ = client.shutdown().await;
                return Err(TunnelError::dial_failed(destination, e));
            }
            Err(_) => {
                warn!(
                    "Connect to host [{}] timed out after {:?}",
                    destination, connect_timeout
                );
                let _ = client.shutdown().await;
                return Err(TunnelError::dial_timeout(destination, connect_timeout));
            }
        };

    client.write_all(ESTABLISHED).await?;
    if !early_bytes.is_empty() {
        upstream.write_all(&early_bytes).await?;
    }

    let outcome = relay::relay(client, upstream).await;
    info!(
        "Connection closed by peer [{}] ({} bytes out, {} bytes in)",
        destination, outcome.client_to_upstream, outcome.upstream_to_client
    );

    Ok(())
}
