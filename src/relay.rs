/// 双向中继模块
///
/// 在两条已建立的 TCP 流之间原样复制字节，不做缓冲上限、
/// 变换或检查，也没有隧道时长限制
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

/// 一次中继结束后的字节统计
#[derive(Debug, Default, Clone, Copy)]
pub struct RelayOutcome {
    /// 客户端到目标方向复制的字节数
    pub client_to_upstream: u64,
    /// 目标到客户端方向复制的字节数
    pub upstream_to_client: u64,
}

/// 在客户端与目标之间双向复制，任一方向终止（EOF 或错误）即视为
/// 中继完成，随后关闭两条流；关闭动作本身会解除另一方向的阻塞，
/// 不需要显式的取消信号
pub async fn relay(mut client: TcpStream, mut upstream: TcpStream) -> RelayOutcome {
    let mut outcome = RelayOutcome::default();

    {
        let (mut client_read, mut client_write) = client.split();
        let (mut upstream_read, mut upstream_write) = upstream.split();

        let client_to_upstream = tokio::io::copy(&mut client_read, &mut upstream_write);
        let upstream_to_client = tokio::io::copy(&mut upstream_read, &mut client_write);
        tokio::pin!(client_to_upstream, upstream_to_client);

        tokio::select! {
            result = &mut client_to_upstream => match result {
                Ok(n) => outcome.client_to_upstream = n,
                Err(e) => debug!("Client to upstream copy ended: {}", e),
            },
            result = &mut upstream_to_client => match result {
                Ok(n) => outcome.upstream_to_client = n,
                Err(e) => debug!("Upstream to client copy ended: {}", e),
            },
        }
    }

    // 两条流各关闭一次，对方向的复制随 Future 析构一并结束
    let _ = client.shutdown().await;
    let _ = upstream.shutdown().await;

    outcome
}
