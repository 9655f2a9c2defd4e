/// 最小化的 HTTP/1.x 请求解析与响应输出
///
/// 服务器直接持有原始 TCP 流，这里只读取请求头并保留越界读到的
/// 字节（remainder）；消费 RequestHead 即完成与 HTTP 框架的分离，
/// 隧道建立后这些字节原样转发给目标
use crate::error::{Result, TunnelError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// 请求头最大字节数
pub const MAX_REQUEST_HEAD: usize = 8 * 1024;

/// 请求体最大字节数（仅管理接口使用）
pub const MAX_REQUEST_BODY: usize = 64 * 1024;

/// 已解析的请求头
#[derive(Debug)]
pub struct RequestHead {
    /// 请求方法（`CONNECT`、`GET` 等）
    pub method: String,
    /// 请求目标，CONNECT 时为 `host:port` 原文
    pub target: String,
    /// HTTP 版本串
    pub version: String,
    /// 头字段（名字已转小写）
    headers: Vec<(String, String)>,
    /// 头结束符之后多读到的字节
    remainder: Vec<u8>,
}

impl RequestHead {
    /// 按名字（不区分大小写）查找头字段
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Content-Length 值，缺失或非法时为 0
    pub fn content_length(&self) -> usize {
        self.header("content-length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// 取走越界读到的字节，调用后请求头不再持有它们
    pub fn take_remainder(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.remainder)
    }
}

/// 查找请求头结束符位置
fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// 从流中读取并解析一个请求头
///
/// 读到的越界字节保存在 RequestHead 中，流本身保持可用
pub async fn read_request_head<R>(stream: &mut R) -> Result<RequestHead>
where
    R: AsyncRead + Unpin,
{
    let mut buf: Vec<u8> = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    let head_end = loop {
        if let Some(pos) = find_head_end(&buf) {
            break pos;
        }
        if buf.len() > MAX_REQUEST_HEAD {
            return Err(TunnelError::invalid_request(format!(
                "request head exceeds {} bytes",
                MAX_REQUEST_HEAD
            )));
        }

        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(TunnelError::invalid_request(
                "connection closed before request head was complete",
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let remainder = buf.split_off(head_end + 4);
    buf.truncate(head_end);

    let text = std::str::from_utf8(&buf)
        .map_err(|_| TunnelError::invalid_request("request head is not valid UTF-8"))?;

    let mut lines = text.split("\r\n");
    let request_line = lines
        .next()
        .ok_or_else(|| TunnelError::invalid_request("empty request"))?;

    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| TunnelError::invalid_request("missing method"))?
        .to_string();
    let target = parts
        .next()
        .ok_or_else(|| TunnelError::invalid_request("missing request target"))?
        .to_string();
    let version = parts
        .next()
        .ok_or_else(|| TunnelError::invalid_request("missing HTTP version"))?
        .to_string();

    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    Ok(RequestHead {
        method,
        target,
        version,
        headers,
        remainder,
    })
}

/// 读取请求体：先消耗 remainder，再从流补足 Content-Length
pub async fn read_body<R>(stream: &mut R, head: &mut RequestHead) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let length = head.content_length();
    if length > MAX_REQUEST_BODY {
        return Err(TunnelError::invalid_request(format!(
            "request body exceeds {} bytes",
            MAX_REQUEST_BODY
        )));
    }

    let mut body = head.take_remainder();
    let mut chunk = [0u8; 1024];
    while body.len() < length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(TunnelError::invalid_request(
                "connection closed before request body was complete",
            ));
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(length);
    Ok(body)
}

/// 输出带正文的响应
pub async fn write_response<W>(
    stream: &mut W,
    status: u16,
    reason: &str,
    content_type: &str,
    body: &[u8],
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let header = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
        status,
        reason,
        content_type,
        body.len()
    );
    stream.write_all(header.as_bytes()).await?;
    stream.write_all(body).await?;
    stream.flush().await
}

/// 输出无正文的响应
pub async fn write_empty<W>(stream: &mut W, status: u16, reason: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let header = format!("HTTP/1.1 {} {}\r\nContent-Length: 0\r\n\r\n", status, reason);
    stream.write_all(header.as_bytes()).await?;
    stream.flush().await
}
