/// 管理接口
///
/// 与隧道共用监听端口，承载 ACL 的 CRUD 与持久化：
///   GET    /api        列出当前表的快照
///   POST   /api        新增/覆盖一条规则（204，name 为空时 406）
///   DELETE /api        清空整张表（204）
///   DELETE /api/{name} 删除单条规则（204，不存在时 404）
///   PUT    /api        将当前表写回配置文件（200，失败时 500）
use crate::acl::{self, AclStore, ServiceRecord};
use crate::error::Result;
use crate::http::{self, RequestHead};
use std::path::Path;
use tokio::net::TcpStream;
use tracing::{error, info};

/// 处理一个管理接口请求
pub async fn handle_api(
    mut stream: TcpStream,
    mut head: RequestHead,
    store: AclStore,
    acl_path: &Path,
) -> Result<()> {
    let method = head.method.clone();
    let target = head.target.clone();
    match (method.as_str(), target.as_str()) {
        ("GET", "/api") | ("GET", "/api/") => {
            let snapshot = store.snapshot();
            let json = serde_json::to_vec(&snapshot).unwrap_or_default();
            http::write_response(&mut stream, 200, "OK", "application/json", &json).await?;
        }
        ("POST", "/api") => {
            let body = http::read_body(&mut stream, &mut head).await?;
            match serde_json::from_slice::<ServiceRecord>(&body) {
                Ok(record) if !record.name.is_empty() => {
                    store.put(record.name, record.date, record.description);
                    http::write_empty(&mut stream, 204, "No Content").await?;
                }
                _ => {
                    // 缺少 name 或非法 JSON 都不改变表状态
                    http::write_empty(&mut stream, 406, "Not Acceptable").await?;
                }
            }
        }
        ("DELETE", "/api") | ("DELETE", "/api/") => {
            store.delete_all();
            info!("Deleted all ACL rules");
            http::write_empty(&mut stream, 204, "No Content").await?;
        }
        ("DELETE", path) if path.starts_with("/api/") => {
            let name = &path["/api/".len()..];
            match store.delete(name) {
                Ok(()) => {
                    info!("Deleted ACL rule [{}]", name);
                    http::write_empty(&mut stream, 204, "No Content").await?;
                }
                Err(_) => {
                    http::write_empty(&mut stream, 404, "Not Found").await?;
                }
            }
        }
        ("PUT", "/api") => match acl::flush_store(&store, acl_path) {
            Ok(()) => {
                http::write_empty(&mut stream, 200, "OK").await?;
            }
            Err(e) => {
                // 写盘失败只报告给调用方，内存中的表保持不变
                error!("Failed to flush ACL rules: {}", e);
                http::write_empty(&mut stream, 500, "Internal Server Error").await?;
            }
        },
        _ => {
            http::write_empty(&mut stream, 404, "Not Found").await?;
        }
    }

    Ok(())
}
