/// ACL 存储模块
///
/// 以目标标识（`host:port`）为键维护服务记录表，管理接口和准入判定
/// 共用同一把锁；对已建立的隧道不产生任何影响
use crate::error::{Result, TunnelError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// 单条服务记录，`name` 与表键一致
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// 目标标识（`host:port`），同时作为表键
    #[serde(default)]
    pub name: String,
    /// 添加日期（不做格式校验）
    #[serde(default)]
    pub date: String,
    /// 描述信息
    #[serde(default)]
    pub description: String,
}

/// 磁盘上的配置文件结构：`{"acl": {"<host:port>": {...}}}`
#[derive(Debug, Default, Serialize, Deserialize)]
struct AclFile {
    #[serde(default)]
    acl: HashMap<String, ServiceRecord>,
}

/// 并发安全的 ACL 存储
///
/// 所有读写路径（含快照与准入查询）都经过同一把互斥锁，
/// 锁只在操作期间持有，从不跨越 await 点
#[derive(Debug, Clone, Default)]
pub struct AclStore {
    table: Arc<Mutex<HashMap<String, ServiceRecord>>>,
}

impl AclStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 从已有表创建存储
    pub fn from_table(table: HashMap<String, ServiceRecord>) -> Self {
        Self {
            table: Arc::new(Mutex::new(table)),
        }
    }

    /// 新增或覆盖一条规则，覆盖已有规则记录日志但不视为错误
    pub fn put(
        &self,
        name: impl Into<String>,
        date: impl Into<String>,
        description: impl Into<String>,
    ) {
        let name = name.into();
        let record = ServiceRecord {
            name: name.clone(),
            date: date.into(),
            description: description.into(),
        };

        let mut table = self.table.lock();
        if table.insert(name.clone(), record).is_some() {
            info!("Rule already exists [{}], updating it", name);
        } else {
            debug!("Added rule [{}]", name);
        }
    }

    /// 删除单条规则，不存在时返回 RuleNotFound
    pub fn delete(&self, name: &str) -> Result<()> {
        let mut table = self.table.lock();
        if table.remove(name).is_some() {
            Ok(())
        } else {
            Err(TunnelError::rule_not_found(name))
        }
    }

    /// 无条件清空整张表
    pub fn delete_all(&self) {
        self.table.lock().clear();
    }

    /// 返回表的时间点副本，调用方可在不持锁的情况下安全读取
    pub fn snapshot(&self) -> HashMap<String, ServiceRecord> {
        self.table.lock().clone()
    }

    /// 检查规则是否存在（准入路径使用，与变更操作互斥）
    pub fn contains(&self, name: &str) -> bool {
        self.table.lock().contains_key(name)
    }

    /// 查找单条规则
    pub fn lookup(&self, name: &str) -> Option<ServiceRecord> {
        self.table.lock().get(name).cloned()
    }

    /// 当前规则数量
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    /// 表是否为空
    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }
}

/// 从配置文件加载 ACL 表，读或解析失败在启动时是致命的
pub fn load_store(path: &Path) -> Result<AclStore> {
    let content =
        std::fs::read_to_string(path).map_err(|e| TunnelError::persistence(path, e))?;
    let file: AclFile = serde_json::from_str(&content)
        .map_err(|e| TunnelError::config_error(format!("Failed to parse {:?}: {}", path, e)))?;

    info!("Loaded {} ACL rule(s) from {:?}", file.acl.len(), path);
    Ok(AclStore::from_table(file.acl))
}

/// 将当前表序列化回配置文件，失败时内存状态保持不变
pub fn flush_store(store: &AclStore, path: &Path) -> Result<()> {
    let file = AclFile {
        acl: store.snapshot(),
    };
    let content = serde_json::to_string_pretty(&file)
        .map_err(|e| TunnelError::config_error(format!("Failed to serialize ACL table: {}", e)))?;
    std::fs::write(path, content).map_err(|e| TunnelError::persistence(path, e))?;

    info!("Flushed {} ACL rule(s) to {:?}", file.acl.len(), path);
    Ok(())
}
