/// 准入判定模块
///
/// CONNECT 目标按 `host:port` 原文在 ACL 中精确匹配，缺省拒绝，
/// 查询与 ACL 变更共用存储内部的同一把锁
use crate::acl::AclStore;

/// 准入判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// 准入闸门，持有 ACL 存储的共享句柄
#[derive(Clone)]
pub struct AdmissionGate {
    store: AclStore,
}

impl AdmissionGate {
    pub fn new(store: AclStore) -> Self {
        Self { store }
    }

    /// 判定目标是否放行，不做任何通配或前缀匹配
    pub fn decide(&self, destination: &str) -> Decision {
        if self.store.contains(destination) {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_deny() {
        let gate = AdmissionGate::new(AclStore::new());
        assert_eq!(gate.decide("example.com:443"), Decision::Deny);
    }

    #[test]
    fn test_listed_destination_is_allowed() {
        let store = AclStore::new();
        store.put("example.com:443", "2024-01-01", "");
        let gate = AdmissionGate::new(store);

        assert_eq!(gate.decide("example.com:443"), Decision::Allow);
        assert_eq!(gate.decide("other.com:443"), Decision::Deny);
    }

    #[test]
    fn test_match_is_verbatim() {
        let store = AclStore::new();
        store.put("example.com:443", "", "");
        let gate = AdmissionGate::new(store);

        // 不做大小写归一化、不匹配裸主机名或其他端口
        assert_eq!(gate.decide("EXAMPLE.COM:443"), Decision::Deny);
        assert_eq!(gate.decide("example.com"), Decision::Deny);
        assert_eq!(gate.decide("example.com:80"), Decision::Deny);
    }

    #[test]
    fn test_mutations_affect_later_decisions() {
        let store = AclStore::new();
        let gate = AdmissionGate::new(store.clone());

        assert_eq!(gate.decide("a:1"), Decision::Deny);
        store.put("a:1", "", "");
        assert_eq!(gate.decide("a:1"), Decision::Allow);
        store.delete("a:1").unwrap();
        assert_eq!(gate.decide("a:1"), Decision::Deny);
    }
}
