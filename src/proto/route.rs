//! 路由表
//!
//! 有序的 {网络, 掩码, 网关} 条目表，按最长前缀匹配查询；
//! 同前缀长度时先注册者胜出。

use crate::addr::IPAddress;
use crate::error::SimError;

/// 一条静态路由。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub network: IPAddress,
    pub mask: IPAddress,
    pub gateway: IPAddress,
}

/// 有序路由表。
#[derive(Debug, Default)]
pub struct RoutingTable {
    routes: Vec<Route>,
}

impl RoutingTable {
    /// 添加路由；同 (网络, 掩码) 的条目已存在时报错。
    pub fn add(
        &mut self,
        network: IPAddress,
        mask: IPAddress,
        gateway: IPAddress,
    ) -> Result<(), SimError> {
        if self
            .routes
            .iter()
            .any(|r| r.network == network && r.mask == mask)
        {
            return Err(SimError::RouteAlreadyExists);
        }
        self.routes.push(Route {
            network,
            mask,
            gateway,
        });
        Ok(())
    }

    /// 删除路由；不存在时报错。
    pub fn remove(&mut self, network: &IPAddress, mask: &IPAddress) -> Result<(), SimError> {
        let pos = self
            .routes
            .iter()
            .position(|r| &r.network == network && &r.mask == mask)
            .ok_or(SimError::RouteNotFound)?;
        self.routes.remove(pos);
        Ok(())
    }

    /// 最长前缀匹配。同 CIDR 长度时返回先注册的条目。
    pub fn lookup(&self, dst: &IPAddress) -> Option<&Route> {
        let mut best: Option<&Route> = None;
        for r in &self.routes {
            if !dst.in_same_network(&r.mask, &r.network) {
                continue;
            }
            match best {
                Some(b) if r.mask.cidr() <= b.mask.cidr() => {}
                _ => best = Some(r),
            }
        }
        best
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
