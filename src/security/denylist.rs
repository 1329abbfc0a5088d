//! Address reputation collaborators.

use async_trait::async_trait;
use std::collections::HashSet;
use std::io;
use std::net::IpAddr;

/// Answers whether a client address is known to be abusive.
///
/// Implementations may hit the network (DNSBL, reputation APIs); the guard
/// schedules them after all local checks.
#[async_trait]
pub trait AddressReputation: Send + Sync {
    /// True when `ip` is listed.
    async fn is_listed(&self, ip: IpAddr) -> io::Result<bool>;

    /// Whether answering requires network I/O.
    fn is_remote(&self) -> bool {
        true
    }
}

/// Fixed in-memory denylist.
#[derive(Debug, Clone, Default)]
pub struct StaticDenylist {
    addresses: HashSet<IpAddr>,
}

impl StaticDenylist {
    pub fn new(addresses: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            addresses: addresses.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

#[async_trait]
impl AddressReputation for StaticDenylist {
    async fn is_listed(&self, ip: IpAddr) -> io::Result<bool> {
        Ok(self.addresses.contains(&ip))
    }

    fn is_remote(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_denylist() {
        let list = StaticDenylist::new(["203.0.113.9".parse().unwrap()]);
        assert_eq!(list.len(), 1);
        assert!(!list.is_remote());
        assert!(list.is_listed("203.0.113.9".parse().unwrap()).await.unwrap());
        assert!(!list.is_listed("203.0.113.10".parse().unwrap()).await.unwrap());
    }
}
