use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;

/// DnsResolver
///
/// The DNS collaborator contract consumed by the media manager when validating
/// submitted URLs. The trait seam lets us swap the real resolver for the mock
/// in tests without touching the manager.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Resolves a hostname to its addresses. An empty record set is reported
    /// as an error, matching "the host did not resolve to any DNS entries".
    async fn resolve(&self, hostname: &str) -> Result<Vec<IpAddr>, String>;
}

/// ResolverState
///
/// The concrete type used to share resolver access across the application state.
pub type ResolverState = Arc<dyn DnsResolver>;

/// SystemDnsResolver
///
/// The production resolver, backed by the operating system's resolver through
/// tokio's non-blocking lookup. The port is a throwaway required by the
/// lookup API; only the addresses are kept.
#[derive(Clone, Default)]
pub struct SystemDnsResolver;

#[async_trait]
impl DnsResolver for SystemDnsResolver {
    async fn resolve(&self, hostname: &str) -> Result<Vec<IpAddr>, String> {
        let addrs = tokio::net::lookup_host((hostname, 0))
            .await
            .map_err(|e| e.to_string())?;

        let ips: Vec<IpAddr> = addrs.map(|addr| addr.ip()).collect();
        if ips.is_empty() {
            return Err(format!("no DNS records for {}", hostname));
        }
        Ok(ips)
    }
}

/// MockDnsResolver
///
/// A mock resolver used in tests: either resolves every hostname to loopback,
/// or fails every lookup, depending on how it was constructed.
#[derive(Clone)]
pub struct MockDnsResolver {
    /// When true, all lookups return a simulated NXDOMAIN-style failure.
    pub should_fail: bool,
}

impl MockDnsResolver {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

impl Default for MockDnsResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DnsResolver for MockDnsResolver {
    async fn resolve(&self, hostname: &str) -> Result<Vec<IpAddr>, String> {
        if self.should_fail {
            return Err(format!("mock resolver: no DNS records for {}", hostname));
        }
        Ok(vec![IpAddr::from([127, 0, 0, 1])])
    }
}
