//! Reverse DNS lookup (PTR records) bounded by a timeout.

use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;

use futures::future::BoxFuture;
use hickory_resolver::TokioAsyncResolver;

use crate::config::REVERSE_DNS_TIMEOUT_SECS;

/// Source of PTR answers for IP targets.
///
/// Implemented for the hickory resolver; tests substitute fixed answers.
pub trait ReverseResolver: Send + Sync {
    /// First PTR name for `ip` as the resolver returned it, or `None`.
    fn lookup_ptr(&self, ip: IpAddr) -> BoxFuture<'_, Option<String>>;
}

impl ReverseResolver for TokioAsyncResolver {
    fn lookup_ptr(&self, ip: IpAddr) -> BoxFuture<'_, Option<String>> {
        Box::pin(async move {
            match self.reverse_lookup(ip).await {
                Ok(response) => response.iter().next().map(|name| name.to_utf8()),
                Err(e) => {
                    log::debug!("Reverse DNS lookup failed for {ip}: {e}");
                    None
                }
            }
        })
    }
}

/// Performs a reverse DNS lookup for `ip`.
///
/// The lookup is abandoned (its future dropped) after
/// `REVERSE_DNS_TIMEOUT_SECS`. The returned name has its trailing root dot
/// removed.
///
/// # Returns
///
/// The first PTR name, or `None` on timeout, lookup failure, or an empty answer.
pub async fn reverse_dns_lookup(ip: IpAddr, resolver: &dyn ReverseResolver) -> Option<String> {
    bounded(resolver.lookup_ptr(ip), Duration::from_secs(REVERSE_DNS_TIMEOUT_SECS), ip)
        .await
        .map(|name| trim_root_label(&name).to_string())
        .filter(|name| !name.is_empty())
}

async fn bounded<F>(lookup: F, limit: Duration, ip: IpAddr) -> Option<String>
where
    F: Future<Output = Option<String>>,
{
    match tokio::time::timeout(limit, lookup).await {
        Ok(name) => name,
        Err(_) => {
            log::debug!("Reverse DNS lookup timed out for {ip} ({}s)", limit.as_secs());
            None
        }
    }
}

/// Strips a single trailing root-label dot from a DNS name.
pub fn trim_root_label(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_root_label() {
        assert_eq!(trim_root_label("dns.google."), "dns.google");
        assert_eq!(trim_root_label("dns.google"), "dns.google");
        assert_eq!(trim_root_label("."), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_lookup_times_out() {
        let never = std::future::pending::<Option<String>>();
        let ip: IpAddr = "192.0.2.1".parse().unwrap();
        let result = bounded(never, Duration::from_secs(REVERSE_DNS_TIMEOUT_SECS), ip).await;
        assert!(result.is_none());
    }

    struct FixedPtr(Option<&'static str>);

    impl ReverseResolver for FixedPtr {
        fn lookup_ptr(&self, _ip: IpAddr) -> BoxFuture<'_, Option<String>> {
            Box::pin(async move { self.0.map(str::to_string) })
        }
    }

    #[tokio::test]
    async fn test_lookup_trims_root_label() {
        let ip: IpAddr = "192.0.2.1".parse().unwrap();
        let name = reverse_dns_lookup(ip, &FixedPtr(Some("host.example."))).await;
        assert_eq!(name.as_deref(), Some("host.example"));
    }

    #[tokio::test]
    async fn test_lookup_drops_bare_root() {
        let ip: IpAddr = "192.0.2.1".parse().unwrap();
        assert!(reverse_dns_lookup(ip, &FixedPtr(Some("."))).await.is_none());
        assert!(reverse_dns_lookup(ip, &FixedPtr(None)).await.is_none());
    }

    #[tokio::test]
    async fn test_bounded_lookup_passes_result_through() {
        let ip: IpAddr = "192.0.2.1".parse().unwrap();
        let ready = async { Some("host.example.".to_string()) };
        let result = bounded(ready, Duration::from_secs(1), ip).await;
        assert_eq!(result.as_deref(), Some("host.example."));
    }
}
