use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::net::IpAddr;

/// Hostname resolution used by the address check
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolves `host` to the addresses a connection to `host:port` would use
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the operating system (tokio's `lookup_host`)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, port)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// Resolver answering from a fixed table
///
/// Hosts missing from the table resolve to the fallback addresses, or fail
/// when no fallback is set.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    entries: HashMap<String, Vec<IpAddr>>,
    fallback: Vec<IpAddr>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves every host to `addr`
    pub fn always(addr: IpAddr) -> Self {
        Self {
            entries: HashMap::new(),
            fallback: vec![addr],
        }
    }

    pub fn with_host(mut self, host: &str, addrs: Vec<IpAddr>) -> Self {
        self.entries.insert(host.to_lowercase(), addrs);
        self
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve(&self, host: &str, _port: u16) -> io::Result<Vec<IpAddr>> {
        let addrs = self
            .entries
            .get(&host.to_lowercase())
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());

        if addrs.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no address for {}", host),
            ));
        }
        Ok(addrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_system_resolver_handles_ip_literals() {
        let addrs = SystemResolver.resolve("127.0.0.1", 80).await.unwrap();
        assert_eq!(addrs, vec!["127.0.0.1".parse::<IpAddr>().unwrap()]);
    }

    #[tokio::test]
    async fn test_static_resolver_table_and_fallback() {
        let resolver = StaticResolver::always("93.184.216.34".parse().unwrap())
            .with_host("intranet.example", vec!["10.0.0.5".parse().unwrap()]);

        let internal = resolver.resolve("INTRANET.example", 443).await.unwrap();
        assert_eq!(internal, vec!["10.0.0.5".parse::<IpAddr>().unwrap()]);

        let other = resolver.resolve("shop.example", 443).await.unwrap();
        assert_eq!(other, vec!["93.184.216.34".parse::<IpAddr>().unwrap()]);
    }

    #[tokio::test]
    async fn test_static_resolver_without_entry_fails() {
        let resolver = StaticResolver::new();
        assert!(resolver.resolve("nowhere.example", 80).await.is_err());
    }
}
