use conditional_dns_domain::DomainError;
use std::net::IpAddr;

/// Addresses that belong to this host.
pub trait LocalAddressSource: Send + Sync {
    fn local_addresses(&self) -> Result<Vec<IpAddr>, DomainError>;
}
