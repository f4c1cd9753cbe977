use conditional_dns_application::ports::LocalAddressSource;
use conditional_dns_domain::DomainError;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::debug;

/// The host's interface addresses, plus any configured extras.
pub struct InterfaceAddresses {
    extra: Vec<IpAddr>,
}

impl InterfaceAddresses {
    pub fn new(extra_addresses: &[String]) -> Result<Self, DomainError> {
        let extra = extra_addresses
            .iter()
            .map(|raw| {
                raw.trim().parse::<IpAddr>().map_err(|_| {
                    DomainError::InvalidRoutingConfig(format!("Invalid local address '{}'", raw))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { extra })
    }
}

impl LocalAddressSource for InterfaceAddresses {
    fn local_addresses(&self) -> Result<Vec<IpAddr>, DomainError> {
        let mut addresses =
            interface_addresses().map_err(|e| DomainError::IoError(e.to_string()))?;

        for ip in &self.extra {
            if !addresses.contains(ip) {
                addresses.push(*ip);
            }
        }

        debug!(count = addresses.len(), "Discovered local addresses");
        Ok(addresses)
    }
}

/// Every IPv4 and IPv6 address assigned to a local interface.
pub fn interface_addresses() -> io::Result<Vec<IpAddr>> {
    let mut head: *mut libc::ifaddrs = std::ptr::null_mut();

    // SAFETY: on success `head` points to a list owned by libc until freeifaddrs.
    if unsafe { libc::getifaddrs(&mut head) } != 0 {
        return Err(io::Error::last_os_error());
    }

    let mut addresses = Vec::new();
    let mut cursor = head;

    while !cursor.is_null() {
        // SAFETY: `cursor` is a non-null node of the list returned above.
        let ifa = unsafe { &*cursor };
        if let Some(ip) = unsafe { sockaddr_to_ip(ifa.ifa_addr) } {
            if !addresses.contains(&ip) {
                addresses.push(ip);
            }
        }
        cursor = ifa.ifa_next;
    }

    // SAFETY: `head` came from getifaddrs and is freed exactly once.
    unsafe { libc::freeifaddrs(head) };

    Ok(addresses)
}

/// # Safety
/// `addr` must be null or point to a valid `sockaddr` of its declared family.
unsafe fn sockaddr_to_ip(addr: *const libc::sockaddr) -> Option<IpAddr> {
    if addr.is_null() {
        return None;
    }

    match i32::from((*addr).sa_family) {
        libc::AF_INET => {
            let sin = &*(addr as *const libc::sockaddr_in);
            Some(IpAddr::V4(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr))))
        }
        libc::AF_INET6 => {
            let sin6 = &*(addr as *const libc::sockaddr_in6);
            Some(IpAddr::V6(Ipv6Addr::from(sin6.sin6_addr.s6_addr)))
        }
        _ => None,
    }
}
