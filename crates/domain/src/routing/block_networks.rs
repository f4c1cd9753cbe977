use ipnetwork::IpNetwork;
use std::net::IpAddr;

/// Networks the filtering upstream answers with when it blocks a name.
#[derive(Debug, Clone, Default)]
pub struct BlockNetworks {
    networks: Vec<IpNetwork>,
}

impl BlockNetworks {
    /// Accepts CIDR notation or bare addresses.
    pub fn parse(entries: &[String]) -> Result<Self, String> {
        let networks = entries
            .iter()
            .map(|entry| {
                entry
                    .trim()
                    .parse::<IpNetwork>()
                    .map_err(|e| format!("Invalid block network '{}': {}", entry, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { networks })
    }

    /// IPv4-mapped IPv6 addresses also match the IPv4 networks.
    pub fn contains(&self, ip: IpAddr) -> bool {
        let mapped = match ip {
            IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4),
            IpAddr::V4(_) => None,
        };
        self.networks
            .iter()
            .any(|net| net.contains(ip) || mapped.is_some_and(|v4| net.contains(v4)))
    }

    pub fn any_blocked(&self, addresses: &[IpAddr]) -> bool {
        addresses.iter().any(|ip| self.contains(*ip))
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}
