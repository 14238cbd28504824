use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Returns true if a request to this address could reach internal infrastructure
///
/// Covers private, loopback, link-local and unspecified ranges for both
/// families, plus the other special-purpose IPv4 blocks no public site is
/// served from. IPv4-mapped IPv6 addresses are judged by their IPv4 part.
pub fn is_forbidden_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => is_forbidden_ipv4(ipv4),
        IpAddr::V6(ipv6) => is_forbidden_ipv6(ipv6),
    }
}

fn is_forbidden_ipv4(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();

    ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        // 0.0.0.0/8 ("this network")
        || octets[0] == 0
        // 100.64.0.0/10 (carrier-grade NAT)
        || (octets[0] == 100 && (octets[1] & 0xc0) == 64)
        // 198.18.0.0/15 (benchmarking)
        || (octets[0] == 198 && (octets[1] & 0xfe) == 18)
        // 224.0.0.0/4 multicast and 240.0.0.0/4 reserved
        || octets[0] >= 224
}

fn is_forbidden_ipv6(ip: Ipv6Addr) -> bool {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return is_forbidden_ipv4(mapped);
    }

    let first = ip.segments()[0];

    ip.is_loopback()
        || ip.is_unspecified()
        // fc00::/7 (unique local)
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 (link-local)
        || (first & 0xffc0) == 0xfe80
        // ff00::/8 (multicast)
        || (first & 0xff00) == 0xff00
}
