//! 客户端 IP 提取
//!
//! 默认使用 TCP 对端地址；只有对端命中 `trusted_proxies`（单 IP 或 CIDR）时
//! 才信任 X-Forwarded-For / Forwarded 头。

use std::net::{IpAddr, SocketAddr};

use actix_web::dev::ConnectionInfo;

/// 解析 `ip` 或 `ip:port`
fn parse_ip(raw: &str) -> Option<IpAddr> {
    raw.parse::<SocketAddr>()
        .map(|s| s.ip())
        .or_else(|_| raw.parse::<IpAddr>())
        .ok()
}

/// 检查 IP 是否在可信代理列表中
pub fn is_trusted_proxy(ip: &str, trusted_proxies: &[String]) -> bool {
    let Some(ip_addr) = parse_ip(ip) else {
        return false;
    };

    trusted_proxies.iter().any(|proxy| {
        if proxy.contains('/') {
            ip_in_cidr(&ip_addr, proxy)
        } else {
            proxy.parse::<IpAddr>().is_ok_and(|p| p == ip_addr)
        }
    })
}

/// CIDR 检查
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix_len)) = cidr.split_once('/') else {
        return false;
    };
    let Ok(prefix_len) = prefix_len.parse::<u32>() else {
        return false;
    };
    let Ok(network_addr) = network.parse::<IpAddr>() else {
        return false;
    };

    match (ip, network_addr) {
        (IpAddr::V4(ip), IpAddr::V4(net)) if prefix_len <= 32 => {
            let mask = u32::MAX.checked_shl(32 - prefix_len).unwrap_or(0);
            (u32::from(*ip) & mask) == (u32::from(net) & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) if prefix_len <= 128 => {
            let mask = u128::MAX.checked_shl(128 - prefix_len).unwrap_or(0);
            (u128::from(*ip) & mask) == (u128::from(net) & mask)
        }
        _ => false,
    }
}

/// 选出用于限流的客户端地址
pub fn client_ip(conn_info: &ConnectionInfo, trusted_proxies: &[String]) -> Option<String> {
    let peer = conn_info.peer_addr()?;
    let peer_ip = parse_ip(peer).map(|ip| ip.to_string()).unwrap_or_else(|| peer.to_string());

    if !trusted_proxies.is_empty() && is_trusted_proxy(peer, trusted_proxies) {
        let forwarded = conn_info
            .realip_remote_addr()
            .and_then(parse_ip)
            .map(|ip| ip.to_string());
        return Some(forwarded.unwrap_or(peer_ip));
    }
    Some(peer_ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn trusted(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cidr_matching() {
        let ip: IpAddr = "10.1.2.3".parse().unwrap();
        assert!(ip_in_cidr(&ip, "10.0.0.0/8"));
        assert!(!ip_in_cidr(&ip, "192.168.0.0/16"));
        assert!(ip_in_cidr(&ip, "0.0.0.0/0"));
        assert!(!ip_in_cidr(&ip, "10.0.0.0/33"));

        let v6: IpAddr = "fd00::1".parse().unwrap();
        assert!(ip_in_cidr(&v6, "fc00::/7"));
        assert!(!ip_in_cidr(&v6, "10.0.0.0/8"));
    }

    #[test]
    fn test_trusted_proxy_accepts_port_suffix() {
        let proxies = trusted(&["127.0.0.1", "172.16.0.0/12"]);
        assert!(is_trusted_proxy("127.0.0.1:5000", &proxies));
        assert!(is_trusted_proxy("172.20.1.1", &proxies));
        assert!(!is_trusted_proxy("8.8.8.8", &proxies));
        assert!(!is_trusted_proxy("garbage", &proxies));
    }

    #[test]
    fn test_client_ip_ignores_forwarded_from_untrusted_peer() {
        let req = TestRequest::default()
            .peer_addr("203.0.113.9:4000".parse().unwrap())
            .insert_header(("X-Forwarded-For", "1.2.3.4"))
            .to_http_request();

        let ip = client_ip(&req.connection_info(), &[]);
        assert_eq!(ip.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn test_client_ip_uses_forwarded_from_trusted_proxy() {
        let req = TestRequest::default()
            .peer_addr("10.0.0.5:4000".parse().unwrap())
            .insert_header(("X-Forwarded-For", "1.2.3.4"))
            .to_http_request();

        let ip = client_ip(&req.connection_info(), &trusted(&["10.0.0.0/8"]));
        assert_eq!(ip.as_deref(), Some("1.2.3.4"));
    }
}
