use super::{bool_str, first, parse_int, require, BuiltinRegistry};
use crate::error::{ShellError, ShellResult};
use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

pub(super) fn register(r: &mut BuiltinRegistry) {
    r.register("isipv4", "Validate an IPv4 address", "isipv4 ADDR", |a: &[String]| {
        Ok(bool_str(first(a).parse::<Ipv4Addr>().is_ok()))
    });
    r.register("isipv6", "Validate an IPv6 address", "isipv6 ADDR", |a: &[String]| {
        Ok(bool_str(first(a).parse::<Ipv6Addr>().is_ok()))
    });
    r.register("ip2int", "IPv4 address to integer", "ip2int ADDR", |a: &[String]| {
        require(a, 1, "ip2int ADDR")?;
        Ok(u32::from(ipv4(&a[0])?).to_string())
    });
    r.register("int2ip", "Integer to IPv4 address", "int2ip NUMBER", |a: &[String]| {
        require(a, 1, "int2ip NUMBER")?;
        let n = u32::try_from(parse_int(&a[0])?)
            .map_err(|_| ShellError::invalid(format!("out of IPv4 range: '{}'", a[0])))?;
        Ok(Ipv4Addr::from(n).to_string())
    });
    r.register("reverseip", "Reverse the octets of an address", "reverseip ADDR", |a: &[String]| {
        require(a, 1, "reverseip ADDR")?;
        Ok(a[0].split('.').rev().collect::<Vec<_>>().join("."))
    });
    r.register("isprivate", "Check for a private address", "isprivate ADDR", |a: &[String]| {
        let private = match first(a).parse::<IpAddr>() {
            Ok(IpAddr::V4(ip)) => ip.is_private(),
            Ok(IpAddr::V6(ip)) => (ip.segments()[0] & 0xfe00) == 0xfc00,
            Err(_) => false,
        };
        Ok(bool_str(private))
    });
    r.register("nslookup", "Resolve a hostname", "nslookup HOST", |a: &[String]| {
        require(a, 1, "nslookup HOST")?;
        let addrs: BTreeSet<IpAddr> = resolve(&a[0], 0)?.into_iter().map(|s| s.ip()).collect();
        Ok(addrs.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n"))
    });
    r.register(
        "ping",
        "TCP reachability check on port 80",
        "ping HOST [TIMEOUT_SECS]",
        |a: &[String]| {
            require(a, 1, "ping HOST [TIMEOUT_SECS]")?;
            let timeout = match a.get(1) {
                Some(secs) => Duration::from_secs(u64::try_from(parse_int(secs)?).unwrap_or(0).max(1)),
                None => DEFAULT_DIAL_TIMEOUT,
            };
            let reachable = dial(&a[0], 80, timeout);
            Ok(if reachable { "reachable" } else { "unreachable" }.to_string())
        },
    );
    r.register("getport", "Check whether a TCP port is open", "getport HOST PORT", |a: &[String]| {
        require(a, 2, "getport HOST PORT")?;
        let port = u16::try_from(parse_int(&a[1])?)
            .map_err(|_| ShellError::invalid(format!("invalid port: '{}'", a[1])))?;
        let open = dial(&a[0], port, DEFAULT_DIAL_TIMEOUT);
        Ok(if open { "open" } else { "closed" }.to_string())
    });
}

fn ipv4(s: &str) -> ShellResult<Ipv4Addr> {
    s.trim()
        .parse()
        .map_err(|_| ShellError::invalid(format!("not an IPv4 address: '{s}'")))
}

fn resolve(host: &str, port: u16) -> ShellResult<Vec<SocketAddr>> {
    (host, port)
        .to_socket_addrs()
        .map(Iterator::collect)
        .map_err(|e| ShellError::invalid(format!("cannot resolve '{host}': {e}")))
}

/// Connect with a bounded timeout to the first resolved address.
fn dial(host: &str, port: u16, timeout: Duration) -> bool {
    resolve(host, port)
        .ok()
        .and_then(|addrs| addrs.into_iter().next())
        .is_some_and(|addr| TcpStream::connect_timeout(&addr, timeout).is_ok())
}

#[cfg(test)]
mod tests {
    use crate::builtins::{args, BuiltinRegistry};
    use std::net::TcpListener;

    fn run(name: &str, values: &[&str]) -> String {
        BuiltinRegistry::with_defaults()
            .execute(name, &args(values))
            .unwrap()
    }

    #[test]
    fn address_validation() {
        assert_eq!(run("isipv4", &["192.168.1.1"]), "true");
        assert_eq!(run("isipv4", &["192.168.1.256"]), "false");
        assert_eq!(run("isipv6", &["::1"]), "true");
        assert_eq!(run("isprivate", &["10.1.2.3"]), "true");
        assert_eq!(run("isprivate", &["8.8.8.8"]), "false");
        assert_eq!(run("isprivate", &["fd00::1"]), "true");
    }

    #[test]
    fn integer_conversions() {
        assert_eq!(run("ip2int", &["10.0.0.1"]), "167772161");
        assert_eq!(run("int2ip", &["167772161"]), "10.0.0.1");
        assert_eq!(run("reverseip", &["1.2.3.4"]), "4.3.2.1");
        assert!(BuiltinRegistry::with_defaults()
            .execute("int2ip", &args(&["4294967296"]))
            .is_err());
    }

    #[test]
    fn localhost_lookup_and_port_probe() {
        assert!(run("nslookup", &["127.0.0.1"]).contains("127.0.0.1"));

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port().to_string();
        assert_eq!(run("getport", &["127.0.0.1", port.as_str()]), "open");
    }
}
