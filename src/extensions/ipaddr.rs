//! The `ipaddr` extension type: an IPv4 or IPv6 address with a prefix length.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::net::{IpAddr as StdIpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An address plus prefix. A bare address is a single-host range (`/32` or `/128`).
///
/// Host bits are kept as written, so `10.0.0.1/24` and `10.0.0.0/24` are
/// different values that cover the same range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IpAddr {
    addr: StdIpAddr,
    prefix: u8,
}

const LOOPBACK_V4: IpAddr = IpAddr {
    addr: StdIpAddr::V4(Ipv4Addr::new(127, 0, 0, 0)),
    prefix: 8,
};
const LOOPBACK_V6: IpAddr = IpAddr {
    addr: StdIpAddr::V6(Ipv6Addr::LOCALHOST),
    prefix: 128,
};
const MULTICAST_V4: IpAddr = IpAddr {
    addr: StdIpAddr::V4(Ipv4Addr::new(224, 0, 0, 0)),
    prefix: 4,
};
const MULTICAST_V6: IpAddr = IpAddr {
    addr: StdIpAddr::V6(Ipv6Addr::new(0xff00, 0, 0, 0, 0, 0, 0, 0)),
    prefix: 8,
};

impl IpAddr {
    pub fn addr(&self) -> StdIpAddr {
        self.addr
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn is_ipv4(&self) -> bool {
        self.addr.is_ipv4()
    }

    pub fn is_ipv6(&self) -> bool {
        self.addr.is_ipv6()
    }

    pub fn is_loopback(&self) -> bool {
        self.is_in_range(&LOOPBACK_V4) || self.is_in_range(&LOOPBACK_V6)
    }

    pub fn is_multicast(&self) -> bool {
        self.is_in_range(&MULTICAST_V4) || self.is_in_range(&MULTICAST_V6)
    }

    /// True if every address covered by `self` is covered by `range`.
    /// Ranges of different address families never contain each other.
    pub fn is_in_range(&self, range: &IpAddr) -> bool {
        if self.is_ipv4() != range.is_ipv4() || self.prefix < range.prefix {
            return false;
        }
        let width = self.width();
        network(self.bits(), width, range.prefix) == network(range.bits(), width, range.prefix)
    }

    fn width(&self) -> u8 {
        match self.addr {
            StdIpAddr::V4(_) => 32,
            StdIpAddr::V6(_) => 128,
        }
    }

    fn bits(&self) -> u128 {
        match self.addr {
            StdIpAddr::V4(v4) => u128::from(u32::from(v4)),
            StdIpAddr::V6(v6) => u128::from(v6),
        }
    }
}

fn network(bits: u128, width: u8, prefix: u8) -> u128 {
    if prefix == 0 {
        0
    } else {
        bits >> (width - prefix)
    }
}

impl FromStr for IpAddr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_part, prefix_part) = match s.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (s, None),
        };

        let addr: StdIpAddr = addr_part
            .parse()
            .map_err(|_| format!("invalid IP address `{s}`"))?;
        let width = match addr {
            StdIpAddr::V4(_) => 32,
            StdIpAddr::V6(_) => 128,
        };

        let prefix = match prefix_part {
            None => width,
            Some(p) if !p.is_empty() && p.len() <= 3 && p.bytes().all(|b| b.is_ascii_digit()) => {
                let prefix: u8 = p.parse().map_err(|_| format!("invalid prefix in `{s}`"))?;
                if prefix > width {
                    return Err(format!("prefix /{prefix} is too long for `{addr_part}`"));
                }
                prefix
            }
            Some(_) => return Err(format!("invalid prefix in `{s}`")),
        };

        Ok(IpAddr { addr, prefix })
    }
}

impl Display for IpAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.prefix == self.width() {
            write!(f, "{}", self.addr)
        } else {
            write!(f, "{}/{}", self.addr, self.prefix)
        }
    }
}
