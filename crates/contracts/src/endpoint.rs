//! Syslog collector address, `scheme://address`

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::ContractError;

/// Where a syslog collector listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyslogEndpoint {
    /// `udp://host:port`
    Udp(String),
    /// `tcp://host:port`, newline-framed
    Tcp(String),
    /// `unix:///path`, datagram socket
    Unix(PathBuf),
}

impl FromStr for SyslogEndpoint {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| ContractError::invalid_endpoint(s, "no scheme (udp://, tcp://, unix://)"))?;
        if rest.is_empty() {
            return Err(ContractError::invalid_endpoint(s, "no address"));
        }

        match scheme {
            "udp" | "tcp" if !rest.contains(':') => {
                Err(ContractError::invalid_endpoint(s, "missing a port"))
            }
            "udp" => Ok(Self::Udp(rest.to_string())),
            "tcp" => Ok(Self::Tcp(rest.to_string())),
            "unix" => Ok(Self::Unix(PathBuf::from(rest))),
            other => Err(ContractError::invalid_endpoint(
                s,
                format!("unsupported scheme '{other}', expected one of udp, tcp, unix"),
            )),
        }
    }
}

impl fmt::Display for SyslogEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Udp(addr) => write!(f, "udp://{addr}"),
            Self::Tcp(addr) => write!(f, "tcp://{addr}"),
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}
