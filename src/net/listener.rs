//! TCP listener binding with port fallback.
//!
//! # Responsibilities
//! - Bind to the configured host and port
//! - On `AddrInUse`, warn and try the next port
//! - Any other bind failure is returned as fatal

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpListener;

use crate::config::ListenerConfig;
use crate::error::ListenError;

/// Bind `host:port`, moving to the next port while the address is in use.
///
/// At most `attempts` ports are tried. Port 0 asks the OS for any free port.
pub async fn bind_with_retry(host: &str, port: u16, attempts: u16) -> Result<TcpListener, ListenError> {
    let ip: IpAddr = host
        .parse()
        .map_err(|_| ListenError::InvalidAddress(host.to_string()))?;

    let mut port = port;
    let first = port;
    for attempt in 1..=attempts.max(1) {
        let addr = SocketAddr::new(ip, port);
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                if port != first {
                    tracing::info!(address = %addr, first_port = first, "Bound to fallback port");
                }
                return Ok(listener);
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse && port != 0 => {
                let Some(next) = port.checked_add(1) else {
                    break;
                };
                tracing::warn!(port, next, attempt, "Port already in use, trying next port");
                port = next;
            }
            Err(source) => {
                return Err(ListenError::Bind {
                    addr: addr.to_string(),
                    source,
                });
            }
        }
    }

    Err(ListenError::Exhausted { first, last: port })
}

/// Bind according to the listener config, with `port` overriding it.
pub async fn bind(config: &ListenerConfig, port: Option<u16>) -> Result<TcpListener, ListenError> {
    bind_with_retry(
        &config.host,
        port.unwrap_or(config.port),
        config.max_port_attempts,
    )
    .await
}
