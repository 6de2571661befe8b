//! Free-port discovery for listener integration tests.

use crate::error::{Result, TestSupportError};
use std::net::{TcpListener, UdpSocket};

/// Asks the OS for an unused TCP port by binding to port 0 and reading it
/// back, then immediately releasing it.
///
/// Racy in the general case (another process can grab the port before the
/// caller rebinds it), but good enough for single-threaded test runs
/// against `127.0.0.1`.
///
/// # Errors
///
/// Returns [`TestSupportError::NoFreePort`] if the bind itself fails.
pub fn free_tcp_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|e| TestSupportError::NoFreePort(e.to_string()))?;
    listener
        .local_addr()
        .map(|addr| addr.port())
        .map_err(|e| TestSupportError::NoFreePort(e.to_string()))
}

/// As [`free_tcp_port`], for UDP (used by DNS listener tests).
///
/// # Errors
///
/// Returns [`TestSupportError::NoFreePort`] if the bind itself fails.
pub fn free_udp_port() -> Result<u16> {
    let socket = UdpSocket::bind("127.0.0.1:0")
        .map_err(|e| TestSupportError::NoFreePort(e.to_string()))?;
    socket
        .local_addr()
        .map(|addr| addr.port())
        .map_err(|e| TestSupportError::NoFreePort(e.to_string()))
}
