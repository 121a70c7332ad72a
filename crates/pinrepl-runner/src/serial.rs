//! Serial port link.

use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

use pinrepl_protocol::Link;
use serialport::{ClearBuffer, SerialPort, SerialPortType};
use tracing::{debug, info};

use crate::config::RunnerConfig;
use crate::error::{RunnerError, RunnerResult};

/// Substrings that mark a likely microcontroller port.
pub const PREFERRED_PORT_MARKERS: &[&str] = &["ACM", "USB", "COM"];

/// An open serial port speaking the pin protocol.
///
/// The port closes when the link is dropped.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    /// Read timeout currently set on the port.
    timeout: Duration,
}

impl SerialLink {
    /// Open `name`, discard stale bytes and wait for the board to settle.
    ///
    /// Opening the port resets most boards; nothing is sent until the
    /// settle delay has passed.
    pub fn open(name: &str, config: &RunnerConfig) -> RunnerResult<Self> {
        let timeout = config.open_timeout();
        let port = serialport::new(name, config.baud).timeout(timeout).open()?;
        let mut link = SerialLink { port, timeout };
        link.clear_buffers()?;

        info!("opened {} at {} baud", name, config.baud);
        let settle = config.settle_delay();
        if !settle.is_zero() {
            debug!("waiting {:?} for the board to settle", settle);
            thread::sleep(settle);
        }
        Ok(link)
    }
}

impl Link for SerialLink {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)?;
        self.port.flush()
    }

    fn read_byte(&mut self, timeout: Duration) -> io::Result<Option<u8>> {
        if timeout != self.timeout {
            self.port.set_timeout(timeout)?;
            self.timeout = timeout;
        }

        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn clear_buffers(&mut self) -> io::Result<()> {
        self.port.clear(ClearBuffer::All)?;
        Ok(())
    }
}

/// A port found on the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortEntry {
    pub name: String,
    pub description: String,
}

/// Enumerate serial ports.
pub fn list_ports() -> RunnerResult<Vec<PortEntry>> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|port| PortEntry {
            description: describe(&port.port_type),
            name: port.port_name,
        })
        .collect())
}

/// Pick the first available port that looks like a board.
pub fn detect_port() -> RunnerResult<String> {
    let names: Vec<String> = list_ports()?.into_iter().map(|port| port.name).collect();
    let port = select_port(&names).ok_or(RunnerError::NoPorts)?;
    info!("auto-detected port {}", port);
    Ok(port.to_string())
}

/// Prefer names containing a [`PREFERRED_PORT_MARKERS`] entry, else the
/// first name.
pub fn select_port(names: &[String]) -> Option<&str> {
    names
        .iter()
        .find(|name| PREFERRED_PORT_MARKERS.iter().any(|marker| name.contains(marker)))
        .or_else(|| names.first())
        .map(String::as_str)
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let product = usb.product.as_deref().unwrap_or("USB serial");
            format!("{} ({:04x}:{:04x})", product, usb.vid, usb.pid)
        }
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::Unknown => "unknown".to_string(),
    }
}
