// src/transport.rs - Forwarding commands to the external controller
use std::io::Write;
use std::thread;
use std::time::Duration;

use serialport::{SerialPort, SerialPortType};
use tracing::{debug, info};

use crate::command::Command;
use crate::error::GestureError;

pub const DEFAULT_BAUD_RATE: u32 = 9600;

pub trait CommandSink {
    fn describe(&self) -> String;

    fn send(&mut self, command: Command) -> Result<(), GestureError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortEntry {
    pub name: String,
    pub description: String,
}

impl PortEntry {
    pub fn label(&self) -> String {
        if self.description.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.description)
        }
    }
}

/// Serial ports currently visible to the system, sorted by name.
pub fn list_ports() -> Result<Vec<PortEntry>, GestureError> {
    let mut ports: Vec<PortEntry> = serialport::available_ports()
        .map_err(GestureError::PortScan)?
        .into_iter()
        .map(|info| PortEntry {
            description: port_description(&info.port_type),
            name: info.port_name,
        })
        .collect();
    ports.sort_by(|a, b| a.name.cmp(&b.name));
    debug!("Found {} serial port(s)", ports.len());
    Ok(ports)
}

/// Keeps the configured port while it is still present, otherwise falls back
/// to the first listed one.
pub fn pick_port(ports: &[PortEntry], configured: Option<&str>) -> Option<String> {
    configured
        .filter(|name| ports.iter().any(|p| p.name == *name))
        .or_else(|| ports.first().map(|p| p.name.as_str()))
        .map(str::to_string)
}

fn port_description(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => usb
            .product
            .clone()
            .or_else(|| usb.manufacturer.clone())
            .unwrap_or_else(|| format!("USB {:04x}:{:04x}", usb.vid, usb.pid)),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::Unknown => String::new(),
    }
}

/// Writes newline-terminated command tokens to a line-oriented device.
pub struct SerialSink<W: Write> {
    port: String,
    writer: W,
}

impl SerialSink<Box<dyn SerialPort>> {
    /// Opens `port` at `baud_rate` and waits `settle` for the controller,
    /// which resets when the line opens.
    pub fn open(port: &str, baud_rate: u32, settle: Duration) -> Result<Self, GestureError> {
        let serial = serialport::new(port, baud_rate)
            .timeout(Duration::from_secs(1))
            .open()
            .map_err(|source| GestureError::PortOpen { port: port.to_string(), source })?;
        info!("Opened command port {} at {} baud", port, baud_rate);

        if !settle.is_zero() {
            thread::sleep(settle);
        }
        Ok(Self::from_writer(port, serial))
    }
}

impl<W: Write> SerialSink<W> {
    pub fn from_writer(port: impl Into<String>, writer: W) -> Self {
        Self { port: port.into(), writer }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> CommandSink for SerialSink<W> {
    fn describe(&self) -> String {
        self.port.clone()
    }

    fn send(&mut self, command: Command) -> Result<(), GestureError> {
        let port = &self.port;
        self.writer
            .write_all(command.line().as_bytes())
            .and_then(|_| self.writer.flush())
            .map_err(|source| GestureError::Transport { port: port.clone(), source })
    }
}

/// Sink used when no controller is attached; commands only reach the log.
#[derive(Debug, Default)]
pub struct LogSink;

impl CommandSink for LogSink {
    fn describe(&self) -> String {
        "log".to_string()
    }

    fn send(&mut self, command: Command) -> Result<(), GestureError> {
        info!("Command {} ({})", command.token(), command.description());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_one_line_per_command() {
        let mut sink = SerialSink::from_writer("test", Vec::new());
        sink.send(Command::On).unwrap();
        sink.send(Command::Close).unwrap();
        sink.send(Command::Open).unwrap();
        assert_eq!(sink.into_inner(), b"ON\nC\nO\n".to_vec());
    }

    #[test]
    fn write_failure_names_the_port() {
        let mut sink = SerialSink::from_writer("/dev/ttyACM0", BrokenPipe);
        let err = sink.send(Command::Off).unwrap_err();
        assert!(matches!(err, GestureError::Transport { ref port, .. } if port == "/dev/ttyACM0"));
        assert!(err.to_string().contains("/dev/ttyACM0"));
    }

    #[test]
    fn missing_device_fails_to_open() {
        let err = SerialSink::open("/nonexistent/dir/ttyGesture", DEFAULT_BAUD_RATE, Duration::ZERO)
            .err()
            .expect("opening a missing device must fail");
        assert!(matches!(err, GestureError::PortOpen { ref port, .. } if port == "/nonexistent/dir/ttyGesture"));
    }

    #[test]
    fn port_labels() {
        let usb = PortEntry { name: "/dev/ttyACM0".into(), description: "Arduino Uno".into() };
        assert_eq!(usb.label(), "/dev/ttyACM0 (Arduino Uno)");
        let bare = PortEntry { name: "/dev/ttyS0".into(), description: String::new() };
        assert_eq!(bare.label(), "/dev/ttyS0");
    }

    #[test]
    fn configured_port_wins_while_present() {
        let ports = vec![
            PortEntry { name: "/dev/ttyACM0".into(), description: String::new() },
            PortEntry { name: "/dev/ttyUSB0".into(), description: String::new() },
        ];
        assert_eq!(pick_port(&ports, Some("/dev/ttyUSB0")).as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(pick_port(&ports, Some("/dev/ttyS9")).as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(pick_port(&ports, None).as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(pick_port(&[], Some("/dev/ttyACM0")), None);
    }

    #[test]
    fn usb_ports_fall_back_to_ids() {
        let info = serialport::UsbPortInfo {
            vid: 0x2341,
            pid: 0x0043,
            serial_number: None,
            manufacturer: None,
            product: None,
        };
        assert_eq!(port_description(&SerialPortType::UsbPort(info)), "USB 2341:0043");
        assert_eq!(port_description(&SerialPortType::Unknown), "");
    }

    #[test]
    fn log_sink_accepts_everything() {
        let mut sink = LogSink;
        assert!(sink.send(Command::Off).is_ok());
        assert_eq!(sink.describe(), "log");
    }
}
