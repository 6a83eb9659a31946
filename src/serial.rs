// Copyright (C) 2026 Brian Johnson
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use std::io::{Read, Write};
use std::time::Duration;
use serialport::{ClearBuffer, DataBits, Parity, SerialPort as SerialPortTrait, StopBits};

// ============================================================================
// SerialPort Trait
// ============================================================================

/// Trait for the byte transport a pump chain runs over
pub trait SerialPort: Send {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()>;

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> std::io::Result<usize>;

    /// Drop anything buffered in either direction.
    fn clear(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Real Serial Port Implementation
// ============================================================================

/// Real serial port implementation that wraps the serialport crate
pub struct RealSerialPort {
    port: Box<dyn SerialPortTrait>,
}

impl RealSerialPort {
    pub fn open(
        port_name: &str,
        baud_rate: u32,
        data_bits: DataBits,
        parity: Parity,
        stop_bits: StopBits,
        timeout: Duration,
    ) -> Result<Self, serialport::Error> {
        let port = serialport::new(port_name, baud_rate)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(stop_bits)
            .flow_control(serialport::FlowControl::None)
            .timeout(timeout)
            .open()?;

        Ok(RealSerialPort { port })
    }
}

impl SerialPort for RealSerialPort {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.port.write_all(buf)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> std::io::Result<usize> {
        self.port.set_timeout(timeout)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        self.port.read(buf)
    }

    fn clear(&mut self) -> std::io::Result<()> {
        self.port.clear(ClearBuffer::All)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

// ============================================================================
// Mock Serial Port for Testing
// ============================================================================

#[cfg(test)]
pub struct MockSerialPort {
    // Reply chunks, at most one handed out per read (None = timeout)
    replies: Vec<Option<Vec<u8>>>,
    reply_idx: usize,
    chunk_pos: usize,
    // Track what was written
    write_log: Vec<u8>,
    // Expected writes for verification
    expected_writes: Vec<u8>,
}

#[cfg(test)]
impl MockSerialPort {
    pub fn new(replies: Vec<Option<Vec<u8>>>, expected_writes: Vec<u8>) -> Self {
        MockSerialPort {
            replies,
            reply_idx: 0,
            chunk_pos: 0,
            write_log: Vec::new(),
            expected_writes,
        }
    }

    /// One reply per command; the expected writes are concatenated.
    pub fn script(replies: &[&str], expected_writes: &[&str]) -> Self {
        MockSerialPort::new(
            replies.iter().map(|r| Some(r.as_bytes().to_vec())).collect(),
            expected_writes.concat().into_bytes(),
        )
    }
}

#[cfg(test)]
impl SerialPort for MockSerialPort {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.write_log.extend_from_slice(buf);
        Ok(())
    }

    fn read_timeout(&mut self, buf: &mut [u8], _timeout: Duration) -> std::io::Result<usize> {
        // Out of replies = timeout
        let Some(chunk) = self.replies.get(self.reply_idx) else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Mock timeout"
            ));
        };

        let Some(bytes) = chunk else {
            self.reply_idx += 1;
            return Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Mock timeout"
            ));
        };

        let remaining = &bytes[self.chunk_pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.chunk_pos += n;

        if self.chunk_pos >= bytes.len() {
            self.reply_idx += 1;
            self.chunk_pos = 0;
        }

        Ok(n)
    }
}

#[cfg(test)]
impl Drop for MockSerialPort {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }

        assert_eq!(
            self.reply_idx,
            self.replies.len(),
            "MockSerialPort dropped with {} unconsumed replies",
            self.replies.len() - self.reply_idx
        );

        assert_eq!(
            String::from_utf8_lossy(&self.write_log),
            String::from_utf8_lossy(&self.expected_writes),
            "MockSerialPort write log mismatch!"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_hands_out_one_reply_per_read() {
        let mut mock = MockSerialPort::script(&["\r\n01:", "\r\n01>"], &[]);
        let mut buf = [0u8; 64];

        let n = mock.read_timeout(&mut buf, Duration::from_millis(10)).unwrap();
        assert_eq!(&buf[..n], b"\r\n01:");

        let n = mock.read_timeout(&mut buf, Duration::from_millis(10)).unwrap();
        assert_eq!(&buf[..n], b"\r\n01>");
    }

    #[test]
    fn test_mock_splits_long_reply_across_reads() {
        let mut mock = MockSerialPort::script(&["\r\n12.20 ml/hr\r\n01:"], &[]);
        let mut buf = [0u8; 4];
        let mut collected = Vec::new();

        while collected.len() < 18 {
            let n = mock.read_timeout(&mut buf, Duration::from_millis(10)).unwrap();
            collected.extend_from_slice(&buf[..n]);
        }

        assert_eq!(collected, b"\r\n12.20 ml/hr\r\n01:");
    }

    #[test]
    fn test_mock_timeout_marker() {
        let mut mock = MockSerialPort::new(vec![None], Vec::new());
        let mut buf = [0u8; 8];

        let err = mock.read_timeout(&mut buf, Duration::from_millis(10)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::TimedOut);
    }
}
