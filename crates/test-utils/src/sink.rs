use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cxxrun::exec::ConsoleSink;

/// Sink that records every byte it receives.
#[derive(Clone, Default)]
pub struct MemorySink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.buf.lock().unwrap().clone()
    }

    /// Everything received so far, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes()).into_owned()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.text().contains(needle)
    }

    /// Poll until `needle` shows up. Wrap in `with_timeout`.
    pub async fn wait_for_text(&self, needle: &str) {
        while !self.contains(needle) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl ConsoleSink for MemorySink {
    fn write_chunk(&self, bytes: &[u8]) -> io::Result<()> {
        self.buf.lock().unwrap().extend_from_slice(bytes);
        Ok(())
    }
}

/// Sink whose every write fails, for exercising drain errors.
#[derive(Clone, Copy, Default)]
pub struct FailingSink;

impl ConsoleSink for FailingSink {
    fn write_chunk(&self, _bytes: &[u8]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "console went away"))
    }
}
