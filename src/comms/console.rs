//! Messenger that writes outbound texts to the log and never receives any.
//!
//! Used by `coopbot simulate` and whenever Twilio credentials are missing.

use anyhow::Result;

use super::{InboundMessage, Messenger};

pub struct ConsoleMessenger;

impl Messenger for ConsoleMessenger {
    fn send(&self, to: &str, body: &str, media_urls: &[String]) -> Result<()> {
        log_decorated!("Text to {to}:");
        for line in body.lines().filter(|line| !line.trim().is_empty()) {
            log_indented!("{}", line.trim());
        }
        for url in media_urls {
            log_indented!("[media] {url}");
        }
        Ok(())
    }

    fn fetch_inbound(&self) -> Result<Vec<InboundMessage>> {
        Ok(Vec::new())
    }

    fn delete(&self, _id: &str) -> Result<()> {
        Ok(())
    }
}
