//! Twilio Programmable Messaging over its REST API.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;

use super::{InboundMessage, Messenger};
use crate::common::constants::*;
use crate::config::Config;

pub struct TwilioMessenger {
    client: Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    origin: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    messages: Vec<MessageRecord>,
}

#[derive(Debug, Deserialize)]
struct MessageRecord {
    sid: String,
    from: String,
    #[serde(default)]
    body: String,
    date_sent: Option<String>,
    direction: String,
}

impl TwilioMessenger {
    pub fn new(config: &Config, account_sid: String, auth_token: String, origin: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.api_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_TWILIO_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            account_sid,
            auth_token,
            origin,
        })
    }

    /// Messenger from `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN` and the
    /// configured origin number. `None` when any of them is missing.
    pub fn from_env(config: &Config) -> Result<Option<Self>> {
        let sid = std::env::var(TWILIO_SID_ENV).ok().filter(|v| !v.is_empty());
        let token = std::env::var(TWILIO_TOKEN_ENV).ok().filter(|v| !v.is_empty());

        match (sid, token, config.origin_number.clone()) {
            (Some(sid), Some(token), Some(origin)) => {
                Self::new(config, sid, token, origin).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }

    fn message_url(&self, id: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages/{}.json",
            self.api_base, self.account_sid, id
        )
    }
}

impl Messenger for TwilioMessenger {
    fn send(&self, to: &str, body: &str, media_urls: &[String]) -> Result<()> {
        let mut form: Vec<(&str, &str)> = vec![("From", self.origin.as_str()), ("To", to), ("Body", body)];
        form.extend(media_urls.iter().map(|url| ("MediaUrl", url.as_str())));

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .context("Message request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            anyhow::bail!("Twilio API error {status}: {detail}");
        }

        log_debug!("Sent text to {to} ({} media)", media_urls.len());
        Ok(())
    }

    fn fetch_inbound(&self) -> Result<Vec<InboundMessage>> {
        let response = self
            .client
            .get(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .query(&[("To", self.origin.as_str())])
            .send()
            .context("Message list request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            anyhow::bail!("Twilio API error {status}: {detail}");
        }

        let text = response.text().context("Failed to read message list")?;
        parse_message_list(&text)
    }

    fn delete(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.message_url(id))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .context("Message delete request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Twilio API error {status} deleting {id}");
        }
        Ok(())
    }
}

/// Inbound messages from a `Messages.json` listing, oldest first.
///
/// The API lists newest first and includes our own outbound texts.
fn parse_message_list(json: &str) -> Result<Vec<InboundMessage>> {
    let list: MessageList =
        serde_json::from_str(json).context("Failed to parse Twilio message list")?;

    Ok(list
        .messages
        .into_iter()
        .rev()
        .filter(|record| record.direction == "inbound")
        .map(|record| InboundMessage {
            id: record.sid,
            from: record.from,
            body: record.body,
            date_sent: record.date_sent,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const LISTING: &str = r#"{
        "messages": [
            {"sid": "SM3", "from": "+15552", "to": "+15550", "body": "status",
             "date_sent": "Thu, 09 Aug 2026 17:30:00 +0000", "direction": "inbound"},
            {"sid": "SM2", "from": "+15550", "to": "+15551", "body": "On duty",
             "date_sent": "Thu, 09 Aug 2026 17:28:00 +0000", "direction": "outbound-api"},
            {"sid": "SM1", "from": "+15551", "to": "+15550", "body": "photo",
             "date_sent": null, "direction": "inbound", "num_media": "0"}
        ],
        "page": 0
    }"#;

    #[test]
    fn test_listing_is_reversed_and_filtered() {
        let messages = parse_message_list(LISTING).unwrap();
        let ids: Vec<_> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["SM1", "SM3"]);
        assert_eq!(messages[0].from, "+15551");
        assert_eq!(messages[0].date_sent, None);
        assert_eq!(messages[1].body, "status");
    }

    #[test]
    fn test_bad_listing_is_an_error() {
        assert!(parse_message_list("<html>").is_err());
    }

    #[test]
    fn test_urls() {
        let config = Config {
            api_base: Some("https://api.example.test/".to_string()),
            ..Default::default()
        };
        let twilio =
            TwilioMessenger::new(&config, "AC123".into(), "secret".into(), "+15550".into()).unwrap();
        assert_eq!(
            twilio.messages_url(),
            "https://api.example.test/2010-04-01/Accounts/AC123/Messages.json"
        );
        assert_eq!(
            twilio.message_url("SM9"),
            "https://api.example.test/2010-04-01/Accounts/AC123/Messages/SM9.json"
        );
    }

    #[test]
    #[serial]
    fn test_from_env_requires_credentials_and_origin() {
        let saved_sid = std::env::var(TWILIO_SID_ENV).ok();
        let saved_token = std::env::var(TWILIO_TOKEN_ENV).ok();
        let with_origin = Config {
            origin_number: Some("+15550".to_string()),
            ..Default::default()
        };

        unsafe {
            std::env::remove_var(TWILIO_SID_ENV);
            std::env::remove_var(TWILIO_TOKEN_ENV);
        }
        let missing = TwilioMessenger::from_env(&with_origin).unwrap().is_none();

        unsafe {
            std::env::set_var(TWILIO_SID_ENV, "AC123");
            std::env::set_var(TWILIO_TOKEN_ENV, "secret");
        }
        let present = TwilioMessenger::from_env(&with_origin).unwrap().is_some();
        let no_origin = TwilioMessenger::from_env(&Config::default()).unwrap().is_none();

        unsafe {
            match saved_sid {
                Some(v) => std::env::set_var(TWILIO_SID_ENV, v),
                None => std::env::remove_var(TWILIO_SID_ENV),
            }
            match saved_token {
                Some(v) => std::env::set_var(TWILIO_TOKEN_ENV, v),
                None => std::env::remove_var(TWILIO_TOKEN_ENV),
            }
        }

        assert!(missing);
        assert!(present);
        assert!(no_origin);
    }
}
