//! Text messaging with the coop keepers.
//!
//! Outbound texts go to every number on the allow-list, wrapped in the
//! configured prefix and postfix. Inbound texts are polled, deleted at the
//! provider so each is handled once, filtered to the allow-list and reduced
//! to a [`Command`].

pub mod console;
pub mod twilio;

use anyhow::{Context, Result};
use regex::RegexSet;

use crate::common::constants::*;
use crate::config::Config;
pub use console::ConsoleMessenger;
pub use twilio::TwilioMessenger;

/// Recognised command words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Help,
    Photo,
    Close,
    Open,
    Status,
    Door,
    Light,
    Camera,
}

/// Matching order matters: "close the door" is a close, not a door report.
const KEYWORD_PATTERNS: [(Keyword, &str); 8] = [
    (Keyword::Help, r"(?i)help"),
    (Keyword::Photo, r"(?i)photo|image|picture"),
    (Keyword::Close, r"(?i)close"),
    (Keyword::Open, r"(?i)open"),
    (Keyword::Status, r"(?i)status|report"),
    (Keyword::Door, r"(?i)door"),
    (Keyword::Light, r"(?i)sun|light"),
    (Keyword::Camera, r"(?i)cam"),
];

pub const HELP_TEXT: &str = "Text me one of these words: \
    PHOTO for pictures of the coop, \
    OPEN or CLOSE to move the doors, \
    STATUS for a full report, \
    DOOR, LIGHT or CAM for part of it, \
    HELP for this message. ";

/// An inbound command, reduced to who sent it and what they asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub sender: String,
    pub keyword: Option<Keyword>,
}

/// A message as returned by the provider, before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: String,
    pub from: String,
    pub body: String,
    pub date_sent: Option<String>,
}

/// Transport for texts.
#[cfg_attr(test, mockall::automock)]
pub trait Messenger {
    fn send(&self, to: &str, body: &str, media_urls: &[String]) -> Result<()>;

    /// Messages addressed to us, oldest first.
    fn fetch_inbound(&self) -> Result<Vec<InboundMessage>>;

    fn delete(&self, id: &str) -> Result<()>;
}

pub struct Comms {
    messenger: Box<dyn Messenger>,
    recipients: Vec<String>,
    prefix: String,
    postfix: String,
    keywords: RegexSet,
}

impl Comms {
    pub fn new(config: &Config, messenger: Box<dyn Messenger>) -> Result<Self> {
        let keywords = RegexSet::new(KEYWORD_PATTERNS.iter().map(|(_, pattern)| *pattern))
            .context("Failed to compile command keywords")?;

        Ok(Self {
            messenger,
            recipients: config.recipients().to_vec(),
            prefix: config
                .message_prefix
                .clone()
                .unwrap_or_else(|| DEFAULT_MESSAGE_PREFIX.to_string()),
            postfix: config
                .message_postfix
                .clone()
                .unwrap_or_else(|| DEFAULT_MESSAGE_POSTFIX.to_string()),
            keywords,
        })
    }

    /// Twilio when credentials are present, otherwise the console.
    pub fn connect(config: &Config, simulated: bool) -> Result<Self> {
        if simulated {
            return Self::console(config);
        }

        match TwilioMessenger::from_env(config)? {
            Some(twilio) => {
                log_decorated!("Texting {} recipient(s) through Twilio", config.recipients().len());
                Self::new(config, Box::new(twilio))
            }
            None => {
                log_warning!("Twilio credentials or origin number missing");
                log_indented!(
                    "Set {TWILIO_SID_ENV}, {TWILIO_TOKEN_ENV} and origin_number to send texts"
                );
                log_indented!("Messages will be written to the log instead");
                Self::console(config)
            }
        }
    }

    /// Log-only comms. Without configured recipients texts go to `console`.
    fn console(config: &Config) -> Result<Self> {
        let mut comms = Self::new(config, Box::new(ConsoleMessenger))?;
        if comms.recipients.is_empty() {
            comms.recipients.push(CONSOLE_RECIPIENT.to_string());
        }
        Ok(comms)
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn send_text(&self, text: &str) {
        self.broadcast(text, &[]);
    }

    pub fn send_text_and_photos(&self, text: &str, media_urls: &[String]) {
        self.broadcast(text, media_urls);
    }

    /// Reply to a single sender.
    pub fn reply(&self, to: &str, text: &str, media_urls: &[String]) -> Result<()> {
        let body = self.wrap(text);
        self.messenger
            .send(to, &body, media_urls)
            .with_context(|| format!("Failed to text {to}"))
    }

    /// Poll, delete and parse inbound messages from the allow-list.
    pub fn check_for_commands(&self) -> Vec<Command> {
        let messages = match self.messenger.fetch_inbound() {
            Ok(messages) => messages,
            Err(e) => {
                log_warning!("Failed to check for messages: {e:#}");
                return Vec::new();
            }
        };

        let mut commands = Vec::new();
        for message in messages {
            if let Err(e) = self.messenger.delete(&message.id) {
                log_warning!("Failed to delete message {}: {e:#}", message.id);
            }

            if !self.recipients.iter().any(|number| number == &message.from) {
                log_info!("Ignoring message from unknown number {}", message.from);
                continue;
            }

            let keyword = self.parse_keyword(&message.body);
            log_info!("{}", describe_inbound(&message, keyword));
            commands.push(Command {
                sender: message.from,
                keyword,
            });
        }
        commands
    }

    /// First keyword found in `body`, in vocabulary order.
    pub fn parse_keyword(&self, body: &str) -> Option<Keyword> {
        self.keywords
            .matches(body)
            .iter()
            .next()
            .map(|index| KEYWORD_PATTERNS[index].0)
    }

    fn broadcast(&self, text: &str, media_urls: &[String]) {
        let body = self.wrap(text);
        for number in &self.recipients {
            if let Err(e) = self.messenger.send(number, &body, media_urls) {
                log_warning!("Failed to text {number}: {e:#}");
            }
        }
    }

    fn wrap(&self, text: &str) -> String {
        format!("{}{}{}", self.prefix, text, self.postfix)
    }
}

/// Log line for an accepted inbound message.
fn describe_inbound(message: &InboundMessage, keyword: Option<Keyword>) -> String {
    let keyword = keyword.map_or("unrecognised".to_string(), |k| format!("{k:?}"));
    match message.date_sent.as_deref() {
        Some(sent) => format!(
            "Message from {} sent {sent}: {:?} ({keyword})",
            message.from, message.body
        ),
        None => format!("Message from {}: {:?} ({keyword})", message.from, message.body),
    }
}
