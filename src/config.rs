//! Connection and tree configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::env;

/// IMAP connection configuration
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl ImapConfig {
    /// Load IMAP configuration from environment variables
    ///
    /// Reads from `.env` file if present. Required variables:
    /// - `IMAP_USERNAME`
    /// - `IMAP_PASSWORD`
    ///
    /// Optional (with defaults):
    /// - `IMAP_HOST` (default: `127.0.0.1`)
    /// - `IMAP_PORT` (default: `143`)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            host: env::var("IMAP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("IMAP_PORT")
                .unwrap_or_else(|_| "143".to_string())
                .parse()
                .map_err(|e| Error::Config(format!("Invalid IMAP_PORT: {e}")))?,
            username: env::var("IMAP_USERNAME")
                .map_err(|_| Error::Config("IMAP_USERNAME not set".into()))?,
            password: env::var("IMAP_PASSWORD")
                .map_err(|_| Error::Config("IMAP_PASSWORD not set".into()))?,
        })
    }
}

/// Mail access protocol of the session.
///
/// POP3 sessions have no folders and no namespaces: the tree only ever
/// holds INBOX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Imap,
    Pop,
}

/// A user-defined icon for a single mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxIcon {
    pub icon: String,
    #[serde(default)]
    pub icon_dir: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub icon_open: Option<String>,
}

/// Site and session settings that shape the mailbox tree.
#[derive(Debug, Clone)]
pub struct TreeConfig {
    pub protocol: Protocol,
    /// When false, only INBOX is shown.
    pub allow_folders: bool,
    /// Session-level override forcing the show-unsubscribed view.
    pub show_unsubscribed: bool,
    /// Base directory for the stock folder icons.
    pub image_dir: String,
    /// Mailboxes the site never wants displayed.
    pub hidden: HashSet<String>,
    pub icons: HashMap<String, MailboxIcon>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::Imap,
            allow_folders: true,
            show_unsubscribed: false,
            image_dir: "themes/graphics".to_string(),
            hidden: HashSet::new(),
            icons: HashMap::new(),
        }
    }
}

impl TreeConfig {
    /// Load tree settings from environment variables
    ///
    /// All variables are optional:
    /// - `FOLDER_TREE_PROTOCOL` (`imap` or `pop`, default: `imap`)
    /// - `FOLDER_TREE_ALLOW_FOLDERS` (default: `true`)
    /// - `FOLDER_TREE_SHOW_UNSUB` (default: `false`)
    /// - `FOLDER_TREE_IMAGE_DIR` (default: `themes/graphics`)
    /// - `FOLDER_TREE_HIDDEN` (comma-separated mailbox names)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let protocol = match env::var("FOLDER_TREE_PROTOCOL") {
            Ok(value) => match value.to_ascii_lowercase().as_str() {
                "imap" => Protocol::Imap,
                "pop" | "pop3" => Protocol::Pop,
                other => {
                    return Err(Error::Config(format!(
                        "Invalid FOLDER_TREE_PROTOCOL: {other}"
                    )));
                }
            },
            Err(_) => defaults.protocol,
        };

        Ok(Self {
            protocol,
            allow_folders: env_flag("FOLDER_TREE_ALLOW_FOLDERS")?.unwrap_or(defaults.allow_folders),
            show_unsubscribed: env_flag("FOLDER_TREE_SHOW_UNSUB")?
                .unwrap_or(defaults.show_unsubscribed),
            image_dir: env::var("FOLDER_TREE_IMAGE_DIR").unwrap_or(defaults.image_dir),
            hidden: env::var("FOLDER_TREE_HIDDEN")
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            icons: HashMap::new(),
        })
    }

    /// Whether the tree holds anything beyond INBOX.
    #[must_use]
    pub fn folders_enabled(&self) -> bool {
        self.allow_folders && self.protocol == Protocol::Imap
    }
}

fn env_flag(key: &str) -> Result<Option<bool>> {
    match env::var(key) {
        Ok(value) => parse_flag(&value)
            .map(Some)
            .ok_or_else(|| Error::Config(format!("Invalid {key}: {value}"))),
        Err(_) => Ok(None),
    }
}

pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
