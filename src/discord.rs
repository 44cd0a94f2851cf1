//! Delivery of embeds to a Discord text channel

use crate::error::{Result, WatchError};
use crate::notify::Embed;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const API_BASE: &str = "https://discord.com/api/v10";

/// Discord channel type for a guild text channel
const GUILD_TEXT: u8 = 0;

/// Destination for announcements
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Confirm the destination exists and accepts messages
    async fn resolve_channel(&self) -> Result<()>;

    async fn send(&self, embed: &Embed) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct ChannelInfo {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateMessage<'a> {
    embeds: [&'a Embed; 1],
}

/// Bot-token REST client bound to a single channel
#[derive(Clone)]
pub struct DiscordChannel {
    api_base: String,
    channel_id: String,
    token: String,
    client: Client,
}

impl DiscordChannel {
    pub fn new(token: impl Into<String>, channel_id: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::with_api_base(API_BASE, token, channel_id, timeout)
    }

    pub fn with_api_base(
        api_base: impl Into<String>,
        token: impl Into<String>,
        channel_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(
                "DiscordBot (",
                env!("CARGO_PKG_NAME"),
                ", ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            channel_id: channel_id.into(),
            token: token.into(),
            client,
        })
    }

    fn channel_url(&self) -> String {
        format!("{}/channels/{}", self.api_base, self.channel_id)
    }

    fn auth(&self) -> String {
        format!("Bot {}", self.token)
    }
}

#[async_trait]
impl Notifier for DiscordChannel {
    async fn resolve_channel(&self) -> Result<()> {
        let resp = self
            .client
            .get(self.channel_url())
            .header(AUTHORIZATION, self.auth())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(WatchError::channel_unavailable(
                &self.channel_id,
                format!("lookup returned {}", status),
            ));
        }

        let info: ChannelInfo = resp.json().await?;
        if info.kind != GUILD_TEXT {
            return Err(WatchError::channel_unavailable(
                &self.channel_id,
                format!("channel type {} is not a text channel", info.kind),
            ));
        }

        log::debug!(
            "Resolved channel {} ({})",
            self.channel_id,
            info.name.as_deref().unwrap_or("unnamed")
        );
        Ok(())
    }

    async fn send(&self, embed: &Embed) -> Result<()> {
        let resp = self
            .client
            .post(format!("{}/messages", self.channel_url()))
            .header(AUTHORIZATION, self.auth())
            .json(&CreateMessage { embeds: [embed] })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(WatchError::send_status(status.as_u16(), body));
        }
        Ok(())
    }
}
