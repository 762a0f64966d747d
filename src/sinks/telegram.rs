//! Telegram bot notifications.

use super::{NotificationSink, ensure_success, transport_error};
use crate::error::SinkError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

pub const TELEGRAM_API: &str = "https://api.telegram.org";

const SERVICE: &str = "telegram";

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct Reply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends HTML messages to one chat through the Bot API.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(client: Client, bot_token: &str, chat_id: &str) -> Self {
        Self {
            client,
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
        }
    }

    fn payload<'a>(&'a self, html: &'a str) -> SendMessage<'a> {
        SendMessage {
            chat_id: &self.chat_id,
            text: html,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        }
    }
}

impl NotificationSink for TelegramNotifier {
    #[instrument(level = "info", skip_all, fields(chars = html.chars().count()))]
    async fn notify(&self, html: &str) -> Result<(), SinkError> {
        let url = format!("{TELEGRAM_API}/bot{}/sendMessage", self.bot_token);
        let response = self
            .client
            .post(url)
            .json(&self.payload(html))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let reply: Reply = ensure_success(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        check_reply(reply)?;
        info!("Message sent");
        Ok(())
    }
}

fn check_reply(reply: Reply) -> Result<(), SinkError> {
    if reply.ok {
        Ok(())
    } else {
        Err(SinkError::Rejected {
            service: SERVICE,
            message: reply
                .description
                .unwrap_or_else(|| "request was not ok".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let notifier = TelegramNotifier::new(Client::new(), "123:abc", "-100");
        let json = serde_json::to_value(notifier.payload("<b>hi</b>")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "chat_id": "-100",
                "text": "<b>hi</b>",
                "parse_mode": "HTML",
                "disable_web_page_preview": true
            })
        );
    }

    #[test]
    fn test_not_ok_reply_is_rejected() {
        let reply: Reply =
            serde_json::from_str(r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#)
                .unwrap();
        let err = check_reply(reply).unwrap_err();
        assert_eq!(
            err.to_string(),
            "telegram rejected the request: Bad Request: chat not found"
        );

        let ok: Reply = serde_json::from_str(r#"{"ok":true,"result":{}}"#).unwrap();
        assert!(check_reply(ok).is_ok());
    }
}
