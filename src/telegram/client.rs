//! Telegram Bot API client

use super::error::TelegramError;
use super::types::{
    ApiResponse, File, GetFileParams, GetUpdatesParams, SendMessageParams, Update,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Slack on top of the long-poll timeout before a request is abandoned
const HTTP_TIMEOUT_MARGIN: Duration = Duration::from_secs(15);

pub struct TelegramClient {
    client: Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    pub fn new(token: &str, api_base: &str, poll_timeout: Duration) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(poll_timeout + HTTP_TIMEOUT_MARGIN)
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.token)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{file_path}", self.api_base, self.token)
    }

    /// Invoke a Bot API method and unwrap its response envelope
    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, TelegramError>
    where
        P: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.method_url(method))
            .json(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let parsed: ApiResponse<R> = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(TelegramError::from_api(status.as_u16(), body.trim(), None));
            }
            Err(e) => {
                return Err(TelegramError::decode(format!(
                    "Failed to parse {method} response: {e}"
                )));
            }
        };

        if parsed.ok {
            return parsed
                .result
                .ok_or_else(|| TelegramError::decode(format!("{method} response has no result")));
        }

        let description = parsed.description.unwrap_or_default();
        let retry_after = parsed.parameters.and_then(|p| p.retry_after);
        Err(TelegramError::from_api(
            parsed.error_code.unwrap_or(status.as_u16()),
            &description,
            retry_after,
        ))
    }

    /// Long-poll for new message updates starting at `offset`
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let params = GetUpdatesParams {
            offset,
            timeout: timeout_secs,
            allowed_updates: vec!["message"],
        };
        self.call("getUpdates", &params).await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let _sent: serde_json::Value = self
            .call("sendMessage", &SendMessageParams { chat_id, text })
            .await?;
        Ok(())
    }

    pub async fn get_file(&self, file_id: &str) -> Result<File, TelegramError> {
        self.call("getFile", &GetFileParams { file_id }).await
    }

    /// Resolve `file_id` and write its contents to `dest`, overwriting any
    /// existing file. Returns the number of bytes written.
    pub async fn download_file(&self, file_id: &str, dest: &Path) -> Result<u64, TelegramError> {
        let file = self.get_file(file_id).await?;
        let file_path = file.file_path.ok_or_else(|| {
            TelegramError::decode(format!("File {} has no download path", file.file_id))
        })?;

        let response = self.client.get(self.file_url(&file_path)).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = format!("File download failed with HTTP {status}");
            return Err(if status.is_server_error() {
                TelegramError::server_error(message)
            } else {
                TelegramError::bad_request(message)
            });
        }

        let bytes = response.bytes().await?;
        replace_file(dest, &bytes)
            .await
            .map_err(|e| TelegramError::io(format!("Failed to write {}: {e}", dest.display())))?;
        Ok(bytes.len() as u64)
    }
}

/// Write `contents` beside `dest` and rename it into place, so a failed write
/// never truncates the file already at `dest`
async fn replace_file(dest: &Path, contents: &[u8]) -> std::io::Result<()> {
    let file_name = dest.file_name().unwrap_or_default().to_string_lossy();
    let partial = dest.with_file_name(format!(".{file_name}.part"));

    if let Err(e) = tokio::fs::write(&partial, contents).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e);
    }
    tokio::fs::rename(&partial, dest).await
}
