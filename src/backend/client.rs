//! HTTP client for the local backend API.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::debug;

use super::error::{ClientError, ClientResult};
use super::models::{
    CurrentMeetingResponse, DisplayConfig, Meeting, NoteEntry, NotesResponse, RecordingStatus,
    SavedRecording, SavedRecordingsResponse, Settings, SetupStatus, StartRecordingRequest,
    UpcomingMeetingsResponse, UploadResult,
};

/// Backend operations the session controller and meeting selector depend on.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn health(&self) -> ClientResult<()>;
    async fn display_config(&self) -> ClientResult<DisplayConfig>;
    async fn setup_status(&self) -> ClientResult<SetupStatus>;
    async fn current_meeting(&self) -> ClientResult<Option<Meeting>>;
    async fn upcoming_meetings(&self) -> ClientResult<Vec<Meeting>>;
    async fn start_recording(&self, request: &StartRecordingRequest) -> ClientResult<()>;
    async fn stop_recording(&self) -> ClientResult<()>;
    async fn recording_status(&self) -> ClientResult<RecordingStatus>;
    async fn saved_recordings(&self) -> ClientResult<Vec<SavedRecording>>;
    async fn retry_saved_recording(&self, id: &str) -> ClientResult<()>;
    async fn list_notes(&self) -> ClientResult<Vec<NoteEntry>>;
}

/// Acknowledgement returned by the recording action endpoints. The backend
/// answers 200 with `status: "error"` when it refuses an action.
#[derive(Debug, Deserialize)]
struct ActionResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
}

pub struct BackendClient {
    client: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a client for `base_url` whose requests give up after `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{path}: {e}")))
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &Url) -> ClientResult<Response> {
        let response = request.send().await.map_err(|source| ClientError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response, url: &Url) -> ClientResult<T> {
        let body = response.text().await.map_err(|source| ClientError::Transport {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|source| ClientError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);
        let response = self.send(self.client.get(url.clone()), &url).await?;
        Self::decode(response, &url).await
    }

    async fn post_json<B, T>(&self, url: Url, body: Option<&B>) -> ClientResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!("POST {}", url);
        let mut request = self.client.post(url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = self.send(request, &url).await?;
        Self::decode(response, &url).await
    }

    async fn post_action<B>(&self, url: Url, body: Option<&B>) -> ClientResult<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        let ack: ActionResponse = self.post_json(url.clone(), body).await?;
        if ack.status == "error" {
            return Err(ClientError::Rejected {
                url: url.to_string(),
                message: ack.message.unwrap_or_else(|| "Unknown error".to_string()),
            });
        }
        Ok(())
    }

    pub async fn settings(&self) -> ClientResult<Settings> {
        self.get_json("/api/settings").await
    }

    pub async fn update_settings(&self, values: &Settings) -> ClientResult<Settings> {
        let url = self.endpoint("/api/settings")?;
        self.post_json(url, Some(values)).await
    }

    /// Upload a Google OAuth client file as multipart field `file`.
    pub async fn upload_credentials(&self, file_path: &Path) -> ClientResult<UploadResult> {
        let data = fs::read(file_path).await.map_err(|source| ClientError::File {
            path: file_path.display().to_string(),
            source,
        })?;
        let filename = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("credentials.json")
            .to_string();

        let url = self.endpoint("/api/settings/credentials")?;
        let part = Part::bytes(data)
            .file_name(filename)
            .mime_str("application/json")
            .map_err(ClientError::Build)?;
        let form = Form::new().part("file", part);

        debug!("POST {} (multipart)", url);
        let response = self
            .send(self.client.post(url.clone()).multipart(form), &url)
            .await?;
        Self::decode(response, &url).await
    }
}

#[async_trait]
impl BackendApi for BackendClient {
    async fn health(&self) -> ClientResult<()> {
        let url = self.endpoint("/api/health")?;
        self.send(self.client.get(url.clone()), &url).await?;
        Ok(())
    }

    async fn display_config(&self) -> ClientResult<DisplayConfig> {
        self.get_json("/api/config").await
    }

    async fn setup_status(&self) -> ClientResult<SetupStatus> {
        self.get_json("/api/settings/setup-status").await
    }

    async fn current_meeting(&self) -> ClientResult<Option<Meeting>> {
        let response: CurrentMeetingResponse =
            self.get_json("/api/calendar/current-meeting").await?;
        Ok(response.meeting)
    }

    async fn upcoming_meetings(&self) -> ClientResult<Vec<Meeting>> {
        let response: UpcomingMeetingsResponse = self.get_json("/api/calendar/upcoming").await?;
        Ok(response.meetings)
    }

    async fn start_recording(&self, request: &StartRecordingRequest) -> ClientResult<()> {
        let url = self.endpoint("/api/recording/start")?;
        self.post_action(url, Some(request)).await
    }

    async fn stop_recording(&self) -> ClientResult<()> {
        let url = self.endpoint("/api/recording/stop")?;
        self.post_action::<()>(url, None).await
    }

    async fn recording_status(&self) -> ClientResult<RecordingStatus> {
        self.get_json("/api/recording/status").await
    }

    async fn saved_recordings(&self) -> ClientResult<Vec<SavedRecording>> {
        let response: SavedRecordingsResponse = self.get_json("/api/recording/saved").await?;
        Ok(response.recordings)
    }

    async fn retry_saved_recording(&self, id: &str) -> ClientResult<()> {
        let mut url = self.endpoint("/api/recording/retry")?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .push(id);
        self.post_action::<()>(url, None).await
    }

    async fn list_notes(&self) -> ClientResult<Vec<NoteEntry>> {
        let response: NotesResponse = self.get_json("/api/notes/list").await?;
        Ok(response.notes)
    }
}
