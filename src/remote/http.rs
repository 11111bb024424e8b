use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{
    BackendError, BackendReply, FileUpload, MultiTransition, PortalBackend,
    ReverificationPayload, SingleTransition, UNEXPECTED_ERROR,
};
use crate::models::application::{Application, WorkflowItem};

const USER_AGENT: &str = concat!("clu-portal/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed client for the land-use REST backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

/// `{success, message?, data?}` envelope used by the read endpoints.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

fn default_success() -> bool {
    true
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T, BackendError> {
        if !self.success {
            return Err(BackendError::Rejected(
                self.message.unwrap_or_else(|| UNEXPECTED_ERROR.to_string()),
            ));
        }
        self.data
            .ok_or_else(|| BackendError::Malformed("response has no data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct UploadReply {
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl HttpBackend {
    /// `timeout` bounds each request at the transport level.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BackendError::Transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(HttpBackend {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, token: &str) -> Result<Response, BackendError> {
        request.bearer_auth(token).send().await.map_err(transport_error)
    }

    async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<BackendReply, BackendError> {
        let response = self.send(self.client.post(self.url(path)).json(body), token).await?;
        read_json::<BackendReply>(response).await
    }
}

fn transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Transport(e.to_string())
    }
}

/// Pulls `message` out of an error body, if the body is JSON and has one.
fn extract_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.trim().is_empty())
        .map(String::from)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    let body = response.bytes().await.map_err(transport_error)?;
    if !status.is_success() {
        let message = extract_message(&body).unwrap_or_else(|| UNEXPECTED_ERROR.to_string());
        warn!("Backend returned {}: {}", status.as_u16(), message);
        return Err(BackendError::Status {
            status: status.as_u16(),
            message,
        });
    }
    serde_json::from_slice(&body).map_err(|e| {
        warn!("Unparseable backend response: {e}");
        BackendError::Malformed(e.to_string())
    })
}

#[async_trait]
impl PortalBackend for HttpBackend {
    async fn list_applications(
        &self,
        token: &str,
        workflow_sequence_id: Option<i64>,
    ) -> Result<Vec<Application>, BackendError> {
        let mut request = self.client.get(self.url("/applications"));
        if let Some(id) = workflow_sequence_id {
            request = request.query(&[("workflow_sequence_id", id)]);
        }
        let response = self.send(request, token).await?;
        read_json::<Envelope<Vec<Application>>>(response).await?.into_data()
    }

    async fn fetch_application(
        &self,
        token: &str,
        application_id: i64,
        workflow_sequence_id: Option<i64>,
    ) -> Result<Application, BackendError> {
        let mut request = self
            .client
            .get(self.url(&format!("/applications/{application_id}")));
        if let Some(id) = workflow_sequence_id {
            request = request.query(&[("workflow_sequence_id", id)]);
        }
        let response = self.send(request, token).await?;
        read_json::<Envelope<Application>>(response).await?.into_data()
    }

    async fn fetch_history(
        &self,
        token: &str,
        application_id: i64,
    ) -> Result<Vec<WorkflowItem>, BackendError> {
        let request = self
            .client
            .get(self.url(&format!("/applications/{application_id}/workflow")));
        let response = self.send(request, token).await?;
        read_json::<Envelope<Vec<WorkflowItem>>>(response).await?.into_data()
    }

    async fn upload_attachment(
        &self,
        token: &str,
        field_name: &str,
        file: &FileUpload,
    ) -> Result<String, BackendError> {
        let mut part = multipart::Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        if let Some(content_type) = &file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| BackendError::Rejected(format!("Invalid content type: {e}")))?;
        }
        let form = multipart::Form::new().part(field_name.to_string(), part);
        debug!("Uploading {} as {}", file.file_name, field_name);

        let response = self
            .send(self.client.post(self.url("/upload")).multipart(form), token)
            .await?;
        let reply = read_json::<UploadReply>(response).await?;
        match reply.filename {
            Some(name) if !name.trim().is_empty() => Ok(name),
            _ => Err(BackendError::Rejected(
                reply
                    .message
                    .unwrap_or_else(|| "upload returned no filename".to_string()),
            )),
        }
    }

    async fn submit_transition(
        &self,
        token: &str,
        payload: &SingleTransition,
    ) -> Result<BackendReply, BackendError> {
        self.post_json("/applications/verification", token, payload).await
    }

    async fn submit_multi_transition(
        &self,
        token: &str,
        payload: &MultiTransition,
    ) -> Result<BackendReply, BackendError> {
        self.post_json("/applications/verification/multiple", token, payload)
            .await
    }

    async fn request_reverification(
        &self,
        token: &str,
        payload: &ReverificationPayload,
    ) -> Result<BackendReply, BackendError> {
        self.post_json("/applications/reverification", token, payload)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_comes_from_body() {
        assert_eq!(
            extract_message(br#"{"success": false, "message": "Invalid status"}"#),
            Some("Invalid status".to_string())
        );
        assert_eq!(extract_message(b"<html>502</html>"), None);
        assert_eq!(extract_message(br#"{"message": "  "}"#), None);
    }

    #[test]
    fn envelope_without_success_flag_is_accepted() {
        let env: Envelope<Vec<i64>> = serde_json::from_str(r#"{"data": [1, 2]}"#).unwrap();
        assert_eq!(env.into_data().unwrap(), vec![1, 2]);
    }

    #[test]
    fn failed_envelope_surfaces_message() {
        let env: Envelope<Vec<i64>> =
            serde_json::from_str(r#"{"success": false, "message": "Not allowed"}"#).unwrap();
        assert_eq!(env.into_data(), Err(BackendError::Rejected("Not allowed".to_string())));
    }

    #[test]
    fn application_envelope_without_data_is_malformed() {
        let env: Envelope<Application> =
            serde_json::from_str(r#"{"success": true, "message": "ok"}"#).unwrap();
        assert_eq!(
            env.into_data(),
            Err(BackendError::Malformed("response has no data".to_string()))
        );

        let env: Envelope<Application> =
            serde_json::from_str(r#"{"data": {"id": 3, "can_forward": true}}"#).unwrap();
        let app = env.into_data().unwrap();
        assert_eq!(app.id, 3);
        assert!(app.can_forward);
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let backend = HttpBackend::new("http://localhost:9000/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.url("/upload"), "http://localhost:9000/api/upload");
    }
}
