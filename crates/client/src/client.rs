//! File-transfer API client.
//!
//! Each method builds one request, sends it through the injected
//! [`Transport`], decodes the JSON body and stamps it with the request URL
//! and a resolved success flag. Nothing is retried.

use std::fmt;
use std::sync::Arc;

use filedrop_protocol::constants::{API_KEY_HEADER, Endpoint, JSON_MEDIA_TYPE};
use filedrop_protocol::messages::{
    AddBoardFilesResponse, AddLinkResponse, AuthorizeRequest, AuthorizeResponse, BoardResponse,
    CompleteFileRequest, CompleteFileResponse, CreateBoardRequest, CreateTransferRequest,
    CreateTransferResponse, FinalizeTransferResponse, UploadUrlResponse,
};
use filedrop_protocol::types::{FileDescriptor, LinkEntry};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::ClientConfig;
use crate::token::{TokenCache, TokenStore, TokenStoreError};
use crate::transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport, TransportError};

/// Errors from the API client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("token store error: {0}")]
    TokenStore(#[from] TokenStoreError),

    #[error("invalid API key")]
    InvalidKey,
}

/// A decoded API response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T> {
    pub data: T,
    /// The body's `success` field if present, else whether the status was 2xx.
    pub success: bool,
    pub status: u16,
    pub reason: String,
    /// The body's `message` field if present, else the reason phrase.
    pub message: String,
    pub request_url: String,
}

impl<T> Response<T> {
    /// Converts the payload, keeping status and success metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            data: f(self.data),
            success: self.success,
            status: self.status,
            reason: self.reason,
            message: self.message,
            request_url: self.request_url,
        }
    }
}

/// Typed client for every remote action of the upload protocol.
pub struct TransferClient {
    transport: Arc<dyn Transport>,
    tokens: TokenCache,
    api_key: String,
    base_url: String,
}

impl fmt::Debug for TransferClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl TransferClient {
    /// Creates a client over an explicit transport and token store.
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, ClientError> {
        if config.api_key.trim().is_empty() {
            return Err(ClientError::InvalidKey);
        }
        Ok(Self {
            transport,
            tokens: TokenCache::new(store, config.token_max_age),
            api_key: config.api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Creates a client using the default `reqwest` transport.
    pub fn with_reqwest(
        config: ClientConfig,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Self::new(config, Arc::new(transport), store)
    }

    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    // -----------------------------------------------------------------------
    // Authentication
    // -----------------------------------------------------------------------

    /// Obtains a new bearer token for `user` and caches it on success.
    pub async fn authorize(&self, user: &str) -> Result<Response<AuthorizeResponse>, ClientError> {
        let body = AuthorizeRequest {
            user_identifier: user.to_string(),
        };
        let request = self.build(Method::POST, &Endpoint::Authorize, Some(json_body(&body)?), false);
        let resp: Response<AuthorizeResponse> = self.call(request).await?;

        if resp.success && !resp.data.token.is_empty() {
            self.tokens.set(resp.data.token.clone())?;
            debug!("token obtained");
        }
        Ok(resp)
    }

    // -----------------------------------------------------------------------
    // Transfers
    // -----------------------------------------------------------------------

    /// Creates a transfer announcing all of its files.
    pub async fn create_transfer(
        &self,
        name: &str,
        files: &[FileDescriptor],
    ) -> Result<Response<CreateTransferResponse>, ClientError> {
        let body = CreateTransferRequest {
            message: name.to_string(),
            files: files.to_vec(),
        };
        let request = self.build(
            Method::POST,
            &Endpoint::CreateTransfer,
            Some(json_body(&body)?),
            true,
        );
        self.call(request).await
    }

    /// Requests the pre-signed URL for one part of a transfer file.
    pub async fn request_transfer_part_url(
        &self,
        transfer_id: &str,
        file_id: &str,
        part_number: u32,
    ) -> Result<Response<UploadUrlResponse>, ClientError> {
        let endpoint = Endpoint::TransferPartUploadUrl {
            transfer_id: transfer_id.to_string(),
            file_id: file_id.to_string(),
            part_number,
        };
        let request = self.build(Method::GET, &endpoint, None, true);
        self.call(request).await
    }

    /// Signals that every part of a transfer file has been uploaded.
    pub async fn complete_transfer_file(
        &self,
        transfer_id: &str,
        file_id: &str,
        number_of_parts: u32,
    ) -> Result<Response<CompleteFileResponse>, ClientError> {
        let endpoint = Endpoint::TransferFileComplete {
            transfer_id: transfer_id.to_string(),
            file_id: file_id.to_string(),
        };
        let body = CompleteFileRequest {
            part_numbers: number_of_parts,
        };
        let request = self.build(Method::PUT, &endpoint, Some(json_body(&body)?), true);
        self.call(request).await
    }

    /// Finalizes a transfer and returns its download URL.
    pub async fn finalize_transfer(
        &self,
        transfer_id: &str,
    ) -> Result<Response<FinalizeTransferResponse>, ClientError> {
        let endpoint = Endpoint::FinalizeTransfer {
            transfer_id: transfer_id.to_string(),
        };
        // Sent with an empty JSON-typed body so the Content-Type header goes out.
        let request = self.build(Method::PUT, &endpoint, Some(Vec::new()), true);
        self.call(request).await
    }

    // -----------------------------------------------------------------------
    // Boards
    // -----------------------------------------------------------------------

    pub async fn create_board(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Response<BoardResponse>, ClientError> {
        let body = CreateBoardRequest {
            name: name.to_string(),
            description: description.map(str::to_string),
        };
        let request = self.build(Method::POST, &Endpoint::CreateBoard, Some(json_body(&body)?), true);
        self.call(request).await
    }

    pub async fn get_board(&self, board_id: &str) -> Result<Response<BoardResponse>, ClientError> {
        let endpoint = Endpoint::GetBoard {
            board_id: board_id.to_string(),
        };
        let request = self.build(Method::GET, &endpoint, None, true);
        self.call(request).await
    }

    /// Registers files on a board; the response carries their chunking.
    pub async fn add_board_files(
        &self,
        board_id: &str,
        files: &[FileDescriptor],
    ) -> Result<Response<AddBoardFilesResponse>, ClientError> {
        let endpoint = Endpoint::AddBoardFiles {
            board_id: board_id.to_string(),
        };
        let request = self.build(Method::POST, &endpoint, Some(json_body(&files)?), true);
        self.call(request).await
    }

    /// Attaches web links to a board.
    pub async fn add_links(
        &self,
        board_id: &str,
        links: &[LinkEntry],
    ) -> Result<Response<Vec<AddLinkResponse>>, ClientError> {
        let endpoint = Endpoint::AddBoardLinks {
            board_id: board_id.to_string(),
        };
        let request = self.build(Method::POST, &endpoint, Some(json_body(&links)?), true);
        self.call(request).await
    }

    /// Requests the pre-signed URL for one part of a board file.
    pub async fn request_board_part_url(
        &self,
        board_id: &str,
        file_id: &str,
        part_number: u32,
        multipart_upload_id: &str,
    ) -> Result<Response<UploadUrlResponse>, ClientError> {
        let endpoint = Endpoint::BoardPartUploadUrl {
            board_id: board_id.to_string(),
            file_id: file_id.to_string(),
            part_number,
            multipart_upload_id: multipart_upload_id.to_string(),
        };
        let request = self.build(Method::GET, &endpoint, None, true);
        self.call(request).await
    }

    pub async fn complete_board_file(
        &self,
        board_id: &str,
        file_id: &str,
    ) -> Result<Response<CompleteFileResponse>, ClientError> {
        let endpoint = Endpoint::BoardFileComplete {
            board_id: board_id.to_string(),
            file_id: file_id.to_string(),
        };
        let request = self.build(Method::PUT, &endpoint, Some(Vec::new()), true);
        self.call(request).await
    }

    // -----------------------------------------------------------------------
    // Chunk upload
    // -----------------------------------------------------------------------

    /// PUTs raw chunk bytes to a pre-signed URL.
    ///
    /// The URL carries its own authorization, so neither the API key nor
    /// the bearer token is attached. Success means HTTP 200.
    pub async fn upload_chunk(&self, url: &str, data: Vec<u8>) -> Result<Response<()>, ClientError> {
        let mut request = HttpRequest::new(Method::PUT, url);
        request.body = Some(data);

        let resp = self.transport.send(request).await?;
        debug!(status = resp.status, "chunk uploaded");
        Ok(Response {
            data: (),
            success: resp.status == 200,
            status: resp.status,
            message: resp.reason.clone(),
            reason: resp.reason,
            request_url: url.to_string(),
        })
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn build(
        &self,
        method: Method,
        endpoint: &Endpoint,
        body: Option<Vec<u8>>,
        authenticated: bool,
    ) -> HttpRequest {
        let mut request = HttpRequest::new(method, endpoint.url(&self.base_url));
        request
            .headers
            .push(("Accept".into(), JSON_MEDIA_TYPE.into()));
        request
            .headers
            .push((API_KEY_HEADER.into(), self.api_key.clone()));
        if authenticated && let Some(token) = self.tokens.get() {
            request
                .headers
                .push(("Authorization".into(), format!("Bearer {}", token.value)));
        }
        if body.is_some() {
            request
                .headers
                .push(("Content-Type".into(), JSON_MEDIA_TYPE.into()));
        }
        request.body = body;
        request
    }

    async fn call<T: DeserializeOwned + Default>(
        &self,
        request: HttpRequest,
    ) -> Result<Response<T>, ClientError> {
        let method = request.method.clone();
        let url = request.url.clone();
        let resp = self.transport.send(request).await?;
        let decoded = decode(resp, url)?;
        debug!(
            method = %method,
            url = %decoded.request_url,
            status = decoded.status,
            success = decoded.success,
            "api call"
        );
        Ok(decoded)
    }
}

fn json_body<B: Serialize + ?Sized>(body: &B) -> Result<Vec<u8>, ClientError> {
    Ok(serde_json::to_vec(body)?)
}

/// Decodes a response body into `T`.
///
/// Empty bodies decode to `T::default()`. Undecodable bodies are an error
/// on 2xx, and a default value with `success = false` otherwise.
fn decode<T: DeserializeOwned + Default>(
    resp: HttpResponse,
    request_url: String,
) -> Result<Response<T>, ClientError> {
    let status_ok = resp.is_success();

    let value: Option<serde_json::Value> = if resp.body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice(&resp.body) {
            Ok(v) => Some(v),
            Err(e) if status_ok => return Err(e.into()),
            Err(_) => None,
        }
    };

    let explicit_success = value
        .as_ref()
        .and_then(|v| v.get("success"))
        .and_then(serde_json::Value::as_bool);
    let message = value
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(serde_json::Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| resp.reason.clone());

    let data = match value {
        Some(v) => match serde_json::from_value(v) {
            Ok(data) => data,
            Err(e) if status_ok => return Err(e.into()),
            Err(_) => T::default(),
        },
        None => T::default(),
    };

    Ok(Response {
        data,
        success: explicit_success.unwrap_or(status_ok),
        status: resp.status,
        reason: resp.reason,
        message,
        request_url,
    })
}
