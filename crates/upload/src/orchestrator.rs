//! Upload orchestrator.
//!
//! Sequences the remote calls of one multi-file upload, reports weighted
//! progress, and supports cancellation.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use filedrop_client::{ClientError, Response, TransferClient, TransportError};
use filedrop_protocol::types::{FileDescriptor, RemoteFile};
use filedrop_transfer::{DiskSplitter, FileSplitter, part_path};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::destination::{Destination, Target};
use crate::error::ValidationError;
use crate::progress::{NoProgress, ProgressReport, ProgressSink, allocate_shares};
use crate::types::{FileUpload, ResultCode, Stage, UploadOutcome};

/// Points reported once the token is available.
const TOKEN_PROGRESS: u64 = 5;
/// Points reported once the files are registered.
const REGISTERED_PROGRESS: u64 = 10;

/// A validated local input file.
#[derive(Debug, Clone)]
struct LocalFile {
    path: PathBuf,
    name: String,
    size: u64,
}

/// Runs chunked multi-file uploads against one [`TransferClient`].
///
/// One operation runs at a time: files are handled in the order the server
/// returned them and parts in ascending order, each step awaited before the
/// next starts. The chunk directory is reused for every file.
pub struct UploadOrchestrator {
    client: Arc<TransferClient>,
    splitter: Arc<dyn FileSplitter>,
    chunk_dir: PathBuf,
    progress: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
}

impl UploadOrchestrator {
    /// Creates an orchestrator writing part files into `chunk_dir`.
    pub fn new(client: Arc<TransferClient>, chunk_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            splitter: Arc::new(DiskSplitter),
            chunk_dir: chunk_dir.into(),
            progress: Arc::new(NoProgress),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_splitter(mut self, splitter: Arc<dyn FileSplitter>) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Returns a cancellation token for the running upload.
    ///
    /// Cancelling aborts the in-flight call and ends the operation with
    /// [`ResultCode::NoConnection`].
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Uploads `paths` into `destination` under the display name `name`.
    ///
    /// Invalid arguments are returned as `Err` before any network call.
    /// Everything else, including failures, is reported through the
    /// returned [`UploadOutcome`].
    pub async fn upload_files(
        &self,
        paths: &[PathBuf],
        name: &str,
        user: &str,
        destination: &dyn Destination,
    ) -> Result<UploadOutcome, ValidationError> {
        let files = validate(paths, name, user)?;

        info!(
            kind = destination.kind(),
            files = files.len(),
            total_bytes = files.iter().map(|f| f.size).sum::<u64>(),
            "upload started"
        );

        let outcome = match self.run(files, name, user, destination).await {
            Ok(download_url) => {
                self.emit(100, "All files uploaded");
                info!(kind = destination.kind(), url = %download_url, "upload completed");
                UploadOutcome::success("All files uploaded", download_url)
            }
            Err(outcome) => {
                warn!(
                    kind = destination.kind(),
                    result = ?outcome.result,
                    stage = %outcome.stage,
                    message = %outcome.message,
                    "upload aborted"
                );
                outcome
            }
        };
        Ok(outcome)
    }

    async fn run(
        &self,
        files: Vec<LocalFile>,
        name: &str,
        user: &str,
        destination: &dyn Destination,
    ) -> Result<String, UploadOutcome> {
        // 1. Token
        self.ensure_token(user).await?;

        // 2. TransferRequest
        self.enter(Stage::TransferRequest);
        let descriptors: Vec<FileDescriptor> = files
            .iter()
            .map(|f| FileDescriptor {
                name: f.name.clone(),
                size: f.size,
            })
            .collect();

        let resp = self
            .guard(
                Stage::TransferRequest,
                destination.create_target(&self.client, name, &descriptors),
            )
            .await?;
        let mut target = api_result(Stage::TransferRequest, resp)?;
        debug!(kind = destination.kind(), id = %target.id, "target created");

        // 3. AddFiles
        self.enter(Stage::AddFiles);
        if let Some(resp) = self
            .guard(
                Stage::AddFiles,
                destination.attach_files(&self.client, &target, &descriptors),
            )
            .await?
        {
            target.files = api_result(Stage::AddFiles, resp)?;
        }
        self.emit(REGISTERED_PROGRESS, "Transfer request accepted");

        // 4. Per file, in server order
        let uploads = join_files(&target.files, files)?;
        let sizes: Vec<u64> = uploads.iter().map(|f| f.size).collect();
        let shares = allocate_shares(&sizes, 100 - REGISTERED_PROGRESS);

        let mut baseline = REGISTERED_PROGRESS;
        for (mut file, share) in uploads.into_iter().zip(shares) {
            self.upload_file(destination, &target, &mut file, baseline, share)
                .await?;
            baseline += share;
        }

        // 5. Finalize
        let resp = self
            .guard(
                Stage::Complete,
                destination.complete_target(&self.client, &target),
            )
            .await?;
        match resp {
            Some(resp) => Ok(api_result(Stage::Complete, resp)?.url),
            None => Ok(String::new()),
        }
    }

    async fn ensure_token(&self, user: &str) -> Result<(), UploadOutcome> {
        self.enter(Stage::Token);
        if self.client.tokens().get().is_some() {
            debug!("reusing cached token");
            self.emit(TOKEN_PROGRESS, "Using cached token");
            return Ok(());
        }

        let resp = self
            .guard(Stage::Token, self.client.authorize(user))
            .await?;
        let token = api_result(Stage::Token, resp)?;
        if token.token.is_empty() {
            return Err(UploadOutcome::failure(
                ResultCode::ApiError,
                Stage::Token,
                "authorization returned no token",
            ));
        }
        self.emit(TOKEN_PROGRESS, "New token obtained");
        Ok(())
    }

    /// Runs stages SplitFiles to Complete for one file.
    ///
    /// Failures are attributed to the stage the file has reached.
    async fn upload_file(
        &self,
        destination: &dyn Destination,
        target: &Target,
        file: &mut FileUpload,
        baseline: u64,
        share: u64,
    ) -> Result<(), UploadOutcome> {
        self.emit(baseline, format!("Uploading '{}'...", file.name));

        // Split
        self.advance(file, Stage::SplitFiles);
        self.split(file).await?;
        self.emit(baseline + share / 5, "Files split");

        // Upload URLs
        self.advance(file, Stage::UploadUrl);
        for part in 1..=file.number_of_parts {
            let resp = self
                .guard(
                    file.stage(),
                    destination.request_part_url(&self.client, target, file, part),
                )
                .await?;
            if !resp.success || resp.data.url.is_empty() {
                return Err(UploadOutcome::failure(
                    ResultCode::ApiError,
                    file.stage(),
                    format!(
                        "Failed to acquire upload url for part {part} of '{}': {}",
                        file.name, resp.message
                    ),
                ));
            }
            debug!(file = %file.name, part, "upload url acquired");
            file.upload_urls.insert(part, resp.data.url);
        }
        if !file.all_urls_resolved() {
            return Err(UploadOutcome::failure(
                ResultCode::ApiError,
                file.stage(),
                format!("Upload urls missing for '{}'", file.name),
            ));
        }
        let start = baseline + share / 4;
        let budget = share * 3 / 4;
        self.emit(start, "Upload urls acquired");

        // Upload
        self.advance(file, Stage::Upload);
        let stage = file.stage();
        for (&part, url) in &file.upload_urls {
            let path = part_path(&self.chunk_dir, part);
            let data = tokio::fs::read(&path).await.map_err(|e| {
                unknown(
                    stage,
                    format!("Failed to read part {part} of '{}': {e}", file.name),
                )
            })?;

            let resp = self
                .guard(stage, self.client.upload_chunk(url, data))
                .await?;
            if !resp.success {
                return Err(UploadOutcome::failure(
                    ResultCode::ApiError,
                    stage,
                    format!(
                        "Failed to upload part {part} of '{}': {} {}",
                        file.name, resp.status, resp.reason
                    ),
                ));
            }
            let progress = start + budget * u64::from(part) / u64::from(file.number_of_parts);
            self.emit(progress, format!("Part {part} uploaded"));
        }

        // Complete
        self.advance(file, Stage::Complete);
        let resp = self
            .guard(
                file.stage(),
                destination.complete_item(&self.client, target, file),
            )
            .await?;
        api_result(file.stage(), resp)?;
        self.emit(
            start + budget,
            format!("Upload of file '{}' completed", file.name),
        );
        info!(file = %file.name, parts = file.number_of_parts, "file uploaded");
        Ok(())
    }

    /// Splits `file` into the chunk directory on a blocking thread.
    async fn split(&self, file: &mut FileUpload) -> Result<(), UploadOutcome> {
        let stage = file.stage();
        self.check_cancelled(stage)?;

        let splitter = self.splitter.clone();
        let path = file.local_path.clone();
        let chunk_dir = self.chunk_dir.clone();
        let chunk_size = file.chunk_size;
        let parts = tokio::task::spawn_blocking(move || {
            splitter.split(&path, chunk_size, &chunk_dir)
        })
        .await
        .map_err(|e| unknown(stage, format!("split task failed: {e}")))?
        .map_err(|e| unknown(stage, format!("Failed to split '{}': {e}", file.name)))?;

        if file.number_of_parts == 0 {
            file.number_of_parts = parts;
        } else if parts != file.number_of_parts {
            return Err(unknown(
                stage,
                format!(
                    "'{}' split into {parts} parts but the server expects {}",
                    file.name, file.number_of_parts
                ),
            ));
        }
        debug!(file = %file.name, parts, chunk_size, "file split");
        Ok(())
    }

    /// Moves `file` forward and announces the stage it is now in.
    fn advance(&self, file: &mut FileUpload, stage: Stage) {
        file.advance(stage);
        debug!(file = %file.name, stage = %file.stage(), "file stage");
        self.progress.stage_entered(file.stage());
    }

    fn enter(&self, stage: Stage) {
        debug!(stage = %stage, "stage");
        self.progress.stage_entered(stage);
    }

    /// Awaits a remote call unless the upload is cancelled first.
    async fn guard<T>(
        &self,
        stage: Stage,
        call: impl Future<Output = Result<T, ClientError>>,
    ) -> Result<T, UploadOutcome> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                Err(client_failure(stage, ClientError::Transport(TransportError::Cancelled)))
            }
            result = call => result.map_err(|e| client_failure(stage, e)),
        }
    }

    fn check_cancelled(&self, stage: Stage) -> Result<(), UploadOutcome> {
        if self.cancel.is_cancelled() {
            return Err(client_failure(
                stage,
                ClientError::Transport(TransportError::Cancelled),
            ));
        }
        Ok(())
    }

    fn emit(&self, percentage: u64, message: impl Into<String>) {
        let report = ProgressReport::new(message, percentage);
        debug!(percentage = report.percentage, message = %report.message, "progress");
        self.progress.report(report);
    }
}

/// Checks the arguments and collects local file metadata.
fn validate(paths: &[PathBuf], name: &str, user: &str) -> Result<Vec<LocalFile>, ValidationError> {
    if paths.is_empty() {
        return Err(ValidationError::EmptyPathList);
    }
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if user.trim().is_empty() {
        return Err(ValidationError::EmptyUser);
    }

    paths.iter().map(|path| local_file(path)).collect()
}

fn local_file(path: &Path) -> Result<LocalFile, ValidationError> {
    let meta =
        std::fs::metadata(path).map_err(|_| ValidationError::FileNotFound(path.to_path_buf()))?;
    if !meta.is_file() {
        return Err(ValidationError::NotAFile(path.to_path_buf()));
    }
    if meta.len() == 0 {
        return Err(ValidationError::EmptyFile(path.to_path_buf()));
    }
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ValidationError::NoFileName(path.to_path_buf()))?;

    Ok(LocalFile {
        path: path.to_path_buf(),
        name: name.to_string(),
        size: meta.len(),
    })
}

/// Matches server-returned files back to local files by name.
///
/// Keeps the server order. Duplicate names are matched in input order.
fn join_files(remote: &[RemoteFile], local: Vec<LocalFile>) -> Result<Vec<FileUpload>, UploadOutcome> {
    let mut local: Vec<Option<LocalFile>> = local.into_iter().map(Some).collect();
    let mut uploads = Vec::with_capacity(remote.len());

    for file in remote {
        let matched = local
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|l| l.name == file.name))
            .and_then(Option::take)
            .ok_or_else(|| {
                unknown(
                    Stage::AddFiles,
                    format!("server returned unknown file '{}'", file.name),
                )
            })?;
        uploads.push(FileUpload::new(file.clone(), matched.path, matched.size));
    }

    if let Some(missing) = local.into_iter().flatten().next() {
        return Err(unknown(
            Stage::AddFiles,
            format!("server did not register file '{}'", missing.name),
        ));
    }
    Ok(uploads)
}

/// Unwraps a response, turning a server-reported failure into `ApiError`.
fn api_result<T>(stage: Stage, resp: Response<T>) -> Result<T, UploadOutcome> {
    if resp.success {
        Ok(resp.data)
    } else {
        Err(UploadOutcome::failure(ResultCode::ApiError, stage, resp.message))
    }
}

fn client_failure(stage: Stage, err: ClientError) -> UploadOutcome {
    let result = match &err {
        ClientError::Transport(e) if e.is_no_connection() => ResultCode::NoConnection,
        _ => ResultCode::UnknownError,
    };
    UploadOutcome::failure(result, stage, err.to_string())
}

fn unknown(stage: Stage, message: String) -> UploadOutcome {
    UploadOutcome::failure(ResultCode::UnknownError, stage, message)
}
