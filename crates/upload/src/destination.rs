//! Upload destinations.
//!
//! A [`Destination`] supplies the remote calls that differ between an
//! ephemeral transfer and a persistent board. The orchestrator drives both
//! through the same state machine.

use std::future::Future;
use std::pin::Pin;

use filedrop_client::{ClientError, Response, TransferClient};
use filedrop_protocol::messages::{CompleteFileResponse, FinalizeTransferResponse, UploadUrlResponse};
use filedrop_protocol::types::{FileDescriptor, RemoteFile};

use crate::types::FileUpload;

/// Boxed future returned by [`Destination`] methods.
pub type DestinationFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, ClientError>> + Send + 'a>>;

/// The remote container files are uploaded into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub id: String,
    /// Files registered while creating the target, in server order.
    pub files: Vec<RemoteFile>,
}

/// Remote calls specific to one kind of upload destination.
pub trait Destination: Send + Sync {
    /// Short name used in logs and messages.
    fn kind(&self) -> &'static str;

    /// Creates (or looks up) the container.
    fn create_target<'a>(
        &'a self,
        client: &'a TransferClient,
        name: &'a str,
        files: &'a [FileDescriptor],
    ) -> DestinationFuture<'a, Response<Target>>;

    /// Registers files on the container. `None` when [`Self::create_target`]
    /// already did.
    fn attach_files<'a>(
        &'a self,
        client: &'a TransferClient,
        target: &'a Target,
        files: &'a [FileDescriptor],
    ) -> DestinationFuture<'a, Option<Response<Vec<RemoteFile>>>>;

    fn request_part_url<'a>(
        &'a self,
        client: &'a TransferClient,
        target: &'a Target,
        file: &'a FileUpload,
        part_number: u32,
    ) -> DestinationFuture<'a, Response<UploadUrlResponse>>;

    /// Signals that every part of `file` is uploaded.
    fn complete_item<'a>(
        &'a self,
        client: &'a TransferClient,
        target: &'a Target,
        file: &'a FileUpload,
    ) -> DestinationFuture<'a, Response<CompleteFileResponse>>;

    /// Finalizes the container. `None` when the destination has no batch
    /// finalize step.
    fn complete_target<'a>(
        &'a self,
        client: &'a TransferClient,
        target: &'a Target,
    ) -> DestinationFuture<'a, Option<Response<FinalizeTransferResponse>>>;
}

/// An ephemeral transfer, finalized as one batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferDestination;

impl Destination for TransferDestination {
    fn kind(&self) -> &'static str {
        "transfer"
    }

    fn create_target<'a>(
        &'a self,
        client: &'a TransferClient,
        name: &'a str,
        files: &'a [FileDescriptor],
    ) -> DestinationFuture<'a, Response<Target>> {
        Box::pin(async move {
            let resp = client.create_transfer(name, files).await?;
            Ok(resp.map(|t| Target {
                id: t.id,
                files: t.files,
            }))
        })
    }

    fn attach_files<'a>(
        &'a self,
        _client: &'a TransferClient,
        _target: &'a Target,
        _files: &'a [FileDescriptor],
    ) -> DestinationFuture<'a, Option<Response<Vec<RemoteFile>>>> {
        Box::pin(async { Ok(None) })
    }

    fn request_part_url<'a>(
        &'a self,
        client: &'a TransferClient,
        target: &'a Target,
        file: &'a FileUpload,
        part_number: u32,
    ) -> DestinationFuture<'a, Response<UploadUrlResponse>> {
        Box::pin(client.request_transfer_part_url(&target.id, &file.id, part_number))
    }

    fn complete_item<'a>(
        &'a self,
        client: &'a TransferClient,
        target: &'a Target,
        file: &'a FileUpload,
    ) -> DestinationFuture<'a, Response<CompleteFileResponse>> {
        Box::pin(client.complete_transfer_file(&target.id, &file.id, file.number_of_parts))
    }

    fn complete_target<'a>(
        &'a self,
        client: &'a TransferClient,
        target: &'a Target,
    ) -> DestinationFuture<'a, Option<Response<FinalizeTransferResponse>>> {
        Box::pin(async move { client.finalize_transfer(&target.id).await.map(Some) })
    }
}

/// A persistent board. Files are attached individually and never finalized
/// as a batch.
#[derive(Debug, Clone, Default)]
pub struct BoardDestination {
    /// Existing board to add to. A new board is created when `None`.
    pub board_id: Option<String>,
    /// Description for a newly created board.
    pub description: Option<String>,
}

impl Destination for BoardDestination {
    fn kind(&self) -> &'static str {
        "board"
    }

    fn create_target<'a>(
        &'a self,
        client: &'a TransferClient,
        name: &'a str,
        _files: &'a [FileDescriptor],
    ) -> DestinationFuture<'a, Response<Target>> {
        Box::pin(async move {
            let resp = match &self.board_id {
                // Fetching confirms the board exists before files are added.
                Some(id) => client.get_board(id).await?.map(|mut b| {
                    if b.id.is_empty() {
                        b.id = id.clone();
                    }
                    b
                }),
                None => client.create_board(name, self.description.as_deref()).await?,
            };
            Ok(resp.map(|b| Target {
                id: b.id,
                files: Vec::new(),
            }))
        })
    }

    fn attach_files<'a>(
        &'a self,
        client: &'a TransferClient,
        target: &'a Target,
        files: &'a [FileDescriptor],
    ) -> DestinationFuture<'a, Option<Response<Vec<RemoteFile>>>> {
        Box::pin(async move { client.add_board_files(&target.id, files).await.map(Some) })
    }

    fn request_part_url<'a>(
        &'a self,
        client: &'a TransferClient,
        target: &'a Target,
        file: &'a FileUpload,
        part_number: u32,
    ) -> DestinationFuture<'a, Response<UploadUrlResponse>> {
        let multipart_id = file.multipart_upload_id.as_deref().unwrap_or_default();
        Box::pin(client.request_board_part_url(&target.id, &file.id, part_number, multipart_id))
    }

    fn complete_item<'a>(
        &'a self,
        client: &'a TransferClient,
        target: &'a Target,
        file: &'a FileUpload,
    ) -> DestinationFuture<'a, Response<CompleteFileResponse>> {
        Box::pin(client.complete_board_file(&target.id, &file.id))
    }

    fn complete_target<'a>(
        &'a self,
        _client: &'a TransferClient,
        _target: &'a Target,
    ) -> DestinationFuture<'a, Option<Response<FinalizeTransferResponse>>> {
        Box::pin(async { Ok(None) })
    }
}
