//! Terraform export service
//!
//! Asks the controller to generate the Terraform configuration for one
//! resource, fetches the resulting zip archive and routes its entries to a
//! stream or to files.

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument};
use zip::ZipArchive;

use crate::application::services::rpc::{body_excerpt, RpcResponse, RpcService};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{
    looks_like_zip, ArchiveEntry, ExportArtifact, ExportOptions, ExportProtocol, Session,
    TOKEN_KEY,
};
use crate::infrastructure::traits::{FileSystem, HttpTransport};

/// Service for exporting generated Terraform configuration.
pub struct ExportService {
    rpc: RpcService,
    http: Arc<dyn HttpTransport>,
    fs: Arc<dyn FileSystem>,
}

impl ExportService {
    /// Create a new export service.
    pub fn new(http: Arc<dyn HttpTransport>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            rpc: RpcService::new(Arc::clone(&http)),
            http,
            fs,
        }
    }

    /// Export `resource` and unpack the archive.
    ///
    /// Only the first archive entry is kept unless
    /// `options.include_auxiliary_file` is set.
    #[instrument(skip(self, session))]
    pub fn export_config(
        &self,
        session: &Session,
        resource: &str,
        options: &ExportOptions,
        protocol: ExportProtocol,
    ) -> ApplicationResult<ExportArtifact> {
        let request = protocol.request(session, resource, options)?;
        let reply = self.rpc.send(session, &request, protocol.encoding())?;

        let archive = if looks_like_zip(&reply.body) {
            debug!("export_config: archive returned inline");
            reply.body
        } else {
            let response = RpcResponse::parse(reply.body, reply.latency)?.ensure_success()?;
            let handle = response
                .result_field
                .ok_or_else(|| ApplicationError::Decoding {
                    message: "response has no Results field naming the export file".to_string(),
                })?;
            debug!("export_config: downloading {}", handle);
            self.download(session, &handle)?
        };

        unpack_archive(&archive, options.include_auxiliary_file)
    }

    /// Fetch a controller-side file by handle.
    pub fn download(&self, session: &Session, handle: &str) -> ApplicationResult<Vec<u8>> {
        let url = session.download_url();
        let response = self
            .http
            .get(&url, &[("filename", handle), (TOKEN_KEY, session.token())])
            .with_transport_context("making download request", &url)?;

        if !response.is_success() {
            return Err(ApplicationError::Api {
                status: Some(response.status),
                message: format!("download of {handle} failed: {}", body_excerpt(&response.body)),
            });
        }
        debug!("download: {} bytes", response.body.len());
        Ok(response.body)
    }

    /// Write each entry to `<dir>/<entry name>`.
    ///
    /// A `/` is appended to `dir` when missing and parent directories are
    /// created. The first failure aborts the remaining writes.
    pub fn write_to_dir(
        &self,
        artifact: &ExportArtifact,
        dir: &str,
    ) -> ApplicationResult<Vec<PathBuf>> {
        let mut prefix = if dir.is_empty() {
            ".".to_string()
        } else {
            dir.to_string()
        };
        if !prefix.ends_with('/') {
            prefix.push('/');
        }

        let mut written = Vec::with_capacity(artifact.len());
        for entry in artifact.entries() {
            let target = PathBuf::from(format!("{prefix}{}", entry.name));
            self.fs
                .ensure_parent(&target)
                .with_path_context("create directory for", &target)?;
            self.fs
                .write(&target, &entry.content)
                .with_path_context(&format!("writing file {}", entry.name), &target)?;
            debug!("write_to_dir: wrote {}", target.display());
            written.push(target);
        }
        Ok(written)
    }

    /// Concatenate all entry contents onto `out`.
    pub fn write_to_stream<W: Write + ?Sized>(
        artifact: &ExportArtifact,
        out: &mut W,
    ) -> ApplicationResult<()> {
        for entry in artifact.entries() {
            out.write_all(&entry.content)
                .with_path_context("write export to output", Path::new(&entry.name))?;
        }
        out.flush()
            .with_path_context("flush export output", Path::new("-"))
    }
}

/// Unpack a zip archive into an export artifact.
///
/// Entries after the first are neither read nor validated unless
/// `include_auxiliary_file` is set.
pub fn unpack_archive(
    bytes: &[u8],
    include_auxiliary_file: bool,
) -> ApplicationResult<ExportArtifact> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| ApplicationError::Archive {
        message: format!("init zip reader: {e}"),
    })?;
    if archive.is_empty() {
        return Err(ApplicationError::Archive {
            message: "archive contains no files".to_string(),
        });
    }

    let retained = if include_auxiliary_file {
        archive.len()
    } else {
        1
    };

    let mut entries = Vec::with_capacity(retained);
    for index in 0..retained {
        let mut file = archive.by_index(index).map_err(|e| ApplicationError::Archive {
            message: format!("reading zipped file #{index}: {e}"),
        })?;
        let name = file.name().to_string();
        if file.enclosed_name().is_none() {
            return Err(ApplicationError::Archive {
                message: format!("entry {name:?} points outside the output directory"),
            });
        }

        let mut content = Vec::new();
        file.read_to_end(&mut content)
            .map_err(|e| ApplicationError::Archive {
                message: format!("reading zipped file {name}: {e}"),
            })?;
        entries.push(ArchiveEntry { name, content });
    }

    if archive.len() > retained {
        debug!(
            "unpack_archive: skipped {} auxiliary entries",
            archive.len() - retained
        );
    }

    Ok(ExportArtifact::new(entries)?)
}
