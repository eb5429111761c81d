//! Release archive fetching.
//!
//! This module defines the [`ArtifactFetcher`] seam and the HTTP
//! implementation used in production.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use flate2::read::GzDecoder;
use tracing::{debug, info};
use url::Url;
use zip::ZipArchive;

use crate::checksum;
use crate::config::InstallConfig;
use crate::error::{InstallError, Result};

/// Everything needed to make one release binary available on disk.
#[derive(Debug, Clone)]
pub struct ArtifactRequest {
    /// Archive URL.
    pub url: Url,
    /// Checksum list URL.
    pub checksum_url: Url,
    /// Whether to verify the archive against the checksum list.
    pub verify_checksum: bool,
    /// Proxy for both downloads.
    pub proxy: Option<Url>,
    /// Archive extension including the leading dot.
    pub extension: String,
    /// Where the downloaded archive is stored.
    pub archive_path: PathBuf,
    /// Directory the archive is extracted into.
    pub dest_dir: PathBuf,
    /// File whose existence means the work is already done.
    pub creates: PathBuf,
}

impl ArtifactRequest {
    /// Builds the request described by an install configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either URL template does not expand to a valid URL.
    pub fn from_config(config: &InstallConfig) -> Result<Self> {
        Ok(Self {
            url: config.download_url()?,
            checksum_url: config.checksum_url()?,
            verify_checksum: config.checksum_verify,
            proxy: config.proxy_url.clone(),
            extension: config.download_extension.clone(),
            archive_path: config.archive_path(),
            dest_dir: config.extract_dir(),
            creates: config.binary_path(),
        })
    }

    /// Returns the archive file name as published (last URL path segment).
    #[must_use]
    pub fn remote_file_name(&self) -> &str {
        self.url
            .path_segments()
            .and_then(Iterator::last)
            .unwrap_or_default()
    }
}

/// Makes a release binary available on disk.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Ensures `request.creates` exists, downloading and extracting if needed.
    ///
    /// Implementations must be a no-op when the file already exists and must
    /// fail on checksum mismatch when verification is requested.
    async fn ensure_installed(&self, request: &ArtifactRequest) -> Result<PathBuf>;
}

/// Fetches release archives over HTTP.
#[derive(Debug, Clone)]
pub struct HttpArtifactFetcher {
    timeout: Duration,
    user_agent: String,
}

impl Default for HttpArtifactFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(120))
    }
}

impl HttpArtifactFetcher {
    /// Creates a fetcher with the given request timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            user_agent: format!("vaultbot-installer/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    fn client(&self, proxy: Option<&Url>) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent);

        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str()).map_err(|source| {
                InstallError::Download {
                    url: proxy.to_string(),
                    source,
                }
            })?;
            builder = builder.proxy(proxy);
        }

        builder.build().map_err(|source| InstallError::Download {
            url: String::new(),
            source,
        })
    }

    async fn get(http: &reqwest::Client, url: &Url) -> Result<Vec<u8>> {
        let download_error = |source| InstallError::Download {
            url: url.to_string(),
            source,
        };

        let response = http.get(url.clone()).send().await.map_err(download_error)?;
        if !response.status().is_success() {
            return Err(InstallError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await.map_err(download_error)?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl ArtifactFetcher for HttpArtifactFetcher {
    async fn ensure_installed(&self, request: &ArtifactRequest) -> Result<PathBuf> {
        if request.creates.exists() {
            debug!(path = %request.creates.display(), "Release already extracted");
            return Ok(request.creates.clone());
        }

        // Reject the format before spending a download on it.
        archive_format(&request.extension)?;

        let http = self.client(request.proxy.as_ref())?;
        info!(url = %request.url, "Downloading release archive");
        let archive = Self::get(&http, &request.url).await?;

        if request.verify_checksum {
            let list = Self::get(&http, &request.checksum_url).await?;
            checksum::verify(
                &archive,
                &String::from_utf8_lossy(&list),
                request.remote_file_name(),
                request.checksum_url.as_str(),
            )?;
            debug!(file = request.remote_file_name(), "Checksum verified");
        }

        tokio::fs::write(&request.archive_path, &archive)
            .await
            .map_err(InstallError::io(&request.archive_path))?;

        let (archive_path, extension, dest_dir) = (
            request.archive_path.clone(),
            request.extension.clone(),
            request.dest_dir.clone(),
        );
        tokio::task::spawn_blocking(move || extract(&archive_path, &extension, &dest_dir))
            .await
            .map_err(|e| InstallError::io(&request.dest_dir)(std::io::Error::other(e)))??;

        if !request.creates.exists() {
            return Err(InstallError::BinaryMissing {
                path: request.creates.clone(),
            });
        }

        info!(path = %request.creates.display(), "Release extracted");
        Ok(request.creates.clone())
    }
}

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveFormat {
    TarGz,
    Zip,
}

fn archive_format(extension: &str) -> Result<ArchiveFormat> {
    match extension {
        ".tar.gz" | ".tgz" => Ok(ArchiveFormat::TarGz),
        ".zip" => Ok(ArchiveFormat::Zip),
        other => Err(InstallError::UnsupportedArchive {
            extension: other.to_string(),
        }),
    }
}

/// Extracts an archive into `dest_dir`.
///
/// Blocking; async callers run it on the blocking pool.
///
/// # Errors
///
/// Returns an error if the format is unsupported or extraction fails.
pub fn extract(archive_path: &Path, extension: &str, dest_dir: &Path) -> Result<()> {
    let format = archive_format(extension)?;
    let file = File::open(archive_path).map_err(InstallError::io(archive_path))?;
    match format {
        ArchiveFormat::TarGz => tar::Archive::new(GzDecoder::new(file))
            .unpack(dest_dir)
            .map_err(InstallError::io(dest_dir)),
        ArchiveFormat::Zip => ZipArchive::new(file)
            .and_then(|mut archive| archive.extract(dest_dir))
            .map_err(|source| InstallError::Extract {
                path: archive_path.to_path_buf(),
                source,
            }),
    }
}
