//! Configuration resolution and the synchronization session behind `offset` / `apply`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{MediaSource, SyncConfig, SyncError, SyncReport};
use extraction::FileMedia;
use sync_cache::SyncService;
use tracing::info;

use super::run_blocking;
use crate::cli::ConfigArgs;
use crate::error::CliError;

/// Load the configuration file (or defaults) and apply CLI overrides
pub fn load_config(args: &ConfigArgs) -> Result<SyncConfig> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::not_found(path).into());
            }
            ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => SyncConfig::default(),
    };

    if let Some(dir) = &args.cache_dir {
        info!(cache_dir = %dir.display(), "Overriding cache directory from CLI");
        config.cache.dir = dir.clone();
    }
    if let Some(workers) = args.workers {
        info!(workers, "Overriding worker count from CLI");
        config.pool.workers = workers;
    }
    if let Some(max_stderr) = args.max_stderr {
        config.validation.max_stderr = max_stderr;
    }
    if let Some(max_speed_error) = args.max_speed_error {
        config.validation.max_speed_error = max_speed_error;
    }

    ConfigLoader::validate(&config).context("Invalid configuration after overrides")?;
    Ok(config)
}

/// Open a media file as an extraction input
pub fn open_media(path: &Path) -> Result<Arc<dyn MediaSource>> {
    if !path.exists() {
        return Err(CliError::not_found(path).into());
    }
    let media = FileMedia::open(path)
        .with_context(|| format!("Failed to open media {}", path.display()))?;
    Ok(Arc::new(media))
}

/// One ordered pair of inputs bound to a configured service
pub struct SyncSession {
    service: Arc<SyncService>,
    a: Arc<dyn MediaSource>,
    b: Arc<dyn MediaSource>,
}

impl SyncSession {
    pub fn open(config: SyncConfig, a: &Path, b: &Path) -> Result<Self> {
        let a = open_media(a)?;
        let b = open_media(b)?;
        let service = SyncService::new(config).context("Failed to start sync service")?;

        info!(
            identity = %service.identity(a.as_ref(), b.as_ref()),
            state = ?service.state(a.as_ref(), b.as_ref()),
            "Session ready"
        );

        Ok(Self {
            service: Arc::new(service),
            a,
            b,
        })
    }

    /// Compute (or load) the alignment and validate the estimate.
    ///
    /// Validation failures surface as [`CliError::Rejected`].
    pub async fn synchronize(&self) -> Result<SyncReport> {
        let service = Arc::clone(&self.service);
        let (a, b) = (Arc::clone(&self.a), Arc::clone(&self.b));
        let estimate = run_blocking("synchronize", move || service.get_estimate(&a, &b)).await?;

        self.service.validator().report(&estimate).map_err(|e| match e {
            SyncError::SyncUnreliable { .. } | SyncError::SpeedMismatch { .. } => {
                CliError::Rejected {
                    message: e.to_string(),
                }
                .into()
            }
            other => anyhow::Error::from(other),
        })
    }
}
