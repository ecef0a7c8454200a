//! Command implementations for the CLI.

use crate::output::{self, OutputFormat};
use crate::scenario::{ScenarioSettings, SimpleQdrantUser};
use anyhow::{Context, Result};
use loadgen_core::{DistanceMetric, LoadConfig, Runner, RunnerConfig, StatsCollector, VectorSpace};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Command-line overrides for `loadgen run`. Unset fields keep the
/// configuration file or environment value.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub host: Option<String>,
    pub users: Option<usize>,
    pub run_time_secs: Option<u64>,
    pub collection: Option<String>,
    pub dimension: Option<u64>,
}

/// Build the effective configuration: file (or defaults), environment, then
/// command-line flags.
pub async fn resolve_config(path: Option<&Path>, options: &RunOptions) -> Result<LoadConfig> {
    let mut config = match path {
        Some(path) => LoadConfig::load_from_path(path)
            .await
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => {
            let mut config = LoadConfig::default();
            config.merge_env_vars()?;
            config
        }
    };

    if let Some(users) = options.users {
        config.run.users = users;
    }
    if let Some(secs) = options.run_time_secs {
        config.run.run_time_secs = secs;
    }
    if let Some(collection) = &options.collection {
        config.qdrant.collection_name = Some(collection.clone());
    }
    if let Some(size) = options.dimension {
        let distance = config
            .qdrant
            .vectors
            .map(|v| v.distance)
            .unwrap_or(DistanceMetric::Cosine);
        config.qdrant.vectors = Some(VectorSpace::new(size, distance));
    }

    config.validate()?;
    Ok(config)
}

/// Run the bundled scenario and print its report.
pub async fn run_scenario(path: Option<&Path>, options: RunOptions, format: OutputFormat) -> Result<()> {
    let config = resolve_config(path, &options).await?;
    let settings = ScenarioSettings::from_config(&config);

    let runner_config = RunnerConfig {
        users: config.run.users,
        run_time: config.run.run_time(),
        host: options.host.clone(),
    };
    let target = runner_config.host.clone().unwrap_or_else(|| settings.qdrant.url.clone());

    info!(
        "Running {} user(s) for {}s against {}",
        runner_config.users, config.run.run_time_secs, target
    );

    let stats = Arc::new(StatsCollector::new());
    let runner = Runner::new(runner_config, stats.clone());
    let summary = runner
        .run(move |ctx| {
            let settings = settings.clone();
            async move { SimpleQdrantUser::build(ctx, settings).await }
        })
        .await;

    output::print_run(&summary, &stats.report(), format)?;

    if summary.users_started == 0 {
        warn!("No user started");
        anyhow::bail!("No virtual user could start; is Qdrant reachable at {}?", target);
    }

    Ok(())
}

/// Write a configuration file holding the scenario defaults.
pub async fn init_config(path: &Path, force: bool) -> Result<()> {
    if !force && tokio::fs::try_exists(path).await.unwrap_or(false) {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let mut config = LoadConfig::default();
    let settings = ScenarioSettings::from_config(&config);
    config.qdrant = settings.qdrant;

    config
        .save_to_path(path)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    output::success(format!("Wrote configuration to {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::DEFAULT_COLLECTION;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_flags_override_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loadgen.toml");
        tokio::fs::write(
            &path,
            r#"
[qdrant]
url = "http://qdrant:6334"
collection_name = "from_file"

[qdrant.vectors]
size = 64
distance = "dot"

[run]
users = 2
run_time_secs = 10
"#,
        )
        .await
        .unwrap();

        let options = RunOptions {
            users: Some(8),
            run_time_secs: Some(5),
            collection: Some("from_flag".to_string()),
            dimension: Some(32),
            ..Default::default()
        };
        let config = resolve_config(Some(&path), &options).await.unwrap();

        assert_eq!(config.run.users, 8);
        assert_eq!(config.run.run_time_secs, 5);
        assert_eq!(config.qdrant.collection_name.as_deref(), Some("from_flag"));
        assert_eq!(config.qdrant.vectors, Some(VectorSpace::new(32, DistanceMetric::Dot)));
    }

    #[tokio::test]
    async fn test_invalid_flags_are_rejected() {
        let options = RunOptions {
            users: Some(0),
            ..Default::default()
        };
        assert!(resolve_config(None, &options).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(resolve_config(Some(&path), &RunOptions::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_init_config_writes_scenario_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loadgen.toml");

        init_config(&path, false).await.unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let written: LoadConfig = toml::from_str(&content).unwrap();

        assert_eq!(written.qdrant.collection_name.as_deref(), Some(DEFAULT_COLLECTION));
        assert_eq!(written.qdrant.vectors.map(|v| v.size), Some(128));

        assert!(init_config(&path, false).await.is_err());
        assert!(init_config(&path, true).await.is_ok());
    }
}
