use std::{path::PathBuf, process::exit, sync::Arc};

use clap::Parser;
use compact_str::{format_compact, ToCompactString};
use gitlab_ci_masters::{
    client::JsonConverter,
    config::{default_config_path, load_config},
    logging::{init_logging, LoggingConfig},
    register_masters,
    result::{AppError, Result},
    BuildService, BuildServices, GitlabCiMasters, SharedBuildServices,
};
use tracing::{error, info, warn};

/// Builds the configured GitLab CI masters and lists the registered build services
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Alternate path to the configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print the path to the configuration file and exit.
    #[arg(short, long)]
    print_config_path: bool,
    /// Only build the registry; exit non-zero if the configuration is invalid.
    #[arg(long)]
    check: bool,
    /// Call every master once to confirm address and token.
    #[arg(long, conflicts_with = "check")]
    verify: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let config_path = args.config.unwrap_or_else(default_config_path);

    if args.print_config_path {
        println!("{}", config_path.display());
        exit(0);
    }

    let config = load_config(&config_path)?;

    let _log_guard = init_logging(LoggingConfig::from_env())
        .map_err(|e| AppError::LoggingError(e.to_compact_string()))?;
    info!(version = env!("CARGO_PKG_VERSION"), config = %config_path.display(), "Starting up");

    let converter = Arc::new(JsonConverter::new());
    let mut builder = BuildServices::builder();
    let masters = register_masters(&mut builder, &config, &converter).map_err(AppError::from)?;
    let registry = SharedBuildServices::new(builder.build());

    if args.check {
        info!(services = registry.load().len(), "Configuration is valid");
        return Ok(());
    }

    if args.verify {
        verify_masters(&masters)?;
        return Ok(());
    }

    for service in registry.load().all_services() {
        let permissions = service.permissions();
        let address = masters
            .get(service.name())
            .map(|m| m.host().address.clone())
            .unwrap_or_default();
        println!(
            "{}\t{}\t{}\t{}",
            service.name(),
            service.provider(),
            address,
            if permissions.is_restricted() { "restricted" } else { "unrestricted" }
        );
    }

    Ok(())
}

fn verify_masters(masters: &GitlabCiMasters) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        AppError::GeneralError(format_compact!("Failed to create runtime: {e}"))
    })?;

    let failures = rt.block_on(async {
        let mut failures = 0usize;
        for (name, service) in masters {
            match service.client().validate_connection().await {
                Ok(()) => info!(name = %name, "Master reachable"),
                Err(e) if e.is_retryable() => {
                    warn!(name = %name, error = %e, "Master temporarily unavailable");
                    failures += 1;
                },
                Err(e) => {
                    error!(name = %name, error = %e, "Master verification failed");
                    failures += 1;
                },
            }
        }
        failures
    });

    if failures > 0 {
        return Err(AppError::GeneralError(format_compact!(
            "{failures} of {} GitLab CI masters failed verification",
            masters.len()
        )));
    }

    Ok(())
}
