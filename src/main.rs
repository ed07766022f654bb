use std::process;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use admitctl::cli::{
    apply_overrides, build_validator, format_capacity_report, format_validation_json,
    format_validation_report, run_capacity, run_validate, Cli, Commands, OutputFormat,
};
use admitctl::config::{load_config, CLUSTER_TOKEN_ENV};
use admitctl::server::{create_router, AppState};

/// Exit code for a rejected batch
const EXIT_REJECTED: i32 = 1;
/// Exit code when the cluster could not be read
const EXIT_UNAVAILABLE: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env file if specified
    if let Some(ref env_file) = cli.env_file {
        if let Err(e) = dotenvy::from_path(env_file) {
            error!("Failed to load env file {}: {}", env_file.display(), e);
            process::exit(1);
        }
    }

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    use anyhow::Context;

    let mut config = load_config(cli.config.as_deref()).context("loading configuration")?;
    config.apply_cluster_token(std::env::var(CLUSTER_TOKEN_ENV).ok());

    match cli.command {
        Commands::Validate(args) => {
            apply_overrides(&mut config, &args.cluster);
            let report = run_validate(&config, &args.file, args.cluster.snapshot.as_deref())
                .await
                .with_context(|| format!("validating {}", args.file.display()))?;

            match args.output {
                OutputFormat::Table => print!("{}", format_validation_report(&report)),
                OutputFormat::Json => println!("{}", format_validation_json(&report)?),
            }

            if let Some(e) = &report.error {
                process::exit(if e.is_cluster_unavailable() {
                    EXIT_UNAVAILABLE
                } else {
                    EXIT_REJECTED
                });
            }
        }

        Commands::Capacity(args) => {
            apply_overrides(&mut config, &args);
            let report = run_capacity(&config, args.snapshot.as_deref())
                .await
                .context("reading instance class capacity")?;
            print!("{}", format_capacity_report(&report));
        }

        Commands::Serve(args) => {
            apply_overrides(&mut config, &args.cluster);
            let validator = build_validator(&config, args.cluster.snapshot.as_deref())?;
            let state = AppState::new(validator);
            let addr = format!("{}:{}", args.bind_addr, args.port);

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("binding {}", addr))?;

            info!("Server listening on {}", addr);
            info!(
                instance_class = %config.instance_class,
                gateway = %config.ingress_gateway,
                "admission target"
            );
            info!("Endpoints:");
            info!("  GET  /health                 - Health check");
            info!("  GET  /status                 - Admission totals");
            info!("  POST /v1/admission/validate  - Validate a deployment batch");

            axum::serve(listener, create_router(state))
                .await
                .context("server error")?;
        }
    }

    Ok(())
}
