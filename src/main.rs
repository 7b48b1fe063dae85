//! sitescore CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use sitescore::{
    audit::AuditService,
    commands::{
        cmd_add_company, cmd_audit, cmd_comprehensive, cmd_history, cmd_init, cmd_list_companies,
        cmd_show, cmd_status, print_audit_detail, print_audit_report, print_companies,
        print_comprehensive, print_history, print_init, print_status, AuditCommandOptions,
        AuditOutcome, InitOptions,
    },
    config::Config,
    error::{Error, Result},
    mcp::McpServer,
    models::Strategy,
    progress::LogWriterFactory,
    server::{self, AppState},
    store::DEFAULT_HISTORY_LIMIT,
};
use std::path::{Path, PathBuf};
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sitescore")]
#[command(version, about = "SEO audit and scoring CLI with HTTP API and MCP server", long_about = None)]
struct Cli {
    /// Path to config file or base directory
    #[arg(short, long, global = true, env = "SITESCORE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config and create the audit database
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Audit a single URL
    Audit {
        /// Absolute http(s) URL
        url: String,

        /// Skip PageSpeed Insights
        #[arg(long)]
        no_lighthouse: bool,

        /// Skip the external crawler
        #[arg(long)]
        no_crawl: bool,

        /// PageSpeed device profile (defaults to the configured strategy)
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,

        /// Store the result under this company ID
        #[arg(long)]
        company: Option<String>,
    },

    /// Run and store the comprehensive audit for a company
    Comprehensive {
        /// Company ID (use 'sitescore company list' to find it)
        company_id: String,
    },

    /// Manage registered companies
    Company {
        #[command(subcommand)]
        action: CompanyAction,
    },

    /// List stored audits for a company, newest first
    History {
        company_id: String,

        /// Maximum number of audits
        #[arg(short, long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: u32,
    },

    /// Show one stored audit
    Show { audit_id: String },

    /// Show configuration, data sources and database stats
    Status,

    /// Start the HTTP API
    Serve {
        /// Socket address to bind (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Start MCP server on stdio
    Mcp,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum CompanyAction {
    /// Register a company website
    Add {
        name: String,

        /// Absolute http(s) URL of the site
        website: String,

        #[arg(long)]
        industry: Option<String>,
    },

    /// List registered companies
    List,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if cli.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(LogWriterFactory::default()))
            .with(filter)
            .init();
    }
}

/// Base directory and config file for `--config`, which may name either
fn resolve_paths(path: Option<&Path>) -> (PathBuf, PathBuf) {
    match path {
        Some(path) if path.extension().is_some_and(|e| e == "toml") => {
            let base = path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(Config::default_base_dir);
            (base, path.to_path_buf())
        }
        Some(dir) => (dir.to_path_buf(), dir.join("config.toml")),
        None => {
            let base = Config::default_base_dir();
            let config = base.join("config.toml");
            (base, config)
        }
    }
}

/// Load the config file, or defaults plus environment keys when none exists
fn load_config(path: Option<&Path>) -> Result<Config> {
    let (base_dir, config_path) = resolve_paths(path);
    if config_path.exists() {
        return Config::load(&config_path);
    }
    if path.is_some() {
        return Err(Error::Config(format!(
            "Config file not found: {}\nRun 'sitescore init' first.",
            config_path.display()
        )));
    }
    warn!(
        "No config at {}; using defaults (run 'sitescore init' to create one)",
        config_path.display()
    );
    Config::load_from(Some(base_dir))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    // init and completions don't need an existing config
    match &cli.command {
        Commands::Init { force } => {
            let (base_dir, _) = resolve_paths(cli.config.as_deref());
            let summary = cmd_init(InitOptions {
                base_dir,
                force: *force,
            })
            .await?;
            return if cli.json {
                print_json(&summary)
            } else {
                print_init(&summary);
                Ok(())
            };
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "sitescore", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let mut config = load_config(cli.config.as_deref())?;
    if let Commands::Serve { bind: Some(bind) } = &cli.command {
        config.server.bind = bind.clone();
    }

    let service = AuditService::from_config(&config).await?;
    let quiet = cli.json;

    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),

        Commands::Audit {
            url,
            no_lighthouse,
            no_crawl,
            strategy,
            company,
        } => {
            let options = AuditCommandOptions {
                include_lighthouse: !no_lighthouse,
                include_crawl: !no_crawl,
                strategy,
                company_id: company,
                quiet,
            };
            match cmd_audit(&service, &url, options).await? {
                AuditOutcome::Report(report) if cli.json => print_json(&report)?,
                AuditOutcome::Report(report) => print_audit_report(&report),
                AuditOutcome::Stored(audit) if cli.json => print_json(&audit)?,
                AuditOutcome::Stored(audit) => print_audit_detail(&audit),
            }
        }

        Commands::Comprehensive { company_id } => {
            let response = cmd_comprehensive(&service, &company_id, quiet).await?;
            if cli.json {
                print_json(&response)?;
            } else {
                print_comprehensive(&response);
            }
        }

        Commands::Company { action } => match action {
            CompanyAction::Add {
                name,
                website,
                industry,
            } => {
                let company = cmd_add_company(service.store(), &name, &website, industry).await?;
                if cli.json {
                    print_json(&company)?;
                } else {
                    println!("✓ Registered '{}' ({})", company.name, company.website);
                    println!("  ID: {}", company.id);
                }
            }
            CompanyAction::List => {
                let companies = cmd_list_companies(service.store()).await?;
                if cli.json {
                    print_json(&companies)?;
                } else {
                    print_companies(&companies);
                }
            }
        },

        Commands::History { company_id, limit } => {
            let audits = cmd_history(service.store(), &company_id, limit).await?;
            if cli.json {
                print_json(&audits)?;
            } else {
                print_history(&company_id, &audits);
            }
        }

        Commands::Show { audit_id } => {
            let audit = cmd_show(service.store(), &audit_id).await?;
            if cli.json {
                print_json(&audit)?;
            } else {
                print_audit_detail(&audit);
            }
        }

        Commands::Status => {
            let status = cmd_status(&config, &service).await?;
            if cli.json {
                print_json(&status)?;
            } else {
                print_status(&status);
            }
        }

        Commands::Serve { .. } => {
            let addr = config.bind_addr()?;
            server::serve(AppState::new(service), addr).await?;
        }

        Commands::Mcp => {
            McpServer::new(service)
                .run()
                .await
                .map_err(|e| Error::McpProtocol(e.to_string()))?;
        }
    }

    Ok(())
}
