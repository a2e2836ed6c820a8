//! Keel CLI - render a bootstrap payload from a site manifest.
//!
//! # Configuration
//!
//! Process settings are loaded from multiple sources with priority:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`KEEL_*`)
//! 3. Project config (`.keel/config.toml` under `-C`, default current directory)
//! 4. Global config (`~/.keel/config.toml`)
//! 5. Default values (lowest priority)
//!
//! Site data (options, contexts, users, permissions, resource types,
//! namespaces) comes from the manifest given with `--manifest`.
//!
//! # Exit Codes
//!
//! - `0`: payload printed (empty for an unauthenticated caller)
//! - `1`: configuration, manifest or usage error
//! - `2`: request refused (bad context, security filter failure)

mod manifest;

use anyhow::Result;
use clap::Parser;
use keel_runtime::{
    BootstrapError, BootstrapRequest, BootstrapResponse, Collaborators, ConfigBootstrap,
    ConfigLoader, ConfigResolver, ErrorCode, KeelConfig, ResourceTypeRegistry, SessionLockTable,
};
use manifest::SiteManifest;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Keel CLI - configuration bootstrap payload renderer
#[derive(Parser, Debug)]
#[command(name = "keel")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Project root directory (defaults to current directory)
    #[arg(short = 'C', long)]
    project: Option<PathBuf>,

    /// Site manifest (TOML)
    #[arg(short, long, value_name = "FILE")]
    manifest: PathBuf,

    /// Manifest user to run as (anonymous if omitted)
    #[arg(short, long)]
    user: Option<String>,

    /// Explicit working context key
    #[arg(long)]
    context: Option<String>,

    /// Action identifier (numeric ids use the legacy action table)
    #[arg(long)]
    action: Option<String>,

    /// Namespace used with a non-numeric action
    #[arg(long)]
    namespace: Option<String>,

    /// Override the default context (also: KEEL_DEFAULT_CONTEXT)
    #[arg(long)]
    default_context: Option<String>,

    /// Print a Content-Type header line before the body
    #[arg(long)]
    headers: bool,
}

/// CLI-based configuration resolver.
///
/// Applies CLI argument overrides on top of [`ConfigLoader`] output.
struct CliConfigResolver {
    default_context: Option<String>,
}

impl CliConfigResolver {
    fn from_args(args: &Args) -> Self {
        Self {
            default_context: args.default_context.clone(),
        }
    }
}

impl ConfigResolver for CliConfigResolver {
    fn apply(&self, config: &mut KeelConfig) {
        if let Some(ref ctx) = self.default_context {
            config.default_context.clone_from(ctx);
        }
    }
}

fn init_tracing(args: &Args) {
    // --debug > --verbose > RUST_LOG > "warn"
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(&args);

    let project_root = args.project.clone().unwrap_or_else(|| {
        std::env::current_dir().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to get current directory, using '.'");
            PathBuf::from(".")
        })
    });
    info!(path = %project_root.display(), "Project root");

    let mut settings = ConfigLoader::new()
        .with_project_root(&project_root)
        .load()
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;
    CliConfigResolver::from_args(&args).apply(&mut settings);
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;
    debug!(realm = %settings.realm, default_context = %settings.default_context, "Settings resolved");

    let registry = ResourceTypeRegistry::global();
    let site = SiteManifest::load(&args.manifest)?.into_site(&registry)?;
    let (session, user_settings) = site.session(args.user.as_deref())?;

    let services = Collaborators {
        contexts: site.contexts.clone(),
        registry,
        namespaces: site.namespaces.clone(),
        catalog: site.catalog.clone(),
        policy: site.grants.clone(),
        routes: site.routes.clone(),
        lexicon: site.lexicon.clone(),
    };
    let bootstrap = ConfigBootstrap::new(settings, Arc::new(site.system.clone()), services)?;

    let locks = SessionLockTable::new();
    let mut request = BootstrapRequest::new(session, Arc::clone(&site.current_context))
        .with_user_settings(user_settings)
        .with_session_lock(Box::new(locks.acquire("cli")));
    if let Some(ref key) = args.context {
        request = request.with_context_key(key.as_str());
    }
    if let Some(ref action) = args.action {
        request = request.with_action(action.as_str());
    }
    if let Some(ref namespace) = args.namespace {
        request = request.with_namespace(namespace.as_str());
    }

    match bootstrap.run(request) {
        Ok(response) => {
            print_response(&response, args.headers)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            report(&err);
            Ok(ExitCode::from(2))
        }
    }
}

fn print_response(response: &BootstrapResponse, headers: bool) -> Result<()> {
    let mut out = std::io::stdout().lock();
    if let BootstrapResponse::Script(payload) = response {
        if headers {
            writeln!(out, "Content-Type: {}", payload.content_type())?;
            writeln!(out)?;
        }
        out.write_all(payload.body().as_bytes())?;
    } else {
        info!("Caller is not authenticated, nothing to emit");
    }
    out.flush()?;
    Ok(())
}

fn report(err: &BootstrapError) {
    tracing::warn!(code = err.code(), "Bootstrap refused");
    eprintln!("Error: {err}");
}
