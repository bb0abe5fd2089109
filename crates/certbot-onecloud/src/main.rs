// # certbot-onecloud - certbot DNS-01 hook for 1cloud.ru
//
// certbot invokes this binary twice per validation: once as the auth hook
// (create mode, the default) and once as the cleanup hook (`-del`). The two
// runs never overlap and hand state to each other through the per-domain
// ledger file `<CERTBOT_DOMAIN>.txt` in the working directory.
//
// ## Configuration
//
// CLI flags:
// - `-api <token>`: 1cloud.ru bearer token (required)
// - `-del`: delete mode (cleanup hook)
//
// Environment variables (set by certbot):
// - `CERTBOT_DOMAIN`: domain under validation
// - `CERTBOT_VALIDATION`: challenge token text (create mode only)
//
// Optional:
// - `HOOK_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// certbot certonly --manual --preferred-challenges dns \
//     --manual-auth-hook "certbot-onecloud -api $TOKEN" \
//     --manual-cleanup-hook "certbot-onecloud -api $TOKEN -del" \
//     -d '*.example.com'
// ```

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use acme_hook_core::domain;
use acme_hook_core::ledger::{Ledger, LedgerEntry};
use acme_hook_onecloud::{CreateTxtRecord, OneCloudClient};

/// Host part of the challenge record name
const ACME_CHALLENGE_NAME: &str = "_acme-challenge";

/// TTL for the challenge TXT record, in seconds
const TXT_RECORD_TTL: u32 = 30;

/// Exit codes for the hook process
///
/// certbot treats any non-zero exit as a failure of the whole
/// issuance/renewal event:
/// - 0: record created / cleaned up
/// - 1: configuration error (bad flags, missing certbot env)
/// - 2: runtime error (parse, HTTP, provider, ledger)
#[derive(Debug, Clone, Copy)]
enum HookExitCode {
    /// Clean exit
    Success = 0,
    /// Configuration error
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<HookExitCode> for ExitCode {
    fn from(code: HookExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Hook configuration, built once at startup
#[derive(Debug)]
struct Config {
    api_token: String,
    delete_mode: bool,
    domain: String,
    validation: Option<String>,
    log_level: String,
}

impl Config {
    /// Load configuration from the process arguments and environment.
    fn load() -> Result<Self> {
        let args: Vec<String> = env::args().skip(1).collect();
        Self::from_args_and_env(&args, |key| env::var(key).ok())
    }

    /// Build configuration from explicit args and an environment lookup.
    fn from_args_and_env<E>(args: &[String], env: E) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut api_token = String::new();
        let mut delete_mode = false;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-api" | "--api" => {
                    api_token = iter
                        .next()
                        .context("-api requires a value")?
                        .clone();
                }
                "-del" | "--del" => delete_mode = true,
                other => anyhow::bail!("unknown flag: {other}"),
            }
        }

        Ok(Self {
            api_token,
            delete_mode,
            domain: env("CERTBOT_DOMAIN").unwrap_or_default(),
            validation: env("CERTBOT_VALIDATION"),
            log_level: env("HOOK_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration before anything runs.
    fn validate(&self) -> Result<()> {
        if self.api_token.is_empty() {
            anyhow::bail!("api key not provided. Pass it via: -api <token>");
        }

        if self.domain.is_empty() {
            anyhow::bail!(
                "CERTBOT_DOMAIN is not set. This binary is meant to run as a \
                certbot --manual-auth-hook / --manual-cleanup-hook"
            );
        }

        if !self.delete_mode && self.validation.as_deref().is_none_or(str::is_empty) {
            anyhow::bail!("CERTBOT_VALIDATION is not set (required in create mode)");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "HOOK_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return HookExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {e}");
        return HookExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return HookExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            return HookExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        if let Err(e) = run(&config).await {
            error!("{e:#}");
            HookExitCode::RuntimeError
        } else {
            HookExitCode::Success
        }
    })
    .into()
}

/// Run the selected pipeline. Fail-fast: the first error aborts.
async fn run(config: &Config) -> Result<()> {
    let client = OneCloudClient::new(config.api_token.clone())?;

    if config.delete_mode {
        run_cleanup(config, &client).await
    } else {
        run_create(config, &client).await
    }
}

/// Create pipeline: parse domain, resolve zone id, create the challenge
/// TXT record, append its ids to the ledger.
async fn run_create(config: &Config, client: &OneCloudClient) -> Result<()> {
    let parsed = domain::parse(&config.domain)?;
    info!(
        "creating TXT record for {} (zone {}, host {})",
        config.domain, parsed.zone, parsed.subdomain
    );

    let validation = config
        .validation
        .as_deref()
        .context("CERTBOT_VALIDATION missing")?;

    let entry = create_challenge_record(
        &parsed,
        validation,
        |zone| async move { client.resolve_zone_id(&zone).await },
        |req| async move { client.create_txt_record(&req).await },
    )
    .await?;

    let ledger = Ledger::for_domain(&config.domain);
    ledger.append(&entry).await?;

    Ok(())
}

/// Resolve the zone, then create the challenge record, in that order.
/// A failed zone resolution aborts before any create call is issued.
async fn create_challenge_record<R, RFut, C, CFut>(
    parsed: &domain::ParsedDomain,
    validation: &str,
    resolve: R,
    create: C,
) -> Result<LedgerEntry>
where
    R: FnOnce(String) -> RFut,
    RFut: Future<Output = acme_hook_core::Result<u64>>,
    C: FnOnce(CreateTxtRecord) -> CFut,
    CFut: Future<Output = acme_hook_core::Result<u64>>,
{
    let zone_id = resolve(parsed.zone.clone())
        .await
        .context("zone resolution failed")?;
    info!("resolved zone {} to id {zone_id}", parsed.zone);

    let req = CreateTxtRecord::new(
        zone_id,
        &parsed.subdomain,
        ACME_CHALLENGE_NAME,
        TXT_RECORD_TTL,
        validation,
    );
    let record_id = create(req).await.context("record creation failed")?;
    info!("created TXT record {record_id}");

    Ok(LedgerEntry { zone_id, record_id })
}

/// Cleanup pipeline: replay the ledger, delete every recorded record,
/// then delete the ledger file. Partial cleanup is not resumed: the first
/// failing delete aborts with the file left in place.
async fn run_cleanup(config: &Config, client: &OneCloudClient) -> Result<()> {
    info!("removing TXT records for {}", config.domain);

    let ledger = Ledger::for_domain(&config.domain);
    let entries = ledger.entries().await?;

    delete_entries(&entries, |entry| {
        client.delete_txt_record(entry.zone_id, entry.record_id)
    })
    .await?;

    ledger.remove().await?;
    Ok(())
}

/// Delete ledger entries in order, stopping at the first failure.
async fn delete_entries<D, Fut>(entries: &[LedgerEntry], delete: D) -> Result<()>
where
    D: Fn(LedgerEntry) -> Fut,
    Fut: Future<Output = acme_hook_core::Result<()>>,
{
    for entry in entries {
        info!("deleting record {} in zone {}", entry.record_id, entry.zone_id);
        delete(*entry)
            .await
            .with_context(|| format!("failed to delete record {entry}"))?;
    }
    Ok(())
}
