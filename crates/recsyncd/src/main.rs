// # recsyncd - recsync command-line front end
//
// A thin integration layer: all reconciliation logic lives in recsync-core.
//
// The binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Registering registrars
// 4. Running one command against the Reconciler
//
// ## Configuration
//
// ### Registrar
// - `RECSYNC_REGISTRAR_TYPE`: Registrar type (inwx, memory)
// - `RECSYNC_INWX_USERNAME`, `RECSYNC_INWX_PASSWORD`: INWX credentials
// - `RECSYNC_INWX_SANDBOX`: Use the OT&E sandbox (true/false)
// - `RECSYNC_MEMORY_ZONES`: Comma-separated zones for the memory registrar
//
// ### Engine
// - `RECSYNC_DOMAIN_FILTER`: Comma-separated zones to manage (default: all)
// - `RECSYNC_DEFAULT_TTL`: TTL for endpoints without one (default: 3600)
// - `RECSYNC_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Commands
//
// - `zones` (default): log the zones visible to the account
// - `records`: print the observed records as JSON
// - `apply <changes.json>`: apply a change set
//
// ## Example
//
// ```bash
// export RECSYNC_INWX_USERNAME=me
// export RECSYNC_INWX_PASSWORD=secret
// export RECSYNC_INWX_SANDBOX=true
// export RECSYNC_DOMAIN_FILTER=example.com
//
// recsyncd apply changes.json
// ```

use anyhow::{Context, Result};
use recsync_core::{
    ChangeSet, DomainFilter, EngineConfig, Reconciler, RegistrarConfig, RegistrarRegistry,
    SyncConfig,
};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Success
/// - 1: Configuration or startup error
/// - 2: Runtime error
#[derive(Debug, Clone, Copy)]
enum RecsyncExitCode {
    /// Command completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (registrar or pass failure)
    RuntimeError = 2,
}

impl From<RecsyncExitCode> for ExitCode {
    fn from(code: RecsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Command selected on the command line
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Zones,
    Records,
    Apply(PathBuf),
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        match args {
            [] => Ok(Command::Zones),
            [cmd] if cmd == "zones" => Ok(Command::Zones),
            [cmd] if cmd == "records" => Ok(Command::Records),
            [cmd, path] if cmd == "apply" => Ok(Command::Apply(PathBuf::from(path))),
            [cmd] if cmd == "apply" => anyhow::bail!("apply requires a change set path"),
            _ => anyhow::bail!(
                "unknown command '{}'. Usage: recsyncd [zones | records | apply <changes.json>]",
                args.join(" ")
            ),
        }
    }
}

/// Application configuration
struct Config {
    registrar_type: String,
    inwx_username: String,
    inwx_password: String,
    inwx_sandbox: bool,
    memory_zones: Vec<String>,
    domain_filter: String,
    default_ttl: Option<String>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            registrar_type: var("RECSYNC_REGISTRAR_TYPE").unwrap_or_else(|| "inwx".to_string()),
            inwx_username: var("RECSYNC_INWX_USERNAME").unwrap_or_default(),
            inwx_password: var("RECSYNC_INWX_PASSWORD").unwrap_or_default(),
            inwx_sandbox: var("RECSYNC_INWX_SANDBOX")
                .is_some_and(|s| matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes")),
            memory_zones: split_list(&var("RECSYNC_MEMORY_ZONES").unwrap_or_default()),
            domain_filter: var("RECSYNC_DOMAIN_FILTER").unwrap_or_default(),
            default_ttl: var("RECSYNC_DEFAULT_TTL"),
            log_level: var("RECSYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Validate the configuration and build the engine configuration
    fn to_sync_config(&self) -> Result<SyncConfig> {
        let registrar = match self.registrar_type.as_str() {
            "inwx" => {
                if self.inwx_username.is_empty() || self.inwx_password.is_empty() {
                    anyhow::bail!(
                        "RECSYNC_INWX_USERNAME and RECSYNC_INWX_PASSWORD are required. \
                        Set them via: export RECSYNC_INWX_USERNAME=... RECSYNC_INWX_PASSWORD=..."
                    );
                }
                RegistrarConfig::Inwx {
                    username: self.inwx_username.clone(),
                    password: self.inwx_password.clone(),
                    sandbox: self.inwx_sandbox,
                }
            }
            "memory" => RegistrarConfig::Memory {
                zones: self.memory_zones.clone(),
            },
            other => anyhow::bail!(
                "RECSYNC_REGISTRAR_TYPE '{}' is not supported. \
                Supported registrars: inwx, memory",
                other
            ),
        };

        let default_ttl = match &self.default_ttl {
            Some(raw) => raw.trim().parse::<u32>().with_context(|| {
                format!("RECSYNC_DEFAULT_TTL must be a number of seconds. Got: {}", raw)
            })?,
            None => EngineConfig::default().default_ttl,
        };

        let filter = DomainFilter::parse(&self.domain_filter);
        for domain in filter.domains() {
            validate_domain_name(domain)?;
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "RECSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        let mut config = SyncConfig::new(registrar).with_domain_filter(filter);
        config.engine.default_ttl = default_ttl;
        config.validate()?;
        Ok(config)
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Basic RFC 1035 shape check for a domain filter entry
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }
        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }
        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }
        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            return RecsyncExitCode::ConfigError.into();
        }
    };

    let config = Config::from_env();
    let sync_config = match config.to_sync_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration validation error: {:#}", e);
            return RecsyncExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return RecsyncExitCode::ConfigError.into();
    }

    info!(
        "Starting recsyncd ({} registrar, {} filtered zone(s))",
        sync_config.registrar.type_name(),
        sync_config.domain_filter.domains().len()
    );

    let registry = RegistrarRegistry::with_builtin();
    #[cfg(feature = "inwx")]
    recsync_registrar_inwx::register(&registry);

    let reconciler = match registry
        .create_registrar(&sync_config.registrar)
        .and_then(|registrar| Reconciler::new(registrar, &sync_config))
    {
        Ok(reconciler) => reconciler,
        Err(e) => {
            error!("Failed to create registrar: {}", e);
            return RecsyncExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return RecsyncExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run(&reconciler, command).await {
            error!("{:#}", e);
            RecsyncExitCode::RuntimeError
        } else {
            RecsyncExitCode::Success
        }
    });

    result.into()
}

/// Run one command
async fn run(reconciler: &Reconciler, command: Command) -> Result<()> {
    match command {
        Command::Zones => {
            reconciler
                .check_zones()
                .await
                .context("zone check failed")?;
        }
        Command::Records => {
            let endpoints = reconciler.records().await?;
            println!("{}", serde_json::to_string_pretty(&endpoints)?);
        }
        Command::Apply(path) => {
            let changes = ChangeSet::from_json_file(&path)
                .with_context(|| format!("failed to load change set {}", path.display()))?;
            info!("Applying {} change(s) from {}", changes.len(), path.display());
            match reconciler.apply_changes(&changes).await {
                Ok(summary) => println!(
                    "{} created, {} updated, {} deleted, {} skipped",
                    summary.created, summary.updated, summary.deleted, summary.skipped
                ),
                Err(e) => {
                    if let recsync_core::Error::Aggregate { errors } = &e {
                        for err in errors {
                            error!("  {}", err);
                        }
                    }
                    return Err(e.into());
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse(&args(&[])).unwrap(), Command::Zones);
        assert_eq!(Command::parse(&args(&["records"])).unwrap(), Command::Records);
        assert_eq!(
            Command::parse(&args(&["apply", "changes.json"])).unwrap(),
            Command::Apply(PathBuf::from("changes.json"))
        );
        assert!(Command::parse(&args(&["apply"])).is_err());
        assert!(Command::parse(&args(&["frobnicate"])).is_err());
    }

    #[test]
    fn inwx_requires_credentials() {
        assert!(config(&[]).to_sync_config().is_err());

        let cfg = config(&[
            ("RECSYNC_INWX_USERNAME", "me"),
            ("RECSYNC_INWX_PASSWORD", "secret"),
            ("RECSYNC_INWX_SANDBOX", "true"),
        ])
        .to_sync_config()
        .unwrap();
        assert!(matches!(cfg.registrar, RegistrarConfig::Inwx { sandbox: true, .. }));
    }

    #[test]
    fn memory_registrar_with_filter_and_ttl() {
        let cfg = config(&[
            ("RECSYNC_REGISTRAR_TYPE", "memory"),
            ("RECSYNC_MEMORY_ZONES", "example.com, example.org"),
            ("RECSYNC_DOMAIN_FILTER", "example.com"),
            ("RECSYNC_DEFAULT_TTL", "300"),
        ])
        .to_sync_config()
        .unwrap();

        assert_eq!(cfg.engine.default_ttl, 300);
        assert!(cfg.domain_filter.matches("example.com"));
        assert!(!cfg.domain_filter.matches("example.org"));
        match cfg.registrar {
            RegistrarConfig::Memory { zones } => assert_eq!(zones, vec!["example.com", "example.org"]),
            other => panic!("unexpected registrar {:?}", other),
        }
    }

    #[test]
    fn rejects_bad_values() {
        let memory = ("RECSYNC_REGISTRAR_TYPE", "memory");
        assert!(config(&[("RECSYNC_REGISTRAR_TYPE", "route53")]).to_sync_config().is_err());
        assert!(config(&[memory, ("RECSYNC_DEFAULT_TTL", "soon")]).to_sync_config().is_err());
        assert!(config(&[memory, ("RECSYNC_DEFAULT_TTL", "0")]).to_sync_config().is_err());
        assert!(config(&[memory, ("RECSYNC_DOMAIN_FILTER", "bad_label.com")]).to_sync_config().is_err());
        assert!(config(&[memory, ("RECSYNC_LOG_LEVEL", "loud")]).to_sync_config().is_err());
    }

    #[tokio::test]
    async fn apply_command_runs_against_memory_registrar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.json");
        std::fs::write(
            &path,
            r#"{"Create": [{"dnsName": "www.example.com", "targets": ["1.2.3.4"], "recordType": "A"}]}"#,
        )
        .unwrap();

        let cfg = config(&[
            ("RECSYNC_REGISTRAR_TYPE", "memory"),
            ("RECSYNC_MEMORY_ZONES", "example.com"),
        ])
        .to_sync_config()
        .unwrap();
        let registry = RegistrarRegistry::with_builtin();
        let reconciler = Reconciler::new(registry.create_registrar(&cfg.registrar).unwrap(), &cfg).unwrap();

        run(&reconciler, Command::Apply(path)).await.unwrap();
        run(&reconciler, Command::Zones).await.unwrap();
        assert!(
            run(&reconciler, Command::Apply(dir.path().join("missing.json")))
                .await
                .is_err()
        );
    }
}
