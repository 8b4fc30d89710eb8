//! Flag surface, error mapping, and dispatch for `myqtt-manager`.

use std::sync::Arc;

use anyhow::anyhow;
use clap::{ArgGroup, Parser, ValueEnum};
use myqtt_admin::{AdminContext, AdminError, EasyConfig};
use myqtt_config::ManagerSettings;
use myqtt_config::defaults::{DEFAULT_BROKER_BIN, DEFAULT_SERVICE_NAME};
use myqtt_system::{CommandRunner, ProcessRunner};
use myqtt_telemetry::{LoggingConfig, init_logging};
use tracing::debug;

use crate::commands::{accounts, domains, easy_config, modules};

/// Parses flags, runs the requested operation, and prints any failure as an
/// `ERROR:` line on stdout. Returns the process exit code.
#[must_use]
pub fn run() -> i32 {
    let cli = Cli::parse();
    if let Err(err) = init_logging(&LoggingConfig::for_debug(cli.debug)) {
        eprintln!("warning: {err:#}");
    }

    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner::new(cli.debug));
    match dispatch(&cli, runner) {
        Ok(()) => 0,
        Err(err) => {
            println!("ERROR: {}", err.display_message());
            err.exit_code()
        }
    }
}

pub(crate) fn dispatch(cli: &Cli, runner: Arc<dyn CommandRunner>) -> CliResult<()> {
    let action = cli.action()?;
    debug!(?action, "dispatching");
    let settings = cli.settings();
    let connect = move || AdminContext::discover(runner, settings).map_err(CliError::from);

    match action {
        Action::ExplainEasyConfig => {
            easy_config::explain();
            Ok(())
        }
        Action::EasyConfig(recipe) => {
            easy_config::handle(&connect()?, recipe, cli.assume_yes, cli.output)
        }
        Action::EnableModule(name) => modules::handle_enable(&connect()?, name),
        Action::DisableModule(name) => modules::handle_disable(&connect()?, name),
        Action::ListModules => modules::handle_list(&connect()?, cli.output),
        Action::ListDomains => domains::handle_list(&connect()?, cli.output),
        Action::CreateDomain(name) => domains::handle_create(&connect()?, name, cli.output),
        Action::AddAccount(raw) => {
            let domain = cli.require_domain("--add-account")?;
            accounts::handle_add(&connect()?, domain, raw)
        }
        Action::SetAccountPassword(raw) => {
            let domain = cli.require_domain("--set-account-password")?;
            accounts::handle_set_password(&connect()?, domain, raw)
        }
        Action::RemoveAccount(client_id) => {
            let domain = cli.require_domain("--remove-account")?;
            accounts::handle_remove(&connect()?, domain, client_id)
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "myqtt-manager",
    version,
    about = "Administrative tool for a MyQtt broker installation",
    group(
        ArgGroup::new("action").args([
            "easy_config",
            "explain_easy_config",
            "enable_mod",
            "disable_mod",
            "list_modules",
            "list_domains",
            "create_domain",
            "add_account",
            "set_account_password",
            "remove_account",
        ])
    )
)]
pub(crate) struct Cli {
    /// Run a named reconfiguration recipe (see --explain-easy-config).
    #[arg(short = 'e', long, value_name = "MODE")]
    pub(crate) easy_config: Option<EasyConfig>,
    /// Describe every easy-config recipe and exit.
    #[arg(short = 'x', long)]
    pub(crate) explain_easy_config: bool,
    /// Skip the confirmation asked before destructive recipes.
    #[arg(short = 'y', long)]
    pub(crate) assume_yes: bool,
    /// Print diagnostic output.
    #[arg(short = 'd', long)]
    pub(crate) debug: bool,
    /// Enable a broker module.
    #[arg(short = 'i', long, value_name = "MOD")]
    pub(crate) enable_mod: Option<String>,
    /// Disable a broker module.
    #[arg(short = 'o', long, value_name = "MOD")]
    pub(crate) disable_mod: Option<String>,
    /// List available modules and whether they are enabled.
    #[arg(short = 'm', long)]
    pub(crate) list_modules: bool,
    /// List configured domains and whether they are active.
    #[arg(short = 'n', long)]
    pub(crate) list_domains: bool,
    /// Create a domain served from the fragment directory.
    #[arg(short = 'g', long, value_name = "NAME")]
    pub(crate) create_domain: Option<String>,
    /// Add an account to DOMAIN: client_id[,username[,password]].
    #[arg(short = 'a', long, value_name = "ACCOUNT")]
    pub(crate) add_account: Option<String>,
    /// Update an account of DOMAIN: client_id[,username],password.
    #[arg(short = 't', long, value_name = "ACCOUNT")]
    pub(crate) set_account_password: Option<String>,
    /// Remove an account from DOMAIN.
    #[arg(short = 'r', long, value_name = "CLIENT_ID")]
    pub(crate) remove_account: Option<String>,
    /// Domain targeted by the account operations.
    #[arg(value_name = "DOMAIN")]
    pub(crate) domain: Option<String>,
    /// Broker binary used for introspection.
    #[arg(long, env = "MYQTT_BROKER_BIN", default_value = DEFAULT_BROKER_BIN)]
    pub(crate) broker_bin: String,
    /// Service restarted or reloaded after changes.
    #[arg(long, env = "MYQTT_SERVICE_NAME", default_value = DEFAULT_SERVICE_NAME)]
    pub(crate) service_name: String,
    #[arg(
        long = "output",
        alias = "format",
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action<'a> {
    EasyConfig(EasyConfig),
    ExplainEasyConfig,
    EnableModule(&'a str),
    DisableModule(&'a str),
    ListModules,
    ListDomains,
    CreateDomain(&'a str),
    AddAccount(&'a str),
    SetAccountPassword(&'a str),
    RemoveAccount(&'a str),
}

impl Cli {
    pub(crate) fn settings(&self) -> ManagerSettings {
        ManagerSettings {
            broker_bin: self.broker_bin.clone(),
            service_name: self.service_name.clone(),
            debug: self.debug,
        }
    }

    pub(crate) fn action(&self) -> CliResult<Action<'_>> {
        let action = if let Some(recipe) = self.easy_config {
            Action::EasyConfig(recipe)
        } else if self.explain_easy_config {
            Action::ExplainEasyConfig
        } else if let Some(name) = &self.enable_mod {
            Action::EnableModule(name)
        } else if let Some(name) = &self.disable_mod {
            Action::DisableModule(name)
        } else if self.list_modules {
            Action::ListModules
        } else if self.list_domains {
            Action::ListDomains
        } else if let Some(name) = &self.create_domain {
            Action::CreateDomain(name)
        } else if let Some(raw) = &self.add_account {
            Action::AddAccount(raw)
        } else if let Some(raw) = &self.set_account_password {
            Action::SetAccountPassword(raw)
        } else if let Some(client_id) = &self.remove_account {
            Action::RemoveAccount(client_id)
        } else {
            return Err(CliError::validation(
                "no operation requested; see --help for the available options",
            ));
        };
        Ok(action)
    }

    fn require_domain(&self, flag: &str) -> CliResult<&str> {
        self.domain
            .as_deref()
            .map(str::trim)
            .filter(|domain| !domain.is_empty())
            .ok_or_else(|| CliError::validation(format!("{flag} requires a DOMAIN argument")))
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl From<AdminError> for CliError {
    fn from(error: AdminError) -> Self {
        match error {
            AdminError::DomainNameInvalid { .. } | AdminError::UnsupportedFormat { .. } => {
                Self::Validation(error.to_string())
            }
            other => Self::Failure(anyhow!(other)),
        }
    }
}
