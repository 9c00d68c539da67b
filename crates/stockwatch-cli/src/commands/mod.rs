mod analyze;
mod chart;
mod reports;
mod timer;
mod watchlist;

use std::time::{Duration, Instant};

use serde_json::Value;
use stockwatch_core::{ApiConfig, IdentityResolver, Resolution, StoreClient};
use uuid::Uuid;

use crate::cli::{Cli, Command};
use crate::envelope::{Envelope, EnvelopeError, EnvelopeMeta};
use crate::error::CliError;
use crate::session;

pub use reports::follow as follow_reports;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }
}

/// What every command runs against: a store client and the settled
/// identity of this invocation.
pub struct Context {
    pub client: StoreClient,
    pub resolution: Resolution,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let session = session::load(cli)?;
        let resolver = IdentityResolver::new();
        resolver.update(&session);

        let mut config = ApiConfig::from_env(cli.api_url.as_deref())?;
        if let Some(timeout_ms) = cli.timeout_ms {
            config = config.with_timeout(Duration::from_millis(timeout_ms));
        }
        tracing::debug!(base_url = config.base_url(), timeout_ms = config.timeout_ms(), "store configured");

        Ok(Self {
            client: StoreClient::new(config),
            resolution: resolver.current(),
        })
    }

    pub fn identity_label(&self) -> Option<String> {
        self.resolution.identity().map(ToString::to_string)
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope, CliError> {
    let started = Instant::now();
    let context = Context::from_cli(cli)?;

    let command_result = match &cli.command {
        Command::Watchlist(args) => watchlist::run(args, &context).await?,
        Command::Reports(args) => reports::run(args, &context).await?,
        Command::Chart(args) => chart::run(args, &context).await?,
        Command::Timer(args) => timer::run(args, &context).await?,
        Command::Analyze => analyze::run(&context).await?,
    };

    Ok(envelope(&context, command_result, started))
}

pub fn envelope(context: &Context, result: CommandResult, started: Instant) -> Envelope {
    let CommandResult {
        data,
        warnings,
        errors,
    } = result;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut meta = EnvelopeMeta::new(Uuid::new_v4().to_string(), latency_ms)
        .with_identity(context.identity_label());
    for warning in warnings {
        meta.push_warning(warning);
    }

    Envelope { meta, data, errors }
}
