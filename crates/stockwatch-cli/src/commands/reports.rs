use std::time::{Duration, Instant};

use serde::Serialize;
use stockwatch_core::{DateFilter, Report, ReportPoller};

use crate::cli::{Cli, ReportsArgs};
use crate::error::CliError;
use crate::output;

use super::{envelope, CommandResult, Context};

#[derive(Debug, Serialize)]
struct ReportsResponseData {
    filter: DateFilter,
    reports: Vec<Report>,
}

pub async fn run(args: &ReportsArgs, context: &Context) -> Result<CommandResult, CliError> {
    let filter: DateFilter = args.date.parse()?;
    let reports = context.client.list_reports(filter).await?;
    batch_result(filter, reports)
}

/// Polls until interrupted, printing one envelope per changed batch.
pub async fn follow(cli: &Cli, args: &ReportsArgs) -> Result<(), CliError> {
    let context = Context::from_cli(cli)?;
    let filter: DateFilter = args.date.parse()?;
    let feed = ReportPoller::new(context.client.clone(), filter)
        .with_interval(Duration::from_secs(args.interval_secs))
        .spawn();
    tracing::info!(%filter, interval_secs = args.interval_secs, "following reports");

    let mut reports = feed.subscribe();
    let mut last_printed: Option<Vec<Report>> = None;
    let mut started = Instant::now();

    let outcome = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => break signal.map_err(CliError::from),
            changed = reports.changed() => {
                if changed.is_err() {
                    break Ok(());
                }

                let batch = reports.borrow_and_update().clone();
                if last_printed.as_ref() == Some(&batch) {
                    continue;
                }

                let emitted = batch_result(filter, batch.clone()).and_then(|result| {
                    output::render(&envelope(&context, result, started), cli.format, cli.pretty)
                });
                if let Err(error) = emitted {
                    break Err(error);
                }
                last_printed = Some(batch);
                started = Instant::now();
            }
        }
    };

    feed.shutdown().await;
    outcome
}

fn batch_result(filter: DateFilter, reports: Vec<Report>) -> Result<CommandResult, CliError> {
    let empty = reports.is_empty();
    let data = serde_json::to_value(ReportsResponseData { filter, reports })?;
    let result = CommandResult::ok(data);

    Ok(if empty {
        result.with_warning(format!("no reports for {filter}"))
    } else {
        result
    })
}
