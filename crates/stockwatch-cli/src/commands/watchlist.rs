use serde::Serialize;
use stockwatch_core::{
    LoadOutcome, Market, Resolution, StoreClient, Symbol, TrackedSymbol, WatchlistError,
    WatchlistReconciler, WatchlistState,
};

use crate::cli::{WatchlistArgs, WatchlistCommand};
use crate::envelope::EnvelopeError;
use crate::error::CliError;

use super::{CommandResult, Context};

#[derive(Debug, Serialize)]
struct AddResponseData {
    added: TrackedSymbol,
    watchlist: WatchlistState,
}

#[derive(Debug, Serialize)]
struct RemoveResponseData {
    removed: String,
    #[serde(flatten)]
    outcome: LoadOutcome,
    watchlist: WatchlistState,
}

pub async fn run(args: &WatchlistArgs, context: &Context) -> Result<CommandResult, CliError> {
    let reconciler = WatchlistReconciler::new(context.client.clone());

    match &args.command {
        WatchlistCommand::List => {
            let outcome = reconciler.settle(context.resolution.clone()).await?;
            let data = serde_json::to_value(reconciler.snapshot())?;
            let result = CommandResult::ok(data);

            Ok(match outcome {
                LoadOutcome::Cleared => {
                    result.with_warning("not signed in; guests have an empty watchlist")
                }
                LoadOutcome::Deferred => {
                    result.with_warning("session is still resolving; nothing was loaded")
                }
                LoadOutcome::Loaded { .. } | LoadOutcome::Stale => result,
            })
        }
        WatchlistCommand::Add(add) => {
            let market: Market = add.market.parse()?;
            let errors = sync(&reconciler, &context.resolution).await?;

            let added = reconciler.add(&add.symbol, market).await?;
            let data = serde_json::to_value(AddResponseData {
                added,
                watchlist: reconciler.snapshot(),
            })?;
            Ok(CommandResult::ok(data).with_errors(errors))
        }
        WatchlistCommand::Remove(remove) => {
            let errors = sync(&reconciler, &context.resolution).await?;
            let requested = Symbol::from_store(&remove.symbol);
            let removed = reconciler
                .snapshot()
                .stored_symbol(&requested)
                .unwrap_or(&requested)
                .to_string();

            let outcome = reconciler.remove(&remove.symbol).await?;
            let data = serde_json::to_value(RemoveResponseData {
                removed,
                outcome,
                watchlist: reconciler.snapshot(),
            })?;
            Ok(CommandResult::ok(data).with_errors(errors))
        }
    }
}

/// Loads the current list before a mutation. A failed load is reported next
/// to the result; the mutation still goes ahead.
async fn sync(
    reconciler: &WatchlistReconciler<StoreClient>,
    resolution: &Resolution,
) -> Result<Vec<EnvelopeError>, CliError> {
    match reconciler.settle(resolution.clone()).await {
        Ok(_) => Ok(Vec::new()),
        Err(WatchlistError::Remote(error)) => {
            tracing::warn!(%error, "could not load watchlist before mutation");
            Ok(vec![EnvelopeError::from(&error)])
        }
        Err(other) => Err(other.into()),
    }
}
