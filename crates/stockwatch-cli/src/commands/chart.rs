use serde::Serialize;
use stockwatch_core::{ChartPoint, Market, Symbol, Trend};

use crate::cli::ChartArgs;
use crate::error::CliError;

use super::{CommandResult, Context};

#[derive(Debug, Serialize)]
struct ChartResponseData {
    symbol: Symbol,
    market: Market,
    trend: Trend,
    points: Vec<ChartPoint>,
}

pub async fn run(args: &ChartArgs, context: &Context) -> Result<CommandResult, CliError> {
    let market: Market = args.market.parse()?;
    let symbol = Symbol::parse(&args.symbol)?;

    let series = context.client.chart(market, &symbol).await?;
    let trend = series.trend();
    let empty = series.points.is_empty();

    let data = serde_json::to_value(ChartResponseData {
        symbol: series.symbol,
        market: series.market,
        trend,
        points: series.points,
    })?;

    let result = CommandResult::ok(data);
    Ok(if empty {
        result.with_warning(format!("no price history for {symbol} on {market}"))
    } else {
        result
    })
}
