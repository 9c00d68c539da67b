use stockwatch_core::TimerSetting;

use crate::cli::TimerArgs;
use crate::error::CliError;

use super::{CommandResult, Context};

pub async fn run(args: &TimerArgs, context: &Context) -> Result<CommandResult, CliError> {
    let setting = TimerSetting::parse(&args.time)?;
    let ack = context
        .client
        .set_timer(context.resolution.identity(), &setting)
        .await?;

    let result = CommandResult::ok(serde_json::to_value(ack)?);
    Ok(match context.resolution.identity() {
        Some(_) => result,
        None => result.with_warning("timer set without a signed-in identity"),
    })
}
