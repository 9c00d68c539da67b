use crate::error::CliError;

use super::{CommandResult, Context};

pub async fn run(context: &Context) -> Result<CommandResult, CliError> {
    let ack = context.client.trigger_analysis().await?;
    Ok(CommandResult::ok(serde_json::to_value(ack)?))
}
