use std::future::Future;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, Instrument, Span};

use crate::error::BotResult;
use crate::slack::commands::{build_reply, ParsedCommand};
use crate::state::AppState;

/// Run `job` in the background on `jobs`, logging its failure. The request
/// that triggered it has already been acknowledged.
pub fn spawn_job<F>(jobs: &TaskTracker, span: Span, job: F)
where
    F: Future<Output = BotResult<()>> + Send + 'static,
{
    jobs.spawn(
        async move {
            if let Err(e) = job.await {
                error!("Background job failed: {}", e);
            }
        }
        .instrument(span),
    );
}

/// Translate a slash command's text and reply through its response URL.
pub async fn handle_command(state: &AppState, command: ParsedCommand) -> BotResult<()> {
    let ParsedCommand::Translate {
        text,
        user_id,
        response_url,
        response_type,
    } = command
    else {
        return Ok(());
    };

    let result = state.auto_translator.auto_translate(&text).await?;
    let language_name = state.languages.display_name(result.target.as_deref());

    let reply = build_reply(&user_id, &text, &language_name, &result.text, response_type);
    state.chat.reply_via_callback(&response_url, &reply).await?;

    debug!("Replied to {} in {}", user_id, language_name);
    Ok(())
}

/// Translate the text of a mention and post the result to its channel.
pub async fn handle_mention(state: &AppState, text: String, channel: String) -> BotResult<()> {
    let result = state.auto_translator.auto_translate(&text).await?;
    state.chat.post_to_channel(&result.text, &channel).await?;

    debug!(
        "Posted {:?} -> {:?} translation to {}",
        result.source, result.target, channel
    );
    Ok(())
}
