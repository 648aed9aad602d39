use prbridge_router::MessageRouter;
use prbridge_types::ActionIntent;

/// Builds the intent a page click would have produced.
pub(crate) fn build_intent(
    repo_url: String,
    file: String,
    comment: Option<String>,
    snippet: Option<String>,
    execute: bool,
) -> anyhow::Result<ActionIntent> {
    let file = file.trim().trim_start_matches('/').to_string();
    if file.is_empty() {
        anyhow::bail!("File path is empty");
    }
    let comment = comment.unwrap_or_default();
    let snippet = snippet.unwrap_or_default();

    if execute {
        if comment.trim().is_empty() {
            anyhow::bail!("--execute needs --comment with the instruction to run");
        }
        return Ok(ActionIntent::execute(comment, file, repo_url));
    }
    if comment.is_empty() && snippet.is_empty() {
        return Ok(ActionIntent::open_file(file, repo_url));
    }
    Ok(ActionIntent::resolve(comment, snippet, file, repo_url))
}

pub(crate) async fn handle_send(router: &MessageRouter, intent: ActionIntent) -> anyhow::Result<()> {
    match router.handle(&intent).await {
        Ok(delivery) => {
            println!("{}", delivery.message());
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "send failed");
            anyhow::bail!("{}", e.user_message())
        }
    }
}
