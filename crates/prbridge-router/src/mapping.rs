use prbridge_types::{ActionIntent, OpenFilePayload, OpenPayload, Repository, ServerPayload};

/// First entry whose normalized url equals `repo_url` exactly.
pub fn find_mapping<'a>(entries: &'a [Repository], repo_url: &str) -> Option<&'a Repository> {
    entries.iter().find(|entry| {
        let normalized = entry.normalized_url();
        tracing::debug!(stored = %entry.url, normalized, repo_url, "comparing repository mapping");
        normalized == repo_url
    })
}

/// Server body for `intent` against the matched checkout. An intent without
/// comment and snippet is a pure file open.
pub fn build_payload(intent: &ActionIntent, entry: &Repository) -> ServerPayload {
    let file_path = format!("{}/{}", entry.path, intent.file_path);
    if intent.is_file_open() {
        ServerPayload::OpenFile(OpenFilePayload {
            file_path,
            workspace_path: entry.path.clone(),
        })
    } else {
        ServerPayload::Open(OpenPayload {
            comment: intent.comment.clone(),
            code_snippet: intent.code_snippet.clone(),
            file_path,
            workspace_path: entry.path.clone(),
            auto_submit: intent.auto_submit,
        })
    }
}
