use serde::{Deserialize, Serialize};

/// What the user asked for when they clicked a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IntentKind {
    ResolveComment,
    ExecuteInCursor,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::ResolveComment => "resolveComment",
            IntentKind::ExecuteInCursor => "executeInCursor",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single user action extracted from a review page, on its way to the
/// background router.
///
/// On the wire this is the page-to-background message: the `kind` is carried
/// in the `type` tag, every other field is camelCased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionIntent {
    #[serde(rename = "type")]
    pub kind: IntentKind,
    pub comment: String,
    pub code_snippet: String,
    /// Repository-relative path of the file the thread is attached to.
    pub file_path: String,
    pub repo_url: String,
    #[serde(default)]
    pub auto_submit: bool,
}

impl ActionIntent {
    pub fn resolve(
        comment: impl Into<String>,
        code_snippet: impl Into<String>,
        file_path: impl Into<String>,
        repo_url: impl Into<String>,
    ) -> Self {
        Self {
            kind: IntentKind::ResolveComment,
            comment: comment.into(),
            code_snippet: code_snippet.into(),
            file_path: file_path.into(),
            repo_url: repo_url.into(),
            auto_submit: false,
        }
    }

    /// Instruction body from an agent prompt block; submitted automatically.
    pub fn execute(
        instruction: impl Into<String>,
        file_path: impl Into<String>,
        repo_url: impl Into<String>,
    ) -> Self {
        Self {
            kind: IntentKind::ExecuteInCursor,
            comment: instruction.into(),
            code_snippet: String::new(),
            file_path: file_path.into(),
            repo_url: repo_url.into(),
            auto_submit: true,
        }
    }

    /// Direct "open this file" action: no comment, no snippet.
    pub fn open_file(file_path: impl Into<String>, repo_url: impl Into<String>) -> Self {
        Self {
            kind: IntentKind::ResolveComment,
            comment: String::new(),
            code_snippet: String::new(),
            file_path: file_path.into(),
            repo_url: repo_url.into(),
            auto_submit: true,
        }
    }

    pub fn is_file_open(&self) -> bool {
        self.comment.is_empty() && self.code_snippet.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    #[serde(rename = "showError")]
    Error,
    #[serde(rename = "showSuccess")]
    Success,
    #[serde(rename = "showInfo")]
    Info,
    #[serde(rename = "showWarning")]
    Warning,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Error => "error",
            NotificationKind::Success => "success",
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Background-to-page message: a transient outcome to show the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, message)
    }
}

/// Anything that travels over the runtime channel, in either direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuntimeMessage {
    Intent(ActionIntent),
    Notification(Notification),
}

impl RuntimeMessage {
    pub fn into_intent(self) -> Option<ActionIntent> {
        match self {
            RuntimeMessage::Intent(intent) => Some(intent),
            RuntimeMessage::Notification(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            RuntimeMessage::Intent(intent) => intent.kind.as_str(),
            RuntimeMessage::Notification(n) => match n.kind {
                NotificationKind::Error => "showError",
                NotificationKind::Success => "showSuccess",
                NotificationKind::Info => "showInfo",
                NotificationKind::Warning => "showWarning",
            },
        }
    }
}

impl From<ActionIntent> for RuntimeMessage {
    fn from(intent: ActionIntent) -> Self {
        RuntimeMessage::Intent(intent)
    }
}

impl From<Notification> for RuntimeMessage {
    fn from(notification: Notification) -> Self {
        RuntimeMessage::Notification(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn intent_serializes_with_type_tag() {
        let intent = ActionIntent::resolve("fix it", "", "src/a.rs", "https://github.com/o/r");
        let value = serde_json::to_value(&intent).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "resolveComment",
                "comment": "fix it",
                "codeSnippet": "",
                "filePath": "src/a.rs",
                "repoUrl": "https://github.com/o/r",
                "autoSubmit": false
            })
        );
    }

    #[test]
    fn runtime_message_distinguishes_directions() {
        let incoming = json!({
            "type": "executeInCursor",
            "comment": "Do the thing",
            "codeSnippet": "",
            "filePath": "src/foo.ts",
            "repoUrl": "https://github.com/acme/widgets"
        });
        let msg: RuntimeMessage = serde_json::from_value(incoming).unwrap();
        let intent = msg.into_intent().unwrap();
        assert_eq!(intent.kind, IntentKind::ExecuteInCursor);
        assert!(!intent.auto_submit);

        let outgoing = json!({"type": "showWarning", "message": "careful"});
        let msg: RuntimeMessage = serde_json::from_value(outgoing).unwrap();
        assert_eq!(msg.type_name(), "showWarning");
        assert!(msg.into_intent().is_none());
    }

    #[test]
    fn open_file_intent_is_classified_as_file_open() {
        let intent = ActionIntent::open_file("a/b.ts", "https://github.com/o/r");
        assert!(intent.is_file_open());
        assert!(intent.auto_submit);
        assert!(!ActionIntent::execute("go", "a/b.ts", "u").is_file_open());
    }
}
