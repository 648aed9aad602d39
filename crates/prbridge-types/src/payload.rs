use serde::{Deserialize, Serialize};

pub const OPEN_ENDPOINT: &str = "/open";
pub const OPEN_FILE_ENDPOINT: &str = "/open-file";

/// Body of `POST /open`: open the file and paste into the assistant chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPayload {
    pub comment: String,
    pub code_snippet: String,
    /// Absolute path on the local machine.
    pub file_path: String,
    pub workspace_path: String,
    pub auto_submit: bool,
}

/// Body of `POST /open-file`: just open the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenFilePayload {
    pub file_path: String,
    pub workspace_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerPayload {
    Open(OpenPayload),
    OpenFile(OpenFilePayload),
}

impl ServerPayload {
    pub fn endpoint(&self) -> &'static str {
        match self {
            ServerPayload::Open(_) => OPEN_ENDPOINT,
            ServerPayload::OpenFile(_) => OPEN_FILE_ENDPOINT,
        }
    }

    pub fn file_path(&self) -> &str {
        match self {
            ServerPayload::Open(p) => &p.file_path,
            ServerPayload::OpenFile(p) => &p.file_path,
        }
    }

    pub fn is_file_open(&self) -> bool {
        matches!(self, ServerPayload::OpenFile(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_open_payload_has_reduced_shape() {
        let payload = ServerPayload::OpenFile(OpenFilePayload {
            file_path: "/w/a.rs".into(),
            workspace_path: "/w".into(),
        });
        assert_eq!(payload.endpoint(), "/open-file");
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"filePath": "/w/a.rs", "workspacePath": "/w"})
        );
    }

    #[test]
    fn open_payload_carries_auto_submit() {
        let payload = ServerPayload::Open(OpenPayload {
            comment: "c".into(),
            code_snippet: String::new(),
            file_path: "/w/a.rs".into(),
            workspace_path: "/w".into(),
            auto_submit: true,
        });
        assert_eq!(payload.endpoint(), "/open");
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["autoSubmit"], json!(true));
        assert_eq!(value["codeSnippet"], json!(""));
    }
}
