use std::sync::Arc;
use std::time::{Duration, Instant};

use prbridge_content::{ClickOutcome, ContentError, ContentScript, ControlKind};
use prbridge_core::MessageBus;
use prbridge_extract::Platform;
use prbridge_types::{IntentKind, Notification, RuntimeMessage};

const AZURE_URL: &str = "https://dev.azure.com/contoso/Shop/_git/storefront/pullrequest/12";

const AZURE_PAGE: &str = r#"<html><body>
<div class="repos-pr-details-page">
  <div class="comment-file-header">
    <span class="body-s secondary-text text-ellipsis">/src/Cart/CartService.cs</span>
  </div>
  <div class="thread-body">
    <div class="repos-comment-viewer">
      <div class="repos-discussion-comment">
        <div class="repos-discussion-comment-header"><span>reviewer-bot</span></div>
        <div class="markdown-content markdown-editor-preview">
          <p>Dispose the HTTP client.</p>
          <pre class="hljs"><code>var client = new HttpClient();</code></pre>
          <details><summary>Prompt for AI Agents</summary>
            <pre class="hljs"><code>In /src/Cart/CartService.cs around line 40
Wrap the client in a using statement.</code></pre>
          </details>
        </div>
      </div>
    </div>
  </div>
</div>
</body></html>"#;

fn script(bus: &Arc<MessageBus>, url: &str, html: &str) -> ContentScript {
    let (tab_id, inbox) = bus.register_tab();
    ContentScript::load(bus.clone(), tab_id, inbox, url, html).unwrap()
}

fn control(script: &ContentScript, kind: ControlKind) -> prbridge_dom::NodeId {
    script
        .controls()
        .into_iter()
        .find(|c| c.kind == kind)
        .map(|c| c.node)
        .unwrap()
}

#[tokio::test]
async fn azure_page_gets_every_control_once() {
    let bus = Arc::new(MessageBus::new());
    let mut script = script(&bus, AZURE_URL, AZURE_PAGE);
    assert_eq!(script.platform(), Some(Platform::AzureDevOps));

    let now = Instant::now();
    let report = script.start(now).unwrap();
    assert_eq!((report.resolve, report.execute, report.open_file), (1, 1, 1));

    script.on_mutations(now);
    let kinds: Vec<ControlKind> = script.controls().iter().map(|c| c.kind).collect();
    assert_eq!(kinds.len(), 3);
    assert!(script
        .controls()
        .iter()
        .all(|c| c.file_path == "/src/Cart/CartService.cs"));
}

#[tokio::test]
async fn resolve_click_posts_intent_on_bus() {
    let bus = Arc::new(MessageBus::new());
    let mut runtime = bus.subscribe_runtime();
    let mut script = script(&bus, AZURE_URL, AZURE_PAGE);
    let now = Instant::now();
    script.start(now);

    let resolve = control(&script, ControlKind::Resolve);
    let outcome = script.click(resolve, now).await.unwrap();
    assert!(matches!(outcome, ClickOutcome::Send(_)));

    let envelope = runtime.recv().await.unwrap();
    assert_eq!(envelope.sender.tab_id.as_ref(), Some(script.tab_id()));
    let RuntimeMessage::Intent(intent) = envelope.message else {
        panic!("expected an intent");
    };
    assert_eq!(intent.kind, IntentKind::ResolveComment);
    assert_eq!(intent.comment, "Dispose the HTTP client.\nvar client = new HttpClient();");
    assert_eq!(intent.code_snippet, "var client = new HttpClient();");
    assert_eq!(intent.file_path, "/src/Cart/CartService.cs");
    assert_eq!(
        intent.repo_url,
        "https://dev.azure.com/contoso/Shop/_git/storefront"
    );
}

#[tokio::test]
async fn execute_click_sends_instruction_body() {
    let bus = Arc::new(MessageBus::new());
    let mut runtime = bus.subscribe_runtime();
    let mut script = script(&bus, AZURE_URL, AZURE_PAGE);
    let now = Instant::now();
    script.start(now);

    let execute = control(&script, ControlKind::Execute);
    script.click(execute, now).await.unwrap();

    let intent = runtime.recv().await.unwrap().message.into_intent().unwrap();
    assert_eq!(intent.kind, IntentKind::ExecuteInCursor);
    assert_eq!(intent.comment, "Wrap the client in a using statement.");
    assert!(intent.auto_submit);
}

#[tokio::test]
async fn alert_sends_nothing() {
    let bus = Arc::new(MessageBus::new());
    let mut runtime = bus.subscribe_runtime();
    let mut script = script(&bus, AZURE_URL, AZURE_PAGE);
    let now = Instant::now();
    script.start(now);

    let details = script
        .document()
        .query_selector(script.document().root(), "details pre")
        .unwrap()
        .unwrap();
    script.document_mut().remove(details).unwrap();
    script.on_mutations(now);

    let execute = control(&script, ControlKind::Execute);
    let outcome = script.click(execute, now).await.unwrap();
    assert_eq!(
        outcome,
        ClickOutcome::Alert("No code block found to execute.".into())
    );
    assert!(runtime.try_recv().is_err());
}

#[tokio::test]
async fn click_without_background_shows_error_toast() {
    let bus = Arc::new(MessageBus::new());
    let mut script = script(&bus, AZURE_URL, AZURE_PAGE);
    let now = Instant::now();
    script.start(now);

    let resolve = control(&script, ControlKind::Resolve);
    let err = script.click(resolve, now).await.unwrap_err();
    assert!(matches!(err, ContentError::Bus(_)));
    let toast = script.notification().unwrap();
    assert!(script
        .document()
        .text_content(toast)
        .contains("Extension error"));
}

#[tokio::test]
async fn background_notifications_are_rendered() {
    let bus = Arc::new(MessageBus::new());
    let mut script = script(&bus, AZURE_URL, AZURE_PAGE);
    let now = Instant::now();
    script.start(now);

    bus.deliver(script.tab_id(), Notification::success("Comment sent to editor!"))
        .unwrap();
    let received = script.drain_notifications(now);
    assert_eq!(received.len(), 1);

    let toast = script.notification().unwrap();
    assert!(script.document().text_content(toast).contains("Comment sent to editor!"));

    assert!(script.tick(now + Duration::from_secs(6)).unwrap());
    assert!(script.notification().is_none());
}

#[tokio::test]
async fn unsupported_page_is_inert() {
    let bus = Arc::new(MessageBus::new());
    let mut script = script(&bus, "https://gitlab.com/acme/widgets/-/merge_requests/3", AZURE_PAGE);
    assert!(!script.is_active());
    assert!(script.start(Instant::now()).is_none());
    assert!(script.controls().is_empty());
    assert!(script.notification().is_none());
    assert!(script
        .document()
        .query_selector(script.document().root(), "button")
        .unwrap()
        .is_none());
}
