use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::routing::post;
use axum::{Json, Router};
use prbridge_core::{MessageBus, RuntimeEnvelope, Sender};
use prbridge_router::{AutomationClient, Delivery, MessageRouter, RouterError};
use prbridge_storage::{JsonFileStore, MemoryStore, RepositoryStore};
use prbridge_types::{ActionIntent, Notification, NotificationKind, Repository, RuntimeMessage};
use serde_json::{json, Value};

#[derive(Clone)]
struct MockServer {
    status: StatusCode,
    hang_open: bool,
    received: Arc<Mutex<Vec<(String, Value)>>>,
}

async fn record(State(server): State<MockServer>, uri: Uri, Json(body): Json<Value>) -> StatusCode {
    if server.hang_open && uri.path() == "/open" {
        std::future::pending::<()>().await;
    }
    server
        .received
        .lock()
        .unwrap()
        .push((uri.path().to_string(), body));
    server.status
}

async fn spawn_server(status: StatusCode) -> (SocketAddr, Arc<Mutex<Vec<(String, Value)>>>) {
    spawn_server_with(status, false).await
}

async fn spawn_server_with(
    status: StatusCode,
    hang_open: bool,
) -> (SocketAddr, Arc<Mutex<Vec<(String, Value)>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/open", post(record))
        .route("/open-file", post(record))
        .with_state(MockServer {
            status,
            hang_open,
            received: received.clone(),
        });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, received)
}

fn widgets_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with(vec![
        Repository::new("https://github.com/acme/other", "/home/u/other"),
        Repository::new("https://github.com/acme/widgets.git/", "/home/u/widgets"),
    ]))
}

fn router(store: Arc<dyn RepositoryStore>, base_url: String, bus: &Arc<MessageBus>) -> MessageRouter {
    MessageRouter::new(store, AutomationClient::new(base_url), bus.clone())
}

fn envelope(sender: Sender, intent: ActionIntent) -> RuntimeEnvelope {
    RuntimeEnvelope {
        sender,
        message: RuntimeMessage::Intent(intent),
    }
}

#[tokio::test]
async fn resolve_intent_reaches_open_endpoint() {
    let (addr, received) = spawn_server(StatusCode::OK).await;
    let bus = Arc::new(MessageBus::new());
    let (tab, mut inbox) = bus.register_tab();
    let router = router(widgets_store(), format!("http://{addr}"), &bus);

    let intent = ActionIntent::resolve(
        "Null check missing.",
        "let x = y.unwrap();",
        "a/b.ts",
        "https://github.com/acme/widgets",
    );
    let notification = router
        .handle_envelope(envelope(Sender::tab(tab), intent))
        .await
        .unwrap();
    assert_eq!(notification, Notification::success("Comment sent to editor!"));
    assert_eq!(inbox.recv().await.unwrap(), notification);

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].0, "/open");
    assert_eq!(
        received[0].1,
        json!({
            "comment": "Null check missing.",
            "codeSnippet": "let x = y.unwrap();",
            "filePath": "/home/u/widgets/a/b.ts",
            "workspacePath": "/home/u/widgets",
            "autoSubmit": false
        })
    );
}

#[tokio::test]
async fn file_open_uses_reduced_body() {
    let (addr, received) = spawn_server(StatusCode::OK).await;
    let bus = Arc::new(MessageBus::new());
    let router = router(widgets_store(), format!("http://{addr}"), &bus);

    let delivery = router
        .handle(&ActionIntent::open_file("src/lib.rs", "https://github.com/acme/widgets"))
        .await
        .unwrap();
    assert_eq!(delivery, Delivery::FileOpened);

    let received = received.lock().unwrap();
    assert_eq!(received[0].0, "/open-file");
    assert_eq!(
        received[0].1,
        json!({"filePath": "/home/u/widgets/src/lib.rs", "workspacePath": "/home/u/widgets"})
    );
}

#[tokio::test]
async fn unmapped_repository_sends_nothing() {
    let (addr, received) = spawn_server(StatusCode::OK).await;
    let bus = Arc::new(MessageBus::new());
    let (tab, mut inbox) = bus.register_tab();
    let router = router(widgets_store(), format!("http://{addr}"), &bus);

    let intent = ActionIntent::resolve("c", "", "a.ts", "https://github.com/acme/unknown");
    router
        .handle_envelope(envelope(Sender::tab(tab), intent))
        .await;

    let notification = inbox.recv().await.unwrap();
    assert_eq!(notification.kind, NotificationKind::Error);
    assert_eq!(
        notification.message,
        "Repository not configured. Add a mapping with `prbridge repo add`."
    );
    assert!(received.lock().unwrap().is_empty());
}

#[tokio::test]
async fn server_error_status_is_reported() {
    let (addr, _) = spawn_server(StatusCode::INTERNAL_SERVER_ERROR).await;
    let bus = Arc::new(MessageBus::new());
    let router = router(widgets_store(), format!("http://{addr}"), &bus);

    let intent = ActionIntent::execute("Fix it", "a.ts", "https://github.com/acme/widgets");
    let err = router.handle(&intent).await.unwrap_err();
    assert!(matches!(err, RouterError::ServerStatus { status: 500, .. }));
    assert_eq!(
        err.user_message(),
        "Failed to send to editor: Server error: 500 Internal Server Error. Is the server running?"
    );
}

#[tokio::test]
async fn unreachable_server_is_reported() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let bus = Arc::new(MessageBus::new());
    let (tab, mut inbox) = bus.register_tab();
    let router = router(widgets_store(), format!("http://{addr}"), &bus);

    let intent = ActionIntent::resolve("c", "", "a.ts", "https://github.com/acme/widgets");
    router
        .handle_envelope(envelope(Sender::tab(tab), intent))
        .await;

    let notification = inbox.recv().await.unwrap();
    assert_eq!(notification.kind, NotificationKind::Error);
    assert!(notification.message.starts_with("Failed to send to editor: "));
    assert!(notification.message.ends_with(". Is the server running?"));
}

#[tokio::test]
async fn storage_failure_is_an_extension_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "not json").unwrap();

    let bus = Arc::new(MessageBus::new());
    let (tab, mut inbox) = bus.register_tab();
    let router = router(
        Arc::new(JsonFileStore::new(&path)),
        "http://127.0.0.1:9".to_string(),
        &bus,
    );

    let intent = ActionIntent::resolve("c", "", "a.ts", "https://github.com/acme/widgets");
    router
        .handle_envelope(envelope(Sender::tab(tab), intent))
        .await;

    let notification = inbox.recv().await.unwrap();
    assert!(notification.message.starts_with("Extension error: "));
}

#[tokio::test]
async fn detached_sender_gets_no_notification() {
    let (addr, received) = spawn_server(StatusCode::OK).await;
    let bus = Arc::new(MessageBus::new());
    let (_tab, mut inbox) = bus.register_tab();
    let router = router(widgets_store(), format!("http://{addr}"), &bus);

    let intent = ActionIntent::resolve("c", "", "a.ts", "https://github.com/acme/widgets");
    let notification = router
        .handle_envelope(envelope(Sender::detached(), intent))
        .await;
    assert!(notification.is_some());
    assert!(inbox.try_recv().is_err());
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn notifications_are_not_routed() {
    let bus = Arc::new(MessageBus::new());
    let router = router(widgets_store(), "http://127.0.0.1:9".to_string(), &bus);
    let envelope = RuntimeEnvelope {
        sender: Sender::detached(),
        message: RuntimeMessage::Notification(Notification::info("hi")),
    };
    assert!(router.handle_envelope(envelope).await.is_none());
}

#[tokio::test]
async fn run_consumes_the_bus() {
    let (addr, received) = spawn_server(StatusCode::OK).await;
    let bus = Arc::new(MessageBus::new());
    let (tab, mut inbox) = bus.register_tab();
    let router = Arc::new(router(widgets_store(), format!("http://{addr}"), &bus));

    let rx = bus.subscribe_runtime();
    let task = tokio::spawn(router.run(rx));

    for file in ["a.ts", "b.ts"] {
        bus.post(
            Sender::tab(tab.clone()),
            RuntimeMessage::Intent(ActionIntent::open_file(file, "https://github.com/acme/widgets")),
        )
        .unwrap();
    }

    for _ in 0..2 {
        assert_eq!(
            inbox.recv().await.unwrap(),
            Notification::success("File opened in editor!")
        );
    }
    let mut paths: Vec<String> = received
        .lock()
        .unwrap()
        .iter()
        .map(|(_, body)| body["filePath"].as_str().unwrap().to_string())
        .collect();
    paths.sort();
    assert_eq!(paths, vec!["/home/u/widgets/a.ts", "/home/u/widgets/b.ts"]);
    task.abort();
}

#[tokio::test]
async fn stalled_request_does_not_block_later_ones() {
    let (addr, received) = spawn_server_with(StatusCode::OK, true).await;
    let bus = Arc::new(MessageBus::new());
    let (tab, mut inbox) = bus.register_tab();
    let router = Arc::new(router(widgets_store(), format!("http://{addr}"), &bus));
    let task = tokio::spawn(router.run(bus.subscribe_runtime()));

    bus.post(
        Sender::tab(tab.clone()),
        RuntimeMessage::Intent(ActionIntent::resolve(
            "Null check missing.",
            "",
            "a.ts",
            "https://github.com/acme/widgets",
        )),
    )
    .unwrap();
    bus.post(
        Sender::tab(tab),
        RuntimeMessage::Intent(ActionIntent::open_file("b.ts", "https://github.com/acme/widgets")),
    )
    .unwrap();

    let notification = tokio::time::timeout(Duration::from_secs(5), inbox.recv())
        .await
        .expect("file open was held up by the stalled request")
        .unwrap();
    assert_eq!(notification, Notification::success("File opened in editor!"));
    assert!(inbox.try_recv().is_err());

    assert!(received
        .lock()
        .unwrap()
        .iter()
        .any(|(path, body)| path == "/open-file" && body["filePath"] == "/home/u/widgets/b.ts"));
    task.abort();
}
