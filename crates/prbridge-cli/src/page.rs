use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use prbridge_content::{ClickOutcome, ContentScript, ControlInfo};
use prbridge_core::MessageBus;
use prbridge_router::MessageRouter;
use prbridge_types::NotificationKind;

/// Attaches a content script to a saved page on a fresh tab of `bus`.
fn open_page(bus: &Arc<MessageBus>, html: &Path, url: &str) -> anyhow::Result<ContentScript> {
    let content = fs::read_to_string(html)
        .with_context(|| format!("Failed to read page: {}", html.display()))?;
    let (tab_id, inbox) = bus.register_tab();
    let mut script = ContentScript::load(bus.clone(), tab_id, inbox, url, &content)?;
    if script.is_active() {
        script.start(Instant::now());
    }
    Ok(script)
}

fn print_controls(controls: &[ControlInfo]) {
    if controls.is_empty() {
        println!("No controls injected.");
        return;
    }
    println!();
    for (index, control) in controls.iter().enumerate() {
        println!(
            "  [{}] {:<18} {}",
            index + 1,
            control.kind.label(),
            control.file_path
        );
    }
    println!();
}

pub(crate) async fn handle_scan(html: PathBuf, url: String, out: Option<PathBuf>) -> anyhow::Result<()> {
    let bus = Arc::new(MessageBus::new());
    let script = open_page(&bus, &html, &url)?;

    match script.platform() {
        Some(platform) => println!("Platform: {}", platform),
        None => {
            println!("No supported review platform at {}", url);
            return Ok(());
        }
    }
    print_controls(&script.controls());

    if let Some(out) = out {
        fs::write(&out, script.document().to_html())
            .with_context(|| format!("Failed to write page: {}", out.display()))?;
        println!("Decorated page written to {}", out.display());
    }
    Ok(())
}

/// Clicks control `number` (1-based, as `scan` lists them) and routes the
/// resulting intent through an in-process background.
pub(crate) async fn handle_click(
    html: PathBuf,
    url: String,
    number: usize,
    router: MessageRouter,
    bus: Arc<MessageBus>,
) -> anyhow::Result<()> {
    let mut script = open_page(&bus, &html, &url)?;
    if !script.is_active() {
        anyhow::bail!("No supported review platform at {}", url);
    }

    let controls = script.controls();
    let control = number
        .checked_sub(1)
        .and_then(|index| controls.get(index))
        .with_context(|| format!("No control {}; the page has {}", number, controls.len()))?;

    let mut runtime = bus.subscribe_runtime();
    match script.click(control.node, Instant::now()).await? {
        ClickOutcome::Alert(message) => {
            println!("Alert: {}", message);
            return Ok(());
        }
        ClickOutcome::Send(intent) => {
            println!("Sending {} for {}", intent.kind, intent.file_path);
        }
    }

    let envelope = runtime
        .recv()
        .await
        .context("Background channel closed")?;
    router.handle_envelope(envelope).await;

    let notification = script
        .next_notification(Instant::now())
        .await
        .context("Tab closed before the outcome arrived")?;
    if notification.kind == NotificationKind::Error {
        anyhow::bail!("{}", notification.message);
    }
    println!("{}", notification.message);
    Ok(())
}
