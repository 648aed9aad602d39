//! Page-side runtime: injects action controls into review threads, keeps them
//! in place as the page changes, turns clicks into intents for the background
//! router and renders the notifications it sends back.

pub mod control;
pub mod error;
pub mod injector;
pub mod notification;
pub mod script;
pub mod watcher;

pub use control::{Binding, ClickOutcome, ControlKind};
pub use error::ContentError;
pub use injector::{Injector, ReconcileReport};
pub use notification::{NotificationPresenter, DISPLAY_DURATION, NOTIFICATION_ID};
pub use script::{ContentScript, ControlInfo};
pub use watcher::DomWatcher;
