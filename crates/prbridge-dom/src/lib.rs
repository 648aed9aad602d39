//! A small arena DOM for review pages: enough HTML parsing, selector matching
//! and mutation tracking to locate known markup shapes and decorate them with
//! controls. Not a browser engine.

pub mod document;
pub mod location;
pub mod parser;
pub mod selector;
pub mod serialize;

pub use document::{Document, DomError, ElementData, MutationRecord, NodeData, NodeId};
pub use location::{LocationError, PageLocation};
pub use selector::{Selector, SelectorError};
