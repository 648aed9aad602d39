pub mod error;
pub mod instruction;
pub mod sanitize;
pub mod strategy;

pub use error::ExtractError;
pub use instruction::{is_instruction_block, strip_location_qualifier, InstructionBlock};
pub use sanitize::sanitize_comment;
pub use strategy::{
    select, AzureDevOps, ExtractionStrategy, GitHub, OpenFileTarget, Placement, Platform,
    PlatformSelectors, Strategy,
};
