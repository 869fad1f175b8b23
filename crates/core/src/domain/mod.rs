pub mod editing;
pub mod error;
pub mod preview;
pub mod rewrite;
pub mod settings;
