//! Output formats for the pase CLI
//!
//! This module defines the OutputFormat enum used to pick how a search
//! outcome is written to stdout.

use crate::render::{JsonRenderer, Renderer, TextRenderer};
use clap::ValueEnum;

/// How search outcomes are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable sections, one line per match
    #[value(name = "text")]
    #[default]
    Text,

    /// The result model as JSON, or `{"error": ...}` on failure
    #[value(name = "json")]
    Json,
}

impl OutputFormat {
    pub fn renderer(self) -> Box<dyn Renderer> {
        match self {
            Self::Text => Box::new(TextRenderer),
            Self::Json => Box::new(JsonRenderer),
        }
    }
}
