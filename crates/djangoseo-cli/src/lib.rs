//! # djangoseo-cli
//!
//! Management commands for djangoseo-rs, shipped as the `djangoseo` binary.
//!
//! - **Command framework** - [`ManagementCommand`] and [`CommandRegistry`]
//! - **Built-in commands** - `check`, `migrate`, `addpattern`, `listpatterns`,
//!   `removepattern`, `listredirects`, `removeredirect`, `runserver`
//!
//! Every command accepts a global `--settings <file>` option.
//!
//! ## Quick Start
//!
//! ```rust
//! use djangoseo_cli::command::CommandRegistry;
//! use djangoseo_cli::commands::register_builtin_commands;
//!
//! let mut registry = CommandRegistry::new();
//! register_builtin_commands(&mut registry);
//!
//! let names = registry.list_commands();
//! assert!(names.contains(&"runserver"));
//! assert!(names.contains(&"migrate"));
//! assert!(names.contains(&"addpattern"));
//! ```

// - result_large_err: SeoError is the workspace-wide error type
// - unused_async: command handlers keep a uniform async signature
#![allow(clippy::result_large_err)]
#![allow(clippy::unused_async)]

pub mod command;
pub mod commands;

pub use command::{CommandRegistry, ManagementCommand};
