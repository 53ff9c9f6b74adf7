//! Minimal oh-my-zsh reconciliation and self-upgrade engine.
//!
//! Reads the user's `~/.zshrc` declaration, resolves it against a fixed
//! catalog of known core files, plugins, and themes, inspects the managed
//! tree, and reconciles it with canonical remote content via atomic,
//! verified writes. Pinned paths are never touched, every action is
//! auditable, and the program can replace itself with a verified remote
//! build.
//!
//! The engine is organised as a pipeline of pure-ish stages:
//!
//! - **[`zshrc`]** — parse the declaration (plugins, theme)
//! - **[`catalog`]** — resolve declared items to concrete file entries
//! - **[`state`]** — inspect each entry against local and remote content
//! - **[`plan`]** — map inspected states to a deterministic action plan
//! - **[`apply`]** — execute the plan with atomic writes and audit records
//! - **[`upgrade`]** — the self-replacement state machine
//! - **[`commands`]** — top-level subcommand orchestration

pub mod apply;
pub mod audit;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod context;
pub mod diff;
pub mod digest;
pub mod error;
pub mod fetch;
pub mod hashcache;
pub mod logging;
pub mod pins;
pub mod plan;
pub mod state;
pub mod upgrade;
pub mod zshrc;
