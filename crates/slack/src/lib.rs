//! Slack surface for the `/project` bot.
//!
//! Everything in this crate is pure: command parsing, Block Kit rendering,
//! modal construction, and interaction payload classification. Outbound
//! Slack Web API calls and the Airtable round trips live in the server
//! crate behind the [`commands::ProjectCommandService`] seam.
//!
//! # Key types
//!
//! - `parse_project_command` - `/project <verb> [search]` dispatcher
//! - `CommandRouter` - routes a parsed command into a service trait
//! - `MessageBuilder` - typed Block Kit message construction
//! - `modals` - filter/create/edit view builders and state extraction
//! - `interactions` - view submission and block action classification

pub mod blocks;
pub mod commands;
pub mod format;
pub mod interactions;
pub mod modals;
