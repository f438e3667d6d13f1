//! Paced, accuracy-targeted automation of web language-drill activities.
//!
//! The [`pacing::Controller`] answers questions from an [`answer_key::AnswerKey`]
//! at a fixed rate, deliberately missing some so the realized accuracy
//! converges to a target. [`shell::Navigator`] drives the site through any
//! [`driver::BrowserDriver`]; [`rehearsal`] provides an offline one.
pub mod answer_key;
pub mod app_dirs;
pub mod config;
pub mod driver;
pub mod error;
pub mod extractor;
pub mod finalize;
pub mod history;
pub mod logging;
pub mod pacing;
pub mod progress;
pub mod pronoun;
pub mod question;
pub mod rehearsal;
pub mod runtime;
pub mod session;
pub mod shell;
pub mod site;
pub mod ui;
