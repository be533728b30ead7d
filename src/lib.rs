//! # Scrubber - Batch Cleaning and Delivery of Tabular Files
//!
//! Scrubber picks up every `.csv`, `.tsv` and `.xlsx` file in an input
//! directory, finds the date, amount, price and name columns by keyword,
//! cleans them, and writes `cleaned_<stem>.csv` files. A per-file summary
//! log records what was detected and how many rows were removed. All outputs
//! are then emailed in a single message.
//!
//! ## Quick Start
//!
//! ```no_run
//! use scrubber::config::AppConfig;
//! use scrubber::driver::Driver;
//! use scrubber::mailer::SmtpMailer;
//!
//! let config = AppConfig::load(None)?;
//! let mailer = SmtpMailer::from_env(config.email.clone())?;
//! let report = Driver::from_config(&config).run(&mailer)?;
//! println!("Sent {} attachment(s)", report.sent);
//! # Ok::<(), scrubber::error::ScrubError>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`detect`]: Keyword table and column detection
//! - [`cleaning`]: Per-field cleaners and row-level tidying
//! - [`io`]: Loading inputs and writing cleaned CSV
//! - [`summary`]: Per-file summary log
//! - [`mailer`]: SMTP delivery behind the [`mailer::Deliver`] trait
//! - [`driver`]: The batch run tying it all together
//! - [`config`]: JSON configuration and credentials
//! - [`error`]: Error types and handling utilities
//! - [`logging`]: Console and rotating-file tracing setup

#![warn(clippy::all, rust_2018_idioms)]

pub mod cleaning;
pub mod config;
pub mod detect;
pub mod driver;
pub mod error;
pub mod io;
pub mod logging;
pub mod mailer;
pub mod summary;
