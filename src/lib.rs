//! Translation reconstruction: re-render already-rendered text into another
//! locale without the original template call.
//!
//! # Overview
//!
//! A notification composed in the site's language reaches its recipient in
//! that language, whatever the recipient prefers. This crate fixes that after
//! the fact:
//!
//! - **Observation**: while the host renders normally, every (template,
//!   rendered translation) pair is reported to the [`engine::Engine`], which
//!   compiles the rendering into a matcher ([`pattern`]).
//! - **Reconstruction**: a finished piece of text is matched against the
//!   recorded patterns, the substituted values are captured, and the original
//!   template is re-rendered through the target locale's catalog
//!   ([`catalog`]), recursively for concatenated fragments. URLs pointing at
//!   localization-enabled site paths are rewritten to the target locale's
//!   slug ([`urls`]).
//! - **Dispatch**: outgoing messages are intercepted, batched until the end
//!   of the cycle, and re-dispatched per recipient locale
//!   ([`dispatch::Dispatcher`]), with recipients resolved through the
//!   [`directory::UserDirectory`] seam.
//!
//! Only template/argument combinations that were actually observed are ever
//! reproduced; nothing here translates unseen text.
//!
//! # Usage
//!
//! ```rust,no_run
//! use relocale::{Engine, EngineConfig};
//!
//! let mut engine = Engine::new(EngineConfig::default());
//! engine.set_active_locale("fr-FR");
//! engine.register("forum", &["/forums/"], &[]);
//!
//! // Reported by the host's render hook:
//! engine.observe("forum", "Hello, %s!", "Bonjour, %s!");
//!
//! // Later, with only the finished text in hand:
//! let text = engine.reconstruct("Bonjour, Alice!", "forum", "en-US")?;
//! assert_eq!(text, "Hello, Alice!");
//! # Ok::<(), relocale::EngineError>(())
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod directory;
pub mod dispatch;
pub mod domain;
pub mod engine;
pub mod error;
pub mod pattern;
pub mod urls;

pub use crate::config::EngineConfig;
pub use crate::directory::{MapDirectory, UserDirectory};
pub use crate::dispatch::{Dispatcher, FlushSummary, QueuedMessage, Transport};
pub use crate::engine::Engine;
pub use crate::error::EngineError;
