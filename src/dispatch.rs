//! Outgoing message capture and the flush state machine.
//!
//! While the host renders and queues notifications, the dispatcher sits in
//! the `Collecting` state and intercepts every message instead of letting it
//! reach the transport. The host's end-of-cycle signal triggers `flush`:
//! recipient locales are resolved in one batch, each message is reconstructed
//! into its recipient's language where possible, and everything is handed to
//! the real transport exactly once.
//!
//! Delivery always wins over translation fidelity. A message that cannot be
//! reconstructed goes out in its original language; nothing is dropped and
//! no error escapes the flush.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::directory::UserDirectory;
use crate::engine::Engine;

/// A pending outgoing message captured before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    /// Primary recipient addresses.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
    /// Raw header lines; `Cc:` and `Bcc:` lines carry extra recipients.
    pub headers: Vec<String>,
    /// Attachment file paths, passed through untouched.
    pub attachments: Vec<PathBuf>,
}

impl QueuedMessage {
    /// Create a message with a single recipient and no extra headers.
    #[must_use]
    pub fn new(to: &str, subject: &str, body: &str) -> Self {
        Self {
            to: vec![to.to_string()],
            subject: subject.to_string(),
            body: body.to_string(),
            headers: Vec::new(),
            attachments: Vec::new(),
        }
    }
}

/// Delivery seam to the real mail transport.
pub trait Transport {
    /// Hand one message to the underlying delivery mechanism.
    ///
    /// # Errors
    /// - Returns `Err` with a human-readable reason when delivery fails;
    ///   the dispatcher logs it and moves on
    fn deliver(&mut self, message: &QueuedMessage) -> Result<(), String>;
}

/// Override extension point consulted before built-in reconstruction.
///
/// Receives the message, the resolved recipient-locale map, and the locale
/// the message was composed in. `None` means "not mine, run the built-in
/// logic"; `Some(replacements)` short-circuits and dispatches the returned
/// messages verbatim (an empty vector swallows the message, several split a
/// multi-recipient message into per-locale copies).
pub type OverrideHook =
    Box<dyn Fn(&QueuedMessage, &HashMap<String, String>, &str) -> Option<Vec<QueuedMessage>>>;

/// Dispatcher lifecycle. One pass per process cycle, no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Intercepting outgoing messages.
    Collecting,
    /// Inside `flush`.
    Flushing,
    /// Flush finished; the queue is spent.
    Done,
}

/// Outcome counters for one flush, mostly useful for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    /// Messages handed to the transport successfully.
    pub delivered: usize,
    /// Messages delivered after reconstruction into the recipient's locale.
    pub translated: usize,
    /// Messages delivered unchanged.
    pub passed_through: usize,
    /// Messages produced and dispatched by the override hook.
    pub overridden: usize,
    /// Transport failures (logged, never retried).
    pub failed: usize,
}

/// Intercepts outgoing messages and re-dispatches them per recipient locale.
pub struct Dispatcher {
    state: DispatchState,
    queue: Vec<QueuedMessage>,
    override_hook: Option<OverrideHook>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Create a dispatcher in the `Collecting` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: DispatchState::Collecting,
            queue: Vec::new(),
            override_hook: None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Number of messages waiting for the flush.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Install the override hook. At most one hook is consulted per flush;
    /// installing again replaces the previous one.
    pub fn set_override(&mut self, hook: OverrideHook) {
        self.override_hook = Some(hook);
    }

    /// Capture a message on its way out ("message about to be sent" hook).
    pub fn intercept(&mut self, message: QueuedMessage) {
        if self.state != DispatchState::Collecting {
            tracing::warn!(
                subject = %message.subject,
                "message intercepted after flush; it will wait for a flush that may never run"
            );
        }
        self.queue.push(message);
    }

    /// What: Flush the queue ("end of cycle" hook).
    ///
    /// Inputs:
    /// - `engine`: The reconstruction engine that observed this cycle's renders
    /// - `directory`: Recipient locale lookup
    /// - `transport`: The real delivery mechanism
    ///
    /// Output:
    /// - Counters describing what happened to each message
    ///
    /// Details:
    /// - Messages are processed in interception order and each is dispatched
    ///   exactly once (or N times when the override hook splits it).
    /// - A message is reconstructed with the first registered domain that
    ///   changes *both* subject and body. A subject-only change is treated as
    ///   a false match and the next domain is tried; this is what prevents
    ///   half-translated output.
    /// - The engine's active locale is restored before returning.
    pub fn flush(
        &mut self,
        engine: &mut Engine,
        directory: &dyn UserDirectory,
        transport: &mut dyn Transport,
    ) -> FlushSummary {
        self.state = DispatchState::Flushing;
        let queue = std::mem::take(&mut self.queue);
        let mut summary = FlushSummary::default();

        if queue.is_empty() {
            self.state = DispatchState::Done;
            return summary;
        }

        let original_locale = engine.active_locale().to_string();
        engine.seed_observed_catalogs();

        let locale_map = Self::resolve_recipient_locales(&queue, directory);
        tracing::debug!(
            messages = queue.len(),
            recipients = locale_map.len(),
            "flushing intercepted messages"
        );

        for message in queue {
            if let Some(hook) = &self.override_hook
                && let Some(replacements) = hook(&message, &locale_map, &original_locale)
            {
                for replacement in &replacements {
                    Self::deliver(transport, replacement, &mut summary);
                }
                summary.overridden += replacements.len();
                continue;
            }

            let recipient_locale = message.to.first().and_then(|a| locale_map.get(a));
            match recipient_locale {
                Some(locale) if *locale != original_locale => {
                    if Self::deliver_reconstructed(
                        engine, transport, &message, locale, &mut summary,
                    ) {
                        summary.translated += 1;
                    } else {
                        Self::deliver(transport, &message, &mut summary);
                        summary.passed_through += 1;
                    }
                }
                _ => {
                    // Unknown recipient, no stored preference, or already in
                    // the right language.
                    Self::deliver(transport, &message, &mut summary);
                    summary.passed_through += 1;
                }
            }
        }

        engine.set_active_locale(&original_locale);
        self.state = DispatchState::Done;
        tracing::debug!(?summary, "flush finished");
        summary
    }

    /// Collect every distinct recipient (To plus Cc/Bcc header lines) and
    /// resolve their locales in one directory call.
    fn resolve_recipient_locales(
        queue: &[QueuedMessage],
        directory: &dyn UserDirectory,
    ) -> HashMap<String, String> {
        let mut addresses: Vec<String> = Vec::new();
        for message in queue {
            for a in &message.to {
                if !addresses.contains(a) {
                    addresses.push(a.clone());
                }
            }
            for header in &message.headers {
                for a in copy_recipients(header) {
                    if !addresses.contains(&a) {
                        addresses.push(a);
                    }
                }
            }
        }

        directory
            .locales_for(&addresses)
            .into_iter()
            .filter_map(|(address, locale)| locale.map(|l| (address, l)))
            .collect()
    }

    /// Try every registered domain until one changes both subject and body.
    /// Returns `true` when a reconstructed copy was dispatched.
    fn deliver_reconstructed(
        engine: &mut Engine,
        transport: &mut dyn Transport,
        message: &QueuedMessage,
        locale: &str,
        summary: &mut FlushSummary,
    ) -> bool {
        for domain in engine.domain_names() {
            let subject = match engine.reconstruct(&message.subject, &domain, locale) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(domain = %domain, error = %e, "subject reconstruction failed");
                    continue;
                }
            };
            if subject == message.subject {
                continue;
            }
            let body = match engine.reconstruct(&message.body, &domain, locale) {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(domain = %domain, error = %e, "body reconstruction failed");
                    continue;
                }
            };
            if body == message.body {
                // Subject-only match: reject and try the next domain.
                tracing::debug!(
                    domain = %domain,
                    "subject changed but body did not; rejecting partial match"
                );
                continue;
            }

            let mut translated = message.clone();
            translated.subject = subject;
            translated.body = body;
            Self::deliver(transport, &translated, summary);
            return true;
        }
        false
    }

    fn deliver(transport: &mut dyn Transport, message: &QueuedMessage, summary: &mut FlushSummary) {
        match transport.deliver(message) {
            Ok(()) => summary.delivered += 1,
            Err(e) => {
                summary.failed += 1;
                tracing::warn!(
                    subject = %message.subject,
                    error = %e,
                    "transport failed to deliver message"
                );
            }
        }
    }
}

/// Extract the addresses of a `Cc:` or `Bcc:` header line; other headers
/// yield nothing.
fn copy_recipients(header: &str) -> Vec<String> {
    let Some((name, rest)) = header.split_once(':') else {
        return Vec::new();
    };
    let key = name.trim();
    if key.eq_ignore_ascii_case("cc") || key.eq_ignore_ascii_case("bcc") {
        rest.split(',')
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect()
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_recipients_cc_and_bcc() {
        assert_eq!(
            copy_recipients("Cc: a@example.com, b@example.com"),
            vec!["a@example.com".to_string(), "b@example.com".to_string()]
        );
        assert_eq!(
            copy_recipients("bcc: hidden@example.com"),
            vec!["hidden@example.com".to_string()]
        );
        assert!(copy_recipients("Reply-To: x@example.com").is_empty());
        assert!(copy_recipients("not a header").is_empty());
    }

    #[test]
    fn test_dispatcher_starts_collecting() {
        let dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.state(), DispatchState::Collecting);
        assert_eq!(dispatcher.queued(), 0);
    }

    #[test]
    fn test_intercept_queues_messages() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.intercept(QueuedMessage::new("a@example.com", "s", "b"));
        dispatcher.intercept(QueuedMessage::new("b@example.com", "s", "b"));
        assert_eq!(dispatcher.queued(), 2);
    }
}
