//! Drives a widget's submissions through a [`QueryClient`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tracing::info;

use super::outcome::Outcome;
use super::state::{ChatWidget, Submission};
use crate::client::{self, QueryClient};

/// Shared handle to one mounted widget.
///
/// Cloning is cheap; all clones see the same state. The lock is never held
/// across an `.await`.
#[derive(Clone)]
pub struct WidgetHandle {
    widget: Arc<Mutex<ChatWidget>>,
    client: Arc<dyn QueryClient>,
}

impl std::fmt::Debug for WidgetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetHandle")
            .field("widget", &self.widget)
            .finish_non_exhaustive()
    }
}

impl WidgetHandle {
    /// Mount a fresh widget that asks questions through `client`.
    pub fn new(client: Arc<dyn QueryClient>) -> Self {
        Self {
            widget: Arc::new(Mutex::new(ChatWidget::new())),
            client,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChatWidget> {
        self.widget.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state, for rendering.
    #[must_use]
    pub fn snapshot(&self) -> ChatWidget {
        self.lock().clone()
    }

    pub fn toggle(&self) {
        self.lock().toggle();
    }

    pub fn close(&self) {
        self.lock().close();
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.lock().set_draft(text);
    }

    /// Submit the current draft.
    ///
    /// Returns the task that will settle the submission, or `None` if the
    /// draft was blank.
    pub fn send(&self) -> Option<JoinHandle<Outcome>> {
        self.submit_with(ChatWidget::submit)
    }

    /// Key press in the input field; `Enter` behaves like [`Self::send`].
    pub fn key_press(&self, key: &str) -> Option<JoinHandle<Outcome>> {
        self.submit_with(|widget| widget.key_press(key))
    }

    /// Replace the draft and submit it, atomically.
    pub fn send_draft(&self, text: impl Into<String>) -> Option<JoinHandle<Outcome>> {
        let text = text.into();
        self.submit_with(|widget| {
            widget.set_draft(text);
            widget.submit()
        })
    }

    /// Replace the draft and apply a key press, atomically.
    ///
    /// Keys other than `Enter` only store the draft.
    pub fn key_press_with_draft(
        &self,
        key: &str,
        text: impl Into<String>,
    ) -> Option<JoinHandle<Outcome>> {
        let text = text.into();
        self.submit_with(|widget| {
            widget.set_draft(text);
            widget.key_press(key)
        })
    }

    fn submit_with(
        &self,
        f: impl FnOnce(&mut ChatWidget) -> Option<Submission>,
    ) -> Option<JoinHandle<Outcome>> {
        // Guard is dropped before dispatching.
        let submission = f(&mut self.lock())?;
        Some(self.dispatch(submission))
    }

    fn dispatch(&self, submission: Submission) -> JoinHandle<Outcome> {
        info!(
            name: "widget.submitted",
            submission = %submission.id,
            "Question submitted"
        );

        let widget = Arc::clone(&self.widget);
        let client = Arc::clone(&self.client);

        tokio::spawn(async move {
            let outcome = client::resolve(client.ask(&submission.question).await);

            let mut guard = widget.lock().unwrap_or_else(PoisonError::into_inner);
            guard.settle(submission.id, &outcome);
            let still_loading = guard.is_loading();
            drop(guard);

            info!(
                name: "widget.settled",
                submission = %submission.id,
                outcome = outcome.kind(),
                loading = still_loading,
                "Submission settled"
            );
            outcome
        })
    }
}
