//! The chat widget core.
//!
//! # Architecture
//!
//! - [`ChatWidget`]: open/closed flag, message log, draft and outstanding
//!   submissions, with synchronous transitions
//! - [`Outcome`]: how a submission settled, and the bot reply it produces
//! - [`WidgetHandle`]: shared widget plus the client that answers its
//!   questions
//!
//! # Example
//!
//! ```rust
//! use faq_chat_widget::widget::{ChatWidget, Outcome};
//!
//! let mut widget = ChatWidget::new();
//! widget.toggle();
//! widget.set_draft("What is X?");
//!
//! let submission = widget.submit().unwrap();
//! assert!(widget.is_loading());
//!
//! widget.settle(submission.id, &Outcome::Answered("X is Y".into()));
//! assert!(!widget.is_loading());
//! assert_eq!(widget.messages().len(), 2);
//! ```

mod driver;
mod message;
mod outcome;
mod state;

pub use driver::WidgetHandle;
pub use message::{Message, MessageLog, Sender};
pub use outcome::{ERROR_REPLY, NOT_FOUND_REPLY, Outcome};
pub use state::{ChatWidget, Submission, SubmissionId};
