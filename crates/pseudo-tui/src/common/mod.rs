//! Shared leaf types for the UI.
//!
//! Nothing here may import `UiEvent` or feature state.

pub mod clipboard;
pub mod scrollbar;
pub mod task;
pub mod text;

pub use clipboard::Clipboard;
pub use scrollbar::Scrollbar;
pub use task::{TaskCompleted, TaskId, TaskKind, TaskMeta, TaskSeq, TaskStarted, TaskState, Tasks};
pub use text::{sanitize_for_display, truncate_with_ellipsis};
