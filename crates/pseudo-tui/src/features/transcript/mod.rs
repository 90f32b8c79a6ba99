mod lines;
mod render;
mod state;
mod style;
mod update;

pub use lines::{TranscriptLines, build_lines, spinner};
pub use render::render_transcript;
pub use state::{ScrollAccumulator, ScrollMode, ScrollState, SystemNote, TranscriptState};
pub use style::{Style, StyledLine, StyledSpan};
pub use update::{apply_scroll_delta, handle_mouse, reveal_line};
