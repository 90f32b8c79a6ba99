mod buffer;
mod render;
mod state;
mod update;

pub use buffer::InputBuffer;
pub use render::{calculate_input_height, render_input};
pub use state::InputState;
pub use update::{handle_main_key, handle_paste};
