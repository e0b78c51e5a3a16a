mod commands;
mod handlers;
mod shell;

pub use commands::{Cli, Commands};
pub use handlers::{
    handle_delete, handle_edit, handle_export, handle_list, handle_new, handle_search,
    handle_show, resolve_color, resolve_id,
};
pub use shell::{handle_shell, run_shell};
