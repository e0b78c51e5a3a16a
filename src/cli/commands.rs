use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "stickynote")]
#[command(version, about = "Sticky notes with crash-safe autosave")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Note collection file (overrides STICKYNOTE_DATA_FILE)
    #[arg(long, global = true, value_name = "PATH")]
    pub data_file: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new note
    New {
        /// Note text. The first line becomes the title
        text: Option<String>,

        /// Read note text from stdin
        #[arg(long, conflicts_with = "text")]
        stdin: bool,

        /// Background colour: #RRGGBB or a palette name (kraft, sakura, sky, ...)
        #[arg(long)]
        color: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List notes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single note
    Show {
        /// Note ID (list index like "2" or id prefix like "a1b2c")
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change a note's text or appearance
    Edit {
        /// Note ID (list index or id prefix)
        id: String,

        /// Replace the note text
        #[arg(long, conflicts_with = "stdin")]
        text: Option<String>,

        /// Read the new note text from stdin
        #[arg(long)]
        stdin: bool,

        /// Set a custom title. An empty string reverts to the derived title
        #[arg(long)]
        title: Option<String>,

        /// Background colour: #RRGGBB or a palette name
        #[arg(long)]
        color: Option<String>,

        /// Window opacity between 0 and 1
        #[arg(long)]
        opacity: Option<f64>,

        /// Font size in points
        #[arg(long)]
        font_size: Option<f64>,

        /// Keep the note above other windows
        #[arg(long, conflicts_with = "unpin")]
        pin: bool,

        /// Stop keeping the note above other windows
        #[arg(long)]
        unpin: bool,
    },

    /// Delete a note
    Delete {
        /// Note ID (list index or id prefix)
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Search note titles and text
    Search {
        /// Search query. `pinned:true` or `pinned:false` filters by pin state
        query: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export notes as plain text
    Export {
        /// Export only this note
        #[arg(long)]
        id: Option<String>,

        /// Output file, or "-" for stdout. Defaults to the desktop
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Interactive editing session over stdin
    Shell,
}
