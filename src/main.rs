use clap::Parser;
use stickynote::cli::{
    handle_delete, handle_edit, handle_export, handle_list, handle_new, handle_search,
    handle_shell, handle_show, Cli, Commands,
};
use stickynote::{logging, NoteConfig};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = NoteConfig::from_env().with_data_file(cli.data_file);

    let result = match cli.command {
        Commands::New {
            text,
            stdin,
            color,
            json,
        } => handle_new(&config, text, stdin, color, json),
        Commands::List { json } => handle_list(&config, json),
        Commands::Show { id, json } => handle_show(&config, id, json),
        Commands::Edit {
            id,
            text,
            stdin,
            title,
            color,
            opacity,
            font_size,
            pin,
            unpin,
        } => handle_edit(
            &config, id, text, stdin, title, color, opacity, font_size, pin, unpin,
        ),
        Commands::Delete { id, force } => handle_delete(&config, id, force),
        Commands::Search { query, json } => handle_search(&config, query, json),
        Commands::Export { id, output } => handle_export(&config, id, output),
        Commands::Shell => handle_shell(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
