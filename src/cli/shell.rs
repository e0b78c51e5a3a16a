//! Line-oriented editing session.
//!
//! Drives one [`Session`] for the lifetime of the process, so the debounced
//! save and the single-slot undo behave as they do behind a real edit
//! surface.

use std::io::{self, BufRead, BufReader, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Instant;

use tracing::debug;

use super::handlers::{resolve_color, resolve_id};
use crate::codec::RichDocument;
use crate::config::NoteConfig;
use crate::error::Result;
use crate::session::{DeleteOutcome, HeadlessSurface, Session, SurfaceChange};
use crate::storage::NoteStore;

const HELP: &str = "\
Commands:
  new [TEXT]       create a note and open it
  list             list notes (> marks the open note)
  open <ID>        open a note by list index or id prefix
  edit <TEXT>      replace the open note's text (\\n for a new line)
  rename [TITLE]   set a custom title; no title reverts to the first line
  pin | unpin      toggle always-on-top
  color <COLOR>    #RRGGBB or a palette name
  delete           delete the open note
  restore          bring back the last deleted note
  search <QUERY>   search titles and text
  status           show the open note and pending save
  quit             save and leave";

enum Flow {
    Continue,
    Quit,
}

pub fn handle_shell(config: &NoteConfig) -> Result<()> {
    let stdout = io::stdout();
    run_shell(config, BufReader::new(io::stdin()), stdout.lock())
}

/// Run commands from `input` until `quit` or end of input, then flush.
///
/// Input is read on its own thread so the save timer keeps firing while the
/// prompt waits.
pub fn run_shell<R, W>(config: &NoteConfig, input: R, mut out: W) -> Result<()>
where
    R: BufRead + Send + 'static,
    W: Write,
{
    let mut store = NoteStore::open(config.data_file());
    let mut session = Session::new(HeadlessSurface::new(), config);
    session.start(&mut store, Instant::now())?;

    let lines = spawn_line_reader(input);
    writeln!(out, "{} notes. Type 'help' for commands.", store.len())?;

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let line = match next_line(&lines, &mut session, &store)? {
            Some(line) => line,
            None => {
                writeln!(out)?;
                break;
            }
        };
        session.tick(&store, Instant::now());

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        match execute(&mut store, &mut session, command, arg, &lines, &mut out) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => writeln!(out, "Error: {}", e)?,
        }
    }

    session.close(&mut store);
    debug!("Shell closed");
    Ok(())
}

/// Forward lines from `input` until end of input. The channel closes at EOF.
fn spawn_line_reader<R: BufRead + Send + 'static>(mut input: R) -> Receiver<io::Result<String>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || loop {
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                if tx.send(Ok(line)).is_err() {
                    break;
                }
            }
            Err(e) => {
                let _ = tx.send(Err(e));
                break;
            }
        }
    });
    rx
}

/// Wait for the next input line, running due timers while idle.
///
/// Returns `None` at end of input.
fn next_line(
    lines: &Receiver<io::Result<String>>,
    session: &mut Session<HeadlessSurface>,
    store: &NoteStore,
) -> Result<Option<String>> {
    loop {
        let received = match session.next_deadline() {
            Some(deadline) => {
                lines.recv_timeout(deadline.saturating_duration_since(Instant::now()))
            }
            None => lines.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(Ok(line)) => return Ok(Some(line)),
            Ok(Err(e)) => return Err(e.into()),
            Err(RecvTimeoutError::Timeout) => {
                if session.tick(store, Instant::now()) {
                    debug!("Saved while idle");
                }
            }
            Err(RecvTimeoutError::Disconnected) => return Ok(None),
        }
    }
}

/// A y/N answer read from the same input as commands.
fn confirm(lines: &Receiver<io::Result<String>>) -> bool {
    matches!(lines.recv(), Ok(Ok(answer)) if answer.trim().eq_ignore_ascii_case("y"))
}

fn execute<W: Write>(
    store: &mut NoteStore,
    session: &mut Session<HeadlessSurface>,
    command: &str,
    arg: &str,
    lines: &Receiver<io::Result<String>>,
    out: &mut W,
) -> Result<Flow> {
    let now = Instant::now();

    match command {
        "new" => {
            let id = session.create_record(store, now)?;
            if !arg.is_empty() {
                session.apply_edit(store, content(arg), now)?;
            }
            writeln!(out, "Created note {} ({})", store.len(), id.short())?;
        }
        "list" | "ls" => {
            if store.is_empty() {
                writeln!(out, "No notes found.")?;
            }
            for (i, note) in store.get_all().iter().enumerate() {
                let marker = if session.active_id() == Some(&note.id) { ">" } else { " " };
                writeln!(out, "{}{:3} ({}) {}", marker, i + 1, note.id.short(), note.title)?;
            }
        }
        "open" => {
            let id = resolve_id(store, arg)?;
            session.switch_active(store, &id, now)?;
            write_active(store, session, out)?;
        }
        "edit" => edit(store, session, out, content(arg), now)?,
        "rename" => edit(store, session, out, SurfaceChange::Renamed(arg.to_string()), now)?,
        "pin" => edit(store, session, out, SurfaceChange::Pinned(true), now)?,
        "unpin" => edit(store, session, out, SurfaceChange::Pinned(false), now)?,
        "color" | "colour" => {
            let color = resolve_color(arg)?;
            edit(store, session, out, SurfaceChange::Color(color), now)?;
        }
        "delete" | "rm" => {
            let outcome = session.delete_active(
                store,
                |note| {
                    let _ = write!(out, "Delete '{}'? [y/N] ", note.title);
                    let _ = out.flush();
                    confirm(lines)
                },
                now,
            )?;
            match outcome {
                DeleteOutcome::Deleted { deleted, next } => {
                    writeln!(out, "Deleted ({})", deleted.short())?;
                    if next.is_some() {
                        write_active(store, session, out)?;
                    } else {
                        writeln!(out, "No notes left.")?;
                    }
                }
                DeleteOutcome::Declined => writeln!(out, "Cancelled.")?,
                DeleteOutcome::NoActiveNote => writeln!(out, "No open note.")?,
            }
        }
        "restore" | "undo" => {
            if session.restore_last_deleted(store, now)? {
                writeln!(out, "Restored.")?;
            } else {
                writeln!(out, "Nothing to restore.")?;
            }
        }
        "search" => {
            let hits = session.search(store, arg);
            if hits.is_empty() {
                writeln!(out, "No results found for '{}'.", arg)?;
            }
            for hit in hits {
                writeln!(out, "  ({}) {}", hit.id.short(), hit.title)?;
            }
        }
        "status" => {
            write_active(store, session, out)?;
            if let Some(status) = session.status() {
                writeln!(out, "Status: {}", status)?;
            }
            let pending = if session.save_pending() { "yes" } else { "no" };
            writeln!(out, "Save pending: {}", pending)?;
        }
        "help" | "?" => writeln!(out, "{}", HELP)?,
        "quit" | "exit" | "q" => return Ok(Flow::Quit),
        other => writeln!(out, "Unknown command '{}'. Type 'help'.", other)?,
    }

    Ok(Flow::Continue)
}

/// `\n` in shell input stands for a line break.
fn content(arg: &str) -> SurfaceChange {
    SurfaceChange::Content(RichDocument::from_lines(&arg.replace("\\n", "\n")))
}

fn edit<W: Write>(
    store: &mut NoteStore,
    session: &mut Session<HeadlessSurface>,
    out: &mut W,
    change: SurfaceChange,
    now: Instant,
) -> Result<()> {
    if session.apply_edit(store, change, now)? {
        write_active(store, session, out)?;
    } else {
        writeln!(out, "No open note. Use 'new' or 'open <ID>'.")?;
    }
    Ok(())
}

fn write_active<W: Write>(
    store: &NoteStore,
    session: &Session<HeadlessSurface>,
    out: &mut W,
) -> Result<()> {
    match session.active_id().and_then(|id| store.get(id)) {
        Some(note) => {
            writeln!(out, "Open: ({}) {}", note.id.short(), note.title)?;
            if !session.preview().is_empty() {
                writeln!(out, "      {}", session.preview())?;
            }
        }
        None => writeln!(out, "No open note.")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;

    fn config(tmp: &TempDir) -> NoteConfig {
        NoteConfig::default().with_data_file(Some(tmp.path().join("notes.json")))
    }

    fn run(config: &NoteConfig, script: &str) -> String {
        let mut out = Vec::new();
        run_shell(config, Cursor::new(script.to_string()), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    /// Serves `script`, then stays silent for `idle` and records what the
    /// data file holds at that point before reporting end of input.
    struct IdleInput {
        script: Cursor<Vec<u8>>,
        idle: Duration,
        data_file: PathBuf,
        seen: Arc<Mutex<Option<String>>>,
    }

    impl Read for IdleInput {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.script.read(buf)?;
            if n == 0 {
                std::thread::sleep(self.idle);
                let raw = std::fs::read_to_string(&self.data_file).ok();
                *self.seen.lock().unwrap() = raw;
            }
            Ok(n)
        }
    }

    #[test]
    fn test_debounced_save_fires_while_idle() {
        let tmp = TempDir::new().unwrap();
        let config = NoteConfig {
            save_debounce_ms: 50,
            ..config(&tmp)
        };
        let seen = Arc::new(Mutex::new(None));
        let input = IdleInput {
            script: Cursor::new(b"new\nedit hello-idle\n".to_vec()),
            idle: Duration::from_millis(500),
            data_file: config.data_file().to_path_buf(),
            seen: Arc::clone(&seen),
        };

        let mut out = Vec::new();
        run_shell(&config, BufReader::new(input), &mut out).unwrap();

        let raw = seen.lock().unwrap().clone().unwrap();
        assert!(raw.contains("hello-idle"));
    }

    #[test]
    fn test_edits_are_flushed_on_quit() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);

        let output = run(&config, "new\nedit Shopping\\nmilk\nstatus\nquit\n");
        assert!(output.contains("Open: ("));
        assert!(output.contains("Save pending: "));

        let store = NoteStore::open(config.data_file());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_all()[0].title, "Shopping");
    }

    #[test]
    fn test_end_of_input_also_flushes() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);

        run(&config, "new first\nrename Custom");

        let store = NoteStore::open(config.data_file());
        assert_eq!(store.get_all()[0].title, "Custom");
    }

    #[test]
    fn test_delete_and_restore_within_one_shell() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);

        let output = run(&config, "new keep me\ndelete\ny\nrestore\nlist\nquit\n");
        assert!(output.contains("Deleted ("));
        assert!(output.contains("No notes left."));
        assert!(output.contains("Restored."));

        let store = NoteStore::open(config.data_file());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_all()[0].title, "keep me");
    }

    #[test]
    fn test_delete_declined() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);

        let output = run(&config, "new stays\ndelete\nn\nquit\n");
        assert!(output.contains("Cancelled."));
        assert_eq!(NoteStore::open(config.data_file()).len(), 1);
    }

    #[test]
    fn test_restore_in_new_shell_has_nothing() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);
        run(&config, "new gone\ndelete\ny\nquit\n");

        let output = run(&config, "restore\nquit\n");
        assert!(output.contains("Nothing to restore."));
    }

    #[test]
    fn test_edit_without_open_note() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);

        let output = run(&config, "edit hello\nquit\n");
        assert!(output.contains("No open note."));
        assert!(!config.data_file().exists());
    }

    #[test]
    fn test_errors_do_not_end_the_shell() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);

        let output = run(&config, "open nope\ncolor mauve\nbogus\nnew still here\nquit\n");
        assert!(output.contains("Error: Note not found: nope"));
        assert!(output.contains("Unknown command 'bogus'"));
        assert_eq!(NoteStore::open(config.data_file()).len(), 1);
    }

    #[test]
    fn test_open_and_search() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);

        let output = run(
            &config,
            "new Groceries\\nmilk\nnew Ideas\\nnovel\nopen 1\nsearch novel\npin\nstatus\nquit\n",
        );
        assert!(output.contains("Open: ("));
        assert!(output.contains(") Ideas"));
        assert!(output.contains("Status: Pinned"));

        let store = NoteStore::open(config.data_file());
        assert!(store.get_all()[0].is_pinned);
        assert!(!store.get_all()[1].is_pinned);
    }
}
