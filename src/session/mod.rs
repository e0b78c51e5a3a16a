//! Session controller: the active note of one editing surface.
//!
//! A session mediates between surface notifications and the shared
//! [`NoteStore`]. Edits land in the active record right away and arm a
//! debounced save; create, delete and restore save immediately. While a
//! record is being presented, `suppress_save` is set and any change
//! notifications it triggers are dropped instead of being treated as edits.

mod surface;

pub use surface::{EditSurface, HeadlessSurface, SurfaceChange, SurfaceState};

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::codec::preview_from_text;
use crate::config::NoteConfig;
use crate::entity::{NoteId, NoteRecord};
use crate::error::{Result, StickyNoteError};
use crate::export;
use crate::scheduler::{OneShotTimer, SaveScheduler};
use crate::search::{self, SearchHit};
use crate::storage::NoteStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    /// Started, no active note.
    Ready,
    Active(NoteId),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted {
        deleted: NoteId,
        /// The note selected afterwards, if any remain.
        next: Option<NoteId>,
    },
    Declined,
    NoActiveNote,
}

/// Short-lived status text, e.g. "Pinned".
#[derive(Debug, Clone)]
struct StatusToast {
    text: Option<String>,
    timer: OneShotTimer,
}

impl StatusToast {
    fn new(duration: Duration) -> Self {
        Self {
            text: None,
            timer: OneShotTimer::new(duration),
        }
    }

    fn show(&mut self, text: &str, now: Instant) {
        self.text = Some(text.to_string());
        self.timer.arm(now);
    }

    fn tick(&mut self, now: Instant) {
        if self.timer.fire_if_due(now) {
            self.text = None;
        }
    }
}

pub struct Session<S: EditSurface> {
    surface: S,
    state: SessionState,
    buffer: Option<SurfaceState>,
    preview: String,
    suppress_save: bool,
    scheduler: SaveScheduler,
    status: StatusToast,
}

impl<S: EditSurface> Session<S> {
    pub fn new(surface: S, config: &NoteConfig) -> Self {
        Self::with_delays(surface, config.save_debounce(), config.status_toast())
    }

    pub fn with_delays(surface: S, save_delay: Duration, status_delay: Duration) -> Self {
        Self {
            surface,
            state: SessionState::Uninitialized,
            buffer: None,
            preview: String::new(),
            suppress_save: false,
            scheduler: SaveScheduler::new(save_delay),
            status: StatusToast::new(status_delay),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn active_id(&self) -> Option<&NoteId> {
        match &self.state {
            SessionState::Active(id) => Some(id),
            _ => None,
        }
    }

    /// True when started but no note is active.
    pub fn is_empty(&self) -> bool {
        self.state == SessionState::Ready
    }

    pub fn is_suppressing_saves(&self) -> bool {
        self.suppress_save
    }

    pub fn save_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn scheduler(&self) -> &SaveScheduler {
        &self.scheduler
    }

    pub fn buffer(&self) -> Option<&SurfaceState> {
        self.buffer.as_ref()
    }

    /// Preview line of the active note.
    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub fn status(&self) -> Option<&str> {
        self.status.text.as_deref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Earliest pending timer deadline, for the control loop to wait on.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.scheduler.deadline(), self.status.timer.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Leave `Uninitialized` and activate the first note, if any.
    pub fn start(&mut self, store: &mut NoteStore, now: Instant) -> Result<()> {
        self.ensure_open()?;
        if self.state != SessionState::Uninitialized {
            return Ok(());
        }
        self.state = SessionState::Ready;
        match store.get_all().first().cloned() {
            Some(first) => self.present(store, &first, now),
            None => self.enter_empty(),
        }
        Ok(())
    }

    /// Make `id` the active note.
    ///
    /// Pending edits of the previous note are written into its record and
    /// scheduled for saving before anything of `id` is shown.
    pub fn switch_active(
        &mut self,
        store: &mut NoteStore,
        id: &NoteId,
        now: Instant,
    ) -> Result<()> {
        self.ensure_open()?;
        let record = store
            .get(id)
            .cloned()
            .ok_or_else(|| StickyNoteError::NoteNotFound(id.to_string()))?;

        self.flush_buffer(store, now);
        self.present(store, &record, now);
        Ok(())
    }

    /// Apply a surface notification to the active note.
    ///
    /// Returns false when the change was ignored: while presenting, or when
    /// no note is active.
    pub fn apply_edit(
        &mut self,
        store: &mut NoteStore,
        change: SurfaceChange,
        now: Instant,
    ) -> Result<bool> {
        self.ensure_open()?;
        if self.suppress_save {
            debug!(?change, "Ignoring change raised while presenting a note");
            return Ok(false);
        }
        let id = match &self.state {
            SessionState::Active(id) => id.clone(),
            _ => return Ok(false),
        };
        let buffer = match self.buffer.as_mut() {
            Some(buffer) => buffer,
            None => return Ok(false),
        };

        let pin_change = match &change {
            SurfaceChange::Pinned(pinned) if *pinned != buffer.is_pinned => Some(*pinned),
            _ => None,
        };
        buffer.apply(change)?;

        let record = match store.get_mut(&id) {
            Some(record) => record,
            None => {
                warn!(note_id = %id, "Active note no longer exists, leaving it");
                self.enter_empty();
                return Ok(false);
            }
        };
        buffer.write_into(record);
        self.preview = preview_from_text(&buffer.plain_text());

        if let Some(pinned) = pin_change {
            self.status.show(if pinned { "Pinned" } else { "Unpinned" }, now);
        }

        self.scheduler.schedule_save(now);
        Ok(true)
    }

    /// Create an empty note, save it and make it active.
    pub fn create_record(&mut self, store: &mut NoteStore, now: Instant) -> Result<NoteId> {
        self.create_record_with(store, NoteRecord::new(), now)
    }

    /// Add `record` as a new note, save it and make it active.
    pub fn create_record_with(
        &mut self,
        store: &mut NoteStore,
        record: NoteRecord,
        now: Instant,
    ) -> Result<NoteId> {
        self.ensure_open()?;
        self.flush_buffer(store, now);

        let id = record.id.clone();
        info!(note_id = %id, "Creating note");
        store.add(record.clone());
        // The immediate save above covered anything that was pending.
        self.scheduler.cancel();

        self.present(store, &record, now);
        Ok(id)
    }

    /// Delete the active note if `confirm` agrees, then select the first
    /// remaining note or enter the empty state.
    pub fn delete_active<F>(
        &mut self,
        store: &mut NoteStore,
        confirm: F,
        now: Instant,
    ) -> Result<DeleteOutcome>
    where
        F: FnOnce(&NoteRecord) -> bool,
    {
        self.ensure_open()?;
        let id = match &self.state {
            SessionState::Active(id) => id.clone(),
            _ => return Ok(DeleteOutcome::NoActiveNote),
        };

        self.flush_buffer(store, now);
        let record = match store.get(&id) {
            Some(record) => record.clone(),
            None => {
                self.enter_empty();
                return Ok(DeleteOutcome::NoActiveNote);
            }
        };

        if !confirm(&record) {
            debug!(note_id = %id, "Delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        info!(note_id = %id, "Deleting note");
        store.remove(&id);
        self.scheduler.cancel();

        let next = store.get_all().first().cloned();
        match &next {
            Some(record) => self.present(store, record, now),
            None => self.enter_empty(),
        }

        Ok(DeleteOutcome::Deleted {
            deleted: id,
            next: next.map(|r| r.id),
        })
    }

    /// Put the last deleted note back.
    ///
    /// The restored note becomes active if the session was empty.
    pub fn restore_last_deleted(&mut self, store: &mut NoteStore, now: Instant) -> Result<bool> {
        self.ensure_open()?;
        self.flush_buffer(store, now);

        if !store.restore_last_deleted() {
            return Ok(false);
        }
        self.scheduler.cancel();
        self.status.show("Restored", now);

        if self.active_id().is_none() {
            if let Some(restored) = store.get_all().last().cloned() {
                self.present(store, &restored, now);
            }
        }
        Ok(true)
    }

    /// Drive the timers. Returns true if a debounced save ran.
    pub fn tick(&mut self, store: &NoteStore, now: Instant) -> bool {
        if self.state == SessionState::Closed {
            return false;
        }
        self.status.tick(now);
        self.scheduler.poll(now, store)
    }

    /// Flush pending edits synchronously and close the session.
    pub fn close(&mut self, store: &mut NoteStore) {
        if self.state == SessionState::Closed {
            return;
        }
        self.flush_buffer(store, Instant::now());
        if self.scheduler.flush(&*store) {
            debug!("Flushed pending save on close");
        }
        self.state = SessionState::Closed;
        self.buffer = None;
    }

    pub fn export_all(&self, store: &NoteStore) -> Vec<(NoteId, String)> {
        export::export_all(store.get_all())
    }

    pub fn search(&self, store: &NoteStore, query: &str) -> Vec<SearchHit> {
        search::search(store.get_all(), query)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Err(StickyNoteError::SessionClosed);
        }
        Ok(())
    }

    /// Write the buffer into the active record if it differs, arming a save.
    fn flush_buffer(&mut self, store: &mut NoteStore, now: Instant) {
        let (id, buffer) = match (&self.state, &self.buffer) {
            (SessionState::Active(id), Some(buffer)) => (id, buffer),
            _ => return,
        };
        if let Some(record) = store.get_mut(id) {
            if SurfaceState::from_record(record) != *buffer {
                buffer.write_into(record);
                self.scheduler.schedule_save(now);
            }
        }
    }

    /// Show `record` on the surface with saves suppressed.
    fn present(&mut self, store: &mut NoteStore, record: &NoteRecord, now: Instant) {
        let state = SurfaceState::from_record(record);
        self.state = SessionState::Active(record.id.clone());
        self.preview = preview_from_text(&state.plain_text());
        self.buffer = Some(state.clone());

        self.suppress_save = true;
        let echoes = self.surface.present(&state);
        for change in echoes {
            // Routed through the normal path; the guard drops them.
            let _ = self.apply_edit(store, change, now);
        }
        self.suppress_save = false;

        debug!(note_id = %record.id, "Note active");
    }

    fn enter_empty(&mut self) {
        self.state = SessionState::Ready;
        self.buffer = None;
        self.preview.clear();
        self.surface.clear();
        debug!("No notes, session empty");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RichDocument;
    use crate::entity::Position;
    use tempfile::TempDir;

    const DELAY: Duration = Duration::from_millis(400);

    /// Echoes every presented field back as a change, like a toolkit that
    /// fires change events on programmatic assignment.
    #[derive(Default)]
    struct EchoingSurface {
        presented: usize,
        cleared: usize,
    }

    impl EditSurface for EchoingSurface {
        fn present(&mut self, state: &SurfaceState) -> Vec<SurfaceChange> {
            self.presented += 1;
            vec![
                SurfaceChange::Content(state.document.clone()),
                SurfaceChange::Moved(state.position),
                SurfaceChange::Pinned(state.is_pinned),
            ]
        }

        fn clear(&mut self) {
            self.cleared += 1;
        }
    }

    fn store_in(tmp: &TempDir) -> NoteStore {
        NoteStore::new(tmp.path().join("notes.json"))
    }

    fn session() -> Session<EchoingSurface> {
        Session::with_delays(EchoingSurface::default(), DELAY, Duration::from_millis(1200))
    }

    fn content(text: &str) -> SurfaceChange {
        SurfaceChange::Content(RichDocument::from_lines(text))
    }

    #[test]
    fn test_start_with_empty_store() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let mut session = session();
        assert_eq!(session.state(), &SessionState::Uninitialized);

        session.start(&mut store, Instant::now()).unwrap();

        assert!(session.is_empty());
        assert!(session.active_id().is_none());
        assert_eq!(session.surface().cleared, 1);
    }

    #[test]
    fn test_start_activates_first_note() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let first = NoteRecord::with_content("first");
        store.add(first.clone());
        store.add(NoteRecord::with_content("second"));

        let mut session = session();
        session.start(&mut store, Instant::now()).unwrap();

        assert_eq!(session.active_id(), Some(&first.id));
    }

    #[test]
    fn test_switch_does_not_schedule_save() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let a = NoteRecord::with_content("a");
        let b = NoteRecord::with_content("b");
        store.add(a.clone());
        store.add(b.clone());

        let start = Instant::now();
        let mut session = session();
        session.start(&mut store, start).unwrap();
        session.switch_active(&mut store, &b.id, start).unwrap();
        session.switch_active(&mut store, &a.id, start).unwrap();

        assert_eq!(session.surface().presented, 3);
        assert!(!session.save_pending());
        assert!(!session.tick(&store, start + DELAY * 4));
        assert_eq!(session.scheduler().saves_performed(), 0);
        assert!(!session.is_suppressing_saves());
    }

    #[test]
    fn test_switch_to_unknown_note_fails() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let mut session = session();
        session.start(&mut store, Instant::now()).unwrap();

        let result = session.switch_active(&mut store, &NoteId::from("nope"), Instant::now());
        assert!(matches!(result, Err(StickyNoteError::NoteNotFound(_))));
    }

    #[test]
    fn test_edit_updates_record_and_debounces() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let mut session = session();
        let start = Instant::now();
        session.start(&mut store, start).unwrap();
        let id = session.create_record(&mut store, start).unwrap();

        for (i, text) in ["S", "Sh", "Shop", "Shopping\nmilk"].iter().enumerate() {
            let now = start + Duration::from_millis(100 * i as u64);
            assert!(session.apply_edit(&mut store, content(text), now).unwrap());
        }

        let record = store.get(&id).unwrap();
        assert_eq!(record.title, "Shopping");
        assert_eq!(crate::codec::plain_text(&record.content), "Shopping\nmilk");
        assert_eq!(session.preview(), "milk");

        let last = start + Duration::from_millis(300);
        assert!(!session.tick(&store, last + Duration::from_millis(399)));
        assert!(session.tick(&store, last + DELAY));
        assert!(!session.tick(&store, last + DELAY * 3));
        assert_eq!(session.scheduler().saves_performed(), 1);

        let reloaded = NoteStore::open(store.path());
        assert_eq!(reloaded.get(&id).unwrap().title, "Shopping");
    }

    #[test]
    fn test_switch_flushes_previous_note_first() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let a = NoteRecord::with_content("a");
        let b = NoteRecord::with_content("b");
        store.add(a.clone());
        store.add(b.clone());

        let now = Instant::now();
        let mut session = session();
        session.start(&mut store, now).unwrap();
        session.apply_edit(&mut store, content("a edited"), now).unwrap();
        session.switch_active(&mut store, &b.id, now).unwrap();
        session.apply_edit(&mut store, content("b edited"), now).unwrap();

        let a_text = crate::codec::plain_text(&store.get(&a.id).unwrap().content);
        let b_text = crate::codec::plain_text(&store.get(&b.id).unwrap().content);
        assert_eq!(a_text, "a edited");
        assert_eq!(b_text, "b edited");
    }

    #[test]
    fn test_edits_ignored_in_empty_state() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let mut session = session();
        let now = Instant::now();
        session.start(&mut store, now).unwrap();

        assert!(!session.apply_edit(&mut store, content("lost"), now).unwrap());
        assert!(!session.save_pending());
        assert!(store.is_empty());
    }

    #[test]
    fn test_create_saves_immediately() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let mut session = session();
        let now = Instant::now();
        session.start(&mut store, now).unwrap();

        let id = session.create_record(&mut store, now).unwrap();

        assert_eq!(session.active_id(), Some(&id));
        assert!(!session.save_pending());
        assert!(NoteStore::open(store.path()).contains(&id));
    }

    #[test]
    fn test_delete_selects_first_remaining() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let a = NoteRecord::with_content("a");
        let b = NoteRecord::with_content("b");
        let c = NoteRecord::with_content("c");
        store.add(a.clone());
        store.add(b.clone());
        store.add(c.clone());

        let now = Instant::now();
        let mut session = session();
        session.start(&mut store, now).unwrap();
        session.switch_active(&mut store, &c.id, now).unwrap();

        let outcome = session.delete_active(&mut store, |_| true, now).unwrap();

        assert_eq!(
            outcome,
            DeleteOutcome::Deleted {
                deleted: c.id.clone(),
                next: Some(a.id.clone()),
            }
        );
        assert_eq!(session.active_id(), Some(&a.id));
        assert_eq!(NoteStore::open(store.path()).len(), 2);
    }

    #[test]
    fn test_delete_declined_keeps_note() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let a = NoteRecord::with_content("a");
        store.add(a.clone());

        let now = Instant::now();
        let mut session = session();
        session.start(&mut store, now).unwrap();

        let outcome = session.delete_active(&mut store, |_| false, now).unwrap();
        assert_eq!(outcome, DeleteOutcome::Declined);
        assert!(store.contains(&a.id));
        assert_eq!(session.active_id(), Some(&a.id));
    }

    #[test]
    fn test_delete_last_note_enters_empty_state() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let now = Instant::now();
        let mut session = session();
        session.start(&mut store, now).unwrap();
        session.create_record(&mut store, now).unwrap();

        let outcome = session.delete_active(&mut store, |_| true, now).unwrap();

        assert!(matches!(outcome, DeleteOutcome::Deleted { next: None, .. }));
        assert!(session.is_empty());
        assert_eq!(
            session.delete_active(&mut store, |_| true, now).unwrap(),
            DeleteOutcome::NoActiveNote
        );
    }

    #[test]
    fn test_restore_reactivates_when_empty() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let now = Instant::now();
        let mut session = session();
        session.start(&mut store, now).unwrap();
        let id = session.create_record(&mut store, now).unwrap();
        session.apply_edit(&mut store, content("keep me"), now).unwrap();
        session.delete_active(&mut store, |_| true, now).unwrap();

        assert!(session.restore_last_deleted(&mut store, now).unwrap());
        assert_eq!(session.active_id(), Some(&id));
        assert_eq!(session.status(), Some("Restored"));
        assert_eq!(
            crate::codec::plain_text(&store.get(&id).unwrap().content),
            "keep me"
        );
    }

    #[test]
    fn test_restore_with_nothing_deleted() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let mut session = session();
        let now = Instant::now();
        session.start(&mut store, now).unwrap();
        assert!(!session.restore_last_deleted(&mut store, now).unwrap());
    }

    #[test]
    fn test_pin_shows_status_until_it_expires() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let now = Instant::now();
        let mut session = session();
        session.start(&mut store, now).unwrap();
        session.create_record(&mut store, now).unwrap();

        session.apply_edit(&mut store, SurfaceChange::Pinned(true), now).unwrap();
        assert_eq!(session.status(), Some("Pinned"));

        session.tick(&store, now + Duration::from_millis(1200));
        assert!(session.status().is_none());
    }

    #[test]
    fn test_close_flushes_pending_save() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let now = Instant::now();
        let mut session = session();
        session.start(&mut store, now).unwrap();
        let id = session.create_record(&mut store, now).unwrap();
        session
            .apply_edit(&mut store, SurfaceChange::Moved(Position::new(40.0, 60.0)), now)
            .unwrap();
        assert!(session.save_pending());

        session.close(&mut store);

        assert_eq!(session.state(), &SessionState::Closed);
        let reloaded = NoteStore::open(store.path());
        assert_eq!(reloaded.get(&id).unwrap().position, Position::new(40.0, 60.0));
        assert!(matches!(
            session.apply_edit(&mut store, content("late"), now),
            Err(StickyNoteError::SessionClosed)
        ));
    }

    #[test]
    fn test_invalid_edit_is_rejected_without_saving() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let now = Instant::now();
        let mut session = session();
        session.start(&mut store, now).unwrap();
        session.create_record(&mut store, now).unwrap();

        let result = session.apply_edit(&mut store, SurfaceChange::Color("red".to_string()), now);
        assert!(matches!(result, Err(StickyNoteError::InvalidValue(_))));
        assert!(!session.save_pending());
    }

    #[test]
    fn test_note_deleted_by_another_session() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let now = Instant::now();
        let mut first = session();
        let mut second = session();
        first.start(&mut store, now).unwrap();
        let id = first.create_record(&mut store, now).unwrap();
        second.start(&mut store, now).unwrap();
        assert_eq!(second.active_id(), Some(&id));

        first.delete_active(&mut store, |_| true, now).unwrap();

        assert!(!second.apply_edit(&mut store, content("orphan"), now).unwrap());
        assert!(second.is_empty());
    }

    #[test]
    fn test_search_and_export_through_session() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        store.add(NoteRecord::with_content("Groceries\nmilk"));
        store.add(NoteRecord::with_content("Ideas\nwrite a novel"));

        let mut session = session();
        session.start(&mut store, Instant::now()).unwrap();

        let hits = session.search(&store, "MILK");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Groceries");
        assert_eq!(session.export_all(&store).len(), 2);
    }
}
