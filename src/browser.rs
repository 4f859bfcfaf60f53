//! Navigation controller: tabs, directory enter/leave, input handling.
//!
//! Owns the worker and the shared [`WindowedCache`]. Worker events are only
//! applied from [`ArchiveBrowser::pump`], so a UI loop decides when the cache
//! changes. File actions live in [`crate::actions`].

use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::actions::{Clipboard, MenuItem};
use crate::cache::{DirectoryEntry, LoadRequest, WindowedCache};
use crate::config::Config;
use crate::error::ActionError;
use crate::favorites::FavoritesStore;
use crate::launcher::AppLauncher;
use crate::path;
use crate::storage::Storage;
use crate::tabs::{Direction, Tab};
use crate::worker::{BrowserWorker, WorkerConfig, WorkerEvent, WorkerOptions};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputKey {
    Up,
    Down,
    Left,
    Right,
    Ok,
    Back,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputKind {
    Short,
    Long,
    Repeat,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct InputEvent {
    pub key: InputKey,
    pub kind: InputKind,
}

impl InputEvent {
    pub fn short(key: InputKey) -> Self {
        InputEvent {
            key,
            kind: InputKind::Short,
        }
    }

    pub fn long(key: InputKey) -> Self {
        InputEvent {
            key,
            kind: InputKind::Long,
        }
    }
}

/// What the UI should do after an input was handled.
#[derive(Debug)]
pub enum BrowserAction {
    Ignored,
    Handled,
    /// Show [`ArchiveBrowser::context_menu`] for the selection.
    OpenMenu,
    /// Back was pressed at a tab root.
    Exit,
    Failed(ActionError),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Leave {
    ExitBrowser,
    Navigated,
}

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub window_capacity: usize,
    pub viewport_rows: usize,
    pub long_load_threshold: usize,
    pub history_depth: usize,
    pub max_name_len: usize,
    pub show_parent_entry: bool,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        BrowserOptions::from(&Config::default())
    }
}

impl From<&Config> for BrowserOptions {
    fn from(config: &Config) -> Self {
        BrowserOptions {
            window_capacity: config.window_capacity,
            viewport_rows: config.viewport_rows,
            long_load_threshold: config.long_load_threshold,
            history_depth: config.history_depth,
            max_name_len: config.max_name_len,
            show_parent_entry: config.show_parent_entry,
        }
    }
}

pub struct ArchiveBrowser {
    pub(crate) storage: Arc<dyn Storage>,
    pub(crate) favorites: FavoritesStore,
    pub(crate) launcher: Box<dyn AppLauncher>,
    pub(crate) options: BrowserOptions,
    cache: Arc<Mutex<WindowedCache>>,
    worker: Option<BrowserWorker>,
    events: Option<Receiver<WorkerEvent>>,
    /// Folder-open replies still expected from the worker.
    pending_opens: usize,
    pub(crate) tab: Tab,
    pub(crate) path: String,
    is_root: bool,
    last_switch: Direction,
    pub(crate) move_mode: bool,
    /// Favorite being moved, refocused when the move is abandoned.
    pub(crate) move_origin: Option<String>,
    pub(crate) clipboard: Option<Clipboard>,
}

impl ArchiveBrowser {
    pub fn new(
        storage: Arc<dyn Storage>,
        launcher: Box<dyn AppLauncher>,
        options: BrowserOptions,
    ) -> Self {
        let cache = WindowedCache::new(
            options.window_capacity,
            options.viewport_rows,
            options.show_parent_entry,
        );
        ArchiveBrowser {
            favorites: FavoritesStore::new(storage.clone()),
            storage,
            launcher,
            options,
            cache: Arc::new(Mutex::new(cache)),
            worker: None,
            events: None,
            pending_opens: 0,
            tab: Tab::Browser,
            path: Tab::Browser.default_path().to_string(),
            is_root: true,
            last_switch: Direction::Right,
            move_mode: false,
            move_origin: None,
            clipboard: None,
        }
    }

    // ── State ───────────────────────────────────────────────────────────

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn is_move_mode(&self) -> bool {
        self.move_mode
    }

    pub fn clipboard(&self) -> Option<&Clipboard> {
        self.clipboard.as_ref()
    }

    pub fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    /// Lock the cache for reading or rendering.
    pub fn cache(&self) -> MutexGuard<'_, WindowedCache> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn current_entry(&self) -> Option<DirectoryEntry> {
        self.cache().current_entry().cloned()
    }

    /// At the tab root, where Back leaves the browser.
    pub fn is_home(&self) -> bool {
        self.is_root || self.path == self.tab.default_path()
    }

    // ── Tabs ────────────────────────────────────────────────────────────

    /// Open `tab`, moving on to the right if it has nothing to show.
    pub fn open_tab(&mut self, tab: Tab) {
        self.tab = tab.step(Direction::Left);
        self.switch_tab(Direction::Right);
    }

    /// Step to the neighbouring tab, skipping empty ones. Browser always
    /// accepts.
    pub fn switch_tab(&mut self, direction: Direction) {
        self.last_switch = direction;
        let mut tab = self.tab;
        for _ in 0..Tab::COUNT {
            tab = tab.step(direction);
            if tab == Tab::Browser || !self.tab_is_empty(tab) {
                break;
            }
            log::debug!("browser: skipping empty tab {}", tab);
        }
        self.land_on(tab);
    }

    pub fn tab_is_empty(&self, tab: Tab) -> bool {
        if tab == Tab::Favorites {
            return self.favorites.count() == 0;
        }
        if let Some(app) = tab.synthetic_app() {
            return !app.is_available(self.storage.as_ref());
        }
        !self.storage.dir_exists(tab.default_path())
    }

    fn land_on(&mut self, tab: Tab) {
        log::debug!("browser: tab {}", tab);
        self.tab = tab;
        self.path = tab.default_path().to_string();
        self.is_root = true;
        self.move_mode = false;
        self.move_origin = None;
        self.cache().clear();

        if tab == Tab::Favorites {
            self.load_favorites(None);
            // Every line was dead; the cleaned file is empty now.
            if self.cache().total() == 0 {
                self.switch_tab(self.last_switch);
            }
        } else if let Some(app) = tab.synthetic_app() {
            let entries = app
                .entries()
                .iter()
                .map(|p| DirectoryEntry::new(p, false))
                .collect();
            self.cache().set_static_listing(entries);
        } else {
            self.configure_worker(tab.default_path());
        }
    }

    /// Open the Browser tab at `path`; a file path focuses that file.
    pub fn open_in_browser(&mut self, path: &str) {
        self.tab = Tab::Browser;
        self.path = path.to_string();
        self.is_root = path == Tab::Browser.default_path();
        self.move_mode = false;
        self.cache().clear();
        self.configure_worker(path);
    }

    /// Re-read the favorites list into the cache, dropping dead entries.
    pub(crate) fn load_favorites(&mut self, focus: Option<&str>) {
        let listing = match self.favorites.read_all() {
            Ok(listing) => listing,
            Err(e) => {
                log::warn!("browser: cannot read favorites: {}", e);
                Default::default()
            }
        };
        if listing.needs_rewrite {
            if let Err(e) = self.favorites.rewrite_dropping_invalid() {
                log::warn!("browser: cannot clean favorites: {}", e);
            }
        }
        let entries: Vec<DirectoryEntry> = listing
            .entries
            .iter()
            .map(|p| {
                let mut entry = DirectoryEntry::new(p, self.storage.dir_exists(p));
                entry.is_favorite = true;
                entry
            })
            .collect();
        let index = focus.and_then(|f| entries.iter().position(|e| e.path == f));

        let mut cache = self.cache();
        cache.set_static_listing(entries);
        if let Some(i) = index {
            cache.select(i as u32);
        }
    }

    fn configure_worker(&mut self, path: &str) {
        let config = WorkerConfig {
            path: path.to_string(),
            base_path: self.tab.default_path().to_string(),
            filter: self.tab.extension_filter().to_string(),
            skip_assets: self.tab.hides_internals(),
            hide_dot_files: self.tab.hides_internals(),
        };
        if let Some(worker) = &self.worker {
            worker.set_config(config);
            self.pending_opens += 1;
            return;
        }
        let options = WorkerOptions {
            long_load_threshold: self.options.long_load_threshold,
            history_depth: self.options.history_depth,
        };
        match BrowserWorker::start(self.storage.clone(), config, options) {
            Ok((worker, events)) => {
                self.worker = Some(worker);
                self.events = Some(events);
                self.pending_opens += 1;
            }
            Err(e) => log::error!("browser: cannot start worker: {}", e),
        }
    }

    // ── Directories ─────────────────────────────────────────────────────

    /// Enter `name`, relative to the current directory unless absolute.
    pub fn enter_directory(&mut self, name: &str) -> Result<(), ActionError> {
        let target = if name.starts_with('/') {
            name.to_string()
        } else {
            path::join_path(&self.path, name)
        };
        let leaf = path::basename(&target);
        if leaf.len() >= self.options.max_name_len {
            return Err(ActionError::NameTooLong {
                len: leaf.len(),
                max: self.options.max_name_len,
            });
        }
        if !self.tab.is_filesystem() {
            return Err(ActionError::NotSupported("entering folders"));
        }
        let selected = self.cache().worker_selection();
        let Some(worker) = &self.worker else {
            return Err(ActionError::NotSupported("entering folders"));
        };
        worker.enter(&target, selected);
        self.pending_opens += 1;
        self.path = target;
        self.is_root = false;
        Ok(())
    }

    pub fn leave_directory(&mut self) -> Leave {
        if self.is_home() {
            return Leave::ExitBrowser;
        }
        let Some(worker) = &self.worker else {
            return Leave::ExitBrowser;
        };
        worker.exit();
        self.pending_opens += 1;
        path::trim_last_segment(&mut self.path);
        Leave::Navigated
    }

    /// Re-list the current directory keeping the selection.
    pub fn refresh(&mut self) {
        match self.tab {
            Tab::Favorites => {
                let focus = self.current_entry().map(|e| e.path);
                self.load_favorites(focus.as_deref());
                if self.cache().total() == 0 {
                    self.switch_tab(Direction::Right);
                }
            }
            tab if tab.synthetic_app().is_some() => {
                if self.tab_is_empty(tab) {
                    self.switch_tab(Direction::Right);
                }
            }
            _ => {
                let selected = self.cache().worker_selection();
                if let Some(worker) = &self.worker {
                    worker.refresh(selected);
                    self.pending_opens += 1;
                }
            }
        }
    }

    // ── Worker events ───────────────────────────────────────────────────

    /// Apply every queued worker event. Never blocks.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let event = match &self.events {
                Some(rx) => match rx.try_recv() {
                    Ok(ev) => ev,
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                },
                None => break,
            };
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Block until no open or window load is outstanding. Returns false on
    /// timeout.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if self.is_idle() {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                log::warn!("browser: still busy after {:?}", timeout);
                return false;
            }
            let event = match &self.events {
                Some(rx) => match rx.recv_timeout(remaining) {
                    Ok(ev) => ev,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => return false,
                },
                None => return true,
            };
            self.apply(event);
        }
    }

    pub fn is_idle(&self) -> bool {
        self.pending_opens == 0 && !self.cache().is_loading()
    }

    fn apply(&mut self, event: WorkerEvent) {
        if let WorkerEvent::FolderOpened { .. } = event {
            self.pending_opens = self.pending_opens.saturating_sub(1);
        }
        // Static tabs own the cache; late worker output is stale.
        if !self.tab.is_filesystem() {
            return;
        }
        match event {
            WorkerEvent::FolderOpened {
                path,
                total,
                found,
                is_root,
            } => {
                if !path::is_under(&path, self.tab.default_path()) {
                    log::debug!("browser: stale folder {} ignored", path);
                    return;
                }
                self.path = path;
                self.is_root = is_root;
                if total == 0 && self.is_home() && self.tab != Tab::Browser {
                    self.switch_tab(self.last_switch);
                    return;
                }
                let req = self.cache().on_folder_opened(total, found, is_root);
                self.request(req);
            }
            WorkerEvent::LongLoad => self.cache().on_long_load(),
            WorkerEvent::ListLoadOffset(offset) => self.cache().on_window_loaded(offset),
            WorkerEvent::Item { path, is_dir } => self.cache().on_item(&path, is_dir),
            WorkerEvent::ItemsEnd { complete } => {
                let next = self.cache().on_items_end(complete);
                if let Some(req) = next {
                    self.request(req);
                }
            }
        }
    }

    fn request(&self, req: LoadRequest) {
        if let Some(worker) = &self.worker {
            worker.load(req.offset, req.count);
        }
    }

    // ── Input ───────────────────────────────────────────────────────────

    pub fn handle_input(&mut self, input: InputEvent) -> BrowserAction {
        match (input.key, input.kind) {
            (InputKey::Left | InputKey::Right, InputKind::Short) => {
                if self.move_mode {
                    return BrowserAction::Ignored;
                }
                let dir = if input.key == InputKey::Left {
                    Direction::Left
                } else {
                    Direction::Right
                };
                self.switch_tab(dir);
                BrowserAction::Handled
            }
            (InputKey::Up | InputKey::Down, InputKind::Short | InputKind::Repeat) => {
                let delta = if input.key == InputKey::Up { -1 } else { 1 };
                self.move_selection(delta);
                BrowserAction::Handled
            }
            (InputKey::Ok, InputKind::Short) => self.on_ok_short(),
            (InputKey::Ok, InputKind::Long) => {
                if self.move_mode {
                    return into_action(self.save_move());
                }
                match self.current_entry() {
                    Some(e) if e.is_dir() || self.tab == Tab::Favorites => BrowserAction::OpenMenu,
                    _ => BrowserAction::Ignored,
                }
            }
            (InputKey::Back, InputKind::Short) => {
                if self.move_mode {
                    self.cancel_move();
                    return BrowserAction::Handled;
                }
                match self.leave_directory() {
                    Leave::ExitBrowser => BrowserAction::Exit,
                    Leave::Navigated => BrowserAction::Handled,
                }
            }
            _ => BrowserAction::Ignored,
        }
    }

    /// Move the selection, or the selected favorite in move mode.
    pub fn move_selection(&mut self, delta: i32) {
        if self.move_mode {
            self.cache().move_selected_entry(delta);
            return;
        }
        let req = self.cache().move_selection(delta);
        if let Some(req) = req {
            self.request(req);
        }
    }

    fn on_ok_short(&mut self) -> BrowserAction {
        let Some(entry) = self.current_entry() else {
            return BrowserAction::Ignored;
        };
        if self.tab == Tab::Favorites {
            let result = if self.move_mode {
                self.save_move()
            } else {
                self.run_favorite(&entry)
            };
            return into_action(result);
        }
        if entry.is_parent {
            self.leave_directory();
            return BrowserAction::Handled;
        }
        if entry.is_dir() {
            return into_action(self.enter_directory(&entry.path));
        }
        BrowserAction::OpenMenu
    }

    /// Favorites open folders in the Browser tab and run everything else.
    fn run_favorite(&mut self, entry: &DirectoryEntry) -> Result<(), ActionError> {
        if entry.is_dir() {
            self.open_in_browser(&entry.path);
            return Ok(());
        }
        self.run_in_app(entry)
    }

    /// Menu for the current selection.
    pub fn context_menu(&mut self) -> Vec<MenuItem> {
        let entry = self.current_entry();
        if let Some(e) = &entry {
            let pinned = self.tab == Tab::Favorites || self.favorites.contains(&e.path);
            self.cache().mark_favorite(&e.path, pinned);
        }
        let entry = self.current_entry();
        crate::actions::build_menu(self.tab, entry.as_ref(), self.clipboard.is_some())
    }
}

fn into_action(result: Result<(), ActionError>) -> BrowserAction {
    match result {
        Ok(()) => BrowserAction::Handled,
        Err(e) => BrowserAction::Failed(e),
    }
}
