//! Directory enumeration worker.
//!
//! One background thread per browser. The UI sends [`WorkerCmd`]s and the
//! worker answers with [`WorkerEvent`]s over a channel. Every scan reopens the
//! directory and streams it, so only the requested window is ever held.
//! Failures never cross the thread: a missing directory is walked up to the
//! nearest existing ancestor and an unreadable one lists as empty.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::filter;
use crate::history::NavigationHistory;
use crate::path::{self, ROOT};
use crate::storage::{RawEntry, Storage};

/// What to list and how to filter it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Directory (or file to focus) to open.
    pub path: String,
    /// Root of the current tab; walking up never goes above it.
    pub base_path: String,
    pub filter: String,
    pub skip_assets: bool,
    pub hide_dot_files: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerOptions {
    /// Raw entries scanned before `LongLoad` is reported.
    pub long_load_threshold: usize,
    pub history_depth: usize,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        WorkerOptions {
            long_load_threshold: 100,
            history_depth: 32,
        }
    }
}

/// Commands sent from the UI thread to the worker.
#[derive(Debug)]
enum WorkerCmd {
    Configure(WorkerConfig),
    Enter { path: String, selected: i32 },
    Exit,
    Refresh { selected: i32 },
    Load { offset: u32, count: u32 },
    Stop,
}

/// Results sent from the worker back to the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// A directory was (re)opened. `path` is where the worker ended up
    /// after walking up; `found` is the focused index or -1.
    FolderOpened {
        path: String,
        total: u32,
        found: i32,
        is_root: bool,
    },
    /// The current scan is large enough to show a busy indicator.
    LongLoad,
    /// A window load starts at this filtered offset.
    ListLoadOffset(u32),
    Item { path: String, is_dir: bool },
    /// Window load finished. `complete` is false if the directory no longer
    /// reaches the requested offset.
    ItemsEnd { complete: bool },
}

/// Handle to the running worker. Drop to stop and join.
pub struct BrowserWorker {
    cmd_tx: mpsc::Sender<WorkerCmd>,
    quit: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl BrowserWorker {
    /// Spawn the worker and immediately configure it. Returns the handle and a
    /// receiver for its events.
    pub fn start(
        storage: Arc<dyn Storage>,
        config: WorkerConfig,
        options: WorkerOptions,
    ) -> std::io::Result<(Self, mpsc::Receiver<WorkerEvent>)> {
        let (tx, rx) = mpsc::channel();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let quit = Arc::new(AtomicBool::new(false));
        let quit2 = quit.clone();

        let state = WorkerState {
            storage,
            config: config.clone(),
            path: config.path.clone(),
            target: None,
            history: NavigationHistory::new(options.history_depth),
            long_load_threshold: options.long_load_threshold,
            tx,
        };

        let thread = thread::Builder::new()
            .name("browser-worker".into())
            .spawn(move || run_worker(state, cmd_rx, quit2))?;

        let worker = BrowserWorker {
            cmd_tx,
            quit,
            thread: Some(thread),
        };
        worker.send(WorkerCmd::Configure(config));
        Ok((worker, rx))
    }

    /// Switch to a new root/filter. History is reset.
    pub fn set_config(&self, config: WorkerConfig) {
        self.send(WorkerCmd::Configure(config));
    }

    /// Open `path`, remembering `selected` for when it is left again.
    pub fn enter(&self, path: &str, selected: i32) {
        self.send(WorkerCmd::Enter {
            path: path.to_string(),
            selected,
        });
    }

    pub fn exit(&self) {
        self.send(WorkerCmd::Exit);
    }

    pub fn refresh(&self, selected: i32) {
        self.send(WorkerCmd::Refresh { selected });
    }

    pub fn load(&self, offset: u32, count: u32) {
        self.send(WorkerCmd::Load { offset, count });
    }

    pub fn stop(&mut self) {
        self.quit.store(true, Ordering::Release);
        self.cmd_tx.send(WorkerCmd::Stop).ok();
        if let Some(t) = self.thread.take() {
            t.join().ok();
        }
    }

    fn send(&self, cmd: WorkerCmd) {
        if self.cmd_tx.send(cmd).is_err() {
            log::warn!("worker: command dropped, thread is gone");
        }
    }
}

impl Drop for BrowserWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Worker thread ───────────────────────────────────────────────────────

fn run_worker(mut state: WorkerState, cmd_rx: mpsc::Receiver<WorkerCmd>, quit: Arc<AtomicBool>) {
    log::debug!("worker: started");
    'outer: while !quit.load(Ordering::Acquire) {
        let first = match cmd_rx.recv() {
            Ok(cmd) => cmd,
            Err(_) => break,
        };
        let mut batch = vec![first];
        while let Ok(cmd) = cmd_rx.try_recv() {
            batch.push(cmd);
        }

        // Only the newest window request in a batch is worth loading.
        let last_load = batch
            .iter()
            .rposition(|c| matches!(c, WorkerCmd::Load { .. }));

        for (i, cmd) in batch.into_iter().enumerate() {
            if quit.load(Ordering::Acquire) {
                break 'outer;
            }
            if matches!(cmd, WorkerCmd::Load { .. }) && Some(i) != last_load {
                log::debug!("worker: superseded load dropped");
                continue;
            }
            if !state.handle(cmd) {
                break 'outer;
            }
        }
    }
    log::debug!("worker: stopped");
}

struct WorkerState {
    storage: Arc<dyn Storage>,
    config: WorkerConfig,
    path: String,
    /// Name to locate in the next scan.
    target: Option<String>,
    history: NavigationHistory,
    long_load_threshold: usize,
    tx: mpsc::Sender<WorkerEvent>,
}

impl WorkerState {
    /// Returns false when the worker should stop.
    fn handle(&mut self, cmd: WorkerCmd) -> bool {
        match cmd {
            WorkerCmd::Configure(config) => {
                log::debug!("worker: configure {} [{}]", config.path, config.filter);
                self.path = config.path.clone();
                self.config = config;
                self.history.reset();
                self.target = None;
                if let Ok(info) = self.storage.stat(&self.path) {
                    if !info.is_dir {
                        self.target = Some(path::basename(&self.path).to_string());
                        self.path = path::dirname(&self.path).to_string();
                    }
                }
                self.open_folder();
            }
            WorkerCmd::Enter { path, selected } => {
                self.history.push(selected);
                log::debug!("worker: enter {} (depth {})", path, self.history.depth());
                self.path = path;
                self.target = None;
                self.open_folder();
            }
            WorkerCmd::Exit => {
                path::trim_last_segment(&mut self.path);
                self.switch_to_existing();
                let (total, _) = self.scan(None);
                let restored = self.history.pop().unwrap_or(0);
                let found = clamp_selection(restored, total);
                log::debug!("worker: exit to {} ({} items, idx {})", self.path, total, found);
                self.send(WorkerEvent::FolderOpened {
                    path: self.path.clone(),
                    total,
                    found,
                    is_root: self.is_root(),
                });
            }
            WorkerCmd::Refresh { selected } => {
                self.switch_to_existing();
                let (total, _) = self.scan(None);
                self.send(WorkerEvent::FolderOpened {
                    path: self.path.clone(),
                    total,
                    found: clamp_selection(selected, total),
                    is_root: self.is_root(),
                });
            }
            WorkerCmd::Load { offset, count } => self.load(offset, count),
            WorkerCmd::Stop => return false,
        }
        true
    }

    fn open_folder(&mut self) {
        self.switch_to_existing();
        let target = self.target.take();
        let (total, found) = self.scan(target.as_deref());
        log::debug!(
            "worker: opened {} ({} items, focus {})",
            self.path,
            total,
            found
        );
        self.send(WorkerEvent::FolderOpened {
            path: self.path.clone(),
            total,
            found,
            is_root: self.is_root(),
        });
    }

    /// Walk up until an existing directory, the tab root, or `/` is reached.
    fn switch_to_existing(&mut self) {
        loop {
            if self.storage.dir_exists(&self.path) || self.path == self.config.base_path {
                break;
            }
            let before = self.path.clone();
            if !path::trim_last_segment(&mut self.path) {
                break;
            }
            log::debug!("worker: {} missing, trying {}", before, self.path);
        }
    }

    fn is_root(&self) -> bool {
        self.path == self.config.base_path || self.path == ROOT
    }

    fn accepts(&self, entry: &RawEntry) -> bool {
        if self.config.hide_dot_files && filter::is_hidden(&entry.name) {
            return false;
        }
        filter::passes_filter(
            entry.is_dir,
            &entry.name,
            &self.config.filter,
            self.config.skip_assets,
        )
    }

    /// Count filtered entries and locate `target` among them.
    fn scan(&self, target: Option<&str>) -> (u32, i32) {
        let entries = match self.storage.read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("worker: cannot open {}: {}", self.path, e);
                return (0, -1);
            }
        };

        let mut total = 0u32;
        let mut found = -1i32;
        let mut long_load_sent = false;
        for (seen, entry) in entries.enumerate() {
            if !long_load_sent && seen >= self.long_load_threshold {
                self.send(WorkerEvent::LongLoad);
                long_load_sent = true;
            }
            if !self.accepts(&entry) {
                continue;
            }
            if target == Some(entry.name.as_str()) {
                found = total as i32;
            }
            total += 1;
        }
        (total, found)
    }

    fn load(&self, offset: u32, count: u32) {
        log::debug!("worker: load {} +{} from {}", offset, count, self.path);
        let entries = match self.storage.read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("worker: load of {} failed: {}", self.path, e);
                self.send(WorkerEvent::ListLoadOffset(offset));
                self.send(WorkerEvent::ItemsEnd { complete: false });
                return;
            }
        };

        let mut filtered = entries.filter(|e| self.accepts(e));
        for _ in 0..offset {
            if filtered.next().is_none() {
                log::warn!(
                    "worker: {} no longer reaches offset {}, window is stale",
                    self.path,
                    offset
                );
                self.send(WorkerEvent::ListLoadOffset(offset));
                self.send(WorkerEvent::ItemsEnd { complete: false });
                return;
            }
        }

        self.send(WorkerEvent::ListLoadOffset(offset));
        for entry in filtered.take(count as usize) {
            self.send(WorkerEvent::Item {
                path: path::join_path(&self.path, &entry.name),
                is_dir: entry.is_dir,
            });
        }
        self.send(WorkerEvent::ItemsEnd { complete: true });
    }

    fn send(&self, event: WorkerEvent) {
        // The UI may already be gone during teardown.
        self.tx.send(event).ok();
    }
}

fn clamp_selection(selected: i32, total: u32) -> i32 {
    if total == 0 {
        0
    } else {
        selected.clamp(0, total as i32 - 1)
    }
}
