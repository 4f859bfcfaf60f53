//! Bounded window over a filtered directory listing.
//!
//! Only `capacity` entries around the selection are materialized; everything
//! else is known by count. The cache is fed by worker events and answers with
//! [`LoadRequest`]s whenever the selection nears the edge of what is loaded.
//! Indices are global positions in the listing (including the `..` entry in
//! parent mode); `LoadRequest` offsets are in worker space.

use crate::filter::{self, Category};
use crate::path;

pub const DEFAULT_WINDOW_CAPACITY: usize = 100;
pub const DEFAULT_VIEWPORT_ROWS: usize = 4;
/// Path of the parent pseudo-entry.
pub const PARENT_ENTRY: &str = "..";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub path: String,
    pub category: Category,
    pub is_favorite: bool,
    pub is_synthetic_app: bool,
    pub is_parent: bool,
}

impl DirectoryEntry {
    /// Classify a streamed or listed path. `/app:` paths become synthetic.
    pub fn new(path: &str, is_dir: bool) -> Self {
        let is_synthetic_app = path::is_app_path(path);
        DirectoryEntry {
            path: path.to_string(),
            category: filter::classify(path, is_dir, is_synthetic_app),
            is_favorite: false,
            is_synthetic_app,
            is_parent: false,
        }
    }

    pub fn parent() -> Self {
        DirectoryEntry {
            path: PARENT_ENTRY.to_string(),
            category: Category::Folder,
            is_favorite: false,
            is_synthetic_app: false,
            is_parent: true,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.category == Category::Folder
    }

    pub fn name(&self) -> &str {
        path::basename(&self.path)
    }
}

/// Window the worker should stream next, in worker offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    pub offset: u32,
    pub count: u32,
}

#[derive(Debug)]
pub struct WindowedCache {
    entries: Vec<DirectoryEntry>,
    total: u32,
    selected: u32,
    window_start: u32,
    viewport_origin: u32,
    capacity: usize,
    viewport_rows: usize,
    is_root: bool,
    loading: bool,
    long_load: bool,
    show_parent_entry: bool,
    /// Listing was handed over whole instead of streamed.
    is_static: bool,
}

impl Default for WindowedCache {
    fn default() -> Self {
        WindowedCache::new(DEFAULT_WINDOW_CAPACITY, DEFAULT_VIEWPORT_ROWS, false)
    }
}

impl WindowedCache {
    pub fn new(capacity: usize, viewport_rows: usize, show_parent_entry: bool) -> Self {
        WindowedCache {
            entries: Vec::with_capacity(capacity),
            total: 0,
            selected: 0,
            window_start: 0,
            viewport_origin: 0,
            capacity: capacity.max(4),
            viewport_rows: viewport_rows.max(1),
            is_root: true,
            loading: false,
            long_load: false,
            show_parent_entry,
            is_static: false,
        }
    }

    // ── Worker events ───────────────────────────────────────────────────

    /// A directory was opened; returns the first window to load.
    pub fn on_folder_opened(&mut self, total: u32, found: i32, is_root: bool) -> LoadRequest {
        self.is_root = is_root;
        self.is_static = false;
        let shift = self.parent_shift();
        self.entries.clear();
        self.total = total + shift;
        self.selected = if found >= 0 { found as u32 + shift } else { 0 };
        self.selected = self.selected.min(self.total.saturating_sub(1));
        self.window_start = 0;
        self.viewport_origin = 0;
        self.loading = true;
        self.long_load = false;
        self.update_viewport();
        self.request_around(0)
    }

    /// A window load starts at worker offset `offset`.
    pub fn on_window_loaded(&mut self, offset: u32) {
        self.entries.clear();
        let shift = self.parent_shift();
        if shift == 1 && offset == 0 {
            self.entries.push(DirectoryEntry::parent());
            self.window_start = 0;
        } else {
            self.window_start = offset + shift;
        }
    }

    pub fn on_item(&mut self, path: &str, is_dir: bool) {
        if self.entries.len() >= self.capacity {
            log::debug!("cache: window full, dropping {}", path);
            return;
        }
        self.entries.push(DirectoryEntry::new(path, is_dir));
    }

    /// Window load finished. Returns a follow-up load if the selection moved
    /// out of the loaded margins meanwhile.
    pub fn on_items_end(&mut self, complete: bool) -> Option<LoadRequest> {
        self.loading = false;
        self.long_load = false;
        if !complete {
            log::warn!(
                "cache: short window at {} ({} of {} entries)",
                self.window_start,
                self.entries.len(),
                self.total
            );
            return None;
        }
        let expected = self
            .total
            .saturating_sub(self.window_start)
            .min(self.capacity as u32);
        if (self.entries.len() as u32) < expected {
            // Directory shrank under the window; asking again yields the same.
            log::warn!(
                "cache: window at {} ended after {} of {} entries",
                self.window_start,
                self.entries.len(),
                expected
            );
            return None;
        }
        if self.load_required() {
            self.loading = true;
            return Some(self.request_around(0));
        }
        None
    }

    pub fn on_long_load(&mut self) {
        self.long_load = true;
    }

    // ── Navigation ──────────────────────────────────────────────────────

    /// Move the selection by `delta` with wraparound.
    pub fn move_selection(&mut self, delta: i32) -> Option<LoadRequest> {
        if self.total == 0 {
            return None;
        }
        self.selected = (self.selected as i64 + delta as i64).rem_euclid(self.total as i64) as u32;
        self.update_viewport();
        if self.load_required() {
            self.loading = true;
            return Some(self.request_around(delta.signum()));
        }
        None
    }

    /// Jump to `index`, clamped to the listing.
    pub fn select(&mut self, index: u32) {
        self.selected = index.min(self.total.saturating_sub(1));
        self.update_viewport();
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn is_index_loaded(&self, index: u32) -> bool {
        index >= self.window_start && ((index - self.window_start) as usize) < self.entries.len()
    }

    pub fn entry_at(&self, index: u32) -> Option<&DirectoryEntry> {
        if !self.is_index_loaded(index) {
            return None;
        }
        self.entries.get((index - self.window_start) as usize)
    }

    pub fn current_entry(&self) -> Option<&DirectoryEntry> {
        self.entry_at(self.selected)
    }

    /// Rows under the viewport with their global index. Unloaded rows are `None`.
    pub fn visible_entries(&self) -> Vec<(u32, Option<&DirectoryEntry>)> {
        let end = (self.viewport_origin as usize + self.viewport_rows).min(self.total as usize);
        (self.viewport_origin..end as u32)
            .map(|i| (i, self.entry_at(i)))
            .collect()
    }

    /// The loaded window, in listing order.
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn selected(&self) -> u32 {
        self.selected
    }

    pub fn window_start(&self) -> u32 {
        self.window_start
    }

    pub fn viewport_origin(&self) -> u32 {
        self.viewport_origin
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_long_load(&self) -> bool {
        self.long_load
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Selection as the worker counts it (parent entry excluded).
    pub fn worker_selection(&self) -> i32 {
        self.selected.saturating_sub(self.parent_shift()) as i32
    }

    // ── Mutators used by file actions ───────────────────────────────────

    /// Drop the selected entry after it was deleted or moved away.
    pub fn remove_selected(&mut self) -> Option<DirectoryEntry> {
        if !self.is_index_loaded(self.selected) {
            return None;
        }
        let removed = self.entries.remove((self.selected - self.window_start) as usize);
        self.total = self.total.saturating_sub(1);
        self.selected = self.selected.min(self.total.saturating_sub(1));
        self.update_viewport();
        Some(removed)
    }

    /// Replace the listing with a complete in-memory one (favorites, apps).
    /// The selection is kept where possible.
    pub fn set_static_listing(&mut self, entries: Vec<DirectoryEntry>) {
        self.total = entries.len() as u32;
        self.entries = entries;
        self.window_start = 0;
        self.selected = self.selected.min(self.total.saturating_sub(1));
        self.is_root = true;
        self.is_static = true;
        self.loading = false;
        self.long_load = false;
        self.update_viewport();
    }

    /// Forget everything, e.g. when leaving a tab.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.total = 0;
        self.selected = 0;
        self.window_start = 0;
        self.viewport_origin = 0;
        self.loading = false;
        self.long_load = false;
        self.is_static = false;
    }

    /// Move the selected entry one step up (`delta < 0`) or down, taking the
    /// selection along. At either end the entry rotates to the opposite end.
    pub fn move_selected_entry(&mut self, delta: i32) {
        let n = self.entries.len();
        if n < 2 || delta == 0 || !self.is_static {
            return;
        }
        let from = self.selected as usize;
        if from >= n {
            return;
        }
        let to = if delta < 0 {
            if from == 0 {
                self.entries.rotate_left(1);
                n - 1
            } else {
                self.entries.swap(from, from - 1);
                from - 1
            }
        } else if from == n - 1 {
            self.entries.rotate_right(1);
            0
        } else {
            self.entries.swap(from, from + 1);
            from + 1
        };
        self.selected = to as u32;
        self.update_viewport();
    }

    pub fn mark_favorite(&mut self, path: &str, is_favorite: bool) {
        for entry in self.entries.iter_mut().filter(|e| e.path == path) {
            entry.is_favorite = is_favorite;
        }
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn parent_shift(&self) -> u32 {
        u32::from(self.show_parent_entry && !self.is_root && !self.is_static)
    }

    fn load_required(&self) -> bool {
        let loaded = self.entries.len() as i64;
        if self.loading || self.is_static || loaded >= self.total as i64 {
            return false;
        }
        let margin = (self.capacity / 4) as i64;
        let start = self.window_start as i64;
        let selected = self.selected as i64;
        if start > 0 && selected < start + margin {
            return true;
        }
        start + loaded < self.total as i64 && selected > start + loaded - margin
    }

    /// Window around the selection: mostly behind it when scrolling up,
    /// mostly ahead when scrolling down, centered otherwise.
    fn request_around(&self, direction: i32) -> LoadRequest {
        let cap = self.capacity as i64;
        let behind = match direction {
            d if d < 0 => cap / 4 * 3,
            0 => cap / 2,
            _ => cap / 4,
        };
        let max_start = (self.total as i64 - cap).max(0);
        let start = (self.selected as i64 - behind).clamp(0, max_start) as u32;

        let shift = self.parent_shift();
        if shift == 1 && start == 0 {
            LoadRequest {
                offset: 0,
                count: self.capacity as u32 - 1,
            }
        } else {
            LoadRequest {
                offset: start - shift,
                count: self.capacity as u32,
            }
        }
    }

    /// Keep the selection on screen with one row of look-ahead where the
    /// viewport is tall enough.
    fn update_viewport(&mut self) {
        let rows = self.viewport_rows as u32;
        let margin = if rows >= 3 { 1 } else { 0 };
        let max_origin = self.total.saturating_sub(rows);

        if self.selected < self.viewport_origin + margin {
            self.viewport_origin = self.selected.saturating_sub(margin);
        } else if self.selected + margin >= self.viewport_origin + rows {
            self.viewport_origin = self.selected + margin + 1 - rows;
        }
        self.viewport_origin = self.viewport_origin.min(max_origin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(cache: &mut WindowedCache, req: LoadRequest, total_worker: u32) -> Option<LoadRequest> {
        cache.on_window_loaded(req.offset);
        let end = (req.offset + req.count).min(total_worker);
        for i in req.offset..end {
            cache.on_item(&format!("/ext/d/{:03}.sub", i), false);
        }
        cache.on_items_end(true)
    }

    fn assert_window_holds_selection(cache: &WindowedCache) {
        let start = cache.window_start();
        assert!(start <= cache.selected());
        assert!(cache.selected() < start + cache.entries().len() as u32);
    }

    #[test]
    fn large_directory_scenario() {
        let mut cache = WindowedCache::default();
        let req = cache.on_folder_opened(250, -1, true);
        assert_eq!(cache.total(), 250);
        assert_eq!(cache.selected(), 0);
        assert_eq!(req, LoadRequest { offset: 0, count: 100 });
        assert_eq!(feed(&mut cache, req, 250), None);
        assert_eq!(cache.window_start(), 0);
        assert_eq!(cache.entries().len(), 100);

        let mut reload = None;
        for _ in 0..80 {
            if let Some(r) = cache.move_selection(1) {
                assert!(reload.is_none(), "only one load while loading");
                reload = Some(r);
            }
        }
        assert_eq!(cache.selected(), 80);
        let reload = reload.unwrap();
        assert!(reload.offset > 0);
        assert!(reload.offset + reload.count <= 250);

        assert_eq!(feed(&mut cache, reload, 250), None);
        assert!(cache.window_start() > 0);
        assert_window_holds_selection(&cache);
        assert_eq!(
            cache.current_entry().unwrap().path,
            "/ext/d/080.sub"
        );
    }

    #[test]
    fn wraparound_both_ways() {
        let mut cache = WindowedCache::default();
        let req = cache.on_folder_opened(10, -1, true);
        feed(&mut cache, req, 10);
        cache.move_selection(-1);
        assert_eq!(cache.selected(), 9);
        cache.move_selection(1);
        assert_eq!(cache.selected(), 0);
        cache.move_selection(23);
        assert_eq!(cache.selected(), 3);
    }

    #[test]
    fn wrap_to_end_of_large_listing_reloads_tail() {
        let mut cache = WindowedCache::default();
        let req = cache.on_folder_opened(250, -1, true);
        feed(&mut cache, req, 250);
        let tail = cache.move_selection(-1).unwrap();
        assert_eq!(cache.selected(), 249);
        assert_eq!(tail, LoadRequest { offset: 150, count: 100 });
        feed(&mut cache, tail, 250);
        assert_window_holds_selection(&cache);
    }

    #[test]
    fn focused_entry_centers_window() {
        let mut cache = WindowedCache::default();
        let req = cache.on_folder_opened(500, 300, true);
        assert_eq!(cache.selected(), 300);
        assert_eq!(req.offset, 250);
        feed(&mut cache, req, 500);
        assert_window_holds_selection(&cache);

        let near_end = cache.on_folder_opened(500, 480, true);
        assert_eq!(near_end.offset, 400);
    }

    #[test]
    fn empty_listing_is_inert() {
        let mut cache = WindowedCache::default();
        let req = cache.on_folder_opened(0, -1, true);
        assert_eq!(req.offset, 0);
        assert_eq!(feed(&mut cache, req, 0), None);
        assert_eq!(cache.move_selection(1), None);
        assert!(cache.current_entry().is_none());
        assert!(cache.visible_entries().is_empty());
    }

    #[test]
    fn viewport_tracks_selection_with_lookahead() {
        let mut cache = WindowedCache::default();
        let req = cache.on_folder_opened(20, -1, true);
        feed(&mut cache, req, 20);
        for _ in 0..3 {
            cache.move_selection(1);
        }
        // selected 3 with one row of look-ahead below it
        assert_eq!(cache.viewport_origin(), 1);
        cache.move_selection(-20);
        assert_eq!(cache.selected(), 3);
        cache.move_selection(-3);
        assert_eq!(cache.viewport_origin(), 0);

        cache.move_selection(-1);
        assert_eq!(cache.selected(), 19);
        assert_eq!(cache.viewport_origin(), 16);
        let rows = cache.visible_entries();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3].0, 19);
        assert!(rows.iter().all(|(_, e)| e.is_some()));
    }

    #[test]
    fn selection_drift_while_loading_requests_again() {
        let mut cache = WindowedCache::default();
        let first = cache.on_folder_opened(400, -1, true);
        feed(&mut cache, first, 400);
        // jump far away while the next load is in flight
        let pending = cache.move_selection(-1).unwrap();
        assert!(cache.is_loading());
        assert_eq!(cache.move_selection(-150), None);
        cache.on_window_loaded(pending.offset);
        for i in pending.offset..pending.offset + pending.count {
            cache.on_item(&format!("/ext/d/{}", i), false);
        }
        let again = cache.on_items_end(true).unwrap();
        assert_eq!(cache.selected(), 249);
        assert_eq!(again.offset, 199);
    }

    #[test]
    fn incomplete_load_does_not_retry() {
        let mut cache = WindowedCache::default();
        let req = cache.on_folder_opened(300, 290, true);
        cache.on_window_loaded(req.offset);
        cache.on_item("/ext/d/x", false);
        assert_eq!(cache.on_items_end(false), None);
        assert!(!cache.is_loading());
    }

    #[test]
    fn shrunk_directory_window_is_not_requested_again() {
        let mut cache = WindowedCache::default();
        let req = cache.on_folder_opened(250, 110, true);
        assert_eq!(req, LoadRequest { offset: 60, count: 100 });
        // only 121 entries are left on disk
        assert_eq!(feed(&mut cache, req, 121), None);
        assert!(!cache.is_loading());
        assert_eq!(cache.entries().len(), 61);
        assert_eq!(cache.current_entry().unwrap().path, "/ext/d/110.sub");
    }

    /// Deterministic jump sequence mixing single steps, long jumps and
    /// wraparound.
    fn jumps(seed: u32, n: usize) -> Vec<i32> {
        let mut x = seed;
        (0..n)
            .map(|i| {
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                match i % 4 {
                    0 | 1 => if x & 1 == 0 { 1 } else { -1 },
                    2 => (x % 61) as i32 - 30,
                    _ => (x % 1201) as i32 - 600,
                }
            })
            .collect()
    }

    #[test]
    fn window_holds_selection_after_every_settle() {
        for (total, parent) in [(250, false), (1000, false), (250, true), (1000, true)] {
            let mut cache = WindowedCache::new(100, 4, parent);
            let mut next = Some(cache.on_folder_opened(total, 7, !parent));
            for delta in jumps(total + parent as u32, 400) {
                while let Some(req) = next {
                    next = feed(&mut cache, req, total);
                }
                assert_window_holds_selection(&cache);
                let shift = u32::from(parent);
                let entry = cache.current_entry().unwrap();
                if entry.is_parent {
                    assert_eq!(cache.selected(), 0);
                } else {
                    assert_eq!(
                        entry.path,
                        format!("/ext/d/{:03}.sub", cache.selected() - shift)
                    );
                }
                next = cache.move_selection(delta);
            }
        }
    }

    #[test]
    fn long_load_cleared_by_items_end() {
        let mut cache = WindowedCache::default();
        let req = cache.on_folder_opened(5, -1, true);
        cache.on_long_load();
        assert!(cache.is_long_load());
        feed(&mut cache, req, 5);
        assert!(!cache.is_long_load());
    }

    #[test]
    fn parent_entry_shifts_offsets() {
        let mut cache = WindowedCache::new(100, 4, true);
        let req = cache.on_folder_opened(10, 2, false);
        assert_eq!(cache.total(), 11);
        assert_eq!(cache.selected(), 3);
        assert_eq!(req, LoadRequest { offset: 0, count: 99 });
        feed(&mut cache, req, 10);
        assert!(cache.entry_at(0).unwrap().is_parent);
        assert_eq!(cache.entry_at(1).unwrap().path, "/ext/d/000.sub");
        assert_eq!(cache.current_entry().unwrap().path, "/ext/d/002.sub");
        assert_eq!(cache.worker_selection(), 2);

        // at root there is no parent entry
        cache.on_folder_opened(10, -1, true);
        assert_eq!(cache.total(), 10);
    }

    #[test]
    fn parent_entry_window_past_start() {
        let mut cache = WindowedCache::new(100, 4, true);
        let req = cache.on_folder_opened(300, 199, false);
        assert_eq!(cache.selected(), 200);
        assert_eq!(req, LoadRequest { offset: 149, count: 100 });
        feed(&mut cache, req, 300);
        assert_eq!(cache.window_start(), 150);
        assert_eq!(cache.current_entry().unwrap().path, "/ext/d/199.sub");
    }

    #[test]
    fn remove_selected_clamps() {
        let mut cache = WindowedCache::default();
        let req = cache.on_folder_opened(3, 2, true);
        feed(&mut cache, req, 3);
        let gone = cache.remove_selected().unwrap();
        assert_eq!(gone.path, "/ext/d/002.sub");
        assert_eq!(cache.total(), 2);
        assert_eq!(cache.selected(), 1);
        cache.remove_selected();
        cache.remove_selected();
        assert_eq!(cache.total(), 0);
        assert!(cache.remove_selected().is_none());
    }

    fn static_listing(names: &[&str]) -> WindowedCache {
        let mut cache = WindowedCache::default();
        cache.set_static_listing(
            names
                .iter()
                .map(|n| DirectoryEntry::new(&format!("/ext/{}", n), false))
                .collect(),
        );
        cache
    }

    fn names(cache: &WindowedCache) -> Vec<&str> {
        cache.entries().iter().map(|e| e.name()).collect()
    }

    #[test]
    fn move_entry_swaps_neighbours() {
        let mut cache = static_listing(&["a", "b", "c"]);
        cache.move_selected_entry(1);
        assert_eq!(names(&cache), ["b", "a", "c"]);
        assert_eq!(cache.selected(), 1);
        cache.move_selected_entry(-1);
        assert_eq!(names(&cache), ["a", "b", "c"]);
        assert_eq!(cache.selected(), 0);
    }

    #[test]
    fn move_entry_rotates_at_edges() {
        let mut cache = static_listing(&["a", "b", "c"]);
        cache.move_selected_entry(-1);
        assert_eq!(names(&cache), ["b", "c", "a"]);
        assert_eq!(cache.selected(), 2);
        cache.move_selected_entry(1);
        assert_eq!(names(&cache), ["a", "b", "c"]);
        assert_eq!(cache.selected(), 0);
    }

    #[test]
    fn classify_on_insert() {
        let nfc = DirectoryEntry::new("/ext/nfc/card.nfc", false);
        assert_eq!(nfc.category, Category::Nfc);
        assert!(!nfc.is_synthetic_app);
        let u2f = DirectoryEntry::new("/app:u2f/U2F Token", false);
        assert!(u2f.is_synthetic_app);
        assert_eq!(u2f.category, Category::U2f);
        assert!(DirectoryEntry::new("/ext/nfc", true).is_dir());
    }

    #[test]
    fn mark_favorite_updates_window() {
        let mut cache = static_listing(&["a.nfc", "b.nfc"]);
        cache.mark_favorite("/ext/b.nfc", true);
        assert!(!cache.entries()[0].is_favorite);
        assert!(cache.entries()[1].is_favorite);
    }
}
