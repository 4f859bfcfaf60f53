//! Context-menu file actions on the selected entry.
//!
//! These run on the caller's thread against [`Storage`](crate::storage::Storage)
//! directly; navigation afterwards goes through the worker as usual.

use std::fmt;
use std::str::FromStr;

use crate::apps::SyntheticApp;
use crate::browser::ArchiveBrowser;
use crate::cache::DirectoryEntry;
use crate::error::{ActionError, StorageError};
use crate::filter::Category;
use crate::path;
use crate::tabs::{Direction, Tab};

/// Characters allowed in new folder names besides ASCII letters and digits.
const SAFE_NAME_SYMBOLS: &str = " !#$%&'()+,-.;=@[]^_`{}~";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClipboardMode {
    Cut,
    Copy,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Clipboard {
    pub path: String,
    pub mode: ClipboardMode,
}

/// Name, size and kind of the selected entry.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EntryInfo {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
}

impl fmt::Display for EntryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dir {
            write!(f, "{}: folder", self.name)
        } else {
            write!(f, "{}: {} bytes", self.name, self.size)
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MenuItem {
    RunInApp,
    Pin,
    Unpin,
    Info,
    Show,
    Move,
    Rename,
    Delete,
    Cut,
    Copy,
    Paste,
    NewDir,
}

impl MenuItem {
    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::RunInApp => "Run In App",
            MenuItem::Pin => "Pin",
            MenuItem::Unpin => "Unpin",
            MenuItem::Info => "Info",
            MenuItem::Show => "Show",
            MenuItem::Move => "Move",
            MenuItem::Rename => "Rename",
            MenuItem::Delete => "Delete",
            MenuItem::Cut => "Cut",
            MenuItem::Copy => "Copy",
            MenuItem::Paste => "Paste",
            MenuItem::NewDir => "New Dir",
        }
    }

    /// Actions that need a name typed by the user.
    pub fn takes_name(&self) -> bool {
        matches!(self, MenuItem::Rename | MenuItem::NewDir)
    }
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MenuItem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let item = match s.to_lowercase().replace([' ', '-', '_'], "").as_str() {
            "run" | "runinapp" => MenuItem::RunInApp,
            "pin" => MenuItem::Pin,
            "unpin" => MenuItem::Unpin,
            "info" => MenuItem::Info,
            "show" => MenuItem::Show,
            "move" => MenuItem::Move,
            "rename" => MenuItem::Rename,
            "delete" | "rm" => MenuItem::Delete,
            "cut" => MenuItem::Cut,
            "copy" => MenuItem::Copy,
            "paste" => MenuItem::Paste,
            "newdir" | "mkdir" => MenuItem::NewDir,
            _ => return Err(format!("unknown action: {}", s)),
        };
        Ok(item)
    }
}

/// Menu for `entry` on `tab`.
pub(crate) fn build_menu(
    tab: Tab,
    entry: Option<&DirectoryEntry>,
    has_clipboard: bool,
) -> Vec<MenuItem> {
    let mut items = Vec::new();
    let pin = |e: &DirectoryEntry| if e.is_favorite { MenuItem::Unpin } else { MenuItem::Pin };

    match entry {
        Some(e) if e.is_parent => {}
        Some(e) if tab == Tab::Favorites => {
            if !e.is_dir() && e.category.is_known_app() {
                items.push(MenuItem::RunInApp);
            }
            items.push(MenuItem::Unpin);
            if !e.is_synthetic_app {
                items.push(MenuItem::Show);
            }
            items.push(MenuItem::Move);
        }
        Some(e) if e.is_synthetic_app => {
            items.extend([MenuItem::RunInApp, pin(e), MenuItem::Delete]);
        }
        Some(e) => {
            if e.category.is_known_app() {
                items.push(MenuItem::RunInApp);
            }
            items.push(pin(e));
            if !e.is_dir() {
                items.push(MenuItem::Info);
            }
            items.extend([
                MenuItem::Rename,
                MenuItem::Delete,
                MenuItem::Cut,
                MenuItem::Copy,
            ]);
        }
        None => {}
    }

    if tab.is_filesystem() {
        if has_clipboard {
            items.push(MenuItem::Paste);
        }
        items.push(MenuItem::NewDir);
    }
    items
}

/// Folder names restricted to a portable ASCII subset.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || SAFE_NAME_SYMBOLS.contains(c))
}

impl ArchiveBrowser {
    /// Run a menu action on the selection. `name` feeds Rename and New Dir.
    /// Items missing from the current [`context_menu`](ArchiveBrowser::context_menu)
    /// are refused.
    pub fn run_action(&mut self, item: MenuItem, name: Option<&str>) -> Result<(), ActionError> {
        log::debug!("browser: action {}", item);
        if !self.context_menu().contains(&item) {
            return Err(ActionError::NotInMenu(item));
        }
        match item {
            MenuItem::RunInApp => {
                let entry = self.selected_entry()?;
                self.run_in_app(&entry)
            }
            MenuItem::Pin | MenuItem::Unpin => self.toggle_pin(),
            MenuItem::Info => {
                let info = self.entry_info()?;
                log::info!("browser: {}", info);
                Ok(())
            }
            MenuItem::Show => self.show_selected(),
            MenuItem::Move => self.start_move(),
            MenuItem::Rename => self.rename_selected(name.unwrap_or_default()),
            MenuItem::Delete => self.delete_selected(),
            MenuItem::Cut => self.set_clipboard(ClipboardMode::Cut),
            MenuItem::Copy => self.set_clipboard(ClipboardMode::Copy),
            MenuItem::Paste => self.paste(),
            MenuItem::NewDir => self.new_dir(name.unwrap_or_default()),
        }
    }

    fn selected_entry(&self) -> Result<DirectoryEntry, ActionError> {
        match self.current_entry() {
            Some(e) if !e.is_parent => Ok(e),
            _ => Err(ActionError::NothingSelected),
        }
    }

    fn require_filesystem(&self, what: &'static str) -> Result<(), ActionError> {
        if self.tab.is_filesystem() {
            Ok(())
        } else {
            Err(ActionError::NotSupported(what))
        }
    }

    fn check_name(&self, name: &str) -> Result<(), ActionError> {
        if name.is_empty() || name == "." || name == ".." || name.contains('/') {
            return Err(ActionError::InvalidName(name.to_string()));
        }
        if name.len() >= self.options.max_name_len {
            return Err(ActionError::NameTooLong {
                len: name.len(),
                max: self.options.max_name_len,
            });
        }
        Ok(())
    }

    /// Open `entry` with the application registered for its category.
    pub fn run_in_app(&self, entry: &DirectoryEntry) -> Result<(), ActionError> {
        if entry.category == Category::Application {
            return self.launcher.launch(&entry.path, "");
        }
        let app = entry
            .category
            .app_name()
            .ok_or(ActionError::NotSupported("running this file"))?;
        if entry.is_synthetic_app {
            self.launcher.launch(app, entry.name())
        } else {
            self.launcher.launch(app, &entry.path)
        }
    }

    pub fn entry_info(&self) -> Result<EntryInfo, ActionError> {
        let entry = self.selected_entry()?;
        if entry.is_synthetic_app {
            return Err(ActionError::NotSupported("info on app entries"));
        }
        let stat = self.storage.stat(&entry.path)?;
        Ok(EntryInfo {
            name: entry.name().to_string(),
            size: stat.size,
            is_dir: stat.is_dir,
        })
    }

    fn toggle_pin(&mut self) -> Result<(), ActionError> {
        let entry = self.selected_entry()?;
        if self.tab == Tab::Favorites || self.favorites.contains(&entry.path) {
            self.favorites.delete(&entry.path)?;
            if self.tab == Tab::Favorites {
                let left = {
                    let mut cache = self.cache();
                    cache.remove_selected();
                    cache.total()
                };
                if left == 0 {
                    self.switch_tab(Direction::Right);
                }
            } else {
                self.cache().mark_favorite(&entry.path, false);
            }
        } else {
            self.favorites.add(&entry.path)?;
            self.cache().mark_favorite(&entry.path, true);
        }
        Ok(())
    }

    fn show_selected(&mut self) -> Result<(), ActionError> {
        let entry = self.selected_entry()?;
        if entry.is_synthetic_app {
            return Err(ActionError::NotSupported("showing app entries"));
        }
        self.open_in_browser(&entry.path);
        Ok(())
    }

    /// Rename the selection within its directory. A file keeps its
    /// extension when `new_name` leaves it out.
    pub fn rename_selected(&mut self, new_name: &str) -> Result<(), ActionError> {
        self.require_filesystem("rename")?;
        let entry = self.selected_entry()?;
        self.check_name(new_name)?;

        let mut name = new_name.to_string();
        if !entry.is_dir() {
            if let Some(ext) = path::extension(&entry.path) {
                if !name.to_lowercase().ends_with(&ext.to_lowercase()) {
                    name.push_str(ext);
                }
            }
        }
        let dst = path::join_path(path::dirname(&entry.path), &name);
        if dst == entry.path {
            return Ok(());
        }
        if self.storage.exists(&dst) {
            return Err(StorageError::AlreadyExists.into());
        }
        self.storage.rename(&entry.path, &dst)?;
        log::info!("browser: renamed {} -> {}", entry.path, dst);
        if entry.is_dir() || self.favorites.contains(&entry.path) {
            self.favorites.rename(&entry.path, &dst)?;
        }
        self.refresh();
        Ok(())
    }

    /// Delete the selection: recursive for folders, app data for synthetic
    /// entries. Pins on it (or below it) go too.
    pub fn delete_selected(&mut self) -> Result<(), ActionError> {
        let entry = self.selected_entry()?;
        if entry.is_synthetic_app {
            let app = SyntheticApp::from_path(&entry.path)
                .ok_or(ActionError::NotSupported("deleting this entry"))?;
            app.delete(self.storage.as_ref())?;
        } else if entry.is_dir() {
            self.storage.remove_recursive(&entry.path)?;
        } else {
            self.storage.remove(&entry.path)?;
        }
        log::info!("browser: deleted {}", entry.path);
        self.favorites.delete_tree(&entry.path)?;
        self.cache().remove_selected();
        self.refresh();
        Ok(())
    }

    fn set_clipboard(&mut self, mode: ClipboardMode) -> Result<(), ActionError> {
        self.require_filesystem("cut and copy")?;
        let entry = self.selected_entry()?;
        self.clipboard = Some(Clipboard {
            path: entry.path,
            mode,
        });
        Ok(())
    }

    /// Copy or move the clipboard entry into the current directory.
    pub fn paste(&mut self) -> Result<(), ActionError> {
        self.require_filesystem("paste")?;
        let clip = self.clipboard.clone().ok_or(ActionError::NothingSelected)?;
        let name = path::basename(&clip.path).to_string();
        let dst = path::join_path(&self.path, &name);

        if dst == clip.path && clip.mode == ClipboardMode::Cut {
            self.clipboard = None;
            return Ok(());
        }
        if path::is_under(&self.path, &clip.path) {
            return Err(ActionError::InvalidName(name));
        }
        if self.storage.exists(&dst) {
            return Err(StorageError::AlreadyExists.into());
        }
        match clip.mode {
            ClipboardMode::Copy => self.storage.copy(&clip.path, &dst)?,
            ClipboardMode::Cut => {
                self.storage.rename(&clip.path, &dst)?;
                self.favorites.rename(&clip.path, &dst)?;
                self.clipboard = None;
            }
        }
        log::info!("browser: pasted {} -> {}", clip.path, dst);
        self.refresh();
        Ok(())
    }

    pub fn new_dir(&mut self, name: &str) -> Result<(), ActionError> {
        self.require_filesystem("new folders")?;
        if !is_safe_name(name) {
            return Err(ActionError::InvalidName(name.to_string()));
        }
        self.check_name(name)?;
        let dst = path::join_path(&self.path, name);
        if self.storage.exists(&dst) {
            return Err(StorageError::AlreadyExists.into());
        }
        self.storage.mkdir(&dst)?;
        log::info!("browser: created {}", dst);
        self.refresh();
        Ok(())
    }

    // ── Favorites reordering ────────────────────────────────────────────

    fn start_move(&mut self) -> Result<(), ActionError> {
        if self.tab != Tab::Favorites {
            return Err(ActionError::NotSupported("moving outside favorites"));
        }
        let entry = self.selected_entry()?;
        self.move_mode = true;
        self.move_origin = Some(entry.path);
        Ok(())
    }

    /// Persist the reordered favorites and leave move mode.
    pub fn save_move(&mut self) -> Result<(), ActionError> {
        let paths: Vec<String> = self
            .cache()
            .entries()
            .iter()
            .map(|e| e.path.clone())
            .collect();
        self.move_mode = false;
        self.move_origin = None;
        self.favorites.save(&paths)?;
        Ok(())
    }

    /// Leave move mode without saving; the list is re-read from disk.
    pub fn cancel_move(&mut self) {
        self.move_mode = false;
        let origin = self.move_origin.take();
        self.load_favorites(origin.as_deref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{BrowserAction, BrowserOptions, InputEvent, InputKey};
    use crate::launcher::RecordingLauncher;
    use crate::storage::{LocalStorage, Storage};
    use std::sync::Arc;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    fn setup(files: &[&str]) -> (tempfile::TempDir, ArchiveBrowser, Arc<RecordingLauncher>) {
        let dir = tempfile::tempdir().unwrap();
        for f in files {
            let p = dir.path().join(f);
            std::fs::create_dir_all(p.parent().unwrap()).unwrap();
            if f.ends_with('/') {
                std::fs::create_dir_all(&p).unwrap();
            } else {
                std::fs::write(&p, b"x").unwrap();
            }
        }
        let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(dir.path()));
        let launcher = Arc::new(RecordingLauncher::default());
        let browser = ArchiveBrowser::new(
            storage,
            Box::new(launcher.clone()),
            BrowserOptions::default(),
        );
        (dir, browser, launcher)
    }

    fn open(b: &mut ArchiveBrowser, path: &str) {
        b.open_in_browser(path);
        assert!(b.wait_idle(WAIT));
    }

    fn select(b: &mut ArchiveBrowser, name: &str) {
        let idx = b
            .cache()
            .entries()
            .iter()
            .position(|e| e.name() == name)
            .unwrap();
        let cur = b.cache().selected() as i32;
        b.move_selection(idx as i32 - cur);
        assert_eq!(b.current_entry().unwrap().name(), name);
    }

    fn names(b: &ArchiveBrowser) -> Vec<String> {
        let mut v: Vec<String> = b
            .cache()
            .entries()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        v.sort();
        v
    }

    #[test]
    fn menu_for_files_and_folders() {
        let nfc = DirectoryEntry::new("/ext/nfc/a.nfc", false);
        assert_eq!(
            build_menu(Tab::Nfc, Some(&nfc), false),
            [
                MenuItem::RunInApp,
                MenuItem::Pin,
                MenuItem::Info,
                MenuItem::Rename,
                MenuItem::Delete,
                MenuItem::Cut,
                MenuItem::Copy,
                MenuItem::NewDir
            ]
        );
        let folder = DirectoryEntry::new("/ext/nfc/cards", true);
        let menu = build_menu(Tab::Browser, Some(&folder), true);
        assert!(!menu.contains(&MenuItem::RunInApp));
        assert!(!menu.contains(&MenuItem::Info));
        assert!(menu.contains(&MenuItem::Paste));

        let mut fav = DirectoryEntry::new("/ext/nfc/a.nfc", false);
        fav.is_favorite = true;
        assert_eq!(
            build_menu(Tab::Favorites, Some(&fav), true),
            [MenuItem::RunInApp, MenuItem::Unpin, MenuItem::Show, MenuItem::Move]
        );

        let u2f = DirectoryEntry::new("/app:u2f/U2F Token", false);
        assert_eq!(
            build_menu(Tab::U2f, Some(&u2f), false),
            [MenuItem::RunInApp, MenuItem::Pin, MenuItem::Delete]
        );
        assert_eq!(build_menu(Tab::Browser, None, false), [MenuItem::NewDir]);
    }

    #[test]
    fn safe_names() {
        assert!(is_safe_name("My Cards (2)"));
        assert!(is_safe_name("a-b_c.d"));
        assert!(!is_safe_name(""));
        assert!(!is_safe_name(".."));
        assert!(!is_safe_name("a/b"));
        assert!(!is_safe_name("bad:name"));
        assert!(!is_safe_name("naïve"));
    }

    #[test]
    fn parse_menu_items() {
        assert_eq!("run".parse::<MenuItem>(), Ok(MenuItem::RunInApp));
        assert_eq!("New Dir".parse::<MenuItem>(), Ok(MenuItem::NewDir));
        assert!("format".parse::<MenuItem>().is_err());
    }

    #[test]
    fn run_in_app_routes_by_category() {
        let (_dir, b, launcher) = setup(&[]);
        b.run_in_app(&DirectoryEntry::new("/ext/subghz/gate.sub", false))
            .unwrap();
        b.run_in_app(&DirectoryEntry::new("/ext/apps/Tools/snake.fap", false))
            .unwrap();
        b.run_in_app(&DirectoryEntry::new("/app:u2f/U2F Token", false))
            .unwrap();
        assert!(matches!(
            b.run_in_app(&DirectoryEntry::new("/ext/readme.md", false)),
            Err(ActionError::NotSupported(_))
        ));
        assert_eq!(
            launcher.launched(),
            vec![
                ("Sub-GHz".to_string(), "/ext/subghz/gate.sub".to_string()),
                ("/ext/apps/Tools/snake.fap".to_string(), String::new()),
                ("U2F".to_string(), "U2F Token".to_string()),
            ]
        );
    }

    #[test]
    fn rename_keeps_extension_and_updates_favorites() {
        let (dir, mut b, _) = setup(&["nfc/1.nfc", "nfc/2.nfc"]);
        b.favorites().add("/ext/nfc/1.nfc").unwrap();
        b.favorites().add("/ext/nfc/2.nfc").unwrap();
        open(&mut b, "/ext/nfc");
        select(&mut b, "1.nfc");

        b.rename_selected("1b").unwrap();
        assert!(b.wait_idle(WAIT));
        assert!(dir.path().join("nfc/1b.nfc").exists());
        assert_eq!(names(&b), ["1b.nfc", "2.nfc"]);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("favorites.txt")).unwrap(),
            "/ext/nfc/1b.nfc\n/ext/nfc/2.nfc\n"
        );
    }

    #[test]
    fn rename_refuses_existing_target() {
        let (dir, mut b, _) = setup(&["ir/tv.ir", "ir/ac.ir"]);
        open(&mut b, "/ext/ir");
        select(&mut b, "tv.ir");
        let err = b.rename_selected("ac").unwrap_err();
        assert!(matches!(
            err,
            ActionError::Storage(StorageError::AlreadyExists)
        ));
        assert!(dir.path().join("ir/tv.ir").exists());
        assert!(matches!(
            b.rename_selected("a/b"),
            Err(ActionError::InvalidName(_))
        ));
    }

    #[test]
    fn delete_folder_recursively_and_unpin() {
        let (dir, mut b, _) = setup(&["work/keep.bin", "work/old/a.sub", "work/old/b.sub"]);
        b.favorites().add("/ext/work/old/a.sub").unwrap();
        open(&mut b, "/ext/work");
        select(&mut b, "old");

        b.delete_selected().unwrap();
        assert!(b.wait_idle(WAIT));
        assert!(!dir.path().join("work/old").exists());
        assert_eq!(names(&b), ["keep.bin"]);
        assert_eq!(b.favorites().count(), 0);
    }

    #[test]
    fn copy_then_paste_into_other_folder() {
        let (dir, mut b, _) = setup(&["src/a.sub", "dst/"]);
        open(&mut b, "/ext/src");
        select(&mut b, "a.sub");
        b.run_action(MenuItem::Copy, None).unwrap();

        b.enter_directory("/ext/dst").unwrap();
        assert!(b.wait_idle(WAIT));
        b.paste().unwrap();
        assert!(b.wait_idle(WAIT));
        assert!(dir.path().join("src/a.sub").exists());
        assert!(dir.path().join("dst/a.sub").exists());
        assert_eq!(names(&b), ["a.sub"]);
        // copy keeps the clipboard; a second paste collides
        assert!(matches!(
            b.paste(),
            Err(ActionError::Storage(StorageError::AlreadyExists))
        ));
    }

    #[test]
    fn cut_then_paste_moves_and_follows_favorites() {
        let (dir, mut b, _) = setup(&["src/a.sub", "dst/"]);
        b.favorites().add("/ext/src/a.sub").unwrap();
        open(&mut b, "/ext/src");
        select(&mut b, "a.sub");
        b.run_action(MenuItem::Cut, None).unwrap();

        b.open_in_browser("/ext/dst");
        assert!(b.wait_idle(WAIT));
        b.paste().unwrap();
        assert!(b.clipboard().is_none());
        assert!(!dir.path().join("src/a.sub").exists());
        assert!(dir.path().join("dst/a.sub").exists());
        assert!(b.favorites().contains("/ext/dst/a.sub"));
    }

    #[test]
    fn paste_folder_into_itself_is_refused() {
        let (_dir, mut b, _) = setup(&["top/inner/"]);
        open(&mut b, "/ext");
        select(&mut b, "top");
        b.run_action(MenuItem::Cut, None).unwrap();
        b.enter_directory("/ext/top").unwrap();
        assert!(b.wait_idle(WAIT));
        assert!(matches!(b.paste(), Err(ActionError::InvalidName(_))));
    }

    #[test]
    fn new_dir_checks_name_first() {
        let (dir, mut b, _) = setup(&["nfc/a.nfc"]);
        open(&mut b, "/ext/nfc");
        assert!(matches!(
            b.new_dir("bad*name"),
            Err(ActionError::InvalidName(_))
        ));
        b.run_action(MenuItem::NewDir, Some("Hotel Cards")).unwrap();
        assert!(b.wait_idle(WAIT));
        assert!(dir.path().join("nfc/Hotel Cards").is_dir());
        assert_eq!(names(&b), ["Hotel Cards", "a.nfc"]);
    }

    #[test]
    fn pin_and_unpin_toggle() {
        let (_dir, mut b, _) = setup(&["subghz/a.sub"]);
        open(&mut b, "/ext/subghz");
        assert_eq!(b.context_menu()[1], MenuItem::Pin);
        b.run_action(MenuItem::Pin, None).unwrap();
        assert!(b.favorites().contains("/ext/subghz/a.sub"));
        assert!(b.current_entry().unwrap().is_favorite);
        assert_eq!(b.context_menu()[1], MenuItem::Unpin);
        b.run_action(MenuItem::Unpin, None).unwrap();
        assert!(!b.favorites().contains("/ext/subghz/a.sub"));
    }

    #[test]
    fn unpinning_last_favorite_leaves_tab() {
        let (_dir, mut b, _) = setup(&["subghz/a.sub"]);
        b.favorites().add("/ext/subghz/a.sub").unwrap();
        b.open_tab(Tab::Favorites);
        assert_eq!(b.tab(), Tab::Favorites);
        b.run_action(MenuItem::Unpin, None).unwrap();
        assert_ne!(b.tab(), Tab::Favorites);
        assert_eq!(b.favorites().count(), 0);
    }

    #[test]
    fn favorites_move_mode_saves_new_order() {
        let (dir, mut b, _) = setup(&["a.sub", "b.sub", "c.sub"]);
        for n in ["a", "b", "c"] {
            b.favorites().add(&format!("/ext/{}.sub", n)).unwrap();
        }
        b.open_tab(Tab::Favorites);
        b.run_action(MenuItem::Move, None).unwrap();
        assert!(b.is_move_mode());

        // Left/Right are ignored while moving
        assert!(matches!(
            b.handle_input(InputEvent::short(InputKey::Right)),
            BrowserAction::Ignored
        ));
        b.handle_input(InputEvent::short(InputKey::Down));
        b.handle_input(InputEvent::short(InputKey::Down));
        assert!(matches!(
            b.handle_input(InputEvent::short(InputKey::Ok)),
            BrowserAction::Handled
        ));
        assert!(!b.is_move_mode());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("favorites.txt")).unwrap(),
            "/ext/b.sub\n/ext/c.sub\n/ext/a.sub\n"
        );
    }

    #[test]
    fn favorites_move_mode_back_discards() {
        let (dir, mut b, _) = setup(&["a.sub", "b.sub"]);
        b.favorites().add("/ext/a.sub").unwrap();
        b.favorites().add("/ext/b.sub").unwrap();
        b.open_tab(Tab::Favorites);
        b.run_action(MenuItem::Move, None).unwrap();
        b.handle_input(InputEvent::short(InputKey::Down));
        b.handle_input(InputEvent::short(InputKey::Back));
        assert!(!b.is_move_mode());
        assert_eq!(b.current_entry().unwrap().path, "/ext/a.sub");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("favorites.txt")).unwrap(),
            "/ext/a.sub\n/ext/b.sub\n"
        );
    }

    #[test]
    fn show_opens_browser_on_favorite() {
        let (_dir, mut b, _) = setup(&["infrared/tv.ir", "infrared/ac.ir"]);
        b.favorites().add("/ext/infrared/tv.ir").unwrap();
        b.open_tab(Tab::Favorites);
        b.run_action(MenuItem::Show, None).unwrap();
        assert!(b.wait_idle(WAIT));
        assert_eq!(b.tab(), Tab::Browser);
        assert_eq!(b.path(), "/ext/infrared");
        assert_eq!(b.current_entry().unwrap().path, "/ext/infrared/tv.ir");
    }

    #[test]
    fn info_reports_size_of_files_only() {
        let (dir, mut b, _) = setup(&["nfc/cards/", "nfc/a.nfc"]);
        std::fs::write(dir.path().join("nfc/a.nfc"), b"Filetype: NFC\n").unwrap();
        open(&mut b, "/ext/nfc");
        select(&mut b, "a.nfc");
        b.run_action(MenuItem::Info, None).unwrap();
        let info = b.entry_info().unwrap();
        assert_eq!(
            info,
            EntryInfo {
                name: "a.nfc".to_string(),
                size: 14,
                is_dir: false
            }
        );
        assert_eq!(info.to_string(), "a.nfc: 14 bytes");

        select(&mut b, "cards");
        assert!(matches!(
            b.run_action(MenuItem::Info, None),
            Err(ActionError::NotInMenu(MenuItem::Info))
        ));
    }

    #[test]
    fn actions_outside_the_menu_are_refused() {
        let (dir, mut b, _) = setup(&["subghz/a.sub"]);
        b.favorites().add("/ext/subghz/a.sub").unwrap();
        b.open_tab(Tab::Favorites);
        assert_eq!(b.tab(), Tab::Favorites);
        assert!(matches!(
            b.run_action(MenuItem::Delete, None),
            Err(ActionError::NotInMenu(MenuItem::Delete))
        ));
        assert!(matches!(
            b.run_action(MenuItem::Rename, Some("b")),
            Err(ActionError::NotInMenu(MenuItem::Rename))
        ));
        assert!(dir.path().join("subghz/a.sub").exists());
        assert_eq!(b.favorites().count(), 1);
    }

    #[test]
    fn delete_u2f_entry_removes_key_files() {
        let (dir, mut b, _) = setup(&["u2f/key.u2f", "u2f/cnt.u2f", "x.bin"]);
        b.open_tab(Tab::U2f);
        assert_eq!(b.tab(), Tab::U2f);
        b.run_action(MenuItem::Delete, None).unwrap();
        assert!(!dir.path().join("u2f/key.u2f").exists());
        // tab became empty and was left
        assert_ne!(b.tab(), Tab::U2f);
    }
}
