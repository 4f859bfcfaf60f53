//! Entry filtering and category classification.

use crate::apps::SyntheticApp;
use crate::path::{self, APP_PREFIX};

/// Filter token that lets every file through.
pub const WILDCARD: &str = "*";
/// Directory hidden from category tabs.
pub const ASSETS_DIR: &str = "assets";
/// Root of the BadUSB tab; `.txt` files are scripts only below it.
pub const BADUSB_PATH: &str = "/ext/badusb";

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Category {
    IButton,
    Nfc,
    SubGhz,
    Lfrfid,
    Infrared,
    BadUsb,
    U2f,
    Application,
    Script,
    UpdateManifest,
    Folder,
    Unknown,
}

/// Extension lookup, most specific first.
const EXTENSIONS: &[(&str, Category)] = &[
    (".ibtn", Category::IButton),
    (".rfid", Category::Lfrfid),
    (".nfc", Category::Nfc),
    (".sub", Category::SubGhz),
    (".fap", Category::Application),
    (".fuf", Category::UpdateManifest),
    (".ir", Category::Infrared),
    (".js", Category::Script),
    (".txt", Category::BadUsb),
];

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Category::IButton => "iButton",
            Category::Nfc => "NFC",
            Category::SubGhz => "Sub-GHz",
            Category::Lfrfid => "RFID LF",
            Category::Infrared => "Infrared",
            Category::BadUsb => "Bad USB",
            Category::U2f => "U2F",
            Category::Application => "Application",
            Category::Script => "Script",
            Category::UpdateManifest => "Update",
            Category::Folder => "Folder",
            Category::Unknown => "Unknown",
        }
    }

    /// Registered application that opens entries of this category.
    /// `Application` entries are launched directly and have no handler.
    pub fn app_name(&self) -> Option<&'static str> {
        match self {
            Category::IButton => Some("iButton"),
            Category::Nfc => Some("NFC"),
            Category::SubGhz => Some("Sub-GHz"),
            Category::Lfrfid => Some("125 kHz RFID"),
            Category::Infrared => Some("Infrared"),
            Category::BadUsb => Some("Bad USB"),
            Category::U2f => Some("U2F"),
            Category::Script => Some("JS Runner"),
            Category::UpdateManifest => Some("UpdaterApp"),
            Category::Application | Category::Folder | Category::Unknown => None,
        }
    }

    /// Whether "Run In App" makes sense for this category.
    pub fn is_known_app(&self) -> bool {
        !matches!(self, Category::Folder | Category::Unknown)
    }
}

/// Decide whether a raw directory entry belongs in the listing.
///
/// `filter` is `*` or a `|`-separated list of extensions (`.fap|.js`).
pub fn passes_filter(is_dir: bool, name: &str, filter: &str, skip_assets: bool) -> bool {
    if is_dir {
        return !(skip_assets && name == ASSETS_DIR);
    }
    if filter == WILDCARD {
        return true;
    }
    let lower = name.to_lowercase();
    filter
        .split('|')
        .map(str::trim)
        .filter(|ext| !ext.is_empty())
        .any(|ext| lower.ends_with(&ext.to_lowercase()))
}

pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Map an entry to its category. Never fails; unknown input is `Unknown`.
pub fn classify(path: &str, is_dir: bool, is_synthetic: bool) -> Category {
    if is_synthetic {
        return app_id(path)
            .and_then(SyntheticApp::from_id)
            .map(|app| app.category())
            .unwrap_or(Category::Unknown);
    }
    if is_dir {
        return Category::Folder;
    }
    let lower = path::basename(path).to_lowercase();
    for (ext, category) in EXTENSIONS {
        if !lower.ends_with(ext) {
            continue;
        }
        if *category == Category::BadUsb && !path::is_under(path, BADUSB_PATH) {
            continue;
        }
        return *category;
    }
    Category::Unknown
}

/// Application id of a `/app:<id>/...` path.
pub fn app_id(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(APP_PREFIX)?;
    let id = rest.split('/').next().unwrap_or(rest);
    (!id.is_empty()).then_some(id)
}
