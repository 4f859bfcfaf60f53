//! Browser tabs: each one binds a root path to an extension filter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::apps::SyntheticApp;
use crate::filter::WILDCARD;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Favorites,
    IButton,
    Nfc,
    SubGhz,
    Lfrfid,
    Infrared,
    BadUsb,
    U2f,
    Applications,
    Browser,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Left,
    Right,
}

impl Tab {
    pub const ALL: [Tab; 10] = [
        Tab::Favorites,
        Tab::IButton,
        Tab::Nfc,
        Tab::SubGhz,
        Tab::Lfrfid,
        Tab::Infrared,
        Tab::BadUsb,
        Tab::U2f,
        Tab::Applications,
        Tab::Browser,
    ];

    pub const COUNT: usize = Tab::ALL.len();

    pub fn index(&self) -> usize {
        Tab::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    /// Neighbouring tab, wrapping around at both ends.
    pub fn step(&self, dir: Direction) -> Tab {
        let idx = match dir {
            Direction::Left => (self.index() + Tab::COUNT - 1) % Tab::COUNT,
            Direction::Right => (self.index() + 1) % Tab::COUNT,
        };
        Tab::ALL[idx]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tab::Favorites => "Favorites",
            Tab::IButton => "iButton",
            Tab::Nfc => "NFC",
            Tab::SubGhz => "Sub-GHz",
            Tab::Lfrfid => "RFID LF",
            Tab::Infrared => "Infrared",
            Tab::BadUsb => "Bad USB",
            Tab::U2f => "U2F",
            Tab::Applications => "Apps",
            Tab::Browser => "Browser",
        }
    }

    pub fn default_path(&self) -> &'static str {
        match self {
            Tab::Favorites => "/app:favorites",
            Tab::IButton => "/ext/ibutton",
            Tab::Nfc => "/ext/nfc",
            Tab::SubGhz => "/ext/subghz",
            Tab::Lfrfid => "/ext/lfrfid",
            Tab::Infrared => "/ext/infrared",
            Tab::BadUsb => "/ext/badusb",
            Tab::U2f => "/app:u2f",
            Tab::Applications => "/ext/apps",
            Tab::Browser => "/ext",
        }
    }

    pub fn extension_filter(&self) -> &'static str {
        match self {
            Tab::Favorites | Tab::Browser => WILDCARD,
            Tab::IButton => ".ibtn",
            Tab::Nfc => ".nfc",
            Tab::SubGhz => ".sub",
            Tab::Lfrfid => ".rfid",
            Tab::Infrared => ".ir",
            Tab::BadUsb => ".txt",
            Tab::U2f => "",
            Tab::Applications => ".fap|.js",
        }
    }

    /// Category tabs hide `assets` folders and dotfiles; wildcard tabs show all.
    pub fn hides_internals(&self) -> bool {
        self.extension_filter() != WILDCARD
    }

    /// Tabs listed from something other than a directory scan.
    pub fn synthetic_app(&self) -> Option<SyntheticApp> {
        match self {
            Tab::U2f => Some(SyntheticApp::U2f),
            _ => None,
        }
    }

    pub fn is_filesystem(&self) -> bool {
        !matches!(self, Tab::Favorites) && self.synthetic_app().is_none()
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase().replace(['-', ' ', '_'], "");
        Tab::ALL
            .iter()
            .copied()
            .find(|t| {
                let name = t.name().to_lowercase().replace(['-', ' '], "");
                let key = format!("{:?}", t).to_lowercase();
                wanted == name || wanted == key
            })
            .ok_or_else(|| format!("unknown tab: {}", s))
    }
}
