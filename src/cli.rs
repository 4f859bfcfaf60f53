//! CLI subcommand implementations.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{bail, Result};

use sdarchive::actions::MenuItem;
use sdarchive::browser::{ArchiveBrowser, BrowserAction, InputEvent, InputKey, InputKind};
use sdarchive::favorites::FavoritesStore;
use sdarchive::tabs::Tab;

const SETTLE: Duration = Duration::from_secs(10);

fn print_listing(browser: &ArchiveBrowser) {
    let cache = browser.cache();
    println!(
        "[{}] {} ({} entries){}",
        browser.tab(),
        browser.path(),
        cache.total(),
        if browser.is_move_mode() { " moving" } else { "" }
    );
    for (i, entry) in cache.visible_entries() {
        let marker = if i == cache.selected() { '>' } else { ' ' };
        match entry {
            Some(e) => {
                let suffix = if e.is_dir() { "/" } else { "" };
                let pin = if e.is_favorite { " *" } else { "" };
                println!(
                    "{} {:4} {}{}  [{}]{}",
                    marker,
                    i,
                    e.name(),
                    suffix,
                    e.category.name(),
                    pin
                );
            }
            None => println!("{} {:4} ...", marker, i),
        }
    }
}

/// Open a tab or path and print the loaded window.
pub fn ls(browser: &mut ArchiveBrowser, tab: Option<Tab>, path: Option<&str>) -> Result<()> {
    match path {
        Some(p) => browser.open_in_browser(p),
        None => browser.open_tab(tab.unwrap_or(Tab::Browser)),
    }
    if !browser.wait_idle(SETTLE) {
        bail!("listing {} did not settle", browser.path());
    }
    let cache = browser.cache();
    println!("[{}] {} ({} entries)", browser.tab(), browser.path(), cache.total());
    for entry in cache.entries() {
        let suffix = if entry.is_dir() { "/" } else { "" };
        println!("  {}{}  [{}]", entry.name(), suffix, entry.category.name());
    }
    if (cache.entries().len() as u32) < cache.total() {
        println!("  ... {} more", cache.total() - cache.entries().len() as u32);
    }
    Ok(())
}

fn parse_key(word: &str) -> Option<InputEvent> {
    let (key, kind) = match word {
        "u" | "up" => (InputKey::Up, InputKind::Short),
        "d" | "down" => (InputKey::Down, InputKind::Short),
        "l" | "left" => (InputKey::Left, InputKind::Short),
        "r" | "right" => (InputKey::Right, InputKind::Short),
        "ok" => (InputKey::Ok, InputKind::Short),
        "long-ok" => (InputKey::Ok, InputKind::Long),
        "b" | "back" => (InputKey::Back, InputKind::Short),
        _ => return None,
    };
    Some(InputEvent { key, kind })
}

/// Line-driven session on stdin.
pub fn shell(browser: &mut ArchiveBrowser, tab: Tab) -> Result<()> {
    browser.open_tab(tab);
    browser.wait_idle(SETTLE);
    print_listing(browser);

    let stdin = io::stdin();
    print!("> ");
    io::stdout().flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else {
            print!("> ");
            io::stdout().flush()?;
            continue;
        };

        match cmd {
            "q" | "quit" => break,
            "menu" => {
                let items = browser.context_menu();
                let labels: Vec<&str> = items.iter().map(MenuItem::label).collect();
                println!("menu: {}", labels.join(" | "));
            }
            "do" => {
                let rest: Vec<&str> = words.collect();
                let (item, arg) = split_action(&rest);
                match item.parse::<MenuItem>() {
                    Ok(item) => {
                        if item.takes_name() && arg.is_none() {
                            println!("{} needs a name", item);
                        } else if let Err(e) = browser.run_action(item, arg.as_deref()) {
                            println!("error: {}", e);
                        } else if item == MenuItem::Info {
                            match browser.entry_info() {
                                Ok(info) => println!("{}", info),
                                Err(e) => println!("error: {}", e),
                            }
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
            word => match parse_key(word) {
                Some(input) => match browser.handle_input(input) {
                    BrowserAction::Exit => {
                        println!("bye");
                        break;
                    }
                    BrowserAction::OpenMenu => {
                        let items = browser.context_menu();
                        let labels: Vec<&str> = items.iter().map(MenuItem::label).collect();
                        println!("menu: {}", labels.join(" | "));
                    }
                    BrowserAction::Failed(e) => println!("error: {}", e),
                    BrowserAction::Handled | BrowserAction::Ignored => {}
                },
                None => println!("unknown command: {}", word),
            },
        }

        browser.wait_idle(SETTLE);
        print_listing(browser);
        print!("> ");
        io::stdout().flush()?;
    }
    Ok(())
}

/// `do` takes an action word (or two, for `new dir`) and an optional name,
/// which may contain spaces.
fn split_action(words: &[&str]) -> (String, Option<String>) {
    match words {
        [] => (String::new(), None),
        ["new", "dir", rest @ ..] | ["run", "in", "app", rest @ ..] => {
            let item = words[..words.len() - rest.len()].join(" ");
            (item, (!rest.is_empty()).then(|| rest.join(" ")))
        }
        [item, rest @ ..] => (item.to_string(), (!rest.is_empty()).then(|| rest.join(" "))),
    }
}

pub fn fav_list(favorites: &FavoritesStore) -> Result<()> {
    let listing = favorites.read_all()?;
    if listing.entries.is_empty() {
        println!("No favorites. Use `sdarchive fav add PATH` first.");
    }
    for entry in &listing.entries {
        println!("{}", entry);
    }
    if listing.needs_rewrite {
        println!("(some entries are gone; run `sdarchive fav clean`)");
    }
    Ok(())
}

pub fn fav_add(favorites: &FavoritesStore, path: &str) -> Result<()> {
    if favorites.contains(path) {
        println!("Already pinned: {}", path);
        return Ok(());
    }
    favorites.add(path)?;
    println!("Pinned {}", path);
    Ok(())
}

pub fn fav_rm(favorites: &FavoritesStore, path: &str) -> Result<()> {
    favorites.delete(path)?;
    println!("Unpinned {}", path);
    Ok(())
}

pub fn fav_count(favorites: &FavoritesStore) {
    println!("{}", favorites.count());
}

pub fn fav_clean(favorites: &FavoritesStore) -> Result<()> {
    let before = favorites.count();
    favorites.rewrite_dropping_invalid()?;
    println!("Removed {} dead entries", before - favorites.count());
    Ok(())
}

pub fn tabs(browser: &ArchiveBrowser) {
    for tab in Tab::ALL {
        let filter = match tab.extension_filter() {
            "" => "-",
            f => f,
        };
        println!(
            "{:10} {:16} {:10} {}",
            tab.name(),
            tab.default_path(),
            filter,
            if browser.tab_is_empty(tab) { "empty" } else { "" }
        );
    }
}
