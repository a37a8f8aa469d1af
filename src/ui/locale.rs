//! User-facing strings by key. English built in, `[strings]` overrides.

use std::collections::HashMap;

const ENGLISH: &[(&str, &str)] = &[
    ("title", "PLATES"),
    ("menu.play", "Play"),
    ("menu.quit", "Quit"),
    ("campaign.title", "Select campaign"),
    ("campaign.blocked", "unavailable"),
    ("level.title", "Select level"),
    ("level.locked", "locked"),
    ("level.done", "done"),
    ("hud.level", "Level"),
    ("hud.moves", "Moves"),
    ("hud.time", "Time"),
    ("hud.help", "Arrows/WASD move  Ctrl+Z undo  Ctrl+R redo  R restart  Esc menu"),
    ("exit.title", "Leave this level?"),
    ("exit.hint", "Enter: yes   Esc: no"),
    ("completed.title", "Level completed!"),
    ("completed.moves", "Moves"),
    ("completed.time", "Time (s)"),
    ("completed.next", "Next level"),
    ("completed.menu", "Main menu"),
    ("campaign.done", "Campaign completed!"),
    ("campaign.done.hint", "Press Enter to return to the main menu"),
    ("hint.back", "Esc: back"),
    ("term.small", "Terminal too small"),
];

pub struct Localizer {
    strings: HashMap<String, String>,
}

impl Localizer {
    pub fn new(overrides: &HashMap<String, String>) -> Self {
        let mut strings: HashMap<String, String> =
            ENGLISH.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        strings.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        Localizer { strings }
    }

    /// Unknown keys come back as the key itself.
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.strings.get(key).map(String::as_str).unwrap_or(key)
    }
}

impl Default for Localizer {
    fn default() -> Self {
        Localizer::new(&HashMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_by_default() {
        let l = Localizer::default();
        assert_eq!(l.get("completed.title"), "Level completed!");
    }

    #[test]
    fn overrides_win() {
        let mut o = HashMap::new();
        o.insert("menu.play".to_string(), "Spielen".to_string());
        let l = Localizer::new(&o);
        assert_eq!(l.get("menu.play"), "Spielen");
        assert_eq!(l.get("menu.quit"), "Quit");
    }

    #[test]
    fn missing_key_falls_back_to_key() {
        assert_eq!(Localizer::default().get("no.such"), "no.such");
    }
}
