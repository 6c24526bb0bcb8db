//! Keybinding configuration for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::Deserialize;

use crate::tui::event::Action;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeybindingConfig {
    pub quit: Vec<String>,
    pub move_up: Vec<String>,
    pub move_down: Vec<String>,
    pub next_page: Vec<String>,
    pub prev_page: Vec<String>,
    pub next_pane: Vec<String>,
    pub cycle_sort: Vec<String>,
    pub toggle_like: Vec<String>,
    pub toggle_bookmark: Vec<String>,
    pub download: Vec<String>,
    pub preview: Vec<String>,
    pub refresh: Vec<String>,
}

fn keys(bindings: &[&str]) -> Vec<String> {
    bindings.iter().map(|b| b.to_string()).collect()
}

impl Default for KeybindingConfig {
    fn default() -> Self {
        Self {
            quit: keys(&["q", "Ctrl+c"]),
            move_up: keys(&["k", "Up"]),
            move_down: keys(&["j", "Down"]),
            next_page: keys(&["n", "PageDown"]),
            prev_page: keys(&["p", "PageUp"]),
            next_pane: keys(&["Tab", "BackTab"]),
            cycle_sort: keys(&["s"]),
            toggle_like: keys(&["l"]),
            toggle_bookmark: keys(&["b"]),
            download: keys(&["d"]),
            preview: keys(&["o", "Enter"]),
            refresh: keys(&["r", "R"]),
        }
    }
}

impl KeybindingConfig {
    /// Map a key event to an action. Earlier entries win when bindings overlap.
    pub fn get_action(&self, key: &KeyEvent) -> Action {
        let table: [(&[String], Action); 12] = [
            (&self.quit, Action::Quit),
            (&self.move_up, Action::MoveUp),
            (&self.move_down, Action::MoveDown),
            (&self.next_page, Action::NextPage),
            (&self.prev_page, Action::PrevPage),
            (&self.next_pane, Action::NextPane),
            (&self.cycle_sort, Action::CycleSort),
            (&self.toggle_like, Action::ToggleLike),
            (&self.toggle_bookmark, Action::ToggleBookmark),
            (&self.download, Action::Download),
            (&self.preview, Action::Preview),
            (&self.refresh, Action::Refresh),
        ];

        table
            .iter()
            .find(|(bindings, _)| matches_any(key, bindings))
            .map(|(_, action)| *action)
            .unwrap_or(Action::None)
    }
}

fn matches_any(key: &KeyEvent, bindings: &[String]) -> bool {
    bindings
        .iter()
        .filter_map(|b| parse_key_string(b).ok())
        .any(|binding| binding.matches(key))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    /// Shift is ignored unless the binding asks for it, so "R" matches the
    /// event terminals send for Shift+r.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        self.code == key.code
            && (self.modifiers == key.modifiers
                || self.modifiers == (key.modifiers - KeyModifiers::SHIFT))
    }
}

/// Parse "j", "PageDown", "Ctrl+c", "Ctrl+Shift+a" and similar.
pub fn parse_key_string(s: &str) -> Result<KeyBinding, String> {
    let s = s.trim();
    let mut parts: Vec<&str> = s.split('+').collect();
    // "+" on its own, or a trailing "Ctrl++"
    if s.ends_with('+') {
        parts.retain(|p| !p.is_empty());
        parts.push("+");
    }

    let key_part = parts.pop().ok_or_else(|| format!("Empty key binding: {:?}", s))?;
    let mut modifiers = KeyModifiers::NONE;
    for part in parts {
        modifiers |= match part.to_lowercase().as_str() {
            "ctrl" | "control" => KeyModifiers::CONTROL,
            "shift" => KeyModifiers::SHIFT,
            "alt" => KeyModifiers::ALT,
            _ => return Err(format!("Unknown modifier: {}", part)),
        };
    }

    Ok(KeyBinding {
        code: parse_key_code(key_part)?,
        modifiers,
    })
}

fn parse_key_code(s: &str) -> Result<KeyCode, String> {
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(c));
    }

    let lower = s.to_lowercase();
    if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
        if (1..=12).contains(&n) {
            return Ok(KeyCode::F(n));
        }
    }

    match lower.as_str() {
        "enter" | "return" => Ok(KeyCode::Enter),
        "tab" => Ok(KeyCode::Tab),
        "backtab" => Ok(KeyCode::BackTab),
        "backspace" | "bs" => Ok(KeyCode::Backspace),
        "delete" | "del" => Ok(KeyCode::Delete),
        "home" => Ok(KeyCode::Home),
        "end" => Ok(KeyCode::End),
        "pageup" | "pgup" => Ok(KeyCode::PageUp),
        "pagedown" | "pgdn" => Ok(KeyCode::PageDown),
        "up" => Ok(KeyCode::Up),
        "down" => Ok(KeyCode::Down),
        "left" => Ok(KeyCode::Left),
        "right" => Ok(KeyCode::Right),
        "esc" | "escape" => Ok(KeyCode::Esc),
        "space" => Ok(KeyCode::Char(' ')),
        _ => Err(format!("Unknown key: {}", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_parse_keys() {
        assert_eq!(parse_key_string("l").unwrap().code, KeyCode::Char('l'));
        assert_eq!(parse_key_string("PageDown").unwrap().code, KeyCode::PageDown);
        assert_eq!(parse_key_string("f5").unwrap().code, KeyCode::F(5));
        assert_eq!(parse_key_string("Space").unwrap().code, KeyCode::Char(' '));
        assert!(parse_key_string("F13").is_err());
        assert!(parse_key_string("Hyper+x").is_err());
    }

    #[test]
    fn test_parse_modifiers() {
        let binding = parse_key_string("Ctrl+Shift+a").unwrap();
        assert_eq!(binding.code, KeyCode::Char('a'));
        assert_eq!(binding.modifiers, KeyModifiers::CONTROL | KeyModifiers::SHIFT);

        let plus = parse_key_string("Ctrl++").unwrap();
        assert_eq!(plus.code, KeyCode::Char('+'));
        assert_eq!(plus.modifiers, KeyModifiers::CONTROL);
    }

    #[test]
    fn test_shift_is_implicit_for_uppercase() {
        let binding = parse_key_string("R").unwrap();
        assert!(binding.matches(&press(KeyCode::Char('R'), KeyModifiers::SHIFT)));
        assert!(binding.matches(&press(KeyCode::Char('R'), KeyModifiers::NONE)));

        let ctrl_c = parse_key_string("Ctrl+c").unwrap();
        assert!(!ctrl_c.matches(&press(KeyCode::Char('c'), KeyModifiers::NONE)));
    }

    #[test]
    fn test_default_actions() {
        let config = KeybindingConfig::default();
        let cases = [
            (press(KeyCode::Char('c'), KeyModifiers::CONTROL), Action::Quit),
            (press(KeyCode::Down, KeyModifiers::NONE), Action::MoveDown),
            (press(KeyCode::Char('s'), KeyModifiers::NONE), Action::CycleSort),
            (press(KeyCode::Char('l'), KeyModifiers::NONE), Action::ToggleLike),
            (press(KeyCode::Char('b'), KeyModifiers::NONE), Action::ToggleBookmark),
            (press(KeyCode::Char('d'), KeyModifiers::NONE), Action::Download),
            (press(KeyCode::Enter, KeyModifiers::NONE), Action::Preview),
            (press(KeyCode::BackTab, KeyModifiers::SHIFT), Action::NextPane),
            (press(KeyCode::Char('x'), KeyModifiers::NONE), Action::None),
        ];
        for (key, expected) in cases {
            assert_eq!(config.get_action(&key), expected, "{:?}", key);
        }
    }

    #[test]
    fn test_custom_bindings() {
        let config: KeybindingConfig = toml::from_str("toggle_like = [\"Space\"]").unwrap();
        assert_eq!(
            config.get_action(&press(KeyCode::Char(' '), KeyModifiers::NONE)),
            Action::ToggleLike
        );
        assert_eq!(
            config.get_action(&press(KeyCode::Char('l'), KeyModifiers::NONE)),
            Action::None
        );
    }
}
