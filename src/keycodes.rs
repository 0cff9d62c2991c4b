use crate::error::ResolutionError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Which physical instance of a duplicated key produced the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum KeyLocation {
    Standard = 0,
    Left = 1,
    Right = 2,
    Numpad = 3,
}

impl From<KeyLocation> for u8 {
    fn from(loc: KeyLocation) -> u8 {
        loc as u8
    }
}

impl TryFrom<u8> for KeyLocation {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Standard),
            1 => Ok(Self::Left),
            2 => Ok(Self::Right),
            3 => Ok(Self::Numpad),
            other => Err(format!("invalid key location {}", other)),
        }
    }
}

/// The event fields a physical keyboard would report for one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDescriptor {
    pub code: String,
    pub key: String,
    pub key_code: u32,
    pub location: KeyLocation,
}

impl KeyDescriptor {
    fn new(code: &str, key: &str, key_code: u32, location: KeyLocation) -> Self {
        Self {
            code: code.to_string(),
            key: key.to_string(),
            key_code,
            location,
        }
    }
}

/// Fixed vocabulary of key names. Lookups are case-sensitive and aliases are
/// an explicit table pointing at canonical entries.
#[derive(Debug, Clone)]
pub struct KeyRegistry {
    definitions: Vec<KeyDescriptor>,
    name_to_index: HashMap<String, usize>,
    aliases: Vec<(&'static str, &'static str)>,
}

const MODIFIERS: [(&str, u32); 4] = [("Shift", 16), ("Control", 17), ("Alt", 18), ("Meta", 91)];

const PUNCTUATION: [(&str, &str, u32); 11] = [
    ("Minus", "-", 189),
    ("Equal", "=", 187),
    ("BracketLeft", "[", 219),
    ("BracketRight", "]", 221),
    ("Backslash", "\\", 220),
    ("Semicolon", ";", 186),
    ("Quote", "'", 222),
    ("Backquote", "`", 192),
    ("Comma", ",", 188),
    ("Period", ".", 190),
    ("Slash", "/", 191),
];

const EDITING: [(&str, u32); 13] = [
    ("Enter", 13),
    ("Tab", 9),
    ("Escape", 27),
    ("Backspace", 8),
    ("Delete", 46),
    ("Insert", 45),
    ("Home", 36),
    ("End", 35),
    ("PageUp", 33),
    ("PageDown", 34),
    ("CapsLock", 20),
    ("ContextMenu", 93),
    ("Pause", 19),
];

const NUMPAD_OPERATORS: [(&str, &str, u32); 6] = [
    ("NumpadAdd", "+", 107),
    ("NumpadSubtract", "-", 109),
    ("NumpadMultiply", "*", 106),
    ("NumpadDivide", "/", 111),
    ("NumpadDecimal", ".", 110),
    ("NumpadEnter", "Enter", 13),
];

const ALIASES: [(&str, &str); 6] = [
    ("Spacebar", "Space"),
    ("Esc", "Escape"),
    ("Shift", "ShiftLeft"),
    ("Control", "ControlLeft"),
    ("Alt", "AltLeft"),
    ("Meta", "MetaLeft"),
];

impl KeyRegistry {
    pub fn new_with_defaults() -> Self {
        let mut defs = Vec::new();

        for (i, c) in ('a'..='z').enumerate() {
            let code = format!("Key{}", c.to_ascii_uppercase());
            defs.push(KeyDescriptor::new(
                &code,
                &c.to_string(),
                65 + i as u32,
                KeyLocation::Standard,
            ));
        }

        for d in 0..=9u32 {
            defs.push(KeyDescriptor::new(
                &format!("Digit{}", d),
                &d.to_string(),
                48 + d,
                KeyLocation::Standard,
            ));
            defs.push(KeyDescriptor::new(
                &format!("Numpad{}", d),
                &d.to_string(),
                96 + d,
                KeyLocation::Numpad,
            ));
        }

        for (name, key_code) in [
            ("ArrowLeft", 37),
            ("ArrowUp", 38),
            ("ArrowRight", 39),
            ("ArrowDown", 40),
        ] {
            defs.push(KeyDescriptor::new(name, name, key_code, KeyLocation::Standard));
        }

        defs.push(KeyDescriptor::new("Space", " ", 32, KeyLocation::Standard));

        for (name, key_code) in EDITING {
            defs.push(KeyDescriptor::new(name, name, key_code, KeyLocation::Standard));
        }

        for (base, key_code) in MODIFIERS {
            // The right Meta key historically reports its own legacy code.
            let right_code = if base == "Meta" { 92 } else { key_code };
            defs.push(KeyDescriptor::new(
                &format!("{}Left", base),
                base,
                key_code,
                KeyLocation::Left,
            ));
            defs.push(KeyDescriptor::new(
                &format!("{}Right", base),
                base,
                right_code,
                KeyLocation::Right,
            ));
        }

        for (name, key, key_code) in NUMPAD_OPERATORS {
            defs.push(KeyDescriptor::new(name, key, key_code, KeyLocation::Numpad));
        }

        for (name, key, key_code) in PUNCTUATION {
            defs.push(KeyDescriptor::new(name, key, key_code, KeyLocation::Standard));
        }

        for n in 1..=12u32 {
            let name = format!("F{}", n);
            defs.push(KeyDescriptor::new(&name, &name, 111 + n, KeyLocation::Standard));
        }

        let mut reg = Self {
            definitions: defs,
            name_to_index: HashMap::new(),
            aliases: ALIASES.to_vec(),
        };
        reg.rebuild_maps();
        reg
    }

    fn rebuild_maps(&mut self) {
        self.name_to_index.clear();
        for (idx, def) in self.definitions.iter().enumerate() {
            self.name_to_index.insert(def.code.clone(), idx);
        }
        for (alias, target) in &self.aliases {
            if let Some(&idx) = self.name_to_index.get(*target) {
                self.name_to_index.insert(alias.to_string(), idx);
            }
        }
    }

    pub fn resolve(&self, name: &str) -> Result<KeyDescriptor, ResolutionError> {
        self.name_to_index
            .get(name)
            .map(|&idx| self.definitions[idx].clone())
            .ok_or_else(|| ResolutionError(name.to_string()))
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    /// Canonical names in table order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.code.as_str())
    }

    pub fn aliases(&self) -> &[(&'static str, &'static str)] {
        &self.aliases
    }

    pub fn descriptors(&self) -> &[KeyDescriptor] {
        &self.definitions
    }
}

static DEFAULT_REGISTRY: LazyLock<KeyRegistry> = LazyLock::new(KeyRegistry::new_with_defaults);

/// The shared, immutable default vocabulary.
pub fn registry() -> &'static KeyRegistry {
    &DEFAULT_REGISTRY
}

pub fn resolve_key_descriptor(name: &str) -> Result<KeyDescriptor, ResolutionError> {
    registry().resolve(name)
}
