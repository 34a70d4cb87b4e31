use std::collections::BTreeMap;

use crate::foundation::core::CategoryKey;
use crate::foundation::error::{JourneyError, JourneyResult};

/// Straight (non-premultiplied) sRGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (case-insensitive, `#` optional).
    pub fn from_hex(s: &str) -> JourneyResult<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);

        fn hex_byte(pair: &str) -> JourneyResult<u8> {
            u8::from_str_radix(pair, 16)
                .map_err(|_| JourneyError::validation(format!("invalid hex byte \"{pair}\"")))
        }

        if !s.is_ascii() {
            return Err(JourneyError::validation("hex color must be ASCII"));
        }
        match s.len() {
            6 => Ok(Self::rgb(
                hex_byte(&s[0..2])?,
                hex_byte(&s[2..4])?,
                hex_byte(&s[4..6])?,
            )),
            8 => Ok(Self {
                r: hex_byte(&s[0..2])?,
                g: hex_byte(&s[2..4])?,
                b: hex_byte(&s[4..6])?,
                a: hex_byte(&s[6..8])?,
            }),
            _ => Err(JourneyError::validation(
                "hex color must be #RRGGBB or #RRGGBBAA",
            )),
        }
    }

    /// `#rrggbb`; alpha is emitted separately as an opacity attribute.
    pub fn css(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn opacity(self) -> f64 {
        f64::from(self.a) / 255.0
    }
}

impl serde::Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.a == 255 {
            serializer.serialize_str(&self.css())
        } else {
            serializer.serialize_str(&format!("{}{:02x}", self.css(), self.a))
        }
    }
}

impl<'de> serde::Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl std::str::FromStr for ThemeMode {
    type Err = JourneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            other => Err(JourneyError::validation(format!(
                "unknown theme '{other}' (expected dark or light)"
            ))),
        }
    }
}

/// Colors the render boundary applies per category key.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Theme {
    pub mode: ThemeMode,
    pub background: Color,
    pub text: Color,
    pub muted_text: Color,
    /// Static stroke drawn under each animated connector.
    pub path_underlay: Color,
    pub hub: Color,
    pub exit: Color,
    /// Used for categories without an entry.
    pub fallback: Color,
    pub categories: BTreeMap<CategoryKey, Color>,
}

impl Theme {
    pub fn for_mode(mode: ThemeMode) -> Self {
        let categories = [
            ("discovery", Color::rgb(0x14, 0xb8, 0xa6)),
            ("consideration", Color::rgb(0x0e, 0xa5, 0xe9)),
            ("purchase", Color::rgb(0xf5, 0x9e, 0x0b)),
            ("retention", Color::rgb(0x8b, 0x5c, 0xf6)),
        ]
        .into_iter()
        .map(|(k, c)| (CategoryKey::new(k), c))
        .collect();

        match mode {
            ThemeMode::Dark => Self {
                mode,
                background: Color::rgb(0x0d, 0x0d, 0x15),
                text: Color::rgb(0xff, 0xff, 0xff),
                muted_text: Color::rgb(0x9c, 0xa3, 0xaf),
                path_underlay: Color::rgb(0x3e, 0x47, 0x58),
                hub: Color::rgb(0x23, 0x58, 0xe9),
                exit: Color::rgb(0x9c, 0xa3, 0xaf),
                fallback: Color::rgb(0x64, 0x74, 0x8b),
                categories,
            },
            ThemeMode::Light => Self {
                mode,
                background: Color::rgb(0xff, 0xff, 0xff),
                text: Color::rgb(0x11, 0x18, 0x27),
                muted_text: Color::rgb(0x6b, 0x72, 0x80),
                path_underlay: Color::rgb(0xda, 0xda, 0xda),
                hub: Color::rgb(0x23, 0x58, 0xe9),
                exit: Color::rgb(0x9c, 0xa3, 0xaf),
                fallback: Color::rgb(0x64, 0x74, 0x8b),
                categories,
            },
        }
    }

    pub fn color_for(&self, key: &CategoryKey) -> Color {
        if key.is_exit() {
            return self.exit;
        }
        self.categories.get(key).copied().unwrap_or(self.fallback)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::for_mode(ThemeMode::default())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/theme.rs"]
mod tests;
