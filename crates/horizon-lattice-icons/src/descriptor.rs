//! Typed access to freedesktop-style descriptor files.
//!
//! Icon theme descriptors (`index.theme`) and icon data files (`*.icon`) share
//! the desktop-entry syntax: `[Group]` headers followed by `Key=Value` lines,
//! with optional `Key[locale]=Value` translations. This module parses them
//! with `rust-ini` and exposes section-scoped, typed getters. A missing key is
//! always reported as `None` so callers can tell absence apart from an explicit
//! zero or empty value.
//!
//! No conformance checking happens here; unknown groups and keys are kept.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};

use crate::error::{Error, Result};

/// A parsed descriptor file.
#[derive(Debug, Clone, Default)]
pub struct Descriptor {
    /// File the descriptor was read from (empty for in-memory input)
    origin: PathBuf,
    /// Group name -> key -> raw value
    sections: HashMap<String, HashMap<String, String>>,
}

impl Descriptor {
    /// Parses descriptor text.
    ///
    /// `origin` is only used to label errors.
    pub fn parse(content: &str, origin: impl Into<PathBuf>) -> Result<Self> {
        let origin = origin.into();
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(content, options)
            .map_err(|e| Error::descriptor(&origin, e.to_string()))?;

        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        for (section, props) in ini.iter() {
            // Keys outside any group carry no meaning for these formats
            let Some(name) = section else { continue };
            let entries = sections.entry(name.to_string()).or_default();
            for (key, value) in props.iter() {
                // First definition wins, like the desktop-entry readers do
                entries
                    .entry(key.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }

        Ok(Self { origin, sections })
    }

    /// Reads and parses a descriptor file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&content, path)
    }

    /// The file this descriptor was loaded from.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Returns true if a group exists.
    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Iterates over group names, in no particular order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(|s| s.as_str())
    }

    /// Gets a raw string value.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .map(|s| s.as_str())
    }

    /// Gets a string value, preferring the best translation for `locale`.
    ///
    /// Falls back through `Key[lang_COUNTRY@MODIFIER]`, `Key[lang_COUNTRY]`,
    /// `Key[lang@MODIFIER]`, `Key[lang]` and finally the untranslated `Key`.
    pub fn get_locale_string(
        &self,
        section: &str,
        key: &str,
        locale: Option<&Locale>,
    ) -> Option<&str> {
        if let Some(locale) = locale {
            for suffix in locale.candidates() {
                if let Some(value) = self.get(section, &format!("{key}[{suffix}]")) {
                    return Some(value);
                }
            }
        }
        self.get(section, key)
    }

    /// Gets a list value.
    ///
    /// Entries are separated by `;` when one is present, otherwise by `,`.
    /// Empty entries are dropped. An absent key yields an empty list.
    pub fn get_list(&self, section: &str, key: &str) -> Vec<String> {
        self.get(section, key).map(split_list).unwrap_or_default()
    }

    /// Gets a boolean value.
    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>> {
        let Some(raw) = self.get(section, key) else {
            return Ok(None);
        };
        match raw.to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(Some(true)),
            "false" | "no" | "0" | "off" => Ok(Some(false)),
            _ => Err(self.invalid(section, key, raw, "boolean")),
        }
    }

    /// Gets an integer value.
    pub fn get_integer(&self, section: &str, key: &str) -> Result<Option<i32>> {
        let Some(raw) = self.get(section, key) else {
            return Ok(None);
        };
        raw.parse()
            .map(Some)
            .map_err(|_| self.invalid(section, key, raw, "integer"))
    }

    fn invalid(&self, section: &str, key: &str, raw: &str, expected: &str) -> Error {
        Error::descriptor(
            &self.origin,
            format!("[{section}] {key}={raw} is not a valid {expected}"),
        )
    }
}

/// A POSIX locale identifier used to pick translated values.
///
/// Parsed from the `lang_COUNTRY.ENCODING@MODIFIER` form; the encoding part is
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    lang: String,
    country: Option<String>,
    modifier: Option<String>,
}

impl Locale {
    /// Parses a locale string.
    ///
    /// Returns `None` for the `C` and `POSIX` locales and for empty input,
    /// which have no translations.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (rest, modifier) = match s.split_once('@') {
            Some((rest, modifier)) => (rest, Some(modifier.to_string())),
            None => (s, None),
        };
        let rest = rest.split_once('.').map_or(rest, |(head, _)| head);
        let (lang, country) = match rest.split_once('_') {
            Some((lang, country)) => (lang, Some(country.to_string())),
            None => (rest, None),
        };

        if lang.is_empty() || lang == "C" || lang == "POSIX" {
            return None;
        }

        Some(Self {
            lang: lang.to_string(),
            country,
            modifier,
        })
    }

    /// Reads the message locale from `LC_ALL`, `LC_MESSAGES` or `LANG`.
    pub fn from_env() -> Option<Self> {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.is_empty())
            .and_then(|value| Self::parse(&value))
    }

    /// Language code, e.g. `de`.
    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Translation key suffixes, most specific first.
    fn candidates(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(4);
        if let (Some(country), Some(modifier)) = (&self.country, &self.modifier) {
            out.push(format!("{}_{}@{}", self.lang, country, modifier));
        }
        if let Some(country) = &self.country {
            out.push(format!("{}_{}", self.lang, country));
        }
        if let Some(modifier) = &self.modifier {
            out.push(format!("{}@{}", self.lang, modifier));
        }
        out.push(self.lang.clone());
        out
    }
}

/// Splits a list value, honouring `\;` and `\,` escapes.
fn split_list(raw: &str) -> Vec<String> {
    let separator = if raw.contains(';') { ';' } else { ',' };
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next) if next == separator => current.push(next),
                Some(next) => {
                    current.push('\\');
                    current.push(next);
                }
                None => current.push('\\'),
            },
            c if c == separator => items.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    items.push(current);

    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
