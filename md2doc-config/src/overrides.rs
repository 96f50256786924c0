//! Settings that can be overridden from the command line.
//!
//! Each [`Setting`] names a configuration path and how its raw value is read.
//! Overrides are layered last by [`crate::Loader::with_overrides`], so they win
//! over the defaults, `md2doc.toml` and `--config`.

use config::ValueKind;
use md2doc_core::NumberingStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    /// `true`/`false` and the usual spellings. A bare flag means `true`.
    Flag,
    /// A numbering style name, normalized to its config spelling.
    Numbering,
    /// Free text, taken as written.
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Setting {
    /// Accepted names; the first is the one shown in messages.
    pub names: &'static [&'static str],
    /// Dotted path into [`crate::Md2docConfig`].
    pub path: &'static str,
    pub kind: SettingKind,
}

pub const SETTINGS: &[Setting] = &[
    Setting {
        names: &["numbering", "numbering-style"],
        path: "numbering.style",
        kind: SettingKind::Numbering,
    },
    Setting {
        names: &["title"],
        path: "template.title",
        kind: SettingKind::Text,
    },
    Setting {
        names: &["captions"],
        path: "template.captions",
        kind: SettingKind::Flag,
    },
    Setting {
        names: &["group-digits", "thousands"],
        path: "template.group_digits",
        kind: SettingKind::Flag,
    },
    Setting {
        names: &["parallel"],
        path: "resolve.parallel",
        kind: SettingKind::Flag,
    },
    Setting {
        names: &["render-charts", "charts"],
        path: "charts.render",
        kind: SettingKind::Flag,
    },
];

/// Look up a setting by any of its names.
pub fn setting(name: &str) -> Option<&'static Setting> {
    SETTINGS.iter().find(|s| s.names.iter().any(|n| *n == name))
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverrideValue {
    Flag(bool),
    Text(String),
}

impl From<OverrideValue> for ValueKind {
    fn from(value: OverrideValue) -> Self {
        match value {
            OverrideValue::Flag(b) => ValueKind::Boolean(b),
            OverrideValue::Text(s) => ValueKind::String(s),
        }
    }
}

/// A validated value for one configuration path.
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    pub path: &'static str,
    pub value: OverrideValue,
}

impl Setting {
    pub fn name(&self) -> &'static str {
        self.names.first().copied().unwrap_or(self.path)
    }

    /// Read `raw` into an override for this setting.
    pub fn read(&self, raw: &str) -> Result<Override, String> {
        let value = match self.kind {
            SettingKind::Flag => OverrideValue::Flag(
                parse_flag(raw)
                    .ok_or_else(|| format!("invalid boolean '{raw}' for {}", self.name()))?,
            ),
            SettingKind::Numbering => OverrideValue::Text(
                NumberingStyle::parse(raw)
                    .ok_or_else(|| {
                        format!(
                            "invalid numbering style '{raw}' for {} (use official or dotted)",
                            self.name()
                        )
                    })?
                    .name()
                    .to_string(),
            ),
            SettingKind::Text => OverrideValue::Text(raw.to_string()),
        };
        Ok(Override {
            path: self.path,
            value,
        })
    }
}

pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
