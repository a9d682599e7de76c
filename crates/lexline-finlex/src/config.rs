//! Category selections and year windows for a run.

use std::fmt;

use chrono::Datelike;

use crate::uri::Category;

/// What the user asks to download. Mostly a category, except
/// authority regulations, which live under `doc` but are selected (and
/// year-scoped) on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection {
    Act,
    Judgment,
    Doc,
    AuthorityRegulation,
}

impl Selection {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "act" => Some(Self::Act),
            "judgment" => Some(Self::Judgment),
            "doc" => Some(Self::Doc),
            "authority-regulation" => Some(Self::AuthorityRegulation),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Act => "act",
            Self::Judgment => "judgment",
            Self::Doc => "doc",
            Self::AuthorityRegulation => "authority-regulation",
        }
    }

    /// API category this selection lists under.
    pub fn category(self) -> Category {
        match self {
            Self::Act => Category::Act,
            Self::Judgment => Category::Judgment,
            Self::Doc | Self::AuthorityRegulation => Category::Doc,
        }
    }

    /// Document types drained for this selection, in processing order.
    pub fn document_types(self) -> &'static [&'static str] {
        match self {
            Self::Act => &[
                "statute",
                "statute-consolidated",
                "statute-translated",
                "statute-aland",
                "statute-sami",
            ],
            Self::Judgment => &["kko", "kho"],
            Self::Doc => &[
                "government-proposal",
                "treaty",
                "treaty-consolidated",
                "authority-regulation",
            ],
            Self::AuthorityRegulation => &["authority-regulation"],
        }
    }

    pub fn all() -> &'static [Selection] {
        &[
            Self::Act,
            Self::Judgment,
            Self::Doc,
            Self::AuthorityRegulation,
        ]
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive year window covering the last `years_back` years.
pub fn year_range(years_back: u32) -> (i32, i32) {
    let current = chrono::Local::now().year();
    (current - years_back as i32 + 1, current)
}
