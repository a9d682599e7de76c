//! Akoma Ntoso URI parsing and path derivation.
//!
//! Finlex identifies documents by akn URIs in two grammars:
//!
//! ```text
//! /akn/fi/{category}/{type}/{year}/{number}/{langAndVersion}
//! /akn/fi/doc/authority-regulation/{authority}/{year}/{number}/{langAndVersion}
//! ```
//!
//! Parsing is total: anything that matches neither grammar is `None`.

use std::fmt;
use std::path::PathBuf;

/// Path segment of the API root, stripped from absolute URLs.
const API_ROOT: &str = "/finlex/avoindata/v1";

const AUTHORITY_REGULATION: &str = "authority-regulation";

/// Top-level document grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Legislative acts
    Act,
    /// Court judgments
    Judgment,
    /// Other documents (proposals, treaties, regulations)
    Doc,
}

impl Category {
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "act" => Some(Self::Act),
            "judgment" => Some(Self::Judgment),
            "doc" => Some(Self::Doc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Act => "act",
            Self::Judgment => "judgment",
            Self::Doc => "doc",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured document coordinates parsed from an akn URI.
///
/// `authority` is present exactly when `document_type` is
/// `authority-regulation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub category: Category,
    pub document_type: String,
    pub year: String,
    pub number: String,
    pub lang_and_version: String,
    pub authority: Option<String>,
}

impl DocumentRef {
    /// API path for fetching this document.
    pub fn api_path(&self) -> String {
        match &self.authority {
            Some(authority) => format!(
                "/akn/fi/{}/{}/{}/{}/{}/{}",
                self.category,
                self.document_type,
                authority,
                self.year,
                self.number,
                self.lang_and_version
            ),
            None => format!(
                "/akn/fi/{}/{}/{}/{}/{}",
                self.category, self.document_type, self.year, self.number, self.lang_and_version
            ),
        }
    }

    /// Relative directory under the output root for this document's files.
    ///
    /// Every field appears as its own segment, so distinct refs never map to
    /// the same directory.
    pub fn storage_path(&self) -> PathBuf {
        let mut path = PathBuf::from(self.category.as_str());
        path.push(&self.document_type);
        if let Some(authority) = &self.authority {
            path.push(authority);
        }
        path.push(&self.year);
        path.push(&self.number);
        path.push(&self.lang_and_version);
        path
    }
}

/// List endpoint path for one (category, document type) pair.
pub fn list_path(category: Category, document_type: &str) -> String {
    format!("/akn/fi/{category}/{document_type}/list")
}

/// Parse an akn URI into document coordinates.
///
/// Accepts either an absolute URL
/// (`https://opendata.finlex.fi/finlex/avoindata/v1/akn/fi/act/statute/2024/123/fin@`)
/// or the bare path (`/akn/fi/act/statute/2024/123/fin@`). Percent-encoded
/// segments are decoded before matching.
pub fn parse_akn_uri(uri: &str) -> Option<DocumentRef> {
    let path = if uri.starts_with("http") {
        let parsed = url::Url::parse(uri).ok()?;
        let decoded = percent_decode(parsed.path());
        strip_api_root(&decoded).to_string()
    } else {
        percent_decode(uri)
    };

    let rest = path.strip_prefix("/akn/fi/")?;
    let segments: Vec<&str> = rest.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }

    // Authority-regulation grammar first (more specific)
    if segments.len() == 6 {
        if segments[0] != Category::Doc.as_str() || segments[1] != AUTHORITY_REGULATION {
            return None;
        }
        if !is_year(segments[3]) {
            return None;
        }
        return Some(DocumentRef {
            category: Category::Doc,
            document_type: AUTHORITY_REGULATION.to_string(),
            authority: Some(segments[2].to_string()),
            year: segments[3].to_string(),
            number: segments[4].to_string(),
            lang_and_version: segments[5].to_string(),
        });
    }

    if segments.len() == 5 {
        let category = Category::from_segment(segments[0])?;
        if !is_year(segments[2]) {
            return None;
        }
        // An authority-regulation URI without its authority segment cannot
        // satisfy the authority invariant
        if segments[1] == AUTHORITY_REGULATION {
            return None;
        }
        return Some(DocumentRef {
            category,
            document_type: segments[1].to_string(),
            authority: None,
            year: segments[2].to_string(),
            number: segments[3].to_string(),
            lang_and_version: segments[4].to_string(),
        });
    }

    None
}

fn percent_decode(s: &str) -> String {
    urlencoding::decode(s)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

/// Strip everything through the last occurrence of the API root segment.
fn strip_api_root(path: &str) -> &str {
    match path.rfind(API_ROOT) {
        Some(idx) => &path[idx + API_ROOT.len()..],
        None => path,
    }
}

fn is_year(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
