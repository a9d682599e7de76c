//! Single-document fetch: resolve, download, write.
//!
//! A fetch is idempotent over the output tree: if the primary XML is already
//! on disk the document is skipped without touching the network. Companion
//! assets (PDF, package, media) are best-effort and never turn a successful
//! fetch into a failure.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use lexline_core::{Accept, Transport};
use serde::{Deserialize, Serialize};

use crate::media::extract_media_links;
use crate::uri::parse_akn_uri;

/// Options for a fetch run, shared by every document in it.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub output_root: PathBuf,
    pub fetch_pdf: bool,
    pub fetch_zip: bool,
    pub fetch_media: bool,
    pub force: bool,
    pub dry_run: bool,
}

impl FetchOptions {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            fetch_pdf: false,
            fetch_zip: false,
            fetch_media: false,
            force: false,
            dry_run: false,
        }
    }
}

/// Final status of one fetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Skipped,
    #[serde(rename = "dry-run")]
    DryRun,
    Error,
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::Skipped => "skipped",
            Self::DryRun => "dry-run",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// Immutable record of one fetch attempt, appended to the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub akn_uri: String,
    pub status: OutcomeStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FetchOutcome {
    fn new(uri: &str, status: OutcomeStatus) -> Self {
        Self {
            akn_uri: uri.to_string(),
            status,
            timestamp: Utc::now(),
            files: Vec::new(),
            error: None,
        }
    }

    fn error(uri: &str, message: String) -> Self {
        log::error!("{message}");
        Self {
            error: Some(message),
            ..Self::new(uri, OutcomeStatus::Error)
        }
    }
}

/// Fetch one document and its requested companions.
///
/// Never fails as a function: every failure mode is folded into the returned
/// outcome so the pipeline can keep going.
pub fn fetch_document<T: Transport>(
    transport: &T,
    uri: &str,
    options: &FetchOptions,
) -> FetchOutcome {
    let Some(doc) = parse_akn_uri(uri) else {
        return FetchOutcome::error(uri, format!("failed to parse URI: {uri}"));
    };

    let doc_dir = options.output_root.join(doc.storage_path());
    let xml_path = doc_dir.join("main.xml");

    // Idempotence gate: an existing primary means zero requests
    if xml_path.exists() && !options.force {
        log::info!("skipping existing: {}", xml_path.display());
        let mut outcome = FetchOutcome::new(uri, OutcomeStatus::Skipped);
        outcome.files.push(xml_path);
        return outcome;
    }

    if options.dry_run {
        log::info!("[dry-run] would download {uri} -> {}", doc_dir.display());
        return FetchOutcome::new(uri, OutcomeStatus::DryRun);
    }

    if let Err(e) = std::fs::create_dir_all(&doc_dir) {
        return FetchOutcome::error(uri, format!("failed to create {}: {e}", doc_dir.display()));
    }

    let api_path = doc.api_path();
    let body = match transport.get(&api_path, &[], Accept::Xml) {
        Ok(response) if response.is_success() => response.body,
        Ok(response) => {
            return FetchOutcome::error(uri, format!("HTTP {} fetching XML", response.status));
        }
        Err(e) => {
            return FetchOutcome::error(uri, format!("failed to fetch XML: {e}"));
        }
    };

    let mut outcome = FetchOutcome::new(uri, OutcomeStatus::Success);
    if let Err(e) = std::fs::write(&xml_path, &body) {
        return FetchOutcome::error(uri, format!("failed to write {}: {e}", xml_path.display()));
    }
    log::info!("downloaded XML: {}", xml_path.display());
    outcome.files.push(xml_path);

    if options.fetch_pdf {
        fetch_companion(
            transport,
            &api_path,
            "main.pdf",
            Accept::Pdf,
            &doc_dir.join("main.pdf"),
            &mut outcome.files,
        );
    }

    if options.fetch_zip {
        fetch_companion(
            transport,
            &api_path,
            "main.akn",
            Accept::Zip,
            &doc_dir.join("main.zip"),
            &mut outcome.files,
        );
    }

    if options.fetch_media {
        fetch_media(transport, &api_path, &body, &doc_dir, &mut outcome.files);
    }

    outcome
}

/// Best-effort companion download. 404 is expected absence; everything else
/// is logged and swallowed.
fn fetch_companion<T: Transport>(
    transport: &T,
    api_path: &str,
    remote_name: &str,
    accept: Accept,
    target: &Path,
    files: &mut Vec<PathBuf>,
) {
    match transport.get(&format!("{api_path}/{remote_name}"), &[], accept) {
        Ok(response) if response.is_success() => match std::fs::write(target, &response.body) {
            Ok(()) => {
                log::info!("downloaded {}", target.display());
                files.push(target.to_path_buf());
            }
            Err(e) => log::warn!("failed to write {}: {e}", target.display()),
        },
        Ok(response) if response.status == 404 => {}
        Ok(response) => log::warn!("{remote_name} fetch returned HTTP {}", response.status),
        Err(e) => log::warn!("failed to fetch {remote_name}: {e}"),
    }
}

fn fetch_media<T: Transport>(
    transport: &T,
    api_path: &str,
    xml: &[u8],
    doc_dir: &Path,
    files: &mut Vec<PathBuf>,
) {
    let links = extract_media_links(xml);
    if links.is_empty() {
        return;
    }

    let media_dir = doc_dir.join("media");
    if let Err(e) = std::fs::create_dir_all(&media_dir) {
        log::warn!("failed to create {}: {e}", media_dir.display());
        return;
    }

    for link in &links {
        let Some(name) = Path::new(link).file_name() else {
            continue;
        };
        let target = media_dir.join(name);
        match transport.get(&format!("{api_path}/{link}"), &[], Accept::Any) {
            Ok(response) if response.is_success() => {
                match std::fs::write(&target, &response.body) {
                    Ok(()) => {
                        log::info!("downloaded media: {}", target.display());
                        files.push(target);
                    }
                    Err(e) => log::warn!("failed to write {}: {e}", target.display()),
                }
            }
            Ok(response) => log::warn!("media {link} returned HTTP {}", response.status),
            Err(e) => log::warn!("failed to fetch media {link}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeTransport;

    const URI: &str = "/akn/fi/act/statute/2024/123/fin@";
    const API: &str = "/akn/fi/act/statute/2024/123/fin@";

    fn options(root: &Path) -> FetchOptions {
        FetchOptions::new(root)
    }

    fn doc_dir(root: &Path) -> PathBuf {
        root.join("act/statute/2024/123/fin@")
    }

    #[test]
    fn success_writes_primary_xml() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        transport.push(API, 200, b"<akomaNtoso/>".to_vec());

        let outcome = fetch_document(&transport, URI, &options(dir.path()));

        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert!(outcome.error.is_none());
        let xml = doc_dir(dir.path()).join("main.xml");
        assert_eq!(outcome.files, vec![xml.clone()]);
        assert_eq!(std::fs::read(xml).unwrap(), b"<akomaNtoso/>");
    }

    #[test]
    fn unparseable_uri_is_error_without_io() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();

        let outcome = fetch_document(&transport, "garbage", &options(dir.path()));

        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert!(outcome.error.unwrap().contains("parse"));
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn existing_file_skips_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        transport.push(API, 200, b"<akomaNtoso/>".to_vec());

        let opts = options(dir.path());
        let first = fetch_document(&transport, URI, &opts);
        assert_eq!(first.status, OutcomeStatus::Success);
        assert_eq!(transport.request_count(), 1);

        let second = fetch_document(&transport, URI, &opts);
        assert_eq!(second.status, OutcomeStatus::Skipped);
        assert_eq!(second.files, first.files);
        // Idempotence: the repeat call costs zero requests
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn force_refetches_existing() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        transport.push(API, 200, b"<v1/>".to_vec());
        transport.push(API, 200, b"<v2/>".to_vec());

        let mut opts = options(dir.path());
        fetch_document(&transport, URI, &opts);
        opts.force = true;
        let outcome = fetch_document(&transport, URI, &opts);

        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(transport.request_count(), 2);
        let xml = doc_dir(dir.path()).join("main.xml");
        assert_eq!(std::fs::read(xml).unwrap(), b"<v2/>");
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();

        let mut opts = options(dir.path());
        opts.dry_run = true;
        let outcome = fetch_document(&transport, URI, &opts);

        assert_eq!(outcome.status, OutcomeStatus::DryRun);
        assert!(outcome.files.is_empty());
        assert_eq!(transport.request_count(), 0);
        assert!(!doc_dir(dir.path()).exists());
    }

    #[test]
    fn dry_run_still_reports_skip_for_existing() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        transport.push(API, 200, b"<akomaNtoso/>".to_vec());

        let mut opts = options(dir.path());
        fetch_document(&transport, URI, &opts);

        // Existence check comes before the dry-run branch
        opts.dry_run = true;
        let outcome = fetch_document(&transport, URI, &opts);
        assert_eq!(outcome.status, OutcomeStatus::Skipped);
    }

    #[test]
    fn primary_http_failure_is_error_with_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        transport.push(API, 500, b"".to_vec());

        let outcome = fetch_document(&transport, URI, &options(dir.path()));

        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert!(outcome.error.unwrap().contains("HTTP 500"));
        assert!(outcome.files.is_empty());
        assert!(!doc_dir(dir.path()).join("main.xml").exists());
    }

    #[test]
    fn primary_transport_failure_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        transport.push_failure(API);

        let outcome = fetch_document(&transport, URI, &options(dir.path()));

        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert!(outcome.error.unwrap().contains("failed to fetch XML"));
    }

    #[test]
    fn pdf_companion_written_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        transport.push(API, 200, b"<akomaNtoso/>".to_vec());
        transport.push(&format!("{API}/main.pdf"), 200, b"%PDF-1.7".to_vec());

        let mut opts = options(dir.path());
        opts.fetch_pdf = true;
        let outcome = fetch_document(&transport, URI, &opts);

        assert_eq!(outcome.status, OutcomeStatus::Success);
        let pdf = doc_dir(dir.path()).join("main.pdf");
        assert!(outcome.files.contains(&pdf));
        assert_eq!(std::fs::read(pdf).unwrap(), b"%PDF-1.7");
    }

    #[test]
    fn companion_404_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        transport.push(API, 200, b"<akomaNtoso/>".to_vec());
        // no canned pdf/zip: FakeTransport serves 404

        let mut opts = options(dir.path());
        opts.fetch_pdf = true;
        opts.fetch_zip = true;
        let outcome = fetch_document(&transport, URI, &opts);

        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.files.len(), 1);
    }

    #[test]
    fn companion_failure_never_downgrades_success() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        transport.push(API, 200, b"<akomaNtoso/>".to_vec());
        transport.push(&format!("{API}/main.pdf"), 503, b"".to_vec());
        transport.push_failure(&format!("{API}/main.akn"));

        let mut opts = options(dir.path());
        opts.fetch_pdf = true;
        opts.fetch_zip = true;
        let outcome = fetch_document(&transport, URI, &opts);

        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn zip_companion_fetched_from_akn_path() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        transport.push(API, 200, b"<akomaNtoso/>".to_vec());
        transport.push(&format!("{API}/main.akn"), 200, b"PK\x03\x04".to_vec());

        let mut opts = options(dir.path());
        opts.fetch_zip = true;
        let outcome = fetch_document(&transport, URI, &opts);

        let zip = doc_dir(dir.path()).join("main.zip");
        assert!(outcome.files.contains(&zip));
        assert_eq!(transport.requests_for(&format!("{API}/main.akn")), 1);
    }

    #[test]
    fn media_fetched_under_media_dir() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        let xml = br#"<doc><img src="media/fig1.gif"/></doc>"#.to_vec();
        transport.push(API, 200, xml);
        transport.push(&format!("{API}/media/fig1.gif"), 200, b"GIF89a".to_vec());

        let mut opts = options(dir.path());
        opts.fetch_media = true;
        let outcome = fetch_document(&transport, URI, &opts);

        assert_eq!(outcome.status, OutcomeStatus::Success);
        let media = doc_dir(dir.path()).join("media/fig1.gif");
        assert!(outcome.files.contains(&media));
        assert_eq!(std::fs::read(media).unwrap(), b"GIF89a");
    }

    #[test]
    fn media_failures_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        let xml = br#"<doc><img src="media/fig1.gif"/></doc>"#.to_vec();
        transport.push(API, 200, xml);
        // media request gets the default 404

        let mut opts = options(dir.path());
        opts.fetch_media = true;
        let outcome = fetch_document(&transport, URI, &opts);

        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(outcome.files.len(), 1);
    }

    #[test]
    fn outcome_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&OutcomeStatus::Success).unwrap(),
            "\"success\""
        );
        assert_eq!(
            serde_json::to_string(&OutcomeStatus::DryRun).unwrap(),
            "\"dry-run\""
        );
        assert_eq!(
            serde_json::to_string(&OutcomeStatus::Skipped).unwrap(),
            "\"skipped\""
        );
        assert_eq!(
            serde_json::to_string(&OutcomeStatus::Error).unwrap(),
            "\"error\""
        );
    }
}
