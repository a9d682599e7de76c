//! Media reference extraction from Akoma Ntoso XML.
//!
//! Embedded media (scanned images mostly) are referenced relative to the
//! document's API path. Three shapes carry the references: `img/@src`,
//! `href` attributes inside an `attachment` block, and `ref/@href`. Only
//! values under the `media/` prefix are companion files of the document.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rustc_hash::FxHashSet;

const MEDIA_PREFIX: &str = "media/";

/// Collect `media/`-prefixed references from a document body.
///
/// Deduplicated; output order is unspecified. Malformed XML yields an empty
/// collection rather than an error: media are best-effort companions.
pub fn extract_media_links(xml: &[u8]) -> Vec<String> {
    match scan(xml) {
        Ok(links) => links.into_iter().collect(),
        Err(e) => {
            log::warn!("failed to parse XML for media links: {e}");
            Vec::new()
        }
    }
}

fn scan(xml: &[u8]) -> Result<FxHashSet<String>, quick_xml::Error> {
    let mut reader = Reader::from_reader(xml);
    let mut links = FxHashSet::default();
    let mut attachment_depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let is_attachment = local_name(e.name().as_ref()) == b"attachment";
                collect_refs(&e, attachment_depth > 0 || is_attachment, &mut links);
                if is_attachment {
                    attachment_depth += 1;
                }
            }
            Event::Empty(e) => {
                let is_attachment = local_name(e.name().as_ref()) == b"attachment";
                collect_refs(&e, attachment_depth > 0 || is_attachment, &mut links);
            }
            Event::End(e) => {
                if local_name(e.name().as_ref()) == b"attachment" {
                    attachment_depth = attachment_depth.saturating_sub(1);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(links)
}

fn collect_refs(e: &BytesStart, in_attachment: bool, links: &mut FxHashSet<String>) {
    let name = e.name();
    let element = local_name(name.as_ref());
    for attr in e.attributes().flatten() {
        let key = local_name(attr.key.as_ref());
        let wanted = (key == b"src" && element == b"img")
            || (key == b"href" && (element == b"ref" || in_attachment));
        if wanted {
            let value = String::from_utf8_lossy(&attr.value);
            if value.starts_with(MEDIA_PREFIX) {
                links.insert(value.into_owned());
            }
        }
    }
}

/// Element/attribute name without its namespace prefix.
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().rposition(|&b| b == b':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AKN_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<akn:akomaNtoso xmlns:akn="http://docs.oasis-open.org/legaldocml/ns/akn/3.0">
  <akn:act>
    <akn:body>
      <akn:img src="media/fig1.gif"/>
      <akn:img src="media/fig2.gif"/>
      <akn:img src="https://example.com/external.png"/>
      <akn:ref href="media/annex.pdf">annex</akn:ref>
      <akn:ref href="/akn/fi/act/statute/2024/1/fin@">other act</akn:ref>
      <akn:attachments>
        <akn:attachment href="media/attached.xml">
          <akn:documentRef href="media/nested.gif"/>
        </akn:attachment>
      </akn:attachments>
    </akn:body>
  </akn:act>
</akn:akomaNtoso>"#;

    fn sorted(mut links: Vec<String>) -> Vec<String> {
        links.sort();
        links
    }

    #[test]
    fn extracts_all_three_shapes() {
        let links = sorted(extract_media_links(AKN_DOC.as_bytes()));
        assert_eq!(
            links,
            vec![
                "media/annex.pdf",
                "media/attached.xml",
                "media/fig1.gif",
                "media/fig2.gif",
                "media/nested.gif",
            ]
        );
    }

    #[test]
    fn excludes_non_media_prefixed_values() {
        let links = extract_media_links(AKN_DOC.as_bytes());
        assert!(!links.iter().any(|l| l.contains("example.com")));
        assert!(!links.iter().any(|l| l.starts_with("/akn")));
    }

    #[test]
    fn deduplicates() {
        let xml = r#"<doc>
            <img src="media/a.gif"/>
            <img src="media/a.gif"/>
            <ref href="media/a.gif"/>
        </doc>"#;
        assert_eq!(extract_media_links(xml.as_bytes()), vec!["media/a.gif"]);
    }

    #[test]
    fn href_outside_attachment_and_ref_ignored() {
        let xml = r#"<doc><section href="media/a.gif"/></doc>"#;
        assert!(extract_media_links(xml.as_bytes()).is_empty());
    }

    #[test]
    fn attachment_own_href_counts() {
        let xml = r#"<doc><attachments><attachment href="media/own.xml"/></attachments></doc>"#;
        assert_eq!(extract_media_links(xml.as_bytes()), vec!["media/own.xml"]);
    }

    #[test]
    fn malformed_xml_yields_empty() {
        assert!(extract_media_links(b"<doc><img src=\"media/a.gif\"").is_empty());
        assert!(extract_media_links(b"not xml at all <<<").is_empty());
        assert!(extract_media_links(b"<a><b></a></b>").is_empty());
    }

    #[test]
    fn empty_input_yields_empty() {
        assert!(extract_media_links(b"").is_empty());
    }
}
