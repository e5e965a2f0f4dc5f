// Merge ordering and degradation behavior of the report merger.

#[path = "../common/fakes.rs"]
mod fakes;

use std::sync::Arc;

use lopdf::Document;

use fakes::{make_pdf, FakeDocumentFetcher, FakeDocumentStore};
use medibill::modules::reports::services::{
    merge_documents, AttachmentLocation, ReportMerger,
};

/// Text markers of each page of a merged document, in page order
fn page_markers(bytes: &[u8]) -> Vec<String> {
    let mut doc = Document::load_mem(bytes).expect("merged output parses");
    doc.decompress();

    doc.get_pages()
        .into_iter()
        .map(|(_, page_id)| {
            let content = doc.get_page_content(page_id).expect("page has content");
            String::from_utf8_lossy(&content).to_string()
        })
        .collect()
}

fn merger(fetcher: Arc<FakeDocumentFetcher>) -> ReportMerger {
    ReportMerger::new(fetcher, Arc::new(FakeDocumentStore))
}

#[tokio::test]
async fn test_failed_middle_fetch_is_omitted_in_order() {
    let fetcher = Arc::new(FakeDocumentFetcher::new());
    fetcher.serve("https://labs.test/doc1", make_pdf("LABDOC1"));
    // doc2 is never served; its fetch fails
    fetcher.serve("https://labs.test/doc3", make_pdf("LABDOC3"));

    let locations = vec![
        AttachmentLocation::Url("https://labs.test/doc1".to_string()),
        AttachmentLocation::Url("https://labs.test/doc2".to_string()),
        AttachmentLocation::Url("https://labs.test/doc3".to_string()),
    ];

    let merged = merger(fetcher)
        .merge(make_pdf("PRIMARY"), &locations)
        .await
        .expect("merge succeeds despite one failed fetch");

    let markers = page_markers(&merged);
    assert_eq!(markers.len(), 3);
    assert!(markers[0].contains("PRIMARY"));
    assert!(markers[1].contains("LABDOC1"));
    assert!(markers[2].contains("LABDOC3"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_page_order_follows_list_not_completion() {
    let fetcher = Arc::new(FakeDocumentFetcher::new());
    fetcher.serve("https://labs.test/slow", make_pdf("SLOWDOC"));
    fetcher.serve("https://labs.test/fast", make_pdf("FASTDOC"));
    // The first listed document completes last
    fetcher.delay("https://labs.test/slow", 80);

    let locations = vec![
        AttachmentLocation::Url("https://labs.test/slow".to_string()),
        AttachmentLocation::Url("https://labs.test/fast".to_string()),
    ];

    let merged = merger(fetcher)
        .merge(make_pdf("PRIMARY"), &locations)
        .await
        .unwrap();

    let markers = page_markers(&merged);
    assert_eq!(markers.len(), 3);
    assert!(markers[1].contains("SLOWDOC"));
    assert!(markers[2].contains("FASTDOC"));
}

#[tokio::test]
async fn test_all_fetches_failing_degrades_to_primary_only() {
    let fetcher = Arc::new(FakeDocumentFetcher::new());
    let primary = make_pdf("PRIMARY");

    let locations = vec![
        AttachmentLocation::Url("https://labs.test/missing1".to_string()),
        AttachmentLocation::Url("https://labs.test/missing2".to_string()),
    ];

    let merged = merger(fetcher).merge(primary.clone(), &locations).await.unwrap();
    assert_eq!(merged, primary);
}

#[tokio::test]
async fn test_storage_keys_resolve_through_the_store() {
    let fetcher = Arc::new(FakeDocumentFetcher::new());
    fetcher.serve("https://store.test/lab-reports/42.pdf", make_pdf("STORED"));

    let locations = vec![AttachmentLocation::StorageKey(
        "lab-reports/42.pdf".to_string(),
    )];

    let merged = merger(fetcher)
        .merge(make_pdf("PRIMARY"), &locations)
        .await
        .unwrap();

    let markers = page_markers(&merged);
    assert_eq!(markers.len(), 2);
    assert!(markers[1].contains("STORED"));
}

#[tokio::test]
async fn test_empty_location_list_returns_primary_unchanged() {
    let fetcher = Arc::new(FakeDocumentFetcher::new());
    let primary = make_pdf("PRIMARY");

    let merged = merger(fetcher).merge(primary.clone(), &[]).await.unwrap();
    assert_eq!(merged, primary);
}

#[test]
fn test_broken_primary_is_fatal() {
    let result = merge_documents(b"not a pdf", vec![make_pdf("DOC")]);
    assert!(result.is_err());
}

#[test]
fn test_unparseable_attachment_is_skipped() {
    let primary = make_pdf("PRIMARY");
    let merged = merge_documents(&primary, vec![b"garbage".to_vec(), make_pdf("GOOD")])
        .expect("merge tolerates a broken attachment");

    let markers = page_markers(&merged);
    assert_eq!(markers.len(), 2);
    assert!(markers[0].contains("PRIMARY"));
    assert!(markers[1].contains("GOOD"));
}
