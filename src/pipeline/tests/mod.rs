use super::test_helpers::{BASE, Deliveries, create_test_pipeline, page_url};
use super::*;
use crate::error::ErrorKind;
use crate::field_path::FieldPath;
use crate::query::Parameter;
use crate::types::Delivery;
use serde_json::json;


const GALLERY: &str = r#"{"photos":{"photo":[{"url_m":"X","title":"T"}]},"stat":"ok"}"#;

fn page(n: u32) -> Vec<Parameter> {
    vec![Parameter::new("page", n)]
}

fn photo_path() -> FieldPath {
    FieldPath::from(["photos", "photo"])
}

#[tokio::test]
async fn single_fetch_delivers_value_once() {
    let (pipeline, transport) = create_test_pipeline(FetchConfig::default());
    transport.reply(&page_url(1), 200, GALLERY);
    let mut deliveries = Deliveries::new();

    let handle = pipeline.fetch(BASE, page(1), photo_path(), deliveries.callback("a"));
    assert_eq!(handle.url(), Some(page_url(1).as_str()));
    assert_eq!(handle.join().await.unwrap(), Delivery::Delivered);

    let results = deliveries.drain();
    assert_eq!(results.len(), 1, "callback must fire exactly once");
    let (label, result) = &results[0];
    assert_eq!(*label, "a");
    assert_eq!(
        result.as_ref().unwrap(),
        &json!([{"url_m": "X", "title": "T"}])
    );
    assert_eq!(transport.calls(), vec![page_url(1)]);
}

#[tokio::test]
async fn tokens_increase_and_last_fetch_is_current() {
    let (pipeline, transport) = create_test_pipeline(FetchConfig::default());
    transport.reply(&page_url(1), 200, GALLERY);
    transport.reply(&page_url(2), 200, GALLERY);
    assert_eq!(pipeline.current_token(), None);

    let a = pipeline.fetch(BASE, page(1), photo_path(), |_| {});
    let b = pipeline.fetch(BASE, page(2), photo_path(), |_| {});

    assert!(b.token() > a.token());
    assert!(!pipeline.is_current(a.token()));
    assert!(pipeline.is_current(b.token()));
    assert_eq!(pipeline.current_token(), Some(b.token()));

    a.join().await.unwrap();
    b.join().await.unwrap();
}

#[tokio::test]
async fn fetch_as_deserializes_into_typed_value() {
    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Photo {
        url_m: String,
        title: String,
    }

    let (pipeline, transport) = create_test_pipeline(FetchConfig::default());
    transport.reply(&page_url(1), 200, GALLERY);
    let (tx, rx) = tokio::sync::oneshot::channel();

    let handle = pipeline.fetch_as::<Photo, _, _>(
        BASE,
        page(1),
        photo_path().index(0),
        move |result| {
            tx.send(result).ok();
        },
    );
    handle.join().await.unwrap();

    let photo = rx.await.unwrap().unwrap();
    assert_eq!(
        photo,
        Photo {
            url_m: "X".into(),
            title: "T".into()
        }
    );
}

#[tokio::test]
async fn fetch_as_reports_shape_mismatch_as_decode_error() {
    let (pipeline, transport) = create_test_pipeline(FetchConfig::default());
    transport.reply(&page_url(1), 200, GALLERY);
    let (tx, rx) = tokio::sync::oneshot::channel();

    pipeline
        .fetch_as::<u64, _, _>(BASE, page(1), ["stat"], move |result| {
            tx.send(result).ok();
        })
        .join()
        .await
        .unwrap();

    let err = rx.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[tokio::test]
async fn random_selection_resolves_an_element() {
    let (pipeline, transport) = create_test_pipeline(FetchConfig::default());
    transport.reply(&page_url(1), 200, GALLERY);
    let mut deliveries = Deliveries::new();

    let path: FieldPath = "photos.photo[?].title".parse().unwrap();
    pipeline
        .fetch(BASE, page(1), path, deliveries.callback("a"))
        .join()
        .await
        .unwrap();

    let results = deliveries.drain();
    assert_eq!(results[0].1.as_ref().unwrap(), &json!("T"));
}

#[tokio::test]
async fn events_trace_the_fetch_lifecycle() {
    let (pipeline, transport) = create_test_pipeline(FetchConfig::default());
    let release_a = transport.reply_gated(&page_url(1), 200, GALLERY);
    transport.reply(&page_url(2), 200, "not json");
    let mut events = pipeline.subscribe();

    let a = pipeline.fetch(BASE, page(1), photo_path(), |_| {});
    let b = pipeline.fetch(BASE, page(2), photo_path(), |_| {});
    assert_eq!(b.join().await.unwrap(), Delivery::Delivered);
    release_a.send(()).unwrap();
    assert_eq!(a.join().await.unwrap(), Delivery::Dropped);

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }

    let (ta, tb) = (seen[0].token(), seen[1].token());
    assert_eq!(
        seen,
        vec![
            Event::Issued {
                token: ta,
                url: Some(page_url(1))
            },
            Event::Issued {
                token: tb,
                url: Some(page_url(2))
            },
            Event::Delivered {
                token: tb,
                error: Some(ErrorKind::Decode)
            },
            Event::Dropped { token: ta },
        ]
    );
}

#[tokio::test]
async fn callback_may_issue_a_new_fetch() {
    let (pipeline, transport) = create_test_pipeline(FetchConfig::default());
    transport.reply(&page_url(1), 503, "");
    transport.reply(&page_url(2), 200, GALLERY);
    let (tx, rx) = tokio::sync::oneshot::channel();

    let retry_pipeline = pipeline.clone();
    pipeline
        .fetch(BASE, page(1), photo_path(), move |first| {
            assert!(first.is_err());
            // re-enable and try the next page, as a UI would
            let handle = retry_pipeline.fetch(BASE, page(2), photo_path(), |_| {});
            tx.send(handle).ok();
        })
        .join()
        .await
        .unwrap();

    let second = rx.await.unwrap();
    assert_eq!(second.join().await.unwrap(), Delivery::Delivered);
    assert_eq!(transport.calls(), vec![page_url(1), page_url(2)]);
}

#[tokio::test]
async fn clones_share_the_latest_request_slot() {
    let (pipeline, transport) = create_test_pipeline(FetchConfig::default());
    let release_a = transport.reply_gated(&page_url(1), 200, GALLERY);
    transport.reply(&page_url(2), 200, GALLERY);
    let mut deliveries = Deliveries::new();

    let other = pipeline.clone();
    let a = pipeline.fetch(BASE, page(1), photo_path(), deliveries.callback("a"));
    let b = other.fetch(BASE, page(2), photo_path(), deliveries.callback("b"));

    b.join().await.unwrap();
    release_a.send(()).unwrap();
    assert_eq!(a.join().await.unwrap(), Delivery::Dropped);

    let labels: Vec<_> = deliveries.drain().into_iter().map(|(l, _)| l).collect();
    assert_eq!(labels, vec!["b"]);
}

#[tokio::test]
async fn fetch_bytes_delivers_raw_body() {
    let (pipeline, transport) = create_test_pipeline(FetchConfig::default());
    transport.reply(&page_url(1), 200, "\u{89}PNG not json");
    let (tx, rx) = tokio::sync::oneshot::channel();

    let handle = pipeline.fetch_bytes(BASE, page(1), move |result| {
        tx.send(result).ok();
    });
    assert_eq!(handle.join().await.unwrap(), Delivery::Delivered);

    let body = rx.await.unwrap().unwrap();
    assert_eq!(body, "\u{89}PNG not json".as_bytes());
}

#[tokio::test]
async fn fetch_bytes_classifies_status_and_empty_body() {
    let (pipeline, transport) = create_test_pipeline(FetchConfig::default());
    transport.reply(&page_url(1), 404, "missing");
    transport.reply(&page_url(2), 200, "");

    for (n, expected) in [(1, ErrorKind::ResponseStatus), (2, ErrorKind::Transport)] {
        let (tx, rx) = tokio::sync::oneshot::channel();
        pipeline
            .fetch_bytes(BASE, page(n), move |result| {
                tx.send(result).ok();
            })
            .join()
            .await
            .unwrap();
        assert_eq!(rx.await.unwrap().unwrap_err().kind(), expected);
    }
}
