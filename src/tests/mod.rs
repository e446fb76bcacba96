pub(crate) mod support;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Notify};

use crate::gallery::{Endpoints, PaginationController};
use crate::session::{App, GallerySession, LoadState};
use crate::transport::{self, ReqwestTransport, Request, Transport, TransportError};
use crate::viewer::{self, Control, Options, Viewer};
use support::{ok_body, page_json, record, RecordingPage, RecordingTransport};

const TICK: Duration = Duration::from_millis(2);

fn controller(
    transport: RecordingTransport,
    page: RecordingPage,
) -> PaginationController<RecordingTransport, RecordingPage> {
    PaginationController::new(
        GallerySession::new(App::Turtle),
        Endpoints::new(Url::parse("http://gallery.test/").unwrap()),
        transport,
        page,
    )
}

#[tokio::test]
async fn drive_stops_once_viewport_is_full() {
    let transport = RecordingTransport::scripted(vec![
        ok_body(&page_json(true, Some("c1"), &[record("a"), record("b")])),
        ok_body(&page_json(true, Some("c2"), &[record("c"), record("d")])),
        ok_body(&page_json(true, Some("c3"), &[record("e")])),
    ]);
    let c = controller(transport, RecordingPage::with_rows(3));

    let (c, summary) = viewer::drive(c, TICK, None).await;

    assert_eq!(summary.requests, 2);
    assert_eq!(summary.rendered, 4);
    assert_eq!(summary.state, LoadState::IdleMore);
    assert_eq!(summary.cursor.as_deref(), Some("c2"));
    assert_eq!(c.page().records.len(), 4);
    let sent = c.transport().sent();
    assert_eq!(sent[1].url.query(), Some("app=turtle&cursor=c1"));
}

#[tokio::test]
async fn drive_stops_when_exhausted() {
    let transport = RecordingTransport::scripted(vec![
        ok_body(&page_json(true, Some("c1"), &[record("a")])),
        ok_body(&page_json(false, Some(""), &[record("b")])),
    ]);
    let c = controller(transport, RecordingPage::default());

    let (c, summary) = viewer::drive(c, TICK, None).await;

    assert_eq!(summary.state, LoadState::Exhausted);
    assert_eq!(summary.requests, 2);
    assert_eq!(summary.cursor, None);
    let keys: Vec<_> = c.page().records.iter().map(|r| r.key.clone()).collect();
    assert_eq!(keys, vec!["a", "b"]);
}

#[tokio::test]
async fn drive_stops_after_failure_without_retrying() {
    let transport = RecordingTransport::scripted(vec![Err(TransportError::Status {
        status: 503,
        body: String::new(),
    })]);
    let c = controller(transport, RecordingPage::default());

    let (c, summary) = viewer::drive(c, TICK, None).await;

    assert_eq!(summary.state, LoadState::Exhausted);
    assert_eq!(c.transport().sent().len(), 1);
    assert!(c.page().redirects.is_empty());
}

#[tokio::test]
async fn drive_follows_scrolling_until_exhausted() {
    let transport = RecordingTransport::scripted(vec![
        ok_body(&page_json(true, Some("c1"), &[record("a"), record("b"), record("c")])),
        ok_body(&page_json(false, None, &[record("d")])),
    ]);
    let rendered = Arc::new(Notify::new());
    let page = RecordingPage {
        rendered: Some(rendered.clone()),
        ..RecordingPage::with_rows(2)
    };
    let c = controller(transport, page);
    let (tx, rx) = mpsc::channel(4);

    let scroll = async move {
        // a batch is rendered in one go, so the viewport is full after the first record
        rendered.notified().await;
        tx.send(Control::Scroll(2)).await.unwrap();
        // keep the channel open so the loop stays interactive
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(tx);
    };
    let (c, summary) = tokio::select! {
        done = viewer::drive(c, TICK, Some(rx)) => done,
        _ = scroll => panic!("viewer did not finish"),
    };

    assert_eq!(summary.state, LoadState::Exhausted);
    assert_eq!(c.page().records.len(), 4);
    assert_eq!(c.transport().sent().len(), 2);
}

#[tokio::test]
async fn drive_quits_on_request() {
    let c = controller(RecordingTransport::default(), RecordingPage::default());
    let (tx, rx) = mpsc::channel(1);
    tx.send(Control::Quit).await.unwrap();

    let (c, summary) = viewer::drive(c, TICK, Some(rx)).await;

    // the first request never answered and is simply abandoned
    assert_eq!(summary.state, LoadState::Loading);
    assert_eq!(c.transport().sent().len(), 1);
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(end) = text.find("\r\n\r\n") {
            let content_length = text[..end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

/// Answers one connection per canned response, in order, and returns the
/// raw requests it saw.
async fn serve(responses: Vec<(&'static str, String)>) -> (Url, tokio::task::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            seen.push(read_request(&mut socket).await);
            let reply = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        }
        seen
    });
    (Url::parse(&format!("http://{addr}/")).unwrap(), handle)
}

fn local_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

#[tokio::test]
async fn reqwest_transport_reports_success() {
    let body = page_json(false, None, &[record("a")]);
    let (base, server) = serve(vec![("200 OK", body.clone())]).await;
    let transport = ReqwestTransport::with_client(local_client());

    let url = Endpoints::new(base).view(App::Turtle, None);
    let mut completion = transport.send(Request::get(url));
    let response = transport::settle(&mut completion).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, body);
    let seen = server.await.unwrap();
    assert!(seen[0].starts_with("GET /gallery-api/view?app=turtle HTTP/1.1"));
}

#[tokio::test]
async fn reqwest_transport_reports_unauthorized() {
    let (base, server) = serve(vec![("401 Unauthorized", String::new())]).await;
    let transport = ReqwestTransport::with_client(local_client());

    let mut completion = transport.send(Request::get(Endpoints::new(base).view(App::Admin, None)));
    let err = transport::settle(&mut completion).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    server.await.unwrap();
}

#[tokio::test]
async fn reqwest_transport_reports_connection_errors() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let transport = ReqwestTransport::with_client(local_client());

    let url = Url::parse(&format!("http://{addr}/gallery-api/view?app=music")).unwrap();
    let mut completion = transport.send(Request::get(url));
    let err = transport::settle(&mut completion).await.unwrap_err();

    assert!(matches!(err, TransportError::Network { .. }));
}

#[tokio::test]
async fn viewer_pages_through_a_live_server() {
    let (base, server) = serve(vec![
        (
            "200 OK",
            page_json(true, Some("next/1"), &[record("a"), record("b")]),
        ),
        ("200 OK", page_json(false, Some("done"), &[record("c")])),
    ])
    .await;
    let viewer = Viewer::new(Options {
        base_url: base.to_string(),
        app: "turtle".to_string(),
        poll_interval: TICK,
        ..Options::default()
    })
    .unwrap();

    let (page, summary) = viewer.run(RecordingPage::default(), None).await.unwrap();

    assert_eq!(summary.state, LoadState::Exhausted);
    assert_eq!(summary.requests, 2);
    assert_eq!(summary.cursor.as_deref(), Some("done"));
    assert_eq!(page.records.len(), 3);
    let seen = server.await.unwrap();
    assert!(seen[1].starts_with("GET /gallery-api/view?app=turtle&cursor=next%2F1 HTTP/1.1"));
}

#[tokio::test]
async fn viewer_redirects_on_unauthorized() {
    let (base, server) = serve(vec![("401 Unauthorized", String::new())]).await;
    let viewer = Viewer::new(Options {
        base_url: base.to_string(),
        app: "admin".to_string(),
        poll_interval: TICK,
        ..Options::default()
    })
    .unwrap();

    let (page, summary) = viewer.run(RecordingPage::default(), None).await.unwrap();

    assert_eq!(summary.state, LoadState::Exhausted);
    assert_eq!(summary.requests, 1);
    assert!(summary.redirected);
    assert_eq!(page.redirects, vec![format!("{base}admin")]);
    server.await.unwrap();
}

#[tokio::test]
async fn set_published_posts_form_body() {
    let (base, server) = serve(vec![("200 OK", String::new())]).await;
    let viewer = Viewer::new(Options {
        base_url: base.to_string(),
        app: "admin".to_string(),
        ..Options::default()
    })
    .unwrap();

    viewer
        .set_published(&[crate::gallery::ToggleEvent::new("abc123", true)])
        .await;

    let seen = server.await.unwrap();
    assert_eq!(seen.len(), 1);
    let request = &seen[0];
    assert!(request.starts_with("POST /gallery-api/admin HTTP/1.1"));
    assert!(request
        .to_ascii_lowercase()
        .contains("content-type: application/x-www-form-urlencoded"));
    assert!(request.ends_with("key=abc123&public=1"));
}
