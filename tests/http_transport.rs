use network_telemetry_client::{
    ActivityPoller, HttpTransport, PollOutcome, ScanCoordinator, ScanOutcome, TelemetryConfig,
    TelemetryError, TelemetryTransport,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

struct Canned {
    status: u16,
    body: &'static str,
}

fn ok(body: &'static str) -> Canned {
    Canned { status: 200, body }
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Answers one connection per canned response, in order, and returns the
/// request lines it saw.
async fn serve(responses: Vec<Canned>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        for canned in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            seen.push(request.lines().next().unwrap_or_default().to_string());

            let reason = if canned.status == 200 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                canned.status,
                reason,
                canned.body.len(),
                canned.body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
        }
        seen
    });

    (base_url, handle)
}

fn transport(base_url: &str) -> Arc<dyn TelemetryTransport> {
    let config = TelemetryConfig::new(base_url).unwrap();
    Arc::new(HttpTransport::new(config).unwrap())
}

#[tokio::test]
async fn scan_decodes_devices_and_drops_malformed_entries() {
    let (base_url, server) = serve(vec![ok(r#"[
        {"ip":"10.0.0.2","mac":"AA:BB","vendor":"Acme","connected":true},
        {"vendor":"no ip"},
        {"ip":"10.0.0.3","mac":null,"vendor":null,"connected":false}
    ]"#)])
    .await;
    let scanner = ScanCoordinator::new(transport(&base_url));

    let outcome = scanner.start_scan().await;
    assert!(matches!(outcome, ScanOutcome::Completed { devices: 2, dropped: 1 }));

    let devices = scanner.devices();
    assert_eq!(devices[0].ip, "10.0.0.2");
    assert_eq!(devices[1].key().to_string(), "ip:10.0.0.3");
    assert!(!scanner.is_scanning());

    let requests = server.await.unwrap();
    assert_eq!(requests, vec!["GET /api/devices HTTP/1.1"]);
}

#[tokio::test]
async fn failed_scan_keeps_single_device() {
    let (base_url, server) = serve(vec![
        ok(r#"[{"ip":"10.0.0.2","mac":"AA:BB","vendor":null,"connected":true}]"#),
        Canned {
            status: 500,
            body: r#"{"error":"scanner offline"}"#,
        },
        ok(r#"{"not":"a list"}"#),
    ])
    .await;
    let scanner = ScanCoordinator::new(transport(&base_url));

    assert!(matches!(
        scanner.start_scan().await,
        ScanOutcome::Completed { devices: 1, .. }
    ));
    let before = scanner.devices();

    match scanner.start_scan().await {
        ScanOutcome::Failed(e) => assert_eq!(e.kind(), "protocol"),
        other => panic!("expected protocol failure, got {:?}", other),
    }
    match scanner.start_scan().await {
        ScanOutcome::Failed(e) => assert_eq!(e.kind(), "decode"),
        other => panic!("expected decode failure, got {:?}", other),
    }

    assert_eq!(scanner.devices(), before);
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].mac.as_deref(), Some("AA:BB"));
    assert!(!scanner.is_scanning());
    server.await.unwrap();
}

#[tokio::test]
async fn polls_accumulate_download_speed_average() {
    let (base_url, server) = serve(vec![
        ok(r#"{"latency":10.5,"packet_loss":0,"download_speed":10,"upload_speed":5}"#),
        ok(r#"{"latency":11.0,"packet_loss":0,"download_speed":20,"upload_speed":5}"#),
        ok(r#"{"latency":12.0,"packet_loss":1.5,"download_speed":30,"upload_speed":6}"#),
        ok(r#"{"latency":13.0,"packet_loss":0,"upload_speed":6}"#),
        ok("not json"),
    ])
    .await;
    let poller = ActivityPoller::new(transport(&base_url));

    for _ in 0..3 {
        assert!(matches!(
            poller.poll_activity().await,
            PollOutcome::Completed { recorded_speed: true }
        ));
    }
    assert_eq!(poller.average_download_speed(), 20.0);

    assert!(matches!(
        poller.poll_activity().await,
        PollOutcome::Completed { recorded_speed: false }
    ));
    assert_eq!(poller.average_download_speed(), 20.0);
    let before = poller.snapshot();
    assert_eq!(before.last_sample.as_ref().map(|s| s.latency), Some(13.0));

    assert!(matches!(
        poller.poll_activity().await,
        PollOutcome::Failed(TelemetryError::Decode(_))
    ));
    let after = poller.snapshot();
    assert_eq!(after.last_sample, before.last_sample);
    assert_eq!(after.history.samples(), &[10.0, 20.0, 30.0]);
    assert!(!after.polling);

    let requests = server.await.unwrap();
    assert!(requests.iter().all(|line| line == "GET /api/ping HTTP/1.1"));
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let scanner = ScanCoordinator::new(transport(&base_url));
    match scanner.start_scan().await {
        ScanOutcome::Failed(e) => assert_eq!(e.kind(), "transport"),
        other => panic!("expected transport failure, got {:?}", other),
    }
    assert!(!scanner.is_scanning());
    assert!(scanner.devices().is_empty());
}

#[tokio::test]
async fn configured_deadline_surfaces_as_timed_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let stall = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        read_request(&mut stream).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let config = TelemetryConfig::new(&base_url)
        .unwrap()
        .with_timeout(Duration::from_millis(200));
    let poller = ActivityPoller::new(Arc::new(HttpTransport::new(config).unwrap()));

    match poller.poll_activity().await {
        PollOutcome::Failed(TelemetryError::TimedOut(deadline)) => {
            assert_eq!(deadline, Duration::from_millis(200))
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(!poller.is_polling());
    assert!(poller.last_sample().is_none());
    stall.abort();
}
