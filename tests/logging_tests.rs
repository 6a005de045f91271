use std::net::UdpSocket;
use std::sync::Arc;
use std::time::Duration;

use svckit::clock::SystemClock;
use svckit::logging::fmt_layer;
use svckit::sink::{ResilientSink, UdpConnector};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;

#[test]
fn tracing_events_ship_through_a_udp_sink() {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("bind receiver");
    socket
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("set read timeout");
    let port = socket.local_addr().expect("local addr").port();

    let sink = Arc::new(
        ResilientSink::new(
            Box::new(UdpConnector::new("127.0.0.1", port)),
            Duration::from_secs(1),
            Arc::new(SystemClock),
        )
        .expect("udp open is local"),
    );

    let subscriber = tracing_subscriber::registry().with(fmt_layer(Arc::clone(&sink)));
    {
        let _guard = tracing::subscriber::set_default(subscriber);
        info!(order_id = 42, "order accepted");
        info!("order shipped");
    }

    let mut buf = [0u8; 2048];
    let n = socket.recv(&mut buf).expect("first event datagram");
    let first = String::from_utf8_lossy(&buf[..n]).to_string();
    assert!(first.contains("order accepted"), "got: {first}");
    assert!(first.contains("order_id=42"), "got: {first}");

    let n = socket.recv(&mut buf).expect("second event datagram");
    let second = String::from_utf8_lossy(&buf[..n]).to_string();
    assert!(second.contains("order shipped"), "got: {second}");

    assert_eq!(sink.failures(), 0);
    assert_eq!(sink.dropped(), 0);
}
