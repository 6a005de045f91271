use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use svckit::clock::ManualClock;
use svckit::sink::{Connector, ResilientSink};

use tracing_util::TestTracing;

/// Transport fake whose reachability and write behavior flip at will.
#[derive(Default)]
struct FlakyTransport {
    reachable: AtomicBool,
    fail_writes: AtomicBool,
    opens: AtomicUsize,
    delivered: Mutex<Vec<Vec<u8>>>,
}

impl FlakyTransport {
    fn new(reachable: bool) -> Arc<Self> {
        let transport = Arc::new(Self::default());
        transport.reachable.store(reachable, Ordering::SeqCst);
        transport
    }

    fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    fn delivered(&self) -> Vec<Vec<u8>> {
        self.delivered.lock().unwrap().clone()
    }
}

struct FlakyConnector {
    transport: Arc<FlakyTransport>,
}

impl Connector for FlakyConnector {
    fn open(&self) -> io::Result<Box<dyn Write + Send>> {
        self.transport.opens.fetch_add(1, Ordering::SeqCst);
        if self.transport.reachable.load(Ordering::SeqCst) {
            Ok(Box::new(FlakyStream {
                transport: Arc::clone(&self.transport),
            }))
        } else {
            Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "transport down",
            ))
        }
    }

    fn description(&self) -> String {
        "flaky [test]".to_string()
    }
}

struct FlakyStream {
    transport: Arc<FlakyTransport>,
}

impl Write for FlakyStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.transport.fail_writes.load(Ordering::SeqCst) {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away"))
        } else {
            self.transport.delivered.lock().unwrap().push(buf.to_vec());
            Ok(buf.len())
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

const INTERVAL: Duration = Duration::from_secs(5);

fn sink_over(transport: &Arc<FlakyTransport>, clock: &Arc<ManualClock>) -> ResilientSink {
    ResilientSink::new(
        Box::new(FlakyConnector {
            transport: Arc::clone(transport),
        }),
        INTERVAL,
        Arc::clone(clock) as Arc<dyn svckit::clock::Clock>,
    )
    .expect("transport starts reachable")
}

#[test]
fn failed_write_does_not_surface_an_error() {
    let _tracing = TestTracing::init();
    let transport = FlakyTransport::new(true);
    let clock = Arc::new(ManualClock::new());
    let sink = sink_over(&transport, &clock);

    transport.fail_writes.store(true, Ordering::SeqCst);
    // The no-throw contract: this is a plain call, nothing to unwrap.
    sink.write(b"lost record\n");
    assert_eq!(sink.failures(), 1);
    assert_eq!(sink.dropped(), 1);
    assert!(!sink.is_presumed_clean());
}

#[test]
fn no_reopen_before_the_recovery_interval() {
    let _tracing = TestTracing::init();
    let transport = FlakyTransport::new(true);
    let clock = Arc::new(ManualClock::new());
    let sink = sink_over(&transport, &clock);
    assert_eq!(transport.opens(), 1);

    // Break the transport and lose one record.
    transport.fail_writes.store(true, Ordering::SeqCst);
    sink.write(b"boom\n");
    assert!(!sink.is_presumed_clean());

    // Transport is immediately healthy again, but the sink must wait out
    // the interval before reopening.
    transport.fail_writes.store(false, Ordering::SeqCst);
    sink.write(b"too early 1\n");
    sink.write(b"too early 2\n");
    assert_eq!(transport.opens(), 1);
    assert_eq!(sink.dropped(), 3);

    clock.advance(INTERVAL - Duration::from_millis(1));
    sink.write(b"still too early\n");
    assert_eq!(transport.opens(), 1);

    clock.advance(Duration::from_millis(1));
    sink.write(b"back in business\n");
    assert_eq!(transport.opens(), 2);
    assert!(sink.is_presumed_clean());
    assert_eq!(transport.delivered().last().unwrap(), b"back in business\n");

    // Clean again: subsequent writes reuse the stream, no more opens.
    sink.write(b"steady\n");
    assert_eq!(transport.opens(), 2);
}

#[test]
fn failed_reopen_waits_another_interval() {
    let _tracing = TestTracing::init();
    let transport = FlakyTransport::new(true);
    let clock = Arc::new(ManualClock::new());
    let sink = sink_over(&transport, &clock);

    transport.fail_writes.store(true, Ordering::SeqCst);
    transport.reachable.store(false, Ordering::SeqCst);
    sink.write(b"boom\n");

    clock.advance(INTERVAL);
    sink.write(b"reopen fails\n");
    assert_eq!(transport.opens(), 2);

    // Next write inside the fresh interval must not retry the open.
    sink.write(b"patience\n");
    assert_eq!(transport.opens(), 2);

    transport.reachable.store(true, Ordering::SeqCst);
    transport.fail_writes.store(false, Ordering::SeqCst);
    clock.advance(INTERVAL);
    sink.write(b"recovered\n");
    assert_eq!(transport.opens(), 3);
    assert_eq!(transport.delivered().last().unwrap(), b"recovered\n");
}

#[test]
fn recovery_resets_the_failure_streak() {
    let _tracing = TestTracing::init();
    let transport = FlakyTransport::new(true);
    let clock = Arc::new(ManualClock::new());
    let sink = sink_over(&transport, &clock);

    transport.fail_writes.store(true, Ordering::SeqCst);
    sink.write(b"boom\n");
    assert_eq!(sink.failures(), 1);

    // Failed reopens keep the streak growing.
    transport.reachable.store(false, Ordering::SeqCst);
    clock.advance(INTERVAL);
    sink.write(b"reopen fails\n");
    assert_eq!(sink.failures(), 2);

    transport.reachable.store(true, Ordering::SeqCst);
    transport.fail_writes.store(false, Ordering::SeqCst);
    clock.advance(INTERVAL);
    sink.write(b"back\n");
    assert!(sink.is_presumed_clean());
    assert_eq!(sink.failures(), 0);

    // A later outage starts a fresh streak.
    transport.fail_writes.store(true, Ordering::SeqCst);
    sink.write(b"boom again\n");
    assert_eq!(sink.failures(), 1);
}

#[test]
fn eager_construction_fails_on_dead_transport() {
    let _tracing = TestTracing::init();
    let transport = FlakyTransport::new(false);
    let clock: Arc<dyn svckit::clock::Clock> = Arc::new(ManualClock::new());
    let result = ResilientSink::new(
        Box::new(FlakyConnector {
            transport: Arc::clone(&transport),
        }),
        INTERVAL,
        clock,
    );
    assert!(result.is_err());
}

#[test]
fn lazy_sink_opens_on_first_write() {
    let _tracing = TestTracing::init();
    let transport = FlakyTransport::new(true);
    let clock = Arc::new(ManualClock::new());
    let sink = ResilientSink::new_lazy(
        Box::new(FlakyConnector {
            transport: Arc::clone(&transport),
        }),
        INTERVAL,
        Arc::clone(&clock) as Arc<dyn svckit::clock::Clock>,
    );
    assert_eq!(transport.opens(), 0);
    sink.write(b"first\n");
    assert_eq!(transport.opens(), 1);
    assert_eq!(transport.delivered(), vec![b"first\n".to_vec()]);
    assert!(sink.is_presumed_clean());
}

#[test]
fn close_is_unconditional_and_tolerant() {
    let _tracing = TestTracing::init();
    let transport = FlakyTransport::new(true);
    let clock = Arc::new(ManualClock::new());
    let sink = sink_over(&transport, &clock);

    sink.close();
    sink.close(); // already closed: still fine
    let dropped_before = sink.dropped();
    sink.write(b"after close\n");
    assert_eq!(sink.dropped(), dropped_before + 1);
    // No reopen ever happens on a closed sink.
    clock.advance(INTERVAL * 2);
    sink.write(b"still closed\n");
    assert_eq!(transport.opens(), 1);
}

#[test]
fn concurrent_writers_never_block_or_panic() {
    let _tracing = TestTracing::init();
    let transport = FlakyTransport::new(true);
    let clock = Arc::new(ManualClock::new());
    let sink = Arc::new(sink_over(&transport, &clock));

    let mut handles = Vec::new();
    for t in 0..4 {
        let sink = Arc::clone(&sink);
        handles.push(std::thread::spawn(move || {
            for i in 0..250 {
                sink.write(format!("t{t} record {i}\n").as_bytes());
            }
        }));
    }
    for handle in handles {
        handle.join().expect("writer thread panicked");
    }
    // Every record was either delivered or counted as dropped.
    let delivered = transport.delivered().len() as u64;
    assert_eq!(delivered + sink.dropped(), 1000);
}
