use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use cardbridge_protocol::MessageKind;
use cardbridge_transport::{
    AsyncTransport, FileTransport, IoOutcome, Transport, TransportMode,
};

fn drain_until(transport: &mut AsyncTransport, expected: usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut completed = 0;
    while completed < expected {
        assert!(Instant::now() < deadline, "worker did not complete in time");
        completed += transport.poll();
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn run_round_trip(mode: TransportMode) -> Vec<IoOutcome> {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = FileTransport::new(dir.path()).expect("open mailbox");
    let mut transport = AsyncTransport::new(Box::new(file), mode);

    let outcomes: Rc<RefCell<Vec<IoOutcome>>> = Rc::new(RefCell::new(Vec::new()));
    let record = |sink: &Rc<RefCell<Vec<IoOutcome>>>| {
        let sink = Rc::clone(sink);
        move |outcome| sink.borrow_mut().push(outcome)
    };

    transport.probe_availability(record(&outcomes));
    transport.write_message(
        MessageKind::GameState,
        r#"{"sequence_id": 1}"#.to_string(),
        record(&outcomes),
    );
    transport.read_message(MessageKind::GameState, record(&outcomes));
    transport.read_message(MessageKind::DeckState, record(&outcomes));

    if mode == TransportMode::Threaded {
        drain_until(&mut transport, 4);
    }
    assert_eq!(transport.pending_requests(), 0);
    Rc::try_unwrap(outcomes)
        .expect("all callbacks retired")
        .into_inner()
}

#[test]
fn threaded_and_inline_modes_agree() {
    let inline = run_round_trip(TransportMode::Inline);
    let threaded = run_round_trip(TransportMode::Threaded);
    assert_eq!(inline, threaded);
    assert_eq!(
        inline,
        vec![
            IoOutcome::Available(true),
            IoOutcome::Written(true),
            IoOutcome::ReadData(Some(r#"{"sequence_id": 1}"#.to_string())),
            IoOutcome::ReadData(None),
        ]
    );
}

#[test]
fn inline_callbacks_fire_before_the_call_returns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = FileTransport::new(dir.path()).expect("open mailbox");
    let mut transport = AsyncTransport::new(Box::new(file), TransportMode::Inline);

    let fired = Rc::new(RefCell::new(false));
    let flag = Rc::clone(&fired);
    transport.write_message(MessageKind::GameState, "{}".to_string(), move |_| {
        *flag.borrow_mut() = true;
    });
    assert!(*fired.borrow());
    assert_eq!(transport.poll(), 0);
}

#[test]
fn threaded_mode_serializes_operations_in_submission_order() {
    // A read queued after a write to the same kind must observe that write.
    let dir = tempfile::tempdir().expect("tempdir");
    let file = FileTransport::new(dir.path()).expect("open mailbox");
    let mut transport = AsyncTransport::new(Box::new(file), TransportMode::Threaded);
    assert_eq!(transport.mode(), TransportMode::Threaded);

    let seen: Rc<RefCell<Option<IoOutcome>>> = Rc::new(RefCell::new(None));
    transport.write_message(
        MessageKind::DeckState,
        r#"{"sequence_id": 1}"#.to_string(),
        |_| {},
    );
    transport.write_message(
        MessageKind::DeckState,
        r#"{"sequence_id": 2}"#.to_string(),
        |_| {},
    );
    let sink = Rc::clone(&seen);
    transport.read_message(MessageKind::DeckState, move |outcome| {
        *sink.borrow_mut() = Some(outcome);
    });

    drain_until(&mut transport, 3);
    assert_eq!(
        seen.borrow().clone(),
        Some(IoOutcome::ReadData(Some(r#"{"sequence_id": 2}"#.to_string())))
    );
}

#[test]
fn slow_medium_reports_are_queued_not_lost() {
    struct CountingTransport {
        probes: u32,
    }
    impl Transport for CountingTransport {
        fn name(&self) -> &'static str {
            "counting"
        }
        fn is_available(&self) -> bool {
            true
        }
        fn write_message(&mut self, _kind: MessageKind, _payload: &str) -> bool {
            true
        }
        fn read_message(&mut self, _kind: MessageKind) -> Option<String> {
            self.probes += 1;
            Some(format!("probe {}", self.probes))
        }
    }

    let mut transport = AsyncTransport::new(
        Box::new(CountingTransport { probes: 0 }),
        TransportMode::Threaded,
    );

    let payloads: Rc<RefCell<Vec<Option<String>>>> = Rc::new(RefCell::new(Vec::new()));
    for _ in 0..3 {
        let sink = Rc::clone(&payloads);
        transport.read_message(MessageKind::Actions, move |outcome| {
            if let IoOutcome::ReadData(payload) = outcome {
                sink.borrow_mut().push(payload);
            }
        });
    }
    drain_until(&mut transport, 3);
    assert_eq!(
        payloads.borrow().clone(),
        vec![
            Some("probe 1".to_string()),
            Some("probe 2".to_string()),
            Some("probe 3".to_string()),
        ]
    );
}
