mod common;

use common::{chat_page, session_with, trigger_of, MockReply, RecordingService};
use optimo::document::MutationRecord;
use optimo::{
    CoordinatorState, ElementSpec, HostDocument, OptionSet, PageEvent, SurfaceState, Tier,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

#[tokio::test(start_paused = true)]
async fn run_drives_events_timers_and_replies() {
    let page = chat_page("summarize this thread");
    let service = RecordingService::new(MockReply::Success("Summarize the thread in 3 bullets.".into()));
    let (mut session, _source) = session_with(page.doc, service.clone(), Tier::Standard);
    session.start();

    let trigger = trigger_of(&session, page.composer);
    let late = session
        .document_mut()
        .append(page.wrapper, ElementSpec::textarea().placeholder("Type a reply"))
        .unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(PageEvent::Mutation(MutationRecord::added(vec![late])))
        .unwrap();
    tx.send(PageEvent::Click { target: trigger }).unwrap();
    tx.send(PageEvent::Submit {
        options: OptionSet::default(),
    })
    .unwrap();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(tx);
    });

    session.run(rx).await;

    assert_eq!(service.calls(), 1);
    assert_eq!(
        session.document().value(page.composer).as_deref(),
        Some("Summarize the thread in 3 bullets.")
    );
    assert_eq!(session.coordinator_state(), CoordinatorState::Idle);
    assert!(session.panel().is_none());
    assert_eq!(session.surface_state(late), SurfaceState::Attached);
    assert!(!session.rescan_pending());
}

#[tokio::test(start_paused = true)]
async fn run_rejects_second_submit_while_reply_is_outstanding() {
    let page = chat_page("draft");
    let gate = Arc::new(Notify::new());
    let service = RecordingService::gated(MockReply::Success("final".into()), gate.clone());
    let (mut session, _source) = session_with(page.doc, service.clone(), Tier::Standard);
    session.start();
    session.open_panel(page.composer).unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(PageEvent::Submit {
        options: OptionSet::default(),
    })
    .unwrap();

    let feeder = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(PageEvent::Submit {
            options: OptionSet::new().with_tone("Friendly"),
        })
        .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        gate.notify_one();
        drop(tx);
    });

    session.run(rx).await;
    feeder.await.unwrap();

    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].options.tone, "Professional");
    assert_eq!(
        session.document().value(page.composer).as_deref(),
        Some("final")
    );
    assert_eq!(session.coordinator_state(), CoordinatorState::Idle);
}

#[tokio::test(start_paused = true)]
async fn run_expires_notices() {
    let page = chat_page("   ");
    let (mut session, _source) =
        session_with(page.doc, RecordingService::new(MockReply::Success("X".into())), Tier::Standard);
    session.start();
    session.open_panel(page.composer).unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(PageEvent::Submit {
        options: OptionSet::default(),
    })
    .unwrap();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(tx);
    });

    session.run(rx).await;
    assert!(session.notice().is_none());
    assert!(session
        .document()
        .controls(optimo::document::ControlKind::Notice)
        .is_empty());
}

#[tokio::test]
async fn run_returns_when_events_close() {
    let page = chat_page("hello");
    let (mut session, source) =
        session_with(page.doc, RecordingService::new(MockReply::Success("X".into())), Tier::Standard);
    session.start();

    let (tx, rx) = mpsc::unbounded_channel::<PageEvent>();
    drop(tx);
    drop(source);
    session.run(rx).await;
    assert!(session.document().contains(page.composer));
}
