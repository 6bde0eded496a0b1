use core_events::{Event, InputEvent, KeyCode, KeyEvent, PointerEvent};
use core_lifecycle::{InputSource, ListenerKind};
use core_overlay::{OverlayContent, OverlayControl};
use core_page::WidgetKind;
use core_session::{ManualClock, Phase, SessionSettings};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tapwatch::{HOSTED_PAGE, LoopControl, Runtime, ShutdownReason};
use tokio::sync::mpsc;
use tokio::time::timeout;

struct Host {
    runtime: Runtime<ManualClock>,
    rx: mpsc::Receiver<Event>,
    clock: ManualClock,
}

fn host_with(timeout_ms: u64, load_delay_ms: u64) -> Host {
    let (tx, rx) = mpsc::channel(64);
    let clock = ManualClock::new();
    let settings = SessionSettings {
        timeout: Duration::from_millis(timeout_ms),
        ..SessionSettings::default()
    };
    let runtime = Runtime::new(
        tx,
        clock.clone(),
        settings,
        Duration::from_millis(load_delay_ms),
        (80, 24),
    );
    Host { runtime, rx, clock }
}

fn host() -> Host {
    host_with(2_000, 10)
}

fn key(c: char) -> Event {
    Event::Input(InputEvent::Key(KeyEvent::plain(KeyCode::Char(c))))
}

fn centre(h: &Host, kind: WidgetKind) -> (u16, u16) {
    let page = h.runtime.page().borrow();
    let w = page
        .widgets()
        .iter()
        .find(|w| w.kind == kind)
        .expect("widget present");
    (w.rect.x + 1, w.rect.y + 1)
}

impl Host {
    fn send(&mut self, event: Event) -> LoopControl {
        self.runtime.handle(&event)
    }

    fn press(&mut self, (c, r): (u16, u16)) {
        self.send(Event::Input(InputEvent::Pointer(PointerEvent::press(c, r))));
    }

    fn release(&mut self, (c, r): (u16, u16)) {
        self.send(Event::Input(InputEvent::Pointer(PointerEvent::release(c, r))));
    }

    async fn next(&mut self) -> Event {
        timeout(Duration::from_secs(2), self.rx.recv())
            .await
            .expect("event within deadline")
            .expect("channel open")
    }

    async fn pump_one(&mut self) -> Event {
        let ev = self.next().await;
        self.runtime.handle(&ev);
        ev
    }

    fn results_text(&self) -> String {
        match self.runtime.overlay().map(|e| &e.content) {
            Some(OverlayContent::Results(r)) => r.to_string(),
            other => panic!("expected results overlay, got {other:?}"),
        }
    }

    fn phase(&self) -> Phase {
        self.runtime
            .instrumentation()
            .map(|i| i.controller().phase())
            .unwrap_or(Phase::Idle)
    }

    fn listeners(&self) -> usize {
        let page = self.runtime.page().borrow();
        [
            ListenerKind::Press,
            ListenerKind::Release,
            ListenerKind::PageHide,
            ListenerKind::BeforeUnload,
        ]
        .iter()
        .map(|k| page.listener_count(*k))
        .sum()
    }
}

#[tokio::test]
async fn activation_installs_listeners_and_marks_active() {
    let mut h = host();
    assert!(!h.runtime.shell().is_active(HOSTED_PAGE));
    h.send(key('a'));
    assert!(h.runtime.is_instrumented());
    assert!(h.runtime.shell().is_active(HOSTED_PAGE));
    assert_eq!(h.listeners(), 4);
}

#[tokio::test]
async fn counter_click_resolves_on_release() {
    let mut h = host();
    h.send(key('a'));
    let at = centre(&h, WidgetKind::Counter);
    h.press(at);
    assert_eq!(h.phase(), Phase::Armed);
    h.clock.advance(Duration::from_millis(80));
    h.release(at);
    assert_eq!(h.phase(), Phase::Idle);
    assert_eq!(
        h.results_text(),
        "Mousedown → DOM: 80.0ms  5f / 10f\nMouseup → DOM: 0.0ms  0f / 0f"
    );
    assert_eq!(h.runtime.page().borrow().widgets()[0].count, 1);
}

#[tokio::test]
async fn pointer_events_skip_instrumentation_once_its_listeners_are_gone() {
    let mut h = host();
    h.send(key('a'));
    // navigation inside the page drops every listener without a teardown
    h.runtime.page().borrow_mut().navigate();
    assert_eq!(h.listeners(), 0);
    assert!(h.runtime.is_instrumented());

    let at = centre(&h, WidgetKind::Counter);
    h.press(at);
    assert_eq!(h.phase(), Phase::Idle);
    assert!(h.runtime.overlay().is_none());
    h.release(at);
    assert_eq!(h.phase(), Phase::Idle);
    assert!(h.runtime.overlay().is_none());
    assert_eq!(h.runtime.page().borrow().widgets()[0].count, 1, "page still acts");
}

#[tokio::test]
async fn load_click_resolves_when_the_task_runs() {
    let mut h = host();
    h.send(key('a'));
    let at = centre(&h, WidgetKind::Load);
    h.press(at);
    h.clock.advance(Duration::from_millis(15));
    h.release(at);
    assert_eq!(h.phase(), Phase::Armed, "load is deferred");
    h.clock.advance(Duration::from_millis(100));
    let ev = h.pump_one().await;
    assert!(matches!(ev, Event::PageTask(_)), "got {ev:?}");
    assert_eq!(h.phase(), Phase::Idle);
    assert_eq!(
        h.results_text(),
        "Mousedown → DOM: 115.0ms  7f / 14f\nMouseup → DOM: 100.0ms  6f / 12f"
    );
    assert_eq!(h.runtime.page().borrow().activity(), &["Loaded item #1".to_string()]);
}

#[tokio::test]
async fn inert_press_times_out() {
    let mut h = host_with(30, 10);
    h.send(key('a'));
    let at = centre(&h, WidgetKind::Inert);
    h.press(at);
    h.release(at);
    let ev = h.pump_one().await;
    assert!(matches!(ev, Event::Timeout(_)), "got {ev:?}");
    assert_eq!(h.phase(), Phase::Idle);
    match h.runtime.overlay().map(|e| &e.content) {
        Some(OverlayContent::Notice(text)) => {
            assert_eq!(text, "No DOM change detected within 0.03s")
        }
        other => panic!("expected timeout notice, got {other:?}"),
    }
}

#[tokio::test]
async fn disable_control_tears_down_and_notifies_shell() {
    let mut h = host();
    h.send(key('a'));
    let at = centre(&h, WidgetKind::Counter);
    h.press(at);
    h.release(at);
    let (_, rect) = h
        .runtime
        .overlay()
        .and_then(|e| e.control_rects().find(|(c, _)| *c == OverlayControl::Disable))
        .expect("disable control visible");
    h.press((rect.x, rect.y));
    h.release((rect.x, rect.y));
    assert!(!h.runtime.is_instrumented());
    assert_eq!(h.listeners(), 0);
    assert_eq!(h.runtime.page().borrow().subscriptions(), 0);
    assert_eq!(
        h.runtime.page().borrow().widgets()[0].count,
        1,
        "overlay click never reaches the page"
    );

    assert!(h.runtime.shell().is_active(HOSTED_PAGE), "message still in flight");
    let ev = h.pump_one().await;
    assert!(matches!(ev, Event::ShellMessage { .. }), "got {ev:?}");
    assert!(!h.runtime.shell().is_active(HOSTED_PAGE));
}

#[tokio::test]
async fn reactivation_does_not_duplicate_listeners_or_flip_indicator() {
    let mut h = host();
    h.send(key('a'));
    h.send(key('a'));
    assert_eq!(h.listeners(), 4);
    // the first instance's teardown notice arrives after the second went live
    let ev = h.pump_one().await;
    assert!(matches!(ev, Event::ShellMessage { .. }), "got {ev:?}");
    assert!(h.runtime.shell().is_active(HOSTED_PAGE));
}

#[tokio::test]
async fn reload_tears_down_and_resets_the_page() {
    let mut h = host();
    h.send(key('a'));
    let at = centre(&h, WidgetKind::Counter);
    h.press(at);
    h.release(at);
    h.send(key('r'));
    assert!(!h.runtime.is_instrumented());
    assert!(!h.runtime.shell().is_active(HOSTED_PAGE));
    assert!(h.runtime.overlay().is_none());
    {
        let page = h.runtime.page().borrow();
        assert_eq!(page.generation(), 1);
        assert_eq!(page.widgets()[0].count, 0);
    }
    assert_eq!(h.listeners(), 0);

    h.pump_one().await;
    assert!(!h.runtime.shell().is_active(HOSTED_PAGE));
    h.send(key('a'));
    assert!(h.runtime.shell().is_active(HOSTED_PAGE));
}

#[tokio::test]
async fn quit_dispatches_before_unload() {
    let mut h = host();
    h.send(key('a'));
    let control = h.send(key('q'));
    assert_eq!(
        control,
        LoopControl::Break {
            reason: ShutdownReason::KeyQuit
        }
    );
    assert!(!h.runtime.is_instrumented());
    assert_eq!(h.listeners(), 0);
}

#[tokio::test]
async fn activation_fails_when_the_channel_is_gone() {
    let mut h = host();
    h.rx.close();
    h.send(key('a'));
    assert!(!h.runtime.is_instrumented());
    assert!(!h.runtime.shell().is_active(HOSTED_PAGE));
    assert_eq!(h.runtime.message(), Some("activation failed"));
}

#[tokio::test]
async fn uninstrumented_page_still_works() {
    let mut h = host();
    let at = centre(&h, WidgetKind::Counter);
    h.press(at);
    h.release(at);
    assert_eq!(h.runtime.page().borrow().widgets()[0].count, 1);
    assert!(h.runtime.overlay().is_none());
}

#[tokio::test]
async fn frame_shows_page_overlay_and_status() {
    let mut h = host();
    h.send(key('a'));
    let at = centre(&h, WidgetKind::Counter);
    h.press(at);
    let frame = h.runtime.compose_frame();
    assert_eq!(frame.row_text(0), "  tapwatch demo page");
    let status = frame.row_text(23);
    assert!(status.starts_with("● active │ page#1 load 0"), "{status:?}");
    let overlay_row = h.runtime.overlay().map(|e| e.rect.y).expect("overlay shown");
    assert!(frame.row_text(overlay_row).contains("Mousedown"));

    let mut out = Vec::new();
    h.runtime.render(&mut out).unwrap();
    assert!(!out.is_empty());
    assert_eq!(h.runtime.engine().metrics().snapshot().full_frames, 1);
}
