use core_events::{Event, InputEvent, KeyCode, ModMask, MouseButton, PointerKind};
use core_input::translate;
use crossterm::event::{
    Event as CEvent, KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyModifiers as CMods,
    MouseButton as CButton, MouseEvent, MouseEventKind,
};

fn mouse(kind: MouseEventKind, modifiers: CMods) -> CEvent {
    CEvent::Mouse(MouseEvent {
        kind,
        column: 12,
        row: 3,
        modifiers,
    })
}

#[test]
fn right_button_press_keeps_button_and_mods() {
    let ev = translate(mouse(MouseEventKind::Down(CButton::Right), CMods::CONTROL));
    match ev {
        Some(Event::Input(InputEvent::Pointer(p))) => {
            assert_eq!(p.kind, PointerKind::Press);
            assert_eq!(p.button, MouseButton::Right);
            assert_eq!(p.mods, ModMask::CTRL);
            assert_eq!(p.position(), (12, 3));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn motion_is_not_forwarded() {
    assert!(translate(mouse(MouseEventKind::Moved, CMods::NONE)).is_none());
    assert!(translate(mouse(MouseEventKind::Drag(CButton::Left), CMods::NONE)).is_none());
    assert!(translate(mouse(MouseEventKind::ScrollUp, CMods::NONE)).is_none());
}

#[test]
fn host_keys_map_to_key_events() {
    for (code, expected) in [
        (CKeyCode::Char('a'), KeyCode::Char('a')),
        (CKeyCode::Char('q'), KeyCode::Char('q')),
        (CKeyCode::Enter, KeyCode::Enter),
        (CKeyCode::Esc, KeyCode::Esc),
    ] {
        match translate(CEvent::Key(CKeyEvent::new(code, CMods::NONE))) {
            Some(Event::Input(InputEvent::Key(k))) => assert_eq!(k.code, expected),
            other => panic!("unexpected: {other:?}"),
        }
    }
}

#[test]
fn ctrl_c_is_distinct() {
    let ev = translate(CEvent::Key(CKeyEvent::new(
        CKeyCode::Char('c'),
        CMods::CONTROL,
    )));
    assert!(matches!(ev, Some(Event::Input(InputEvent::CtrlC))));
}
