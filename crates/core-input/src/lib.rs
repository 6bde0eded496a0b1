//! Async input service: terminal events in, `core_events::Event`s out.
//!
//! Mouse button transitions become `InputEvent::Pointer`; keys the host binds
//! become `InputEvent::Key`; Ctrl-C is surfaced distinctly. Motion, drag and
//! scroll events are dropped here since nothing downstream consumes them.

mod async_service;
pub use async_service::{AsyncInputShutdown, TerminalInputSource};

use core_events::{
    Event, InputEvent, KeyCode, KeyEvent, ModMask, MouseButton, PointerEvent, PointerKind,
};
use crossterm::event::{
    Event as CEvent, KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyEventKind as CKind,
    KeyModifiers as CMods, MouseButton as CButton, MouseEvent as CMouseEvent,
    MouseEventKind as CMouseKind,
};

/// Translate one terminal event. `None` means "not forwarded".
pub fn translate(event: CEvent) -> Option<Event> {
    let input = match event {
        CEvent::Mouse(m) => InputEvent::Pointer(map_mouse(m)?),
        CEvent::Key(k) => map_key(k)?,
        CEvent::Resize(w, h) => InputEvent::Resize(w, h),
        CEvent::FocusGained => InputEvent::FocusGained,
        CEvent::FocusLost => InputEvent::FocusLost,
        _ => return None,
    };
    Some(Event::Input(input))
}

pub(crate) fn map_mods(m: CMods) -> ModMask {
    let mut out = ModMask::empty();
    if m.contains(CMods::CONTROL) {
        out |= ModMask::CTRL;
    }
    if m.contains(CMods::ALT) {
        out |= ModMask::ALT;
    }
    if m.contains(CMods::SHIFT) {
        out |= ModMask::SHIFT;
    }
    out
}

fn map_button(b: CButton) -> MouseButton {
    match b {
        CButton::Left => MouseButton::Left,
        CButton::Middle => MouseButton::Middle,
        CButton::Right => MouseButton::Right,
    }
}

pub(crate) fn map_mouse(m: CMouseEvent) -> Option<PointerEvent> {
    let (kind, button) = match m.kind {
        CMouseKind::Down(b) => (PointerKind::Press, map_button(b)),
        CMouseKind::Up(b) => (PointerKind::Release, map_button(b)),
        _ => return None,
    };
    Some(PointerEvent {
        kind,
        button,
        column: m.column,
        row: m.row,
        mods: map_mods(m.modifiers),
    })
}

pub(crate) fn map_key(k: CKeyEvent) -> Option<InputEvent> {
    if !matches!(k.kind, CKind::Press | CKind::Repeat) {
        return None;
    }
    let mods = map_mods(k.modifiers);
    let code = match k.code {
        CKeyCode::Char('c') if mods.contains(ModMask::CTRL) => return Some(InputEvent::CtrlC),
        CKeyCode::Char(ch) => KeyCode::Char(ch),
        CKeyCode::Enter => KeyCode::Enter,
        CKeyCode::Esc => KeyCode::Esc,
        _ => return None,
    };
    Some(InputEvent::Key(KeyEvent { code, mods }))
}
