use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use picker_core::Command;

/// Map a key press to a session command. `None` means redraw only.
pub fn command_for(key: KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Enter => Some(Command::Pick),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Command::Quit)
        }
        KeyCode::Char('u' | 'U') => Some(Command::Undo),
        KeyCode::Char('r' | 'R') => Some(Command::Reset),
        KeyCode::Char('q' | 'Q') => Some(Command::Quit),
        _ => None,
    }
}
