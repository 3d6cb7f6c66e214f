//! Maps terminal events onto show commands.

use crossterm::event::{Event, KeyCode, MouseButton, MouseEventKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    DayNight,
    Gravity,
    Animation,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Target in viewport units.
    Launch { x: f32, y: f32 },
    Resize { cols: u16, rows: u16 },
    Visibility { hidden: bool },
    Toggle(Control),
}

/// A run of cells on one terminal row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub column: u16,
    pub row: u16,
    pub width: u16,
}

impl Region {
    pub fn contains(&self, column: u16, row: u16) -> bool {
        row == self.row && column >= self.column && column < self.column.saturating_add(self.width)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Button {
    pub control: Control,
    pub region: Region,
    pub label: String,
}

/// On-screen controls and message box; clicks on them never launch.
#[derive(Clone, Debug, Default)]
pub struct Chrome {
    pub buttons: Vec<Button>,
    pub notice: Option<Region>,
}

impl Chrome {
    /// Lays the three toggle buttons out right-aligned on the top row.
    pub fn layout(cols: u16, dark_mode: bool, gravity_name: &str, animating: bool) -> Self {
        let labels = [
            (Control::DayNight, if dark_mode { "[ Light ]".to_string() } else { "[ Dark ]".to_string() }),
            (Control::Gravity, format!("[ Gravity: {} ]", gravity_name)),
            (
                Control::Animation,
                if animating { "[ Fireworks: on ]".to_string() } else { "[ Fireworks: off ]".to_string() },
            ),
        ];

        let total: usize = labels.iter().map(|(_, l)| l.chars().count() + 1).sum();
        let mut column = (cols as usize).saturating_sub(total) as u16;
        let buttons = labels
            .into_iter()
            .map(|(control, label)| {
                let width = label.chars().count() as u16;
                let button = Button {
                    control,
                    region: Region { column, row: 0, width },
                    label,
                };
                column = column.saturating_add(width + 1);
                button
            })
            .collect();

        Self { buttons, notice: None }
    }

    pub fn control_at(&self, column: u16, row: u16) -> Option<Control> {
        self.buttons
            .iter()
            .find(|b| b.region.contains(column, row))
            .map(|b| b.control)
    }

    pub fn covers(&self, column: u16, row: u16) -> bool {
        self.control_at(column, row).is_some() || self.notice.is_some_and(|n| n.contains(column, row))
    }
}

/// Viewport point at the centre of a terminal cell.
pub fn cell_center(column: u16, row: u16, scale: f32) -> (f32, f32) {
    ((column as f32 + 0.5) * scale, (row as f32 * 2.0 + 1.0) * scale)
}

pub fn translate(event: &Event, chrome: &Chrome, scale: f32) -> Option<Command> {
    match event {
        Event::Mouse(mouse_event) => match mouse_event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let (column, row) = (mouse_event.column, mouse_event.row);
                if let Some(control) = chrome.control_at(column, row) {
                    return Some(Command::Toggle(control));
                }
                if chrome.covers(column, row) {
                    return None;
                }
                let (x, y) = cell_center(column, row, scale);
                Some(Command::Launch { x, y })
            }
            _ => None,
        },
        Event::Key(key_event) => match key_event.code {
            KeyCode::Char('d') | KeyCode::Char('D') => Some(Command::Toggle(Control::DayNight)),
            KeyCode::Char('g') | KeyCode::Char('G') => Some(Command::Toggle(Control::Gravity)),
            KeyCode::Char(' ') | KeyCode::Char('f') | KeyCode::Char('F') => {
                Some(Command::Toggle(Control::Animation))
            }
            _ => None,
        },
        Event::Resize(cols, rows) => Some(Command::Resize { cols: *cols, rows: *rows }),
        Event::FocusLost => Some(Command::Visibility { hidden: true }),
        Event::FocusGained => Some(Command::Visibility { hidden: false }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers, MouseEvent};

    fn click(column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn buttons_fit_on_the_right() {
        let chrome = Chrome::layout(80, true, "Normal", true);
        assert_eq!(chrome.buttons.len(), 3);
        let last = chrome.buttons.last().unwrap();
        assert!(last.region.column + last.region.width < 80);
        assert_eq!(chrome.buttons[0].label, "[ Light ]");
        assert!(chrome.buttons.windows(2).all(|w| w[0].region.column + w[0].region.width < w[1].region.column));
    }

    #[test]
    fn click_on_button_toggles() {
        let chrome = Chrome::layout(80, false, "High", false);
        let gravity = &chrome.buttons[1];
        let cmd = translate(&click(gravity.region.column + 2, 0), &chrome, 4.0);
        assert_eq!(cmd, Some(Command::Toggle(Control::Gravity)));
    }

    #[test]
    fn click_in_sky_launches_at_cell_center() {
        let chrome = Chrome::layout(80, true, "Normal", true);
        let cmd = translate(&click(10, 5), &chrome, 4.0);
        assert_eq!(cmd, Some(Command::Launch { x: 42.0, y: 44.0 }));
    }

    #[test]
    fn click_on_notice_is_swallowed() {
        let mut chrome = Chrome::layout(80, true, "Normal", true);
        chrome.notice = Some(Region { column: 30, row: 1, width: 20 });
        assert_eq!(translate(&click(35, 1), &chrome, 4.0), None);
        assert!(translate(&click(35, 2), &chrome, 4.0).is_some());
    }

    #[test]
    fn keys_and_window_events() {
        let chrome = Chrome::default();
        let key = |c| Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        assert_eq!(translate(&key('g'), &chrome, 1.0), Some(Command::Toggle(Control::Gravity)));
        assert_eq!(translate(&key(' '), &chrome, 1.0), Some(Command::Toggle(Control::Animation)));
        assert_eq!(translate(&key('x'), &chrome, 1.0), None);
        assert_eq!(translate(&Event::Resize(100, 30), &chrome, 1.0), Some(Command::Resize { cols: 100, rows: 30 }));
        assert_eq!(translate(&Event::FocusLost, &chrome, 1.0), Some(Command::Visibility { hidden: true }));
        assert_eq!(translate(&Event::FocusGained, &chrome, 1.0), Some(Command::Visibility { hidden: false }));
    }
}
