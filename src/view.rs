//! Full-screen progress view shown while sessions run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use anyhow::{Result, anyhow};
use bedscan::{AppContext, Coordinate, SearchStatus};
use ratatui::Frame;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use throbber_widgets_tui::{Throbber, ThrobberState};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// How the view ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ViewExit {
    /// Every session finished.
    Finished,
    /// The user asked to leave before the sessions finished.
    Interrupted,
}

/// What one frame shows.
struct Snapshot {
    title: String,
    status: SearchStatus,
    total: usize,
    rows: Vec<Coordinate>,
}

impl Snapshot {
    fn capture(context: &AppContext, title: &str, limit: usize) -> Self {
        let results = context.results();
        Self {
            title: title.to_string(),
            status: context.status(),
            total: results.len(),
            rows: results.iter().take(limit).copied().collect(),
        }
    }
}

/// Draw frames until every session in `context` has finished or the user quits.
///
/// Sessions run as local tasks; the view yields to them between frames.
pub(crate) async fn run(context: &AppContext, title: &str) -> Result<ViewExit> {
    let mut terminal = ratatui::init();
    let restore = RestoreOnDrop(ratatui::restore);
    terminal.clear()?;

    let (event_tx, event_rx) = mpsc::channel();
    let event_loop_running = Arc::new(AtomicBool::new(true));
    let event_loop_flag = Arc::clone(&event_loop_running);

    let event_thread = thread::spawn(move || -> Result<()> {
        while event_loop_flag.load(Ordering::Relaxed) {
            if event::poll(Duration::from_millis(50))? {
                let event = event::read()?;
                if event_tx.send(event).is_err() {
                    break;
                }
            }
        }
        Ok(())
    });

    let mut throbber_state = ThrobberState::default();
    let mut interval = tokio::time::interval(FRAME_INTERVAL);

    let result: Result<ViewExit> = 'frames: loop {
        interval.tick().await;
        throbber_state.calc_next();

        loop {
            match event_rx.try_recv() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press && is_quit(key) => {
                    break 'frames Ok(ViewExit::Interrupted);
                }
                Ok(_) => {}
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    break 'frames Err(anyhow!("input event channel disconnected"));
                }
            }
        }

        let limit = terminal.size().map(|size| usize::from(size.height)).unwrap_or(0);
        let snapshot = Snapshot::capture(context, title, limit);
        if let Err(err) = terminal.draw(|frame| draw(frame, &snapshot, &throbber_state)) {
            break Err(err.into());
        }

        if context.running() == 0 {
            break Ok(ViewExit::Finished);
        }
    };

    drop(restore);

    event_loop_running.store(false, Ordering::Relaxed);
    match event_thread.join() {
        Ok(join_result) => join_result?,
        Err(err) => std::panic::resume_unwind(err),
    }

    result
}

/// Hands the terminal back on every exit path, including `?` and unwinding.
struct RestoreOnDrop(fn());

impl Drop for RestoreOnDrop {
    fn drop(&mut self) {
        (self.0)();
    }
}

fn is_quit(key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

fn status_line<'a>(status: SearchStatus, total: usize, throbber_state: &ThrobberState) -> Line<'a> {
    let muted = Style::default().add_modifier(Modifier::DIM);
    let mut line = Line::default();
    if matches!(status, SearchStatus::Searching { .. }) {
        line.spans.push(Throbber::default().to_symbol_span(throbber_state));
    }
    line.spans.push(Span::raw(status.to_string()));
    line.spans.push(Span::styled(format!("  {total} found"), muted));
    line
}

fn draw(frame: &mut Frame, snapshot: &Snapshot, throbber_state: &ThrobberState) {
    let [header, body] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(frame.area());

    frame.render_widget(
        Paragraph::new(status_line(snapshot.status, snapshot.total, throbber_state)),
        header,
    );

    let items: Vec<ListItem> = snapshot
        .rows
        .iter()
        .map(|coordinate| ListItem::new(coordinate.to_string()))
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::TOP)
            .title(format!(" {} ", snapshot.title)),
    );
    frame.render_widget(list, body);
}

#[cfg(test)]
mod tests {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    fn rendered(snapshot: &Snapshot) -> String {
        let mut terminal = Terminal::new(TestBackend::new(40, 6)).unwrap();
        let state = ThrobberState::default();
        terminal.draw(|frame| draw(frame, snapshot, &state)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(usize::from(buffer.area.width))
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn frame_shows_status_and_nearest_results() {
        let snapshot = Snapshot {
            title: "seed 7".into(),
            status: SearchStatus::searching(0.25),
            total: 3,
            rows: vec![Coordinate::new(0, -60, 1), Coordinate::new(-2, -60, 0)],
        };

        let screen = rendered(&snapshot);
        assert!(screen.contains("Searching... (25.00%)"));
        assert!(screen.contains("3 found"));
        assert!(screen.contains("seed 7"));
        assert!(screen.contains("(0, -60, 1)"));
        assert!(screen.contains("(-2, -60, 0)"));
    }

    #[test]
    fn terminal_is_restored_on_early_return() {
        use std::sync::atomic::AtomicUsize;

        static RESTORED: AtomicUsize = AtomicUsize::new(0);
        fn restore() {
            RESTORED.fetch_add(1, Ordering::SeqCst);
        }

        fn failing_setup() -> Result<()> {
            let _restore = RestoreOnDrop(restore);
            let cleared: std::io::Result<()> = Err(std::io::Error::other("clear failed"));
            cleared?;
            Ok(())
        }

        assert!(failing_setup().is_err());
        assert_eq!(RESTORED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn quit_keys_are_recognised() {
        assert!(is_quit(KeyEvent::from(KeyCode::Char('q'))));
        assert!(is_quit(KeyEvent::from(KeyCode::Esc)));
        assert!(is_quit(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit(KeyEvent::from(KeyCode::Char('c'))));
    }
}
