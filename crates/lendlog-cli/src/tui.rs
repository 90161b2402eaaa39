//! Terminal setup and the interactive event loop.

use std::{io, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
  event::{self, DisableFocusChange, EnableFocusChange, Event, KeyEventKind},
  execute,
  terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
  },
};
use lendlog_core::backend::Backend;
use lendlog_desk::{
  Desk,
  scheduler::{Scheduler, Trigger},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::{
  app::{Action, App},
  ui,
};

type Term = Terminal<CrosstermBackend<io::Stdout>>;

pub async fn run<B: Backend + 'static>(desk: Desk<B>) -> Result<()> {
  // The first scheduler tick performs the initial load.
  let scheduler = Scheduler::spawn(desk.clone());
  let mut app = App::new(desk);

  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen, EnableFocusChange)
    .context("entering alternate screen")?;
  let mut terminal =
    Terminal::new(CrosstermBackend::new(stdout)).context("creating terminal")?;

  let result = event_loop(&mut terminal, &mut app, &scheduler).await;

  // Leave the terminal usable even when the loop failed.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen)
    .ok();
  terminal.show_cursor().ok();

  scheduler.shutdown().await;
  result
}

async fn event_loop<B: Backend + 'static>(
  terminal: &mut Term,
  app: &mut App<B>,
  scheduler: &Scheduler,
) -> Result<()> {
  loop {
    app.poll_notices();
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Wait briefly for input so notices and scheduler refreshes show up.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(100))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    match maybe_event {
      Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
        match app.handle_key(key) {
          Action::Quit => break,
          Action::Refresh => scheduler.notify(Trigger::RefreshNow),
          Action::None => {}
        }
      }
      Some(Event::FocusGained) => scheduler.notify(Trigger::Focus),
      Some(Event::FocusLost) => scheduler.notify(Trigger::Visible(false)),
      // Resize: redrawn on the next iteration.
      _ => {}
    }
  }
  Ok(())
}
