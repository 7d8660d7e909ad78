use std::{
    io::{self, stdout, Stdout},
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    time::Duration,
};

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, error, info, trace, warn};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Handle;

use super::{
    render::{draw, Theme},
    tasks::{Message, Task},
    ViewState,
};
use crate::{DataDirWatcher, EntryService, Result, StakError};

const TICK: Duration = Duration::from_millis(100);

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Runs the interactive scratchpad until the user quits.
///
/// Loads run on `runtime`'s blocking pool and report back over a channel
/// that is drained once per tick, so every state change happens here.
pub fn run(service: Arc<EntryService>, runtime: Handle, theme: Theme) -> Result<()> {
    let (tx, rx) = mpsc::channel();

    let watcher_tx = tx.clone();
    let _watcher = DataDirWatcher::start(service.store().data_dir(), move |paths| {
        trace!("Day files changed: {:?}", paths);
        let _ = watcher_tx.send(Message::DataChanged);
    })
    .map_err(|e| warn!("Running without a file watcher: {}", e))
    .ok();

    let mut terminal = setup_terminal()?;
    let mut state = ViewState::new(service);
    info!("Scratchpad started");

    let result = event_loop(&mut terminal, &mut state, &runtime, &tx, &rx, &theme);
    teardown_terminal(&mut terminal)?;
    info!("Scratchpad closed");
    result
}

fn event_loop(
    terminal: &mut Term,
    state: &mut ViewState,
    runtime: &Handle,
    tx: &Sender<Message>,
    rx: &Receiver<Message>,
    theme: &Theme,
) -> Result<()> {
    dispatch(runtime, state.service(), tx, state.initial_tasks());

    loop {
        terminal
            .draw(|frame| draw(frame, state, theme))
            .map_err(terminal_error)?;

        if event::poll(TICK).map_err(terminal_error)? {
            if let Event::Key(key) = event::read().map_err(terminal_error)? {
                if key.kind == KeyEventKind::Press {
                    let tasks = state.handle_key(key);
                    dispatch(runtime, state.service(), tx, tasks);
                }
            }
        }

        // many watcher events collapse into one reload
        let mut data_changed = false;
        while let Ok(message) = rx.try_recv() {
            if matches!(message, Message::DataChanged) {
                data_changed = true;
                continue;
            }
            let tasks = state.apply(message);
            dispatch(runtime, state.service(), tx, tasks);
        }
        if data_changed {
            let tasks = state.apply(Message::DataChanged);
            dispatch(runtime, state.service(), tx, tasks);
        }

        if state.should_quit() {
            return Ok(());
        }
    }
}

fn dispatch(runtime: &Handle, service: &Arc<EntryService>, tx: &Sender<Message>, tasks: Vec<Task>) {
    for task in tasks {
        let service = Arc::clone(service);
        let tx = tx.clone();
        debug!("Dispatching {:?}", task);
        runtime.spawn_blocking(move || {
            if tx.send(task.run(&service)).is_err() {
                debug!("View closed before a load finished");
            }
        });
    }
}

fn setup_terminal() -> Result<Term> {
    enable_raw_mode().map_err(terminal_error)?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen).map_err(terminal_error)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(terminal_error)
}

fn teardown_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode().map_err(terminal_error)?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).map_err(terminal_error)?;
    terminal.show_cursor().map_err(terminal_error)?;
    Ok(())
}

fn terminal_error(e: io::Error) -> StakError {
    error!("Terminal failure: {}", e);
    StakError::Terminal {
        message: e.to_string(),
    }
}
