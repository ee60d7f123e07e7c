mod app_logic;
mod app_state;
mod event_handler;
mod tree_labels;
mod ui_renderer;

pub use self::run_tui::run_tui;

// Terminal setup/teardown and the main draw loop.
mod run_tui {
    use super::app_logic::TuiApp;
    use super::event_handler::handle_events;
    use super::ui_renderer::ui_frame;
    use anyhow::Result;
    use crossterm::{
        event::{DisableMouseCapture, EnableMouseCapture},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    };
    use ratatui::prelude::{CrosstermBackend, Terminal};
    use sharepick::EngineConfig;
    use std::io::{self, Stdout};

    /// Runs an interactive session. Returns the directive lines on confirm
    /// and `None` when the user quits.
    pub fn run_tui(
        paths: Vec<String>,
        existing: Vec<String>,
        config: EngineConfig,
    ) -> Result<Option<Vec<String>>> {
        let mut app = TuiApp::new(paths, existing, config);

        let mut terminal = init_terminal()?;
        let outcome = run_loop(&mut terminal, &mut app);
        restore_terminal(terminal)?;
        outcome?;

        Ok(app.into_directives())
    }

    fn run_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut TuiApp) -> Result<()> {
        while !app.quit {
            terminal.draw(|frame| ui_frame(frame, app))?;
            handle_events(app)?;
        }
        Ok(())
    }

    fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        Terminal::new(backend).map_err(Into::into)
    }

    fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor().map_err(Into::into)
    }
}
