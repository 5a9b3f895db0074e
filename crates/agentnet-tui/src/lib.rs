mod app;
mod event;
mod input;
mod ui;

use agentnet_builder::BuilderSession;
use agentnet_client::ConnectionClient;

/// Launch the terminal UI on `session`, fed by `client` when the push channel
/// is enabled. The client is closed before this returns.
pub async fn run_tui(
    session: BuilderSession,
    client: Option<ConnectionClient>,
) -> anyhow::Result<()> {
    // Enter raw mode
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(
        stdout,
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;

    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let result = app::run_app(&mut terminal, session, client).await;

    // Restore terminal
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::event::DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}
