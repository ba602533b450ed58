use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

use coach_inbox::app::{App, InputMode};
use coach_inbox::config::Config;
use coach_inbox::gateway::loopback::{LoopbackGateway, LoopbackSettings};
use coach_inbox::message::Message;
use coach_inbox::store::MessageStore;
use coach_inbox::typing::SystemClock;
use coach_inbox::{debug_log, demo, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<&str> = None;
    let mut snapshot: Option<PathBuf> = None;
    let mut debug = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--config" => {
                if i + 1 < args.len() {
                    config_path = Some(&args[i + 1]);
                    i += 2;
                } else {
                    eprintln!("--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--snapshot" => {
                if i + 1 < args.len() {
                    snapshot = Some(PathBuf::from(&args[i + 1]));
                    i += 2;
                } else {
                    eprintln!("--snapshot requires a path argument");
                    std::process::exit(1);
                }
            }
            "--debug" => {
                debug = true;
                i += 1;
            }
            "--help" => {
                eprintln!("coach-inbox - Unified client inbox for coaches");
                eprintln!();
                eprintln!("Usage: coach-inbox [OPTIONS]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  -c, --config <PATH>     Config file path");
                eprintln!("      --snapshot <PATH>   Start from a JSON message log instead of demo data");
                eprintln!("      --debug             Write debug log to {}", debug_log::LOG_FILE);
                eprintln!("      --help              Show this help");
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                std::process::exit(1);
            }
        }
    }

    if debug {
        debug_log::enable()?;
    }

    let mut config = Config::load(config_path)?;
    if snapshot.is_some() {
        config.snapshot_path = snapshot;
    }

    // Load data before touching the terminal so errors print normally
    let (demo_store, directory) = demo::seed(Utc::now())?;
    let store = match &config.snapshot_path {
        Some(path) => {
            info!(path = %path.display(), "loading snapshot");
            MessageStore::load_json(path)?
        }
        None => demo_store,
    };
    let app = App::new(store, directory, SystemClock, &config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the main flow separately so we can always restore the terminal
    let result = run_main_flow(&mut terminal, app, &config).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run_main_flow(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: App,
    config: &Config,
) -> Result<()> {
    let mut gateway = LoopbackGateway::spawn(LoopbackSettings::from_config(config));
    let result = run_app(terminal, app, &mut gateway).await;
    gateway.shutdown().await?;
    result
}

async fn transmit(app: &mut App, gateway: &LoopbackGateway, message: Option<Message>) {
    let Some(message) = message else {
        return;
    };
    if let Err(e) = gateway.transmit(&message).await {
        warn!(id = %message.id(), "transmit failed: {e:#}");
        app.status_message = format!("send error: {e}");
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    gateway: &mut LoopbackGateway,
) -> Result<()> {
    app.set_connected();

    loop {
        terminal.draw(|frame| ui::draw(frame, &mut app))?;

        // Short timeout keeps gateway events and the typing indicator responsive
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let handled = match (key.modifiers, key.code) {
                    (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        app.should_quit = true;
                        true
                    }
                    (KeyModifiers::NONE, KeyCode::Tab) => {
                        app.next_conversation();
                        true
                    }
                    (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                        app.prev_conversation();
                        true
                    }
                    (KeyModifiers::CONTROL, KeyCode::Left) => {
                        app.resize_sidebar(-2);
                        true
                    }
                    (KeyModifiers::CONTROL, KeyCode::Right) => {
                        app.resize_sidebar(2);
                        true
                    }
                    (KeyModifiers::CONTROL, KeyCode::Char('t')) => {
                        app.apply_template();
                        true
                    }
                    _ => false,
                };

                if !handled {
                    if app.show_help {
                        // Any key dismisses the help overlay
                        app.show_help = false;
                    } else if app.autocomplete_visible {
                        let outgoing = app.handle_autocomplete_key(key.code);
                        transmit(&mut app, gateway, outgoing).await;
                    } else {
                        match app.mode {
                            InputMode::Normal => match key.code {
                                KeyCode::Char('j') | KeyCode::Down => app.next_conversation(),
                                KeyCode::Char('k') | KeyCode::Up => app.prev_conversation(),
                                KeyCode::Char('i') | KeyCode::Char('a') => {
                                    app.mode = InputMode::Insert;
                                }
                                KeyCode::Char('/') => {
                                    app.mode = InputMode::Insert;
                                    app.input_buffer = "/".to_string();
                                    app.input_cursor = 1;
                                    app.update_autocomplete();
                                }
                                KeyCode::Char('q') => app.should_quit = true,
                                _ => {}
                            },
                            InputMode::Insert => match key.code {
                                KeyCode::Esc => app.mode = InputMode::Normal,
                                KeyCode::Enter => {
                                    let outgoing = app.handle_input();
                                    transmit(&mut app, gateway, outgoing).await;
                                }
                                _ => {
                                    let needs_ac_update = matches!(
                                        key.code,
                                        KeyCode::Backspace | KeyCode::Delete | KeyCode::Char(_)
                                    );
                                    app.apply_input_edit(key.code);
                                    if needs_ac_update {
                                        app.update_autocomplete();
                                    }
                                }
                            },
                        }
                    }
                }
            }
        }

        // Drain gateway events (non-blocking), detect disconnect
        loop {
            match gateway.event_rx.try_recv() {
                Ok(ev) => app.handle_gateway_event(ev),
                Err(tokio::sync::mpsc::error::TryRecvError::Disconnected) => {
                    if app.connection_error.is_none() {
                        app.set_disconnected("gateway disconnected");
                    }
                    break;
                }
                Err(_) => break,
            }
        }

        app.tick();

        let unread = app.total_unread();
        let title = if unread > 0 {
            format!("coach-inbox ({unread})")
        } else {
            "coach-inbox".to_string()
        };
        execute!(terminal.backend_mut(), crossterm::terminal::SetTitle(&title))?;

        if app.should_quit {
            break;
        }
    }

    execute!(terminal.backend_mut(), crossterm::terminal::SetTitle("")).ok();

    Ok(())
}
