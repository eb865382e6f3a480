mod tui;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;

use noughts_server::config::{DEFAULT_HANDSHAKE_TIMEOUT_MS, DEFAULT_MAX_PAYLOAD};
use noughts_server::{GameServer, ServerConfig, ServerEvent};
use tui::TuiState;

#[derive(Parser)]
#[command(name = "noughts-server")]
#[command(about = "Two-player noughts and crosses server over WebSocket")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(short, long, env = "PORT", default_value_t = noughts::DEFAULT_PORT)]
    port: u16,

    #[arg(
        long,
        default_value_t = DEFAULT_HANDSHAKE_TIMEOUT_MS,
        help = "Upgrade request timeout in ms (0 waits forever and pauses the game while a client stalls)"
    )]
    handshake_timeout_ms: u64,

    #[arg(
        long,
        default_value_t = DEFAULT_MAX_PAYLOAD,
        help = "Largest inbound frame payload in bytes"
    )]
    max_payload: usize,

    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = ServerConfig {
        bind: args.bind,
        port: args.port,
        handshake_timeout: (args.handshake_timeout_ms > 0)
            .then(|| Duration::from_millis(args.handshake_timeout_ms)),
        max_payload: args.max_payload,
    };
    let bind_addr = config.bind_addr();

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let mut server = runtime
        .block_on(GameServer::bind(config))
        .with_context(|| format!("failed to listen on {}", bind_addr))?;

    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        log::info!("Server started on {}", server.local_addr()?);
        runtime.block_on(server.run_until(ctrl_c()));
        log::info!("Server shutting down");
    } else {
        let events = server.subscribe();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let coordinator = runtime.spawn(server.run_until(async {
            let _ = stop_rx.await;
        }));

        let result = run_with_tui(events);

        let _ = stop_tx.send(());
        let _ = runtime.block_on(coordinator);
        result?;
    }

    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn run_with_tui(mut events: UnboundedReceiver<ServerEvent>) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut tui_state = TuiState::new();

    loop {
        while let Ok(event) = events.try_recv() {
            tui_state.apply(event);
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::PageUp => tui_state.scroll_up(),
                        KeyCode::PageDown => tui_state.scroll_down(),
                        KeyCode::End => tui_state.scroll_to_bottom(),
                        _ => {}
                    }
                }
            }
        }

        terminal.draw(|frame| {
            tui::render(frame, &tui_state);
        })?;
    }

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    Ok(())
}
