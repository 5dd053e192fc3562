use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use gridsnake::config::{BoardSize, Settings, load_settings, parse_apple_count, settings_path};
use gridsnake::error::AppError;
use gridsnake::input::{GameInput, InputHandler};
use gridsnake::renderer;
use gridsnake::session::{Session, SessionConfig, SessionState};
use gridsnake::skin::{AppleSkinKind, Skins, SnakeSkinKind};
use gridsnake::terminal_runtime::TerminalGuard;
use gridsnake::ui::hud::HudInfo;
use log::{error, info};

/// Upper bound on how long one frame waits for input.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Classic grid snake in the terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Board size as WIDTHxHEIGHT, e.g. 30x15.
    #[arg(long)]
    board: Option<BoardSize>,

    /// Number of apples kept on the board.
    #[arg(long, value_parser = parse_apple_count)]
    apples: Option<usize>,

    /// Milliseconds per tick.
    #[arg(long = "tick-ms")]
    tick_ms: Option<u64>,

    /// Seed for reproducible apple placement.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    snake_skin: Option<SnakeSkinKind>,

    #[arg(long, value_enum)]
    apple_skin: Option<AppleSkinKind>,

    /// Settings file to read instead of the default location.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Start with the debug line visible.
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("{error}");
            eprintln!("gridsnake: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let path = cli.settings.clone().unwrap_or_else(settings_path);
    let settings = apply_overrides(load_settings(&path)?, &cli);
    info!("settings from {}: {settings:?}", path.display());

    let config = SessionConfig {
        board: settings.board()?,
        apples: settings.apples,
        tick_interval: Duration::from_millis(settings.tick_interval_ms()),
        seed: cli.seed,
    };
    let skins = Skins::new(settings.snake_skin, settings.apple_skin);

    // Invalid parameters are reported before the terminal is taken over.
    let mut session = Session::new(config, Instant::now())?;
    if cli.debug {
        session.handle_input(GameInput::ToggleDebug, Instant::now())?;
    }

    let mut guard = TerminalGuard::enter()?;
    let mut input = InputHandler::new();
    let mut hud = HudInfo::default();

    while session.state() != SessionState::Stopped {
        let frame_started = Instant::now();
        guard
            .terminal_mut()
            .draw(|frame| renderer::render(frame, &session, &skins, &hud))?;
        hud.frame_time = frame_started.elapsed();

        let timeout = session.until_next_tick(Instant::now()).min(FRAME_INTERVAL);
        if let Some(game_input) = input.poll_input(timeout)? {
            session.handle_input(game_input, Instant::now())?;
        }

        session.advance(Instant::now())?;
    }

    Ok(())
}

fn apply_overrides(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(board) = cli.board {
        settings.board_width = board.width();
        settings.board_height = board.height();
    }
    if let Some(apples) = cli.apples {
        settings.apples = apples;
    }
    if let Some(tick_ms) = cli.tick_ms {
        settings.tick_ms = tick_ms;
    }
    if let Some(skin) = cli.snake_skin {
        settings.snake_skin = skin;
    }
    if let Some(skin) = cli.apple_skin {
        settings.apple_skin = skin;
    }
    settings
}
