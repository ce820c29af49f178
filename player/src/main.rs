use std::{fs::OpenOptions, io::{self, Write}, path::{Path, PathBuf}, thread, time::{Duration, Instant}};
use anyhow::{Result, Context};
use clap::Parser;
use ratatui::{
    backend::CrosstermBackend,
    Terminal,
    style::Color,
};
use crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use linkplay_core::{AppConfig, EmbedHost, HttpHost, PlaybackController, PlayerBridge, config::MAX_PLAYER_WIDTH};

mod app;
mod commands;
mod events; // Contains event utility functions
mod ui;

use app::App;
use events::event_utils;

/// Play YouTube videos from a pasted link, controlled from the terminal
#[derive(Debug, Parser)]
#[command(name = "linkplay", version, about)]
struct Args {
    /// YouTube watch link to open on start
    link: Option<String>,

    /// Loopback address for the player page
    #[arg(long)]
    bind: Option<String>,

    /// Player width in CSS pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_PLAYER_WIDTH)))]
    width: Option<u32>,

    /// Config file to read instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Open the player page in the system browser
    #[arg(long)]
    open: bool,

    /// Where log output goes; the terminal belongs to the UI
    #[arg(long, default_value = "linkplay.log")]
    log_file: PathBuf,
}

// Log lines go to a file with timestamp and thread, like:
// [2026-01-01 12:00:00.000 ThreadId(1) INFO linkplay] message
fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            let datetime = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            let thread_id = std::thread::current().id();
            writeln!(
                buf,
                "[{} {:?} {} {}] {}",
                datetime,
                thread_id,
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
        .context("Failed to initialize logger")?;

    Ok(())
}

fn open_in_browser(url: &str) -> Result<()> {
    let mut command = if cfg!(target_os = "windows") {
        let mut command = std::process::Command::new("cmd");
        command.args(["/C", "start", "", url]);
        command
    } else if cfg!(target_os = "macos") {
        let mut command = std::process::Command::new("open");
        command.arg(url);
        command
    } else {
        let mut command = std::process::Command::new("xdg-open");
        command.arg(url);
        command
    };

    command
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to launch a browser for {}", url))?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;
    log::info!("Application starting");

    let mut config = AppConfig::load(args.config.as_deref()).context("Failed to load config")?;
    if let Some(bind) = &args.bind {
        config.bind = bind.clone();
    }
    if let Some(width) = args.width {
        config.player_width = width;
    }

    // Serve the player page before touching the terminal so bind errors print plainly
    let host = HttpHost::bind(&config.bind, &config.page_options())
        .with_context(|| format!("Failed to serve the player page on {}", config.bind))?;
    let page_url = host.page_url();
    log::info!("Player page at {}", page_url);

    let host: Box<dyn EmbedHost> = Box::new(host);
    let bridge = PlayerBridge::new(host, config.page_options());
    let controller = PlaybackController::new(bridge, config.ready_timeout());
    let mut app = App::new(controller, &config, Some(page_url.clone()));

    if let Some(link) = &args.link {
        app.open_link(link)?;
    } else if let Some(video_id) = config.initial_video() {
        app.open_video(video_id)?;
    }

    if args.open {
        if let Err(e) = open_in_browser(&page_url) {
            log::warn!("{:#}", e);
            app.set_status(format!("Open {} in a browser", page_url), Color::Yellow);
        }
    }

    // Set up clean terminal restoration on panic
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableBracketedPaste);
        log::error!("PANIC: {}", panic_info);
        orig_hook(panic_info);
    }));

    enable_raw_mode().context("Failed to enable raw mode")?;

    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableBracketedPaste) {
        let _ = disable_raw_mode();
        return Err(e).context("Failed to setup terminal");
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(term) => term,
        Err(e) => {
            let _ = disable_raw_mode();
            return Err(e).context("Failed to create terminal");
        }
    };

    let result = run(&mut terminal, &mut app);

    log::info!("Shutting down application");

    // Unmount first and keep serving for one more poll, so the tab swaps to
    // the placeholder instead of playing on after exit
    app.controller.stop();
    thread::sleep(config.page_options().command_poll * 2);
    drop(app);

    let cleanup_result = (|| -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableBracketedPaste
        ).context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    })();

    if let Err(e) = cleanup_result {
        log::error!("Error during cleanup: {:#}", e);
        eprintln!("Error during cleanup: {}", e);
    }

    result
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let mut last_draw: Option<Instant> = None;

    while !app.should_quit {
        let due = last_draw.is_none_or(|at| at.elapsed() >= app.frame_interval());
        if due {
            terminal.draw(|f| {
                if let Err(e) = ui::draw_ui(f, app) {
                    log::error!("UI draw function error: {}", e);
                }
            }).context("Terminal draw failed")?;
            last_draw = Some(Instant::now());
        }

        if event::poll(Duration::from_millis(10))? {
            let event = event::read()?;
            if event_utils::is_terminate_event(&event) {
                log::debug!("Quit key pressed");
                app.should_quit = true;
                break;
            }
            if let Some(text) = event_utils::pasted_text(&event) {
                app.handle_paste(text);
            } else {
                match event {
                    Event::Key(key) if event_utils::is_key_press(&key) => {
                        if let Err(e) = app.handle_key_event(key) {
                            log::warn!("Key handler error: {:#}", e);
                            app.set_status(format!("Error: {}", e), Color::Red);
                        }
                    }
                    Event::Resize(w, h) => {
                        log::debug!("Resize event: {}x{}", w, h);
                        last_draw = None;
                    }
                    _ => {}
                }
            }
        }

        if let Err(e) = app.update() {
            log::error!("App update error: {:#}", e);
            app.set_status(format!("Error: {}", e), Color::Red);
        }
    }

    Ok(())
}
