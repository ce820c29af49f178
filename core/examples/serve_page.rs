use anyhow::{Result, Context};
use linkplay_core::{
    AppConfig, HttpHost, LoadPhase, PlaybackController, PlayerBridge, link,
};
use std::{env, thread, time::{Duration, Instant}};

// Headless run of the bridge: serve the page, open it in a browser, and
// watch the notifications arrive. Every fifth second toggles playback.
fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <youtube link>", args[0]);
        return Ok(());
    }

    let video_id = link::parse(&args[1]).context("Not a usable YouTube link")?;
    let config = AppConfig::default();

    let host = HttpHost::bind(&config.bind, &config.page_options())?;
    println!("Open {} in a browser", host.page_url());

    let bridge = PlayerBridge::new(host, config.page_options());
    let mut controller = PlaybackController::new(bridge, config.ready_timeout());
    controller.load(video_id)?;

    let started = Instant::now();
    let mut last_toggle = Instant::now();
    let mut last_label = String::new();

    loop {
        controller.pump();
        let now = Instant::now();

        match controller.load_phase(now) {
            LoadPhase::Stalled => {
                println!("No playerReady after {:?}, giving up", started.elapsed());
                return Ok(());
            }
            LoadPhase::Ready if last_toggle.elapsed() >= Duration::from_secs(5) => {
                println!("Toggle: {:?}", controller.toggle()?);
                last_toggle = now;
            }
            _ => {}
        }

        if let Some(snapshot) = controller.snapshot() {
            let label = format!("{} {}", snapshot.state.label(), snapshot.progress_label());
            if label != last_label {
                println!("{}", label);
                last_label = label;
            }
        }

        thread::sleep(Duration::from_millis(50));
    }
}
