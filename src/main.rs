use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};
use swatch::settings::{Settings, SETTINGS_FILE};
use swatch::stopwatch::DEFAULT_NAME;
use swatch::{Host, IntervalScheduler, JsonFileStore, Stopwatch, SystemClock};

#[derive(Parser)]
#[command(name = "swatch", about = "Named stopwatches that survive restarts")]
struct Cli {
    /// Settings file.
    #[arg(long, default_value = SETTINGS_FILE)]
    settings: String,
    /// Enable debug logging regardless of the settings file.
    #[arg(long)]
    debug: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start or resume a stopwatch.
    Start {
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(default_value = DEFAULT_NAME)]
        name: String,
    },
    /// Pause a stopwatch.
    Stop {
        #[arg(default_value = DEFAULT_NAME)]
        name: String,
    },
    /// Zero a paused stopwatch and forget it.
    Reset {
        #[arg(default_value = DEFAULT_NAME)]
        name: String,
    },
    /// Show a stopwatch without touching it.
    Status {
        #[arg(default_value = DEFAULT_NAME)]
        name: String,
    },
    /// Run a stopwatch in the foreground.
    Watch {
        /// Fire an alarm and reset after this many milliseconds.
        #[arg(long)]
        alarm: Option<u64>,
        /// Pause after this many seconds.
        #[arg(long = "for")]
        duration: Option<f64>,
        #[arg(default_value = DEFAULT_NAME)]
        name: String,
    },
    /// Check that the store is writable.
    Probe,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli.settings)?;
    swatch::logging::init(
        cli.debug || settings.debug_logging,
        settings.log_file.as_ref().map(PathBuf::from),
    );

    let clock = Arc::new(SystemClock);
    let scheduler = Arc::new(IntervalScheduler::new(clock.clone()));
    let store = Arc::new(JsonFileStore::new(&settings.store_path));
    let host = Host::new(store, scheduler.clone(), clock);

    match cli.command {
        Command::Start { tags, name } => {
            let mut sw = Stopwatch::new(settings.stopwatch_config(&name, tags), host);
            sw.start();
            println!("{} started at {}", sw.name(), sw.readout());
        }
        Command::Stop { name } => {
            let mut sw = Stopwatch::new(settings.stopwatch_config(&name, Vec::new()), host);
            sw.run();
            sw.stop();
            println!("{} paused at {}", sw.name(), sw.readout());
        }
        Command::Reset { name } => {
            let mut sw = Stopwatch::new(settings.stopwatch_config(&name, Vec::new()), host);
            if sw.is_running() {
                println!("{} is running; stop it first", sw.name());
            } else {
                sw.reset();
                println!("{} reset", sw.name());
            }
        }
        Command::Status { name } => {
            let status = Stopwatch::status_for(&name, &host);
            let current = Stopwatch::current_for(&name, &host);
            let tags = Stopwatch::tags_for(&name, &host);
            let readout = swatch::stopwatch::Elapsed::from_millis(current).readout();
            println!("{name}: {status} {readout} ({current} ms)");
            if !tags.is_empty() {
                println!("tags: {}", tags.join(", "));
            }
        }
        Command::Watch {
            alarm,
            duration,
            name,
        } => watch(&settings, host, &scheduler, &name, alarm, duration)?,
        Command::Probe => {
            if Stopwatch::can_use_store_for(DEFAULT_NAME, &host) {
                println!("store {} is writable", settings.store_path);
            } else {
                anyhow::bail!("store {} is not writable", settings.store_path);
            }
        }
    }
    Ok(())
}

fn watch(
    settings: &Settings,
    host: Host,
    scheduler: &IntervalScheduler,
    name: &str,
    alarm: Option<u64>,
    duration: Option<f64>,
) -> anyhow::Result<()> {
    let limit = duration.map(watch_limit).transpose()?;
    let config = settings
        .stopwatch_config(name, Vec::new())
        .with_render(|h, m, s, cs| {
            print!("\r{h}:{m}:{s}.{cs}");
            let _ = std::io::stdout().flush();
        });
    let mut sw = Stopwatch::new(config, host);

    let fired = Arc::new(AtomicBool::new(false));
    match alarm {
        Some(ms) => {
            let flag = fired.clone();
            sw.set_timer(ms, move || flag.store(true, Ordering::SeqCst));
        }
        None => sw.start(),
    }

    let deadline = limit.and_then(|limit| Instant::now().checked_add(limit));
    while sw.is_running() {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            sw.stop();
            break;
        }
        let wait = scheduler
            .until_next()
            .unwrap_or(sw.poll_interval())
            .min(Duration::from_millis(50));
        std::thread::sleep(wait);
        for handle in scheduler.due() {
            sw.on_poll(handle);
        }
    }
    println!();
    if fired.load(Ordering::SeqCst) {
        println!("{}: alarm after {} ms", sw.name(), sw.timeout_ms());
    }
    Ok(())
}

/// Parse the `--for` seconds value.
fn watch_limit(secs: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| anyhow::anyhow!("invalid --for value {secs}: {e}"))
}
