use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use loupe::app::App;
use loupe::async_task::{self, Task, TaskResult};
use loupe::cli::{Cli, Commands, RunArgs};
use loupe::config::Config;
use loupe::error::{LoupeError, Result};
use loupe::session::Session;
use loupe::test_runner::TestRunner;
use loupe::{event, main_lib, screenshot, ui};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger only if LOUPE_LOG environment variable is set
    if let Ok(log_file) = std::env::var("LOUPE_LOG") {
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
        {
            Ok(file) => {
                env_logger::Builder::new()
                    .target(env_logger::Target::Pipe(Box::new(file)))
                    .filter_level(log::LevelFilter::Debug)
                    .init();
                log::info!("Loupe starting up");
            }
            Err(e) => eprintln!("Cannot open log file {}: {}", log_file, e),
        }
    }

    let cli = Cli::parse();

    match cli.command {
        None => run_interactive(cli.run).await,
        Some(Commands::Run(args)) => run_interactive(args).await,
        Some(Commands::Screenshot {
            session,
            output,
            width,
            height,
        }) => {
            let config = Config::load(cli.run.config.as_deref())?;
            screenshot::generate_screenshot(&session, config, output.as_deref(), width, height)
        }
        Some(Commands::Test {
            script,
            session,
            overwrite,
            verbose,
        }) => run_headless_test(&script, session.as_deref(), cli.run.config.as_deref(), overwrite, verbose),
    }
}

fn run_headless_test(
    script_path: &Path,
    session_path: Option<&Path>,
    config_path: Option<&Path>,
    overwrite: bool,
    verbose: bool,
) -> Result<()> {
    // Set up logging if verbose and no log file was requested
    if verbose && std::env::var("LOUPE_LOG").is_err() {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    log::info!("🧪 Starting headless test run");
    log::info!("🧪 Script: {}", script_path.display());

    let config = Config::load(config_path)?;
    let session = match session_path {
        Some(path) => {
            log::info!("🧪 Session: {}", path.display());
            Session::load_from_file(path)?
        }
        None => Session::default(),
    };
    let mut app = App::from_session(session, config);

    let mut test_runner = TestRunner::from_file(script_path)?;
    test_runner.overwrite_mode = overwrite;
    let test_result = test_runner.run(&mut app);

    test_result.print_summary();

    if test_result.success {
        log::info!("🧪 Test completed successfully");
        Ok(())
    } else {
        log::error!("🧪 Test failed");
        Err(LoupeError::from("Test failed"))
    }
}

async fn run_interactive(args: RunArgs) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }

    let roots = if args.roots.is_empty() {
        vec![std::env::current_dir()?]
    } else {
        args.roots.iter().map(|root| canonical_or_same(root)).collect()
    };

    let mut app = App::new(config, roots);
    app.pending_preselect = args.path.as_deref().map(canonical_or_same);

    // The picked path goes to stdout, so the interface is drawn on stderr
    enable_raw_mode()?;
    let mut stderr = io::stderr();
    execute!(stderr, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stderr);
    let mut terminal = Terminal::new(backend)?;

    let loop_result = run_event_loop(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    loop_result?;

    if let Some(selected) = app.selected_output {
        println!("{}", selected.display());
    }
    Ok(())
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stderr>>,
    app: &mut App,
) -> Result<()> {
    // Setup async task channels
    let (task_sender, task_receiver) = mpsc::channel::<Task>(32);
    let (result_sender, mut result_receiver) = mpsc::channel::<TaskResult>(32);

    // Start background worker
    let cancel = CancellationToken::new();
    let worker_handle = tokio::spawn(async_task::run_worker(
        task_receiver,
        result_sender,
        cancel.clone(),
    ));

    log::info!("📤 main: Sending DiscoverRepositories task");
    app.is_loading = true;
    app.status_message = "Scanning...".to_string();
    let discover = app.discover_task();
    send_task(&task_sender, app, discover).await;

    let tick_rate = Duration::from_millis(250);
    let result = loop {
        if let Err(e) = terminal.draw(|f| ui::draw(f, app)) {
            break Err(e.into());
        }

        // Wake up in time to commit pending search text
        let timeout = app
            .debouncer
            .time_until_due(Instant::now())
            .map_or(tick_rate, |due| due.min(tick_rate));

        match crossterm::event::poll(timeout) {
            Ok(true) => match crossterm::event::read() {
                Ok(terminal_event) => {
                    if let Some(task) = event::handle_event(terminal_event, app, Instant::now()) {
                        send_task(&task_sender, app, task).await;
                    }
                }
                Err(e) => break Err(e.into()),
            },
            Ok(false) => {}
            Err(e) => break Err(e.into()),
        }

        app.tick(Instant::now());

        // Handle async task results
        while let Ok(task_result) = result_receiver.try_recv() {
            log::debug!(
                "📨 main: Received async task result: {:?}",
                std::mem::discriminant(&task_result)
            );
            if let Some(task) = main_lib::handle_task_result(app, task_result) {
                send_task(&task_sender, app, task).await;
            }
        }

        if app.should_quit {
            break Ok(());
        }
    };

    // Cleanup
    cancel.cancel();
    drop(task_sender);
    if let Err(e) = worker_handle.await {
        log::warn!("Worker ended abnormally: {}", e);
    }

    result
}

async fn send_task(sender: &mpsc::Sender<Task>, app: &mut App, task: Task) {
    log::debug!("📤 main: Sending {:?}", task);
    if let Err(e) = sender.send(task).await {
        log::error!("📤 main: Failed to send task: {}", e);
        app.is_loading = false;
        app.status_message = format!("Failed to start background task: {}", e);
    }
}

fn canonical_or_same(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
