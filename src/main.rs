use std::error::Error;
use std::io::{self, IsTerminal};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

use drillpace::answer_key::{ActivityKind, AnswerKey};
use drillpace::app_dirs::AppDirs;
use drillpace::config::{
    parse_minutes, parse_percent, parse_seconds, parse_word_target, ActivityConfig,
    FileOptionsStore, OptionsStore, StoredOptions,
};
use drillpace::error::{AutomationError, SessionError};
use drillpace::history::{RunHistory, RunRecord};
use drillpace::logging;
use drillpace::pacing::{Controller, RunReport, TICK_RATE_MS};
use drillpace::progress::{FnSink, ProgressSnapshot};
use drillpace::rehearsal::{Catalog, RehearsalBrowser, DEMO_PASSWORD, DEMO_USERNAME};
use drillpace::runtime::{AppEvent, FixedTicker, Runner, StopHandle};
use drillpace::session::{Phase, Session};
use drillpace::shell::{LoginOutcome, Navigator};
use drillpace::ui::{Dashboard, Status};

/// paced, accuracy-targeted automation of language drill activities
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// run a full session against the built-in practice site
    Rehearse(RehearseArgs),
    /// print the log of finished runs
    History,
    /// print the remembered options
    Options,
}

#[derive(Args, Debug, Clone)]
struct RehearseArgs {
    /// which sample activity to drill
    #[clap(short = 'k', long, value_enum, default_value_t = ActivityKind::Vocabulary)]
    kind: ActivityKind,

    /// time limit, e.g. 10m (1 to 45 minutes)
    #[clap(short = 't', long, value_parser = parse_minutes)]
    timer: Option<u32>,

    /// most questions to answer (0 to 499)
    #[clap(short = 'w', long, value_parser = parse_word_target)]
    words: Option<u32>,

    /// accuracy to aim for, e.g. 80%
    #[clap(short = 'p', long, value_parser = parse_percent)]
    percent: Option<u32>,

    /// seconds between answers, e.g. 0.5s
    #[clap(short = 's', long, value_parser = parse_seconds)]
    speed: Option<f64>,

    /// record the score when time is up
    #[clap(long, num_args = 0..=1, default_missing_value = "true")]
    auto_submit: Option<bool>,

    /// print progress lines instead of the dashboard
    #[clap(long)]
    plain: bool,

    /// fixed seed for the practice site's question order
    #[clap(long)]
    seed: Option<u64>,
}

impl RehearseArgs {
    /// Flags override the remembered options.
    fn to_config(&self, stored: StoredOptions) -> ActivityConfig {
        ActivityConfig::new(
            self.timer.unwrap_or(stored.time_limit_minutes),
            self.words.unwrap_or(stored.word_target),
            self.percent.unwrap_or(stored.target_percent),
            self.speed.unwrap_or(stored.seconds_per_word),
            self.auto_submit.unwrap_or(stored.auto_submit),
        )
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(path) = AppDirs::log_path() {
        logging::init(&path)?;
    }

    match cli.command {
        Command::Rehearse(args) => rehearse(args),
        Command::History => print_history(),
        Command::Options => print_options(),
    }
}

fn print_history() -> Result<(), Box<dyn Error>> {
    let Some(path) = AppDirs::history_path() else {
        println!("no runs recorded");
        return Ok(());
    };
    let runs = RunHistory::new(path).load()?;
    if runs.is_empty() {
        println!("no runs recorded");
    }
    for run in runs {
        println!(
            "{}  {:<24} {:<11} {:>3}m  {:>3}/{:<3} target {:>3}%  got {:>4}  {}",
            run.timestamp.format("%Y-%m-%d %H:%M"),
            run.activity,
            run.kind,
            run.minutes,
            run.correct,
            run.answered,
            run.target_percent,
            run.percent.map_or_else(|| "-".to_string(), |p| format!("{p}%")),
            if run.auto_submitted { "submitted" } else { "" },
        );
    }
    Ok(())
}

fn print_options() -> Result<(), Box<dyn Error>> {
    let store = FileOptionsStore::new();
    println!("{}", store.path().display());
    println!("{}", serde_json::to_string_pretty(&store.load())?);
    Ok(())
}

fn rehearse(args: RehearseArgs) -> Result<(), Box<dyn Error>> {
    let store = FileOptionsStore::new();
    let config = args.to_config(store.load());
    let kind = args.kind;

    let catalog = Catalog::embedded()?;
    let activity = catalog
        .first_of(kind)
        .cloned()
        .ok_or_else(|| format!("no practice activity of kind {kind}"))?;
    let mut browser = RehearsalBrowser::new(catalog, DEMO_USERNAME, DEMO_PASSWORD);
    if let Some(seed) = args.seed {
        browser = browser.with_seed(seed);
    }
    let session = Session::new(Navigator::new(browser));

    eprintln!("logging in to the practice site");
    let outcome = session
        .spawn_phase(Phase::Login, |nav| nav.login(DEMO_USERNAME, DEMO_PASSWORD))?
        .join()??;
    match outcome {
        LoginOutcome::Success => {}
        LoginOutcome::Rejected => return Err("login rejected".into()),
        LoginOutcome::TimedOut => return Err("login timed out".into()),
    }

    eprintln!("reading the answer chart for {}", activity.name);
    let name = activity.name.clone();
    let key = session
        .spawn_phase(Phase::LoadAnswerKey, move |nav| -> Result<AnswerKey, AutomationError> {
            let activities = nav.list_activities()?;
            let entry = activities
                .iter()
                .find(|a| a.name == name)
                .ok_or_else(|| AutomationError::StructureMissing(format!("activity {name}")))?;
            nav.open_activity(entry)?;
            nav.load_answer_key()
        })?
        .join()??;

    let minutes = config.time_limit_minutes();
    session
        .spawn_phase(Phase::PrepareHomework, move |nav| {
            nav.prepare_homework_settings(minutes)
        })?
        .join()??;

    let (tx, rx) = mpsc::channel();
    let stop = StopHandle::new();
    let worker_stop = stop.clone();
    let worker_tx = tx.clone();
    let worker = session.spawn_phase(Phase::Automate, move |nav| {
        let controller = Controller::new(config).with_stop_handle(worker_stop);
        let progress_tx = worker_tx.clone();
        let mut sink = FnSink(move |snapshot: ProgressSnapshot| {
            let _ = progress_tx.send(AppEvent::Progress(snapshot));
        });
        let result = nav
            .question_source(kind)
            .and_then(|mut source| controller.run(&key, &mut source, &mut sink));
        let _ = worker_tx.send(AppEvent::Finished(result));
    })?;

    let runner = Runner::new(rx, FixedTicker::new(Duration::from_millis(TICK_RATE_MS)));
    let mut dashboard = Dashboard::new(&activity.name, kind, config);
    let worker_done = || worker.is_finished();

    let outcome = if args.plain || !io::stdout().is_terminal() {
        drop(tx);
        run_plain(&runner, &mut dashboard, worker_done)
    } else {
        spawn_key_reader(tx);
        run_dashboard(&runner, &mut dashboard, &stop, worker_done)?
    };
    worker.join()?;

    let report = outcome.ok_or(SessionError::WorkerPanicked)??;
    let record = RunRecord::new(&activity.name, kind, &config, &report);
    if let Some(path) = AppDirs::history_path() {
        RunHistory::new(path).append(&record)?;
    }
    store.save(&StoredOptions::from(&config))?;
    info!(answered = report.questions_answered, correct = report.correct_answers, "run saved");

    println!(
        "{}: {}/{} correct ({}), {:?}{}",
        activity.name,
        report.correct_answers,
        report.questions_answered,
        record.percent.map_or_else(|| "-".to_string(), |p| format!("{p}%")),
        report.end,
        if report.score_recorded { ", score recorded" } else { "" },
    );
    Ok(())
}

/// Polled on every idle tick. Once the worker has exited, whatever it
/// queued before exiting is the run's outcome; `None` means it died first.
fn worker_exit(
    runner: &Runner<FixedTicker>,
    worker_done: &impl Fn() -> bool,
) -> Option<Option<Result<RunReport, AutomationError>>> {
    worker_done().then(|| runner.take_finished())
}

fn run_plain(
    runner: &Runner<FixedTicker>,
    dashboard: &mut Dashboard,
    worker_done: impl Fn() -> bool,
) -> Option<Result<RunReport, AutomationError>> {
    let mut last_line = String::new();
    loop {
        match runner.step() {
            AppEvent::Progress(snapshot) => {
                dashboard.update(snapshot);
                let line = dashboard
                    .rows()
                    .into_iter()
                    .take(5)
                    .map(|(label, value)| format!("{label}: {value}"))
                    .collect::<Vec<_>>()
                    .join("  ");
                if line != last_line {
                    println!("{line}");
                    last_line = line;
                }
            }
            AppEvent::Finished(result) => return Some(result),
            AppEvent::Closed => return None,
            AppEvent::Key(_) | AppEvent::Tick => {
                if let Some(exit) = worker_exit(runner, &worker_done) {
                    return exit;
                }
            }
        }
    }
}

fn run_dashboard(
    runner: &Runner<FixedTicker>,
    dashboard: &mut Dashboard,
    stop: &StopHandle,
    worker_done: impl Fn() -> bool,
) -> Result<Option<Result<RunReport, AutomationError>>, Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    dashboard.status = Status::Running;
    let mut outcome = None;
    loop {
        terminal.draw(|f| f.render_widget(&*dashboard, f.area()))?;

        match runner.step() {
            AppEvent::Progress(snapshot) => dashboard.update(snapshot),
            AppEvent::Finished(result) => {
                dashboard.status = finished_status(&result);
                outcome = Some(result);
            }
            AppEvent::Closed => break,
            AppEvent::Key(_) if outcome.is_some() => break,
            AppEvent::Key(key) if is_stop_key(&key) => {
                stop.stop();
                dashboard.status = Status::Preparing("stopping".into());
            }
            AppEvent::Key(_) | AppEvent::Tick if outcome.is_none() => {
                match worker_exit(runner, &worker_done) {
                    Some(Some(result)) => {
                        dashboard.status = finished_status(&result);
                        outcome = Some(result);
                    }
                    Some(None) => break,
                    None => {}
                }
            }
            AppEvent::Key(_) | AppEvent::Tick => {}
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(outcome)
}

fn finished_status(result: &Result<RunReport, AutomationError>) -> Status {
    match result {
        Ok(report) => Status::Finished(format!(
            "{} of {} correct, press any key",
            report.correct_answers, report.questions_answered
        )),
        Err(err) => Status::Failed(format!("{err}, press any key")),
    }
}

fn is_stop_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

fn spawn_key_reader(tx: Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::read() {
            Ok(Event::Key(key)) => {
                if tx.send(AppEvent::Key(key)).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(err) => {
                error!(%err, "terminal input closed");
                break;
            }
        }
    });
}
