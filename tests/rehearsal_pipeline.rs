use std::time::Duration;

use assert_matches::assert_matches;
use drillpace::answer_key::{ActivityKind, AnswerKey};
use drillpace::config::ActivityConfig;
use drillpace::driver::BrowserDriver;
use drillpace::error::AutomationError;
use drillpace::extractor::extract;
use drillpace::finalize::RetryPolicy;
use drillpace::pacing::{Controller, RunEnd};
use drillpace::progress::ProgressSnapshot;
use drillpace::question::Prompt;
use drillpace::rehearsal::{Catalog, RehearsalBrowser, DEMO_PASSWORD, DEMO_USERNAME};
use drillpace::runtime::{Clock, ManualClock};
use drillpace::shell::{LoginOutcome, Navigator};
use drillpace::site;

type Site = Navigator<RehearsalBrowser<ManualClock>, ManualClock>;

fn site() -> (Site, ManualClock) {
    let clock = ManualClock::new();
    let browser = RehearsalBrowser::with_clock(
        Catalog::embedded().unwrap(),
        DEMO_USERNAME,
        DEMO_PASSWORD,
        clock.clone(),
    )
    .with_seed(42);
    (Navigator::with_clock(browser, clock.clone()), clock)
}

fn logged_in() -> (Site, ManualClock) {
    let (mut nav, clock) = site();
    assert_eq!(
        nav.login(DEMO_USERNAME, DEMO_PASSWORD).unwrap(),
        LoginOutcome::Success
    );
    (nav, clock)
}

/// Logs in and opens the first activity of `kind`, returning its name.
fn open_first(nav: &mut Site, kind: ActivityKind) -> String {
    let catalog = Catalog::embedded().unwrap();
    let wanted = catalog.first_of(kind).unwrap().name.clone();
    let activities = nav.list_activities().unwrap();
    let entry = activities.iter().find(|a| a.name == wanted).unwrap();
    nav.open_activity(entry).unwrap();
    wanted
}

#[test]
fn login_succeeds_with_demo_credentials() {
    let (mut nav, _) = logged_in();
    assert!(nav.driver_mut().is_logged_in());
    assert_eq!(nav.driver_mut().current_url().unwrap(), site::ACTIVITIES_URL);
}

#[test]
fn wrong_password_is_rejected_and_form_is_reusable() {
    let (mut nav, _) = site();
    assert_eq!(
        nav.login(DEMO_USERNAME, "nope").unwrap(),
        LoginOutcome::Rejected
    );
    assert!(!nav.driver_mut().is_logged_in());
    assert_eq!(
        nav.login(DEMO_USERNAME, DEMO_PASSWORD).unwrap(),
        LoginOutcome::Success
    );
}

#[test]
fn unresponsive_login_times_out_after_five_seconds() {
    let (mut nav, clock) = site();
    nav.driver_mut().set_login_unresponsive(true);
    assert_eq!(
        nav.login(DEMO_USERNAME, DEMO_PASSWORD).unwrap(),
        LoginOutcome::TimedOut
    );
    assert!(clock.now() >= Duration::from_secs(5));
    assert!(clock.now() < Duration::from_secs(6));
}

#[test]
fn activity_list_follows_catalog_order() {
    let (mut nav, _) = logged_in();
    let names: Vec<String> = nav
        .list_activities()
        .unwrap()
        .into_iter()
        .map(|a| a.name)
        .collect();
    let expected: Vec<String> = Catalog::embedded()
        .unwrap()
        .activities()
        .iter()
        .map(|a| a.name.clone())
        .collect();
    assert_eq!(names, expected);
}

#[test]
fn logout_returns_to_login_page() {
    let (mut nav, _) = logged_in();
    nav.logout().unwrap();
    assert!(!nav.driver_mut().is_logged_in());
    assert_eq!(nav.driver_mut().current_url().unwrap(), site::LOGIN_URL);

    nav.back_to_activities().unwrap();
    assert_eq!(nav.driver_mut().current_url().unwrap(), site::LOGIN_URL);
}

#[test]
fn vocabulary_key_is_read_from_chart_and_page_restored() {
    let (mut nav, _) = logged_in();
    open_first(&mut nav, ActivityKind::Vocabulary);
    let activity_url = nav.driver_mut().current_url().unwrap();

    let key = nav.load_answer_key().unwrap();
    assert_eq!(key.kind(), ActivityKind::Vocabulary);
    assert_eq!(key.len(), 20);
    let prompt = Prompt::Vocabulary {
        question: "the kitchen".into(),
    };
    assert_eq!(key.resolve(&prompt).unwrap(), "la cocina");
    assert_eq!(nav.driver_mut().current_url().unwrap(), activity_url);
}

#[test]
fn conjugation_key_resolves_noun_phrase_subjects() {
    let (mut nav, _) = logged_in();
    open_first(&mut nav, ActivityKind::Conjugation);

    let key = nav.load_answer_key().unwrap();
    assert_matches!(&key, AnswerKey::Conjugation(verbs) if verbs.len() == 4);

    let ask = |pronoun: &str| Prompt::Conjugation {
        verb: "hablar".into(),
        pronoun: pronoun.into(),
    };
    assert_eq!(key.resolve(&ask("Juan y yo")).unwrap(), "hablamos");
    assert_eq!(key.resolve(&ask("Juan y María")).unwrap(), "hablan");
    assert_eq!(key.resolve(&ask("María")).unwrap(), "habla");
    assert_eq!(key.resolve(&ask("tú")).unwrap(), "hablas");
}

#[test]
fn extracting_a_page_without_a_chart_is_structure_missing() {
    let (mut nav, _) = logged_in();
    assert_matches!(
        extract(nav.driver_mut(), ActivityKind::Vocabulary),
        Err(AutomationError::StructureMissing(_))
    );
    assert_matches!(
        extract(nav.driver_mut(), ActivityKind::Conjugation),
        Err(AutomationError::StructureMissing(_))
    );
}

#[test]
fn answer_key_needs_an_activity_page() {
    let (mut nav, _) = logged_in();
    assert_matches!(
        nav.load_answer_key(),
        Err(AutomationError::UnrecognizedActivity(_))
    );
}

#[test]
fn homework_settings_set_the_drill_timer() {
    let (mut nav, _) = logged_in();
    open_first(&mut nav, ActivityKind::Vocabulary);
    nav.prepare_homework_settings(3).unwrap();
    assert_eq!(nav.driver_mut().homework_minutes(), Some(3));
    assert_eq!(nav.driver_mut().drill_stats(), Some((0, 0)));
}

#[test]
fn question_source_needs_a_running_drill() {
    let (mut nav, _) = logged_in();
    open_first(&mut nav, ActivityKind::Conjugation);
    assert_matches!(
        nav.question_source(ActivityKind::Conjugation),
        Err(AutomationError::StructureMissing(_))
    );
}

fn run_drill(kind: ActivityKind, intercepted_clicks: u32) {
    let (mut nav, clock) = logged_in();
    open_first(&mut nav, kind);
    let key = nav.load_answer_key().unwrap();

    let config = ActivityConfig::new(1, 20, 75, 1.0, true);
    nav.prepare_homework_settings(config.time_limit_minutes())
        .unwrap();
    nav.driver_mut().intercept_check_clicks(intercepted_clicks);

    let controller = Controller::with_clock(config, clock.clone());
    let mut snapshots: Vec<ProgressSnapshot> = Vec::new();
    let report = {
        let mut source = nav.question_source(kind).unwrap();
        controller.run(&key, &mut source, &mut snapshots).unwrap()
    };

    assert_eq!(report.end, RunEnd::TimeUp);
    assert!(report.score_recorded);
    assert_eq!(report.questions_answered, 20);
    assert_eq!(report.correct_answers, 16);

    // the site graded exactly what the controller believed it submitted
    let browser = nav.driver_mut();
    assert_eq!(browser.drill_stats(), Some((20, 16)));
    let recorded = browser.recorded_scores();
    assert_eq!(recorded.len(), 1);
    assert_eq!((recorded[0].answered, recorded[0].correct), (20, 16));

    let last = snapshots.last().unwrap();
    assert_eq!(last.words(), "16/20");
    assert_eq!(last.percent_correct, Some(80));
}

#[test]
fn full_vocabulary_run_with_auto_submit() {
    run_drill(ActivityKind::Vocabulary, 0);
}

#[test]
fn full_conjugation_run_with_auto_submit() {
    run_drill(ActivityKind::Conjugation, 0);
}

#[test]
fn intercepted_check_clicks_are_retried() {
    run_drill(ActivityKind::Vocabulary, 3);
}

#[test]
fn score_can_be_recorded_after_a_manual_run() {
    let (mut nav, clock) = logged_in();
    open_first(&mut nav, ActivityKind::Vocabulary);
    let key = nav.load_answer_key().unwrap();
    let config = ActivityConfig::new(1, 5, 100, 2.0, false);
    nav.prepare_homework_settings(1).unwrap();

    let report = {
        let mut source = nav.question_source(ActivityKind::Vocabulary).unwrap();
        Controller::with_clock(config, clock.clone())
            .run(&key, &mut source, &mut Vec::new())
            .unwrap()
    };
    assert!(!report.score_recorded);
    assert!(nav.driver_mut().recorded_scores().is_empty());

    nav.finalize(ActivityKind::Vocabulary, &RetryPolicy::default())
        .unwrap();
    assert_eq!(nav.driver_mut().recorded_scores().len(), 1);
    assert_eq!(nav.driver_mut().recorded_scores()[0].correct, 5);
}
