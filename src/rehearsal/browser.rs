use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use super::catalog::{Catalog, SampleActivity};
use super::dom::{Action, Dom, Node};
use crate::answer_key::ActivityKind;
use crate::driver::{BrowserDriver, Locator};
use crate::error::DriverError;
use crate::runtime::{Clock, SystemClock};
use crate::site;

const DEFAULT_DRILL_MINUTES: u32 = 10;

/// Subjects the drill may show for each chart pronoun.
const SUBJECTS: &[(&str, &[&str])] = &[
    ("yo", &["yo"]),
    ("tú", &["tú"]),
    ("él", &["él", "María", "Juan", "mi profesora"]),
    ("nosotros", &["nosotros", "Juan y yo", "mi hermano y yo"]),
    ("vosotros", &["vosotros"]),
    ("ellos", &["ellos", "Juan y María", "los estudiantes y el profesor"]),
];

/// Element handle; only valid on the page load it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle {
    page: u64,
    node: usize,
}

/// Score recorded at the end of a drill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillResult {
    pub activity_id: u32,
    pub answered: u32,
    pub correct: u32,
}

#[derive(Debug)]
struct Drill {
    activity: SampleActivity,
    started: Duration,
    limit: Duration,
    expected: String,
    answered: u32,
    correct: u32,
    finished: bool,
}

/// A scripted stand-in for the drill site, driven through the same
/// [`BrowserDriver`] interface as a real browser.
pub struct RehearsalBrowser<C = SystemClock> {
    catalog: Catalog,
    username: String,
    password: String,
    clock: C,
    rng: StdRng,
    url: String,
    history: Vec<String>,
    dom: Dom,
    page: u64,
    logged_in: bool,
    login_error: bool,
    login_unresponsive: bool,
    homework_minutes: Option<u32>,
    drill: Option<Drill>,
    recorded: Vec<DrillResult>,
    click_failures: u32,
}

impl RehearsalBrowser {
    pub fn new(catalog: Catalog, username: &str, password: &str) -> Self {
        Self::with_clock(catalog, username, password, SystemClock::new())
    }
}

impl<C: Clock> RehearsalBrowser<C> {
    pub fn with_clock(catalog: Catalog, username: &str, password: &str, clock: C) -> Self {
        let mut browser = Self {
            catalog,
            username: username.to_string(),
            password: password.to_string(),
            clock,
            rng: StdRng::from_entropy(),
            url: String::new(),
            history: Vec::new(),
            dom: Dom::new(),
            page: 0,
            logged_in: false,
            login_error: false,
            login_unresponsive: false,
            homework_minutes: None,
            drill: None,
            recorded: Vec::new(),
            click_failures: 0,
        };
        browser.load(site::LOGIN_URL);
        browser
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// The login button stops responding, as if the site hung.
    pub fn set_login_unresponsive(&mut self, unresponsive: bool) {
        self.login_unresponsive = unresponsive;
    }

    /// The next `count` clicks on the check button are intercepted.
    pub fn intercept_check_clicks(&mut self, count: u32) {
        self.click_failures = count;
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn homework_minutes(&self) -> Option<u32> {
        self.homework_minutes
    }

    /// `(answered, correct)` as graded by the running drill.
    pub fn drill_stats(&self) -> Option<(u32, u32)> {
        self.drill.as_ref().map(|d| (d.answered, d.correct))
    }

    pub fn recorded_scores(&self) -> &[DrillResult] {
        &self.recorded
    }

    fn load(&mut self, url: &str) {
        self.page += 1;
        self.url = url.to_string();
        self.drill = None;
        self.dom = Dom::new();

        if url == site::LOGIN_URL {
            self.render_login();
        } else if url == site::LOGOUT_URL {
            self.logged_in = false;
        } else if !self.logged_in {
            self.url = site::LOGIN_URL.to_string();
            self.render_login();
        } else if url == site::ACTIVITIES_URL {
            self.render_activities();
        } else if let Some(activity) = self.catalog.by_url(url).cloned() {
            if url == activity.chart_url() {
                render_chart(&mut self.dom, &activity);
            } else if url == activity.homework_url() {
                render_homework(&mut self.dom);
            } else {
                self.dom
                    .append(Dom::BODY, Node::new("h1").text(&activity.name));
            }
        } else {
            self.dom.append(Dom::BODY, Node::new("h1").text("Not Found"));
        }
        debug!(url = %self.url, "rehearsal page loaded");
    }

    fn render_login(&mut self) {
        let dom = &mut self.dom;
        dom.append(Dom::BODY, Node::new("input").id(site::USERNAME_ID));
        dom.append(Dom::BODY, Node::new("input").id(site::PASSWORD_ID));
        dom.append(
            Dom::BODY,
            Node::new("button")
                .id(site::LOGIN_BUTTON_ID)
                .text("Log In")
                .on_click(Action::Login),
        );
        // the error marker only survives one page load
        if std::mem::take(&mut self.login_error) {
            dom.append(
                Dom::BODY,
                Node::new("div")
                    .id(site::LOGIN_ERRORS_ID)
                    .text("Incorrect username or password"),
            );
        }
    }

    fn render_activities(&mut self) {
        let list = self
            .dom
            .append(Dom::BODY, Node::new("div").id(site::ACTIVITIES_ID));
        for activity in self.catalog.activities() {
            self.dom.append(
                list,
                Node::new("a")
                    .text(&activity.name)
                    .on_click(Action::Follow(activity.url())),
            );
        }
    }

    fn start_drill(&mut self) -> Result<(), DriverError> {
        let activity = self
            .catalog
            .by_url(&self.url)
            .cloned()
            .ok_or_else(|| DriverError::Other(format!("no activity at {}", self.url)))?;
        let minutes = self.homework_minutes.unwrap_or(DEFAULT_DRILL_MINUTES);

        self.page += 1;
        self.dom = Dom::new();
        match activity.kind {
            ActivityKind::Vocabulary => {
                self.dom
                    .append(Dom::BODY, Node::new("div").id(site::QUESTION_ID));
            }
            ActivityKind::Conjugation => {
                self.dom
                    .append(Dom::BODY, Node::new("div").id(site::PRONOUN_ID));
                self.dom
                    .append(Dom::BODY, Node::new("div").id(site::VERB_ID));
            }
        }
        self.dom
            .append(Dom::BODY, Node::new("input").id(site::ANSWER_ID));
        self.dom.append(
            Dom::BODY,
            Node::new("button")
                .id(site::CHECK_BUTTON_ID)
                .text("Check")
                .on_click(Action::Check),
        );

        self.drill = Some(Drill {
            activity,
            started: self.clock.now(),
            limit: Duration::from_secs(60 * u64::from(minutes)),
            expected: String::new(),
            answered: 0,
            correct: 0,
            finished: false,
        });
        self.next_question();
        Ok(())
    }

    fn next_question(&mut self) {
        let Some(drill) = self.drill.as_mut() else {
            return;
        };
        match drill.activity.kind {
            ActivityKind::Vocabulary => {
                if let Some((english, spanish)) = drill.activity.vocabulary.choose(&mut self.rng) {
                    drill.expected = spanish.clone();
                    set_text(&mut self.dom, site::QUESTION_ID, english);
                }
            }
            ActivityKind::Conjugation => {
                let Some(verb) = drill.activity.verbs.choose(&mut self.rng) else {
                    return;
                };
                let Some((pronoun, form)) = verb.forms.choose(&mut self.rng) else {
                    return;
                };
                let subject = SUBJECTS
                    .iter()
                    .find(|(p, _)| *p == pronoun.as_str())
                    .and_then(|(_, shown)| shown.choose(&mut self.rng))
                    .copied()
                    .unwrap_or(pronoun.as_str());
                drill.expected = form.clone();
                set_text(&mut self.dom, site::PRONOUN_ID, subject);
                set_text(&mut self.dom, site::VERB_ID, &verb.verb);
            }
        }
    }

    /// Ends the drill once its timer has run out: inputs lock and the
    /// score panel appears.
    fn sync(&mut self) {
        let now = self.clock.now();
        let Some(drill) = self.drill.as_mut() else {
            return;
        };
        if drill.finished || now.saturating_sub(drill.started) < drill.limit {
            return;
        }
        drill.finished = true;
        let percent = (100 * drill.correct).checked_div(drill.answered).unwrap_or(0);

        for id in [site::ANSWER_ID, site::CHECK_BUTTON_ID] {
            if let Some(node) = node_by_id(&mut self.dom, id) {
                node.enabled = false;
            }
        }
        self.dom.append(
            Dom::BODY,
            Node::new("label").text(&format!("{}: {percent}%", site::FINISHED_LABEL_TEXT)),
        );
        self.dom.append(
            Dom::BODY,
            Node::new("button")
                .text(site::RECORD_SCORE_TEXT)
                .on_click(Action::RecordScore),
        );
    }

    fn resolve(&self, handle: &Handle) -> Result<&Node, DriverError> {
        if handle.page != self.page {
            return Err(DriverError::Other("stale element reference".into()));
        }
        self.dom
            .node(handle.node)
            .ok_or_else(|| DriverError::Other("stale element reference".into()))
    }

    fn resolve_input(&mut self, handle: &Handle) -> Result<&mut Node, DriverError> {
        let node = self.resolve(handle)?;
        if node.tag != "input" || !node.displayed || !node.enabled {
            return Err(DriverError::NotInteractable);
        }
        self.dom
            .node_mut(handle.node)
            .ok_or(DriverError::NotInteractable)
    }

    fn handle(&self, node: usize) -> Handle {
        Handle {
            page: self.page,
            node,
        }
    }

    fn perform(&mut self, action: Action) -> Result<(), DriverError> {
        match action {
            Action::Login => {
                if self.login_unresponsive {
                    return Ok(());
                }
                let user = input_value(&mut self.dom, site::USERNAME_ID);
                let pass = input_value(&mut self.dom, site::PASSWORD_ID);
                if user == self.username && pass == self.password {
                    self.logged_in = true;
                    self.login_error = false;
                    self.navigate(site::ACTIVITIES_URL);
                } else {
                    self.login_error = true;
                    self.load(site::LOGIN_URL);
                }
            }
            Action::Follow(url) => self.navigate(&url),
            Action::OpenSlider => {
                if let Some(node) = node_by_id(&mut self.dom, site::TIME_INPUT_ID) {
                    node.displayed = true;
                }
            }
            Action::SaveSettings => {
                let minutes = input_value(&mut self.dom, site::TIME_INPUT_ID);
                self.homework_minutes = minutes.trim().parse::<u32>().ok().map(|m| m.clamp(1, 45));
            }
            Action::StartDrill => self.start_drill()?,
            Action::Check => {
                if self.click_failures > 0 {
                    self.click_failures -= 1;
                    return Err(DriverError::ClickIntercepted);
                }
                let typed = input_value(&mut self.dom, site::ANSWER_ID);
                if let Some(drill) = self.drill.as_mut() {
                    drill.answered += 1;
                    if typed.trim() == drill.expected {
                        drill.correct += 1;
                    }
                }
                if let Some(node) = node_by_id(&mut self.dom, site::ANSWER_ID) {
                    node.value.clear();
                }
                self.next_question();
            }
            Action::RecordScore => {
                if let Some(drill) = self.drill.as_ref().filter(|d| d.finished) {
                    self.recorded.push(DrillResult {
                        activity_id: drill.activity.id,
                        answered: drill.answered,
                        correct: drill.correct,
                    });
                }
            }
        }
        Ok(())
    }

    fn navigate(&mut self, url: &str) {
        let previous = std::mem::take(&mut self.url);
        self.history.push(previous);
        self.load(url);
    }
}

impl<C: Clock> BrowserDriver for RehearsalBrowser<C> {
    type Element = Handle;

    fn find(&mut self, locator: &Locator) -> Result<Handle, DriverError> {
        self.sync();
        self.dom
            .query(Dom::BODY, locator)
            .first()
            .map(|&n| self.handle(n))
            .ok_or_else(|| DriverError::NoSuchElement(locator.clone()))
    }

    fn find_all(&mut self, locator: &Locator) -> Result<Vec<Handle>, DriverError> {
        self.sync();
        Ok(self
            .dom
            .query(Dom::BODY, locator)
            .into_iter()
            .map(|n| self.handle(n))
            .collect())
    }

    fn find_within(&mut self, parent: &Handle, locator: &Locator) -> Result<Handle, DriverError> {
        self.find_all_within(parent, locator)?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::NoSuchElement(locator.clone()))
    }

    fn find_all_within(
        &mut self,
        parent: &Handle,
        locator: &Locator,
    ) -> Result<Vec<Handle>, DriverError> {
        self.sync();
        self.resolve(parent)?;
        Ok(self
            .dom
            .query(parent.node, locator)
            .into_iter()
            .map(|n| self.handle(n))
            .collect())
    }

    fn text(&mut self, element: &Handle) -> Result<String, DriverError> {
        self.sync();
        Ok(self.resolve(element)?.text.clone())
    }

    fn click(&mut self, element: &Handle) -> Result<(), DriverError> {
        self.sync();
        let node = self.resolve(element)?;
        if !node.displayed || !node.enabled {
            return Err(DriverError::NotInteractable);
        }
        match node.action.clone() {
            Some(action) => self.perform(action),
            None => Ok(()),
        }
    }

    fn clear(&mut self, element: &Handle) -> Result<(), DriverError> {
        self.sync();
        self.resolve_input(element)?.value.clear();
        Ok(())
    }

    fn send_keys(&mut self, element: &Handle, text: &str) -> Result<(), DriverError> {
        self.sync();
        self.resolve_input(element)?.value.push_str(text);
        Ok(())
    }

    fn is_displayed(&mut self, element: &Handle) -> Result<bool, DriverError> {
        self.sync();
        Ok(self.resolve(element)?.displayed)
    }

    fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.url.clone())
    }

    fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        self.navigate(url);
        Ok(())
    }

    fn back(&mut self) -> Result<(), DriverError> {
        let previous = self
            .history
            .pop()
            .ok_or_else(|| DriverError::Navigation("no page to go back to".into()))?;
        self.load(&previous);
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), DriverError> {
        let url = self.url.clone();
        self.load(&url);
        Ok(())
    }
}

fn render_chart(dom: &mut Dom, activity: &SampleActivity) {
    match activity.kind {
        ActivityKind::Vocabulary => {
            let table = dom.append(Dom::BODY, Node::new("table").class("table table--fat"));
            for (n, (english, spanish)) in activity.vocabulary.iter().enumerate() {
                let row = dom.append(table, Node::new("tr"));
                dom.append(row, Node::new("td").text(&format!("{}. {english}", n + 1)));
                dom.append(row, Node::new("td").text(&format!("{}. {spanish}", n + 1)));
            }
        }
        ActivityKind::Conjugation => {
            for verb in &activity.verbs {
                let block = dom.append(Dom::BODY, Node::new("div").class("mb-60 no-break"));
                dom.append(
                    block,
                    Node::new("span")
                        .class("fw--bold text--up")
                        .text(&verb.verb.to_uppercase()),
                );
                let table = dom.append(block, Node::new("table"));
                for (pronoun, form) in &verb.forms {
                    let row = dom.append(table, Node::new("tr"));
                    dom.append(row, Node::new("td").class("text-center bg-h5").text(pronoun));
                    dom.append(row, Node::new("td").class("text-center fsty--italic").text(form));
                }
            }
        }
    }
}

fn render_homework(dom: &mut Dom) {
    dom.append(
        Dom::BODY,
        Node::new("div").class("slider-time").on_click(Action::OpenSlider),
    );
    dom.append(Dom::BODY, Node::new("input").id(site::TIME_INPUT_ID).hidden());
    dom.append(
        Dom::BODY,
        Node::new("button")
            .text(site::SAVE_SETTINGS_TEXT)
            .on_click(Action::SaveSettings),
    );
    dom.append(
        Dom::BODY,
        Node::new("button")
            .id(site::START_BUTTON_ID)
            .text("Start")
            .on_click(Action::StartDrill),
    );
}

fn node_by_id<'a>(dom: &'a mut Dom, id: &str) -> Option<&'a mut Node> {
    let idx = dom.query(Dom::BODY, &Locator::id(id)).first().copied()?;
    dom.node_mut(idx)
}

fn input_value(dom: &mut Dom, id: &str) -> String {
    node_by_id(dom, id).map(|n| n.value.clone()).unwrap_or_default()
}

fn set_text(dom: &mut Dom, id: &str, text: &str) {
    if let Some(node) = node_by_id(dom, id) {
        node.text = text.to_string();
    }
}
