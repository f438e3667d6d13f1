//! Site navigation: login, the activity list, chart and homework pages,
//! and the drill-page bindings handed to the pacing loop.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::answer_key::{ActivityKind, AnswerKey};
use crate::driver::{BrowserDriver, Locator};
use crate::error::{AutomationError, DriverError};
use crate::extractor::extract;
use crate::finalize::{finalize, RetryPolicy};
use crate::question::{FinishLine, Prompt, QuestionSource};
use crate::runtime::{Clock, SystemClock};
use crate::site;

pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(5);
pub const PAGE_WAIT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(100);
const SETTINGS_SETTLE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    Rejected,
    TimedOut,
}

/// An entry of the student's activity list.
#[derive(Debug, Clone)]
pub struct Activity<E> {
    pub name: String,
    pub link: E,
}

pub struct Navigator<D, C = SystemClock> {
    driver: D,
    clock: C,
}

impl<D: BrowserDriver> Navigator<D> {
    pub fn new(driver: D) -> Self {
        Self::with_clock(driver, SystemClock::new())
    }
}

impl<D: BrowserDriver, C: Clock> Navigator<D, C> {
    pub fn with_clock(driver: D, clock: C) -> Self {
        Self { driver, clock }
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Fills in the login form and waits up to five seconds for either a
    /// redirect away from the login page or the form's error marker.
    pub fn login(&mut self, username: &str, password: &str) -> Result<LoginOutcome, AutomationError> {
        let user_field = self.driver.find(&Locator::id(site::USERNAME_ID))?;
        let pass_field = self.driver.find(&Locator::id(site::PASSWORD_ID))?;
        let button = self.driver.find(&Locator::id(site::LOGIN_BUTTON_ID))?;

        self.driver.clear(&user_field)?;
        self.driver.send_keys(&user_field, username)?;
        self.driver.clear(&pass_field)?;
        self.driver.send_keys(&pass_field, password)?;
        self.driver.click(&button)?;

        let started = self.clock.now();
        while self.clock.now().saturating_sub(started) < LOGIN_TIMEOUT {
            let url = self.driver.current_url()?;
            if url != site::LOGIN_URL {
                info!(%username, "logged in");
                return Ok(LoginOutcome::Success);
            }
            match self.driver.find(&Locator::id(site::LOGIN_ERRORS_ID)) {
                Ok(_) => {
                    // reload so the form is clean for the next attempt
                    self.driver.goto(&url)?;
                    warn!(%username, "login rejected");
                    return Ok(LoginOutcome::Rejected);
                }
                Err(DriverError::NoSuchElement(_)) => {}
                Err(err) => return Err(err.into()),
            }
            self.clock.sleep(POLL_INTERVAL);
        }
        warn!(%username, "login timed out");
        Ok(LoginOutcome::TimedOut)
    }

    pub fn logout(&mut self) -> Result<(), AutomationError> {
        self.driver.goto(site::LOGOUT_URL)?;
        self.driver.goto(site::LOGIN_URL)?;
        Ok(())
    }

    pub fn back_to_activities(&mut self) -> Result<(), AutomationError> {
        self.driver.goto(site::ACTIVITIES_URL)?;
        Ok(())
    }

    pub fn list_activities(&mut self) -> Result<Vec<Activity<D::Element>>, AutomationError> {
        let list = self.wait_for(&Locator::id(site::ACTIVITIES_ID), PAGE_WAIT)?;
        let links = self
            .driver
            .find_all_within(&list, &Locator::css(site::ACTIVITY_LINK))?;

        let mut activities = Vec::with_capacity(links.len());
        for link in links {
            let name = self.driver.text(&link)?.trim().to_string();
            activities.push(Activity { name, link });
        }
        debug!(count = activities.len(), "activities listed");
        Ok(activities)
    }

    pub fn open_activity(&mut self, activity: &Activity<D::Element>) -> Result<(), AutomationError> {
        info!(name = %activity.name, "opening activity");
        self.driver.click(&activity.link)?;
        Ok(())
    }

    /// From an activity page: visit its answer chart, scrape it and come
    /// back.
    pub fn load_answer_key(&mut self) -> Result<AnswerKey, AutomationError> {
        let url = self.driver.current_url()?;
        let (kind, chart) = site::chart_url(&url)?;
        debug!(%chart, "loading answer chart");

        self.driver.goto(&chart)?;
        self.driver.refresh()?;
        let key = extract(&mut self.driver, kind);
        let back = self.driver.back();
        let key = key?;
        back?;
        Ok(key)
    }

    /// From an activity page: open its homework settings, set the timer
    /// and start the drill.
    pub fn prepare_homework_settings(&mut self, minutes: u32) -> Result<(), AutomationError> {
        let url = self.driver.current_url()?;
        self.driver.goto(&site::homework_url(&url)?)?;

        let slider = self.driver.find(&Locator::css(site::TIME_SLIDER))?;
        self.driver.click(&slider)?;
        let time_input = self.driver.find(&Locator::id(site::TIME_INPUT_ID))?;
        self.driver.clear(&time_input)?;
        self.driver.send_keys(&time_input, &minutes.to_string())?;
        let save = self.driver.find(&site::save_settings_button())?;
        self.driver.click(&save)?;

        self.clock.sleep(SETTINGS_SETTLE);
        let start = self.driver.find(&Locator::id(site::START_BUTTON_ID))?;
        self.driver.click(&start)?;
        info!(minutes, "drill started");
        Ok(())
    }

    /// Binds the drill page's fields. Fails with `StructureMissing` when
    /// the page is not a running drill of the given kind.
    pub fn question_source(
        &mut self,
        kind: ActivityKind,
    ) -> Result<DriverQuestionSource<'_, D>, AutomationError> {
        DriverQuestionSource::bind(&mut self.driver, kind)
    }

    /// Waits for the finished drill to show its score, then records it.
    pub fn finalize(&mut self, kind: ActivityKind, policy: &RetryPolicy) -> Result<(), AutomationError> {
        let mut source = DriverQuestionSource::bind(&mut self.driver, kind)?;
        finalize(&mut source, &self.clock, policy)
    }

    fn wait_for(&mut self, locator: &Locator, timeout: Duration) -> Result<D::Element, AutomationError> {
        let started = self.clock.now();
        loop {
            match self.driver.find(locator) {
                Ok(element) => return Ok(element),
                Err(DriverError::NoSuchElement(_))
                    if self.clock.now().saturating_sub(started) < timeout =>
                {
                    self.clock.sleep(POLL_INTERVAL)
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

#[derive(Debug, Clone)]
enum PromptFields<E> {
    Vocabulary { question: E },
    Conjugation { pronoun: E, verb: E },
}

/// The drill page as a [`QuestionSource`] and [`FinishLine`].
pub struct DriverQuestionSource<'a, D: BrowserDriver> {
    driver: &'a mut D,
    fields: PromptFields<D::Element>,
    answer: D::Element,
    check: D::Element,
}

impl<D: BrowserDriver> std::fmt::Debug for DriverQuestionSource<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverQuestionSource")
            .field("fields", &self.fields)
            .field("answer", &self.answer)
            .field("check", &self.check)
            .finish_non_exhaustive()
    }
}

impl<'a, D: BrowserDriver> DriverQuestionSource<'a, D> {
    pub fn bind(driver: &'a mut D, kind: ActivityKind) -> Result<Self, AutomationError> {
        let fields = match kind {
            ActivityKind::Vocabulary => PromptFields::Vocabulary {
                question: driver.find(&Locator::id(site::QUESTION_ID))?,
            },
            ActivityKind::Conjugation => PromptFields::Conjugation {
                pronoun: driver.find(&Locator::id(site::PRONOUN_ID))?,
                verb: driver.find(&Locator::id(site::VERB_ID))?,
            },
        };
        let check = driver.find(&Locator::id(site::CHECK_BUTTON_ID))?;
        let answer = driver.find(&Locator::id(site::ANSWER_ID))?;
        Ok(Self {
            driver,
            fields,
            answer,
            check,
        })
    }
}

impl<D: BrowserDriver> QuestionSource for DriverQuestionSource<'_, D> {
    fn prompt(&mut self) -> Result<Prompt, DriverError> {
        match &self.fields {
            PromptFields::Vocabulary { question } => Ok(Prompt::Vocabulary {
                question: self.driver.text(question)?,
            }),
            PromptFields::Conjugation { pronoun, verb } => Ok(Prompt::Conjugation {
                pronoun: self.driver.text(pronoun)?,
                verb: self.driver.text(verb)?,
            }),
        }
    }

    fn submit(&mut self, answer: &str) -> Result<(), DriverError> {
        self.driver.clear(&self.answer)?;
        self.driver.send_keys(&self.answer, answer)?;
        self.driver.click(&self.check)
    }
}

impl<D: BrowserDriver> FinishLine for DriverQuestionSource<'_, D> {
    fn is_finished(&mut self) -> Result<bool, DriverError> {
        match self.driver.find(&site::finished_label()) {
            Ok(label) => self.driver.is_displayed(&label),
            Err(DriverError::NoSuchElement(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn record_score(&mut self) -> Result<bool, DriverError> {
        let outcome = self
            .driver
            .find(&site::record_score_button())
            .and_then(|button| self.driver.click(&button));
        match outcome {
            Ok(()) => Ok(true),
            Err(DriverError::NoSuchElement(_)) => Ok(false),
            Err(err) if err.is_transient() => Ok(false),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rehearsal::{Catalog, RehearsalBrowser, DEMO_PASSWORD, DEMO_USERNAME};
    use crate::runtime::ManualClock;
    use assert_matches::assert_matches;

    type Inner = RehearsalBrowser<ManualClock>;
    type Element = <Inner as BrowserDriver>::Element;

    /// Rehearsal site with injectable lookup and navigation failures.
    struct Flaky {
        inner: Inner,
        hidden: Option<Locator>,
        broken: Option<Locator>,
        back_fails: bool,
    }

    impl BrowserDriver for Flaky {
        type Element = Element;

        fn find(&mut self, locator: &Locator) -> Result<Element, DriverError> {
            if self.hidden.as_ref() == Some(locator) {
                return Err(DriverError::NoSuchElement(locator.clone()));
            }
            if self.broken.as_ref() == Some(locator) {
                return Err(DriverError::Navigation("page went away".into()));
            }
            self.inner.find(locator)
        }

        fn find_all(&mut self, locator: &Locator) -> Result<Vec<Element>, DriverError> {
            self.inner.find_all(locator)
        }

        fn find_within(&mut self, parent: &Element, locator: &Locator) -> Result<Element, DriverError> {
            self.inner.find_within(parent, locator)
        }

        fn find_all_within(
            &mut self,
            parent: &Element,
            locator: &Locator,
        ) -> Result<Vec<Element>, DriverError> {
            self.inner.find_all_within(parent, locator)
        }

        fn text(&mut self, element: &Element) -> Result<String, DriverError> {
            self.inner.text(element)
        }

        fn click(&mut self, element: &Element) -> Result<(), DriverError> {
            self.inner.click(element)
        }

        fn clear(&mut self, element: &Element) -> Result<(), DriverError> {
            self.inner.clear(element)
        }

        fn send_keys(&mut self, element: &Element, text: &str) -> Result<(), DriverError> {
            self.inner.send_keys(element, text)
        }

        fn is_displayed(&mut self, element: &Element) -> Result<bool, DriverError> {
            self.inner.is_displayed(element)
        }

        fn current_url(&mut self) -> Result<String, DriverError> {
            self.inner.current_url()
        }

        fn goto(&mut self, url: &str) -> Result<(), DriverError> {
            self.inner.goto(url)
        }

        fn back(&mut self) -> Result<(), DriverError> {
            if self.back_fails {
                return Err(DriverError::Navigation("no history".into()));
            }
            self.inner.back()
        }

        fn refresh(&mut self) -> Result<(), DriverError> {
            self.inner.refresh()
        }
    }

    fn navigator() -> (Navigator<Flaky, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let inner = RehearsalBrowser::with_clock(
            Catalog::embedded().unwrap(),
            DEMO_USERNAME,
            DEMO_PASSWORD,
            clock.clone(),
        );
        let flaky = Flaky {
            inner,
            hidden: None,
            broken: None,
            back_fails: false,
        };
        (Navigator::with_clock(flaky, clock.clone()), clock)
    }

    fn open_vocabulary(nav: &mut Navigator<Flaky, ManualClock>) {
        assert_eq!(
            nav.login(DEMO_USERNAME, DEMO_PASSWORD).unwrap(),
            LoginOutcome::Success
        );
        let name = Catalog::embedded()
            .unwrap()
            .first_of(ActivityKind::Vocabulary)
            .unwrap()
            .name
            .clone();
        let activities = nav.list_activities().unwrap();
        let entry = activities.iter().find(|a| a.name == name).unwrap();
        nav.open_activity(entry).unwrap();
    }

    #[test]
    fn login_surfaces_driver_failures_while_waiting() {
        let (mut nav, clock) = navigator();
        nav.driver_mut().broken = Some(Locator::id(site::LOGIN_ERRORS_ID));
        assert_matches!(
            nav.login(DEMO_USERNAME, "nope"),
            Err(AutomationError::Driver(DriverError::Navigation(_)))
        );
        assert!(clock.now() < LOGIN_TIMEOUT);
    }

    #[test]
    fn extraction_error_wins_over_failed_back() {
        let (mut nav, _) = navigator();
        open_vocabulary(&mut nav);
        nav.driver_mut().hidden = Some(Locator::css(site::VOCAB_TABLE));
        nav.driver_mut().back_fails = true;
        assert_matches!(
            nav.load_answer_key(),
            Err(AutomationError::StructureMissing(_))
        );
    }

    #[test]
    fn failed_back_after_good_extraction_is_reported() {
        let (mut nav, _) = navigator();
        open_vocabulary(&mut nav);
        nav.driver_mut().back_fails = true;
        assert_matches!(
            nav.load_answer_key(),
            Err(AutomationError::Driver(DriverError::Navigation(_)))
        );
    }
}
