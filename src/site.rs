//! The drill site's page contract: addresses, element locators and the
//! URL rewrites that lead from an activity to its chart and homework pages.
//! All of this is a fixed external contract; when the site changes, this
//! is the file that changes.

use crate::answer_key::ActivityKind;
use crate::driver::Locator;
use crate::error::AutomationError;

pub const LOGIN_URL: &str = "https://conjuguemos.com/auth/login";
pub const LOGOUT_URL: &str = "https://conjuguemos.com/auth/logout";
pub const ACTIVITIES_URL: &str = "https://conjuguemos.com/student/activities";

// login page
pub const USERNAME_ID: &str = "identity";
pub const PASSWORD_ID: &str = "password";
pub const LOGIN_BUTTON_ID: &str = "login_btn";
pub const LOGIN_ERRORS_ID: &str = "form_errors";

// activity list
pub const ACTIVITIES_ID: &str = "activities";
pub const ACTIVITY_LINK: &str = "a";

// drill page
pub const QUESTION_ID: &str = "question-input";
pub const PRONOUN_ID: &str = "pronoun-input";
pub const VERB_ID: &str = "verb-input";
pub const ANSWER_ID: &str = "answer-input";
pub const CHECK_BUTTON_ID: &str = "check-button";

// homework settings
pub const TIME_SLIDER: &str = ".slider-time";
pub const TIME_INPUT_ID: &str = "set_time_input";
pub const SAVE_SETTINGS_TEXT: &str = "Save Settings";
pub const START_BUTTON_ID: &str = "start-button";

// finish line
pub const FINISHED_LABEL_TEXT: &str = "Avg Score";
pub const RECORD_SCORE_TEXT: &str = "Record Score";

// answer charts
pub const VOCAB_TABLE: &str = "table.table.table--fat";
pub const VOCAB_CELL: &str = "td";
pub const VERB_BLOCK: &str = "div.mb-60.no-break";
pub const VERB_LABEL: &str = "span.fw--bold.text--up";
pub const PRONOUN_CELL: &str = "td.text-center.bg-h5";
pub const CONJUGATED_CELL: &str = "td.text-center.fsty--italic";

pub fn save_settings_button() -> Locator {
    Locator::containing("*", SAVE_SETTINGS_TEXT)
}

pub fn finished_label() -> Locator {
    Locator::containing("label", FINISHED_LABEL_TEXT)
}

pub fn record_score_button() -> Locator {
    Locator::containing("button", RECORD_SCORE_TEXT)
}

/// Vocabulary activities live under `/vocabulary/`, everything else is a
/// verb activity.
pub fn activity_kind(url: &str) -> ActivityKind {
    if url.contains("vocabulary") {
        ActivityKind::Vocabulary
    } else {
        ActivityKind::Conjugation
    }
}

/// Rewrites an activity URL into the address of its answer chart.
///
/// `…/vocabulary/123` becomes `…/vocabulary/vocab_chart/123` and
/// `…/verb/45` becomes `…/verb/verb_chart/45`.
pub fn chart_url(activity_url: &str) -> Result<(ActivityKind, String), AutomationError> {
    let kind = activity_kind(activity_url);
    let (marker, insert) = match kind {
        ActivityKind::Vocabulary => ("vocabulary", "/vocab_chart"),
        ActivityKind::Conjugation => ("verb", "/verb_chart"),
    };
    let pos = activity_url
        .find(marker)
        .map(|p| p + marker.len())
        .ok_or_else(|| AutomationError::UnrecognizedActivity(activity_url.to_string()))?;

    let mut url = String::with_capacity(activity_url.len() + insert.len());
    url.push_str(&activity_url[..pos]);
    url.push_str(insert);
    url.push_str(&activity_url[pos..]);
    Ok((kind, url))
}

/// Inserts a `homework` segment before the last path segment:
/// `…/verb/45` becomes `…/verb/homework/45`.
pub fn homework_url(activity_url: &str) -> Result<String, AutomationError> {
    let path_start = activity_url.find("://").map_or(0, |p| p + 3);
    let last_slash = activity_url
        .rfind('/')
        .filter(|&p| p >= path_start)
        .ok_or_else(|| AutomationError::UnrecognizedActivity(activity_url.to_string()))?;

    Ok(format!(
        "{}/homework{}",
        &activity_url[..last_slash],
        &activity_url[last_slash..]
    ))
}
