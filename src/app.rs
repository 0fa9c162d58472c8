use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::client::{SUBMIT_FAILED_NOTICE, SubmissionTracker, SubmitOutcome, SubmitRequest, Submitter};
use crate::config::Config;
use crate::exercise::input::WidgetKey;
use crate::exercise::style::PresentationStyle;
use crate::exercise::test::CTest;
use crate::session::controller::{AllAtOnceSession, SequentialSession, SequentialStep};
use crate::session::participant::{self, ParticipantStore};
use crate::session::result::TestSubmission;
use crate::text::catalog::Catalog;
use crate::ui::components::menu::{Menu, MenuAction};
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Menu,
    TestPicker,
    Test,
    Completion,
    NotFound,
    StyleExamples,
}

/// The tests currently on screen and the session driving them.
pub enum Run {
    Single(CTest),
    Sequential {
        session: SequentialSession,
        test: CTest,
    },
    AllAtOnce {
        session: AllAtOnceSession,
        tests: Vec<CTest>,
        active: usize,
    },
}

impl Run {
    pub fn current(&self) -> Option<&CTest> {
        match self {
            Run::Single(test) | Run::Sequential { test, .. } => Some(test),
            Run::AllAtOnce { tests, active, .. } => tests.get(*active),
        }
    }

    pub fn current_mut(&mut self) -> Option<&mut CTest> {
        match self {
            Run::Single(test) | Run::Sequential { test, .. } => Some(test),
            Run::AllAtOnce { tests, active, .. } => tests.get_mut(*active),
        }
    }

    pub fn participant_id(&self) -> Option<&str> {
        match self {
            Run::Single(_) => None,
            Run::Sequential { session, .. } => Some(session.session().participant_id()),
            Run::AllAtOnce { session, .. } => Some(session.session().participant_id()),
        }
    }
}

/// What the completion screen reports.
pub enum Finished {
    Single(TestSubmission),
    Session {
        participant_id: String,
        completed: usize,
    },
}

pub struct App {
    pub screen: AppScreen,
    pub run: Option<Run>,
    pub finished: Option<Finished>,
    pub notice: Option<&'static str>,
    pub pending_retry: Option<SubmitRequest>,
    pub missing_test: Option<String>,
    pub menu: Menu<'static>,
    pub theme: &'static Theme,
    pub config: Config,
    pub catalog: Catalog,
    pub picker_selected: usize,
    pub picker_style: PresentationStyle,
    pub should_quit: bool,
    pub confirm_leave: bool,
    tracker: SubmissionTracker,
    participants: ParticipantStore,
}

impl App {
    pub fn new(
        config: Config,
        catalog: Catalog,
        theme: &'static Theme,
        submitter: Arc<dyn Submitter>,
    ) -> Self {
        let menu = Menu::new(theme, catalog.len());
        let participants = ParticipantStore::new(config.data_path());
        Self {
            screen: AppScreen::Menu,
            run: None,
            finished: None,
            notice: None,
            pending_retry: None,
            missing_test: None,
            menu,
            theme,
            config,
            catalog,
            picker_selected: 0,
            picker_style: PresentationStyle::Box,
            should_quit: false,
            confirm_leave: false,
            tracker: SubmissionTracker::new(submitter),
            participants,
        }
    }

    pub fn set_theme(&mut self, theme: &'static Theme) {
        self.theme = theme;
        self.menu.theme = theme;
    }

    pub fn is_submitting(&self) -> bool {
        self.tracker.is_in_flight()
    }

    pub fn go_to_menu(&mut self) {
        self.run = None;
        self.finished = None;
        self.notice = None;
        self.pending_retry = None;
        self.missing_test = None;
        self.confirm_leave = false;
        self.screen = AppScreen::Menu;
    }

    /// Leave the running test for the menu. With completed session tests
    /// on the line, the first call only arms a confirmation.
    pub fn leave_test(&mut self) {
        let has_progress = self.session_progress().is_some_and(|(done, _)| done > 0);
        if has_progress && !self.confirm_leave {
            self.confirm_leave = true;
        } else {
            self.go_to_menu();
        }
    }

    pub fn cancel_leave(&mut self) {
        self.confirm_leave = false;
    }

    pub fn go_to_picker(&mut self) {
        self.picker_selected = self
            .picker_selected
            .min(self.catalog.len().saturating_sub(1));
        self.screen = AppScreen::TestPicker;
    }

    pub fn go_to_style_examples(&mut self) {
        self.screen = AppScreen::StyleExamples;
    }

    pub fn activate(&mut self, action: MenuAction) {
        match action {
            MenuAction::Sequential => self.start_sequential(),
            MenuAction::AllAtOnce => self.start_all_at_once(),
            MenuAction::SingleTest => self.go_to_picker(),
            MenuAction::StyleExamples => self.go_to_style_examples(),
            MenuAction::Quit => self.should_quit = true,
        }
    }

    pub fn picker_next(&mut self) {
        if !self.catalog.is_empty() {
            self.picker_selected = (self.picker_selected + 1) % self.catalog.len();
        }
    }

    pub fn picker_prev(&mut self) {
        let len = self.catalog.len();
        if len > 0 {
            self.picker_selected = (self.picker_selected + len - 1) % len;
        }
    }

    pub fn start_picked(&mut self) {
        let Some(id) = self
            .catalog
            .all()
            .get(self.picker_selected)
            .map(|s| s.id.clone())
        else {
            return;
        };
        self.start_single(&id, self.picker_style);
    }

    /// Open one test by id. Unknown ids land on the not-found screen.
    pub fn start_single(&mut self, test_id: &str, style: PresentationStyle) {
        self.finished = None;
        match self.catalog.get(test_id) {
            Some(summary) => {
                log::info!("starting single test {test_id} ({style})");
                self.run = Some(Run::Single(CTest::new(
                    summary,
                    style,
                    self.config.continue_delay(),
                )));
                self.screen = AppScreen::Test;
            }
            None => {
                log::warn!("test {test_id} not found");
                self.run = None;
                self.missing_test = Some(test_id.to_string());
                self.screen = AppScreen::NotFound;
            }
        }
    }

    pub fn start_sequential(&mut self) {
        if self.catalog.is_empty() {
            return;
        }
        let pid = self.participant_id();
        let ids = self.catalog.all().iter().map(|s| s.id.clone()).collect();
        let session = SequentialSession::new(pid, ids);
        let Some(test) = self.build_test(session.current(), session.style()) else {
            return;
        };
        log::info!(
            "sequential session for {} in {} style",
            session.session().participant_id(),
            session.style()
        );
        self.finished = None;
        self.run = Some(Run::Sequential { session, test });
        self.screen = AppScreen::Test;
    }

    pub fn start_all_at_once(&mut self) {
        if self.catalog.is_empty() {
            return;
        }
        let pid = self.participant_id();
        let ids: Vec<String> = self.catalog.all().iter().map(|s| s.id.clone()).collect();
        let session = AllAtOnceSession::new(pid, ids, &self.config.all_at_once_styles);
        let delay = self.config.continue_delay();
        let tests: Vec<CTest> = self
            .catalog
            .all()
            .iter()
            .enumerate()
            .map(|(pos, summary)| CTest::new(summary, session.style_for(pos), delay))
            .collect();
        log::info!(
            "all-at-once session for {} with {} tests",
            session.session().participant_id(),
            tests.len()
        );
        self.finished = None;
        self.run = Some(Run::AllAtOnce {
            session,
            tests,
            active: 0,
        });
        self.screen = AppScreen::Test;
    }

    /// The stored participant id, or a fresh one. A store failure still
    /// yields a usable in-memory id.
    fn participant_id(&mut self) -> String {
        match self.participants.load_or_create() {
            Ok(id) => id,
            Err(e) => {
                log::warn!("participant id not persisted: {e:#}");
                participant::generate_id(&mut SmallRng::from_entropy())
            }
        }
    }

    fn build_test(&self, test_id: Option<&str>, style: PresentationStyle) -> Option<CTest> {
        let summary = self.catalog.get(test_id?)?;
        Some(CTest::new(summary, style, self.config.continue_delay()))
    }

    pub fn current_test(&self) -> Option<&CTest> {
        self.run.as_ref()?.current()
    }

    pub fn current_test_mut(&mut self) -> Option<&mut CTest> {
        self.run.as_mut()?.current_mut()
    }

    pub fn handle_test_key(&mut self, key: WidgetKey) {
        if let Some(test) = self.current_test_mut() {
            test.handle_key(key);
        }
    }

    pub fn check_answers(&mut self) {
        let now = Instant::now();
        if let Some(test) = self.current_test_mut() {
            test.check_answers(now);
        }
    }

    /// False while a submission is in flight.
    pub fn can_continue(&self) -> bool {
        !self.is_submitting() && self.current_test().is_some_and(CTest::can_continue)
    }

    /// Continue past the current test once its answers have been shown.
    pub fn continue_test(&mut self) {
        if self.is_submitting() {
            return;
        }
        let Some(result) = self.current_test().and_then(CTest::submission) else {
            return;
        };
        let delay = self.config.continue_delay();
        let Some(run) = self.run.as_mut() else {
            return;
        };
        let request = match run {
            Run::Single(_) => Some(SubmitRequest::Single(result)),
            Run::Sequential { session, test } => match session.complete(result) {
                SequentialStep::Next(_) => {
                    let next = session
                        .current()
                        .and_then(|id| self.catalog.get(id))
                        .map(|summary| CTest::new(summary, session.style(), delay));
                    if let Some(next) = next {
                        *test = next;
                    }
                    None
                }
                SequentialStep::Finished(batch) => Some(SubmitRequest::Batch(batch)),
            },
            Run::AllAtOnce {
                session,
                tests,
                active,
            } => {
                session.complete(result);
                if let Some(next) = (0..tests.len())
                    .map(|offset| (*active + 1 + offset) % tests.len())
                    .find(|&i| !session.is_completed(&tests[i].test_id))
                {
                    *active = next;
                }
                None
            }
        };
        if let Some(request) = request {
            self.submit(request);
        }
    }

    pub fn can_submit_all(&self) -> bool {
        !self.is_submitting()
            && matches!(&self.run, Some(Run::AllAtOnce { session, .. }) if session.can_submit())
    }

    pub fn submit_all(&mut self) {
        if !self.is_submitting()
            && let Some(Run::AllAtOnce { session, .. }) = &self.run
            && let Some(batch) = session.batch()
        {
            self.submit(SubmitRequest::Batch(batch));
        }
    }

    pub fn switch_test(&mut self, forward: bool) {
        if let Some(Run::AllAtOnce { tests, active, .. }) = self.run.as_mut()
            && !tests.is_empty()
        {
            let len = tests.len();
            *active = if forward {
                (*active + 1) % len
            } else {
                (*active + len - 1) % len
            };
        }
    }

    fn submit(&mut self, request: SubmitRequest) {
        self.notice = None;
        self.pending_retry = None;
        self.tracker.start(request);
    }

    pub fn retry_submission(&mut self) {
        if let Some(request) = self.pending_retry.take() {
            log::info!("retrying submission");
            self.submit(request);
        }
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Advance timers and collect a finished submission.
    pub fn tick(&mut self, now: Instant) {
        match self.run.as_mut() {
            Some(Run::AllAtOnce { tests, .. }) => {
                for test in tests {
                    test.tick(now);
                }
            }
            Some(run) => {
                if let Some(test) = run.current_mut() {
                    test.tick(now);
                }
            }
            None => {}
        }
        if let Some(outcome) = self.tracker.poll() {
            self.finish_submission(outcome);
        }
    }

    fn finish_submission(&mut self, outcome: SubmitOutcome) {
        match (outcome.result, outcome.request) {
            (Ok(_), SubmitRequest::Single(result)) => {
                self.finished = Some(Finished::Single(result));
                self.screen = AppScreen::Completion;
            }
            (Ok(participant_id), SubmitRequest::Batch(batch)) => {
                if let Err(e) = self.participants.clear() {
                    log::warn!("could not clear participant id: {e:#}");
                }
                self.finished = Some(Finished::Session {
                    participant_id,
                    completed: batch.results.len(),
                });
                self.screen = AppScreen::Completion;
            }
            (Err(_), request) => {
                self.notice = Some(SUBMIT_FAILED_NOTICE);
                self.pending_retry = Some(request);
            }
        }
    }

    /// Completed and total tests of the running session.
    pub fn session_progress(&self) -> Option<(usize, usize)> {
        match self.run.as_ref()? {
            Run::Single(_) => None,
            Run::Sequential { session, .. } => Some((session.position(), session.len())),
            Run::AllAtOnce { session, .. } => Some((session.completed_count(), session.len())),
        }
    }
}
