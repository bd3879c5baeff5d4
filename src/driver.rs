use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, info};

use crate::config::{Config, FormPolicy, LedgerClock, MeridiemMode, Pacing};
use crate::error::{StepErrorKind, StepFailure};
use crate::form::{self, FormState, SelectorTable, TimeSlot};
use crate::mapper;
use crate::models::{
    AttendanceOutcome, ClockTime, EvalJudgment, MappedSession, SessionRating, StudentTold,
};
use crate::page::{ControlHandle, Page};

const FIELD_POLL: Duration = Duration::from_millis(50);

/// Progress of one session through the eval form. Entering a state performs
/// that state's action; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Start,
    IdentityPage,
    NavigateToEvalPage,
    AttendanceSection,
    B2BSection,
    DateSection,
    StartTimeSection,
    EndTimeSection,
    PreworkSection,
    TopicsSection,
    TASection,
    RatingSection,
    DropMentionSection,
    CommentsSection,
    Submitted,
}

impl DriverState {
    pub fn next(self) -> Option<DriverState> {
        use DriverState::*;
        let next = match self {
            Start => IdentityPage,
            IdentityPage => NavigateToEvalPage,
            NavigateToEvalPage => AttendanceSection,
            AttendanceSection => B2BSection,
            B2BSection => DateSection,
            DateSection => StartTimeSection,
            StartTimeSection => EndTimeSection,
            EndTimeSection => PreworkSection,
            PreworkSection => TopicsSection,
            TopicsSection => TASection,
            TASection => RatingSection,
            RatingSection => DropMentionSection,
            DropMentionSection => CommentsSection,
            CommentsSection => Submitted,
            Submitted => return None,
        };
        Some(next)
    }
}

/// Static inputs shared by every session of a batch.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub form_url: String,
    pub selectors: SelectorTable,
    pub pacing: Pacing,
    pub policy: FormPolicy,
    pub clock: LedgerClock,
}

impl DriverConfig {
    pub fn from_config(config: &Config) -> Self {
        DriverConfig {
            form_url: config.form_url.clone(),
            selectors: config.selector_table(),
            pacing: config.pacing.clone(),
            policy: config.policy.clone(),
            clock: config.ledger.clock,
        }
    }
}

/// Attendance radio for the eval question: told in person, then emailed, then
/// an inferred no-show. `None` leaves the question unanswered.
pub fn attendance_field(
    told: Option<StudentTold>,
    attendance: AttendanceOutcome,
) -> Option<&'static str> {
    match (told, attendance) {
        (Some(StudentTold::Yes), _) => Some(form::EVAL_TOLD_YES),
        (Some(StudentTold::Emailed), _) => Some(form::EVAL_TOLD_EMAIL),
        (None, AttendanceOutcome::NoShow) => Some(form::EVAL_NO_SHOW),
        (None, AttendanceOutcome::Attended) => None,
    }
}

pub fn rating_choice(attendance: AttendanceOutcome, rating: SessionRating) -> String {
    match (attendance, rating) {
        (AttendanceOutcome::NoShow, _) | (_, SessionRating::NoShow) => {
            form::RATING_NO_SHOW.to_string()
        }
        (AttendanceOutcome::Attended, SessionRating::Score(score)) => form::rating_field(score),
    }
}

async fn bounded<T>(
    limit: Duration,
    action: impl Future<Output = anyhow::Result<T>>,
) -> Result<T, StepErrorKind> {
    match timeout(limit, action).await {
        Ok(result) => result.map_err(StepErrorKind::Page),
        Err(_) => Err(StepErrorKind::Timeout(limit)),
    }
}

/// Fills the eval form for one session at a time on a borrowed page.
pub struct FormDriver<'a, P: Page + ?Sized> {
    page: &'a mut P,
    config: &'a DriverConfig,
}

impl<'a, P: Page + ?Sized> FormDriver<'a, P> {
    pub fn new(page: &'a mut P, config: &'a DriverConfig) -> Self {
        FormDriver { page, config }
    }

    /// Run the whole sequence. On failure the form is left as far as it got.
    pub async fn run(
        &mut self,
        session: &MappedSession,
        judgment: &EvalJudgment,
    ) -> Result<DriverState, StepFailure> {
        info!("Filling eval form for {}", session.label);
        let mut controls = FormState::default();
        let mut state = DriverState::Start;

        while let Some(next) = state.next() {
            debug!(?next, "entering form step");
            self.enter(next, session, judgment, &mut controls)
                .await
                .map_err(|kind| StepFailure::new(next, kind))?;
            sleep(self.config.pacing.step_delay()).await;
            state = next;
        }

        info!("Eval form complete for {}", session.label);
        Ok(state)
    }

    async fn enter(
        &mut self,
        state: DriverState,
        session: &MappedSession,
        judgment: &EvalJudgment,
        controls: &mut FormState,
    ) -> Result<(), StepErrorKind> {
        let config = self.config;
        let policy = &config.policy;
        match state {
            DriverState::Start => {}
            DriverState::IdentityPage => {
                let limit = self.limit();
                bounded(limit, self.page.navigate(&config.form_url)).await?;
                self.settle().await?;
                *controls = self.resolve(&form::identity_page_fields()).await?;

                match &session.class_code {
                    Some(code) => self.type_into(controls, form::CLASS_CODE, code).await?,
                    None => self.click(controls, form::NO_CLASS_CODE).await?,
                }
                self.pause().await;
                self.type_into(controls, form::STUDENT_NAME, &session.form_name)
                    .await?;
                self.pause().await;
                self.type_into(controls, form::STUDENT_EMAIL, &session.email)
                    .await?;
            }
            DriverState::NavigateToEvalPage => {
                let next = self.resolve_field(form::NEXT_PAGE).await?;
                bounded(self.limit(), self.page.click(&next)).await?;
                let fields = form::eval_page_fields(policy);
                if let Some(first) = fields.first() {
                    self.wait_for_field(first).await?;
                }
                self.settle().await?;
                *controls = self.resolve(&fields).await?;
                debug!(controls = controls.len(), "eval page resolved");
            }
            DriverState::AttendanceSection => {
                match attendance_field(judgment.student_told, session.attendance) {
                    Some(field) => self.click(controls, field).await?,
                    None => debug!("no eval attendance answer applies"),
                }
            }
            DriverState::B2BSection => {
                let field = if session.back_to_back {
                    form::B2B_YES
                } else {
                    form::B2B_NO
                };
                self.click(controls, field).await?;
            }
            DriverState::DateSection => {
                let date = session.session_date.format("%m/%d/%Y").to_string();
                self.type_into(controls, form::SESSION_DATE, &date).await?;
            }
            DriverState::StartTimeSection => {
                self.fill_time(controls, TimeSlot::Start, session.start).await?;
            }
            DriverState::EndTimeSection => {
                self.fill_time(controls, TimeSlot::End, session.end).await?;
            }
            DriverState::PreworkSection => {
                let field = if session.prework {
                    form::PREWORK_YES
                } else {
                    form::PREWORK_NO
                };
                self.click(controls, field).await?;
            }
            DriverState::TopicsSection => {
                if session.attendance == AttendanceOutcome::NoShow {
                    self.click(controls, form::TOPIC_NO_SHOW).await?;
                    self.pause().await;
                }
                for tag in &session.topics {
                    self.click(controls, &form::topic_field(*tag)).await?;
                    self.pause().await;
                }
            }
            DriverState::TASection => {
                let field = if policy.teaching_assistant {
                    form::TA_YES
                } else {
                    form::TA_NO
                };
                self.click(controls, field).await?;
            }
            DriverState::RatingSection => {
                let field = rating_choice(session.attendance, judgment.rating);
                self.click(controls, &field).await?;
            }
            DriverState::DropMentionSection => {
                let field = if policy.mentioned_dropping {
                    form::DROP_MENTION_YES
                } else {
                    form::DROP_MENTION_NO
                };
                self.click(controls, field).await?;
            }
            DriverState::CommentsSection => {
                self.type_into(controls, form::COMMENTS, &policy.comments_placeholder)
                    .await?;
            }
            DriverState::Submitted => {
                if policy.submit {
                    let submit = self.resolve_field(form::SUBMIT).await?;
                    bounded(self.limit(), self.page.click(&submit)).await?;
                } else {
                    debug!("leaving filled form open for review");
                }
            }
        }
        Ok(())
    }

    async fn fill_time(
        &mut self,
        controls: &FormState,
        slot: TimeSlot,
        time: ClockTime,
    ) -> Result<(), StepErrorKind> {
        let mode = self.config.policy.meridiem;
        self.type_into(controls, &slot.hour_field(), &time.form_hour(mode))
            .await?;
        self.type_into(controls, &slot.minute_field(), &time.form_minute())
            .await?;

        match mode {
            MeridiemMode::Derived => {
                self.click(controls, &slot.meridiem_field()).await?;
                self.pause().await;
                let option_field = slot.meridiem_option_field(mapper::meridiem(time));
                let option = self.resolve_field(&option_field).await?;
                bounded(self.limit(), self.page.click(&option)).await?;
            }
            MeridiemMode::Legacy => {
                if slot == TimeSlot::Start {
                    self.click(controls, &slot.meridiem_field()).await?;
                }
            }
        }
        Ok(())
    }

    fn limit(&self) -> Duration {
        self.config.pacing.step_timeout()
    }

    async fn pause(&self) {
        sleep(self.config.pacing.step_delay()).await;
    }

    /// Wait for a freshly loaded page to become interactive.
    async fn settle(&mut self) -> Result<(), StepErrorKind> {
        bounded(self.limit(), self.page.wait_until_ready()).await?;
        sleep(self.config.pacing.page_delay()).await;
        Ok(())
    }

    /// Poll until `field` shows up. The page being left still reports itself
    /// ready, so readiness alone does not mean the next page is there.
    async fn wait_for_field(&mut self, field: &str) -> Result<(), StepErrorKind> {
        let config = self.config;
        let selector = config.selectors.require(field)?;
        let limit = self.limit();
        let page = &mut *self.page;
        let appeared = async {
            loop {
                match page.find_control(selector).await {
                    Ok(Some(_)) => return Ok(()),
                    Ok(None) => sleep(FIELD_POLL).await,
                    Err(err) => return Err(err),
                }
            }
        };
        bounded(limit, appeared).await
    }

    async fn resolve(&mut self, fields: &[String]) -> Result<FormState, StepErrorKind> {
        let mut resolved = FormState::default();
        for field in fields {
            let control = self.resolve_field(field).await?;
            resolved.insert(field, control);
        }
        Ok(resolved)
    }

    /// Look up one field, insisting on exactly one matching control.
    async fn resolve_field(&mut self, field: &str) -> Result<ControlHandle, StepErrorKind> {
        let config = self.config;
        let selector = config.selectors.require(field)?;
        let mut found = bounded(self.limit(), self.page.find_controls(selector)).await?;
        if found.len() != 1 {
            return Err(StepErrorKind::ControlCount {
                field: field.to_string(),
                selector: selector.to_string(),
                found: found.len(),
            });
        }
        Ok(found.remove(0))
    }

    async fn click(&mut self, controls: &FormState, field: &str) -> Result<(), StepErrorKind> {
        let control = controls.control(field)?;
        debug!(field, "click");
        bounded(self.limit(), self.page.click(control)).await
    }

    async fn type_into(
        &mut self,
        controls: &FormState,
        field: &str,
        text: &str,
    ) -> Result<(), StepErrorKind> {
        let control = controls.control(field)?;
        debug!(field, text, "type");
        bounded(self.limit(), self.page.type_text(control, text)).await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingPage;
    use super::*;
    use crate::models::Meridiem;
    use crate::topics::TopicTag;
    use chrono::NaiveDate;

    fn fast_config() -> DriverConfig {
        let config = Config {
            pacing: Pacing {
                step_delay_ms: 0,
                page_delay_ms: 0,
                step_timeout_ms: 200,
            },
            ..Config::default()
        };
        DriverConfig::from_config(&config)
    }

    fn session() -> MappedSession {
        MappedSession {
            label: "row 501 (Ada Lovelace on 11/27/2022)".to_string(),
            class_code: None,
            form_name: "Lovelace, Ada".to_string(),
            email: "ada@example.com".to_string(),
            session_date: NaiveDate::from_ymd_opt(2022, 11, 27).unwrap(),
            start: ClockTime { hour: 18, minute: 0 },
            end: ClockTime { hour: 18, minute: 50 },
            attendance: AttendanceOutcome::Attended,
            back_to_back: true,
            prework: false,
            topics: vec![TopicTag::Javascript, TopicTag::Mongodb, TopicTag::Promises],
        }
    }

    fn judgment() -> EvalJudgment {
        EvalJudgment {
            student_told: Some(StudentTold::Emailed),
            rating: SessionRating::Score(4),
        }
    }

    fn sel(config: &DriverConfig, field: &str) -> String {
        config.selectors.get(field).unwrap().to_string()
    }

    #[test]
    fn states_advance_in_fixed_order_to_submitted() {
        let mut state = DriverState::Start;
        let mut visited = vec![state];
        while let Some(next) = state.next() {
            visited.push(next);
            state = next;
        }
        assert_eq!(visited.len(), 15);
        assert_eq!(visited.last(), Some(&DriverState::Submitted));
    }

    #[test]
    fn attendance_priority() {
        use AttendanceOutcome::*;
        assert_eq!(
            attendance_field(Some(StudentTold::Yes), NoShow),
            Some(form::EVAL_TOLD_YES)
        );
        assert_eq!(
            attendance_field(Some(StudentTold::Emailed), NoShow),
            Some(form::EVAL_TOLD_EMAIL)
        );
        assert_eq!(attendance_field(None, NoShow), Some(form::EVAL_NO_SHOW));
        assert_eq!(attendance_field(None, Attended), None);
    }

    #[test]
    fn no_show_overrides_rating() {
        assert_eq!(
            rating_choice(AttendanceOutcome::NoShow, SessionRating::Score(5)),
            form::RATING_NO_SHOW
        );
        assert_eq!(
            rating_choice(AttendanceOutcome::Attended, SessionRating::NoShow),
            form::RATING_NO_SHOW
        );
        assert_eq!(
            rating_choice(AttendanceOutcome::Attended, SessionRating::Score(3)),
            "rating-3"
        );
    }

    #[tokio::test]
    async fn find_control_takes_first_match_if_any() {
        let mut page = RecordingPage::default();
        page.match_counts.insert("textarea".to_string(), 2);
        page.match_counts.insert("select".to_string(), 0);
        assert_eq!(
            page.find_control("textarea").await.unwrap(),
            Some(ControlHandle("textarea".to_string()))
        );
        assert_eq!(page.find_control("select").await.unwrap(), None);
    }

    #[tokio::test]
    async fn eval_page_is_resolved_once_its_first_field_appears() {
        let config = fast_config();
        let first = form::eval_page_fields(&config.policy)[0].clone();
        let mut page = RecordingPage::default();
        page.late_selectors.insert(sel(&config, &first), 2);
        let state = FormDriver::new(&mut page, &config)
            .run(&session(), &judgment())
            .await
            .unwrap();
        assert_eq!(state, DriverState::Submitted);
        assert_eq!(page.late_selectors[&sel(&config, &first)], 0);
    }

    #[tokio::test]
    async fn eval_page_that_never_loads_times_out() {
        let config = fast_config();
        let first = form::eval_page_fields(&config.policy)[0].clone();
        let mut page = RecordingPage::default();
        page.match_counts.insert(sel(&config, &first), 0);
        let err = FormDriver::new(&mut page, &config)
            .run(&session(), &judgment())
            .await
            .unwrap_err();
        assert_eq!(err.state, DriverState::NavigateToEvalPage);
        assert!(matches!(err.kind, StepErrorKind::Timeout(_)));
        assert!(page.clicks().contains(&sel(&config, form::NEXT_PAGE)));
    }

    #[tokio::test]
    async fn fills_every_section_in_order() {
        let config = fast_config();
        let mut page = RecordingPage::default();
        let state = FormDriver::new(&mut page, &config)
            .run(&session(), &judgment())
            .await
            .unwrap();
        assert_eq!(state, DriverState::Submitted);
        assert_eq!(page.navigations(), 1);

        let expected_clicks = vec![
            sel(&config, form::NO_CLASS_CODE),
            sel(&config, form::NEXT_PAGE),
            sel(&config, form::EVAL_TOLD_EMAIL),
            sel(&config, form::B2B_YES),
            sel(&config, "start-meridiem"),
            sel(&config, &TimeSlot::Start.meridiem_option_field(Meridiem::Pm)),
            sel(&config, "end-meridiem"),
            sel(&config, &TimeSlot::End.meridiem_option_field(Meridiem::Pm)),
            sel(&config, form::PREWORK_NO),
            sel(&config, &form::topic_field(TopicTag::Javascript)),
            sel(&config, &form::topic_field(TopicTag::Mongodb)),
            sel(&config, &form::topic_field(TopicTag::Promises)),
            sel(&config, form::TA_NO),
            sel(&config, "rating-4"),
            sel(&config, form::DROP_MENTION_NO),
        ];
        assert_eq!(page.clicks(), expected_clicks);

        let typed = page.typed();
        assert_eq!(
            typed,
            vec![
                (sel(&config, form::STUDENT_NAME), "Lovelace, Ada".to_string()),
                (sel(&config, form::STUDENT_EMAIL), "ada@example.com".to_string()),
                (sel(&config, form::SESSION_DATE), "11/27/2022".to_string()),
                (sel(&config, "start-hour"), "6".to_string()),
                (sel(&config, "start-minute"), "00".to_string()),
                (sel(&config, "end-hour"), "6".to_string()),
                (sel(&config, "end-minute"), "50".to_string()),
                (sel(&config, form::COMMENTS), "N/A".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn class_code_is_typed_instead_of_clicking_no_code() {
        let config = fast_config();
        let mut page = RecordingPage::default();
        let mut with_code = session();
        with_code.class_code = Some("UCB-2022".to_string());
        FormDriver::new(&mut page, &config)
            .run(&with_code, &judgment())
            .await
            .unwrap();
        assert!(!page.clicks().contains(&sel(&config, form::NO_CLASS_CODE)));
        assert_eq!(
            page.typed()[0],
            (sel(&config, form::CLASS_CODE), "UCB-2022".to_string())
        );
    }

    #[tokio::test]
    async fn no_show_checks_no_show_topic_first() {
        let config = fast_config();
        let mut page = RecordingPage::default();
        let mut no_show = session();
        no_show.attendance = AttendanceOutcome::NoShow;
        no_show.topics = vec![TopicTag::Git];
        FormDriver::new(&mut page, &config)
            .run(&no_show, &judgment())
            .await
            .unwrap();

        let clicks = page.clicks();
        let no_show_topic = clicks
            .iter()
            .position(|s| *s == sel(&config, form::TOPIC_NO_SHOW))
            .unwrap();
        assert_eq!(
            clicks[no_show_topic + 1],
            sel(&config, &form::topic_field(TopicTag::Git))
        );
        assert!(clicks.contains(&sel(&config, form::RATING_NO_SHOW)));
    }

    #[tokio::test]
    async fn policy_overrides_change_constant_answers() {
        let mut config = fast_config();
        config.policy.teaching_assistant = true;
        config.policy.mentioned_dropping = true;
        config.policy.submit = true;
        config.policy.meridiem = MeridiemMode::Legacy;
        let mut page = RecordingPage::default();
        FormDriver::new(&mut page, &config)
            .run(&session(), &judgment())
            .await
            .unwrap();

        let clicks = page.clicks();
        assert!(clicks.contains(&sel(&config, form::TA_YES)));
        assert!(clicks.contains(&sel(&config, form::DROP_MENTION_YES)));
        assert_eq!(clicks.last(), Some(&sel(&config, form::SUBMIT)));
        assert!(!clicks.contains(&sel(&config, "end-meridiem")));
        assert!(page
            .typed()
            .contains(&(sel(&config, "start-hour"), "18".to_string())));
    }

    #[tokio::test]
    async fn ambiguous_selector_fails_fast() {
        let config = fast_config();
        let mut page = RecordingPage::default();
        page.match_counts.insert(sel(&config, form::B2B_NO), 2);
        let err = FormDriver::new(&mut page, &config)
            .run(&session(), &judgment())
            .await
            .unwrap_err();
        assert_eq!(err.state, DriverState::NavigateToEvalPage);
        assert!(matches!(
            err.kind,
            StepErrorKind::ControlCount { found: 2, .. }
        ));
        // identity page was already filled and is not rolled back
        assert_eq!(page.typed().len(), 2);
    }

    #[tokio::test]
    async fn failed_click_abandons_at_that_section() {
        let config = fast_config();
        let mut page = RecordingPage::default();
        page.failing_clicks.push(sel(&config, form::PREWORK_NO));
        let err = FormDriver::new(&mut page, &config)
            .run(&session(), &judgment())
            .await
            .unwrap_err();
        assert_eq!(err.state, DriverState::PreworkSection);
        assert!(matches!(err.kind, StepErrorKind::Page(_)));
        assert!(!page.typed().iter().any(|(s, _)| *s == sel(&config, form::COMMENTS)));
    }

    #[tokio::test]
    async fn slow_page_times_out() {
        let config = fast_config();
        let mut page = RecordingPage {
            hang_on_navigate: true,
            ..RecordingPage::default()
        };
        let err = FormDriver::new(&mut page, &config)
            .run(&session(), &judgment())
            .await
            .unwrap_err();
        assert_eq!(err.state, DriverState::IdentityPage);
        assert!(matches!(err.kind, StepErrorKind::Timeout(_)));
    }
}
