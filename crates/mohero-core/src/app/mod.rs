//! Application facade.
//!
//! [`MoHero`] wires storage, configuration, the auth backend, the progress
//! tracker and the day-progression evaluator together, and keeps
//! [`AppStore`] in step with what was actually persisted. One instance
//! corresponds to one page load: the evaluator runs at most once per instance.

mod dashboard;
pub mod route;
mod store;

pub use dashboard::{Dashboard, DashboardView};
pub use route::{guard, Route};
pub use store::{AppAction, AppState, AppStore};

use chrono::{DateTime, FixedOffset, Utc};

use crate::auth::{AuthEvent, LocalAuth, Session, SignUp};
use crate::catalog::{parse_definitions, Program};
use crate::error::{AuthError, CoreError, Result};
use crate::events::Event;
use crate::progress::{DayProgressionEvaluator, ProgressTracker, UserProgress};
use crate::ritual::DailyRitual;
use crate::storage::{Config, Database, Profile};

/// kv key holding the token of the session restored on startup.
const SESSION_KEY: &str = "current_session";

pub struct MoHero {
    db: Database,
    config: Config,
    store: AppStore,
    evaluator: DayProgressionEvaluator,
}

impl MoHero {
    /// Open with the configuration and database from the data directory.
    pub fn open() -> Result<Self> {
        let config = Config::load()?;
        let db = Database::open()?;
        Self::with_parts(db, config)
    }

    pub fn with_parts(db: Database, config: Config) -> Result<Self> {
        if config.catalog.seed_builtin {
            let seeded = db.seed_builtin_catalog()?;
            if seeded > 0 {
                tracing::info!(programs = seeded, "seeded built-in catalog");
            }
        }
        Ok(Self {
            db,
            config,
            store: AppStore::new(),
            evaluator: DayProgressionEvaluator::new(),
        })
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    pub fn state(&self) -> AppState {
        self.store.state()
    }

    fn auth(&self) -> LocalAuth<'_> {
        LocalAuth::new(&self.db, &self.config)
    }

    fn require_user(&self) -> Result<String> {
        self.store
            .state()
            .auth
            .user_id()
            .map(str::to_owned)
            .ok_or_else(|| AuthError::NotAuthenticated.into())
    }

    fn require_session(&self) -> Result<Session> {
        self.store
            .state()
            .auth
            .session()
            .cloned()
            .ok_or_else(|| AuthError::NotAuthenticated.into())
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    /// Resume the session remembered from a previous run, if still live.
    pub fn restore_session(&mut self, now: DateTime<Utc>) -> Result<Option<Session>> {
        let Some(token) = self.db.kv_get(SESSION_KEY)? else {
            return Ok(None);
        };
        match self.auth().current_session(&token, now)? {
            Some(session) => {
                self.signed_in(session.clone())?;
                Ok(Some(session))
            }
            None => {
                self.db.kv_delete(SESSION_KEY)?;
                Ok(None)
            }
        }
    }

    fn signed_in(&mut self, session: Session) -> Result<()> {
        self.db.kv_set(SESSION_KEY, &session.token)?;
        self.store
            .dispatch(AppAction::Auth(AuthEvent::SignedIn { session }));
        self.reload_progress()
    }

    fn reload_progress(&self) -> Result<()> {
        let user = self.require_user()?;
        let tracker = ProgressTracker::new(&self.db, &user);
        let (program, progress) = match tracker.active_program()? {
            Some((program, progress)) => (Some(program), progress),
            None => (None, tracker.progress()?),
        };
        self.store
            .dispatch(AppAction::ProgressLoaded { program, progress });
        Ok(())
    }

    pub fn sign_up(&mut self, req: &SignUp, now: DateTime<Utc>) -> Result<Event> {
        let session = self.auth().sign_up(req, now)?;
        let user_id = session.user_id.clone();
        self.signed_in(session)?;
        Ok(Event::SignedIn { user_id, at: now })
    }

    pub fn sign_in(&mut self, email: &str, password: &str, now: DateTime<Utc>) -> Result<Event> {
        let session = self.auth().sign_in(email, password, now)?;
        let user_id = session.user_id.clone();
        self.signed_in(session)?;
        Ok(Event::SignedIn { user_id, at: now })
    }

    pub fn sign_out(&mut self, now: DateTime<Utc>) -> Result<Event> {
        if let Some(session) = self.store.state().auth.session() {
            self.auth().sign_out(&session.token)?;
        }
        self.db.kv_delete(SESSION_KEY)?;
        self.store.dispatch(AppAction::Auth(AuthEvent::SignedOut));
        Ok(Event::SignedOut { at: now })
    }

    pub fn refresh_session(&mut self, now: DateTime<Utc>) -> Result<Event> {
        let current = self.require_session()?;
        let session = match self.auth().refresh_session(&current.token, now) {
            Ok(session) => session,
            Err(e @ CoreError::Auth(_)) => {
                self.db.kv_delete(SESSION_KEY)?;
                self.store.dispatch(AppAction::Auth(AuthEvent::SignedOut));
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        let event = Event::SessionRefreshed {
            user_id: session.user_id.clone(),
            expires_at: session.expires_at,
        };
        self.store
            .dispatch(AppAction::Auth(AuthEvent::TokenRefreshed { session }));
        Ok(event)
    }

    pub fn profile(&self) -> Result<Profile> {
        let user = self.require_user()?;
        self.db
            .profile(&user)?
            .ok_or_else(|| CoreError::not_found("profile", user))
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    pub fn programs(&self) -> Result<Vec<Program>> {
        self.db.list_programs()
    }

    pub fn program(&self, id: &str) -> Result<Program> {
        self.db
            .program(id)?
            .ok_or_else(|| CoreError::not_found("program", id))
    }

    /// Import program definitions from a JSON document; returns their ids.
    pub fn import_programs(&self, json: &str) -> Result<Vec<String>> {
        let defs = parse_definitions(json)?;
        for def in &defs {
            self.db.import_program(def)?;
        }
        Ok(defs.into_iter().map(|d| d.program.id).collect())
    }

    // ------------------------------------------------------------------
    // Progress
    // ------------------------------------------------------------------

    pub fn progress(&self) -> Result<UserProgress> {
        let user = self.require_user()?;
        ProgressTracker::new(&self.db, &user).progress()
    }

    /// Select a program. Moving away from a different active program erases
    /// all exercise progress and is refused unless `confirmed`.
    pub fn select_program(
        &mut self,
        program_id: &str,
        confirmed: bool,
        now: DateTime<Utc>,
    ) -> Result<Event> {
        let user = self.require_user()?;
        self.program(program_id)?;
        let tracker = ProgressTracker::new(&self.db, &user);

        let current = tracker.progress()?;
        if current.is_switching_to(program_id) && !confirmed {
            return Err(CoreError::ConfirmationRequired {
                from: current.current_program_id.unwrap_or_default(),
                to: program_id.to_string(),
            });
        }

        let selection = tracker.select_program(program_id, now)?;
        self.store.dispatch(AppAction::ProgressLoaded {
            program: Some(selection.program),
            progress: selection.progress,
        });
        Ok(Event::ProgramSelected {
            program_id: program_id.to_string(),
            previous_program_id: selection.previous_program_id,
            records_cleared: selection.records_cleared,
            at: now,
        })
    }

    pub fn current_ritual(&self) -> Result<DailyRitual> {
        let user = self.require_user()?;
        ProgressTracker::new(&self.db, &user).current_ritual()
    }

    /// Store an absolute value for an exercise (clamped to its target).
    pub fn update_exercise(&mut self, exercise_id: &str, value: i64, now: DateTime<Utc>) -> Result<Event> {
        let user = self.require_user()?;
        let tracker = ProgressTracker::new(&self.db, &user);
        let exercise = tracker.update_exercise_completion(exercise_id, value)?;
        let day = tracker.progress()?.current_day;
        Ok(exercise_event(exercise, day, now))
    }

    /// Add `delta` (possibly negative) to an exercise's stored value.
    pub fn add_to_exercise(&mut self, exercise_id: &str, delta: i64, now: DateTime<Utc>) -> Result<Event> {
        let user = self.require_user()?;
        let tracker = ProgressTracker::new(&self.db, &user);
        let exercise = tracker.add_to_exercise(exercise_id, delta)?;
        let day = tracker.progress()?.current_day;
        Ok(exercise_event(exercise, day, now))
    }

    pub fn complete_ritual(&mut self, now: DateTime<Utc>) -> Result<Event> {
        let user = self.require_user()?;
        let tracker = ProgressTracker::new(&self.db, &user);
        let day = tracker.progress()?.current_day;
        let progress = tracker.complete_ritual()?;

        let event = Event::RitualCompleted {
            day,
            next_day: progress.current_day,
            streak: progress.streak,
            total_completed_days: progress.total_completed_days,
            at: now,
        };
        let program = self.state().program;
        self.store
            .dispatch(AppAction::ProgressLoaded { program, progress });
        Ok(event)
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Route actually shown for a request of `requested`.
    pub fn navigate(&self, requested: Route) -> Route {
        guard(requested, &self.store.state())
    }

    /// Load the dashboard: guard first, then the once-per-load day
    /// progression check, then the current day's ritual.
    pub fn load_dashboard(&mut self, now: DateTime<FixedOffset>) -> Result<DashboardView> {
        let route = self.navigate(Route::Dashboard);
        if route != Route::Dashboard {
            return Ok(DashboardView::Redirect { to: route });
        }

        let user = self.require_user()?;
        let tracker = ProgressTracker::new(&self.db, &user);
        let Some((program, mut progress)) = tracker.active_program()? else {
            return Ok(DashboardView::Redirect { to: Route::Programs });
        };

        let mut ritual = self.db.ritual(&user, &program.id, progress.current_day)?;
        let evaluation = self
            .evaluator
            .evaluate(&self.db, &user, now, Some(&ritual))?;

        let mut advanced = None;
        if let Some(eval) = evaluation.filter(|e| e.should_advance) {
            if self.config.progression.auto_advance {
                let from_day = progress.current_day;
                progress = tracker.advance_day()?;
                ritual = self.db.ritual(&user, &program.id, progress.current_day)?;
                advanced = Some(Event::DayAdvanced {
                    from_day,
                    to_day: progress.current_day,
                    total_completed_days: progress.total_completed_days,
                    all_exercises_completed: eval.all_exercises_completed,
                    at: now.with_timezone(&Utc),
                });
            }
        }

        self.store.dispatch(AppAction::ProgressLoaded {
            program: Some(program.clone()),
            progress: progress.clone(),
        });

        Ok(DashboardView::Ready(Box::new(Dashboard {
            program,
            progress,
            ritual,
            evaluation,
            advanced,
        })))
    }
}

fn exercise_event(exercise: crate::ritual::Exercise, day: u32, at: DateTime<Utc>) -> Event {
    Event::ExerciseUpdated {
        completed: exercise.is_complete(),
        exercise_id: exercise.id,
        day,
        value: exercise.completed_value,
        target: exercise.target,
        at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn app() -> MoHero {
        MoHero::with_parts(Database::open_memory().unwrap(), Config::default()).unwrap()
    }

    fn signup() -> SignUp {
        SignUp {
            email: "hero@example.com".to_string(),
            password: "secret12".to_string(),
            name: "Hero".to_string(),
            clan: Some("owls".to_string()),
        }
    }

    fn local(day: u32, hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2025, 6, day, hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn mutations_require_sign_in() {
        let mut app = app();
        assert!(matches!(
            app.select_program("hero-awakening", true, Utc::now()),
            Err(CoreError::Auth(AuthError::NotAuthenticated))
        ));
    }

    #[test]
    fn sign_up_populates_store() {
        let mut app = app();
        app.sign_up(&signup(), Utc::now()).unwrap();
        let state = app.state();
        assert!(state.auth.is_signed_in());
        assert_eq!(state.progress, Some(UserProgress::default()));
        assert_eq!(app.profile().unwrap().clan.as_deref(), Some("owls"));
    }

    #[test]
    fn restore_session_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mohero.db");
        let now = Utc::now();
        {
            let mut app = MoHero::with_parts(Database::open_at(&path).unwrap(), Config::default()).unwrap();
            app.sign_up(&signup(), now).unwrap();
            app.select_program("core-forge", false, now).unwrap();
        }
        let mut app = MoHero::with_parts(Database::open_at(&path).unwrap(), Config::default()).unwrap();
        let session = app.restore_session(now + Duration::minutes(5)).unwrap();
        assert!(session.is_some());
        assert_eq!(app.state().program.unwrap().id, "core-forge");

        let mut app = MoHero::with_parts(Database::open_at(&path).unwrap(), Config::default()).unwrap();
        assert!(app.restore_session(now + Duration::hours(3)).unwrap().is_none());
        assert!(!app.state().auth.is_signed_in());
    }

    #[test]
    fn switching_requires_confirmation() {
        let mut app = app();
        let now = Utc::now();
        app.sign_up(&signup(), now).unwrap();
        app.select_program("hero-awakening", false, now).unwrap();
        app.update_exercise("hero-awakening-d01-1", 4, now).unwrap();

        let err = app.select_program("core-forge", false, now).unwrap_err();
        assert!(matches!(err, CoreError::ConfirmationRequired { .. }));
        assert_eq!(app.db().exercise_record_count(&app.require_user().unwrap()).unwrap(), 1);

        let event = app.select_program("core-forge", true, now).unwrap();
        assert!(matches!(event, Event::ProgramSelected { records_cleared: 1, .. }));
        assert_eq!(app.state().program.unwrap().id, "core-forge");
    }

    #[test]
    fn unknown_program_reported_before_confirmation() {
        let mut app = app();
        app.sign_up(&signup(), Utc::now()).unwrap();
        app.select_program("hero-awakening", false, Utc::now()).unwrap();
        assert!(matches!(
            app.select_program("nope", false, Utc::now()),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn dashboard_without_program_redirects_without_evaluating() {
        let mut app = app();
        app.sign_up(&signup(), Utc::now()).unwrap();
        let view = app.load_dashboard(local(1, 9)).unwrap();
        assert_eq!(view.redirect(), Some(Route::Programs));
        let user = app.require_user().unwrap();
        assert!(app.db().kv_get(&format!("last_seen:{user}")).unwrap().is_none());
    }

    #[test]
    fn dashboard_signed_out_redirects_to_login() {
        let mut app = app();
        assert_eq!(app.load_dashboard(local(1, 9)).unwrap().redirect(), Some(Route::Login));
    }

    #[test]
    fn dashboard_rolls_over_on_new_day_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mohero.db");
        let now = Utc::now();
        {
            let mut app = MoHero::with_parts(Database::open_at(&path).unwrap(), Config::default()).unwrap();
            app.sign_up(&signup(), now).unwrap();
            app.select_program("hero-awakening", false, now).unwrap();
            let view = app.load_dashboard(local(1, 20)).unwrap();
            let DashboardView::Ready(dash) = view else { panic!("expected dashboard") };
            assert!(dash.evaluation.unwrap().first_visit);
            assert!(dash.advanced.is_none());
        }

        let mut app = MoHero::with_parts(Database::open_at(&path).unwrap(), Config::default()).unwrap();
        app.restore_session(now).unwrap();
        let DashboardView::Ready(dash) = app.load_dashboard(local(2, 7)).unwrap() else {
            panic!("expected dashboard")
        };
        assert!(dash.evaluation.unwrap().should_advance);
        assert_eq!(dash.progress.current_day, 2);
        assert_eq!(dash.progress.streak, 0);
        assert_eq!(dash.progress.total_completed_days, 1);
        assert_eq!(dash.ritual.day, 2);
        assert!(matches!(dash.advanced, Some(Event::DayAdvanced { from_day: 1, to_day: 2, .. })));

        // Same instance, later call: no second evaluation.
        let DashboardView::Ready(dash) = app.load_dashboard(local(3, 7)).unwrap() else {
            panic!("expected dashboard")
        };
        assert!(dash.evaluation.is_none());
        assert_eq!(dash.progress.current_day, 2);
    }

    #[test]
    fn auto_advance_can_be_disabled() {
        let mut config = Config::default();
        config.progression.auto_advance = false;
        let mut app = MoHero::with_parts(Database::open_memory().unwrap(), config).unwrap();
        let now = Utc::now();
        app.sign_up(&signup(), now).unwrap();
        app.select_program("hero-awakening", false, now).unwrap();
        let user = app.require_user().unwrap();
        crate::progress::LastSeenStore::set_last_seen(app.db(), &user, local(1, 10)).unwrap();

        let DashboardView::Ready(dash) = app.load_dashboard(local(2, 10)).unwrap() else {
            panic!("expected dashboard")
        };
        assert!(dash.evaluation.unwrap().should_advance);
        assert!(dash.advanced.is_none());
        assert_eq!(dash.progress.current_day, 1);
    }

    #[test]
    fn complete_ritual_updates_store_after_write() {
        let mut app = app();
        let now = Utc::now();
        app.sign_up(&signup(), now).unwrap();
        app.select_program("hero-awakening", false, now).unwrap();

        assert!(app.complete_ritual(now).is_err());
        assert_eq!(app.state().progress.unwrap().current_day, 1);

        for ex in app.current_ritual().unwrap().exercises {
            app.add_to_exercise(&ex.id, i64::from(ex.target) + 5, now).unwrap();
        }
        let event = app.complete_ritual(now).unwrap();
        assert!(matches!(event, Event::RitualCompleted { day: 1, next_day: 2, streak: 1, .. }));
        assert_eq!(app.state().progress.unwrap().current_day, 2);
    }

    #[test]
    fn sign_out_clears_state_and_token() {
        let mut app = app();
        let now = Utc::now();
        app.sign_up(&signup(), now).unwrap();
        app.sign_out(now).unwrap();
        assert!(!app.state().auth.is_signed_in());
        assert!(app.db().kv_get(SESSION_KEY).unwrap().is_none());
        assert!(app.restore_session(now).unwrap().is_none());
    }

    #[test]
    fn refresh_extends_and_signs_out_when_expired() {
        let mut app = app();
        let now = Utc::now();
        app.sign_up(&signup(), now).unwrap();
        let event = app.refresh_session(now + Duration::minutes(50)).unwrap();
        assert!(matches!(event, Event::SessionRefreshed { .. }));

        let err = app.refresh_session(now + Duration::hours(5)).unwrap_err();
        assert!(matches!(err, CoreError::Auth(AuthError::SessionExpired)));
        assert!(!app.state().auth.is_signed_in());
    }
}
