use crate::error::{AdminError, ApiFailure};
use crate::validation::ValidationErrors;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum LoadState<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            LoadState::Idle | LoadState::Loading | LoadState::Failed(_) => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

/// Status line shown under a view's toolbar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusLine {
    Info { message: String },
    Error { message: String, details: Vec<String> },
}

impl StatusLine {
    pub fn from_error(error: &AdminError) -> Self {
        match error {
            AdminError::Api(ApiFailure {
                message, details, ..
            }) => StatusLine::Error {
                message: message.clone(),
                details: details.clone(),
            },
            AdminError::Validation(errors) => StatusLine::Error {
                message: "Please fix the highlighted fields".to_string(),
                details: errors
                    .iter()
                    .map(|error| format!("{}: {}", error.field, error.message))
                    .collect(),
            },
            other => StatusLine::Error {
                message: other.to_string(),
                details: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCommandError {
    /// A request from this view is still outstanding.
    Busy,
    /// Submit without an open draft.
    NoDraft,
}

#[derive(Debug, Clone)]
pub struct AdminView<T, D> {
    load: LoadState<T>,
    draft: Option<D>,
    busy: bool,
    needs_refresh: bool,
    status: Option<StatusLine>,
}

impl<T, D> Default for AdminView<T, D> {
    fn default() -> Self {
        Self {
            load: LoadState::Idle,
            draft: None,
            busy: false,
            needs_refresh: true,
            status: None,
        }
    }
}

impl<T, D: Clone> AdminView<T, D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_state(&self) -> &LoadState<T> {
        &self.load
    }

    pub fn snapshot(&self) -> Option<&T> {
        self.load.loaded()
    }

    pub fn draft(&self) -> Option<&D> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut D> {
        self.draft.as_mut()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    pub fn begin_load(&mut self) {
        self.load = LoadState::Loading;
        self.needs_refresh = false;
    }

    pub fn finish_load(&mut self, result: Result<T, AdminError>) {
        match result {
            Ok(value) => self.load = LoadState::Loaded(value),
            Err(error) => {
                log::warn!("View load failed: {}", error);
                self.status = Some(StatusLine::from_error(&error));
                self.load = LoadState::Failed(error.status_message());
            }
        }
    }

    pub fn open_draft(&mut self, draft: D) {
        self.draft = Some(draft);
        self.status = None;
    }

    pub fn close_draft(&mut self) {
        self.draft = None;
    }

    /// Marks the view busy and hands out a copy of the draft to submit.
    pub fn begin_submit(&mut self) -> Result<D, ViewCommandError> {
        if self.busy {
            return Err(ViewCommandError::Busy);
        }
        let draft = self.draft.clone().ok_or(ViewCommandError::NoDraft)?;
        self.busy = true;
        self.status = None;
        Ok(draft)
    }

    /// Marks the view busy for an action that has no draft, such as delete.
    pub fn begin_action(&mut self) -> Result<(), ViewCommandError> {
        if self.busy {
            return Err(ViewCommandError::Busy);
        }
        self.busy = true;
        self.status = None;
        Ok(())
    }

    /// Input failed validation: the draft stays open and nothing is sent.
    pub fn reject_draft(&mut self, errors: ValidationErrors) {
        self.status = Some(StatusLine::from_error(&AdminError::Validation(errors)));
    }

    /// Success drops the draft and asks for a refetch; failure keeps the
    /// draft and the snapshot untouched. Yields the server's reply on success.
    pub fn finish_submit<R>(
        &mut self,
        result: Result<R, AdminError>,
        success_message: &str,
    ) -> Option<R> {
        self.busy = false;
        match result {
            Ok(value) => {
                self.draft = None;
                self.needs_refresh = true;
                self.status = Some(StatusLine::Info {
                    message: success_message.to_string(),
                });
                Some(value)
            }
            Err(error) => {
                log::warn!("View action failed: {}", error);
                self.status = Some(StatusLine::from_error(&error));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type NamesView = AdminView<Vec<String>, String>;

    fn api_error() -> AdminError {
        AdminError::Api(ApiFailure {
            status: 409,
            message: "Username taken".into(),
            details: vec!["username: already exists".into()],
        })
    }

    #[test]
    fn load_transitions() {
        let mut view = NamesView::new();
        assert!(view.needs_refresh());
        view.begin_load();
        assert!(view.load_state().is_loading());
        view.finish_load(Ok(vec!["ana".into()]));
        assert_eq!(view.snapshot().map(Vec::len), Some(1));

        view.begin_load();
        view.finish_load(Err(api_error()));
        assert!(matches!(view.load_state(), LoadState::Failed(_)));
        assert!(view.snapshot().is_none());
    }

    #[test]
    fn submit_is_rejected_while_busy_or_without_draft() {
        let mut view = NamesView::new();
        assert_eq!(view.begin_submit(), Err(ViewCommandError::NoDraft));
        view.open_draft("ben".into());
        assert_eq!(view.begin_submit().as_deref(), Ok("ben"));
        assert!(view.is_busy());
        assert_eq!(view.begin_submit(), Err(ViewCommandError::Busy));
        assert_eq!(view.begin_action(), Err(ViewCommandError::Busy));
    }

    #[test]
    fn failed_submit_keeps_draft_and_snapshot() {
        let mut view = NamesView::new();
        view.begin_load();
        view.finish_load(Ok(vec!["ana".into()]));
        view.open_draft("ana".into());
        view.begin_submit().unwrap();
        view.finish_submit::<()>(Err(api_error()), "Saved");

        assert!(!view.is_busy());
        assert_eq!(view.draft().map(String::as_str), Some("ana"));
        assert_eq!(view.snapshot(), Some(&vec!["ana".to_string()]));
        assert!(!view.needs_refresh());
        assert_eq!(
            view.status(),
            Some(&StatusLine::Error {
                message: "Username taken".into(),
                details: vec!["username: already exists".into()],
            })
        );
    }

    #[test]
    fn successful_submit_discards_draft_and_requests_refetch() {
        let mut view = NamesView::new();
        view.begin_load();
        view.finish_load(Ok(Vec::new()));
        view.open_draft("cy".into());
        view.begin_submit().unwrap();
        assert_eq!(view.finish_submit(Ok(7), "User created"), Some(7));

        assert!(view.draft().is_none());
        assert!(view.needs_refresh());
        assert_eq!(
            view.status(),
            Some(&StatusLine::Info {
                message: "User created".into()
            })
        );
    }

    #[test]
    fn validation_errors_render_as_details() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "is required");
        let status = StatusLine::from_error(&AdminError::Validation(errors));
        match status {
            StatusLine::Error { details, .. } => assert_eq!(details, vec!["title: is required"]),
            StatusLine::Info { .. } => panic!("expected error status"),
        }
    }

    #[test]
    fn rejected_draft_stays_open_and_idle() {
        let mut view = NamesView::new();
        view.open_draft("".into());
        let mut errors = ValidationErrors::new();
        errors.add("username", "is required");
        view.reject_draft(errors);

        assert!(!view.is_busy());
        assert_eq!(view.draft().map(String::as_str), Some(""));
        assert!(matches!(
            view.status(),
            Some(StatusLine::Error { details, .. }) if details == &vec!["username: is required".to_string()]
        ));
    }

    #[test]
    fn closing_a_draft_discards_it_without_refetch() {
        let mut view = NamesView::new();
        view.begin_load();
        view.finish_load(Ok(Vec::new()));
        view.open_draft("dee".into());
        view.close_draft();
        assert!(view.draft().is_none());
        assert!(!view.needs_refresh());
        assert_eq!(view.begin_submit(), Err(ViewCommandError::NoDraft));
        assert_eq!(view.begin_action(), Ok(()));
    }
}
