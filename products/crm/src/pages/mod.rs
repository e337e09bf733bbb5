//! One controller per CRM screen.
//!
//! Table screens share [`CrudPage`]: a [`ListPage`], a [`DeleteConfirm`], the
//! last set of field errors and a toast queue. Screen-specific controllers add
//! option lists, boards and derived stats on top and talk to the backend
//! through an [`ApiClient`](platform_api::ApiClient).

mod accounts;
mod calendar;
mod campaigns;
mod carepacks;
mod crm;
mod emails;
mod meetings;
mod tasks;

pub use accounts::AccountsPage;
pub use calendar::{CalendarView, DayAgenda};
pub use campaigns::CampaignsView;
pub use carepacks::CarepackPage;
pub use crm::{CrmPage, CrmTab};
pub use emails::EmailsPage;
pub use meetings::MeetingsPage;
pub use tasks::{TaskLayout, TasksView};

use entity::Resource;
use tracing::warn;
use uuid::Uuid;

use crate::{
    confirm::DeleteConfirm,
    form::{FieldErrors, SubmitError, Validate, submit},
    list::ListPage,
    source::{ListSource, RecordSink},
    toast::Toasts,
};

#[derive(Clone, Debug)]
pub struct CrudPage<R: Resource> {
    pub list: ListPage<R>,
    pub confirm: DeleteConfirm,
    pub toasts: Toasts,
    field_errors: FieldErrors,
    editing: Option<Uuid>,
}

impl<R: Resource> CrudPage<R>
where
    R::Draft: Validate,
{
    pub fn new(page_size: u32) -> Self {
        Self {
            list: ListPage::new(page_size),
            confirm: DeleteConfirm::default(),
            toasts: Toasts::default(),
            field_errors: FieldErrors::new(),
            editing: None,
        }
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn editing(&self) -> Option<Uuid> {
        self.editing
    }

    /// Start editing a loaded record. Returns its draft, or `None` if the id
    /// is not on the current page.
    pub fn edit(&mut self, id: Uuid) -> Option<R::Draft>
    where
        for<'a> R::Draft: From<&'a R>,
    {
        let draft = self.list.find(id).map(R::Draft::from)?;
        self.editing = Some(id);
        self.field_errors = FieldErrors::new();
        Some(draft)
    }

    pub fn start_create(&mut self) {
        self.editing = None;
        self.field_errors = FieldErrors::new();
    }

    /// Create or update depending on whether an edit is in progress. The list
    /// reloads after a successful save.
    pub async fn save<S>(&mut self, source: &S, draft: R::Draft) -> Option<R>
    where
        S: ListSource<R> + RecordSink<R>,
    {
        let editing = self.editing;
        match submit(source, draft, editing).await {
            Ok(saved) => {
                self.field_errors = FieldErrors::new();
                self.editing = None;
                let verb = if editing.is_some() { "updated" } else { "created" };
                self.toasts.success(format!("{} {verb}", R::LABEL));
                self.list.load(source).await;
                Some(saved)
            }
            Err(SubmitError::Invalid(errors)) => {
                self.field_errors = errors;
                None
            }
            Err(SubmitError::Api(err)) => {
                warn!(resource = R::PATH, error = %err, "save failed");
                self.toasts
                    .error(format!("Failed to save {}: {}", R::LABEL.to_lowercase(), err));
                None
            }
        }
    }

    pub fn request_delete(&mut self, id: Uuid) {
        self.confirm.request(id);
    }

    pub fn cancel_delete(&mut self) {
        self.confirm.cancel();
    }

    /// Second click of the inline delete control.
    pub async fn confirm_delete<S>(&mut self, source: &S, id: Uuid) -> bool
    where
        S: ListSource<R> + RecordSink<R>,
    {
        match self.confirm.confirm::<R, S>(source, id).await {
            Ok(true) => {
                self.toasts.success(format!("{} deleted", R::LABEL));
                self.list.load(source).await;
                true
            }
            Ok(false) => false,
            Err(err) => {
                self.toasts
                    .error(format!("Failed to delete {}: {}", R::LABEL.to_lowercase(), err));
                false
            }
        }
    }
}
