use chrono::{DateTime, Utc};
use entity::{Choice, task, user};
use platform_api::ApiClient;
use uuid::Uuid;

use super::CrudPage;
use crate::{
    kanban::KanbanBoard,
    list::load_options,
    stats::{TaskStats, task_stats},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TaskLayout {
    #[default]
    List,
    Board,
}

/// Tasks as a table or as a board grouped by status.
pub struct TasksView {
    layout: TaskLayout,
    pub crud: CrudPage<task::Model>,
    pub board: KanbanBoard<task::Model>,
    assignees: Vec<user::Model>,
    board_loaded: bool,
}

impl TasksView {
    pub fn new(page_size: u32) -> Self {
        Self {
            layout: TaskLayout::default(),
            crud: CrudPage::new(page_size),
            board: KanbanBoard::new(page_size),
            assignees: Vec::new(),
            board_loaded: false,
        }
    }

    pub fn layout(&self) -> TaskLayout {
        self.layout
    }

    pub fn assignees(&self) -> &[user::Model] {
        &self.assignees
    }

    pub async fn open(&mut self, client: &ApiClient) -> bool {
        if !self.crud.list.init(&client.resource::<task::Model>()).await {
            return false;
        }
        self.assignees = load_options(&client.resource::<user::Model>()).await;
        true
    }

    pub async fn set_layout(&mut self, client: &ApiClient, layout: TaskLayout) {
        self.layout = layout;
        if layout == TaskLayout::Board && !self.board_loaded {
            self.board.load(&client.kanban::<task::Model>()).await;
            self.board_loaded = self.board.error().is_none();
        }
    }

    pub async fn filter_priority(&mut self, client: &ApiClient, priority: Option<task::Priority>) {
        self.crud
            .list
            .set_filter(
                &client.resource::<task::Model>(),
                "priority",
                priority.map(|p| p.as_str().to_string()),
            )
            .await;
    }

    /// Counts over the rows of whichever layout is showing.
    pub fn stats(&self, now: DateTime<Utc>) -> TaskStats {
        match self.layout {
            TaskLayout::List => task_stats(self.crud.list.items(), now),
            TaskLayout::Board => {
                let loaded: Vec<task::Model> = self
                    .board
                    .columns()
                    .iter()
                    .flat_map(|c| c.items().iter().cloned())
                    .collect();
                task_stats(&loaded, now)
            }
        }
    }

    /// Mark a task done: a card move on the board, an update in the table.
    pub async fn complete(&mut self, client: &ApiClient, id: Uuid) -> bool {
        match self.layout {
            TaskLayout::Board => {
                let position = self
                    .board
                    .column(task::Status::Done)
                    .map_or(0, |c| c.items().len());
                match self
                    .board
                    .move_card(&client.kanban::<task::Model>(), id, task::Status::Done, position)
                    .await
                {
                    Ok(()) => true,
                    Err(err) => {
                        self.crud.toasts.error(format!("Failed to complete task: {err}"));
                        false
                    }
                }
            }
            TaskLayout::List => {
                let Some(mut draft) = self.crud.edit(id) else {
                    return false;
                };
                draft.status = task::Status::Done;
                self.crud
                    .save(&client.resource::<task::Model>(), draft)
                    .await
                    .is_some()
            }
        }
    }

    pub async fn save(&mut self, client: &ApiClient, draft: task::Draft) -> Option<task::Model> {
        let saved = self
            .crud
            .save(&client.resource::<task::Model>(), draft)
            .await?;
        if self.board_loaded {
            self.board.load(&client.kanban::<task::Model>()).await;
        }
        Some(saved)
    }

    pub async fn confirm_delete(&mut self, client: &ApiClient, id: Uuid) -> bool {
        self.crud
            .confirm_delete(&client.resource::<task::Model>(), id)
            .await
    }
}
