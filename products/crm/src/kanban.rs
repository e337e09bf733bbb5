//! Kanban board with per-column pagination and optimistic card moves.
//!
//! A move is applied locally first. When the backend rejects it, the two
//! affected columns are refetched so the board shows server state again.

use entity::{Choice, KanbanRecord};
use platform_api::{ApiError, ApiResult};
use tracing::{Instrument, info_span, warn};
use uuid::Uuid;

use crate::source::KanbanSource;
use crate::stats::sum_cents;

#[derive(Clone, Debug)]
pub struct Column<R: KanbanRecord> {
    status: R::Status,
    items: Vec<R>,
    total: u64,
    pages_loaded: u32,
    total_pages: u32,
    loading: bool,
    error: Option<String>,
}

impl<R: KanbanRecord> Column<R> {
    fn new(status: R::Status) -> Self {
        Self {
            status,
            items: Vec::new(),
            total: 0,
            pages_loaded: 0,
            total_pages: 0,
            loading: false,
            error: None,
        }
    }

    pub fn status(&self) -> R::Status {
        self.status
    }

    pub fn items(&self) -> &[R] {
        &self.items
    }

    /// Server-side count, including cards not loaded yet.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn has_more(&self) -> bool {
        self.pages_loaded < self.total_pages
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Sum over loaded cards only.
    pub fn amount_cents(&self) -> i64 {
        sum_cents(self.items.iter().filter_map(KanbanRecord::amount_cents))
    }

    fn position_of(&self, id: Uuid) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    fn append(&mut self, items: Vec<R>) {
        for item in items {
            // An optimistic move can shift a card onto a page we fetch later.
            if self.position_of(item.id()).is_none() {
                self.items.push(item);
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct KanbanBoard<R: KanbanRecord> {
    columns: Vec<Column<R>>,
    page_size: u32,
    error: Option<String>,
}

impl<R: KanbanRecord> KanbanBoard<R> {
    /// One column per status, in declaration order.
    pub fn new(page_size: u32) -> Self {
        Self::with_columns(<R::Status as Choice>::ALL, page_size)
    }

    pub fn with_columns(statuses: &[R::Status], page_size: u32) -> Self {
        Self {
            columns: statuses.iter().copied().map(Column::new).collect(),
            page_size: page_size.max(1),
            error: None,
        }
    }

    pub fn columns(&self) -> &[Column<R>] {
        &self.columns
    }

    pub fn column(&self, status: R::Status) -> Option<&Column<R>> {
        self.columns.iter().find(|c| c.status == status)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn total_count(&self) -> u64 {
        self.columns.iter().map(Column::total).sum()
    }

    pub fn total_amount_cents(&self) -> i64 {
        sum_cents(self.columns.iter().map(Column::amount_cents))
    }

    /// Load the first page of every column.
    pub async fn load<S: KanbanSource<R>>(&mut self, source: &S) {
        let span = info_span!("crm.kanban.load", resource = R::PATH, columns = self.columns.len());
        self.error = None;
        for index in 0..self.columns.len() {
            self.columns[index].items.clear();
            self.columns[index].pages_loaded = 0;
            self.fetch_into(source, index, 1).instrument(span.clone()).await;
        }
    }

    /// Append the next page of one column. Returns whether anything was fetched.
    pub async fn load_more<S: KanbanSource<R>>(&mut self, source: &S, status: R::Status) -> bool {
        let Some(index) = self.index_of(status) else {
            return false;
        };
        let column = &self.columns[index];
        if column.loading || !column.has_more() {
            return false;
        }
        let next = column.pages_loaded + 1;
        self.fetch_into(source, index, next).await
    }

    /// Page through columns until card `id` is on the board.
    ///
    /// Returns false once every column is exhausted without finding it.
    pub async fn load_until_found<S: KanbanSource<R>>(&mut self, source: &S, id: Uuid) -> bool {
        loop {
            if self.locate(id).is_some() {
                return true;
            }
            let pending: Vec<R::Status> = self
                .columns
                .iter()
                .filter(|c| c.has_more())
                .map(|c| c.status)
                .collect();
            let mut fetched = false;
            for status in pending {
                fetched |= self.load_more(source, status).await;
            }
            if !fetched {
                return false;
            }
        }
    }

    /// Move card `id` to `position` (0-based, clamped) in column `to`.
    ///
    /// The board reflects the move before the backend answers. On failure the
    /// error is recorded and both columns are refetched.
    pub async fn move_card<S: KanbanSource<R>>(
        &mut self,
        source: &S,
        id: Uuid,
        to: R::Status,
        position: usize,
    ) -> ApiResult<()> {
        let span = info_span!("crm.kanban.move", resource = R::PATH, %id, to = to.as_str());
        let Some((from_index, item_index)) = self.locate(id) else {
            return Err(ApiError::NotFound);
        };
        let Some(to_index) = self.index_of(to) else {
            return Err(ApiError::InvalidInput(format!(
                "no `{}` column on this board",
                to.as_str()
            )));
        };
        if from_index == to_index && item_index == position {
            return Ok(());
        }

        let mut card = self.columns[from_index].items.remove(item_index);
        card.set_status(to);
        let target = &mut self.columns[to_index];
        let position = position.min(target.items.len());
        target.items.insert(position, card);
        if from_index != to_index {
            self.columns[from_index].total = self.columns[from_index].total.saturating_sub(1);
            self.columns[to_index].total += 1;
        }
        self.error = None;

        let result = source
            .move_card(id, to, position as u32)
            .instrument(span.clone())
            .await;
        match result {
            Ok(saved) => {
                if let Some(slot) = self.columns[to_index]
                    .items
                    .iter_mut()
                    .find(|item| item.id() == id)
                {
                    *slot = saved;
                }
                // The source column's server pages now start one card later.
                // Re-read the last loaded page so the next `load_more` skips nothing.
                if from_index != to_index && self.columns[from_index].has_more() {
                    let page = self.columns[from_index].pages_loaded;
                    self.fetch_into(source, from_index, page).instrument(span).await;
                }
                Ok(())
            }
            Err(err) => {
                warn!(parent: &span, error = %err, "card move rejected, refetching columns");
                self.error = Some(format!("Failed to move {}: {}", R::LABEL.to_lowercase(), err));
                self.refetch(source, from_index).instrument(span.clone()).await;
                if from_index != to_index {
                    self.refetch(source, to_index).instrument(span).await;
                }
                Err(err)
            }
        }
    }

    fn index_of(&self, status: R::Status) -> Option<usize> {
        self.columns.iter().position(|c| c.status == status)
    }

    fn locate(&self, id: Uuid) -> Option<(usize, usize)> {
        self.columns
            .iter()
            .enumerate()
            .find_map(|(ci, column)| column.position_of(id).map(|ii| (ci, ii)))
    }

    /// Reload pages `1..=pages_loaded` of one column from scratch.
    async fn refetch<S: KanbanSource<R>>(&mut self, source: &S, index: usize) {
        let pages = self.columns[index].pages_loaded.max(1);
        self.columns[index].items.clear();
        self.columns[index].pages_loaded = 0;
        for page in 1..=pages {
            if !self.fetch_into(source, index, page).await {
                break;
            }
            if !self.columns[index].has_more() {
                break;
            }
        }
    }

    async fn fetch_into<S: KanbanSource<R>>(&mut self, source: &S, index: usize, page: u32) -> bool {
        let status = self.columns[index].status;
        self.columns[index].loading = true;
        let result = source.fetch_column(status, page, self.page_size).await;
        let column = &mut self.columns[index];
        column.loading = false;
        match result {
            Ok(response) => {
                column.total = response.total;
                column.total_pages = response.total_pages;
                column.pages_loaded = page;
                column.error = None;
                column.append(response.items);
                true
            }
            Err(err) => {
                warn!(status = status.as_str(), error = %err, "kanban column load failed");
                let message = format!("Failed to load {} column: {}", status.as_str(), err);
                column.error = Some(message.clone());
                if self.error.is_none() {
                    self.error = Some(message);
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeStore, deal};
    use entity::deal::{Model as Deal, Stage};

    fn store() -> FakeStore<Deal> {
        FakeStore::new(vec![
            deal("Alpha", Stage::New, 1_000),
            deal("Bravo", Stage::New, 2_000),
            deal("Charlie", Stage::New, 3_000),
            deal("Delta", Stage::Proposal, 10_000),
            deal("Echo", Stage::Won, 50_000),
        ])
    }

    fn titles(board: &KanbanBoard<Deal>, stage: Stage) -> Vec<String> {
        board
            .column(stage)
            .unwrap()
            .items()
            .iter()
            .map(|d| d.title.clone())
            .collect()
    }

    #[tokio::test]
    async fn load_groups_cards_by_stage() {
        let store = store();
        let mut board = KanbanBoard::<Deal>::new(2);
        board.load(&store).await;
        assert_eq!(board.columns().len(), Stage::ALL.len());
        assert_eq!(titles(&board, Stage::New), vec!["Alpha", "Bravo"]);
        assert_eq!(board.column(Stage::New).unwrap().total(), 3);
        assert!(board.column(Stage::New).unwrap().has_more());
        assert!(board.column(Stage::Lost).unwrap().items().is_empty());
        assert_eq!(board.total_count(), 5);
        assert_eq!(board.total_amount_cents(), 63_000);
    }

    #[tokio::test]
    async fn load_more_appends_until_exhausted() {
        let store = store();
        let mut board = KanbanBoard::<Deal>::new(2);
        board.load(&store).await;
        assert!(board.load_more(&store, Stage::New).await);
        assert_eq!(titles(&board, Stage::New), vec!["Alpha", "Bravo", "Charlie"]);
        assert!(!board.load_more(&store, Stage::New).await);
    }

    #[tokio::test]
    async fn move_is_applied_locally_and_persisted() {
        let store = store();
        let mut board = KanbanBoard::<Deal>::new(10);
        board.load(&store).await;
        let bravo = board.column(Stage::New).unwrap().items()[1].id;

        board
            .move_card(&store, bravo, Stage::Proposal, 0)
            .await
            .unwrap();

        assert_eq!(titles(&board, Stage::New), vec!["Alpha", "Charlie"]);
        assert_eq!(titles(&board, Stage::Proposal), vec!["Bravo", "Delta"]);
        assert_eq!(board.column(Stage::New).unwrap().total(), 2);
        assert_eq!(board.column(Stage::Proposal).unwrap().total(), 2);
        let saved = store.records().into_iter().find(|d| d.id == bravo).unwrap();
        assert_eq!(saved.stage, Stage::Proposal);
        assert!(board.error().is_none());
    }

    #[tokio::test]
    async fn rejected_move_restores_server_state() {
        let store = store();
        let mut board = KanbanBoard::<Deal>::new(10);
        board.load(&store).await;
        let alpha = board.column(Stage::New).unwrap().items()[0].id;

        store.fail_next(ApiError::InvalidInput("stage locked".into()));
        let err = board
            .move_card(&store, alpha, Stage::Won, 0)
            .await
            .unwrap_err();

        assert_eq!(err, ApiError::InvalidInput("stage locked".into()));
        assert_eq!(titles(&board, Stage::New), vec!["Alpha", "Bravo", "Charlie"]);
        assert_eq!(titles(&board, Stage::Won), vec!["Echo"]);
        assert_eq!(board.column(Stage::Won).unwrap().total(), 1);
        assert_eq!(
            board.error(),
            Some("Failed to move deal: bad request: stage locked")
        );
    }

    #[tokio::test]
    async fn load_more_after_moving_a_card_out_reaches_every_card() {
        let store = store();
        let mut board = KanbanBoard::<Deal>::new(2);
        board.load(&store).await;
        let alpha = board.column(Stage::New).unwrap().items()[0].id;

        board
            .move_card(&store, alpha, Stage::Proposal, 0)
            .await
            .unwrap();
        board.load_more(&store, Stage::New).await;

        assert_eq!(titles(&board, Stage::New), vec!["Bravo", "Charlie"]);
        let column = board.column(Stage::New).unwrap();
        assert_eq!(column.total(), 2);
        assert!(!column.has_more());
    }

    #[tokio::test]
    async fn rejected_move_refetches_every_loaded_page() {
        let store = FakeStore::new(
            ["Alpha", "Bravo", "Charlie", "Delta", "Echo"]
                .into_iter()
                .map(|title| deal(title, Stage::New, 1_000))
                .collect(),
        );
        let mut board = KanbanBoard::<Deal>::new(2);
        board.load(&store).await;
        assert!(board.load_more(&store, Stage::New).await);
        let alpha = board.column(Stage::New).unwrap().items()[0].id;

        store.fail_next(ApiError::InvalidInput("stage locked".into()));
        board
            .move_card(&store, alpha, Stage::Won, 0)
            .await
            .unwrap_err();

        assert_eq!(
            titles(&board, Stage::New),
            vec!["Alpha", "Bravo", "Charlie", "Delta"]
        );
        assert!(board.column(Stage::New).unwrap().has_more());
        assert!(titles(&board, Stage::Won).is_empty());
        assert!(board.load_more(&store, Stage::New).await);
        assert_eq!(titles(&board, Stage::New).len(), 5);
    }

    #[tokio::test]
    async fn cards_past_the_first_page_can_be_found_and_moved() {
        let store = store();
        let charlie = store
            .records()
            .into_iter()
            .find(|d| d.title == "Charlie")
            .unwrap()
            .id;
        let mut board = KanbanBoard::<Deal>::new(2);
        board.load(&store).await;
        assert_eq!(
            board.move_card(&store, charlie, Stage::Won, 0).await.unwrap_err(),
            ApiError::NotFound
        );

        assert!(board.load_until_found(&store, charlie).await);
        board.move_card(&store, charlie, Stage::Won, 0).await.unwrap();
        assert_eq!(titles(&board, Stage::Won), vec!["Charlie", "Echo"]);
        assert!(!board.load_until_found(&store, Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn reorder_within_a_column() {
        let store = store();
        let mut board = KanbanBoard::<Deal>::new(10);
        board.load(&store).await;
        let charlie = board.column(Stage::New).unwrap().items()[2].id;
        board.move_card(&store, charlie, Stage::New, 0).await.unwrap();
        assert_eq!(titles(&board, Stage::New), vec!["Charlie", "Alpha", "Bravo"]);
        assert_eq!(board.column(Stage::New).unwrap().total(), 3);

        board.load(&store).await;
        assert_eq!(titles(&board, Stage::New), vec!["Charlie", "Alpha", "Bravo"]);
    }

    #[tokio::test]
    async fn unknown_cards_are_rejected_without_calls() {
        let store = store();
        let mut board = KanbanBoard::<Deal>::new(10);
        board.load(&store).await;
        let err = board
            .move_card(&store, Uuid::new_v4(), Stage::Won, 0)
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::NotFound);
        assert_eq!(store.records().len(), 5);
    }
}
