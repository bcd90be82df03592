use std::collections::HashMap;

use chrono::Utc;
use futures::future::try_join_all;
use uuid::Uuid;

use crate::models::{AddStockRequest, SalesUpdateRequest, StockEntry};
use crate::{AppError, Result};

use super::{ApiClient, TimeService, WeekStamp};

/// Id under which field edits target the in-progress draft row.
pub const DRAFT_ID: &str = "new";

const TEMP_PREFIX: &str = "temp-";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Numeric,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    ItemName,
    QuantityReceived,
    QuantitySold,
    UnitPrice,
    SellingPrice,
    Week,
    CreatedAt,
    UpdatedAt,
}

/// One table column. The schema drives rendering, editability and numeric
/// coercion instead of iterating dynamic object keys.
#[derive(Clone, Copy, Debug)]
pub struct Column {
    pub field: Field,
    pub label: &'static str,
    pub editable: bool,
    pub kind: FieldKind,
}

pub const COLUMNS: [Column; 8] = [
    Column {
        field: Field::ItemName,
        label: "ITEM NAME",
        editable: true,
        kind: FieldKind::Text,
    },
    Column {
        field: Field::QuantityReceived,
        label: "QUANTITY RECEIVED",
        editable: true,
        kind: FieldKind::Numeric,
    },
    Column {
        field: Field::QuantitySold,
        label: "QUANTITY SOLD",
        editable: true,
        kind: FieldKind::Numeric,
    },
    Column {
        field: Field::UnitPrice,
        label: "UNIT PRICE",
        editable: true,
        kind: FieldKind::Numeric,
    },
    Column {
        field: Field::SellingPrice,
        label: "SELLING PRICE",
        editable: true,
        kind: FieldKind::Numeric,
    },
    Column {
        field: Field::Week,
        label: "WEEK",
        editable: false,
        kind: FieldKind::Numeric,
    },
    Column {
        field: Field::CreatedAt,
        label: "CREATED AT",
        editable: false,
        kind: FieldKind::Text,
    },
    Column {
        field: Field::UpdatedAt,
        label: "UPDATED AT",
        editable: false,
        kind: FieldKind::Text,
    },
];

impl Field {
    pub fn column(self) -> &'static Column {
        COLUMNS
            .iter()
            .find(|column| column.field == self)
            .expect("every field has a column")
    }
}

/// A row being composed client-side, raw input strings and all.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DraftRow {
    pub item_name: String,
    pub quantity_received: String,
    pub quantity_sold: String,
    pub unit_price: String,
    pub selling_price: String,
}

impl DraftRow {
    fn set(&mut self, field: Field, value: &str) {
        match field {
            Field::ItemName => self.item_name = value.to_string(),
            Field::QuantityReceived => self.quantity_received = value.to_string(),
            Field::QuantitySold => self.quantity_sold = value.to_string(),
            Field::UnitPrice => self.unit_price = value.to_string(),
            Field::SellingPrice => self.selling_price = value.to_string(),
            _ => {}
        }
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            &self.item_name,
            &self.quantity_received,
            &self.unit_price,
            &self.selling_price,
        ];
        if required.iter().any(|value| value.trim().is_empty()) {
            return Err(AppError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }
        Ok(())
    }

    fn into_entry(self, temp_id: String, stamp: &WeekStamp) -> StockEntry {
        StockEntry {
            id: temp_id,
            // the server assigns the owner on create; drafts carry nil
            owner_id: Uuid::nil(),
            item_name: self.item_name,
            quantity_received: coerce_number(&self.quantity_received),
            quantity_sold: coerce_number(&self.quantity_sold),
            unit_price: coerce_number(&self.unit_price),
            selling_price: Some(coerce_number(&self.selling_price)),
            week: stamp.week,
            year: stamp.year,
            created_at: stamp.timestamp.clone(),
            updated_at: stamp.timestamp.clone(),
        }
    }
}

fn coerce_number(value: &str) -> f64 {
    value.trim().parse().unwrap_or(0.0)
}

/// Everything the dashboard holds between user actions. `entries` is the
/// last-fetched snapshot in display order; `editable` holds deep copies
/// reconciled against it on save.
#[derive(Clone, Debug, Default)]
pub struct DashboardState {
    pub entries: Vec<StockEntry>,
    pub edit_mode: bool,
    pub editable: HashMap<String, StockEntry>,
    pub draft: Option<DraftRow>,
}

/// One user action. Each reduces to a pure state transition.
#[derive(Clone, Debug)]
pub enum Action {
    EntriesFetched(Vec<StockEntry>),
    EnterEditMode,
    EditField {
        id: String,
        field: Field,
        value: String,
    },
    OpenDraft,
    DiscardDraft,
    CommitDraft {
        temp_id: String,
        stamp: WeekStamp,
    },
    SaveSucceeded,
    Cancel,
}

pub fn reduce(state: &mut DashboardState, action: Action) {
    match action {
        Action::EntriesFetched(mut entries) => {
            // newest first; stamps share an offset, so string order works
            entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            state.entries = entries;
        }
        Action::EnterEditMode => {
            state.edit_mode = true;
            state.editable = state
                .entries
                .iter()
                .map(|entry| (entry.id.clone(), entry.clone()))
                .collect();
        }
        Action::EditField { id, field, value } => {
            if id == DRAFT_ID {
                if let Some(draft) = state.draft.as_mut() {
                    draft.set(field, &value);
                }
            } else if let Some(copy) = state.editable.get_mut(&id) {
                apply_field(copy, field, &value);
            }
        }
        Action::OpenDraft => {
            state.draft = Some(DraftRow::default());
            state.edit_mode = true;
        }
        Action::DiscardDraft => {
            state.draft = None;
        }
        Action::CommitDraft { temp_id, stamp } => {
            if let Some(draft) = state.draft.take() {
                let entry = draft.into_entry(temp_id, &stamp);
                state.editable.insert(entry.id.clone(), entry.clone());
                state.entries.insert(0, entry);
            }
        }
        Action::SaveSucceeded | Action::Cancel => {
            state.edit_mode = false;
            state.editable.clear();
            state.draft = None;
        }
    }
}

fn apply_field(entry: &mut StockEntry, field: Field, value: &str) {
    match field {
        Field::ItemName => entry.item_name = value.to_string(),
        Field::QuantityReceived => entry.quantity_received = coerce_number(value),
        Field::QuantitySold => entry.quantity_sold = coerce_number(value),
        Field::UnitPrice => entry.unit_price = coerce_number(value),
        Field::SellingPrice => entry.selling_price = Some(coerce_number(value)),
        // week and timestamps are not editable
        Field::Week | Field::CreatedAt | Field::UpdatedAt => {}
    }
}

fn entry_changed(original: &StockEntry, edited: &StockEntry) -> bool {
    original.item_name != edited.item_name
        || original.quantity_received != edited.quantity_received
        || original.quantity_sold != edited.quantity_sold
        || original.unit_price != edited.unit_price
        || original.selling_price != edited.selling_price
}

/// What a save cycle will send: committed drafts go through the create
/// endpoint, changed existing rows through update-sales.
#[derive(Debug, Default)]
pub struct SavePlan {
    pub creates: Vec<StockEntry>,
    pub updates: Vec<StockEntry>,
}

impl SavePlan {
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty()
    }
}

pub fn plan_save(state: &DashboardState) -> SavePlan {
    let mut plan = SavePlan::default();
    for (id, edited) in &state.editable {
        if id.starts_with(TEMP_PREFIX) {
            plan.creates.push(edited.clone());
        } else if let Some(original) = state.entries.iter().find(|entry| entry.id == *id) {
            if entry_changed(original, edited) {
                plan.updates.push(edited.clone());
            }
        }
    }
    plan
}

#[derive(Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing differed from the snapshot; no network calls were made.
    NoChanges,
    Saved,
    /// At least one batched call failed; no per-row attribution.
    Failed,
}

/// Drives the edit cycle against the API and the time service.
pub struct Dashboard {
    api: ApiClient,
    time: TimeService,
    pub state: DashboardState,
}

impl Dashboard {
    pub fn new(api: ApiClient, time: TimeService) -> Self {
        Self {
            api,
            time,
            state: DashboardState::default(),
        }
    }

    /// Fetch the authoritative list and re-sort it for display.
    pub async fn refresh(&mut self) -> Result<()> {
        let entries = self.api.list_entries().await?;
        reduce(&mut self.state, Action::EntriesFetched(entries));
        Ok(())
    }

    pub fn enter_edit_mode(&mut self) {
        reduce(&mut self.state, Action::EnterEditMode);
    }

    pub fn edit_field(&mut self, id: &str, field: Field, value: &str) {
        reduce(
            &mut self.state,
            Action::EditField {
                id: id.to_string(),
                field,
                value: value.to_string(),
            },
        );
    }

    pub fn add_row(&mut self) {
        reduce(&mut self.state, Action::OpenDraft);
    }

    pub fn discard_draft(&mut self) {
        reduce(&mut self.state, Action::DiscardDraft);
    }

    pub fn cancel(&mut self) {
        reduce(&mut self.state, Action::Cancel);
    }

    /// Validate the draft, stamp it with the time service's week/year (local
    /// clock on failure) and register it for the next save cycle.
    pub async fn commit_draft(&mut self) -> Result<()> {
        let draft = self
            .state
            .draft
            .as_ref()
            .ok_or_else(|| AppError::Validation("No draft row open".to_string()))?;
        draft.validate()?;
        let stamp = self.time.week_stamp().await;
        let temp_id = format!("{TEMP_PREFIX}{}", Utc::now().timestamp_millis());
        reduce(&mut self.state, Action::CommitDraft { temp_id, stamp });
        Ok(())
    }

    /// Reconcile the editable copies against the snapshot and push every
    /// change concurrently. All-or-nothing: any failure leaves edit mode
    /// open and reports one generic outcome.
    pub async fn save(&mut self) -> Result<SaveOutcome> {
        let plan = plan_save(&self.state);
        if plan.is_empty() {
            return Ok(SaveOutcome::NoChanges);
        }
        let updated_at = self.time.now_or_local().await;
        let updates = plan
            .updates
            .iter()
            .map(|entry| {
                let request = SalesUpdateRequest {
                    quantity_sold: Some(entry.quantity_sold),
                    unit_price: Some(entry.unit_price),
                    selling_price: entry.selling_price,
                };
                let api = &self.api;
                let id = entry.id.clone();
                async move { api.update_sales(&id, &request).await }
            })
            .collect::<Vec<_>>();
        let creates = plan
            .creates
            .iter()
            .map(|entry| {
                let request = AddStockRequest {
                    item_name: Some(entry.item_name.clone()),
                    quantity_received: Some(entry.quantity_received),
                    unit_price: Some(entry.unit_price),
                    selling_price: entry.selling_price,
                    week: Some(entry.week),
                    year: Some(entry.year),
                    created_at: Some(entry.created_at.clone()),
                    updated_at: Some(updated_at.clone()),
                };
                let api = &self.api;
                async move { api.add_entry(&request).await }
            })
            .collect::<Vec<_>>();
        let (updated, created) =
            futures::join!(try_join_all(updates), try_join_all(creates));
        if let Err(err) = updated.and(created) {
            tracing::warn!("batch save failed: {err}");
            return Ok(SaveOutcome::Failed);
        }
        reduce(&mut self.state, Action::SaveSucceeded);
        self.refresh().await?;
        Ok(SaveOutcome::Saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, name: &str, created_at: &str) -> StockEntry {
        StockEntry {
            id: id.to_string(),
            owner_id: Uuid::nil(),
            item_name: name.to_string(),
            quantity_received: 10.0,
            quantity_sold: 2.0,
            unit_price: 3.0,
            selling_price: Some(4.0),
            week: 11,
            year: 2024,
            created_at: created_at.to_string(),
            updated_at: created_at.to_string(),
        }
    }

    fn stamp() -> WeekStamp {
        WeekStamp {
            year: 2024,
            week: 11,
            timestamp: "2024-03-15T10:00:00+05:30".to_string(),
        }
    }

    fn state_with_rows() -> DashboardState {
        let mut state = DashboardState::default();
        reduce(
            &mut state,
            Action::EntriesFetched(vec![
                entry("a", "Flour", "2024-03-10T09:00:00+05:30"),
                entry("b", "Sugar", "2024-03-12T09:00:00+05:30"),
            ]),
        );
        state
    }

    #[test]
    fn fetch_sorts_newest_first() {
        let state = state_with_rows();
        assert_eq!(state.entries[0].id, "b");
        assert_eq!(state.entries[1].id, "a");
    }

    #[test]
    fn entering_edit_mode_snapshots_every_row() {
        let mut state = state_with_rows();
        reduce(&mut state, Action::EnterEditMode);
        assert!(state.edit_mode);
        assert_eq!(state.editable.len(), 2);
        assert_eq!(state.editable["a"], state.entries[1]);
    }

    #[test]
    fn edits_mutate_the_copy_not_the_displayed_row() {
        let mut state = state_with_rows();
        reduce(&mut state, Action::EnterEditMode);
        reduce(
            &mut state,
            Action::EditField {
                id: "a".to_string(),
                field: Field::QuantitySold,
                value: "7".to_string(),
            },
        );
        assert_eq!(state.editable["a"].quantity_sold, 7.0);
        assert_eq!(state.entries[1].quantity_sold, 2.0);
    }

    #[test]
    fn numeric_coercion_defaults_to_zero() {
        let mut state = state_with_rows();
        reduce(&mut state, Action::EnterEditMode);
        reduce(
            &mut state,
            Action::EditField {
                id: "a".to_string(),
                field: Field::UnitPrice,
                value: "not a number".to_string(),
            },
        );
        assert_eq!(state.editable["a"].unit_price, 0.0);
    }

    #[test]
    fn non_editable_fields_are_ignored() {
        let mut state = state_with_rows();
        reduce(&mut state, Action::EnterEditMode);
        reduce(
            &mut state,
            Action::EditField {
                id: "a".to_string(),
                field: Field::Week,
                value: "50".to_string(),
            },
        );
        assert_eq!(state.editable["a"].week, 11);
    }

    #[test]
    fn draft_edits_route_to_the_draft() {
        let mut state = state_with_rows();
        reduce(&mut state, Action::OpenDraft);
        reduce(
            &mut state,
            Action::EditField {
                id: DRAFT_ID.to_string(),
                field: Field::ItemName,
                value: "Salt".to_string(),
            },
        );
        assert_eq!(state.draft.as_ref().unwrap().item_name, "Salt");
        assert!(state.edit_mode);
    }

    #[test]
    fn committed_draft_is_prepended_and_registered() {
        let mut state = state_with_rows();
        reduce(&mut state, Action::OpenDraft);
        reduce(
            &mut state,
            Action::EditField {
                id: DRAFT_ID.to_string(),
                field: Field::ItemName,
                value: "Salt".to_string(),
            },
        );
        reduce(
            &mut state,
            Action::CommitDraft {
                temp_id: "temp-1".to_string(),
                stamp: stamp(),
            },
        );
        assert!(state.draft.is_none());
        assert_eq!(state.entries[0].id, "temp-1");
        assert_eq!(state.entries[0].item_name, "Salt");
        assert_eq!(state.entries[0].week, 11);
        assert!(state.editable.contains_key("temp-1"));
    }

    #[test]
    fn untouched_edit_session_plans_nothing() {
        let mut state = state_with_rows();
        reduce(&mut state, Action::EnterEditMode);
        assert!(plan_save(&state).is_empty());
    }

    #[test]
    fn changed_rows_and_drafts_split_into_updates_and_creates() {
        let mut state = state_with_rows();
        reduce(&mut state, Action::EnterEditMode);
        reduce(
            &mut state,
            Action::EditField {
                id: "b".to_string(),
                field: Field::QuantitySold,
                value: "9".to_string(),
            },
        );
        reduce(&mut state, Action::OpenDraft);
        reduce(
            &mut state,
            Action::EditField {
                id: DRAFT_ID.to_string(),
                field: Field::ItemName,
                value: "Salt".to_string(),
            },
        );
        reduce(
            &mut state,
            Action::CommitDraft {
                temp_id: "temp-1".to_string(),
                stamp: stamp(),
            },
        );
        let plan = plan_save(&state);
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].id, "b");
        assert_eq!(plan.creates.len(), 1);
        assert_eq!(plan.creates[0].id, "temp-1");
    }

    #[test]
    fn editable_rows_without_an_original_are_skipped() {
        let mut state = state_with_rows();
        reduce(&mut state, Action::EnterEditMode);
        state
            .editable
            .insert("ghost".to_string(), entry("ghost", "Ghost", "now"));
        assert!(plan_save(&state).is_empty());
    }

    #[test]
    fn cancel_discards_all_edit_state() {
        let mut state = state_with_rows();
        reduce(&mut state, Action::EnterEditMode);
        reduce(&mut state, Action::OpenDraft);
        reduce(&mut state, Action::Cancel);
        assert!(!state.edit_mode);
        assert!(state.editable.is_empty());
        assert!(state.draft.is_none());
        assert_eq!(state.entries.len(), 2);
    }

    #[test]
    fn draft_validation_requires_the_core_fields() {
        let mut draft = DraftRow {
            item_name: "Salt".to_string(),
            quantity_received: "5".to_string(),
            quantity_sold: String::new(),
            unit_price: "2".to_string(),
            selling_price: "3".to_string(),
        };
        assert!(draft.validate().is_ok());
        draft.unit_price = String::new();
        assert!(matches!(draft.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn schema_marks_week_and_timestamps_read_only() {
        for column in COLUMNS {
            let expected = !matches!(
                column.field,
                Field::Week | Field::CreatedAt | Field::UpdatedAt
            );
            assert_eq!(column.editable, expected, "{:?}", column.field);
        }
        assert_eq!(Field::UnitPrice.column().kind, FieldKind::Numeric);
    }
}
