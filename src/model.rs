use std::sync::Arc;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, trace, warn};

use crate::client::{
    ColumnDescriptor, FetchOutcome, OptionDescriptor, Row, TableDataClient, TableDataRequest,
};
use crate::domain::{Message, RTError, Toast, ToastVariant, ViewConfig};
use crate::inputter::{InputResult, InputState, Inputter};
use crate::notifier::Notifier;

pub const MAX_COLUMN_WIDTH: usize = 40;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Status {
    IDLE,
    LOADING,
    QUITTING,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnView {
    pub name: String,
    pub width: usize,
    pub data: Vec<String>,
}

/// State of the related records table: filter, page, the last result set and
/// the bookkeeping for requests in flight.
pub struct Model {
    config: ViewConfig,
    client: Arc<dyn TableDataClient>,
    notifier: Arc<dyn Notifier>,
    runtime: Handle,
    outcomes: UnboundedSender<FetchOutcome>,
    pub status: Status,
    status_filter: String,
    page: u32,
    total_records: u64,
    records: Vec<Row>,
    columns: Vec<ColumnDescriptor>,
    options: Vec<OptionDescriptor>,
    latest_token: u64, // token of the most recently dispatched request
    input: Inputter,
    active_filter_input: bool,
    last_input: InputResult,
}

impl Model {
    pub fn new(
        config: ViewConfig,
        client: Arc<dyn TableDataClient>,
        notifier: Arc<dyn Notifier>,
        runtime: Handle,
        outcomes: UnboundedSender<FetchOutcome>,
    ) -> Result<Self, RTError> {
        if config.per_page == 0 {
            return Err(RTError::InvalidPageSize(config.per_page));
        }
        Ok(Self {
            config,
            client,
            notifier,
            runtime,
            outcomes,
            status: Status::IDLE,
            status_filter: String::new(),
            page: 1,
            total_records: 0,
            records: Vec::new(),
            columns: Vec::new(),
            options: Vec::new(),
            latest_token: 0,
            input: Inputter::default(),
            active_filter_input: false,
            last_input: InputResult::default(),
        })
    }

    /// First load after the view is attached to its host.
    pub fn connected(&mut self) {
        info!(
            record_id = ?self.config.record_id,
            config_name = ?self.config.config_name,
            "Table view connected"
        );
        self.load_table_data();
    }

    pub fn update(&mut self, message: Message) -> Result<(), RTError> {
        trace!("Update: {message:?}");
        match message {
            Message::Quit => self.quit(),
            Message::PreviousPage => self.handle_prev(),
            Message::NextPage => self.handle_next(),
            Message::PreviousOption => self.select_option(-1),
            Message::NextOption => self.select_option(1),
            Message::EditFilter => self.enter_filter_input(),
            Message::ClearFilter => self.handle_status_change(String::new()),
            Message::Reload => self.load_table_data(),
            Message::RawKey(key) => self.raw_input(key),
            Message::Loaded(outcome) => self.apply_outcome(outcome),
        }
        Ok(())
    }

    // -------------------- Derived values ---------------------- //

    pub fn is_first_page(&self) -> bool {
        self.page == 1
    }

    pub fn is_last_page(&self) -> bool {
        u64::from(self.page) >= self.max_page()
    }

    pub fn max_page(&self) -> u64 {
        self.total_records.div_ceil(u64::from(self.config.per_page))
    }

    pub fn page_info(&self) -> String {
        if self.total_records == 0 {
            return "Showing 0 to 0 of 0".to_string();
        }
        let per_page = u64::from(self.config.per_page);
        let page = u64::from(self.page);
        let start = (page - 1) * per_page + 1;
        let end = std::cmp::min(page * per_page, self.total_records);
        format!("Showing {start} to {end} of {}", self.total_records)
    }

    pub fn column_views(&self) -> Vec<ColumnView> {
        self.columns
            .iter()
            .map(|column| {
                let data: Vec<String> = self
                    .records
                    .iter()
                    .map(|row| cell_text(row, &column.field_name))
                    .collect();
                let width = calculate_column_width(&column.label, &data, MAX_COLUMN_WIDTH);
                ColumnView {
                    name: column.label.clone(),
                    width,
                    data,
                }
            })
            .collect()
    }

    // -------------------- Accessors ---------------------- //

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn is_loading(&self) -> bool {
        self.status == Status::LOADING
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_records(&self) -> u64 {
        self.total_records
    }

    pub fn status_filter(&self) -> &str {
        &self.status_filter
    }

    pub fn records(&self) -> &[Row] {
        &self.records
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn options(&self) -> &[OptionDescriptor] {
        &self.options
    }

    pub fn raw_keyevents(&self) -> bool {
        self.active_filter_input
    }

    pub fn filter_input(&self) -> Option<&InputResult> {
        self.active_filter_input.then_some(&self.last_input)
    }

    // -------------------- Fetching ---------------------- //

    pub fn load_table_data(&mut self) {
        let parent_id = non_empty(self.config.record_id.as_deref());
        let config_name = non_empty(self.config.config_name.as_deref());
        let (Some(parent_id), Some(config_name)) = (parent_id, config_name) else {
            warn!("Skipping table data request, identifiers are missing");
            self.show_toast(
                "Warning",
                "Record ID and Config Name are required",
                ToastVariant::Warning,
            );
            return;
        };

        let request = TableDataRequest {
            config_name: config_name.to_string(),
            parent_id: parent_id.to_string(),
            status_filter: self.status_filter.clone(),
            page: self.page,
            per_page: self.config.per_page,
        };

        self.latest_token += 1;
        let token = self.latest_token;
        if self.status != Status::QUITTING {
            self.status = Status::LOADING;
        }
        debug!(token, ?request, "Dispatching table data request");

        let client = Arc::clone(&self.client);
        let outcomes = self.outcomes.clone();
        self.runtime.spawn(async move {
            let result = client.get_table_data(request).await;
            // Receiver is gone once the view shut down.
            let _ = outcomes.send(FetchOutcome { token, result });
        });
    }

    fn apply_outcome(&mut self, outcome: FetchOutcome) {
        if outcome.token != self.latest_token {
            debug!(
                token = outcome.token,
                latest = self.latest_token,
                "Discarding response of a superseded request"
            );
            return;
        }
        if self.status == Status::LOADING {
            self.status = Status::IDLE;
        }

        match outcome.result {
            Ok(response) => {
                info!(
                    page = self.page,
                    rows = response.records.len(),
                    total = response.total_records,
                    "Loaded table data"
                );
                self.columns = response.columns;
                self.records = response.records;
                self.options = response.options;
                self.total_records = response.total_records;
            }
            Err(err) => {
                error!("Loading table data failed: {err}");
                self.show_toast("Error", &err.user_message(), ToastVariant::Error);
            }
        }
    }

    // -------------------- Interactions ---------------------- //

    pub fn handle_status_change(&mut self, value: String) {
        info!("Status filter changed to {value:?}");
        self.status_filter = value;
        self.page = 1;
        self.load_table_data();
    }

    pub fn handle_prev(&mut self) {
        if self.page > 1 {
            self.page -= 1;
            info!("Moving to page {}", self.page);
            self.load_table_data();
        }
    }

    pub fn handle_next(&mut self) {
        if u64::from(self.page) < self.max_page() {
            self.page += 1;
            info!("Moving to page {}", self.page);
            self.load_table_data();
        }
    }

    fn select_option(&mut self, step: i64) {
        if self.options.is_empty() {
            return;
        }
        let len = self.options.len() as i64;
        let next = match self
            .options
            .iter()
            .position(|option| option.value == self.status_filter)
        {
            Some(idx) => (idx as i64 + step).rem_euclid(len),
            None if step > 0 => 0,
            None => len - 1,
        };
        let value = self.options[next as usize].value.clone();
        self.handle_status_change(value);
    }

    fn enter_filter_input(&mut self) {
        trace!("Entering filter input ...");
        self.input.start(&self.status_filter);
        self.last_input = self.input.get();
        self.active_filter_input = true;
    }

    fn raw_input(&mut self, key: ratatui::crossterm::event::KeyEvent) {
        if !self.active_filter_input {
            return;
        }
        self.last_input = self.input.read(key);
        match self.last_input.state {
            InputState::EDITING => {}
            InputState::CANCELED => self.active_filter_input = false,
            InputState::SUBMITTED => {
                self.active_filter_input = false;
                let value = self.last_input.text.clone();
                self.handle_status_change(value);
            }
        }
    }

    pub fn show_toast(&self, title: &str, message: &str, variant: ToastVariant) {
        self.notifier.notify(Toast {
            title: title.to_string(),
            message: message.to_string(),
            variant,
        });
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Text of a cell. Dotted field names walk into nested relationship objects.
pub fn cell_text(row: &Row, field_name: &str) -> String {
    let mut parts = field_name.split('.');
    let mut value = parts.next().and_then(|first| row.get(first));
    for part in parts {
        value = value.and_then(|v| v.get(part));
    }
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn calculate_column_width(label: &str, data: &[String], max_column_width: usize) -> usize {
    let widest = data
        .iter()
        .map(|s| s.chars().count())
        .chain(std::iter::once(label.chars().count()))
        .max()
        .unwrap_or(0);
    std::cmp::min(widest, max_column_width)
}
