use std::time::{Duration, Instant};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Paragraph, Row, Table},
};

use crate::domain::{HELP_TEXT, Toast, ToastVariant};
use crate::model::Model;

pub const TOAST_TTL: Duration = Duration::from_secs(5);
pub const COLUMN_SPACING: u16 = 2;

#[derive(Debug, Default)]
pub struct TableUI {
    toast: Option<(Toast, Instant)>,
}

impl TableUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_toast(&mut self, toast: Toast) {
        self.toast = Some((toast, Instant::now()));
    }

    pub fn active_toast(&self) -> Option<&Toast> {
        self.toast
            .as_ref()
            .filter(|(_, shown)| shown.elapsed() < TOAST_TTL)
            .map(|(toast, _)| toast)
    }

    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        let title = Line::from(format!(" {} ", model.config().table_header).bold());
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(Line::from(format!(" {HELP_TEXT} ")).centered())
            .border_set(border::THICK);
        let inner = block.inner(frame.area());
        frame.render_widget(block, frame.area());

        let [filter_area, table_area, footer_area, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        self.draw_filter(model, frame, filter_area);
        self.draw_table(model, frame, table_area);
        self.draw_footer(model, frame, footer_area);
        self.draw_status(frame, status_area);
    }

    fn draw_filter(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let label = format!("{}: ", model.config().filter_name);

        if let Some(input) = model.filter_input() {
            let line = Line::from(vec![label.clone().bold(), input.text.clone().yellow()]);
            frame.render_widget(Paragraph::new(line), area);
            let x = cursor_column(area, label.chars().count() + input.cursor);
            frame.set_cursor_position(Position::new(x, area.y));
            return;
        }

        let mut spans = vec![label.bold()];
        let current = model.status_filter();
        if model.options().is_empty() {
            let shown = if current.is_empty() { "All" } else { current };
            spans.push(shown.to_string().into());
        } else {
            for option in model.options() {
                let text = format!(" {} ", option.label);
                if option.value == current {
                    spans.push(Span::styled(
                        text,
                        Style::default().add_modifier(Modifier::REVERSED),
                    ));
                } else {
                    spans.push(text.into());
                }
            }
            if !model.options().iter().any(|o| o.value == current) {
                spans.push(format!(" [{current}]").yellow());
            }
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_table(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let views = model.column_views();
        if views.is_empty() || model.records().is_empty() {
            let text = if model.is_loading() {
                "Loading ..."
            } else {
                "No records to display"
            };
            let empty = Paragraph::new(text.dark_gray()).alignment(Alignment::Center);
            frame.render_widget(empty, area);
            return;
        }

        let header = Row::new(views.iter().map(|v| v.name.clone()))
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .bottom_margin(1);
        let rows = (0..model.records().len()).map(|idx| {
            Row::new(
                views
                    .iter()
                    .map(|v| v.data.get(idx).cloned().unwrap_or_default()),
            )
        });
        let widths = views.iter().map(|v| Constraint::Length(v.width as u16));

        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(COLUMN_SPACING);
        frame.render_widget(table, area);
    }

    fn draw_footer(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let nav = |text: &'static str, disabled: bool| {
            if disabled {
                text.dark_gray()
            } else {
                text.blue().bold()
            }
        };
        let mut spans = vec![
            nav("< Prev", model.is_first_page()),
            "   ".into(),
            model.page_info().into(),
            "   ".into(),
            nav("Next >", model.is_last_page()),
        ];
        if model.is_loading() {
            spans.push("   Loading ...".yellow());
        }
        frame.render_widget(Paragraph::new(Line::from(spans).centered()), area);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let Some(toast) = self.active_toast() else {
            frame.render_widget(Paragraph::new(HELP_TEXT.dark_gray()), area);
            return;
        };
        let color = match toast.variant {
            ToastVariant::Error => Color::Red,
            ToastVariant::Warning => Color::Yellow,
            ToastVariant::Info => Color::Cyan,
            ToastVariant::Success => Color::Green,
        };
        let line = Line::from(vec![
            Span::styled(
                format!("{}: ", toast.title),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(toast.message.clone(), Style::default().fg(color)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Terminal column of a cursor `offset` chars into `area`, kept inside it.
fn cursor_column(area: Rect, offset: usize) -> u16 {
    let max_offset = usize::from(area.width.saturating_sub(1));
    area.x + offset.min(max_offset) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{
        ColumnDescriptor, FetchError, FetchOutcome, OptionDescriptor, TableDataClient,
        TableDataRequest, TableDataResponse,
    };
    use crate::domain::{Message, ViewConfig};
    use crate::notifier::ChannelNotifier;
    use async_trait::async_trait;
    use ratatui::{Terminal, backend::TestBackend};
    use serde_json::json;
    use std::sync::Arc;
    use tokio::runtime::Handle;
    use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

    struct StaticClient;

    #[async_trait]
    impl TableDataClient for StaticClient {
        async fn get_table_data(
            &self,
            _request: TableDataRequest,
        ) -> Result<TableDataResponse, FetchError> {
            let row = json!({ "Name": "Gold Plan", "Status": "Active" });
            Ok(TableDataResponse {
                columns: vec![ColumnDescriptor {
                    label: "Name".into(),
                    field_name: "Name".into(),
                    column_type: None,
                }],
                records: vec![row.as_object().cloned().unwrap_or_default()],
                options: vec![OptionDescriptor {
                    label: "Active".into(),
                    value: "Active".into(),
                }],
                total_records: 1,
            })
        }
    }

    fn render(ui: &TableUI, model: &Model) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 14)).unwrap();
        terminal.draw(|f| ui.draw(model, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn build_model(config: ViewConfig) -> (Model, UnboundedReceiver<FetchOutcome>) {
        let (tx, rx) = unbounded_channel();
        let (toast_tx, _toast_rx) = unbounded_channel();
        let model = Model::new(
            config,
            Arc::new(StaticClient),
            Arc::new(ChannelNotifier::new(toast_tx)),
            Handle::current(),
            tx,
        )
        .unwrap();
        (model, rx)
    }

    #[tokio::test]
    async fn renders_empty_view() {
        let (model, _rx) = build_model(ViewConfig::default().table_header("Subscriptions"));
        let screen = render(&TableUI::new(), &model);
        assert!(screen.contains("Subscriptions"));
        assert!(screen.contains("Showing 0 to 0 of 0"));
        assert!(screen.contains("No records to display"));
        assert!(screen.contains("Status: All"));
    }

    #[tokio::test]
    async fn renders_loaded_rows() {
        let config = ViewConfig::default().record_id("006A").config_name("Subs");
        let (mut model, mut rx) = build_model(config);
        model.connected();
        let outcome = rx.recv().await.unwrap();
        model.update(Message::Loaded(outcome)).unwrap();

        let screen = render(&TableUI::new(), &model);
        assert!(screen.contains("Gold Plan"));
        assert!(screen.contains("Showing 1 to 1 of 1"));
        assert!(screen.contains("Active"));
    }

    #[tokio::test]
    async fn renders_latest_toast() {
        let (model, _rx) = build_model(ViewConfig::default());
        let mut ui = TableUI::new();
        ui.push_toast(Toast {
            title: "Warning".into(),
            message: "Record ID and Config Name are required".into(),
            variant: ToastVariant::Warning,
        });
        let screen = render(&ui, &model);
        assert!(screen.contains("Warning: Record ID and Config Name are required"));
    }

    #[tokio::test]
    async fn shows_key_help_without_toast() {
        let (model, _rx) = build_model(ViewConfig::default());
        let screen = render(&TableUI::new(), &model);
        // Once in the status line and once on the bottom border.
        assert_eq!(screen.matches(HELP_TEXT).count(), 2);
    }

    #[test]
    fn cursor_stays_inside_filter_area() {
        let area = Rect::new(1, 1, 28, 1);
        assert_eq!(cursor_column(area, 0), 1);
        assert_eq!(cursor_column(area, 10), 11);
        assert_eq!(cursor_column(area, 27), 28);
        assert_eq!(cursor_column(area, 28), 28);
        assert_eq!(cursor_column(area, 70_000), 28);
        assert_eq!(cursor_column(Rect::new(3, 0, 0, 1), 5), 3);
    }

    #[test]
    fn toast_expires() {
        let mut ui = TableUI::new();
        ui.toast = Some((
            Toast {
                title: "Error".into(),
                message: "old".into(),
                variant: ToastVariant::Error,
            },
            Instant::now() - TOAST_TTL - Duration::from_secs(1),
        ));
        assert!(ui.active_toast().is_none());
    }
}
