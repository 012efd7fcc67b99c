use super::model::{FormField, TuiModel, ViewMode};
use chrono::{DateTime, Local};
use dedupdash_core::domain::{Codec, ConnectionStatus, ProgressSnapshot, RepoDescriptor};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap},
    Frame,
};

/// The View component of MVU - responsible for rendering the model
pub struct TuiView;

impl TuiView {
    /// Render the entire TUI based on the current model state
    pub fn render(model: &TuiModel, frame: &mut Frame) {
        let size = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title bar
                Constraint::Min(0),    // Main content
                Constraint::Length(2), // Status + key hints
            ])
            .split(size);

        Self::render_title_bar(model, frame, chunks[0]);

        match &model.mode {
            ViewMode::Repositories => Self::render_repositories(model, frame, chunks[1]),
            ViewMode::Duplicates { repo } => Self::render_duplicates(model, frame, chunks[1], repo),
            ViewMode::AddRepository => Self::render_form(model, frame, chunks[1]),
            ViewMode::ErrorHistory => Self::render_error_history(model, frame, chunks[1]),
            ViewMode::Activity => Self::render_activity(model, frame, chunks[1]),
            ViewMode::Help => Self::render_help_view(frame, chunks[1]),
        }

        Self::render_status_bar(model, frame, chunks[2]);
        Self::render_overlays(model, frame, size);
    }

    fn render_title_bar(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let title = match &model.mode {
            ViewMode::Repositories => "dedupdash - Repositories",
            ViewMode::Duplicates { .. } => "dedupdash - Duplicates",
            ViewMode::AddRepository => "dedupdash - Add Repository",
            ViewMode::ErrorHistory => "dedupdash - Error History",
            ViewMode::Activity => "dedupdash - Activity",
            ViewMode::Help => "dedupdash - Help",
        };

        let loading = if model.dashboard.repos_loading {
            " [LOADING...]"
        } else {
            ""
        };
        let indexing = if model.dashboard.progress.is_some() {
            " [INDEXING...]"
        } else {
            ""
        };

        let title_paragraph = Paragraph::new(format!("{}{}{}", title, loading, indexing))
            .style(Style::default().fg(Color::White).bg(Color::Blue))
            .alignment(Alignment::Center);

        frame.render_widget(title_paragraph, area);
    }

    /// Repository list, with the progress panel and activity panel when present
    fn render_repositories(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let (main, progress_area) = match &model.dashboard.progress {
            Some(_) => {
                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(7)])
                    .split(area);
                (rows[0], Some(rows[1]))
            }
            None => (area, None),
        };

        let list_area = if model.ui_state.show_activity {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
                .split(main);
            Self::render_activity_panel(model, frame, columns[1]);
            columns[0]
        } else {
            main
        };

        Self::render_repo_list(model, frame, list_area);

        if let (Some(snapshot), Some(progress_area)) = (&model.dashboard.progress, progress_area) {
            Self::render_progress(snapshot, frame, progress_area);
        }
    }

    fn render_repo_list(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let repos = &model.dashboard.repositories;

        if repos.is_empty() {
            let empty_msg = if model.dashboard.repos_loading {
                "Loading repositories..."
            } else {
                "No repositories registered. Press 'a' to add one."
            };

            let paragraph = Paragraph::new(empty_msg)
                .block(Block::default().borders(Borders::ALL).title("Repositories"))
                .style(Style::default().fg(Color::Yellow))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });

            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = repos
            .iter()
            .enumerate()
            .map(|(index, repo)| {
                let style = if index == model.ui_state.repo_cursor {
                    Style::default().bg(Color::DarkGray)
                } else {
                    Style::default()
                };
                ListItem::new(Self::repo_line(repo)).style(style)
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Repositories"))
            .highlight_style(Style::default().add_modifier(Modifier::BOLD));

        frame.render_widget(list, area);
    }

    fn repo_line(repo: &RepoDescriptor) -> Line<'_> {
        let mut spans = vec![
            Span::styled(
                repo.name.as_str(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(repo.absolute_path.as_str(), Style::default().fg(Color::Gray)),
            Span::raw(format!("  [{}", repo.codec)),
        ];
        if repo.is_compressed() {
            spans.push(Span::raw(", compressed"));
        }
        spans.push(Span::raw(format!(", {} idx]", repo.indices)));

        if let Some(stats) = &repo.stats {
            spans.push(Span::styled(
                format!(
                    "  {} files, {}",
                    stats.file_count,
                    human_size(stats.total_size)
                ),
                Style::default().fg(Color::Cyan),
            ));
        }
        Line::from(spans)
    }

    fn render_progress(snapshot: &ProgressSnapshot, frame: &mut Frame, area: Rect) {
        let title = match &snapshot.repo {
            Some(repo) => format!("Indexing {}", repo),
            None => "Indexing".to_string(),
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(inner);

        let percent = snapshot.display_percent().unwrap_or(0);
        let label = match &snapshot.status {
            Some(status) => format!("{}% {}", percent, status),
            None => format!("{}%", percent),
        };
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
            .percent(percent)
            .label(label);
        frame.render_widget(gauge, rows[0]);

        let counters = [
            ("files", snapshot.files()),
            ("hashed", snapshot.hashed()),
            ("unchanged", snapshot.unchanged()),
            ("dirs", snapshot.directories()),
            ("deleted", snapshot.deleted()),
        ];
        let counter_text = counters
            .iter()
            .filter(|(_, counter)| !counter.is_empty())
            .map(|(name, counter)| format!("{} {}", name, counter))
            .collect::<Vec<_>>()
            .join(" | ");

        let mut lines = vec![Line::from(counter_text)];

        let mut timing = Vec::new();
        if let Some(duration) = &snapshot.duration {
            timing.push(format!("elapsed {}", duration));
        }
        if let Some(eta) = &snapshot.eta {
            timing.push(format!("eta {}", eta));
        }
        if !timing.is_empty() {
            lines.push(Line::from(timing.join(" | ")));
        }
        if let Some(file) = &snapshot.current_file {
            lines.push(Line::from(Span::styled(
                file.as_str(),
                Style::default().fg(Color::Gray),
            )));
        }
        if let Some(errors) = snapshot.errors.as_deref().filter(|e| !e.is_empty()) {
            lines.push(Line::from(Span::styled(
                format!("errors: {}", errors),
                Style::default().fg(Color::Red),
            )));
        }

        frame.render_widget(Paragraph::new(lines), rows[1]);
    }

    fn render_activity_panel(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = model
            .dashboard
            .activity
            .iter()
            .map(|entry| {
                Line::from(vec![
                    Span::styled(
                        format!("{:<9}", entry.event.kind()),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::raw(entry.event.summary()),
                ])
            })
            .collect();

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Activity"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_duplicates(model: &TuiModel, frame: &mut Frame, area: Rect, repo: &str) {
        let view = model
            .dashboard
            .duplicates
            .as_ref()
            .filter(|view| view.repo == repo);

        let title = format!("Duplicates in {}", repo);
        let block = Block::default().borders(Borders::ALL).title(title);

        let view = match view {
            Some(view) if !view.loading => view,
            _ => {
                let paragraph = Paragraph::new("Loading duplicate groups...")
                    .block(block)
                    .style(Style::default().fg(Color::Yellow))
                    .alignment(Alignment::Center);
                frame.render_widget(paragraph, area);
                return;
            }
        };

        if view.groups.is_empty() {
            let paragraph = Paragraph::new("No duplicates found.")
                .block(block)
                .style(Style::default().fg(Color::Green))
                .alignment(Alignment::Center);
            frame.render_widget(paragraph, area);
            return;
        }

        let mut lines = vec![
            Line::from(Span::styled(
                format!(
                    "{} groups, {} reclaimable",
                    view.groups.len(),
                    human_size(view.reclaimable_bytes())
                ),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];

        for group in &view.groups {
            let Some(first) = group.first() else {
                continue;
            };
            let hash: String = first.file.content_hash.chars().take(12).collect();
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{} copies", group.len()),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(format!(" of {}  ", human_size(first.file.size))),
                Span::styled(hash, Style::default().fg(Color::DarkGray)),
            ]));
            for entry in group {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(entry.repo.name.as_str(), Style::default().fg(Color::Cyan)),
                    Span::raw(": "),
                    Span::raw(entry.file.relative_path.as_str()),
                ]));
            }
        }

        let paragraph = Paragraph::new(lines)
            .block(block)
            .scroll((model.ui_state.scroll_offset.min(u16::MAX as usize) as u16, 0));
        frame.render_widget(paragraph, area);
    }

    fn render_form(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let form = &model.form;
        let field = |label: &str, value: String, target: FormField| {
            let focused = form.focus == target;
            let marker = if focused { "> " } else { "  " };
            let style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{:<12}", label), style),
                Span::raw(value),
            ])
        };

        let codec = match form.codec {
            Codec::Json => "JSON".to_string(),
            Codec::Messagepack => "MessagePack".to_string(),
        };
        let compressed = if form.codec != Codec::Messagepack {
            "n/a".to_string()
        } else if form.compressed {
            "[x]".to_string()
        } else {
            "[ ]".to_string()
        };

        let mut lines = vec![
            field("Name", form.name.clone(), FormField::Name),
            field("Path", form.path.clone(), FormField::Path),
            field("Indices", form.indices.clone(), FormField::Indices),
            field("Codec", codec, FormField::Codec),
            field("Compressed", compressed, FormField::Compressed),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.as_str(),
                Style::default().fg(Color::Red),
            )));
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("New Repository"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);

        if model.ui_state.browsing {
            Self::render_browser(model, frame, area);
        }
    }

    fn render_browser(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let popup_area = Self::centered_rect(70, 70, area);
        frame.render_widget(Clear, popup_area);

        let Some(listing) = &model.dashboard.browse else {
            let paragraph = Paragraph::new("Reading directory...")
                .block(Block::default().borders(Borders::ALL).title("Browse"))
                .alignment(Alignment::Center);
            frame.render_widget(paragraph, popup_area);
            return;
        };

        let items: Vec<ListItem> = if listing.entries.is_empty() {
            vec![ListItem::new("(no subdirectories)").style(Style::default().fg(Color::Gray))]
        } else {
            listing
                .entries
                .iter()
                .enumerate()
                .map(|(index, entry)| {
                    let name = entry
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| entry.display().to_string());
                    let style = if index == model.ui_state.browse_cursor {
                        Style::default().bg(Color::DarkGray)
                    } else {
                        Style::default()
                    };
                    ListItem::new(format!("{}/", name)).style(style)
                })
                .collect()
        };

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(listing.path.display().to_string()),
        );
        frame.render_widget(list, popup_area);
    }

    fn render_error_history(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let errors = &model.dashboard.errors;
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Errors ({})", errors.len()));

        if errors.is_empty() {
            let paragraph = Paragraph::new("No errors recorded.")
                .block(block)
                .style(Style::default().fg(Color::Green))
                .alignment(Alignment::Center);
            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = errors
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let mut spans = vec![Span::styled(
                    format_timestamp(record.timestamp),
                    Style::default().fg(Color::Gray),
                )];
                if let Some(repo) = &record.repo {
                    spans.push(Span::styled(
                        format!(" [{}]", repo),
                        Style::default().fg(Color::Cyan),
                    ));
                }
                let message_style = if record.read {
                    Style::default()
                } else {
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
                };
                spans.push(Span::raw(" "));
                spans.push(Span::styled(record.message.as_str(), message_style));

                let style = if index == model.ui_state.error_cursor {
                    Style::default().bg(Color::DarkGray)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(spans)).style(style)
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }

    fn render_activity(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Activity ({})", model.dashboard.activity.len()));

        let items: Vec<ListItem> = model
            .dashboard
            .activity
            .iter()
            .skip(model.ui_state.scroll_offset)
            .map(|entry| {
                let mut spans = vec![
                    Span::styled(
                        format_timestamp(entry.received_at),
                        Style::default().fg(Color::Gray),
                    ),
                    Span::raw(" "),
                    Span::styled(
                        format!("{:<9}", entry.event.kind()),
                        Style::default().fg(Color::Cyan),
                    ),
                ];
                if let Some(repo) = entry.event.repo() {
                    spans.push(Span::raw(format!("[{}] ", repo)));
                }
                spans.push(Span::raw(entry.event.summary()));
                ListItem::new(Line::from(spans))
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }

    fn render_help_view(frame: &mut Frame, area: Rect) {
        let heading = |text: &'static str| {
            Line::from(Span::styled(
                text,
                Style::default().add_modifier(Modifier::UNDERLINED),
            ))
        };
        let help_text = vec![
            Line::from(Span::styled(
                "dedupdash Help",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            heading("Repositories:"),
            Line::from("  ↑/k ↓/j - Move"),
            Line::from("  Enter - Show duplicates"),
            Line::from("  a - Add repository"),
            Line::from("  u - Re-index repository"),
            Line::from("  d - Delete repository"),
            Line::from("  r - Reload list"),
            Line::from("  v - Activity feed"),
            Line::from(""),
            heading("Add Repository:"),
            Line::from("  Tab/Shift+Tab - Next/previous field"),
            Line::from("  Space - Toggle codec or compression"),
            Line::from("  Ctrl+B / F2 - Browse for a directory"),
            Line::from("  Enter - Create  Esc - Cancel"),
            Line::from(""),
            heading("Errors:"),
            Line::from("  e - Open error history"),
            Line::from("  x - Dismiss notification"),
            Line::from("  d - Delete entry  c - Clear all"),
            Line::from(""),
            heading("Global:"),
            Line::from("  ? - Show this help"),
            Line::from("  Ctrl+C / q - Quit"),
            Line::from(""),
            Line::from("Press any key to close help..."),
        ];

        let help = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title("Help"))
            .wrap(Wrap { trim: true });

        frame.render_widget(help, area);
    }

    fn render_status_bar(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(area);

        let status_paragraph = Paragraph::new(Self::build_status_line(model))
            .style(Style::default().fg(Color::White).bg(Color::DarkGray));
        frame.render_widget(status_paragraph, chunks[0]);

        let hints_paragraph =
            Paragraph::new(Self::get_key_hints(model)).style(Style::default().fg(Color::Gray));
        frame.render_widget(hints_paragraph, chunks[1]);
    }

    fn build_status_line(model: &TuiModel) -> Line<'static> {
        let dashboard = &model.dashboard;
        let color = match dashboard.connection {
            ConnectionStatus::Connected => Color::Green,
            ConnectionStatus::Connecting => Color::Yellow,
            ConnectionStatus::Disconnected => Color::Red,
        };

        let mut connection = format!("● {}", dashboard.connection);
        if dashboard.connection != ConnectionStatus::Connected && dashboard.reconnect_attempts > 0 {
            connection.push_str(&format!(" (retry {})", dashboard.reconnect_attempts));
        }

        let mut parts = vec![format!("{} repos", dashboard.repositories.len())];
        if dashboard.unread_errors > 0 {
            parts.push(format!("{} unread errors", dashboard.unread_errors));
        }
        if let Some(repo) = model.selected_repo() {
            parts.push(format!("Selected: {}", repo.name));
        }

        Line::from(vec![
            Span::styled(connection, Style::default().fg(color)),
            Span::raw(" | "),
            Span::raw(parts.join(" | ")),
        ])
    }

    fn get_key_hints(model: &TuiModel) -> &'static str {
        if model.pending_delete.is_some() {
            return "y Confirm delete | n Cancel";
        }
        match &model.mode {
            ViewMode::Repositories => {
                "? Help | a Add | u Update | d Delete | Enter Dupes | e Errors | v Activity | q Quit"
            }
            ViewMode::Duplicates { .. } => "j/k Scroll | r Reload | b Back",
            ViewMode::AddRepository if model.ui_state.browsing => {
                "Enter Open | Backspace Up | s Select | Esc Cancel"
            }
            ViewMode::AddRepository => "Tab Next | Space Toggle | Ctrl+B Browse | Enter Create | Esc Cancel",
            ViewMode::ErrorHistory => "d Delete | c Clear | b Back",
            ViewMode::Activity => "j/k Scroll | b Back",
            ViewMode::Help => "Any key to close",
        }
    }

    fn render_overlays(model: &TuiModel, frame: &mut Frame, area: Rect) {
        if let Some(name) = &model.pending_delete {
            Self::render_delete_confirmation(name, frame, area);
        }

        if model.mode != ViewMode::ErrorHistory {
            if let Some(toast) = &model.dashboard.toast {
                Self::render_toast(&toast.message, toast.repo.as_deref(), frame, area);
            }
        }
    }

    fn render_delete_confirmation(name: &str, frame: &mut Frame, area: Rect) {
        let popup_area = Self::centered_rect(50, 20, area);
        frame.render_widget(Clear, popup_area);

        let text = vec![
            Line::from(format!("Delete repository '{}'?", name)),
            Line::from(""),
            Line::from("y - Yes    n - No"),
        ];
        let popup = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Confirm"))
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center);
        frame.render_widget(popup, popup_area);
    }

    /// Newest error, pinned to the bottom right above the status bar
    fn render_toast(message: &str, repo: Option<&str>, frame: &mut Frame, area: Rect) {
        let width = area.width.min(50);
        let height = area.height.min(4);
        let popup_area = Rect {
            x: area.x + area.width - width,
            y: area.y + area.height.saturating_sub(height + 2),
            width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let title = match repo {
            Some(repo) => format!("Error [{}]", repo),
            None => "Error".to_string(),
        };
        let toast = Paragraph::new(message.to_string())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .title_bottom("e History | x Dismiss"),
            )
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        frame.render_widget(toast, popup_area);
    }

    /// Helper to create centered rectangle
    fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(r);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}

fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

/// Byte count with a binary unit suffix
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
