use super::app_logic::TuiApp;
use super::app_state::{AppMode, Phase};
use super::tree_labels::build_tree_labels;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap},
};
use sharepick::CheckState;

fn draw_help_block(f: &mut Frame, _app: &TuiApp, area: Rect) {
    let help_text_lines_content = vec![
        Line::from("Arrows/jk: Nav | Space/Enter: Sel | Tab/o: Fold | y: Confirm | q/Esc: Quit"),
        Line::from("a: Sel All Vis | d: Desel All Vis | *: Expand All | -: Collapse All | /: Filter"),
    ];
    let help_paragraph = Paragraph::new(help_text_lines_content).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Sharepick Stream Selection"),
    );
    f.render_widget(help_paragraph, area);
}

fn draw_filter_input_block(f: &mut Frame, app: &TuiApp, area: Rect) {
    let input_text = format!("/{}", app.filter_input);
    let filter_paragraph = Paragraph::new(input_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Filter (Esc to cancel, Enter to apply)"),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(filter_paragraph, area);
    let column = app.filter_input[..app.filter_cursor_pos].chars().count() as u16;
    f.set_cursor_position((area.x + 1 + column + 1, area.y + 1));
}

fn draw_main_list_block(f: &mut Frame, app: &mut TuiApp, area: Rect) {
    app.list_viewport_height = area.height.saturating_sub(2) as usize;
    app.ensure_selection_is_visible_in_viewport(); // Call this to adjust scroll based on current state

    let Some(engine) = app.engine() else {
        return;
    };
    let visible_item_indices = app.get_visible_item_indices();
    let num_visible_items = visible_item_indices.len();
    let window = app.scroll_offset
        ..(app.scroll_offset + app.list_viewport_height).min(num_visible_items);

    let labels = build_tree_labels(engine.nodes(), &visible_item_indices);
    let list_items: Vec<ListItem> = visible_item_indices
        .get(window.clone())
        .unwrap_or(&[])
        .iter()
        .zip(labels.get(window).unwrap_or(&[]))
        .map(|(&item_actual_idx, label)| {
            let item = &engine.nodes()[item_actual_idx];
            let selection_prefix = match item.state {
                CheckState::Unchecked => "[ ] ",
                CheckState::PartiallyChecked => "[-] ",
                CheckState::Checked => "[x] ",
            };
            let expansion_prefix = if item.is_dir() {
                if item.expanded { "[-] " } else { "[+] " }
            } else {
                "    "
            };
            ListItem::new(format!("{}{}{}", expansion_prefix, selection_prefix, label))
        })
        .collect();

    let list_title = if !app.filter_input.is_empty() && app.mode == AppMode::Normal {
        format!("Stream (Filter: '{}')", app.filter_input)
    } else {
        format!("Stream ({} files)", engine.tree().file_count())
    };

    let list_widget = List::new(list_items)
        .block(Block::default().borders(Borders::ALL).title(list_title))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("❯ ");

    let mut list_state_for_view = ratatui::widgets::ListState::default();
    let current_selected_item_in_visible_list_idx_opt = visible_item_indices
        .iter()
        .position(|&idx| idx == app.current_selection_idx);

    if let Some(selected_idx_in_visible_list) = current_selected_item_in_visible_list_idx_opt {
        if selected_idx_in_visible_list >= app.scroll_offset
            && selected_idx_in_visible_list < app.scroll_offset + app.list_viewport_height
        {
            list_state_for_view.select(Some(selected_idx_in_visible_list - app.scroll_offset));
        }
    }
    f.render_stateful_widget(list_widget, area, &mut list_state_for_view);
}

fn draw_directive_preview(f: &mut Frame, app: &mut TuiApp, area: Rect) {
    let Some(engine) = app.engine_mut() else {
        return;
    };
    let lines = engine.directive_lines();
    let title = format!("Directives ({})", lines.len());
    let body: Vec<Line> = if lines.is_empty() {
        vec![Line::from("nothing selected").style(Style::default().fg(Color::DarkGray))]
    } else {
        lines.into_iter().map(Line::from).collect()
    };
    let preview = Paragraph::new(body)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(preview, area);
}

fn draw_building_gauge(f: &mut Frame, app: &TuiApp, area: Rect) {
    let Phase::Building(progress) = &app.phase else {
        return;
    };
    let (ratio, label) = match progress {
        Some(p) if p.total > 0 => (
            (p.processed as f64 / p.total as f64).clamp(0.0, 1.0),
            format!("{} / {} paths", p.processed, p.total),
        ),
        _ => (0.0, "starting".to_string()),
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Building path tree"))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(ratio)
        .label(label);
    let gauge_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area)[0];
    f.render_widget(gauge, gauge_area);
}

fn draw_failure(f: &mut Frame, message: &str, area: Rect) {
    let text = vec![
        Line::from(message.to_string()).style(Style::default().fg(Color::Red)),
        Line::from(""),
        Line::from("Press q or Esc to quit."),
    ];
    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Build failed"))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

pub(super) fn ui_frame(frame: &mut Frame, app: &mut TuiApp) {
    let help_lines = 2;
    let filter_input_height = if app.mode == AppMode::Filtering { 3 } else { 0 };
    let top_block_container_height = (help_lines + 2) + filter_input_height;

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(top_block_container_height),
            Constraint::Min(0),
        ])
        .split(frame.area());

    let top_container_area = main_chunks[0];
    let body_area = main_chunks[1];

    let top_content_constraints = if app.mode == AppMode::Filtering {
        vec![
            Constraint::Length(help_lines + 2),
            Constraint::Length(filter_input_height),
        ]
    } else {
        vec![Constraint::Length(help_lines + 2)]
    };
    let top_content_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(top_content_constraints)
        .split(top_container_area);

    draw_help_block(frame, app, top_content_chunks[0]);
    if app.mode == AppMode::Filtering {
        draw_filter_input_block(frame, app, top_content_chunks[1]);
    }

    if let Phase::Failed(message) = &app.phase {
        draw_failure(frame, message, body_area);
        return;
    }
    if matches!(app.phase, Phase::Building(_)) {
        draw_building_gauge(frame, app, body_area);
        return;
    }

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(body_area);
    draw_main_list_block(frame, app, body_chunks[0]);
    draw_directive_preview(frame, app, body_chunks[1]);
}
