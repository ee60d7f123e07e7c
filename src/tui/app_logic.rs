use super::app_state::{AppMode, Phase};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use sharepick::{
    BuildEvent, BuildSupervisor, EngineConfig, ROOT, SelectionTree, ViewNode, seed_selection,
};
use tracing::{info, warn};

fn item_matches_filter_or_has_matching_descendant(
    nodes: &[ViewNode],
    item_idx: usize,
    lower_filter: &str,
) -> bool {
    let item = &nodes[item_idx];
    if item.name.to_lowercase().contains(lower_filter) {
        return true;
    }
    item.children_indices
        .iter()
        .any(|&child_idx| item_matches_filter_or_has_matching_descendant(nodes, child_idx, lower_filter))
}

pub struct TuiApp {
    pub(super) phase: Phase,
    pub(super) builds: BuildSupervisor,
    pub(super) existing: Vec<String>,
    pub(super) config: EngineConfig,
    pub(super) current_selection_idx: usize,
    pub(super) scroll_offset: usize,
    pub(super) quit: bool,
    pub(super) confirmed: bool,
    pub(super) mode: AppMode,
    pub(super) filter_input: String,
    pub(super) filter_cursor_pos: usize,
    pub(super) list_viewport_height: usize,
}

impl TuiApp {
    /// Kicks off the tree build in the background; the app starts in the
    /// building phase and switches over once the worker delivers.
    pub fn new(paths: Vec<String>, existing: Vec<String>, config: EngineConfig) -> Self {
        let mut builds = BuildSupervisor::new();
        builds.start(paths, config.progress_every);
        TuiApp {
            phase: Phase::Building(None),
            builds,
            existing,
            config,
            current_selection_idx: ROOT,
            scroll_offset: 0,
            quit: false,
            confirmed: false,
            mode: AppMode::Normal,
            filter_input: String::new(),
            filter_cursor_pos: 0,
            list_viewport_height: 0, // Will be updated by ui_renderer
        }
    }

    pub(super) fn engine(&self) -> Option<&SelectionTree> {
        match &self.phase {
            Phase::Ready(engine) => Some(engine),
            _ => None,
        }
    }

    pub(super) fn engine_mut(&mut self) -> Option<&mut SelectionTree> {
        match &mut self.phase {
            Phase::Ready(engine) => Some(engine),
            _ => None,
        }
    }

    /// Drains worker events without blocking.
    pub(super) fn poll_build(&mut self) {
        while let Some(event) = self.builds.poll() {
            match event {
                BuildEvent::Progress(progress) => {
                    if let Phase::Building(current) = &mut self.phase {
                        *current = Some(progress);
                    }
                }
                BuildEvent::Completed(tree) => {
                    let (selection, skipped) =
                        seed_selection(&tree, self.existing.iter().map(String::as_str));
                    for line in &skipped {
                        warn!(line = %line, "existing directive does not match the path list; dropped");
                    }
                    info!(files = tree.file_count(), seeded = selection.len(), "selection session ready");
                    self.phase = Phase::Ready(SelectionTree::with_selection(
                        tree,
                        selection,
                        self.config.clone(),
                    ));
                    self.current_selection_idx = ROOT;
                    self.scroll_offset = 0;
                }
                BuildEvent::Failed(err) => {
                    warn!(%err, "could not build the path tree");
                    self.phase = Phase::Failed(err.to_string());
                }
            }
        }
    }

    /// Selected directive lines, if the user confirmed a ready session.
    pub(super) fn into_directives(self) -> Option<Vec<String>> {
        let confirmed = self.confirmed;
        match self.phase {
            Phase::Ready(mut engine) if confirmed => Some(engine.directive_lines()),
            _ => None,
        }
    }

    fn current_path(&self) -> Option<String> {
        self.engine()?
            .node(self.current_selection_idx)
            .map(|node| node.path.clone())
    }

    pub(super) fn select_next_visible_item(&mut self) {
        self.move_selection_in_visible_list(1);
    }

    pub(super) fn select_previous_visible_item(&mut self) {
        self.move_selection_in_visible_list(-1);
    }

    pub(super) fn move_selection_in_visible_list(&mut self, delta: i32) {
        let visible_indices = self.get_visible_item_indices();
        if visible_indices.is_empty() {
            return;
        }

        let current_item_position_in_visible_list = visible_indices
            .iter()
            .position(|&idx| idx == self.current_selection_idx);

        let new_idx_in_visible_list = match current_item_position_in_visible_list {
            Some(pos) => (pos as i32 + delta).rem_euclid(visible_indices.len() as i32) as usize,
            None if delta > 0 => 0,
            None => visible_indices.len() - 1,
        };
        self.current_selection_idx = visible_indices[new_idx_in_visible_list];
    }

    pub(super) fn toggle_current_item_selection(&mut self) {
        let Some(path) = self.current_path() else {
            return;
        };
        if let Some(engine) = self.engine_mut() {
            if let Err(err) = engine.toggle(&path) {
                warn!(%err, "toggle failed");
            }
        }
    }

    /// Checks every visible file in one batch.
    pub(super) fn select_all_visible_items(&mut self) {
        let visible_indices = self.get_visible_item_indices();
        let Some(engine) = self.engine_mut() else {
            return;
        };
        let batch: Vec<(String, bool)> = visible_indices
            .iter()
            .map(|&idx| &engine.nodes()[idx])
            .filter(|node| !node.is_dir())
            .map(|node| (node.path.clone(), true))
            .collect();
        if let Err(err) = engine.apply(batch) {
            warn!(%err, "select all failed");
        }
    }

    /// Unchecks every visible row in one batch.
    pub(super) fn deselect_all_visible_items(&mut self) {
        let visible_indices = self.get_visible_item_indices();
        let Some(engine) = self.engine_mut() else {
            return;
        };
        let batch: Vec<(String, bool)> = visible_indices
            .iter()
            .map(|&idx| (engine.nodes()[idx].path.clone(), false))
            .collect();
        if let Err(err) = engine.apply(batch) {
            warn!(%err, "deselect all failed");
        }
    }

    pub(super) fn expand_all_directories(&mut self) {
        if let Some(engine) = self.engine_mut() {
            engine.expand_materialized();
        }
        self.ensure_selection_is_visible();
    }

    pub(super) fn collapse_all_directories(&mut self) {
        if let Some(engine) = self.engine_mut() {
            engine.collapse_all();
        }
        self.ensure_selection_is_visible();
    }

    /// Rows in display order: the root, then the children of every expanded
    /// folder, narrowed to filter matches and their ancestors.
    pub(super) fn get_visible_item_indices(&self) -> Vec<usize> {
        let Some(engine) = self.engine() else {
            return Vec::new();
        };
        let nodes = engine.nodes();
        let lower_filter = self.filter_input.to_lowercase();
        let filter_active = !lower_filter.is_empty();

        let mut visible_indices = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(idx) = stack.pop() {
            if filter_active
                && idx != ROOT
                && !item_matches_filter_or_has_matching_descendant(nodes, idx, &lower_filter)
            {
                continue;
            }
            visible_indices.push(idx);
            if nodes[idx].expanded {
                stack.extend(nodes[idx].children_indices.iter().rev());
            }
        }
        visible_indices
    }

    pub(super) fn ensure_selection_is_valid_after_filter(&mut self) {
        let visible_indices = self.get_visible_item_indices();
        if visible_indices.is_empty() {
            return;
        }
        if !visible_indices.contains(&self.current_selection_idx) {
            self.current_selection_idx = visible_indices[0];
        }
        self.ensure_selection_is_visible_in_viewport();
    }

    pub(super) fn ensure_selection_is_visible_in_viewport(&mut self) {
        if self.list_viewport_height == 0 {
            return;
        }
        let visible_indices = self.get_visible_item_indices();
        if visible_indices.is_empty() {
            self.scroll_offset = 0;
            return;
        }

        let list_height = self.list_viewport_height;
        match visible_indices
            .iter()
            .position(|&idx| idx == self.current_selection_idx)
        {
            Some(pos) if pos < self.scroll_offset => self.scroll_offset = pos,
            Some(pos) if pos >= self.scroll_offset + list_height => {
                self.scroll_offset = pos + 1 - list_height;
            }
            Some(_) => {}
            None => {
                self.current_selection_idx = visible_indices[0];
                self.scroll_offset = 0;
            }
        }

        let num_visible_items = visible_indices.len();
        if num_visible_items <= list_height {
            self.scroll_offset = 0;
        } else {
            self.scroll_offset = self.scroll_offset.min(num_visible_items - list_height);
        }
    }

    pub(super) fn toggle_expansion_and_adjust_selection(&mut self) {
        let idx = self.current_selection_idx;
        if let Some(engine) = self.engine_mut() {
            if let Some(node) = engine.node(idx) {
                let expanded = node.expanded;
                engine.set_expanded(idx, !expanded);
            }
        }
        self.ensure_selection_is_visible();
    }

    /// Moves the cursor to the nearest visible ancestor if its row went away
    /// (for instance after a collapse), then fixes the viewport.
    pub(super) fn ensure_selection_is_visible(&mut self) {
        let visible_indices = self.get_visible_item_indices();
        let Some(engine) = self.engine() else {
            return;
        };
        let mut candidate = Some(self.current_selection_idx);
        while let Some(idx) = candidate {
            if visible_indices.contains(&idx) {
                break;
            }
            candidate = engine.node(idx).and_then(|node| node.parent_index);
        }
        self.current_selection_idx = candidate
            .or_else(|| visible_indices.first().copied())
            .unwrap_or(ROOT);
        self.ensure_selection_is_visible_in_viewport();
    }

    // --- Event handling sub-methods ---
    pub(super) fn handle_normal_mode_input(&mut self, key_event: KeyEvent) {
        if !matches!(self.phase, Phase::Ready(_)) {
            if matches!(key_event.code, KeyCode::Char('q') | KeyCode::Esc) {
                self.quit = true;
            }
            return;
        }
        match key_event.code {
            KeyCode::Char('/') => {
                self.mode = AppMode::Filtering;
            }
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Char('y') => {
                self.confirmed = true;
                self.quit = true;
            }
            KeyCode::Down | KeyCode::Char('j') => self.select_next_visible_item(),
            KeyCode::Up | KeyCode::Char('k') => self.select_previous_visible_item(),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_current_item_selection(),
            KeyCode::Char('o') | KeyCode::Tab => self.toggle_expansion_and_adjust_selection(),
            KeyCode::Char('*') => self.expand_all_directories(),
            KeyCode::Char('-') => self.collapse_all_directories(),
            KeyCode::Char('a') => {
                if key_event.modifiers.is_empty() || key_event.modifiers == KeyModifiers::CONTROL {
                    self.select_all_visible_items();
                }
            }
            KeyCode::Char('d') => {
                if key_event.modifiers.is_empty() {
                    self.deselect_all_visible_items();
                }
            }
            _ => {}
        }
    }

    pub(super) fn handle_filtering_mode_input(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Enter => {
                self.mode = AppMode::Normal;
                self.ensure_selection_is_valid_after_filter();
            }
            KeyCode::Esc => {
                self.mode = AppMode::Normal;
                self.filter_input.clear();
                self.filter_cursor_pos = 0;
                self.ensure_selection_is_valid_after_filter();
            }
            KeyCode::Char(c) => {
                self.filter_input.insert(self.filter_cursor_pos, c);
                self.filter_cursor_pos += c.len_utf8();
                self.ensure_selection_is_valid_after_filter();
            }
            KeyCode::Backspace => {
                if let Some(prev) = self.filter_input[..self.filter_cursor_pos].chars().next_back() {
                    self.filter_cursor_pos -= prev.len_utf8();
                    self.filter_input.remove(self.filter_cursor_pos);
                    self.ensure_selection_is_valid_after_filter();
                }
            }
            KeyCode::Left => {
                if let Some(prev) = self.filter_input[..self.filter_cursor_pos].chars().next_back() {
                    self.filter_cursor_pos -= prev.len_utf8();
                }
            }
            KeyCode::Right => {
                if let Some(next) = self.filter_input[self.filter_cursor_pos..].chars().next() {
                    self.filter_cursor_pos += next.len_utf8();
                }
            }
            _ => {}
        }
    }
}
