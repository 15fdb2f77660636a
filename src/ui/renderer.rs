//! Top-level rendering coordinator.
//!
//! Rendering is two steps: the screen state computes a [`UIViewModel`], then
//! the components write it into a string. Nothing here touches the terminal,
//! so callers decide whether to print, diff or assert on a frame.
//!
//! # Example
//!
//! ```rust
//! use aptdesk::app::{ListState, ScreenSettings};
//! use aptdesk::domain::Household;
//! use aptdesk::ui::{render, Theme};
//!
//! let state: ListState<Household> = ListState::new(ScreenSettings::default());
//! let frame = render(&state, &Theme::default(), 80, false);
//! assert!(frame.contains("Households"));
//! ```

use crate::app::ListState;
use crate::domain::Entity;
use crate::ui::components;
use crate::ui::helpers::Canvas;
use crate::ui::theme::Theme;
use crate::ui::viewmodel::UIViewModel;

/// Renders one frame of a list screen.
///
/// # Parameters
///
/// * `state` - Screen to render
/// * `theme` - Active color theme
/// * `cols` - Terminal width in columns
/// * `color` - Emit ANSI escapes; `false` yields plain text
pub fn render<E: Entity>(state: &ListState<E>, theme: &Theme, cols: usize, color: bool) -> String {
    let viewmodel = state.compute_viewmodel(cols);
    render_viewmodel(&viewmodel, theme, cols, color)
}

/// Renders a precomputed view model.
pub fn render_viewmodel(vm: &UIViewModel, theme: &Theme, cols: usize, color: bool) -> String {
    let mut canvas = Canvas::new(theme, cols, color);
    components::render_frame(&mut canvas, vm);
    canvas.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{NotificationKind, ViewMode};
    use crate::ui::viewmodel::*;

    fn viewmodel(mode: ViewMode) -> UIViewModel {
        UIViewModel {
            header: HeaderInfo {
                title: " Households (2) ".to_string(),
                phase: "ready".to_string(),
                stats: StatsInfo {
                    total: 2,
                    active: 1,
                    inactive: 1,
                    groups: vec![("A".to_string(), 2)],
                },
            },
            search_bar: SearchBarInfo {
                query: "a-".to_string(),
                filters: vec![("building".to_string(), "A".to_string())],
                sort: "apartmentNumber asc".to_string(),
            },
            display_items: vec![
                DisplayItem {
                    id: "1".to_string(),
                    name: "A-101".to_string(),
                    detail: "Bldg A · Floor 1".to_string(),
                    is_active: true,
                    is_selected: true,
                    highlight_ranges: vec![(0, 2)],
                },
                DisplayItem {
                    id: "2".to_string(),
                    name: "A-102".to_string(),
                    detail: "Bldg A · Floor 1".to_string(),
                    is_active: false,
                    is_selected: false,
                    highlight_ranges: vec![(0, 2)],
                },
            ],
            view_mode: mode,
            bulk_bar: Some(BulkBarInfo {
                selected: 1,
                all_selected: false,
            }),
            import_pending: None,
            footer: FooterInfo {
                range: "(1-2 of 2)".to_string(),
                page: 1,
                total_pages: 1,
                page_size: 20,
                keybindings: "q: quit".to_string(),
            },
            notifications: vec![NotificationItem {
                id: 1,
                message: "deleted 1 household".to_string(),
                kind: NotificationKind::Success,
            }],
            empty_state: None,
            error: None,
        }
    }

    #[test]
    fn table_frame_lists_rows_and_chrome() {
        let frame = render_viewmodel(&viewmodel(ViewMode::Table), &Theme::default(), 80, false);
        assert!(frame.contains("Households (2)"));
        assert!(frame.contains("2 total · 1 active · 1 inactive │ A: 2"));
        assert!(frame.contains("Search: a-"));
        assert!(frame.contains("[building=A]"));
        assert!(frame.contains("1 selected ·"));
        assert!(frame.contains("• deleted 1 household"));
        assert!(frame.contains("[x] ● A-101"));
        assert!(frame.contains("[ ] ● A-102"));
        assert!(frame.contains("(1-2 of 2)  page 1/1"));
        assert!(!frame.contains('\u{1b}'));
    }

    #[test]
    fn card_mode_puts_details_on_second_line() {
        let frame = render_viewmodel(&viewmodel(ViewMode::Card), &Theme::default(), 80, false);
        assert!(frame.contains("[x] ● A-101\n      Bldg A · Floor 1\n"));
        assert!(!frame.contains("NAME"));
    }

    #[test]
    fn grid_mode_packs_cells() {
        let frame = render_viewmodel(&viewmodel(ViewMode::Grid), &Theme::default(), 80, false);
        let line = frame.lines().find(|l| l.contains("A-101")).unwrap();
        assert!(line.contains("A-102"));
    }

    #[test]
    fn empty_state_replaces_rows() {
        let mut vm = viewmodel(ViewMode::Table);
        vm.display_items.clear();
        vm.empty_state = Some(EmptyState {
            message: "No households match".to_string(),
            subtitle: "Clear filters to see everything".to_string(),
        });
        let frame = render_viewmodel(&vm, &Theme::default(), 60, false);
        assert!(frame.contains("No households match"));
        assert!(!frame.contains("NAME"));
    }

    #[test]
    fn error_banner_offers_retry() {
        let mut vm = viewmodel(ViewMode::Table);
        vm.error = Some("network error".to_string());
        let frame = render_viewmodel(&vm, &Theme::default(), 60, true);
        assert!(frame.contains("error: network error"));
        assert!(frame.contains("r: retry"));
    }

    #[test]
    fn pending_import_is_announced() {
        let mut vm = viewmodel(ViewMode::Table);
        vm.import_pending = Some(12);
        let frame = render_viewmodel(&vm, &Theme::default(), 80, false);
        assert!(frame.contains("12 rows ready to import · y: import | n: discard"));
    }

    #[test]
    fn bulk_bar_hints_match_selection_keybindings() {
        let frame = render_viewmodel(&viewmodel(ViewMode::Table), &Theme::default(), 100, false);
        let bar = frame.lines().find(|l| l.contains("1 selected")).unwrap();
        for hint in bar.split(" · ").nth(1).unwrap().split(" | ") {
            let key = hint.split(':').next().unwrap();
            assert!(
                keys::SELECTION.contains(&format!("{key}: ")),
                "{hint} is not a selection key"
            );
        }
        assert!(!bar.contains("d: delete"));
    }
}
