use instplot::config::Settings;
use instplot::data::export::write_datasets;
use instplot::data::loader::parse_text;
use instplot::data::table::{Column, Dataset, Table};
use instplot::error::SessionError;
use instplot::render::plot_interaction::ScrollDirection;
use instplot::state::coordinator::{PendingDeletion, SessionCoordinator};

use egui::PointerButton::{Primary, Secondary};

const EPS: f64 = 1e-9;

fn coordinator() -> SessionCoordinator {
    let mut c = SessionCoordinator::new(Settings::default());
    c.view_mut()
        .set_plot_rect(egui::Rect::from_min_size(egui::pos2(50.0, 20.0), egui::vec2(400.0, 300.0)));
    c
}

fn xy(name: &str, points: &[(f64, f64)]) -> Dataset {
    let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
    Dataset::new(
        name,
        Table::new(vec![Column::numeric("H", &xs), Column::numeric("M", &ys)]),
    )
}

fn points(c: &SessionCoordinator, dataset: usize) -> Vec<(f64, f64)> {
    c.datasets()[dataset]
        .table
        .xy_points("H", "M")
        .unwrap()
        .into_iter()
        .map(|(_, x, y)| (x, y))
        .collect()
}

fn drag(c: &mut SessionCoordinator, from: (f64, f64), to: (f64, f64)) {
    let a = c.view().data_to_screen(from.0, from.1);
    let b = c.view().data_to_screen(to.0, to.1);
    c.pointer_pressed(Primary, a);
    c.pointer_moved(a.lerp(b, 0.5));
    c.pointer_moved(b);
    c.pointer_released(Primary, b);
}

fn click(c: &mut SessionCoordinator, at: (f64, f64)) {
    let p = c.view().data_to_screen(at.0, at.1);
    c.pointer_pressed(Primary, p);
    c.pointer_released(Primary, p);
}

#[test]
fn region_deletion_removes_points_inside_box() {
    let mut c = coordinator();
    c.load_dataset(xy("loop.csv", &[(1.0, 1.0), (2.0, 2.0), (5.0, 5.0)]));
    {
        let view = c.view_mut();
        view.x_min = -1.0;
        view.x_max = 6.0;
        view.y_min = -1.0;
        view.y_max = 6.0;
    }

    drag(&mut c, (0.0, 0.0), (3.0, 3.0));
    // The rectangle stays visible while the question is open.
    assert!(c.selection_rect().is_some());
    match c.pending() {
        Some(PendingDeletion::Region { hit, .. }) => assert_eq!(hit.total(), 2),
        other => panic!("expected a region confirmation, got {other:?}"),
    }

    let window = c.view().window();
    assert_eq!(c.confirm_pending(true), 2);
    assert_eq!(points(&c, 0), vec![(5.0, 5.0)]);
    assert_eq!(c.view().window(), window);
    assert!(c.selection_rect().is_none());

    // The snapshot taken before the deletion still holds all three points.
    assert_eq!(c.history().len(), 1);
    c.undo().unwrap();
    assert_eq!(points(&c, 0), vec![(1.0, 1.0), (2.0, 2.0), (5.0, 5.0)]);
}

#[test]
fn empty_region_asks_nothing() {
    let mut c = coordinator();
    c.load_dataset(xy("loop.csv", &[(0.0, 0.0), (10.0, 10.0)]));
    drag(&mut c, (3.0, 3.0), (6.0, 6.0));
    assert!(c.pending().is_none());
    assert_eq!(c.status(), "No points in the selected region");
}

#[test]
fn region_spans_every_dataset() {
    let mut c = coordinator();
    c.load_dataset(xy("a.csv", &[(0.0, 0.0), (1.0, 1.0), (10.0, 10.0)]));
    c.load_dataset(xy("b.csv", &[(1.5, 1.5), (9.0, 9.0)]));
    drag(&mut c, (-0.2, -0.2), (2.0, 2.0));
    assert_eq!(c.confirm_pending(true), 3);
    assert_eq!(points(&c, 0), vec![(10.0, 10.0)]);
    assert_eq!(points(&c, 1), vec![(9.0, 9.0)]);
}

#[test]
fn deletion_preserves_a_panned_view_but_transforms_autoscale() {
    let mut c = coordinator();
    c.load_dataset(xy("loop.csv", &[(0.0, 0.0), (5.0, 2.0), (10.0, 4.0)]));
    let fitted = c.view().window();

    // Pan with the secondary button.
    let start = c.view().plot_rect.center();
    c.pointer_pressed(Secondary, start);
    c.pointer_moved(start + egui::vec2(40.0, -30.0));
    c.pointer_released(Secondary, start + egui::vec2(40.0, -30.0));
    let panned = c.view().window();
    assert_ne!(panned, fitted);

    click(&mut c, (5.0, 2.0));
    assert!(matches!(c.pending(), Some(PendingDeletion::Point(h)) if h.row == 1));
    assert_eq!(c.confirm_pending(true), 1);
    assert_eq!(c.view().window(), panned);

    // Centering redraws with autoscale: y now spans [-2, 2] plus 5% padding.
    c.apply_center().unwrap();
    let (x0, x1, y0, y1) = c.view().window();
    assert!((x0 + 0.5).abs() < EPS && (x1 - 10.5).abs() < EPS);
    assert!((y0 + 2.2).abs() < EPS && (y1 - 2.2).abs() < EPS);
}

#[test]
fn declining_keeps_data_and_view() {
    let mut c = coordinator();
    c.load_dataset(xy("loop.csv", &[(0.0, 0.0), (5.0, 2.0)]));
    let window = c.view().window();
    click(&mut c, (5.0, 2.0));
    assert_eq!(c.confirm_pending(false), 0);
    assert_eq!(points(&c, 0).len(), 2);
    assert_eq!(c.view().window(), window);
    assert!(c.history().is_empty());
    assert!(c.highlight().is_none());
}

#[test]
fn degenerate_background_window_leaves_y_unchanged() {
    let mut c = coordinator();
    c.load_dataset(xy("a.csv", &[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]));
    c.load_dataset(xy("b.csv", &[(0.0, 4.0), (1.0, 6.0), (2.0, 8.0)]));

    let report = c
        .subtract_background(&[Some((0.0, 2.0)), Some((50.0, 60.0))])
        .unwrap();
    assert_eq!(report.corrected, vec![0]);
    assert_eq!(report.degenerate, vec![1]);
    assert!(c.status().contains("no rows in 1 dataset"));

    for (_, y) in points(&c, 0) {
        assert!(y.abs() < EPS);
    }
    assert_eq!(points(&c, 1), vec![(0.0, 4.0), (1.0, 6.0), (2.0, 8.0)]);
}

#[test]
fn normalize_flat_column_is_all_zeros() {
    let mut c = coordinator();
    c.load_dataset(xy("flat.csv", &[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]));
    assert_eq!(c.apply_normalize(), Ok(1));
    assert!(points(&c, 0).iter().all(|&(_, y)| y == 0.0));
}

#[test]
fn history_keeps_the_last_ten_operations() {
    let mut c = coordinator();
    c.load_dataset(xy("a.csv", &[(0.0, 1.0), (1.0, 5.0)]));
    for _ in 0..11 {
        c.apply_center().unwrap();
    }
    assert_eq!(c.history().len(), 10);
    for _ in 0..10 {
        c.undo().unwrap();
    }
    assert_eq!(c.undo(), Err(SessionError::EmptyHistory));
    // The oldest snapshot (original data) was evicted; what is left is centered.
    assert_eq!(points(&c, 0), vec![(0.0, -2.0), (1.0, 2.0)]);
}

#[test]
fn gestures_outside_the_plot_are_ignored() {
    let mut c = coordinator();
    c.load_dataset(xy("a.csv", &[(0.0, 0.0), (1.0, 1.0)]));
    let window = c.view().window();
    let outside = egui::pos2(5.0, 5.0);
    c.pointer_pressed(Primary, outside);
    c.pointer_released(Primary, outside);
    c.scrolled(outside, ScrollDirection::Up);
    assert!(c.pending().is_none());
    assert!(c.highlight().is_none());
    assert_eq!(c.view().window(), window);

    let inside = c.view().plot_rect.center();
    c.scrolled(inside, ScrollDirection::Up);
    let (x0, x1, _, _) = c.view().window();
    assert!(x1 - x0 < window.1 - window.0);
}

#[test]
fn parsed_files_flow_through_to_export() {
    let (table, _) = parse_text("H,M\n1,0.5\n2,1.5\n3,abc\n").unwrap();
    let mut c = coordinator();
    c.load_dataset(Dataset::new("/data/run1.csv", table));
    assert_eq!(c.session().x_column(), Some("H"));
    assert_eq!(c.session().y_column(), Some("M"));
    assert_eq!(c.view().frame().point_count(), 2);

    let mut out = Vec::new();
    write_datasets(&mut out, c.datasets(), b'\t').unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text, "# File: run1.csv\nH\tM\n1\t0.5\n2\t1.5\n3\tabc\n\n\n");
}
