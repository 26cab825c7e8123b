mod common;
use common::{head_layout, triangle_layout};
use topoplot::grid::{map_to_grid, GridTransform};
use topoplot::{ChannelLayout, TopoError};

#[test]
fn head_layout_stays_inside_every_raster() {
    let layout = head_layout();
    for (w, h) in [(3, 3), (8, 5), (32, 32), (64, 48), (128, 128)] {
        let px = map_to_grid(&layout, (w, h)).unwrap();
        assert_eq!(px.len(), layout.len());
        for (name, [x, y]) in px.iter() {
            assert!((0.0..=(w - 1) as f64).contains(&x), "{name} x={x} on {w}x{h}");
            assert!((0.0..=(h - 1) as f64).contains(&y), "{name} y={y} on {w}x{h}");
        }
    }
}

#[test]
fn mapping_preserves_order_and_names() {
    let layout = head_layout();
    let px = map_to_grid(&layout, (64, 64)).unwrap();
    assert!(layout.names().eq(px.names()));
}

#[test]
fn triangle_lands_on_distinct_cells() {
    let px = map_to_grid(&triangle_layout(), (4, 4)).unwrap();
    let cells: Vec<[f64; 2]> = px.positions().collect();
    assert_eq!(cells, [[1.0, 1.0], [2.0, 1.0], [1.0, 2.0]]);
}

#[test]
fn triangle_on_small_raster_remaps_to_itself() {
    let once = map_to_grid(&triangle_layout(), (4, 4)).unwrap();
    let twice = map_to_grid(&once, (4, 4)).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn remapping_wide_layout_moves_at_most_one_cell() {
    // Layout span (72 units) much larger than the 2-unit margin.
    for size in [(32, 32), (64, 64), (100, 80)] {
        let once = map_to_grid(&head_layout(), size).unwrap();
        let twice = map_to_grid(&once, size).unwrap();
        for (a, b) in once.positions().zip(twice.positions()) {
            assert!((a[0] - b[0]).abs() <= 1.0 && (a[1] - b[1]).abs() <= 1.0, "{a:?} → {b:?}");
        }
    }
}

#[test]
fn small_layout_on_large_raster_shifts_when_remapped() {
    // Span of 1 unit against the 2-unit margin: A lands on (11, 11) and a
    // second pass, now seeing a 5-cell span, pulls it to (5, 5).
    let once = map_to_grid(&triangle_layout(), (18, 18)).unwrap();
    assert_eq!(once.get("A"), Some([11.0, 11.0]));
    assert_eq!(once.get("B"), Some([16.0, 11.0]));
    let twice = map_to_grid(&once, (18, 18)).unwrap();
    assert_eq!(twice.get("A"), Some([5.0, 5.0]));
    assert_eq!(twice.get("B"), Some([16.0, 5.0]));
}

#[test]
fn three_cell_raster_collapses_and_cannot_be_remapped() {
    let once = map_to_grid(&triangle_layout(), (3, 3)).unwrap();
    assert!(once.positions().all(|p| p == [1.0, 1.0]));
    let err = map_to_grid(&once, (3, 3)).unwrap_err();
    assert!(matches!(err, TopoError::InvalidLayout(_)), "{err}");
}

#[test]
fn transform_maps_points_between_channels() {
    let tf = GridTransform::fit(&head_layout(), (64, 64)).unwrap();
    // Bounding box is ±36 → origin -38, factor 74 / 62.
    approx::assert_abs_diff_eq!(tf.origin[0], -38.0, epsilon = 1e-12);
    approx::assert_abs_diff_eq!(tf.factor[1], 74.0 / 62.0, epsilon = 1e-12);
    assert_eq!(tf.apply([36.0, 36.0]), [62.0, 62.0]);
    assert_eq!(tf.apply([1e6, -1e6]), [63.0, 0.0]);
}

#[test]
fn collinear_layout_is_rejected() {
    let layout: ChannelLayout = (0..5).map(|i| (format!("c{i}"), [i as f64, 3.0])).collect();
    let err = map_to_grid(&layout, (16, 16)).unwrap_err();
    assert!(matches!(err, TopoError::InvalidLayout(_)), "{err}");
}
