use rstest::rstest;
use serde_json::{json, Value};
use touchforge::error::{SchemaError, TouchForgeError};
use touchforge::geometry::{ButtonDescriptor, Packing};
use touchforge::schema::{Archetype, BindingName};
use touchforge::selector::ControlType;
use touchforge::snapshot::{regression_viewports, viewport_by_name};
use touchforge::{build_layout, normalize, LayoutResult, SafeArea, SchemaInput, Viewport};

const EPS: f64 = 1e-6;

fn schema(value: Value) -> SchemaInput {
    serde_json::from_value(value).unwrap()
}

fn platformer() -> Value {
    json!({
        "bindings": {
            "move": { "left": "ArrowLeft", "right": "ArrowRight" },
            "jump": "Space",
            "primary": "KeyX"
        }
    })
}

fn full_platformer() -> Value {
    json!({
        "bindings": {
            "move": { "left": "KeyA", "right": "KeyD", "up": "KeyW", "down": "KeyS" },
            "jump": "Space",
            "primary": "KeyJ",
            "secondary": "KeyK",
            "tertiary": "KeyL",
            "modifier": "ShiftLeft",
            "pause": "Escape",
            "magnitude": "KeyE"
        }
    })
}

fn dual_stick() -> Value {
    json!({
        "bindings": {
            "move": { "left": "KeyA", "right": "KeyD", "up": "KeyW", "down": "KeyS" },
            "aim": { "left": "ArrowLeft", "right": "ArrowRight", "up": "ArrowUp", "down": "ArrowDown" },
            "primary": "Space",
            "secondary": "KeyE",
            "pause": "Escape"
        }
    })
}

fn paired_runner() -> Value {
    json!({
        "bindings": { "primary": "KeyX", "secondary": "KeyZ", "jump": "Space" },
        "actionMeta": {
            "primary": { "pair_id": "turn", "pair_position": "right" },
            "secondary": { "pair_id": "turn", "pair_position": "left" }
        }
    })
}

fn assert_invariants(result: &LayoutResult, viewport: &Viewport) {
    let m = &result.metrics;
    let sa = viewport.safe_area;
    let left = sa.left + m.edge_padding;
    let right = viewport.width - sa.right - m.edge_padding;
    let top = sa.top + m.edge_padding;
    let bottom = viewport.height - sa.bottom - m.edge_padding;

    for b in &result.buttons {
        assert!(b.size >= 48.0 - EPS, "{} is {} px", b.id, b.size);
        assert!(b.left() >= left - EPS, "{} crosses the left edge", b.id);
        assert!(b.right() <= right + EPS, "{} crosses the right edge", b.id);
        assert!(b.top() >= top - EPS, "{} crosses the top edge", b.id);
        assert!(b.bottom() <= bottom + EPS, "{} crosses the bottom edge", b.id);
    }
    for (i, a) in result.buttons.iter().enumerate() {
        for b in &result.buttons[i + 1..] {
            assert!(!a.overlaps(b), "{} overlaps {}", a.id, b.id);
        }
    }
}

fn on_grid(v: f64) -> bool {
    ((v * 10.0).round() - v * 10.0).abs() < 1e-6
}

#[rstest]
fn test_layout_invariants_hold_everywhere(
    #[values("phone-portrait", "phone-landscape", "small-phone", "tablet-portrait", "tablet-landscape")]
    viewport_name: &str,
    #[values(platformer(), full_platformer(), dual_stick(), paired_runner())] value: Value,
) {
    let viewport = viewport_by_name(viewport_name).unwrap();
    let result = build_layout(&schema(value), &viewport).unwrap();
    assert!(!result.buttons.is_empty());
    assert_invariants(&result, &viewport);
    for b in &result.buttons {
        assert!(on_grid(b.x) && on_grid(b.y) && on_grid(b.size), "{:?}", b);
    }
}

#[rstest]
fn test_regression_viewports_pack_without_fallback(
    #[values(platformer(), full_platformer(), dual_stick(), paired_runner())] value: Value,
) {
    let input = schema(value);
    for (name, viewport) in regression_viewports() {
        let result = build_layout(&input, &viewport).unwrap();
        assert_eq!(result.metrics.packing, Packing::Standard, "{}", name);
    }
}

#[test]
fn test_movement_sits_bottom_left_and_actions_bottom_right() {
    let viewport = viewport_by_name("phone-landscape").unwrap();
    let result = build_layout(&schema(platformer()), &viewport).unwrap();

    assert_eq!(result.layout, Archetype::SafePlatformer);
    let mv = result.button(BindingName::Move).unwrap();
    assert_eq!(mv.id, "move-dpad");
    assert_eq!(mv.control_type, ControlType::Dpad);
    assert!(mv.x < viewport.width / 2.0);
    assert!(mv.y > viewport.height / 2.0);

    let lead = result.button(BindingName::Primary).unwrap();
    assert!(lead.x > viewport.width / 2.0);
    assert!(lead.size >= result.button(BindingName::Jump).unwrap().size);
    // The lead action is the rightmost control.
    assert!(result.buttons.iter().all(|b| b.x <= lead.x + EPS));
}

#[test]
fn test_sizes_come_from_the_tuning_table() {
    let viewport = viewport_by_name("phone-portrait").unwrap();
    let result = build_layout(&schema(full_platformer()), &viewport).unwrap();
    let m = &result.metrics;

    // min_dim 390: 66.3 as is, 54.6 -> 56 (action floor), 46.8 -> 48
    assert_eq!(m.min_dim, 390.0);
    assert_eq!(m.movement_size, 66.3);
    assert_eq!(m.action_size, 56.0);
    assert_eq!(m.small_action_size, 48.0);
    assert_eq!(m.edge_padding, 19.5);
    assert_eq!(m.spacing, 11.7);

    let jump = result.button(BindingName::Jump).unwrap();
    assert_eq!(jump.size, 48.0);
    let mv = result.button(BindingName::Move).unwrap();
    assert_eq!(mv.size, 66.3);
    // Centred in a 66.4 slot against the padded safe-area corner.
    assert_eq!(mv.x, 52.7);
    assert_eq!(mv.y, 757.3);
}

#[test]
fn test_pair_members_are_adjacent_left_then_right() {
    for (name, viewport) in regression_viewports() {
        let result = build_layout(&schema(paired_runner()), &viewport).unwrap();
        let left: &ButtonDescriptor = result.button(BindingName::Secondary).unwrap();
        let right = result.button(BindingName::Primary).unwrap();

        assert!(left.x < right.x, "{}", name);
        assert_eq!(left.y, right.y, "{}", name);
        assert_eq!(left.size, right.size, "{}", name);
        let gap = right.left() - left.right();
        assert!(
            (gap - result.metrics.spacing).abs() < 0.1 + EPS,
            "{}: gap {} vs spacing {}",
            name,
            gap,
            result.metrics.spacing
        );
        assert_eq!(left.pair.as_ref().unwrap().id, "turn");
    }
}

#[test]
fn test_safe_area_shifts_controls() {
    let plain = Viewport::builder().width(844.0).height(390.0).build();
    let inset = Viewport::builder()
        .width(844.0)
        .height(390.0)
        .safe_area(SafeArea::new(0.0, 47.0, 21.0, 47.0))
        .build();

    let a = build_layout(&schema(platformer()), &plain).unwrap();
    let b = build_layout(&schema(platformer()), &inset).unwrap();

    let (ma, mb) = (a.button(BindingName::Move).unwrap(), b.button(BindingName::Move).unwrap());
    assert!((mb.x - ma.x - 47.0).abs() < 0.1 + EPS);
    assert!((ma.y - mb.y - 21.0).abs() < 0.1 + EPS);
}

#[test]
fn test_empty_bindings_produce_no_controls() {
    let viewport = viewport_by_name("small-phone").unwrap();
    let result = build_layout(&schema(json!({ "bindings": {} })), &viewport).unwrap();
    assert_eq!(result.layout, Archetype::Runner);
    assert!(result.buttons.is_empty());
}

#[test]
fn test_layout_is_deterministic() {
    let input = schema(dual_stick());
    for (_, viewport) in regression_viewports() {
        assert_eq!(
            build_layout(&input, &viewport).unwrap(),
            build_layout(&input, &viewport).unwrap()
        );
    }
}

#[test]
fn test_result_bindings_reflect_decoupling() {
    let viewport = viewport_by_name("phone-landscape").unwrap();
    let result = build_layout(
        &schema(json!({
            "bindings": {
                "move": { "left": "KeyA", "right": "KeyD", "up": "KeyW", "down": "KeyS" },
                "magnitude": "ShiftLeft"
            },
            "actionMeta": {
                "move": { "control_space": "rate" },
                "magnitude": { "control_space": "magnitude" }
            }
        })),
        &viewport,
    )
    .unwrap();

    let mv = result.bindings[&BindingName::Move].as_axis().unwrap();
    assert!(mv.is_horizontal_only());
    assert_eq!(result.action_meta.len(), 2);
}

#[test]
fn test_decoupling_away_every_move_key_drops_move() {
    let viewport = viewport_by_name("phone-landscape").unwrap();
    let result = build_layout(
        &schema(json!({
            "bindings": { "move": { "up": "ArrowUp", "down": "ArrowDown" }, "primary": "KeyW" },
            "actionMeta": {
                "move": { "control_space": "rate" },
                "primary": { "control_space": "magnitude" }
            }
        })),
        &viewport,
    )
    .unwrap();

    assert_eq!(result.layout, Archetype::Runner);
    assert!(result.button(BindingName::Move).is_none());
    assert_eq!(result.buttons.len(), 1);
    assert!(!result.bindings.contains_key(&BindingName::Move));
    assert!(!result.action_meta.contains_key(&BindingName::Move));

    // The reported bindings are themselves valid input.
    let again = normalize(&schema(json!({ "bindings": result.bindings }))).unwrap();
    assert_eq!(again.bindings, result.bindings);
}

#[test]
fn test_viewport_too_small_is_a_geometry_error() {
    let viewport = Viewport::builder().width(100.0).height(100.0).build();
    let err = build_layout(&schema(platformer()), &viewport).unwrap_err();
    assert!(matches!(err, TouchForgeError::Geometry(_)), "got {:?}", err);
}

#[rstest]
#[case(0.0, 390.0)]
#[case(844.0, -1.0)]
#[case(f64::NAN, 390.0)]
#[case(844.0, f64::INFINITY)]
fn test_invalid_viewport_is_rejected(#[case] width: f64, #[case] height: f64) {
    let viewport = Viewport::builder().width(width).height(height).build();
    let err = build_layout(&schema(platformer()), &viewport).unwrap_err();
    assert!(matches!(
        err,
        TouchForgeError::Schema(SchemaError::InvalidViewport(_))
    ));
}

#[test]
fn test_schema_errors_surface_before_geometry() {
    let viewport = viewport_by_name("phone-portrait").unwrap();
    let err = build_layout(&schema(json!({ "bindings": { "jump": "Spcae" } })), &viewport).unwrap_err();
    assert!(matches!(
        err,
        TouchForgeError::Schema(SchemaError::UnresolvableKey { .. })
    ));
}
