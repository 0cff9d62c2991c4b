use rstest::rstest;
use serde_json::{json, Value};
use touchforge::error::SchemaError;
use touchforge::schema::{
    Activation, Behavior, Binding, BindingName, CanonicalConfig, ControlKind, ControlSpace, Direction,
    Interaction, LayoutPreference, PairPosition,
};
use touchforge::{normalize, SchemaInput};

fn input(value: Value) -> SchemaInput {
    serde_json::from_value(value).unwrap()
}

fn config(value: Value) -> CanonicalConfig {
    normalize(&input(value)).unwrap()
}

fn error(value: Value) -> SchemaError {
    normalize(&input(value)).unwrap_err()
}

fn arrows() -> Value {
    json!({ "left": "ArrowLeft", "right": "ArrowRight", "up": "ArrowUp", "down": "ArrowDown" })
}

#[test]
fn test_both_shapes_converge() {
    let analysis = config(json!({
        "axes": [{ "usage": "movement", "keys": arrows() }],
        "actions": {
            "jump": "Space",
            "primary": { "keys": "KeyX", "interaction": "hold" }
        }
    }));
    let flat = config(json!({
        "bindings": { "move": arrows(), "jump": "Space", "primary": "KeyX" },
        "actionMeta": { "primary": { "interaction": "hold" } }
    }));

    assert_eq!(analysis, flat);
    assert_eq!(analysis.layout, LayoutPreference::Auto);
    assert_eq!(
        analysis.meta(BindingName::Primary).unwrap().interaction,
        Interaction::Hold
    );
}

#[test]
fn test_action_meta_snake_case_alias_is_accepted() {
    let camel = config(json!({
        "bindings": { "jump": "Space" },
        "actionMeta": { "jump": { "activation": "latch" } }
    }));
    let snake = config(json!({
        "bindings": { "jump": "Space" },
        "action_meta": { "jump": { "activation": "latch" } }
    }));
    assert_eq!(camel, snake);
    assert_eq!(camel.meta(BindingName::Jump).unwrap().activation, Activation::Latch);
}

#[test]
fn test_defaults_for_axes_and_actions() {
    let c = config(json!({ "bindings": { "move": arrows(), "jump": "Space" } }));

    let mv = c.meta(BindingName::Move).unwrap();
    assert_eq!(mv.kind, ControlKind::Axis);
    assert_eq!(mv.control_space, Some(ControlSpace::Vector));
    assert_eq!(mv.behavior, Behavior::Continuous);
    assert_eq!(mv.interaction, Interaction::Hold);

    let jump = c.meta(BindingName::Jump).unwrap();
    assert_eq!(jump.kind, ControlKind::Button);
    assert_eq!(jump.behavior, Behavior::Discrete);
    assert_eq!(jump.interaction, Interaction::Tap);
    assert_eq!(jump.activation, Activation::Hold);
    assert!(!jump.simultaneous);
    assert!(jump.pair().is_none());
}

#[test]
fn test_flat_binding_wins_per_slot() {
    let c = config(json!({
        "actions": {
            "jump": { "keys": "Space", "interaction": "hold" },
            "primary": "KeyX"
        },
        "bindings": { "jump": "KeyW" }
    }));

    assert_eq!(c.key(BindingName::Jump), Some("KeyW"));
    assert_eq!(c.key(BindingName::Primary), Some("KeyX"));
    // The replaced slot takes no metadata from the analysis shape.
    assert_eq!(c.meta(BindingName::Jump).unwrap().interaction, Interaction::Tap);
}

#[test]
fn test_flat_meta_table_replaces_inline_tags() {
    let c = config(json!({
        "bindings": { "jump": { "key": "Space", "interaction": "hold", "simultaneous": true } },
        "actionMeta": { "jump": { "activation": "latch" } }
    }));
    let jump = c.meta(BindingName::Jump).unwrap();
    assert_eq!(jump.activation, Activation::Latch);
    assert_eq!(jump.interaction, Interaction::Tap);
    assert!(!jump.simultaneous);
}

#[test]
fn test_empty_input_is_valid() {
    let c = config(json!({}));
    assert!(c.bindings.is_empty());
    assert!(c.action_meta.is_empty());
}

#[test]
fn test_keys_are_kept_as_given() {
    let c = config(json!({ "bindings": { "jump": "Spacebar", "pause": "Esc" } }));
    assert_eq!(c.key(BindingName::Jump), Some("Spacebar"));
    assert_eq!(c.key(BindingName::Pause), Some("Esc"));
}

#[test]
fn test_unique_primary_axis_wins() {
    let c = config(json!({
        "axes": [
            { "usage": "movement", "priority": "secondary", "keys": arrows() },
            { "usage": "movement", "priority": "primary", "keys": { "left": "KeyA", "right": "KeyD" } }
        ]
    }));
    let mv = c.axis(BindingName::Move).unwrap();
    assert_eq!(mv.get(Direction::Left), Some("KeyA"));
    assert!(!mv.has_vertical());
}

#[test]
fn test_magnitude_axis_becomes_magnitude_action() {
    let c = config(json!({
        "axes": [
            { "usage": "movement", "control_space": "rate", "keys": { "left": "KeyA", "right": "KeyD" } },
            { "usage": "movement", "kind": "axis", "control_space": "magnitude", "keys": { "up": "KeyW", "down": "KeyS" } }
        ]
    }));

    assert_eq!(c.key(BindingName::Magnitude), Some("KeyW"));
    let meta = c.meta(BindingName::Magnitude).unwrap();
    assert_eq!(meta.kind, ControlKind::Button);
    assert_eq!(meta.control_space, Some(ControlSpace::Magnitude));
    assert_eq!(meta.behavior, Behavior::Continuous);
    assert_eq!(meta.interaction, Interaction::Hold);
    assert_eq!(c.control_space(BindingName::Move), Some(ControlSpace::Rate));
}

#[test]
fn test_explicit_magnitude_action_outranks_magnitude_axis() {
    let c = config(json!({
        "axes": [
            { "usage": "movement", "control_space": "magnitude", "keys": { "up": "KeyW" } }
        ],
        "actions": { "magnitude": "ShiftLeft" }
    }));
    assert_eq!(c.key(BindingName::Magnitude), Some("ShiftLeft"));
    assert!(c.axis(BindingName::Move).is_none());
}

#[test]
fn test_pair_tags_survive() {
    let c = config(json!({
        "bindings": { "primary": "KeyX", "secondary": "KeyZ" },
        "actionMeta": {
            "primary": { "pair_id": "turn", "pair_position": "right" },
            "secondary": { "pair_id": "turn", "pair_position": "left" }
        }
    }));
    assert_eq!(
        c.meta(BindingName::Secondary).unwrap().pair(),
        Some(("turn", PairPosition::Left))
    );
}

#[rstest]
#[case("auto", LayoutPreference::Auto)]
#[case("", LayoutPreference::Auto)]
#[case("custom", LayoutPreference::Custom)]
#[case("dual-stick", LayoutPreference::Explicit(touchforge::schema::Archetype::DualStick))]
fn test_layout_preference_parses(#[case] layout: &str, #[case] expected: LayoutPreference) {
    let c = config(json!({ "layout": layout, "bindings": { "jump": "Space" } }));
    assert_eq!(c.layout, expected);
}

#[test]
fn test_unknown_layout_is_rejected() {
    let err = error(json!({ "layout": "racing", "bindings": { "jump": "Space" } }));
    assert_eq!(
        err,
        SchemaError::UnknownEnum {
            field: "layout".to_string(),
            value: "racing".to_string()
        }
    );
}

#[test]
fn test_unknown_slot() {
    assert_eq!(
        error(json!({ "bindings": { "fire": "KeyF" } })),
        SchemaError::UnknownSlot("fire".to_string())
    );
    // An axis name is not an action slot.
    assert_eq!(
        error(json!({ "actions": { "move": "KeyF" } })),
        SchemaError::UnknownSlot("move".to_string())
    );
}

#[test]
fn test_unknown_direction() {
    let err = error(json!({ "bindings": { "move": { "left": "KeyA", "forward": "KeyW" } } }));
    assert_eq!(
        err,
        SchemaError::UnknownDirection {
            binding: "move".to_string(),
            direction: "forward".to_string()
        }
    );
}

#[rstest]
#[case(json!({ "bindings": { "jump": "Spcae" } }), "jump", "Spcae")]
#[case(json!({ "bindings": { "jump": "space" } }), "jump", "space")]
#[case(json!({ "bindings": { "move": { "left": "KeyA", "right": "keyd" } } }), "move", "keyd")]
#[case(json!({ "actions": { "primary": { "keys": "Mouse1" } } }), "primary", "Mouse1")]
fn test_unresolvable_key(#[case] value: Value, #[case] binding: &str, #[case] key: &str) {
    assert_eq!(
        error(value),
        SchemaError::UnresolvableKey {
            binding: binding.to_string(),
            key: key.to_string()
        }
    );
}

#[test]
fn test_unknown_enum_value_names_its_field() {
    let err = error(json!({
        "bindings": { "jump": "Space" },
        "actionMeta": { "jump": { "interaction": "double_tap" } }
    }));
    assert_eq!(
        err,
        SchemaError::UnknownEnum {
            field: "jump.interaction".to_string(),
            value: "double_tap".to_string()
        }
    );
}

#[rstest]
#[case(json!([
    { "usage": "movement", "keys": { "left": "KeyA" } },
    { "usage": "movement", "keys": { "right": "KeyD" } }
]), 0)]
#[case(json!([
    { "usage": "movement", "priority": "primary", "keys": { "left": "KeyA" } },
    { "usage": "movement", "priority": "primary", "keys": { "right": "KeyD" } }
]), 2)]
fn test_ambiguous_axis_priority(#[case] axes: Value, #[case] primaries: usize) {
    assert_eq!(
        error(json!({ "axes": axes })),
        SchemaError::AmbiguousAxisPriority {
            usage: "movement".to_string(),
            primaries
        }
    );
}

#[test]
fn test_meta_without_binding() {
    let err = error(json!({
        "bindings": { "jump": "Space" },
        "actionMeta": { "primary": { "interaction": "hold" } }
    }));
    assert_eq!(err, SchemaError::MetaWithoutBinding("primary".to_string()));
}

#[rstest]
#[case(json!({ "bindings": { "move": "KeyA" } }))]
#[case(json!({ "bindings": { "jump": ["Space", "KeyW"] } }))]
#[case(json!({ "bindings": { "move": arrows() }, "actionMeta": { "move": { "kind": "button" } } }))]
fn test_wrong_shape(#[case] value: Value) {
    assert!(matches!(error(value), SchemaError::WrongShape { .. }));
}

#[rstest]
#[case(json!({ "bindings": { "jump": { "interaction": "hold" } } }))]
#[case(json!({ "bindings": { "move": {} } }))]
#[case(json!({ "axes": [{ "usage": "movement" }] }))]
fn test_missing_key(#[case] value: Value) {
    assert!(matches!(error(value), SchemaError::MissingKey(_)));
}

#[rstest]
#[case(json!({
    "primary": { "pair_id": "p", "pair_position": "left" },
    "secondary": { "pair_id": "p", "pair_position": "left" }
}))]
#[case(json!({
    "primary": { "pair_id": "p", "pair_position": "left" },
    "secondary": { "pair_id": "p", "pair_position": "right" },
    "tertiary": { "pair_id": "p", "pair_position": "right" }
}))]
#[case(json!({ "primary": { "pair_id": "p" } }))]
#[case(json!({ "primary": { "pair_position": "left" } }))]
fn test_invalid_pairs(#[case] meta: Value) {
    let err = error(json!({
        "bindings": { "primary": "KeyX", "secondary": "KeyZ", "tertiary": "KeyC" },
        "actionMeta": meta
    }));
    assert!(matches!(err, SchemaError::InvalidPair { .. }), "got {:?}", err);
}

#[test]
fn test_axes_cannot_pair() {
    let err = error(json!({
        "bindings": { "move": arrows() },
        "actionMeta": { "move": { "pair_id": "p", "pair_position": "left" } }
    }));
    assert!(matches!(err, SchemaError::InvalidPair { .. }));
}

#[test]
fn test_normalize_is_idempotent() {
    let first = config(json!({
        "layout": "fast-platformer",
        "axes": [
            { "usage": "movement", "control_space": "rate", "direction_mode": "cardinal", "keys": arrows() },
            { "usage": "aim", "keys": { "left": "KeyJ", "right": "KeyL", "up": "KeyI", "down": "KeyK" } }
        ],
        "actions": {
            "jump": "Space",
            "magnitude": { "keys": "ShiftLeft", "control_space": "magnitude" },
            "primary": { "keys": "KeyX", "pair_id": "fire", "pair_position": "right" },
            "secondary": { "keys": "KeyZ", "pair_id": "fire", "pair_position": "left", "activation": "latch" }
        }
    }));
    let second = normalize(&SchemaInput::from(&first)).unwrap();
    assert_eq!(first, second);

    match first.bindings.get(&BindingName::Aim) {
        Some(Binding::Axis(aim)) => assert_eq!(aim.get(Direction::Up), Some("KeyI")),
        other => panic!("expected aim axis, got {:?}", other),
    }
}
