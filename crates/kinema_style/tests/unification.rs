use std::sync::Arc;

use kinema_core::diagnostics::{with_warning_sink, CollectingSink};
use kinema_core::{Mat4, WarningKind};
use kinema_style::multi_value::shadow_items;
use kinema_style::shorthand::expand_shorthand;
use kinema_style::testing::MemoryTarget;
use kinema_style::token::render_tokens;
use kinema_style::{
    property_map, FixedLengths, PropertyMap, PropertySet, PropertyValue, ShorthandKind,
    SignedNumber, TransformChannel, Unifier, UnitConverter,
};

#[test]
fn test_relative_number_combines_with_prior() {
    let delta = SignedNumber::parse("+=10px");
    assert_eq!((delta.relative, delta.value, delta.unit.as_str()), (true, 10.0, "px"));

    let ctx = FixedLengths::default();
    let uc = UnitConverter::new(&ctx);
    let combined = uc.combine("width", &SignedNumber::new(5.0, "px"), &delta);
    assert_eq!(combined, SignedNumber::new(15.0, "px"));
    assert!(!combined.relative);
}

#[test]
fn test_margin_two_values_expand_to_four_sides() {
    let sides = expand_shorthand(ShorthandKind::Sides, "margin", "10px 20px");
    let expected = [
        ("marginTop", "10px"),
        ("marginRight", "20px"),
        ("marginBottom", "10px"),
        ("marginLeft", "20px"),
    ];
    assert_eq!(sides.len(), 4);
    for ((key, value), (k, v)) in sides.iter().zip(expected) {
        assert_eq!((key.as_str(), value.as_str()), (k, v));
    }
}

#[test]
fn test_shadow_against_none_pads_to_equal_length() {
    let (a, b) = shadow_items(true, "0px 0px 2px red", "none");
    assert_eq!((a.len(), b.len()), (6, 6));
    assert_eq!(b[4], "rgba(0,0,0,0)");

    let (a, b) = shadow_items(false, "0px 0px 2px red", "none");
    assert_eq!((a.len(), b.len()), (5, 5));
    assert_eq!(b[3], "rgba(0,0,0,0)");
}

#[test]
fn test_unified_shadow_tokens_interpolate() {
    let target = MemoryTarget::new();
    let unifier = Unifier::new(&target);
    let (a, b) = unifier.unify_value("boxShadow", Some("0px 0px 2px red"), Some("none"), "none");
    assert_eq!(a.len(), b.len());
    assert_eq!(render_tokens(&a), "0px 0px 2px 0px rgba(255,0,0,1)");
    assert_eq!(render_tokens(&b), "0px 0px 0px 0px rgba(0,0,0,0)");
}

#[test]
fn test_token_lists_have_equal_length_across_kinds() {
    let target = MemoryTarget::new()
        .with_value("color", "black")
        .with_value("transformOrigin", "50% 50% 0px");
    let unifier = Unifier::new(&target);
    let cases = [
        ("color", "currentcolor", "rgb(10, 20, 30)"),
        ("transformOrigin", "left top", "right 20px"),
        ("backgroundPosition", "center", "10% 90%"),
        ("filter", "blur(2px) drop-shadow(1px 1px 2px red)", "blur(4px)"),
        ("textShadow", "1px 1px red, 2px 2px blue", "none"),
        ("borderStyle", "solid", "dotted"),
    ];
    for (key, from, to) in cases {
        let (a, b) = unifier.unify_value(key, Some(from), Some(to), "");
        assert_eq!(a.len(), b.len(), "{key}");
    }
}

#[test]
fn test_unit_conversion_round_trip() {
    let ctx = FixedLengths::default();
    let uc = UnitConverter::new(&ctx);
    let a = SignedNumber::new(2.5, "em");
    let b = SignedNumber::new(0.0, "vh");
    let (in_b, _) = uc.unify("paddingTop", &a, &b);
    let (back, _) = uc.unify("paddingTop", &in_b, &a);
    assert!((back.value - 2.5).abs() < 1e-9);
    assert_eq!(back.unit, "em");
}

#[test]
fn test_transform_string_is_canonical() {
    let mut target = MemoryTarget::new();
    let to = property_map([
        ("skewY", PropertyValue::from(10.0)),
        ("scale", 2.0.into()),
        ("rotate", "0.25turn".into()),
        ("rotateX", 30.0.into()),
        ("x", "50%".into()),
    ]);
    let set = PropertySet::read(&target, &PropertyMap::new(), &to);
    let mut fragment = kinema_style::Fragment::new(&target);
    fragment.merge(&set.sample(1.0, false, false));
    fragment.apply(&mut target);

    assert_eq!(
        target.value("transform"),
        Some("translate3d(50%, 0px, 0px) rotateX(30deg) rotate(0.25turn) scale(2, 2) skewY(10deg)")
    );
}

#[test]
fn test_transforms_compose_with_current_matrix() {
    let target = MemoryTarget::new().with_matrix(Mat4::translation(40.0, 10.0, 0.0));
    let to = property_map([("x", "+=20")]);
    let set = PropertySet::read(&target, &PropertyMap::new(), &to);

    let start = set.sample(0.0, false, true);
    let end = set.sample(1.0, false, false);
    assert_eq!(start.transform[&TransformChannel::TranslateX], "40px");
    assert_eq!(end.transform[&TransformChannel::TranslateX], "60px");
}

#[test]
fn test_bad_input_degrades_with_warnings() {
    let target = MemoryTarget::new().without_property("sparkle");
    let unifier = Unifier::new(&target);
    let from = property_map([("backgroundColor", "red")]);
    let to = property_map([("sparkle", "3"), ("backgroundColor", "#zzz"), ("width", "20px")]);
    let sink = Arc::new(CollectingSink::new());
    let unified = with_warning_sink(sink.clone(), || unifier.unify_properties(&from, &to));

    assert!(!unified.css.contains_key("sparkle"));
    assert_eq!(render_tokens(&unified.css["width"].to), "20px");
    assert_eq!(render_tokens(&unified.css["backgroundColor"].to), "rgba(0,0,0,0)");
    assert_eq!(sink.count(WarningKind::UnsupportedProperty), 1);
    assert!(sink.count(WarningKind::Parse) >= 1);
}
