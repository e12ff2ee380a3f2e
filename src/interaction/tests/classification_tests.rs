//! Classification entry scenarios.

use super::*;
use crate::config::CarryOverRule;
use crate::interaction::ClassificationState;
use crate::model::AnnotationType;

fn labels_config() -> ProjectConfig {
    ProjectConfig::new(AnnotationType::Label, AnnotationType::Label)
}

fn labeled(label: &str) -> Option<ClassificationState> {
    Some(ClassificationState::Labeled(label.into()))
}

#[test]
fn test_default_annotation_uses_active_class() {
    let h = Harness::new(labels_config(), EntryPayload::new("a.jpg"));
    let annotations = h.annotations();
    assert_eq!(annotations.len(), 1);
    assert!(annotations[0].has_label("cat"));
    assert!(!annotations[0].changed);
    assert_eq!(h.entry.classification_state(), labeled("cat"));
}

#[test]
fn test_default_annotation_blank_with_empty_class() {
    let h = Harness::new(
        labels_config().with_empty_class(true),
        EntryPayload::new("a.jpg"),
    );
    assert_eq!(h.annotations().len(), 1);
    assert_eq!(h.annotations()[0].label, None);
    assert_eq!(
        h.entry.classification_state(),
        Some(ClassificationState::Unlabeled)
    );
}

#[test]
fn test_click_toggles_label() {
    let mut h = Harness::new(
        labels_config().with_empty_class(true),
        EntryPayload::new("a.jpg"),
    );
    h.clock.advance(250);
    h.click(0.5, 0.5, Modifiers::NONE);
    assert_eq!(h.entry.classification_state(), labeled("cat"));
    let annotation = h.annotations()[0];
    assert!(annotation.changed);
    assert_eq!(
        annotation.time_changed,
        Some(Timestamp::from_millis(T0 + 250))
    );

    h.click(0.5, 0.5, Modifiers::NONE);
    assert_eq!(
        h.entry.classification_state(),
        Some(ClassificationState::Unlabeled)
    );
}

#[test]
fn test_same_class_click_keeps_label_without_empty_class() {
    let mut h = Harness::new(labels_config(), EntryPayload::new("a.jpg"));
    h.click(0.5, 0.5, Modifiers::NONE);
    h.click(0.5, 0.5, Modifiers::ALT);
    assert_eq!(h.entry.classification_state(), labeled("cat"));
}

#[test]
fn test_alt_click_forces_removal() {
    let payload = EntryPayload::new("a.jpg").with_annotation("a", label_record("dog"));
    let mut h = Harness::new(labels_config().with_empty_class(true), payload);
    h.click(0.5, 0.5, Modifiers::ALT);
    assert_eq!(
        h.entry.classification_state(),
        Some(ClassificationState::Unlabeled)
    );
}

#[test]
fn test_switching_class_relabels_single_annotation() {
    let mut h = Harness::new(labels_config(), EntryPayload::new("a.jpg"));
    h.class = dog();
    h.click(0.1, 0.9, Modifiers::NONE);
    h.class = cat();
    h.click(0.9, 0.1, Modifiers::NONE);
    h.class = dog();
    h.click(0.3, 0.3, Modifiers::NONE);
    assert_eq!(h.annotations().len(), 1);
    assert_eq!(h.entry.classification_state(), labeled("dog"));
}

#[test]
fn test_payload_with_several_labels_keeps_one() {
    let payload = EntryPayload::new("a.jpg")
        .with_annotation("a", label_record("cat"))
        .with_annotation("b", label_record("dog"));
    let h = Harness::new(labels_config(), payload);
    assert_eq!(h.annotations().len(), 1);
    assert_eq!(h.annotations()[0].id, "b");
}

#[test]
fn test_hover_texts() {
    let mut h = Harness::new(
        labels_config().with_empty_class(true),
        EntryPayload::new("a.jpg"),
    );
    h.move_to(0.5, 0.5, Modifiers::NONE);
    assert_eq!(h.hover_text().as_deref(), Some("set label to \"Cat\""));

    h.click(0.5, 0.5, Modifiers::NONE);
    h.move_to(0.5, 0.5, Modifiers::NONE);
    assert_eq!(h.hover_text(), None);

    h.class = dog();
    h.move_to(0.5, 0.5, Modifiers::NONE);
    assert_eq!(h.hover_text().as_deref(), Some("change label to \"Dog\""));

    h.send(InputEvent::KeyChanged(Modifiers::ALT));
    assert_eq!(h.hover_text().as_deref(), Some("mark as unlabeled"));

    h.send(InputEvent::PointerLeave);
    assert_eq!(h.hover_text(), None);
}

#[test]
fn test_set_label() {
    let mut h = Harness::new(labels_config(), EntryPayload::new("a.jpg"));
    h.entry.set_label(Some("dog".into())).unwrap();
    assert_eq!(h.entry.classification_state(), labeled("dog"));
    assert!(h.annotations()[0].changed);
}

#[test]
fn test_carry_over_max_confidence() {
    let config = ProjectConfig::new(AnnotationType::Label, AnnotationType::Point)
        .with_carry_over(CarryOverRule::MaxConfidence, 0.5);
    let payload = EntryPayload::new("a.jpg")
        .with_prediction("a", with_confidence(point_record(0.1, 0.1, "cat"), 0.4))
        .with_prediction("b", with_confidence(point_record(0.2, 0.2, "dog"), 0.9))
        .with_prediction("c", with_confidence(point_record(0.3, 0.3, "bird"), 0.9));
    let h = Harness::new(config, payload);

    assert_eq!(h.annotations().len(), 1);
    let seed = h.annotations()[0];
    assert!(seed.has_label("dog"));
    assert_eq!(seed.confidence, Some(0.9));
    assert!(seed.changed);
}

#[test]
fn test_carry_over_mode() {
    let config = ProjectConfig::new(AnnotationType::Label, AnnotationType::BoundingBox)
        .with_carry_over(CarryOverRule::Mode, 0.9);
    let payload = EntryPayload::new("a.jpg")
        .with_prediction("a", with_confidence(box_record(0.2, 0.2, 0.1, 0.1, "cat"), 0.1))
        .with_prediction("b", with_confidence(box_record(0.5, 0.5, 0.1, 0.1, "dog"), 0.95))
        .with_prediction("c", with_confidence(box_record(0.8, 0.8, 0.1, 0.1, "cat"), 0.2));
    let h = Harness::new(config, payload);

    assert_eq!(h.entry.classification_state(), labeled("cat"));
}

#[test]
fn test_carry_over_skipped_when_annotated() {
    let config = ProjectConfig::new(AnnotationType::Label, AnnotationType::Label)
        .with_carry_over(CarryOverRule::MaxConfidence, 0.0);
    let payload = EntryPayload::new("a.jpg")
        .with_annotation("mine", label_record("cat"))
        .with_prediction("p", with_confidence(label_record("dog"), 0.99));
    let h = Harness::new(config, payload);
    assert_eq!(h.annotations().len(), 1);
    assert_eq!(h.annotations()[0].id, "mine");
}

#[test]
fn test_label_predictions_leave_default_label() {
    let config = labels_config().with_carry_over(CarryOverRule::MaxConfidence, 0.0);
    let payload =
        EntryPayload::new("a.jpg").with_prediction("p", with_confidence(label_record("dog"), 0.9));
    let h = Harness::new(config, payload);

    assert_eq!(h.annotations().len(), 1);
    assert!(h.annotations()[0].has_label("cat"));
    assert!(!h.annotations()[0].changed);
}
