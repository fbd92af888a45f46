use jiff::Timestamp;
use qbank_core::error::CoreError;
use qbank_core::offset::RelativeOffset;
use qbank_core::recurrence::RecurrenceRule;

fn ts(text: &str) -> Timestamp {
    text.parse().unwrap()
}

fn months(n: i32) -> RelativeOffset {
    RelativeOffset::of_months(n)
}

fn after(trigger: Timestamp, offset: RelativeOffset) -> Timestamp {
    offset.apply(trigger).unwrap()
}

/// Every year from month 6, no cycle after month 21.
fn yearly_from_six_months() -> RecurrenceRule {
    RecurrenceRule::new(months(6), RelativeOffset::of_years(1), months(21)).unwrap()
}

#[test]
fn rejects_non_positive_cycle_length() {
    for cycle in [RelativeOffset::ZERO, RelativeOffset::of_days(-1)] {
        let err = RecurrenceRule::new(months(3), cycle, months(24)).unwrap_err();
        assert!(matches!(err, CoreError::MalformedOffset(_)));
    }
}

#[test]
fn deserialization_applies_validation() {
    let ok: RecurrenceRule = serde_json::from_str(
        r#"{"start": {"months": 3}, "cycle_length": {"months": 6}, "termination": {"months": 24}}"#,
    )
    .unwrap();
    assert_eq!(ok.cycle_length(), months(6));

    let zero_cycle = serde_json::from_str::<RecurrenceRule>(
        r#"{"start": {"months": 3}, "cycle_length": {}, "termination": {"months": 24}}"#,
    );
    assert!(zero_cycle.is_err());
}

#[test]
fn nth_cycle_start_steps_by_cycle_length() {
    let trigger = ts("2020-01-15T00:00:00Z");
    let rule = yearly_from_six_months();
    assert_eq!(rule.nth_cycle_start(trigger, 0).unwrap(), ts("2020-07-15T00:00:00Z"));
    assert_eq!(rule.nth_cycle_start(trigger, 1).unwrap(), ts("2021-07-15T00:00:00Z"));
}

#[test]
fn cycle_containing_before_start_is_none() {
    let trigger = ts("2020-01-15T00:00:00Z");
    let rule = yearly_from_six_months();
    assert_eq!(rule.cycle_containing(trigger, after(trigger, months(5))).unwrap(), None);
}

#[test]
fn cycle_containing_picks_latest_started_cycle() {
    let trigger = ts("2020-01-15T00:00:00Z");
    let rule = yearly_from_six_months();
    assert_eq!(rule.cycle_containing(trigger, after(trigger, months(6))).unwrap(), Some(0));
    assert_eq!(rule.cycle_containing(trigger, after(trigger, months(7))).unwrap(), Some(0));
    assert_eq!(rule.cycle_containing(trigger, after(trigger, months(18))).unwrap(), Some(1));
    assert_eq!(rule.cycle_containing(trigger, after(trigger, months(20))).unwrap(), Some(1));
}

#[test]
fn cycle_containing_after_termination_keeps_last_cycle() {
    let trigger = ts("2020-01-15T00:00:00Z");
    let rule = yearly_from_six_months();
    assert_eq!(rule.cycle_containing(trigger, after(trigger, months(21))).unwrap(), Some(1));
    assert_eq!(rule.cycle_containing(trigger, after(trigger, months(40))).unwrap(), Some(1));
}

#[test]
fn cycle_starting_at_termination_is_reachable() {
    let trigger = ts("2024-01-01T00:00:00Z");
    // Cycles at months 3, 9, 15 and 21; the last one starts on the termination.
    let rule = RecurrenceRule::new(months(3), months(6), months(21)).unwrap();
    let last_start = rule.nth_cycle_start(trigger, 3).unwrap();

    assert_eq!(rule.cycle_count(trigger).unwrap(), 4);
    assert_eq!(last_start, rule.terminates_at(trigger).unwrap());
    assert_eq!(rule.cycle_containing(trigger, last_start).unwrap(), Some(3));
    assert_eq!(
        rule.cycle_containing(trigger, after(last_start, RelativeOffset::of_days(1))).unwrap(),
        Some(3)
    );
}

#[test]
fn rule_ending_before_its_start_has_no_cycle() {
    let trigger = ts("2020-01-15T00:00:00Z");
    let never = RecurrenceRule::new(months(12), months(1), months(6)).unwrap();
    assert_eq!(never.cycle_containing(trigger, after(trigger, months(13))).unwrap(), None);
}

#[test]
fn cycle_count_includes_cycle_starting_at_termination() {
    let trigger = ts("2020-01-15T00:00:00Z");
    assert_eq!(yearly_from_six_months().cycle_count(trigger).unwrap(), 2);

    // Quarterly from month 3 to month 27: months 3, 6, ..., 27.
    let quarterly = RecurrenceRule::new(months(3), months(3), months(27)).unwrap();
    assert_eq!(quarterly.cycle_count(trigger).unwrap(), 9);

    let never = RecurrenceRule::new(months(12), months(1), months(6)).unwrap();
    assert_eq!(never.cycle_count(trigger).unwrap(), 0);
}
