mod common;

use jiff::{SignedDuration, Timestamp};

use qbank_core::models::bank::{BankId, Classification};
use qbank_core::models::response::ResponseStatus;
use qbank_core::models::status::{InstrumentState, OverallStatus};
use qbank_engine::classify::classify;
use qbank_engine::error::ScheduleError;
use qbank_engine::resolver::RecentStatuses;
use qbank_engine::schedule::ActiveWindow;

use common::{after, days, trigger};

fn window() -> ActiveWindow {
    let t = trigger();
    ActiveWindow {
        bank_id: BankId::from("localized"),
        classification: Classification::Baseline,
        iteration: 0,
        start: t,
        overdue: Some(after(t, days(7))),
        expired: after(t, days(90)),
    }
}

fn just_before(at: Timestamp) -> Timestamp {
    at.checked_sub(SignedDuration::from_secs(1)).unwrap()
}

fn state_at(now: Timestamp) -> InstrumentState {
    classify("epic26", &RecentStatuses::new(), &window(), now)
        .unwrap()
        .state
}

#[test]
fn window_boundaries() {
    let t = trigger();

    assert_eq!(state_at(t), InstrumentState::Due);
    assert_eq!(state_at(just_before(after(t, days(7)))), InstrumentState::Due);
    assert_eq!(state_at(after(t, days(7))), InstrumentState::Overdue);
    assert_eq!(state_at(just_before(after(t, days(90)))), InstrumentState::Overdue);
    assert_eq!(state_at(after(t, days(90))), InstrumentState::Expired);
}

#[test]
fn by_date_tracks_the_next_deadline() {
    let t = trigger();
    let w = window();
    let recents = RecentStatuses::new();

    let due = classify("epic26", &recents, &w, after(t, days(1))).unwrap();
    assert_eq!(due.by_date, w.overdue);

    let overdue = classify("epic26", &recents, &w, after(t, days(8))).unwrap();
    assert_eq!(overdue.by_date, Some(w.expired));

    let expired = classify("epic26", &recents, &w, after(t, days(91))).unwrap();
    assert_eq!(expired.by_date, None);
}

#[test]
fn completion_is_final() {
    let t = trigger();
    let authored = after(t, days(2));
    let recents = RecentStatuses::from([
        (ResponseStatus::Completed, authored),
        (ResponseStatus::InProgress, after(t, days(1))),
    ]);

    for now in [after(t, days(3)), after(t, days(400))] {
        let status = classify("epic26", &recents, &window(), now).unwrap();
        assert_eq!(status.state, InstrumentState::Completed);
        assert_eq!(status.completed, Some(authored));
        assert_eq!(status.by_date, None);
        assert_eq!(status.effective(), OverallStatus::Completed);
    }
}

#[test]
fn in_progress_keeps_window_state() {
    let t = trigger();
    let started = after(t, days(1));
    let recents = RecentStatuses::from([(ResponseStatus::InProgress, started)]);

    let overdue = classify("epic26", &recents, &window(), after(t, days(10))).unwrap();
    assert_eq!(overdue.state, InstrumentState::Overdue);
    assert_eq!(overdue.in_progress, Some(started));
    assert_eq!(overdue.by_date, Some(window().expired));
    assert_eq!(overdue.effective(), OverallStatus::InProgress);

    let expired = classify("epic26", &recents, &window(), after(t, days(95))).unwrap();
    assert_eq!(expired.state, InstrumentState::Expired);
    assert_eq!(expired.in_progress, Some(started));
    assert_eq!(expired.effective(), OverallStatus::InProgress);
}

#[test]
fn other_statuses_do_not_count() {
    let t = trigger();
    let recents = RecentStatuses::from([
        (ResponseStatus::Stopped, after(t, days(1))),
        (ResponseStatus::EnteredInError, after(t, days(2))),
    ]);

    let status = classify("epic26", &recents, &window(), after(t, days(3))).unwrap();
    assert_eq!(status.state, InstrumentState::Due);
    assert_eq!(status.completed, None);
    assert_eq!(status.in_progress, None);
}

#[test]
fn asking_before_the_window_opens_is_rejected() {
    let t = trigger();

    let err = classify("epic26", &RecentStatuses::new(), &window(), just_before(t)).unwrap_err();
    assert!(matches!(err, ScheduleError::PrematureStatus { start, .. } if start == t));
}
