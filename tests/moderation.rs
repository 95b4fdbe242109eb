mod common;

use chrono::{TimeDelta, Utc};
use pretty_assertions::assert_eq;
use serenity::all::UserId;
use std::time::Duration;
use tokio_test::assert_ok;

use common::ScratchDb;
use suroibot::utils::database::{CaseType, Database, NewCase};

const MODERATOR: UserId = UserId::new(900);

fn case(case_type: CaseType, user: u64, reason: &str, duration: Option<Duration>) -> NewCase {
    NewCase {
        case_type,
        user_id: UserId::new(user),
        moderator_id: MODERATOR,
        reason: reason.to_string(),
        duration,
    }
}

#[test]
fn cases_survive_a_restart() {
    let scratch = ScratchDb::new("cases");
    let ban = case(CaseType::Ban, 7, "raiding", None);

    let stored = {
        let db = assert_ok!(Database::open(&scratch.0));
        assert_ok!(db.create_case(&case(CaseType::Warning, 7, "spam", None), Utc::now()));
        assert_ok!(db.create_case(&ban, Utc::now()))
    };

    let db = assert_ok!(Database::open(&scratch.0));
    let reloaded = db.get_case(stored.id).unwrap().expect("case was stored");
    assert_eq!(reloaded.case_type, CaseType::Ban);
    assert_eq!(reloaded.reason, "raiding");
    assert_eq!(reloaded.duration, None);
    assert_eq!(db.case_count_for_user(UserId::new(7)).unwrap(), 2);
}

#[test]
fn a_users_history_pages_newest_first() {
    common::init();
    let db = Database::open_in_memory().unwrap();
    let start = Utc::now();
    for day in 0..7 {
        let reason = format!("strike {}", day + 1);
        db.create_case(
            &case(CaseType::Warning, 5, &reason, None),
            start + TimeDelta::days(day),
        )
        .unwrap();
    }
    db.create_case(
        &case(CaseType::Timeout, 6, "someone else", Some(Duration::from_secs(600))),
        start,
    )
    .unwrap();

    let first: Vec<String> = db
        .cases_for_user(UserId::new(5), 5, 0)
        .unwrap()
        .into_iter()
        .map(|case| case.reason)
        .collect();
    assert_eq!(
        first,
        vec!["strike 7", "strike 6", "strike 5", "strike 4", "strike 3"]
    );

    let second = db.cases_for_user(UserId::new(5), 5, 5).unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(second[1].reason, "strike 1");
}

#[test]
fn deleted_cases_keep_their_numbers_retired() {
    let db = Database::open_in_memory().unwrap();
    let first = db
        .create_case(&case(CaseType::Kick, 5, "first", None), Utc::now())
        .unwrap();
    assert!(db.delete_case(first.id).unwrap());

    let next = db
        .create_case(&case(CaseType::Kick, 5, "second", None), Utc::now())
        .unwrap();
    assert!(next.id > first.id);
    assert_eq!(db.get_case(first.id).unwrap(), None);
}
