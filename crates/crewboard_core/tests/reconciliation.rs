use crewboard_core::model::employee::NewEmployee;
use crewboard_core::repo::EmployeeRepository;
use crewboard_core::service::{
    MemberOutcome, ReconciliationMode, ReconciliationReport, ReconciliationService,
};
use crewboard_core::{
    AccessLevel, EmployeeId, InMemoryPlatform, Selector, SqliteEntityStore, UserId,
};
use std::collections::BTreeMap;

fn seed(store: &SqliteEntityStore<'_>, external: u64, name: &str, level: u8) -> EmployeeId {
    store
        .create_employee(&NewEmployee {
            username: Some(name.to_string()),
            external_id: UserId(external),
            access_level: AccessLevel::saturating(level),
            utc_offset: None,
        })
        .unwrap()
        .id
}

#[test]
fn report_pass_renames_and_lists_missing_members() {
    let conn = crewboard_core::open_db_in_memory().unwrap();
    let store = SqliteEntityStore::try_new(&conn).unwrap();
    let platform = InMemoryPlatform::new();
    for external in 1..=5u64 {
        seed(&store, external, &format!("user-{external}"), 1);
    }
    platform.add_member(UserId(1), "user-1");
    platform.add_member(UserId(2), "user-2-renamed");
    platform.add_member(UserId(3), "user-3");

    let service = ReconciliationService::new(&store, &platform);
    let report = service.run(ReconciliationMode::Report).unwrap();
    assert_eq!(report.checked(), 5);
    assert_eq!(report.renamed(), 1);
    assert_eq!(report.missing(), 2);
    assert_eq!(report.purged(), 0);

    let rendered = report.render();
    assert!(rendered.starts_with(
        ":white_check_mark: The following usernames were successfully updated:\n`user-2` => `user-2-renamed` (ID: 2)"
    ));
    assert!(rendered.contains("Failed to find the following users:\nuser-4 (4)\nuser-5 (5)"));

    // missing members stay active in report mode
    assert_eq!(store.list_active_employees().unwrap().len(), 5);
    let renamed = store
        .find_employee(&Selector::External(UserId(2)), false)
        .unwrap()
        .unwrap();
    assert_eq!(renamed.username.as_deref(), Some("user-2-renamed"));
}

#[test]
fn rerunning_a_report_pass_is_idempotent() {
    let conn = crewboard_core::open_db_in_memory().unwrap();
    let store = SqliteEntityStore::try_new(&conn).unwrap();
    let platform = InMemoryPlatform::new();
    seed(&store, 1, "old-name", 2);
    seed(&store, 2, "ghost", 2);
    platform.add_member(UserId(1), "new-name");

    let service = ReconciliationService::new(&store, &platform);
    let first = service.run(ReconciliationMode::Report).unwrap();
    let second = service.run(ReconciliationMode::Report).unwrap();

    assert_eq!(first.renamed(), 1);
    assert_eq!(second.renamed(), 0);
    assert_eq!(second.unchanged(), 1);
    assert_ne!(first.pass_id, second.pass_id);

    let missing = |report: &ReconciliationReport| -> Vec<UserId> {
        report
            .members
            .iter()
            .filter(|member| matches!(member.outcome, MemberOutcome::Missing))
            .map(|member| member.employee.external_id)
            .collect()
    };
    assert_eq!(missing(&first), vec![UserId(2)]);
    assert_eq!(missing(&first), missing(&second));
    assert!(second
        .render()
        .starts_with(":white_check_mark: No usernames were updated."));
}

#[test]
fn purge_pass_deactivates_only_departed_members() {
    let conn = crewboard_core::open_db_in_memory().unwrap();
    let store = SqliteEntityStore::try_new(&conn).unwrap();
    let platform = InMemoryPlatform::new();
    let present = seed(&store, 100, "alice", 2);
    let departed = seed(&store, 200, "bob", 3);
    platform.add_member(UserId(100), "alice");

    let report = ReconciliationService::new(&store, &platform)
        .run(ReconciliationMode::Purge)
        .unwrap();
    assert_eq!(report.purged(), 1);
    assert_eq!(report.unchanged(), 1);
    assert_eq!(
        report.render(),
        ":white_check_mark: The following employees were successfully purged:\nbob (200)"
    );

    let bob = store
        .find_employee(&Selector::Internal(departed), true)
        .unwrap()
        .unwrap();
    assert_eq!(bob.access_level, AccessLevel::DEACTIVATED);
    assert_eq!(bob.username, None);
    assert!(store
        .find_employee(&Selector::External(UserId(200)), false)
        .unwrap()
        .is_none());
    assert_eq!(store.access_level_of(UserId(200)).unwrap(), AccessLevel::DEACTIVATED);

    let alice = store
        .find_employee(&Selector::Internal(present), false)
        .unwrap()
        .unwrap();
    assert_eq!(alice.access_level, AccessLevel::saturating(2));
    assert_eq!(alice.username.as_deref(), Some("alice"));
}

#[test]
fn purge_with_nobody_missing_reports_no_purges() {
    let conn = crewboard_core::open_db_in_memory().unwrap();
    let store = SqliteEntityStore::try_new(&conn).unwrap();
    let platform = InMemoryPlatform::new();
    seed(&store, 1, "carol", 1);
    platform.add_member(UserId(1), "carol");

    let report = ReconciliationService::new(&store, &platform)
        .run(ReconciliationMode::Purge)
        .unwrap();
    assert_eq!(report.render(), ":white_check_mark: No employees were purged.");
}

type Outcomes = BTreeMap<UserId, (MemberOutcome, AccessLevel, Option<String>)>;

fn purge_in_insertion_order(order: &[u64]) -> Outcomes {
    let conn = crewboard_core::open_db_in_memory().unwrap();
    let store = SqliteEntityStore::try_new(&conn).unwrap();
    let platform = InMemoryPlatform::new();
    for &external in order {
        seed(&store, external, &format!("user-{external}"), 2);
    }
    platform.add_member(UserId(1), "user-1");
    platform.add_member(UserId(2), "user-2-renamed");

    let report = ReconciliationService::new(&store, &platform)
        .run(ReconciliationMode::Purge)
        .unwrap();
    report
        .members
        .into_iter()
        .map(|member| {
            let user = member.employee.external_id;
            let stored = store
                .find_employee(&Selector::External(user), true)
                .unwrap()
                .unwrap();
            (user, (member.outcome, stored.access_level, stored.username))
        })
        .collect()
}

#[test]
fn outcomes_do_not_depend_on_insertion_order() {
    let forward = purge_in_insertion_order(&[1, 2, 3, 4]);
    let reversed = purge_in_insertion_order(&[4, 3, 2, 1]);

    assert_eq!(forward.len(), 4);
    assert_eq!(forward, reversed);
    assert_eq!(forward[&UserId(1)].0, MemberOutcome::Unchanged);
    assert!(matches!(forward[&UserId(2)].0, MemberOutcome::Renamed { .. }));
    for departed in [UserId(3), UserId(4)] {
        assert_eq!(
            forward[&departed],
            (MemberOutcome::Purged, AccessLevel::DEACTIVATED, None)
        );
    }
}
