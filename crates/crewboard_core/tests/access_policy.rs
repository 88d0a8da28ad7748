use crewboard_core::policy::access_policy::{
    can_execute, can_modify_existing, can_set_level, evaluate_modification, PolicyDenial,
};
use crewboard_core::policy::command::{authorize, CommandKind};
use crewboard_core::AccessLevel;

#[test]
fn can_set_level_is_strictly_greater_for_every_pair() {
    for actor in AccessLevel::all() {
        for target in AccessLevel::all() {
            assert_eq!(
                can_set_level(actor, target),
                actor.value() > target.value(),
                "actor={actor} target={target}"
            );
        }
    }
}

#[test]
fn peers_can_never_modify_each_other() {
    for actor in AccessLevel::all() {
        for new_level in AccessLevel::all() {
            for actor_is_target in [false, true] {
                assert!(!can_modify_existing(actor, actor, new_level, actor_is_target));
            }
        }
    }
}

#[test]
fn self_target_is_always_denied() {
    for actor in AccessLevel::all() {
        for current in AccessLevel::all() {
            for new_level in AccessLevel::all() {
                assert_eq!(
                    evaluate_modification(actor, current, new_level, true),
                    Err(PolicyDenial::SelfTarget)
                );
            }
        }
    }
}

#[test]
fn modification_matches_conjunction_of_rules() {
    for actor in AccessLevel::all() {
        for current in AccessLevel::all() {
            for new_level in AccessLevel::all() {
                let expected = can_set_level(actor, new_level) && actor != current;
                assert_eq!(can_modify_existing(actor, current, new_level, false), expected);
            }
        }
    }
}

#[test]
fn command_levels_follow_catalogue() {
    let level = AccessLevel::saturating;
    assert_eq!(CommandKind::ExecQuery.required_level(), level(5));
    assert_eq!(CommandKind::RegisterEmployee.required_level(), level(4));
    assert_eq!(CommandKind::EditProject.required_level(), level(3));
    assert_eq!(CommandKind::CreateTask.required_level(), level(2));

    for command in CommandKind::ALL {
        assert!(authorize(AccessLevel::MAX, command).is_ok());
        assert!(authorize(AccessLevel::DEACTIVATED, command).is_err());
        assert!(can_execute(command.required_level(), command.required_level()));
    }
}
