//! Pure access decisions over level pairs.

use crate::model::access::AccessLevel;
use std::fmt::{Display, Formatter};

/// True iff `actor >= required`.
pub fn can_execute(actor: AccessLevel, required: AccessLevel) -> bool {
    actor >= required
}

/// True iff `actor > target`.
pub fn can_set_level(actor: AccessLevel, target: AccessLevel) -> bool {
    actor > target
}

/// True iff the actor may move an existing employee from
/// `target_current` to `new_level`.
pub fn can_modify_existing(
    actor: AccessLevel,
    target_current: AccessLevel,
    new_level: AccessLevel,
    actor_is_target: bool,
) -> bool {
    evaluate_modification(actor, target_current, new_level, actor_is_target).is_ok()
}

/// Why a level change was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDenial {
    /// Actor is below the command's minimum level.
    InsufficientLevel {
        required: AccessLevel,
        actual: AccessLevel,
    },
    /// Requested level is equal to or above the actor's own.
    GrantAtOrAboveOwn {
        actor: AccessLevel,
        requested: AccessLevel,
    },
    /// Target already holds the actor's level.
    PeerLevel(AccessLevel),
    /// The privileged path cannot target the actor.
    SelfTarget,
}

impl Display for PolicyDenial {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientLevel { required, actual } => write!(
                f,
                "access level {actual} is below the required level {required}"
            ),
            Self::GrantAtOrAboveOwn { .. } => write!(
                f,
                "cannot set an employee to an equal or higher access level than your own"
            ),
            Self::PeerLevel(_) => write!(
                f,
                "cannot change the access level of someone with the same access level"
            ),
            Self::SelfTarget => write!(f, "cannot update yourself through this command"),
        }
    }
}

/// Level check for granting a level to a new employee.
pub fn evaluate_grant(actor: AccessLevel, requested: AccessLevel) -> Result<(), PolicyDenial> {
    if can_set_level(actor, requested) {
        Ok(())
    } else {
        Err(PolicyDenial::GrantAtOrAboveOwn { actor, requested })
    }
}

/// Level check for changing an existing employee, reporting the first
/// failed rule.
pub fn evaluate_modification(
    actor: AccessLevel,
    target_current: AccessLevel,
    new_level: AccessLevel,
    actor_is_target: bool,
) -> Result<(), PolicyDenial> {
    if actor_is_target {
        return Err(PolicyDenial::SelfTarget);
    }
    evaluate_grant(actor, new_level)?;
    if actor == target_current {
        return Err(PolicyDenial::PeerLevel(actor));
    }
    Ok(())
}
