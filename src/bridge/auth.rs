//! Command authorization.

use crate::common::error::CommandError;
use crate::common::types::UserId;
use crate::store::Settings;

/// Who may invoke a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Anyone (greeting and help).
    Public,
    /// Owner or any listed admin.
    Admin,
    /// Only the owner.
    Owner,
}

/// The owner is always an admin, listed or not.
pub fn is_admin(actor: UserId, settings: &Settings) -> bool {
    is_owner(actor, settings) || settings.admins.contains(&actor)
}

pub fn is_owner(actor: UserId, settings: &Settings) -> bool {
    actor == settings.owner_id
}

/// Check `actor` against `tier`, returning the rejection to show on failure.
pub fn authorize(tier: Tier, actor: UserId, settings: &Settings) -> Result<(), CommandError> {
    match tier {
        Tier::Public => Ok(()),
        Tier::Admin if is_admin(actor, settings) => Ok(()),
        Tier::Admin => Err(CommandError::Unauthorized),
        Tier::Owner if is_owner(actor, settings) => Ok(()),
        Tier::Owner => Err(CommandError::OwnerOnly),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        let mut settings = Settings::new(1);
        settings.admins = vec![2];
        settings
    }

    #[test]
    fn test_owner_is_implicit_admin() {
        let settings = settings();
        assert!(!settings.admins.contains(&1));
        assert!(is_admin(1, &settings));
        assert!(is_owner(1, &settings));
    }

    #[test]
    fn test_listed_admin_is_not_owner() {
        let settings = settings();
        assert!(is_admin(2, &settings));
        assert!(!is_owner(2, &settings));
    }

    #[test]
    fn test_stranger_has_no_power() {
        let settings = settings();
        assert!(!is_admin(3, &settings));
        assert!(!is_owner(3, &settings));
    }

    #[test]
    fn test_authorize_tiers() {
        let settings = settings();
        assert!(authorize(Tier::Public, 3, &settings).is_ok());
        assert!(authorize(Tier::Admin, 2, &settings).is_ok());
        assert!(matches!(
            authorize(Tier::Admin, 3, &settings),
            Err(CommandError::Unauthorized)
        ));
        assert!(authorize(Tier::Owner, 1, &settings).is_ok());
        assert!(matches!(
            authorize(Tier::Owner, 2, &settings),
            Err(CommandError::OwnerOnly)
        ));
    }
}
