use super::*;

#[derive(Debug, PartialEq, Eq)]
pub(super) enum AddAdminOutcome {
    Added,
    AlreadyAdmin,
}

#[derive(Debug, PartialEq, Eq)]
pub(super) enum RemoveAdminOutcome {
    Removed,
    NotFound,
    Protected,
}

/// Known users and admins. The primary admin is always in `admins`.
#[derive(Clone, Debug)]
pub(super) struct Identities {
    primary_admin: i64,
    users: BTreeSet<i64>,
    admins: BTreeSet<i64>,
}

impl Identities {
    pub(super) fn new(primary_admin: i64, users: BTreeSet<i64>, mut admins: BTreeSet<i64>) -> Self {
        admins.insert(primary_admin);
        Identities {
            primary_admin,
            users,
            admins,
        }
    }

    pub(super) fn primary_admin(&self) -> i64 {
        self.primary_admin
    }

    pub(super) fn users(&self) -> &BTreeSet<i64> {
        &self.users
    }

    pub(super) fn admins(&self) -> &BTreeSet<i64> {
        &self.admins
    }

    pub(super) fn is_admin(&self, user_id: i64) -> bool {
        self.admins.contains(&user_id)
    }

    /// Returns true when the user was not known before.
    pub(super) fn record_user(&mut self, user_id: i64) -> bool {
        self.users.insert(user_id)
    }

    pub(super) fn add_admin(&mut self, user_id: i64) -> AddAdminOutcome {
        if self.admins.insert(user_id) {
            AddAdminOutcome::Added
        } else {
            AddAdminOutcome::AlreadyAdmin
        }
    }

    pub(super) fn remove_admin(&mut self, user_id: i64) -> RemoveAdminOutcome {
        if user_id == self.primary_admin {
            return RemoveAdminOutcome::Protected;
        }
        if self.admins.remove(&user_id) {
            RemoveAdminOutcome::Removed
        } else {
            RemoveAdminOutcome::NotFound
        }
    }
}
