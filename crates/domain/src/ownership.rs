use std::collections::BTreeSet;

use serde_json::Value;
use tablegate_core::{Identity, UserId};

/// Owners of the rows a predicate matched, computed fresh for each decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnershipQueryResult {
    matched_rows: u64,
    owner_ids: BTreeSet<UserId>,
    unowned_rows: u64,
}

impl OwnershipQueryResult {
    /// Creates a result from already tallied counts.
    #[must_use]
    pub fn new(matched_rows: u64, owner_ids: BTreeSet<UserId>, unowned_rows: u64) -> Self {
        Self {
            matched_rows,
            owner_ids,
            unowned_rows,
        }
    }

    /// Tallies owner column values read from the matched rows.
    ///
    /// Null or non-integer owner values count as unowned rows.
    #[must_use]
    pub fn from_owner_values<'a>(values: impl IntoIterator<Item = Option<&'a Value>>) -> Self {
        let mut result = Self::default();
        for value in values {
            result.matched_rows += 1;
            match value.and_then(Value::as_i64) {
                Some(owner) => {
                    result.owner_ids.insert(UserId::new(owner));
                }
                None => result.unowned_rows += 1,
            }
        }
        result
    }

    /// Returns how many rows the predicate matched.
    #[must_use]
    pub fn matched_rows(&self) -> u64 {
        self.matched_rows
    }

    /// Returns the distinct owners of the matched rows.
    #[must_use]
    pub fn owner_ids(&self) -> &BTreeSet<UserId> {
        &self.owner_ids
    }

    /// Returns the owners as an ordered list.
    #[must_use]
    pub fn owner_id_list(&self) -> Vec<UserId> {
        self.owner_ids.iter().copied().collect()
    }

    /// Returns how many matched rows have no owner.
    #[must_use]
    pub fn unowned_rows(&self) -> u64 {
        self.unowned_rows
    }

    /// Returns whether every matched row belongs to the caller.
    ///
    /// Anonymous callers never own rows. Zero matched rows count as owned.
    #[must_use]
    pub fn is_exclusively_owned_by(&self, identity: &Identity) -> bool {
        let Some(user_id) = identity.current_user_id() else {
            return false;
        };

        self.unowned_rows == 0 && self.owner_ids.iter().all(|owner| *owner == user_id)
    }

    /// Returns whether the caller owns at least one matched row.
    #[must_use]
    pub fn includes_owner(&self, identity: &Identity) -> bool {
        identity
            .current_user_id()
            .is_some_and(|user_id| self.owner_ids.contains(&user_id))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tablegate_core::{GroupId, Identity, UserId};

    use super::OwnershipQueryResult;

    fn caller() -> Identity {
        Identity::authenticated(UserId::new(7), Some(GroupId::new(2)))
    }

    #[test]
    fn owner_values_are_tallied() {
        let values = [json!(7), json!(9), json!(7), json!(null)];
        let result = OwnershipQueryResult::from_owner_values(values.iter().map(Some));

        assert_eq!(result.matched_rows(), 4);
        assert_eq!(result.owner_id_list(), vec![UserId::new(7), UserId::new(9)]);
        assert_eq!(result.unowned_rows(), 1);
        assert!(result.includes_owner(&caller()));
        assert!(!result.is_exclusively_owned_by(&caller()));
    }

    #[test]
    fn unowned_rows_block_exclusive_ownership() {
        let values = [json!(7), json!(null)];
        let result = OwnershipQueryResult::from_owner_values(values.iter().map(Some));
        assert!(!result.is_exclusively_owned_by(&caller()));

        let missing = OwnershipQueryResult::from_owner_values([None]);
        assert_eq!(missing.unowned_rows(), 1);
    }

    #[test]
    fn anonymous_callers_own_nothing() {
        let anonymous = Identity::anonymous(Some(GroupId::new(2)));
        let empty = OwnershipQueryResult::default();

        assert!(empty.is_exclusively_owned_by(&caller()));
        assert!(!empty.is_exclusively_owned_by(&anonymous));
        assert!(!empty.includes_owner(&anonymous));
    }
}
