use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{GroupId, Identity, UserId};

/// Category of an authorization denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AclDenialKind {
    /// Group lacks `add` on the table.
    TableAddForbidden,
    /// Group lacks `edit` and the rows belong to the caller.
    TableEditForbidden,
    /// Group lacks `bigedit` and the rows are not exclusively the caller's.
    TableBigEditForbidden,
    /// Group lacks `delete` and the rows belong to the caller.
    TableDeleteForbidden,
    /// Group lacks `bigdelete` and the rows are not exclusively the caller's.
    TableBigDeleteForbidden,
    /// A written column is on the write blacklist.
    FieldWriteForbidden,
    /// A selected column is on the read blacklist.
    FieldReadForbidden,
}

impl AclDenialKind {
    /// Returns the privilege tier the caller attempted.
    #[must_use]
    pub fn tier(&self) -> &'static str {
        match self {
            Self::TableAddForbidden => "add",
            Self::TableEditForbidden => "edit",
            Self::TableBigEditForbidden => "bigedit",
            Self::TableDeleteForbidden => "delete",
            Self::TableBigDeleteForbidden => "bigdelete",
            Self::FieldWriteForbidden => "field_write_blacklist",
            Self::FieldReadForbidden => "field_read_blacklist",
        }
    }

    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TableAddForbidden => "table_add_forbidden",
            Self::TableEditForbidden => "table_edit_forbidden",
            Self::TableBigEditForbidden => "table_big_edit_forbidden",
            Self::TableDeleteForbidden => "table_delete_forbidden",
            Self::TableBigDeleteForbidden => "table_big_delete_forbidden",
            Self::FieldWriteForbidden => "field_write_forbidden",
            Self::FieldReadForbidden => "field_read_forbidden",
        }
    }
}

/// Typed authorization failure with the facts needed for an audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclDenial {
    kind: AclDenialKind,
    table: String,
    columns: Vec<String>,
    matched_rows: Option<u64>,
    owner_ids: Vec<UserId>,
    unowned_rows: u64,
    user_id: Option<UserId>,
    group_id: Option<GroupId>,
    message: String,
}

impl AclDenial {
    fn base(kind: AclDenialKind, identity: &Identity, table: &str) -> Self {
        Self {
            kind,
            table: table.to_owned(),
            columns: Vec::new(),
            matched_rows: None,
            owner_ids: Vec::new(),
            unowned_rows: 0,
            user_id: identity.current_user_id(),
            group_id: identity.group_id(),
            message: String::new(),
        }
    }

    /// Insert into a table without the `add` privilege.
    #[must_use]
    pub fn table_add(identity: &Identity, table: &str) -> Self {
        let mut denial = Self::base(AclDenialKind::TableAddForbidden, identity, table);
        denial.message = format!(
            "{}table add access forbidden on table `{table}`",
            identity.error_message_prefix()
        );
        denial
    }

    /// Big edit on a table that has no owner column.
    #[must_use]
    pub fn table_big_edit_without_owner_column(identity: &Identity, table: &str) -> Self {
        Self::big_without_owner_column(AclDenialKind::TableBigEditForbidden, identity, table)
    }

    /// Big delete on a table that has no owner column.
    #[must_use]
    pub fn table_big_delete_without_owner_column(identity: &Identity, table: &str) -> Self {
        Self::big_without_owner_column(AclDenialKind::TableBigDeleteForbidden, identity, table)
    }

    /// Big edit over rows that are not exclusively owned by the caller.
    #[must_use]
    pub fn table_big_edit(
        identity: &Identity,
        table: &str,
        matched_rows: u64,
        owner_ids: Vec<UserId>,
        unowned_rows: u64,
    ) -> Self {
        Self::big_on_rows(
            AclDenialKind::TableBigEditForbidden,
            identity,
            table,
            matched_rows,
            owner_ids,
            unowned_rows,
        )
    }

    /// Big delete over rows that are not exclusively owned by the caller.
    #[must_use]
    pub fn table_big_delete(
        identity: &Identity,
        table: &str,
        matched_rows: u64,
        owner_ids: Vec<UserId>,
        unowned_rows: u64,
    ) -> Self {
        Self::big_on_rows(
            AclDenialKind::TableBigDeleteForbidden,
            identity,
            table,
            matched_rows,
            owner_ids,
            unowned_rows,
        )
    }

    /// Little edit of the caller's own rows without the `edit` privilege.
    #[must_use]
    pub fn table_edit(
        identity: &Identity,
        table: &str,
        matched_rows: u64,
        owner_ids: Vec<UserId>,
    ) -> Self {
        Self::little_on_rows(
            AclDenialKind::TableEditForbidden,
            identity,
            table,
            matched_rows,
            owner_ids,
        )
    }

    /// Little delete of the caller's own rows without the `delete` privilege.
    #[must_use]
    pub fn table_delete(
        identity: &Identity,
        table: &str,
        matched_rows: u64,
        owner_ids: Vec<UserId>,
    ) -> Self {
        Self::little_on_rows(
            AclDenialKind::TableDeleteForbidden,
            identity,
            table,
            matched_rows,
            owner_ids,
        )
    }

    /// Write to write-blacklisted columns.
    #[must_use]
    pub fn field_write(identity: &Identity, table: &str, columns: Vec<String>) -> Self {
        Self::field(AclDenialKind::FieldWriteForbidden, identity, table, columns)
    }

    /// Read of read-blacklisted columns.
    #[must_use]
    pub fn field_read(identity: &Identity, table: &str, columns: Vec<String>) -> Self {
        Self::field(AclDenialKind::FieldReadForbidden, identity, table, columns)
    }

    fn big_without_owner_column(kind: AclDenialKind, identity: &Identity, table: &str) -> Self {
        let mut denial = Self::base(kind, identity, table);
        denial.message = format!(
            "{}table {} access forbidden on table `{table}` (no owner column)",
            identity.error_message_prefix(),
            kind.tier()
        );
        denial
    }

    fn big_on_rows(
        kind: AclDenialKind,
        identity: &Identity,
        table: &str,
        matched_rows: u64,
        owner_ids: Vec<UserId>,
        unowned_rows: u64,
    ) -> Self {
        let mut denial = Self::base(kind, identity, table);
        let mut message = format!(
            "{}table {} access forbidden on {matched_rows} `{table}` record(s) and {} owner(s) (with ids {})",
            identity.error_message_prefix(),
            kind.tier(),
            owner_ids.len(),
            join_ids(&owner_ids)
        );
        if unowned_rows > 0 {
            message.push_str(&format!(", {unowned_rows} record(s) without owner"));
        }
        if identity.current_user_id().is_none() {
            message.push_str(", caller is not authenticated");
        }
        denial.message = message;
        denial.matched_rows = Some(matched_rows);
        denial.owner_ids = owner_ids;
        denial.unowned_rows = unowned_rows;
        denial
    }

    fn little_on_rows(
        kind: AclDenialKind,
        identity: &Identity,
        table: &str,
        matched_rows: u64,
        owner_ids: Vec<UserId>,
    ) -> Self {
        let mut denial = Self::base(kind, identity, table);
        let caller = identity
            .current_user_id()
            .map(|user_id| format!("#{user_id}"))
            .unwrap_or_else(|| "anonymous".to_owned());
        denial.message = format!(
            "{}table {} access forbidden on {matched_rows} `{table}` record(s) owned by the acting user ({caller})",
            identity.error_message_prefix(),
            kind.tier()
        );
        denial.matched_rows = Some(matched_rows);
        denial.owner_ids = owner_ids;
        denial
    }

    fn field(kind: AclDenialKind, identity: &Identity, table: &str, columns: Vec<String>) -> Self {
        let mut denial = Self::base(kind, identity, table);
        let access = match kind {
            AclDenialKind::FieldReadForbidden => "read",
            _ => "write",
        };
        denial.message = format!(
            "{}field {access} access forbidden on table `{table}` for column(s): {}",
            identity.error_message_prefix(),
            columns.join(", ")
        );
        denial.columns = columns;
        denial
    }

    /// Returns the denial category.
    #[must_use]
    pub fn kind(&self) -> AclDenialKind {
        self.kind
    }

    /// Returns the privilege tier the caller attempted.
    #[must_use]
    pub fn tier(&self) -> &'static str {
        self.kind.tier()
    }

    /// Returns the table the denied query targeted.
    #[must_use]
    pub fn table(&self) -> &str {
        self.table.as_str()
    }

    /// Returns the blacklisted columns the query touched.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of rows the predicate matched, for row-scoped tiers.
    #[must_use]
    pub fn matched_rows(&self) -> Option<u64> {
        self.matched_rows
    }

    /// Returns the distinct owner ids among the matched rows.
    #[must_use]
    pub fn owner_ids(&self) -> &[UserId] {
        &self.owner_ids
    }

    /// Returns how many matched rows had no owner.
    #[must_use]
    pub fn unowned_rows(&self) -> u64 {
        self.unowned_rows
    }

    /// Returns the acting user, if authenticated.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns the acting group, if any.
    #[must_use]
    pub fn group_id(&self) -> Option<GroupId> {
        self.group_id
    }

    /// Returns the human-readable explanation.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl Display for AclDenial {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.message.as_str())
    }
}

fn join_ids(ids: &[UserId]) -> String {
    ids.iter()
        .map(UserId::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
