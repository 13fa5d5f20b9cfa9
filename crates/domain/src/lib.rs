//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod datetime;
mod ownership;
mod policy;
mod privilege;
mod query;
mod schema;

pub use datetime::{
    CONVERTED_DATETIME_FORMAT, DEFAULT_DATETIME_FIELD, STORED_DATETIME_FORMAT,
    convert_row_datetimes, convert_rows_datetimes, convert_utc_datetime, parse_time_zone,
};
pub use ownership::OwnershipQueryResult;
pub use policy::{GroupAcl, PolicySnapshot};
pub use privilege::{
    FieldBlacklist, PrivilegeRecord, PrivilegeTable, TablePrivilege, join_list_value,
    split_list_value,
};
pub use query::{
    ColumnRef, ColumnSelection, CompareOperator, DeleteQuery, InsertOutcome, InsertQuery, Join,
    JoinKind, OrderBy, Predicate, Query, QueryOutcome, Row, SelectQuery, SortDirection,
    UpdateQuery, first_composite_value,
};
pub use schema::{ACTIVE_COLUMN, ActiveState, DEFAULT_PRIMARY_KEY, SchemaCatalog, TableSchema};
