//! Classification of PostgreSQL constraint errors.
//!
//! Constraint names follow the `uq_` (unique) and `ck_` (check) prefixes used
//! in `db/migrations`.

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE for `check_violation`.
const CHECK_VIOLATION: &str = "23514";

/// Constraint guarding one completion per (mission, account).
pub const UQ_COMPLETED_MISSION: &str = "uq_completed_missions_mission_account";

/// Constraint guarding mission key uniqueness.
pub const UQ_MISSION_KEY: &str = "uq_mission_keys_key";

pub const UQ_COHORT_NAME: &str = "uq_cohorts_name";

pub const UQ_ACCOUNT_USERNAME: &str = "uq_accounts_username";

/// Constraint capping a one-use key at a single use.
pub const CK_ONE_USE_KEY: &str = "ck_mission_keys_one_use";

/// Whether `err` is a unique violation on `constraint`.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    violates(err, UNIQUE_VIOLATION, constraint)
}

/// Whether `err` is a check violation on `constraint`.
pub fn is_check_violation(err: &sqlx::Error, constraint: &str) -> bool {
    violates(err, CHECK_VIOLATION, constraint)
}

fn violates(err: &sqlx::Error, code: &str, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some(code) && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_violations() {
        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err, UQ_COMPLETED_MISSION));
        assert!(!is_check_violation(&err, CK_ONE_USE_KEY));
    }
}
