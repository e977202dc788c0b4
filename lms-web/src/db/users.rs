//! User lookups
//!
//! Users are created by the authentication subsystem; this service only
//! checks that a referenced user exists.

use lms_common::db::User;
use lms_common::Result;
use sqlx::{Executor, Sqlite};

pub async fn find_by_id<'e, E>(executor: E, user_id: i64) -> Result<Option<User>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let user = sqlx::query_as::<_, User>("SELECT id, username, email FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
    Ok(user)
}
