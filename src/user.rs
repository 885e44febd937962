use crate::error::Result;
use crate::orm::{comments, media, posts, users};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sea_orm::{
    entity::*, query::*, sea_query::Query, ConnectionTrait, DatabaseConnection, TransactionTrait,
};
use serde_json::{json, Value};

/// Fields required to register a user. `password` is the plaintext; it is
/// hashed before it reaches the database.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

impl users::Model {
    /// Public view of a user: `id` and `email` only.
    ///
    /// This is a hand-kept allow-list. Any field added to `users::Model`
    /// stays private unless it is written in here.
    pub fn serialize(&self) -> Value {
        json!({
            "id": self.id,
            "email": self.email,
        })
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Checks a plaintext password against the stored credential.
pub fn verify_password(user: &users::Model, password: &str) -> bool {
    match PasswordHash::new(&user.password) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::warn!("verify_password: user {} has unparsable hash: {}", user.id, e);
            false
        }
    }
}

pub async fn insert_new_user<C: ConnectionTrait>(db: &C, new: &NewUser<'_>) -> Result<users::Model> {
    let user = users::ActiveModel {
        email: Set(new.email.to_owned()),
        username: Set(new.username.to_owned()),
        password: Set(hash_password(new.password)?),
        ..Default::default() // is_active and created_at are filled by before_save
    }
    .insert(db)
    .await?;

    log::debug!("insert_new_user: created user {}", user.id);
    Ok(user)
}

pub async fn get_user_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<users::Model>> {
    Ok(users::Entity::find_by_id(id).one(db).await?)
}

pub async fn get_user_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<users::Model>> {
    Ok(users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await?)
}

pub async fn get_user_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<Option<users::Model>> {
    Ok(users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await?)
}

/// Returns the user's posts, oldest first.
pub async fn get_posts_for_user<C: ConnectionTrait>(
    db: &C,
    user: &users::Model,
) -> Result<Vec<posts::Model>> {
    Ok(user
        .find_related(posts::Entity)
        .order_by_asc(posts::Column::Id)
        .all(db)
        .await?)
}

/// Returns comments the user authored, on any post, oldest first.
pub async fn get_comments_for_user<C: ConnectionTrait>(
    db: &C,
    user: &users::Model,
) -> Result<Vec<comments::Model>> {
    Ok(user
        .find_related(comments::Entity)
        .order_by_asc(comments::Column::Id)
        .all(db)
        .await?)
}

/// Deletes a user and everything hanging off it in one transaction.
/// Children go first so the result is the same with or without
/// foreign key cascades on the backend.
///
/// Returns false if no such user existed.
pub async fn delete_user(db: &DatabaseConnection, id: i32) -> Result<bool> {
    let txn = db.begin().await?;

    let owned_posts = Query::select()
        .column(posts::Column::Id)
        .from(posts::Entity)
        .and_where(posts::Column::UserId.eq(id))
        .to_owned();

    let removed_media = media::Entity::delete_many()
        .filter(media::Column::PostId.in_subquery(owned_posts.to_owned()))
        .exec(&txn)
        .await?;

    let removed_comments = comments::Entity::delete_many()
        .filter(
            Condition::any()
                .add(comments::Column::PostId.in_subquery(owned_posts))
                .add(comments::Column::UserId.eq(id)),
        )
        .exec(&txn)
        .await?;

    let removed_posts = posts::Entity::delete_many()
        .filter(posts::Column::UserId.eq(id))
        .exec(&txn)
        .await?;

    let user = users::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    log::debug!(
        "delete_user: user {} removed {} posts, {} comments, {} media",
        id,
        removed_posts.rows_affected,
        removed_comments.rows_affected,
        removed_media.rows_affected
    );
    Ok(user.rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_user() -> users::Model {
        users::Model {
            id: 7,
            email: "a@b.com".to_owned(),
            username: "ab".to_owned(),
            password: "secret".to_owned(),
            is_active: true,
            created_at: NaiveDate::from_ymd_opt(2022, 5, 1)
                .and_then(|d| d.and_hms_opt(12, 0, 0))
                .unwrap(),
        }
    }

    #[test]
    fn serialize_exposes_only_id_and_email() {
        let value = sample_user().serialize();
        assert_eq!(value, json!({ "id": 7, "email": "a@b.com" }));

        let map = value.as_object().unwrap();
        assert_eq!(map.len(), 2);
        assert!(!map.contains_key("password"));
        assert!(!map.contains_key("username"));
    }

    #[test]
    fn password_round_trip() {
        let mut user = sample_user();
        user.password = hash_password("hunter2").unwrap();
        assert_ne!(user.password, "hunter2");
        assert!(verify_password(&user, "hunter2"));
        assert!(!verify_password(&user, "hunter3"));
    }

    #[test]
    fn debug_output_redacts_password() {
        let mut user = sample_user();
        user.password = hash_password("hunter2").unwrap();
        let printed = format!("{:?}", user);
        assert!(printed.contains("[redacted]"), "{}", printed);
        assert!(!printed.contains(&user.password));
        assert!(printed.contains("a@b.com"));
    }

    #[test]
    fn unhashed_credential_never_verifies() {
        assert!(!verify_password(&sample_user(), "secret"));
    }
}
