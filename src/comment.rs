use crate::error::Result;
use crate::orm::{comments, posts, users};
use sea_orm::{entity::*, ConnectionTrait};

#[derive(Debug)]
pub struct NewComment<'a> {
    pub post_id: i32,
    pub user_id: i32,
    pub body: &'a str,
}

pub async fn insert_new_comment<C: ConnectionTrait>(
    db: &C,
    new: &NewComment<'_>,
) -> Result<comments::Model> {
    let comment = comments::ActiveModel {
        post_id: Set(new.post_id),
        user_id: Set(new.user_id),
        body: Set(new.body.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::debug!(
        "insert_new_comment: user {} commented {} on post {}",
        comment.user_id,
        comment.id,
        comment.post_id
    );
    Ok(comment)
}

pub async fn get_post_of_comment<C: ConnectionTrait>(
    db: &C,
    comment: &comments::Model,
) -> Result<Option<posts::Model>> {
    Ok(comment.find_related(posts::Entity).one(db).await?)
}

pub async fn get_author_of_comment<C: ConnectionTrait>(
    db: &C,
    comment: &comments::Model,
) -> Result<Option<users::Model>> {
    Ok(comment.find_related(users::Entity).one(db).await?)
}
