use crate::error::{Error, Result};
use crate::orm::media::{self, MediaType};
use crate::orm::posts;
use sea_orm::{entity::*, ConnectionTrait};
use std::fmt;
use std::str::FromStr;

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MediaType::try_from_value(&s.to_owned()).map_err(|_| Error::InvalidMediaType(s.to_owned()))
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_value())
    }
}

#[derive(Debug)]
pub struct NewMedia<'a> {
    pub post_id: i32,
    pub media_type: MediaType,
    pub url: &'a str,
}

pub async fn insert_new_media<C: ConnectionTrait>(db: &C, new: &NewMedia<'_>) -> Result<media::Model> {
    let item = media::ActiveModel {
        post_id: Set(new.post_id),
        media_type: Set(new.media_type),
        url: Set(new.url.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::debug!("insert_new_media: {} {} on post {}", item.media_type, item.id, item.post_id);
    Ok(item)
}

pub async fn get_post_of_media<C: ConnectionTrait>(
    db: &C,
    item: &media::Model,
) -> Result<Option<posts::Model>> {
    Ok(item.find_related(posts::Entity).one(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds() {
        assert_eq!("image".parse::<MediaType>().unwrap(), MediaType::Image);
        assert_eq!("video".parse::<MediaType>().unwrap(), MediaType::Video);
        assert_eq!(MediaType::Video.to_string(), "video");
    }

    #[test]
    fn rejects_unknown_kinds() {
        assert!(matches!(
            "audio".parse::<MediaType>(),
            Err(Error::InvalidMediaType(kind)) if kind == "audio"
        ));
        assert!("Image".parse::<MediaType>().is_err());
    }
}
