use super::{int_field, require_id, string_field, upstream_shape_error, FromGraph};
use crate::errors::ToolError;
use serde::Serialize;
use serde_json::Value;

pub const CREATIVE_FIELDS: &str = "id,name,title,body,image_hash,image_url,thumbnail_url,link_url,call_to_action_type,object_story_spec,status";

/// Creative copy lives either in top-level fields or inside
/// `object_story_spec.link_data`, depending on how the creative was made.
/// Both shapes collapse into the same record.
#[derive(Debug, Clone, Serialize)]
pub struct AdCreative {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_to_action_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl FromGraph for AdCreative {
    fn from_graph(value: &Value) -> Result<Self, ToolError> {
        let id = require_id(value, "ad creative")?;
        let story = value.get("object_story_spec");
        let link_data = story.and_then(|s| s.get("link_data"));
        let from_link = |key: &str| link_data.and_then(|l| string_field(l, key));
        Ok(Self {
            id,
            name: string_field(value, "name"),
            status: string_field(value, "status"),
            page_id: story.and_then(|s| string_field(s, "page_id")),
            headline: string_field(value, "title").or_else(|| from_link("name")),
            message: string_field(value, "body").or_else(|| from_link("message")),
            description: from_link("description"),
            link_url: string_field(value, "link_url").or_else(|| from_link("link")),
            call_to_action_type: string_field(value, "call_to_action_type").or_else(|| {
                link_data
                    .and_then(|l| l.get("call_to_action"))
                    .and_then(|c| string_field(c, "type"))
            }),
            image_hash: string_field(value, "image_hash").or_else(|| from_link("image_hash")),
            image_url: string_field(value, "image_url").or_else(|| from_link("picture")),
            thumbnail_url: string_field(value, "thumbnail_url"),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdImage {
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
}

impl FromGraph for AdImage {
    fn from_graph(value: &Value) -> Result<Self, ToolError> {
        let hash = string_field(value, "hash")
            .ok_or_else(|| upstream_shape_error("ad image", "missing 'hash'"))?;
        Ok(Self {
            hash,
            name: string_field(value, "name"),
            url: string_field(value, "url"),
            width: int_field(value, "width"),
            height: int_field(value, "height"),
        })
    }
}

impl AdImage {
    /// `POST /act_x/adimages` answers `{"images": {"<name>": {"hash", "url"}}}`.
    pub fn from_upload_response(value: &Value) -> Result<Vec<Self>, ToolError> {
        let images = value
            .get("images")
            .and_then(|v| v.as_object())
            .ok_or_else(|| upstream_shape_error("ad image upload", "missing 'images'"))?;
        let mut out = Vec::new();
        for (name, entry) in images {
            let mut image = AdImage::from_graph(entry)?;
            if image.name.is_none() {
                image.name = Some(name.clone());
            }
            out.push(image);
        }
        if out.is_empty() {
            return Err(upstream_shape_error("ad image upload", "no images returned"));
        }
        Ok(out)
    }
}
