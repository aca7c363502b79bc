//! Journal payloads: documents, items, checklists and tasks.
//!
//! Identifiers travel as strings on the wire to avoid precision loss on
//! 64-bit ids.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
    pub index: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub expand: String,
}

/// Items shown on the "today" view.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayItems {
    #[serde(default)]
    pub base_item: Vec<ItemData>,
    #[serde(default)]
    pub plan_item: Vec<ItemData>,
}

/// A document type (category).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeData {
    pub id: String,
    pub name: String,
}

/// A document belonging to a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentData {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetItemsRequest {
    pub docs_id: String,
    #[serde(rename = "type")]
    pub item_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertItemRequest {
    pub docs_id: String,
    #[serde(rename = "type")]
    pub item_type: String,
}

/// Insert an item overriding some of its default fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertItemWithFieldsRequest {
    pub docs_id: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateItemRequest {
    pub index: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateCheckListRequest {
    pub index: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub task_id: String,
    pub task_status: String,
    pub score: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDocsRequest {
    pub type_id: String,
    pub docs_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDocsRequest {
    pub docs_id: String,
}

/// Look up the documents of one type.
#[derive(Debug, Clone, Serialize)]
pub struct ContentIdsRequest {
    pub id: String,
}
