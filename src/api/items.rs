//! Items, checklists and tasks.

use crate::error::Result;
use crate::models::journal::{
    GetItemsRequest, InsertItemRequest, InsertItemWithFieldsRequest, ItemData, TodayItems,
    UpdateCheckListRequest, UpdateItemRequest, UpdateTaskRequest,
};
use crate::models::request::RequestDescriptor;

use super::DailyApi;

const ITEMS: &str = "/api/item/get";
const TODAY: &str = "/api/item/today";
const INSERT: &str = "/api/item/insert";
const INSERT_WITH_FIELDS: &str = "/api/item/insertWithFields";
const UPDATE: &str = "/api/item/update";
const DELETE: &str = "/api/item/delete";
const CHECKLIST_TITLE: &str = "/api/item/field/checklist/title";
const CHECKLIST_FINISH: &str = "/api/item/field/checklist/finish";
const TASK_UPDATE: &str = "/api/item/task/update";
const TASK_CONNECT_BASE: &str = "/api/item/task/connectionBase";

impl DailyApi {
    /// Items of one type in a document. Empty when the server sends no list.
    pub async fn items(&self, request: &GetItemsRequest) -> Result<Vec<ItemData>> {
        let envelope = self.post_json(ITEMS, request).await?;
        Self::list(ITEMS, envelope)
    }

    /// Items for today across all documents.
    pub async fn today(&self) -> Result<TodayItems> {
        let envelope = self.envelope(RequestDescriptor::get(TODAY)).await?;
        match envelope.data {
            Some(data) if !data.is_null() => Ok(serde_json::from_value(data)?),
            _ => Ok(TodayItems::default()),
        }
    }

    pub async fn insert_item(&self, request: &InsertItemRequest) -> Result<bool> {
        let envelope = self.post_json(INSERT, request).await?;
        Ok(self.succeeded(&envelope))
    }

    /// Insert an item, overriding some of its default fields.
    pub async fn insert_item_with_fields(
        &self,
        request: &InsertItemWithFieldsRequest,
    ) -> Result<bool> {
        let envelope = self.post_json(INSERT_WITH_FIELDS, request).await?;
        Ok(self.succeeded(&envelope))
    }

    pub async fn update_item(&self, request: &UpdateItemRequest) -> Result<bool> {
        let envelope = self.post_json(UPDATE, request).await?;
        Ok(self.succeeded(&envelope))
    }

    pub async fn delete_item(&self, index: &str) -> Result<bool> {
        let request = RequestDescriptor::post(DELETE).query("index", index);
        let envelope = self.envelope(request).await?;
        Ok(self.succeeded(&envelope))
    }

    pub async fn update_checklist_title(&self, request: &UpdateCheckListRequest) -> Result<bool> {
        let envelope = self.post_json(CHECKLIST_TITLE, request).await?;
        Ok(self.succeeded(&envelope))
    }

    /// Mark a checklist entry as finished.
    pub async fn finish_checklist(&self, id: &str) -> Result<bool> {
        let envelope = self
            .post_json(CHECKLIST_FINISH, &serde_json::json!({ "id": id }))
            .await?;
        Ok(self.succeeded(&envelope))
    }

    /// Update a plan task. The server confirms with `data: true`.
    pub async fn update_task(&self, request: &UpdateTaskRequest) -> Result<bool> {
        let envelope = self.post_json(TASK_UPDATE, request).await?;
        Ok(Self::confirmed(&envelope))
    }

    /// Link a plan task to its base document.
    pub async fn connect_base(&self, task_id: &str) -> Result<bool> {
        let request = RequestDescriptor::post(TASK_CONNECT_BASE).query("taskId", task_id);
        let envelope = self.envelope(request).await?;
        Ok(Self::confirmed(&envelope))
    }
}
