//! Document types, documents, and miscellaneous resources.

use crate::error::Result;
use crate::models::journal::{AddDocsRequest, ContentData, ContentIdsRequest, DeleteDocsRequest, TypeData};
use crate::models::request::{RequestDescriptor, ResponseType};

use super::DailyApi;

const ALL_TYPES: &str = "/api/types/getAllTypes";
const DOCS_BY_TYPE: &str = "/api/types/getContentIdsByTypes";
const ADD_DOCS: &str = "/api/types/addDocs";
const DELETE_DOCS: &str = "/api/types/deleteDocs";
const BACKGROUND: &str = "/api/config/background";
const DOWNLOAD: &str = "/api/DownLoadFile";

impl DailyApi {
    /// Every document type.
    pub async fn all_types(&self) -> Result<Vec<TypeData>> {
        let envelope = self.envelope(RequestDescriptor::get(ALL_TYPES)).await?;
        Self::list(ALL_TYPES, envelope)
    }

    /// Documents belonging to one type.
    pub async fn docs_by_type(&self, request: &ContentIdsRequest) -> Result<Vec<ContentData>> {
        let envelope = self.post_json(DOCS_BY_TYPE, request).await?;
        Self::list(DOCS_BY_TYPE, envelope)
    }

    pub async fn add_docs(&self, request: &AddDocsRequest) -> Result<bool> {
        let envelope = self.post_json(ADD_DOCS, request).await?;
        Ok(Self::confirmed(&envelope))
    }

    pub async fn delete_docs(&self, request: &DeleteDocsRequest) -> Result<bool> {
        let envelope = self.post_json(DELETE_DOCS, request).await?;
        Ok(Self::confirmed(&envelope))
    }

    /// Background image URL, if one is configured.
    pub async fn background_url(&self) -> Result<Option<String>> {
        let envelope = self.envelope(RequestDescriptor::get(BACKGROUND)).await?;
        Ok(envelope
            .data
            .and_then(|d| d.as_str().map(str::to_string))
            .filter(|url| !url.is_empty()))
    }

    /// Download the journal database export.
    pub async fn download_file(&self) -> Result<Vec<u8>> {
        let request = RequestDescriptor::get(DOWNLOAD).response_type(ResponseType::Bytes);
        Ok(self.gateway.execute(request).await?.into_bytes())
    }
}
