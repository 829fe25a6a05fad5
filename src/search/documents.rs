//! Document operations / 文档操作

use super::IndexRegistry;
use crate::error::{Result, SearchError};
use crate::models::{Document, Fields};

fn check_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(SearchError::InvalidArgument("document id must not be empty".into()));
    }
    Ok(())
}

impl IndexRegistry {
    /// Index a document, replacing any previous document with the same ID / 添加文档
    pub fn add_document(&self, index: &str, id: &str, fields: &Fields) -> Result<()> {
        check_id(id)?;
        let handle = self.resolve(index)?;
        handle.index(id, fields)?;
        tracing::debug!("Document indexed: {}/{}", index, id);
        Ok(())
    }

    /// Same as [`add_document`](Self::add_document); the whole previous
    /// document is replaced, fields are never merged.
    pub fn update_document(&self, index: &str, id: &str, fields: &Fields) -> Result<()> {
        self.add_document(index, id, fields)
    }

    /// Delete by ID; unknown IDs are not an error / 删除文档
    pub fn delete_document(&self, index: &str, id: &str) -> Result<()> {
        check_id(id)?;
        let handle = self.resolve(index)?;
        handle.delete(id)?;
        tracing::debug!("Document deleted: {}/{}", index, id);
        Ok(())
    }

    pub fn get_document(&self, index: &str, id: &str) -> Result<Option<Document>> {
        check_id(id)?;
        let handle = self.resolve(index)?;
        Ok(handle.document(id)?.map(|fields| Document {
            id: id.to_string(),
            fields,
        }))
    }
}
