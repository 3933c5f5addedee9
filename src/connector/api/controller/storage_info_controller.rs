use anyhow::Result;

use super::super::Container;

pub struct StorageInfoController<'a> {
    container: &'a Container,
}

impl<'a> StorageInfoController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn info(&self, storage_id: String) -> Result<String> {
        let info = self.container.info_use_case().execute(&storage_id)?;
        Ok(serde_json::to_string_pretty(&info)?)
    }
}
