use anyhow::Result;

use crate::domain::StorageSummary;

use super::super::Container;

pub struct ListStoragesController<'a> {
    container: &'a Container,
}

impl<'a> ListStoragesController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn list(&self) -> Result<String> {
        let use_case = self.container.list_use_case();
        let storages = use_case.execute();
        Ok(self.format_storage_list(&storages, &use_case.supported_types()))
    }

    fn format_storage_list(&self, storages: &[StorageSummary], supported: &[String]) -> String {
        let mut output = if storages.is_empty() {
            "No storages configured.\n".to_string()
        } else {
            let mut output = "Configured storages:\n\n".to_string();
            for storage in storages {
                output.push_str(&format!("  {} ({})\n", storage.id, storage.storage_type));
                output.push_str(&format!(
                    "    Write mode: {}, Status: {}\n",
                    if storage.write_mode { "on" } else { "off" },
                    storage.status.as_str()
                ));
                output.push('\n');
            }
            output
        };

        output.push_str(&format!("Supported types: {}", supported.join(", ")));
        output
    }
}
