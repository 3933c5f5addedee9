use anyhow::Result;

use crate::cli::Commands;

use super::container::Container;
use super::controller::{ListStoragesController, OperationsController, StorageInfoController};

/// Dispatches one-shot CLI commands. `Commands::Mcp` is served by `main`.
pub struct Router<'a> {
    list_storages_controller: ListStoragesController<'a>,
    storage_info_controller: StorageInfoController<'a>,
    operations_controller: OperationsController<'a>,
}

impl<'a> Router<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self {
            list_storages_controller: ListStoragesController::new(container),
            storage_info_controller: StorageInfoController::new(container),
            operations_controller: OperationsController::new(container),
        }
    }

    pub async fn route(&self, command: Commands) -> Result<String> {
        match command {
            Commands::List => self.list_storages_controller.list().await,
            Commands::Info { storage_id } => self.storage_info_controller.info(storage_id).await,
            Commands::Query {
                storage_id,
                query,
                params,
            } => self.operations_controller.query(storage_id, query, params).await,
            Commands::Execute {
                storage_id,
                operation,
                params,
            } => {
                self.operations_controller
                    .execute(storage_id, operation, params)
                    .await
            }
            Commands::Collections { storage_id, schema } => {
                self.operations_controller.collections(storage_id, schema).await
            }
            Commands::Describe {
                storage_id,
                collection,
                schema,
            } => {
                self.operations_controller
                    .describe(storage_id, collection, schema)
                    .await
            }
            Commands::Mcp { .. } => anyhow::bail!("The mcp command is handled by the server entry point"),
        }
    }
}
