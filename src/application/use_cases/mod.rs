mod list_storages;
mod storage_info;
mod storage_operations;

pub use list_storages::*;
pub use storage_info::*;
pub use storage_operations::*;
