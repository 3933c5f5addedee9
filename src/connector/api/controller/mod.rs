pub mod list_storages_controller;
pub mod operations_controller;
pub mod storage_info_controller;

pub use list_storages_controller::ListStoragesController;
pub use operations_controller::OperationsController;
pub use storage_info_controller::StorageInfoController;
