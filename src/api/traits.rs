use crate::api::types::{
    Backup, CreateDatabaseRequest, CreateVdsRequest, Database, DbPreset, Disk, Finances, Group,
    OsImage, Server, VdsPreset,
};
use crate::error::ApiError;
use async_trait::async_trait;

#[async_trait]
pub trait TimewebApi: Send + Sync {
    async fn list_vds(&self) -> Result<Vec<Server>, ApiError>;
    /// `Ok(None)` when the server does not exist (404 or no object in the body).
    async fn get_vds(&self, id: u64) -> Result<Option<Server>, ApiError>;
    async fn start_vds(&self, id: u64) -> Result<(), ApiError>;
    async fn stop_vds(&self, id: u64) -> Result<(), ApiError>;
    /// Returns the id of the new server.
    async fn clone_vds(&self, id: u64) -> Result<u64, ApiError>;
    async fn remove_vds(&self, id: u64) -> Result<(), ApiError>;
    /// Returns the id of the new server.
    async fn create_vds(&self, request: &CreateVdsRequest) -> Result<u64, ApiError>;
    async fn list_groups(&self) -> Result<Vec<Group>, ApiError>;

    async fn list_databases(&self) -> Result<Vec<Database>, ApiError>;
    /// `Ok(None)` when the database does not exist.
    async fn get_database(&self, id: u64) -> Result<Option<Database>, ApiError>;
    async fn create_database(&self, request: &CreateDatabaseRequest) -> Result<u64, ApiError>;

    async fn list_disks(&self, vds_id: u64) -> Result<Vec<Disk>, ApiError>;
    async fn list_backups(&self, vds_id: u64, disk_id: u64) -> Result<Vec<Backup>, ApiError>;
    async fn create_backup(
        &self,
        vds_id: u64,
        disk_id: u64,
        comment: Option<&str>,
    ) -> Result<(), ApiError>;
    async fn remove_backup(&self, vds_id: u64, disk_id: u64, backup_id: u64)
    -> Result<(), ApiError>;

    async fn get_balance(&self) -> Result<Finances, ApiError>;
    async fn list_os(&self) -> Result<Vec<OsImage>, ApiError>;
    async fn list_vds_presets(&self) -> Result<Vec<VdsPreset>, ApiError>;
    async fn list_db_presets(&self) -> Result<Vec<DbPreset>, ApiError>;
}
