use crate::api::traits::TimewebApi;
use crate::api::types::{
    Backup, BackupsResponse, CreateDatabaseRequest, CreateVdsBody, CreateVdsRequest,
    CreatedDatabaseResponse, CreatedServerResponse, Database, DatabaseResponse, DatabasesResponse,
    DbPreset, DbPresetsResponse, Disk, DisksResponse, Finances, FinancesResponse, Group,
    GroupsResponse, OsImage, OsListResponse, Server, ServerResponse, ServersResponse, VdsPreset,
    VdsPresetsResponse,
};
use crate::auth::AuthContext;
use crate::config::REQUEST_TIMEOUT;
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::json;
use tracing::debug;

/// A client for the live Timeweb Cloud API. Every request carries the
/// bearer token of the `AuthContext` it was built from.
#[derive(Debug)]
pub struct LiveApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl LiveApiClient {
    pub fn new(base_url: &str, auth: &AuthContext) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let mut auth_value = HeaderValue::from_str(&auth.bearer())
            .map_err(|_| ApiError::InvalidHeader("invalid access token".to_string()))?;
        auth_value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth_value);
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request and decodes a successful JSON body.
    async fn fetch<T: serde::de::DeserializeOwned>(
        request: RequestBuilder,
        operation: &str,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let response_text = response.text().await?;
        debug!(%status, operation, "response received");

        if !status.is_success() {
            return Err(ApiError::RequestFailed {
                operation: operation.to_string(),
                status,
                body: response_text,
            });
        }

        serde_json::from_str::<T>(&response_text).map_err(|e| ApiError::Decode {
            operation: operation.to_string(),
            reason: e.to_string(),
        })
    }

    /// Like `fetch`, but a 404 becomes `Ok(None)`.
    async fn fetch_optional<T: serde::de::DeserializeOwned>(
        request: RequestBuilder,
        operation: &str,
    ) -> Result<Option<T>, ApiError> {
        match Self::fetch(request, operation).await {
            Ok(value) => Ok(Some(value)),
            Err(ApiError::RequestFailed { status, .. }) if status == StatusCode::NOT_FOUND => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// For mutating calls whose response body carries nothing we need.
    async fn send_action(request: RequestBuilder, operation: &str) -> Result<(), ApiError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(%status, operation, "action response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RequestFailed {
                operation: operation.to_string(),
                status,
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TimewebApi for LiveApiClient {
    async fn list_vds(&self) -> Result<Vec<Server>, ApiError> {
        let request = self.client.get(self.url("/api/v2/vds"));
        let response: ServersResponse = Self::fetch(request, "List servers").await?;
        Ok(response.servers)
    }

    async fn get_vds(&self, id: u64) -> Result<Option<Server>, ApiError> {
        let request = self.client.get(self.url(&format!("/api/v2/vds/{id}")));
        let response: Option<ServerResponse> =
            Self::fetch_optional(request, &format!("Get server {id}")).await?;
        Ok(response.and_then(|r| r.server))
    }

    async fn start_vds(&self, id: u64) -> Result<(), ApiError> {
        let request = self.client.post(self.url(&format!("/api/v1/vds/{id}/start")));
        Self::send_action(request, &format!("Start server {id}")).await
    }

    async fn stop_vds(&self, id: u64) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.url(&format!("/api/v1/vds/{id}/shutdown")));
        Self::send_action(request, &format!("Stop server {id}")).await
    }

    async fn clone_vds(&self, id: u64) -> Result<u64, ApiError> {
        let request = self.client.post(self.url(&format!("/api/v1/vds/{id}/clone")));
        let response: CreatedServerResponse =
            Self::fetch(request, &format!("Clone server {id}")).await?;
        Ok(response.server.id)
    }

    async fn remove_vds(&self, id: u64) -> Result<(), ApiError> {
        let request = self.client.delete(self.url(&format!("/api/v1/vds/{id}")));
        Self::send_action(request, &format!("Remove server {id}")).await
    }

    async fn create_vds(&self, create: &CreateVdsRequest) -> Result<u64, ApiError> {
        let request = self
            .client
            .post(self.url("/api/v1/vds"))
            .json(&CreateVdsBody { server: create });
        let response: CreatedServerResponse =
            Self::fetch(request, &format!("Create server '{}'", create.name)).await?;
        Ok(response.server.id)
    }

    async fn list_groups(&self) -> Result<Vec<Group>, ApiError> {
        let request = self.client.get(self.url("/api/v1/groups"));
        let response: GroupsResponse = Self::fetch(request, "List groups").await?;
        Ok(response.groups)
    }

    async fn list_databases(&self) -> Result<Vec<Database>, ApiError> {
        let request = self.client.get(self.url("/api/v1/dbs"));
        let response: DatabasesResponse = Self::fetch(request, "List databases").await?;
        Ok(response.dbs)
    }

    async fn get_database(&self, id: u64) -> Result<Option<Database>, ApiError> {
        let request = self.client.get(self.url(&format!("/api/v1/dbs/{id}")));
        let response: Option<DatabaseResponse> =
            Self::fetch_optional(request, &format!("Get database {id}")).await?;
        Ok(response.and_then(|r| r.db))
    }

    async fn create_database(&self, create: &CreateDatabaseRequest) -> Result<u64, ApiError> {
        let request = self.client.post(self.url("/api/v1/dbs")).json(create);
        let response: CreatedDatabaseResponse =
            Self::fetch(request, &format!("Create database '{}'", create.name)).await?;
        Ok(response.db.id)
    }

    async fn list_disks(&self, vds_id: u64) -> Result<Vec<Disk>, ApiError> {
        let request = self
            .client
            .get(self.url(&format!("/api/v1/vds/{vds_id}/disks")));
        let response: DisksResponse =
            Self::fetch(request, &format!("List disks of server {vds_id}")).await?;
        Ok(response.disks)
    }

    async fn list_backups(&self, vds_id: u64, disk_id: u64) -> Result<Vec<Backup>, ApiError> {
        let request = self.client.get(self.url(&format!(
            "/api/v1/vds/{vds_id}/disks/{disk_id}/backups"
        )));
        let response: BackupsResponse =
            Self::fetch(request, &format!("List backups of server {vds_id}")).await?;
        Ok(response.backups)
    }

    async fn create_backup(
        &self,
        vds_id: u64,
        disk_id: u64,
        comment: Option<&str>,
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.url(&format!(
                "/api/v1/vds/{vds_id}/disks/{disk_id}/backups"
            )))
            .json(&json!({ "comment": comment.unwrap_or_default() }));
        Self::send_action(request, &format!("Create backup of server {vds_id}")).await
    }

    async fn remove_backup(
        &self,
        vds_id: u64,
        disk_id: u64,
        backup_id: u64,
    ) -> Result<(), ApiError> {
        let request = self.client.delete(self.url(&format!(
            "/api/v1/vds/{vds_id}/disks/{disk_id}/backups/{backup_id}"
        )));
        Self::send_action(request, &format!("Remove backup {backup_id}")).await
    }

    async fn get_balance(&self) -> Result<Finances, ApiError> {
        let request = self.client.get(self.url("/api/v1/accounts/finances"));
        let response: FinancesResponse = Self::fetch(request, "Get balance").await?;
        Ok(response.finances)
    }

    async fn list_os(&self) -> Result<Vec<OsImage>, ApiError> {
        let request = self.client.get(self.url("/api/v2/os/vds"));
        let response: OsListResponse = Self::fetch(request, "List OS images").await?;
        Ok(response.os_list)
    }

    async fn list_vds_presets(&self) -> Result<Vec<VdsPreset>, ApiError> {
        let request = self.client.get(self.url("/api/v2/presets/vds"));
        let response: VdsPresetsResponse = Self::fetch(request, "List server presets").await?;
        Ok(response.vds_presets)
    }

    async fn list_db_presets(&self) -> Result<Vec<DbPreset>, ApiError> {
        let request = self.client.get(self.url("/api/v1/presets/dbs"));
        let response: DbPresetsResponse = Self::fetch(request, "List database presets").await?;
        Ok(response.databases_presets)
    }
}

/// The account group new servers are placed in. A failed or empty lookup
/// is an error: creating a server without a group gets rejected anyway.
pub async fn resolve_group_id<T: TimewebApi + ?Sized>(api_client: &T) -> Result<u64, ApiError> {
    let groups = api_client
        .list_groups()
        .await
        .map_err(|e| ApiError::GroupLookup(e.to_string()))?;
    groups
        .first()
        .map(|group| group.id)
        .ok_or_else(|| ApiError::GroupLookup("account has no groups".to_string()))
}

/// The system disk of a server, which is what backups are taken of.
pub async fn system_disk_id<T: TimewebApi + ?Sized>(
    api_client: &T,
    vds_id: u64,
) -> Result<u64, ApiError> {
    let disks = api_client.list_disks(vds_id).await?;
    disks
        .iter()
        .find(|disk| disk.is_system)
        .or_else(|| disks.first())
        .map(|disk| disk.id)
        .ok_or_else(|| ApiError::Decode {
            operation: format!("List disks of server {vds_id}"),
            reason: "server has no disks".to_string(),
        })
}
