use serde::{Deserialize, Serialize};

/// Status a VDS reports once it is running.
pub const VDS_STATUS_ON: &str = "on";
/// Status a VDS reports once it is stopped.
pub const VDS_STATUS_OFF: &str = "off";
/// Status a managed database reports once it is up.
pub const DB_STATUS_STARTED: &str = "started";

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ServerConfiguration {
    #[serde(default)]
    pub cpu: u32,
    /// Megabytes.
    #[serde(default)]
    pub ram: u64,
    /// Megabytes.
    #[serde(default)]
    pub disk_size: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Server {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub configuration: ServerConfiguration,
}

#[derive(Deserialize, Debug)]
pub struct ServersResponse {
    #[serde(default)]
    pub servers: Vec<Server>,
}

/// `{"server": {...}}`; a missing or null object means the server is gone.
#[derive(Deserialize, Debug)]
pub struct ServerResponse {
    #[serde(default)]
    pub server: Option<Server>,
}

#[derive(Deserialize, Debug)]
pub struct CreatedServer {
    pub id: u64,
}

#[derive(Deserialize, Debug)]
pub struct CreatedServerResponse {
    pub server: CreatedServer,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateVdsRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub os_id: u64,
    pub preset_id: u64,
    pub group_id: u64,
    pub is_local_network: bool,
}

#[derive(Serialize, Debug)]
pub struct CreateVdsBody<'a> {
    pub server: &'a CreateVdsRequest,
}

#[derive(Deserialize, Debug, Clone)]
#[allow(dead_code)]
pub struct Group {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize, Debug)]
pub struct GroupsResponse {
    #[serde(default)]
    pub groups: Vec<Group>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Database {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub db_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct DatabasesResponse {
    #[serde(default)]
    pub dbs: Vec<Database>,
}

#[derive(Deserialize, Debug)]
pub struct DatabaseResponse {
    #[serde(default)]
    pub db: Option<Database>,
}

#[derive(Deserialize, Debug)]
pub struct CreatedDatabase {
    pub id: u64,
}

#[derive(Deserialize, Debug)]
pub struct CreatedDatabaseResponse {
    pub db: CreatedDatabase,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateDatabaseRequest {
    pub name: String,
    pub login: String,
    pub password: String,
    #[serde(rename = "type")]
    pub db_type: String,
    pub hash_type: String,
    pub preset_id: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Finances {
    pub balance: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub hours_left: Option<u64>,
    #[serde(default)]
    pub monthly_cost: Option<f64>,
}

#[derive(Deserialize, Debug)]
pub struct FinancesResponse {
    pub finances: Finances,
}

#[derive(Deserialize, Debug, Clone)]
pub struct OsImage {
    pub id: u64,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Deserialize, Debug)]
pub struct OsListResponse {
    #[serde(default)]
    pub os_list: Vec<OsImage>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct VdsPreset {
    pub id: u64,
    #[serde(default)]
    pub description_short: String,
    pub price: f64,
    #[serde(default)]
    pub cpu: u32,
    #[serde(default)]
    pub ram: u64,
    #[serde(default)]
    pub disk: u64,
}

#[derive(Deserialize, Debug)]
pub struct VdsPresetsResponse {
    #[serde(default)]
    pub vds_presets: Vec<VdsPreset>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DbPreset {
    pub id: u64,
    #[serde(default)]
    pub description_short: String,
    pub price: f64,
    #[serde(rename = "type", default)]
    pub db_type: String,
}

#[derive(Deserialize, Debug)]
pub struct DbPresetsResponse {
    #[serde(default)]
    pub databases_presets: Vec<DbPreset>,
}

#[derive(Deserialize, Debug, Clone)]
#[allow(dead_code)]
pub struct Disk {
    pub id: u64,
    #[serde(default)]
    pub system_name: String,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub size: u64,
}

#[derive(Deserialize, Debug)]
pub struct DisksResponse {
    #[serde(default)]
    pub disks: Vec<Disk>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Backup {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Deserialize, Debug)]
pub struct BackupsResponse {
    #[serde(default)]
    pub backups: Vec<Backup>,
}

/// Human label for a VDS status, as shown in listings.
pub fn status_label(status: &str) -> &str {
    match status {
        VDS_STATUS_ON => "Running",
        VDS_STATUS_OFF => "Stopped",
        other => other,
    }
}

#[test]
fn test_servers_deserialization() {
    let servers_json = r#"
    {
        "servers": [
            {
                "id": 42,
                "name": "web-1",
                "status": "on",
                "ip": "185.10.10.10",
                "comment": "",
                "configuration": { "cpu": 2, "ram": 2048, "disk_size": 40960, "disk_type": "nvme" }
            },
            {
                "id": 43,
                "name": "web-2",
                "status": "installing",
                "ip": null,
                "configuration": { "cpu": 1, "ram": 1024, "disk_size": 15360 }
            }
        ],
        "meta": { "total": 2 }
    }
    "#;

    let response: ServersResponse = serde_json::from_str(servers_json).unwrap();
    assert_eq!(response.servers.len(), 2);
    assert_eq!(response.servers[0].id, 42);
    assert_eq!(response.servers[0].configuration.ram, 2048);
    assert_eq!(status_label(&response.servers[0].status), "Running");
    assert_eq!(response.servers[1].ip, None);
    assert_eq!(status_label(&response.servers[1].status), "installing");
}

#[test]
fn test_server_response_absence() {
    let present: ServerResponse =
        serde_json::from_str(r#"{"server": {"id": 7, "status": "off"}}"#).unwrap();
    assert_eq!(present.server.unwrap().status, "off");

    let null: ServerResponse = serde_json::from_str(r#"{"server": null}"#).unwrap();
    assert!(null.server.is_none());

    let missing: ServerResponse = serde_json::from_str("{}").unwrap();
    assert!(missing.server.is_none());
}

#[test]
fn test_create_vds_body_serialization() {
    let request = CreateVdsRequest {
        name: "node".to_string(),
        comment: None,
        os_id: 47,
        preset_id: 1801,
        group_id: 5,
        is_local_network: false,
    };
    let value = serde_json::to_value(CreateVdsBody { server: &request }).unwrap();
    assert_eq!(value["server"]["group_id"], 5);
    assert_eq!(value["server"]["os_id"], 47);
    assert!(value["server"].get("comment").is_none());
}

#[test]
fn test_backup_deserialization() {
    let backups: BackupsResponse = serde_json::from_str(
        r#"{"backups": [{"id": 9, "name": "b-9", "status": "done", "size": 1024,
            "created_at": "2024-03-01T10:00:00Z", "comment": "before upgrade"}]}"#,
    )
    .unwrap();
    assert_eq!(backups.backups[0].id, 9);
    assert_eq!(
        backups.backups[0]
            .created_at
            .unwrap()
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        "2024-03-01T10:00:00Z"
    );
}
