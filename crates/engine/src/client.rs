//! Container engine API abstraction.
//!
//! The [`EngineClient`] trait abstracts the bollard Docker API, allowing
//! production code to use [`BollardEngineClient`] while tests use in-memory
//! fakes.
//!
//! ```text
//!   CLI commands ──► EngineClient (trait)
//!                      │        │
//!                      ▼        ▼
//!                 Bollard     Mock
//!                      │
//!                      ▼
//!               Engine daemon
//! ```
//!
//! # Identifier validation
//!
//! Methods that accept a container ID or name validate it before calling the
//! API: 1-128 characters, starting with an ASCII alphanumeric, followed by
//! alphanumerics, `_`, `.` or `-`. Hex IDs (full or prefix) and container
//! names both pass; anything that could be read as a flag or path does not.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::TryStreamExt;
use tracing::{debug, info, warn};

use scoutpost_core::types::{ContainerInfo, ImageInfo, NetworkInfo, VolumeInfo, short_id};

use crate::config::EngineClientConfig;
use crate::container::ContainerSpec;
use crate::error::EngineClientError;

/// Maximum container ID / name length.
const MAX_IDENTIFIER_LEN: usize = 128;

/// Validates a container ID or name.
pub(crate) fn validate_container_name(id: &str) -> Result<(), EngineClientError> {
    let reject = |reason: &str| EngineClientError::InvalidIdentifier {
        id: id.to_owned(),
        reason: reason.to_owned(),
    };

    if id.is_empty() || id.len() > MAX_IDENTIFIER_LEN {
        return Err(reject("length must be 1-128"));
    }
    if !id.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err(reject("must start with an alphanumeric character"));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(reject("may only contain [a-zA-Z0-9_.-]"));
    }
    Ok(())
}

/// Trait abstracting container engine operations.
///
/// The trait is `Send + Sync + 'static`, allowing a client to be shared
/// across tasks behind an `Arc`.
///
/// # Error Handling
///
/// - **404 responses**: [`EngineClientError::NotFound`]
/// - **Unreachable daemon**: [`EngineClientError::Connection`]
/// - **Other API failures**: [`EngineClientError::Api`]
pub trait EngineClient: Send + Sync + 'static {
    /// Lists containers; stopped ones are included when `all` is set.
    fn list_containers(
        &self,
        all: bool,
    ) -> impl Future<Output = Result<Vec<ContainerInfo>, EngineClientError>> + Send;

    /// Inspects a container by ID or name.
    fn inspect_container(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<ContainerInfo, EngineClientError>> + Send;

    /// Creates a container and returns its ID. The container is not started.
    fn create_container(
        &self,
        spec: &ContainerSpec,
    ) -> impl Future<Output = Result<String, EngineClientError>> + Send;

    /// Starts a created or stopped container.
    fn start_container(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<(), EngineClientError>> + Send;

    /// Stops a container, killing it after `timeout_secs` (client default when `None`).
    fn stop_container(
        &self,
        id: &str,
        timeout_secs: Option<i64>,
    ) -> impl Future<Output = Result<(), EngineClientError>> + Send;

    /// Removes a container; `force` removes it even while running.
    fn remove_container(
        &self,
        id: &str,
        force: bool,
    ) -> impl Future<Output = Result<(), EngineClientError>> + Send;

    /// Lists local images.
    fn list_images(&self) -> impl Future<Output = Result<Vec<ImageInfo>, EngineClientError>> + Send;

    /// Pulls `repository:tag` and waits for the pull to finish.
    fn pull_image(
        &self,
        repository: &str,
        tag: &str,
    ) -> impl Future<Output = Result<(), EngineClientError>> + Send;

    /// Lists networks.
    fn list_networks(
        &self,
    ) -> impl Future<Output = Result<Vec<NetworkInfo>, EngineClientError>> + Send;

    /// Lists volumes.
    fn list_volumes(&self)
    -> impl Future<Output = Result<Vec<VolumeInfo>, EngineClientError>> + Send;

    /// Checks daemon connectivity.
    fn ping(&self) -> impl Future<Output = Result<(), EngineClientError>> + Send;

    /// Creates and starts a container, returning its ID.
    fn run_container(
        &self,
        spec: &ContainerSpec,
    ) -> impl Future<Output = Result<String, EngineClientError>> + Send {
        async move {
            let id = self.create_container(spec).await?;
            self.start_container(&id).await?;
            Ok(id)
        }
    }
}

/// Production client over the Docker Engine API.
///
/// Internally uses `Arc<bollard::Docker>` for sharing across tasks.
pub struct BollardEngineClient {
    docker: Arc<bollard::Docker>,
    default_stop_timeout_secs: i64,
}

impl BollardEngineClient {
    /// Connects to the engine and verifies the daemon answers a ping.
    ///
    /// An empty `socket` uses the platform default.
    ///
    /// # Errors
    ///
    /// Returns [`EngineClientError::Connection`] if the socket cannot be
    /// opened or the daemon does not respond.
    pub async fn connect(config: &EngineClientConfig) -> Result<Self, EngineClientError> {
        config.validate()?;

        let docker = if config.socket.is_empty() {
            bollard::Docker::connect_with_local_defaults()
                .map(|docker| docker.with_timeout(config.connect_timeout()))
        } else {
            bollard::Docker::connect_with_socket(
                &config.socket,
                config.connect_timeout_secs,
                bollard::API_DEFAULT_VERSION,
            )
        }
        .map_err(|e| EngineClientError::Connection(format!("failed to connect to engine: {e}")))?;

        let client = Self {
            docker: Arc::new(docker),
            default_stop_timeout_secs: config.default_stop_timeout_secs,
        };
        client.ping().await?;
        debug!(socket = %config.socket, "connected to container engine");
        Ok(client)
    }
}

/// Maps a bollard error, turning 404 responses into `NotFound`.
fn map_api_error(err: bollard::errors::Error, subject: &str, action: &str) -> EngineClientError {
    match err {
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        } => EngineClientError::NotFound(subject.to_owned()),
        other => EngineClientError::Api(format!("{action} failed: {other}")),
    }
}

fn port_protocol(typ: Option<&bollard::models::PortTypeEnum>) -> &'static str {
    use bollard::models::PortTypeEnum;

    match typ {
        Some(PortTypeEnum::UDP) => "udp",
        Some(PortTypeEnum::SCTP) => "sctp",
        _ => "tcp",
    }
}

fn format_summary_port(port: &bollard::models::Port) -> String {
    let proto = port_protocol(port.typ.as_ref());
    match port.public_port {
        Some(public) => format!(
            "{}:{}->{}/{}",
            port.ip.as_deref().unwrap_or("0.0.0.0"),
            public,
            port.private_port,
            proto
        ),
        None => format!("{}/{}", port.private_port, proto),
    }
}

fn format_port_map(ports: &bollard::models::PortMap) -> Vec<String> {
    let mut result = Vec::new();
    for (container_port, bindings) in ports {
        match bindings {
            Some(bindings) if !bindings.is_empty() => {
                for binding in bindings {
                    result.push(format!(
                        "{}:{}->{}",
                        binding.host_ip.as_deref().unwrap_or("0.0.0.0"),
                        binding.host_port.as_deref().unwrap_or(""),
                        container_port
                    ));
                }
            }
            _ => result.push(container_port.clone()),
        }
    }
    result.sort();
    result
}

impl EngineClient for BollardEngineClient {
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerInfo>, EngineClientError> {
        use bollard::container::ListContainersOptions;

        let options = ListContainersOptions::<String> {
            all,
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| EngineClientError::Api(format!("list containers failed: {e}")))?;

        Ok(containers
            .into_iter()
            .map(|container| {
                let name = container
                    .names
                    .as_ref()
                    .and_then(|names| names.first())
                    .map(|n| n.trim_start_matches('/').to_owned())
                    .unwrap_or_default();
                let ports = container
                    .ports
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .map(format_summary_port)
                    .collect();

                ContainerInfo {
                    id: short_id(container.id.as_deref().unwrap_or_default()),
                    name,
                    image: container.image.unwrap_or_default(),
                    status: container.status.unwrap_or_default(),
                    created: container.created.unwrap_or_default(),
                    ports,
                }
            })
            .collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerInfo, EngineClientError> {
        use bollard::container::InspectContainerOptions;

        validate_container_name(id)?;

        let details = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| map_api_error(e, &format!("container {id}"), "inspect container"))?;

        let status = details
            .state
            .and_then(|s| s.status)
            .map(|s| format!("{s:?}").to_lowercase())
            .unwrap_or_else(|| "unknown".to_owned());
        let created = details
            .created
            .as_deref()
            .and_then(|c| chrono::DateTime::parse_from_rfc3339(c).ok())
            .map(|c| c.timestamp())
            .unwrap_or_default();
        let ports = details
            .network_settings
            .and_then(|n| n.ports)
            .map(|p| format_port_map(&p))
            .unwrap_or_default();

        Ok(ContainerInfo {
            id: short_id(details.id.as_deref().unwrap_or_default()),
            name: details
                .name
                .map(|n| n.trim_start_matches('/').to_owned())
                .unwrap_or_default(),
            image: details.config.and_then(|c| c.image).unwrap_or_default(),
            status,
            created,
            ports,
        })
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, EngineClientError> {
        use bollard::container::{Config, CreateContainerOptions};
        use bollard::models::{HostConfig, PortBinding};

        spec.validate()?;

        let bindings = spec.port_bindings()?;
        let exposed_ports: HashMap<String, HashMap<(), ()>> = bindings
            .keys()
            .map(|port| (port.clone(), HashMap::new()))
            .collect();
        let port_bindings: HashMap<String, Option<Vec<PortBinding>>> = bindings
            .into_iter()
            .map(|(port, host_port)| {
                (
                    port,
                    Some(vec![PortBinding {
                        host_ip: None,
                        host_port: Some(host_port.to_string()),
                    }]),
                )
            })
            .collect();

        let config = Config::<String> {
            image: Some(spec.image.to_string()),
            cmd: (!spec.command.is_empty()).then(|| spec.command.clone()),
            env: (!spec.environment.is_empty()).then(|| spec.env_list()),
            exposed_ports: (!exposed_ports.is_empty()).then_some(exposed_ports),
            host_config: Some(HostConfig {
                port_bindings: (!port_bindings.is_empty()).then_some(port_bindings),
                binds: (!spec.volumes.is_empty()).then(|| spec.bind_list()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let options = spec.name.as_ref().map(|name| CreateContainerOptions {
            name: name.clone(),
            platform: None,
        });

        let response = self
            .docker
            .create_container(options, config)
            .await
            .map_err(|e| map_api_error(e, &format!("image {}", spec.image), "create container"))?;

        for warning in &response.warnings {
            warn!(container_id = %response.id, warning = %warning, "engine warning on create");
        }
        info!(container_id = %response.id, image = %spec.image, "container created");
        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<(), EngineClientError> {
        validate_container_name(id)?;

        self.docker
            .start_container::<String>(id, None)
            .await
            .map_err(|e| map_api_error(e, &format!("container {id}"), "start container"))
    }

    async fn stop_container(
        &self,
        id: &str,
        timeout_secs: Option<i64>,
    ) -> Result<(), EngineClientError> {
        use bollard::container::StopContainerOptions;

        validate_container_name(id)?;

        let t = timeout_secs.unwrap_or(self.default_stop_timeout_secs);
        self.docker
            .stop_container(id, Some(StopContainerOptions { t }))
            .await
            .map_err(|e| map_api_error(e, &format!("container {id}"), "stop container"))
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<(), EngineClientError> {
        use bollard::container::RemoveContainerOptions;

        validate_container_name(id)?;

        self.docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force,
                    ..Default::default()
                }),
            )
            .await
            .map_err(|e| map_api_error(e, &format!("container {id}"), "remove container"))
    }

    async fn list_images(&self) -> Result<Vec<ImageInfo>, EngineClientError> {
        use bollard::image::ListImagesOptions;

        let images = self
            .docker
            .list_images(Some(ListImagesOptions::<String>::default()))
            .await
            .map_err(|e| EngineClientError::Api(format!("list images failed: {e}")))?;

        Ok(images
            .into_iter()
            .map(|image| ImageInfo {
                id: short_id(&image.id),
                tags: image.repo_tags,
                created: image.created,
                size: image.size,
            })
            .collect())
    }

    async fn pull_image(&self, repository: &str, tag: &str) -> Result<(), EngineClientError> {
        use bollard::image::CreateImageOptions;

        let options = CreateImageOptions::<String> {
            from_image: repository.to_owned(),
            tag: tag.to_owned(),
            ..Default::default()
        };

        let progress: Vec<_> = self
            .docker
            .create_image(Some(options), None, None)
            .try_collect()
            .await
            .map_err(|e| map_api_error(e, &format!("image {repository}:{tag}"), "pull image"))?;

        if let Some(error) = progress.iter().find_map(|p| p.error.as_ref()) {
            return Err(EngineClientError::Api(format!(
                "pull image {repository}:{tag} failed: {error}"
            )));
        }

        info!(repository, tag, "image pulled");
        Ok(())
    }

    async fn list_networks(&self) -> Result<Vec<NetworkInfo>, EngineClientError> {
        let networks = self
            .docker
            .list_networks::<String>(None)
            .await
            .map_err(|e| EngineClientError::Api(format!("list networks failed: {e}")))?;

        Ok(networks
            .into_iter()
            .map(|network| {
                let mut containers: Vec<String> = network
                    .containers
                    .map(|c| c.into_keys().map(|id| short_id(&id)).collect())
                    .unwrap_or_default();
                containers.sort();
                NetworkInfo {
                    id: short_id(network.id.as_deref().unwrap_or_default()),
                    name: network.name.unwrap_or_default(),
                    driver: network.driver.unwrap_or_default(),
                    scope: network.scope.unwrap_or_default(),
                    containers,
                }
            })
            .collect())
    }

    async fn list_volumes(&self) -> Result<Vec<VolumeInfo>, EngineClientError> {
        let response = self
            .docker
            .list_volumes::<String>(None)
            .await
            .map_err(|e| EngineClientError::Api(format!("list volumes failed: {e}")))?;

        for warning in response.warnings.unwrap_or_default() {
            warn!(warning = %warning, "engine warning on volume list");
        }

        Ok(response
            .volumes
            .unwrap_or_default()
            .into_iter()
            .map(|volume| VolumeInfo {
                name: volume.name,
                driver: volume.driver,
                mountpoint: volume.mountpoint,
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), EngineClientError> {
        self.docker
            .ping()
            .await
            .map_err(|e| EngineClientError::Connection(format!("ping failed: {e}")))?;
        Ok(())
    }
}

/// 테스트용 Mock 엔진 클라이언트
///
/// 설정 가능한 응답을 반환하여 엔진 없이도 테스트할 수 있습니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockEngineClient {
    /// list_containers / inspect_container 응답
    pub containers: Vec<ContainerInfo>,
    /// list_images 응답
    pub images: Vec<ImageInfo>,
    /// 액션 호출 시 실패를 시뮬레이션할지 여부
    pub fail_actions: bool,
}

#[cfg(test)]
impl MockEngineClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_containers(mut self, containers: Vec<ContainerInfo>) -> Self {
        self.containers = containers;
        self
    }

    pub fn with_images(mut self, images: Vec<ImageInfo>) -> Self {
        self.images = images;
        self
    }

    pub fn with_failing_actions(mut self) -> Self {
        self.fail_actions = true;
        self
    }

    fn find(&self, id: &str) -> Result<&ContainerInfo, EngineClientError> {
        validate_container_name(id)?;
        self.containers
            .iter()
            .find(|c| c.id == id || c.name == id)
            .ok_or_else(|| EngineClientError::NotFound(format!("container {id}")))
    }

    fn action(&self, id: &str) -> Result<(), EngineClientError> {
        if self.fail_actions {
            return Err(EngineClientError::Api("mock failure".to_owned()));
        }
        self.find(id).map(|_| ())
    }
}

#[cfg(test)]
impl EngineClient for MockEngineClient {
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerInfo>, EngineClientError> {
        Ok(self
            .containers
            .iter()
            .filter(|c| all || c.status.starts_with("Up"))
            .cloned()
            .collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerInfo, EngineClientError> {
        self.find(id).cloned()
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, EngineClientError> {
        spec.validate()?;
        if self.fail_actions {
            return Err(EngineClientError::Api("mock failure".to_owned()));
        }
        Ok("0123456789ab".to_owned())
    }

    async fn start_container(&self, id: &str) -> Result<(), EngineClientError> {
        if self.fail_actions {
            return Err(EngineClientError::Api("mock failure".to_owned()));
        }
        validate_container_name(id)
    }

    async fn stop_container(
        &self,
        id: &str,
        _timeout_secs: Option<i64>,
    ) -> Result<(), EngineClientError> {
        self.action(id)
    }

    async fn remove_container(&self, id: &str, _force: bool) -> Result<(), EngineClientError> {
        self.action(id)
    }

    async fn list_images(&self) -> Result<Vec<ImageInfo>, EngineClientError> {
        Ok(self.images.clone())
    }

    async fn pull_image(&self, repository: &str, tag: &str) -> Result<(), EngineClientError> {
        if self.fail_actions {
            return Err(EngineClientError::NotFound(format!("image {repository}:{tag}")));
        }
        Ok(())
    }

    async fn list_networks(&self) -> Result<Vec<NetworkInfo>, EngineClientError> {
        Ok(Vec::new())
    }

    async fn list_volumes(&self) -> Result<Vec<VolumeInfo>, EngineClientError> {
        Ok(Vec::new())
    }

    async fn ping(&self) -> Result<(), EngineClientError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoutpost_core::types::ImageReference;

    fn sample_container() -> ContainerInfo {
        ContainerInfo {
            id: "abc123def456".to_owned(),
            name: "web-server".to_owned(),
            image: "nginx:latest".to_owned(),
            status: "Up 5 minutes".to_owned(),
            created: 1_700_000_000,
            ports: vec!["0.0.0.0:8080->80/tcp".to_owned()],
        }
    }

    fn exited_container() -> ContainerInfo {
        ContainerInfo {
            id: "fed987cba654".to_owned(),
            name: "migrate".to_owned(),
            image: "app:1.0".to_owned(),
            status: "Exited (0) 2 hours ago".to_owned(),
            created: 1_700_000_100,
            ports: vec![],
        }
    }

    #[test]
    fn validate_accepts_ids_and_names() {
        assert!(validate_container_name("abc123def456").is_ok());
        assert!(validate_container_name("web-server_1.blue").is_ok());
    }

    #[test]
    fn validate_rejects_flag_like_and_path_like_identifiers() {
        for id in ["", "-f", "../etc", "web server", "a;b", "/web"] {
            assert!(
                matches!(
                    validate_container_name(id),
                    Err(EngineClientError::InvalidIdentifier { .. })
                ),
                "accepted {id:?}"
            );
        }
    }

    #[test]
    fn validate_rejects_too_long_identifier() {
        let id = "a".repeat(MAX_IDENTIFIER_LEN + 1);
        assert!(validate_container_name(&id).is_err());
    }

    #[test]
    fn format_summary_port_with_and_without_binding() {
        use bollard::models::{Port, PortTypeEnum};

        let published = Port {
            ip: Some("127.0.0.1".to_owned()),
            private_port: 80,
            public_port: Some(8080),
            typ: Some(PortTypeEnum::TCP),
        };
        assert_eq!(format_summary_port(&published), "127.0.0.1:8080->80/tcp");

        let exposed = Port {
            ip: None,
            private_port: 53,
            public_port: None,
            typ: Some(PortTypeEnum::UDP),
        };
        assert_eq!(format_summary_port(&exposed), "53/udp");
    }

    #[test]
    fn format_port_map_is_sorted() {
        use bollard::models::PortBinding;

        let mut map = HashMap::new();
        map.insert(
            "443/tcp".to_owned(),
            Some(vec![PortBinding {
                host_ip: Some("0.0.0.0".to_owned()),
                host_port: Some("8443".to_owned()),
            }]),
        );
        map.insert("9000/tcp".to_owned(), None);
        assert_eq!(
            format_port_map(&map),
            vec!["0.0.0.0:8443->443/tcp", "9000/tcp"]
        );
    }

    #[tokio::test]
    async fn mock_list_filters_stopped_unless_all() {
        let client =
            MockEngineClient::new().with_containers(vec![sample_container(), exited_container()]);
        assert_eq!(client.list_containers(false).await.unwrap().len(), 1);
        assert_eq!(client.list_containers(true).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn mock_inspect_by_name_or_id() {
        let client = MockEngineClient::new().with_containers(vec![sample_container()]);
        assert_eq!(
            client.inspect_container("web-server").await.unwrap().id,
            "abc123def456"
        );
        assert_eq!(
            client.inspect_container("abc123def456").await.unwrap().name,
            "web-server"
        );
    }

    #[tokio::test]
    async fn mock_inspect_not_found() {
        let client = MockEngineClient::new();
        let err = client.inspect_container("nonexistent").await.unwrap_err();
        assert!(matches!(err, EngineClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn run_container_creates_then_starts() {
        let client = MockEngineClient::new();
        let spec = ContainerSpec::new(ImageReference::parse("nginx").unwrap());
        let id = client.run_container(&spec).await.unwrap();
        assert_eq!(id, "0123456789ab");
    }

    #[tokio::test]
    async fn run_container_propagates_create_failure() {
        let client = MockEngineClient::new().with_failing_actions();
        let spec = ContainerSpec::new(ImageReference::parse("nginx").unwrap());
        assert!(client.run_container(&spec).await.is_err());
    }

    #[tokio::test]
    async fn mock_failing_actions() {
        let client = MockEngineClient::new()
            .with_containers(vec![sample_container()])
            .with_failing_actions();
        assert!(client.stop_container("abc123def456", None).await.is_err());
        assert!(client.remove_container("abc123def456", true).await.is_err());
        assert!(client.pull_image("nginx", "latest").await.is_err());
    }

    #[tokio::test]
    async fn mock_list_images() {
        let client = MockEngineClient::new().with_images(vec![ImageInfo {
            id: "0123456789ab".to_owned(),
            tags: vec!["alpine:3.19".to_owned()],
            created: 1_700_000_000,
            size: 7_000_000,
        }]);
        let images = client.list_images().await.unwrap();
        assert_eq!(images[0].tags, vec!["alpine:3.19"]);
    }

    #[test]
    fn engine_client_impls_are_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<MockEngineClient>();
        assert_send_sync::<BollardEngineClient>();
    }
}
