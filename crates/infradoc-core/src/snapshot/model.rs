//! Wire model of a collected infrastructure snapshot
//!
//! Field names follow the inventory service's JSON. Every collection defaults
//! to empty so that partial snapshots (a New Host collection only carries
//! instances and volume groups) deserialize unchanged.

use crate::model::DocumentKind;
use serde::{Deserialize, Serialize};

/// A block volume attached to an instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockVolume {
    pub id: String,
    pub display_name: String,
    pub size_in_gbs: f64,
    pub backup_policy_name: String,
}

/// Ingress or egress rule of a security list or NSG
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRule {
    pub direction: String,
    pub protocol: String,
    #[serde(default)]
    pub source_or_destination: Option<String>,
    #[serde(default)]
    pub ports: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    pub destination: String,
    pub target: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub rules: Vec<SecurityRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSecurityGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub rules: Vec<SecurityRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub rules: Vec<RouteRule>,
}

/// Everything collected about one compute instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceData {
    pub host_name: String,
    pub lifecycle_state: String,
    pub shape: String,
    pub ocpus: String,
    pub memory: String,
    pub os_name: String,
    pub boot_volume_gb: String,
    #[serde(default)]
    pub boot_volume_id: Option<String>,
    pub private_ip: String,
    #[serde(default)]
    pub public_ip: Option<String>,
    pub backup_policy_name: String,
    #[serde(default)]
    pub block_volumes: Vec<BlockVolume>,
    #[serde(default)]
    pub security_lists: Vec<SecurityList>,
    #[serde(default)]
    pub network_security_groups: Vec<NetworkSecurityGroup>,
    #[serde(default)]
    pub route_table: Option<RouteTable>,
    pub compartment_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetData {
    pub id: String,
    pub display_name: String,
    pub cidr_block: String,
}

/// Local peering gateway inside a VCN
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalPeeringGateway {
    pub id: String,
    pub display_name: String,
    pub lifecycle_state: String,
    pub peering_status: String,
    #[serde(default)]
    pub peering_status_details: Option<String>,
    #[serde(default)]
    pub peer_id: Option<String>,
    #[serde(default)]
    pub route_table_id: Option<String>,
    #[serde(default)]
    pub peer_advertised_cidr: Option<String>,
    #[serde(default)]
    pub is_cross_tenancy_peering: bool,
    #[serde(default)]
    pub route_table_name: Option<String>,
}

/// Remote peering connection on a DRG
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePeeringConnection {
    pub id: String,
    pub display_name: String,
    pub lifecycle_state: String,
    pub peering_status: String,
    #[serde(default)]
    pub peering_status_details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrgAttachment {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub network_id: Option<String>,
    pub network_type: String,
    #[serde(default)]
    pub route_table_id: Option<String>,
    #[serde(default)]
    pub route_table_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcnData {
    pub id: String,
    pub display_name: String,
    pub cidr_block: String,
    #[serde(default)]
    pub subnets: Vec<SubnetData>,
    #[serde(default)]
    pub security_lists: Vec<SecurityList>,
    #[serde(default)]
    pub route_tables: Vec<RouteTable>,
    #[serde(default)]
    pub network_security_groups: Vec<NetworkSecurityGroup>,
    #[serde(rename = "lpgs", default)]
    pub local_peering_gateways: Vec<LocalPeeringGateway>,
}

/// Dynamic routing gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrgData {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub attachments: Vec<DrgAttachment>,
    #[serde(rename = "rpcs", default)]
    pub remote_peering_connections: Vec<RemotePeeringConnection>,
}

/// Customer-premises equipment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpeData {
    pub id: String,
    pub display_name: String,
    pub ip_address: String,
    #[serde(default)]
    pub vendor: Option<String>,
}

/// IKE parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseOneDetails {
    pub is_custom: bool,
    pub authentication_algorithm: String,
    pub encryption_algorithm: String,
    pub dh_group: String,
    pub lifetime_in_seconds: u64,
}

/// IPsec parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTwoDetails {
    pub is_custom: bool,
    #[serde(default)]
    pub authentication_algorithm: Option<String>,
    pub encryption_algorithm: String,
    pub lifetime_in_seconds: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgpSessionInfo {
    #[serde(default)]
    pub oracle_bgp_asn: Option<String>,
    #[serde(default)]
    pub customer_bgp_asn: Option<String>,
    #[serde(default)]
    pub oracle_interface_ip: Option<String>,
    #[serde(default)]
    pub customer_interface_ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelData {
    pub id: String,
    pub display_name: String,
    pub status: String,
    #[serde(default)]
    pub cpe_ip: Option<String>,
    #[serde(default)]
    pub vpn_oracle_ip: Option<String>,
    pub routing_type: String,
    pub ike_version: String,
    #[serde(default)]
    pub validation_status: Option<String>,
    #[serde(default)]
    pub validation_details: Option<String>,
    #[serde(default)]
    pub phase_one_details: Option<PhaseOneDetails>,
    #[serde(default)]
    pub phase_two_details: Option<PhaseTwoDetails>,
    #[serde(default)]
    pub bgp_session_info: Option<BgpSessionInfo>,
}

/// Site-to-site VPN connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpsecData {
    pub id: String,
    pub display_name: String,
    pub status: String,
    pub cpe_id: String,
    pub drg_id: String,
    #[serde(default)]
    pub static_routes: Vec<String>,
    #[serde(default)]
    pub tunnels: Vec<TunnelData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendData {
    pub name: String,
    pub ip_address: String,
    pub port: u16,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckerData {
    pub protocol: String,
    pub port: u16,
    #[serde(default)]
    pub url_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSetData {
    pub name: String,
    pub policy: String,
    pub health_checker: HealthCheckerData,
    #[serde(default)]
    pub backends: Vec<BackendData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerData {
    pub name: String,
    pub protocol: String,
    pub port: u16,
    pub default_backend_set_name: String,
    #[serde(default)]
    pub hostname_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostnameData {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerIpAddress {
    pub ip_address: String,
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerData {
    pub display_name: String,
    pub lifecycle_state: String,
    pub shape_name: String,
    #[serde(default)]
    pub ip_addresses: Vec<LoadBalancerIpAddress>,
    #[serde(default)]
    pub listeners: Vec<ListenerData>,
    #[serde(default)]
    pub backend_sets: Vec<BackendSetData>,
    #[serde(default)]
    pub hostnames: Vec<HostnameData>,
}

/// Backup and replication findings for a volume group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeGroupValidation {
    pub has_backup_policy: bool,
    #[serde(default)]
    pub policy_name: Option<String>,
    pub is_cross_region_replication_enabled: bool,
    #[serde(default)]
    pub cross_region_target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeGroupData {
    pub id: String,
    pub display_name: String,
    pub availability_domain: String,
    pub lifecycle_state: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub member_ids: Vec<String>,
    pub validation: VolumeGroupValidation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePoolData {
    pub name: String,
    pub shape: String,
    pub ocpus: f64,
    pub memory_in_gbs: f64,
    pub boot_volume_size_in_gbs: f64,
    pub os_image: String,
    pub node_count: u32,
    pub subnet_name: String,
}

/// OKE cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KubernetesClusterData {
    pub id: String,
    pub name: String,
    pub kubernetes_version: String,
    pub vcn_id: String,
    #[serde(default)]
    pub vcn_name: Option<String>,
    #[serde(default)]
    pub public_api_endpoint: Option<String>,
    #[serde(default)]
    pub private_api_endpoint: Option<String>,
    #[serde(default)]
    pub node_pools: Vec<NodePoolData>,
}

/// Result of one collection task, before cross-referencing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfrastructureSnapshot {
    #[serde(default)]
    pub instances: Vec<InstanceData>,
    #[serde(default)]
    pub vcns: Vec<VcnData>,
    #[serde(rename = "drgs", default)]
    pub dynamic_routing_gateways: Vec<DrgData>,
    #[serde(rename = "cpes", default)]
    pub customer_premises_equipment: Vec<CpeData>,
    #[serde(default)]
    pub ipsec_connections: Vec<IpsecData>,
    #[serde(default)]
    pub load_balancers: Vec<LoadBalancerData>,
    #[serde(default)]
    pub volume_groups: Vec<VolumeGroupData>,
    #[serde(default)]
    pub kubernetes_clusters: Vec<KubernetesClusterData>,
}

impl InfrastructureSnapshot {
    /// Whether anything relevant to `kind` was collected
    pub fn has_content_for(&self, kind: DocumentKind) -> bool {
        match kind {
            DocumentKind::NewHost => !self.instances.is_empty(),
            DocumentKind::FullInfra | DocumentKind::Kubernetes => {
                !self.instances.is_empty()
                    || !self.kubernetes_clusters.is_empty()
                    || !self.vcns.is_empty()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
            && self.vcns.is_empty()
            && self.dynamic_routing_gateways.is_empty()
            && self.customer_premises_equipment.is_empty()
            && self.ipsec_connections.is_empty()
            && self.load_balancers.is_empty()
            && self.volume_groups.is_empty()
            && self.kubernetes_clusters.is_empty()
    }
}
