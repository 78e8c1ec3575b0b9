//! Snapshot resolver
//!
//! Cross-references the independently fetched collections of a snapshot.
//! A reference that points at nothing in the snapshot becomes
//! [`Resolution::Unresolved`]; it never fails the snapshot. Only ambiguous
//! identities (two CPEs, DRGs or VCNs with the same id) are rejected.

use super::crypto::{CryptoAssessment, assess_tunnel};
use super::model::{
    CpeData, DrgData, InfrastructureSnapshot, IpsecData, KubernetesClusterData, VcnData,
};
use crate::error::ValidationError;
use crate::model::DocumentKind;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const NETWORK_TYPE_VCN: &str = "VCN";
const NETWORK_TYPE_RPC: &str = "REMOTE_PEERING_CONNECTION";
const NETWORK_TYPE_IPSEC: &str = "IPSEC_TUNNEL";

const CLIENT_PREFIX: &str = "SERVERS-";

/// Outcome of following one id reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Resolution {
    Resolved { id: String, display_name: String },
    /// The id names nothing in this snapshot
    Unresolved { id: String },
    /// No reference to follow
    Absent,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Resolution::Unresolved { .. })
    }

    /// Name to show, falling back to the raw id
    pub fn label(&self) -> &str {
        match self {
            Resolution::Resolved { display_name, .. } => display_name,
            Resolution::Unresolved { id } => id,
            Resolution::Absent => "N/A",
        }
    }
}

/// Resolved endpoints of one IPsec connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpsecLinks {
    pub connection_id: String,
    pub cpe: Resolution,
    pub drg: Resolution,
}

/// Resolved members of one volume group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeGroupLinks {
    pub group_id: String,
    pub members: Vec<(String, Resolution)>,
}

/// A reference that could not be followed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub owner: String,
    pub field: &'static str,
    pub target: String,
}

/// A snapshot whose references have been followed.
///
/// Immutable; render and export collaborators only get shared references.
#[derive(Debug, Clone)]
pub struct ValidatedSnapshot {
    snapshot: InfrastructureSnapshot,
    document_kind: DocumentKind,
    ipsec_links: Vec<IpsecLinks>,
    lpg_peers: HashMap<String, Resolution>,
    attachment_networks: HashMap<String, Resolution>,
    cluster_vcns: Vec<Resolution>,
    volume_groups: Vec<VolumeGroupLinks>,
    tunnel_crypto: HashMap<String, CryptoAssessment>,
    dangling: Vec<DanglingReference>,
}

impl ValidatedSnapshot {
    pub fn snapshot(&self) -> &InfrastructureSnapshot {
        &self.snapshot
    }

    pub fn document_kind(&self) -> DocumentKind {
        self.document_kind
    }

    /// Export gate for the active document kind.
    ///
    /// Kubernetes and Full Infra open on any instance, cluster or VCN, so a
    /// Kubernetes export may carry an empty [`Self::scoped`] view when no
    /// cluster was collected.
    pub fn is_export_ready(&self) -> bool {
        self.snapshot.has_content_for(self.document_kind)
    }

    pub fn ensure_export_ready(&self) -> Result<(), ValidationError> {
        if self.is_export_ready() {
            Ok(())
        } else {
            Err(ValidationError::NotExportReady(self.document_kind.to_string()))
        }
    }

    /// Links for each IPsec connection, in snapshot order
    pub fn ipsec_links(&self) -> &[IpsecLinks] {
        &self.ipsec_links
    }

    pub fn ipsec_cpe(&self, connection: &IpsecData) -> Option<&CpeData> {
        self.snapshot
            .customer_premises_equipment
            .iter()
            .find(|c| c.id == connection.cpe_id)
    }

    pub fn ipsec_drg(&self, connection: &IpsecData) -> Option<&DrgData> {
        self.snapshot
            .dynamic_routing_gateways
            .iter()
            .find(|d| d.id == connection.drg_id)
    }

    /// Peer of a local peering gateway, by LPG id
    pub fn lpg_peer(&self, lpg_id: &str) -> &Resolution {
        self.lpg_peers.get(lpg_id).unwrap_or(&Resolution::Absent)
    }

    /// Network behind a DRG attachment, by attachment id
    pub fn attachment_network(&self, attachment_id: &str) -> &Resolution {
        self.attachment_networks
            .get(attachment_id)
            .unwrap_or(&Resolution::Absent)
    }

    /// VCN of each Kubernetes cluster, in snapshot order
    pub fn cluster_vcns(&self) -> &[Resolution] {
        &self.cluster_vcns
    }

    pub fn volume_groups(&self) -> &[VolumeGroupLinks] {
        &self.volume_groups
    }

    pub fn tunnel_crypto(&self, tunnel_id: &str) -> Option<CryptoAssessment> {
        self.tunnel_crypto.get(tunnel_id).copied()
    }

    /// Every reference that pointed at nothing
    pub fn dangling_references(&self) -> &[DanglingReference] {
        &self.dangling
    }

    /// The part of the snapshot a document of this kind covers.
    ///
    /// Kubernetes documents only show clusters and the VCNs they use; New
    /// Host documents only instances and their volume groups.
    pub fn scoped(&self) -> InfrastructureSnapshot {
        match self.document_kind {
            DocumentKind::FullInfra => self.snapshot.clone(),
            DocumentKind::NewHost => InfrastructureSnapshot {
                instances: self.snapshot.instances.clone(),
                volume_groups: self.snapshot.volume_groups.clone(),
                ..Default::default()
            },
            DocumentKind::Kubernetes => {
                let cluster_vcns: HashSet<&str> = self
                    .snapshot
                    .kubernetes_clusters
                    .iter()
                    .map(|c| c.vcn_id.as_str())
                    .collect();
                InfrastructureSnapshot {
                    vcns: self
                        .snapshot
                        .vcns
                        .iter()
                        .filter(|v| cluster_vcns.contains(v.id.as_str()))
                        .cloned()
                        .collect(),
                    kubernetes_clusters: self.snapshot.kubernetes_clusters.clone(),
                    ..Default::default()
                }
            }
        }
    }

    /// Customer label for the document title and file name
    pub fn client_name(&self) -> String {
        if let Some(first) = self.snapshot.instances.first() {
            first.compartment_name.replace(CLIENT_PREFIX, "")
        } else if !self.snapshot.kubernetes_clusters.is_empty() {
            "Compartment_OKE".to_string()
        } else if !self.snapshot.vcns.is_empty() {
            "Compartment".to_string()
        } else {
            "Unknown".to_string()
        }
    }

    pub fn into_inner(self) -> InfrastructureSnapshot {
        self.snapshot
    }
}

/// Check identities and follow every cross-collection reference
pub fn resolve(
    raw: InfrastructureSnapshot,
    document_kind: DocumentKind,
) -> Result<ValidatedSnapshot, ValidationError> {
    let cpes = index_unique(
        "CPE",
        raw.customer_premises_equipment
            .iter()
            .map(|c| (c.id.as_str(), c.display_name.as_str())),
    )?;
    let drgs = index_unique(
        "DRG",
        raw.dynamic_routing_gateways
            .iter()
            .map(|d| (d.id.as_str(), d.display_name.as_str())),
    )?;
    let vcns = index_unique(
        "VCN",
        raw.vcns
            .iter()
            .map(|v| (v.id.as_str(), v.display_name.as_str())),
    )?;

    let mut dangling = Vec::new();

    let ipsec_links: Vec<IpsecLinks> = raw
        .ipsec_connections
        .iter()
        .map(|conn| {
            let cpe = follow(&cpes, Some(conn.cpe_id.as_str()));
            let drg = follow(&drgs, Some(conn.drg_id.as_str()));
            note_dangling(&mut dangling, &conn.id, "cpe_id", &cpe);
            note_dangling(&mut dangling, &conn.id, "drg_id", &drg);
            IpsecLinks {
                connection_id: conn.id.clone(),
                cpe,
                drg,
            }
        })
        .collect();

    let lpg_peers = resolve_lpg_peers(&raw.vcns, &mut dangling);
    let attachment_networks = resolve_attachments(&raw, &vcns, &mut dangling);
    let cluster_vcns = resolve_cluster_vcns(&raw.kubernetes_clusters, &vcns, &mut dangling);
    let volume_groups = resolve_volume_members(&raw, &mut dangling);

    let tunnel_crypto = raw
        .ipsec_connections
        .iter()
        .flat_map(|c| c.tunnels.iter())
        .map(|t| (t.id.clone(), assess_tunnel(t)))
        .collect();

    for reference in &dangling {
        tracing::warn!(
            "Unresolved reference {}.{} -> {}",
            reference.owner,
            reference.field,
            reference.target
        );
    }
    tracing::debug!(
        "Resolved snapshot for {} ({} dangling references)",
        document_kind,
        dangling.len()
    );

    Ok(ValidatedSnapshot {
        snapshot: raw,
        document_kind,
        ipsec_links,
        lpg_peers,
        attachment_networks,
        cluster_vcns,
        volume_groups,
        tunnel_crypto,
        dangling,
    })
}

fn index_unique<'a>(
    collection: &'static str,
    items: impl Iterator<Item = (&'a str, &'a str)>,
) -> Result<HashMap<&'a str, &'a str>, ValidationError> {
    let mut index = HashMap::new();
    for (id, name) in items {
        if index.insert(id, name).is_some() {
            return Err(ValidationError::DuplicateIdentity {
                collection,
                id: id.to_string(),
            });
        }
    }
    Ok(index)
}

fn follow(index: &HashMap<&str, &str>, id: Option<&str>) -> Resolution {
    match id.filter(|id| !id.is_empty()) {
        None => Resolution::Absent,
        Some(id) => match index.get(id) {
            Some(name) => Resolution::Resolved {
                id: id.to_string(),
                display_name: name.to_string(),
            },
            None => Resolution::Unresolved { id: id.to_string() },
        },
    }
}

fn note_dangling(
    dangling: &mut Vec<DanglingReference>,
    owner: &str,
    field: &'static str,
    resolution: &Resolution,
) {
    if let Resolution::Unresolved { id } = resolution {
        dangling.push(DanglingReference {
            owner: owner.to_string(),
            field,
            target: id.clone(),
        });
    }
}

fn resolve_lpg_peers(
    vcns: &[VcnData],
    dangling: &mut Vec<DanglingReference>,
) -> HashMap<String, Resolution> {
    let lpgs: HashMap<&str, &str> = vcns
        .iter()
        .flat_map(|v| v.local_peering_gateways.iter())
        .map(|l| (l.id.as_str(), l.display_name.as_str()))
        .collect();

    vcns.iter()
        .flat_map(|v| v.local_peering_gateways.iter())
        .map(|lpg| {
            let peer = follow(&lpgs, lpg.peer_id.as_deref());
            note_dangling(dangling, &lpg.id, "peer_id", &peer);
            (lpg.id.clone(), peer)
        })
        .collect()
}

fn resolve_attachments(
    raw: &InfrastructureSnapshot,
    vcns: &HashMap<&str, &str>,
    dangling: &mut Vec<DanglingReference>,
) -> HashMap<String, Resolution> {
    let rpcs: HashMap<&str, &str> = raw
        .dynamic_routing_gateways
        .iter()
        .flat_map(|d| d.remote_peering_connections.iter())
        .map(|r| (r.id.as_str(), r.display_name.as_str()))
        .collect();
    let tunnels: HashMap<&str, &str> = raw
        .ipsec_connections
        .iter()
        .flat_map(|c| c.tunnels.iter())
        .map(|t| (t.id.as_str(), t.display_name.as_str()))
        .collect();

    let mut out = HashMap::new();
    for attachment in raw
        .dynamic_routing_gateways
        .iter()
        .flat_map(|d| d.attachments.iter())
    {
        let index = match attachment.network_type.as_str() {
            NETWORK_TYPE_VCN => Some(vcns),
            NETWORK_TYPE_RPC => Some(&rpcs),
            NETWORK_TYPE_IPSEC => Some(&tunnels),
            _ => None,
        };
        let resolution = match index {
            Some(index) => follow(index, attachment.network_id.as_deref()),
            None => Resolution::Absent,
        };
        note_dangling(dangling, &attachment.id, "network_id", &resolution);
        out.insert(attachment.id.clone(), resolution);
    }
    out
}

fn resolve_cluster_vcns(
    clusters: &[KubernetesClusterData],
    vcns: &HashMap<&str, &str>,
    dangling: &mut Vec<DanglingReference>,
) -> Vec<Resolution> {
    clusters
        .iter()
        .map(|cluster| {
            let vcn = follow(vcns, Some(cluster.vcn_id.as_str()));
            note_dangling(dangling, &cluster.id, "vcn_id", &vcn);
            vcn
        })
        .collect()
}

fn resolve_volume_members(
    raw: &InfrastructureSnapshot,
    dangling: &mut Vec<DanglingReference>,
) -> Vec<VolumeGroupLinks> {
    let mut volumes: HashMap<&str, String> = HashMap::new();
    for instance in &raw.instances {
        if let Some(boot) = instance.boot_volume_id.as_deref() {
            volumes.insert(boot, format!("Boot Volume ({})", instance.host_name));
        }
        for block in &instance.block_volumes {
            volumes.insert(
                block.id.as_str(),
                format!("Block Volume ({})", block.display_name),
            );
        }
    }
    let names: HashMap<&str, &str> = volumes.iter().map(|(k, v)| (*k, v.as_str())).collect();

    raw.volume_groups
        .iter()
        .map(|group| {
            let members = group
                .member_ids
                .iter()
                .map(|member| {
                    let resolution = follow(&names, Some(member.as_str()));
                    note_dangling(dangling, &group.id, "member_ids", &resolution);
                    (member.clone(), resolution)
                })
                .collect();
            VolumeGroupLinks {
                group_id: group.id.clone(),
                members,
            }
        })
        .collect()
}
