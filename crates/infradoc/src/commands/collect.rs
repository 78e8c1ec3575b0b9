use super::run_collection;
use crate::ScopeArgs;
use colored::Colorize;
use infradoc_config::Settings;
use infradoc_core::ValidatedSnapshot;
use std::path::Path;

pub async fn handle(
    settings: &Settings,
    scope: &ScopeArgs,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let mut session = run_collection(settings, scope).await?;

    if let Some(snapshot) = session.snapshot() {
        let json = serde_json::to_string_pretty(snapshot.snapshot())?;
        match output {
            Some(path) => {
                std::fs::write(path, json)?;
                eprintln!("{} {}", "Snapshot written to".green(), path.display());
            }
            None => println!("{}", json),
        }
        print_summary(snapshot);
    }

    session.shutdown().await;
    Ok(())
}

fn print_summary(snapshot: &ValidatedSnapshot) {
    let data = snapshot.snapshot();

    eprintln!();
    eprintln!("{} {}", "Client:".bold(), snapshot.client_name().cyan());
    eprintln!("  Instances:         {}", data.instances.len());
    eprintln!("  VCNs:              {}", data.vcns.len());
    eprintln!("  DRGs:              {}", data.dynamic_routing_gateways.len());
    eprintln!("  IPSec connections: {}", data.ipsec_connections.len());
    eprintln!("  Load balancers:    {}", data.load_balancers.len());
    eprintln!("  Volume groups:     {}", data.volume_groups.len());
    eprintln!("  OKE clusters:      {}", data.kubernetes_clusters.len());

    let dangling = snapshot.dangling_references();
    if !dangling.is_empty() {
        eprintln!();
        eprintln!(
            "{}",
            format!("{} unresolved reference(s):", dangling.len()).yellow()
        );
        for reference in dangling {
            eprintln!(
                "  {} {} -> {}",
                reference.owner, reference.field, reference.target
            );
        }
    }

    if snapshot.is_export_ready() {
        eprintln!("{}", "✓ Ready to export".green());
    } else {
        eprintln!(
            "{}",
            format!("Nothing to document for {}", snapshot.document_kind()).yellow()
        );
    }
}
