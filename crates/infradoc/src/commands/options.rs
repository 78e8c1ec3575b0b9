use super::{connect, poll_config};
use colored::Colorize;
use infradoc_cloud::SessionController;
use infradoc_config::Settings;
use infradoc_core::{DocumentKind, OptionLevel, OptionNode, Visibility};

pub async fn handle_regions(settings: &Settings) -> anyhow::Result<()> {
    let (mut session, _events) = SessionController::new(connect(settings)?, poll_config(settings));
    session.load_regions().await?;

    println!("{}", "Available regions:".bold());
    print_level(&session, OptionLevel::Region, None);
    Ok(())
}

pub async fn handle_compartments(
    settings: &Settings,
    region: &str,
    filter: Option<&str>,
) -> anyhow::Result<()> {
    let (mut session, _events) = SessionController::new(connect(settings)?, poll_config(settings));
    session.set_region(region).await?;

    println!("{} {}", "Compartments in".bold(), region.cyan());
    print_level(&session, OptionLevel::Compartment, filter);
    Ok(())
}

pub async fn handle_instances(
    settings: &Settings,
    region: &str,
    compartment: &str,
    filter: Option<&str>,
) -> anyhow::Result<()> {
    let (mut session, _events) = SessionController::new(connect(settings)?, poll_config(settings));
    session.set_document_kind(DocumentKind::NewHost).await?;
    session.set_region(region).await?;
    session.set_compartment(compartment).await?;

    println!("{} {}", "Instances in".bold(), compartment.cyan());
    print_level(&session, OptionLevel::Instance, filter);
    Ok(())
}

fn print_level(session: &SessionController, level: OptionLevel, query: Option<&str>) {
    let nodes = session.options(level);
    if nodes.is_empty() {
        println!("  {}", "(none)".dimmed());
        return;
    }

    let result = session.filter(level, query.unwrap_or_default());
    let visible: Vec<&OptionNode> = result.visible_nodes(nodes).collect();
    if visible.is_empty() {
        println!("  {}", "No matches".yellow());
        return;
    }

    for node in visible {
        println!("{}", format_node(node, result.visibility(&node.id)));
    }
    println!();
    println!(
        "{} of {} shown",
        result.visible_count().to_string().green(),
        nodes.len()
    );
}

fn format_node(node: &OptionNode, visibility: Visibility) -> String {
    let indent = "  ".repeat(node.depth as usize + 1);
    let name = match visibility {
        Visibility::Ancestor => node.display_name.dimmed().to_string(),
        _ => node.display_name.bold().to_string(),
    };
    let detail = node
        .detail
        .as_deref()
        .map(|d| format!(" ({})", d))
        .unwrap_or_default();

    format!("{}{}{} {}", indent, name, detail, node.id.as_str().dimmed())
}
