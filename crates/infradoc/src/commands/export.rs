use super::run_collection;
use crate::ScopeArgs;
use anyhow::Context;
use colored::Colorize;
use infradoc_config::{Preferences, Settings};
use infradoc_core::{Attachment, AttachmentKind, ExportMetadata, Language};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub struct ExportArgs {
    pub responsible: String,
    pub language: Option<Language>,
    pub architecture: Vec<PathBuf>,
    pub antivirus: Vec<PathBuf>,
    pub output_dir: PathBuf,
}

pub async fn handle(settings: &Settings, scope: &ScopeArgs, args: ExportArgs) -> anyhow::Result<()> {
    let language = match args.language {
        Some(language) => language,
        None => preferred_language(settings)?,
    };
    let metadata = ExportMetadata::new(args.responsible, language);
    metadata.validate()?;

    let mut attachments = read_attachments(AttachmentKind::Architecture, &args.architecture)?;
    attachments.extend(read_attachments(AttachmentKind::Antivirus, &args.antivirus)?);

    let mut session = run_collection(settings, scope).await?;
    let exported = session.export(&metadata, &attachments).await;
    session.shutdown().await;
    let document = exported?;

    std::fs::create_dir_all(&args.output_dir)?;
    let path = args.output_dir.join(&document.file_name);
    std::fs::write(&path, &document.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "{} {} ({} bytes, {})",
        "✓ Document saved:".green(),
        path.display(),
        document.bytes.len(),
        language
    );
    Ok(())
}

/// Saved preference first, then the settings file
fn preferred_language(settings: &Settings) -> anyhow::Result<Language> {
    let preferences = Preferences::load()?;
    let code = preferences
        .language
        .unwrap_or_else(|| settings.language.clone());
    Ok(Language::from_str(&code)?)
}

fn read_attachments(kind: AttachmentKind, paths: &[PathBuf]) -> anyhow::Result<Vec<Attachment>> {
    paths.iter().map(|path| read_attachment(kind, path)).collect()
}

fn read_attachment(kind: AttachmentKind, path: &Path) -> anyhow::Result<Attachment> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Attachment::new(kind, file_name, bytes))
}
