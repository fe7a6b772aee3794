use std::path::Path;

use anyhow::{anyhow, Context};
use tracing::{debug, info};

use crate::dependencies::descriptor::child_coordinates;
use crate::maven::coordinates::{ArtifactType, Coordinate, MavenArtifactId, MavenGroupId, MavenVersion};
use crate::maven::descriptor_xml::ProjectDescriptor;

pub const LOCK_FILE_NAME: &str = "nat.lock";
pub const POM_FILE_NAME: &str = "pom.xml";

/// Reads the project's root coordinate with its declared dependencies. `nat.lock` is used when
///  present, otherwise `pom.xml` is parsed and the lock file written. `force` always re-parses
///  `pom.xml`.
pub async fn read_project_root(project_dir: &Path, force: bool) -> anyhow::Result<Coordinate> {
    let lock_file = project_dir.join(LOCK_FILE_NAME);

    if !force && tokio::fs::try_exists(&lock_file).await? {
        let json = tokio::fs::read_to_string(&lock_file)
            .await
            .with_context(|| format!("reading {}", lock_file.display()))?;
        let root: Coordinate = serde_json::from_str(&json)
            .with_context(|| format!("parsing {}, check that the format is correct", lock_file.display()))?;
        debug!("discovered {} from {}", root, lock_file.display());
        return Ok(root);
    }

    let pom_file = project_dir.join(POM_FILE_NAME);
    debug!("reading project from {}", pom_file.display());
    let xml = tokio::fs::read_to_string(&pom_file)
        .await
        .with_context(|| format!("no {} found in {} and {} cannot be read", LOCK_FILE_NAME, project_dir.display(), POM_FILE_NAME))?;
    let descriptor = ProjectDescriptor::parse(&xml)
        .with_context(|| format!("parsing {}", pom_file.display()))?;
    let root = root_coordinate(&descriptor)?;

    let json = serde_json::to_string_pretty(&root)?;
    tokio::fs::write(&lock_file, json)
        .await
        .with_context(|| format!("writing {}", lock_file.display()))?;
    info!("wrote {} for {}", lock_file.display(), root);

    Ok(root)
}

fn root_coordinate(descriptor: &ProjectDescriptor) -> anyhow::Result<Coordinate> {
    let group_id = descriptor.effective_group_id()
        .ok_or_else(|| anyhow!("{} declares no groupId", POM_FILE_NAME))?;
    let artifact_id = descriptor.artifact_id.as_deref()
        .ok_or_else(|| anyhow!("{} declares no artifactId", POM_FILE_NAME))?;
    let version = descriptor.effective_version()
        .ok_or_else(|| anyhow!("{} declares no version", POM_FILE_NAME))?;

    let mut root = Coordinate {
        group_id: MavenGroupId(group_id.to_string()),
        artifact_id: MavenArtifactId(artifact_id.to_string()),
        version: MavenVersion(descriptor.substitute_local_properties(version)),
        artifact_type: descriptor.packaging.as_deref()
            .map(ArtifactType::from)
            .unwrap_or_default(),
        classifier: None,
        name_override: None,
        dependencies: vec![],
    };
    root.dependencies = child_coordinates(&root, descriptor);
    Ok(root)
}
