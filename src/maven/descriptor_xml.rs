use std::collections::HashMap;

use serde::Deserialize;

use crate::maven::coordinates::{ArtifactType, Coordinate, MavenArtifactId, MavenGroupId, MavenVersion};

/// The parts of a POM that describe a package and its dependencies.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDescriptor {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<ParentRef>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
    pub dependencies: Option<DependencyList>,
    pub dependency_management: Option<DependencyManagement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentRef {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DependencyList {
    #[serde(default, rename = "dependency")]
    pub items: Vec<DeclaredDependency>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DependencyManagement {
    pub dependencies: Option<DependencyList>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DeclaredDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    #[serde(rename = "type")]
    pub dependency_type: Option<String>,
    pub classifier: Option<String>,
    pub scope: Option<String>,
}

impl DeclaredDependency {
    pub fn is_test_scoped(&self) -> bool {
        self.scope.as_deref() == Some("test")
    }
}

impl ProjectDescriptor {
    pub fn parse(xml: &str) -> anyhow::Result<ProjectDescriptor> {
        Ok(serde_xml_rs::from_str(xml)?)
    }

    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
            .or_else(|| self.parent.as_ref().and_then(|p| p.group_id.as_deref()))
    }

    pub fn effective_version(&self) -> Option<&str> {
        self.version.as_deref()
            .or_else(|| self.parent.as_ref().and_then(|p| p.version.as_deref()))
    }

    pub fn declared_dependencies(&self) -> &[DeclaredDependency] {
        match &self.dependencies {
            Some(d) => &d.items,
            None => &[],
        }
    }

    /// the version declared for a dependency, falling back to `<dependencyManagement>`
    pub fn declared_version(&self, dependency: &DeclaredDependency) -> Option<String> {
        if dependency.version.is_some() {
            return dependency.version.clone();
        }

        self.dependency_management.as_ref()?
            .dependencies.as_ref()?
            .items.iter()
            .find(|m| m.group_id == dependency.group_id && m.artifact_id == dependency.artifact_id)
            .and_then(|m| m.version.clone())
    }

    /// Replaces `${...}` references this descriptor can answer itself: its own `<properties>`,
    ///  `project.version` and `version`. Anything else is left in place.
    pub fn substitute_local_properties(&self, value: &str) -> String {
        let mut result = value.to_string();
        if let Some(version) = self.effective_version() {
            result = result.replace("${project.version}", version)
                .replace("${version}", version);
        }
        for (key, property_value) in &self.properties {
            result = result.replace(&format!("${{{}}}", key), property_value);
        }
        result
    }

    /// Turns a declared dependency into a child coordinate, `None` if no version is known for it.
    pub fn child_coordinate(&self, dependency: &DeclaredDependency) -> Option<Coordinate> {
        let version = self.declared_version(dependency)?;
        Some(Coordinate {
            group_id: MavenGroupId(self.substitute_local_properties(&dependency.group_id)),
            artifact_id: MavenArtifactId(dependency.artifact_id.clone()),
            version: MavenVersion(self.substitute_local_properties(&version)),
            artifact_type: dependency.dependency_type.as_deref()
                .map(ArtifactType::from)
                .unwrap_or_default(),
            classifier: dependency.classifier.clone(),
            name_override: None,
            dependencies: vec![],
        })
    }
}
