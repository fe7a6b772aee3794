use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::maven::coordinates::{Coordinate, MavenVersion, PackageIdentity};

/// one coordinate per package - the one with the preferred version
pub type FlatDependencyMap = BTreeMap<PackageIdentity, Coordinate>;

/// Version conflict policy: the greater version under plain string comparison wins.
///
/// NB: this is deliberately not semantic-version aware, "1.9.0" is preferred over "1.10.0".
pub fn is_preferred(candidate: &MavenVersion, current: &MavenVersion) -> bool {
    candidate > current
}

/// Reduces the resolved tree below `root` (not including `root` itself) to one entry per package.
///  Coordinates whose version still contains a property placeholder are left out.
pub fn flatten(root: &Coordinate) -> FlatDependencyMap {
    let mut result = FlatDependencyMap::new();
    collect(&root.dependencies, &mut result);
    result
}

fn collect(dependencies: &[Coordinate], result: &mut FlatDependencyMap) {
    for dependency in dependencies {
        if dependency.version.is_placeholder() {
            warn!("skipping {} - version was never resolved", dependency);
        }
        else {
            let identity = dependency.identity();
            match result.get(&identity) {
                Some(existing) if !is_preferred(&dependency.version, &existing.version) => {}
                Some(existing) => {
                    debug!("{}: preferring version {} over {}", identity, dependency.version, existing.version);
                    result.insert(identity, dependency.leaf());
                }
                None => {
                    result.insert(identity, dependency.leaf());
                }
            }
        }

        collect(&dependency.dependencies, result);
    }
}
