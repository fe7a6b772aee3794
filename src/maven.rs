pub mod coordinates;
pub mod descriptor_xml;
pub mod metadata_xml;
pub mod paths;
pub mod remote_repo;
#[cfg(test)]
pub mod transient_repo;
