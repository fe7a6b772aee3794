pub mod fs_artifact_cache;
