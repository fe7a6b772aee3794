pub mod blob;
pub mod http_downloader;
