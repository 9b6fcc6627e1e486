pub mod advisor;
pub mod organizations;
pub mod stories;
