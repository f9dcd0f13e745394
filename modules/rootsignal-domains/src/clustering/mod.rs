pub mod activities;
pub mod models;
pub mod restate;

pub use models::{Cluster, ClusterDetail, ClusterEntity, ClusterItem, ClusterSignal, MapCluster};
pub use restate::{ClusteringJob, ClusteringJobImpl};
