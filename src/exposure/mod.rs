pub mod batch;
pub mod pfe;
pub mod policy;
pub mod vector;
