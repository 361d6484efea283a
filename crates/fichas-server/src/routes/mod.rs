pub mod fichas;
pub mod stats;
