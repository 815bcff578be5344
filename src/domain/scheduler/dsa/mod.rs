pub mod best_capacity;
pub mod dsa_trait;
pub mod dsa_type;
pub mod far_first;
pub mod linear_ffirst;
