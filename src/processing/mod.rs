pub mod hit_test;
pub mod transform;
