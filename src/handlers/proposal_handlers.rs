pub mod crud;
pub mod workflow;
