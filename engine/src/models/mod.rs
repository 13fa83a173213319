pub mod churn;
pub mod config;
pub mod dag;
pub mod dead_code;
pub mod error;
pub mod risk;
pub mod score;
pub mod symbols;
pub mod syntax;
pub mod tdg;
