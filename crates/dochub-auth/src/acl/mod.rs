//! Effective access-level resolution with folder inheritance.

pub mod resolver;

pub use resolver::AccessResolver;
