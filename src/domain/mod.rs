//! Catalog domain: entities, value objects, and the pure rules over them.
pub mod aggregates;
pub mod category_tree;
pub mod events;
pub mod pricing;
pub mod registry;
pub mod value_objects;
