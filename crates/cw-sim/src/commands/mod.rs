pub mod classes;
pub mod evaluate;
