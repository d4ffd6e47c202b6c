pub mod cart;
pub mod modification;
pub mod order;
pub mod product;
